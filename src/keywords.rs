use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// How a dialect keyword is classified, both for display tokens and for
/// editor completion lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordClass {
    Keyword,
    Function,
    Constant,
}

/// One entry of the dialect keyword table: the dialect label, its class,
/// the host-language text substituted for it, and the human-readable
/// strings shown by completion and documentation consumers.
#[derive(Debug, Clone, Copy)]
pub struct KeywordEntry {
    pub label: &'static str,
    pub class: KeywordClass,
    pub replacement: &'static str,
    pub detail: &'static str,
    pub info: &'static str,
}

/// The full dialect keyword table. Labels are unique and case-sensitive.
/// Replacements must never reintroduce another entry's label, so that the
/// order of substitution cannot matter.
pub const ENTRIES: &[KeywordEntry] = &[
    KeywordEntry {
        label: "whatIf",
        class: KeywordClass::Keyword,
        replacement: "if",
        detail: "if statement",
        info: "Equivalent to 'if'.",
    },
    KeywordEntry {
        label: "howAbout",
        class: KeywordClass::Keyword,
        replacement: "else if",
        detail: "else if statement",
        info: "Equivalent to 'else if'.",
    },
    KeywordEntry {
        label: "otherwise",
        class: KeywordClass::Keyword,
        replacement: "else",
        detail: "else statement",
        info: "Equivalent to 'else'.",
    },
    KeywordEntry {
        label: "keepLooping",
        class: KeywordClass::Keyword,
        replacement: "while",
        detail: "while loop",
        info: "Equivalent to 'while'.",
    },
    KeywordEntry {
        label: "loopTimes",
        class: KeywordClass::Keyword,
        replacement: "for",
        detail: "for loop",
        info: "Equivalent to a 'for' loop.",
    },
    KeywordEntry {
        label: "speakOut",
        class: KeywordClass::Function,
        replacement: "print",
        detail: "print to output",
        info: "Equivalent to a console print call.",
    },
    KeywordEntry {
        label: "listenIn",
        class: KeywordClass::Function,
        replacement: "prompt",
        detail: "prompt for input",
        info: "Equivalent to an input prompt.",
    },
    KeywordEntry {
        label: "mutate",
        class: KeywordClass::Keyword,
        replacement: "let",
        detail: "mutable variable",
        info: "Equivalent to 'let'.",
    },
    KeywordEntry {
        label: "immutable",
        class: KeywordClass::Keyword,
        replacement: "const",
        detail: "constant variable",
        info: "Equivalent to 'const'.",
    },
    KeywordEntry {
        label: "absolutely",
        class: KeywordClass::Constant,
        replacement: "true",
        detail: "true",
        info: "Equivalent to 'true'.",
    },
    KeywordEntry {
        label: "noWay",
        class: KeywordClass::Constant,
        replacement: "false",
        detail: "false",
        info: "Equivalent to 'false'.",
    },
];

static LOOKUP: Lazy<FxHashMap<&'static str, &'static KeywordEntry>> =
    Lazy::new(|| ENTRIES.iter().map(|entry| (entry.label, entry)).collect());

/// Look up a word in the table. `None` means the word is an ordinary
/// identifier as far as the dialect is concerned.
pub fn lookup(word: &str) -> Option<&'static KeywordEntry> {
    LOOKUP.get(word).copied()
}
