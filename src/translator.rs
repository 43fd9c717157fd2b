use once_cell::sync::Lazy;
use regex::Regex;

use crate::keywords::{KeywordEntry, ENTRIES};

/// Compiled whole-word pattern per table entry. Word boundaries keep labels
/// embedded in longer identifiers (e.g. `mutateValue`) untouched.
static PATTERNS: Lazy<Vec<(Regex, &'static KeywordEntry)>> = Lazy::new(|| {
    ENTRIES
        .iter()
        .map(|entry| {
            let pattern = format!(r"\b{}\b", regex::escape(entry.label));
            let regex = Regex::new(&pattern).expect("keyword labels form valid patterns");
            (regex, entry)
        })
        .collect()
});

/// Rewrite dialect source into host source by whole-word substitution of
/// every keyword table label. Everything else passes through unchanged; no
/// parsing happens here, so structurally invalid programs translate fine
/// and fail later at execution time.
pub fn translate(source: &str) -> String {
    let mut translated = source.to_string();
    for (regex, entry) in PATTERNS.iter() {
        translated = regex
            .replace_all(&translated, entry.replacement)
            .into_owned();
    }
    translated
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_translates_every_label() {
        let source = "whatIf howAbout otherwise keepLooping loopTimes \
                      speakOut listenIn mutate immutable absolutely noWay";
        assert_eq!(
            translate(source),
            "if else if else while for print prompt let const true false"
        );
    }

    #[test]
    fn test_idempotent_on_host_text() {
        let source = "let x = 1;\nwhile (x < 10) { x = x + 1; }\nprint(x);";
        assert_eq!(translate(source), source);
    }

    #[test]
    fn test_word_boundary_safety() {
        for entry in ENTRIES {
            let identifier = format!("{}Foo", entry.label);
            let source = format!("let {} = 1;", identifier);
            assert_eq!(translate(&source), source);
        }
    }

    #[test]
    fn test_labels_inside_strings_are_rewritten() {
        // Substitution is textual and deliberately does not respect string
        // literals.
        assert_eq!(translate("print(\"noWay\");"), "print(\"false\");");
    }

    #[test]
    fn test_hello_world() {
        let source = "mutate helloWorld = () => {\n    speakOut(\"Hello, World!\");\n};\nhelloWorld();";
        let expected = "let helloWorld = () => {\n    print(\"Hello, World!\");\n};\nhelloWorld();";
        assert_eq!(translate(source), expected);
    }
}
