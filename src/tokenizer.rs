use crate::keywords::{self, KeywordClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Identifier,
    Keyword,
    Function,
    Constant,
    String,
    Symbol,
}

impl From<KeywordClass> for TokenClass {
    fn from(class: KeywordClass) -> Self {
        match class {
            KeywordClass::Keyword => TokenClass::Keyword,
            KeywordClass::Function => TokenClass::Function,
            KeywordClass::Constant => TokenClass::Constant,
        }
    }
}

/// One display token: the exact matched text and the 1-based line it was
/// found on. Tokens are advisory only and never feed back into translation
/// or execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub class: TokenClass,
    pub value: String,
    pub line: usize,
}

/// Tokenize dialect source for display. Total: unmatched characters are
/// skipped silently and never abort the scan.
pub fn tokenize(source: &str) -> Vec<Token> {
    scan(source).0
}

/// Like [`tokenize`], but also reports how many characters were skipped
/// because no matcher recognized them.
pub fn scan(source: &str) -> (Vec<Token>, usize) {
    let mut tokens = Vec::new();
    let mut skipped = 0;

    for (index, line) in source.lines().enumerate() {
        let line_number = index + 1;
        let mut rest = line;

        while !rest.is_empty() {
            if let Some(r) = whitespace(rest) {
                rest = r;
                continue;
            }

            // Priority order: strings before symbols before words, so a
            // quoted span is never picked apart into its constituents.
            if let Some((class, value, r)) = first_match(&[string, symbol, word], rest) {
                tokens.push(Token {
                    class,
                    value: value.to_string(),
                    line: line_number,
                });
                rest = r;
                continue;
            }

            let c = rest.chars().next().expect("rest is non-empty");
            skipped += 1;
            rest = &rest[c.len_utf8()..];
        }
    }

    (tokens, skipped)
}

type Match<'a> = (TokenClass, &'a str, &'a str);

fn first_match<'a>(matchers: &[fn(&str) -> Option<Match>], source: &'a str) -> Option<Match<'a>> {
    matchers.iter().find_map(|matcher| matcher(source))
}

fn whitespace(source: &str) -> Option<&str> {
    let len: usize = source
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(char::len_utf8)
        .sum();
    if len > 0 {
        Some(&source[len..])
    } else {
        None
    }
}

fn string(source: &str) -> Option<Match> {
    let quote = source.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }

    let mut len = quote.len_utf8();
    for c in source[len..].chars() {
        len += c.len_utf8();
        if c == quote {
            return Some((TokenClass::String, &source[..len], &source[len..]));
        }
    }
    None
}

fn symbol(source: &str) -> Option<Match> {
    let c = source.chars().next()?;
    if matches!(c, '=' | ',' | ';' | '{' | '}' | '(' | ')' | '+' | '-' | '*' | '/') {
        let len = c.len_utf8();
        Some((TokenClass::Symbol, &source[..len], &source[len..]))
    } else {
        None
    }
}

fn word(source: &str) -> Option<Match> {
    let len: usize = source
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(char::len_utf8)
        .sum();
    if len == 0 {
        return None;
    }

    let value = &source[..len];
    let class = match keywords::lookup(value) {
        Some(entry) => entry.class.into(),
        None => TokenClass::Identifier,
    };
    Some((class, value, &source[len..]))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tokens() {
        let source = "mutate x = 1;";
        let expected = vec![
            Token {
                class: TokenClass::Keyword,
                value: "mutate".to_string(),
                line: 1,
            },
            Token {
                class: TokenClass::Identifier,
                value: "x".to_string(),
                line: 1,
            },
            Token {
                class: TokenClass::Symbol,
                value: "=".to_string(),
                line: 1,
            },
            Token {
                class: TokenClass::Identifier,
                value: "1".to_string(),
                line: 1,
            },
            Token {
                class: TokenClass::Symbol,
                value: ";".to_string(),
                line: 1,
            },
        ];
        assert_eq!(tokenize(source), expected);
    }

    #[test]
    fn test_tokens_with_string() {
        let source = "speakOut(\"hello there\");";
        let tokens = tokenize(source);
        assert_eq!(tokens[0].class, TokenClass::Function);
        assert_eq!(tokens[2].class, TokenClass::String);
        assert_eq!(tokens[2].value, "\"hello there\"");
    }

    #[test]
    fn test_single_quoted_string() {
        let tokens = tokenize("mutate s = 'hi';");
        assert_eq!(tokens[3].class, TokenClass::String);
        assert_eq!(tokens[3].value, "'hi'");
    }

    #[test]
    fn test_line_numbers_survive_empty_lines() {
        let source = "mutate a = 1;\n\n\nspeakOut(a);";
        let tokens = tokenize(source);
        assert_eq!(tokens.first().unwrap().line, 1);
        assert_eq!(tokens.last().unwrap().line, 4);
        assert!(tokens.iter().all(|t| t.line == 1 || t.line == 4));
    }

    #[test]
    fn test_keyword_labels_are_reserved() {
        // Even in positions where it reads like an identifier, a table
        // label keeps its table class.
        let tokens = tokenize("mutate mutate = absolutely;");
        assert_eq!(tokens[0].class, TokenClass::Keyword);
        assert_eq!(tokens[1].class, TokenClass::Keyword);
        assert_eq!(tokens[3].class, TokenClass::Constant);
    }

    #[test]
    fn test_every_table_label_round_trips_its_class() {
        for entry in crate::keywords::ENTRIES {
            let tokens = tokenize(entry.label);
            assert_eq!(tokens.len(), 1);
            assert_eq!(tokens[0].class, TokenClass::from(entry.class));
            assert_eq!(tokens[0].value, entry.label);
        }
    }

    #[test]
    fn test_unmatched_characters_are_skipped_and_counted() {
        let (tokens, skipped) = scan("mutate x = 1 @ # ~;");
        assert_eq!(skipped, 3);
        assert!(tokens
            .iter()
            .all(|t| t.value != "@" && t.value != "#" && t.value != "~"));
    }

    #[test]
    fn test_token_count_per_line() {
        let (tokens, skipped) = scan("whatIf (x) { speakOut(x); }");
        // whatIf ( x ) { speakOut ( x ) ; }
        assert_eq!(tokens.len(), 11);
        assert_eq!(skipped, 0);
        assert!(tokens.iter().all(|t| t.line == 1));
    }

    #[test]
    fn test_keyword_inside_identifier_is_identifier() {
        let tokens = tokenize("mutateValue");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].class, TokenClass::Identifier);
    }
}
