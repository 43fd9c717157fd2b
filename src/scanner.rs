//! Lexer for the host language the dialect translates into. Unlike the
//! display tokenizer, this one is strict: the parser needs a complete
//! token stream, so unexpected characters are errors here.

use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Plus,
    Minus,
    Star,
    Slash,

    // One or two character tokens
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    AmpAmp,
    PipePipe,
    PlusPlus,
    MinusMinus,
    Arrow,

    // Literals
    Identifier(String),
    String(String),
    Number(f64),

    // Keywords
    Let,
    Const,
    If,
    Else,
    While,
    For,
    True,
    False,
    Return,

    // End of file
    Eof,
}

impl Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::LeftParen => write!(f, "("),
            TokenType::RightParen => write!(f, ")"),
            TokenType::LeftBrace => write!(f, "{{"),
            TokenType::RightBrace => write!(f, "}}"),
            TokenType::Comma => write!(f, ","),
            TokenType::Semicolon => write!(f, ";"),
            TokenType::Plus => write!(f, "+"),
            TokenType::Minus => write!(f, "-"),
            TokenType::Star => write!(f, "*"),
            TokenType::Slash => write!(f, "/"),
            TokenType::Bang => write!(f, "!"),
            TokenType::BangEqual => write!(f, "!="),
            TokenType::Equal => write!(f, "="),
            TokenType::EqualEqual => write!(f, "=="),
            TokenType::Greater => write!(f, ">"),
            TokenType::GreaterEqual => write!(f, ">="),
            TokenType::Less => write!(f, "<"),
            TokenType::LessEqual => write!(f, "<="),
            TokenType::AmpAmp => write!(f, "&&"),
            TokenType::PipePipe => write!(f, "||"),
            TokenType::PlusPlus => write!(f, "++"),
            TokenType::MinusMinus => write!(f, "--"),
            TokenType::Arrow => write!(f, "=>"),
            TokenType::Identifier(name) => write!(f, "{}", name),
            TokenType::String(s) => write!(f, "\"{}\"", s),
            TokenType::Number(n) => write!(f, "{}", n),
            TokenType::Let => write!(f, "let"),
            TokenType::Const => write!(f, "const"),
            TokenType::If => write!(f, "if"),
            TokenType::Else => write!(f, "else"),
            TokenType::While => write!(f, "while"),
            TokenType::For => write!(f, "for"),
            TokenType::True => write!(f, "true"),
            TokenType::False => write!(f, "false"),
            TokenType::Return => write!(f, "return"),
            TokenType::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
}

impl Token {
    pub fn token_type(&self) -> &TokenType {
        &self.token_type
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Unexpected character '{0}' on line {1}")]
    UnexpectedCharacter(char, usize),
    #[error("Unterminated string starting on line {0}")]
    UnterminatedString(usize),
}

pub fn tokens(source: &str) -> Result<Vec<Token>, ScanError> {
    let mut tokens = Vec::new();
    let mut remaining = source;
    let mut line = 1;

    loop {
        let (token_type, rest) = token(remaining, &mut line)?;
        remaining = rest;
        let done = token_type == TokenType::Eof;
        tokens.push(Token { token_type, line });
        if done {
            break;
        }
    }

    Ok(tokens)
}

fn token<'a>(mut source: &'a str, line: &mut usize) -> Result<(TokenType, &'a str), ScanError> {
    loop {
        let trimmed = skip_counting_lines(source, line, whitespace)
            .or_else(|| skip_counting_lines(source, line, comment));
        match trimmed {
            Some(rest) => source = rest,
            None => break,
        }
    }

    if source.is_empty() {
        return Ok((TokenType::Eof, source));
    }

    if source.starts_with('"') || source.starts_with('\'') {
        return string(source, *line);
    }

    maximal(
        &[
            left_paren,
            right_paren,
            left_brace,
            right_brace,
            comma,
            semicolon,
            plus,
            minus,
            star,
            slash,
            bang,
            bang_equal,
            equal,
            equal_equal,
            greater,
            greater_equal,
            less,
            less_equal,
            amp_amp,
            pipe_pipe,
            plus_plus,
            minus_minus,
            arrow,
            let_,
            const_,
            if_,
            else_,
            while_,
            for_,
            true_,
            false_,
            return_,
            identifier,
            number,
        ],
        source,
    )
    .ok_or_else(|| {
        ScanError::UnexpectedCharacter(source.chars().next().expect("source is non-empty"), *line)
    })
}

fn skip_counting_lines<'a>(
    source: &'a str,
    line: &mut usize,
    skipper: fn(&str) -> Option<usize>,
) -> Option<&'a str> {
    let len = skipper(source)?;
    *line += source[..len].matches('\n').count();
    Some(&source[len..])
}

/// Pick the matcher that consumes the most input, so `letter` lexes as an
/// identifier rather than the keyword `let` followed by `ter`.
fn maximal<'a>(
    matchers: &[fn(&str) -> Option<(TokenType, &str)>],
    source: &'a str,
) -> Option<(TokenType, &'a str)> {
    let mut min_left = source.len() + 1;
    let mut max_match = None;

    for (m, rest) in matchers.iter().filter_map(|matcher| matcher(source)) {
        let left = rest.len();
        if left < min_left {
            min_left = left;
            max_match = Some((m, rest));
        }
    }

    max_match
}

fn whitespace(source: &str) -> Option<usize> {
    let len = source
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(char::len_utf8)
        .sum();
    if len > 0 {
        Some(len)
    } else {
        None
    }
}

fn comment(source: &str) -> Option<usize> {
    if source.starts_with("//") {
        Some(
            source
                .chars()
                .take_while(|c| *c != '\n')
                .map(char::len_utf8)
                .sum(),
        )
    } else {
        None
    }
}

macro_rules! match_literal {
    ($name:ident, $word:literal, $token:expr) => {
        fn $name(source: &str) -> Option<(TokenType, &str)> {
            if source.starts_with($word) {
                Some(($token, &source[$word.len()..]))
            } else {
                None
            }
        }
    };
}

match_literal! { left_paren, "(", TokenType::LeftParen }
match_literal! { right_paren, ")", TokenType::RightParen }
match_literal! { left_brace, "{", TokenType::LeftBrace }
match_literal! { right_brace, "}", TokenType::RightBrace }
match_literal! { comma, ",", TokenType::Comma }
match_literal! { semicolon, ";", TokenType::Semicolon }
match_literal! { plus, "+", TokenType::Plus }
match_literal! { minus, "-", TokenType::Minus }
match_literal! { star, "*", TokenType::Star }
match_literal! { slash, "/", TokenType::Slash }
match_literal! { bang, "!", TokenType::Bang }
match_literal! { bang_equal, "!=", TokenType::BangEqual }
match_literal! { equal, "=", TokenType::Equal }
match_literal! { equal_equal, "==", TokenType::EqualEqual }
match_literal! { greater, ">", TokenType::Greater }
match_literal! { greater_equal, ">=", TokenType::GreaterEqual }
match_literal! { less, "<", TokenType::Less }
match_literal! { less_equal, "<=", TokenType::LessEqual }
match_literal! { amp_amp, "&&", TokenType::AmpAmp }
match_literal! { pipe_pipe, "||", TokenType::PipePipe }
match_literal! { plus_plus, "++", TokenType::PlusPlus }
match_literal! { minus_minus, "--", TokenType::MinusMinus }
match_literal! { arrow, "=>", TokenType::Arrow }
match_literal! { let_, "let", TokenType::Let }
match_literal! { const_, "const", TokenType::Const }
match_literal! { if_, "if", TokenType::If }
match_literal! { else_, "else", TokenType::Else }
match_literal! { while_, "while", TokenType::While }
match_literal! { for_, "for", TokenType::For }
match_literal! { true_, "true", TokenType::True }
match_literal! { false_, "false", TokenType::False }
match_literal! { return_, "return", TokenType::Return }

fn identifier(source: &str) -> Option<(TokenType, &str)> {
    let mut chars = source.chars();

    let first = chars.next()?;
    if !first.is_ascii_alphabetic() && first != '_' && first != '$' {
        return None;
    }

    let len = first.len_utf8()
        + chars
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
            .map(char::len_utf8)
            .sum::<usize>();

    Some((
        TokenType::Identifier(source[..len].to_string()),
        &source[len..],
    ))
}

fn string(source: &str, line: usize) -> Result<(TokenType, &str), ScanError> {
    let quote = source.chars().next().expect("caller checked the first char");

    let mut len = quote.len_utf8();
    for c in source[len..].chars() {
        len += c.len_utf8();
        if c == quote {
            return Ok((
                TokenType::String(source[quote.len_utf8()..len - quote.len_utf8()].to_string()),
                &source[len..],
            ));
        }
        if c == '\n' {
            break;
        }
    }
    Err(ScanError::UnterminatedString(line))
}

fn number(source: &str) -> Option<(TokenType, &str)> {
    let digits = |s: &str| s.chars().take_while(char::is_ascii_digit).count();

    let whole = digits(source);
    if whole == 0 {
        return None;
    }

    let mut len = whole;
    let rest = &source[len..];
    if rest.starts_with('.') {
        let fraction = digits(&rest[1..]);
        if fraction > 0 {
            len += 1 + fraction;
        }
    }

    Some((
        TokenType::Number(source[..len].parse().ok()?),
        &source[len..],
    ))
}

#[cfg(test)]
mod test {
    use super::*;

    fn types(source: &str) -> Vec<TokenType> {
        tokens(source)
            .unwrap()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn test_tokens() {
        let expected = vec![
            TokenType::Let,
            TokenType::Identifier("x".to_string()),
            TokenType::Equal,
            TokenType::Number(1.0),
            TokenType::Semicolon,
            TokenType::Eof,
        ];
        assert_eq!(types("let x = 1;"), expected);
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(
            types("letter"),
            vec![TokenType::Identifier("letter".to_string()), TokenType::Eof]
        );
        assert_eq!(
            types("iffy"),
            vec![TokenType::Identifier("iffy".to_string()), TokenType::Eof]
        );
    }

    #[test]
    fn test_arrow_and_equals() {
        assert_eq!(
            types("= == =>"),
            vec![
                TokenType::Equal,
                TokenType::EqualEqual,
                TokenType::Arrow,
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn test_increment_and_plus() {
        assert_eq!(
            types("i++ + 1"),
            vec![
                TokenType::Identifier("i".to_string()),
                TokenType::PlusPlus,
                TokenType::Plus,
                TokenType::Number(1.0),
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn test_single_and_double_quoted_strings() {
        assert_eq!(
            types("\"ab\" 'cd'"),
            vec![
                TokenType::String("ab".to_string()),
                TokenType::String("cd".to_string()),
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            tokens("\nlet s = \"oops;"),
            Err(ScanError::UnterminatedString(2))
        ));
    }

    #[test]
    fn test_comments_and_lines() {
        let toks = tokens("// banner\nlet x = 1;").unwrap();
        assert_eq!(toks[0].token_type, TokenType::Let);
        assert_eq!(toks[0].line, 2);
    }

    #[test]
    fn test_unexpected_character() {
        assert!(matches!(
            tokens("let x = @;"),
            Err(ScanError::UnexpectedCharacter('@', 1))
        ));
    }
}
