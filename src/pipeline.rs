//! The public surface: tokenization for display and the
//! translate-then-execute chain, combined into one result per invocation.

use std::{cell::RefCell, rc::Rc};

use crate::{
    interpreter::{ExecutionError, Interpreter},
    parser, scanner,
    tokenizer::{self, Token},
    translator,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success {
        captured_lines: Vec<String>,
    },
    /// Output captured before the error is preserved; discarding it would
    /// make runtime failures in loops much harder to debug.
    Failure {
        message: String,
        captured_lines: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub tokens: Vec<Token>,
    pub outcome: ExecutionOutcome,
}

/// Classify dialect source for display. Pure and total.
pub fn tokenize(source: &str) -> Vec<Token> {
    tokenizer::tokenize(source)
}

/// Tokenize, translate and execute one dialect program. Tokenization and
/// translation both read the original source; neither depends on the
/// other. Nothing persists after the call returns.
pub fn translate_and_run(source: &str) -> PipelineResult {
    let tokens = tokenizer::tokenize(source);
    let translated = translator::translate(source);

    let buffer: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    let result = execute(&translated, buffer.clone());
    let captured_lines = captured_lines(&buffer.borrow());

    let outcome = match result {
        Ok(()) => ExecutionOutcome::Success { captured_lines },
        Err(e) => ExecutionOutcome::Failure {
            message: e.to_string(),
            captured_lines,
        },
    };

    PipelineResult { tokens, outcome }
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Scan(#[from] scanner::ScanError),
    #[error(transparent)]
    Parse(#[from] parser::ParseErrors),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

fn execute(translated: &str, buffer: Rc<RefCell<Vec<u8>>>) -> Result<(), RunError> {
    let tokens = scanner::tokens(translated)?;
    let program = parser::program(&tokens)?;
    let mut interpreter = Interpreter::new(buffer);
    interpreter.interpret(&program)?;
    Ok(())
}

fn captured_lines(buffer: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(buffer)
        .lines()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokenizer::TokenClass;

    #[test]
    fn test_hello_world_end_to_end() {
        let source = r#"
mutate helloWorld = () => {
    speakOut("Hello, World!");
};
helloWorld();
"#;
        let result = translate_and_run(source);
        assert_eq!(
            result.outcome,
            ExecutionOutcome::Success {
                captured_lines: vec!["Hello, World!".to_string()]
            }
        );

        let class_of = |value: &str| {
            result
                .tokens
                .iter()
                .find(|t| t.value == value)
                .map(|t| t.class)
        };
        assert_eq!(class_of("mutate"), Some(TokenClass::Keyword));
        assert_eq!(class_of("helloWorld"), Some(TokenClass::Identifier));
        assert_eq!(class_of("speakOut"), Some(TokenClass::Function));
        assert_eq!(class_of("\"Hello, World!\""), Some(TokenClass::String));
    }

    #[test]
    fn test_output_capture_order() {
        let source = "speakOut(\"a\"); speakOut(\"b\"); speakOut(\"c\");";
        let result = translate_and_run(source);
        assert_eq!(
            result.outcome,
            ExecutionOutcome::Success {
                captured_lines: vec!["a".to_string(), "b".to_string(), "c".to_string()]
            }
        );
    }

    #[test]
    fn test_error_surfacing() {
        let result = translate_and_run("definitelyNotDefined();");
        let ExecutionOutcome::Failure { message, .. } = result.outcome else {
            panic!("expected failure");
        };
        assert!(!message.is_empty());
    }

    #[test]
    fn test_partial_output_preserved_on_failure() {
        let source = "speakOut(\"before\"); definitelyNotDefined();";
        let result = translate_and_run(source);
        let ExecutionOutcome::Failure { captured_lines, .. } = result.outcome else {
            panic!("expected failure");
        };
        assert_eq!(captured_lines, vec!["before".to_string()]);
    }

    #[test]
    fn test_sequential_runs_are_isolated() {
        let first = translate_and_run("speakOut(\"first\");");
        let second = translate_and_run("speakOut(\"second\");");
        assert_eq!(
            second.outcome,
            ExecutionOutcome::Success {
                captured_lines: vec!["second".to_string()]
            }
        );
        assert_eq!(
            first.outcome,
            ExecutionOutcome::Success {
                captured_lines: vec!["first".to_string()]
            }
        );
    }
}
