use axislang::pipeline::{self, ExecutionOutcome};
use axislang::tokenizer::TokenClass;

fn run_valid_program(source: &str) -> Vec<String> {
    match pipeline::translate_and_run(source).outcome {
        ExecutionOutcome::Success { captured_lines } => captured_lines,
        ExecutionOutcome::Failure { message, .. } => {
            panic!("program should run without error, got: {message}")
        }
    }
}

#[test]
fn test_hello_world() {
    let source = r#"
    mutate helloWorld = () => {
        speakOut("Hello, World!");
    };
    helloWorld();
    "#;
    assert_eq!(run_valid_program(source), vec!["Hello, World!"]);
}

#[test]
fn test_counted_loop() {
    let source = r#"
    loopTimes (mutate i = 0; i < 5; i++) {
        speakOut(i);
    }
    "#;
    assert_eq!(run_valid_program(source), vec!["0", "1", "2", "3", "4"]);
}

#[test]
fn test_conditional_chain() {
    let source = r#"
    immutable grade = 72;
    whatIf (grade >= 90) {
        speakOut("A");
    } howAbout (grade >= 70) {
        speakOut("B");
    } otherwise {
        speakOut("C");
    }
    "#;
    assert_eq!(run_valid_program(source), vec!["B"]);
}

#[test]
fn test_while_loop_with_constants() {
    let source = r#"
    mutate going = absolutely;
    mutate i = 0;
    keepLooping (going) {
        i = i + 1;
        whatIf (i == 3) {
            going = noWay;
        }
    }
    speakOut(i);
    "#;
    assert_eq!(run_valid_program(source), vec!["3"]);
}

#[test]
fn test_closures_and_recursion() {
    let source = r#"
    mutate fib = (n) => {
        whatIf (n <= 1) {
            return n;
        }
        return fib(n - 1) + fib(n - 2);
    };
    loopTimes (mutate i = 0; i < 8; i++) {
        speakOut(fib(i));
    }
    "#;
    assert_eq!(
        run_valid_program(source),
        vec!["0", "1", "1", "2", "3", "5", "8", "13"]
    );
}

#[test]
fn test_immutable_binding_rejects_reassignment() {
    let result = pipeline::translate_and_run("immutable x = 1; x = 2;");
    let ExecutionOutcome::Failure { message, .. } = result.outcome else {
        panic!("expected failure");
    };
    assert!(message.contains("constant"), "unexpected message: {message}");
}

#[test]
fn test_undefined_function_reports_error() {
    let result = pipeline::translate_and_run("speakOut(1); missingFunction();");
    let ExecutionOutcome::Failure {
        message,
        captured_lines,
    } = result.outcome
    else {
        panic!("expected failure");
    };
    assert!(!message.is_empty());
    // Output captured before the error stays visible.
    assert_eq!(captured_lines, vec!["1"]);
}

#[test]
fn test_syntax_error_from_translated_source() {
    let result = pipeline::translate_and_run("whatIf (");
    assert!(matches!(
        result.outcome,
        ExecutionOutcome::Failure { .. }
    ));
}

#[test]
fn test_tokens_and_outcome_are_both_reported() {
    let result = pipeline::translate_and_run("speakOut(\"hi\");");
    assert!(!result.tokens.is_empty());
    assert_eq!(result.tokens[0].class, TokenClass::Function);
    assert!(matches!(
        result.outcome,
        ExecutionOutcome::Success { .. }
    ));
}

#[test]
fn test_tokenize_is_independent_of_execution() {
    // Structurally broken programs still tokenize fully.
    let tokens = pipeline::tokenize("whatIf ( mutate = }");
    assert_eq!(tokens.len(), 5);
    assert!(tokens.iter().any(|t| t.class == TokenClass::Keyword));
}

#[test]
fn test_identifier_containing_keyword_survives_translation() {
    let source = r#"
    mutate mutateCount = 2;
    speakOut(mutateCount);
    "#;
    assert_eq!(run_valid_program(source), vec!["2"]);
}

#[test]
fn test_runaway_recursion_is_cut_off() {
    let result = pipeline::translate_and_run("mutate f = () => { return f(); }; f();");
    let ExecutionOutcome::Failure { message, .. } = result.outcome else {
        panic!("expected failure");
    };
    assert!(message.contains("call depth"), "unexpected message: {message}");
}

#[test]
fn test_runaway_loop_is_cut_off() {
    let result = pipeline::translate_and_run("keepLooping (absolutely) { mutate x = 1; }");
    let ExecutionOutcome::Failure { message, .. } = result.outcome else {
        panic!("expected failure");
    };
    assert!(message.contains("budget"), "unexpected message: {message}");
}
