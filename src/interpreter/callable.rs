use std::{
    cell::RefCell,
    fmt::{Debug, Display},
    rc::Rc,
};

use crate::ast::{ArrowFunction, Expression};

use super::{scope::Scope, ExecutionError, Interpreter, Value, MAX_CALL_DEPTH};

/// A closure over an arrow function declaration, or one of the two host
/// builtins the dialect exposes.
pub enum Callable {
    Arrow {
        scope: Rc<RefCell<Scope>>,
        decl: Rc<ArrowFunction>,
    },
    Builtin(Builtin),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Prompt,
}

impl Callable {
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        args: &[Expression],
    ) -> Result<Value, ExecutionError> {
        let evaluated_args = args
            .iter()
            .map(|arg| interpreter.evaluate(arg))
            .collect::<Result<Vec<_>, _>>()?;

        match self {
            Callable::Arrow { scope, decl } => {
                // Dialect calls nest native stack frames; bail out before
                // recursion can overflow the host stack.
                if interpreter.call_depth >= MAX_CALL_DEPTH {
                    return Err(ExecutionError::CallDepthExceeded(MAX_CALL_DEPTH));
                }

                let call_scope = Scope::boxed(Some(scope.clone()));
                {
                    // Arity is not enforced: missing arguments bind to
                    // undefined, extras are dropped.
                    let mut call_scope = call_scope.borrow_mut();
                    let mut values = evaluated_args.into_iter();
                    for param in &decl.params {
                        let value = values.next().unwrap_or(Value::Undefined);
                        call_scope.declare(param.clone(), value, true)?;
                    }
                }

                interpreter.call_depth += 1;
                let result = interpreter.execute_in_scope(call_scope, |interpreter| {
                    interpreter.execute(&decl.body)
                });
                interpreter.call_depth -= 1;

                Ok(result?.unwrap_or(Value::Undefined))
            }
            Callable::Builtin(Builtin::Print) => {
                let line = evaluated_args
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                interpreter.print_line(&line)?;
                Ok(Value::Undefined)
            }
            Callable::Builtin(Builtin::Prompt) => {
                // The prompt message never reaches the output buffer;
                // prompts are a dialog concern, not console output.
                interpreter.read_line()
            }
        }
    }
}

// Closures capture their defining scope, which may in turn hold the
// closure itself; keep Debug shallow so it cannot cycle.
impl Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callable::Arrow { decl, .. } => write!(f, "<function({})>", decl.params.len()),
            Callable::Builtin(Builtin::Print) => write!(f, "<builtin print>"),
            Callable::Builtin(Builtin::Prompt) => write!(f, "<builtin prompt>"),
        }
    }
}
