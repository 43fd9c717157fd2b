mod callable;
mod scope;

use std::{
    cell::RefCell,
    fmt::Display,
    io::{BufRead, BufReader, Write},
    rc::Rc,
};

use crate::ast::{Expression, InfixOperator, Literal, Program, Statement, UnaryOperator};

use self::{
    callable::{Builtin, Callable},
    scope::Scope,
};

/// Default number of statement executions a single run may perform before
/// it is aborted. Dialect programs have no cancellation mechanism, so an
/// unbounded loop must be cut off by the executor itself.
pub const DEFAULT_STEP_BUDGET: u64 = 1_000_000;

/// Maximum nesting of function calls. Each dialect call consumes native
/// stack frames, so runaway recursion must be stopped well before the
/// host stack runs out.
pub const MAX_CALL_DEPTH: usize = 256;

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    Closure(Rc<Callable>),
    Undefined,
}

impl Value {
    fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
            Value::Closure(_) => true,
            Value::Undefined => false,
        }
    }

    fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Undefined, Value::Undefined) => true,
            _ => false,
        }
    }
}

/// Console-style stringification: strings print bare, so `print("a")`
/// captures exactly `a`.
impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Closure(c) => write!(f, "{}", c),
            Value::Undefined => write!(f, "undefined"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} is not defined")]
    UndeclaredVariable(String),
    #[error("Identifier \"{0}\" has already been declared")]
    Redeclaration(String),
    #[error("Assignment to constant variable \"{0}\"")]
    AssignmentToConstant(String),
    #[error("{0} is not a function")]
    NotAFunction(String),
    #[error("Invalid operands for {op}: {left} and {right}")]
    InvalidOperands {
        op: InfixOperator,
        left: Value,
        right: Value,
    },
    #[error("Cannot negate {0}")]
    InvalidNegate(Value),
    #[error("Execution exceeded the budget of {0} steps")]
    StepBudgetExhausted(u64),
    #[error("Maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),
}

/// Tree-walking executor for translated host programs. Each interpreter
/// owns its scope chain, its output sink and its input source, so two
/// interpreters never share state and runs cannot observe one another.
pub struct Interpreter {
    scope: Rc<RefCell<Scope>>,
    stdout: Rc<RefCell<dyn Write>>,
    stdin: Rc<RefCell<dyn BufRead>>,
    budget: u64,
    steps_remaining: u64,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Rc::new(RefCell::new(std::io::stdout())))
    }
}

impl Interpreter {
    pub fn new(stdout: Rc<RefCell<dyn Write>>) -> Self {
        Self::with_input(stdout, Rc::new(RefCell::new(BufReader::new(std::io::stdin()))))
    }

    pub fn with_input(stdout: Rc<RefCell<dyn Write>>, stdin: Rc<RefCell<dyn BufRead>>) -> Self {
        let scope = Scope::boxed(None);

        for (name, builtin) in [("print", Builtin::Print), ("prompt", Builtin::Prompt)] {
            scope
                .borrow_mut()
                .declare(
                    name.to_string(),
                    Value::Closure(Rc::new(Callable::Builtin(builtin))),
                    true,
                )
                .expect("builtins declare into an empty scope");
        }

        Self {
            scope,
            stdout,
            stdin,
            budget: DEFAULT_STEP_BUDGET,
            steps_remaining: DEFAULT_STEP_BUDGET,
            call_depth: 0,
        }
    }

    pub fn with_step_budget(mut self, budget: u64) -> Self {
        self.budget = budget;
        self.steps_remaining = budget;
        self
    }

    pub fn interpret(&mut self, program: &Program) -> Result<(), ExecutionError> {
        for stmt in program.0.iter() {
            self.execute(stmt)?;
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Statement) -> Result<Option<Value>, ExecutionError> {
        if self.steps_remaining == 0 {
            return Err(ExecutionError::StepBudgetExhausted(self.budget));
        }
        self.steps_remaining -= 1;

        let result = match stmt {
            Statement::Expression(expression) => {
                self.evaluate(expression)?;
                None
            }
            Statement::VarDeclaration {
                name,
                initializer,
                mutable,
            } => {
                let value = self.evaluate(initializer)?;
                self.scope
                    .borrow_mut()
                    .declare(name.clone(), value, *mutable)?;
                None
            }
            Statement::Block(statements) => {
                self.execute_in_scope(Scope::boxed(Some(self.scope.clone())), |interpreter| {
                    for statement in statements.iter() {
                        let result = interpreter.execute(statement)?;
                        if result.is_some() {
                            return Ok(result);
                        }
                    }
                    Ok(None)
                })?
            }
            Statement::If(condition, then_branch, else_branch) => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?
                } else {
                    None
                }
            }
            Statement::While(condition, body) => {
                let mut res = None;
                while self.evaluate(condition)?.is_truthy() {
                    res = self.execute(body)?;
                    if res.is_some() {
                        break;
                    }
                }
                res
            }
            Statement::Return(expression) => match expression {
                Some(expression) => Some(self.evaluate(expression)?),
                None => Some(Value::Undefined),
            },
        };

        Ok(result)
    }

    fn execute_in_scope<T>(
        &mut self,
        scope: Rc<RefCell<Scope>>,
        f: impl FnOnce(&mut Self) -> Result<T, ExecutionError>,
    ) -> Result<T, ExecutionError> {
        let prev = std::mem::replace(&mut self.scope, scope);
        let result = f(self);
        self.scope = prev;
        result
    }

    fn evaluate(&mut self, expression: &Expression) -> Result<Value, ExecutionError> {
        match expression {
            Expression::Identifier(name) => self
                .scope
                .borrow()
                .get(name)
                .ok_or_else(|| ExecutionError::UndeclaredVariable(name.clone())),
            Expression::Literal(literal) => Ok(match literal {
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Undefined => Value::Undefined,
            }),
            Expression::Grouping(expr) => self.evaluate(expr),
            Expression::Binary(left, op, right) => self.evaluate_binary(left, op, right),
            Expression::Unary(op, expr) => {
                let value = self.evaluate(expr)?;
                match op {
                    UnaryOperator::Negate => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        value => Err(ExecutionError::InvalidNegate(value)),
                    },
                    UnaryOperator::Not => Ok(Value::Boolean(!value.is_truthy())),
                }
            }
            Expression::Assign(name, expr) => {
                let value = self.evaluate(expr)?;
                self.scope.borrow_mut().assign(name, &value)
            }
            Expression::Call(callee, args) => {
                let value = self.evaluate(callee)?;
                let Value::Closure(callable) = value else {
                    return Err(ExecutionError::NotAFunction(value.to_string()));
                };
                callable.call(self, args.as_slice())
            }
            Expression::Arrow(decl) => Ok(Value::Closure(Rc::new(Callable::Arrow {
                scope: self.scope.clone(),
                decl: decl.clone(),
            }))),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expression,
        op: &InfixOperator,
        right: &Expression,
    ) -> Result<Value, ExecutionError> {
        let a = self.evaluate(left)?;

        // Logical operators short-circuit; everything else evaluates both
        // sides eagerly.
        match op {
            InfixOperator::Or => {
                if a.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                let b = self.evaluate(right)?;
                return Ok(Value::Boolean(b.is_truthy()));
            }
            InfixOperator::And => {
                if !a.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                let b = self.evaluate(right)?;
                return Ok(Value::Boolean(b.is_truthy()));
            }
            _ => {}
        }

        let b = self.evaluate(right)?;
        let invalid = |a: Value, b: Value| ExecutionError::InvalidOperands {
            op: op.clone(),
            left: a,
            right: b,
        };

        match op {
            InfixOperator::Equal => Ok(Value::Boolean(a.strict_equals(&b))),
            InfixOperator::NotEqual => Ok(Value::Boolean(!a.strict_equals(&b))),
            InfixOperator::LessThan => match (a, b) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(a < b)),
                (Value::String(a), Value::String(b)) => Ok(Value::Boolean(a < b)),
                (a, b) => Err(invalid(a, b)),
            },
            InfixOperator::LessThanOrEqual => match (a, b) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(a <= b)),
                (Value::String(a), Value::String(b)) => Ok(Value::Boolean(a <= b)),
                (a, b) => Err(invalid(a, b)),
            },
            InfixOperator::GreaterThan => match (a, b) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(a > b)),
                (Value::String(a), Value::String(b)) => Ok(Value::Boolean(a > b)),
                (a, b) => Err(invalid(a, b)),
            },
            InfixOperator::GreaterThanOrEqual => match (a, b) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(a >= b)),
                (Value::String(a), Value::String(b)) => Ok(Value::Boolean(a >= b)),
                (a, b) => Err(invalid(a, b)),
            },
            InfixOperator::Plus => match (a, b) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                // String concatenation stringifies the other operand, so
                // "x = " + 1 works the way dialect programs expect.
                (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, b))),
                (a, Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
                (a, b) => Err(invalid(a, b)),
            },
            InfixOperator::Minus => match (a, b) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                (a, b) => Err(invalid(a, b)),
            },
            InfixOperator::Multiply => match (a, b) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
                (a, b) => Err(invalid(a, b)),
            },
            InfixOperator::Divide => match (a, b) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
                (a, b) => Err(invalid(a, b)),
            },
            InfixOperator::And | InfixOperator::Or => unreachable!("handled above"),
        }
    }

    fn print_line(&mut self, line: &str) -> Result<(), ExecutionError> {
        writeln!(self.stdout.borrow_mut(), "{}", line)?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Value, ExecutionError> {
        let mut buffer = String::new();
        let read = self.stdin.borrow_mut().read_line(&mut buffer)?;
        if read == 0 {
            return Ok(Value::Undefined);
        }
        while buffer.ends_with('\n') || buffer.ends_with('\r') {
            buffer.pop();
        }
        Ok(Value::String(buffer))
    }
}
