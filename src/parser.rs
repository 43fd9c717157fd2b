use std::rc::Rc;

use crate::{
    ast::{ArrowFunction, Expression, InfixOperator, Literal, Program, Statement, UnaryOperator},
    scanner::{Token, TokenType},
};

#[derive(Debug)]
pub struct ParseErrors(Vec<ParseErrorWithContext>);

impl std::error::Error for ParseErrors {}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl From<ParseErrorWithContext> for ParseErrors {
    fn from(error: ParseErrorWithContext) -> Self {
        ParseErrors(vec![error])
    }
}

#[derive(Debug)]
pub struct ParseErrorWithContext {
    pub error: ParseError,
    pub token: Option<Token>,
}

impl std::fmt::Display for ParseErrorWithContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(token) = &self.token {
            write!(
                f,
                " on line {} but found \"{}\"",
                token.line, token.token_type
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Expected \"{0}\"")]
    Expected(TokenType),
    #[error("Expected one of {0:?}")]
    ExpectedOneOf(Vec<TokenType>),
    #[error("Unexpected \"{0}\"")]
    Unexpected(TokenType),
    #[error("Expected identifier")]
    ExpectedIdentifier,
    #[error("Invalid assignment target")]
    InvalidAssignmentTarget,
}

fn error(error: ParseError, tokens: &[Token]) -> ParseErrorWithContext {
    ParseErrorWithContext {
        error,
        token: tokens.first().cloned(),
    }
}

pub fn program(tokens: &[Token]) -> Result<Program, ParseErrors> {
    let mut statements = Vec::new();
    let mut tokens = tokens;
    let mut errors = Vec::new();

    while tokens.len() > 1 {
        match declaration(tokens) {
            Ok((stmt, rest)) => {
                statements.push(stmt);
                tokens = rest;
            }
            Err(mut err) => {
                errors.append(&mut err.0);
                tokens = consume_until_after(tokens, &[TokenType::Semicolon]);
            }
        }
    }

    if tokens.first().map(Token::token_type) != Some(&TokenType::Eof) {
        errors.push(error(ParseError::Expected(TokenType::Eof), tokens));
    }

    if !errors.is_empty() {
        return Err(ParseErrors(errors));
    }

    Ok(Program(statements))
}

fn consume_until_after<'a>(tokens: &'a [Token], token_types: &[TokenType]) -> &'a [Token] {
    let mut tokens = tokens;
    while let Some(token) = tokens.first() {
        if token.token_type() == &TokenType::Eof {
            return tokens;
        }
        if token_types.iter().any(|t| t == token.token_type()) {
            return &tokens[1..];
        }
        tokens = &tokens[1..];
    }
    tokens
}

fn declaration(tokens: &[Token]) -> Result<(Statement, &[Token]), ParseErrors> {
    match tokens.first().map(Token::token_type) {
        Some(TokenType::Let) => Ok(var_declaration(&tokens[1..], true)?),
        Some(TokenType::Const) => Ok(var_declaration(&tokens[1..], false)?),
        _ => statement(tokens),
    }
}

fn var_declaration(
    tokens: &[Token],
    mutable: bool,
) -> Result<(Statement, &[Token]), ParseErrorWithContext> {
    let (name, tokens) = match_identifier(tokens)?;
    let (initializer, tokens) = match tokens.first().map(Token::token_type) {
        Some(TokenType::Equal) => expression(&tokens[1..])?,
        _ => (Expression::Literal(Literal::Undefined), tokens),
    };
    let tokens = consume(tokens, TokenType::Semicolon)?;
    Ok((
        Statement::VarDeclaration {
            name,
            initializer,
            mutable,
        },
        tokens,
    ))
}

fn statement(tokens: &[Token]) -> Result<(Statement, &[Token]), ParseErrors> {
    match tokens.first().map(Token::token_type) {
        Some(TokenType::LeftBrace) => block(&tokens[1..]),
        Some(TokenType::If) => if_statement(&tokens[1..]),
        Some(TokenType::While) => while_statement(&tokens[1..]),
        Some(TokenType::For) => for_statement(&tokens[1..]),
        Some(TokenType::Return) => Ok(return_statement(&tokens[1..])?),
        _ => Ok(expression_statement(tokens)?),
    }
}

fn block(tokens: &[Token]) -> Result<(Statement, &[Token]), ParseErrors> {
    let mut statements = Vec::new();
    let mut tokens = tokens;
    let mut errors = Vec::new();

    while let Some(token) = tokens.first() {
        if token.token_type() == &TokenType::RightBrace {
            if errors.is_empty() {
                return Ok((Statement::Block(statements), &tokens[1..]));
            }
            return Err(ParseErrors(errors));
        }
        if token.token_type() == &TokenType::Eof {
            break;
        }

        match declaration(tokens) {
            Ok((stmt, rest)) => {
                statements.push(stmt);
                tokens = rest;
            }
            Err(mut err) => {
                errors.append(&mut err.0);
                tokens = consume_until_after(tokens, &[TokenType::Semicolon, TokenType::RightBrace]);
            }
        }
    }

    errors.push(error(ParseError::Expected(TokenType::RightBrace), tokens));
    Err(ParseErrors(errors))
}

fn if_statement(tokens: &[Token]) -> Result<(Statement, &[Token]), ParseErrors> {
    let tokens = consume(tokens, TokenType::LeftParen)?;
    let (condition, tokens) = expression(tokens)?;
    let tokens = consume(tokens, TokenType::RightParen)?;
    let (then_branch, tokens) = statement(tokens)?;

    // An `else if` chain is just an if-statement hanging off the else.
    if let Some(TokenType::Else) = tokens.first().map(Token::token_type) {
        let (else_branch, tokens) = statement(&tokens[1..])?;
        Ok((
            Statement::If(
                condition,
                Box::new(then_branch),
                Some(Box::new(else_branch)),
            ),
            tokens,
        ))
    } else {
        Ok((
            Statement::If(condition, Box::new(then_branch), None),
            tokens,
        ))
    }
}

fn while_statement(tokens: &[Token]) -> Result<(Statement, &[Token]), ParseErrors> {
    let tokens = consume(tokens, TokenType::LeftParen)?;
    let (condition, tokens) = expression(tokens)?;
    let tokens = consume(tokens, TokenType::RightParen)?;
    let (body, tokens) = statement(tokens)?;
    Ok((Statement::While(condition, Box::new(body)), tokens))
}

/// C-style `for` desugars to a block holding the initializer and a while
/// loop whose body appends the increment.
fn for_statement(tokens: &[Token]) -> Result<(Statement, &[Token]), ParseErrors> {
    let tokens = consume(tokens, TokenType::LeftParen)?;

    let (initializer, tokens) = match tokens.first().map(Token::token_type) {
        Some(TokenType::Semicolon) => (
            Statement::Expression(Expression::Literal(Literal::Undefined)),
            &tokens[1..],
        ),
        Some(TokenType::Let) => var_declaration(&tokens[1..], true)?,
        Some(TokenType::Const) => var_declaration(&tokens[1..], false)?,
        _ => expression_statement(tokens)?,
    };

    let (condition, tokens) = if tokens.first().map(Token::token_type) != Some(&TokenType::Semicolon)
    {
        expression(tokens)?
    } else {
        (Expression::Literal(Literal::Boolean(true)), tokens)
    };

    let tokens = consume(tokens, TokenType::Semicolon)?;

    let (increment, tokens) = match tokens.first().map(Token::token_type) {
        Some(TokenType::RightParen) => (Expression::Literal(Literal::Undefined), tokens),
        _ => expression(tokens)?,
    };

    let tokens = consume(tokens, TokenType::RightParen)?;

    let (body, tokens) = statement(tokens)?;

    Ok((
        Statement::Block(vec![
            initializer,
            Statement::While(
                condition,
                Box::new(Statement::Block(vec![
                    body,
                    Statement::Expression(increment),
                ])),
            ),
        ]),
        tokens,
    ))
}

fn return_statement(tokens: &[Token]) -> Result<(Statement, &[Token]), ParseErrorWithContext> {
    if tokens.first().map(Token::token_type) == Some(&TokenType::Semicolon) {
        return Ok((Statement::Return(None), &tokens[1..]));
    }
    let (expr, tokens) = expression(tokens)?;
    let tokens = consume(tokens, TokenType::Semicolon)?;
    Ok((Statement::Return(Some(expr)), tokens))
}

fn expression_statement(tokens: &[Token]) -> Result<(Statement, &[Token]), ParseErrorWithContext> {
    let (expr, tokens) = expression(tokens)?;
    let tokens = consume(tokens, TokenType::Semicolon)?;
    Ok((Statement::Expression(expr), tokens))
}

fn expression(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseErrorWithContext> {
    if let Some(result) = arrow(tokens)? {
        return Ok(result);
    }
    assignment(tokens)
}

/// Arrow functions need lookahead: `(a, b) =>` shares a prefix with a
/// parenthesized expression, so scan ahead for the `=>` before committing.
fn arrow(tokens: &[Token]) -> Result<Option<(Expression, &[Token])>, ParseErrorWithContext> {
    let params_end = match tokens.first().map(Token::token_type) {
        Some(TokenType::Identifier(name)) => {
            if tokens.get(1).map(Token::token_type) == Some(&TokenType::Arrow) {
                let (body, rest) = arrow_body(&tokens[2..])?;
                return Ok(Some((
                    Expression::Arrow(Rc::new(ArrowFunction {
                        params: vec![name.clone()],
                        body,
                    })),
                    rest,
                )));
            }
            return Ok(None);
        }
        Some(TokenType::LeftParen) => {
            // Only identifiers and commas may appear in a parameter list;
            // anything else means this is a parenthesized expression.
            let mut end = 1;
            loop {
                match tokens.get(end).map(Token::token_type) {
                    Some(TokenType::RightParen) => break,
                    Some(TokenType::Identifier(_)) | Some(TokenType::Comma) => end += 1,
                    _ => return Ok(None),
                }
            }
            end
        }
        _ => return Ok(None),
    };

    if tokens.get(params_end + 1).map(Token::token_type) != Some(&TokenType::Arrow) {
        return Ok(None);
    }

    let mut params = Vec::new();
    let mut rest = &tokens[1..params_end];
    while let Some(token) = rest.first() {
        match token.token_type() {
            TokenType::Identifier(name) => params.push(name.clone()),
            _ => return Err(error(ParseError::ExpectedIdentifier, rest)),
        }
        rest = &rest[1..];
        match rest.first().map(Token::token_type) {
            Some(TokenType::Comma) => rest = &rest[1..],
            None => break,
            _ => {
                return Err(error(
                    ParseError::ExpectedOneOf(vec![TokenType::Comma, TokenType::RightParen]),
                    rest,
                ))
            }
        }
    }

    let (body, rest) = arrow_body(&tokens[params_end + 2..])?;
    Ok(Some((
        Expression::Arrow(Rc::new(ArrowFunction { params, body })),
        rest,
    )))
}

fn arrow_body(tokens: &[Token]) -> Result<(Statement, &[Token]), ParseErrorWithContext> {
    if tokens.first().map(Token::token_type) == Some(&TokenType::LeftBrace) {
        return block(&tokens[1..]).map_err(flatten);
    }
    // Expression body: the value is the implicit return.
    let (expr, rest) = expression(tokens)?;
    Ok((Statement::Return(Some(expr)), rest))
}

fn flatten(mut errors: ParseErrors) -> ParseErrorWithContext {
    errors
        .0
        .drain(..)
        .next()
        .expect("ParseErrors always holds at least one error")
}

fn assignment(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseErrorWithContext> {
    let (expr, rest) = logical_or(tokens)?;

    match rest.first().map(Token::token_type) {
        Some(TokenType::Equal) => match expr {
            Expression::Identifier(name) => {
                let (value, rest) = expression(&rest[1..])?;
                Ok((Expression::Assign(name, Box::new(value)), rest))
            }
            _ => Err(error(ParseError::InvalidAssignmentTarget, rest)),
        },
        _ => Ok((expr, rest)),
    }
}

fn binary<'a>(
    precedence: impl Fn(&'a [Token]) -> Result<(Expression, &'a [Token]), ParseErrorWithContext>,
    operator: impl Fn(&Token) -> Option<InfixOperator>,
    tokens: &'a [Token],
) -> Result<(Expression, &'a [Token]), ParseErrorWithContext> {
    let (mut expr, mut tokens) = precedence(tokens)?;

    while let Some(token) = tokens.first() {
        let op = match operator(token) {
            Some(op) => op,
            None => break,
        };
        let (right, rest) = precedence(&tokens[1..])?;
        expr = Expression::Binary(Box::new(expr), op, Box::new(right));
        tokens = rest;
    }

    Ok((expr, tokens))
}

fn logical_or(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseErrorWithContext> {
    binary(
        logical_and,
        |token| match token.token_type() {
            TokenType::PipePipe => Some(InfixOperator::Or),
            _ => None,
        },
        tokens,
    )
}

fn logical_and(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseErrorWithContext> {
    binary(
        equality,
        |token| match token.token_type() {
            TokenType::AmpAmp => Some(InfixOperator::And),
            _ => None,
        },
        tokens,
    )
}

fn equality(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseErrorWithContext> {
    binary(
        comparison,
        |token| match token.token_type() {
            TokenType::EqualEqual => Some(InfixOperator::Equal),
            TokenType::BangEqual => Some(InfixOperator::NotEqual),
            _ => None,
        },
        tokens,
    )
}

fn comparison(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseErrorWithContext> {
    binary(
        term,
        |token| match token.token_type() {
            TokenType::Less => Some(InfixOperator::LessThan),
            TokenType::LessEqual => Some(InfixOperator::LessThanOrEqual),
            TokenType::Greater => Some(InfixOperator::GreaterThan),
            TokenType::GreaterEqual => Some(InfixOperator::GreaterThanOrEqual),
            _ => None,
        },
        tokens,
    )
}

fn term(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseErrorWithContext> {
    binary(
        factor,
        |token| match token.token_type() {
            TokenType::Plus => Some(InfixOperator::Plus),
            TokenType::Minus => Some(InfixOperator::Minus),
            _ => None,
        },
        tokens,
    )
}

fn factor(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseErrorWithContext> {
    binary(
        unary,
        |token| match token.token_type() {
            TokenType::Star => Some(InfixOperator::Multiply),
            TokenType::Slash => Some(InfixOperator::Divide),
            _ => None,
        },
        tokens,
    )
}

fn unary(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseErrorWithContext> {
    let operator = match tokens.first().map(Token::token_type) {
        Some(TokenType::Minus) => UnaryOperator::Negate,
        Some(TokenType::Bang) => UnaryOperator::Not,
        _ => return postfix(tokens),
    };

    let (right, rest) = unary(&tokens[1..])?;
    Ok((Expression::Unary(operator, Box::new(right)), rest))
}

/// Postfix `++`/`--` on an identifier, desugared to an assignment of the
/// incremented value. Used by translated `loopTimes` increments.
fn postfix(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseErrorWithContext> {
    let (expr, rest) = call(tokens)?;

    let op = match rest.first().map(Token::token_type) {
        Some(TokenType::PlusPlus) => InfixOperator::Plus,
        Some(TokenType::MinusMinus) => InfixOperator::Minus,
        _ => return Ok((expr, rest)),
    };

    match expr {
        Expression::Identifier(name) => {
            let step = Expression::Binary(
                Box::new(Expression::Identifier(name.clone())),
                op,
                Box::new(Expression::Literal(Literal::Number(1.0))),
            );
            Ok((Expression::Assign(name, Box::new(step)), &rest[1..]))
        }
        _ => Err(error(ParseError::InvalidAssignmentTarget, rest)),
    }
}

fn call(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseErrorWithContext> {
    let (mut expr, mut tokens) = primary(tokens)?;

    while let Some(TokenType::LeftParen) = tokens.first().map(Token::token_type) {
        let mut args = Vec::new();
        tokens = &tokens[1..];

        loop {
            if tokens.first().map(Token::token_type) == Some(&TokenType::RightParen) {
                tokens = &tokens[1..];
                break;
            }
            let (arg, rest) = expression(tokens)?;
            args.push(arg);
            tokens = rest;
            match tokens.first().map(Token::token_type) {
                Some(TokenType::Comma) => tokens = &tokens[1..],
                Some(TokenType::RightParen) => {
                    tokens = &tokens[1..];
                    break;
                }
                _ => {
                    return Err(error(
                        ParseError::ExpectedOneOf(vec![TokenType::Comma, TokenType::RightParen]),
                        tokens,
                    ))
                }
            }
        }

        expr = Expression::Call(Box::new(expr), args);
    }

    Ok((expr, tokens))
}

fn primary(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseErrorWithContext> {
    let Some(token) = tokens.first() else {
        return Err(error(ParseError::Unexpected(TokenType::Eof), tokens));
    };

    match token.token_type() {
        TokenType::Number(n) => Ok((Expression::Literal(Literal::Number(*n)), &tokens[1..])),
        TokenType::String(s) => Ok((
            Expression::Literal(Literal::String(s.clone())),
            &tokens[1..],
        )),
        TokenType::True => Ok((Expression::Literal(Literal::Boolean(true)), &tokens[1..])),
        TokenType::False => Ok((Expression::Literal(Literal::Boolean(false)), &tokens[1..])),
        TokenType::LeftParen => {
            let (expr, rest) = expression(&tokens[1..])?;
            let tokens = consume(rest, TokenType::RightParen)?;
            Ok((Expression::Grouping(Box::new(expr)), tokens))
        }
        TokenType::Identifier(name) => Ok((Expression::Identifier(name.clone()), &tokens[1..])),
        token_type => Err(error(ParseError::Unexpected(token_type.clone()), tokens)),
    }
}

fn consume(tokens: &[Token], token_type: TokenType) -> Result<&[Token], ParseErrorWithContext> {
    match tokens.first().map(Token::token_type) {
        Some(t) if t == &token_type => Ok(&tokens[1..]),
        _ => Err(error(ParseError::Expected(token_type), tokens)),
    }
}

fn match_identifier(tokens: &[Token]) -> Result<(String, &[Token]), ParseErrorWithContext> {
    match tokens.first().map(Token::token_type) {
        Some(TokenType::Identifier(name)) => Ok((name.clone(), &tokens[1..])),
        _ => Err(error(ParseError::ExpectedIdentifier, tokens)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scanner;

    fn parse(source: &str) -> Program {
        let tokens = scanner::tokens(source).expect("test source should scan");
        program(&tokens).expect("test source should parse")
    }

    #[test]
    fn test_var_declarations() {
        let program = parse("let x = 1; const y = 2; let z;");
        assert_eq!(program.0.len(), 3);
        assert!(matches!(
            &program.0[0],
            Statement::VarDeclaration { mutable: true, .. }
        ));
        assert!(matches!(
            &program.0[1],
            Statement::VarDeclaration { mutable: false, .. }
        ));
        assert!(matches!(
            &program.0[2],
            Statement::VarDeclaration {
                initializer: Expression::Literal(Literal::Undefined),
                ..
            }
        ));
    }

    #[test]
    fn test_else_if_chain() {
        let program = parse("if (a) { b(); } else if (c) { d(); } else { e(); }");
        let Statement::If(_, _, Some(else_branch)) = &program.0[0] else {
            panic!("expected if with else branch");
        };
        assert!(matches!(else_branch.as_ref(), Statement::If(_, _, Some(_))));
    }

    #[test]
    fn test_arrow_function_block_body() {
        let program = parse("let f = () => { g(); };");
        let Statement::VarDeclaration { initializer, .. } = &program.0[0] else {
            panic!("expected declaration");
        };
        let Expression::Arrow(arrow) = initializer else {
            panic!("expected arrow function");
        };
        assert!(arrow.params.is_empty());
        assert!(matches!(&arrow.body, Statement::Block(_)));
    }

    #[test]
    fn test_arrow_function_expression_body() {
        let program = parse("let double = x => x * 2;");
        let Statement::VarDeclaration { initializer, .. } = &program.0[0] else {
            panic!("expected declaration");
        };
        let Expression::Arrow(arrow) = initializer else {
            panic!("expected arrow function");
        };
        assert_eq!(arrow.params, vec!["x".to_string()]);
        assert!(matches!(&arrow.body, Statement::Return(Some(_))));
    }

    #[test]
    fn test_parenthesized_expression_is_not_arrow() {
        let program = parse("let x = (1 + 2) * 3;");
        let Statement::VarDeclaration { initializer, .. } = &program.0[0] else {
            panic!("expected declaration");
        };
        assert!(matches!(initializer, Expression::Binary(_, _, _)));
    }

    #[test]
    fn test_for_desugars_to_while() {
        let program = parse("for (let i = 0; i < 3; i++) { f(i); }");
        let Statement::Block(parts) = &program.0[0] else {
            panic!("expected desugared block");
        };
        assert!(matches!(&parts[0], Statement::VarDeclaration { .. }));
        assert!(matches!(&parts[1], Statement::While(_, _)));
    }

    #[test]
    fn test_missing_semicolon_reports_error() {
        let tokens = scanner::tokens("let x = 1").unwrap();
        let result = program(&tokens);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Expected \";\""));
    }
}
