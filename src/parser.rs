use std::mem;

use log::debug;

use crate::ast::{BlockStatement, Expression, ExpressionKind, InfixOperator, PrefixOperator, Program, Statement, StatementKind};
use crate::error::ParseError;
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equals,
        TokenKind::Less | TokenKind::Greater => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash => Precedence::Product,
        TokenKind::LeftParen | TokenKind::LeftBracket => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

fn infix_operator(kind: TokenKind) -> Option<InfixOperator> {
    match kind {
        TokenKind::Plus => Some(InfixOperator::Add),
        TokenKind::Minus => Some(InfixOperator::Subtract),
        TokenKind::Asterisk => Some(InfixOperator::Multiply),
        TokenKind::Slash => Some(InfixOperator::Divide),
        TokenKind::Less => Some(InfixOperator::Less),
        TokenKind::Greater => Some(InfixOperator::Greater),
        TokenKind::EqualEqual => Some(InfixOperator::Equal),
        TokenKind::BangEqual => Some(InfixOperator::NotEqual),
        _ => None,
    }
}

type PrefixRule<T> = fn(&mut Parser<T>) -> Option<Expression>;
type InfixRule<T> = fn(&mut Parser<T>, Expression) -> Option<Expression>;

/// Recursive descent over statements, Pratt parsing over expressions.
///
/// Every parse function starts with `current` on the first token of its
/// construct and leaves `current` on the last one. A failing function records
/// a `ParseError` and returns `None`; the statement loops then skip ahead to
/// the end of the statement and carry on, so one run reports every error it
/// can find.
pub struct Parser<T: Iterator<Item = Token>> {
    tokens: T,
    current: Token,
    peek: Token,
    errors: Vec<ParseError>,
    depth: usize,
}

impl<T: Iterator<Item = Token>> Parser<T> {
    pub fn new(mut tokens: T) -> Self {
        let current = tokens.next().unwrap_or_else(|| Token::eof(0));
        let at = current.span.1;
        let peek = tokens.next().unwrap_or_else(|| Token::eof(at));

        Parser {
            tokens,
            current,
            peek,
            errors: Vec::new(),
            depth: 0,
        }
    }

    pub fn parse_program(mut self) -> (Program, Vec<ParseError>) {
        let mut program = Program::default();

        while !self.current.is(TokenKind::Eof) {
            match self.parse_statement() {
                Some(statement) => {
                    program.statements.push(statement);
                    self.next_token();
                }
                None => self.synchronize(),
            }
        }

        (program, self.errors)
    }

    fn next_token(&mut self) {
        let at = self.peek.span.1;
        let next = self.tokens.next().unwrap_or_else(|| Token::eof(at));
        self.current = mem::replace(&mut self.peek, next);
    }

    fn error(&mut self, error: ParseError) {
        debug!("parse error at {:?}: {}", error.span(), error);
        self.errors.push(error);
    }

    fn expect_peek(&mut self, kind: TokenKind) -> Option<()> {
        if self.peek.is(kind) {
            self.next_token();
            Some(())
        } else {
            self.error(ParseError::UnexpectedToken {
                expected: kind,
                found: self.peek.kind,
                span: self.peek.span,
            });
            None
        }
    }

    /// Skips to the end of the broken statement. Inside a block the closing
    /// brace is left in place for the block loop.
    fn synchronize(&mut self) {
        loop {
            match self.current.kind {
                TokenKind::Semicolon => {
                    self.next_token();
                    return;
                }
                TokenKind::Eof => return,
                TokenKind::RightBrace if self.depth > 0 => return,
                _ => self.next_token(),
            }
        }
    }

    fn skip_semicolon(&mut self) {
        if self.peek.is(TokenKind::Semicolon) {
            self.next_token();
        }
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.current.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    /// A `let` missing its name or `=` is reported once and still produces a
    /// statement, with an empty name when none was written, as long as a
    /// value follows.
    fn parse_let_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();

        let name = self.expect_peek(TokenKind::Identifier).map(|()| self.current.literal.clone());

        if self.peek.is(TokenKind::Assign) {
            self.next_token();
        } else if name.is_some() {
            let _ = self.expect_peek(TokenKind::Assign);
        }

        let complete = name.is_some() && self.current.is(TokenKind::Assign);
        self.next_token();

        if !complete && Self::prefix_rule(self.current.kind).is_none() {
            return None;
        }

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Some(Statement::new(token, StatementKind::Let {
            name: name.unwrap_or_default(),
            value,
        }))
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Some(Statement::new(token, StatementKind::Return(value)))
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Some(Statement::new(token, StatementKind::Expression(expression)))
    }

    fn parse_block_statement(&mut self) -> Option<BlockStatement> {
        let mut block = BlockStatement::new(self.current.clone(), Vec::new());
        self.depth += 1;
        self.next_token();

        while !self.current.is(TokenKind::RightBrace) && !self.current.is(TokenKind::Eof) {
            match self.parse_statement() {
                Some(statement) => {
                    block.statements.push(statement);
                    self.next_token();
                }
                None => self.synchronize(),
            }
        }

        self.depth -= 1;

        if self.current.is(TokenKind::Eof) {
            self.error(ParseError::UnexpectedToken {
                expected: TokenKind::RightBrace,
                found: TokenKind::Eof,
                span: self.current.span,
            });
            return None;
        }

        Some(block)
    }

    fn prefix_rule(kind: TokenKind) -> Option<PrefixRule<T>> {
        match kind {
            TokenKind::Identifier => Some(Self::parse_identifier),
            TokenKind::Int => Some(Self::parse_integer_literal),
            TokenKind::String => Some(Self::parse_string_literal),
            TokenKind::True | TokenKind::False => Some(Self::parse_boolean),
            TokenKind::Bang | TokenKind::Minus => Some(Self::parse_prefix_expression),
            TokenKind::LeftParen => Some(Self::parse_grouped_expression),
            TokenKind::If => Some(Self::parse_if_expression),
            TokenKind::Function => Some(Self::parse_function_literal),
            TokenKind::Macro => Some(Self::parse_macro_literal),
            TokenKind::LeftBracket => Some(Self::parse_array_literal),
            TokenKind::LeftBrace => Some(Self::parse_dict_literal),
            _ => None,
        }
    }

    fn infix_rule(kind: TokenKind) -> Option<InfixRule<T>> {
        match kind {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Asterisk
            | TokenKind::Slash
            | TokenKind::Less
            | TokenKind::Greater
            | TokenKind::EqualEqual
            | TokenKind::BangEqual => Some(Self::parse_infix_expression),
            TokenKind::LeftParen => Some(Self::parse_call_expression),
            TokenKind::LeftBracket => Some(Self::parse_index_expression),
            _ => None,
        }
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let prefix = match Self::prefix_rule(self.current.kind) {
            Some(rule) => rule,
            None => {
                self.error(ParseError::NoPrefixRule {
                    kind: self.current.kind,
                    span: self.current.span,
                });
                return None;
            }
        };

        let mut left = prefix(self)?;

        while !self.peek.is(TokenKind::Semicolon) && precedence < precedence_of(self.peek.kind) {
            let infix = match Self::infix_rule(self.peek.kind) {
                Some(rule) => rule,
                None => return Some(left),
            };

            self.next_token();
            left = infix(self, left)?;
        }

        Some(left)
    }

    fn parse_identifier(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let name = token.literal.clone();

        Some(Expression::new(token, ExpressionKind::Identifier(name)))
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        match self.current.literal.parse::<i64>() {
            Ok(value) => Some(Expression::new(self.current.clone(), ExpressionKind::Integer(value))),
            Err(_) => {
                self.error(ParseError::InvalidInteger {
                    literal: self.current.literal.clone(),
                    span: self.current.span,
                });
                None
            }
        }
    }

    fn parse_string_literal(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let value = token.literal.clone();

        Some(Expression::new(token, ExpressionKind::String(value)))
    }

    fn parse_boolean(&mut self) -> Option<Expression> {
        let value = self.current.is(TokenKind::True);
        Some(Expression::new(self.current.clone(), ExpressionKind::Boolean(value)))
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let operator = match token.kind {
            TokenKind::Bang => PrefixOperator::Not,
            _ => PrefixOperator::Negate,
        };

        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;

        Some(Expression::new(token, ExpressionKind::Prefix {
            operator,
            right: Box::new(right),
        }))
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let token = self.current.clone();
        let operator = infix_operator(token.kind)?;
        let precedence = precedence_of(token.kind);

        self.next_token();
        let right = self.parse_expression(precedence)?;

        Some(Expression::new(token, ExpressionKind::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }))
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();

        let expression = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParen)?;

        Some(expression)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek.is(TokenKind::Else) {
            self.next_token();
            self.expect_peek(TokenKind::LeftBrace)?;
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Some(Expression::new(token, ExpressionKind::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        }))
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let (parameters, body) = self.parse_parameters_and_body()?;

        Some(Expression::new(token, ExpressionKind::Function { parameters, body }))
    }

    fn parse_macro_literal(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let (parameters, body) = self.parse_parameters_and_body()?;

        Some(Expression::new(token, ExpressionKind::Macro { parameters, body }))
    }

    fn parse_parameters_and_body(&mut self) -> Option<(Vec<String>, BlockStatement)> {
        self.expect_peek(TokenKind::LeftParen)?;
        let parameters = self.parse_function_parameters()?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let body = self.parse_block_statement()?;

        Some((parameters, body))
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<String>> {
        let mut parameters = Vec::new();

        if self.peek.is(TokenKind::RightParen) {
            self.next_token();
            return Some(parameters);
        }

        self.expect_peek(TokenKind::Identifier)?;
        parameters.push(self.current.literal.clone());

        while self.peek.is(TokenKind::Comma) {
            self.next_token();
            self.expect_peek(TokenKind::Identifier)?;
            parameters.push(self.current.literal.clone());
        }

        self.expect_peek(TokenKind::RightParen)?;

        Some(parameters)
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expression>> {
        let mut list = Vec::new();

        if self.peek.is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek.is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;

        Some(list)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let token = self.current.clone();
        let arguments = self.parse_expression_list(TokenKind::RightParen)?;

        Some(Expression::new(token, ExpressionKind::Call {
            function: Box::new(function),
            arguments,
        }))
    }

    fn parse_array_literal(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let elements = self.parse_expression_list(TokenKind::RightBracket)?;

        Some(Expression::new(token, ExpressionKind::Array(elements)))
    }

    fn parse_index_expression(&mut self, left: Expression) -> Option<Expression> {
        let token = self.current.clone();
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightBracket)?;

        Some(Expression::new(token, ExpressionKind::Index {
            left: Box::new(left),
            index: Box::new(index),
        }))
    }

    fn parse_dict_literal(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let mut pairs = Vec::new();

        while !self.peek.is(TokenKind::RightBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;

            self.expect_peek(TokenKind::Colon)?;
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;

            pairs.push((key, value));

            if !self.peek.is(TokenKind::RightBrace) {
                self.expect_peek(TokenKind::Comma)?;
            }
        }

        self.expect_peek(TokenKind::RightBrace)?;

        Some(Expression::new(token, ExpressionKind::Dict(pairs)))
    }
}
