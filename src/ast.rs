use std::fmt;

use crate::token::{Span, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// `{ ... }` body of a function, macro or `if` branch.
#[derive(Debug, Clone)]
pub struct BlockStatement {
    pub token: Token,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct Statement {
    pub token: Token,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Let {
        name: String,
        value: Expression,
    },
    Return(Expression),
    Expression(Expression),
}

/// An expression and the token it starts with (the operator for infix
/// expressions, `(` for calls, `[` for index expressions).
#[derive(Debug, Clone)]
pub struct Expression {
    pub token: Token,
    pub kind: ExpressionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Identifier(String),
    Integer(i64),
    String(String),
    Boolean(bool),
    Prefix {
        operator: PrefixOperator,
        right: Box<Expression>,
    },
    Infix {
        left: Box<Expression>,
        operator: InfixOperator,
        right: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },
    Function {
        parameters: Vec<String>,
        body: BlockStatement,
    },
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Array(Vec<Expression>),
    Index {
        left: Box<Expression>,
        index: Box<Expression>,
    },
    /// Pair order carries no meaning.
    Dict(Vec<(Expression, Expression)>),
    Macro {
        parameters: Vec<String>,
        body: BlockStatement,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Less,
    Greater,
    Equal,
    NotEqual,
}

/// Any tree position, used where a traversal has to hand out nodes of
/// different capabilities through one channel (see `modify`).
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Program(Program),
    Statement(Statement),
    Block(BlockStatement),
    Expression(Expression),
}

// Tokens only record where a node came from; two trees are equal when their
// structure is.

impl PartialEq for BlockStatement {
    fn eq(&self, other: &Self) -> bool {
        self.statements == other.statements
    }
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Program {
    pub fn token_literal(&self) -> &str {
        self.statements.first().map_or("", Statement::token_literal)
    }
}

impl BlockStatement {
    pub fn new(token: Token, statements: Vec<Statement>) -> Self {
        BlockStatement { token, statements }
    }

    pub fn token_literal(&self) -> &str {
        &self.token.literal
    }
}

impl From<Vec<Statement>> for BlockStatement {
    fn from(statements: Vec<Statement>) -> Self {
        BlockStatement::new(Token::new(TokenKind::LeftBrace, "{", Span::default()), statements)
    }
}

impl Statement {
    pub fn new(token: Token, kind: StatementKind) -> Self {
        Statement { token, kind }
    }

    pub fn token_literal(&self) -> &str {
        &self.token.literal
    }
}

/// For statements built outside the parser: `let`/`return` get their keyword,
/// an expression statement the token of its expression.
impl From<StatementKind> for Statement {
    fn from(kind: StatementKind) -> Self {
        let token = match &kind {
            StatementKind::Let { .. } => Token::new(TokenKind::Let, "let", Span::default()),
            StatementKind::Return(_) => Token::new(TokenKind::Return, "return", Span::default()),
            StatementKind::Expression(expression) => expression.token.clone(),
        };
        Statement::new(token, kind)
    }
}

impl Expression {
    pub fn new(token: Token, kind: ExpressionKind) -> Self {
        Expression { token, kind }
    }

    /// Builds an expression that has no source text of its own, giving it the
    /// token the parser would have produced for it, placed at `span`.
    pub fn synthesized(kind: ExpressionKind, span: Span) -> Self {
        fn fixed(kind: TokenKind) -> (TokenKind, String) {
            (kind, kind.to_string())
        }

        let (token_kind, literal) = match &kind {
            ExpressionKind::Identifier(name) => (TokenKind::Identifier, name.clone()),
            ExpressionKind::Integer(value) => (TokenKind::Int, value.to_string()),
            ExpressionKind::String(value) => (TokenKind::String, value.clone()),
            ExpressionKind::Boolean(true) => fixed(TokenKind::True),
            ExpressionKind::Boolean(false) => fixed(TokenKind::False),
            ExpressionKind::Prefix { operator, .. } => fixed(operator.token_kind()),
            ExpressionKind::Infix { operator, .. } => fixed(operator.token_kind()),
            ExpressionKind::If { .. } => fixed(TokenKind::If),
            ExpressionKind::Function { .. } => fixed(TokenKind::Function),
            ExpressionKind::Macro { .. } => fixed(TokenKind::Macro),
            ExpressionKind::Call { .. } => fixed(TokenKind::LeftParen),
            ExpressionKind::Array(_) | ExpressionKind::Index { .. } => fixed(TokenKind::LeftBracket),
            ExpressionKind::Dict(_) => fixed(TokenKind::LeftBrace),
        };

        Expression::new(Token::new(token_kind, literal, span), kind)
    }

    /// Text of the token that introduced this expression, as written.
    pub fn token_literal(&self) -> &str {
        &self.token.literal
    }
}

impl From<ExpressionKind> for Expression {
    fn from(kind: ExpressionKind) -> Self {
        Expression::synthesized(kind, Span::default())
    }
}

impl PrefixOperator {
    pub fn token_kind(self) -> TokenKind {
        match self {
            PrefixOperator::Negate => TokenKind::Minus,
            PrefixOperator::Not => TokenKind::Bang,
        }
    }
}

impl InfixOperator {
    pub fn token_kind(self) -> TokenKind {
        match self {
            InfixOperator::Add => TokenKind::Plus,
            InfixOperator::Subtract => TokenKind::Minus,
            InfixOperator::Multiply => TokenKind::Asterisk,
            InfixOperator::Divide => TokenKind::Slash,
            InfixOperator::Less => TokenKind::Less,
            InfixOperator::Greater => TokenKind::Greater,
            InfixOperator::Equal => TokenKind::EqualEqual,
            InfixOperator::NotEqual => TokenKind::BangEqual,
        }
    }
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOperator::Negate => f.write_str("-"),
            PrefixOperator::Not => f.write_str("!"),
        }
    }
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InfixOperator::Add => "+",
            InfixOperator::Subtract => "-",
            InfixOperator::Multiply => "*",
            InfixOperator::Divide => "/",
            InfixOperator::Less => "<",
            InfixOperator::Greater => ">",
            InfixOperator::Equal => "==",
            InfixOperator::NotEqual => "!=",
        };
        f.write_str(text)
    }
}

// Rendering is parseable again: operators are fully parenthesised and blocks
// keep their braces.

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for statement in &self.statements {
            write!(f, " {}", statement)?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StatementKind::Let { name, value } => write!(f, "let {} = {};", name, value),
            StatementKind::Return(value) => write!(f, "return {};", value),
            StatementKind::Expression(expression) => write!(f, "{};", expression),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in value.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Identifier(name) => f.write_str(name),
            ExpressionKind::Integer(value) => write!(f, "{}", value),
            ExpressionKind::String(value) => write_escaped(f, value),
            ExpressionKind::Boolean(value) => write!(f, "{}", value),
            ExpressionKind::Prefix { operator, right } => write!(f, "({}{})", operator, right),
            ExpressionKind::Infix { left, operator, right } => {
                write!(f, "({} {} {})", left, operator, right)
            }
            ExpressionKind::If { condition, consequence, alternative } => {
                write!(f, "if ({}) {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            ExpressionKind::Function { parameters, body } => {
                f.write_str("fn(")?;
                write_list(f, parameters)?;
                write!(f, ") {}", body)
            }
            ExpressionKind::Macro { parameters, body } => {
                f.write_str("macro(")?;
                write_list(f, parameters)?;
                write!(f, ") {}", body)
            }
            ExpressionKind::Call { function, arguments } => {
                write!(f, "{}(", function)?;
                write_list(f, arguments)?;
                f.write_str(")")
            }
            ExpressionKind::Array(elements) => {
                f.write_str("[")?;
                write_list(f, elements)?;
                f.write_str("]")
            }
            ExpressionKind::Index { left, index } => write!(f, "({}[{}])", left, index),
            ExpressionKind::Dict(pairs) => {
                f.write_str("{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Program(program) => write!(f, "{}", program),
            Node::Statement(statement) => write!(f, "{}", statement),
            Node::Block(block) => write!(f, "{}", block),
            Node::Expression(expression) => write!(f, "{}", expression),
        }
    }
}
