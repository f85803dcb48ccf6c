use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
  Illegal,
  Eof,

  Identifier,
  Int,
  String,

  Assign,
  Plus,
  Minus,
  Bang,
  Asterisk,
  Slash,
  Less,
  Greater,
  EqualEqual,
  BangEqual,

  Comma,
  Semicolon,
  Colon,
  LeftParen,
  RightParen,
  LeftBrace,
  RightBrace,
  LeftBracket,
  RightBracket,

  Function,
  Macro,
  Let,
  True,
  False,
  If,
  Else,
  Return,
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      TokenKind::Illegal => "ILLEGAL",
      TokenKind::Eof => "EOF",
      TokenKind::Identifier => "IDENT",
      TokenKind::Int => "INT",
      TokenKind::String => "STRING",
      TokenKind::Assign => "=",
      TokenKind::Plus => "+",
      TokenKind::Minus => "-",
      TokenKind::Bang => "!",
      TokenKind::Asterisk => "*",
      TokenKind::Slash => "/",
      TokenKind::Less => "<",
      TokenKind::Greater => ">",
      TokenKind::EqualEqual => "==",
      TokenKind::BangEqual => "!=",
      TokenKind::Comma => ",",
      TokenKind::Semicolon => ";",
      TokenKind::Colon => ":",
      TokenKind::LeftParen => "(",
      TokenKind::RightParen => ")",
      TokenKind::LeftBrace => "{",
      TokenKind::RightBrace => "}",
      TokenKind::LeftBracket => "[",
      TokenKind::RightBracket => "]",
      TokenKind::Function => "fn",
      TokenKind::Macro => "macro",
      TokenKind::Let => "let",
      TokenKind::True => "true",
      TokenKind::False => "false",
      TokenKind::If => "if",
      TokenKind::Else => "else",
      TokenKind::Return => "return",
    };
    f.write_str(text)
  }
}

/// Byte range of a token in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span(pub usize, pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
  pub kind: TokenKind,
  pub literal: String,
  pub span: Span,
}

impl Token {
  pub fn new(kind: TokenKind, literal: impl Into<String>, span: Span) -> Token {
    Token {
      kind,
      literal: literal.into(),
      span,
    }
  }

  pub fn eof(at: usize) -> Token {
    Token::new(TokenKind::Eof, "", Span(at, at))
  }

  pub fn is(&self, kind: TokenKind) -> bool {
    self.kind == kind
  }
}
