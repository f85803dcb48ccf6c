use thiserror::Error;

use crate::object::ObjectType;
use crate::token::{Span, TokenKind};

/// A syntax diagnostic. The parser collects these instead of stopping at the
/// first one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
  #[error("expected next token to be {expected}, got {found} instead")]
  UnexpectedToken {
    expected: TokenKind,
    found: TokenKind,
    span: Span,
  },

  #[error("no prefix parse function for {kind} found")]
  NoPrefixRule { kind: TokenKind, span: Span },

  #[error("could not parse {literal:?} as integer")]
  InvalidInteger { literal: String, span: Span },
}

impl ParseError {
  pub fn span(&self) -> Span {
    match self {
      ParseError::UnexpectedToken { span, .. } => *span,
      ParseError::NoPrefixRule { span, .. } => *span,
      ParseError::InvalidInteger { span, .. } => *span,
    }
  }
}

/// Misuse of a macro found while expanding. Unlike `Object::Error` this never
/// flows through evaluation; expansion stops and the caller gets it back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MacroError {
  #[error("macro `{name}` returned {found}, but macros may only return quoted AST nodes")]
  NotAQuote { name: String, found: ObjectType },

  #[error("macro `{name}` failed while expanding: {message}")]
  Evaluation { name: String, message: String },

  #[error("macro `{name}` takes {want} arguments, got {got}")]
  WrongArgumentCount { name: String, want: usize, got: usize },
}

/// Everything that can stop a whole run of a source text.
#[derive(Debug, Error)]
pub enum Error {
  #[error("could not read source: {0}")]
  Io(#[from] std::io::Error),

  #[error("{} parse error(s):\n{}", .0.len(), render_parse_errors(.0))]
  Parse(Vec<ParseError>),

  #[error(transparent)]
  Macro(#[from] MacroError),
}

fn render_parse_errors(errors: &[ParseError]) -> String {
  errors
    .iter()
    .map(|error| format!("\t{}", error))
    .collect::<Vec<_>>()
    .join("\n")
}
