pub mod ast;
pub mod token;
pub mod lexer;
pub mod parser;
pub mod modify;
pub mod object;
pub mod evaluator;
pub mod env;
pub mod builtin;
pub mod macros;
pub mod error;

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::Program;
use crate::env::Env;
use crate::error::{Error, ParseError};
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::object::Object;
use crate::parser::Parser;

pub fn parse(source: &str) -> (Program, Vec<ParseError>) {
  Parser::new(Lexer::new(source)).parse_program()
}

/// Parses, expands macros and evaluates `source`.
///
/// Macro definitions land in `macro_env`, values in `env`; passing the same
/// environments again continues where the previous run left off.
pub fn run(source: &str, env: &Rc<RefCell<Env>>, macro_env: &Rc<RefCell<Env>>) -> Result<Option<Object>, Error> {
  let program = expand(source, macro_env)?;
  Ok(Evaluator::new(env.clone()).eval(&program))
}

/// Parses `source` and applies macro definition and expansion, stopping
/// before evaluation.
pub fn expand(source: &str, macro_env: &Rc<RefCell<Env>>) -> Result<Program, Error> {
  let (mut program, errors) = parse(source);
  if !errors.is_empty() {
    return Err(Error::Parse(errors));
  }

  macros::define_macros(&mut program, macro_env);
  Ok(macros::expand_macros(program, macro_env)?)
}
