//! Quote/unquote and macro expansion.
//!
//! Expansion runs once per program, before evaluation: `define_macros` lifts
//! top-level `let name = macro(...) { ... }` definitions out of the program,
//! then `expand_macros` replaces every call to one of them with the AST the
//! macro body quotes.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::ast::{Expression, ExpressionKind, InfixOperator, Node, PrefixOperator, Program, StatementKind};
use crate::env::Env;
use crate::error::MacroError;
use crate::evaluator::{eval_block, eval_expression, unwrap_return};
use crate::modify::modify;
use crate::object::{Macro, Object, NULL};
use crate::token::Span;

/// Binds every top-level macro definition in `env` and removes the defining
/// statements from `program`.
pub fn define_macros(program: &mut Program, env: &Rc<RefCell<Env>>) {
  let mut definitions = Vec::new();

  for (index, statement) in program.statements.iter().enumerate() {
    if let StatementKind::Let {
      name,
      value: Expression { kind: ExpressionKind::Macro { parameters, body }, .. },
    } = &statement.kind
    {
      debug!("defining macro `{}`", name);
      env.borrow_mut().set(name.as_str(), Object::Macro(Rc::new(Macro {
        parameters: parameters.clone(),
        body: body.clone(),
        env: env.clone(),
      })));
      definitions.push(index);
    }
  }

  for index in definitions.into_iter().rev() {
    program.statements.remove(index);
  }
}

/// Replaces every call to a macro bound in `env` with the node its body
/// quotes. Stops at the first misuse.
pub fn expand_macros(program: Program, env: &Rc<RefCell<Env>>) -> Result<Program, MacroError> {
  let mut failure = None;

  let expanded = modify(Node::Program(program), |node| {
    if failure.is_some() {
      return node;
    }

    match expand_macro_call(&node, env) {
      Ok(Some(expansion)) => expansion,
      Ok(None) => node,
      Err(error) => {
        failure = Some(error);
        node
      }
    }
  });

  if let Some(error) = failure {
    return Err(error);
  }

  match expanded {
    Node::Program(program) => Ok(program),
    _ => unreachable!("expansion only replaces call expressions"),
  }
}

fn expand_macro_call(node: &Node, env: &Rc<RefCell<Env>>) -> Result<Option<Node>, MacroError> {
  let (name, arguments) = match node {
    Node::Expression(Expression { kind: ExpressionKind::Call { function, arguments }, .. }) => match &function.kind {
      ExpressionKind::Identifier(name) => (name, arguments),
      _ => return Ok(None),
    },
    _ => return Ok(None),
  };

  let mac = match env.borrow().get(name) {
    Some(Object::Macro(mac)) => mac,
    _ => return Ok(None),
  };

  if mac.parameters.len() != arguments.len() {
    return Err(MacroError::WrongArgumentCount {
      name: name.clone(),
      want: mac.parameters.len(),
      got: arguments.len(),
    });
  }

  debug!("expanding macro `{}` with {} argument(s)", name, arguments.len());

  let eval_env = extend_macro_env(&mac, arguments);
  let evaluated = eval_block(&mac.body, &eval_env).map_or(NULL, unwrap_return);

  match evaluated {
    Object::Quote(quoted) => Ok(Some(unwrap_quoted(quoted))),
    Object::Error(message) => Err(MacroError::Evaluation {
      name: name.clone(),
      message,
    }),
    other => Err(MacroError::NotAQuote {
      name: name.clone(),
      found: other.kind(),
    }),
  }
}

/// Arguments reach the macro body unevaluated, each wrapped in a quote.
fn extend_macro_env(mac: &Macro, arguments: &[Expression]) -> Rc<RefCell<Env>> {
  let mut env = Env::new_with_parent(mac.env.clone());

  for (parameter, argument) in mac.parameters.iter().zip(arguments) {
    env.set(parameter.as_str(), Object::Quote(Rc::new(Node::Expression(argument.clone()))));
  }

  Rc::new(RefCell::new(env))
}

fn unwrap_quoted(quoted: Rc<Node>) -> Node {
  Rc::try_unwrap(quoted).unwrap_or_else(|shared| shared.as_ref().clone())
}

/// `quote(node)`: splices every `unquote(...)` inside `node`, then wraps the
/// result without evaluating it.
pub fn quote(node: Node, env: &Rc<RefCell<Env>>) -> Object {
  let node = eval_unquote_calls(node, env);
  Object::Quote(Rc::new(node))
}

fn eval_unquote_calls(quoted: Node, env: &Rc<RefCell<Env>>) -> Node {
  modify(quoted, |node| {
    let unquoted = match unquote_argument(&node) {
      Some(argument) => unwrap_return(eval_expression(argument, env)),
      None => return node,
    };

    let span = match &node {
      Node::Expression(call) => call.token.span,
      _ => Span::default(),
    };

    match object_to_node(unquoted, span) {
      Some(replacement) => replacement,
      None => node,
    }
  })
}

fn unquote_argument(node: &Node) -> Option<&Expression> {
  match node {
    Node::Expression(Expression { kind: ExpressionKind::Call { function, arguments }, .. })
      if function.token_literal() == "unquote" =>
    {
      match arguments.as_slice() {
        [argument] => Some(argument),
        _ => None,
      }
    }
    _ => None,
  }
}

/// Spliced nodes take `span`, the position of the `unquote` call they replace.
fn object_to_node(object: Object, span: Span) -> Option<Node> {
  match object {
    Object::Boolean(value) => Some(Node::Expression(Expression::synthesized(ExpressionKind::Boolean(value), span))),
    Object::Integer(value) => Some(Node::Expression(integer_node(value, span))),
    Object::Quote(quoted) => Some(unwrap_quoted(quoted)),
    _ => None,
  }
}

/// Integer literals are never negative in source text, so a negative value is
/// spliced as the negation it would be written as. `i64::MIN` has no positive
/// counterpart and becomes `-i64::MAX - 1`.
fn integer_node(value: i64, span: Span) -> Expression {
  let literal = |value: i64| Expression::synthesized(ExpressionKind::Integer(value), span);
  let negate = |value: i64| {
    Expression::synthesized(
      ExpressionKind::Prefix {
        operator: PrefixOperator::Negate,
        right: Box::new(literal(value)),
      },
      span,
    )
  };

  if value >= 0 {
    literal(value)
  } else if value == i64::MIN {
    Expression::synthesized(
      ExpressionKind::Infix {
        left: Box::new(negate(i64::MAX)),
        operator: InfixOperator::Subtract,
        right: Box::new(literal(1)),
      },
      span,
    )
  } else {
    negate(-value)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::evaluator::Evaluator;
  use crate::lexer::Lexer;
  use crate::object::ObjectType;
  use crate::parser::Parser;

  fn parse(input: &str) -> Program {
    let (program, errors) = Parser::new(Lexer::new(input)).parse_program();
    assert!(errors.is_empty(), "parser errors for {:?}: {:?}", input, errors);
    program
  }

  fn eval(input: &str) -> Object {
    Evaluator::new(Env::new_shared()).eval(&parse(input)).unwrap_or(NULL)
  }

  fn quoted(input: &str) -> String {
    match eval(input) {
      Object::Quote(node) => node.to_string(),
      other => panic!("{:?} is not a quote: {:?}", input, other),
    }
  }

  #[test]
  fn quote_keeps_its_argument_unevaluated() {
    let cases = [
      ("quote(5)", "5"),
      ("quote(5 + 8)", "(5 + 8)"),
      ("quote(foobar)", "foobar"),
      ("quote(foobar + barfoo)", "(foobar + barfoo)"),
    ];

    for (input, expected) in cases {
      assert_eq!(quoted(input), expected, "{}", input);
    }
  }

  #[test]
  fn unquote_splices_evaluated_values() {
    let cases = [
      ("quote(unquote(4))", "4"),
      ("quote(unquote(4 + 4))", "8"),
      ("quote(8 + unquote(4 + 4))", "(8 + 8)"),
      ("quote(unquote(4 + 4) + 8)", "(8 + 8)"),
      ("let foobar = 8; quote(foobar)", "foobar"),
      ("let foobar = 8; quote(unquote(foobar))", "8"),
      ("quote(unquote(true))", "true"),
      ("quote(unquote(true == false))", "false"),
      ("quote(unquote(quote(4 + 4)))", "(4 + 4)"),
      (
        "let quotedInfixExpression = quote(4 + 4); quote(unquote(4 + 4) + unquote(quotedInfixExpression))",
        "(8 + (4 + 4))",
      ),
    ];

    for (input, expected) in cases {
      assert_eq!(quoted(input), expected, "{}", input);
    }
  }

  #[test]
  fn unquote_leaves_unconvertible_values_alone() {
    assert_eq!(quoted(r#"quote(unquote("text"))"#), r#"unquote("text")"#);
    assert_eq!(quoted("quote(unquote(1, 2))"), "unquote(1, 2)");
  }

  #[test]
  fn spliced_values_sit_where_the_unquote_was() {
    match eval("quote(unquote(1))") {
      Object::Quote(node) => match node.as_ref() {
        Node::Expression(expression) => {
          assert_eq!(expression.kind, ExpressionKind::Integer(1));
          assert_eq!(expression.token.span, Span(13, 14));
        }
        other => panic!("not an expression: {:?}", other),
      },
      other => panic!("not a quote: {:?}", other),
    }
  }

  #[test]
  fn negative_integers_splice_as_negations() {
    assert_eq!(quoted("quote(unquote(0 - 5) * 2)"), "((-5) * 2)");
    assert_eq!(quoted("quote(unquote(-9223372036854775807 - 1))"), "((-9223372036854775807) - 1)");

    let program = expand("let neg = macro() { quote(unquote(0 - 5) * 2) }; neg();").expect("expands");
    assert_eq!(parse(&program.to_string()), program);
    assert_eq!(Evaluator::new(Env::new_shared()).eval(&program), Some(Object::Integer(-10)));
  }

  #[test]
  fn define_macros_hoists_definitions() {
    let mut program = parse(
      "let number = 1;
      let function = fn(x, y) { x + y };
      let mymacro = macro(x, y) { x + y; };",
    );
    let env = Env::new_shared();

    define_macros(&mut program, &env);

    assert_eq!(program.statements.len(), 2);
    assert_eq!(env.borrow().get("number"), None);
    assert_eq!(env.borrow().get("function"), None);

    match env.borrow().get("mymacro") {
      Some(Object::Macro(mac)) => {
        assert_eq!(mac.parameters, vec!["x", "y"]);
        assert_eq!(mac.body.to_string(), "{ (x + y); }");
      }
      other => panic!("macro not bound: {:?}", other),
    };
  }

  #[test]
  fn define_macros_removes_every_definition() {
    let mut program = parse("let a = macro() { quote(1) }; 1; let b = macro() { quote(2) }; let c = macro() { quote(3) }; 2;");
    let env = Env::new_shared();

    define_macros(&mut program, &env);

    assert_eq!(program.to_string(), "1; 2;");
  }

  fn expand(input: &str) -> Result<Program, MacroError> {
    let mut program = parse(input);
    let env = Env::new_shared();

    define_macros(&mut program, &env);
    expand_macros(program, &env)
  }

  #[test]
  fn expands_macro_calls() {
    let cases = [
      (
        "let infixExpression = macro() { quote(1 + 2); }; infixExpression();",
        "(1 + 2)",
      ),
      (
        "let reverse = macro(a, b) { quote(unquote(b) - unquote(a)); }; reverse(2 + 2, 10 - 5);",
        "(10 - 5) - (2 + 2)",
      ),
      (
        r#"let unless = macro(condition, consequence, alternative) {
          quote(if (!(unquote(condition))) {
            unquote(consequence);
          } else {
            unquote(alternative);
          });
        };
        unless(10 > 5, puts("not greater"), puts("greater"));"#,
        r#"if (!(10 > 5)) { puts("not greater"); } else { puts("greater"); }"#,
      ),
    ];

    for (input, expected) in cases {
      let expected = parse(expected);
      assert_eq!(expand(input), Ok(expected), "{}", input);
    }
  }

  #[test]
  fn expanded_macro_evaluates() {
    let mut program = parse("let reverse = macro(a, b) { quote(unquote(b) - unquote(a)); }; reverse(2, 3);");
    let macro_env = Env::new_shared();

    define_macros(&mut program, &macro_env);
    assert_eq!(program.statements.len(), 1);

    let program = expand_macros(program, &macro_env).expect("expands");
    let result = Evaluator::new(Env::new_shared()).eval(&program);
    assert_eq!(result, Some(Object::Integer(1)));
  }

  #[test]
  fn macro_must_return_a_quote() {
    let result = expand("let broken = macro(x) { 1 }; broken(2);");

    assert_eq!(
      result,
      Err(MacroError::NotAQuote {
        name: "broken".to_owned(),
        found: ObjectType::Integer,
      })
    );
  }

  #[test]
  fn macro_errors_are_not_error_objects() {
    let result = expand("let broken = macro() { missing }; broken();");

    assert_eq!(
      result,
      Err(MacroError::Evaluation {
        name: "broken".to_owned(),
        message: "Identifier not found: missing".to_owned(),
      })
    );
  }

  #[test]
  fn macro_arity_is_checked() {
    let result = expand("let pair = macro(a, b) { quote(unquote(a)) }; pair(1);");

    assert_eq!(
      result,
      Err(MacroError::WrongArgumentCount {
        name: "pair".to_owned(),
        want: 2,
        got: 1,
      })
    );
  }

  #[test]
  fn calls_to_non_macros_are_untouched() {
    let program = expand("let f = fn(x) { x }; f(1); g(2);").expect("expands");
    assert_eq!(program.to_string(), "let f = fn(x) { x; }; f(1); g(2);");
  }
}
