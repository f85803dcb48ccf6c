use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::ast::{BlockStatement, Expression, ExpressionKind, InfixOperator, Node, PrefixOperator, Program, Statement, StatementKind};
use crate::builtin;
use crate::env::Env;
use crate::macros;
use crate::object::{Function, HashPair, Macro, Object, NULL};

/// Evaluates whole programs against one long-lived top-level scope, so
/// bindings made by one input are visible to the next.
#[derive(Debug)]
pub struct Evaluator {
  pub env: Rc<RefCell<Env>>,
}

impl Evaluator {
  pub fn new(env: Rc<RefCell<Env>>) -> Self {
    Evaluator {
      env
    }
  }

  /// `None` when the program produced no value, e.g. it only has `let`s.
  pub fn eval(&mut self, program: &Program) -> Option<Object> {
    debug!("evaluating {} statement(s)", program.statements.len());
    eval_program(program, &self.env)
  }
}

pub fn eval(node: &Node, env: &Rc<RefCell<Env>>) -> Object {
  let result = match node {
    Node::Program(program) => eval_program(program, env).unwrap_or(NULL),
    Node::Block(block) => eval_block(block, env).unwrap_or(NULL),
    Node::Statement(statement) => eval_statement(statement, env).unwrap_or(NULL),
    Node::Expression(expression) => eval_expression(expression, env),
  };

  unwrap_return(result)
}

/// Errors and pending `return`s both abandon whatever expression they occur
/// in, until a function call or the program consumes them.
fn is_unwinding(object: &Object) -> bool {
  matches!(object, Object::Error(_) | Object::ReturnValue(_))
}

pub(crate) fn unwrap_return(object: Object) -> Object {
  match object {
    Object::ReturnValue(value) => *value,
    other => other,
  }
}

fn eval_program(program: &Program, env: &Rc<RefCell<Env>>) -> Option<Object> {
  let mut result = None;

  for statement in &program.statements {
    match eval_statement(statement, env) {
      Some(Object::ReturnValue(value)) => return Some(*value),
      Some(Object::Error(message)) => return Some(Object::Error(message)),
      obj => result = obj,
    }
  }

  result
}

pub(crate) fn eval_block(block: &BlockStatement, env: &Rc<RefCell<Env>>) -> Option<Object> {
  let mut result = None;

  for statement in &block.statements {
    match eval_statement(statement, env) {
      Some(obj @ Object::ReturnValue(_)) | Some(obj @ Object::Error(_)) => return Some(obj),
      obj => result = obj,
    }
  }

  result
}

fn eval_statement(statement: &Statement, env: &Rc<RefCell<Env>>) -> Option<Object> {
  match &statement.kind {
    StatementKind::Let { name, value } => {
      let value = eval_expression(value, env);
      if is_unwinding(&value) {
        return Some(value);
      }

      env.borrow_mut().set(name.as_str(), value);
      None
    }
    StatementKind::Return(value) => {
      let value = eval_expression(value, env);
      if is_unwinding(&value) {
        return Some(value);
      }

      Some(Object::ReturnValue(Box::new(value)))
    }
    StatementKind::Expression(expression) => Some(eval_expression(expression, env)),
  }
}

pub(crate) fn eval_expression(expression: &Expression, env: &Rc<RefCell<Env>>) -> Object {
  match &expression.kind {
    ExpressionKind::Identifier(name) => eval_identifier(name, env),
    ExpressionKind::Integer(value) => Object::Integer(*value),
    ExpressionKind::String(value) => Object::String(value.clone()),
    ExpressionKind::Boolean(value) => Object::boolean(*value),
    ExpressionKind::Prefix { operator, right } => {
      let right = eval_expression(right, env);
      if is_unwinding(&right) {
        return right;
      }

      eval_prefix_expression(*operator, right)
    }
    ExpressionKind::Infix { left, operator, right } => {
      let left = eval_expression(left, env);
      if is_unwinding(&left) {
        return left;
      }

      let right = eval_expression(right, env);
      if is_unwinding(&right) {
        return right;
      }

      eval_infix_expression(*operator, left, right)
    }
    ExpressionKind::If { condition, consequence, alternative } => {
      let condition = eval_expression(condition, env);
      if is_unwinding(&condition) {
        return condition;
      }

      if condition.is_truthy() {
        eval_block(consequence, env).unwrap_or(NULL)
      } else if let Some(alternative) = alternative {
        eval_block(alternative, env).unwrap_or(NULL)
      } else {
        NULL
      }
    }
    ExpressionKind::Function { parameters, body } => Object::Function(Rc::new(Function {
      parameters: parameters.clone(),
      body: body.clone(),
      env: env.clone(),
    })),
    ExpressionKind::Macro { parameters, body } => Object::Macro(Rc::new(Macro {
      parameters: parameters.clone(),
      body: body.clone(),
      env: env.clone(),
    })),
    ExpressionKind::Call { function, arguments } => {
      if let (ExpressionKind::Identifier(name), [argument]) = (&function.kind, arguments.as_slice()) {
        if name == "quote" {
          return macros::quote(Node::Expression(argument.clone()), env);
        }
      }

      let function = eval_expression(function, env);
      if is_unwinding(&function) {
        return function;
      }

      match eval_expressions(arguments, env) {
        Ok(args) => apply_function(function, args),
        Err(error) => error,
      }
    }
    ExpressionKind::Array(elements) => match eval_expressions(elements, env) {
      Ok(elements) => Object::Array(Rc::new(elements)),
      Err(error) => error,
    },
    ExpressionKind::Index { left, index } => {
      let left = eval_expression(left, env);
      if is_unwinding(&left) {
        return left;
      }

      let index = eval_expression(index, env);
      if is_unwinding(&index) {
        return index;
      }

      eval_index_expression(left, index)
    }
    ExpressionKind::Dict(pairs) => eval_dict_literal(pairs, env),
  }
}

/// Evaluates left to right, stopping at the first error or pending return.
fn eval_expressions(expressions: &[Expression], env: &Rc<RefCell<Env>>) -> Result<Vec<Object>, Object> {
  let mut result = Vec::with_capacity(expressions.len());

  for expression in expressions {
    let evaluated = eval_expression(expression, env);
    if is_unwinding(&evaluated) {
      return Err(evaluated);
    }
    result.push(evaluated);
  }

  Ok(result)
}

fn eval_identifier(name: &str, env: &Rc<RefCell<Env>>) -> Object {
  if let Some(object) = env.borrow().get(name) {
    return object;
  }

  match builtin::lookup(name) {
    Some(builtin) => Object::Builtin(builtin),
    None => Object::error(format!("Identifier not found: {}", name)),
  }
}

fn eval_prefix_expression(operator: PrefixOperator, right: Object) -> Object {
  match operator {
    PrefixOperator::Not => Object::boolean(!right.is_truthy()),
    PrefixOperator::Negate => match right {
      Object::Integer(value) => Object::Integer(value.wrapping_neg()),
      other => Object::error(format!("Unknown operator: {}{}", operator, other.kind())),
    },
  }
}

fn eval_infix_expression(operator: InfixOperator, left: Object, right: Object) -> Object {
  match (&left, &right) {
    (Object::Integer(left), Object::Integer(right)) => eval_integer_infix_expression(operator, *left, *right),
    (Object::String(left), Object::String(right)) => match operator {
      InfixOperator::Add => Object::String(format!("{}{}", left, right)),
      _ => Object::error(format!("Unknown operator: STRING {} STRING", operator)),
    },
    _ if left.kind() != right.kind() => {
      Object::error(format!("Type mismatch: {} {} {}", left.kind(), operator, right.kind()))
    }
    _ => match operator {
      InfixOperator::Equal => Object::boolean(left.is_identical(&right)),
      InfixOperator::NotEqual => Object::boolean(!left.is_identical(&right)),
      _ => Object::error(format!("Unknown operator: {} {} {}", left.kind(), operator, right.kind())),
    },
  }
}

fn eval_integer_infix_expression(operator: InfixOperator, left: i64, right: i64) -> Object {
  match operator {
    InfixOperator::Add => Object::Integer(left.wrapping_add(right)),
    InfixOperator::Subtract => Object::Integer(left.wrapping_sub(right)),
    InfixOperator::Multiply => Object::Integer(left.wrapping_mul(right)),
    InfixOperator::Divide if right == 0 => Object::error(format!("Division by zero: {} / 0", left)),
    InfixOperator::Divide => Object::Integer(left.wrapping_div(right)),
    InfixOperator::Less => Object::boolean(left < right),
    InfixOperator::Greater => Object::boolean(left > right),
    InfixOperator::Equal => Object::boolean(left == right),
    InfixOperator::NotEqual => Object::boolean(left != right),
  }
}

fn eval_index_expression(left: Object, index: Object) -> Object {
  match (&left, &index) {
    (Object::Array(elements), Object::Integer(i)) => usize::try_from(*i)
      .ok()
      .and_then(|i| elements.get(i))
      .cloned()
      .unwrap_or(NULL),
    (Object::Dict(pairs), _) => match index.hash_key() {
      Some(key) => pairs.get(&key).map(|pair| pair.value.clone()).unwrap_or(NULL),
      None => Object::error(format!("Unusable as hash key: {}", index.kind())),
    },
    _ => Object::error(format!("Index operator not supported: {}", left.kind())),
  }
}

fn eval_dict_literal(pairs: &[(Expression, Expression)], env: &Rc<RefCell<Env>>) -> Object {
  let mut evaluated = IndexMap::with_capacity(pairs.len());

  for (key, value) in pairs {
    let key = eval_expression(key, env);
    if is_unwinding(&key) {
      return key;
    }

    let hash_key = match key.hash_key() {
      Some(hash_key) => hash_key,
      None => return Object::error(format!("Unusable as hash key: {}", key.kind())),
    };

    let value = eval_expression(value, env);
    if is_unwinding(&value) {
      return value;
    }

    evaluated.insert(hash_key, HashPair { key, value });
  }

  Object::Dict(Rc::new(evaluated))
}

fn apply_function(function: Object, args: Vec<Object>) -> Object {
  match function {
    Object::Function(function) => {
      if function.parameters.len() != args.len() {
        return Object::error(format!(
          "Wrong number of arguments. got={}, want={}",
          args.len(),
          function.parameters.len(),
        ));
      }

      trace!("applying fn({}) to {} argument(s)", function.parameters.join(", "), args.len());

      let env = extend_function_env(&function, args);
      eval_block(&function.body, &env).map_or(NULL, unwrap_return)
    }
    Object::Builtin(builtin) if builtin.arity != args.len() => Object::error(format!(
      "Wrong number of arguments. got={}, want={}",
      args.len(),
      builtin.arity,
    )),
    Object::Builtin(builtin) => (builtin.function)(args),
    other => Object::error(format!("Not a function: {}", other.kind())),
  }
}

fn extend_function_env(function: &Function, args: Vec<Object>) -> Rc<RefCell<Env>> {
  let mut env = Env::new_with_parent(function.env.clone());

  for (parameter, arg) in function.parameters.iter().zip(args) {
    env.set(parameter.as_str(), arg);
  }

  Rc::new(RefCell::new(env))
}
