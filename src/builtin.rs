use std::collections::HashMap;
use std::rc::Rc;

use lazy_static::lazy_static;

use crate::object::{Builtin, Object, NULL};

lazy_static! {
  static ref BUILTINS: HashMap<&'static str, Builtin> = {
    let mut builtins = HashMap::new();
    for builtin in [
      Builtin { name: "len", arity: 1, function: builtin_len },
      Builtin { name: "first", arity: 1, function: builtin_first },
      Builtin { name: "last", arity: 1, function: builtin_last },
      Builtin { name: "rest", arity: 1, function: builtin_rest },
      Builtin { name: "push", arity: 2, function: builtin_push },
      Builtin { name: "typeof", arity: 1, function: builtin_typeof },
    ] {
      builtins.insert(builtin.name, builtin);
    }
    builtins
  };
}

/// Looks up a native function. Consulted only after the environment chain.
pub fn lookup(name: &str) -> Option<Builtin> {
  BUILTINS.get(name).copied()
}

fn builtin_len(args: Vec<Object>) -> Object {
  match &args[0] {
    Object::String(value) => Object::Integer(value.len() as i64),
    Object::Array(elements) => Object::Integer(elements.len() as i64),
    other => Object::error(format!("Argument to `len` not supported, got {}", other.kind())),
  }
}

fn builtin_first(args: Vec<Object>) -> Object {
  match &args[0] {
    Object::Array(elements) => elements.first().cloned().unwrap_or(NULL),
    other => Object::error(format!("Argument to `first` must be ARRAY, got {}", other.kind())),
  }
}

fn builtin_last(args: Vec<Object>) -> Object {
  match &args[0] {
    Object::Array(elements) => elements.last().cloned().unwrap_or(NULL),
    other => Object::error(format!("Argument to `last` must be ARRAY, got {}", other.kind())),
  }
}

fn builtin_rest(args: Vec<Object>) -> Object {
  match &args[0] {
    Object::Array(elements) if elements.is_empty() => NULL,
    Object::Array(elements) => Object::Array(Rc::new(elements[1..].to_vec())),
    other => Object::error(format!("Argument to `rest` must be ARRAY, got {}", other.kind())),
  }
}

fn builtin_push(args: Vec<Object>) -> Object {
  match &args[0] {
    Object::Array(elements) => {
      let mut elements = elements.as_ref().clone();
      elements.push(args[1].clone());
      Object::Array(Rc::new(elements))
    }
    other => Object::error(format!("Argument to `push` must be ARRAY, got {}", other.kind())),
  }
}

fn builtin_typeof(args: Vec<Object>) -> Object {
  Object::String(args[0].kind().to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn call(name: &str, args: Vec<Object>) -> Object {
    let builtin = lookup(name).expect("builtin exists");
    (builtin.function)(args)
  }

  fn array(elements: Vec<i64>) -> Object {
    Object::Array(Rc::new(elements.into_iter().map(Object::Integer).collect()))
  }

  #[test]
  fn len_of_strings_and_arrays() {
    assert_eq!(call("len", vec![Object::String("four".to_owned())]), Object::Integer(4));
    assert_eq!(call("len", vec![Object::String(String::new())]), Object::Integer(0));
    assert_eq!(call("len", vec![array(vec![1, 2, 3])]), Object::Integer(3));
    assert_eq!(
      call("len", vec![Object::Integer(1)]),
      Object::error("Argument to `len` not supported, got INTEGER")
    );
  }

  #[test]
  fn array_helpers() {
    assert_eq!(call("first", vec![array(vec![1, 2, 3])]), Object::Integer(1));
    assert_eq!(call("last", vec![array(vec![1, 2, 3])]), Object::Integer(3));
    assert_eq!(call("rest", vec![array(vec![1, 2, 3])]), array(vec![2, 3]));
    assert_eq!(call("rest", vec![array(vec![])]), NULL);
    assert_eq!(call("first", vec![array(vec![])]), NULL);
  }

  #[test]
  fn push_leaves_the_original_alone() {
    let original = array(vec![1]);
    let pushed = call("push", vec![original.clone(), Object::Integer(2)]);

    assert_eq!(pushed, array(vec![1, 2]));
    assert_eq!(original, array(vec![1]));
  }

  #[test]
  fn typeof_reports_tag() {
    assert_eq!(call("typeof", vec![NULL]), Object::String("NULL".to_owned()));
  }

  #[test]
  fn unknown_names_are_absent() {
    assert!(lookup("quote").is_none());
  }
}
