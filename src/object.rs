use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::fmt::Formatter;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{BlockStatement, Node};
use crate::env::Env;

pub const TRUE: Object = Object::Boolean(true);
pub const FALSE: Object = Object::Boolean(false);
pub const NULL: Object = Object::Null;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
  Integer,
  Boolean,
  Null,
  String,
  Array,
  Dict,
  Function,
  Builtin,
  Macro,
  Quote,
  ReturnValue,
  Error,
}

impl fmt::Display for ObjectType {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let tag = match self {
      ObjectType::Integer => "INTEGER",
      ObjectType::Boolean => "BOOLEAN",
      ObjectType::Null => "NULL",
      ObjectType::String => "STRING",
      ObjectType::Array => "ARRAY",
      ObjectType::Dict => "DICT",
      ObjectType::Function => "FUNCTION",
      ObjectType::Builtin => "BUILTIN",
      ObjectType::Macro => "MACRO",
      ObjectType::Quote => "QUOTE",
      ObjectType::ReturnValue => "RETURN_VALUE",
      ObjectType::Error => "ERROR",
    };
    f.write_str(tag)
  }
}

/// Dict key descriptor. Strings use a content hash, so equal text always
/// lands on the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
  pub kind: ObjectType,
  pub value: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
  pub key: Object,
  pub value: Object,
}

pub type Pairs = IndexMap<HashKey, HashPair>;

pub struct Function {
  pub parameters: Vec<String>,
  pub body: BlockStatement,
  pub env: Rc<RefCell<Env>>,
}

pub struct Macro {
  pub parameters: Vec<String>,
  pub body: BlockStatement,
  pub env: Rc<RefCell<Env>>,
}

pub type BuiltinFunction = fn(Vec<Object>) -> Object;

#[derive(Clone, Copy)]
pub struct Builtin {
  pub name: &'static str,
  /// Exact number of arguments; natives check nothing themselves.
  pub arity: usize,
  pub function: BuiltinFunction,
}

#[derive(Debug, Clone)]
pub enum Object {
  Integer(i64),
  Boolean(bool),
  Null,
  String(String),
  Array(Rc<Vec<Object>>),
  Dict(Rc<Pairs>),
  Function(Rc<Function>),
  Builtin(Builtin),
  Macro(Rc<Macro>),
  Quote(Rc<Node>),
  ReturnValue(Box<Object>),
  Error(String),
}

impl Object {
  pub fn error(message: impl Into<String>) -> Object {
    Object::Error(message.into())
  }

  pub fn boolean(value: bool) -> Object {
    if value {
      TRUE
    } else {
      FALSE
    }
  }

  pub fn kind(&self) -> ObjectType {
    match self {
      Object::Integer(_) => ObjectType::Integer,
      Object::Boolean(_) => ObjectType::Boolean,
      Object::Null => ObjectType::Null,
      Object::String(_) => ObjectType::String,
      Object::Array(_) => ObjectType::Array,
      Object::Dict(_) => ObjectType::Dict,
      Object::Function(_) => ObjectType::Function,
      Object::Builtin(_) => ObjectType::Builtin,
      Object::Macro(_) => ObjectType::Macro,
      Object::Quote(_) => ObjectType::Quote,
      Object::ReturnValue(_) => ObjectType::ReturnValue,
      Object::Error(_) => ObjectType::Error,
    }
  }

  /// Only `null` and `false` are falsy.
  pub fn is_truthy(&self) -> bool {
    !matches!(self, Object::Null | Object::Boolean(false))
  }

  pub fn hash_key(&self) -> Option<HashKey> {
    let value = match self {
      Object::Integer(value) => *value as u64,
      Object::Boolean(value) => *value as u64,
      Object::String(value) => {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
      }
      _ => return None,
    };

    Some(HashKey {
      kind: self.kind(),
      value,
    })
  }

  /// Identity comparison behind `==` and `!=` for non-numeric operands.
  ///
  /// `true`, `false` and `null` are canonical values, so comparing them by
  /// value is comparing them by identity. Heap objects compare by handle.
  pub fn is_identical(&self, other: &Object) -> bool {
    match (self, other) {
      (Object::Boolean(a), Object::Boolean(b)) => a == b,
      (Object::Null, Object::Null) => true,
      (Object::Array(a), Object::Array(b)) => Rc::ptr_eq(a, b),
      (Object::Dict(a), Object::Dict(b)) => Rc::ptr_eq(a, b),
      (Object::Function(a), Object::Function(b)) => Rc::ptr_eq(a, b),
      (Object::Macro(a), Object::Macro(b)) => Rc::ptr_eq(a, b),
      (Object::Quote(a), Object::Quote(b)) => Rc::ptr_eq(a, b),
      (Object::Builtin(a), Object::Builtin(b)) => a.name == b.name,
      _ => false,
    }
  }
}

// Structural equality, for tests and embedders. Closures compare by handle
// since their environments may be cyclic.
impl PartialEq for Object {
  fn eq(&self, other: &Object) -> bool {
    match (self, other) {
      (Object::Integer(a), Object::Integer(b)) => a == b,
      (Object::String(a), Object::String(b)) => a == b,
      (Object::Error(a), Object::Error(b)) => a == b,
      (Object::Array(a), Object::Array(b)) => a == b,
      (Object::Dict(a), Object::Dict(b)) => a == b,
      (Object::Quote(a), Object::Quote(b)) => a == b,
      (Object::ReturnValue(a), Object::ReturnValue(b)) => a == b,
      _ => self.is_identical(other),
    }
  }
}

fn write_parameters(f: &mut Formatter<'_>, parameters: &[String]) -> fmt::Result {
  f.write_str(&parameters.join(", "))
}

impl fmt::Display for Object {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Object::Integer(n) => write!(f, "{}", n),
      Object::Boolean(b) => write!(f, "{}", b),
      Object::Null => f.write_str("null"),
      Object::String(s) => f.write_str(s),
      Object::Array(elements) => {
        let elements: Vec<String> = elements.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", elements.join(", "))
      }
      Object::Dict(pairs) => {
        let pairs: Vec<String> = pairs
          .values()
          .map(|pair| format!("{}: {}", pair.key, pair.value))
          .collect();
        write!(f, "{{{}}}", pairs.join(", "))
      }
      Object::Function(function) => {
        f.write_str("fn(")?;
        write_parameters(f, &function.parameters)?;
        write!(f, ") {}", function.body)
      }
      Object::Builtin(_) => f.write_str("builtin function"),
      Object::Macro(mac) => {
        f.write_str("macro(")?;
        write_parameters(f, &mac.parameters)?;
        write!(f, ") {}", mac.body)
      }
      Object::Quote(node) => write!(f, "QUOTE({})", node),
      Object::ReturnValue(value) => write!(f, "{}", value),
      Object::Error(message) => write!(f, "ERROR: {}", message),
    }
  }
}

impl fmt::Debug for Function {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.debug_struct("Function")
      .field("parameters", &self.parameters)
      .field("body", &self.body)
      .finish_non_exhaustive()
  }
}

impl fmt::Debug for Macro {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.debug_struct("Macro")
      .field("parameters", &self.parameters)
      .field("body", &self.body)
      .finish_non_exhaustive()
  }
}

impl fmt::Debug for Builtin {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}() {{ [native code] }}", self.name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn string(value: &str) -> Object {
    Object::String(value.to_owned())
  }

  #[test]
  fn string_hash_keys_follow_content() {
    let hello1 = string("Hello World");
    let hello2 = string("Hello World");
    let diff1 = string("My name is johnny");
    let diff2 = string("My name is johnny");

    assert_eq!(hello1.hash_key(), hello2.hash_key());
    assert_eq!(diff1.hash_key(), diff2.hash_key());
    assert_ne!(hello1.hash_key(), diff1.hash_key());
  }

  #[test]
  fn hash_keys_are_tagged_by_type() {
    assert_ne!(Object::Integer(1).hash_key(), TRUE.hash_key());
    assert_eq!(Object::Integer(1).hash_key().map(|key| key.kind), Some(ObjectType::Integer));
  }

  #[test]
  fn only_scalars_are_hashable() {
    assert!(NULL.hash_key().is_none());
    assert!(Object::Array(Rc::new(vec![])).hash_key().is_none());
    assert!(Object::error("boom").hash_key().is_none());
  }

  #[test]
  fn truthiness() {
    assert!(!NULL.is_truthy());
    assert!(!FALSE.is_truthy());
    assert!(TRUE.is_truthy());
    assert!(Object::Integer(0).is_truthy());
    assert!(string("").is_truthy());
  }

  #[test]
  fn identity_of_heap_objects() {
    let array = Object::Array(Rc::new(vec![Object::Integer(1)]));
    let same = array.clone();
    let copy = Object::Array(Rc::new(vec![Object::Integer(1)]));

    assert!(array.is_identical(&same));
    assert!(!array.is_identical(&copy));
    assert_eq!(array, copy);
    assert!(Object::boolean(true).is_identical(&TRUE));
  }

  #[test]
  fn rendering() {
    let array = Object::Array(Rc::new(vec![Object::Integer(1), string("two"), NULL]));
    assert_eq!(array.to_string(), "[1, two, null]");
    assert_eq!(Object::error("nope").to_string(), "ERROR: nope");
    assert_eq!(ObjectType::ReturnValue.to_string(), "RETURN_VALUE");
  }
}
