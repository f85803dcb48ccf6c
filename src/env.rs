use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::object::Object;

type Objects = HashMap<String, Object>;

/// One lexical scope. Closures hold their defining scope through the shared
/// handle, so a scope lives as long as the last function that captured it.
#[derive(Debug, Default)]
pub struct Env {
  pub objects: Objects,
  pub parent: Option<Rc<RefCell<Env>>>,
}

impl Env {
  pub fn new() -> Self {
    Self {
      objects: HashMap::new(),
      parent: None,
    }
  }

  pub fn new_shared() -> Rc<RefCell<Env>> {
    Rc::new(RefCell::new(Env::new()))
  }

  pub fn new_with_parent(parent: Rc<RefCell<Env>>) -> Self {
    Self {
      objects: HashMap::new(),
      parent: Some(parent),
    }
  }

  pub fn get(&self, name: &str) -> Option<Object> {
    if let Some(object) = self.objects.get(name) {
      return Some(object.clone());
    }

    if let Some(ref parent) = self.parent {
      return parent.borrow().get(name);
    }

    None
  }

  /// Binds in this frame only; enclosing frames are never written.
  pub fn set(&mut self, name: impl Into<String>, value: Object) {
    self.objects.insert(name.into(), value);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookup_walks_outward() {
    let outer = Env::new_shared();
    outer.borrow_mut().set("a", Object::Integer(1));

    let inner = Env::new_with_parent(outer.clone());
    assert_eq!(inner.get("a"), Some(Object::Integer(1)));
    assert_eq!(inner.get("b"), None);
  }

  #[test]
  fn set_shadows_instead_of_mutating_parent() {
    let outer = Env::new_shared();
    outer.borrow_mut().set("a", Object::Integer(1));

    let mut inner = Env::new_with_parent(outer.clone());
    inner.set("a", Object::Integer(2));

    assert_eq!(inner.get("a"), Some(Object::Integer(2)));
    assert_eq!(outer.borrow().get("a"), Some(Object::Integer(1)));
  }
}
