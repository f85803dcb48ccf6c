use banana::env::Env;
use banana::object::{Object, NULL};

/// Runs a whole source text in fresh environments. Parse and macro failures
/// fail the test.
pub fn run(source: &str) -> Object {
    let env = Env::new_shared();
    let macro_env = Env::new_shared();

    match banana::run(source, &env, &macro_env) {
        Ok(result) => result.unwrap_or(NULL),
        Err(error) => panic!("{:?} did not run: {}", source, error),
    }
}

pub fn int(value: i64) -> Object {
    Object::Integer(value)
}
