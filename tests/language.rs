//! End-to-end behaviour of the language, driven from source text.

mod common;

use banana::ast::StatementKind;
use banana::env::Env;
use banana::error::{Error, ParseError};
use banana::evaluator::Evaluator;
use banana::object::{Object, FALSE, NULL, TRUE};

use common::{int, run};

#[test]
fn test_integer_operators_match_native_semantics() {
    let operands = [-17, -3, -1, 1, 2, 7, 40];

    for a in operands {
        for b in operands {
            let expected = [
                ("+", int(a + b)),
                ("-", int(a - b)),
                ("*", int(a * b)),
                ("/", int(a / b)),
                ("<", Object::boolean(a < b)),
                (">", Object::boolean(a > b)),
                ("==", Object::boolean(a == b)),
                ("!=", Object::boolean(a != b)),
            ];

            for (op, expected) in expected {
                // Negative literals parse as prefix negation, so wrap them.
                let source = format!("({}) {} ({})", a, op, b);
                assert_eq!(run(&source), expected, "{}", source);
            }
        }
    }
}

#[test]
fn test_double_bang_is_truthiness() {
    let cases = [
        ("!!5", TRUE),
        ("!!0", TRUE),
        ("!!true", TRUE),
        ("!!false", FALSE),
        ("!!\"\"", TRUE),
        ("!!if (false) { 1 }", FALSE),
    ];

    for (source, expected) in cases {
        assert!(run(source).is_identical(&expected), "{}", source);
    }
}

#[test]
fn test_let_then_lookup() {
    assert_eq!(run("let x = 5; x;"), int(5));
}

#[test]
fn test_rendered_program_reparses_to_the_same_tree() {
    let sources = [
        "let x = 5; x;",
        "let add = fn(a, b) { return a + b * -c; }; add(1, [2, 3][0]);",
        r#"if (x < y) { "yes" } else { !false }; {"k": 1, 2: fn() {}}["k"];"#,
        "let m = macro(a) { quote(unquote(a) + 1) };",
    ];

    for source in sources {
        let (program, errors) = banana::parse(source);
        assert!(errors.is_empty(), "{:?}", errors);

        let rendered = program.to_string();
        let (reparsed, errors) = banana::parse(&rendered);
        assert!(errors.is_empty(), "{} -> {:?}", rendered, errors);
        assert_eq!(reparsed, program, "{}", rendered);
    }
}

#[test]
fn test_closures_capture_their_defining_scope() {
    let source = "let newAdder = fn(x) { fn(y) { x + y } }; let addTwo = newAdder(2); addTwo(3);";
    assert_eq!(run(source), int(5));
}

#[test]
fn test_closure_outlives_its_call() {
    let source = "
        let counterFrom = fn(start) { fn() { start } };
        let a = counterFrom(1);
        let b = counterFrom(2);
        a() * 10 + b();
    ";
    assert_eq!(run(source), int(12));
}

#[test]
fn test_errors_propagate_and_stop_evaluation() {
    assert_eq!(run("5 + true;"), Object::error("Type mismatch: INTEGER + BOOLEAN"));
    assert_eq!(run("foobar"), Object::error("Identifier not found: foobar"));

    // The second statement never runs, so `y` stays unbound.
    let env = Env::new_shared();
    let macro_env = Env::new_shared();
    let result = banana::run("let x = 1 + true; let y = 2;", &env, &macro_env).expect("runs");
    assert_eq!(result, Some(Object::error("Type mismatch: INTEGER + BOOLEAN")));
    assert_eq!(env.borrow().get("x"), None);
    assert_eq!(env.borrow().get("y"), None);
}

#[test]
fn test_error_inside_function_reaches_top_level() {
    let source = "let f = fn() { let a = -true; 5 }; f() + 1;";
    assert_eq!(run(source), Object::error("Unknown operator: -BOOLEAN"));
}

#[test]
fn test_dict_keys_by_content() {
    assert_eq!(run(r#"{ "foo": 1 }["foo"]"#), int(1));
    assert_eq!(run(r#"let k = "fo" + "o"; { "foo": 1 }[k]"#), int(1));
    assert_eq!(run(r#"{ "foo": 1 }["bar"]"#), NULL);
    assert_eq!(run(r#"{ "a": 1, "a": 2 }["a"]"#), int(2));

    let foo = Object::String("foo".to_owned());
    let bar = Object::String("bar".to_owned());
    assert_eq!(foo.hash_key(), Object::String("foo".to_owned()).hash_key());
    assert_ne!(foo.hash_key(), bar.hash_key());
}

#[test]
fn test_parser_reports_missing_identifier_and_keeps_partial_let() {
    let (program, errors) = banana::parse("let = 5;");

    assert_eq!(errors.len(), 1);
    assert_eq!(program.statements.len(), 1);
    assert!(matches!(&program.statements[0].kind, StatementKind::Let { name, .. } if name.is_empty()));

    let env = Env::new_shared();
    match banana::run("let = 5;", &env, &Env::new_shared()) {
        Err(Error::Parse(errors)) => assert!(matches!(errors[0], ParseError::UnexpectedToken { .. })),
        other => panic!("expected parse errors, got {:?}", other),
    }
}

#[test]
fn test_bindings_persist_between_inputs() {
    let env = Env::new_shared();
    let macro_env = Env::new_shared();

    banana::run("let double = fn(x) { x * 2 };", &env, &macro_env).expect("first input");
    banana::run("let unless = macro(c, a) { quote(if (!(unquote(c))) { unquote(a) }) };", &env, &macro_env)
        .expect("second input");

    let result = banana::run("unless(false, double(21))", &env, &macro_env).expect("third input");
    assert_eq!(result, Some(int(42)));
}

#[test]
fn test_evaluator_is_reentrant() {
    let mut evaluator = Evaluator::new(Env::new_shared());

    let (first, _) = banana::parse("let a = 1;");
    let (second, _) = banana::parse("a + 1");

    assert_eq!(evaluator.eval(&first), None);
    assert_eq!(evaluator.eval(&second), Some(int(2)));
}

#[test]
fn test_top_level_return_unwraps() {
    assert_eq!(run("return 7; 8;"), int(7));
    assert_eq!(run("let f = fn() { if (true) { return 1; } 2 }; f() + 10"), int(11));
}

#[test]
fn test_return_in_operand_position_leaves_the_function() {
    assert_eq!(run("let f = fn() { let x = if (true) { return 10; }; 20 }; f();"), int(10));
    assert_eq!(run("let f = fn() { [if (true) { return 3; }] }; f() + 1;"), int(4));
    assert_eq!(run("let f = fn() { typeof(if (true) { return 1; }) }; f();"), int(1));
}

#[test]
fn test_builtins_can_be_passed_around() {
    assert_eq!(run(r#"let size = len; size("abc")"#), int(3));
    assert_eq!(run("let arr = push([1, 2], 3); first(rest(arr)) + last(arr)"), int(5));
}
