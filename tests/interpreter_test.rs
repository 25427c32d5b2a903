use rillet::interpreter::context::BufferedContext;
use rillet::interpreter::error::{RuntimeError, RuntimeErrorKind};
use rillet::interpreter::value::Value;
use rillet::interpreter::Interpreter;
use rillet::parser::statement::Program;
use rillet::parser::Parser;
use rillet::semantic;

fn compile(source: &str) -> Program {
    let mut parser = Parser::new(source);
    let program = parser.parse().expect("source should parse");
    semantic::validate(&program).expect("source should validate");
    program
}

fn run_source(source: &str) -> (Interpreter, BufferedContext) {
    let program = compile(source);
    let interpreter = Interpreter::new();
    let mut context = BufferedContext::new();
    interpreter
        .run(&program, &mut context)
        .expect("program should run");
    (interpreter, context)
}

fn run_source_err(source: &str) -> RuntimeError {
    let program = compile(source);
    let interpreter = Interpreter::new();
    let mut context = BufferedContext::new();
    interpreter
        .run(&program, &mut context)
        .expect_err("program should fault")
}

fn global(interpreter: &Interpreter, name: &str) -> Value {
    interpreter
        .globals()
        .read(name)
        .expect("global should exist")
}

#[test]
fn block_declarations_shadow_without_leaking() {
    let (interpreter, _) = run_source(
        r#"
        var x = 1;
        var y = 0;
        {
            var x = 2;
            y = x;
        }
        "#,
    );
    assert_eq!(global(&interpreter, "x"), Value::Number(1.0));
    assert_eq!(global(&interpreter, "y"), Value::Number(2.0));
}

#[test]
fn assignment_mutates_the_nearest_enclosing_binding() {
    let (interpreter, _) = run_source(
        r#"
        var x = 1;
        { x = 5; }
        "#,
    );
    assert_eq!(global(&interpreter, "x"), Value::Number(5.0));
}

#[test]
fn assigning_an_unbound_name_faults() {
    let error = run_source_err("missing = 1;");
    assert!(matches!(
        error.kind,
        RuntimeErrorKind::UndefinedVariable(ref name) if name == "missing"
    ));
}

#[test]
fn reading_an_unbound_name_faults() {
    let error = run_source_err("var x = missing;");
    assert!(matches!(
        error.kind,
        RuntimeErrorKind::UndefinedVariable(_)
    ));
}

#[test]
fn functions_return_values_and_close_over_globals() {
    let (interpreter, _) = run_source(
        r#"
        var offset = 10;
        fun add(a, b) { return a + b + offset; }
        var z = add(1, 2);
        "#,
    );
    assert_eq!(global(&interpreter, "z"), Value::Number(13.0));
}

#[test]
fn a_function_without_a_return_yields_nil() {
    let (interpreter, _) = run_source(
        r#"
        fun noop() { var x = 1; }
        var z = noop();
        "#,
    );
    assert_eq!(global(&interpreter, "z"), Value::Nil);
}

#[test]
fn recursion_unwinds_through_return() {
    let (interpreter, _) = run_source(
        r#"
        fun fact(n) {
            if n < 2 { return 1; }
            return n * fact(n - 1);
        }
        var z = fact(5);
        "#,
    );
    assert_eq!(global(&interpreter, "z"), Value::Number(120.0));
}

#[test]
fn return_stops_a_regular_while_loop() {
    let (interpreter, _) = run_source(
        r#"
        fun first_multiple(of, above) {
            var candidate = of;
            while true {
                if above < candidate { return candidate; }
                candidate = candidate + of;
            }
        }
        var z = first_multiple(7, 30);
        "#,
    );
    assert_eq!(global(&interpreter, "z"), Value::Number(35.0));
}

#[test]
fn strings_concatenate_with_plus() {
    let (interpreter, _) = run_source(r#"var s = "foo" + "bar";"#);
    assert_eq!(global(&interpreter, "s"), Value::String("foobar".into()));
}

#[test]
fn modulo_is_euclidean() {
    let (interpreter, _) = run_source(
        r#"
        var a = 7 mod 3;
        var b = 0 - 1 mod 3;
        var c = (0 - 7) mod 3;
        "#,
    );
    assert_eq!(global(&interpreter, "a"), Value::Number(1.0));
    // `mod` binds tighter than `-`, so b is -(1 mod 3).
    assert_eq!(global(&interpreter, "b"), Value::Number(-1.0));
    assert_eq!(global(&interpreter, "c"), Value::Number(2.0));
}

#[test]
fn mixed_operand_types_fault() {
    let error = run_source_err("var x = 1 + true;");
    assert!(matches!(
        error.kind,
        RuntimeErrorKind::IncompatibleOperands { .. }
    ));
}

#[test]
fn calling_a_number_faults() {
    let error = run_source_err("var x = 1;\nvar y = x();");
    assert!(matches!(error.kind, RuntimeErrorKind::NotCallable(ref name) if name == "x"));
}

#[test]
fn print_writes_through_the_context() {
    let (_, context) = run_source(
        r#"
        print(1 + 2);
        print("done");
        "#,
    );
    assert_eq!(context.into_data(), "3\ndone\n");
}

#[test]
fn the_executor_rejects_yield_even_without_validation() {
    // Running an unvalidated program must not silently drop a yield.
    let program = Parser::new("yield 1;")
        .parse()
        .expect("source should parse");
    let interpreter = Interpreter::new();
    let mut context = BufferedContext::new();
    let error = interpreter
        .run(&program, &mut context)
        .expect_err("top-level yield should fault");
    assert!(matches!(error.kind, RuntimeErrorKind::UnsupportedYield));
}

#[test]
fn comparison_operators_produce_booleans() {
    let (interpreter, _) = run_source(
        r#"
        var a = 1 < 2;
        var b = 2 <= 2;
        var c = 3 == 4;
        var d = "a" == "a";
        "#,
    );
    assert_eq!(global(&interpreter, "a"), Value::Bool(true));
    assert_eq!(global(&interpreter, "b"), Value::Bool(true));
    assert_eq!(global(&interpreter, "c"), Value::Bool(false));
    assert_eq!(global(&interpreter, "d"), Value::Bool(true));
}
