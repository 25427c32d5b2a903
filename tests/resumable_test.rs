use std::sync::Arc;

use rillet::interpreter::context::BufferedContext;
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

fn global(interpreter: &Interpreter, name: &str) -> Value {
    interpreter
        .globals()
        .read(name)
        .expect("global should exist")
}

fn numbers(values: &[f64]) -> Value {
    Value::List(Arc::new(values.iter().copied().map(Value::Number).collect()))
}

#[test]
fn an_if_condition_is_decided_once_across_suspensions() {
    let (interpreter, _) = run_source(
        r#"
        var count = 0;
        fun bump() {
            count = count + 1;
            return true;
        }
        gen g() {
            if bump() {
                yield 1;
                yield 2;
            }
        }
        var xs = collect(g());
        "#,
    );
    assert_eq!(global(&interpreter, "xs"), numbers(&[1.0, 2.0]));
    assert_eq!(global(&interpreter, "count"), Value::Number(1.0));
}

#[test]
fn a_while_condition_is_reevaluated_every_iteration() {
    let (interpreter, _) = run_source(
        r#"
        var checks = 0;
        fun below(i, n) {
            checks = checks + 1;
            return i < n;
        }
        gen g(n) {
            var i = 0;
            while below(i, n) {
                yield i;
                i = i + 1;
            }
        }
        var xs = collect(g(2));
        "#,
    );
    assert_eq!(global(&interpreter, "xs"), numbers(&[0.0, 1.0]));
    // Two passing checks plus the final failing one.
    assert_eq!(global(&interpreter, "checks"), Value::Number(3.0));
}

#[test]
fn false_and_nil_conditions_skip_the_then_branch() {
    let (interpreter, _) = run_source(
        r#"
        gen g() {
            if false { yield 1; }
            if nil { yield 2; }
            yield 3;
        }
        var xs = collect(g());
        "#,
    );
    assert_eq!(global(&interpreter, "xs"), numbers(&[3.0]));
}

#[test]
fn an_else_branch_can_suspend_too() {
    let (interpreter, _) = run_source(
        r#"
        gen pick(flag) {
            if flag {
                yield 1;
            } else {
                yield 2;
                yield 3;
            }
        }
        var xs = collect(pick(false));
        var ys = collect(pick(true));
        "#,
    );
    assert_eq!(global(&interpreter, "xs"), numbers(&[2.0, 3.0]));
    assert_eq!(global(&interpreter, "ys"), numbers(&[1.0]));
}

#[test]
fn loop_body_scopes_reset_between_iterations() {
    let (interpreter, _) = run_source(
        r#"
        gen g() {
            var i = 0;
            while i < 2 {
                var seen = i * 10;
                yield seen;
                i = i + 1;
            }
        }
        var xs = collect(g());
        "#,
    );
    assert_eq!(global(&interpreter, "xs"), numbers(&[0.0, 10.0]));
}

#[test]
fn nested_loops_suspend_and_resume_in_order() {
    let (interpreter, _) = run_source(
        r#"
        gen grid() {
            var i = 0;
            while i < 2 {
                var j = 0;
                while j < 2 {
                    yield i * 10 + j;
                    j = j + 1;
                }
                i = i + 1;
            }
        }
        var xs = collect(grid());
        "#,
    );
    assert_eq!(global(&interpreter, "xs"), numbers(&[0.0, 1.0, 10.0, 11.0]));
}

#[test]
fn a_condition_cache_clears_when_the_loop_resets_its_body() {
    // The conditional inside the loop body must re-decide on every
    // iteration even though it caches within one.
    let (interpreter, _) = run_source(
        r#"
        gen g() {
            var i = 0;
            while i < 4 {
                if i mod 2 == 0 {
                    yield i;
                }
                i = i + 1;
            }
        }
        var xs = collect(g());
        "#,
    );
    assert_eq!(global(&interpreter, "xs"), numbers(&[0.0, 2.0]));
}

#[test]
fn a_yield_in_trailing_position_still_finishes_cleanly() {
    let (interpreter, _) = run_source(
        r#"
        gen g() { yield 1; }
        var xs = collect(g());
        "#,
    );
    assert_eq!(global(&interpreter, "xs"), numbers(&[1.0]));
}

#[test]
fn block_scoped_names_stay_private_to_the_generator() {
    let (interpreter, _) = run_source(
        r#"
        var x = 1;
        gen g() {
            {
                var x = 2;
                yield x;
            }
            yield x;
        }
        var xs = collect(g());
        "#,
    );
    assert_eq!(global(&interpreter, "xs"), numbers(&[2.0, 1.0]));
    assert_eq!(global(&interpreter, "x"), Value::Number(1.0));
}

#[test]
fn trace_output_records_resumptions() {
    let (_, context) = run_source(
        r#"
        gen g() { yield 1; }
        var xs = collect(g());
        "#,
    );
    assert!(context.traces().iter().any(|line| line.contains("resuming")));
    assert!(context.traces().iter().any(|line| line.contains("finished")));
}

#[test]
fn trace_names_the_scope_a_block_opens() {
    let (_, context) = run_source(
        r#"
        gen g() {
            {
                var x = 1;
                yield x;
            }
        }
        var xs = collect(g());
        "#,
    );
    assert!(context
        .traces()
        .iter()
        .any(|line| line.contains("entering scope `block`")));
}
