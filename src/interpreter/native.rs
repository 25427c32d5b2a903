use std::sync::Arc;

use super::environment::Environment;
use super::error::{RuntimeError, RuntimeErrorKind};
use super::generator::Step;
use super::value::{NativeFunction, Value};
use super::SystemContext;
use crate::lexer::Span;
use compact_str::ToCompactString;

fn require_one_argument(
    name: &'static str,
    arguments: &[Value],
    span: Span,
) -> Result<(), RuntimeError> {
    if arguments.len() != 1 {
        return Err(RuntimeError {
            kind: RuntimeErrorKind::InvalidArgumentCount {
                name: name.to_compact_string(),
                expected: 1,
                actual: arguments.len(),
            },
            span,
        });
    }
    Ok(())
}

/// `next(instance)` resumes a generator once. Exhaustion surfaces as a
/// fault carrying the terminal return value, so callers must stop before
/// the instance runs dry.
#[derive(Debug)]
pub struct NextBuiltin;

impl NativeFunction for NextBuiltin {
    fn get_name(&self) -> &'static str {
        "next"
    }

    fn call(
        &self,
        arguments: Vec<Value>,
        span: Span,
        context: &mut dyn SystemContext,
    ) -> Result<Value, RuntimeError> {
        require_one_argument(self.get_name(), &arguments, span)?;
        let mut arguments = arguments;
        let handle = match arguments.pop() {
            Some(Value::Generator(handle)) => handle,
            _ => {
                return Err(RuntimeError {
                    kind: RuntimeErrorKind::ExpectedGenerator("next"),
                    span,
                });
            }
        };
        match handle.resume(context)? {
            Step::Yielded(value) => Ok(value),
            Step::Done(terminal) => Err(RuntimeError {
                kind: RuntimeErrorKind::GeneratorExhausted { terminal },
                span,
            }),
        }
    }
}

/// `collect(instance)` drives a generator to exhaustion and gathers its
/// yields into a list, with the terminal return value appended when the
/// generator ends with one.
#[derive(Debug)]
pub struct CollectBuiltin;

impl NativeFunction for CollectBuiltin {
    fn get_name(&self) -> &'static str {
        "collect"
    }

    fn call(
        &self,
        arguments: Vec<Value>,
        span: Span,
        context: &mut dyn SystemContext,
    ) -> Result<Value, RuntimeError> {
        require_one_argument(self.get_name(), &arguments, span)?;
        let mut arguments = arguments;
        let handle = match arguments.pop() {
            Some(Value::Generator(handle)) => handle,
            _ => {
                return Err(RuntimeError {
                    kind: RuntimeErrorKind::ExpectedGenerator("collect"),
                    span,
                });
            }
        };
        let items = handle.collect(context)?;
        Ok(Value::List(Arc::new(items)))
    }
}

/// `print(value)` writes the value's display form to the context sink.
#[derive(Debug)]
pub struct PrintBuiltin;

impl NativeFunction for PrintBuiltin {
    fn get_name(&self) -> &'static str {
        "print"
    }

    fn call(
        &self,
        arguments: Vec<Value>,
        span: Span,
        context: &mut dyn SystemContext,
    ) -> Result<Value, RuntimeError> {
        require_one_argument(self.get_name(), &arguments, span)?;
        context.writeln(&format!("{}", arguments[0]));
        Ok(Value::Nil)
    }
}

pub fn install_builtins(environment: &Environment) {
    environment.define("next", Value::NativeFunction(Arc::new(NextBuiltin)));
    environment.define("collect", Value::NativeFunction(Arc::new(CollectBuiltin)));
    environment.define("print", Value::NativeFunction(Arc::new(PrintBuiltin)));
}
