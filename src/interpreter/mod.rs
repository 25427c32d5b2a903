pub mod context;
pub mod environment;
pub mod error;
pub mod executor;
pub mod expression;
pub mod generator;
pub mod native;
pub mod resumable;
pub mod value;

use std::collections::HashMap;

use compact_str::CompactString;

use crate::lexer::Span;
use crate::parser::statement::{FunctionKind, Program};
use environment::Environment;
use error::{RuntimeError, RuntimeErrorKind};
use generator::GeneratorHandle;
use value::Value;

/// Host capability injected into every execution path. `writeln` carries
/// program-visible output, `trace` the engine's suspend/resume log.
pub trait SystemContext {
    fn writeln(&mut self, text: &str);
    fn trace(&mut self, text: &str);
}

pub struct Interpreter {
    globals: Environment,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::new("global");
        native::install_builtins(&globals);
        Self { globals }
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Runs a program top to bottom against the global scope.
    pub fn run(
        &self,
        program: &Program,
        context: &mut dyn SystemContext,
    ) -> Result<(), RuntimeError> {
        for declaration in &program.declarations {
            executor::execute_declaration(declaration, &self.globals, context)?;
        }
        Ok(())
    }

    /// Host-side entry point: instantiates a declared generator from named
    /// arguments without going through a call expression.
    pub fn instantiate_generator(
        &self,
        name: &str,
        arguments: HashMap<CompactString, Value>,
    ) -> Result<GeneratorHandle, RuntimeError> {
        let target = self.globals.read(name).ok_or_else(|| RuntimeError {
            kind: RuntimeErrorKind::UndefinedVariable(CompactString::from(name)),
            span: Span::new(0, 0),
        })?;
        let function = match &target {
            Value::Function(function)
                if function.declaration.kind == FunctionKind::Gen =>
            {
                function.clone()
            }
            _ => {
                return Err(RuntimeError {
                    kind: RuntimeErrorKind::NotAGenerator(CompactString::from(name)),
                    span: Span::new(0, 0),
                });
            }
        };
        let span = function.declaration.span;
        let compiled = function
            .compiled_generator()
            .map_err(|kind| RuntimeError { kind, span })?;
        let instance = compiled
            .instantiate(arguments)
            .map_err(|kind| RuntimeError { kind, span })?;
        Ok(GeneratorHandle::new(
            function.declaration.name.name.clone(),
            instance,
            function.closure.clone(),
        ))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
