use std::sync::Arc;

use super::environment::Environment;
use super::error::{RuntimeError, RuntimeErrorKind};
use super::expression::evaluate;
use super::generator::GeneratorHandle;
use super::value::{Function, Value};
use super::SystemContext;
use crate::lexer::Span;
use crate::parser::statement::{
    Block, Declaration, FunctionKind, Statement,
};

/// Whether execution continues or the enclosing call has produced its result.
pub enum ProgramState {
    Run,
    Return(Value),
}

pub fn execute_declaration(
    declaration: &Declaration,
    environment: &Environment,
    context: &mut dyn SystemContext,
) -> Result<ProgramState, RuntimeError> {
    match declaration {
        Declaration::Function(decl) => {
            let function = Function::new(decl.clone(), environment.clone());
            environment.define(&decl.name.name, Value::Function(Arc::new(function)));
            Ok(ProgramState::Run)
        }
        Declaration::Statement(statement) => execute_statement(statement, environment, context),
    }
}

pub fn execute_statement(
    statement: &Statement,
    environment: &Environment,
    context: &mut dyn SystemContext,
) -> Result<ProgramState, RuntimeError> {
    match statement {
        Statement::Block(block) => execute_block(block, environment, context, true),
        Statement::VariableDecl(decl) => {
            let value = evaluate(&decl.initializer, environment, context)?;
            environment.define(&decl.name.name, value);
            Ok(ProgramState::Run)
        }
        Statement::Assignment(assignment) => {
            let value = evaluate(&assignment.value, environment, context)?;
            environment
                .assign(&assignment.name.name, value)
                .map_err(|_| RuntimeError {
                    kind: RuntimeErrorKind::UndefinedVariable(assignment.name.name.clone()),
                    span: assignment.span,
                })?;
            Ok(ProgramState::Run)
        }
        Statement::Expression(stmt) => {
            let _ = evaluate(&stmt.expr, environment, context)?;
            Ok(ProgramState::Run)
        }
        Statement::If(stmt) => {
            let condition = evaluate(&stmt.condition, environment, context)?;
            if condition.is_truthy() {
                execute_statement(&stmt.then_branch, environment, context)
            } else if let Some(else_branch) = &stmt.else_branch {
                execute_statement(else_branch, environment, context)
            } else {
                Ok(ProgramState::Run)
            }
        }
        Statement::While(stmt) => {
            while evaluate(&stmt.condition, environment, context)?.is_truthy() {
                match execute_statement(&stmt.body, environment, context)? {
                    ProgramState::Run => {}
                    state @ ProgramState::Return(_) => return Ok(state),
                }
            }
            Ok(ProgramState::Run)
        }
        Statement::Return(stmt) => {
            let value = match &stmt.value {
                Some(expr) => evaluate(expr, environment, context)?,
                None => Value::Nil,
            };
            Ok(ProgramState::Return(value))
        }
        Statement::Yield(stmt) => Err(RuntimeError {
            kind: RuntimeErrorKind::UnsupportedYield,
            span: stmt.span,
        }),
    }
}

pub fn execute_block(
    block: &Block,
    environment: &Environment,
    context: &mut dyn SystemContext,
    own_scope: bool,
) -> Result<ProgramState, RuntimeError> {
    let scope = if own_scope {
        environment.new_scope("block")
    } else {
        environment.clone()
    };
    for declaration in &block.declarations {
        match execute_declaration(declaration, &scope, context)? {
            ProgramState::Run => {}
            state @ ProgramState::Return(_) => return Ok(state),
        }
    }
    Ok(ProgramState::Run)
}

/// Calls a user-declared function. A `fun` runs its body to completion;
/// a `gen` compiles on first use and hands back a fresh paused instance.
pub fn call_function(
    function: &Arc<Function>,
    arguments: Vec<Value>,
    span: Span,
    context: &mut dyn SystemContext,
) -> Result<Value, RuntimeError> {
    let declaration = &function.declaration;
    if arguments.len() != declaration.parameters.len() {
        return Err(RuntimeError {
            kind: RuntimeErrorKind::InvalidArgumentCount {
                name: declaration.name.name.clone(),
                expected: declaration.parameters.len(),
                actual: arguments.len(),
            },
            span,
        });
    }

    match declaration.kind {
        FunctionKind::Gen => {
            let compiled = function
                .compiled_generator()
                .map_err(|kind| RuntimeError { kind, span })?;
            let named = declaration
                .parameters
                .iter()
                .map(|param| param.name.clone())
                .zip(arguments)
                .collect();
            let instance = compiled
                .instantiate(named)
                .map_err(|kind| RuntimeError { kind, span })?;
            Ok(Value::Generator(GeneratorHandle::new(
                declaration.name.name.clone(),
                instance,
                function.closure.clone(),
            )))
        }
        FunctionKind::Fun => {
            let call_env = function.closure.new_scope(&declaration.name.name);
            for (parameter, argument) in declaration.parameters.iter().zip(arguments) {
                call_env.define(&parameter.name, argument);
            }
            match execute_block(&declaration.body, &call_env, context, false)? {
                ProgramState::Return(value) => Ok(value),
                ProgramState::Run => Ok(Value::Nil),
            }
        }
    }
}
