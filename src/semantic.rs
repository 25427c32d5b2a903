//! Static checks that run after parsing and before execution.
//!
//! The runtime assumes these hold: duplicate parameter names are rejected,
//! `yield` appears only inside `gen` bodies and `return` only inside some
//! function body.

use crate::lexer::Span;
use crate::parser::statement::{
    Block, Declaration, FunctionDecl, FunctionKind, Program, Statement,
};
use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SemanticErrorKind {
    #[error("Duplicate parameter name `{0}`.")]
    DuplicateParameter(CompactString),
    #[error("`yield` is only allowed inside generator functions.")]
    YieldOutsideGenerator,
    #[error("`return` is only allowed inside functions.")]
    ReturnOutsideFunction,
}

#[derive(Debug, Error, Clone)]
#[error("{kind}")]
pub struct SemanticError {
    #[source]
    pub kind: SemanticErrorKind,
    pub span: Span,
}

pub fn validate(program: &Program) -> Result<(), SemanticError> {
    for declaration in &program.declarations {
        validate_declaration(declaration, None)?;
    }
    Ok(())
}

fn validate_declaration(
    declaration: &Declaration,
    enclosing: Option<FunctionKind>,
) -> Result<(), SemanticError> {
    match declaration {
        Declaration::Function(decl) => {
            validate_parameters(decl)?;
            validate_block(&decl.body, Some(decl.kind))
        }
        Declaration::Statement(statement) => validate_statement(statement, enclosing),
    }
}

fn validate_parameters(decl: &FunctionDecl) -> Result<(), SemanticError> {
    for (index, parameter) in decl.parameters.iter().enumerate() {
        let duplicated = decl.parameters[..index]
            .iter()
            .any(|earlier| earlier.name == parameter.name);
        if duplicated {
            return Err(SemanticError {
                kind: SemanticErrorKind::DuplicateParameter(parameter.name.clone()),
                span: parameter.span,
            });
        }
    }
    Ok(())
}

fn validate_block(block: &Block, enclosing: Option<FunctionKind>) -> Result<(), SemanticError> {
    for declaration in &block.declarations {
        validate_declaration(declaration, enclosing)?;
    }
    Ok(())
}

fn validate_statement(
    statement: &Statement,
    enclosing: Option<FunctionKind>,
) -> Result<(), SemanticError> {
    match statement {
        Statement::Block(block) => validate_block(block, enclosing),
        Statement::If(stmt) => {
            validate_statement(&stmt.then_branch, enclosing)?;
            if let Some(else_branch) = &stmt.else_branch {
                validate_statement(else_branch, enclosing)?;
            }
            Ok(())
        }
        Statement::While(stmt) => validate_statement(&stmt.body, enclosing),
        Statement::Return(stmt) => match enclosing {
            Some(_) => Ok(()),
            None => Err(SemanticError {
                kind: SemanticErrorKind::ReturnOutsideFunction,
                span: stmt.span,
            }),
        },
        Statement::Yield(stmt) => match enclosing {
            Some(FunctionKind::Gen) => Ok(()),
            _ => Err(SemanticError {
                kind: SemanticErrorKind::YieldOutsideGenerator,
                span: stmt.span,
            }),
        },
        Statement::VariableDecl(_) | Statement::Assignment(_) | Statement::Expression(_) => Ok(()),
    }
}
