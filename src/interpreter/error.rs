use super::value::Value;
use crate::lexer::Span;
use crate::parser::expression::BinaryOperator;
use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RuntimeErrorKind {
    #[error("Undefined variable `{0}`.")]
    UndefinedVariable(CompactString),
    #[error("Type mismatch {{unary `-`}}: {0}")]
    NonNumericOperand(Value),
    #[error("Type mismatch {{binary `{operator}`}}: [{lhs} , {rhs}]")]
    IncompatibleOperands {
        operator: BinaryOperator,
        lhs: Value,
        rhs: Value,
    },
    #[error("`{0}` is not callable.")]
    NotCallable(CompactString),
    #[error("Wrong argument count for `{name}`: expected {expected}, got {actual}.")]
    InvalidArgumentCount {
        name: CompactString,
        expected: usize,
        actual: usize,
    },
    #[error("Required arguments are missing: {0:?}.")]
    MissingArguments(Vec<CompactString>),
    #[error("Unexpected arguments: {0:?}.")]
    UnexpectedArguments(Vec<CompactString>),
    #[error("`{0}` is not a generator function.")]
    NotAGenerator(CompactString),
    #[error("`{0}` expects a generator instance.")]
    ExpectedGenerator(&'static str),
    #[error("Nested function declarations are not supported in generators.")]
    NestedFunctionInGenerator,
    #[error("`yield` is not supported by regular function execution.")]
    UnsupportedYield,
    #[error("Invalid generator state: {0}.")]
    InvalidState(&'static str),
    #[error("Generator is exhausted.")]
    GeneratorExhausted { terminal: Option<Value> },
}

#[derive(Debug, Error, Clone)]
#[error("{kind}")]
pub struct RuntimeError {
    #[source]
    pub kind: RuntimeErrorKind,
    pub span: Span,
}

impl RuntimeError {
    pub fn code(&self) -> &'static str {
        match self.kind {
            RuntimeErrorKind::UndefinedVariable(_) => "RT001",
            RuntimeErrorKind::NonNumericOperand(_) => "RT002",
            RuntimeErrorKind::IncompatibleOperands { .. } => "RT003",
            RuntimeErrorKind::NotCallable(_) => "RT004",
            RuntimeErrorKind::InvalidArgumentCount { .. } => "RT005",
            RuntimeErrorKind::MissingArguments(_) => "RT006",
            RuntimeErrorKind::UnexpectedArguments(_) => "RT007",
            RuntimeErrorKind::NotAGenerator(_) => "RT008",
            RuntimeErrorKind::ExpectedGenerator(_) => "RT013",
            RuntimeErrorKind::NestedFunctionInGenerator => "RT009",
            RuntimeErrorKind::UnsupportedYield => "RT010",
            RuntimeErrorKind::InvalidState(_) => "RT011",
            RuntimeErrorKind::GeneratorExhausted { .. } => "RT012",
        }
    }
}
