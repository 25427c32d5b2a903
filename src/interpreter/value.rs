use std::sync::{Arc, OnceLock};

use compact_str::{CompactString, CompactStringExt};

use super::error::{RuntimeError, RuntimeErrorKind};
use super::generator::{compile_generator, CompiledGenerator, GeneratorHandle};
use super::environment::Environment;
use super::SystemContext;
use crate::lexer::Span;
use crate::parser::expression::BinaryOperator;
use crate::parser::statement::{FunctionDecl, FunctionKind};

pub trait NativeFunction: std::fmt::Debug + Send + Sync {
    fn get_name(&self) -> &'static str;
    fn call(
        &self,
        arguments: Vec<Value>,
        span: Span,
        context: &mut dyn SystemContext,
    ) -> Result<Value, RuntimeError>;
}

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(CompactString),
    Bool(bool),
    Nil,
    List(Arc<Vec<Value>>),
    Function(Arc<Function>),
    NativeFunction(Arc<dyn NativeFunction>),
    Generator(GeneratorHandle),
}

/// A user-declared `fun` or `gen` bound to the scope it was declared in.
///
/// Generator declarations compile into a resumable node tree on first call;
/// the compiled tree is then shared by every later instance.
#[derive(Debug)]
pub struct Function {
    pub declaration: FunctionDecl,
    pub closure: Environment,
    compiled: OnceLock<Arc<CompiledGenerator>>,
}

impl Function {
    pub fn new(declaration: FunctionDecl, closure: Environment) -> Self {
        Self {
            declaration,
            closure,
            compiled: OnceLock::new(),
        }
    }

    pub fn compiled_generator(&self) -> Result<Arc<CompiledGenerator>, RuntimeErrorKind> {
        if let Some(compiled) = self.compiled.get() {
            return Ok(compiled.clone());
        }
        let compiled = Arc::new(compile_generator(&self.declaration)?);
        let _ = self.compiled.set(compiled.clone());
        Ok(compiled)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Nil => write!(f, "nil"),
            Self::List(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Function(fun) => match fun.declaration.kind {
                FunctionKind::Fun => {
                    write!(f, "<fn {}>", fun.declaration.name)
                }
                FunctionKind::Gen => {
                    write!(f, "<gen fn {}>", fun.declaration.name)
                }
            },
            Self::NativeFunction(fun) => write!(f, "<native fn `{}`>", fun.get_name()),
            Self::Generator(handle) => write!(f, "<generator {}>", handle.name()),
        }
    }
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Nil)
    }

    pub fn numeric_negate(&self) -> Result<Value, RuntimeErrorKind> {
        match self {
            Value::Number(v) => Ok(Value::Number(-v)),
            v => Err(RuntimeErrorKind::NonNumericOperand(v.clone())),
        }
    }

    /// Value equality. Mixed-type comparisons are `false`, lists compare
    /// elementwise, callables and generator instances compare by identity.
    pub fn is_equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => lhs == rhs,
            (Value::String(lhs), Value::String(rhs)) => lhs == rhs,
            (Value::Bool(lhs), Value::Bool(rhs)) => lhs == rhs,
            (Value::Nil, Value::Nil) => true,
            (Value::List(lhs), Value::List(rhs)) => {
                lhs.len() == rhs.len()
                    && lhs.iter().zip(rhs.iter()).all(|(l, r)| l.is_equal(r))
            }
            (Value::Function(lhs), Value::Function(rhs)) => Arc::ptr_eq(lhs, rhs),
            (Value::NativeFunction(lhs), Value::NativeFunction(rhs)) => Arc::ptr_eq(lhs, rhs),
            (Value::Generator(lhs), Value::Generator(rhs)) => lhs.is_same_instance(rhs),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

// Binary operators
impl Value {
    pub fn add(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(Value::Number(lhs + rhs)),
            (Value::String(lhs), Value::String(rhs)) => {
                Ok(Value::String([lhs, rhs].concat_compact()))
            }
            (lhs, rhs) => Err(Self::incompatible(
                BinaryOperator::Add,
                lhs,
                rhs,
            )),
        }
    }

    pub fn subtract(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        self.numeric_binary(
            other,
            BinaryOperator::Subtract,
            |lhs, rhs| Value::Number(lhs - rhs),
        )
    }

    pub fn multiply(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        self.numeric_binary(
            other,
            BinaryOperator::Multiply,
            |lhs, rhs| Value::Number(lhs * rhs),
        )
    }

    pub fn divide(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        self.numeric_binary(
            other,
            BinaryOperator::Divide,
            |lhs, rhs| Value::Number(lhs / rhs),
        )
    }

    pub fn modulo(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        self.numeric_binary(
            other,
            BinaryOperator::Modulo,
            |lhs, rhs| Value::Number(lhs.rem_euclid(rhs)),
        )
    }

    pub fn less_than(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        self.numeric_binary(
            other,
            BinaryOperator::LessThan,
            |lhs, rhs| Value::Bool(lhs < rhs),
        )
    }

    pub fn less_than_or_equal(&self, other: &Value) -> Result<Value, RuntimeErrorKind> {
        self.numeric_binary(
            other,
            BinaryOperator::LessThanEqual,
            |lhs, rhs| Value::Bool(lhs <= rhs),
        )
    }

    fn numeric_binary(
        &self,
        other: &Value,
        operator: BinaryOperator,
        apply: impl FnOnce(f64, f64) -> Value,
    ) -> Result<Value, RuntimeErrorKind> {
        match (self, other) {
            (Value::Number(lhs), Value::Number(rhs)) => Ok(apply(*lhs, *rhs)),
            (lhs, rhs) => Err(Self::incompatible(operator, lhs, rhs)),
        }
    }

    fn incompatible(
        operator: BinaryOperator,
        lhs: &Value,
        rhs: &Value,
    ) -> RuntimeErrorKind {
        RuntimeErrorKind::IncompatibleOperands {
            operator,
            lhs: lhs.clone(),
            rhs: rhs.clone(),
        }
    }
}
