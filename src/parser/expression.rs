use crate::lexer::Span;
use compact_str::CompactString;

/// An expression together with the source span it was parsed from.
///
/// Expressions are immutable once built: generator instances share them by
/// reference while each instance keeps its own cursor state.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Var(CompactString),
    Unary {
        operand: Box<Expr>,
    },
    Binary {
        operator: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        callee: CompactString,
        arguments: Vec<Expr>,
    },
}

#[derive(Debug, Clone)]
pub enum Literal {
    Number(f64),
    String(CompactString),
    Bool(bool),
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    EqualEqual,
    LessThan,
    LessThanEqual,
}

impl BinaryOperator {
    pub fn get_binding_power(&self) -> (u8, u8) {
        match self {
            BinaryOperator::EqualEqual => (1, 2),
            BinaryOperator::LessThan | BinaryOperator::LessThanEqual => (3, 4),
            BinaryOperator::Add | BinaryOperator::Subtract => (5, 6),
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => (7, 8),
        }
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "mod",
            BinaryOperator::EqualEqual => "==",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanEqual => "<=",
        };
        write!(f, "{symbol}")
    }
}
