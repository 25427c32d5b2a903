use super::expression::Expr;
use crate::lexer::Span;
use compact_str::CompactString;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: CompactString,
    pub span: Span,
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone)]
pub struct Program {
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone)]
pub enum Declaration {
    Function(FunctionDecl),
    Statement(Statement),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Fun,
    Gen,
}

impl std::fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionKind::Fun => write!(f, "fun"),
            FunctionKind::Gen => write!(f, "gen"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub kind: FunctionKind,
    pub name: Ident,
    pub parameters: Vec<Ident>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub declarations: Vec<Declaration>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Statement {
    Block(Block),
    VariableDecl(VariableDecl),
    Assignment(Assignment),
    Expression(ExpressionStatement),
    If(IfStatement),
    While(WhileStatement),
    Return(ReturnStatement),
    Yield(YieldStatement),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Block(stmt) => stmt.span,
            Statement::VariableDecl(stmt) => stmt.span,
            Statement::Assignment(stmt) => stmt.span,
            Statement::Expression(stmt) => stmt.span,
            Statement::If(stmt) => stmt.span,
            Statement::While(stmt) => stmt.span,
            Statement::Return(stmt) => stmt.span,
            Statement::Yield(stmt) => stmt.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub name: Ident,
    pub initializer: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub name: Ident,
    pub value: Expr,
    pub span: Span,
}

/// An expression evaluated for its side effects, e.g. `next(g);`.
#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub condition: Expr,
    pub then_branch: Box<Statement>,
    pub else_branch: Option<Box<Statement>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub condition: Expr,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct YieldStatement {
    pub value: Expr,
    pub span: Span,
}
