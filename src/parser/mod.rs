mod error;
pub mod expression;
pub mod statement;

pub use error::{ParserError, ParserErrorKind};

use crate::lexer::{Lexer, Token, TokenKind};
use compact_str::{CompactString, ToCompactString};
use expression::{BinaryOperator, Expr, ExprKind, Literal};
use statement::{
    Assignment, Block, Declaration, ExpressionStatement, FunctionDecl, FunctionKind, Ident,
    IfStatement, Program, ReturnStatement, Statement, VariableDecl, WhileStatement, YieldStatement,
};

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    lookahead: Option<Result<Token, ParserError>>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            lookahead: None,
        }
    }

    pub fn parse(&mut self) -> Result<Program, ParserError> {
        let mut declarations = Vec::new();
        loop {
            if self.peek()?.kind == TokenKind::Eof {
                break;
            }
            declarations.push(self.parse_declaration()?);
        }
        Ok(Program { declarations })
    }
}

// Token plumbing
impl<'src> Parser<'src> {
    fn peek(&mut self) -> Result<Token, ParserError> {
        match self.lookahead {
            Some(ref token_or_error) => token_or_error.clone(),
            None => {
                let next_token = self.next_token();
                self.lookahead = Some(next_token.clone());
                next_token
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParserError> {
        match self.lookahead.take() {
            Some(token_or_error) => token_or_error,
            None => self.lexer.next_token().map_err(|e| ParserError {
                span: e.span,
                kind: ParserErrorKind::LexicalError(e),
            }),
        }
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, ParserError> {
        let next_token = self.next_token()?;
        if next_token.kind != expected {
            Err(ParserError {
                span: next_token.span,
                kind: ParserErrorKind::UnexpectedToken {
                    actual: next_token.kind,
                    expected,
                },
            })
        } else {
            Ok(next_token)
        }
    }

    fn eat_if(&mut self, next: TokenKind) -> Result<Option<Token>, ParserError> {
        let next_token = self.peek()?;
        if next_token.kind != next {
            Ok(None)
        } else {
            let _ = self.next_token().expect("Just peeked.");
            Ok(Some(next_token))
        }
    }

    fn expect_ident(&mut self) -> Result<Ident, ParserError> {
        let token = self.expect(TokenKind::Ident)?;
        Ok(self.ident_from(&token))
    }

    fn ident_from(&self, token: &Token) -> Ident {
        let name = self
            .lexer
            .get_lexeme(&token.span)
            .expect("Lexed token has a valid span")
            .to_compact_string();
        Ident {
            name,
            span: token.span,
        }
    }
}

// Declarations and statements
impl<'src> Parser<'src> {
    fn parse_declaration(&mut self) -> Result<Declaration, ParserError> {
        let first = self.peek()?;
        match first.kind {
            TokenKind::KeywordFun => Ok(Declaration::Function(
                self.parse_function_decl(FunctionKind::Fun)?,
            )),
            TokenKind::KeywordGen => Ok(Declaration::Function(
                self.parse_function_decl(FunctionKind::Gen)?,
            )),
            _ => Ok(Declaration::Statement(self.parse_statement()?)),
        }
    }

    fn parse_function_decl(&mut self, kind: FunctionKind) -> Result<FunctionDecl, ParserError> {
        let keyword = self.next_token().expect("Just peeked.");
        let name = self.expect_ident()?;

        let _ = self.expect(TokenKind::LeftParenthesis)?;
        let mut parameters = Vec::new();
        if self.peek()?.kind != TokenKind::RightParenthesis {
            loop {
                parameters.push(self.expect_ident()?);
                if self.eat_if(TokenKind::Comma)?.is_none() {
                    break;
                }
            }
        }
        let _ = self.expect(TokenKind::RightParenthesis)?;

        let body = self.parse_block()?;
        let span = keyword.span.merge(&body.span);
        Ok(FunctionDecl {
            kind,
            name,
            parameters,
            body,
            span,
        })
    }

    fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        let first = self.peek()?;
        match first.kind {
            TokenKind::LeftBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::KeywordVar => self.parse_variable_decl(),
            TokenKind::KeywordIf => self.parse_if_statement(),
            TokenKind::KeywordWhile => self.parse_while_statement(),
            TokenKind::KeywordReturn => self.parse_return_statement(),
            TokenKind::KeywordYield => self.parse_yield_statement(),
            TokenKind::Ident => self.parse_assignment_or_expression(),
            TokenKind::Eof => Err(ParserError {
                kind: ParserErrorKind::UnexpectedEof,
                span: first.span,
            }),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_block(&mut self) -> Result<Block, ParserError> {
        let open = self.expect(TokenKind::LeftBrace)?;
        let mut declarations = Vec::new();
        loop {
            let next = self.peek()?;
            match next.kind {
                TokenKind::RightBrace => {
                    let close = self.next_token().expect("Just peeked.");
                    return Ok(Block {
                        declarations,
                        span: open.span.merge(&close.span),
                    });
                }
                TokenKind::Eof => {
                    return Err(ParserError {
                        kind: ParserErrorKind::UnexpectedEof,
                        span: next.span,
                    })
                }
                _ => declarations.push(self.parse_declaration()?),
            }
        }
    }

    fn parse_variable_decl(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.next_token().expect("Just peeked.");
        let name = self.expect_ident()?;
        let _ = self.expect(TokenKind::Equal)?;
        let initializer = self.parse_expression()?;
        let semicolon = self.expect(TokenKind::Semicolon)?;
        Ok(Statement::VariableDecl(VariableDecl {
            name,
            initializer,
            span: keyword.span.merge(&semicolon.span),
        }))
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.next_token().expect("Just peeked.");
        let condition = self.parse_expression()?;
        let then_branch = self.parse_statement()?;
        let mut span = keyword.span.merge(&then_branch.span());

        let else_branch = if self.eat_if(TokenKind::KeywordElse)?.is_some() {
            let else_branch = self.parse_statement()?;
            span = span.merge(&else_branch.span());
            Some(Box::new(else_branch))
        } else {
            None
        };

        Ok(Statement::If(IfStatement {
            condition,
            then_branch: Box::new(then_branch),
            else_branch,
            span,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.next_token().expect("Just peeked.");
        let condition = self.parse_expression()?;
        let body = self.parse_statement()?;
        let span = keyword.span.merge(&body.span());
        Ok(Statement::While(WhileStatement {
            condition,
            body: Box::new(body),
            span,
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.next_token().expect("Just peeked.");
        let value = if self.peek()?.kind != TokenKind::Semicolon {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let semicolon = self.expect(TokenKind::Semicolon)?;
        Ok(Statement::Return(ReturnStatement {
            value,
            span: keyword.span.merge(&semicolon.span),
        }))
    }

    fn parse_yield_statement(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.next_token().expect("Just peeked.");
        let value = self.parse_expression()?;
        let semicolon = self.expect(TokenKind::Semicolon)?;
        Ok(Statement::Yield(YieldStatement {
            value,
            span: keyword.span.merge(&semicolon.span),
        }))
    }

    /// `x = expr;` is an assignment statement; any other leading identifier
    /// starts a plain expression statement.
    fn parse_assignment_or_expression(&mut self) -> Result<Statement, ParserError> {
        let name_token = self.next_token().expect("Just peeked.");
        if self.peek()?.kind == TokenKind::Equal {
            let _ = self.next_token().expect("Just peeked.");
            let value = self.parse_expression()?;
            let semicolon = self.expect(TokenKind::Semicolon)?;
            return Ok(Statement::Assignment(Assignment {
                name: self.ident_from(&name_token),
                value,
                span: name_token.span.merge(&semicolon.span),
            }));
        }

        // Not an assignment: hand the identifier back and parse a full
        // expression statement.
        self.lookahead = Some(Ok(name_token));
        self.parse_expression_statement()
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParserError> {
        let expr = self.parse_expression()?;
        let semicolon = self.expect(TokenKind::Semicolon)?;
        let span = expr.span.merge(&semicolon.span);
        Ok(Statement::Expression(ExpressionStatement { expr, span }))
    }
}

// Pratt parser for expressions
impl<'src> Parser<'src> {
    pub fn parse_expression(&mut self) -> Result<Expr, ParserError> {
        self.parse_expression_pratt(0)
    }

    fn peek_binary_operator(&mut self) -> Result<Option<BinaryOperator>, ParserError> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Plus => Ok(Some(BinaryOperator::Add)),
            TokenKind::Minus => Ok(Some(BinaryOperator::Subtract)),
            TokenKind::Star => Ok(Some(BinaryOperator::Multiply)),
            TokenKind::Slash => Ok(Some(BinaryOperator::Divide)),
            TokenKind::KeywordMod => Ok(Some(BinaryOperator::Modulo)),
            TokenKind::LessThan => Ok(Some(BinaryOperator::LessThan)),
            TokenKind::LessThanEqual => Ok(Some(BinaryOperator::LessThanEqual)),
            TokenKind::EqualEqual => Ok(Some(BinaryOperator::EqualEqual)),
            _ => Ok(None),
        }
    }

    fn parse_expression_pratt(&mut self, min_bp: u8) -> Result<Expr, ParserError> {
        let mut lhs = self.expect_left_expression()?;

        while let Some(operator) = self.peek_binary_operator()? {
            let (lbp, rbp) = operator.get_binding_power();
            if lbp < min_bp {
                break;
            }
            let _ = self.next_token()?;

            let rhs = self.parse_expression_pratt(rbp)?;
            let span = lhs.span.merge(&rhs.span);
            lhs = Expr {
                kind: ExprKind::Binary {
                    operator,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            };
        }
        Ok(lhs)
    }

    fn expect_left_expression(&mut self) -> Result<Expr, ParserError> {
        let token = self.next_token()?;

        if matches!(token.kind, TokenKind::Eof) {
            return Err(ParserError {
                kind: ParserErrorKind::UnexpectedEof,
                span: token.span,
            });
        }

        let lexeme = self
            .lexer
            .get_lexeme(&token.span)
            .expect("Lexed token has a valid span");

        let expr = match token.kind {
            TokenKind::NumericLiteral => Expr {
                kind: ExprKind::Literal(Literal::Number(
                    lexeme
                        .parse()
                        .expect("Numeric literal tokens are valid `f64`"),
                )),
                span: token.span,
            },
            TokenKind::StringLiteral => {
                let value = lexeme
                    .get(1..lexeme.len() - 1)
                    .expect("String literal tokens are at least length 2.");
                Expr {
                    kind: ExprKind::Literal(Literal::String(value.into())),
                    span: token.span,
                }
            }
            TokenKind::KeywordTrue => Expr {
                kind: ExprKind::Literal(Literal::Bool(true)),
                span: token.span,
            },
            TokenKind::KeywordFalse => Expr {
                kind: ExprKind::Literal(Literal::Bool(false)),
                span: token.span,
            },
            TokenKind::KeywordNil => Expr {
                kind: ExprKind::Literal(Literal::Nil),
                span: token.span,
            },
            TokenKind::Ident => self.finish_var_or_call(&token)?,
            TokenKind::Minus => {
                // Unary negation binds tighter than every binary operator.
                const UNARY_RBP: u8 = 9;
                let operand = self.parse_expression_pratt(UNARY_RBP)?;
                let span = token.span.merge(&operand.span);
                Expr {
                    kind: ExprKind::Unary {
                        operand: Box::new(operand),
                    },
                    span,
                }
            }
            TokenKind::LeftParenthesis => {
                let inner = self.parse_expression_pratt(0)?;
                let _ = self.expect(TokenKind::RightParenthesis)?;
                inner
            }
            kind => {
                return Err(ParserError {
                    kind: ParserErrorKind::NonExpression(kind),
                    span: token.span,
                })
            }
        };
        Ok(expr)
    }

    fn finish_var_or_call(&mut self, name_token: &Token) -> Result<Expr, ParserError> {
        let name: CompactString = self
            .lexer
            .get_lexeme(&name_token.span)
            .expect("Lexed token has a valid span")
            .to_compact_string();

        if self.eat_if(TokenKind::LeftParenthesis)?.is_none() {
            return Ok(Expr {
                kind: ExprKind::Var(name),
                span: name_token.span,
            });
        }

        let mut arguments = Vec::new();
        if self.peek()?.kind != TokenKind::RightParenthesis {
            loop {
                arguments.push(self.parse_expression()?);
                if self.eat_if(TokenKind::Comma)?.is_none() {
                    break;
                }
            }
        }
        let close = self.expect(TokenKind::RightParenthesis)?;
        Ok(Expr {
            kind: ExprKind::Call {
                callee: name,
                arguments,
            },
            span: name_token.span.merge(&close.span),
        })
    }
}
