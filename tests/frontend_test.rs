use rillet::lexer::TokenKind;
use rillet::parser::expression::{BinaryOperator, ExprKind};
use rillet::parser::statement::{Declaration, FunctionKind, Program, Statement};
use rillet::parser::{Parser, ParserError, ParserErrorKind};
use rillet::semantic::{self, SemanticErrorKind};

fn parse(source: &str) -> Program {
    Parser::new(source).parse().expect("source should parse")
}

fn parse_err(source: &str) -> ParserError {
    Parser::new(source)
        .parse()
        .expect_err("source should not parse")
}

#[test]
fn declarations_carry_kind_name_and_parameters() {
    let program = parse(
        r#"
        gen range(start, stop) { yield start; }
        fun add(a, b) { return a + b; }
        "#,
    );
    assert_eq!(program.declarations.len(), 2);
    match &program.declarations[0] {
        Declaration::Function(decl) => {
            assert_eq!(decl.kind, FunctionKind::Gen);
            assert_eq!(decl.name.name, "range");
            let parameters: Vec<&str> = decl
                .parameters
                .iter()
                .map(|parameter| parameter.name.as_str())
                .collect();
            assert_eq!(parameters, vec!["start", "stop"]);
        }
        declaration => panic!("expected a generator declaration, got {declaration:?}"),
    }
    match &program.declarations[1] {
        Declaration::Function(decl) => assert_eq!(decl.kind, FunctionKind::Fun),
        declaration => panic!("expected a function declaration, got {declaration:?}"),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let program = parse("var x = 1 + 2 * 3;");
    let Declaration::Statement(Statement::VariableDecl(decl)) = &program.declarations[0] else {
        panic!("expected a variable declaration");
    };
    let ExprKind::Binary { operator, rhs, .. } = &decl.initializer.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(*operator, BinaryOperator::Add);
    assert!(matches!(
        rhs.kind,
        ExprKind::Binary {
            operator: BinaryOperator::Multiply,
            ..
        }
    ));
}

#[test]
fn if_else_and_while_statements_parse() {
    let program = parse(
        r#"
        var x = 0;
        if x < 1 { x = 1; } else { x = 2; }
        while x < 10 { x = x + 1; }
        "#,
    );
    assert!(matches!(
        program.declarations[1],
        Declaration::Statement(Statement::If(_))
    ));
    assert!(matches!(
        program.declarations[2],
        Declaration::Statement(Statement::While(_))
    ));
}

#[test]
fn a_missing_semicolon_is_an_unexpected_token() {
    let error = parse_err("var x = 1");
    assert!(matches!(
        error.kind,
        ParserErrorKind::UnexpectedToken {
            expected: TokenKind::Semicolon,
            ..
        } | ParserErrorKind::UnexpectedEof
    ));
}

#[test]
fn an_operator_can_not_start_an_expression() {
    let error = parse_err("var x = * 2;");
    assert!(matches!(error.kind, ParserErrorKind::NonExpression(_)));
}

#[test]
fn an_unterminated_string_surfaces_as_a_lexical_error() {
    let error = parse_err(r#"var s = "unterminated;"#);
    assert!(matches!(error.kind, ParserErrorKind::LexicalError(_)));
}

#[test]
fn yield_is_rejected_outside_generators() {
    let program = parse("fun f() { yield 1; }");
    let error = semantic::validate(&program).expect_err("yield in a fun should be rejected");
    assert!(matches!(
        error.kind,
        SemanticErrorKind::YieldOutsideGenerator
    ));

    let program = parse("yield 1;");
    let error = semantic::validate(&program).expect_err("top-level yield should be rejected");
    assert!(matches!(
        error.kind,
        SemanticErrorKind::YieldOutsideGenerator
    ));
}

#[test]
fn return_is_rejected_at_the_top_level() {
    let program = parse("return 1;");
    let error = semantic::validate(&program).expect_err("top-level return should be rejected");
    assert!(matches!(
        error.kind,
        SemanticErrorKind::ReturnOutsideFunction
    ));
}

#[test]
fn duplicate_parameters_are_rejected() {
    let program = parse("gen g(a, a) { yield a; }");
    let error = semantic::validate(&program).expect_err("duplicate parameters should be rejected");
    assert!(matches!(
        error.kind,
        SemanticErrorKind::DuplicateParameter(ref name) if name == "a"
    ));
}

#[test]
fn return_inside_a_generator_validates() {
    let program = parse("gen g() { yield 1; return 2; }");
    assert!(semantic::validate(&program).is_ok());
}
