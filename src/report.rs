use std::path::Path;

use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};

use crate::interpreter::error::{RuntimeError, RuntimeErrorKind};
use crate::lexer::{LexicalError, LexicalErrorKind, Span};
use crate::parser::{ParserError, ParserErrorKind};
use crate::semantic::{SemanticError, SemanticErrorKind};

const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

/// Renders labelled source reports for every error stage.
pub struct Reporter<'src> {
    text: &'src str,
    path: &'src Path,
}

impl<'src> Reporter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self { text, path }
    }

    fn path(&self) -> &'src str {
        self.path.to_str().unwrap_or("<source>")
    }

    fn render(&self, code: &str, span: Span, message: &str, label: String) -> String {
        let path = self.path();
        let mut output = std::io::Cursor::new(Vec::new());
        Report::build(ReportKind::Error, (path, span.range()))
            .with_code(code)
            .with_message(message)
            .with_label(
                Label::new((path, span.range()))
                    .with_message(label)
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output)
            .expect(ARIADNE_WRITE_MSG);
        String::from_utf8(output.into_inner()).expect(ARIADNE_MSG)
    }

    pub fn report_lexical(&self, error: &LexicalError) -> String {
        let (message, label) = match &error.kind {
            LexicalErrorKind::Unrecognized(c) => (
                "Encountered an unrecognized character",
                format!("{} is not part of the language.", format!("{c:?}").fg(Color::BrightRed)),
            ),
            LexicalErrorKind::UnclosedString => (
                "Encountered an unterminated string",
                "This string never closes.".to_string(),
            ),
        };
        self.render("LX001", error.span, message, label)
    }

    pub fn report_parser(&self, error: &ParserError) -> String {
        let (message, label) = match &error.kind {
            ParserErrorKind::UnexpectedToken { actual, expected } => (
                "Encountered an unexpected token",
                format!(
                    "Expected {} but got {}.",
                    format!("{expected}").fg(Color::BrightCyan),
                    format!("{actual}").fg(Color::BrightRed),
                ),
            ),
            ParserErrorKind::NonExpression(token) => (
                "Expected an expression",
                format!(
                    "{} can not start an expression.",
                    format!("{token}").fg(Color::BrightRed)
                ),
            ),
            ParserErrorKind::UnexpectedEof => (
                "Source ended unexpectedly",
                "More input was expected here.".to_string(),
            ),
            ParserErrorKind::LexicalError(inner) => return self.report_lexical(inner),
        };
        self.render("PS001", error.span, message, label)
    }

    pub fn report_semantic(&self, error: &SemanticError) -> String {
        let (message, label) = match &error.kind {
            SemanticErrorKind::DuplicateParameter(name) => (
                "A parameter name repeats",
                format!("{} is declared twice.", name.fg(Color::BrightRed)),
            ),
            SemanticErrorKind::YieldOutsideGenerator => (
                "`yield` outside of a generator",
                "Only `gen` bodies may yield.".to_string(),
            ),
            SemanticErrorKind::ReturnOutsideFunction => (
                "`return` outside of a function",
                "Only `fun` and `gen` bodies may return.".to_string(),
            ),
        };
        self.render("SM001", error.span, message, label)
    }

    pub fn report_runtime(&self, error: &RuntimeError) -> String {
        let label = match &error.kind {
            RuntimeErrorKind::UndefinedVariable(name) => {
                format!("{} has not been defined.", name.fg(Color::BrightRed))
            }
            RuntimeErrorKind::NonNumericOperand(value) => {
                format!("Type is {} instead of numeric.", format!("{value}").fg(Color::BrightRed))
            }
            RuntimeErrorKind::IncompatibleOperands { operator, lhs, rhs } => format!(
                "{} does not accept {} and {}.",
                format!("{operator}").fg(Color::BrightCyan),
                format!("{lhs}").fg(Color::BrightRed),
                format!("{rhs}").fg(Color::BrightRed),
            ),
            RuntimeErrorKind::GeneratorExhausted { terminal: Some(value) } => format!(
                "This generator already finished with {}.",
                format!("{value}").fg(Color::BrightRed)
            ),
            RuntimeErrorKind::GeneratorExhausted { terminal: None } => {
                "This generator already finished.".to_string()
            }
            kind => format!("{kind}"),
        };
        self.render(error.code(), error.span, &format!("{}", error.kind), label)
    }
}
