use clap::{Parser as ClapParser, Subcommand};
use color_eyre::eyre::Result;
use std::path::{Path, PathBuf};
use std::{fs::read_to_string, process::ExitCode};

use rillet::interpreter::context::{StdioContext, TraceContext};
use rillet::interpreter::{Interpreter, SystemContext};
use rillet::lexer::{Lexer, TokenKind};
use rillet::parser::Parser;
use rillet::report::Reporter;
use rillet::semantic;

#[derive(Debug, ClapParser)]
#[clap(name = "rillet", version)]
pub struct CLArgs {
    #[clap(subcommand)]
    pub routine: RilletCommand,
}

#[derive(Debug, Subcommand)]
pub enum RilletCommand {
    Tokenize {
        path: PathBuf,
    },
    Parse {
        path: PathBuf,
    },
    Run {
        path: PathBuf,
        /// Mirror the engine's suspend/resume log to stderr.
        #[clap(long = "trace")]
        trace: bool,
    },
}

fn main() -> ExitCode {
    rillet_main().expect("Encountered an error!")
}

fn rillet_main() -> Result<ExitCode> {
    color_eyre::install().expect("Can't fail at first call!");
    let args = CLArgs::parse();
    match args.routine {
        RilletCommand::Tokenize { path } => {
            eprintln!("Tokenizing {:?}...", path);
            let src = read_to_string(&path)?;
            if !tokenize(&src, &path) {
                return Ok(ExitCode::from(65));
            }
        }
        RilletCommand::Parse { path } => {
            eprintln!("Parsing {:?}...", path);
            let src = read_to_string(&path)?;
            if !parse(&src, &path) {
                return Ok(ExitCode::from(65));
            }
        }
        RilletCommand::Run { path, trace } => {
            let src = read_to_string(&path)?;
            return Ok(run(&src, &path, trace));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn tokenize(src: &str, path: &Path) -> bool {
    let reporter = Reporter::new(src, path);
    let mut scanner = Lexer::new(src);
    let line_breaks = scanner.get_line_breaks();
    let mut succeeded = true;
    loop {
        match scanner.next_token() {
            Ok(token) => {
                let line = line_breaks.get_line_from_span(token.span);
                eprintln!("({line}) {}", token.kind);
                if matches!(token.kind, TokenKind::Eof) {
                    return succeeded;
                }
            }
            Err(error) => {
                eprintln!("{}", reporter.report_lexical(&error));
                succeeded = false;
            }
        }
    }
}

fn parse(src: &str, path: &Path) -> bool {
    let reporter = Reporter::new(src, path);
    let mut parser = Parser::new(src);
    let program = match parser.parse() {
        Ok(program) => program,
        Err(error) => {
            eprintln!("{}", reporter.report_parser(&error));
            return false;
        }
    };
    if let Err(error) = semantic::validate(&program) {
        eprintln!("{}", reporter.report_semantic(&error));
        return false;
    }
    eprintln!("{program:#?}");
    true
}

fn run(src: &str, path: &Path, trace: bool) -> ExitCode {
    let reporter = Reporter::new(src, path);
    let mut parser = Parser::new(src);
    let program = match parser.parse() {
        Ok(program) => program,
        Err(error) => {
            eprintln!("{}", reporter.report_parser(&error));
            return ExitCode::from(65);
        }
    };
    if let Err(error) = semantic::validate(&program) {
        eprintln!("{}", reporter.report_semantic(&error));
        return ExitCode::from(65);
    }

    let mut stdio = StdioContext;
    let mut traced = TraceContext;
    let context: &mut dyn SystemContext = if trace { &mut traced } else { &mut stdio };

    let interpreter = Interpreter::new();
    match interpreter.run(&program, context) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", reporter.report_runtime(&error));
            ExitCode::from(70)
        }
    }
}
