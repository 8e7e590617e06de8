use std::{io::Write, ops::ControlFlow};

use anyhow::Result;
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use bpaf::{construct, long, short, OptionParser, Parser};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use util::repl;

use crate::{
    context::Context,
    evaluator::Outcome,
    parser::{ParseError, Statement},
    prelude::*,
    term::Term,
};

mod church;
mod context;
mod evaluator;
mod lexer;
mod library;
mod operator;
mod parser;
mod prelude;
mod term;

fn build_report(e: &ParseError) -> Report<Span> {
    let report = Report::build(ReportKind::Error, (), e.span().start).with_message(e);
    let label = match e {
        ParseError::Unexpected { found, .. } => {
            format!("Unexpected {}", found.fg(Color::Red))
        }
        ParseError::Literal { literal, .. } => {
            format!("{} does not fit in a numeral", literal.fg(Color::Red))
        }
        ParseError::Operator { source, .. } => format!("{}", source.fg(Color::Red)),
        ParseError::Lex { message, .. } => format!("{}", message.fg(Color::Red)),
    };
    report
        .with_label(
            Label::new(e.span())
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish()
}

#[derive(Default, Clone, Debug)]
struct Options {
    numbers: bool,
    reductions: bool,
    parsed: bool,
    hide: bool,
    limit: Option<u64>,
    bare: bool,
}

fn options() -> OptionParser<Options> {
    let numbers = short('n')
        .long("numbers")
        .help("Show the result as a Church numeral")
        .switch();
    let reductions = short('r')
        .long("reductions")
        .help("Show every reduction step")
        .switch();
    let parsed = short('p')
        .long("parsed")
        .help("Show the parsed expression")
        .switch();
    let hide = short('h')
        .long("hide")
        .help("Hide the result expression")
        .switch();
    let limit = short('l')
        .long("limit")
        .help("Give up after this many reduction steps")
        .argument::<u64>("STEPS")
        .optional();
    let bare = long("bare")
        .help("Start without the standard library")
        .switch();
    construct!(Options {
        numbers,
        reductions,
        parsed,
        hide,
        limit,
        bare,
    })
    .to_options()
    .descr("Untyped lambda calculus evaluator")
    .help_parser(long("help").help("Print this help"))
}

struct Repl {
    context: Context,
    options: Options,
}

impl Repl {
    fn new(options: Options) -> Result<Self> {
        let mut context = Context::default();
        if !options.bare {
            library::load(&mut context)?;
            info!(
                definitions = context.definitions.len(),
                "standard library loaded"
            );
        }
        Ok(Repl { context, options })
    }

    /// Runs one statement, writing the results to `out` and diagnostics to stderr.
    fn execute(&mut self, input: &str, out: &mut impl Write) -> Result<ControlFlow<()>> {
        let statement = match parser::parse_statement(input, &mut self.context) {
            Ok(statement) => statement,
            Err(e) => {
                debug!(error = %e, "statement rejected");
                build_report(&e).eprint(Source::from(input))?;
                return Ok(ControlFlow::Continue(()));
            }
        };
        match statement {
            Statement::Expression(term) => self.reduce(term, out)?,
            Statement::Definition(name) => debug!(%name, "definition accepted"),
            Statement::Operator { name, level } => debug!(%name, level, "operator accepted"),
            Statement::Exit => return Ok(ControlFlow::Break(())),
        }
        Ok(ControlFlow::Continue(()))
    }

    fn reduce(&self, mut term: Term, out: &mut impl Write) -> Result<()> {
        let options = &self.options;
        if options.parsed {
            writeln!(out, "{term}")?;
        }
        let mut written = Ok(());
        let outcome = evaluator::reduce(&mut term, options.limit, |step, term| {
            if options.reductions && written.is_ok() {
                written = writeln!(out, "{step}: {term}");
            }
        });
        written?;
        info!(
            steps = outcome.steps(),
            normal = matches!(outcome, Outcome::NormalForm { .. }),
            "reduced"
        );
        if let Outcome::StepLimit { steps } = outcome {
            writeln!(
                out,
                "! stopped after {steps} steps without reaching a normal form"
            )?;
        }
        if !options.hide {
            writeln!(out, "> {term}")?;
        }
        if options.numbers {
            match church::decode(&term) {
                Some(n) => writeln!(out, "> {n}")?,
                None => writeln!(out, "> nan")?,
            }
        }
        Ok(())
    }
}

impl repl::Repl for Repl {
    type Error = anyhow::Error;
    const HISTORY: Option<&'static str> = Some("/tmp/lambda.history");
    const PROMPT: &'static str = ">>> ";
    fn evaluate(&mut self, input: String) -> Result<ControlFlow<()>, Self::Error> {
        if input.trim().is_empty() {
            return Ok(ControlFlow::Continue(()));
        }
        self.execute(&input, &mut std::io::stdout().lock())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let options = options().run();
    debug!(?options, "starting");
    repl::start_repl(Repl::new(options)?)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn session(options: Options, inputs: &[&str]) -> (String, bool) {
        let mut repl = Repl::new(options).unwrap();
        let mut out = vec![];
        let mut exited = false;
        for input in inputs {
            if repl.execute(input, &mut out).unwrap().is_break() {
                exited = true;
                break;
            }
        }
        (String::from_utf8(out).unwrap(), exited)
    }

    #[test]
    fn test_numbers() {
        let options = Options {
            numbers: true,
            hide: true,
            ..Options::default()
        };
        let (out, exited) = session(options, &["add 2 3", "\\x. x", "2 * 3 + 1"]);
        assert_eq!(out, "> 5\n> nan\n> 7\n");
        assert!(!exited);
    }

    #[test]
    fn test_reductions() {
        let options = Options {
            reductions: true,
            parsed: true,
            bare: true,
            ..Options::default()
        };
        let (out, _) = session(options, &["(\\x. x) y"]);
        assert_eq!(out, "(\\x. x) y\n1: y\n> y\n");
    }

    #[test]
    fn test_limit() {
        let options = Options {
            limit: Some(3),
            bare: true,
            ..Options::default()
        };
        let (out, _) = session(options, &["(\\x. x x) (\\x. x x)"]);
        assert_eq!(
            out,
            "! stopped after 3 steps without reaching a normal form\n> (\\x. x x) (\\x. x x)\n"
        );
    }

    #[test]
    fn test_statements() {
        let options = Options {
            numbers: true,
            ..Options::default()
        };
        let (out, exited) = session(
            options,
            &[
                "def two = succ 1",
                "opdef & 6 = mul",
                "two & 3",
                "(two",
                "exit",
                "two",
            ],
        );
        // Definitions and the failed statement print nothing, and nothing runs after `exit`.
        assert_eq!(out, "> \\f. \\x. f (f (f (f (f (f x)))))\n> 6\n");
        assert!(exited);
    }

    #[test]
    fn test_large_numerals() {
        let options = Options {
            numbers: true,
            parsed: true,
            bare: true,
            ..Options::default()
        };
        let (out, _) = session(options, &["20000"]);
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], church::encode(20_000).to_string());
        assert_eq!(lines[1], format!("> {}", lines[0]));
        assert_eq!(lines[2], "> 20000");
    }

    #[test]
    fn test_bare() {
        let options = Options {
            numbers: true,
            hide: true,
            bare: true,
            ..Options::default()
        };
        let (out, _) = session(options, &["add 2 3"]);
        assert_eq!(out, "> nan\n");
    }

    #[test]
    fn test_options() {
        let parsed = options().run_inner(&["-n", "-h", "-l", "10"]).unwrap();
        assert!(parsed.numbers && parsed.hide);
        assert!(!parsed.reductions && !parsed.parsed && !parsed.bare);
        assert_eq!(parsed.limit, Some(10));

        let parsed = options()
            .run_inner(&["--reductions", "--parsed", "--bare"])
            .unwrap();
        assert!(parsed.reductions && parsed.parsed && parsed.bare);
        assert_eq!(parsed.limit, None);

        assert!(options().run_inner(&["-x"]).is_err());
        assert!(options().run_inner(&["--limit", "many"]).is_err());
    }

    #[test]
    fn test_report() {
        let e = ParseError::Unexpected {
            span: 3..4,
            expected: lexer::TokenKind::Dot,
            found: lexer::TokenKind::End,
        };
        let mut buf = vec![];
        build_report(&e)
            .write(Source::from("\\x "), &mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Unexpected end of the input, expected dot"));
    }
}
