use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser;

use micac::{parser, transpiler, type_checker, util::fmt, Error};

#[derive(Parser)]
#[command(
    name = "micac",
    about = "Compiler for the Mica language, targeting C++ source"
)]
struct Cli {
    /// Source file to compile.
    input: PathBuf,

    /// Write the C++ translation here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the untyped AST as JSON and exit.
    #[arg(long)]
    dump_ast: bool,

    /// Print the checked AST as JSON and exit.
    #[arg(long)]
    dump_checked_ast: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.input) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("micac: cannot read {}: {error}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    let code = match compile(&cli, &source) {
        Ok(code) => code,
        Err(error) => {
            report_error(&source, &error);
            return ExitCode::FAILURE;
        }
    };

    let Some(code) = code else {
        return ExitCode::SUCCESS;
    };
    let written = match &cli.output {
        Some(path) => fs::write(path, code),
        None => {
            print!("{code}");
            Ok(())
        }
    };
    if let Err(error) = written {
        eprintln!("micac: cannot write output: {error}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Runs the pipeline; `Ok(None)` means a dump flag already printed the
/// requested stage.
fn compile(cli: &Cli, source: &str) -> micac::Result<Option<String>> {
    let program = parser::parse_program(source)?;
    if cli.dump_ast {
        println!("{}", fmt::dump_program_string(&program));
        return Ok(None);
    }

    let checked = type_checker::check(&program)?;
    if cli.dump_checked_ast {
        println!("{}", fmt::dump_checked_program_string(&checked));
        return Ok(None);
    }

    Ok(Some(transpiler::transpile(&checked)?))
}

fn report_error(source: &str, error: &Error) {
    let (line, column) = line_and_column(source, error.span.start);
    eprintln!("Error (line {line}, col {column}): {error}");

    if let Some(line_content) = source.lines().nth(line - 1) {
        eprintln!("{line:>4} | {line_content}");
        let indicator_len = std::cmp::max(1, error.span.len());
        eprintln!(
            "{:>4} | {}{}",
            "",
            " ".repeat(column - 1),
            "^".repeat(indicator_len)
        );
    }
}

fn line_and_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut line_start = 0;
    for (index, byte) in source.bytes().enumerate() {
        if index >= offset {
            break;
        }
        if byte == b'\n' {
            line += 1;
            line_start = index + 1;
        }
    }
    (line, offset.saturating_sub(line_start) + 1)
}
