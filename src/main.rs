use std::io::Write;

use clap::{Args, Parser, Subcommand};

use axislang::pipeline::{self, ExecutionOutcome};

#[derive(Debug, Parser)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Repl)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Translate and run a dialect source file
    Run(FileArgs),
    /// Interactive prompt, one program per line
    Repl,
    /// Dump the classified display tokens of a source file
    Tokens(FileArgs),
    /// List the dialect keyword table
    Keywords,
}

#[derive(Debug, Args)]
struct FileArgs {
    file: String,
}

fn main() {
    let args = Cli::parse();

    match args.command() {
        Command::Run(args) => run_command(args),
        Command::Repl => repl_command(),
        Command::Tokens(args) => tokens_command(args),
        Command::Keywords => keywords_command(),
    }
}

fn run_command(args: &FileArgs) {
    let source = std::fs::read_to_string(&args.file).expect("should be able to read source file");
    report(pipeline::translate_and_run(&source).outcome);
}

fn repl_command() {
    println!("Welcome to the AxisLang REPL!");
    println!("EOF to exit. (Ctrl+D on *nix, Ctrl+Z on Windows)");

    let mut input = String::new();
    loop {
        print!("> ");
        std::io::stdout()
            .flush()
            .expect("should be able to flush stdout");

        let read = std::io::stdin()
            .read_line(&mut input)
            .expect("should be able to read line from stdin");

        if read == 0 {
            break;
        }

        report(pipeline::translate_and_run(input.trim()).outcome);
        input.clear();
    }
}

fn report(outcome: ExecutionOutcome) {
    match outcome {
        ExecutionOutcome::Success { captured_lines } => {
            for line in captured_lines {
                println!("{line}");
            }
        }
        ExecutionOutcome::Failure {
            message,
            captured_lines,
        } => {
            for line in captured_lines {
                println!("{line}");
            }
            println!("Error: {message}");
        }
    }
}

fn tokens_command(args: &FileArgs) {
    let source = std::fs::read_to_string(&args.file).expect("should be able to read source file");
    let (tokens, skipped) = axislang::tokenizer::scan(&source);

    let mut line = 0;
    for token in &tokens {
        if token.line != line {
            print!("{:4} ", token.line);
            line = token.line;
        } else {
            print!("   | ");
        }
        println!("{:<12} {}", format!("{:?}", token.class), token.value);
    }

    if skipped > 0 {
        println!("({skipped} unrecognized characters skipped)");
    }
}

fn keywords_command() {
    for entry in axislang::keywords::ENTRIES {
        println!(
            "{:<12} {:<10} -> {:<8} {} {}",
            entry.label,
            format!("[{:?}]", entry.class),
            entry.replacement,
            entry.detail,
            entry.info
        );
    }
}
