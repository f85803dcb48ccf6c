use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use log::info;

use banana::env::Env;
use banana::error::Error;
use banana::evaluator::Evaluator;
use banana::object::Object;

const PROMPT: &str = ">> ";

#[derive(Parser, Debug)]
#[clap(name = "banana", version, about = "Runs banana programs, or starts a REPL")]
struct Cli {
    /// Script to run. Starts a REPL when omitted.
    file: Option<PathBuf>,

    /// Disable colored output.
    #[clap(long)]
    no_color: bool,

    /// Print the program after macro expansion, before evaluating it.
    #[clap(long)]
    dump_ast: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    match &cli.file {
        Some(path) => run_file(path, &cli),
        None => repl(&cli),
    }
}

fn render(object: &Object) -> String {
    match object {
        Object::Error(_) => object.to_string().red().to_string(),
        Object::Null => object.to_string().dimmed().to_string(),
        _ => object.to_string(),
    }
}

fn run_file(path: &Path, cli: &Cli) -> anyhow::Result<()> {
    let source = fs::read_to_string(path)
        .map_err(Error::from)
        .with_context(|| format!("could not open {}", path.display()))?;

    info!("running {}", path.display());

    let macro_env = Env::new_shared();
    let program = banana::expand(&source, &macro_env)?;
    if cli.dump_ast {
        println!("{}", program);
    }

    match Evaluator::new(Env::new_shared()).eval(&program) {
        Some(Object::Error(message)) => anyhow::bail!("{}", message),
        Some(result) => println!("{}", render(&result)),
        None => {}
    }

    Ok(())
}

fn repl(cli: &Cli) -> anyhow::Result<()> {
    println!("Hello! Welcome to the Banana programming language!");
    println!("Type in commands");

    let mut evaluator = Evaluator::new(Env::new_shared());
    let macro_env = Env::new_shared();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}", PROMPT);
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }

        let program = match banana::expand(&line, &macro_env) {
            Ok(program) => program,
            Err(Error::Parse(errors)) => {
                println!("{}", "Woops! We ran into some banana business here!".yellow());
                println!(" parser errors:");
                for error in errors {
                    println!("\t{}", error.to_string().red());
                }
                continue;
            }
            Err(error) => {
                println!("{}", error.to_string().red());
                continue;
            }
        };

        if cli.dump_ast {
            println!("{}", program.to_string().dimmed());
        }

        if let Some(result) = evaluator.eval(&program) {
            println!("{}", render(&result));
        }
    }
}
