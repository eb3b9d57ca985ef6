use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{debug, info};
use vela_sema::{check_program_with_loader, CheckConfig, DiagnosticSink, Diagnostics};

use vela_driver::{print_diagnostic, read_program, FileLoader, SourceCache};

#[derive(Parser)]
#[command(
    name = "vela",
    version = "0.1.0",
    about = "Semantic checker for Vela programs",
    long_about = "Checks parsed Vela programs for type errors, unresolved names\nand memory ownership mistakes."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a program given as the JSON form of its syntax tree
    Check {
        /// Input syntax tree
        input: PathBuf,

        /// Directories searched for imported modules, before the input's own
        #[arg(long = "module-path", value_name = "DIR")]
        module_path: Vec<PathBuf>,

        /// Skip the allocation and release analysis
        #[arg(long)]
        no_check_mem: bool,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the syntax tree of a program (debug)
    Ast {
        /// Input syntax tree
        input: PathBuf,

        /// Pretty print the tree
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            input,
            module_path,
            no_check_mem,
            verbose,
        } => {
            init_logging(verbose);
            check_command(input, module_path, no_check_mem)
        }
        Commands::Ast { input, pretty } => {
            init_logging(false);
            ast_command(input, pretty)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn check_command(input: PathBuf, module_path: Vec<PathBuf>, no_check_mem: bool) -> ExitCode {
    let program = match read_program(&input) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("checking {}", program.path);

    let mut loader = FileLoader::new(module_path);
    if let Some(dir) = input.parent() {
        let dir = if dir.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            dir.to_path_buf()
        };
        loader.add_dir(dir);
    }
    debug!("module search path: {:?}", loader.search_dirs());

    let config = CheckConfig {
        check_mem: !no_check_mem,
    };
    let mut diagnostics = Diagnostics::new();
    let passed = check_program_with_loader(&program, &config, &mut diagnostics, &mut loader);

    let mut sources = SourceCache::new();
    sources.insert(program.path.clone(), program.source.clone());
    for (path, source) in loader.loaded_sources() {
        sources.insert(path, source);
    }

    let color = std::io::stderr().is_terminal();
    for diag in &diagnostics {
        if let Err(e) = print_diagnostic(diag, &sources, color) {
            eprintln!("Error writing diagnostic: {}", e);
        }
    }

    if passed {
        println!("Check passed!");
        ExitCode::SUCCESS
    } else {
        eprintln!("{} problem(s) found", diagnostics.len());
        ExitCode::FAILURE
    }
}

fn ast_command(input: PathBuf, pretty: bool) -> ExitCode {
    let program = match read_program(&input) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let printed = if pretty {
        serde_json::to_string_pretty(&program)
    } else {
        serde_json::to_string(&program)
    };
    match printed {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
