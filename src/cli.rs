use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(version, about = None, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the source code file
    pub input_file: PathBuf,

    /// Path to the output file, stdout if not given
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Name of the generated module, defaults to the file stem of the input
    #[arg(short = 'n', long)]
    pub module_name: Option<String>,

    /// Stage after which to stop and print the result
    #[arg(value_enum)]
    #[arg(short, long)]
    #[arg(default_value_t = Mode::Ir)]
    pub mode: Mode,
}

impl Args {
    pub fn module_name(&self) -> String {
        self.module_name.clone().unwrap_or_else(|| {
            self.input_file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| String::from("main"))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Print the token stream
    Tokens,

    /// Print the AST of the parsed source code
    Ast,

    /// Print the AST after semantic analysis, with types
    Check,

    /// Print the IR of the lowered program
    Ir,
}
