//! c2fortran command-line entry point
//!
//! ```bash
//! # Translate next to the input (prog.c → prog.f90)
//! c2fortran prog.c
//!
//! # Write to stdout with four-space indentation
//! c2fortran prog.c -o - --indent 4
//!
//! # Load options from a file, flags still win
//! c2fortran prog.c --config c2fortran.toml --explicit-return
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn, LevelFilter};

use c2fortran::fortran_sanity::format_sanity_report;
use c2fortran::{check_fortran_output, translate_file, write_output, TranslatorOptions};

/// Translate a C program into Fortran
#[derive(Parser, Debug)]
#[command(name = "c2fortran")]
#[command(version)]
#[command(about = "Translate a C subset into free-form Fortran", long_about = None)]
struct Cli {
    /// Input C file
    input: PathBuf,

    /// Output file (default: input with .f90 extension, `-` for stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML file with translator options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of the module holding translated procedures
    #[arg(long)]
    module_name: Option<String>,

    /// Name of the program unit
    #[arg(long)]
    program_name: Option<String>,

    /// Spaces per indent level
    #[arg(long)]
    indent: Option<usize>,

    /// Drop blank lines from the output
    #[arg(long)]
    strip_blank_lines: bool,

    /// Emit `return` after every result assignment
    #[arg(long)]
    explicit_return: bool,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,

    /// More log output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn level_filter(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    fn options(&self) -> Result<TranslatorOptions> {
        let mut options = match &self.config {
            Some(path) => TranslatorOptions::load(path)
                .with_context(|| format!("Failed to load options from {}", path.display()))?,
            None => TranslatorOptions::default(),
        };
        if let Some(name) = &self.module_name {
            options.module_name = name.clone();
        }
        if let Some(name) = &self.program_name {
            options.program_name = name.clone();
        }
        if let Some(width) = self.indent {
            options.indent_width = width;
        }
        if self.strip_blank_lines {
            options.emit.keep_blank_lines = false;
        }
        if self.explicit_return {
            options.explicit_return = true;
        }
        Ok(options)
    }

    fn output_path(&self) -> Option<PathBuf> {
        match &self.output {
            Some(path) if path == Path::new("-") => None,
            Some(path) => Some(path.clone()),
            None => Some(self.input.with_extension("f90")),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.level_filter())
        .parse_default_env()
        .init();

    let options = cli.options()?;
    let fortran = translate_file(&cli.input, &options)
        .with_context(|| format!("Failed to translate {}", cli.input.display()))?;

    let sanity = check_fortran_output(&fortran);
    if !sanity.is_valid {
        warn!("{}", format_sanity_report(&sanity));
    }

    match cli.output_path() {
        Some(path) => {
            write_output(&path, &fortran).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("{} -> {}", cli.input.display(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(fortran.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }

    Ok(())
}
