use std::path::PathBuf;

use slicegen_compiler::{Config, Diagnostics, generate};

use super::model_loader::load_model;
use super::{CliError, fail};

pub struct CheckArgs {
    pub model_path: PathBuf,
    pub strict: bool,
    pub color: bool,
}

pub fn run(args: CheckArgs) {
    let diagnostics = execute(&args).unwrap_or_else(|err| fail(err));

    if !diagnostics.is_empty() {
        eprintln!("{}", diagnostics.printer().colored(args.color).render());
    }
    if !is_valid(&diagnostics, args.strict) {
        std::process::exit(1);
    }

    // Silent on success (like cargo check)
}

/// Run generation in memory and keep only its diagnostics.
pub fn execute(args: &CheckArgs) -> Result<Diagnostics, CliError> {
    let unit = load_model(&args.model_path)?;
    let generation = generate(&unit, &Config::new());
    Ok(generation.diagnostics)
}

pub fn is_valid(diagnostics: &Diagnostics, strict: bool) -> bool {
    if strict {
        !diagnostics.has_errors() && !diagnostics.has_warnings()
    } else {
        !diagnostics.has_errors()
    }
}
