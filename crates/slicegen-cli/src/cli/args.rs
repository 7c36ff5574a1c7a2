//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` that commands compose.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Type model file (positional, "-" for stdin).
pub fn model_path_arg() -> Arg {
    Arg::new("model_path")
        .value_name("MODEL")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Resolved type model as JSON (use \"-\" for stdin)")
}

/// Output directory (-o/--output-dir).
pub fn output_dir_arg() -> Arg {
    Arg::new("output_dir")
        .short('o')
        .long("output-dir")
        .value_name("DIR")
        .default_value(".")
        .value_parser(value_parser!(PathBuf))
        .help("Directory generated files are written under")
}

/// Checksum class (--checksum).
pub fn checksum_arg() -> Arg {
    Arg::new("checksum")
        .long("checksum")
        .value_name("CLASS")
        .help("Generate a checksum map in the given fully qualified class")
}

/// Servant skeletons (--impl).
pub fn impl_arg() -> Arg {
    Arg::new("impl")
        .long("impl")
        .action(ArgAction::SetTrue)
        .help("Also generate <T>I servant skeletons")
}

/// Listing of generated files (--list-generated).
pub fn list_generated_arg() -> Arg {
    Arg::new("list_generated")
        .long("list-generated")
        .action(ArgAction::SetTrue)
        .help("Print one JSON line per generated file")
}

/// Report diagnostics without writing files (--dry-run).
pub fn dry_run_arg() -> Arg {
    Arg::new("dry_run")
        .long("dry-run")
        .action(ArgAction::SetTrue)
        .help("Generate in memory without writing files")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize diagnostics")
}

/// Treat warnings as errors (--strict).
pub fn strict_arg() -> Arg {
    Arg::new("strict")
        .long("strict")
        .action(ArgAction::SetTrue)
        .help("Treat warnings as errors")
}
