//! Command builders for the CLI.

use clap::Command;

use super::args::*;

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("slicegen")
        .about("Java code generation from resolved Slice type models")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(generate_command())
        .subcommand(check_command())
}

/// Generate Java sources.
pub fn generate_command() -> Command {
    Command::new("generate")
        .about("Generate Java sources from a type model")
        .after_help(
            r#"EXAMPLES:
  slicegen generate shop.json                      # write into the current directory
  slicegen generate shop.json -o generated         # write under generated/
  slicegen generate shop.json --impl               # also emit servant skeletons
  slicegen generate shop.json --checksum com.acme.Checksums
  slicegen generate shop.json --list-generated     # print what was written"#,
        )
        .arg(model_path_arg())
        .arg(output_dir_arg())
        .arg(checksum_arg())
        .arg(impl_arg())
        .arg(list_generated_arg())
        .arg(dry_run_arg())
        .arg(color_arg())
}

/// Validate a model without writing anything.
pub fn check_command() -> Command {
    Command::new("check")
        .about("Validate a type model and its metadata")
        .after_help(
            r#"EXAMPLES:
  slicegen check shop.json                # errors only
  slicegen check shop.json --strict       # warnings fail too"#,
        )
        .arg(model_path_arg())
        .arg(strict_arg())
        .arg(color_arg())
}
