//! Tests for CLI dispatch logic.

use std::path::PathBuf;

use super::*;
use crate::cli::commands::{check_command, generate_command};

#[test]
fn generate_defaults() {
    let m = generate_command()
        .try_get_matches_from(["generate", "shop.json"])
        .unwrap();
    let params = GenerateParams::from_matches(&m);

    assert_eq!(params.model_path, PathBuf::from("shop.json"));
    assert_eq!(params.output_dir, PathBuf::from("."));
    assert_eq!(params.checksum, None);
    assert!(!params.generate_impl);
    assert!(!params.list_generated);
    assert!(!params.dry_run);
    assert_eq!(params.color, ColorChoice::Auto);
}

#[test]
fn generate_all_flags() {
    let m = generate_command()
        .try_get_matches_from([
            "generate",
            "shop.json",
            "-o",
            "out",
            "--checksum",
            "com.acme.Checksums",
            "--impl",
            "--list-generated",
            "--color",
            "never",
        ])
        .unwrap();
    let params = GenerateParams::from_matches(&m);

    assert_eq!(params.output_dir, PathBuf::from("out"));
    assert_eq!(params.checksum.as_deref(), Some("com.acme.Checksums"));
    assert!(params.generate_impl);
    assert!(params.list_generated);
    assert_eq!(params.color, ColorChoice::Never);
}

#[test]
fn model_is_required() {
    let result = generate_command().try_get_matches_from(["generate"]);
    assert!(result.is_err());
}

#[test]
fn check_accepts_strict() {
    let m = check_command()
        .try_get_matches_from(["check", "-", "--strict", "--color", "always"])
        .unwrap();
    let params = CheckParams::from_matches(&m);

    assert_eq!(params.model_path, PathBuf::from("-"));
    assert!(params.strict);
    assert_eq!(params.color, ColorChoice::Always);
}

#[test]
fn check_rejects_generate_flags() {
    let result = check_command().try_get_matches_from(["check", "shop.json", "--impl"]);
    assert!(result.is_err());
}

#[test]
fn color_values_are_validated() {
    let result = generate_command().try_get_matches_from(["generate", "a.json", "--color", "sometimes"]);
    assert!(result.is_err());
}

#[test]
fn help_lists_subcommands() {
    let help = build_cli().render_help().to_string();
    assert!(help.contains("generate"));
    assert!(help.contains("check"));
}
