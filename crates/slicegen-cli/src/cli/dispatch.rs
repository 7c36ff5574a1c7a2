//! Extract params from `ArgMatches` and convert them to command args.

use std::path::PathBuf;

use clap::ArgMatches;

use super::ColorChoice;
use crate::commands::check::CheckArgs;
use crate::commands::generate::GenerateArgs;

pub struct GenerateParams {
    pub model_path: PathBuf,
    pub output_dir: PathBuf,
    pub checksum: Option<String>,
    pub generate_impl: bool,
    pub list_generated: bool,
    pub dry_run: bool,
    pub color: ColorChoice,
}

impl GenerateParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            model_path: model_path(m),
            output_dir: m
                .get_one::<PathBuf>("output_dir")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(".")),
            checksum: m.get_one::<String>("checksum").cloned(),
            generate_impl: m.get_flag("impl"),
            list_generated: m.get_flag("list_generated"),
            dry_run: m.get_flag("dry_run"),
            color: parse_color(m),
        }
    }
}

impl From<GenerateParams> for GenerateArgs {
    fn from(p: GenerateParams) -> Self {
        Self {
            model_path: p.model_path,
            output_dir: p.output_dir,
            checksum: p.checksum,
            generate_impl: p.generate_impl,
            list_generated: p.list_generated,
            dry_run: p.dry_run,
            color: p.color.should_colorize(),
        }
    }
}

pub struct CheckParams {
    pub model_path: PathBuf,
    pub strict: bool,
    pub color: ColorChoice,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            model_path: model_path(m),
            strict: m.get_flag("strict"),
            color: parse_color(m),
        }
    }
}

impl From<CheckParams> for CheckArgs {
    fn from(p: CheckParams) -> Self {
        Self {
            model_path: p.model_path,
            strict: p.strict,
            color: p.color.should_colorize(),
        }
    }
}

fn model_path(m: &ArgMatches) -> PathBuf {
    m.get_one::<PathBuf>("model_path")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("-"))
}

fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}
