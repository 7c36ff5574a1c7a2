use std::fs;
use std::path::PathBuf;

use slicegen_compiler::{Config, Diagnostics, generate};

use super::model_loader::load_model;
use super::{CliError, fail};

pub struct GenerateArgs {
    pub model_path: PathBuf,
    pub output_dir: PathBuf,
    pub checksum: Option<String>,
    pub generate_impl: bool,
    pub list_generated: bool,
    pub dry_run: bool,
    pub color: bool,
}

pub struct GenerateOutcome {
    pub diagnostics: Diagnostics,
    /// Paths written, relative to the output directory.
    pub written: Vec<String>,
    /// One JSON line per generated file, when requested.
    pub listing: Option<String>,
}

pub fn run(args: GenerateArgs) {
    let outcome = execute(&args).unwrap_or_else(|err| fail(err));

    if !outcome.diagnostics.is_empty() {
        eprintln!(
            "{}",
            outcome.diagnostics.printer().colored(args.color).render()
        );
    }
    if let Some(listing) = &outcome.listing {
        print!("{}", listing);
    }
    if outcome.diagnostics.has_errors() {
        std::process::exit(1);
    }
}

/// Generate and write every file whose source validated. Files of a source with
/// errors are absent from the generation and leave nothing on disk.
pub fn execute(args: &GenerateArgs) -> Result<GenerateOutcome, CliError> {
    let unit = load_model(&args.model_path)?;

    let mut config = Config::new()
        .output_dir(&args.output_dir)
        .generate_impl(args.generate_impl)
        .list_generated(args.list_generated);
    if let Some(class) = &args.checksum {
        config = config.checksum_class(class);
    }

    let generation = generate(&unit, &config);
    let mut written = Vec::new();
    if !args.dry_run {
        for file in &generation.files {
            let target = config.get_output_dir().join(&file.path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|source| CliError::Write {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
            fs::write(&target, &file.contents).map_err(|source| CliError::Write {
                path: target.display().to_string(),
                source,
            })?;
            written.push(file.path.clone());
        }
        tracing::info!(count = written.len(), dir = %config.get_output_dir().display(), "files written");
    }

    let listing = config.is_list_generated().then(|| {
        let mut out = String::new();
        for file in &generation.files {
            // GeneratedFile serializes without its contents
            if let Ok(line) = serde_json::to_string(file) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    });

    Ok(GenerateOutcome {
        diagnostics: generation.diagnostics,
        written,
        listing,
    })
}
