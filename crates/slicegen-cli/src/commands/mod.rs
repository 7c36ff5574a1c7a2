pub mod check;
pub mod generate;
pub mod model_loader;

#[cfg(test)]
mod check_tests;

/// Failures that stop a command before or after generation.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Model(#[from] slicegen_core::ModelError),
}

/// Print `error: ...` and exit with status 1.
pub fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", err);
    std::process::exit(1);
}
