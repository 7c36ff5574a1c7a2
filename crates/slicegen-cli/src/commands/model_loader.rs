use std::fs;
use std::io::{self, Read};
use std::path::Path;

use slicegen_core::{Unit, load_unit};

use super::CliError;

/// Read and resolve the model at `path`; "-" reads stdin.
pub fn load_model(path: &Path) -> Result<Unit, CliError> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| CliError::Read {
                path: "<stdin>".to_string(),
                source,
            })?;
        buf
    } else {
        fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.display().to_string(),
            source,
        })?
    };

    let unit = load_unit(&text)?;
    tracing::debug!(
        path = %path.display(),
        files = unit.files().len(),
        modules = unit.modules().len(),
        "model loaded"
    );
    Ok(unit)
}
