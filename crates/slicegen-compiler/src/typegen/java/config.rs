//! Configuration for Java emission.

use std::path::{Path, PathBuf};

/// Configuration for Java emission.
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory generated paths are relative to
    pub(crate) output_dir: PathBuf,
    /// Fully qualified class holding the type checksum map
    pub(crate) checksum_class: Option<String>,
    /// Emit `<T>I` servant skeletons
    pub(crate) generate_impl: bool,
    /// Report generated paths instead of only writing them
    pub(crate) list_generated: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            checksum_class: None,
            generate_impl: false,
            list_generated: false,
        }
    }
}

impl Config {
    /// Create a new Config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the checksum class, e.g. `com.acme.Checksums`.
    pub fn checksum_class(mut self, class: impl Into<String>) -> Self {
        self.checksum_class = Some(class.into());
        self
    }

    /// Set whether to emit servant skeletons.
    pub fn generate_impl(mut self, value: bool) -> Self {
        self.generate_impl = value;
        self
    }

    /// Set whether generated paths are listed.
    pub fn list_generated(mut self, value: bool) -> Self {
        self.list_generated = value;
        self
    }

    pub fn get_output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn get_checksum_class(&self) -> Option<&str> {
        self.checksum_class.as_deref()
    }

    pub fn is_generate_impl(&self) -> bool {
        self.generate_impl
    }

    pub fn is_list_generated(&self) -> bool {
        self.list_generated
    }
}
