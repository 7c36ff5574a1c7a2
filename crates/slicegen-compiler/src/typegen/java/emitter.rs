//! Generation driver: walks source files and dispatches to the per-kind emitters.

use slicegen_core::{Definition, ModuleId, Unit};

use super::Config;
use super::names::{file_path, package_of};
use super::writer::JavaWriter;
use crate::diagnostics::Diagnostics;

/// One Java compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GeneratedFile {
    /// IDL file the output was generated from.
    pub source: String,
    /// Path relative to the output directory.
    pub path: String,
    #[serde(skip)]
    pub contents: String,
}

/// Everything a generation run produced.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub files: Vec<GeneratedFile>,
    pub diagnostics: Diagnostics,
}

impl Generation {
    /// Files, or the diagnostics when any error was reported.
    pub fn into_result(self) -> crate::Result<Vec<GeneratedFile>> {
        if self.diagnostics.has_errors() {
            return Err(crate::Error::Generation(self.diagnostics));
        }
        Ok(self.files)
    }
}

/// Generate Java sources for every file of `unit`.
pub fn generate(unit: &Unit, config: &Config) -> Generation {
    Emitter::new(unit, config).emit()
}

/// Java emitter over a resolved unit.
pub struct Emitter<'a> {
    pub(super) unit: &'a Unit,
    pub(super) config: &'a Config,
    pub(super) diagnostics: Diagnostics,
    pub(super) files: Vec<GeneratedFile>,
    /// Package of the definition being emitted; names inside it stay unqualified.
    pub(super) package: String,
    /// IDL file being processed.
    pub(super) source: String,
}

impl<'a> Emitter<'a> {
    pub fn new(unit: &'a Unit, config: &'a Config) -> Self {
        Self {
            unit,
            config,
            diagnostics: Diagnostics::new(),
            files: Vec::new(),
            package: String::new(),
            source: String::new(),
        }
    }

    pub fn emit(mut self) -> Generation {
        for file in self.unit.files() {
            let errors = self.diagnostics.error_count();
            let staged = self.files.len();
            self.source = file.name.clone();
            tracing::debug!(file = %file.name, "generating");

            for &module in &file.modules {
                self.visit_module(module);
            }

            if self.diagnostics.error_count() > errors {
                tracing::warn!(file = %file.name, "errors reported, discarding output");
                self.files.truncate(staged);
            } else {
                tracing::debug!(file = %file.name, count = self.files.len() - staged, "generated");
            }
        }

        if let Some(class) = self.config.checksum_class.clone() {
            self.emit_checksums(&class);
        }

        Generation {
            files: self.files,
            diagnostics: self.diagnostics,
        }
    }

    fn visit_module(&mut self, id: ModuleId) {
        let module = self.unit.module(id);
        self.validate_module_metadata(id);
        if module.parent.is_none() && module.metadata.find("java:package:").is_some() {
            self.emit_marker(id);
        }
        for &def in &module.definitions {
            self.package = package_of(self.unit, module_of(self.unit, def));
            self.visit_definition(def);
        }
        for &child in &module.modules {
            self.visit_module(child);
        }
    }

    fn visit_definition(&mut self, def: Definition) {
        self.validate_definition_metadata(def);
        match def {
            Definition::Struct(id) => self.emit_struct(id),
            Definition::Class(id) => {
                if self.unit.class(id).is_interface {
                    self.emit_interface(id);
                } else {
                    self.emit_class(id);
                }
                if self.unit.class_has_proxy(id) {
                    self.emit_proxy(id);
                    if self.config.generate_impl {
                        self.emit_skeleton(id);
                    }
                }
                if self.unit.class(id).compact_id.is_some() {
                    self.emit_compact_id(id);
                }
            }
            Definition::Exception(id) => self.emit_exception(id),
            Definition::Enum(id) => self.emit_enum(id),
            Definition::Sequence(id) => self.emit_sequence_helper(id),
            Definition::Dictionary(id) => self.emit_dictionary_helper(id),
            Definition::Const(id) => self.emit_const(id),
        }
    }

    /// Writer preloaded with the generated-file banner and `package` line.
    pub(super) fn open_file(&self) -> JavaWriter {
        self.open_file_in(&self.package)
    }

    pub(super) fn open_file_in(&self, package: &str) -> JavaWriter {
        let mut w = JavaWriter::new();
        w.line("//");
        w.line(format!("// Generated by slicegen from file `{}'", self.source));
        w.line("//");
        w.line("// Warning: do not edit this file.");
        w.line("//");
        w.blank();
        if !package.is_empty() {
            w.line(format!("package {package};"));
            w.blank();
        }
        w
    }

    /// Record a finished compilation unit named `class` in the current package.
    pub(super) fn add_file(&mut self, class: &str, w: JavaWriter) {
        let package = self.package.clone();
        self.add_file_in(&package, class, w);
    }

    pub(super) fn add_file_in(&mut self, package: &str, class: &str, w: JavaWriter) {
        let path = file_path(package, class);
        tracing::trace!(path = %path, "emitted");
        self.files.push(GeneratedFile {
            source: self.source.clone(),
            path,
            contents: w.finish(),
        });
    }
}

fn module_of(unit: &Unit, def: Definition) -> ModuleId {
    unit.decl(def).module
}
