//! Validation of `java:` metadata directives.
//!
//! Unknown or misplaced directives are reported as warnings and otherwise ignored.

use slicegen_core::{Builtin, Definition, Location, Metadata, ModuleId, Type};

use super::Emitter;
use crate::diagnostics::DiagnosticKind;

/// Where a directive appears, which decides the directives it may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Site {
    TopLevelModule,
    Module,
    Type,
    Sequence { buffer_ok: bool },
    Dictionary,
    Member { container: bool, buffer_ok: bool },
    Operation,
}

fn allowed(site: Site, directive: &str) -> bool {
    let rest = directive.strip_prefix("java:").unwrap_or(directive);
    let custom_type = rest.starts_with("type:") && rest.len() > "type:".len();
    match site {
        Site::TopLevelModule => rest.starts_with("package:") && rest.len() > "package:".len(),
        Site::Module => false,
        Site::Type => {
            rest == "getset" || rest.starts_with("implements:") || rest.starts_with("serialVersionUID:")
        }
        Site::Sequence { buffer_ok } => custom_type || (buffer_ok && rest == "buffer"),
        Site::Dictionary => custom_type,
        Site::Member {
            container,
            buffer_ok,
        } => rest == "getset" || (container && custom_type) || (buffer_ok && rest == "buffer"),
        Site::Operation => rest == "UserException",
    }
}

fn buffer_element(element: Type) -> bool {
    matches!(
        element,
        Type::Builtin(
            Builtin::Byte | Builtin::Short | Builtin::Int | Builtin::Long | Builtin::Float | Builtin::Double
        )
    )
}

impl Emitter<'_> {
    fn check(&mut self, site: Site, metadata: &Metadata, location: &Location) {
        for directive in metadata.iter() {
            if !directive.starts_with("java:") || allowed(site, directive) {
                continue;
            }
            self.diagnostics
                .report(DiagnosticKind::InvalidMetadata, location.clone())
                .message(directive)
                .emit();
        }
    }

    fn member_site(&self, ty: Type) -> Site {
        match ty {
            Type::Sequence(id) => Site::Member {
                container: true,
                buffer_ok: buffer_element(self.unit.sequence(id).element),
            },
            Type::Dictionary(_) => Site::Member {
                container: true,
                buffer_ok: false,
            },
            _ => Site::Member {
                container: false,
                buffer_ok: false,
            },
        }
    }

    pub(super) fn validate_module_metadata(&mut self, id: ModuleId) {
        let module = self.unit.module(id);
        let site = if module.parent.is_none() {
            Site::TopLevelModule
        } else {
            Site::Module
        };
        self.check(site, &module.metadata, &module.location);
    }

    pub(super) fn validate_definition_metadata(&mut self, def: Definition) {
        let unit = self.unit;
        let decl = unit.decl(def);
        let site = match def {
            Definition::Sequence(id) => Site::Sequence {
                buffer_ok: buffer_element(unit.sequence(id).element),
            },
            Definition::Dictionary(_) => Site::Dictionary,
            _ => Site::Type,
        };
        self.check(site, &decl.metadata, &decl.location);

        let members = match def {
            Definition::Struct(id) => unit.structure(id).members.as_slice(),
            Definition::Class(id) => unit.class(id).members.as_slice(),
            Definition::Exception(id) => unit.exception(id).members.as_slice(),
            _ => &[],
        };
        for member in members {
            let site = self.member_site(member.ty);
            self.check(site, &member.metadata, &member.location);
        }

        let Definition::Class(id) = def else {
            return;
        };
        for op in &unit.class(id).operations {
            self.check(Site::Operation, &op.metadata, &op.location);
            for param in &op.params {
                let site = self.member_site(param.ty);
                self.check(site, &param.metadata, &op.location);
            }
            if let Some(ret) = &op.returns {
                let site = self.member_site(ret.ty);
                self.check(site, &ret.metadata, &op.location);
            }
        }
    }
}
