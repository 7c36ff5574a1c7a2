//! Side files: compact type-id classes, package markers and the checksum table.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use slicegen_core::{ClassId, Definition, Member, ModuleId, Unit};

use super::Emitter;

const COMPACT_ID_PACKAGE: &str = "com.zeroc.IceCompactId";

impl Emitter<'_> {
    /// `TypeId_<n>` mapping a compact id back to the scoped type id.
    pub(super) fn emit_compact_id(&mut self, id: ClassId) {
        let unit = self.unit;
        let class = unit.class(id);
        let Some(compact) = class.compact_id else {
            return;
        };
        let top = unit.top_level_module(class.decl.module);
        let package = match top.metadata.find("java:package:") {
            Some(prefix) => format!("{prefix}.{COMPACT_ID_PACKAGE}"),
            None => COMPACT_ID_PACKAGE.to_string(),
        };
        let name = format!("TypeId_{compact}");

        let mut w = self.open_file_in(&package);
        w.line(format!("public class {name}"));
        w.open();
        w.line(format!(
            "public final static String typeId = \"{}\";",
            class.decl.scoped
        ));
        w.close();
        self.add_file_in(&package, &name, w);
    }

    /// Empty `_Marker` interface so the package of a top-level module always exists.
    pub(super) fn emit_marker(&mut self, id: ModuleId) {
        let package = super::names::package_of(self.unit, id);
        let mut w = self.open_file_in(&package);
        w.line("interface _Marker");
        w.open();
        w.close();
        self.add_file_in(&package, "_Marker", w);
    }

    /// Class exposing a `checksums` map from type id to signature checksum.
    pub(super) fn emit_checksums(&mut self, qualified: &str) {
        let (package, name) = match qualified.rsplit_once('.') {
            Some((package, name)) => (package.to_string(), name.to_string()),
            None => (String::new(), qualified.to_string()),
        };
        self.source = self
            .unit
            .files()
            .first()
            .map(|f| f.name.clone())
            .unwrap_or_default();
        let checksums = checksums(self.unit);
        tracing::debug!(class = %qualified, count = checksums.len(), "checksums");

        let mut w = self.open_file_in(&package);
        w.line(format!("public class {name}"));
        w.open();
        w.line("public static final java.util.Map<String, String> checksums;");
        w.blank();
        w.line("static");
        w.open();
        w.line("java.util.Map<String, String> map = new java.util.HashMap<>();");
        for (id, sum) in &checksums {
            w.line(format!("map.put(\"{id}\", \"{sum}\");"));
        }
        w.line("checksums = java.util.Collections.unmodifiableMap(map);");
        w.close();
        w.close();
        self.add_file_in(&package, &name, w);
    }
}

/// Checksum of every checksummed type, sorted by type id. Checksums supplied with
/// the model win over the computed signature hash.
pub(super) fn checksums(unit: &Unit) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for module in unit.modules() {
        for &def in &module.definitions {
            if matches!(def, Definition::Const(_)) {
                continue;
            }
            let scoped = unit.decl(def).scoped.clone();
            let sum = match unit.checksums().get(&scoped) {
                Some(given) => given.clone(),
                None => format!("{:08x}", crc32fast::hash(signature(unit, def).as_bytes())),
            };
            out.insert(scoped, sum);
        }
    }
    out
}

fn write_members(out: &mut String, unit: &Unit, members: &[Member]) {
    for m in members {
        let _ = write!(out, ";{}:{}", m.name, unit.type_id(m.ty));
        if let Some(tag) = m.tag {
            let _ = write!(out, "#{tag}");
        }
    }
}

/// Canonical text of a definition's wire-relevant shape.
fn signature(unit: &Unit, def: Definition) -> String {
    let mut out = String::new();
    match def {
        Definition::Struct(id) => {
            let s = unit.structure(id);
            out.push_str("struct ");
            out.push_str(&s.decl.scoped);
            write_members(&mut out, unit, &s.members);
        }
        Definition::Class(id) => {
            let class = unit.class(id);
            out.push_str(if class.is_interface { "interface " } else { "class " });
            out.push_str(&class.decl.scoped);
            for base in class.bases() {
                let _ = write!(out, ":{}", unit.class(base).decl.scoped);
            }
            write_members(&mut out, unit, &class.members);
            for op in &class.operations {
                let _ = write!(out, ";{}(", op.name);
                for p in &op.params {
                    let dir = if p.out { "out " } else { "" };
                    let _ = write!(out, "{dir}{}:{},", p.name, unit.type_id(p.ty));
                }
                out.push(')');
                if let Some(ret) = &op.returns {
                    let _ = write!(out, "->{}", unit.type_id(ret.ty));
                }
            }
        }
        Definition::Exception(id) => {
            let e = unit.exception(id);
            out.push_str("exception ");
            out.push_str(&e.decl.scoped);
            if let Some(base) = e.base {
                let _ = write!(out, ":{}", unit.exception(base).decl.scoped);
            }
            write_members(&mut out, unit, &e.members);
        }
        Definition::Enum(id) => {
            let en = unit.enumeration(id);
            out.push_str("enum ");
            out.push_str(&en.decl.scoped);
            for e in &en.enumerators {
                let _ = write!(out, ";{}={}", e.name, e.value);
            }
        }
        Definition::Sequence(id) => {
            let seq = unit.sequence(id);
            let _ = write!(
                out,
                "sequence {};{}",
                seq.decl.scoped,
                unit.type_id(seq.element)
            );
        }
        Definition::Dictionary(id) => {
            let dict = unit.dictionary(id);
            let _ = write!(
                out,
                "dictionary {};{};{}",
                dict.decl.scoped,
                unit.type_id(dict.key),
                unit.type_id(dict.value)
            );
        }
        Definition::Const(id) => {
            out.push_str(&unit.constant(id).decl.scoped);
        }
    }
    out
}
