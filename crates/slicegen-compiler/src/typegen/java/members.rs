//! Data member declarations, accessors, initializers and literals.

use slicegen_core::utils::{capitalize, parse_integer};
use slicegen_core::{
    Builtin, ClassId, ConstValue, Decl, Definition, ExceptionId, Member, Metadata, StructId, Type,
};

use super::Emitter;
use super::names::fix_kwd;
use super::types::SeqMapping;
use super::writer::JavaWriter;
use crate::diagnostics::DiagnosticKind;

/// Definition that owns a list of data members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Container {
    Struct(StructId),
    Class(ClassId),
    Exception(ExceptionId),
}

impl Container {
    fn definition(self) -> Definition {
        match self {
            Container::Struct(id) => Definition::Struct(id),
            Container::Class(id) => Definition::Class(id),
            Container::Exception(id) => Definition::Exception(id),
        }
    }
}

/// Escape a string for a Java string literal.
pub(super) fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units).iter() {
                    out.push_str(&format!("\\u{unit:04x}"));
                }
            }
        }
    }
    out.push('"');
    out
}

impl Emitter<'_> {
    /// Java expression for a constant or default value of type `ty`.
    pub(super) fn literal(&self, ty: Type, value: &ConstValue) -> String {
        match value {
            ConstValue::Const(id) => format!("{}.value", self.def_abs(Definition::Const(*id))),
            ConstValue::Enumerator(id, index) => {
                let en = self.unit.enumeration(*id);
                let name = en
                    .enumerators
                    .get(*index)
                    .map(|e| e.name.as_str())
                    .unwrap_or_default();
                let name = name.rsplit(':').next().unwrap_or(name);
                format!("{}.{}", self.def_abs(Definition::Enum(*id)), fix_kwd(name))
            }
            ConstValue::Literal(text) => match ty {
                Type::Builtin(Builtin::String) => escape_string(text),
                // Byte literals are range-checked when the model loads.
                Type::Builtin(Builtin::Byte) => match parse_integer(text) {
                    Some(v) if v > 127 => (v - 256).to_string(),
                    Some(v) => v.to_string(),
                    None => text.clone(),
                },
                Type::Builtin(Builtin::Long) => {
                    format!("{}L", text.trim_end_matches(['l', 'L']))
                }
                Type::Builtin(Builtin::Float) => {
                    format!("{}F", text.trim_end_matches(['f', 'F']))
                }
                _ => text.clone(),
            },
        }
    }

    /// Field assignments the default constructor performs for `members`.
    pub(super) fn write_initializers(&self, w: &mut JavaWriter, members: &[&Member]) {
        for member in members {
            let field = fix_kwd(&member.name);
            if let Some(default) = &member.default {
                let value = self.literal(member.ty, default);
                if member.is_optional() {
                    w.line(format!("set{}({value});", capitalize(&member.name)));
                } else {
                    w.line(format!("this.{field} = {value};"));
                }
                continue;
            }
            if member.is_optional() {
                continue;
            }
            match member.ty {
                Type::Builtin(Builtin::String) => w.line(format!("this.{field} = \"\";")),
                Type::Enum(_) => w.line(format!(
                    "this.{field} = {};",
                    self.default_value(member.ty, false)
                )),
                Type::Struct(_) => w.line(format!(
                    "this.{field} = new {}();",
                    self.type_string(member.ty, &member.metadata)
                )),
                _ => {}
            }
        }
    }

    /// `java.io.Serializable` id: the `java:serialVersionUID` override or a signature hash.
    pub(super) fn serial_version_uid(&mut self, kind: &str, decl: &Decl, members: &[&Member]) -> i64 {
        if let Some(text) = decl.metadata.find("java:serialVersionUID:") {
            match text.trim().trim_end_matches(['l', 'L']).parse::<i64>() {
                Ok(value) => return value,
                Err(_) => self
                    .diagnostics
                    .report(DiagnosticKind::InvalidSerialVersionUid, decl.location.clone())
                    .message(format!("{kind} `{}'", decl.scoped))
                    .emit(),
            }
        }
        let mut signature = decl.scoped.clone();
        for member in members {
            signature.push(';');
            signature.push_str(&member.name);
            signature.push(':');
            signature.push_str(&self.unit.type_id(member.ty));
            if let Some(tag) = member.tag {
                signature.push_str(&format!("#{tag}"));
            }
        }
        i64::from(crc32fast::hash(signature.as_bytes()))
    }

    /// Field declaration plus the accessors the member needs.
    pub(super) fn write_member(&mut self, w: &mut JavaWriter, container: Container, member: &Member) {
        let container_meta = &self.unit.decl(container.definition()).metadata;
        let field = fix_kwd(&member.name);
        let flag = format!("_{}", member.name);
        let ty = self.type_string(member.ty, &member.metadata);
        let optional = member.is_optional();

        w.blank();
        if optional {
            w.line(format!("private {ty} {field};"));
            w.line(format!("private boolean {flag};"));
        } else {
            let protected = matches!(container, Container::Class(_))
                && (member.metadata.has("protected") || container_meta.has("protected"));
            let access = if protected { "protected" } else { "public" };
            w.line(format!("{access} {ty} {field};"));
        }

        let getset = member.metadata.has("java:getset") || container_meta.has("java:getset");
        if !getset && !optional {
            return;
        }

        let cap = capitalize(&member.name);
        let getter = format!("get{cap}");
        if !self.accessor_free(container, member, &getter, 0) {
            return;
        }
        w.blank();
        w.block(format!("public {ty} {getter}()"));
        self.write_set_check(w, member, &flag);
        w.line(format!("return {field};"));
        w.close();

        let setter = format!("set{cap}");
        if !self.accessor_free(container, member, &setter, 1) {
            return;
        }
        w.blank();
        w.block(format!("public void {setter}({ty} {field})"));
        if optional {
            w.line(format!("{flag} = true;"));
        }
        w.line(format!("this.{field} = {field};"));
        w.close();

        if optional {
            let has = format!("has{cap}");
            let clear = format!("clear{cap}");
            let accessor = format!("optional{cap}");
            if !self.accessor_free(container, member, &has, 0)
                || !self.accessor_free(container, member, &clear, 0)
                || !self.accessor_free(container, member, &accessor, 0)
            {
                return;
            }
            let opt_ty = self.optional_type(member.ty);
            w.blank();
            w.block(format!("public boolean {has}()"));
            w.line(format!("return {flag};"));
            w.close();
            w.blank();
            w.block(format!("public void {clear}()"));
            w.line(format!("{flag} = false;"));
            w.close();
            w.blank();
            w.block(format!("public void {accessor}({opt_ty} v)"));
            w.block("if(v == null || !v.isPresent())");
            w.line(format!("{flag} = false;"));
            w.close();
            w.line("else");
            w.open();
            w.line(format!("{flag} = true;"));
            w.line(format!("{field} = v.{}();", self.optional_getter(member.ty)));
            w.close();
            w.close();
            w.blank();
            w.block(format!("public {opt_ty} {accessor}()"));
            w.block(format!("if({flag})"));
            let wrap = if self.unit.uses_reference_semantics(member.ty) {
                "java.util.Optional.ofNullable"
            } else {
                self.optional_factory(member.ty)
            };
            w.line(format!("return {wrap}({field});"));
            w.close();
            w.line("else");
            w.open();
            w.line(format!("return {};", self.optional_empty(member.ty)));
            w.close();
            w.close();
        }

        if member.ty == Type::Builtin(Builtin::Bool) {
            let is = format!("is{cap}");
            if !self.accessor_free(container, member, &is, 0) {
                return;
            }
            w.blank();
            w.block(format!("public boolean {is}()"));
            self.write_set_check(w, member, &flag);
            w.line(format!("return {field};"));
            w.close();
        }

        if let Type::Sequence(id) = member.ty
            && self.seq_mapping(id, &member.metadata) == SeqMapping::Array
        {
            if !self.accessor_free(container, member, &getter, 1)
                || !self.accessor_free(container, member, &setter, 2)
            {
                return;
            }
            let elem = self.type_string(self.unit.sequence(id).element, &Metadata::default());
            w.blank();
            w.block(format!("public {elem} {getter}(int index)"));
            self.write_set_check(w, member, &flag);
            w.line(format!("return this.{field}[index];"));
            w.close();
            w.blank();
            w.block(format!("public void {setter}(int index, {elem} val)"));
            self.write_set_check(w, member, &flag);
            w.line(format!("this.{field}[index] = val;"));
            w.close();
        }
    }

    fn write_set_check(&self, w: &mut JavaWriter, member: &Member, flag: &str) {
        if !member.is_optional() {
            return;
        }
        w.block(format!("if(!{flag})"));
        w.line(format!(
            "throw new java.util.NoSuchElementException(\"{} is not set\");",
            member.name
        ));
        w.close();
    }

    /// Reports an error when an operation of the class could be confused with `method`.
    fn accessor_free(
        &mut self,
        container: Container,
        member: &Member,
        method: &str,
        args: usize,
    ) -> bool {
        let Container::Class(id) = container else {
            return true;
        };
        let conflict = self
            .unit
            .all_operations(id)
            .into_iter()
            .find(|op| op.name == method && args >= op.params.len() && args - op.params.len() <= 1)
            .map(|op| (op.name.clone(), op.location.clone()));
        let Some((name, location)) = conflict else {
            return true;
        };
        self.diagnostics
            .report(DiagnosticKind::AccessorConflict, member.location.clone())
            .message(&name)
            .related_to("operation declared here", location)
            .emit();
        false
    }
}
