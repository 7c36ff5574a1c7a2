//! Structs, classes and exceptions.

use slicegen_core::layout::marshal_order;
use slicegen_core::utils::capitalize;
use slicegen_core::{ClassId, Decl, ExceptionId, Member, Metadata, StructId, Type};

use super::Emitter;
use super::members::Container;
use super::names::fix_kwd;
use super::types::SeqMapping;
use super::writer::JavaWriter;

/// Java parameter count limit for a member-wise constructor.
const MAX_CTOR_PARAMS: usize = 255;

/// Interfaces listed with `java:implements:`.
pub(super) fn implements_list(meta: &Metadata) -> Vec<String> {
    meta.iter()
        .filter_map(|m| m.strip_prefix("java:implements:"))
        .flat_map(|list| list.split(','))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_mixed(members: &[&Member]) -> bool {
    members.iter().any(|m| m.is_optional()) && members.iter().any(|m| !m.is_optional())
}

impl Emitter<'_> {
    fn ctor_params(&self, members: &[&Member]) -> Vec<String> {
        members
            .iter()
            .map(|m| format!("{} {}", self.type_string(m.ty, &m.metadata), fix_kwd(&m.name)))
            .collect()
    }

    fn member_args(members: &[&Member]) -> Vec<String> {
        members.iter().map(|m| fix_kwd(&m.name)).collect()
    }

    /// `this.x = x;` for required members, `setX(x);` for optional ones.
    fn write_assignments(&self, w: &mut JavaWriter, members: &[&Member]) {
        for member in members {
            let name = fix_kwd(&member.name);
            if member.is_optional() {
                w.line(format!("set{}({name});", capitalize(&member.name)));
            } else {
                w.line(format!("this.{name} = {name};"));
            }
        }
    }

    fn write_serial_version_uid(&mut self, w: &mut JavaWriter, kind: &str, decl: &Decl, members: &[&Member]) {
        let uid = self.serial_version_uid(kind, decl, members);
        w.blank();
        w.line(format!("public static final long serialVersionUID = {uid}L;"));
    }

    fn write_marshal_members(&self, w: &mut JavaWriter, s: &str, members: &[&Member]) {
        for member in marshal_order(members.iter().copied()) {
            let field = fix_kwd(&member.name);
            if member.is_optional() {
                let flag = format!("_{}", member.name);
                self.write_optional_member(w, s, member, &field, &flag);
            } else {
                self.write_value(w, s, member.ty, &member.metadata, &field);
            }
        }
    }

    fn write_unmarshal_members(&self, w: &mut JavaWriter, s: &str, members: &[&Member]) {
        for member in marshal_order(members.iter().copied()) {
            let field = format!("this.{}", fix_kwd(&member.name));
            if member.is_optional() {
                let flag = format!("_{}", member.name);
                self.read_optional_member(w, s, member, &field, &flag);
            } else {
                self.read_value(w, s, member.ty, &member.metadata, &field, None);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Structs
    // ------------------------------------------------------------------------

    pub(super) fn emit_struct(&mut self, id: StructId) {
        let unit = self.unit;
        let st = unit.structure(id);
        let name = fix_kwd(&st.decl.name);
        let members: Vec<&Member> = st.members.iter().collect();
        tracing::trace!(name = %st.decl.scoped, "struct");

        let mut w = self.open_file();
        let mut implements = vec![
            "java.lang.Cloneable".to_string(),
            "java.io.Serializable".to_string(),
        ];
        implements.extend(implements_list(&st.decl.metadata));
        w.line(format!("public class {name} implements {}", implements.join(", ")));
        w.open();

        for member in &members {
            self.write_member(&mut w, Container::Struct(id), member);
        }

        w.blank();
        w.block(format!("public {name}()"));
        self.write_initializers(&mut w, &members);
        w.close();

        if !members.is_empty() {
            w.blank();
            w.block(format!("public {name}({})", self.ctor_params(&members).join(", ")));
            for member in &members {
                let field = fix_kwd(&member.name);
                w.line(format!("this.{field} = {field};"));
            }
            w.close();
        }

        self.write_struct_equals(&mut w, &name, &members);
        self.write_struct_hash(&mut w, &st.decl.scoped, &members);

        w.blank();
        w.block(format!("public {name} clone()"));
        w.line(format!("{name} c = null;"));
        w.line("try");
        w.open();
        w.line(format!("c = ({name})super.clone();"));
        w.close();
        w.line("catch(CloneNotSupportedException ex)");
        w.open();
        w.line("assert false; // impossible");
        w.close();
        w.line("return c;");
        w.close();

        w.blank();
        w.block("public void ice_writeMembers(com.zeroc.Ice.OutputStream ostr)");
        for member in &members {
            let field = format!("this.{}", fix_kwd(&member.name));
            self.write_value(&mut w, "ostr", member.ty, &member.metadata, &field);
        }
        w.close();

        w.blank();
        w.block("public void ice_readMembers(com.zeroc.Ice.InputStream istr)");
        for member in &members {
            let field = format!("this.{}", fix_kwd(&member.name));
            self.read_value(&mut w, "istr", member.ty, &member.metadata, &field, None);
        }
        w.close();

        w.blank();
        w.block(format!(
            "static public void ice_write(com.zeroc.Ice.OutputStream ostr, {name} v)"
        ));
        w.block("if(v == null)");
        w.line("_nullMarshalValue.ice_writeMembers(ostr);");
        w.close();
        w.line("else");
        w.open();
        w.line("v.ice_writeMembers(ostr);");
        w.close();
        w.close();

        w.blank();
        w.block(format!(
            "static public {name} ice_read(com.zeroc.Ice.InputStream istr, {name} v)"
        ));
        w.block("if(v == null)");
        w.line(format!("v = new {name}();"));
        w.close();
        w.line("v.ice_readMembers(istr);");
        w.line("return v;");
        w.close();

        self.write_optional_overloads(&mut w, Type::Struct(id), &name, "ice_write", "ice_read");

        w.blank();
        w.line(format!("private static final {name} _nullMarshalValue = new {name}();"));

        self.write_serial_version_uid(&mut w, "struct", &st.decl, &members);
        w.close();
        self.add_file(&name, w);
    }

    fn write_struct_equals(&self, w: &mut JavaWriter, name: &str, members: &[&Member]) {
        w.blank();
        w.block("public boolean equals(java.lang.Object rhs)");
        w.block("if(this == rhs)");
        w.line("return true;");
        w.close();
        w.line(format!("{name} r = null;"));
        w.block(format!("if(rhs instanceof {name})"));
        w.line(format!("r = ({name})rhs;"));
        w.close();
        w.blank();
        w.block("if(r != null)");
        for member in members {
            let field = fix_kwd(&member.name);
            let by_value = match member.ty {
                Type::Builtin(b) => b.is_primitive(),
                Type::Enum(_) => true,
                _ => false,
            };
            let array = matches!(member.ty, Type::Sequence(id)
                if self.seq_mapping(id, &member.metadata) == SeqMapping::Array);
            if by_value {
                w.block(format!("if(this.{field} != r.{field})"));
                w.line("return false;");
                w.close();
            } else if array {
                w.block(format!("if(!java.util.Arrays.equals(this.{field}, r.{field}))"));
                w.line("return false;");
                w.close();
            } else {
                w.block(format!("if(this.{field} != r.{field})"));
                w.block(format!(
                    "if(this.{field} == null || r.{field} == null || !this.{field}.equals(r.{field}))"
                ));
                w.line("return false;");
                w.close();
                w.close();
            }
        }
        w.blank();
        w.line("return true;");
        w.close();
        w.blank();
        w.line("return false;");
        w.close();
    }

    fn write_struct_hash(&self, w: &mut JavaWriter, scoped: &str, members: &[&Member]) {
        w.blank();
        w.block("public int hashCode()");
        w.line("int h_ = 5381;");
        w.line(format!("h_ = com.zeroc.IceInternal.HashUtil.hashAdd(h_, \"{scoped}\");"));
        for member in members {
            w.line(format!(
                "h_ = com.zeroc.IceInternal.HashUtil.hashAdd(h_, {});",
                fix_kwd(&member.name)
            ));
        }
        w.line("return h_;");
        w.close();
    }

    /// Tagged `ice_write`/`ice_read` (or `write`/`read`) overloads for a type with a
    /// required form already defined.
    pub(super) fn write_optional_overloads(
        &self,
        w: &mut JavaWriter,
        ty: Type,
        java_type: &str,
        write: &str,
        read: &str,
    ) {
        let format = self.optional_format_of(ty);
        let format_expr = super::types::optional_format_expr(format);
        let modifier = if write == "ice_write" {
            "static public"
        } else {
            "public static"
        };

        w.blank();
        w.block(format!(
            "{modifier} void {write}(com.zeroc.Ice.OutputStream ostr, int tag, java.util.Optional<{java_type}> v)"
        ));
        w.block("if(v != null && v.isPresent())");
        w.line(format!("{write}(ostr, tag, v.get());"));
        w.close();
        w.close();

        w.blank();
        w.block(format!(
            "{modifier} void {write}(com.zeroc.Ice.OutputStream ostr, int tag, {java_type} v)"
        ));
        w.block(format!("if(ostr.writeOptional(tag, {format_expr}))"));
        match format {
            slicegen_core::layout::OptionalFormat::VSize => {
                let size = self.vsize_expr(ty, &Metadata::default(), "v");
                w.line(format!("ostr.writeSize({size});"));
                w.line(format!("{write}(ostr, v);"));
            }
            slicegen_core::layout::OptionalFormat::FSize => {
                w.line("int pos = ostr.startSize();");
                w.line(format!("{write}(ostr, v);"));
                w.line("ostr.endSize(pos);");
            }
            _ => w.line(format!("{write}(ostr, v);")),
        }
        w.close();
        w.close();

        let read_call = if matches!(ty, Type::Struct(_)) {
            format!("{read}(istr, null)")
        } else {
            format!("{read}(istr)")
        };
        w.blank();
        w.block(format!(
            "{modifier} java.util.Optional<{java_type}> {read}(com.zeroc.Ice.InputStream istr, int tag)"
        ));
        w.block(format!("if(istr.readOptional(tag, {format_expr}))"));
        match format {
            slicegen_core::layout::OptionalFormat::VSize => w.line("istr.skipSize();"),
            slicegen_core::layout::OptionalFormat::FSize => w.line("istr.skip(4);"),
            _ => {}
        }
        w.line(format!("return java.util.Optional.of({read_call});"));
        w.close();
        w.line("else");
        w.open();
        w.line("return java.util.Optional.empty();");
        w.close();
        w.close();
    }

    // ------------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------------

    pub(super) fn emit_class(&mut self, id: ClassId) {
        let unit = self.unit;
        let class = unit.class(id);
        let name = fix_kwd(&class.decl.name);
        let own: Vec<&Member> = class.members.iter().collect();
        let all = unit.all_class_members(id);
        let base_members = class.base.map(|b| unit.all_class_members(b)).unwrap_or_default();
        tracing::trace!(name = %class.decl.scoped, "class");

        let mut w = self.open_file();
        let extends = match class.base {
            Some(base) => self.abs(&unit.class(base).decl),
            None => "com.zeroc.Ice.Value".to_string(),
        };
        let implements = implements_list(&class.decl.metadata);
        let mut header = format!("public class {name} extends {extends}");
        if !implements.is_empty() {
            header.push_str(&format!(" implements {}", implements.join(", ")));
        }
        w.line(header);
        w.open();

        if !all.is_empty() {
            w.block(format!("public {name}()"));
            if class.base.is_some() {
                w.line("super();");
            }
            self.write_initializers(&mut w, &own);
            w.close();

            if all.len() < MAX_CTOR_PARAMS && is_mixed(&all) {
                let required: Vec<&Member> = all.iter().copied().filter(|m| !m.is_optional()).collect();
                let base_required: Vec<&Member> =
                    base_members.iter().copied().filter(|m| !m.is_optional()).collect();
                let own_required: Vec<&Member> =
                    own.iter().copied().filter(|m| !m.is_optional()).collect();
                let own_optional =
                    marshal_order(own.iter().copied().filter(|m| m.is_optional()));
                w.blank();
                w.block(format!("public {name}({})", self.ctor_params(&required).join(", ")));
                if !base_required.is_empty() {
                    w.line(format!("super({});", Self::member_args(&base_required).join(", ")));
                }
                self.write_assignments(&mut w, &own_required);
                self.write_initializers(&mut w, &own_optional);
                w.close();
            }

            if all.len() < MAX_CTOR_PARAMS {
                w.blank();
                w.block(format!("public {name}({})", self.ctor_params(&all).join(", ")));
                if class.base.is_some() && !base_members.is_empty() {
                    w.line(format!("super({});", Self::member_args(&base_members).join(", ")));
                }
                self.write_assignments(&mut w, &own);
                w.close();
            }
        }

        for member in &own {
            self.write_member(&mut w, Container::Class(id), member);
        }

        self.write_results(&mut w, id, false);

        w.blank();
        w.block(format!("public {name} clone()"));
        w.line(format!("return ({name})super.clone();"));
        w.close();

        w.blank();
        w.block("public static String ice_staticId()");
        w.line(format!("return \"{}\";", class.decl.scoped));
        w.close();

        w.blank();
        w.line("@Override");
        w.block("public String ice_id()");
        w.line("return ice_staticId();");
        w.close();

        self.write_serial_version_uid(&mut w, "class", &class.decl, &own);

        let preserved = unit.class_preserves_slice(id) && !unit.class_inherits_preserve(id);
        if preserved {
            w.blank();
            w.line("@Override");
            w.block("public void _iceWrite(com.zeroc.Ice.OutputStream ostr)");
            w.line("ostr.startValue(_iceSlicedData);");
            w.line("_iceWriteImpl(ostr);");
            w.line("ostr.endValue();");
            w.close();
            w.blank();
            w.line("@Override");
            w.block("public void _iceRead(com.zeroc.Ice.InputStream istr)");
            w.line("istr.startValue();");
            w.line("_iceReadImpl(istr);");
            w.line("_iceSlicedData = istr.endValue(true);");
            w.close();
            w.blank();
            w.line("@Override");
            w.block("public com.zeroc.Ice.SlicedData ice_getSlicedData()");
            w.line("return _iceSlicedData;");
            w.close();
        }

        let compact = class.compact_id.unwrap_or(-1);
        let last = class.base.is_none();
        w.blank();
        w.line("@Override");
        w.block("protected void _iceWriteImpl(com.zeroc.Ice.OutputStream ostr_)");
        w.line(format!("ostr_.startSlice(ice_staticId(), {compact}, {last});"));
        self.write_marshal_members(&mut w, "ostr_", &own);
        w.line("ostr_.endSlice();");
        if !last {
            w.line("super._iceWriteImpl(ostr_);");
        }
        w.close();

        w.blank();
        w.line("@Override");
        w.block("protected void _iceReadImpl(com.zeroc.Ice.InputStream istr_)");
        w.line("istr_.startSlice();");
        self.write_unmarshal_members(&mut w, "istr_", &own);
        w.line("istr_.endSlice();");
        if !last {
            w.line("super._iceReadImpl(istr_);");
        }
        w.close();

        if preserved {
            w.blank();
            w.line("protected com.zeroc.Ice.SlicedData _iceSlicedData;");
        }
        w.close();
        self.add_file(&name, w);

        if !unit.all_operations(id).is_empty() {
            self.emit_class_dispatch(id);
        }
    }

    // ------------------------------------------------------------------------
    // Exceptions
    // ------------------------------------------------------------------------

    fn exception_chain_uses_classes(&self, id: ExceptionId) -> bool {
        self.unit.exception_uses_classes(id)
            || self
                .unit
                .exception(id)
                .base
                .is_some_and(|b| self.exception_chain_uses_classes(b))
    }

    pub(super) fn emit_exception(&mut self, id: ExceptionId) {
        let unit = self.unit;
        let ex = unit.exception(id);
        let name = fix_kwd(&ex.decl.name);
        let own: Vec<&Member> = ex.members.iter().collect();
        let all = unit.all_exception_members(id);
        let base_members = ex.base.map(|b| unit.all_exception_members(b)).unwrap_or_default();
        let cause = if all.iter().any(|m| m.name == "cause") {
            "cause_"
        } else {
            "cause"
        };
        tracing::trace!(name = %ex.decl.scoped, "exception");

        let mut w = self.open_file();
        let extends = match ex.base {
            Some(base) => self.abs(&unit.exception(base).decl),
            None => "com.zeroc.Ice.UserException".to_string(),
        };
        w.line(format!("public class {name} extends {extends}"));
        w.open();

        w.block(format!("public {name}()"));
        if ex.base.is_some() {
            w.line("super();");
        }
        self.write_initializers(&mut w, &own);
        w.close();

        w.blank();
        w.block(format!("public {name}(Throwable {cause})"));
        w.line(format!("super({cause});"));
        self.write_initializers(&mut w, &own);
        w.close();

        if !all.is_empty() && all.len() < MAX_CTOR_PARAMS {
            if is_mixed(&all) {
                let required: Vec<&Member> = all.iter().copied().filter(|m| !m.is_optional()).collect();
                let base_required: Vec<&Member> =
                    base_members.iter().copied().filter(|m| !m.is_optional()).collect();
                let own_required: Vec<&Member> =
                    own.iter().copied().filter(|m| !m.is_optional()).collect();
                let own_optional =
                    marshal_order(own.iter().copied().filter(|m| m.is_optional()));
                let params = self.ctor_params(&required).join(", ");

                w.blank();
                w.block(format!("public {name}({params})"));
                if !base_required.is_empty() {
                    w.line(format!("super({});", Self::member_args(&base_required).join(", ")));
                }
                self.write_assignments(&mut w, &own_required);
                self.write_initializers(&mut w, &own_optional);
                w.close();

                w.blank();
                w.block(format!("public {name}({params}, Throwable {cause})"));
                if base_required.is_empty() {
                    w.line(format!("super({cause});"));
                } else {
                    let mut args = Self::member_args(&base_required);
                    args.push(cause.to_string());
                    w.line(format!("super({});", args.join(", ")));
                }
                self.write_assignments(&mut w, &own_required);
                self.write_initializers(&mut w, &own_optional);
                w.close();
            }

            let params = self.ctor_params(&all).join(", ");
            w.blank();
            w.block(format!("public {name}({params})"));
            if ex.base.is_some() && !base_members.is_empty() {
                w.line(format!("super({});", Self::member_args(&base_members).join(", ")));
            }
            self.write_assignments(&mut w, &own);
            w.close();

            w.blank();
            w.block(format!("public {name}({params}, Throwable {cause})"));
            if ex.base.is_some() && !base_members.is_empty() {
                let mut args = Self::member_args(&base_members);
                args.push(cause.to_string());
                w.line(format!("super({});", args.join(", ")));
            } else {
                w.line(format!("super({cause});"));
            }
            self.write_assignments(&mut w, &own);
            w.close();
        }

        w.blank();
        w.block("public String ice_id()");
        w.line(format!("return \"{}\";", ex.decl.scoped));
        w.close();

        for member in &own {
            self.write_member(&mut w, Container::Exception(id), member);
        }

        let preserved = unit.exception_preserves_slice(id) && !unit.exception_inherits_preserve(id);
        if preserved {
            w.blank();
            w.line("@Override");
            w.block("public void _write(com.zeroc.Ice.OutputStream ostr)");
            w.line("ostr.startException(_slicedData);");
            w.line("_writeImpl(ostr);");
            w.line("ostr.endException();");
            w.close();
            w.blank();
            w.line("@Override");
            w.block("public void _read(com.zeroc.Ice.InputStream istr)");
            w.line("istr.startException();");
            w.line("_readImpl(istr);");
            w.line("_slicedData = istr.endException(true);");
            w.close();
        }

        let last = ex.base.is_none();
        w.blank();
        w.line("@Override");
        w.block("protected void _writeImpl(com.zeroc.Ice.OutputStream ostr_)");
        w.line(format!("ostr_.startSlice(\"{}\", -1, {last});", ex.decl.scoped));
        self.write_marshal_members(&mut w, "ostr_", &own);
        w.line("ostr_.endSlice();");
        if !last {
            w.line("super._writeImpl(ostr_);");
        }
        w.close();

        w.blank();
        w.line("@Override");
        w.block("protected void _readImpl(com.zeroc.Ice.InputStream istr_)");
        w.line("istr_.startSlice();");
        self.write_unmarshal_members(&mut w, "istr_", &own);
        w.line("istr_.endSlice();");
        if !last {
            w.line("super._readImpl(istr_);");
        }
        w.close();

        let base_uses_classes = ex.base.is_some_and(|b| self.exception_chain_uses_classes(b));
        if unit.exception_uses_classes(id) && !base_uses_classes {
            w.blank();
            w.line("@Override");
            w.block("public boolean _usesClasses()");
            w.line("return true;");
            w.close();
        }

        if preserved {
            w.blank();
            w.line("protected com.zeroc.Ice.SlicedData _slicedData;");
        }

        self.write_serial_version_uid(&mut w, "exception", &ex.decl, &own);
        w.close();
        self.add_file(&name, w);
    }
}
