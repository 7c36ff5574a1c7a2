//! Marshaling statements for a single value.
//!
//! Three calling conventions exist in generated code:
//! - required values, written and read as plain Java values
//! - tagged channels (parameters, results) typed with the `java.util.Optional` family
//! - optional data members, plain values guarded by a `_<name>` presence flag
//!
//! Reference values never assign directly: the reader hands the stream a patcher
//! whose callback runs once the instance graph is complete.

use slicegen_core::layout::OptionalFormat;
use slicegen_core::{Builtin, Member, Metadata, Type};

use super::Emitter;
use super::types::{SeqMapping, optional_format_expr, stream_stem};
use super::writer::JavaWriter;

impl Emitter<'_> {
    /// `new com.zeroc.IceInternal.Patcher<C>(C.class, C.ice_staticId(), callback)`.
    pub(super) fn patcher(&self, ty: Type, callback: Option<&str>) -> String {
        let class = self.value_class(ty);
        match callback {
            Some(cb) => format!(
                "new com.zeroc.IceInternal.Patcher<{class}>({class}.class, {class}.ice_staticId(), {cb})"
            ),
            None => format!(
                "new com.zeroc.IceInternal.Patcher<{class}>({class}.class, {class}.ice_staticId())"
            ),
        }
    }

    /// Helper class that marshals a named sequence or dictionary.
    fn helper_name(&self, ty: Type) -> Option<String> {
        match ty {
            Type::Sequence(id) => Some(self.abs_affixed(&self.unit.sequence(id).decl, "", "Helper")),
            Type::Dictionary(id) => {
                Some(self.abs_affixed(&self.unit.dictionary(id).decl, "", "Helper"))
            }
            _ => None,
        }
    }

    /// Stream stem of a sequence the stream marshals natively (`IntSeq`, `ByteBuffer`).
    fn native_sequence(&self, ty: Type, meta: &Metadata) -> Option<String> {
        let Type::Sequence(id) = ty else {
            return None;
        };
        match self.seq_mapping(id, meta) {
            SeqMapping::Buffer(stem) => Some(format!("{stem}Buffer")),
            SeqMapping::Array => self
                .unit
                .sequence(id)
                .element
                .builtin()
                .and_then(stream_stem)
                .map(|stem| format!("{stem}Seq")),
            SeqMapping::Custom { .. } => None,
        }
    }

    // ------------------------------------------------------------------------
    // Required values
    // ------------------------------------------------------------------------

    pub(super) fn write_value(
        &self,
        w: &mut JavaWriter,
        s: &str,
        ty: Type,
        meta: &Metadata,
        v: &str,
    ) {
        if let Some(native) = self.native_sequence(ty, meta) {
            w.line(format!("{s}.write{native}({v});"));
            return;
        }
        if self.has_local_mapping(ty, meta) {
            self.write_container(w, s, ty, meta, v);
            return;
        }
        match ty {
            Type::Builtin(b) => match stream_stem(b) {
                Some(stem) => w.line(format!("{s}.write{stem}({v});")),
                None if b == Builtin::ObjectProxy => w.line(format!("{s}.writeProxy({v});")),
                None => w.line(format!("{s}.writeValue({v});")),
            },
            Type::Class(_) => w.line(format!("{s}.writeValue({v});")),
            Type::Proxy(_) => w.line(format!("{s}.writeProxy({v});")),
            Type::Struct(_) | Type::Enum(_) => {
                w.line(format!("{}.ice_write({s}, {v});", self.type_string(ty, meta)))
            }
            Type::Sequence(_) | Type::Dictionary(_) => {
                let helper = self.helper_name(ty).unwrap_or_default();
                w.line(format!("{helper}.write({s}, {v});"));
            }
        }
    }

    /// Read into `lvalue`. Reference values go through a patcher that runs `callback`,
    /// by default `value -> <lvalue> = value`.
    pub(super) fn read_value(
        &self,
        w: &mut JavaWriter,
        s: &str,
        ty: Type,
        meta: &Metadata,
        lvalue: &str,
        callback: Option<&str>,
    ) {
        if self.unit.uses_reference_semantics(ty) {
            let default_cb = format!("value -> {lvalue} = value");
            let patcher = self.patcher(ty, Some(callback.unwrap_or(&default_cb)));
            w.line(format!("{s}.readValue({patcher});"));
            return;
        }
        if let Some(native) = self.native_sequence(ty, meta) {
            w.line(format!("{lvalue} = {s}.read{native}();"));
            return;
        }
        if self.has_local_mapping(ty, meta) {
            self.read_container(w, s, ty, meta, lvalue);
            return;
        }
        match ty {
            Type::Builtin(Builtin::ObjectProxy) => w.line(format!("{lvalue} = {s}.readProxy();")),
            Type::Builtin(b) => {
                let stem = stream_stem(b).unwrap_or("Value");
                w.line(format!("{lvalue} = {s}.read{stem}();"));
            }
            Type::Proxy(id) => {
                let prx = self.abs_affixed(&self.unit.class(id).decl, "", "Prx");
                w.line(format!("{lvalue} = {prx}.uncheckedCast({s}.readProxy());"));
            }
            Type::Struct(_) => w.line(format!(
                "{lvalue} = {}.ice_read({s}, {lvalue});",
                self.type_string(ty, meta)
            )),
            Type::Enum(_) => w.line(format!(
                "{lvalue} = {}.ice_read({s});",
                self.type_string(ty, meta)
            )),
            Type::Sequence(_) | Type::Dictionary(_) => {
                let helper = self.helper_name(ty).unwrap_or_default();
                w.line(format!("{lvalue} = {helper}.read({s});"));
            }
            Type::Class(_) => {}
        }
    }

    // ------------------------------------------------------------------------
    // Tagged channels
    // ------------------------------------------------------------------------

    /// Write an optional-typed channel; absent values write nothing.
    pub(super) fn write_tagged(&self, w: &mut JavaWriter, s: &str, ty: Type, tag: i32, v: &str) {
        let none = Metadata::default();
        if let Some(native) = self.native_sequence(ty, &none) {
            w.line(format!("{s}.write{native}({tag}, {v});"));
            return;
        }
        match ty {
            Type::Builtin(b) => match stream_stem(b) {
                Some(stem) => w.line(format!("{s}.write{stem}({tag}, {v});")),
                None if b == Builtin::ObjectProxy => {
                    w.line(format!("{s}.writeProxy({tag}, {v});"))
                }
                None => w.line(format!("{s}.writeValue({tag}, {v});")),
            },
            Type::Class(_) => w.line(format!("{s}.writeValue({tag}, {v});")),
            Type::Proxy(_) => w.line(format!("{s}.writeProxy({tag}, {v});")),
            Type::Struct(_) | Type::Enum(_) => w.line(format!(
                "{}.ice_write({s}, {tag}, {v});",
                self.type_string(ty, &none)
            )),
            Type::Sequence(_) | Type::Dictionary(_) => {
                let helper = self.helper_name(ty).unwrap_or_default();
                w.line(format!("{helper}.write({s}, {tag}, {v});"));
            }
        }
    }

    /// Read an optional-typed channel into `lvalue`.
    pub(super) fn read_tagged(
        &self,
        w: &mut JavaWriter,
        s: &str,
        ty: Type,
        tag: i32,
        lvalue: &str,
    ) {
        let none = Metadata::default();
        if self.unit.uses_reference_semantics(ty) {
            w.line(format!("{lvalue} = java.util.Optional.empty();"));
            let cb = format!("value -> {lvalue} = java.util.Optional.ofNullable(value)");
            w.line(format!("{s}.readValue({tag}, {});", self.patcher(ty, Some(&cb))));
            return;
        }
        if let Some(native) = self.native_sequence(ty, &none) {
            w.line(format!("{lvalue} = {s}.read{native}({tag});"));
            return;
        }
        match ty {
            Type::Builtin(Builtin::ObjectProxy) => {
                w.line(format!("{lvalue} = {s}.readProxy({tag});"))
            }
            Type::Builtin(b) => {
                let stem = stream_stem(b).unwrap_or("Value");
                w.line(format!("{lvalue} = {s}.read{stem}({tag});"));
            }
            Type::Proxy(id) => {
                let prx = self.abs_affixed(&self.unit.class(id).decl, "", "Prx");
                w.line(format!("{lvalue} = {s}.readProxy({tag}, {prx}::uncheckedCast);"));
            }
            Type::Struct(_) | Type::Enum(_) => w.line(format!(
                "{lvalue} = {}.ice_read({s}, {tag});",
                self.type_string(ty, &none)
            )),
            Type::Sequence(_) | Type::Dictionary(_) => {
                let helper = self.helper_name(ty).unwrap_or_default();
                w.line(format!("{lvalue} = {helper}.read({s}, {tag});"));
            }
            Type::Class(_) => {}
        }
    }

    // ------------------------------------------------------------------------
    // Optional data members
    // ------------------------------------------------------------------------

    /// Payload size expression written ahead of a fixed-length `VSize` value.
    pub(super) fn vsize_expr(&self, ty: Type, meta: &Metadata, v: &str) -> String {
        let count_size = |count: String, elem: usize| {
            format!("{v} == null ? 1 : {count} * {elem} + ({count} > 254 ? 5 : 1)")
        };
        match ty {
            Type::Sequence(id) => {
                let elem = self.unit.min_wire_size(self.unit.sequence(id).element);
                let count = match self.seq_mapping(id, meta) {
                    SeqMapping::Array => format!("{v}.length"),
                    SeqMapping::Custom { .. } => format!("{v}.size()"),
                    SeqMapping::Buffer(_) => format!("{v}.remaining()"),
                };
                count_size(count, elem)
            }
            Type::Dictionary(id) => {
                let dict = self.unit.dictionary(id);
                let elem = self.unit.min_wire_size(dict.key) + self.unit.min_wire_size(dict.value);
                count_size(format!("{v}.size()"), elem)
            }
            other => self.unit.min_wire_size(other).to_string(),
        }
    }

    /// `if(flag && s.writeOptional(tag, fmt)) { ... }` around a plain member value.
    pub(super) fn write_optional_member(
        &self,
        w: &mut JavaWriter,
        s: &str,
        member: &Member,
        v: &str,
        flag: &str,
    ) {
        let Some(tag) = member.tag else {
            return;
        };
        let format = self.optional_format_of(member.ty);
        w.block(format!(
            "if({flag} && {s}.writeOptional({tag}, {}))",
            optional_format_expr(format)
        ));
        match format {
            OptionalFormat::VSize if member.ty != Type::Builtin(Builtin::String) => {
                w.line(format!(
                    "{s}.writeSize({});",
                    self.vsize_expr(member.ty, &member.metadata, v)
                ));
                self.write_value(w, s, member.ty, &member.metadata, v);
            }
            OptionalFormat::FSize => {
                w.line(format!("int pos = {s}.startSize();"));
                self.write_value(w, s, member.ty, &member.metadata, v);
                w.line(format!("{s}.endSize(pos);"));
            }
            _ => self.write_value(w, s, member.ty, &member.metadata, v),
        }
        w.close();
    }

    /// `flag = s.readOptional(tag, fmt);` then the guarded read.
    pub(super) fn read_optional_member(
        &self,
        w: &mut JavaWriter,
        s: &str,
        member: &Member,
        lvalue: &str,
        flag: &str,
    ) {
        let Some(tag) = member.tag else {
            return;
        };
        let format = self.optional_format_of(member.ty);
        w.line(format!(
            "{flag} = {s}.readOptional({tag}, {});",
            optional_format_expr(format)
        ));
        w.block(format!("if({flag})"));
        match format {
            OptionalFormat::VSize if member.ty != Type::Builtin(Builtin::String) => {
                w.line(format!("{s}.skipSize();"));
            }
            OptionalFormat::FSize => w.line(format!("{s}.skip(4);")),
            _ => {}
        }
        self.read_value(w, s, member.ty, &member.metadata, lvalue, None);
        w.close();
    }

    // ------------------------------------------------------------------------
    // Sequence and dictionary bodies
    // ------------------------------------------------------------------------

    /// Element-by-element write of a sequence or dictionary held in `v`.
    pub(super) fn write_container(
        &self,
        w: &mut JavaWriter,
        s: &str,
        ty: Type,
        meta: &Metadata,
        v: &str,
    ) {
        let none = Metadata::default();
        w.block(format!("if({v} == null)"));
        w.line(format!("{s}.writeSize(0);"));
        w.close();
        w.line("else");
        w.open();
        match ty {
            Type::Sequence(id) => {
                let element = self.unit.sequence(id).element;
                match self.seq_mapping(id, meta) {
                    SeqMapping::Custom { .. } => {
                        w.line(format!("{s}.writeSize({v}.size());"));
                        w.block(format!("for({} elem : {v})", self.boxed_type(element, &none)));
                        self.write_value(w, s, element, &none, "elem");
                    }
                    _ => {
                        w.line(format!("{s}.writeSize({v}.length);"));
                        w.block(format!("for(int i0 = 0; i0 < {v}.length; i0++)"));
                        self.write_value(w, s, element, &none, &format!("{v}[i0]"));
                    }
                }
                w.close();
            }
            Type::Dictionary(id) => {
                let dict = self.unit.dictionary(id);
                w.line(format!("{s}.writeSize({v}.size());"));
                w.block(format!(
                    "for(java.util.Map.Entry<{}, {}> e : {v}.entrySet())",
                    self.boxed_type(dict.key, &none),
                    self.boxed_type(dict.value, &none)
                ));
                self.write_value(w, s, dict.key, &none, "e.getKey()");
                self.write_value(w, s, dict.value, &none, "e.getValue()");
                w.close();
            }
            _ => {}
        }
        w.close();
    }

    /// Element-by-element read of a sequence or dictionary into `lvalue`.
    ///
    /// `lvalue` must be a field or a local assigned only here, since patcher
    /// callbacks capture it.
    pub(super) fn read_container(
        &self,
        w: &mut JavaWriter,
        s: &str,
        ty: Type,
        meta: &Metadata,
        lvalue: &str,
    ) {
        let none = Metadata::default();
        match ty {
            Type::Sequence(id) => {
                let element = self.unit.sequence(id).element;
                let reference = self.unit.uses_reference_semantics(element);
                let min = self.unit.min_wire_size(element);
                w.line(format!("final int len0 = {s}.readAndCheckSeqSize({min});"));
                match self.seq_mapping(id, meta) {
                    SeqMapping::Custom { instance, .. } => {
                        w.line(format!("{lvalue} = new {instance}();"));
                        w.block("for(int i0 = 0; i0 < len0; i0++)");
                        if reference {
                            w.line("final int fi0 = i0;");
                            w.line(format!("{lvalue}.add(null);"));
                            let cb = format!("value -> {lvalue}.set(fi0, value)");
                            self.read_value(w, s, element, &none, "", Some(&cb));
                        } else {
                            w.line(format!(
                                "{} elem{};",
                                self.type_string(element, &none),
                                null_init(element)
                            ));
                            self.read_value(w, s, element, &none, "elem", None);
                            w.line(format!("{lvalue}.add(elem);"));
                        }
                        w.close();
                    }
                    _ => {
                        let elem_type = self.type_string(element, &none);
                        w.line(format!("{lvalue} = {};", array_alloc(&elem_type, "len0")));
                        w.block("for(int i0 = 0; i0 < len0; i0++)");
                        if reference {
                            w.line("final int fi0 = i0;");
                            let cb = format!("value -> {lvalue}[fi0] = value");
                            self.read_value(w, s, element, &none, "", Some(&cb));
                        } else {
                            self.read_value(w, s, element, &none, &format!("{lvalue}[i0]"), None);
                        }
                        w.close();
                    }
                }
            }
            Type::Dictionary(id) => {
                let dict = self.unit.dictionary(id);
                let (instance, _) = self.dict_mapping(id, meta);
                let diamond = if instance.contains('<') { "" } else { "<>" };
                w.line(format!("{lvalue} = new {instance}{diamond}();"));
                w.line(format!("int sz0 = {s}.readSize();"));
                w.block("for(int i0 = 0; i0 < sz0; i0++)");
                w.line(format!(
                    "{} key{};",
                    self.type_string(dict.key, &none),
                    null_init(dict.key)
                ));
                self.read_value(w, s, dict.key, &none, "key", None);
                if self.unit.uses_reference_semantics(dict.value) {
                    w.line(format!("final {} fkey = key;", self.type_string(dict.key, &none)));
                    let cb = format!("value -> {lvalue}.put(fkey, value)");
                    self.read_value(w, s, dict.value, &none, "", Some(&cb));
                } else {
                    w.line(format!(
                        "{} val{};",
                        self.type_string(dict.value, &none),
                        null_init(dict.value)
                    ));
                    self.read_value(w, s, dict.value, &none, "val", None);
                    w.line(format!("{lvalue}.put(key, val);"));
                }
                w.close();
            }
            _ => {}
        }
    }
}

/// Struct locals are passed back into `ice_read`, so they start out null.
pub(super) fn null_init(ty: Type) -> &'static str {
    if matches!(ty, Type::Struct(_)) {
        " = null"
    } else {
        ""
    }
}

/// `new E[n]`, or an unchecked cast for generic element types.
pub(super) fn array_alloc(elem_type: &str, len: &str) -> String {
    match elem_type.find('<') {
        Some(generic) => {
            let raw = &elem_type[..generic];
            let dims = elem_type.matches("[]").count();
            format!("({elem_type}[])new {raw}[{len}]{}", "[]".repeat(dims))
        }
        None => match elem_type.find('[') {
            Some(bracket) => format!(
                "new {}[{len}]{}",
                &elem_type[..bracket],
                &elem_type[bracket..]
            ),
            None => format!("new {elem_type}[{len}]"),
        },
    }
}

/// Whether reading `elem_type` arrays needs `@SuppressWarnings("unchecked")`.
pub(super) fn is_generic(type_string: &str) -> bool {
    type_string.contains('<')
}
