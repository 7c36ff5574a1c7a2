//! `<T>Helper` classes for sequences and dictionaries.

use slicegen_core::{DictionaryId, Metadata, SequenceId, Type};

use super::Emitter;
use super::stream::is_generic;
use super::types::SeqMapping;
use super::writer::JavaWriter;

impl Emitter<'_> {
    pub(super) fn emit_sequence_helper(&mut self, id: SequenceId) {
        let none = Metadata::default();
        let unit = self.unit;
        let seq = unit.sequence(id);
        let mapping = self.seq_mapping(id, &none);
        if matches!(mapping, SeqMapping::Buffer(_)) {
            return;
        }
        let unchecked = mapping == SeqMapping::Array
            && is_generic(&self.type_string(seq.element, &none));
        self.emit_helper(&seq.decl.name, Type::Sequence(id), unchecked);
    }

    pub(super) fn emit_dictionary_helper(&mut self, id: DictionaryId) {
        let unit = self.unit;
        let dict = unit.dictionary(id);
        self.emit_helper(&dict.decl.name, Type::Dictionary(id), false);
    }

    fn emit_helper(&mut self, name: &str, ty: Type, unchecked: bool) {
        let none = Metadata::default();
        let class = format!("{name}Helper");
        let java_type = self.type_string(ty, &none);
        tracing::trace!(helper = %class, "helper");

        let mut w = self.open_file();
        w.line(format!("public final class {class}"));
        w.open();

        w.block(format!(
            "public static void write(com.zeroc.Ice.OutputStream ostr, {java_type} v)"
        ));
        self.write_helper_body(&mut w, ty);
        w.close();

        w.blank();
        if unchecked {
            w.line("@SuppressWarnings(\"unchecked\")");
        }
        w.block(format!(
            "public static {java_type} read(com.zeroc.Ice.InputStream istr)"
        ));
        w.line(format!("final {java_type} v;"));
        self.read_helper_body(&mut w, ty);
        w.line("return v;");
        w.close();

        self.write_optional_overloads(&mut w, ty, &java_type, "write", "read");
        w.close();
        self.add_file(&class, w);
    }

    fn write_helper_body(&self, w: &mut JavaWriter, ty: Type) {
        let none = Metadata::default();
        if self.is_native_sequence(ty) {
            self.write_value(w, "ostr", ty, &none, "v");
        } else {
            self.write_container(w, "ostr", ty, &none, "v");
        }
    }

    fn read_helper_body(&self, w: &mut JavaWriter, ty: Type) {
        let none = Metadata::default();
        if self.is_native_sequence(ty) {
            self.read_value(w, "istr", ty, &none, "v", None);
        } else {
            self.read_container(w, "istr", ty, &none, "v");
        }
    }

    /// Builtin-element array the stream marshals with a single call.
    fn is_native_sequence(&self, ty: Type) -> bool {
        let Type::Sequence(id) = ty else {
            return false;
        };
        self.seq_mapping(id, &Metadata::default()) == SeqMapping::Array
            && self
                .unit
                .sequence(id)
                .element
                .builtin()
                .and_then(super::types::stream_stem)
                .is_some()
    }
}
