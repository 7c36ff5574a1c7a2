//! Enumerations and constants.

use slicegen_core::{ConstId, EnumId, Type};

use super::Emitter;
use super::names::fix_kwd;

impl Emitter<'_> {
    pub(super) fn emit_enum(&mut self, id: EnumId) {
        let unit = self.unit;
        let en = unit.enumeration(id);
        let name = fix_kwd(&en.decl.name);
        let max = en.max_value();
        tracing::trace!(name = %en.decl.scoped, "enum");

        let mut w = self.open_file();
        w.line(format!("public enum {name} implements java.io.Serializable"));
        w.open();
        let count = en.enumerators.len();
        for (i, enumerator) in en.enumerators.iter().enumerate() {
            let terminator = if i + 1 == count { ";" } else { "," };
            w.line(format!(
                "{}({}){terminator}",
                fix_kwd(&enumerator.name),
                enumerator.value
            ));
        }

        w.blank();
        w.block("public int value()");
        w.line("return _value;");
        w.close();

        w.blank();
        w.block(format!("public static {name} valueOf(int v)"));
        w.block("switch(v)");
        for enumerator in &en.enumerators {
            w.line(format!("case {}:", enumerator.value));
            w.indent();
            w.line(format!("return {};", fix_kwd(&enumerator.name)));
            w.dedent();
        }
        w.close();
        w.line("return null;");
        w.close();

        w.blank();
        w.block(format!("private {name}(int v)"));
        w.line("_value = v;");
        w.close();

        w.blank();
        w.block("public void ice_write(com.zeroc.Ice.OutputStream ostr)");
        w.line(format!("ostr.writeEnum(_value, {max});"));
        w.close();

        w.blank();
        w.block(format!(
            "public static void ice_write(com.zeroc.Ice.OutputStream ostr, {name} v)"
        ));
        w.block("if(v == null)");
        let first = en
            .enumerators
            .first()
            .map(|e| e.value)
            .unwrap_or_default();
        w.line(format!("ostr.writeEnum({first}, {max});"));
        w.close();
        w.line("else");
        w.open();
        w.line(format!("ostr.writeEnum(v.value(), {max});"));
        w.close();
        w.close();

        w.blank();
        w.block(format!(
            "public static {name} ice_read(com.zeroc.Ice.InputStream istr)"
        ));
        w.line(format!("int v = istr.readEnum({max});"));
        w.line("return validate(v);");
        w.close();

        self.write_optional_overloads(&mut w, Type::Enum(id), &name, "ice_write", "ice_read");

        w.blank();
        w.block(format!("private static {name} validate(int v)"));
        w.line(format!("final {name} e = valueOf(v);"));
        w.block("if(e == null)");
        w.line(
            "throw new com.zeroc.Ice.MarshalException(\"enumerator value \" + v + \" is out of range\");",
        );
        w.close();
        w.line("return e;");
        w.close();

        w.blank();
        w.line("private final int _value;");
        w.close();
        self.add_file(&name, w);
    }

    pub(super) fn emit_const(&mut self, id: ConstId) {
        let unit = self.unit;
        let constant = unit.constant(id);
        let name = fix_kwd(&constant.decl.name);
        tracing::trace!(name = %constant.decl.scoped, "const");

        let mut w = self.open_file();
        w.line(format!("public interface {name}"));
        w.open();
        w.line(format!(
            "{} value = {};",
            self.type_string(constant.ty, &constant.decl.metadata),
            self.literal(constant.ty, &constant.value)
        ));
        w.close();
        self.add_file(&name, w);
    }
}
