//! `<T>I` servant skeletons returning placeholder results.

use slicegen_core::{ClassId, Operation};

use super::Emitter;
use super::names::escaped_param_name;
use super::results::{channel_field, declared_outputs};
use super::writer::JavaWriter;

impl Emitter<'_> {
    pub(super) fn emit_skeleton(&mut self, id: ClassId) {
        let unit = self.unit;
        let class = unit.class(id);
        let name = format!("{}I", class.decl.name);
        let servant = self.servant_type(id);
        tracing::trace!(name = %class.decl.scoped, "skeleton");

        let mut w = self.open_file();
        w.line(format!("public final class {name} implements {servant}"));
        w.open();
        w.block(format!("public {name}()"));
        w.close();

        for op in unit.all_operations(id) {
            let (ret, method) = self.servant_signature(op);
            w.blank();
            w.line("@Override");
            w.block(format!(
                "public {ret} {method}({}){}",
                self.servant_params(op).join(", "),
                self.servant_throws(op)
            ));
            self.write_skeleton_body(&mut w, op);
            w.close();
        }
        w.close();
        self.add_file(&name, w);
    }

    fn write_skeleton_body(&self, w: &mut JavaWriter, op: &Operation) {
        let amd = self.unit.is_amd(op);
        let outputs = declared_outputs(op);
        let result = self.result_type(op, false);

        if self.unit.has_marshaled_result(op) {
            let mut args: Vec<String> = outputs
                .iter()
                .map(|c| self.default_value(c.ty, c.is_optional()))
                .collect();
            args.push(escaped_param_name(op, "current"));
            w.line(format!("{result} r = new {result}({});", args.join(", ")));
        } else if op.returns_multiple_values() {
            w.line(format!("{result} r = new {result}();"));
            for channel in &outputs {
                w.line(format!(
                    "r.{} = {};",
                    channel_field(op, channel),
                    self.default_value(channel.ty, channel.is_optional())
                ));
            }
        } else if let Some(channel) = outputs.first() {
            w.line(format!(
                "{result} r = {};",
                self.default_value(channel.ty, channel.is_optional())
            ));
        } else {
            if amd {
                w.line(
                    "return java.util.concurrent.CompletableFuture.completedFuture((Void)null);",
                );
            }
            return;
        }

        if amd {
            w.line("return java.util.concurrent.CompletableFuture.completedFuture(r);");
        } else {
            w.line("return r;");
        }
    }
}
