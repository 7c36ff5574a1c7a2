//! Servant side: interface files, `_<C>Disp` for classes with operations, and the
//! per-operation dispatch thunks.

use slicegen_core::layout::{
    Channel, DispatchTarget, catch_order, channels_use_classes, dispatch_table, input_channels,
    operation_attributes, output_channels, type_ids,
};
use slicegen_core::{ClassId, FormatType, Operation, Type};

use super::Emitter;
use super::names::{escaped_param_name, fix_kwd};
use super::proxy::join_args;
use super::results::channel_metadata;
use super::types::{format_expr, mode_expr};
use super::writer::JavaWriter;
use crate::diagnostics::DiagnosticKind;

const DISPATCH_RESULT: &str = "java.util.concurrent.CompletionStage<com.zeroc.Ice.OutputStream>";

impl Emitter<'_> {
    pub(super) fn emit_interface(&mut self, id: ClassId) {
        let unit = self.unit;
        let class = unit.class(id);
        let name = fix_kwd(&class.decl.name);
        tracing::trace!(name = %class.decl.scoped, "interface");

        let bases: Vec<String> = class
            .interfaces
            .iter()
            .map(|&b| self.abs(&unit.class(b).decl))
            .collect();
        let extends = if bases.is_empty() {
            "com.zeroc.Ice.Object".to_string()
        } else {
            bases.join(", ")
        };

        let mut w = self.open_file();
        w.line(format!("public interface {name} extends {extends}"));
        w.open();
        self.write_results(&mut w, id, true);
        self.write_dispatch(&mut w, id);
        w.close();
        self.add_file(&name, w);
    }

    /// `_<C>Disp`: servant interface of a class that carries operations.
    pub(super) fn emit_class_dispatch(&mut self, id: ClassId) {
        let unit = self.unit;
        let class = unit.class(id);
        let disp = format!("_{}Disp", class.decl.name);
        tracing::trace!(name = %class.decl.scoped, "class dispatch");

        let mut bases = Vec::new();
        if let Some(base) = class.base.filter(|&b| !unit.all_operations(b).is_empty()) {
            bases.push(self.abs_affixed(&unit.class(base).decl, "_", "Disp"));
        }
        for &iface in &class.interfaces {
            bases.push(self.abs(&unit.class(iface).decl));
        }
        let extends = if bases.is_empty() {
            "com.zeroc.Ice.Object".to_string()
        } else {
            bases.join(", ")
        };

        let mut w = self.open_file();
        w.line(format!("public interface {disp} extends {extends}"));
        w.open();
        self.write_dispatch(&mut w, id);
        w.close();
        self.add_file(&disp, w);
    }

    /// Java type holding the servant methods of `id`.
    pub(super) fn servant_type(&self, id: ClassId) -> String {
        let class = self.unit.class(id);
        if class.is_interface {
            self.abs(&class.decl)
        } else {
            self.abs_affixed(&class.decl, "_", "Disp")
        }
    }

    /// Servant parameter list, tagged parameters typed with the optional mapping.
    pub(super) fn servant_params(&self, op: &Operation) -> Vec<String> {
        let current = escaped_param_name(op, "current");
        op.in_params()
            .map(|p| {
                let ty = if p.is_optional() {
                    self.optional_type(p.ty)
                } else {
                    self.type_string(p.ty, &p.metadata)
                };
                format!("{ty} {}", fix_kwd(&p.name))
            })
            .chain(std::iter::once(format!("com.zeroc.Ice.Current {current}")))
            .collect()
    }

    /// Return type and method name of the servant method for `op`.
    pub(super) fn servant_signature(&self, op: &Operation) -> (String, String) {
        if self.unit.is_amd(op) {
            (
                format!(
                    "java.util.concurrent.CompletionStage<{}>",
                    self.result_type(op, true)
                ),
                format!("{}Async", op.name),
            )
        } else {
            (self.result_type(op, false), fix_kwd(&op.name))
        }
    }

    /// ` throws ...` for a servant method; empty for asynchronous dispatch.
    pub(super) fn servant_throws(&self, op: &Operation) -> String {
        if self.unit.is_amd(op) {
            return String::new();
        }
        if op.metadata.has("java:UserException") {
            return " throws com.zeroc.Ice.UserException".to_string();
        }
        let throws = catch_order(self.unit, &op.throws);
        if throws.is_empty() {
            return String::new();
        }
        let names: Vec<String> = throws
            .iter()
            .map(|&e| self.abs(&self.unit.exception(e).decl))
            .collect();
        format!(" throws {}", names.join(", "))
    }

    fn write_dispatch(&mut self, w: &mut JavaWriter, id: ClassId) {
        let unit = self.unit;
        let class = unit.class(id);
        let servant = self.servant_type(id);

        for op in &class.operations {
            if !class.is_interface && unit.has_marshaled_result(op) {
                self.write_marshaled_result(w, op);
            }
            let (ret, method) = self.servant_signature(op);
            w.blank();
            if op.is_deprecated() {
                w.line("@Deprecated");
            }
            w.line(format!(
                "{ret} {method}({}){};",
                self.servant_params(op).join(", "),
                self.servant_throws(op)
            ));
        }

        let ids = type_ids(unit, id);
        w.blank();
        w.line("static final String[] _iceIds =");
        w.open();
        write_list(w, ids.iter().map(|id| format!("\"{id}\"")));
        w.close_with(";");

        w.blank();
        w.line("@Override");
        w.block("default String[] ice_ids(com.zeroc.Ice.Current current)");
        w.line("return _iceIds;");
        w.close();

        w.blank();
        w.line("@Override");
        w.block("default String ice_id(com.zeroc.Ice.Current current)");
        w.line("return ice_staticId();");
        w.close();

        w.blank();
        w.block("static String ice_staticId()");
        if class.is_interface {
            w.line(format!("return \"{}\";", class.decl.scoped));
        } else {
            w.line(format!("return {}.ice_staticId();", self.abs(&class.decl)));
        }
        w.close();

        for op in &class.operations {
            self.write_dispatch_thunk(w, op, &servant);
        }

        let all = unit.all_operations(id);
        if all.is_empty() {
            return;
        }

        let table = dispatch_table(unit, id);
        w.blank();
        w.line("final static String[] _iceOps =");
        w.open();
        write_list(w, table.iter().map(|e| format!("\"{}\"", e.name)));
        w.close_with(";");

        w.blank();
        if all.iter().any(|op| op.is_deprecated()) {
            w.line("@SuppressWarnings(\"deprecation\")");
        }
        w.line("@Override");
        w.block(format!(
            "default {DISPATCH_RESULT} _iceDispatch(com.zeroc.IceInternal.Incoming in, com.zeroc.Ice.Current current) throws com.zeroc.Ice.UserException"
        ));
        w.line("int pos = java.util.Arrays.binarySearch(_iceOps, current.operation);");
        w.block("if(pos < 0)");
        w.line(
            "throw new com.zeroc.Ice.OperationNotExistException(current.id, current.facet, current.operation);",
        );
        w.close();
        w.blank();
        w.block("switch(pos)");
        for (i, entry) in table.iter().enumerate() {
            w.line(format!("case {i}:"));
            w.open();
            let call = match entry.target {
                DispatchTarget::Introspection => {
                    format!("com.zeroc.Ice.Object._iceD_{}(this, in, current)", entry.name)
                }
                DispatchTarget::Operation(owner) if owner == id => {
                    format!("_iceD_{}(this, in, current)", entry.name)
                }
                DispatchTarget::Operation(owner) => format!(
                    "{}._iceD_{}(this, in, current)",
                    self.servant_type(owner),
                    entry.name
                ),
            };
            w.line(format!("return {call};"));
            w.close();
        }
        w.close();
        w.blank();
        w.line("assert(false);");
        w.line(
            "throw new com.zeroc.Ice.OperationNotExistException(current.id, current.facet, current.operation);",
        );
        w.close();

        self.write_operation_attributes(w, id, &table);
    }

    fn write_operation_attributes(
        &mut self,
        w: &mut JavaWriter,
        id: ClassId,
        table: &[slicegen_core::layout::DispatchEntry],
    ) {
        let unit = self.unit;
        let all = unit.all_operations(id);
        let mut attributes = Vec::with_capacity(table.len());
        for entry in table {
            let op = match entry.target {
                DispatchTarget::Introspection => None,
                DispatchTarget::Operation(_) => all.iter().find(|op| op.name == entry.name),
            };
            let value = match op {
                None => 0,
                Some(op) => match operation_attributes(unit, op) {
                    Ok(value) => value,
                    Err(err) => {
                        if op.owner == id {
                            self.diagnostics
                                .report(DiagnosticKind::InvalidFreezeMetadata, op.location.clone())
                                .message(err.to_string())
                                .emit();
                        }
                        0
                    }
                },
            };
            attributes.push(value);
        }
        if attributes.iter().all(|&a| a == 0) {
            return;
        }

        w.blank();
        w.line("static final int[] _iceOperationAttributes =");
        w.open();
        let count = table.len();
        for (i, (entry, value)) in table.iter().zip(&attributes).enumerate() {
            let sep = if i + 1 == count { "" } else { "," };
            w.line(format!("{value}{sep} // {}", entry.name));
        }
        w.close_with(";");

        w.blank();
        w.line("@Override");
        w.block("default int ice_operationAttributes(String operation)");
        w.line("int pos = java.util.Arrays.binarySearch(_iceOps, operation);");
        w.block("if(pos < 0)");
        w.line("return -1;");
        w.close();
        w.blank();
        w.line("return _iceOperationAttributes[pos];");
        w.close();
    }

    /// `_iceD_<op>`: unmarshal arguments, call the servant, marshal the outcome.
    fn write_dispatch_thunk(&self, w: &mut JavaWriter, op: &Operation, servant: &str) {
        let unit = self.unit;
        let amd = unit.is_amd(op);
        let throws = if !amd && (!op.throws.is_empty() || op.metadata.has("java:UserException"))
        {
            " throws com.zeroc.Ice.UserException"
        } else {
            ""
        };

        w.blank();
        if op.is_deprecated() {
            w.line("@Deprecated");
        }
        w.block(format!(
            "static {DISPATCH_RESULT} _iceD_{}({servant} obj, final com.zeroc.IceInternal.Incoming inS, com.zeroc.Ice.Current current){throws}",
            op.name
        ));
        w.line(format!(
            "com.zeroc.Ice.Object._iceCheckMode({}, current.mode);",
            mode_expr(op.mode)
        ));

        let inputs = input_channels(op);
        if inputs.is_empty() {
            w.line("inS.readEmptyParams();");
        } else {
            self.write_dispatch_params(w, op, &inputs);
        }
        if op.format != FormatType::Default {
            w.line(format!("inS.setFormat({});", format_expr(op.format)));
        }

        let mut args: Vec<String> = op.in_params().map(|p| format!("iceP_{}", p.name)).collect();
        args.push("current".to_string());
        let args = join_args(&args, &[]);
        let outputs = output_channels(op);

        if amd {
            let call = format!("obj.{}Async({args})", op.name);
            if unit.has_marshaled_result(op) {
                w.line(format!("return inS.setMarshaledResultFuture({call});"));
            } else if op.returns_data() {
                w.line(format!("return inS.setResultFuture({call}, (ostr, ret) ->"));
                w.open();
                self.write_dispatch_results(w, op, &outputs);
                w.close_with(");");
            } else {
                w.line(format!("return inS.setResultFuture({call});"));
            }
        } else {
            let call = format!("obj.{}({args})", fix_kwd(&op.name));
            if unit.has_marshaled_result(op) {
                w.line(format!("return inS.setMarshaledResult({call});"));
            } else if op.returns_data() {
                w.line(format!("{} ret = {call};", self.result_type(op, false)));
                w.line("com.zeroc.Ice.OutputStream ostr = inS.startWriteParams();");
                self.write_dispatch_results(w, op, &outputs);
                w.line("inS.endWriteParams(ostr);");
                w.line("return inS.setResult(ostr);");
            } else {
                w.line(format!("{call};"));
                w.line("return inS.setResult(inS.writeEmptyParams());");
            }
        }
        w.close();
    }

    fn write_dispatch_params(&self, w: &mut JavaWriter, op: &Operation, inputs: &[Channel<'_>]) {
        let unit = self.unit;
        w.line("com.zeroc.Ice.InputStream istr = inS.startReadParams();");
        for p in op.in_params() {
            if unit.uses_reference_semantics(p.ty) {
                w.line(format!(
                    "final com.zeroc.IceInternal.Holder<{}> icePP_{} = new com.zeroc.IceInternal.Holder<>();",
                    self.value_class(p.ty),
                    p.name
                ));
            } else if p.is_optional() {
                w.line(format!("{} iceP_{};", self.optional_type(p.ty), p.name));
            } else if matches!(p.ty, Type::Struct(_)) {
                w.line(format!(
                    "{} iceP_{} = null;",
                    self.type_string(p.ty, &p.metadata),
                    p.name
                ));
            } else {
                w.line(format!("{} iceP_{};", self.type_string(p.ty, &p.metadata), p.name));
            }
        }
        for channel in inputs {
            let meta = channel_metadata(op, channel);
            if unit.uses_reference_semantics(channel.ty) {
                let patcher = self.patcher(
                    channel.ty,
                    Some(&format!("value -> icePP_{}.value = value", channel.name)),
                );
                match channel.tag {
                    Some(tag) => w.line(format!("istr.readValue({tag}, {patcher});")),
                    None => w.line(format!("istr.readValue({patcher});")),
                }
                continue;
            }
            let lvalue = format!("iceP_{}", channel.name);
            match channel.tag {
                Some(tag) => self.read_tagged(w, "istr", channel.ty, tag, &lvalue),
                None => self.read_value(w, "istr", channel.ty, meta, &lvalue, None),
            }
        }
        if channels_use_classes(unit, inputs) {
            w.line("istr.readPendingValues();");
        }
        w.line("inS.endReadParams();");
        for p in op.in_params().filter(|p| unit.uses_reference_semantics(p.ty)) {
            if p.is_optional() {
                w.line(format!(
                    "{} iceP_{1} = java.util.Optional.ofNullable(icePP_{1}.value);",
                    self.optional_type(p.ty),
                    p.name
                ));
            } else {
                w.line(format!(
                    "{} iceP_{1} = icePP_{1}.value;",
                    self.type_string(p.ty, &p.metadata),
                    p.name
                ));
            }
        }
    }

    /// Marshal `ret` into `ostr`: a result carrier writes itself, a single value is
    /// written directly.
    fn write_dispatch_results(&self, w: &mut JavaWriter, op: &Operation, outputs: &[Channel<'_>]) {
        if op.returns_multiple_values() {
            w.line("ret.write(ostr);");
        } else if let Some(channel) = outputs.first() {
            match channel.tag {
                Some(tag) => self.write_tagged(w, "ostr", channel.ty, tag, "ret"),
                None => self.write_value(w, "ostr", channel.ty, channel_metadata(op, channel), "ret"),
            }
        }
        if channels_use_classes(self.unit, outputs) {
            w.line("ostr.writePendingValues();");
        }
    }
}

/// One entry per line, comma separated.
fn write_list(w: &mut JavaWriter, items: impl ExactSizeIterator<Item = String>) {
    let count = items.len();
    for (i, item) in items.enumerate() {
        let sep = if i + 1 == count { "" } else { "," };
        w.line(format!("{item}{sep}"));
    }
}
