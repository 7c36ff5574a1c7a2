//! Typed proxies: `<T>Prx` and its `_<T>PrxI` implementation class.

use slicegen_core::layout::{catch_order, channels_use_classes, input_channels, output_channels};
use slicegen_core::{ClassId, Operation};

use super::Emitter;
use super::names::{escaped_param_name, fix_kwd};
use super::results::channel_metadata;
use super::types::{format_expr, mode_expr};
use super::writer::JavaWriter;

/// `ice_*` factory methods re-declared with the typed proxy as return type:
/// name, parameter list, forwarded arguments.
const TYPED_FACTORIES: [(&str, &str, &str); 22] = [
    ("ice_context", "java.util.Map<String, String> newContext", "newContext"),
    ("ice_adapterId", "String newAdapterId", "newAdapterId"),
    ("ice_endpoints", "com.zeroc.Ice.Endpoint[] newEndpoints", "newEndpoints"),
    ("ice_locatorCacheTimeout", "int newTimeout", "newTimeout"),
    ("ice_invocationTimeout", "int newTimeout", "newTimeout"),
    ("ice_connectionCached", "boolean newCache", "newCache"),
    (
        "ice_endpointSelection",
        "com.zeroc.Ice.EndpointSelectionType newType",
        "newType",
    ),
    ("ice_secure", "boolean b", "b"),
    (
        "ice_encodingVersion",
        "com.zeroc.Ice.EncodingVersion e",
        "e",
    ),
    ("ice_preferSecure", "boolean b", "b"),
    ("ice_router", "com.zeroc.Ice.RouterPrx router", "router"),
    ("ice_locator", "com.zeroc.Ice.LocatorPrx locator", "locator"),
    ("ice_collocationOptimized", "boolean b", "b"),
    ("ice_twoway", "", ""),
    ("ice_oneway", "", ""),
    ("ice_batchOneway", "", ""),
    ("ice_datagram", "", ""),
    ("ice_batchDatagram", "", ""),
    ("ice_compress", "boolean co", "co"),
    ("ice_timeout", "int t", "t"),
    ("ice_connectionId", "String connectionId", "connectionId"),
    ("ice_fixed", "com.zeroc.Ice.Connection connection", "connection"),
];

const NO_CONTEXT: &str = "com.zeroc.Ice.ObjectPrx.noExplicitContext";

impl Emitter<'_> {
    pub(super) fn emit_proxy(&mut self, id: ClassId) {
        let unit = self.unit;
        let class = unit.class(id);
        let prx = format!("{}Prx", class.decl.name);
        let prx_impl = format!("_{}PrxI", class.decl.name);
        tracing::trace!(name = %class.decl.scoped, "proxy");

        let bases: Vec<String> = class
            .bases()
            .filter(|&b| unit.class_has_proxy(b))
            .map(|b| self.abs_affixed(&unit.class(b).decl, "", "Prx"))
            .collect();
        let extends = if bases.is_empty() {
            "com.zeroc.Ice.ObjectPrx".to_string()
        } else {
            bases.join(", ")
        };

        let mut w = self.open_file();
        w.line(format!("public interface {prx} extends {extends}"));
        w.open();
        for op in &class.operations {
            self.write_proxy_operation(&mut w, op);
        }
        self.write_proxy_casts(&mut w, &prx, &prx_impl);
        for (name, params, args) in TYPED_FACTORIES {
            w.blank();
            w.line("@Override");
            w.block(format!("default {prx} {name}({params})"));
            w.line(format!("return ({prx})_{name}({args});"));
            w.close();
        }
        w.blank();
        w.block("static String ice_staticId()");
        w.line(format!("return \"{}\";", class.decl.scoped));
        w.close();
        w.close();
        self.add_file(&prx, w);

        let mut w = self.open_file();
        w.line(format!(
            "public class {prx_impl} extends com.zeroc.Ice._ObjectPrxI implements {prx}"
        ));
        w.open();
        w.line("public static final long serialVersionUID = 0L;");
        w.close();
        self.add_file(&prx_impl, w);
    }

    fn write_proxy_casts(&self, w: &mut JavaWriter, prx: &str, prx_impl: &str) {
        let classes = format!("{prx}.class, {prx_impl}.class");
        let checked = [
            ("", ""),
            (", java.util.Map<String, String> context", ", context"),
            (", String facet", ", facet"),
            (
                ", String facet, java.util.Map<String, String> context",
                ", facet, context",
            ),
        ];
        for (params, args) in checked {
            w.blank();
            w.block(format!(
                "static {prx} checkedCast(com.zeroc.Ice.ObjectPrx obj{params})"
            ));
            w.line(format!(
                "return com.zeroc.Ice.ObjectPrx._checkedCast(obj{args}, ice_staticId(), {classes});"
            ));
            w.close();
        }
        for (params, args) in [("", ""), (", String facet", ", facet")] {
            w.blank();
            w.block(format!(
                "static {prx} uncheckedCast(com.zeroc.Ice.ObjectPrx obj{params})"
            ));
            w.line(format!(
                "return com.zeroc.Ice.ObjectPrx._uncheckedCast(obj{args}, {classes});"
            ));
            w.close();
        }
    }

    /// `throws A, B` for the exceptions of `op`, most derived first.
    fn proxy_throws(&self, op: &Operation) -> String {
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

    /// Public parameter list; `optional` selects the `java.util.Optional` mapping for
    /// tagged parameters.
    fn proxy_params(&self, op: &Operation, optional: bool, internal: bool) -> Vec<String> {
        op.in_params()
            .map(|p| {
                let ty = if optional && p.is_optional() {
                    self.optional_type(p.ty)
                } else {
                    self.type_string(p.ty, &p.metadata)
                };
                let name = if internal {
                    format!("iceP_{}", p.name)
                } else {
                    fix_kwd(&p.name)
                };
                format!("{ty} {name}")
            })
            .collect()
    }

    fn write_proxy_operation(&self, w: &mut JavaWriter, op: &Operation) {
        let name = fix_kwd(&op.name);
        let ret = self.proxy_result_type(op, false);
        let future = format!(
            "java.util.concurrent.CompletableFuture<{}>",
            self.proxy_result_type(op, true)
        );
        let context = escaped_param_name(op, "context");
        let context_param = format!("java.util.Map<String, String> {context}");
        let args: Vec<String> = op.in_params().map(|p| fix_kwd(&p.name)).collect();
        let throws = self.proxy_throws(op);
        let returns = if op.returns_data() { "return " } else { "" };

        let mappings: &[bool] = if op.sends_optionals() {
            &[false, true]
        } else {
            &[false]
        };

        for &optional in mappings {
            let params = self.proxy_params(op, optional, false);

            w.blank();
            self.deprecated(w, op);
            w.block(format!("default {ret} {name}({}){throws}", params.join(", ")));
            w.line(format!(
                "{returns}{name}({});",
                join_args(&args, &[NO_CONTEXT])
            ));
            w.close();

            w.blank();
            self.deprecated(w, op);
            w.block(format!(
                "default {ret} {name}({}){throws}",
                join_args(&params, &[&context_param])
            ));
            let invoke = format!(
                "_iceI_{}Async({})",
                op.name,
                join_args(&args, &[&context, "true"])
            );
            if op.throws.is_empty() {
                w.line(format!("{returns}{invoke}.waitForResponse();"));
            } else {
                w.block("try");
                w.line(format!("{returns}{invoke}.waitForResponseOrUserEx();"));
                w.close();
                for e in catch_order(self.unit, &op.throws) {
                    w.block(format!(
                        "catch({} ex)",
                        self.abs(&self.unit.exception(e).decl)
                    ));
                    w.line("throw ex;");
                    w.close();
                }
                w.block("catch(com.zeroc.Ice.UserException ex)");
                w.line("throw new com.zeroc.Ice.UnknownUserException(ex.ice_id(), ex);");
                w.close();
            }
            w.close();
        }

        for &optional in mappings {
            let params = self.proxy_params(op, optional, false);

            w.blank();
            self.deprecated(w, op);
            w.block(format!(
                "default {future} {}Async({})",
                op.name,
                params.join(", ")
            ));
            w.line(format!(
                "return _iceI_{}Async({});",
                op.name,
                join_args(&args, &[NO_CONTEXT, "false"])
            ));
            w.close();

            w.blank();
            self.deprecated(w, op);
            w.block(format!(
                "default {future} {}Async({})",
                op.name,
                join_args(&params, &[&context_param])
            ));
            w.line(format!(
                "return _iceI_{}Async({});",
                op.name,
                join_args(&args, &[&context, "false"])
            ));
            w.close();

            self.write_proxy_invoke(w, op, optional);
        }

        if !op.throws.is_empty() {
            let classes: Vec<String> = catch_order(self.unit, &op.throws)
                .iter()
                .map(|&e| format!("{}.class", self.abs(&self.unit.exception(e).decl)))
                .collect();
            w.blank();
            w.line(format!("static final Class<?>[] _iceE_{} =", op.name));
            w.open();
            let count = classes.len();
            for (i, class) in classes.iter().enumerate() {
                let sep = if i + 1 == count { "" } else { "," };
                w.line(format!("{class}{sep}"));
            }
            w.close_with(";");
        }
    }

    fn deprecated(&self, w: &mut JavaWriter, op: &Operation) {
        if op.is_deprecated() {
            w.line("@Deprecated");
        }
    }

    /// `_iceI_<op>Async`: builds the outgoing invocation and its marshal callbacks.
    fn write_proxy_invoke(&self, w: &mut JavaWriter, op: &Operation, optional: bool) {
        let future_impl = format!(
            "com.zeroc.IceInternal.OutgoingAsync<{}>",
            self.proxy_result_type(op, true)
        );
        let params = self.proxy_params(op, optional, true);
        let exceptions = if op.throws.is_empty() {
            "null".to_string()
        } else {
            format!("_iceE_{}", op.name)
        };

        w.blank();
        w.block(format!(
            "default {future_impl} _iceI_{}Async({})",
            op.name,
            join_args(&params, &["java.util.Map<String, String> context", "boolean sync"])
        ));
        w.line(format!(
            "{future_impl} f = new com.zeroc.IceInternal.OutgoingAsync<>(this, \"{}\", {}, sync, {exceptions});",
            op.name,
            mode_expr(op.mode)
        ));

        let head = format!(
            "f.invoke({}, context, {}, ",
            op.returns_data(),
            format_expr(op.format)
        );
        let inputs = input_channels(op);
        let mut pending = head;
        if inputs.is_empty() {
            pending.push_str("null, ");
        } else {
            w.line(format!("{pending}ostr -> {{"));
            w.indent();
            for channel in &inputs {
                let v = format!("iceP_{}", channel.name);
                match channel.tag {
                    Some(tag) => self.write_tagged(w, "ostr", channel.ty, tag, &v),
                    None => self.write_value(w, "ostr", channel.ty, channel_metadata(op, channel), &v),
                }
            }
            if channels_use_classes(self.unit, &inputs) {
                w.line("ostr.writePendingValues();");
            }
            w.dedent();
            pending = "}, ".to_string();
        }
        if op.returns_data() {
            w.line(format!("{pending}istr -> {{"));
            w.indent();
            self.write_proxy_unmarshal(w, op);
            w.dedent();
            w.line("});");
        } else {
            w.line(format!("{pending}null);"));
        }
        w.line("return f;");
        w.close();
    }

    fn write_proxy_unmarshal(&self, w: &mut JavaWriter, op: &Operation) {
        let unit = self.unit;
        let outputs = output_channels(op);
        let pending = channels_use_classes(unit, &outputs);

        if op.returns_multiple_values() {
            let result = self.proxy_result_type(op, false);
            w.line(format!("{result} ret = new {result}();"));
            w.line("ret.read(istr);");
            if pending {
                w.line("istr.readPendingValues();");
            }
            w.line("return ret;");
            return;
        }

        let Some(channel) = outputs.first() else {
            return;
        };
        let meta = channel_metadata(op, channel);
        if unit.uses_reference_semantics(channel.ty) {
            w.line(format!(
                "final com.zeroc.IceInternal.Holder<{0}> ret = new com.zeroc.IceInternal.Holder<>();",
                self.value_class(channel.ty)
            ));
            let patcher = self.patcher(channel.ty, Some("value -> ret.value = value"));
            match channel.tag {
                Some(tag) => w.line(format!("istr.readValue({tag}, {patcher});")),
                None => w.line(format!("istr.readValue({patcher});")),
            }
            if pending {
                w.line("istr.readPendingValues();");
            }
            if channel.is_optional() {
                w.line("return java.util.Optional.ofNullable(ret.value);");
            } else {
                w.line("return ret.value;");
            }
            return;
        }

        let ty = self.proxy_result_type(op, false);
        match channel.tag {
            Some(tag) => {
                w.line(format!("{ty} ret;"));
                self.read_tagged(w, "istr", channel.ty, tag, "ret");
            }
            None => {
                if matches!(channel.ty, slicegen_core::Type::Struct(_)) {
                    w.line(format!("{ty} ret = null;"));
                } else {
                    w.line(format!("{ty} ret;"));
                }
                self.read_value(w, "istr", channel.ty, meta, "ret", None);
            }
        }
        if pending {
            w.line("istr.readPendingValues();");
        }
        w.line("return ret;");
    }
}

/// `args` followed by `extra`, comma separated.
pub(super) fn join_args(args: &[String], extra: &[&str]) -> String {
    args.iter()
        .map(String::as_str)
        .chain(extra.iter().copied())
        .collect::<Vec<_>>()
        .join(", ")
}
