//! `<Op>Result` and `<Op>MarshaledResult` carriers.

use slicegen_core::layout::{
    Channel, ChannelKind, RETURN_VALUE_NAME, channels_use_classes, output_channels,
};
use slicegen_core::utils::capitalize;
use slicegen_core::{ClassId, Metadata, Operation};

use super::Emitter;
use super::names::{escaped_param_name, fix_kwd};
use super::types::format_expr;
use super::writer::JavaWriter;

/// Metadata attached to the parameter or return value behind `channel`.
pub(super) fn channel_metadata<'o>(op: &'o Operation, channel: &Channel<'_>) -> &'o Metadata {
    static NONE: std::sync::OnceLock<Metadata> = std::sync::OnceLock::new();
    let none = NONE.get_or_init(Metadata::default);
    match channel.kind {
        ChannelKind::Param(i) => op.params.get(i).map_or(none, |p| &p.metadata),
        ChannelKind::Return => op.returns.as_ref().map_or(none, |r| &r.metadata),
    }
}

/// Java name of the return slot: `returnValue`, or `_returnValue` when an out-parameter
/// already uses that name.
pub(super) fn return_value_name(op: &Operation) -> String {
    if op.out_params().any(|p| p.name == RETURN_VALUE_NAME) {
        format!("_{RETURN_VALUE_NAME}")
    } else {
        RETURN_VALUE_NAME.to_string()
    }
}

/// Java name of a channel inside a result carrier.
pub(super) fn channel_field(op: &Operation, channel: &Channel<'_>) -> String {
    if channel.is_return() {
        return_value_name(op)
    } else {
        fix_kwd(channel.name)
    }
}

/// Constructor parameter of a marshaled result; the return value takes `returnValue_`
/// when any parameter is named `returnValue`.
fn marshaled_param(op: &Operation, channel: &Channel<'_>) -> String {
    if channel.is_return() {
        escaped_param_name(op, RETURN_VALUE_NAME)
    } else {
        fix_kwd(channel.name)
    }
}

/// Return value first, then out-parameters in declaration order.
pub(super) fn declared_outputs<'o>(op: &'o Operation) -> Vec<Channel<'o>> {
    let mut channels = output_channels(op);
    channels.sort_by_key(|c| match c.kind {
        ChannelKind::Return => 0,
        ChannelKind::Param(i) => i + 1,
    });
    channels
}

pub(super) fn result_class(op: &Operation) -> String {
    format!("{}Result", capitalize(&op.name))
}

pub(super) fn marshaled_result_class(op: &Operation) -> String {
    format!("{}MarshaledResult", capitalize(&op.name))
}

impl Emitter<'_> {
    /// Java type of one channel; optional channels use the `java.util.Optional` family.
    pub(super) fn channel_type(&self, op: &Operation, channel: &Channel<'_>) -> String {
        if channel.is_optional() {
            self.optional_type(channel.ty)
        } else {
            self.type_string(channel.ty, channel_metadata(op, channel))
        }
    }

    /// Qualified name of the carrier an operation returns, if it needs one.
    pub(super) fn carrier_name(&self, op: &Operation) -> Option<String> {
        let owner = self.unit.class(op.owner);
        if self.unit.has_marshaled_result(op) {
            let holder = if owner.is_interface {
                self.abs(&owner.decl)
            } else {
                self.abs_affixed(&owner.decl, "_", "Disp")
            };
            return Some(format!("{holder}.{}", marshaled_result_class(op)));
        }
        if op.returns_multiple_values() {
            return Some(format!("{}.{}", self.abs(&owner.decl), result_class(op)));
        }
        None
    }

    /// What a servant or proxy returns for `op`. `boxed` selects the form usable as a
    /// generic argument.
    pub(super) fn result_type(&self, op: &Operation, boxed: bool) -> String {
        if let Some(carrier) = self.carrier_name(op) {
            return carrier;
        }
        let Some(channel) = output_channels(op).into_iter().next() else {
            return if boxed { "java.lang.Void" } else { "void" }.to_string();
        };
        if channel.is_optional() {
            self.optional_type(channel.ty)
        } else if boxed {
            self.boxed_type(channel.ty, channel_metadata(op, &channel))
        } else {
            self.type_string(channel.ty, channel_metadata(op, &channel))
        }
    }

    /// Same as [`Self::result_type`] but ignoring `marshaled-result`, which only
    /// changes the servant side.
    pub(super) fn proxy_result_type(&self, op: &Operation, boxed: bool) -> String {
        if op.returns_multiple_values() {
            let owner = self.unit.class(op.owner);
            return format!("{}.{}", self.abs(&owner.decl), result_class(op));
        }
        let Some(channel) = output_channels(op).into_iter().next() else {
            return if boxed { "java.lang.Void" } else { "void" }.to_string();
        };
        if channel.is_optional() {
            self.optional_type(channel.ty)
        } else if boxed {
            self.boxed_type(channel.ty, channel_metadata(op, &channel))
        } else {
            self.type_string(channel.ty, channel_metadata(op, &channel))
        }
    }

    /// Nested `<Op>Result` classes for the operations `id` declares.
    pub(super) fn write_results(&self, w: &mut JavaWriter, id: ClassId, with_marshaled: bool) {
        let unit = self.unit;
        for op in &unit.class(id).operations {
            if op.returns_multiple_values() {
                self.write_result(w, op);
            }
            if with_marshaled && unit.has_marshaled_result(op) {
                self.write_marshaled_result(w, op);
            }
        }
    }

    fn write_result(&self, w: &mut JavaWriter, op: &Operation) {
        let class = result_class(op);
        let channels = declared_outputs(op);

        w.blank();
        w.block(format!("public static class {class}"));
        w.block(format!("public {class}()"));
        w.close();

        let full: Vec<String> = channels
            .iter()
            .map(|c| format!("{} {}", self.channel_type(op, c), channel_field(op, c)))
            .collect();
        w.blank();
        w.block(format!("public {class}({})", full.join(", ")));
        for channel in &channels {
            let field = channel_field(op, channel);
            w.line(format!("this.{field} = {field};"));
        }
        w.close();

        if channels.iter().any(|c| c.is_optional()) {
            let plain: Vec<String> = channels
                .iter()
                .map(|c| {
                    format!(
                        "{} {}",
                        self.type_string(c.ty, channel_metadata(op, c)),
                        channel_field(op, c)
                    )
                })
                .collect();
            w.blank();
            w.block(format!("public {class}({})", plain.join(", ")));
            for channel in &channels {
                let field = channel_field(op, channel);
                if channel.is_optional() {
                    w.line(format!(
                        "this.{field} = {}({field});",
                        self.optional_factory(channel.ty)
                    ));
                } else {
                    w.line(format!("this.{field} = {field};"));
                }
            }
            w.close();
        }

        for channel in &channels {
            w.blank();
            w.line(format!(
                "public {} {};",
                self.channel_type(op, channel),
                channel_field(op, channel)
            ));
        }

        w.blank();
        w.block("public void write(com.zeroc.Ice.OutputStream ostr)");
        for channel in output_channels(op) {
            let field = format!("this.{}", channel_field(op, &channel));
            match channel.tag {
                Some(tag) => self.write_tagged(w, "ostr", channel.ty, tag, &field),
                None => self.write_value(
                    w,
                    "ostr",
                    channel.ty,
                    channel_metadata(op, &channel),
                    &field,
                ),
            }
        }
        w.close();

        w.blank();
        w.block("public void read(com.zeroc.Ice.InputStream istr)");
        for channel in output_channels(op) {
            let field = format!("this.{}", channel_field(op, &channel));
            match channel.tag {
                Some(tag) => self.read_tagged(w, "istr", channel.ty, tag, &field),
                None => self.read_value(
                    w,
                    "istr",
                    channel.ty,
                    channel_metadata(op, &channel),
                    &field,
                    None,
                ),
            }
        }
        w.close();
        w.close();
    }

    pub(super) fn write_marshaled_result(&self, w: &mut JavaWriter, op: &Operation) {
        let class = marshaled_result_class(op);
        let channels = declared_outputs(op);
        let current = escaped_param_name(op, "current");
        let ordered = output_channels(op);

        w.blank();
        w.block(format!(
            "public static class {class} implements com.zeroc.Ice.MarshaledResult"
        ));

        let mut params: Vec<String> = channels
            .iter()
            .map(|c| format!("{} {}", self.channel_type(op, c), marshaled_param(op, c)))
            .collect();
        params.push(format!("com.zeroc.Ice.Current {current}"));
        w.block(format!("public {class}({})", params.join(", ")));
        w.line(format!(
            "_ostr = com.zeroc.IceInternal.Incoming.createResponseOutputStream({current});"
        ));
        w.line(format!(
            "_ostr.startEncapsulation({current}.encoding, {});",
            format_expr(op.format)
        ));
        for channel in &ordered {
            let field = marshaled_param(op, channel);
            match channel.tag {
                Some(tag) => self.write_tagged(w, "_ostr", channel.ty, tag, &field),
                None => self.write_value(
                    w,
                    "_ostr",
                    channel.ty,
                    channel_metadata(op, channel),
                    &field,
                ),
            }
        }
        if channels_use_classes(self.unit, &ordered) {
            w.line("_ostr.writePendingValues();");
        }
        w.line("_ostr.endEncapsulation();");
        w.close();

        if channels.iter().any(|c| c.is_optional()) {
            let mut plain: Vec<String> = channels
                .iter()
                .map(|c| {
                    format!(
                        "{} {}",
                        self.type_string(c.ty, channel_metadata(op, c)),
                        marshaled_param(op, c)
                    )
                })
                .collect();
            plain.push(format!("com.zeroc.Ice.Current {current}"));
            let mut args: Vec<String> = channels
                .iter()
                .map(|c| {
                    let field = marshaled_param(op, c);
                    if c.is_optional() {
                        format!("{}({field})", self.optional_factory(c.ty))
                    } else {
                        field
                    }
                })
                .collect();
            args.push(current.clone());
            w.blank();
            w.block(format!("public {class}({})", plain.join(", ")));
            w.line(format!("this({});", args.join(", ")));
            w.close();
        }

        w.blank();
        w.line("@Override");
        w.block("public com.zeroc.Ice.OutputStream getOutputStream()");
        w.line("return _ostr;");
        w.close();

        w.blank();
        w.line("private com.zeroc.Ice.OutputStream _ostr;");
        w.close();
    }
}
