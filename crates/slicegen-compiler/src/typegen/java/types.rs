//! Java type mapping.

use slicegen_core::layout::{OptionalFormat, optional_format};
use slicegen_core::{
    Builtin, Definition, DictionaryId, FormatType, Metadata, Mode, SequenceId, Type,
};

use super::Emitter;

/// How a sequence maps to Java.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum SeqMapping {
    /// `E[]`
    Array,
    /// `java:type:<instance>[:<formal>]`
    Custom { instance: String, formal: String },
    /// `java:buffer` over a primitive element, e.g. `java.nio.IntBuffer`.
    Buffer(&'static str),
}

/// Stream method stem for builtins with dedicated stream calls (`writeInt`, `readIntSeq`).
pub(super) fn stream_stem(b: Builtin) -> Option<&'static str> {
    Some(match b {
        Builtin::Bool => "Bool",
        Builtin::Byte => "Byte",
        Builtin::Short => "Short",
        Builtin::Int => "Int",
        Builtin::Long => "Long",
        Builtin::Float => "Float",
        Builtin::Double => "Double",
        Builtin::String => "String",
        _ => return None,
    })
}

fn buffer_stem(b: Builtin) -> Option<&'static str> {
    match b {
        Builtin::Bool | Builtin::String => None,
        other if other.is_primitive() => stream_stem(other),
        _ => None,
    }
}

fn builtin_type(b: Builtin) -> &'static str {
    match b {
        Builtin::Bool => "boolean",
        Builtin::Byte => "byte",
        Builtin::Short => "short",
        Builtin::Int => "int",
        Builtin::Long => "long",
        Builtin::Float => "float",
        Builtin::Double => "double",
        Builtin::String => "String",
        Builtin::Object | Builtin::Value => "com.zeroc.Ice.Value",
        Builtin::ObjectProxy => "com.zeroc.Ice.ObjectPrx",
    }
}

fn boxed_builtin(b: Builtin) -> &'static str {
    match b {
        Builtin::Bool => "java.lang.Boolean",
        Builtin::Byte => "java.lang.Byte",
        Builtin::Short => "java.lang.Short",
        Builtin::Int => "java.lang.Integer",
        Builtin::Long => "java.lang.Long",
        Builtin::Float => "java.lang.Float",
        Builtin::Double => "java.lang.Double",
        other => builtin_type(other),
    }
}

pub(super) fn mode_expr(mode: Mode) -> &'static str {
    match mode {
        Mode::Normal => "com.zeroc.Ice.OperationMode.Normal",
        Mode::Nonmutating => "com.zeroc.Ice.OperationMode.Nonmutating",
        Mode::Idempotent => "com.zeroc.Ice.OperationMode.Idempotent",
    }
}

/// `null` when the communicator default applies.
pub(super) fn format_expr(format: FormatType) -> &'static str {
    match format {
        FormatType::Default => "null",
        FormatType::Compact => "com.zeroc.Ice.FormatType.CompactFormat",
        FormatType::Sliced => "com.zeroc.Ice.FormatType.SlicedFormat",
    }
}

pub(super) fn optional_format_expr(format: OptionalFormat) -> String {
    format!("com.zeroc.Ice.OptionalFormat.{}", format.name())
}

impl Emitter<'_> {
    pub(super) fn seq_mapping(&self, id: SequenceId, local: &Metadata) -> SeqMapping {
        let seq = self.unit.sequence(id);
        let none = Metadata::default();
        for meta in [local, &seq.decl.metadata] {
            if meta.has("java:buffer")
                && let Some(stem) = seq.element.builtin().and_then(buffer_stem)
            {
                return SeqMapping::Buffer(stem);
            }
            if let Some(custom) = meta.find("java:type:") {
                let (instance, formal) = match custom.split_once(':') {
                    Some((instance, formal)) => (instance.to_string(), formal.to_string()),
                    None => (
                        custom.to_string(),
                        format!("java.util.List<{}>", self.boxed_type(seq.element, &none)),
                    ),
                };
                return SeqMapping::Custom { instance, formal };
            }
        }
        SeqMapping::Array
    }

    /// `(instance, formal)` of a dictionary; the instance defaults to `java.util.HashMap`.
    pub(super) fn dict_mapping(&self, id: DictionaryId, local: &Metadata) -> (String, String) {
        let dict = self.unit.dictionary(id);
        let none = Metadata::default();
        let default_formal = format!(
            "java.util.Map<{}, {}>",
            self.boxed_type(dict.key, &none),
            self.boxed_type(dict.value, &none)
        );
        let custom = local
            .find("java:type:")
            .or_else(|| dict.decl.metadata.find("java:type:"));
        match custom {
            Some(custom) => match custom.split_once(':') {
                Some((instance, formal)) => (instance.to_string(), formal.to_string()),
                None => (custom.to_string(), default_formal),
            },
            None => ("java.util.HashMap".to_string(), default_formal),
        }
    }

    /// Whether `meta` changes the Java mapping of `ty` compared to its declaration.
    pub(super) fn has_local_mapping(&self, ty: Type, meta: &Metadata) -> bool {
        let none = Metadata::default();
        match ty {
            Type::Sequence(id) => self.seq_mapping(id, meta) != self.seq_mapping(id, &none),
            Type::Dictionary(id) => self.dict_mapping(id, meta) != self.dict_mapping(id, &none),
            _ => false,
        }
    }

    /// Java type of a value of `ty`, honoring `java:type`/`java:buffer` in `meta`.
    pub(super) fn type_string(&self, ty: Type, meta: &Metadata) -> String {
        let none = Metadata::default();
        match ty {
            Type::Builtin(b) => builtin_type(b).to_string(),
            Type::Struct(id) => self.abs(&self.unit.structure(id).decl),
            Type::Enum(id) => self.abs(&self.unit.enumeration(id).decl),
            Type::Class(id) => {
                let class = self.unit.class(id);
                if class.is_interface {
                    builtin_type(Builtin::Value).to_string()
                } else {
                    self.abs(&class.decl)
                }
            }
            Type::Proxy(id) => self.abs_affixed(&self.unit.class(id).decl, "", "Prx"),
            Type::Sequence(id) => match self.seq_mapping(id, meta) {
                SeqMapping::Array => {
                    format!("{}[]", self.type_string(self.unit.sequence(id).element, &none))
                }
                SeqMapping::Custom { formal, .. } => formal,
                SeqMapping::Buffer(stem) => format!("java.nio.{stem}Buffer"),
            },
            Type::Dictionary(id) => self.dict_mapping(id, meta).1,
        }
    }

    pub(super) fn boxed_type(&self, ty: Type, meta: &Metadata) -> String {
        match ty {
            Type::Builtin(b) => boxed_builtin(b).to_string(),
            other => self.type_string(other, meta),
        }
    }

    /// Java type of an optional channel (`java.util.OptionalInt`, `java.util.Optional<T>`).
    pub(super) fn optional_type(&self, ty: Type) -> String {
        match ty {
            Type::Builtin(Builtin::Int) => "java.util.OptionalInt".to_string(),
            Type::Builtin(Builtin::Long) => "java.util.OptionalLong".to_string(),
            Type::Builtin(Builtin::Double) => "java.util.OptionalDouble".to_string(),
            other => format!(
                "java.util.Optional<{}>",
                self.boxed_type(other, &Metadata::default())
            ),
        }
    }

    /// Factory wrapping a plain value into its optional type.
    pub(super) fn optional_factory(&self, ty: Type) -> &'static str {
        match ty {
            Type::Builtin(Builtin::Int) => "java.util.OptionalInt.of",
            Type::Builtin(Builtin::Long) => "java.util.OptionalLong.of",
            Type::Builtin(Builtin::Double) => "java.util.OptionalDouble.of",
            _ => "java.util.Optional.of",
        }
    }

    /// Unwrapping getter of the optional type (`getAsInt`, `get`).
    pub(super) fn optional_getter(&self, ty: Type) -> &'static str {
        match ty {
            Type::Builtin(Builtin::Int) => "getAsInt",
            Type::Builtin(Builtin::Long) => "getAsLong",
            Type::Builtin(Builtin::Double) => "getAsDouble",
            _ => "get",
        }
    }

    pub(super) fn optional_empty(&self, ty: Type) -> &'static str {
        match ty {
            Type::Builtin(Builtin::Int) => "java.util.OptionalInt.empty()",
            Type::Builtin(Builtin::Long) => "java.util.OptionalLong.empty()",
            Type::Builtin(Builtin::Double) => "java.util.OptionalDouble.empty()",
            _ => "java.util.Optional.empty()",
        }
    }

    /// Static type a patcher checks a decoded instance against.
    pub(super) fn value_class(&self, ty: Type) -> String {
        match ty {
            Type::Class(id) if !self.unit.class(id).is_interface => {
                self.abs(&self.unit.class(id).decl)
            }
            _ => builtin_type(Builtin::Value).to_string(),
        }
    }

    pub(super) fn optional_format_of(&self, ty: Type) -> OptionalFormat {
        optional_format(self.unit, ty)
    }

    /// Placeholder a skeleton returns for `ty`.
    pub(super) fn default_value(&self, ty: Type, optional: bool) -> String {
        if optional {
            return self.optional_empty(ty).to_string();
        }
        match ty {
            Type::Builtin(b) => match b {
                Builtin::Bool => "false".to_string(),
                Builtin::Byte => "(byte)0".to_string(),
                Builtin::Short => "(short)0".to_string(),
                Builtin::Int | Builtin::Long => "0".to_string(),
                Builtin::Float => "(float)0.0".to_string(),
                Builtin::Double => "0.0".to_string(),
                Builtin::String => "\"\"".to_string(),
                _ => "null".to_string(),
            },
            Type::Enum(id) => {
                let en = self.unit.enumeration(id);
                match en.enumerators.first() {
                    Some(first) => format!(
                        "{}.{}",
                        self.def_abs(Definition::Enum(id)),
                        super::names::fix_kwd(&first.name)
                    ),
                    None => "null".to_string(),
                }
            }
            _ => "null".to_string(),
        }
    }
}
