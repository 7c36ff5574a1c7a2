//! Resolved type model.
//!
//! Every definition lives in a per-kind arena on [`Unit`] and is addressed by a typed id.
//! Cross references (`Type`, bases, `throws`) are ids, never names.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

macro_rules! define_id {
    ($($(#[$attr:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$attr])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
            pub struct $name(pub(crate) u32);

            impl $name {
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

define_id!(
    /// Index into `Unit::modules`.
    ModuleId,
    StructId,
    ClassId,
    ExceptionId,
    EnumId,
    SequenceId,
    DictionaryId,
    ConstId,
);

// ============================================================================
// Common Types
// ============================================================================

/// Source position of a definition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub file: String,
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Metadata directives attached to a definition (`["amd", "java:getset"]`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata(Vec<String>);

impl Metadata {
    pub fn new(items: Vec<String>) -> Self {
        Self(items)
    }

    pub fn has(&self, directive: &str) -> bool {
        self.0.iter().any(|m| m == directive)
    }

    /// Returns the remainder of the first directive starting with `prefix`.
    pub fn find(&self, prefix: &str) -> Option<&str> {
        self.0.iter().find_map(|m| m.strip_prefix(prefix))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Name, scope and metadata shared by every definition.
#[derive(Debug, Clone)]
pub struct Decl {
    pub name: String,
    /// Absolute scoped name, e.g. `::Demo::Hello`.
    pub scoped: String,
    pub module: ModuleId,
    pub metadata: Metadata,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Normal,
    Nonmutating,
    Idempotent,
}

/// Class encoding format requested for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    #[default]
    Default,
    Compact,
    Sliced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Object,
    ObjectProxy,
    Value,
}

impl Builtin {
    pub fn from_keyword(s: &str) -> Option<Self> {
        Some(match s {
            "bool" => Builtin::Bool,
            "byte" => Builtin::Byte,
            "short" => Builtin::Short,
            "int" => Builtin::Int,
            "long" => Builtin::Long,
            "float" => Builtin::Float,
            "double" => Builtin::Double,
            "string" => Builtin::String,
            "Object" => Builtin::Object,
            "Object*" => Builtin::ObjectProxy,
            "Value" => Builtin::Value,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Builtin::Bool => "bool",
            Builtin::Byte => "byte",
            Builtin::Short => "short",
            Builtin::Int => "int",
            Builtin::Long => "long",
            Builtin::Float => "float",
            Builtin::Double => "double",
            Builtin::String => "string",
            Builtin::Object => "Object",
            Builtin::ObjectProxy => "Object*",
            Builtin::Value => "Value",
        }
    }

    /// Fixed-width numeric or boolean kinds.
    pub fn is_primitive(self) -> bool {
        !matches!(
            self,
            Builtin::String | Builtin::Object | Builtin::ObjectProxy | Builtin::Value
        )
    }

    pub fn is_value(self) -> bool {
        matches!(self, Builtin::Object | Builtin::Value)
    }
}

/// A resolved type reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Builtin(Builtin),
    Struct(StructId),
    /// Class or interface passed by value.
    Class(ClassId),
    /// Proxy to a class or interface (`T*`).
    Proxy(ClassId),
    Enum(EnumId),
    Sequence(SequenceId),
    Dictionary(DictionaryId),
}

impl Type {
    pub fn builtin(self) -> Option<Builtin> {
        match self {
            Type::Builtin(b) => Some(b),
            _ => None,
        }
    }
}

/// Literal text or a reference to a constant or enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstValue {
    Literal(String),
    Const(ConstId),
    /// Enum and enumerator index.
    Enumerator(EnumId, usize),
}

#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub ty: Type,
    pub tag: Option<i32>,
    pub default: Option<ConstValue>,
    pub metadata: Metadata,
    pub location: Location,
}

impl Member {
    pub fn is_optional(&self) -> bool {
        self.tag.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    pub out: bool,
    pub tag: Option<i32>,
    pub metadata: Metadata,
}

impl Param {
    pub fn is_optional(&self) -> bool {
        self.tag.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ReturnValue {
    pub ty: Type,
    pub tag: Option<i32>,
    pub metadata: Metadata,
}

impl ReturnValue {
    pub fn is_optional(&self) -> bool {
        self.tag.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub owner: ClassId,
    pub params: Vec<Param>,
    pub returns: Option<ReturnValue>,
    pub mode: Mode,
    pub format: FormatType,
    pub throws: Vec<ExceptionId>,
    pub metadata: Metadata,
    pub location: Location,
}

impl Operation {
    pub fn in_params(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(|p| !p.out)
    }

    pub fn out_params(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(|p| p.out)
    }

    pub fn sends_optionals(&self) -> bool {
        self.in_params().any(Param::is_optional)
    }

    pub fn returns_data(&self) -> bool {
        self.returns.is_some() || self.out_params().next().is_some()
    }

    /// More than one output channel: needs a result aggregate.
    pub fn returns_multiple_values(&self) -> bool {
        let outs = self.out_params().count() + usize::from(self.returns.is_some());
        outs > 1
    }

    pub fn is_deprecated(&self) -> bool {
        self.metadata.has("deprecate") || self.metadata.find("deprecate:").is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Struct {
    pub decl: Decl,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone)]
pub struct Class {
    pub decl: Decl,
    pub is_interface: bool,
    /// Non-interface base class.
    pub base: Option<ClassId>,
    /// Interface bases.
    pub interfaces: Vec<ClassId>,
    pub members: Vec<Member>,
    pub operations: Vec<Operation>,
    pub compact_id: Option<i32>,
}

impl Class {
    /// Base class followed by interface bases.
    pub fn bases(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.base.into_iter().chain(self.interfaces.iter().copied())
    }
}

#[derive(Debug, Clone)]
pub struct Exception {
    pub decl: Decl,
    pub base: Option<ExceptionId>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone)]
pub struct Enumerator {
    pub name: String,
    pub value: i32,
}

#[derive(Debug, Clone)]
pub struct Enum {
    pub decl: Decl,
    pub enumerators: Vec<Enumerator>,
}

impl Enum {
    pub fn max_value(&self) -> i32 {
        self.enumerators.iter().map(|e| e.value).max().unwrap_or(0)
    }

    pub fn by_value(&self, value: i32) -> Option<&Enumerator> {
        self.enumerators.iter().find(|e| e.value == value)
    }
}

#[derive(Debug, Clone)]
pub struct Sequence {
    pub decl: Decl,
    pub element: Type,
}

#[derive(Debug, Clone)]
pub struct Dictionary {
    pub decl: Decl,
    pub key: Type,
    pub value: Type,
}

#[derive(Debug, Clone)]
pub struct Const {
    pub decl: Decl,
    pub ty: Type,
    pub value: ConstValue,
}

/// Any named definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Definition {
    Struct(StructId),
    Class(ClassId),
    Exception(ExceptionId),
    Enum(EnumId),
    Sequence(SequenceId),
    Dictionary(DictionaryId),
    Const(ConstId),
}

#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub scoped: String,
    pub parent: Option<ModuleId>,
    pub metadata: Metadata,
    pub location: Location,
    pub modules: Vec<ModuleId>,
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub modules: Vec<ModuleId>,
}

// ============================================================================
// Analysis Layer
// ============================================================================

/// A fully resolved compilation unit.
#[derive(Debug, Clone, Default)]
pub struct Unit {
    pub(crate) files: Vec<SourceFile>,
    pub(crate) modules: Vec<Module>,
    pub(crate) structs: Vec<Struct>,
    pub(crate) classes: Vec<Class>,
    pub(crate) exceptions: Vec<Exception>,
    pub(crate) enums: Vec<Enum>,
    pub(crate) sequences: Vec<Sequence>,
    pub(crate) dictionaries: Vec<Dictionary>,
    pub(crate) consts: Vec<Const>,
    pub(crate) by_name: HashMap<String, Definition>,
    pub(crate) checksums: IndexMap<String, String>,
}

impl Unit {
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn lookup(&self, scoped: &str) -> Option<Definition> {
        self.by_name.get(scoped).copied()
    }

    /// Checksums supplied with the model, keyed by scoped type id.
    pub fn checksums(&self) -> &IndexMap<String, String> {
        &self.checksums
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &Class)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (ClassId(i as u32), c))
    }

    pub fn decl(&self, def: Definition) -> &Decl {
        match def {
            Definition::Struct(id) => &self.structure(id).decl,
            Definition::Class(id) => &self.class(id).decl,
            Definition::Exception(id) => &self.exception(id).decl,
            Definition::Enum(id) => &self.enumeration(id).decl,
            Definition::Sequence(id) => &self.sequence(id).decl,
            Definition::Dictionary(id) => &self.dictionary(id).decl,
            Definition::Const(id) => &self.constant(id).decl,
        }
    }

    /// Outermost module enclosing `module`.
    pub fn top_level_module(&self, module: ModuleId) -> &Module {
        let mut current = self.module(module);
        while let Some(parent) = current.parent {
            current = self.module(parent);
        }
        current
    }

    /// Chain of modules from the top level down to `module`.
    pub fn module_path(&self, module: ModuleId) -> Vec<&Module> {
        let mut path = vec![self.module(module)];
        while let Some(parent) = path[path.len() - 1].parent {
            path.push(self.module(parent));
        }
        path.reverse();
        path
    }

    /// Scoped type id as it appears on the wire.
    pub fn type_id(&self, ty: Type) -> String {
        match ty {
            Type::Builtin(Builtin::ObjectProxy) => "::Ice::Object".to_string(),
            Type::Builtin(b) if b.is_value() => "::Ice::Object".to_string(),
            Type::Builtin(b) => b.keyword().to_string(),
            Type::Struct(id) => self.structure(id).decl.scoped.clone(),
            Type::Class(id) | Type::Proxy(id) => self.class(id).decl.scoped.clone(),
            Type::Enum(id) => self.enumeration(id).decl.scoped.clone(),
            Type::Sequence(id) => self.sequence(id).decl.scoped.clone(),
            Type::Dictionary(id) => self.dictionary(id).decl.scoped.clone(),
        }
    }

    /// Values that need forward-reference patching when decoded.
    pub fn uses_reference_semantics(&self, ty: Type) -> bool {
        match ty {
            Type::Builtin(b) => b.is_value(),
            Type::Class(_) => true,
            _ => false,
        }
    }

    /// Whether a value of `ty` can carry class instances anywhere inside it.
    pub fn uses_classes(&self, ty: Type) -> bool {
        self.uses_classes_rec(ty, &mut HashSet::new())
    }

    fn uses_classes_rec(&self, ty: Type, visited: &mut HashSet<Type>) -> bool {
        if !visited.insert(ty) {
            return false;
        }
        match ty {
            Type::Builtin(b) => b.is_value(),
            Type::Class(_) => true,
            Type::Proxy(_) | Type::Enum(_) => false,
            Type::Struct(id) => self
                .structure(id)
                .members
                .iter()
                .any(|m| self.uses_classes_rec(m.ty, visited)),
            Type::Sequence(id) => self.uses_classes_rec(self.sequence(id).element, visited),
            Type::Dictionary(id) => {
                let dict = self.dictionary(id);
                self.uses_classes_rec(dict.key, visited)
                    || self.uses_classes_rec(dict.value, visited)
            }
        }
    }

    pub fn is_variable_length(&self, ty: Type) -> bool {
        match ty {
            Type::Builtin(b) => !b.is_primitive(),
            Type::Struct(id) => self
                .structure(id)
                .members
                .iter()
                .any(|m| self.is_variable_length(m.ty)),
            _ => true,
        }
    }

    /// Smallest encoded size in bytes.
    pub fn min_wire_size(&self, ty: Type) -> usize {
        match ty {
            Type::Builtin(b) => match b {
                Builtin::Bool | Builtin::Byte | Builtin::String => 1,
                Builtin::Short | Builtin::ObjectProxy => 2,
                Builtin::Int | Builtin::Float => 4,
                Builtin::Long | Builtin::Double => 8,
                Builtin::Object | Builtin::Value => 1,
            },
            Type::Struct(id) => self
                .structure(id)
                .members
                .iter()
                .map(|m| self.min_wire_size(m.ty))
                .sum(),
            Type::Proxy(_) => 2,
            Type::Class(_) | Type::Enum(_) | Type::Sequence(_) | Type::Dictionary(_) => 1,
        }
    }

    // ------------------------------------------------------------------------
    // Class queries
    // ------------------------------------------------------------------------

    /// All ancestors (base classes and interfaces), nearest first, deduplicated.
    pub fn all_bases(&self, id: ClassId) -> Vec<ClassId> {
        let mut out: Vec<ClassId> = Vec::new();
        let mut queue: Vec<ClassId> = self.class(id).bases().collect();
        let mut i = 0;
        while i < queue.len() {
            let next = queue[i];
            i += 1;
            if out.contains(&next) {
                continue;
            }
            out.push(next);
            queue.extend(self.class(next).bases());
        }
        out
    }

    /// Operations reachable from `id`: own first, then inherited; first name wins.
    pub fn all_operations(&self, id: ClassId) -> Vec<&Operation> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for class in std::iter::once(id).chain(self.all_bases(id)) {
            for op in &self.class(class).operations {
                if seen.insert(op.name.as_str()) {
                    out.push(op);
                }
            }
        }
        out
    }

    /// Data members including those of base classes, root first.
    pub fn all_class_members(&self, id: ClassId) -> Vec<&Member> {
        let class = self.class(id);
        let mut out = match class.base {
            Some(base) => self.all_class_members(base),
            None => Vec::new(),
        };
        out.extend(class.members.iter());
        out
    }

    pub fn class_has_data_members(&self, id: ClassId) -> bool {
        !self.all_class_members(id).is_empty()
    }

    pub fn class_depth(&self, id: ClassId) -> usize {
        self.class(id)
            .base
            .map_or(0, |base| self.class_depth(base) + 1)
    }

    /// Class-level or any base class requests slice preservation.
    pub fn class_preserves_slice(&self, id: ClassId) -> bool {
        let class = self.class(id);
        class.decl.metadata.has("preserve-slice")
            || class.base.is_some_and(|b| self.class_preserves_slice(b))
    }

    /// Some strict ancestor already preserves slices.
    pub fn class_inherits_preserve(&self, id: ClassId) -> bool {
        self.class(id)
            .base
            .is_some_and(|b| self.class_preserves_slice(b))
    }

    /// `true` when `base` is a strict ancestor of `derived`.
    pub fn class_is_base_of(&self, base: ClassId, derived: ClassId) -> bool {
        self.all_bases(derived).contains(&base)
    }

    /// Interface or class that carries operations and hence a proxy.
    pub fn class_has_proxy(&self, id: ClassId) -> bool {
        let class = self.class(id);
        class.is_interface || !self.all_operations(id).is_empty()
    }

    // ------------------------------------------------------------------------
    // Exception queries
    // ------------------------------------------------------------------------

    pub fn all_exception_members(&self, id: ExceptionId) -> Vec<&Member> {
        let exception = self.exception(id);
        let mut out = match exception.base {
            Some(base) => self.all_exception_members(base),
            None => Vec::new(),
        };
        out.extend(exception.members.iter());
        out
    }

    pub fn exception_depth(&self, id: ExceptionId) -> usize {
        self.exception(id)
            .base
            .map_or(0, |base| self.exception_depth(base) + 1)
    }

    pub fn exception_is_base_of(&self, base: ExceptionId, derived: ExceptionId) -> bool {
        let mut current = self.exception(derived).base;
        while let Some(id) = current {
            if id == base {
                return true;
            }
            current = self.exception(id).base;
        }
        false
    }

    /// Own members carry class instances.
    pub fn exception_uses_classes(&self, id: ExceptionId) -> bool {
        self.exception(id)
            .members
            .iter()
            .any(|m| self.uses_classes(m.ty))
    }

    pub fn exception_preserves_slice(&self, id: ExceptionId) -> bool {
        let exception = self.exception(id);
        exception.decl.metadata.has("preserve-slice")
            || exception
                .base
                .is_some_and(|b| self.exception_preserves_slice(b))
    }

    pub fn exception_inherits_preserve(&self, id: ExceptionId) -> bool {
        self.exception(id)
            .base
            .is_some_and(|b| self.exception_preserves_slice(b))
    }

    // ------------------------------------------------------------------------
    // Operation queries
    // ------------------------------------------------------------------------

    pub fn is_amd(&self, op: &Operation) -> bool {
        op.metadata.has("amd") || self.class(op.owner).decl.metadata.has("amd")
    }

    pub fn has_marshaled_result(&self, op: &Operation) -> bool {
        op.metadata.has("marshaled-result")
            || self.class(op.owner).decl.metadata.has("marshaled-result")
    }
}
