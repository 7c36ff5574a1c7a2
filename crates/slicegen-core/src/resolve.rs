//! Raw layer to arena resolution.
//!
//! Resolution runs in two passes: the first allocates ids and registers every scoped
//! name, the second builds the arena entries with all references turned into ids.

use std::collections::{HashMap, HashSet};

use crate::model::{
    Builtin, Class, ClassId, Const, ConstId, ConstValue, Decl, Definition, Dictionary,
    DictionaryId, Enum, EnumId, Enumerator, Exception, ExceptionId, Location, Member, Metadata,
    Module, ModuleId, Operation, Param, ReturnValue, Sequence, SequenceId, SourceFile, Struct,
    StructId, Type, Unit,
};
use crate::utils::parse_integer;
use crate::{RawDefinition, RawMember, RawModule, RawOperation, RawUnit};

/// Errors raised while resolving a raw model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{location}: `{name}` is already defined")]
    DuplicateDefinition { name: String, location: Location },

    #[error("{location}: `{name}` is not defined")]
    UndefinedType { name: String, location: Location },

    #[error("{location}: `{name}` is not a type")]
    NotAType { name: String, location: Location },

    #[error("{location}: `{name}` is not an exception")]
    NotAnException { name: String, location: Location },

    #[error("{location}: base `{base}` of `{name}` must be a class")]
    InvalidBase {
        name: String,
        base: String,
        location: Location,
    },

    #[error("{location}: `{base}` inherited by `{name}` must be an interface")]
    NotAnInterface {
        name: String,
        base: String,
        location: Location,
    },

    #[error("{location}: `{name}` inherits from itself")]
    CyclicInheritance { name: String, location: Location },

    #[error("{location}: tag {tag} is used more than once in `{scope}`")]
    DuplicateTag {
        scope: String,
        tag: i32,
        location: Location,
    },

    #[error("{location}: tag {tag} in `{scope}` is negative")]
    NegativeTag {
        scope: String,
        tag: i32,
        location: Location,
    },

    #[error("{location}: struct member `{name}` of `{scope}` cannot be optional")]
    TaggedStructMember {
        name: String,
        scope: String,
        location: Location,
    },

    #[error("{location}: `{value}` is not a valid {type_name} literal")]
    InvalidLiteral {
        value: String,
        type_name: &'static str,
        location: Location,
    },

    #[error("{location}: `{name}` is not a constant or enumerator")]
    InvalidValueRef { name: String, location: Location },
}

impl Unit {
    /// Resolve a raw model into the id-indexed arena.
    pub fn from_raw(raw: RawUnit) -> Result<Self, ModelError> {
        let mut resolver = Resolver::default();
        resolver.unit.checksums = raw.checksums.clone();

        let mut pending = Vec::new();
        for file in &raw.files {
            let mut top = Vec::new();
            for module in &file.modules {
                top.push(resolver.declare_module(&file.name, module, None, &mut pending)?);
            }
            resolver.unit.files.push(SourceFile {
                name: file.name.clone(),
                modules: top,
            });
        }

        // Enums first so enumerator references resolve regardless of declaration order.
        for item in &pending {
            if let RawDefinition::Enum(raw_enum) = item.raw {
                let decl = resolver.decl(item, &raw_enum.metadata, raw_enum.line);
                let mut next = 0;
                let enumerators = raw_enum
                    .enumerators
                    .iter()
                    .map(|e| {
                        let value = e.value.unwrap_or(next);
                        next = value.saturating_add(1);
                        Enumerator {
                            name: e.name.clone(),
                            value,
                        }
                    })
                    .collect();
                resolver.unit.enums.push(Enum { decl, enumerators });
            }
        }
        resolver.register_enumerators();

        for item in &pending {
            resolver.build(item)?;
        }

        resolver.check_inheritance()?;
        resolver.check_tags()?;
        Ok(resolver.unit)
    }
}

struct Pending<'r> {
    raw: &'r RawDefinition,
    def: Definition,
    module: ModuleId,
    scoped: String,
    file: String,
}

#[derive(Default)]
struct Resolver {
    unit: Unit,
    enumerators: HashMap<String, (EnumId, usize)>,
    counts: [u32; 7],
}

impl Resolver {
    fn declare_module<'r>(
        &mut self,
        file: &str,
        raw: &'r RawModule,
        parent: Option<ModuleId>,
        pending: &mut Vec<Pending<'r>>,
    ) -> Result<ModuleId, ModelError> {
        let scoped = match parent {
            Some(p) => format!("{}::{}", self.unit.module(p).scoped, raw.name),
            None => format!("::{}", raw.name),
        };
        let id = ModuleId(self.unit.modules.len() as u32);
        self.unit.modules.push(Module {
            name: raw.name.clone(),
            scoped: scoped.clone(),
            parent,
            metadata: Metadata::new(raw.metadata.clone()),
            location: Location::new(file, raw.line),
            modules: Vec::new(),
            definitions: Vec::new(),
        });

        for def in &raw.definitions {
            let def_scoped = format!("{}::{}", scoped, def.name());
            let kind = self.allocate(def);
            if self.unit.by_name.insert(def_scoped.clone(), kind).is_some() {
                return Err(ModelError::DuplicateDefinition {
                    name: def_scoped,
                    location: Location::new(file, raw_line(def)),
                });
            }
            self.unit.modules[id.index()].definitions.push(kind);
            pending.push(Pending {
                raw: def,
                def: kind,
                module: id,
                scoped: def_scoped,
                file: file.to_string(),
            });
        }

        for sub in &raw.modules {
            let sub_id = self.declare_module(file, sub, Some(id), pending)?;
            self.unit.modules[id.index()].modules.push(sub_id);
        }
        Ok(id)
    }

    fn allocate(&mut self, def: &RawDefinition) -> Definition {
        let slot = match def {
            RawDefinition::Struct(_) => 0,
            RawDefinition::Class(_) | RawDefinition::Interface(_) => 1,
            RawDefinition::Exception(_) => 2,
            RawDefinition::Enum(_) => 3,
            RawDefinition::Sequence(_) => 4,
            RawDefinition::Dictionary(_) => 5,
            RawDefinition::Const(_) => 6,
        };
        let n = self.counts[slot];
        self.counts[slot] += 1;
        match slot {
            0 => Definition::Struct(StructId(n)),
            1 => Definition::Class(ClassId(n)),
            2 => Definition::Exception(ExceptionId(n)),
            3 => Definition::Enum(EnumId(n)),
            4 => Definition::Sequence(SequenceId(n)),
            5 => Definition::Dictionary(DictionaryId(n)),
            _ => Definition::Const(ConstId(n)),
        }
    }

    fn register_enumerators(&mut self) {
        for (i, e) in self.unit.enums.iter().enumerate() {
            let module_scope = &self.unit.modules[e.decl.module.index()].scoped;
            for (j, enumerator) in e.enumerators.iter().enumerate() {
                let id = (EnumId(i as u32), j);
                self.enumerators
                    .insert(format!("{}::{}", e.decl.scoped, enumerator.name), id);
                self.enumerators
                    .entry(format!("{}::{}", module_scope, enumerator.name))
                    .or_insert(id);
            }
        }
    }

    fn decl(&self, item: &Pending<'_>, metadata: &[String], line: u32) -> Decl {
        Decl {
            name: item.raw.name().to_string(),
            scoped: item.scoped.clone(),
            module: item.module,
            metadata: Metadata::new(metadata.to_vec()),
            location: Location::new(item.file.clone(), line),
        }
    }

    fn build(&mut self, item: &Pending<'_>) -> Result<(), ModelError> {
        match item.raw {
            RawDefinition::Enum(_) => {}
            RawDefinition::Struct(raw) => {
                let decl = self.decl(item, &raw.metadata, raw.line);
                let members = self.members(&item.file, &raw.members)?;
                self.unit.structs.push(Struct { decl, members });
            }
            RawDefinition::Class(raw) => {
                let decl = self.decl(item, &raw.metadata, raw.line);
                let Definition::Class(id) = item.def else {
                    unreachable!("class allocated with non-class id")
                };
                let base = match &raw.base {
                    Some(name) => Some(self.class_ref(name, &decl)?),
                    None => None,
                };
                let interfaces = raw
                    .implements
                    .iter()
                    .map(|name| self.class_ref(name, &decl))
                    .collect::<Result<Vec<_>, _>>()?;
                let members = self.members(&item.file, &raw.members)?;
                let operations = self.operations(id, &item.file, &raw.operations)?;
                self.unit.classes.push(Class {
                    decl,
                    is_interface: false,
                    base,
                    interfaces,
                    members,
                    operations,
                    compact_id: raw.compact_id,
                });
            }
            RawDefinition::Interface(raw) => {
                let decl = self.decl(item, &raw.metadata, raw.line);
                let Definition::Class(id) = item.def else {
                    unreachable!("interface allocated with non-class id")
                };
                let interfaces = raw
                    .bases
                    .iter()
                    .map(|name| self.class_ref(name, &decl))
                    .collect::<Result<Vec<_>, _>>()?;
                let operations = self.operations(id, &item.file, &raw.operations)?;
                self.unit.classes.push(Class {
                    decl,
                    is_interface: true,
                    base: None,
                    interfaces,
                    members: Vec::new(),
                    operations,
                    compact_id: None,
                });
            }
            RawDefinition::Exception(raw) => {
                let decl = self.decl(item, &raw.metadata, raw.line);
                let base = match &raw.base {
                    Some(name) => Some(self.exception_ref(name, &decl.location)?),
                    None => None,
                };
                let members = self.members(&item.file, &raw.members)?;
                self.unit.exceptions.push(Exception {
                    decl,
                    base,
                    members,
                });
            }
            RawDefinition::Sequence(raw) => {
                let decl = self.decl(item, &raw.metadata, raw.line);
                let element = self.resolve_type(&raw.element, &decl.location)?;
                self.unit.sequences.push(Sequence { decl, element });
            }
            RawDefinition::Dictionary(raw) => {
                let decl = self.decl(item, &raw.metadata, raw.line);
                let key = self.resolve_type(&raw.key, &decl.location)?;
                let value = self.resolve_type(&raw.value, &decl.location)?;
                self.unit
                    .dictionaries
                    .push(Dictionary { decl, key, value });
            }
            RawDefinition::Const(raw) => {
                let decl = self.decl(item, &raw.metadata, raw.line);
                let ty = self.resolve_type(&raw.type_name, &decl.location)?;
                let value = self.resolve_value(
                    ty,
                    Some(&raw.value),
                    raw.value_ref.as_deref(),
                    &decl.location,
                )?;
                let value = value.unwrap_or_else(|| ConstValue::Literal(String::new()));
                self.unit.consts.push(Const { decl, ty, value });
            }
        }
        Ok(())
    }

    fn members(&self, file: &str, raw: &[RawMember]) -> Result<Vec<Member>, ModelError> {
        raw.iter()
            .map(|m| {
                let location = Location::new(file, m.line);
                let ty = self.resolve_type(&m.type_name, &location)?;
                let default =
                    self.resolve_value(ty, m.default.as_deref(), m.default_ref.as_deref(), &location)?;
                Ok(Member {
                    name: m.name.clone(),
                    ty,
                    tag: m.tag,
                    default,
                    metadata: Metadata::new(m.metadata.clone()),
                    location,
                })
            })
            .collect()
    }

    fn operations(
        &self,
        owner: ClassId,
        file: &str,
        raw: &[RawOperation],
    ) -> Result<Vec<Operation>, ModelError> {
        raw.iter()
            .map(|op| {
                let location = Location::new(file, op.line);
                let params = op
                    .params
                    .iter()
                    .map(|p| {
                        Ok(Param {
                            name: p.name.clone(),
                            ty: self.resolve_type(&p.type_name, &location)?,
                            out: p.out,
                            tag: p.tag,
                            metadata: Metadata::new(p.metadata.clone()),
                        })
                    })
                    .collect::<Result<Vec<_>, ModelError>>()?;
                let returns = match &op.returns {
                    Some(r) => Some(ReturnValue {
                        ty: self.resolve_type(&r.type_name, &location)?,
                        tag: r.tag,
                        metadata: Metadata::new(r.metadata.clone()),
                    }),
                    None => None,
                };
                let throws = op
                    .throws
                    .iter()
                    .map(|name| self.exception_ref(name, &location))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Operation {
                    name: op.name.clone(),
                    owner,
                    params,
                    returns,
                    mode: op.mode,
                    format: op.format,
                    throws,
                    metadata: Metadata::new(op.metadata.clone()),
                    location,
                })
            })
            .collect()
    }

    fn resolve_type(&self, name: &str, location: &Location) -> Result<Type, ModelError> {
        if let Some(builtin) = Builtin::from_keyword(name) {
            return Ok(Type::Builtin(builtin));
        }
        if let Some(target) = name.strip_suffix('*') {
            return match self.unit.by_name.get(target) {
                Some(Definition::Class(id)) => Ok(Type::Proxy(*id)),
                Some(_) => Err(ModelError::NotAType {
                    name: name.to_string(),
                    location: location.clone(),
                }),
                None => Err(ModelError::UndefinedType {
                    name: target.to_string(),
                    location: location.clone(),
                }),
            };
        }
        match self.unit.by_name.get(name) {
            Some(Definition::Struct(id)) => Ok(Type::Struct(*id)),
            Some(Definition::Class(id)) => Ok(Type::Class(*id)),
            Some(Definition::Enum(id)) => Ok(Type::Enum(*id)),
            Some(Definition::Sequence(id)) => Ok(Type::Sequence(*id)),
            Some(Definition::Dictionary(id)) => Ok(Type::Dictionary(*id)),
            Some(Definition::Exception(_) | Definition::Const(_)) => Err(ModelError::NotAType {
                name: name.to_string(),
                location: location.clone(),
            }),
            None => Err(ModelError::UndefinedType {
                name: name.to_string(),
                location: location.clone(),
            }),
        }
    }

    fn resolve_value(
        &self,
        ty: Type,
        literal: Option<&str>,
        reference: Option<&str>,
        location: &Location,
    ) -> Result<Option<ConstValue>, ModelError> {
        if let Some(name) = reference {
            if let Some(Definition::Const(id)) = self.unit.by_name.get(name) {
                return Ok(Some(ConstValue::Const(*id)));
            }
            if let Some(&(e, i)) = self.enumerators.get(name) {
                return Ok(Some(ConstValue::Enumerator(e, i)));
            }
            return Err(ModelError::InvalidValueRef {
                name: name.to_string(),
                location: location.clone(),
            });
        }
        let Some(text) = literal else {
            return Ok(None);
        };
        if let Type::Enum(id) = ty {
            let wanted = text.rsplit("::").next().unwrap_or(text);
            let position = self
                .unit
                .enumeration(id)
                .enumerators
                .iter()
                .position(|e| e.name == wanted);
            return match position {
                Some(i) => Ok(Some(ConstValue::Enumerator(id, i))),
                None => Err(ModelError::InvalidValueRef {
                    name: text.to_string(),
                    location: location.clone(),
                }),
            };
        }
        if let Type::Builtin(builtin) = ty {
            let range = match builtin {
                Builtin::Byte => Some((0, 255)),
                Builtin::Short => Some((i64::from(i16::MIN), i64::from(i16::MAX))),
                Builtin::Int => Some((i64::from(i32::MIN), i64::from(i32::MAX))),
                Builtin::Long => Some((i64::MIN, i64::MAX)),
                _ => None,
            };
            if let Some((min, max)) = range {
                let digits = text.trim_end_matches(['l', 'L']);
                if !parse_integer(digits).is_some_and(|v| (min..=max).contains(&v)) {
                    return Err(ModelError::InvalidLiteral {
                        value: text.to_string(),
                        type_name: builtin.keyword(),
                        location: location.clone(),
                    });
                }
            }
        }
        Ok(Some(ConstValue::Literal(text.to_string())))
    }

    fn class_ref(&self, name: &str, decl: &Decl) -> Result<ClassId, ModelError> {
        match self.unit.by_name.get(name) {
            Some(Definition::Class(id)) => Ok(*id),
            _ => Err(ModelError::InvalidBase {
                name: decl.scoped.clone(),
                base: name.to_string(),
                location: decl.location.clone(),
            }),
        }
    }

    fn exception_ref(&self, name: &str, location: &Location) -> Result<ExceptionId, ModelError> {
        match self.unit.by_name.get(name) {
            Some(Definition::Exception(id)) => Ok(*id),
            Some(_) => Err(ModelError::NotAnException {
                name: name.to_string(),
                location: location.clone(),
            }),
            None => Err(ModelError::UndefinedType {
                name: name.to_string(),
                location: location.clone(),
            }),
        }
    }

    fn check_inheritance(&self) -> Result<(), ModelError> {
        let unit = &self.unit;
        for (id, class) in unit.classes() {
            if let Some(base) = class.base
                && unit.class(base).is_interface
            {
                return Err(ModelError::InvalidBase {
                    name: class.decl.scoped.clone(),
                    base: unit.class(base).decl.scoped.clone(),
                    location: class.decl.location.clone(),
                });
            }
            for &iface in &class.interfaces {
                if !unit.class(iface).is_interface {
                    return Err(ModelError::NotAnInterface {
                        name: class.decl.scoped.clone(),
                        base: unit.class(iface).decl.scoped.clone(),
                        location: class.decl.location.clone(),
                    });
                }
            }

            let mut stack: Vec<ClassId> = class.bases().collect();
            let mut seen = HashSet::new();
            while let Some(next) = stack.pop() {
                if next == id {
                    return Err(ModelError::CyclicInheritance {
                        name: class.decl.scoped.clone(),
                        location: class.decl.location.clone(),
                    });
                }
                if seen.insert(next) {
                    stack.extend(unit.class(next).bases());
                }
            }
        }

        for (i, exception) in unit.exceptions.iter().enumerate() {
            let id = ExceptionId(i as u32);
            let mut current = exception.base;
            let mut steps = 0;
            while let Some(base) = current {
                steps += 1;
                if base == id || steps > unit.exceptions.len() {
                    return Err(ModelError::CyclicInheritance {
                        name: exception.decl.scoped.clone(),
                        location: exception.decl.location.clone(),
                    });
                }
                current = unit.exception(base).base;
            }
        }
        Ok(())
    }

    fn check_tags(&self) -> Result<(), ModelError> {
        let unit = &self.unit;
        let check = |scope: &str, location: &Location, tags: &mut dyn Iterator<Item = i32>| {
            let mut seen = HashSet::new();
            for tag in tags {
                if tag < 0 {
                    return Err(ModelError::NegativeTag {
                        scope: scope.to_string(),
                        tag,
                        location: location.clone(),
                    });
                }
                if !seen.insert(tag) {
                    return Err(ModelError::DuplicateTag {
                        scope: scope.to_string(),
                        tag,
                        location: location.clone(),
                    });
                }
            }
            Ok(())
        };

        for s in &unit.structs {
            if let Some(m) = s.members.iter().find(|m| m.tag.is_some()) {
                return Err(ModelError::TaggedStructMember {
                    name: m.name.clone(),
                    scope: s.decl.scoped.clone(),
                    location: m.location.clone(),
                });
            }
        }
        for (id, class) in unit.classes() {
            check(
                &class.decl.scoped,
                &class.decl.location,
                &mut unit.all_class_members(id).into_iter().filter_map(|m| m.tag),
            )?;
            for op in &class.operations {
                let scope = format!("{}::{}", class.decl.scoped, op.name);
                check(
                    &scope,
                    &op.location,
                    &mut op.in_params().filter_map(|p| p.tag),
                )?;
                check(
                    &scope,
                    &op.location,
                    &mut op
                        .out_params()
                        .filter_map(|p| p.tag)
                        .chain(op.returns.as_ref().and_then(|r| r.tag)),
                )?;
            }
        }
        for (i, exception) in unit.exceptions.iter().enumerate() {
            check(
                &exception.decl.scoped,
                &exception.decl.location,
                &mut unit
                    .all_exception_members(ExceptionId(i as u32))
                    .into_iter()
                    .filter_map(|m| m.tag),
            )?;
        }
        Ok(())
    }
}

fn raw_line(def: &RawDefinition) -> u32 {
    match def {
        RawDefinition::Struct(d) => d.line,
        RawDefinition::Class(d) => d.line,
        RawDefinition::Interface(d) => d.line,
        RawDefinition::Exception(d) => d.line,
        RawDefinition::Enum(d) => d.line,
        RawDefinition::Sequence(d) => d.line,
        RawDefinition::Dictionary(d) => d.line,
        RawDefinition::Const(d) => d.line,
    }
}
