//! Arena lookups excluded from coverage reports.
//!
//! Ids are only minted by `Unit::from_raw`, so a miss means an id from another unit.

#![cfg_attr(coverage_nightly, coverage(off))]

use crate::model::{
    Class, ClassId, Const, ConstId, Dictionary, DictionaryId, Enum, EnumId, Exception,
    ExceptionId, Module, ModuleId, Sequence, SequenceId, Struct, StructId, Unit,
};

macro_rules! arena_lookup {
    ($($method:ident($id:ty) -> $item:ty, $field:ident;)*) => {
        impl Unit {
            $(
                pub fn $method(&self, id: $id) -> &$item {
                    self.$field.get(id.index()).unwrap_or_else(|| {
                        panic!(
                            "Unit: {} {} not found (id belongs to another unit)",
                            stringify!($id),
                            id.index()
                        )
                    })
                }
            )*
        }
    };
}

arena_lookup! {
    module(ModuleId) -> Module, modules;
    structure(StructId) -> Struct, structs;
    class(ClassId) -> Class, classes;
    exception(ExceptionId) -> Exception, exceptions;
    enumeration(EnumId) -> Enum, enums;
    sequence(SequenceId) -> Sequence, sequences;
    dictionary(DictionaryId) -> Dictionary, dictionaries;
    constant(ConstId) -> Const, consts;
}
