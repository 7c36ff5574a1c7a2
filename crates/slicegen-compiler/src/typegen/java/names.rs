//! Java identifiers, packages and file paths.

use slicegen_core::{Decl, Definition, ModuleId, Operation, Unit};

use super::Emitter;

const JAVA_KEYWORDS: [&str; 53] = [
    "abstract",
    "assert",
    "boolean",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "class",
    "const",
    "continue",
    "default",
    "do",
    "double",
    "else",
    "enum",
    "extends",
    "false",
    "final",
    "finally",
    "float",
    "for",
    "goto",
    "if",
    "implements",
    "import",
    "instanceof",
    "int",
    "interface",
    "long",
    "native",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "short",
    "static",
    "strictfp",
    "super",
    "switch",
    "synchronized",
    "this",
    "throw",
    "throws",
    "transient",
    "true",
    "try",
    "void",
    "volatile",
    "while",
];

// Methods of java.lang.Object that a generated member must not shadow.
const OBJECT_METHODS: [&str; 9] = [
    "clone",
    "equals",
    "finalize",
    "getClass",
    "hashCode",
    "notify",
    "notifyAll",
    "toString",
    "wait",
];

/// Escape a Java keyword or `java.lang.Object` method name with a leading `_`.
pub fn fix_kwd(name: &str) -> String {
    if JAVA_KEYWORDS.contains(&name) || OBJECT_METHODS.contains(&name) {
        format!("_{name}")
    } else {
        name.to_string()
    }
}

/// Java package of a module: the top-level `java:package:` prefix followed by the module path.
pub fn package_of(unit: &Unit, module: ModuleId) -> String {
    let prefix = unit
        .top_level_module(module)
        .metadata
        .find("java:package:")
        .map(str::to_string);
    prefix
        .into_iter()
        .chain(unit.module_path(module).iter().map(|m| fix_kwd(&m.name)))
        .collect::<Vec<_>>()
        .join(".")
}

/// Output path of a Java class, relative to the output directory.
pub fn file_path(package: &str, class: &str) -> String {
    if package.is_empty() {
        return format!("{class}.java");
    }
    format!("{}/{class}.java", package.replace('.', "/"))
}

/// `name` unless a parameter of `op` already uses it, in which case `name_`.
pub fn escaped_param_name(op: &Operation, name: &str) -> String {
    if op.params.iter().any(|p| p.name == name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

impl Emitter<'_> {
    pub(super) fn package_of_decl(&self, decl: &Decl) -> String {
        package_of(self.unit, decl.module)
    }

    /// Java name of a definition, qualified unless it lives in the current package.
    pub(super) fn abs(&self, decl: &Decl) -> String {
        self.abs_affixed(decl, "", "")
    }

    /// Like [`Self::abs`] with a prefix and suffix around the simple name (`_FooDisp`, `FooPrx`).
    pub(super) fn abs_affixed(&self, decl: &Decl, prefix: &str, suffix: &str) -> String {
        let name = if prefix.is_empty() && suffix.is_empty() {
            fix_kwd(&decl.name)
        } else {
            format!("{prefix}{}{suffix}", decl.name)
        };
        let package = self.package_of_decl(decl);
        if package.is_empty() || package == self.package {
            name
        } else {
            format!("{package}.{name}")
        }
    }

    pub(super) fn def_abs(&self, def: Definition) -> String {
        self.abs(self.unit.decl(def))
    }
}
