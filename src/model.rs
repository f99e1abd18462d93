//! Signature model for a parsed Go source unit.

use serde::Serialize;

/// A parsed Go file: package clause, imports and every interface it declares.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceUnit {
    pub package: String,
    pub imports: Vec<Import>,
    pub interfaces: Vec<Interface>,
}

impl SourceUnit {
    /// Look up an interface declared in this unit by name.
    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }
}

/// An interface type declaration: `type Name interface { ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interface {
    pub name: String,
    /// Raw text of a generic type parameter list, e.g. `T any`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_params: Option<String>,
    pub methods: Vec<Method>,
    pub embeds: Vec<Embed>,
    /// Set when the body holds type-set elements (`~int | string`).
    pub constraint: bool,
}

/// An embedded interface element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum Embed {
    /// Declared in the same unit: `Reader`
    Local(String),
    /// Anything else: `io.Reader`, `List[T]`
    External(String),
}

/// A method signature with ordered parameters and results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    pub name: String,
    pub params: Vec<TypeDescriptor>,
    pub results: Vec<TypeDescriptor>,
}

/// A type expression, possibly nesting other type expressions.
///
/// `ty` is the full text of the type. Composite types (maps, slices,
/// function types...) list their component types in `inner`; a descriptor
/// with no `inner` is a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDescriptor {
    pub ty: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inner: Vec<TypeDescriptor>,
    /// Name given in the source, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TypeDescriptor {
    pub fn leaf(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            inner: Vec::new(),
            name: None,
        }
    }

    pub fn composite(ty: impl Into<String>, inner: Vec<TypeDescriptor>) -> Self {
        Self {
            ty: ty.into(),
            inner,
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.inner.is_empty()
    }

    /// The predeclared `error` type.
    pub fn is_error(&self) -> bool {
        self.ty == "error"
    }
}

/// An import declaration: `alias "path"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Unquoted import path.
    pub path: String,
}

impl Import {
    /// Identifier used to qualify references to this package in code.
    pub fn prefix(&self) -> &str {
        if let Some(alias) = &self.alias {
            return alias;
        }
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Render as a line of an import block.
    pub fn to_import_spec(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} \"{}\"", alias, self.path),
            None => format!("\"{}\"", self.path),
        }
    }
}
