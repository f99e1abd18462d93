//! Import resolution for generated code.
//!
//! Collects every package prefix referenced by a method set and keeps the
//! import declarations that provide one of them.

use indexmap::IndexSet;

use crate::model::{Import, Method, TypeDescriptor};

/// Leaf type names of a descriptor. Composite descriptors contribute only
/// the leaves of their children, never their own syntax.
pub fn leaf_types(desc: &TypeDescriptor) -> Vec<&str> {
    if desc.is_leaf() {
        return vec![desc.ty.as_str()];
    }
    desc.inner.iter().flat_map(leaf_types).collect()
}

/// Package qualifier of a leaf type, if it has one: `*os.File` -> `os`.
pub fn package_prefix(leaf: &str) -> Option<&str> {
    let name = leaf.trim_start_matches('*');
    name.find('.').map(|idx| &name[..idx])
}

/// Every prefix referenced by `methods`, in first-reference order
/// (methods, then parameters, then results).
pub fn referenced_prefixes(methods: &[Method]) -> IndexSet<String> {
    methods
        .iter()
        .flat_map(|m| m.params.iter().chain(m.results.iter()))
        .flat_map(leaf_types)
        .filter_map(package_prefix)
        .map(str::to_string)
        .collect()
}

/// Imports whose prefix is referenced, ordered by first reference. Prefixes
/// with no matching import are built-in or same-package names and are
/// dropped.
pub fn select_imports<'a>(imports: &'a [Import], prefixes: &IndexSet<String>) -> Vec<&'a Import> {
    let mut selected: Vec<&Import> = Vec::new();
    for prefix in prefixes {
        for import in imports {
            if import.prefix() == prefix && !selected.contains(&import) {
                selected.push(import);
            }
        }
    }
    selected
}

/// Lines of the import block: requests first, verbatim, then the resolved
/// imports. Requests are not deduplicated against resolved entries.
pub fn import_lines(requests: &[String], imports: &[Import], methods: &[Method]) -> Vec<String> {
    let prefixes = referenced_prefixes(methods);
    requests
        .iter()
        .cloned()
        .chain(
            select_imports(imports, &prefixes)
                .into_iter()
                .map(Import::to_import_spec),
        )
        .collect()
}
