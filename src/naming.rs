//! Synthetic names for parameters and results.
//!
//! Generated code never reuses source-level names: parameters become
//! `p0, p1, ...` and results `v0, v1, ...`, with a trailing `error` result
//! named `err`.

use crate::model::{Method, TypeDescriptor};

/// How a method reports failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnConvention {
    /// No trailing `error` result; includes methods with no results.
    Plain,
    /// Last result is `error`.
    ErrorTerminated,
}

impl ReturnConvention {
    /// Classify from the type text of the last result.
    pub fn classify(results: &[TypeDescriptor]) -> Self {
        match results.last() {
            Some(last) if last.is_error() => ReturnConvention::ErrorTerminated,
            _ => ReturnConvention::Plain,
        }
    }
}

/// A parameter or result with its synthetic name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub ty: String,
}

impl Binding {
    pub fn is_variadic(&self) -> bool {
        self.ty.starts_with("...")
    }
}

/// A method ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMethod {
    pub name: String,
    pub params: Vec<Binding>,
    pub results: Vec<Binding>,
    pub convention: ReturnConvention,
}

/// Assign synthetic names to every parameter and result of `method`.
///
/// The convention is classified from the declared result types before any
/// name is assigned.
pub fn normalize(method: &Method) -> NormalizedMethod {
    let convention = ReturnConvention::classify(&method.results);
    let last = method.results.len().saturating_sub(1);

    let params = method
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| Binding {
            name: format!("p{}", i),
            ty: p.ty.clone(),
        })
        .collect();

    let results = method
        .results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let name = if i == last && convention == ReturnConvention::ErrorTerminated {
                "err".to_string()
            } else {
                format!("v{}", i)
            };
            Binding {
                name,
                ty: r.ty.clone(),
            }
        })
        .collect();

    NormalizedMethod {
        name: method.name.clone(),
        params,
        results,
        convention,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(params: &[&str], results: &[&str]) -> Method {
        Method {
            name: "M".to_string(),
            params: params
                .iter()
                .map(|t| TypeDescriptor::leaf(*t).named("src"))
                .collect(),
            results: results.iter().map(|t| TypeDescriptor::leaf(*t)).collect(),
        }
    }

    fn names(bindings: &[Binding]) -> Vec<&str> {
        bindings.iter().map(|b| b.name.as_str()).collect()
    }

    #[test]
    fn test_params_named_by_position() {
        let normalized = normalize(&method(&["string", "string", "...interface{}"], &[]));
        assert_eq!(names(&normalized.params), vec!["p0", "p1", "p2"]);
        assert_eq!(normalized.params[2].ty, "...interface{}");
        assert!(normalized.params[2].is_variadic());
    }

    #[test]
    fn test_trailing_error_named_err() {
        let normalized = normalize(&method(&[], &["[]strings.Reader", "*os.File", "error"]));
        assert_eq!(names(&normalized.results), vec!["v0", "v1", "err"]);
        assert_eq!(normalized.convention, ReturnConvention::ErrorTerminated);
    }

    #[test]
    fn test_error_not_last_is_plain() {
        let normalized = normalize(&method(&[], &["error", "int"]));
        assert_eq!(names(&normalized.results), vec!["v0", "v1"]);
        assert_eq!(normalized.convention, ReturnConvention::Plain);
    }

    #[test]
    fn test_no_results_is_plain() {
        assert_eq!(ReturnConvention::classify(&[]), ReturnConvention::Plain);
        assert!(normalize(&method(&["int"], &[])).results.is_empty());
    }

    #[test]
    fn test_source_names_are_ignored() {
        let mut m = method(&[], &["error"]);
        m.results[0].name = Some("e".to_string());
        let normalized = normalize(&m);
        assert_eq!(names(&normalized.results), vec!["err"]);
    }

    #[test]
    fn test_single_error_result() {
        let normalized = normalize(&method(&[], &["error"]));
        assert_eq!(
            normalized.results,
            vec![Binding {
                name: "err".to_string(),
                ty: "error".to_string()
            }]
        );
    }
}
