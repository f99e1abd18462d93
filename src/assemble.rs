//! Assembly of the complete decorator source file.

use indexmap::IndexMap;

use crate::error::GenerateError;
use crate::format::{FormatError, SourceFormatter};
use crate::model::{Embed, Interface, Method, SourceUnit};
use crate::naming::normalize;
use crate::resolver::import_lines;
use crate::synth::{render_method, render_struct};

/// First line of every generated file.
pub const HEADER: &str = "// Code generated by godeco. DO NOT EDIT.";

/// What to generate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Name of the interface to decorate.
    pub interface: String,
    /// Extra import block lines, added verbatim ahead of resolved imports.
    pub imports: Vec<String>,
}

impl GenerateOptions {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            imports: Vec::new(),
        }
    }

    /// Add an import path, quoting it for the import block.
    pub fn with_import(mut self, path: &str) -> Self {
        self.imports.push(quote_import_path(path));
        self
    }
}

/// `strings` or `"strings"` -> `"strings"`.
pub fn quote_import_path(path: &str) -> String {
    format!("\"{}\"", path.trim_matches('"'))
}

/// Warnings produced while generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub kind: WarningKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// The formatter could not be run or its output could not be read;
    /// output is unformatted.
    FormatterUnavailable,
    /// The formatter rejected the generated text.
    InvalidOutput,
    /// Follow-up advice for a previous warning.
    Hint,
}

/// Result of generation.
#[derive(Debug, Clone)]
pub struct Generated {
    pub code: String,
    pub warnings: Vec<Warning>,
}

/// Methods a decorator for `iface` must implement: its own methods in
/// declaration order, then those of embedded interfaces from the same file.
/// A name seen twice keeps its first declaration.
pub fn method_set(unit: &SourceUnit, iface: &Interface) -> Result<Vec<Method>, GenerateError> {
    let mut methods = IndexMap::new();
    let mut stack = Vec::new();
    collect_methods(unit, iface, &mut stack, &mut methods)?;
    Ok(methods.into_values().collect())
}

fn collect_methods(
    unit: &SourceUnit,
    iface: &Interface,
    stack: &mut Vec<String>,
    out: &mut IndexMap<String, Method>,
) -> Result<(), GenerateError> {
    if let Some(params) = &iface.type_params {
        return Err(GenerateError::GenericInterface {
            name: iface.name.clone(),
            params: params.clone(),
        });
    }
    if iface.constraint {
        return Err(GenerateError::ConstraintInterface(iface.name.clone()));
    }
    if stack.contains(&iface.name) {
        return Err(GenerateError::EmbedCycle(iface.name.clone()));
    }
    stack.push(iface.name.clone());

    for method in &iface.methods {
        if !out.contains_key(&method.name) {
            out.insert(method.name.clone(), method.clone());
        }
    }

    for embed in &iface.embeds {
        match embed {
            Embed::Local(name) => {
                let embedded = unit.interface(name).ok_or_else(|| GenerateError::UnknownEmbed {
                    interface: iface.name.clone(),
                    embed: name.clone(),
                })?;
                collect_methods(unit, embedded, stack, out)?;
            }
            Embed::External(name) => {
                return Err(GenerateError::ExternalEmbed {
                    interface: iface.name.clone(),
                    embed: name.clone(),
                });
            }
        }
    }

    stack.pop();
    Ok(())
}

/// Render the unformatted decorator source for `options.interface`.
pub fn render(unit: &SourceUnit, options: &GenerateOptions) -> Result<String, GenerateError> {
    let iface = unit
        .interface(&options.interface)
        .ok_or_else(|| GenerateError::InterfaceNotFound(options.interface.clone()))?;
    let methods = method_set(unit, iface)?;
    let imports = import_lines(&options.imports, &unit.imports, &methods);

    let mut out = String::new();
    out.push_str(HEADER);
    out.push_str("\n\n");
    out.push_str(&format!("package {}\n\n", unit.package));

    if !imports.is_empty() {
        out.push_str("import (\n");
        for line in &imports {
            out.push_str(&format!("\t{}\n", line));
        }
        out.push_str(")\n\n");
    }

    out.push_str(&render_struct(&iface.name));
    for method in &methods {
        out.push('\n');
        out.push_str(&render_method(&iface.name, &normalize(method)));
    }
    Ok(out)
}

/// Render and format the decorator source.
///
/// A formatting failure is not fatal: the unformatted text is returned with
/// warnings, so the caller can compile it to see what went wrong.
pub fn generate(
    unit: &SourceUnit,
    options: &GenerateOptions,
    formatter: &dyn SourceFormatter,
) -> Result<Generated, GenerateError> {
    let raw = render(unit, options)?;
    let generated = match formatter.format(&raw) {
        Ok(code) => Generated {
            code,
            warnings: Vec::new(),
        },
        Err(
            err @ (FormatError::Spawn { .. } | FormatError::Io(_) | FormatError::InvalidUtf8),
        ) => Generated {
            code: raw,
            warnings: vec![Warning {
                message: format!("output left unformatted: {err}"),
                kind: WarningKind::FormatterUnavailable,
            }],
        },
        Err(err) => Generated {
            code: raw,
            warnings: vec![
                Warning {
                    message: format!("internal error: invalid Go generated: {err}"),
                    kind: WarningKind::InvalidOutput,
                },
                Warning {
                    message: "compile the package to analyze the error".to_string(),
                    kind: WarningKind::Hint,
                },
            ],
        },
    };
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Passthrough;
    use crate::parser::parse;

    struct Rejecting;

    impl SourceFormatter for Rejecting {
        fn format(&self, _src: &str) -> Result<String, FormatError> {
            Err(FormatError::Rejected("1:1: expected 'package'".to_string()))
        }
    }

    struct Broken(fn() -> FormatError);

    impl SourceFormatter for Broken {
        fn format(&self, _src: &str) -> Result<String, FormatError> {
            Err((self.0)())
        }
    }

    fn unit(src: &str) -> SourceUnit {
        parse(src).unwrap()
    }

    fn method_names(methods: &[Method]) -> Vec<&str> {
        methods.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_quote_import_path() {
        assert_eq!(quote_import_path("strings"), "\"strings\"");
        assert_eq!(quote_import_path("\"net/http\""), "\"net/http\"");
    }

    #[test]
    fn test_render_layout() {
        let unit = unit("package store\n\nimport \"os\"\n\ntype Files interface {\n\tOpen(name string) (*os.File, error)\n}\n");
        let out = render(&unit, &GenerateOptions::new("Files")).unwrap();
        assert!(out.starts_with("// Code generated by godeco. DO NOT EDIT.\n\npackage store\n\nimport (\n\t\"os\"\n)\n\ntype FilesDecorator struct {\n"), "{out}");
        assert!(out.contains("\nfunc (this *FilesDecorator) Open(p0 string) (v0 *os.File, err error) {\n"), "{out}");
    }

    #[test]
    fn test_import_block_omitted_when_empty() {
        let unit = unit("package p\ntype T interface { Do() }\n");
        let out = render(&unit, &GenerateOptions::new("T")).unwrap();
        assert!(!out.contains("import"), "{out}");
    }

    #[test]
    fn test_interface_not_found() {
        let unit = unit("package p\ntype T interface { Do() }\n");
        let err = render(&unit, &GenerateOptions::new("Missing")).unwrap_err();
        assert_eq!(err, GenerateError::InterfaceNotFound("Missing".to_string()));
        assert_eq!(err.to_string(), "interface Missing not found");
    }

    #[test]
    fn test_render_is_deterministic() {
        let unit = unit("package p\nimport \"io\"\ntype T interface {\n\tA(io.Reader) error\n\tB() (int, io.Writer)\n}\n");
        let options = GenerateOptions::new("T").with_import("log");
        assert_eq!(render(&unit, &options), render(&unit, &options));
    }

    #[test]
    fn test_local_embeds_expand() {
        let unit = unit(
            r#"
package p

type Reader interface { Read() error }
type Closer interface {
    Close() error
    Read() error
}
type ReadCloser interface {
    Reader
    Closer
    Flush()
}
"#,
        );
        let methods = method_set(&unit, unit.interface("ReadCloser").unwrap()).unwrap();
        assert_eq!(method_names(&methods), vec!["Flush", "Read", "Close"]);
    }

    #[test]
    fn test_external_embed_rejected() {
        let unit = unit("package p\nimport \"io\"\ntype T interface {\n\tio.Reader\n}\n");
        let err = render(&unit, &GenerateOptions::new("T")).unwrap_err();
        assert_eq!(
            err,
            GenerateError::ExternalEmbed {
                interface: "T".to_string(),
                embed: "io.Reader".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_and_cyclic_embeds() {
        let unit = unit("package p\ntype A interface { B }\ntype B interface { A }\ntype C interface { Missing }\n");
        assert_eq!(
            render(&unit, &GenerateOptions::new("A")).unwrap_err(),
            GenerateError::EmbedCycle("A".to_string())
        );
        assert!(matches!(
            render(&unit, &GenerateOptions::new("C")).unwrap_err(),
            GenerateError::UnknownEmbed { .. }
        ));
    }

    #[test]
    fn test_generic_and_constraint_rejected() {
        let unit = unit("package p\ntype Box[T any] interface { Get() T }\ntype Num interface { ~int | ~float64 }\n");
        assert!(matches!(
            render(&unit, &GenerateOptions::new("Box")).unwrap_err(),
            GenerateError::GenericInterface { .. }
        ));
        assert_eq!(
            render(&unit, &GenerateOptions::new("Num")).unwrap_err(),
            GenerateError::ConstraintInterface("Num".to_string())
        );
    }

    #[test]
    fn test_generate_with_passthrough_has_no_warnings() {
        let unit = unit("package p\ntype T interface { Do() }\n");
        let options = GenerateOptions::new("T");
        let generated = generate(&unit, &options, &Passthrough).unwrap();
        assert!(generated.warnings.is_empty());
        assert_eq!(generated.code, render(&unit, &options).unwrap());
    }

    #[test]
    fn test_rejected_format_falls_back_to_raw() {
        let unit = unit("package p\ntype T interface { Do() }\n");
        let options = GenerateOptions::new("T");
        let generated = generate(&unit, &options, &Rejecting).unwrap();
        assert_eq!(generated.code, render(&unit, &options).unwrap());
        let kinds: Vec<WarningKind> = generated.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(kinds, vec![WarningKind::InvalidOutput, WarningKind::Hint]);
        assert!(generated.warnings[0].message.contains("expected 'package'"));
    }

    #[test]
    fn test_formatter_io_failures_are_not_invalid_output() {
        let unit = unit("package p\ntype T interface { Do() }\n");
        let options = GenerateOptions::new("T");
        let failures: [fn() -> FormatError; 2] = [
            || FormatError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe)),
            || FormatError::InvalidUtf8,
        ];
        for failure in failures {
            let generated = generate(&unit, &options, &Broken(failure)).unwrap();
            assert_eq!(generated.code, render(&unit, &options).unwrap());
            assert_eq!(generated.warnings.len(), 1);
            assert_eq!(generated.warnings[0].kind, WarningKind::FormatterUnavailable);
            assert!(!generated.warnings[0].message.contains("invalid Go"));
        }
    }
}
