//! Rendering of the decorator type and its forwarding methods.

use std::fmt;

use crate::naming::{Binding, NormalizedMethod, ReturnConvention};

/// Suffix appended to the interface name to name the decorator type.
pub const DECORATOR_SUFFIX: &str = "Decorator";

/// Type of the interception function every call is routed through.
pub const INTERCEPTOR_TYPE: &str = "func(name string, call func() error) error";

/// `type <Interface>Decorator struct { ... }`
pub struct DecoratorStruct<'a> {
    pub interface: &'a str,
}

impl fmt::Display for DecoratorStruct<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "type {}{} struct {{", self.interface, DECORATOR_SUFFIX)?;
        writeln!(f, "\tInner {}", self.interface)?;
        writeln!(f, "\tDecorator {}", INTERCEPTOR_TYPE)?;
        writeln!(f, "}}")
    }
}

/// One forwarding method, with every piece of the signature already
/// formatted.
pub struct MethodShape<'a> {
    pub interface: &'a str,
    pub method: &'a str,
    /// `p0 string, p1 ...interface{}`
    pub params: String,
    /// `v0 string, err error`
    pub results: String,
    /// `p0, p1...`
    pub forward_args: String,
    /// `v0, err`; empty when the method has no results.
    pub captures: String,
    pub convention: ReturnConvention,
}

impl<'a> MethodShape<'a> {
    pub fn new(interface: &'a str, method: &'a NormalizedMethod) -> Self {
        Self {
            interface,
            method: &method.name,
            params: name_and_type_list(&method.params),
            results: name_and_type_list(&method.results),
            forward_args: forward_args(&method.params),
            captures: name_list(&method.results),
            convention: method.convention,
        }
    }
}

impl fmt::Display for MethodShape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "func (this *{}{}) {}({}) ({}) {{",
            self.interface, DECORATOR_SUFFIX, self.method, self.params, self.results
        )?;
        writeln!(f, "\tcall := func() error {{")?;
        if self.convention == ReturnConvention::ErrorTerminated {
            writeln!(f, "\t\tvar err error")?;
        }

        write!(f, "\t\t")?;
        if !self.captures.is_empty() {
            write!(f, "{} = ", self.captures)?;
        }
        writeln!(f, "this.Inner.{}({})", self.method, self.forward_args)?;

        match self.convention {
            ReturnConvention::ErrorTerminated => {
                writeln!(f, "\t\treturn err")?;
                writeln!(f, "\t}}")?;
                writeln!(f, "\terr = this.Decorator(\"{}\", call)", self.method)?;
            }
            ReturnConvention::Plain => {
                writeln!(f, "\t\treturn nil")?;
                writeln!(f, "\t}}")?;
                writeln!(f, "\t_ = this.Decorator(\"{}\", call)", self.method)?;
            }
        }

        if self.captures.is_empty() {
            writeln!(f, "\treturn")?;
        } else {
            writeln!(f, "\treturn {}", self.captures)?;
        }
        writeln!(f, "}}")
    }
}

/// Render the decorator struct declaration for `interface`.
pub fn render_struct(interface: &str) -> String {
    DecoratorStruct { interface }.to_string()
}

/// Render the forwarding method for one normalized interface method.
pub fn render_method(interface: &str, method: &NormalizedMethod) -> String {
    MethodShape::new(interface, method).to_string()
}

fn name_and_type_list(bindings: &[Binding]) -> String {
    bindings
        .iter()
        .map(|b| format!("{} {}", b.name, b.ty))
        .collect::<Vec<_>>()
        .join(", ")
}

fn name_list(bindings: &[Binding]) -> String {
    bindings
        .iter()
        .map(|b| b.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parameter names as passed to the inner call; variadic parameters are
/// spread with `...`.
fn forward_args(params: &[Binding]) -> String {
    params
        .iter()
        .map(|b| {
            if b.is_variadic() {
                format!("{}...", b.name)
            } else {
                b.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Method, TypeDescriptor};
    use crate::naming::normalize;

    fn render(name: &str, params: &[&str], results: &[&str]) -> String {
        let method = Method {
            name: name.to_string(),
            params: params.iter().map(|t| TypeDescriptor::leaf(*t)).collect(),
            results: results.iter().map(|t| TypeDescriptor::leaf(*t)).collect(),
        };
        render_method("Sample", &normalize(&method))
    }

    #[test]
    fn test_struct_declaration() {
        assert_eq!(
            render_struct("Sample"),
            "type SampleDecorator struct {\n\
             \tInner Sample\n\
             \tDecorator func(name string, call func() error) error\n\
             }\n"
        );
    }

    #[test]
    fn test_error_only_method() {
        assert_eq!(
            render("Maybe", &[], &["error"]),
            "func (this *SampleDecorator) Maybe() (err error) {\n\
             \tcall := func() error {\n\
             \t\tvar err error\n\
             \t\terr = this.Inner.Maybe()\n\
             \t\treturn err\n\
             \t}\n\
             \terr = this.Decorator(\"Maybe\", call)\n\
             \treturn err\n\
             }\n"
        );
    }

    #[test]
    fn test_no_result_method() {
        assert_eq!(
            render("Do", &[], &[]),
            "func (this *SampleDecorator) Do() () {\n\
             \tcall := func() error {\n\
             \t\tthis.Inner.Do()\n\
             \t\treturn nil\n\
             \t}\n\
             \t_ = this.Decorator(\"Do\", call)\n\
             \treturn\n\
             }\n"
        );
    }

    #[test]
    fn test_plain_method_with_result() {
        let out = render("Interface", &["interface{}"], &["string"]);
        assert!(out.contains("Interface(p0 interface{}) (v0 string) {"), "{out}");
        assert!(out.contains("\t\tv0 = this.Inner.Interface(p0)\n"), "{out}");
        assert!(out.contains("\t\treturn nil\n"), "{out}");
        assert!(out.contains("\treturn v0\n"), "{out}");
        assert!(!out.contains("var err error"), "{out}");
    }

    #[test]
    fn test_multiple_results_with_error() {
        let out = render("Remote", &["os.File"], &["[]strings.Reader", "*os.File", "error"]);
        assert!(
            out.contains("Remote(p0 os.File) (v0 []strings.Reader, v1 *os.File, err error) {"),
            "{out}"
        );
        assert!(out.contains("\t\tv0, v1, err = this.Inner.Remote(p0)\n"), "{out}");
        assert!(out.contains("\terr = this.Decorator(\"Remote\", call)\n"), "{out}");
        assert!(out.contains("\treturn v0, v1, err\n"), "{out}");
    }

    #[test]
    fn test_variadic_forwarding() {
        let out = render("Range", &["string", "...interface{}"], &[]);
        assert!(out.contains("Range(p0 string, p1 ...interface{}) () {"), "{out}");
        assert!(out.contains("this.Inner.Range(p0, p1...)"), "{out}");
    }
}
