//! Decorator generator for Go interfaces.
//!
//! Given a Go source file and the name of an interface it declares, this
//! crate emits a `<Interface>Decorator` struct that implements the same
//! interface. Every call is forwarded to an `Inner` value through a single
//! interception function, `func(name string, call func() error) error`,
//! which sees the method name and a closure performing the real call.
//!
//! ```ignore
//! use godeco::{generate, parse, GenerateOptions, Gofmt};
//!
//! let unit = parse(&std::fs::read_to_string("store.go")?)?;
//! let out = generate(&unit, &GenerateOptions::new("Store"), &Gofmt::default())?;
//! print!("{}", out.code);
//! ```

mod assemble;
mod config;
mod diagnostic;
mod error;
mod format;
mod lexer;
mod model;
mod naming;
mod parser;
mod resolver;
mod synth;

pub use assemble::{
    generate, method_set, quote_import_path, render, GenerateOptions, Generated, Warning,
    WarningKind, HEADER,
};
pub use config::{ConfigError, GenerateConfig, GodecoConfig, CONFIG_FILE};
pub use diagnostic::SourceDb;
pub use error::GenerateError;
pub use format::{FormatError, Gofmt, Passthrough, SourceFormatter};
pub use lexer::{LexError, Lexer, Token, TokenKind};
pub use model::*;
pub use naming::{normalize, Binding, NormalizedMethod, ReturnConvention};
pub use parser::{parse, ParseError, ParseResult};
pub use resolver::{import_lines, leaf_types, package_prefix, referenced_prefixes, select_imports};
pub use synth::{
    render_method, render_struct, DecoratorStruct, MethodShape, DECORATOR_SUFFIX,
    INTERCEPTOR_TYPE,
};
