//! Error types for decorator generation.

use thiserror::Error;

/// Errors that stop generation for the selected interface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// The requested interface is not declared in the source unit.
    #[error("interface {0} not found")]
    InterfaceNotFound(String),

    /// Generic interfaces would need a generic decorator type.
    #[error("interface {name} has type parameters [{params}]; generic interfaces cannot be decorated")]
    GenericInterface { name: String, params: String },

    /// Interfaces with type-set elements can only be used as constraints.
    #[error("interface {0} is a type constraint and has no method set to decorate")]
    ConstraintInterface(String),

    /// Embedded interface from another package; its methods are unknown here.
    #[error("interface {interface} embeds {embed}, which is not declared in this file")]
    ExternalEmbed { interface: String, embed: String },

    /// Embedded name that is not an interface declared in this file.
    #[error("interface {interface} embeds {embed}, which is not an interface declared in this file")]
    UnknownEmbed { interface: String, embed: String },

    #[error("cycle detected while expanding embedded interface {0}")]
    EmbedCycle(String),
}
