//! Error types for custom resource generation.

use thiserror::Error;

/// Error type for loading descriptors and generating custom resources.
#[derive(Debug, Error)]
pub enum Error {
    /// The root type name does not resolve in the registry.
    #[error("failed to find type {name:?}")]
    NotFound {
        /// The requested type name.
        name: String,
    },

    /// The generator for a reachable type failed.
    #[error("failed to generate {type_name}: {source}")]
    Generation {
        /// Fully-qualified name of the type being generated.
        type_name: String,
        /// Underlying cause.
        #[source]
        source: GenerateError,
    },

    /// The assembled output is not structurally valid.
    #[error("failed to format generated source: {0}")]
    Format(#[from] FormatError),

    /// A configured derive or attribute does not parse.
    #[error("invalid attribute {attribute:?}: {source}")]
    InvalidAttribute {
        /// The attribute text as configured.
        attribute: String,
        /// Parse failure.
        #[source]
        source: syn::Error,
    },

    /// The configured module name is not a Rust identifier.
    #[error("invalid package {package:?}: {source}")]
    InvalidPackage {
        /// The module name.
        package: String,
        /// Parse failure.
        #[source]
        source: syn::Error,
    },

    /// IO error while reading descriptor inputs.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A binary descriptor set failed to decode.
    #[error("invalid FileDescriptorSet: {0}")]
    Decode(#[from] prost::DecodeError),

    /// `.proto` sources failed to compile.
    #[error("failed to compile protobuf sources: {0}")]
    Compile(#[from] protox::Error),
}

/// Failure of a single type generator.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A field refers to a type the registry does not know.
    #[error("field {field} refers to unknown type {type_name:?}")]
    UnresolvedType { field: String, type_name: String },

    /// A field carries a type value outside the protobuf field types.
    #[error("field {field} has unknown type value {value}")]
    UnknownFieldType { field: String, value: i32 },

    /// A message, enum or group field carries no type name.
    #[error("field {field} has no type name")]
    MissingTypeName { field: String },

    /// A map entry message does not have `key` and `value` fields.
    #[error("map entry {entry} is malformed")]
    MalformedMapEntry { entry: String },

    /// An enum has no values, so it cannot be given a default.
    #[error("enum {enum_name} has no values")]
    EmptyEnum { enum_name: String },

    /// Two values of one enum resolve to the same constant.
    #[error("enum values {first} and {second} both resolve to constant {constant}")]
    ConflictingEnumValues {
        constant: String,
        first: String,
        second: String,
    },

    /// A generated identifier is not a valid Rust identifier.
    #[error("invalid identifier {ident:?}: {source}")]
    InvalidIdent {
        ident: String,
        #[source]
        source: syn::Error,
    },
}

/// Failure of the final validation and formatting pass.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The output does not parse as a Rust source file. This is a generator bug.
    #[error(transparent)]
    Syntax(#[from] syn::Error),

    /// Two declarations share one Rust identifier.
    #[error("type {ident} is declared by both {first} and {second}")]
    DuplicateDeclaration {
        ident: String,
        first: String,
        second: String,
    },
}
