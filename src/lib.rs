#![doc(html_root_url = "https://docs.rs/prost-crd/0.1.0")]

//! `prost-crd` generates Kubernetes custom resource types from protobuf message descriptors.
//!
//! Given the fully-qualified name of a root message, every message and enum reachable from it
//! through its fields is discovered and rendered as a `serde` struct or enum. The root message
//! becomes the `spec` of a custom resource object, which is wrapped together with a list type and
//! a status type in a single Rust module.
//!
//! ## Example
//!
//! Given `src/widget.proto`:
//!
//! ```proto
//! syntax = "proto3";
//!
//! package widgets.v1;
//!
//! message Widget {
//!   enum Color {
//!     RED = 0;
//!     BLUE = 1;
//!   }
//!
//!   string name = 1;
//!   optional int32 count = 2;
//!   Color color = 3;
//!   Widget child = 4;
//! }
//! ```
//!
//! the custom resource source is generated with:
//!
//! ```rust,no_run
//! # fn main() -> Result<(), prost_crd::Error> {
//! let mut registry = prost_crd::Registry::new();
//! registry.compile_protos(&["src/widget.proto"], &["src"])?;
//!
//! let source = prost_crd::Config::new()
//!     .derive("::schemars::JsonSchema")
//!     .generate(&registry, "widgets.v1.Widget")?;
//! println!("{}", source);
//! # Ok(())
//! # }
//! ```
//!
//! which declares, inside `pub mod v1`, the `Widget`, `WidgetList`, `WidgetStatus` and
//! `WidgetCondition` envelope types, a `WidgetSpec` struct for the message itself and a
//! `ColorType` enum with the `RedColorType` and `BlueColorType` variants.
//!
//! ## Mapping
//!
//! | protobuf | Rust |
//! | --- | --- |
//! | `bool` | `bool` |
//! | `int32`, `sint32`, `sfixed32` | `i32` |
//! | `uint32`, `fixed32` | `u32` |
//! | `int64`, `sint64`, `sfixed64` | `i64` |
//! | `uint64`, `fixed64` | `u64` |
//! | `string` | `String` |
//! | `bytes` | `Vec<u8>`, or `k8s_openapi::ByteString` |
//! | message | `Option<Box<Message>>` |
//! | enum | `EnumType` |
//! | `repeated T` | `Vec<T>` |
//! | `map<K, V>` | `BTreeMap<K, V>`, or `HashMap<K, V>` |
//! | `float`, `double` | omitted, and listed in the struct documentation |
//! | group | a `Vec` placeholder documented as not implemented |
//!
//! Scalar fields with explicit presence are wrapped in `Option`. Every field is renamed to the
//! `lowerCamelCase` form of its protobuf name when serialized.
//!
//! ## Feature Flags
//!
//! - `format`: pretty-print the generated source with `prettyplease`. Enabled by default.

mod code_generator;
mod collections;
mod config;
mod descriptor;
mod error;
mod fully_qualified_name;
mod ident;
mod syn_helpers;
mod syntax;

pub use code_generator::{Planned, PlannerState, ResourceTypeInfo, TypePlanner};
pub use collections::{BytesType, MapType};
pub use config::Config;
pub use descriptor::{
    Cardinality, EnumDescriptor, EnumValueDescriptor, FieldDescriptor, Kind, MessageDescriptor,
    Registry, TYPE_URL_PREFIX,
};
pub use error::{Error, FormatError, GenerateError};
pub use fully_qualified_name::FullyQualifiedName;

use syn_helpers::SynHelpers;

/// Generates the custom resource source for the named root message with the default
/// configuration.
///
/// See [`Config::generate`].
pub fn generate_custom_resource(registry: &Registry, type_name: &str) -> Result<String, Error> {
    Config::new().generate(registry, type_name)
}
