use proc_macro2::TokenStream;
use quote::quote;

/// The map collection type to output for Protobuf `map` fields.
#[non_exhaustive]
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapType {
    /// The [`std::collections::BTreeMap`] type.
    #[default]
    BTreeMap,
    /// The [`std::collections::HashMap`] type.
    HashMap,
}

/// The bytes collection type to output for Protobuf `bytes` fields.
#[non_exhaustive]
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BytesType {
    /// The [`Vec<u8>`] type.
    #[default]
    Vec,
    /// The `k8s_openapi::ByteString` type, which serializes as base64 like the protobuf JSON
    /// mapping does.
    ByteString,
}

impl MapType {
    /// The fully-qualified Rust type corresponding to the map type.
    pub fn rust_type(&self) -> TokenStream {
        match self {
            MapType::BTreeMap => quote!(::std::collections::BTreeMap),
            MapType::HashMap => quote!(::std::collections::HashMap),
        }
    }

    /// The path of the emptiness check used to skip serializing empty maps.
    pub fn is_empty_path(&self) -> &'static str {
        match self {
            MapType::BTreeMap => "::std::collections::BTreeMap::is_empty",
            MapType::HashMap => "::std::collections::HashMap::is_empty",
        }
    }
}

impl BytesType {
    /// The fully-qualified Rust type corresponding to the bytes type.
    pub fn rust_type(&self) -> TokenStream {
        match self {
            BytesType::Vec => quote!(::std::vec::Vec<u8>),
            BytesType::ByteString => quote!(::k8s_openapi::ByteString),
        }
    }

    /// The path of the emptiness check used to skip serializing empty byte sequences, if the
    /// type has one.
    pub fn is_empty_path(&self) -> Option<&'static str> {
        match self {
            BytesType::Vec => Some("::std::vec::Vec::is_empty"),
            BytesType::ByteString => None,
        }
    }
}
