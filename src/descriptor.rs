//! A read-only registry of protobuf message and enum descriptors.
//!
//! The registry is populated from `FileDescriptorSet`s, either decoded from the binary output of
//! `protoc --include_imports -o` or compiled in-process from `.proto` sources. Lookups hand out
//! lightweight descriptor views which borrow from the registry.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use log::debug;
use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet,
};

use crate::error::{Error, GenerateError};
use crate::syntax::Syntax;
use crate::FullyQualifiedName;

/// The domain used to build type URLs for `google.protobuf.Any`.
pub const TYPE_URL_PREFIX: &str = "type.googleapis.com";

struct MessageEntry {
    proto: DescriptorProto,
    package: String,
    syntax: Syntax,
}

struct EnumEntry {
    proto: EnumDescriptorProto,
}

/// Resolves fully-qualified protobuf names to message and enum descriptors.
#[derive(Default)]
pub struct Registry {
    files: HashSet<String>,
    file_protos: Vec<FileDescriptorProto>,
    messages: BTreeMap<String, MessageEntry>,
    enums: BTreeMap<String, EnumEntry>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Builds a registry from a descriptor set.
    pub fn from_file_descriptor_set(set: FileDescriptorSet) -> Registry {
        let mut registry = Registry::new();
        registry.add_file_descriptor_set(set);
        registry
    }

    /// Adds every file of a descriptor set to the registry.
    pub fn add_file_descriptor_set(&mut self, set: FileDescriptorSet) {
        for file in set.file {
            self.add_file(file);
        }
    }

    /// Adds a single file to the registry. Files are identified by name, and a file which was
    /// already added is skipped, so overlapping descriptor sets may be merged.
    pub fn add_file(&mut self, file: FileDescriptorProto) {
        if !self.files.insert(file.name().to_string()) {
            debug!("skipping duplicate file {:?}", file.name());
            return;
        }

        debug!("file: {:?}, package: {:?}", file.name(), file.package());
        self.file_protos.push(file.clone());

        let package = file.package().to_string();
        let syntax = Syntax::from(file.syntax.as_deref());
        let scope = FullyQualifiedName::new(&package, &[] as &[&str], "");

        for msg in file.message_type {
            self.add_message(&scope, &package, syntax, msg);
        }
        for desc in file.enum_type {
            self.add_enum(&scope, desc);
        }
    }

    fn add_message(
        &mut self,
        scope: &FullyQualifiedName,
        package: &str,
        syntax: Syntax,
        mut msg: DescriptorProto,
    ) {
        let msg_name = scope.join(msg.name());

        for nested in std::mem::take(&mut msg.nested_type) {
            self.add_message(&msg_name, package, syntax, nested);
        }
        for desc in std::mem::take(&mut msg.enum_type) {
            self.add_enum(&msg_name, desc);
        }

        self.messages.insert(
            msg_name.as_ref().to_string(),
            MessageEntry {
                proto: msg,
                package: package.to_string(),
                syntax,
            },
        );
    }

    fn add_enum(&mut self, scope: &FullyQualifiedName, desc: EnumDescriptorProto) {
        let enum_name = scope.join(desc.name());
        self.enums
            .insert(enum_name.as_ref().to_string(), EnumEntry { proto: desc });
    }

    /// Returns every file added to the registry, in the order they were added.
    pub fn file_descriptor_set(&self) -> FileDescriptorSet {
        FileDescriptorSet {
            file: self.file_protos.clone(),
        }
    }

    /// Decodes a binary `FileDescriptorSet` and adds its files to the registry.
    pub fn decode_file_descriptor_set(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let set = FileDescriptorSet::decode(bytes)?;
        self.add_file_descriptor_set(set);
        Ok(())
    }

    /// Reads a binary `FileDescriptorSet` from disk and adds its files to the registry.
    pub fn load_file_descriptor_set(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        let bytes = fs::read(path)?;
        self.decode_file_descriptor_set(&bytes)
    }

    /// Compiles `.proto` files, and everything they import, into the registry.
    ///
    /// The `.proto` files must be found in one of the provided include directories.
    pub fn compile_protos(
        &mut self,
        protos: &[impl AsRef<Path>],
        includes: &[impl AsRef<Path>],
    ) -> Result<(), Error> {
        let set = protox::compile(protos, includes)?;
        self.add_file_descriptor_set(set);
        Ok(())
    }

    /// Looks up a message by its fully-qualified name. A leading dot is accepted.
    pub fn find_message_by_name(&self, name: &str) -> Option<MessageDescriptor<'_>> {
        let name = FullyQualifiedName::from_type_name(name);
        self.messages
            .get_key_value(name.as_ref())
            .map(|(full_name, entry)| MessageDescriptor {
                registry: self,
                full_name,
                entry,
            })
    }

    /// Looks up an enum by its fully-qualified name. A leading dot is accepted.
    pub fn find_enum_by_name(&self, name: &str) -> Option<EnumDescriptor<'_>> {
        let name = FullyQualifiedName::from_type_name(name);
        self.enums
            .get_key_value(name.as_ref())
            .map(|(full_name, entry)| EnumDescriptor {
                full_name,
                proto: &entry.proto,
            })
    }

    /// Iterates over all registered messages, ordered by name. The synthetic entry types of
    /// `map` fields are skipped.
    pub fn messages(&self) -> impl Iterator<Item = MessageDescriptor<'_>> {
        self.messages
            .iter()
            .map(move |(full_name, entry)| MessageDescriptor {
                registry: self,
                full_name,
                entry,
            })
            .filter(|msg| !msg.is_map_entry())
    }

    /// Returns the names of all messages which have a field whose message or enum type is
    /// `type_name`, ordered by name. A `map` field contains the type of its values.
    pub fn messages_containing(&self, type_name: &str) -> Vec<&str> {
        let wanted = FullyQualifiedName::from_type_name(type_name);
        self.messages()
            .filter(|msg| {
                msg.entry
                    .proto
                    .field
                    .iter()
                    .any(|field| self.field_refers_to(field, &wanted))
            })
            .map(|msg| msg.full_name())
            .collect()
    }

    fn field_refers_to(&self, field: &FieldDescriptorProto, wanted: &FullyQualifiedName) -> bool {
        let Some(name) = field.type_name.as_deref() else {
            return false;
        };
        let name = FullyQualifiedName::from_type_name(name);
        if name == *wanted {
            return true;
        }
        match self.find_message_by_name(name.as_ref()) {
            Some(entry) if field.label() == Label::Repeated && entry.is_map_entry() => entry
                .entry
                .proto
                .field
                .iter()
                .filter(|field| field.number() == 2)
                .any(|value| self.field_refers_to(value, wanted)),
            _ => false,
        }
    }

    /// Returns the `google.protobuf.Any` type URL of a registered message.
    pub fn type_url(&self, name: &str) -> Option<String> {
        self.find_message_by_name(name)
            .map(|msg| format!("{}/{}", TYPE_URL_PREFIX, msg.full_name()))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("files", &self.files.len())
            .field("messages", &self.messages.len())
            .field("enums", &self.enums.len())
            .finish()
    }
}

/// Field cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    Repeated,
}

/// A message type in the registry.
#[derive(Clone, Copy)]
pub struct MessageDescriptor<'a> {
    registry: &'a Registry,
    full_name: &'a str,
    entry: &'a MessageEntry,
}

impl<'a> MessageDescriptor<'a> {
    /// The short name of the message.
    pub fn name(&self) -> &'a str {
        self.entry.proto.name()
    }

    /// The fully-qualified name of the message, without a leading dot.
    pub fn full_name(&self) -> &'a str {
        self.full_name
    }

    /// The protobuf package which declares the message.
    pub fn package(&self) -> &'a str {
        &self.entry.package
    }

    /// Whether this is the synthetic entry type of a `map` field.
    pub fn is_map_entry(&self) -> bool {
        self.entry
            .proto
            .options
            .as_ref()
            .is_some_and(|options| options.map_entry())
    }

    /// The fields of the message, in declaration order.
    pub fn fields(&self) -> impl ExactSizeIterator<Item = FieldDescriptor<'a>> + 'a {
        let message = *self;
        let entry = self.entry;
        entry
            .proto
            .field
            .iter()
            .map(move |proto| FieldDescriptor { message, proto })
    }

    fn field_by_number(&self, number: i32) -> Option<FieldDescriptor<'a>> {
        self.fields().find(|field| field.number() == number)
    }
}

impl fmt::Debug for MessageDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageDescriptor")
            .field(&self.full_name)
            .finish()
    }
}

/// An enum type in the registry.
#[derive(Clone, Copy)]
pub struct EnumDescriptor<'a> {
    full_name: &'a str,
    proto: &'a EnumDescriptorProto,
}

impl<'a> EnumDescriptor<'a> {
    /// The short name of the enum.
    pub fn name(&self) -> &'a str {
        self.proto.name()
    }

    /// The fully-qualified name of the enum, without a leading dot.
    pub fn full_name(&self) -> &'a str {
        self.full_name
    }

    /// The values of the enum, in declaration order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = EnumValueDescriptor<'a>> + 'a {
        let parent = *self;
        let proto = self.proto;
        proto
            .value
            .iter()
            .map(move |proto| EnumValueDescriptor { parent, proto })
    }
}

impl fmt::Debug for EnumDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EnumDescriptor")
            .field(&self.full_name)
            .finish()
    }
}

/// A named value of an enum.
#[derive(Clone, Copy)]
pub struct EnumValueDescriptor<'a> {
    parent: EnumDescriptor<'a>,
    proto: &'a EnumValueDescriptorProto,
}

impl<'a> EnumValueDescriptor<'a> {
    pub fn name(&self) -> &'a str {
        self.proto.name()
    }

    pub fn number(&self) -> i32 {
        self.proto.number()
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.parent.full_name(), self.name())
    }
}

/// The type of a field, with message and enum references resolved.
#[derive(Debug, Clone, Copy)]
pub enum Kind<'a> {
    Bool,
    Int32,
    Sint32,
    Sfixed32,
    Uint32,
    Fixed32,
    Int64,
    Sint64,
    Sfixed64,
    Uint64,
    Fixed64,
    Float,
    Double,
    String,
    Bytes,
    Message(MessageDescriptor<'a>),
    Group(MessageDescriptor<'a>),
    Enum(EnumDescriptor<'a>),
}

impl fmt::Display for Kind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Bool => f.write_str("bool"),
            Kind::Int32 => f.write_str("int32"),
            Kind::Sint32 => f.write_str("sint32"),
            Kind::Sfixed32 => f.write_str("sfixed32"),
            Kind::Uint32 => f.write_str("uint32"),
            Kind::Fixed32 => f.write_str("fixed32"),
            Kind::Int64 => f.write_str("int64"),
            Kind::Sint64 => f.write_str("sint64"),
            Kind::Sfixed64 => f.write_str("sfixed64"),
            Kind::Uint64 => f.write_str("uint64"),
            Kind::Fixed64 => f.write_str("fixed64"),
            Kind::Float => f.write_str("float"),
            Kind::Double => f.write_str("double"),
            Kind::String => f.write_str("string"),
            Kind::Bytes => f.write_str("bytes"),
            Kind::Message(msg) | Kind::Group(msg) => f.write_str(msg.full_name()),
            Kind::Enum(desc) => f.write_str(desc.full_name()),
        }
    }
}

/// A field of a message.
#[derive(Clone, Copy)]
pub struct FieldDescriptor<'a> {
    message: MessageDescriptor<'a>,
    proto: &'a FieldDescriptorProto,
}

impl<'a> FieldDescriptor<'a> {
    pub fn name(&self) -> &'a str {
        self.proto.name()
    }

    /// The fully-qualified name of the field, `<message>.<field>`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.message.full_name(), self.name())
    }

    pub fn number(&self) -> i32 {
        self.proto.number()
    }

    /// The message which declares this field.
    pub fn containing_message(&self) -> MessageDescriptor<'a> {
        self.message
    }

    pub fn cardinality(&self) -> Cardinality {
        match self.proto.label() {
            Label::Repeated => Cardinality::Repeated,
            Label::Optional | Label::Required => Cardinality::Singular,
        }
    }

    /// Whether the field is a list. Map fields are not lists.
    pub fn is_list(&self) -> bool {
        self.cardinality() == Cardinality::Repeated && !self.is_map()
    }

    /// Whether the field is a `map<K, V>` field.
    pub fn is_map(&self) -> bool {
        self.cardinality() == Cardinality::Repeated
            && matches!(self.kind(), Ok(Kind::Message(entry)) if entry.is_map_entry())
    }

    /// Whether the field distinguishes "explicitly set" from "unset".
    pub fn has_presence(&self) -> bool {
        if self.cardinality() == Cardinality::Repeated {
            return false;
        }
        if self.proto.proto3_optional() || self.proto.oneof_index.is_some() {
            return true;
        }
        if matches!(self.kind(), Ok(Kind::Message(_) | Kind::Group(_))) {
            return true;
        }
        match self.message.entry.syntax {
            Syntax::Proto2 | Syntax::Editions => true,
            Syntax::Proto3 => false,
        }
    }

    /// Resolves the type of the field.
    pub fn kind(&self) -> Result<Kind<'a>, GenerateError> {
        let type_ = match self.proto.r#type {
            Some(value) => Some(Type::try_from(value).map_err(|_| {
                GenerateError::UnknownFieldType {
                    field: self.full_name(),
                    value,
                }
            })?),
            None => None,
        };

        let kind = match type_ {
            Some(Type::Bool) => Kind::Bool,
            Some(Type::Int32) => Kind::Int32,
            Some(Type::Sint32) => Kind::Sint32,
            Some(Type::Sfixed32) => Kind::Sfixed32,
            Some(Type::Uint32) => Kind::Uint32,
            Some(Type::Fixed32) => Kind::Fixed32,
            Some(Type::Int64) => Kind::Int64,
            Some(Type::Sint64) => Kind::Sint64,
            Some(Type::Sfixed64) => Kind::Sfixed64,
            Some(Type::Uint64) => Kind::Uint64,
            Some(Type::Fixed64) => Kind::Fixed64,
            Some(Type::Float) => Kind::Float,
            Some(Type::Double) => Kind::Double,
            Some(Type::String) => Kind::String,
            Some(Type::Bytes) => Kind::Bytes,
            Some(Type::Message) => Kind::Message(self.resolve_message()?),
            Some(Type::Group) => Kind::Group(self.resolve_message()?),
            Some(Type::Enum) => Kind::Enum(self.resolve_enum()?),
            // Unlinked descriptors may leave the type unset for references.
            None => {
                let type_name = self.type_name()?;
                if let Some(msg) = self.message.registry.find_message_by_name(type_name) {
                    Kind::Message(msg)
                } else if let Some(desc) = self.message.registry.find_enum_by_name(type_name) {
                    Kind::Enum(desc)
                } else {
                    return Err(self.unresolved(type_name));
                }
            }
        };
        Ok(kind)
    }

    /// Returns the key and value fields of a map field, or `None` for other fields.
    #[allow(clippy::type_complexity)]
    pub fn map_entry(
        &self,
    ) -> Result<Option<(FieldDescriptor<'a>, FieldDescriptor<'a>)>, GenerateError> {
        if self.cardinality() != Cardinality::Repeated {
            return Ok(None);
        }
        let entry = match self.kind()? {
            Kind::Message(entry) if entry.is_map_entry() => entry,
            _ => return Ok(None),
        };
        match (entry.field_by_number(1), entry.field_by_number(2)) {
            (Some(key), Some(value)) if key.name() == "key" && value.name() == "value" => {
                Ok(Some((key, value)))
            }
            _ => Err(GenerateError::MalformedMapEntry {
                entry: entry.full_name().to_string(),
            }),
        }
    }

    fn type_name(&self) -> Result<&'a str, GenerateError> {
        self.proto
            .type_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| GenerateError::MissingTypeName {
                field: self.full_name(),
            })
    }

    fn resolve_message(&self) -> Result<MessageDescriptor<'a>, GenerateError> {
        let type_name = self.type_name()?;
        self.message
            .registry
            .find_message_by_name(type_name)
            .ok_or_else(|| self.unresolved(type_name))
    }

    fn resolve_enum(&self) -> Result<EnumDescriptor<'a>, GenerateError> {
        let type_name = self.type_name()?;
        self.message
            .registry
            .find_enum_by_name(type_name)
            .ok_or_else(|| self.unresolved(type_name))
    }

    fn unresolved(&self, type_name: &str) -> GenerateError {
        GenerateError::UnresolvedType {
            field: self.full_name(),
            type_name: type_name.to_string(),
        }
    }
}

impl fmt::Debug for FieldDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldDescriptor")
            .field(&self.full_name())
            .finish()
    }
}
