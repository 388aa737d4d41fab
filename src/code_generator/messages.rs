use super::*;
use crate::descriptor::{FieldDescriptor, Kind};
use crate::ident::{enum_type_name, field_name, serialized_name, type_name};

const NOT_IMPLEMENTED: &str = " Not implemented.";
const FLOAT_OMITTED: &str = "floating point fields are not supported";

/// The collection shape of a generated field.
#[derive(Debug)]
pub(crate) enum Shape {
    /// A non-nullable value.
    Plain,
    /// `Option<T>`, for fields with explicit presence.
    Optional,
    /// `Option<Box<T>>`, for singular message fields.
    Boxed,
    /// `Vec<T>`.
    Repeated,
    /// A map keyed by the given scalar type.
    Map { key: TokenStream },
}

/// A field of a generated struct.
#[derive(Debug)]
pub(crate) struct FieldDecl {
    ty: TokenStream,
    shape: Shape,
    ident: String,
    serialized: String,
    note: Option<&'static str>,
    skip_if_empty: Option<&'static str>,
}

/// The result of mapping one protobuf field.
#[derive(Debug)]
pub(crate) enum FieldMapping {
    Omitted { reason: String },
    Field(FieldDecl),
}

impl<'a> CodeGenerator<'a> {
    pub(super) fn resolve_message(
        &self,
        message: MessageDescriptor<'a>,
        ident: &str,
        planner: &mut Planner<'a>,
    ) -> Result<TokenStream, GenerateError> {
        debug!("  message: {:?}, type: {:?}", message.full_name(), ident);

        let mut fields = Vec::with_capacity(message.fields().len());
        let mut omitted = Vec::new();
        for field in message.fields() {
            match self.map_field(field, planner)? {
                FieldMapping::Field(decl) => {
                    fields.push(self.render_field(&message, &field, decl)?)
                }
                FieldMapping::Omitted { reason } => {
                    debug!("    omitted field: {:?}, {}", field.name(), reason);
                    omitted.push(format!(" - `{}`: {}.", field.name(), reason));
                }
            }
        }

        let mut docs = vec![format!(" `{}`", message.full_name())];
        if !omitted.is_empty() {
            docs.push(String::new());
            docs.push(" Omitted fields:".to_string());
            docs.extend(omitted);
        }

        let ident = to_syn_ident(ident)?;
        let derives = self.derives();
        let type_attributes = self.type_attributes(message.full_name());

        Ok(quote! {
            #(#[doc = #docs])*
            #[derive(Clone, Debug, Default, PartialEq, #derives)]
            #type_attributes
            pub struct #ident {
                #(#fields)*
            }
        })
    }

    /// Maps a field to its declaration, queueing every message and enum type it refers to.
    pub(crate) fn map_field(
        &self,
        field: FieldDescriptor<'a>,
        planner: &mut Planner<'a>,
    ) -> Result<FieldMapping, GenerateError> {
        let ident = field_name(&field);
        let serialized = serialized_name(&field);

        if let Some((key, value)) = field.map_entry()? {
            let key_ty = map_key_type(&field, key.kind()?)?;
            let value_kind = value.kind()?;
            let Some(ty) = self.resolve_type(value_kind, planner)? else {
                return Ok(omitted(value_kind));
            };
            debug!(
                "    map field: {:?}, key type: {}, value type: {}",
                field.name(),
                key_ty,
                ty
            );
            return Ok(FieldMapping::Field(FieldDecl {
                ty,
                shape: Shape::Map { key: key_ty },
                ident,
                serialized,
                note: None,
                skip_if_empty: None,
            }));
        }

        let kind = field.kind()?;
        let Some(ty) = self.resolve_type(kind, planner)? else {
            return Ok(omitted(kind));
        };

        let (shape, note, skip_if_empty) = match kind {
            Kind::Group(_) => (Shape::Repeated, Some(NOT_IMPLEMENTED), None),
            _ if field.is_list() => (Shape::Repeated, None, None),
            Kind::Message(_) => (Shape::Boxed, None, None),
            Kind::Bytes => (Shape::Plain, None, self.config.bytes_type.is_empty_path()),
            _ if field.has_presence() => (Shape::Optional, None, None),
            _ => (Shape::Plain, None, None),
        };

        debug!("    field: {:?}, type: {}, shape: {:?}", field.name(), ty, shape);

        Ok(FieldMapping::Field(FieldDecl {
            ty,
            shape,
            ident,
            serialized,
            note,
            skip_if_empty,
        }))
    }

    /// The Rust type of a value of the given kind, or `None` if the kind is not supported.
    fn resolve_type(
        &self,
        kind: Kind<'a>,
        planner: &mut Planner<'a>,
    ) -> Result<Option<TokenStream>, GenerateError> {
        let ty = match kind {
            Kind::Float | Kind::Double => return Ok(None),
            Kind::Bytes => self.config.bytes_type.rust_type(),
            Kind::Message(message) | Kind::Group(message) => {
                let ident = self.message_ident(&message);
                let ty = to_syn_ident(&ident)?;
                planner.request_type(
                    message.full_name(),
                    TypeGenerator::Message {
                        descriptor: message,
                        ident,
                    },
                );
                quote!(#ty)
            }
            Kind::Enum(desc) => {
                let ty = to_syn_ident(&enum_type_name(&desc))?;
                planner.request_type(desc.full_name(), TypeGenerator::Enum(desc));
                quote!(#ty)
            }
            scalar => match scalar_type(scalar) {
                Some(ty) => ty,
                None => return Ok(None),
            },
        };
        Ok(Some(ty))
    }

    /// The type name of a message, which is `<Root>Spec` for the root message.
    fn message_ident(&self, message: &MessageDescriptor<'_>) -> String {
        if message.full_name() == self.info.full_name {
            self.info.spec_name()
        } else {
            type_name(message)
        }
    }

    fn render_field(
        &self,
        message: &MessageDescriptor<'_>,
        field: &FieldDescriptor<'_>,
        decl: FieldDecl,
    ) -> Result<TokenStream, GenerateError> {
        let FieldDecl {
            ty,
            shape,
            ident,
            serialized,
            note,
            skip_if_empty,
        } = decl;

        let (ty, skip_if) = match shape {
            Shape::Plain => (ty, skip_if_empty),
            Shape::Optional => (
                quote!(::std::option::Option<#ty>),
                Some("::std::option::Option::is_none"),
            ),
            Shape::Boxed => (
                quote!(::std::option::Option<::std::boxed::Box<#ty>>),
                Some("::std::option::Option::is_none"),
            ),
            Shape::Repeated => (
                quote!(::std::vec::Vec<#ty>),
                Some("::std::vec::Vec::is_empty"),
            ),
            Shape::Map { key } => {
                let map = self.config.map_type.rust_type();
                (
                    quote!(#map<#key, #ty>),
                    Some(self.config.map_type.is_empty_path()),
                )
            }
        };

        let ident = to_syn_ident(&ident)?;
        let doc = format!(" `{}`", field.full_name());
        let note = note.map(|note| quote!(#[doc = ""] #[doc = #note]));
        let skip_if = skip_if.map(|path| quote!(, skip_serializing_if = #path));
        let field_attributes = self.field_attributes(message.full_name(), field.name());

        Ok(quote! {
            #[doc = #doc]
            #note
            #[serde(rename = #serialized, default #skip_if)]
            #field_attributes
            pub #ident: #ty,
        })
    }
}

fn omitted(kind: Kind<'_>) -> FieldMapping {
    FieldMapping::Omitted {
        reason: format!("{} ({})", FLOAT_OMITTED, kind),
    }
}

/// The Rust type of a scalar kind. Floating point kinds have none.
fn scalar_type(kind: Kind<'_>) -> Option<TokenStream> {
    let ty = match kind {
        Kind::Bool => quote!(bool),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => quote!(i32),
        Kind::Uint32 | Kind::Fixed32 => quote!(u32),
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => quote!(i64),
        Kind::Uint64 | Kind::Fixed64 => quote!(u64),
        Kind::String => quote!(::std::string::String),
        Kind::Float
        | Kind::Double
        | Kind::Bytes
        | Kind::Message(_)
        | Kind::Group(_)
        | Kind::Enum(_) => return None,
    };
    Some(ty)
}

/// Map keys are limited to integral, boolean and string kinds.
fn map_key_type(field: &FieldDescriptor<'_>, kind: Kind<'_>) -> Result<TokenStream, GenerateError> {
    match kind {
        Kind::Float | Kind::Double | Kind::Bytes => None,
        kind => scalar_type(kind),
    }
    .ok_or_else(|| GenerateError::MalformedMapEntry {
        entry: field
            .kind()
            .map(|kind| kind.to_string())
            .unwrap_or_else(|_| field.full_name()),
    })
}
