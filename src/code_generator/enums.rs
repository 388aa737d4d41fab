use std::collections::hash_map::Entry;

use super::*;
use crate::descriptor::EnumValueDescriptor;
use crate::ident::{enum_type_name, enum_value_name};

impl CodeGenerator<'_> {
    /// Renders an enum as a string-serialized Rust enum. The first value is the default, as
    /// protobuf defines it.
    pub(super) fn resolve_enum(
        &self,
        desc: EnumDescriptor<'_>,
    ) -> Result<(String, TokenStream), GenerateError> {
        let enum_name = enum_type_name(&desc);
        debug!("  enum: {:?}, type: {:?}", desc.full_name(), enum_name);

        if desc.values().len() == 0 {
            return Err(GenerateError::EmptyEnum {
                enum_name: desc.full_name().to_string(),
            });
        }

        let mut constants: HashMap<String, String> = HashMap::new();
        let mut variants = Vec::with_capacity(desc.values().len());
        for (idx, value) in desc.values().enumerate() {
            let constant = enum_value_name(&desc, &value);
            match constants.entry(constant) {
                Entry::Occupied(entry) => {
                    return Err(GenerateError::ConflictingEnumValues {
                        constant: entry.key().clone(),
                        first: entry.get().clone(),
                        second: value.full_name(),
                    });
                }
                Entry::Vacant(entry) => {
                    variants.push(self.resolve_enum_variant(&value, entry.key(), idx == 0)?);
                    entry.insert(value.full_name());
                }
            }
        }

        let docs = format!(" `{}`", desc.full_name());
        let enum_name_syn = to_syn_ident(&enum_name)?;
        let derives = self.derives();
        let type_attributes = self.type_attributes(desc.full_name());

        let tokens = quote! {
            #[doc = #docs]
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, #derives)]
            #type_attributes
            pub enum #enum_name_syn {
                #(#variants)*
            }
        };
        Ok((enum_name, tokens))
    }

    fn resolve_enum_variant(
        &self,
        value: &EnumValueDescriptor<'_>,
        constant: &str,
        default: bool,
    ) -> Result<TokenStream, GenerateError> {
        let variant = to_syn_ident(constant)?;
        let name = value.name();
        let docs = format!(" `{}` = {}", value.full_name(), value.number());
        let default = default.then_some(quote! { #[default] });

        Ok(quote! {
            #[doc = #docs]
            #[serde(rename = #name)]
            #default
            #variant,
        })
    }
}
