//! Generation of custom resource declarations from message descriptors.
//!
//! A run starts from one root message. The root is queued on a [`TypePlanner`] under its
//! `<Root>Spec` name, and every message and enum reachable from it is queued by the field mapper
//! as fields are resolved. Once the planner reaches fixpoint, the declarations are assembled
//! behind the fixed resource envelope and passed through a validating formatter.

use std::collections::HashMap;

use itertools::Itertools;
use log::debug;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Ident, Path};

use crate::descriptor::{EnumDescriptor, MessageDescriptor, Registry};
use crate::error::{Error, FormatError, GenerateError};
use crate::ident::{match_ident, to_snake, to_upper_camel};
use crate::{Config, FullyQualifiedName, SynHelpers};

mod enums;
mod envelope;
mod messages;
pub mod planner;

pub use planner::{Planned, PlannerState, TypePlanner};

const GENERATED_HEADER: &str = "// This file is @generated by prost-crd.\n";

/// A pending generation action, bound to the descriptor it renders.
#[derive(Debug)]
pub(crate) enum TypeGenerator<'a> {
    Message {
        descriptor: MessageDescriptor<'a>,
        ident: String,
    },
    Enum(EnumDescriptor<'a>),
}

type Planner<'a> = TypePlanner<TypeGenerator<'a>>;

/// One generated type declaration.
#[derive(Debug)]
pub(crate) struct Declaration {
    ident: String,
    tokens: TokenStream,
}

/// Names shared by the envelope and the generated module, computed once from the root message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTypeInfo {
    /// Name of the root resource type.
    pub name: String,
    /// Name of the generated module.
    pub package: String,
    /// Rust module path of the protobuf package declaring the root message.
    pub import_path: String,
    /// Fully-qualified protobuf name of the root message.
    pub full_name: String,
}

impl ResourceTypeInfo {
    pub fn new(root: &MessageDescriptor<'_>, config: &Config) -> ResourceTypeInfo {
        let name = to_upper_camel(root.name());

        let proto_package = FullyQualifiedName::from_type_name(root.package());
        let package = match &config.package {
            Some(package) => package.clone(),
            None if proto_package.as_ref().is_empty() => to_snake(root.name()),
            None => to_snake(proto_package.name()),
        };

        let import_root = config.import_root.as_deref().unwrap_or("crate");
        let import_path = std::iter::once(import_root.to_string())
            .chain(proto_package.path_iterator().map(to_snake))
            .join("::");

        ResourceTypeInfo {
            name,
            package,
            import_path,
            full_name: root.full_name().to_string(),
        }
    }

    pub fn spec_name(&self) -> String {
        format!("{}Spec", self.name)
    }

    pub fn status_name(&self) -> String {
        format!("{}Status", self.name)
    }

    pub fn condition_name(&self) -> String {
        format!("{}Condition", self.name)
    }

    pub fn list_name(&self) -> String {
        format!("{}List", self.name)
    }
}

/// Configured derives and attributes, parsed before generation starts.
struct Attributes {
    derives: Vec<Path>,
    type_attributes: Vec<(String, Vec<Attribute>)>,
    field_attributes: Vec<(String, Vec<Attribute>)>,
}

impl Attributes {
    fn parse(config: &Config) -> Result<Attributes, Error> {
        let derives = config
            .derives
            .iter()
            .map(|derive| derive.parse_syn::<Path>().map_err(invalid_attribute(derive)))
            .collect::<Result<_, _>>()?;

        Ok(Attributes {
            derives,
            type_attributes: parse_attributes(&config.type_attributes)?,
            field_attributes: parse_attributes(&config.field_attributes)?,
        })
    }
}

fn parse_attributes(
    attributes: &[(String, String)],
) -> Result<Vec<(String, Vec<Attribute>)>, Error> {
    attributes
        .iter()
        .map(|(matcher, attribute)| {
            attribute
                .parse_outer_attributes()
                .map(|attrs| (matcher.clone(), attrs))
                .map_err(invalid_attribute(attribute))
        })
        .collect()
}

fn invalid_attribute(attribute: &str) -> impl FnOnce(syn::Error) -> Error {
    let attribute = attribute.to_string();
    move |source| Error::InvalidAttribute { attribute, source }
}

/// The state shared by every generator of one run.
pub(crate) struct CodeGenerator<'a> {
    config: &'a Config,
    attributes: Attributes,
    package: Ident,
    info: ResourceTypeInfo,
}

impl<'a> CodeGenerator<'a> {
    /// Generates the custom resource source for the named root message.
    pub(crate) fn generate(
        config: &Config,
        registry: &Registry,
        type_name: &str,
    ) -> Result<String, Error> {
        let root = registry
            .find_message_by_name(type_name)
            .ok_or_else(|| Error::NotFound {
                name: type_name.to_string(),
            })?;

        let attributes = Attributes::parse(config)?;
        let info = ResourceTypeInfo::new(&root, config);
        let package = info
            .package
            .parse_syn::<Ident>()
            .map_err(|source| Error::InvalidPackage {
                package: info.package.clone(),
                source,
            })?;

        let code_gen = CodeGenerator {
            config,
            attributes,
            package,
            info,
        };

        debug!(
            "root: {:?}, resource: {:?}, package: {:?}",
            root.full_name(),
            code_gen.info.name,
            code_gen.info.package
        );

        let mut planner = Planner::new();
        planner.request_type(
            root.full_name(),
            TypeGenerator::Message {
                descriptor: root,
                ident: code_gen.info.spec_name(),
            },
        );
        let declarations = planner.drain(|generator, planner| {
            code_gen.generate_type(generator, planner)
        })?;

        debug!("generated {} types", declarations.len());

        let file = code_gen.assemble(declarations)?;
        Ok(code_gen.format(file))
    }

    fn generate_type(
        &self,
        generator: TypeGenerator<'a>,
        planner: &mut Planner<'a>,
    ) -> Result<Declaration, GenerateError> {
        match generator {
            TypeGenerator::Message { descriptor, ident } => {
                let tokens = self.resolve_message(descriptor, &ident, planner)?;
                Ok(Declaration { ident, tokens })
            }
            TypeGenerator::Enum(descriptor) => {
                let (ident, tokens) = self.resolve_enum(descriptor)?;
                Ok(Declaration { ident, tokens })
            }
        }
    }

    /// Wraps the envelope and every generated declaration in the package module, and validates
    /// the result.
    fn assemble(&self, declarations: Vec<Planned<Declaration>>) -> Result<syn::File, Error> {
        let envelope = self.resolve_envelope().map_err(|source| Error::Generation {
            type_name: self.info.full_name.clone(),
            source,
        })?;

        let mut declared: HashMap<String, String> = HashMap::new();
        for ident in self.envelope_idents() {
            declared.insert(ident, "the resource envelope".to_string());
        }
        for declaration in &declarations {
            if let Some(first) =
                declared.insert(declaration.output.ident.clone(), declaration.name.clone())
            {
                return Err(FormatError::DuplicateDeclaration {
                    ident: declaration.output.ident.clone(),
                    first,
                    second: declaration.name.clone(),
                }
                .into());
            }
        }

        let package = &self.package;
        let docs = [
            format!(
                " Kubernetes custom resource types for the `{}` protobuf message.",
                self.info.full_name
            ),
            String::new(),
            format!(
                " `{}` wraps `{}::{}` in an object, spec and status envelope.",
                self.info.name, self.info.import_path, self.info.name
            ),
        ];
        let tokens = declarations.into_iter().map(|d| d.output.tokens);

        let file = quote! {
            #(#[doc = #docs])*
            pub mod #package {
                use ::k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;

                #envelope

                #(#tokens)*
            }
        };

        syn::parse2::<syn::File>(file)
            .map_err(FormatError::from)
            .map_err(Error::from)
    }

    fn format(&self, file: syn::File) -> String {
        #[cfg(feature = "format")]
        if self.config.fmt {
            return format!("{}{}", GENERATED_HEADER, prettyplease::unparse(&file));
        }

        format!("{}{}\n", GENERATED_HEADER, quote::ToTokens::to_token_stream(&file))
    }

    /// The derives every generated type carries.
    fn derives(&self) -> TokenStream {
        let derives = &self.attributes.derives;
        quote! {
            ::serde::Serialize, ::serde::Deserialize #(, #derives)*
        }
    }

    /// Configured attributes for the named message or enum.
    fn type_attributes(&self, fq_name: &str) -> TokenStream {
        let attributes = self
            .attributes
            .type_attributes
            .iter()
            .filter(|(matcher, _)| match_ident(matcher, fq_name, None))
            .flat_map(|(_, attrs)| attrs);
        quote! { #(#attributes)* }
    }

    /// Configured attributes for the named message field.
    fn field_attributes(&self, fq_message_name: &str, field_name: &str) -> TokenStream {
        let attributes = self
            .attributes
            .field_attributes
            .iter()
            .filter(|(matcher, _)| match_ident(matcher, fq_message_name, Some(field_name)))
            .flat_map(|(_, attrs)| attrs);
        quote! { #(#attributes)* }
    }
}

fn to_syn_ident(ident: &str) -> Result<Ident, GenerateError> {
    ident
        .parse_syn::<Ident>()
        .map_err(|source| GenerateError::InvalidIdent {
            ident: ident.to_string(),
            source,
        })
}
