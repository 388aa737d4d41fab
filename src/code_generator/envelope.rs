use super::*;

impl CodeGenerator<'_> {
    /// The identifiers the envelope declares.
    pub(super) fn envelope_idents(&self) -> [String; 4] {
        [
            self.info.name.clone(),
            self.info.list_name(),
            self.info.status_name(),
            self.info.condition_name(),
        ]
    }

    /// Renders the object, list, status and condition types wrapping the generated spec.
    ///
    /// The envelope is identical for every root type up to its names.
    pub(super) fn resolve_envelope(&self) -> Result<TokenStream, GenerateError> {
        let name = to_syn_ident(&self.info.name)?;
        let spec = to_syn_ident(&self.info.spec_name())?;
        let list = to_syn_ident(&self.info.list_name())?;
        let status = to_syn_ident(&self.info.status_name())?;
        let condition = to_syn_ident(&self.info.condition_name())?;

        let object_doc = format!(
            " A `{}` custom resource, holding `{}` as its spec.",
            self.info.name, self.info.full_name
        );
        let list_doc = format!(" A list of `{}` custom resources.", self.info.name);
        let status_doc = format!(" The observed state of a `{}`.", self.info.name);
        let condition_doc = format!(
            " One aspect of the observed state of a `{}`.",
            self.info.name
        );

        Ok(quote! {
            #[doc = #object_doc]
            #[derive(Clone, Debug, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
            #[serde(rename_all = "camelCase")]
            pub struct #name {
                pub api_version: ::std::string::String,
                pub kind: ::std::string::String,
                #[serde(default)]
                pub metadata: metav1::ObjectMeta,
                #[serde(default)]
                pub spec: #spec,
                #[serde(default, skip_serializing_if = "::std::option::Option::is_none")]
                pub status: ::std::option::Option<#status>,
            }

            #[doc = #list_doc]
            #[derive(Clone, Debug, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
            #[serde(rename_all = "camelCase")]
            pub struct #list {
                pub api_version: ::std::string::String,
                pub kind: ::std::string::String,
                #[serde(default)]
                pub metadata: metav1::ListMeta,
                #[serde(default)]
                pub items: ::std::vec::Vec<#name>,
            }

            #[doc = #status_doc]
            #[derive(Clone, Debug, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
            #[serde(rename_all = "camelCase")]
            pub struct #status {
                #[serde(default, skip_serializing_if = "::std::vec::Vec::is_empty")]
                pub conditions: ::std::vec::Vec<#condition>,
            }

            #[doc = #condition_doc]
            #[derive(Clone, Debug, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
            #[serde(rename_all = "camelCase")]
            pub struct #condition {
                /// Type of the condition, in `CamelCase`.
                #[serde(rename = "type")]
                pub r#type: ::std::string::String,
                /// One of `True`, `False` or `Unknown`.
                pub status: ::std::string::String,
                /// The `.metadata.generation` the condition was set for.
                #[serde(default, skip_serializing_if = "::std::option::Option::is_none")]
                pub observed_generation: ::std::option::Option<i64>,
                /// Last time the condition changed status.
                pub last_transition_time: metav1::Time,
                /// Machine-readable reason for the last transition, in `CamelCase`.
                pub reason: ::std::string::String,
                /// Human-readable details about the last transition.
                pub message: ::std::string::String,
            }
        })
    }
}
