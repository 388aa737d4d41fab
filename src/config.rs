use crate::code_generator::CodeGenerator;
use crate::collections::{BytesType, MapType};
use crate::descriptor::Registry;
use crate::error::Error;

/// Configuration options for custom resource generation.
///
/// This configuration builder can be used to set non-default code generation options.
#[derive(Clone, Debug)]
pub struct Config {
    pub(crate) derives: Vec<String>,
    pub(crate) type_attributes: Vec<(String, String)>,
    pub(crate) field_attributes: Vec<(String, String)>,
    pub(crate) map_type: MapType,
    pub(crate) bytes_type: BytesType,
    pub(crate) package: Option<String>,
    pub(crate) import_root: Option<String>,
    pub(crate) fmt: bool,
}

impl Config {
    /// Creates a new code generator configuration with default options.
    pub fn new() -> Self {
        Config::default()
    }

    /// Adds a derive to every generated message and enum.
    ///
    /// # Example
    ///
    /// ```rust
    /// # let mut config = prost_crd::Config::new();
    /// config.derive("::schemars::JsonSchema");
    /// ```
    pub fn derive<S>(&mut self, path: S) -> &mut Self
    where
        S: AsRef<str>,
    {
        self.derives.push(path.as_ref().to_string());
        self
    }

    /// Add additional attribute to matched messages and enums.
    ///
    /// # Arguments
    ///
    /// **`path`** - a path matching any number of types. It works the same way as in
    /// [`field_attribute`](#method.field_attribute), just with the field name omitted.
    ///
    /// **`attribute`** - one or more outer attributes, placed before each matched type.
    ///
    /// # Example
    ///
    /// ```rust
    /// # let mut config = prost_crd::Config::new();
    /// // Reject unknown keys in every type of the `envoy.config` packages.
    /// config.type_attribute(".envoy.config", "#[serde(deny_unknown_fields)]");
    /// ```
    pub fn type_attribute<P, A>(&mut self, path: P, attribute: A) -> &mut Self
    where
        P: AsRef<str>,
        A: AsRef<str>,
    {
        self.type_attributes
            .push((path.as_ref().to_string(), attribute.as_ref().to_string()));
        self
    }

    /// Add additional attribute to matched fields.
    ///
    /// # Arguments
    ///
    /// **`path`** - a path matching any number of fields. A path starting with `.` matches a
    /// prefix of the fully-qualified field name, any other path matches a suffix, and `.`
    /// matches every field.
    ///
    /// **`attribute`** - one or more outer attributes, placed before each matched field.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # let mut config = prost_crd::Config::new();
    /// // Accept the legacy key of the `stat_prefix` field of any message.
    /// config.field_attribute("stat_prefix", "#[serde(alias = \"statPrefixV2\")]");
    /// ```
    pub fn field_attribute<P, A>(&mut self, path: P, attribute: A) -> &mut Self
    where
        P: AsRef<str>,
        A: AsRef<str>,
    {
        self.field_attributes
            .push((path.as_ref().to_string(), attribute.as_ref().to_string()));
        self
    }

    /// Configure the collection type generated for Protobuf `map` fields.
    pub fn map_type(&mut self, map_type: MapType) -> &mut Self {
        self.map_type = map_type;
        self
    }

    /// Configure the type generated for Protobuf `bytes` fields.
    pub fn bytes_type(&mut self, bytes_type: BytesType) -> &mut Self {
        self.bytes_type = bytes_type;
        self
    }

    /// Overrides the name of the generated module.
    ///
    /// By default the module is named after the last segment of the root message's package.
    pub fn package<S>(&mut self, package: S) -> &mut Self
    where
        S: Into<String>,
    {
        self.package = Some(package.into());
        self
    }

    /// Sets the Rust module under which the protobuf types of the root message are generated,
    /// for example by `prost-build`. Defaults to `crate`.
    pub fn import_root<S>(&mut self, import_root: S) -> &mut Self
    where
        S: Into<String>,
    {
        self.import_root = Some(import_root.into());
        self
    }

    /// Configures whether the output is pretty-printed. Only has an effect with the `format`
    /// feature, and defaults to `true`.
    pub fn format(&mut self, enabled: bool) -> &mut Self {
        self.fmt = enabled;
        self
    }

    /// Generates the custom resource source for the named root message.
    ///
    /// The name is the fully-qualified protobuf name of the message; a leading dot is accepted.
    pub fn generate(&self, registry: &Registry, type_name: &str) -> Result<String, Error> {
        CodeGenerator::generate(self, registry, type_name)
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            derives: Vec::new(),
            type_attributes: Vec::new(),
            field_attributes: Vec::new(),
            map_type: MapType::default(),
            bytes_type: BytesType::default(),
            package: None,
            import_root: None,
            fmt: true,
        }
    }
}
