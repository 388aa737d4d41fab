//! prost-crd CLI - inspect protobuf types and generate custom resources from them
//!
//! Commands:
//! - `prost-crd crdgen` - Generate custom resource types for a message
//! - `prost-crd list` - List registered message types
//! - `prost-crd show` - Show the fields of a message type, or its default value as JSON or YAML
//! - `prost-crd contains` - List the messages which contain a type
//! - `prost-crd url` - Print the `Any` type URL of message types

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use itertools::Itertools;
use prost_crd::{BytesType, Config, Kind, MapType, Registry};
use prost_reflect::{DescriptorPool, DynamicMessage, SerializeOptions};

#[derive(Parser)]
#[command(name = "prost-crd")]
#[command(author, version, about = "Generate Kubernetes custom resource types from protobuf messages", long_about = None)]
struct Cli {
    /// Binary FileDescriptorSet to load, as written by `protoc --include_imports -o`
    #[arg(short = 'd', long = "descriptor-set", global = true)]
    descriptor_sets: Vec<PathBuf>,

    /// .proto file to compile and load
    #[arg(long = "proto", global = true)]
    protos: Vec<PathBuf>,

    /// Directory to search for .proto files and their imports
    #[arg(short = 'I', long = "include", global = true)]
    includes: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate custom resource types for a message
    Crdgen {
        /// Fully-qualified name of the root message
        type_name: String,

        /// Additional derive for every generated type (e.g. ::schemars::JsonSchema)
        #[arg(long)]
        derive: Vec<String>,

        /// Name of the generated module (default: last segment of the message package)
        #[arg(long)]
        package: Option<String>,

        /// Rust module the protobuf types are generated under
        #[arg(long)]
        import_root: Option<String>,

        /// Collection type for map fields
        #[arg(long, value_enum, default_value_t = MapTypeArg::Btree)]
        map_type: MapTypeArg,

        /// Type for bytes fields
        #[arg(long, value_enum, default_value_t = BytesTypeArg::Vec)]
        bytes_type: BytesTypeArg,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List registered message types
    List,

    /// Show the fields of a message type
    Show {
        /// Fully-qualified name of the message
        type_name: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ShowFormat::Fields)]
        format: ShowFormat,
    },

    /// List the messages with a field of the given message or enum type
    Contains {
        /// Fully-qualified name of the contained type
        type_name: String,
    },

    /// Print the google.protobuf.Any type URL of message types
    Url {
        /// Fully-qualified names of the messages
        #[arg(required = true)]
        type_names: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ShowFormat {
    /// A table of field names and types
    Fields,
    /// The message with every field set to its default, as JSON
    Json,
    /// The message with every field set to its default, as YAML
    Yaml,
}

#[derive(Clone, Copy, ValueEnum)]
enum MapTypeArg {
    Btree,
    Hash,
}

impl From<MapTypeArg> for MapType {
    fn from(arg: MapTypeArg) -> MapType {
        match arg {
            MapTypeArg::Btree => MapType::BTreeMap,
            MapTypeArg::Hash => MapType::HashMap,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum BytesTypeArg {
    Vec,
    ByteString,
}

impl From<BytesTypeArg> for BytesType {
    fn from(arg: BytesTypeArg) -> BytesType {
        match arg {
            BytesTypeArg::Vec => BytesType::Vec,
            BytesTypeArg::ByteString => BytesType::ByteString,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();
    match run(cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("prost-crd: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let registry = load_registry(&cli)?;
    log::debug!("loaded {:?}", registry);

    match cli.command {
        Commands::Crdgen {
            type_name,
            derive,
            package,
            import_root,
            map_type,
            bytes_type,
            output,
        } => {
            let mut config = Config::new();
            config.map_type(map_type.into()).bytes_type(bytes_type.into());
            for derive in derive {
                config.derive(derive);
            }
            if let Some(package) = package {
                config.package(package);
            }
            if let Some(import_root) = import_root {
                config.import_root(import_root);
            }

            let source = config
                .generate(&registry, &type_name)
                .with_context(|| format!("generating custom resource for {}", type_name))?;
            match output {
                Some(path) => fs::write(&path, source)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => out.write_all(source.as_bytes())?,
            }
        }
        Commands::List => {
            for message in registry.messages() {
                writeln!(out, "{}", message.full_name())?;
            }
        }
        Commands::Show { type_name, format } => match format {
            ShowFormat::Fields => show(&registry, &type_name, out)?,
            ShowFormat::Json | ShowFormat::Yaml => {
                show_default(&registry, &type_name, format, out)?
            }
        },
        Commands::Contains { type_name } => {
            if registry.find_message_by_name(&type_name).is_none()
                && registry.find_enum_by_name(&type_name).is_none()
            {
                bail!("failed to find type {:?}", type_name);
            }
            for name in registry.messages_containing(&type_name) {
                writeln!(out, "{}", name)?;
            }
        }
        Commands::Url { type_names } => {
            let urls = type_names
                .iter()
                .map(|name| {
                    registry
                        .type_url(name)
                        .ok_or_else(|| anyhow!("failed to find type {:?}", name))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            for url in urls {
                writeln!(out, "{}", url)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

fn load_registry(cli: &Cli) -> anyhow::Result<Registry> {
    let mut registry = Registry::new();
    for path in &cli.descriptor_sets {
        registry
            .load_file_descriptor_set(path)
            .with_context(|| format!("loading {}", path.display()))?;
    }
    if !cli.protos.is_empty() {
        let includes = if cli.includes.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            cli.includes.clone()
        };
        registry.compile_protos(&cli.protos, &includes)?;
    }
    if cli.descriptor_sets.is_empty() && cli.protos.is_empty() {
        bail!("no descriptors given, use --descriptor-set or --proto");
    }
    Ok(registry)
}

/// Prints one row per field, with the field type aligned in a second column. Enum fields are
/// followed by a row listing the enum values.
fn show(registry: &Registry, type_name: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let message = registry
        .find_message_by_name(type_name)
        .ok_or_else(|| anyhow!("failed to find type {:?}", type_name))?;

    let mut rows = Vec::with_capacity(message.fields().len());
    for field in message.fields() {
        let kind = field.kind()?;
        let cardinality = if field.is_list() || field.is_map() {
            " (repeated)"
        } else {
            ""
        };
        rows.push((field.name(), format!("{}{}", kind, cardinality)));
        if let Kind::Enum(desc) = kind {
            let values = desc.values().map(|value| value.name()).join(", ");
            rows.push(("", format!("  [{}]", values)));
        }
    }

    let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, ty) in rows {
        writeln!(out, "{:width$}  {}", name, ty, width = width)?;
    }
    Ok(())
}

/// Prints the message with every field set to its default value. Fields with explicit presence
/// are left out.
fn show_default(
    registry: &Registry,
    type_name: &str,
    format: ShowFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let message = registry
        .find_message_by_name(type_name)
        .ok_or_else(|| anyhow!("failed to find type {:?}", type_name))?;
    let pool = DescriptorPool::from_file_descriptor_set(registry.file_descriptor_set())
        .context("building descriptor pool")?;
    let descriptor = pool
        .get_message_by_name(message.full_name())
        .ok_or_else(|| anyhow!("failed to find type {:?}", type_name))?;

    let message = DynamicMessage::new(descriptor);
    let options = SerializeOptions::new().skip_default_fields(false);
    match format {
        ShowFormat::Json => {
            let mut serializer = serde_json::Serializer::pretty(&mut *out);
            message.serialize_with_options(&mut serializer, &options)?;
            writeln!(out)?;
        }
        ShowFormat::Yaml => {
            let mut serializer = serde_yaml::Serializer::new(&mut *out);
            message.serialize_with_options(&mut serializer, &options)?;
        }
        ShowFormat::Fields => show(registry, type_name, out)?,
    }
    Ok(())
}
