use pretty_assertions::assert_eq;
use prost_crd::{Config, Error, FormatError, GenerateError, MapType, Registry};
use quote::ToTokens;

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn registry(protos: &[&str]) -> Registry {
    let mut registry = Registry::new();
    registry.compile_protos(protos, &[FIXTURES]).unwrap();
    registry
}

fn generate(config: &Config, protos: &[&str], type_name: &str) -> Vec<syn::Item> {
    let source = config.generate(&registry(protos), type_name).unwrap();
    assert!(source.starts_with("// This file is @generated by prost-crd.\n"));
    module_items(&source)
}

/// The items of the single module the generated source declares.
fn module_items(source: &str) -> Vec<syn::Item> {
    let file = syn::parse_file(source).unwrap();
    assert_eq!(1, file.items.len());
    match file.items.into_iter().next().unwrap() {
        syn::Item::Mod(module) => module.content.unwrap().1,
        other => panic!("unexpected item: {:?}", other),
    }
}

fn type_idents(items: &[syn::Item]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            syn::Item::Struct(item) => Some(item.ident.to_string()),
            syn::Item::Enum(item) => Some(item.ident.to_string()),
            _ => None,
        })
        .collect()
}

fn find_struct<'a>(items: &'a [syn::Item], name: &str) -> &'a syn::ItemStruct {
    items
        .iter()
        .find_map(|item| match item {
            syn::Item::Struct(item) if item.ident == name => Some(item),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no struct {}", name))
}

fn find_enum<'a>(items: &'a [syn::Item], name: &str) -> &'a syn::ItemEnum {
    items
        .iter()
        .find_map(|item| match item {
            syn::Item::Enum(item) if item.ident == name => Some(item),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no enum {}", name))
}

fn tokens(node: &impl ToTokens) -> String {
    node.to_token_stream().to_string().replace(' ', "")
}

/// The `#[serde(rename = "..")]` value of a field or variant.
fn serde_rename(attrs: &[syn::Attribute]) -> Option<String> {
    let mut rename = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                rename = Some(meta.value()?.parse::<syn::LitStr>()?.value());
            } else if meta.input.peek(syn::Token![=]) {
                meta.value()?.parse::<syn::LitStr>()?;
            }
            Ok(())
        })
        .unwrap();
    }
    rename
}

fn docs(attrs: &[syn::Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(meta) if meta.path.is_ident("doc") => match &meta.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(lit),
                    ..
                }) => Some(lit.value()),
                _ => None,
            },
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `(identifier, type, serialized name)` of every field of a struct.
fn fields(item: &syn::ItemStruct) -> Vec<(String, String, String)> {
    item.fields
        .iter()
        .map(|field| {
            (
                field.ident.as_ref().unwrap().to_string(),
                tokens(&field.ty),
                serde_rename(&field.attrs).unwrap_or_default(),
            )
        })
        .collect()
}

fn field<'a>(item: &'a syn::ItemStruct, name: &str) -> &'a syn::Field {
    item.fields
        .iter()
        .find(|field| field.ident.as_ref().is_some_and(|ident| ident == name))
        .unwrap_or_else(|| panic!("no field {}", name))
}

#[test]
fn widget() {
    let items = generate(&Config::new(), &["widget.proto"], "widgets.v1.Widget");

    assert_eq!(
        vec![
            "Widget",
            "WidgetList",
            "WidgetStatus",
            "WidgetCondition",
            "WidgetSpec",
            "ColorType",
        ],
        type_idents(&items)
    );

    let spec = find_struct(&items, "WidgetSpec");
    assert_eq!(
        vec![
            (
                "name".to_string(),
                "::std::string::String".to_string(),
                "name".to_string()
            ),
            (
                "count".to_string(),
                "::std::option::Option<i32>".to_string(),
                "count".to_string()
            ),
            (
                "color".to_string(),
                "ColorType".to_string(),
                "color".to_string()
            ),
            (
                "child".to_string(),
                "::std::option::Option<::std::boxed::Box<WidgetSpec>>".to_string(),
                "child".to_string()
            ),
        ],
        fields(spec)
    );
    assert_eq!(" `widgets.v1.Widget`", docs(&spec.attrs));

    let color = find_enum(&items, "ColorType");
    let variants = color
        .variants
        .iter()
        .map(|variant| {
            (
                variant.ident.to_string(),
                serde_rename(&variant.attrs).unwrap(),
            )
        })
        .collect::<Vec<_>>();
    assert_eq!(
        vec![
            ("RedColorType".to_string(), "RED".to_string()),
            ("BlueColorType".to_string(), "BLUE".to_string()),
        ],
        variants
    );

    let object = find_struct(&items, "Widget");
    assert_eq!("WidgetSpec", tokens(&field(object, "spec").ty));
    assert_eq!(
        "::std::option::Option<WidgetStatus>",
        tokens(&field(object, "status").ty)
    );
    assert_eq!("metav1::ObjectMeta", tokens(&field(object, "metadata").ty));
    let list = find_struct(&items, "WidgetList");
    assert_eq!("::std::vec::Vec<Widget>", tokens(&field(list, "items").ty));
}

#[test]
fn module_layout() {
    let source = Config::new()
        .generate(&registry(&["widget.proto"]), ".widgets.v1.Widget")
        .unwrap();
    let file = syn::parse_file(&source).unwrap();
    let module = match &file.items[0] {
        syn::Item::Mod(module) => module,
        other => panic!("unexpected item: {:?}", other),
    };
    assert_eq!("v1", module.ident.to_string());
    assert!(docs(&module.attrs).contains("`crate::widgets::v1::Widget`"));

    let items = &module.content.as_ref().unwrap().1;
    match &items[0] {
        syn::Item::Use(item) => assert_eq!(
            "use::k8s_openapi::apimachinery::pkg::apis::meta::v1asmetav1;",
            tokens(item)
        ),
        other => panic!("unexpected item: {:?}", other),
    }

    let mut config = Config::new();
    config.package("widget_crd").import_root("::envoy_types::pb");
    let source = config
        .generate(&registry(&["widget.proto"]), "widgets.v1.Widget")
        .unwrap();
    let file = syn::parse_file(&source).unwrap();
    match &file.items[0] {
        syn::Item::Mod(module) => {
            assert_eq!("widget_crd", module.ident.to_string());
            assert!(docs(&module.attrs).contains("`::envoy_types::pb::widgets::v1::Widget`"));
        }
        other => panic!("unexpected item: {:?}", other),
    }
}

#[test]
fn unformatted_output_declares_same_types() {
    let registry = registry(&["widget.proto"]);
    let formatted = Config::new()
        .generate(&registry, "widgets.v1.Widget")
        .unwrap();
    let unformatted = Config::new()
        .format(false)
        .generate(&registry, "widgets.v1.Widget")
        .unwrap();
    assert_eq!(
        type_idents(&module_items(&formatted)),
        type_idents(&module_items(&unformatted))
    );
}

#[test]
fn scalar_fields() {
    let registry = registry(&["scalars.proto"]);
    let message = registry.find_message_by_name("scalars.Scalars").unwrap();
    let items = generate(&Config::new(), &["scalars.proto"], "scalars.Scalars");
    let spec = fields(find_struct(&items, "ScalarsSpec"));

    assert_eq!(message.fields().len(), spec.len());
    for (field, (ident, _, serialized)) in message.fields().zip(&spec) {
        assert_eq!(field.name(), ident);
        assert_eq!(heck::AsLowerCamelCase(field.name()).to_string(), *serialized);
    }

    let types = spec
        .iter()
        .map(|(_, ty, _)| ty.as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        vec![
            "bool",
            "i32",
            "i32",
            "i32",
            "u32",
            "u32",
            "i64",
            "i64",
            "i64",
            "u64",
            "u64",
            "::std::string::String",
            "::std::vec::Vec<u8>",
        ],
        types
    );
    assert_eq!("perConnectionBufferLimitBytes", spec[4].2);
}

#[test]
fn floating_point_fields_are_omitted() {
    let items = generate(&Config::new(), &["maps.proto"], "maps.Cluster");
    let spec = find_struct(&items, "ClusterSpec");

    let idents = fields(spec)
        .into_iter()
        .map(|(ident, _, _)| ident)
        .collect::<Vec<_>>();
    assert_eq!(vec!["endpoints", "names"], idents);

    let docs = docs(&spec.attrs);
    assert!(docs.contains("Omitted fields:"), "{}", docs);
    assert!(docs.contains("`weights`"), "{}", docs);
    assert!(docs.contains("`ratio`: floating point fields are not supported (double)"), "{}", docs);
    assert!(docs.contains("`jitter`: floating point fields are not supported (float)"), "{}", docs);
}

#[test]
fn map_fields() {
    let items = generate(&Config::new(), &["maps.proto"], "maps.Cluster");
    let spec = find_struct(&items, "ClusterSpec");
    assert_eq!(
        "::std::collections::BTreeMap<::std::string::String,Endpoint>",
        tokens(&field(spec, "endpoints").ty)
    );
    assert_eq!(
        "::std::collections::BTreeMap<u32,::std::string::String>",
        tokens(&field(spec, "names").ty)
    );

    // The entry types are never emitted, but map values are.
    assert_eq!(
        vec![
            "Cluster",
            "ClusterList",
            "ClusterStatus",
            "ClusterCondition",
            "ClusterSpec",
            "Endpoint",
        ],
        type_idents(&items)
    );

    let mut config = Config::new();
    config.map_type(MapType::HashMap);
    let items = generate(&config, &["maps.proto"], "maps.Cluster");
    assert_eq!(
        "::std::collections::HashMap<u32,::std::string::String>",
        tokens(&field(find_struct(&items, "ClusterSpec"), "names").ty)
    );
}

#[test]
fn group_fields_are_placeholders() {
    let items = generate(&Config::new(), &["legacy.proto"], "legacy.Legacy");
    let spec = find_struct(&items, "LegacySpec");
    assert_eq!(
        vec![
            (
                "id".to_string(),
                "::std::option::Option<i64>".to_string(),
                "id".to_string()
            ),
            (
                "link".to_string(),
                "::std::vec::Vec<Link>".to_string(),
                "link".to_string()
            ),
            (
                "token".to_string(),
                "::std::vec::Vec<u8>".to_string(),
                "token".to_string()
            ),
        ],
        fields(spec)
    );
    assert!(docs(&field(spec, "link").attrs).contains("Not implemented."));
    find_struct(&items, "Link");
}

#[test]
fn reachable_types_are_emitted_once() {
    let items = generate(&Config::new(), &["tree.proto"], "tree.Tree");
    assert_eq!(
        vec![
            "Tree",
            "TreeList",
            "TreeStatus",
            "TreeCondition",
            "TreeSpec",
            "Node",
            "Leaf",
            "KindType",
        ],
        type_idents(&items)
    );
    assert_eq!(
        "::std::option::Option<::std::boxed::Box<TreeSpec>>",
        tokens(&field(find_struct(&items, "Node"), "tree").ty)
    );
    assert_eq!(
        "::std::vec::Vec<Node>",
        tokens(&field(find_struct(&items, "Node"), "children").ty)
    );
}

#[test]
fn enum_constants_are_unique() {
    let items = generate(&Config::new(), &["probe.proto"], "probe.Probe");
    let variants = |name| {
        find_enum(&items, name)
            .variants
            .iter()
            .map(|variant| variant.ident.to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(vec!["OkHealthType", "BadHealthType"], variants("HealthType"));
    assert_eq!(vec!["OkStatusType", "FailStatusType"], variants("StatusType"));
}

#[test]
fn configured_attributes() {
    let mut config = Config::new();
    config
        .derive("::schemars::JsonSchema")
        .type_attribute(".widgets", "#[serde(deny_unknown_fields)]")
        .field_attribute("Widget.name", "#[serde(alias = \"title\")]");
    let items = generate(&config, &["widget.proto"], "widgets.v1.Widget");

    let spec = find_struct(&items, "WidgetSpec");
    let attrs = spec.attrs.iter().map(tokens).collect::<Vec<_>>().join("");
    assert!(attrs.contains("::schemars::JsonSchema"), "{}", attrs);
    assert!(attrs.contains("#[serde(deny_unknown_fields)]"), "{}", attrs);

    let color = find_enum(&items, "ColorType");
    let attrs = color.attrs.iter().map(tokens).collect::<Vec<_>>().join("");
    assert!(attrs.contains("::schemars::JsonSchema"), "{}", attrs);

    let name = field(spec, "name");
    let attrs = name.attrs.iter().map(tokens).collect::<Vec<_>>().join("");
    assert!(attrs.contains("alias=\"title\""), "{}", attrs);
    let count = field(spec, "count");
    let attrs = count.attrs.iter().map(tokens).collect::<Vec<_>>().join("");
    assert!(!attrs.contains("alias"), "{}", attrs);

    let object = find_struct(&items, "Widget");
    let attrs = object.attrs.iter().map(tokens).collect::<Vec<_>>().join("");
    assert!(!attrs.contains("JsonSchema"), "{}", attrs);
}

#[test]
fn root_not_found() {
    match Config::new().generate(&registry(&["widget.proto"]), "widgets.v1.Gadget") {
        Err(Error::NotFound { name }) => assert_eq!("widgets.v1.Gadget", name),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn dangling_reference() {
    use prost_types::field_descriptor_proto::{Label, Type};
    use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto};

    let mut registry = Registry::new();
    registry.add_file(FileDescriptorProto {
        name: Some("dangling.proto".to_string()),
        package: Some("dangling".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![
            DescriptorProto {
                name: Some("Root".to_string()),
                field: vec![FieldDescriptorProto {
                    name: Some("child".to_string()),
                    number: Some(1),
                    label: Some(Label::Optional as i32),
                    r#type: Some(Type::Message as i32),
                    type_name: Some(".dangling.Child".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            },
            DescriptorProto {
                name: Some("Child".to_string()),
                field: vec![FieldDescriptorProto {
                    name: Some("missing".to_string()),
                    number: Some(1),
                    label: Some(Label::Optional as i32),
                    r#type: Some(Type::Enum as i32),
                    type_name: Some(".dangling.Missing".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            },
        ],
        ..Default::default()
    });

    match prost_crd::generate_custom_resource(&registry, "dangling.Root") {
        Err(Error::Generation {
            type_name,
            source: GenerateError::UnresolvedType { field, .. },
        }) => {
            assert_eq!("dangling.Child", type_name);
            assert_eq!("dangling.Child.missing", field);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn duplicate_declarations() {
    let registry = registry(&["dup.proto"]);

    match Config::new().generate(&registry, "dup.Root") {
        Err(Error::Format(FormatError::DuplicateDeclaration {
            ident,
            first,
            second,
        })) => {
            assert_eq!("Item", ident);
            assert_eq!("dup.Inner.Item", first);
            assert_eq!("dup.Other.Item", second);
        }
        other => panic!("unexpected result: {:?}", other),
    }

    match Config::new().generate(&registry, "dup.Catalog") {
        Err(Error::Format(FormatError::DuplicateDeclaration { ident, second, .. })) => {
            assert_eq!("CatalogList", ident);
            assert_eq!("dup.CatalogList", second);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn descriptor_set_file() {
    use prost::Message;

    let set = protox::compile(["widget.proto"], [FIXTURES]).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("widget.bin");
    std::fs::write(&path, set.encode_to_vec()).unwrap();

    let mut registry = Registry::new();
    registry.load_file_descriptor_set(&path).unwrap();
    assert_eq!(
        Config::new()
            .generate(&self::registry(&["widget.proto"]), "widgets.v1.Widget")
            .unwrap(),
        Config::new()
            .generate(&registry, "widgets.v1.Widget")
            .unwrap()
    );

    let garbage = dir.path().join("garbage.bin");
    std::fs::write(&garbage, b"\xff\xff").unwrap();
    assert!(matches!(
        Registry::new().load_file_descriptor_set(&garbage),
        Err(Error::Decode(_))
    ));
    assert!(matches!(
        Registry::new().load_file_descriptor_set(dir.path().join("missing.bin")),
        Err(Error::Io(_))
    ));
}
