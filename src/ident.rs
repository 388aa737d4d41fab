//! Utility functions for working with identifiers.
//!
//! These derive every Rust identifier the generator emits from protobuf descriptor names.

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

use crate::descriptor::{EnumDescriptor, EnumValueDescriptor, FieldDescriptor, MessageDescriptor};

/// Converts a `camelCase` or `SCREAMING_SNAKE_CASE` identifier to a `lower_snake` case Rust field
/// identifier.
pub fn to_snake(s: &str) -> String {
    let ident = s.to_snake_case();

    // Uses a raw identifier if the identifier matches a Rust keyword
    // (https://doc.rust-lang.org/reference/keywords.html).
    match ident.as_str() {
        // 2015 strict keywords.
        | "as" | "break" | "const" | "continue" | "else" | "enum" | "false"
        | "fn" | "for" | "if" | "impl" | "in" | "let" | "loop" | "match" | "mod" | "move" | "mut"
        | "pub" | "ref" | "return" | "static" | "struct" | "trait" | "true"
        | "type" | "unsafe" | "use" | "where" | "while"
        // 2018 strict keywords.
        | "dyn"
        // 2015 reserved keywords.
        | "abstract" | "become" | "box" | "do" | "final" | "macro" | "override" | "priv" | "typeof"
        | "unsized" | "virtual" | "yield"
        // 2018 reserved keywords.
        | "async" | "await" | "try"
        // 2024 reserved keywords.
        | "gen" => format!("r#{}", ident),
        // the following keywords are not supported as raw identifiers and are therefore suffixed with an underscore.
        "_" | "super" | "self" | "crate" | "extern" => format!("{}_", ident),
        _ => ident,
    }
}

/// Converts a `snake_case` identifier to an `UpperCamel` case Rust type identifier.
pub fn to_upper_camel(s: &str) -> String {
    let ident = s.to_upper_camel_case();

    // Suffixes an underscore for the `Self` ident, which is not a valid raw identifier.
    if ident == "Self" {
        ident + "_"
    } else {
        ident
    }
}

/// The type name of a generated message declaration.
pub fn type_name(msg: &MessageDescriptor<'_>) -> String {
    to_upper_camel(msg.name())
}

/// The type name of a generated enum declaration.
///
/// Enum names always end in `Type`, so an enum never collides with a message that shares its
/// base name.
pub fn enum_type_name(desc: &EnumDescriptor<'_>) -> String {
    let type_name = to_upper_camel(desc.name());
    if type_name.ends_with("Type") {
        type_name
    } else {
        type_name + "Type"
    }
}

/// The identifier of a generated enum constant.
///
/// The enum's type name is folded into every constant, so constants are unique across all enums
/// generated together: `Status.OK` becomes `OkStatusType` and `Health.OK` becomes `OkHealthType`.
pub fn enum_value_name(desc: &EnumDescriptor<'_>, value: &EnumValueDescriptor<'_>) -> String {
    to_upper_camel(&format!(
        "{}{}",
        value.name().to_lowercase().to_upper_camel_case(),
        enum_type_name(desc)
    ))
}

/// The identifier of a generated struct field.
pub fn field_name(field: &FieldDescriptor<'_>) -> String {
    to_snake(field.name())
}

/// The serialized (JSON) name of a generated struct field.
pub fn serialized_name(field: &FieldDescriptor<'_>) -> String {
    to_lower_camel(field.name())
}

/// Converts a `snake_case` identifier to a `lowerCamel` case serialized name.
pub fn to_lower_camel(s: &str) -> String {
    s.to_lower_camel_case()
}

/// Matches a 'matcher' against a fully qualified identifier.
///
/// Matchers beginning with a dot match a prefix of the path, and all others match a suffix.
/// `.` matches every path.
pub fn match_ident(matcher: &str, fq_name: &str, field: Option<&str>) -> bool {
    if matcher.is_empty() {
        return false;
    } else if matcher == "." {
        return true;
    }

    let field_paths = {
        let mut paths = fq_name
            .split('.')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        if let Some(field) = field {
            paths.push(field);
        }
        paths
    };

    if let Some(prefix) = matcher.strip_prefix('.') {
        let match_paths = prefix.split('.').collect::<Vec<_>>();
        match_paths.len() <= field_paths.len()
            && match_paths[..] == field_paths[..match_paths.len()]
    } else {
        let match_paths = matcher.split('.').collect::<Vec<_>>();
        match_paths.len() <= field_paths.len()
            && match_paths[..] == field_paths[field_paths.len() - match_paths.len()..]
    }
}
