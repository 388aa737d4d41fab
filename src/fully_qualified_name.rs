use std::fmt;

use itertools::Itertools;

// Invariant: never begins with a '.' (dot)
#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub struct FullyQualifiedName(String);

impl FullyQualifiedName {
    pub fn new(package_string: &str, type_path: &[impl AsRef<str>], name: &str) -> Self {
        Self(
            package_string
                .split('.')
                .chain(type_path.iter().map(AsRef::as_ref))
                .chain(std::iter::once(name))
                .map(|segment| segment.trim_matches('.'))
                .filter(|segment| !segment.is_empty())
                .join("."),
        )
    }

    /// Parses a protobuf type reference, with or without the leading dot.
    pub fn from_type_name(type_name: &str) -> Self {
        Self::new("", &[type_name], "")
    }

    pub fn path_iterator(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0.split('.').filter(|segment| !segment.is_empty())
    }

    /// The last path segment.
    pub fn name(&self) -> &str {
        self.path_iterator().next_back().unwrap_or_default()
    }

    pub fn join(&self, path: &str) -> Self {
        if self.0.is_empty() {
            Self(path.to_string())
        } else {
            Self(format!("{}.{}", self.0, path))
        }
    }
}

impl AsRef<str> for FullyQualifiedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FullyQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
