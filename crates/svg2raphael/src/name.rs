//! Namespace-aware name normalization

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Result};

/// Namespace bound to the reserved `xml` prefix
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A tag or attribute name with any namespace split off
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NormalizedName {
    Plain(String),
    Namespaced { uri: String, local: String },
}

impl NormalizedName {
    /// The part used for grouping and lookup
    pub fn local(&self) -> &str {
        match self {
            Self::Plain(local) | Self::Namespaced { local, .. } => local,
        }
    }

    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::Plain(_) => None,
            Self::Namespaced { uri, .. } => Some(uri),
        }
    }

    pub fn into_local(self) -> String {
        match self {
            Self::Plain(local) | Self::Namespaced { local, .. } => local,
        }
    }
}

/// Parses Clark notation: `{uri}local` is namespaced, anything else is plain.
impl FromStr for NormalizedName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let Some(rest) = s.strip_prefix('{') else {
            return Ok(Self::Plain(s.to_string()));
        };
        match rest.split_once('}') {
            Some((uri, local)) if !local.is_empty() && !local.contains(['{', '}']) => {
                Ok(Self::Namespaced {
                    uri: uri.to_string(),
                    local: local.to_string(),
                })
            }
            _ => Err(Error::bare(ErrorKind::InvalidName {
                name: s.to_string(),
            })),
        }
    }
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(local) => f.write_str(local),
            Self::Namespaced { uri, local } => write!(f, "{{{uri}}}{local}"),
        }
    }
}

/// Stack of in-scope `xmlns` declarations
#[derive(Debug, Default)]
pub struct NamespaceScope {
    /// `None` is the default namespace; an empty uri undeclares it
    bindings: Vec<(Option<String>, String)>,
    frames: Vec<usize>,
}

impl NamespaceScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a scope for an element, recording its namespace declarations
    pub fn push<'a, I>(&mut self, attributes: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        self.frames.push(self.bindings.len());
        for (key, value) in attributes {
            if let Some(prefix) = namespace_declaration(key) {
                self.bindings
                    .push((prefix.map(str::to_string), value.clone()));
            }
        }
    }

    /// Close the innermost scope
    pub fn pop(&mut self) {
        if let Some(len) = self.frames.pop() {
            self.bindings.truncate(len);
        }
    }

    /// Resolve an element name; unprefixed names take the default namespace
    pub fn resolve_element(&self, raw: &str) -> Result<NormalizedName> {
        self.resolve(raw, true)
    }

    /// Resolve an attribute name; unprefixed names stay plain
    pub fn resolve_attribute(&self, raw: &str) -> Result<NormalizedName> {
        self.resolve(raw, false)
    }

    fn resolve(&self, raw: &str, use_default: bool) -> Result<NormalizedName> {
        if raw.starts_with('{') {
            return raw.parse();
        }

        match raw.split_once(':') {
            None => {
                let uri = if use_default { self.lookup(None) } else { None };
                Ok(match uri {
                    Some(uri) => NormalizedName::Namespaced {
                        uri: uri.to_string(),
                        local: raw.to_string(),
                    },
                    None => NormalizedName::Plain(raw.to_string()),
                })
            }
            Some((prefix, local)) => {
                if prefix.is_empty() || local.is_empty() || local.contains(':') {
                    return Err(Error::bare(ErrorKind::InvalidName {
                        name: raw.to_string(),
                    }));
                }
                let uri = match prefix {
                    "xml" => XML_NAMESPACE,
                    _ => self.lookup(Some(prefix)).ok_or_else(|| {
                        Error::bare(ErrorKind::UnboundPrefix {
                            prefix: prefix.to_string(),
                        })
                    })?,
                };
                Ok(NormalizedName::Namespaced {
                    uri: uri.to_string(),
                    local: local.to_string(),
                })
            }
        }
    }

    fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty())
    }
}

/// `Some(None)` for `xmlns`, `Some(Some(prefix))` for `xmlns:prefix`
pub fn namespace_declaration(key: &str) -> Option<Option<&str>> {
    match key {
        "xmlns" => Some(None),
        _ => key.strip_prefix("xmlns:").map(Some),
    }
}

/// Resolve every non-declaration attribute of an element, keeping only local names
pub fn normalize_attributes(
    scope: &NamespaceScope,
    attributes: &IndexMap<String, String>,
) -> Result<IndexMap<String, String>> {
    attributes
        .iter()
        .filter(|(key, _)| namespace_declaration(key).is_none())
        .map(|(key, value)| {
            let name = scope.resolve_attribute(key)?;
            Ok((name.into_local(), value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_clark_notation() -> Result<()> {
        let name: NormalizedName = "{http://www.w3.org/2000/svg}rect".parse()?;
        assert_eq!(name.local(), "rect");
        assert_eq!(name.uri(), Some("http://www.w3.org/2000/svg"));
        assert_eq!(name.to_string(), "{http://www.w3.org/2000/svg}rect");

        let plain: NormalizedName = "rect".parse()?;
        assert_eq!(plain, NormalizedName::Plain("rect".to_string()));
        assert_eq!(plain.uri(), None);
        Ok(())
    }

    #[test]
    fn test_clark_notation_rejects_unclosed_brace() {
        for raw in ["{http://ns", "{http://ns}", "{a}b}c"] {
            let err = raw.parse::<NormalizedName>().unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::InvalidName { .. }), "{raw}");
        }
    }

    #[test]
    fn test_default_namespace_applies_to_elements_only() -> Result<()> {
        let mut scope = NamespaceScope::new();
        scope.push(&attrs(&[("xmlns", "http://www.w3.org/2000/svg")]));

        let element = scope.resolve_element("rect")?;
        assert_eq!(element.uri(), Some("http://www.w3.org/2000/svg"));
        assert_eq!(element.local(), "rect");

        let attribute = scope.resolve_attribute("width")?;
        assert_eq!(attribute, NormalizedName::Plain("width".to_string()));
        Ok(())
    }

    #[test]
    fn test_prefixed_names_and_scoping() -> Result<()> {
        let mut scope = NamespaceScope::new();
        scope.push(&attrs(&[("xmlns:svg", "http://www.w3.org/2000/svg")]));
        scope.push(&attrs(&[("xmlns:svg", "http://other")]));
        assert_eq!(scope.resolve_element("svg:rect")?.uri(), Some("http://other"));

        scope.pop();
        assert_eq!(
            scope.resolve_element("svg:rect")?.uri(),
            Some("http://www.w3.org/2000/svg")
        );

        scope.pop();
        let err = scope.resolve_element("svg:rect").unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::UnboundPrefix {
                prefix: "svg".to_string()
            }
        );
        Ok(())
    }

    #[test]
    fn test_xml_prefix_is_predeclared() -> Result<()> {
        let scope = NamespaceScope::new();
        let name = scope.resolve_attribute("xml:space")?;
        assert_eq!(name.uri(), Some(XML_NAMESPACE));
        assert_eq!(name.local(), "space");
        Ok(())
    }

    #[test]
    fn test_empty_default_namespace_undeclares() -> Result<()> {
        let mut scope = NamespaceScope::new();
        scope.push(&attrs(&[("xmlns", "http://www.w3.org/2000/svg")]));
        scope.push(&attrs(&[("xmlns", "")]));
        assert_eq!(
            scope.resolve_element("rect")?,
            NormalizedName::Plain("rect".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_invalid_qualified_names() {
        let scope = NamespaceScope::new();
        for raw in [":rect", "svg:", "a:b:c"] {
            assert!(scope.resolve_element(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn test_normalize_attributes_drops_declarations() -> Result<()> {
        let raw = attrs(&[
            ("xmlns", "http://www.w3.org/2000/svg"),
            ("xmlns:xlink", "http://www.w3.org/1999/xlink"),
            ("id", "r1"),
            ("xlink:href", "#a"),
        ]);
        let mut scope = NamespaceScope::new();
        scope.push(&raw);
        let normalized = normalize_attributes(&scope, &raw)?;
        assert_eq!(normalized, attrs(&[("id", "r1"), ("href", "#a")]));
        Ok(())
    }
}
