//! Grouping of document elements by normalized tag name

use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, instrument, trace};

use crate::error::{Error, ErrorKind, Result, Span};
use crate::name::{normalize_attributes, NamespaceScope};
use crate::xml::{Config, Document, Element, Parser};

/// Normalized attribute name to raw value, in source order
pub type AttributeMap = IndexMap<String, String>;

/// Every element of one document, grouped by local tag name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementCollection {
    elements: IndexMap<String, Vec<AttributeMap>>,
}

impl ElementCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: impl Into<String>, attributes: AttributeMap) {
        self.elements.entry(tag.into()).or_default().push(attributes);
    }

    /// Attribute maps for `tag` in document order
    pub fn get(&self, tag: &str) -> &[AttributeMap] {
        self.elements.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn first(&self, tag: &str) -> Option<&AttributeMap> {
        self.get(tag).first()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    /// Total number of collected elements
    pub fn len(&self) -> usize {
        self.elements.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

enum Step<'a> {
    Enter(&'a Element),
    Leave,
}

/// Reads a document and builds its [`ElementCollection`]
#[derive(Clone, Copy, Debug, Default)]
pub struct Collector {
    config: Config,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Read and collect the document at `path`
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn collect_file(&self, path: impl AsRef<Path>) -> Result<ElementCollection> {
        let path = path.as_ref();
        let content = std::fs::read(path).map_err(|e| {
            Error::with_message(
                ErrorKind::Io {
                    path: path.display().to_string(),
                },
                Span::empty(),
                format!("failed to read {}: {e}", path.display()),
            )
        })?;
        debug!(bytes = content.len(), "file read");
        self.collect_bytes(&content)
    }

    pub fn collect_str(&self, input: &str) -> Result<ElementCollection> {
        self.collect_bytes(input.as_bytes())
    }

    pub fn collect_bytes(&self, input: &[u8]) -> Result<ElementCollection> {
        let document = Parser::with_config(input, self.config).parse()?;
        collect_document(&document)
    }
}

/// Walk `document` in document order, root included, grouping by local tag name
pub fn collect_document(document: &Document) -> Result<ElementCollection> {
    let mut collection = ElementCollection::new();
    let mut scope = NamespaceScope::new();
    let mut stack = vec![Step::Enter(&document.root)];

    while let Some(step) = stack.pop() {
        let element = match step {
            Step::Enter(element) => element,
            Step::Leave => {
                scope.pop();
                continue;
            }
        };

        scope.push(&element.attributes);
        let tag = scope
            .resolve_element(&element.name)
            .map_err(|e| at_element(e, element))?;
        let attributes =
            normalize_attributes(&scope, &element.attributes).map_err(|e| at_element(e, element))?;
        trace!(tag = %tag, attributes = attributes.len(), "collected");
        collection.push(tag.into_local(), attributes);

        stack.push(Step::Leave);
        let first_child = stack.len();
        stack.extend(element.child_elements().map(Step::Enter));
        if let Some(children) = stack.get_mut(first_child..) {
            children.reverse();
        }
    }

    debug!(elements = collection.len(), "document collected");
    Ok(collection)
}

fn at_element(error: Error, element: &Element) -> Error {
    Error::with_message(
        error.kind().clone(),
        Span::at(element.pos),
        error.message(),
    )
}
