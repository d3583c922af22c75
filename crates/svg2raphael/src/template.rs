//! Statement templates
//!
//! Templates use `{placeholder}` substitution; `{{` and `}}` produce literal
//! braces. Each template only accepts its own placeholder names, which is
//! checked once when a [`TemplateSet`] is compiled.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, ErrorKind, Result, Span};

pub const DECLARATION_PLACEHOLDERS: &[&str] = &["name", "value"];
pub const ASSIGNMENT_PLACEHOLDERS: &[&str] = &["name", "value"];
pub const RECT_PLACEHOLDERS: &[&str] = &["id", "x", "y", "width", "height"];
pub const ELLIPSE_PLACEHOLDERS: &[&str] = &["id", "cx", "cy", "rx", "ry"];
pub const ATTRIBUTES_PLACEHOLDERS: &[&str] = &["id", "attrs"];

/// The set of templates the emitter renders statements with
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateSet {
    /// Variable declaration with initializer: `name`, `value`
    pub declaration: String,
    /// Assignment of a shape expression to its id: `name`, `value`
    pub assignment: String,
    /// Rectangle construction expression
    pub rect: String,
    /// Ellipse construction expression for `path[type=arc]`
    pub ellipse: String,
    /// Attribute-setting statement: `id`, `attrs`
    pub attributes: String,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::raphael()
    }
}

impl TemplateSet {
    /// Templates targeting a Raphael paper named `paper`
    pub fn raphael() -> Self {
        Self {
            declaration: "var {name} = {value};".to_string(),
            assignment: "{name} = {value};".to_string(),
            rect: "paper.rect({x}, {y}, {width}, {height})".to_string(),
            ellipse: "paper.ellipse({cx}, {cy}, {rx}, {ry})".to_string(),
            attributes: "{id}.attr({{{attrs}}});".to_string(),
        }
    }

    /// Load a template set from TOML; absent keys keep the Raphael defaults
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let set: Self = toml::from_str(s).map_err(|e| {
            Error::with_message(
                ErrorKind::InvalidTemplateConfig,
                Span::empty(),
                format!("invalid template configuration: {}", e.message()),
            )
        })?;
        set.validate()?;
        Ok(set)
    }

    /// Load a template set from a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading templates");
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::with_message(
                ErrorKind::Io {
                    path: path.display().to_string(),
                },
                Span::empty(),
                format!("failed to read {}: {e}", path.display()),
            )
        })?;
        Self::from_toml_str(&content)
    }

    /// Check every template for balanced braces and known placeholders
    pub fn validate(&self) -> Result<()> {
        self.compile().map(|_| ())
    }

    pub(crate) fn compile(&self) -> Result<CompiledTemplates> {
        Ok(CompiledTemplates {
            declaration: Template::compile(
                "declaration",
                &self.declaration,
                DECLARATION_PLACEHOLDERS,
            )?,
            assignment: Template::compile("assignment", &self.assignment, ASSIGNMENT_PLACEHOLDERS)?,
            rect: Template::compile("rect", &self.rect, RECT_PLACEHOLDERS)?,
            ellipse: Template::compile("ellipse", &self.ellipse, ELLIPSE_PLACEHOLDERS)?,
            attributes: Template::compile("attributes", &self.attributes, ATTRIBUTES_PLACEHOLDERS)?,
        })
    }
}

#[derive(Clone, Debug)]
pub(crate) struct CompiledTemplates {
    pub declaration: Template,
    pub assignment: Template,
    pub rect: Template,
    pub ellipse: Template,
    pub attributes: Template,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Placeholder(String),
}

/// A validated template
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    pieces: Vec<Piece>,
}

impl Template {
    /// Split `source` into literals and placeholders, rejecting names not in `allowed`
    pub fn compile(name: &str, source: &str, allowed: &[&str]) -> Result<Self> {
        let unbalanced = || {
            Error::bare(ErrorKind::UnbalancedBrace {
                template: name.to_string(),
            })
        };

        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.next_if_eq(&'{').is_some() => literal.push('{'),
                '}' if chars.next_if_eq(&'}').is_some() => literal.push('}'),
                '}' => return Err(unbalanced()),
                '{' => {
                    let mut placeholder = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => return Err(unbalanced()),
                            Some(c) => placeholder.push(c),
                        }
                    }
                    if !allowed.contains(&placeholder.as_str()) {
                        return Err(Error::bare(ErrorKind::UnknownPlaceholder {
                            template: name.to_string(),
                            placeholder,
                        }));
                    }
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Placeholder(placeholder));
                }
                _ => literal.push(ch),
            }
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Ok(Self { pieces })
    }

    /// Substitute placeholders with the values `lookup` returns
    pub fn render<'v>(&self, lookup: impl Fn(&str) -> Option<&'v str>) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Placeholder(key) => out.push_str(lookup(key).unwrap_or_default()),
            }
        }
        out
    }

    /// Render a template whose placeholders are `name` and `value`
    pub fn render_pair(&self, name: &str, value: &str) -> String {
        self.render(|key| match key {
            "name" | "id" => Some(name),
            "value" | "attrs" => Some(value),
            _ => None,
        })
    }
}
