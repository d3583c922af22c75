//! Statement emission from collected elements

use tracing::{debug, trace};

use crate::collect::{AttributeMap, ElementCollection};
use crate::error::Result;
use crate::style::parse_style;
use crate::template::{CompiledTemplates, Template, TemplateSet};

/// Attributes of the root `svg` element turned into variable declarations
pub const SVG_ATTRS: &[&str] = &["id", "width", "height"];
/// Attributes a `rect` needs before it is emitted
pub const RECT_ATTRS: &[&str] = &["id", "x", "y", "width", "height"];
/// Attributes a `path[type=arc]` needs before it is emitted
pub const ARC_ATTRS: &[&str] = &["id", "cx", "cy", "rx", "ry"];

/// Why an element produced no statements
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    MissingAttributes(Vec<String>),
    /// A `path` whose `type` is absent or not `arc`
    NotAnArc(Option<String>),
}

/// An element the emitter dropped
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Skipped {
    pub tag: String,
    /// Position among the collected elements of the same tag
    pub index: usize,
    pub id: Option<String>,
    pub reason: SkipReason,
}

/// The statements produced for one document
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Emission {
    statements: Vec<String>,
    skipped: Vec<Skipped>,
}

impl Emission {
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn into_statements(self) -> Vec<String> {
        self.statements
    }

    pub fn skipped(&self) -> &[Skipped] {
        &self.skipped
    }

    /// Statements joined by newlines
    pub fn to_script(&self) -> String {
        self.statements.join("\n")
    }
}

/// Renders statements for `svg`, `rect` and `path[type=arc]` elements
#[derive(Clone, Debug)]
pub struct Emitter {
    templates: CompiledTemplates,
}

impl Emitter {
    pub fn new(templates: &TemplateSet) -> Result<Self> {
        Ok(Self {
            templates: templates.compile()?,
        })
    }

    /// Emit statements in fixed order: `svg`, then `rect`, then `path`
    pub fn emit(&self, collection: &ElementCollection) -> Result<Emission> {
        let mut emission = Emission::default();

        self.emit_svg(collection, &mut emission);
        for (index, rect) in collection.get("rect").iter().enumerate() {
            self.emit_shape("rect", index, rect, RECT_ATTRS, &self.templates.rect, &mut emission)?;
        }
        for (index, path) in collection.get("path").iter().enumerate() {
            let kind = path.get("type").map(String::as_str);
            if kind == Some("arc") {
                self.emit_shape(
                    "path",
                    index,
                    path,
                    ARC_ATTRS,
                    &self.templates.ellipse,
                    &mut emission,
                )?;
            } else {
                skip(
                    &mut emission,
                    "path",
                    index,
                    path,
                    SkipReason::NotAnArc(kind.map(str::to_string)),
                );
            }
        }

        for tag in collection.tags() {
            if !matches!(tag, "svg" | "rect" | "path") {
                trace!(tag, count = collection.get(tag).len(), "ignoring unsupported tag");
            }
        }
        debug!(
            statements = emission.statements.len(),
            skipped = emission.skipped.len(),
            "emission finished"
        );
        Ok(emission)
    }

    fn emit_svg(&self, collection: &ElementCollection, emission: &mut Emission) {
        let Some(svg) = collection.first("svg") else {
            return;
        };
        for key in SVG_ATTRS {
            if let Some(value) = svg.get(*key) {
                emission
                    .statements
                    .push(self.templates.declaration.render_pair(key, value));
            }
        }
    }

    fn emit_shape(
        &self,
        tag: &str,
        index: usize,
        attributes: &AttributeMap,
        required: &[&str],
        template: &Template,
        emission: &mut Emission,
    ) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|key| !attributes.contains_key(**key))
            .map(|key| (*key).to_string())
            .collect();
        let Some(id) = attributes.get("id").filter(|_| missing.is_empty()) else {
            skip(emission, tag, index, attributes, SkipReason::MissingAttributes(missing));
            return Ok(());
        };

        let expression = template.render(|key| attributes.get(key).map(String::as_str));
        emission
            .statements
            .push(self.templates.assignment.render_pair(id, &expression));

        if let Some(style) = attributes.get("style") {
            let attrs = parse_style(style)?;
            if !attrs.is_empty() {
                emission
                    .statements
                    .push(self.templates.attributes.render_pair(id, &attrs.join(",")));
            }
        }
        Ok(())
    }
}

fn skip(
    emission: &mut Emission,
    tag: &str,
    index: usize,
    attributes: &AttributeMap,
    reason: SkipReason,
) {
    let id = attributes.get("id").cloned();
    debug!(tag, index, id = ?id, reason = ?reason, "skipping element");
    emission.skipped.push(Skipped {
        tag: tag.to_string(),
        index,
        id,
        reason,
    });
}
