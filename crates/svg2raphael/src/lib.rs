//! svg2raphael - translate SVG shapes into Raphael initialization statements
//!
//! The conversion runs in two stages: the [`Collector`] reads an XML document
//! and groups every element's attributes by local tag name, then the
//! [`Emitter`] renders statements for the `svg` root, `rect` elements and
//! `path` elements of `type="arc"`.
//!
//! # Quick Start
//!
//! ```
//! use svg2raphael::convert_str;
//! # fn main() -> Result<(), svg2raphael::Error> {
//! let emission = convert_str(
//!     r#"<svg id="s" width="100" height="50">
//!          <rect id="r1" x="0" y="0" width="10" height="10" style="fill:blue"/>
//!        </svg>"#,
//! )?;
//! assert_eq!(
//!     emission.statements(),
//!     [
//!         "var id = s;",
//!         "var width = 100;",
//!         "var height = 50;",
//!         "r1 = paper.rect(0, 0, 10, 10);",
//!         r#"r1.attr({"fill":"blue"});"#,
//!     ]
//! );
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

use std::path::Path;

use tracing::{info, instrument};

pub mod error;
pub use error::{Category, Error, ErrorKind, Pos, Result, Span};

pub mod lexer;
pub mod xml;
pub use xml::{Config as XmlConfig, Document as XmlDocument, Parser as XmlParser};

pub mod name;
pub use name::NormalizedName;

pub mod collect;
pub use collect::{AttributeMap, Collector, ElementCollection};

pub mod style;
pub use style::parse_style;

pub mod template;
pub use template::TemplateSet;

pub mod emit;
pub use emit::{Emission, Emitter, SkipReason, Skipped};

/// Collector and emitter settings for repeated conversions
///
/// Every call builds its own [`ElementCollection`], so one `Converter` can
/// serve any number of documents.
#[derive(Clone, Debug)]
pub struct Converter {
    collector: Collector,
    emitter: Emitter,
}

impl Converter {
    /// Converter with default XML limits and the Raphael templates
    pub fn new() -> Result<Self> {
        Self::with_templates(&TemplateSet::raphael())
    }

    pub fn with_templates(templates: &TemplateSet) -> Result<Self> {
        Ok(Self {
            collector: Collector::new(),
            emitter: Emitter::new(templates)?,
        })
    }

    pub fn with_xml_config(mut self, config: XmlConfig) -> Self {
        self.collector = Collector::with_config(config);
        self
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn convert_file(&self, path: impl AsRef<Path>) -> Result<Emission> {
        let collection = self.collector.collect_file(path)?;
        let emission = self.emitter.emit(&collection)?;
        info!(
            statements = emission.statements().len(),
            skipped = emission.skipped().len(),
            "converted"
        );
        Ok(emission)
    }

    pub fn convert_str(&self, input: &str) -> Result<Emission> {
        let collection = self.collector.collect_str(input)?;
        self.emitter.emit(&collection)
    }
}

/// Convert the SVG file at `path` with the Raphael templates
pub fn convert_file(path: impl AsRef<Path>) -> Result<Emission> {
    Converter::new()?.convert_file(path)
}

/// Convert SVG text with the Raphael templates
pub fn convert_str(input: &str) -> Result<Emission> {
    Converter::new()?.convert_str(input)
}
