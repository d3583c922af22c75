//! XML parser implementation

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{Error, ErrorKind, Result, Span};
use crate::lexer::Cursor;
use crate::xml::model::{Content, Document, Element};

/// Configuration for the XML parser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 0,
            max_size: 10 * 1024 * 1024, // 10 MB default
        }
    }
}

impl Config {
    /// Create a new config with unlimited depth and size
    pub const fn unlimited() -> Self {
        Self {
            max_depth: 0,
            max_size: 0,
        }
    }

    /// Create a new config with specific limits
    pub const fn new(max_depth: u16, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
        }
    }
}

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser with default configuration
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a new XML parser with custom configuration
    pub const fn with_config(input: &'a [u8], config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        if self.config.max_size > 0 && self.cursor.remaining().len() > self.config.max_size {
            return Err(Error::bare(ErrorKind::MaxSizeExceeded {
                max: self.config.max_size,
            }));
        }

        if self.cursor.starts_with(b"\xEF\xBB\xBF") {
            self.cursor.advance_by(3);
        }
        self.skip_misc(true)?;
        if self.cursor.is_eof() {
            return Err(self.error_here(ErrorKind::InvalidToken, "missing root element"));
        }

        let root = self.parse_root()?;
        self.skip_misc(false)?;

        if !self.cursor.is_eof() {
            return Err(self.error_here(ErrorKind::InvalidToken, "content after root element"));
        }

        Ok(Document { root })
    }

    /// Skip whitespace, comments and processing instructions around the root
    fn skip_misc(&mut self, allow_doctype: bool) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if allow_doctype && self.cursor.starts_with(b"<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    /// Parse the root element and everything inside it.
    ///
    /// Open elements live on an explicit stack, so nesting depth is bounded
    /// by memory rather than by the call stack.
    fn parse_root(&mut self) -> Result<Element> {
        let (root, closed) = self.parse_start_tag(1)?;
        if closed {
            return Ok(root);
        }
        let mut open = vec![root];

        loop {
            let depth = open.len();
            let Some(current) = open.last_mut() else {
                break;
            };

            if self.cursor.starts_with(b"</") {
                self.cursor.advance_by(2);
                let close_name = self.parse_name()?;
                if close_name != current.name {
                    return Err(self.error_here(
                        ErrorKind::MismatchedTag {
                            expected: std::mem::take(&mut current.name),
                            found: close_name,
                        },
                        "mismatched closing tag",
                    ));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;

                let Some(finished) = open.pop() else {
                    break;
                };
                match open.last_mut() {
                    Some(parent) => parent.children.push(Content::Element(finished)),
                    None => return Ok(finished),
                }
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.starts_with(b"<![CDATA[") {
                let text = self.parse_cdata()?;
                current.children.push(Content::Text(text));
            } else if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.current() == Some(b'<') {
                let (child, closed) = self.parse_start_tag(depth + 1)?;
                if closed {
                    current.children.push(Content::Element(child));
                } else {
                    open.push(child);
                }
            } else if self.cursor.is_eof() {
                return Err(self.error_here(ErrorKind::UnterminatedMarkup, "unterminated element"));
            } else if let Some(text) = self.parse_text()? {
                current.children.push(Content::Text(text));
            }
        }

        Err(self.error_here(ErrorKind::UnterminatedMarkup, "unterminated element"))
    }

    /// Parse `<name attrs>` or `<name attrs/>`; the flag is true when self-closing
    fn parse_start_tag(&mut self, depth: usize) -> Result<(Element, bool)> {
        let max_depth = usize::from(self.config.max_depth);
        if max_depth > 0 && depth > max_depth {
            return Err(Error::at(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                self.cursor.position(),
            ));
        }

        let pos = self.cursor.position();
        self.expect_byte(b'<')?;
        let name = self.parse_name()?;
        trace!(name = %name, line = pos.line, depth, "element");
        let attributes = self.parse_attributes()?;

        let element = Element {
            name,
            attributes,
            children: Vec::new(),
            pos,
        };

        let closed = self.cursor.consume(b'/');
        self.expect_byte(b'>')?;
        Ok((element, closed))
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            let had_space = matches!(
                self.cursor.current(),
                Some(b' ' | b'\t' | b'\r' | b'\n')
            );
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/' | b'>') => break,
                Some(_) if !had_space => {
                    return Err(self.error_here(
                        ErrorKind::InvalidToken,
                        "expected whitespace before attribute",
                    ));
                }
                Some(_) => {}
                None => {
                    return Err(
                        self.error_here(ErrorKind::UnterminatedMarkup, "unexpected end of input")
                    );
                }
            }

            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(self.error_here(
                    ErrorKind::DuplicateAttribute { name },
                    "duplicate attribute",
                ));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => {
                return Err(
                    self.error_here(ErrorKind::InvalidToken, "expected quoted attribute value")
                );
            }
        };
        self.cursor.advance();

        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                // line ends collapse to `\n` first, then literal whitespace becomes a space
                let text = bytes_to_string(raw)?
                    .replace("\r\n", "\n")
                    .replace(['\t', '\n', '\r'], " ");
                return decode_entities(&text);
            }
            if b == b'<' {
                return Err(self.error_here(ErrorKind::InvalidToken, "'<' in attribute value"));
            }
            self.cursor.advance();
        }

        Err(self.error_here(
            ErrorKind::UnterminatedMarkup,
            "unterminated attribute value",
        ))
    }

    fn parse_text(&mut self) -> Result<Option<String>> {
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = self.cursor.slice_from(start);
        let text = decode_entities(&bytes_to_string(raw)?)?;

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    fn parse_cdata(&mut self) -> Result<String> {
        self.cursor.advance_by(b"<![CDATA[".len());
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(b"]]>") {
                let text = bytes_to_string(self.cursor.slice_from(start))?;
                self.cursor.advance_by(3);
                return Ok(text);
            }
            self.cursor.advance();
        }
        Err(self.error_here(ErrorKind::UnterminatedMarkup, "unterminated CDATA section"))
    }

    fn parse_name(&mut self) -> Result<String> {
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(first) if is_name_start(first) => self.cursor.advance(),
            _ => return Err(self.error_here(ErrorKind::InvalidToken, "expected name")),
        }

        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        bytes_to_string(self.cursor.slice_from(start))
    }

    fn skip_comment(&mut self) -> Result<()> {
        self.cursor.advance_by(4);
        self.skip_until(b"-->")
    }

    fn skip_processing_instruction(&mut self) -> Result<()> {
        self.cursor.advance_by(2);
        self.skip_until(b"?>")
    }

    fn skip_doctype(&mut self) -> Result<()> {
        // an internal subset may itself contain '>' inside brackets
        let mut in_subset = false;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match b {
                b'[' => in_subset = true,
                b']' => in_subset = false,
                b'>' if !in_subset => return Ok(()),
                _ => {}
            }
        }
        Err(self.error_here(ErrorKind::UnterminatedMarkup, "unterminated DOCTYPE"))
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                self.cursor.advance_by(pattern.len());
                return Ok(());
            }
            self.cursor.advance();
        }
        Err(self.error_here(ErrorKind::UnterminatedMarkup, "unterminated markup"))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else {
            Err(self.error_here(
                ErrorKind::InvalidToken,
                format!("expected '{}'", char::from(expected)),
            ))
        }
    }

    fn error_here(&self, kind: ErrorKind, message: impl Into<String>) -> Error {
        let pos = self.cursor.position();
        Error::with_message(kind, Span::at(pos), message)
    }
}

fn bytes_to_string(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| Error::bare(ErrorKind::InvalidUtf8))
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':' | 0x80..=0xFF)
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str) -> Result<String> {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some((before, after)) = rest.split_once('&') {
        result.push_str(before);

        let Some((entity, tail)) = after.split_once(';') else {
            return Err(Error::bare(ErrorKind::InvalidEntity {
                entity: after.to_string(),
            }));
        };

        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(entity),
        };

        match decoded {
            Some(ch) => result.push(ch),
            None => {
                return Err(Error::bare(ErrorKind::InvalidEntity {
                    entity: entity.to_string(),
                }));
            }
        }
        rest = tail;
    }

    result.push_str(rest);
    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Document> {
        Parser::new(input.as_bytes()).parse()
    }

    #[test]
    fn test_parse_simple_element() -> Result<()> {
        let doc = parse("<svg></svg>")?;
        assert_eq!(doc.root.name, "svg");
        assert!(doc.root.children.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_with_attributes() -> Result<()> {
        let doc = parse("<svg id=\"s\" width='100'></svg>")?;
        assert_eq!(doc.root.attributes.get("id"), Some(&"s".to_string()));
        assert_eq!(doc.root.attributes.get("width"), Some(&"100".to_string()));
        Ok(())
    }

    #[test]
    fn test_attribute_order_preserved() -> Result<()> {
        let doc = parse("<rect y=\"1\" x=\"2\" id=\"r\"/>")?;
        let keys: Vec<&str> = doc.root.attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["y", "x", "id"]);
        Ok(())
    }

    #[test]
    fn test_parse_nested_with_text() -> Result<()> {
        let doc = parse("<svg><title>logo</title><rect/></svg>")?;
        let names: Vec<&str> = doc.root.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["title", "rect"]);
        match doc.root.child_elements().next().and_then(|t| t.children.first()) {
            Some(Content::Text(text)) => assert_eq!(text, "logo"),
            other => panic!("expected text, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_prolog_doctype_and_comments() -> Result<()> {
        let input = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!-- Created with Inkscape -->
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd" [
  <!ENTITY ns "http://www.w3.org/2000/svg">
]>
<svg>
  <!-- a comment <rect/> -->
  <?pi data?>
  <rect id="r"/>
</svg>
<!-- trailing -->
"#;
        let doc = parse(input)?;
        assert_eq!(doc.root.name, "svg");
        assert_eq!(doc.root.child_elements().count(), 1);
        Ok(())
    }

    #[test]
    fn test_cdata_is_text() -> Result<()> {
        let doc = parse("<style><![CDATA[rect > a { fill: red }]]></style>")?;
        assert_eq!(
            doc.root.children,
            vec![Content::Text("rect > a { fill: red }".to_string())]
        );
        Ok(())
    }

    #[test]
    fn test_entities_in_attributes() -> Result<()> {
        let doc = parse("<text v=\"a &amp; b &#60; &#x3E; &quot;\"/>")?;
        assert_eq!(
            doc.root.attributes.get("v"),
            Some(&"a & b < > \"".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_attribute_whitespace_normalized() -> Result<()> {
        let doc = parse("<rect style=\"fill:red;\n\tstroke:blue\"/>")?;
        assert_eq!(
            doc.root.attributes.get("style"),
            Some(&"fill:red;  stroke:blue".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_attribute_crlf_becomes_single_space() -> Result<()> {
        let doc = parse("<svg id=\"a\r\nb\" v=\"c\rd\"/>")?;
        assert_eq!(doc.root.attributes.get("id"), Some(&"a b".to_string()));
        assert_eq!(doc.root.attributes.get("v"), Some(&"c d".to_string()));
        Ok(())
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = parse("<svg><rect></svg>").unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::MismatchedTag {
                expected: "rect".to_string(),
                found: "svg".to_string()
            }
        );
        assert_eq!(err.span().start.line, 1);
    }

    #[test]
    fn test_rejects_malformed_documents() {
        for input in [
            "",
            "   ",
            "<svg>",
            "<svg",
            "<svg id=1/>",
            "<svg id=\"a\" id=\"b\"/>",
            "<svg/><svg/>",
            "<svg a=\"x\"b=\"y\"/>",
            "<svg a=\"&bogus;\"/>",
            "<svg a=\"&amp\"/>",
            "<svg><!-- open </svg>",
            "text only",
        ] {
            assert!(parse(input).is_err(), "should reject {input:?}");
        }
    }

    #[test]
    fn test_max_depth() {
        let config = Config::new(2, 0);
        let err = Parser::with_config(b"<a><b><c/></b></a>", config)
            .parse()
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MaxDepthExceeded { max: 2 });
        assert!(Parser::with_config(b"<a><b/></a>", config).parse().is_ok());
    }

    #[test]
    fn test_max_size() {
        let err = Parser::with_config(b"<svg></svg>", Config::new(0, 4))
            .parse()
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MaxSizeExceeded { max: 4 });
    }

    #[test]
    fn test_default_config_accepts_deep_nesting() -> Result<()> {
        let input = format!("{}{}", "<g>".repeat(130), "</g>".repeat(130));
        let doc = parse(&input)?;
        assert_eq!(doc.root.name, "g");
        Ok(())
    }

    #[test]
    fn test_unlimited_config_survives_extreme_nesting() -> Result<()> {
        let depth = 200_000;
        let input = format!("{}{}", "<g>".repeat(depth), "</g>".repeat(depth));
        let doc = Parser::with_config(input.as_bytes(), Config::unlimited()).parse()?;

        let mut levels = 1;
        let mut element = &doc.root;
        while let Some(child) = element.child_elements().next() {
            levels += 1;
            element = child;
        }
        assert_eq!(levels, depth);
        Ok(())
    }

    #[test]
    fn test_deep_mismatch_reports_innermost_tag() {
        let input = format!("{}</b>", "<g>".repeat(1000));
        let err = parse(&input).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::MismatchedTag {
                expected: "g".to_string(),
                found: "b".to_string()
            }
        );
    }

    #[test]
    fn test_element_position() -> Result<()> {
        let doc = parse("<svg>\n  <rect/>\n</svg>")?;
        let rect = doc.root.child_elements().next().map(|e| e.pos);
        assert_eq!(rect.map(|p| (p.line, p.col)), Some((2, 3)));
        Ok(())
    }
}
