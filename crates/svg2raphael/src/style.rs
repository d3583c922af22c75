//! `style` attribute parsing
//!
//! Turns `fill:red;stroke-width:2` into target-language object entries:
//! `"fill":"red"` and `"stroke-width":2`.

use crate::error::{Error, ErrorKind, Result};

/// Parse a style string into `property:value` literal entries.
///
/// Every `;`-separated segment, including an empty one, must contain exactly
/// one `:`; anything else is a format error. Tokens are kept verbatim.
pub fn parse_style(style: &str) -> Result<Vec<String>> {
    style.split(';').map(parse_declaration).collect()
}

fn parse_declaration(segment: &str) -> Result<String> {
    let malformed = || {
        Error::bare(ErrorKind::MalformedStyle {
            segment: segment.to_string(),
        })
    };

    let (property, value) = segment.split_once(':').ok_or_else(malformed)?;
    if value.contains(':') {
        return Err(malformed());
    }

    Ok(format!("{}:{}", quote_literal(property), quote_literal(value)))
}

/// Render a token as an integer literal when it is all ASCII digits,
/// otherwise as a double-quoted string literal.
pub fn quote_literal(token: &str) -> String {
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        let trimmed = token.trim_start_matches('0');
        return if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        };
    }

    let mut quoted = String::with_capacity(token.len() + 2);
    quoted.push('"');
    for ch in token.chars() {
        if matches!(ch, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}
