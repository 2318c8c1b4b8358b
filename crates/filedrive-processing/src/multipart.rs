//! `multipart/form-data` file extraction.
//!
//! The body is split on the boundary delimiter as raw bytes and every slice of file
//! content is taken from the input buffer without copying or transcoding. Only header
//! blocks are decoded as text, using Latin-1 so every byte maps to one character.

use bytes::Bytes;
use filedrive_core::ExtractedFile;
use std::collections::HashMap;
use std::ops::Range;

use crate::validator::content_type_or_default;

const CRLF: &[u8] = b"\r\n";
const HEADER_SEPARATOR: &[u8] = b"\r\n\r\n";
const FILENAME_ATTR: &[u8] = b"filename=";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("missing boundary")]
    MissingBoundary,

    #[error("malformed structure")]
    MalformedStructure,

    #[error("no file part found")]
    NoFilePart,
}

impl ParseError {
    pub fn reason(&self) -> &'static str {
        match self {
            ParseError::MissingBoundary => "missing boundary",
            ParseError::MalformedStructure => "malformed structure",
            ParseError::NoFilePart => "no file part found",
        }
    }
}

/// One part of the body: lowercase header name to raw value, and the body's range in the input.
struct Part<'a> {
    headers: HashMap<String, &'a [u8]>,
    body: Range<usize>,
}

/// Extract the first file part from a multipart body.
///
/// `content_type` is the request's `Content-Type` header, which must carry the
/// `boundary` parameter. The returned content is a zero-copy slice of `body`.
pub fn parse(body: &Bytes, content_type: &str) -> Result<ExtractedFile, ParseError> {
    let boundary = extract_boundary(content_type).ok_or(ParseError::MissingBoundary)?;
    let delimiter = format!("--{}", boundary);

    let segments = split_on(body, delimiter.as_bytes());
    if segments.len() < 3 {
        return Err(ParseError::MalformedStructure);
    }

    // First segment is the preamble, last is whatever follows the closing delimiter.
    for segment in &segments[1..segments.len() - 1] {
        let segment = trim_framing(body, segment.clone());
        if segment.is_empty() {
            continue;
        }

        let Some(part) = parse_part(body, segment) else {
            tracing::debug!("Skipping multipart segment without header separator");
            continue;
        };

        let Some(disposition) = part.headers.get("content-disposition") else {
            continue;
        };
        let Some(file_name) = filename_attribute(disposition) else {
            continue;
        };

        let declared = part.headers.get("content-type").map(|value| latin1_to_string(value));
        let content_type = content_type_or_default(declared.as_deref());

        tracing::debug!(
            file_name = %file_name,
            content_type = %content_type,
            size_bytes = part.body.len(),
            "Found file part in multipart body"
        );

        return Ok(ExtractedFile {
            file_name,
            content_type,
            content: body.slice(part.body),
        });
    }

    Err(ParseError::NoFilePart)
}

/// Find the `boundary` parameter of a content-type header, without surrounding quotes.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|param| {
        let (name, value) = param.trim().split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("boundary") {
            return None;
        }
        let value = value.trim().trim_matches(|c: char| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Ranges of `haystack` between occurrences of `needle`, including the leading and trailing remainders.
fn split_on(haystack: &[u8], needle: &[u8]) -> Vec<Range<usize>> {
    let mut segments = Vec::new();
    let mut start = 0;
    while let Some(offset) = find(&haystack[start..], needle) {
        segments.push(start..start + offset);
        start += offset + needle.len();
    }
    segments.push(start..haystack.len());
    segments
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Drop the line break that ends the delimiter line and the one that precedes the next delimiter.
///
/// Exactly one break is removed at each end, so content ending in `\r`, `\n` or `-` is kept intact.
fn trim_framing(body: &[u8], mut range: Range<usize>) -> Range<usize> {
    let bytes = &body[range.clone()];
    if bytes.starts_with(CRLF) {
        range.start += 2;
    } else if bytes.starts_with(b"\n") {
        range.start += 1;
    }

    let bytes = &body[range.clone()];
    if bytes.ends_with(CRLF) {
        range.end -= 2;
    } else if bytes.ends_with(b"\n") {
        range.end -= 1;
    }
    range
}

fn parse_part(body: &[u8], segment: Range<usize>) -> Option<Part<'_>> {
    let bytes = &body[segment.clone()];
    let split = find(bytes, HEADER_SEPARATOR)?;

    let mut headers = HashMap::new();
    for line in bytes[..split].split(|b| *b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let Some(colon) = line.iter().position(|b| *b == b':') else {
            continue;
        };
        let name = latin1_to_string(&line[..colon]).to_lowercase();
        if name.is_empty() {
            continue;
        }
        headers.insert(name, line[colon + 1..].trim_ascii());
    }

    let body_start = segment.start + split + HEADER_SEPARATOR.len();
    Some(Part {
        headers,
        body: body_start..segment.end,
    })
}

/// Value of the `filename=` attribute: up to the next `;`, with surrounding quotes removed.
///
/// Browsers send non-ASCII names as raw UTF-8, so the bytes are read as UTF-8 when valid
/// and as Latin-1 otherwise.
fn filename_attribute(disposition: &[u8]) -> Option<String> {
    let start = find(disposition, FILENAME_ATTR)? + FILENAME_ATTR.len();
    let rest = &disposition[start..];
    let end = rest.iter().position(|b| *b == b';').unwrap_or(rest.len());
    let raw = trim_quotes(rest[..end].trim_ascii());

    Some(match std::str::from_utf8(raw) {
        Ok(name) => name.to_string(),
        Err(_) => latin1_to_string(raw),
    })
}

fn trim_quotes(mut value: &[u8]) -> &[u8] {
    while let [b'"' | b'\'', rest @ ..] = value {
        value = rest;
    }
    while let [rest @ .., b'"' | b'\''] = value {
        value = rest;
    }
    value
}

fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect::<String>().trim().to_string()
}
