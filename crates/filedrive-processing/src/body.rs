//! Request body decoding and upload dispatch.
//!
//! Gateway-style transports deliver the body as text plus an `isBase64Encoded` flag.
//! [`decode`] turns that into the exact bytes the client sent. [`extract_from_text`] and
//! [`extract_file`] then route multipart bodies to the parser and everything else to the
//! JSON upload format `{fileContent, fileName, fileType}`.

use base64::Engine;
use bytes::Bytes;
use filedrive_core::ExtractedFile;
use serde::Deserialize;

use crate::multipart::{self, ParseError};
use crate::validator::content_type_or_default;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed base64 body: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("body character {ch:?} at offset {offset} does not fit in a single byte")]
    NotSingleByte { ch: char, offset: usize },
}

/// Everything that can go wrong turning a request body into an [`ExtractedFile`].
/// All variants are client errors.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {field} is not valid base64: {source}")]
    InvalidFieldEncoding {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },
}

/// Decode a transport body into raw bytes.
///
/// Base64 bodies are decoded. Text bodies are converted one character to one byte
/// (ISO-8859-1), which is the only conversion the transport preserves; a character
/// above U+00FF means the body was not carried byte-for-byte and is rejected.
pub fn decode(raw: &str, is_base64_encoded: bool) -> Result<Bytes, DecodeError> {
    if is_base64_encoded {
        let decoded = base64::engine::general_purpose::STANDARD.decode(raw.trim())?;
        return Ok(Bytes::from(decoded));
    }

    let mut bytes = Vec::with_capacity(raw.len());
    for (offset, ch) in raw.chars().enumerate() {
        let code = u32::from(ch);
        if code > 0xFF {
            return Err(DecodeError::NotSingleByte { ch, offset });
        }
        bytes.push(code as u8);
    }
    Ok(Bytes::from(bytes))
}

/// Extract the uploaded file from a gateway event body.
pub fn extract_from_text(
    raw: &str,
    is_base64_encoded: bool,
    content_type: Option<&str>,
) -> Result<ExtractedFile, UploadError> {
    match content_type.filter(|ct| is_multipart(ct)) {
        Some(ct) => {
            let body = decode(raw, is_base64_encoded)?;
            Ok(multipart::parse(&body, ct)?)
        }
        // JSON bodies are real text; only a base64 transport needs decoding first.
        None if is_base64_encoded => extract_json(&decode(raw, true)?),
        None => extract_json(raw.as_bytes()),
    }
}

/// Extract the uploaded file from a body the transport delivered as raw bytes.
pub fn extract_file(body: Bytes, content_type: Option<&str>) -> Result<ExtractedFile, UploadError> {
    match content_type.filter(|ct| is_multipart(ct)) {
        Some(ct) => Ok(multipart::parse(&body, ct)?),
        None => extract_json(&body),
    }
}

pub fn is_multipart(content_type: &str) -> bool {
    content_type
        .to_ascii_lowercase()
        .contains("multipart/form-data")
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonUpload {
    file_content: Option<String>,
    file_name: Option<String>,
    file_type: Option<String>,
}

fn extract_json(body: &[u8]) -> Result<ExtractedFile, UploadError> {
    let upload: JsonUpload =
        serde_json::from_slice(body).map_err(|e| UploadError::InvalidJson(e.to_string()))?;

    let file_content = upload
        .file_content
        .ok_or(UploadError::MissingField("fileContent"))?;
    let file_name = upload
        .file_name
        .filter(|name| !name.trim().is_empty())
        .ok_or(UploadError::MissingField("fileName"))?;

    let content = base64::engine::general_purpose::STANDARD
        .decode(file_content.trim())
        .map_err(|source| UploadError::InvalidFieldEncoding {
            field: "fileContent",
            source,
        })?;

    Ok(ExtractedFile {
        file_name,
        content_type: content_type_or_default(upload.file_type.as_deref()),
        content: Bytes::from(content),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(data: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(data)
    }

    fn multipart_body(content: &[u8]) -> Vec<u8> {
        let mut body = b"--B\r\nContent-Disposition: form-data; name=\"f\"; filename=\"x.bin\"\r\nContent-Type: image/png\r\n\r\n".to_vec();
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n--B--\r\n");
        body
    }

    #[test]
    fn base64_bodies_decode_to_original_bytes() {
        let data: Vec<u8> = (0..=255u8).collect();
        assert_eq!(&decode(&b64(&data), true).unwrap()[..], &data[..]);
    }

    #[test]
    fn malformed_base64_is_a_decode_error() {
        let err = decode("not base64!!", true).unwrap_err();
        assert!(matches!(err, DecodeError::Base64(_)));
    }

    #[test]
    fn text_bodies_map_each_char_to_one_byte() {
        let text: String = (0..=255u8).map(|b| b as char).collect();
        let bytes = decode(&text, false).unwrap();
        assert_eq!(bytes.len(), 256);
        assert!(bytes.iter().enumerate().all(|(i, b)| *b as usize == i));
    }

    #[test]
    fn wide_characters_are_rejected() {
        let err = decode("ok€", false).unwrap_err();
        assert!(matches!(err, DecodeError::NotSingleByte { ch: '€', offset: 2 }));
    }

    #[test]
    fn multipart_through_base64_transport() {
        let content = [0x89, b'P', b'N', b'G', 0x00, 0xFF, b'\r', b'\n'];
        let raw = b64(&multipart_body(&content));
        let file =
            extract_from_text(&raw, true, Some("multipart/form-data; boundary=B")).unwrap();
        assert_eq!(file.file_name, "x.bin");
        assert_eq!(file.content_type, "image/png");
        assert_eq!(&file.content[..], &content[..]);
    }

    #[test]
    fn multipart_through_single_byte_text_transport() {
        let content = [0x00, 0x7F, 0x80, 0xC3, 0xA9, 0xFF];
        let raw: String = multipart_body(&content).iter().map(|&b| b as char).collect();
        let file =
            extract_from_text(&raw, false, Some("Multipart/Form-Data; boundary=B")).unwrap();
        assert_eq!(&file.content[..], &content[..]);
    }

    #[test]
    fn json_upload_from_text() {
        let raw = format!(
            r#"{{"fileContent":"{}","fileName":"notes é.txt","fileType":"text/plain"}}"#,
            b64(b"hello")
        );
        let file = extract_from_text(&raw, false, Some("application/json")).unwrap();
        assert_eq!(file.file_name, "notes é.txt");
        assert_eq!(file.content_type, "text/plain");
        assert_eq!(&file.content[..], b"hello");
    }

    #[test]
    fn json_file_type_with_line_break_falls_back_to_octet_stream() {
        let raw = format!(
            r#"{{"fileContent":"{}","fileName":"a.txt","fileType":"text/plain\nX-Injected: 1"}}"#,
            b64(b"hello")
        );
        let file = extract_from_text(&raw, false, Some("application/json")).unwrap();
        assert_eq!(file.content_type, "application/octet-stream");
    }

    #[test]
    fn json_upload_from_base64_transport_without_content_type() {
        let json = format!(r#"{{"fileContent":"{}","fileName":"a.bin"}}"#, b64(&[1u8, 2, 3]));
        let file = extract_from_text(&b64(json.as_bytes()), true, None).unwrap();
        assert_eq!(file.content_type, "application/octet-stream");
        assert_eq!(&file.content[..], &[1u8, 2, 3][..]);
    }

    #[test]
    fn json_upload_errors() {
        let missing_content = extract_file(Bytes::from_static(br#"{"fileName":"a"}"#), None);
        assert!(matches!(missing_content, Err(UploadError::MissingField("fileContent"))));

        let missing_name = extract_file(Bytes::from_static(br#"{"fileContent":"aGk="}"#), None);
        assert!(matches!(missing_name, Err(UploadError::MissingField("fileName"))));

        let bad_content = extract_file(
            Bytes::from_static(br#"{"fileContent":"%%%","fileName":"a"}"#),
            Some("application/json"),
        );
        assert!(matches!(bad_content, Err(UploadError::InvalidFieldEncoding { .. })));

        let not_json = extract_file(Bytes::from_static(b"plain text"), Some("text/plain"));
        assert!(matches!(not_json, Err(UploadError::InvalidJson(_))));
    }

    #[test]
    fn parse_errors_surface_with_their_reason() {
        let err = extract_file(Bytes::from_static(b"--B\r\n"), Some("multipart/form-data")).unwrap_err();
        assert_eq!(err.to_string(), "missing boundary");
    }
}
