use filedrive_core::constants::{DEFAULT_CONTENT_TYPE, MAX_FILENAME_LENGTH};
use filedrive_core::ExtractedFile;

/// Upload validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("missing required field: fileName")]
    MissingFilename,
}

/// Checks an extracted file before it is stored.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size: usize,
}

impl UploadValidator {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size. Empty files are allowed.
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Validate size and replace the file name with its sanitised form.
    pub fn validate(&self, mut file: ExtractedFile) -> Result<ExtractedFile, ValidationError> {
        self.validate_file_size(file.size())?;
        file.file_name = sanitize_filename(&file.file_name)?;
        Ok(file)
    }
}

/// Sanitize a client-supplied file name for use as the last storage key segment.
///
/// Directory components are dropped (both `/` and `\` separators), every character outside
/// `[A-Za-z0-9._-]` becomes `_`, and the result is capped at 255 characters. The output is
/// ASCII, so the cap is also a byte length.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    let filename_only = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename)
        .trim();

    if filename_only.is_empty() {
        return Err(ValidationError::MissingFilename);
    }

    if filename_only.contains("..") {
        return Err(ValidationError::InvalidFilename(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '.') {
        return Err(ValidationError::InvalidFilename(filename.to_string()));
    }

    Ok(sanitized)
}

/// The client-declared content type if it is usable as a response header value, otherwise
/// `application/octet-stream`.
pub fn content_type_or_default(declared: Option<&str>) -> String {
    declared
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .filter(|value| http::HeaderValue::from_str(value).is_ok())
        .map(String::from)
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn sanitize_filename_rejects_path_traversal() {
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("....").is_err());
        assert!(sanitize_filename(".").is_err());
    }

    #[test]
    fn sanitize_filename_drops_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\report.pdf").unwrap(), "report.pdf");
    }

    #[test]
    fn sanitize_filename_accepts_valid_names() {
        assert_eq!(sanitize_filename("image.png").unwrap(), "image.png");
        assert_eq!(sanitize_filename("my-file_1.jpg").unwrap(), "my-file_1.jpg");
    }

    #[test]
    fn sanitize_filename_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("my report (1).pdf").unwrap(), "my_report__1_.pdf");
        assert_eq!(sanitize_filename("a?b*c.txt").unwrap(), "a_b_c.txt");
        assert_eq!(sanitize_filename("résumé.pdf").unwrap(), "r_sum_.pdf");
    }

    #[test]
    fn sanitize_filename_requires_a_name() {
        assert!(matches!(sanitize_filename(""), Err(ValidationError::MissingFilename)));
        assert!(matches!(sanitize_filename("dir/"), Err(ValidationError::MissingFilename)));
        assert!(matches!(sanitize_filename("   "), Err(ValidationError::MissingFilename)));
    }

    #[test]
    fn sanitize_filename_caps_length() {
        let long = "a".repeat(400);
        assert_eq!(sanitize_filename(&long).unwrap().len(), 255);

        let wide = "é".repeat(300);
        let sanitized = sanitize_filename(&wide).unwrap();
        assert_eq!(sanitized.len(), 255);
        assert!(sanitized.is_ascii());
    }

    #[test]
    fn validator_enforces_size_and_allows_empty_files() {
        let validator = UploadValidator::new(4);
        let file = |content: &'static [u8]| ExtractedFile {
            file_name: "dir/x y.bin".to_string(),
            content_type: "application/octet-stream".to_string(),
            content: Bytes::from_static(content),
        };

        let ok = validator.validate(file(&b""[..])).unwrap();
        assert_eq!(ok.file_name, "x_y.bin");
        assert!(validator.validate(file(&b"1234"[..])).is_ok());
        assert!(matches!(
            validator.validate(file(&b"12345"[..])),
            Err(ValidationError::FileTooLarge { size: 5, max: 4 })
        ));
    }

    #[test]
    fn content_type_must_be_a_valid_header_value() {
        assert_eq!(content_type_or_default(Some(" image/png ")), "image/png");
        assert_eq!(
            content_type_or_default(Some("text/plain; charset=utf-8")),
            "text/plain; charset=utf-8"
        );
        for bad in [None, Some(""), Some("   "), Some("text/plain\r\nX-A: b"), Some("a\u{7f}")] {
            assert_eq!(content_type_or_default(bad), "application/octet-stream");
        }
    }
}
