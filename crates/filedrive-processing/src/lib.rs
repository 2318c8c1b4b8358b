//! Upload body processing
//!
//! Turns an upload request body into an [`ExtractedFile`]:
//!
//! - [`body`] decodes transport encodings and dispatches between multipart and JSON bodies
//! - [`multipart`] recovers the file part from a `multipart/form-data` body, byte for byte
//! - [`validator`] sanitises file names and enforces the size limit
//!
//! Everything here is synchronous and performs no I/O.

pub mod body;
pub mod multipart;
pub mod validator;

pub use body::{decode, extract_file, extract_from_text, DecodeError, UploadError};
pub use filedrive_core::ExtractedFile;
pub use multipart::ParseError;
pub use validator::{content_type_or_default, sanitize_filename, UploadValidator, ValidationError};
