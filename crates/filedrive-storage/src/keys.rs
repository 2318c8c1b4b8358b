//! Shared key generation for storage backends.
//!
//! Key format: `{user_id}/{file_id}/{file_name}`.

use crate::{StorageError, StorageResult};

/// Generate the storage key for one user's file.
///
/// The file id makes the key unique per upload, so two files with the same name never
/// collide and a retried write lands on the same object.
pub fn generate_storage_key(user_id: &str, file_id: &str, file_name: &str) -> StorageResult<String> {
    for (label, segment) in [("user id", user_id), ("file id", file_id), ("file name", file_name)] {
        if segment.is_empty() || segment.contains('/') || segment == "." || segment == ".." {
            return Err(StorageError::InvalidKey(format!(
                "{} is not a valid key segment: {:?}",
                label, segment
            )));
        }
    }
    let key = format!("{}/{}/{}", user_id, file_id, file_name);
    validate_key(&key)?;
    Ok(key)
}

/// Reject keys that could escape a backend's namespace.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty()
        || storage_key.contains("..")
        || storage_key.starts_with('/')
        || storage_key.contains('\0')
        || storage_key.contains('\\')
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// The last path segment of a key, used as the download file name.
pub fn file_name_from_key(storage_key: &str) -> &str {
    storage_key.rsplit('/').next().unwrap_or(storage_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_namespaced_by_user_and_file_id() {
        let key = generate_storage_key("uid-1", "0f8fad5b", "report.pdf").unwrap();
        assert_eq!(key, "uid-1/0f8fad5b/report.pdf");
        assert_eq!(file_name_from_key(&key), "report.pdf");
    }

    #[test]
    fn rejects_segments_that_escape_the_namespace() {
        assert!(generate_storage_key("uid/other", "id", "a.txt").is_err());
        assert!(generate_storage_key("uid", "id", "..").is_err());
        assert!(generate_storage_key("", "id", "a.txt").is_err());
        assert!(generate_storage_key("uid", "id", "a..b").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("a\\b").is_err());
    }
}
