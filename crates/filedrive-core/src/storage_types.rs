use std::fmt;
use std::str::FromStr;

/// Where file bytes live. `Memory` is for local development and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
    Memory,
}

/// Where file metadata records live. `Memory` loses every record on restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageBackend::S3 => "s3",
            StorageBackend::Local => "local",
            StorageBackend::Memory => "memory",
        }
    }
}

impl MetadataBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            MetadataBackend::Postgres => "postgres",
            MetadataBackend::Memory => "memory",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [StorageBackend::S3, StorageBackend::Local, StorageBackend::Memory]
            .into_iter()
            .find(|backend| s.eq_ignore_ascii_case(backend.as_str()))
            .ok_or_else(|| anyhow::anyhow!("Invalid storage backend: {}", s))
    }
}

impl FromStr for MetadataBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("postgresql") {
            return Ok(MetadataBackend::Postgres);
        }
        [MetadataBackend::Postgres, MetadataBackend::Memory]
            .into_iter()
            .find(|backend| s.eq_ignore_ascii_case(backend.as_str()))
            .ok_or_else(|| anyhow::anyhow!("Invalid metadata backend: {}", s))
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for MetadataBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backends_case_insensitively() {
        assert_eq!("S3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!("local".parse::<StorageBackend>().unwrap(), StorageBackend::Local);
        assert_eq!(
            "PostgreSQL".parse::<MetadataBackend>().unwrap(),
            MetadataBackend::Postgres
        );
        assert!("nfs".parse::<StorageBackend>().is_err());
        assert!("dynamo".parse::<MetadataBackend>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        let backend = StorageBackend::Memory;
        assert_eq!(backend.to_string().parse::<StorageBackend>().unwrap(), backend);
    }
}
