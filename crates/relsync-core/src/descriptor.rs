//! Release descriptors: the small YAML file (`latest.yml`) published with
//! each release that names its version and the installer's SHA-256.

use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

/// Parsed release descriptor. Unknown keys (`files`, `sha512`, `releaseDate`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Descriptor {
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
    /// Lowercase hex SHA-256 of the installer.
    #[serde(default)]
    pub sha2: Option<String>,
    /// Installer file name, when the publisher includes it.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("read descriptor {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse descriptor {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Versions such as `2.0` are plain YAML numbers; keep their source text.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a version string, got {other:?}"
        ))),
    }
}

pub fn parse_descriptor(text: &str) -> Result<Descriptor, serde_yaml::Error> {
    serde_yaml::from_str(text)
}

/// Read and parse a descriptor file.
pub async fn read_descriptor(path: &Path) -> Result<Descriptor, DescriptorError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DescriptorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse_descriptor(&text).map_err(|source| DescriptorError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
