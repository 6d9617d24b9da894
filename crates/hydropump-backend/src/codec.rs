//! Document codecs
//!
//! JSON via serde_json, YAML via serde_yaml. The codec decides both the
//! on-disk format and the file extension.

use crate::error::{BackendError, BackendResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Serialization format for stored documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Codec {
    /// `.json`, pretty-printed
    #[default]
    Json,
    /// `.yaml` (`yml` accepted as an alias)
    Yaml,
}

impl Codec {
    /// File extension written by this codec (without dot)
    #[inline]
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    /// Serialize a document
    ///
    /// `path` is only used for error context.
    ///
    /// # Errors
    /// Returns `BackendError::Encode` if serialization fails
    pub fn encode<T: Serialize>(self, value: &T, path: &Path) -> BackendResult<String> {
        let encoded = match self {
            Self::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        };
        encoded.map_err(|message| BackendError::Encode {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Deserialize a document
    ///
    /// `path` is only used for error context.
    ///
    /// # Errors
    /// Returns `BackendError::Decode` if the content is not valid for this codec
    pub fn decode<T: DeserializeOwned>(self, content: &str, path: &Path) -> BackendResult<T> {
        let decoded = match self {
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        };
        decoded.map_err(|message| BackendError::Decode {
            path: path.to_path_buf(),
            message,
        })
    }
}

impl FromStr for Codec {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(BackendError::Configuration(format!(
                "unsupported file extension: '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for Codec {
    type Error = BackendError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Codec> for String {
    fn from(codec: Codec) -> Self {
        codec.extension().to_string()
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydropump_model::{InstructionEnvelope, Metadata, Source};
    use serde_json::json;

    fn envelope() -> InstructionEnvelope {
        let instruction: Source =
            serde_json::from_value(json!({"zone": "us-east1-a", "ports": [80, 443]})).unwrap();
        InstructionEnvelope {
            metadata: Metadata::new().with_templates(["net"]),
            instruction,
        }
    }

    #[test]
    fn parse_extensions() {
        assert_eq!("json".parse::<Codec>().unwrap(), Codec::Json);
        assert_eq!("yaml".parse::<Codec>().unwrap(), Codec::Yaml);
        assert_eq!("yml".parse::<Codec>().unwrap(), Codec::Yaml);
        assert_eq!(".YML".parse::<Codec>().unwrap(), Codec::Yaml);
    }

    #[test]
    fn unknown_extension_is_configuration_error() {
        let err = "xml".parse::<Codec>().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn yml_alias_writes_yaml_extension() {
        let codec: Codec = "yml".parse().unwrap();
        assert_eq!(codec.extension(), "yaml");
    }

    #[test]
    fn json_document_layout() {
        let path = Path::new("base/x.json");
        let text = Codec::Json.encode(&envelope(), path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["metadata"]["templates"], json!(["net"]));
        assert_eq!(value["instruction"]["ports"], json!([80, 443]));
    }

    #[test]
    fn yaml_decodes_what_it_encodes() {
        let path = Path::new("base/x.yaml");
        let text = Codec::Yaml.encode(&envelope(), path).unwrap();
        let decoded: InstructionEnvelope = Codec::Yaml.decode(&text, path).unwrap();
        assert_eq!(decoded, envelope());
    }

    #[test]
    fn decode_error_carries_path() {
        let err = Codec::Json
            .decode::<InstructionEnvelope>("{not json", Path::new("base/broken.json"))
            .unwrap_err();
        assert!(matches!(err, BackendError::Decode { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn serde_accepts_alias() {
        let codec: Codec = serde_json::from_value(json!("yml")).unwrap();
        assert_eq!(codec, Codec::Yaml);
        assert_eq!(serde_json::to_value(codec).unwrap(), json!("yaml"));
    }
}
