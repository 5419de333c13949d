//! Record encoding for registry values.
//!
//! The registry stores plain strings. Records and unit statuses are encoded
//! as YAML by default; JSON is available for registries shared with tooling
//! that expects it. Both sides of a registry must use the same codec.

use procreg_shared::errors::{ProcregError, ProcregResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::{ExecutionRecord, UnitStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    #[default]
    Yaml,
    Json,
}

impl Codec {
    pub fn encode_record(&self, record: &ExecutionRecord) -> ProcregResult<String> {
        self.encode(record)
    }

    pub fn decode_record(&self, value: &str) -> ProcregResult<ExecutionRecord> {
        self.decode(value)
    }

    /// Encode a single unit status (the value stored under a unit key).
    pub fn encode_status(&self, status: UnitStatus) -> ProcregResult<String> {
        match self {
            // A bare scalar keeps unit nodes human readable in registry UIs.
            Codec::Yaml => Ok(status.as_str().to_string()),
            Codec::Json => self.encode(&status),
        }
    }

    /// Decode a unit status. An empty value means `PENDING`.
    pub fn decode_status(&self, value: &str) -> ProcregResult<UnitStatus> {
        if value.trim().is_empty() {
            return Ok(UnitStatus::Pending);
        }
        self.decode(value)
    }

    fn encode<T: Serialize>(&self, value: &T) -> ProcregResult<String> {
        match self {
            Codec::Yaml => serde_yaml::to_string(value)
                .map_err(|e| ProcregError::Codec(format!("failed to encode yaml: {}", e))),
            Codec::Json => serde_json::to_string(value)
                .map_err(|e| ProcregError::Codec(format!("failed to encode json: {}", e))),
        }
    }

    fn decode<T: DeserializeOwned>(&self, value: &str) -> ProcregResult<T> {
        match self {
            Codec::Yaml => serde_yaml::from_str(value)
                .map_err(|e| ProcregError::Codec(format!("failed to decode yaml: {}", e))),
            Codec::Json => serde_json::from_str(value)
                .map_err(|e| ProcregError::Codec(format!("failed to decode json: {}", e))),
        }
    }
}

impl std::str::FromStr for Codec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yaml" => Ok(Codec::Yaml),
            "json" => Ok(Codec::Json),
            other => Err(format!("unknown codec '{}'", other)),
        }
    }
}
