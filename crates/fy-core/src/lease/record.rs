//! Lease records and the credential material they carry.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FyError, Result};

/// Field of the broker response data holding the base64 key document.
pub const PRIVATE_KEY_DATA_FIELD: &str = "private_key_data";

/// A project/role pair that gets its own lease.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeaseTarget {
    pub project_id: String,
    pub role: String,
}

impl LeaseTarget {
    pub fn new(project_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            role: role.into(),
        }
    }

    /// Broker path of the GCP secrets engine key endpoint.
    pub fn path(&self) -> String {
        format!("gcp_{}/key/{}", self.project_id, self.role)
    }

    /// File name shared by the lease and credentials files.
    pub fn file_name(&self) -> String {
        format!("{}_{}.json", self.project_id, self.role)
    }
}

impl fmt::Display for LeaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project_id, self.role)
    }
}

/// A broker-issued lease.
///
/// `lease_data` is the raw broker response and is what gets persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaseRecord {
    target: LeaseTarget,
    lease_id: Option<String>,
    lease_data: Value,
}

impl LeaseRecord {
    pub fn from_response(target: LeaseTarget, lease_data: Value) -> Self {
        let lease_id = lease_data
            .get("lease_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        Self {
            target,
            lease_id,
            lease_data,
        }
    }

    pub fn target(&self) -> &LeaseTarget {
        &self.target
    }

    pub fn path(&self) -> String {
        self.target.path()
    }

    pub fn lease_id(&self) -> Option<&str> {
        self.lease_id.as_deref()
    }

    /// Only records with a lease id can be revoked.
    pub fn is_active(&self) -> bool {
        self.lease_id.is_some()
    }

    pub fn lease_data(&self) -> &Value {
        &self.lease_data
    }

    /// Lease duration in seconds as reported by the broker.
    pub fn lease_duration(&self) -> Option<u64> {
        self.lease_data.get("lease_duration").and_then(Value::as_u64)
    }

    /// Decode the key document embedded in the response data.
    pub fn decode_credentials(&self) -> Result<ServiceAccountKey> {
        let path = self.path();
        let encoded = self
            .lease_data
            .get("data")
            .and_then(|data| data.get(PRIVATE_KEY_DATA_FIELD))
            .and_then(Value::as_str)
            .ok_or_else(|| FyError::MalformedLease {
                path: path.clone(),
                reason: format!("response has no data.{PRIVATE_KEY_DATA_FIELD}"),
            })?;
        ServiceAccountKey::from_base64(&path, encoded)
    }
}

impl fmt::Display for LeaseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vault path: {}, lease id: {}",
            self.path(),
            self.lease_id.as_deref().unwrap_or("-")
        )
    }
}

/// Decoded service account key document.
///
/// Unknown fields are kept and absent fields stay absent, so the file written
/// for downstream tools is the document the broker issued.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("client_email", &self.client_email)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_base64(path: &str, encoded: &str) -> Result<Self> {
        let malformed = |reason: String| FyError::MalformedLease {
            path: path.to_string(),
            reason,
        };
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| malformed(format!("{PRIVATE_KEY_DATA_FIELD} is not base64: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| malformed(format!("{PRIVATE_KEY_DATA_FIELD} is not a key document: {e}")))
    }
}
