//! Data-topic message schema.
//!
//! Every emitted event is announced on the data topic with a small JSON
//! document. The document is internally tagged with a `schema` field so the
//! format can evolve without breaking consumers: the `v1` layout keeps the
//! three keys existing consumers read (`url`, `time`, `filename`) at the
//! top level.
//!
//! ```json
//! {"schema":"v1","url":"http://...","time":"2023-10-23T10:00:00+00:00","filename":"cygno-ab12.jpg"}
//! ```

use serde::{Deserialize, Serialize};

/// Descriptor of one stored event object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescriptor {
    /// Presigned, time-limited retrieval URL for the object.
    pub url: String,
    /// Emission timestamp (RFC 3339).
    pub time: String,
    /// Object name in the destination bucket.
    pub filename: String,
}

/// A message published on the data topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "schema")]
pub enum DataMessage {
    /// First schema version: a flat event descriptor.
    #[serde(rename = "v1")]
    V1(EventDescriptor),
}

impl DataMessage {
    /// Wrap a descriptor in the current schema version.
    pub const fn current(descriptor: EventDescriptor) -> Self {
        Self::V1(descriptor)
    }

    /// The event descriptor carried by this message.
    pub const fn descriptor(&self) -> &EventDescriptor {
        match self {
            Self::V1(descriptor) => descriptor,
        }
    }

    /// Serialize to the UTF-8 JSON payload published on the bus.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
