//! # Event Binary Format
//!
//! Format: Header (5 bytes) + postcard-serialized `SerializableEvent`.
//! - 4 bytes: Magic ("GPRV")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded. Decoding
//! rebuilds the event through `EventBuilder`, so cached shapes and recorded
//! malformations are recomputed rather than trusted from disk.

use crate::event::{Event, SerializableEvent};
use crate::{GenprovError, primitives};

/// Maximum accepted encoded event size, header included.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 256 * 1024 * 1024; // 256 MiB

const HEADER_LEN: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The header that precedes every encoded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl EventHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), GenprovError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(GenprovError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(GenprovError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let [a, b, c, d] = self.magic;
        [a, b, c, d, self.version]
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GenprovError> {
        match bytes {
            [a, b, c, d, version, ..] => Ok(Self {
                magic: [*a, *b, *c, *d],
                version: *version,
            }),
            _ => Err(GenprovError::DeserializationError(
                "Header too short".to_string(),
            )),
        }
    }
}

impl Default for EventHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ENCODE / DECODE
// =============================================================================

/// Encode an event (header + payload).
pub fn event_to_bytes(event: &Event) -> Result<Vec<u8>, GenprovError> {
    let payload = postcard::to_stdvec(&SerializableEvent::from(event))
        .map_err(|e| GenprovError::SerializationError(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&EventHeader::new().to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode an event into a graph that records malformed nodes.
pub fn event_from_bytes(bytes: &[u8]) -> Result<Event, GenprovError> {
    decode(bytes)?.into_event(false)
}

/// Decode an event into a graph that rejects malformed nodes.
pub fn event_from_bytes_strict(bytes: &[u8]) -> Result<Event, GenprovError> {
    decode(bytes)?.into_event(true)
}

fn decode(bytes: &[u8]) -> Result<SerializableEvent, GenprovError> {
    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(GenprovError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }
    let header = EventHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = bytes.get(HEADER_LEN..).unwrap_or_default();
    postcard::from_bytes(payload).map_err(|e| {
        GenprovError::DeserializationError(format!("Failed to decode event payload: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================
