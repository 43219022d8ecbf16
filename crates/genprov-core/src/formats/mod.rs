//! # Formats
//!
//! On-disk event encodings. File I/O lives in the application.

pub mod persistence;

pub use persistence::{
    EventHeader, MAX_PERSISTENCE_PAYLOAD_SIZE, event_from_bytes, event_from_bytes_strict,
    event_to_bytes,
};
