//! # Primitives
//!
//! Fixed constants of the genprov engine.
//!
//! These are compiled into the binary and are immutable at runtime.

/// Magic bytes for the genprov binary event format header.
///
/// - File Header = Magic Bytes ("GPRV") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"GPRV";

/// Current serialization format version.
///
/// Increment this when making breaking changes to the event format.
pub const FORMAT_VERSION: u8 = 1;

/// Speed of light in m/s, used to convert simulated times (mm/c) to seconds.
pub const C_LIGHT: f64 = 2.997_924_58e8;

/// Pseudorapidity reported for vectors lying on the beam axis.
pub const PSEUDORAPIDITY_LIMIT: f64 = 1.0e10;

/// Record-level pseudorapidity placeholder for positions on the beam axis.
pub const BEAM_AXIS_ETA: f64 = 999.9;

/// Record-level `cot(theta)` placeholder when `tan(theta) == 0`.
pub const CTG_THETA_LIMIT: f64 = 1.0e10;

/// Score the leading-particle selector starts from. Below any legal `pt`.
pub const SENTINEL_SCORE: f64 = -1.0;

/// Score the leading-particle selector resets to when a tower opens.
pub const TOWER_SCOPE_SCORE: f64 = 0.0;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of nodes accepted in one event.
///
/// Events above this are rejected by the decoder before any graph is built.
pub const MAX_EVENT_NODES: usize = 4_000_000;

/// Maximum number of output objects accepted in one event.
pub const MAX_EVENT_OBJECTS: usize = 1_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"GPRV");
    }

    #[test]
    fn sentinel_is_below_tower_scope() {
        assert!(SENTINEL_SCORE < TOWER_SCOPE_SCORE);
    }
}
