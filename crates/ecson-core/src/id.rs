//! Id generation for entities, ops, assets and wires.
//!
//! Ids are UUIDv4 rendered without hyphens, so every generated id has the
//! same length and the same alphabet.

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

/// Length of every generated id.
pub const ID_LENGTH: usize = 32;

/// Generate a new unique id.
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Whether `id` has the shape produced by [`generate_id`].
pub fn is_generated_id(id: &str) -> bool {
    id.len() == ID_LENGTH && id.chars().all(|c| c.is_ascii_hexdigit())
}

/// Milliseconds since the Unix epoch, used to stamp op envelopes.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_fixed_length() {
        for _ in 0..16 {
            let id = generate_id();
            assert_eq!(id.len(), ID_LENGTH);
            assert!(is_generated_id(&id));
        }
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hand_written_id_is_not_generated_shape() {
        assert!(!is_generated_id("root"));
    }
}
