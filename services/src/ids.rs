// helpers.rs
use uuid::Uuid;

/// Opaque id for a chat message.
///
/// Random v4: message ids are lookup tokens, not stable identities, so
/// uniqueness within a session is the only requirement.
pub fn message_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_non_empty() {
        let a = message_id();
        let b = message_id();
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }
}
