//! Classification of remote error messages.
//!
//! The repository reports lock conflicts and missing write privileges only
//! as free text. Everything that depends on telling them apart goes through
//! [`classify_remote_error`], so a structured check can replace the pattern
//! rules in one place.

/// What a remote error message means to this layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// The document is locked by `owner`.
    LockConflict { owner: String },
    /// The session's identity lacks a needed write privilege.
    AuthorizationDenied,
    /// Anything else.
    Protocol,
}

const LOCKED_BY: &str = "Document already locked by ";

const DENIED: &[&str] = &[
    "Privilege 'WriteProperties' is not granted to",
    "Privilege 'AddChildren' is not granted to",
];

/// Classify a remote error message. Rules are tried in order.
pub fn classify_remote_error(message: &str) -> RemoteErrorKind {
    if let Some(start) = message.find(LOCKED_BY) {
        let rest = &message[start + LOCKED_BY.len()..];
        // The owner is terminated by a colon.
        let owner = rest.split(':').next().unwrap_or(rest).trim();
        if !owner.is_empty() {
            return RemoteErrorKind::LockConflict {
                owner: owner.to_string(),
            };
        }
    }

    if DENIED.iter().any(|pattern| message.contains(pattern)) {
        return RemoteErrorKind::AuthorizationDenied;
    }

    RemoteErrorKind::Protocol
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lock_conflict_extracts_owner() {
        let msg = "Failed to invoke operation: Document.Lock, Document already locked by bob: 7f3a-...";
        assert_eq!(
            classify_remote_error(msg),
            RemoteErrorKind::LockConflict {
                owner: "bob".into()
            }
        );
    }

    #[test]
    fn test_lock_conflict_without_colon() {
        assert_eq!(
            classify_remote_error("Document already locked by carol"),
            RemoteErrorKind::LockConflict {
                owner: "carol".into()
            }
        );
    }

    #[test]
    fn test_write_privilege_denied() {
        assert_eq!(
            classify_remote_error("Privilege 'WriteProperties' is not granted to alice"),
            RemoteErrorKind::AuthorizationDenied
        );
        assert_eq!(
            classify_remote_error("Privilege 'AddChildren' is not granted to alice"),
            RemoteErrorKind::AuthorizationDenied
        );
    }

    #[test]
    fn test_lock_rule_wins_over_privilege_rule() {
        let msg = "Document already locked by bob: Privilege 'WriteProperties' is not granted to alice";
        assert!(matches!(
            classify_remote_error(msg),
            RemoteErrorKind::LockConflict { .. }
        ));
    }

    #[test]
    fn test_other_messages_are_protocol_errors() {
        assert_eq!(classify_remote_error("Internal Server Error"), RemoteErrorKind::Protocol);
        assert_eq!(classify_remote_error(""), RemoteErrorKind::Protocol);
    }

    proptest! {
        #[test]
        fn prop_classify_never_panics(msg in ".*") {
            let _ = classify_remote_error(&msg);
        }
    }
}
