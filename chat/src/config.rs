//! Chat-layer configuration

/// What to do with a HELLO that fails authentication: a bad signature, or a
/// `user_id` that is bound to another key
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HelloPolicy {
    /// Keep the session, surface the HELLO with `verified: false`, and do not
    /// register the sender
    #[default]
    Record,
    /// Fail with [`crate::ChatError::HelloRejected`]; the caller drops the session
    Reject,
}

#[derive(Clone, Debug, Default)]
pub struct ChatConfig {
    pub hello_policy: HelloPolicy,

    /// Refuse CHAT from a `from` that has no verified HELLO on record
    pub require_registered_sender: bool,

    /// Only accept a `user_id` equal to the fingerprint of the key it is
    /// announced with
    pub require_key_fingerprint_ids: bool,
}

impl ChatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hello_policy(mut self, policy: HelloPolicy) -> Self {
        self.hello_policy = policy;
        self
    }

    pub fn with_registered_senders_only(mut self) -> Self {
        self.require_registered_sender = true;
        self
    }

    pub fn with_key_fingerprint_ids(mut self) -> Self {
        self.require_key_fingerprint_ids = true;
        self
    }

    /// Reject unverified HELLOs, unregistered senders and user ids that are
    /// not key fingerprints
    pub fn strict() -> Self {
        Self {
            hello_policy: HelloPolicy::Reject,
            require_registered_sender: true,
            require_key_fingerprint_ids: true,
        }
    }
}
