// src/gate.rs
//! Access gate in front of the headline routes. The real check (biometric
//! or otherwise) lives upstream; this only sees its verdict as a token.

use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Bypassed,
    Denied,
}

impl Access {
    pub fn allowed(self) -> bool {
        !matches!(self, Access::Denied)
    }
}

pub trait AccessGate: Send + Sync {
    fn check(&self, presented: Option<&str>) -> Access;
}

/// Compares the presented token with the configured one. No configured
/// token means the gate is explicitly bypassed.
#[derive(Debug, Clone)]
pub struct TokenGate {
    expected: Option<[u8; 32]>,
}

impl TokenGate {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            expected: token.map(digest),
        }
    }

    pub fn open() -> Self {
        Self { expected: None }
    }
}

// Compare digests so the comparison time does not depend on the prefix match.
fn digest(s: &str) -> [u8; 32] {
    Sha256::digest(s.as_bytes()).into()
}

impl AccessGate for TokenGate {
    fn check(&self, presented: Option<&str>) -> Access {
        match (&self.expected, presented) {
            (None, _) => Access::Bypassed,
            (Some(want), Some(got)) if digest(got.trim()) == *want => Access::Granted,
            _ => Access::Denied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_gate_bypasses() {
        assert_eq!(TokenGate::open().check(None), Access::Bypassed);
        assert!(TokenGate::open().check(Some("x")).allowed());
    }

    #[test]
    fn token_gate_grants_only_matching_token() {
        let g = TokenGate::new(Some("s3cret"));
        assert_eq!(g.check(Some("s3cret")), Access::Granted);
        assert_eq!(g.check(Some("nope")), Access::Denied);
        assert_eq!(g.check(None), Access::Denied);
    }
}
