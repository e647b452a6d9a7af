//! # rm-auth-simple
//!
//! Signed-token implementation of `SessionProvider`, plus Argon2 password
//! verification for the login path. Tokens are `payload.signature`: the
//! payload is the base64url-encoded actor, the signature a salted SHA-256
//! over it. Rotating the salt invalidates every outstanding session.

use async_trait::async_trait;
use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rm_core::models::Actor;
use rm_core::traits::SessionProvider;
use sha2::{Digest, Sha256};

pub struct SimpleSessionProvider {
    /// Secret salt for signing session tokens (e.g., from an environment
    /// variable).
    session_salt: String,
}

impl SimpleSessionProvider {
    pub fn new(salt: &str) -> Self {
        Self {
            session_salt: salt.to_string(),
        }
    }

    fn sign(&self, payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.session_salt.as_bytes());
        hasher.update(payload.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl SessionProvider for SimpleSessionProvider {
    /// Any failure mode — missing separator, bad signature, mangled payload —
    /// resolves to `Ok(None)`: the caller only learns "no session".
    async fn resolve_session(&self, token: &str) -> anyhow::Result<Option<Actor>> {
        let Some((payload, signature)) = token.split_once('.') else {
            return Ok(None);
        };
        if self.sign(payload) != signature {
            return Ok(None);
        }
        let Ok(bytes) = URL_SAFE_NO_PAD.decode(payload) else {
            return Ok(None);
        };
        Ok(serde_json::from_slice(&bytes).ok())
    }

    fn issue_session(&self, actor: &Actor) -> anyhow::Result<String> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(actor)?);
        let signature = self.sign(&payload);
        Ok(format!("{payload}.{signature}"))
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
    use rm_core::models::Role;
    use uuid::Uuid;

    fn alice() -> Actor {
        Actor {
            id: Uuid::now_v7(),
            name: "Alice".to_string(),
            role: Role::Buyer,
        }
    }

    #[tokio::test]
    async fn issued_tokens_resolve_to_the_same_actor() {
        let provider = SimpleSessionProvider::new("test-salt");
        let actor = alice();
        let token = provider.issue_session(&actor).unwrap();

        let resolved = provider.resolve_session(&token).await.unwrap().unwrap();
        assert_eq!(resolved.id, actor.id);
        assert_eq!(resolved.name, "Alice");
        assert_eq!(resolved.role, Role::Buyer);
    }

    #[tokio::test]
    async fn tampered_or_garbage_tokens_resolve_to_none() {
        let provider = SimpleSessionProvider::new("test-salt");
        let token = provider.issue_session(&alice()).unwrap();

        let mut forged = token.clone();
        forged.replace_range(0..1, "X");
        assert!(provider.resolve_session(&forged).await.unwrap().is_none());
        assert!(provider.resolve_session("not-a-token").await.unwrap().is_none());
        assert!(provider.resolve_session("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rotating_the_salt_invalidates_sessions() {
        let old = SimpleSessionProvider::new("salt-a");
        let new = SimpleSessionProvider::new("salt-b");
        let token = old.issue_session(&alice()).unwrap();
        assert!(new.resolve_session(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn verify_password_round_trip() {
        let provider = SimpleSessionProvider::new("test-salt");
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"hunter2", &salt)
            .unwrap()
            .to_string();

        assert!(provider.verify_password("hunter2", &hash).await);
        assert!(!provider.verify_password("wrong", &hash).await);
        assert!(!provider.verify_password("hunter2", "not-a-hash").await);
    }
}
