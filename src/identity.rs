//! Client identity token.
//!
//! The server recognises a returning client by an opaque token the client
//! sends with every action. Where the token is kept between runs is up to
//! the embedding application; this module only needs get/set access.

/// Durable storage for the identity token.
pub trait IdentityStore {
    fn load(&self) -> Option<String>;

    fn save(&mut self, token: &str);
}

/// Identity store that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityStore {
    token: Option<String>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> Option<String> {
        self.token.clone()
    }

    fn save(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }
}

/// Generate a fresh random token.
pub fn generate_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Return the stored token, generating and saving one if none is stored.
pub fn load_or_create<S: IdentityStore + ?Sized>(store: &mut S) -> String {
    if let Some(token) = store.load().filter(|t| !t.trim().is_empty()) {
        return token;
    }

    let token = generate_token();
    store.save(&token);
    tracing::info!("Generated new client identity");
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_token_kept() {
        let mut store = MemoryIdentityStore::with_token("abc");
        assert_eq!(load_or_create(&mut store), "abc");
    }

    #[test]
    fn test_missing_token_generated_and_saved() {
        let mut store = MemoryIdentityStore::new();
        let token = load_or_create(&mut store);

        assert!(uuid::Uuid::parse_str(&token).is_ok());
        assert_eq!(store.load(), Some(token.clone()));
        assert_eq!(load_or_create(&mut store), token);
    }

    #[test]
    fn test_blank_token_replaced() {
        let mut store = MemoryIdentityStore::with_token("  ");
        let token = load_or_create(&mut store);
        assert_ne!(token.trim(), "");
    }

    #[test]
    fn test_tokens_differ() {
        assert_ne!(generate_token(), generate_token());
    }
}
