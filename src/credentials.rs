use std::collections::HashMap;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::config::CREDENTIAL_PREFIX;

/// API key resolved for one ingestion target.
pub struct ApiKey {
    pub name: String,
    secret: SecretString,
}

impl ApiKey {
    pub fn new(name: impl Into<String>, secret: SecretString) -> Self {
        Self {
            name: name.into(),
            secret,
        }
    }

    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("name", &self.name)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Snapshot of credential values, keyed by the names the directory hands out.
#[derive(Default)]
pub struct CredentialVault {
    secrets: HashMap<String, SecretString>,
}

impl CredentialVault {
    /// Captures every `YOUTUBE_API_KEY*` variable from the given environment.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let secrets = vars
            .into_iter()
            .filter(|(name, value)| name.starts_with(CREDENTIAL_PREFIX) && !value.trim().is_empty())
            .map(|(name, value)| (name, SecretString::new(value.trim().to_string())))
            .collect::<HashMap<_, _>>();

        tracing::info!(credentials = secrets.len(), "Loaded API credentials");
        Self { secrets }
    }

    pub fn lookup(&self, name: &str) -> Option<ApiKey> {
        self.secrets
            .get(name)
            .map(|secret| ApiKey::new(name, SecretString::new(secret.expose_secret().clone())))
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_prefixed_non_empty_values_are_captured() {
        let vault = CredentialVault::from_vars(vec![
            ("YOUTUBE_API_KEY".to_string(), "default-key".to_string()),
            ("YOUTUBE_API_KEY_GRACE".to_string(), " grace-key ".to_string()),
            ("YOUTUBE_API_KEY_EMPTY".to_string(), "   ".to_string()),
            ("DATABASE_URL".to_string(), "postgres://".to_string()),
        ]);

        assert_eq!(vault.len(), 2);
        assert_eq!(vault.lookup("YOUTUBE_API_KEY_GRACE").unwrap().expose(), "grace-key");
        assert!(vault.lookup("YOUTUBE_API_KEY_EMPTY").is_none());
        assert!(vault.lookup("DATABASE_URL").is_none());
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let key = ApiKey::new("YOUTUBE_API_KEY", SecretString::new("hunter2".to_string()));
        let printed = format!("{:?}", key);
        assert!(printed.contains("YOUTUBE_API_KEY"));
        assert!(!printed.contains("hunter2"));
    }
}
