use std::sync::Arc;

use crate::credentials::{ApiKey, CredentialVault};
use crate::errors::AppError;
use crate::store::{DirectoryStore, SubcategoryEntry};

#[derive(thiserror::Error, Debug)]
pub enum DirectoryError {
    #[error("Subcategory {0:?} is not in the directory")]
    UnknownSubcategory(String),

    #[error("Credential {name:?} for {label:?} is not set in the environment")]
    MissingSecret { label: String, name: String },

    #[error(transparent)]
    Store(#[from] AppError),
}

/// Maps subcategory labels to the API key that should be spent on them.
pub struct SubcategoryDirectory {
    store: Arc<dyn DirectoryStore>,
    vault: Arc<CredentialVault>,
    default_credential_name: String,
}

impl SubcategoryDirectory {
    pub fn new(
        store: Arc<dyn DirectoryStore>,
        vault: Arc<CredentialVault>,
        default_credential_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            vault,
            default_credential_name: default_credential_name.into(),
        }
    }

    #[tracing::instrument(name = "Resolve subcategory credential", skip(self))]
    pub async fn resolve(&self, label: &str) -> Result<ApiKey, DirectoryError> {
        let entry = self
            .store
            .find_subcategory(label)
            .await?
            .ok_or_else(|| DirectoryError::UnknownSubcategory(label.to_string()))?;

        self.credential_for(&entry)
    }

    /// Secret for an entry already read from the directory.
    pub fn credential_for(&self, entry: &SubcategoryEntry) -> Result<ApiKey, DirectoryError> {
        self.vault
            .lookup(&entry.api_key_name)
            .ok_or_else(|| DirectoryError::MissingSecret {
                label: entry.subcategory.clone(),
                name: entry.api_key_name.clone(),
            })
    }

    pub async fn entries(&self) -> Result<Vec<SubcategoryEntry>, AppError> {
        self.store.list_subcategories().await
    }

    /// Key used for ad-hoc queries and reconciliation.
    pub fn default_credential(&self) -> Result<ApiKey, DirectoryError> {
        self.vault
            .lookup(&self.default_credential_name)
            .ok_or_else(|| DirectoryError::MissingSecret {
                label: "default".to_string(),
                name: self.default_credential_name.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    async fn directory() -> SubcategoryDirectory {
        let store = MemoryStore::with_subcategories(&[
            ("Grace", "YOUTUBE_API_KEY_GRACE"),
            ("Prayer", "YOUTUBE_API_KEY_PRAYER"),
        ])
        .await;
        let vault = CredentialVault::from_vars(vec![(
            "YOUTUBE_API_KEY_GRACE".to_string(),
            "grace-secret".to_string(),
        )]);
        SubcategoryDirectory::new(Arc::new(store), Arc::new(vault), "YOUTUBE_API_KEY")
    }

    #[tokio::test]
    async fn resolves_known_label_with_secret() {
        let key = directory().await.resolve("Grace").await.unwrap();
        assert_eq!(key.name, "YOUTUBE_API_KEY_GRACE");
        assert_eq!(key.expose(), "grace-secret");
    }

    #[tokio::test]
    async fn unknown_label_is_reported() {
        let err = directory().await.resolve("Worship").await.unwrap_err();
        assert!(matches!(err, DirectoryError::UnknownSubcategory(label) if label == "Worship"));
    }

    #[tokio::test]
    async fn missing_secret_is_reported() {
        let err = directory().await.resolve("Prayer").await.unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::MissingSecret { name, .. } if name == "YOUTUBE_API_KEY_PRAYER"
        ));
    }

    #[tokio::test]
    async fn default_credential_must_exist() {
        assert!(directory().await.default_credential().is_err());
        assert_eq!(directory().await.entries().await.unwrap().len(), 2);
    }
}
