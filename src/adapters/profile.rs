use crate::domain::model::{AllergyProfile, UserRecord};
use crate::domain::ports::ProfileStore;
use crate::utils::error::{Result, ScanError};
use async_trait::async_trait;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;

/// One `<user_id>.json` user document per account under `base_path`.
#[derive(Debug, Clone)]
pub struct JsonProfileStore {
    base_path: PathBuf,
}

impl JsonProfileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn document_path(&self, user_id: &str) -> Result<PathBuf> {
        let valid = !user_id.is_empty()
            && !user_id.starts_with('.')
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(ScanError::InvalidUserId {
                user_id: user_id.to_string(),
            });
        }
        Ok(self.base_path.join(format!("{}.json", user_id)))
    }

    async fn read_record(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let path = self.document_path(user_id)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(ScanError::IoError(e)),
        }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<UserRecord> {
        self.read_record(user_id)
            .await?
            .ok_or_else(|| ScanError::ProfileNotFound {
                user_id: user_id.to_string(),
            })
    }

    pub async fn put_user(&self, user_id: &str, record: &UserRecord) -> Result<()> {
        let path = self.document_path(user_id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&path, data).await?;
        tracing::debug!("Wrote user document {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for JsonProfileStore {
    async fn get_allergy_profile(&self, user_id: &str) -> Result<AllergyProfile> {
        Ok(self.get_user(user_id).await?.allergies)
    }

    /// Replaces the `allergies` field, creating a bare document for a new id.
    async fn update_allergy_profile(&self, user_id: &str, profile: &AllergyProfile) -> Result<()> {
        let mut record = self.read_record(user_id).await?.unwrap_or(UserRecord {
            name: String::new(),
            email: String::new(),
            allergies: AllergyProfile::new(),
        });
        record.allergies = profile.clone();
        self.put_user(user_id, &record).await
    }
}
