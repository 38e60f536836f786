use crate::domain::model::{AllergyProfile, ErrorKind, ImageHandle, ScanState, Verdict};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Yields the label photo, e.g. from a camera UI or a file picker.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn acquire(&self) -> Result<ImageHandle>;
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Returns an empty string when no text was detected.
    async fn extract_text(&self, image: &ImageHandle) -> Result<String>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_allergy_profile(&self, user_id: &str) -> Result<AllergyProfile>;
    async fn update_allergy_profile(&self, user_id: &str, profile: &AllergyProfile) -> Result<()>;
}

/// Presentation side of a scan. Only one of `report_verdict` or
/// `report_error` is called per run, and neither on a user cancel.
pub trait ScanReporter: Send + Sync {
    fn on_state_change(&self, _state: &ScanState) {}
    fn report_verdict(&self, verdict: &Verdict);
    fn report_error(&self, error: &ErrorKind);
}
