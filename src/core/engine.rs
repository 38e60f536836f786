use crate::core::orchestrator::{ScanOutcome, ScanPipeline};
use crate::domain::ports::{ImageSource, ProfileStore, ScanReporter, TextExtractor, Translator};
use crate::utils::error::Result;

/// Loads a user's allergy profile once, then drives a scan with it.
pub struct ScanEngine<S, I, E, T, R>
where
    S: ProfileStore,
    I: ImageSource,
    E: TextExtractor,
    T: Translator,
    R: ScanReporter,
{
    profiles: S,
    pipeline: ScanPipeline<I, E, T, R>,
}

impl<S, I, E, T, R> ScanEngine<S, I, E, T, R>
where
    S: ProfileStore,
    I: ImageSource,
    E: TextExtractor,
    T: Translator,
    R: ScanReporter,
{
    pub fn new(profiles: S, pipeline: ScanPipeline<I, E, T, R>) -> Self {
        Self { profiles, pipeline }
    }

    pub fn pipeline(&self) -> &ScanPipeline<I, E, T, R> {
        &self.pipeline
    }

    pub async fn run_for_user(&self, user_id: &str) -> Result<ScanOutcome> {
        tracing::info!("🚀 Starting label scan for user '{}'", user_id);

        let profile = self.profiles.get_allergy_profile(user_id).await?;
        let active = profile.active_tags();
        tracing::info!("Loaded allergy profile with {} active tags", active.len());
        if active.is_empty() {
            tracing::warn!("No allergies selected; every product will be reported safe");
        }

        let outcome = self.pipeline.run(&profile).await?;

        match &outcome {
            ScanOutcome::Completed { verdict, attempt } => tracing::info!(
                "✅ Scan completed: {} (degraded translation: {})",
                if verdict.is_safe() { "safe" } else { "unsafe" },
                attempt.translation_degraded
            ),
            ScanOutcome::Cancelled => tracing::info!("Scan cancelled by user"),
            ScanOutcome::Failed(kind) => tracing::warn!("Scan ended with {:?}", kind),
        }

        Ok(outcome)
    }
}
