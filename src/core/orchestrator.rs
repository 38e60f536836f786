use crate::core::matcher::match_allergens;
use crate::core::translate::{normalize_text, NormalizedText};
use crate::domain::model::{
    AllergyProfile, ErrorKind, ImageHandle, ScanAttempt, ScanStage, ScanState, Verdict,
};
use crate::domain::ports::{ImageSource, ScanReporter, TextExtractor, Translator};
use crate::utils::error::{Result, ScanError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub extract_timeout: Duration,
    pub translate_timeout: Duration,
    pub target_language: String,
    pub translation_enabled: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            extract_timeout: DEFAULT_STAGE_TIMEOUT,
            translate_timeout: DEFAULT_STAGE_TIMEOUT,
            target_language: "en".to_string(),
            translation_enabled: true,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Completed {
        attempt: ScanAttempt,
        verdict: Verdict,
    },
    /// The user dismissed image acquisition; nothing was reported.
    Cancelled,
    Failed(ErrorKind),
}

impl ScanOutcome {
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            ScanOutcome::Completed { verdict, .. } => Some(verdict),
            _ => None,
        }
    }
}

struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Runs one label scan at a time: acquire → extract → translate → match.
pub struct ScanPipeline<I, E, T, R>
where
    I: ImageSource,
    E: TextExtractor,
    T: Translator,
    R: ScanReporter,
{
    image_source: I,
    extractor: E,
    translator: T,
    reporter: R,
    settings: ScanSettings,
    state: Mutex<ScanState>,
    busy: AtomicBool,
}

impl<I, E, T, R> ScanPipeline<I, E, T, R>
where
    I: ImageSource,
    E: TextExtractor,
    T: Translator,
    R: ScanReporter,
{
    pub fn new(image_source: I, extractor: E, translator: T, reporter: R) -> Self {
        Self {
            image_source,
            extractor,
            translator,
            reporter,
            settings: ScanSettings::default(),
            state: Mutex::new(ScanState::Idle),
            busy: AtomicBool::new(false),
        }
    }

    pub fn with_settings(mut self, settings: ScanSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn state(&self) -> ScanState {
        self.state.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Runs the whole pipeline against a profile snapshot.
    ///
    /// Stage failures are reported and returned as `ScanOutcome::Failed`;
    /// the only `Err` is `ScanError::Busy` when another run is active.
    pub async fn run(&self, profile: &AllergyProfile) -> Result<ScanOutcome> {
        let _guard = BusyGuard::acquire(&self.busy).ok_or(ScanError::Busy)?;

        self.transition(ScanState::Acquiring);
        let image = match self.image_source.acquire().await {
            Ok(image) => image,
            Err(ScanError::UserCancelled) => {
                tracing::info!("Image acquisition cancelled");
                self.transition(ScanState::Idle);
                return Ok(ScanOutcome::Cancelled);
            }
            Err(e) => return Ok(self.fail(e)),
        };
        tracing::debug!(
            "Acquired image '{}' ({} bytes)",
            image.source_ref,
            image.bytes.len()
        );

        let mut attempt = ScanAttempt::new(image.source_ref.clone());

        self.transition(ScanState::Extracting);
        let raw_text = match self.extract(&image).await {
            Ok(text) => text,
            Err(e) => return Ok(self.fail(e)),
        };
        tracing::debug!("Extracted {} chars of label text", raw_text.len());
        attempt.raw_text = Some(raw_text.clone());

        self.transition(ScanState::Translating);
        let normalized = if self.settings.translation_enabled {
            normalize_text(
                &self.translator,
                &raw_text,
                &self.settings.target_language,
                self.settings.translate_timeout,
            )
            .await
        } else {
            NormalizedText {
                text: raw_text,
                degraded: false,
            }
        };
        attempt.translation_degraded = normalized.degraded;

        self.transition(ScanState::Matching);
        attempt.matched = match_allergens(&normalized.text, profile);
        attempt.normalized_text = Some(normalized.text);

        let verdict = attempt.verdict();
        self.transition(ScanState::Done(verdict.clone()));
        self.reporter.report_verdict(&verdict);

        Ok(ScanOutcome::Completed { attempt, verdict })
    }

    async fn extract(&self, image: &ImageHandle) -> Result<String> {
        let timeout = self.settings.extract_timeout;
        match tokio::time::timeout(timeout, self.extractor.extract_text(image)).await {
            Ok(result) => result,
            Err(_) => Err(ScanError::Timeout {
                stage: ScanStage::Extracting,
                timeout,
            }),
        }
    }

    fn fail(&self, error: ScanError) -> ScanOutcome {
        let kind = error.kind();
        tracing::error!("❌ Scan failed: {} (Category: {:?})", error, error.category());

        self.transition(ScanState::Failed(kind.clone()));
        self.reporter.report_error(&kind);
        self.transition(ScanState::Idle);

        ScanOutcome::Failed(kind)
    }

    fn transition(&self, next: ScanState) {
        tracing::info!("Scan state → {:?}", next);
        *self.state.lock() = next.clone();
        self.reporter.on_state_change(&next);
    }
}
