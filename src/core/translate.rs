use crate::domain::model::ScanStage;
use crate::domain::ports::Translator;
use crate::utils::error::ScanError;
use std::time::Duration;

/// Result of normalizing label text to the matching language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    /// Set when the translator failed or answered blank and the raw text was kept.
    pub degraded: bool,
}

/// Translates `raw` to `target_language`, falling back to `raw` on any
/// translator error or timeout. Never fails.
pub async fn normalize_text<T: Translator + ?Sized>(
    translator: &T,
    raw: &str,
    target_language: &str,
    timeout: Duration,
) -> NormalizedText {
    if raw.trim().is_empty() {
        return NormalizedText {
            text: raw.to_string(),
            degraded: false,
        };
    }

    let outcome = match tokio::time::timeout(timeout, translator.translate(raw, target_language)).await
    {
        Ok(result) => result,
        Err(_) => Err(ScanError::Timeout {
            stage: ScanStage::Translating,
            timeout,
        }),
    };

    // A blank answer for non-blank input would hide every allergen.
    let outcome = outcome.and_then(|text| {
        if text.trim().is_empty() {
            Err(ScanError::Service {
                code: 200,
                message: "translator returned no text".to_string(),
            })
        } else {
            Ok(text)
        }
    });

    match outcome {
        Ok(text) => {
            tracing::debug!(
                "Translated {} chars to {} chars ({})",
                raw.len(),
                text.len(),
                target_language
            );
            NormalizedText {
                text,
                degraded: false,
            }
        }
        Err(e) => {
            tracing::warn!("⚠️ Translation failed, matching on original text: {}", e);
            NormalizedText {
                text: raw.to_string(),
                degraded: true,
            }
        }
    }
}
