use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::ScanError;

/// The fixed allergen vocabulary tracked per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllergenTag {
    Milk,
    Peanuts,
    Gluten,
    Eggs,
    Soy,
}

impl AllergenTag {
    pub const ALL: [AllergenTag; 5] = [
        AllergenTag::Milk,
        AllergenTag::Peanuts,
        AllergenTag::Gluten,
        AllergenTag::Eggs,
        AllergenTag::Soy,
    ];

    /// Lowercase name, also the keyword searched for in label text.
    pub fn name(&self) -> &'static str {
        match self {
            AllergenTag::Milk => "milk",
            AllergenTag::Peanuts => "peanuts",
            AllergenTag::Gluten => "gluten",
            AllergenTag::Eggs => "eggs",
            AllergenTag::Soy => "soy",
        }
    }
}

impl fmt::Display for AllergenTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AllergenTag {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        AllergenTag::ALL
            .into_iter()
            .find(|tag| tag.name() == wanted)
            .ok_or_else(|| ScanError::UnknownAllergen {
                name: s.to_string(),
            })
    }
}

/// Total mapping from every allergen tag to whether the user reacts to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<AllergenTag, bool>", into = "BTreeMap<AllergenTag, bool>")]
pub struct AllergyProfile {
    flags: BTreeMap<AllergenTag, bool>,
}

impl AllergyProfile {
    pub fn new() -> Self {
        Self {
            flags: AllergenTag::ALL.into_iter().map(|tag| (tag, false)).collect(),
        }
    }

    pub fn from_active<I: IntoIterator<Item = AllergenTag>>(tags: I) -> Self {
        let mut profile = Self::new();
        for tag in tags {
            profile.set(tag, true);
        }
        profile
    }

    pub fn set(&mut self, tag: AllergenTag, active: bool) {
        self.flags.insert(tag, active);
    }

    /// Flips the flag and returns the new value.
    pub fn toggle(&mut self, tag: AllergenTag) -> bool {
        let next = !self.is_active(tag);
        self.set(tag, next);
        next
    }

    pub fn is_active(&self, tag: AllergenTag) -> bool {
        self.flags.get(&tag).copied().unwrap_or(false)
    }

    /// Active tags in vocabulary order.
    pub fn active_tags(&self) -> Vec<AllergenTag> {
        AllergenTag::ALL
            .into_iter()
            .filter(|tag| self.is_active(*tag))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AllergenTag, bool)> + '_ {
        AllergenTag::ALL
            .into_iter()
            .map(move |tag| (tag, self.is_active(tag)))
    }
}

impl Default for AllergyProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BTreeMap<AllergenTag, bool>> for AllergyProfile {
    fn from(stored: BTreeMap<AllergenTag, bool>) -> Self {
        let mut profile = Self::new();
        for (tag, active) in stored {
            profile.set(tag, active);
        }
        profile
    }
}

impl From<AllergyProfile> for BTreeMap<AllergenTag, bool> {
    fn from(profile: AllergyProfile) -> Self {
        profile.flags
    }
}

/// Stored account document; only `allergies` is read by the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub allergies: AllergyProfile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    pub source_ref: String,
    pub bytes: Vec<u8>,
}

impl ImageHandle {
    pub fn new(source_ref: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            source_ref: source_ref.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    Unsafe { matched: Vec<AllergenTag> },
}

impl Verdict {
    pub fn from_matches(matched: Vec<AllergenTag>) -> Self {
        if matched.is_empty() {
            Verdict::Safe
        } else {
            Verdict::Unsafe { matched }
        }
    }

    pub fn is_safe(&self) -> bool {
        matches!(self, Verdict::Safe)
    }

    pub fn matched(&self) -> &[AllergenTag] {
        match self {
            Verdict::Safe => &[],
            Verdict::Unsafe { matched } => matched,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Verdict::Safe => "The product is safe for you.".to_string(),
            Verdict::Unsafe { matched } => {
                let names: Vec<&str> = matched.iter().map(|tag| tag.name()).collect();
                format!(
                    "The product contains: {}. It's not safe for you!",
                    names.join(", ")
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    Acquiring,
    Extracting,
    Translating,
    Matching,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScanStage::Acquiring => "image acquisition",
            ScanStage::Extracting => "text extraction",
            ScanStage::Translating => "translation",
            ScanStage::Matching => "allergen matching",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    PermissionDenied,
    UserCancelled,
    NetworkError,
    ServiceError { code: u16, message: String },
    TimeoutError { stage: ScanStage },
    Internal { message: String },
}

impl ErrorKind {
    pub fn user_message(&self) -> String {
        match self {
            ErrorKind::PermissionDenied => {
                "Camera access was denied. Allow access to scan labels.".to_string()
            }
            ErrorKind::UserCancelled => "Scan cancelled.".to_string(),
            ErrorKind::NetworkError => {
                "Could not reach the recognition service. Please try again.".to_string()
            }
            ErrorKind::ServiceError { code, .. } => format!(
                "Could not recognize text (service error {}). Please try again.",
                code
            ),
            ErrorKind::TimeoutError { stage } => {
                format!("The {} took too long. Please try again.", stage)
            }
            ErrorKind::Internal { message } => format!("Scan failed: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Acquiring,
    Extracting,
    Translating,
    Matching,
    Done(Verdict),
    Failed(ErrorKind),
}

/// Everything observed during one pipeline run. Never persisted.
#[derive(Debug, Clone)]
pub struct ScanAttempt {
    pub image_source: String,
    pub raw_text: Option<String>,
    pub normalized_text: Option<String>,
    pub matched: Vec<AllergenTag>,
    pub translation_degraded: bool,
    pub started_at: DateTime<Utc>,
}

impl ScanAttempt {
    pub fn new(image_source: impl Into<String>) -> Self {
        Self {
            image_source: image_source.into(),
            raw_text: None,
            normalized_text: None,
            matched: Vec::new(),
            translation_degraded: false,
            started_at: Utc::now(),
        }
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_matches(self.matched.clone())
    }
}
