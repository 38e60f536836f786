pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{
    ConsoleReporter, FileImageSource, HttpTranslator, JsonProfileStore, PromptImageSource,
    VisionTextExtractor,
};
pub use config::ScanConfig;
pub use crate::core::{
    engine::ScanEngine,
    matcher::match_allergens,
    orchestrator::{ScanOutcome, ScanPipeline, ScanSettings},
    recipes::{Recipe, RecipeBook},
};
pub use domain::model::{AllergenTag, AllergyProfile, ErrorKind, ScanState, Verdict};
pub use utils::error::{Result, ScanError};
