// Adapters layer: concrete implementations of the domain ports.

pub(crate) mod http;
pub mod image;
pub mod profile;
pub mod reporter;
pub mod translate;
pub mod vision;

pub use image::{FileImageSource, PromptImageSource};
pub use profile::JsonProfileStore;
pub use reporter::ConsoleReporter;
pub use translate::HttpTranslator;
pub use vision::VisionTextExtractor;
