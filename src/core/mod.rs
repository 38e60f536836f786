pub mod engine;
pub mod matcher;
pub mod orchestrator;
pub mod recipes;
pub mod translate;
