pub mod config;
pub mod confirm;
pub mod context;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod filesystem;
pub mod inventory;
pub mod manager;
pub mod model;
pub mod orchestrator;
pub mod progress;
pub mod report;
pub mod tracker;

pub use config::AppConfig;
pub use confirm::{ConfirmationProvider, PresetConfirmation};
pub use context::RunContext;
pub use engine::{PurgeEngine, Services};
pub use error::Error;
pub use model::{MediaItem, RetentionPolicy};
pub use progress::{ProgressReporter, SilentReporter};
pub use report::RunReport;
