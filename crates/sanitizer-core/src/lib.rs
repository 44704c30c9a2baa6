pub mod config;
pub mod copier;
pub mod engine;
pub mod error;
pub mod format;
pub mod index;
pub mod placeholder;
pub mod progress;
pub mod scanner;

pub use config::AppConfig;
pub use engine::{sanitize, SanitizeReport, Sanitizer};
pub use error::{Error, Result};
pub use format::{classify, Format};
pub use index::{GroupKey, GroupingIndex};
pub use placeholder::{synthesize, Synthesizer};
pub use progress::{ProgressReporter, SilentReporter};
