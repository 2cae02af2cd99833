pub mod analyzer;
pub mod media_files;
pub mod patterns;
pub mod presenter;
pub mod rename_engine;
pub mod session;
pub mod tui;

pub use analyzer::{AnalysisError, FilenameAnalyzer, MediaType};
pub use patterns::NamingRules;
pub use presenter::AppPresenter;
pub use rename_engine::{BatchProcessor, MediaItem, ProcessingStatus};
pub use session::SessionStateMachine;
