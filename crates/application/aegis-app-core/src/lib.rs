pub mod batch;
pub mod commands;
pub mod events;
pub mod persistence;
pub mod ports;
pub mod switches;
pub mod view;

pub use batch::{BatchController, QueueError, StartError, LAUNCH_FAILED};
pub use commands::{build_argv, preview_command, ArgvMode, CommandError, CommandErrorKind};
pub use events::{BatchEvent, BatchRunId, BatchSummary, LogLevel, LogLine};
pub use persistence::{profile_configs, profile_platforms, FilePersistence};
pub use ports::*;
pub use view::{BatchViewState, BatchViewStore};
