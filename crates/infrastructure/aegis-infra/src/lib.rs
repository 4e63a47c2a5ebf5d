pub mod command_line;
pub mod runner;
pub mod tools;

// Re-exports for convenience
pub use command_line::{join_command, split_command, TokenizeError};
pub use runner::{
    ExitCallback, LineCallback, ProcessCallbacks, ProcessRunner, RunnerError, RunnerErrorKind,
};
pub use tools::{clean_dir, BuildCookRunFlags, ToolError, ToolErrorKind, Uat, Ubt};
