//! Input/output surface: the unified JSON envelope every subcommand emits
//! under `--json`, plus the exit-code mapping `main()` uses.

pub mod envelope;
pub mod exit_code;

pub use envelope::{EntityType, Envelope, ErrorDetails, MessageType, Meta, ResultCode, Status, SCHEMA_VERSION};
pub use exit_code::ExitCode;
