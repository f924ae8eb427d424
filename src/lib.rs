// Library surface for headless/integration tests and reuse.
// Keep this free of terminal handles; the binary owns the TUI.
pub mod app_dirs;
pub mod canon;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod corpus;
pub mod logging;
pub mod navigation;
pub mod orp;
pub mod persistence;
pub mod runtime;
pub mod session;
pub mod speed;
pub mod stats;
pub mod timer;
pub mod tokenize;
pub mod util;

pub use corpus::{Library, TextStore};
pub use session::{ReadingSession, SessionError, SessionEvent};
