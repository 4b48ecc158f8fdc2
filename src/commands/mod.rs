// Command handlers module
pub mod process;
pub mod version;
pub mod watch;

// Re-exports for cleaner imports
pub use process::{detail, kill, list, priority, stats};
pub use version::execute as version;
pub use watch::execute as watch;
