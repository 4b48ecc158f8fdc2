// UI and formatting module

pub mod formatters;
pub mod process_view;
pub mod prompts;

// Re-export commonly used items for cleaner imports
pub use formatters::{format_bytes, format_percent, format_running_time, format_start_time};
pub use process_view::{print_alerts, print_process_detail, print_process_table, print_system_stats};
pub use prompts::{clear_screen, confirm, dimmed, success, warn};
