// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{format_progress_line, verdict_line};

// Re-export cleanup functionality from pung-core
pub use pung_core::{
    CleanupOptions, CleanupProgressCallback, CleanupReport, execute_cleanup,
    generate_cleanup_report,
};
