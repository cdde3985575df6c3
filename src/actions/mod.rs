//! File actions module.
//!
//! Currently a single action: removing target directories from a candidate,
//! at every nesting depth, with per-directory failure isolation.
//!
//! ```no_run
//! use dcleaner::actions::delete_dir;
//! use std::path::Path;
//!
//! let outcome = delete_dir(Path::new("."), "webapp", "node_modules");
//! assert!(outcome.all_succeeded());
//! ```

pub mod delete;

// Re-export commonly used types
pub use delete::{
    delete_dir, find_target_dirs, remove_target_dir, BatchDeleteResult, DeleteError,
    DeleteOutcome, DeleteResult,
};
