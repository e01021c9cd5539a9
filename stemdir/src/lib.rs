//! Ordered, navigable, hierarchical directories
//!
//! A directory is an ordered list of named entries. Each entry carries a
//! typed payload and may hold a child directory of its own. Two engines
//! implement the same [`Dir`] contract:
//!
//! - [`MemDir`] keeps the tree in memory as an arena of stems and nodes
//! - [`DbDir`] keeps it in one SQLite table with a self-referencing parent
//!   column, mapping the payload to columns through [`schema::FieldDef`]s
//!
//! ## Features
//!
//! - **Contiguous ordering**: indices are always `0..count` within a directory
//! - **Duplicate detection**: equal payloads are refused within one directory
//! - **Cursor navigation**: `down_dir`, `up_dir`, `change_dir` and `cur_path`
//! - **Transactional mutations**: the persisted engine wraps every gap shift
//!   and its mutation in one transaction
//!
//! ## Basic Usage
//!
//! ```rust
//! use stemdir::schema::{FieldDef, Record};
//! use stemdir::{Database, DbDir, Dir};
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Task {
//!     title: String,
//!     priority: i64,
//! }
//!
//! impl Record for Task {
//!     fn fields() -> Vec<FieldDef<Self>> {
//!         vec![
//!             FieldDef::text("Title", |t: &Task| t.title.clone(), |t, v| t.title = v),
//!             FieldDef::integer("Priority", |t: &Task| t.priority, |t, v| t.priority = v),
//!         ]
//!     }
//! }
//!
//! # fn main() -> stemdir::Result<()> {
//! let db = Database::open_in_memory()?;
//! let mut dir = DbDir::<Task>::new(&db, "Task")?;
//!
//! let task = Task { title: "Ship it".into(), priority: 1 };
//! dir.add("ship", task.clone())?;
//! dir.down_dir(0)?;
//! assert_eq!(dir.cur_path()?, "/ship/");
//!
//! dir.up_dir()?;
//! assert_eq!(dir.item_at(0)?, task);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod dir;
mod error;
pub mod mem;
pub mod schema;

// Re-exports
pub use config::StoreConfig;
pub use db::{Database, DbDir, OpenStyle};
pub use dir::{Dir, Entry, Equality};
pub use error::{DirError, Result};
pub use mem::MemDir;
