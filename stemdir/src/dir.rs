//! The directory contract shared by every engine
//!
//! A directory is an ordered list of named entries, each carrying a payload
//! and optionally a child directory of its own. Callers work through a
//! cursor: every operation applies to the *current* directory, and
//! [`Dir::down_dir`] / [`Dir::up_dir`] move the cursor through the tree.
//!
//! Indices are zero-based and always contiguous within one directory.
//! Inserting past the end appends. Removing closes the gap so that the
//! entries after the removed one shift down by one.

use crate::error::{DirError, Result};

/// One entry of the current directory as produced by [`Dir::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<T> {
    pub name: String,
    pub item: T,
}

/// How an engine decides that two payloads are the same item.
///
/// The in-memory engine defers to the payload's own `PartialEq`. The
/// persisted engine can only compare through SQL, so it treats two payloads
/// as equal when every mapped column matches. The two can disagree for types
/// with a custom `PartialEq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Equality {
    /// The payload type's `PartialEq`.
    Caller,
    /// Column-by-column equality over all mapped fields.
    AllFields,
}

/// Boxed iterator over the entries of the current directory.
pub type Entries<'a, T> = Box<dyn Iterator<Item = Result<Entry<T>>> + 'a>;

/// Ordered, navigable, hierarchical container.
pub trait Dir<T> {
    /// Duplicate-detection strategy of this engine.
    fn equality(&self) -> Equality;

    /// Number of entries in the current directory.
    fn count(&self) -> Result<usize>;

    /// Append an entry, returning the index it landed at.
    ///
    /// Fails with `DuplicateItem` if an equal item already exists in the
    /// current directory.
    fn add(&mut self, name: &str, item: T) -> Result<usize>;

    /// Insert an entry at `index`, shifting later entries up by one.
    ///
    /// An index past the end appends. Returns the index the entry landed at.
    fn insert(&mut self, index: usize, name: &str, item: T) -> Result<usize>;

    fn item_at(&self, index: usize) -> Result<T>;

    fn name_at(&self, index: usize) -> Result<String>;

    /// Index of the first item equal to `item`, or `ItemNotFound`.
    fn item_index(&self, item: &T) -> Result<usize>;

    fn item_exists(&self, item: &T) -> Result<bool>;

    fn item_exists_at(&self, index: usize) -> Result<bool>;

    /// Move the entry at `src` so that it ends up at `dest`.
    ///
    /// `dest` is clamped to the last index. The result is the same as
    /// removing the entry and inserting it again at `dest`.
    fn move_item(&mut self, src: usize, dest: usize) -> Result<()>;

    /// Remove the first item equal to `item`, or fail with `ItemNotFound`.
    fn remove(&mut self, item: &T) -> Result<()>;

    fn remove_at(&mut self, index: usize) -> Result<()>;

    fn set_name_at(&mut self, index: usize, name: &str) -> Result<()>;

    /// Attach an empty child directory to the entry at `index`.
    fn create_subdir(&mut self, index: usize) -> Result<()>;

    fn has_subdir_at(&self, index: usize) -> Result<bool>;

    /// Detach and discard the child directory of the entry at `index`.
    fn delete_subdir(&mut self, index: usize) -> Result<()>;

    /// Move the cursor into the child directory of the entry at `index`.
    ///
    /// Fails with `InvalidOperation` if no entry exists at `index`.
    fn down_dir(&mut self, index: usize) -> Result<()>;

    /// Move the cursor to the parent directory.
    ///
    /// Fails with `InvalidOperation` at the root.
    fn up_dir(&mut self) -> Result<()>;

    fn has_parent(&self) -> bool;

    /// Names from the root down to the current directory, each followed by
    /// `/`. The root alone is `"/"`.
    fn cur_path(&self) -> Result<String>;

    /// Entries of the current directory in index order.
    ///
    /// The iterator is lazy. Calling `entries` again starts over.
    fn entries(&self) -> Entries<'_, T>;

    /// Index of the first entry named `name`.
    fn index_of_name(&self, name: &str) -> Result<usize> {
        for (index, entry) in self.entries().enumerate() {
            if entry?.name == name {
                return Ok(index);
            }
        }
        Err(DirError::NameNotFound {
            name: name.to_string(),
        })
    }

    /// Walk a slash-delimited path of entry names.
    ///
    /// A leading `/` starts from the root and `..` goes up one level. Each
    /// other segment descends into the first entry with that name, so the
    /// engine's `down_dir` rules apply at every step. On error the cursor is
    /// left wherever the walk stopped.
    fn change_dir(&mut self, path: &str) -> Result<()> {
        if path.starts_with('/') {
            while self.has_parent() {
                self.up_dir()?;
            }
        }

        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => self.up_dir()?,
                name => {
                    let index = self.index_of_name(name)?;
                    self.down_dir(index)?;
                }
            }
        }
        Ok(())
    }
}

/// Check that `index` addresses an existing entry.
pub(crate) fn check_index(index: usize, count: usize) -> Result<()> {
    if index < count {
        Ok(())
    } else {
        Err(DirError::IndexOutOfRange { index, count })
    }
}
