//! In-memory directory engine
//!
//! [`MemDir`] keeps the whole tree in an arena of stems and nodes. Each stem
//! is one directory; a node may own a child stem. Duplicates are detected
//! with the payload's own `PartialEq`.

mod stem;

use crate::dir::{check_index, Dir, Entries, Entry, Equality};
use crate::error::{DirError, Result};
use stem::{Arena, NodeId, StemId};
use tracing::{debug, trace};

/// Directory tree held entirely in memory.
///
/// # Examples
///
/// ```
/// use stemdir::{Dir, MemDir};
///
/// let mut dir = MemDir::new();
/// dir.add("docs", 1)?;
/// dir.down_dir(0)?;
/// dir.add("readme", 2)?;
/// assert_eq!(dir.cur_path()?, "/docs/");
/// # Ok::<(), stemdir::DirError>(())
/// ```
#[derive(Debug)]
pub struct MemDir<T> {
    arena: Arena<T>,
    root: StemId,
    cur: StemId,
}

impl<T> Default for MemDir<T> {
    fn default() -> Self {
        let mut arena = Arena::new();
        let root = arena.alloc_stem(None, None);
        Self {
            arena,
            root,
            cur: root,
        }
    }
}

impl<T: Clone + PartialEq> MemDir<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes alive anywhere in the tree.
    pub fn live_nodes(&self) -> usize {
        self.arena.live_nodes()
    }

    /// True if the cursor is at the root directory.
    pub fn at_root(&self) -> bool {
        self.cur == self.root
    }

    fn nodes(&self) -> &[NodeId] {
        &self.arena.stem(self.cur).nodes
    }

    fn node_id_at(&self, index: usize) -> Result<NodeId> {
        let nodes = self.nodes();
        check_index(index, nodes.len())?;
        Ok(nodes[index])
    }

    fn position_of(&self, item: &T) -> Option<usize> {
        self.nodes()
            .iter()
            .position(|id| self.arena.node(*id).item == *item)
    }

    fn path_of(&self, stem: StemId) -> String {
        let stem = self.arena.stem(stem);
        match (stem.parent_stem, stem.parent_node) {
            (Some(parent), Some(owner)) => {
                format!("{}{}/", self.path_of(parent), self.arena.node(owner).name)
            }
            _ => "/".to_string(),
        }
    }

    fn unlink_at(&mut self, index: usize) {
        let id = self.arena.stem_mut(self.cur).nodes.remove(index);
        self.arena.free_node(id);
    }
}

impl<T: Clone + PartialEq> Dir<T> for MemDir<T> {
    fn equality(&self) -> Equality {
        Equality::Caller
    }

    fn count(&self) -> Result<usize> {
        Ok(self.nodes().len())
    }

    fn add(&mut self, name: &str, item: T) -> Result<usize> {
        let count = self.nodes().len();
        self.insert(count, name, item)
    }

    fn insert(&mut self, index: usize, name: &str, item: T) -> Result<usize> {
        if self.position_of(&item).is_some() {
            return Err(DirError::DuplicateItem {
                name: name.to_string(),
            });
        }

        let index = index.min(self.nodes().len());
        let id = self.arena.alloc_node(name.to_string(), item);
        self.arena.stem_mut(self.cur).nodes.insert(index, id);
        trace!("Inserted '{}' at {}", name, index);
        Ok(index)
    }

    fn item_at(&self, index: usize) -> Result<T> {
        let id = self.node_id_at(index)?;
        Ok(self.arena.node(id).item.clone())
    }

    fn name_at(&self, index: usize) -> Result<String> {
        let id = self.node_id_at(index)?;
        Ok(self.arena.node(id).name.clone())
    }

    fn item_index(&self, item: &T) -> Result<usize> {
        self.position_of(item).ok_or(DirError::ItemNotFound)
    }

    fn item_exists(&self, item: &T) -> Result<bool> {
        Ok(self.position_of(item).is_some())
    }

    fn item_exists_at(&self, index: usize) -> Result<bool> {
        Ok(index < self.nodes().len())
    }

    fn move_item(&mut self, src: usize, dest: usize) -> Result<()> {
        let count = self.nodes().len();
        check_index(src, count)?;

        let dest = dest.min(count - 1);
        let nodes = &mut self.arena.stem_mut(self.cur).nodes;
        let id = nodes.remove(src);
        nodes.insert(dest, id);
        trace!("Moved {} to {}", src, dest);
        Ok(())
    }

    fn remove(&mut self, item: &T) -> Result<()> {
        let index = self.item_index(item)?;
        self.unlink_at(index);
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> Result<()> {
        check_index(index, self.nodes().len())?;
        self.unlink_at(index);
        Ok(())
    }

    fn set_name_at(&mut self, index: usize, name: &str) -> Result<()> {
        let id = self.node_id_at(index)?;
        self.arena.node_mut(id).name = name.to_string();
        Ok(())
    }

    fn create_subdir(&mut self, index: usize) -> Result<()> {
        let id = self.node_id_at(index)?;
        if self.arena.node(id).sub.is_none() {
            let sub = self.arena.alloc_stem(Some(self.cur), Some(id));
            self.arena.node_mut(id).sub = Some(sub);
        }
        Ok(())
    }

    fn has_subdir_at(&self, index: usize) -> Result<bool> {
        let id = self.node_id_at(index)?;
        Ok(self.arena.node(id).sub.is_some())
    }

    fn delete_subdir(&mut self, index: usize) -> Result<()> {
        let id = self.node_id_at(index)?;
        if let Some(sub) = self.arena.node_mut(id).sub.take() {
            self.arena.free_stem(sub);
        }
        Ok(())
    }

    fn down_dir(&mut self, index: usize) -> Result<()> {
        let id = self.node_id_at(index).map_err(|_| {
            DirError::invalid_operation(format!("no entry at index {} to descend into", index))
        })?;

        self.create_subdir(index)?;
        if let Some(sub) = self.arena.node(id).sub {
            self.cur = sub;
        }
        debug!("Cursor now at {}", self.path_of(self.cur));
        Ok(())
    }

    fn up_dir(&mut self) -> Result<()> {
        let parent = self
            .arena
            .stem(self.cur)
            .parent_stem
            .ok_or_else(|| DirError::invalid_operation("already at the root directory"))?;
        self.cur = parent;
        debug!("Cursor now at {}", self.path_of(self.cur));
        Ok(())
    }

    fn has_parent(&self) -> bool {
        self.arena.stem(self.cur).parent_stem.is_some()
    }

    fn cur_path(&self) -> Result<String> {
        Ok(self.path_of(self.cur))
    }

    fn entries(&self) -> Entries<'_, T> {
        Box::new(self.nodes().iter().map(move |id| {
            let node = self.arena.node(*id);
            Ok(Entry {
                name: node.name.clone(),
                item: node.item.clone(),
            })
        }))
    }
}
