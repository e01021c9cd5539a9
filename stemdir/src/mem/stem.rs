//! Arena storage for stems and nodes
//!
//! Every stem and node lives in a slot of the arena and is addressed by a
//! stable id. Parent links are ids, so back-references never own anything.
//! Freed slots are recycled.

/// Address of a stem in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StemId(usize);

/// Address of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A named payload, optionally owning a child stem.
#[derive(Debug, Clone)]
pub struct Node<T> {
    pub name: String,
    pub item: T,
    pub sub: Option<StemId>,
}

/// An ordered sibling list with links back to where it hangs in the tree.
#[derive(Debug, Clone, Default)]
pub struct Stem {
    pub nodes: Vec<NodeId>,
    pub parent_stem: Option<StemId>,
    pub parent_node: Option<NodeId>,
}

#[derive(Debug)]
pub struct Arena<T> {
    stems: Vec<Option<Stem>>,
    nodes: Vec<Option<Node<T>>>,
    free_stems: Vec<usize>,
    free_nodes: Vec<usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            stems: Vec::new(),
            nodes: Vec::new(),
            free_stems: Vec::new(),
            free_nodes: Vec::new(),
        }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_stem(
        &mut self,
        parent_stem: Option<StemId>,
        parent_node: Option<NodeId>,
    ) -> StemId {
        let stem = Stem {
            nodes: Vec::new(),
            parent_stem,
            parent_node,
        };
        match self.free_stems.pop() {
            Some(slot) => {
                self.stems[slot] = Some(stem);
                StemId(slot)
            }
            None => {
                self.stems.push(Some(stem));
                StemId(self.stems.len() - 1)
            }
        }
    }

    pub fn alloc_node(&mut self, name: String, item: T) -> NodeId {
        let node = Node {
            name,
            item,
            sub: None,
        };
        match self.free_nodes.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    pub fn stem(&self, id: StemId) -> &Stem {
        self.stems[id.0].as_ref().expect("stem id must refer to a live stem")
    }

    pub fn stem_mut(&mut self, id: StemId) -> &mut Stem {
        self.stems[id.0].as_mut().expect("stem id must refer to a live stem")
    }

    pub fn node(&self, id: NodeId) -> &Node<T> {
        self.nodes[id.0].as_ref().expect("node id must refer to a live node")
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.nodes[id.0].as_mut().expect("node id must refer to a live node")
    }

    /// Free a node together with every stem and node below it.
    ///
    /// The caller unlinks the node from its sibling list.
    pub fn free_node(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(node_id) = pending.pop() {
            let node = self.nodes[node_id.0]
                .take()
                .expect("node id must refer to a live node");
            self.free_nodes.push(node_id.0);

            if let Some(sub) = node.sub {
                let stem = self.stems[sub.0]
                    .take()
                    .expect("child stem must be live while its node is");
                self.free_stems.push(sub.0);
                pending.extend(stem.nodes);
            }
        }
    }

    /// Free a stem and everything below it.
    ///
    /// The caller clears the owning node's `sub` link.
    pub fn free_stem(&mut self, id: StemId) {
        let stem = self.stems[id.0]
            .take()
            .expect("stem id must refer to a live stem");
        self.free_stems.push(id.0);
        for node in stem.nodes {
            self.free_node(node);
        }
    }

    pub fn live_nodes(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    #[cfg(test)]
    pub fn live_stems(&self) -> usize {
        self.stems.iter().filter(|slot| slot.is_some()).count()
    }
}
