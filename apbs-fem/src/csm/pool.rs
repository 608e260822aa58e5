//! A block arena of link nodes
//!
//! Nodes live in fixed-size blocks and are addressed by a stable [`NodeIndex`], so growing
//! the pool never moves a node. Fresh nodes are bump-allocated from the newest block and
//! released nodes are recycled last-in first-out through a free-index stack. The pool only
//! grows; it is never compacted.

/// The default number of nodes allocated at once when the pool runs dry
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// A stable handle to a node checked out of a [`LinkPool`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

/// One (charge, simplex) association: the chain it belongs to identifies the simplex
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkNode {
    /// Index of the charge in the atom list
    pub charge_index: usize,
    /// The following node of the chain, `None` at the tail
    pub next: Option<NodeIndex>,
}

/// Owner of every link node checked out by a charge-simplex map
#[derive(Debug)]
pub struct LinkPool {
    blocks: Vec<Vec<LinkNode>>,
    block_size: usize,
    /// Number of nodes ever handed out, the bump pointer across all blocks
    allocated: usize,
    free: Vec<NodeIndex>,
}

impl Default for LinkPool {
    fn default() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }
}

impl LinkPool {
    /// An empty pool growing `block_size` nodes at a time, at least one
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            blocks: Vec::new(),
            block_size: block_size.max(1),
            allocated: 0,
            free: Vec::new(),
        }
    }

    /// Checks out a node holding `charge_index` and linking to `next`
    ///
    /// A new block is allocated when the free stack is empty and the newest block is full.
    /// Host allocation failure aborts the process.
    pub fn acquire(&mut self, charge_index: usize, next: Option<NodeIndex>) -> NodeIndex {
        let node = LinkNode { charge_index, next };
        if let Some(index) = self.free.pop() {
            *self.node_mut(index) = node;
            return index;
        }
        if self.allocated == self.capacity() {
            tracing::trace!("Link pool exhausted, allocating block {}", self.blocks.len());
            self.blocks.push(Vec::with_capacity(self.block_size));
        }
        if let Some(block) = self.blocks.last_mut() {
            block.push(node);
        }
        self.allocated += 1;
        NodeIndex(self.allocated - 1)
    }

    /// Returns a node to the free stack, its contents are undefined until reacquired
    pub fn release(&mut self, index: NodeIndex) {
        debug_assert!(index.0 < self.allocated, "node {} was never allocated", index.0);
        self.free.push(index);
    }

    /// Returns every node to the free stack, lowest indices are reused first
    pub fn release_all(&mut self) {
        self.free.clear();
        self.free.extend((0..self.allocated).rev().map(NodeIndex));
    }

    /// The node at `index`
    pub fn node(&self, index: NodeIndex) -> &LinkNode {
        &self.blocks[index.0 / self.block_size][index.0 % self.block_size]
    }

    /// Mutable access to the node at `index`
    pub fn node_mut(&mut self, index: NodeIndex) -> &mut LinkNode {
        &mut self.blocks[index.0 / self.block_size][index.0 % self.block_size]
    }

    /// The number of node slots backed by allocated blocks
    pub fn capacity(&self) -> usize {
        self.blocks.len() * self.block_size
    }

    /// The number of blocks allocated so far
    pub fn number_of_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// The number of nodes currently checked out
    pub fn number_in_use(&self) -> usize {
        self.allocated - self.free.len()
    }

    /// The number of nodes which can be acquired without allocating
    pub fn number_free(&self) -> usize {
        self.free.len() + self.capacity() - self.allocated
    }
}
