//! Singly linked charge chains threaded through a [`LinkPool`]
//!
//! A chain is identified by its optional head index. New associations go on the front,
//! so a chain lists its charges most recent first.

use super::pool::{LinkPool, NodeIndex};

impl LinkPool {
    /// Acquires a node for `charge_index` and pushes it on the front of the chain at `head`
    pub(crate) fn push_front(&mut self, head: &mut Option<NodeIndex>, charge_index: usize) {
        *head = Some(self.acquire(charge_index, *head));
    }

    /// Relinks an already checked-out `node` on the front of the chain at `head`
    ///
    /// The node must have been detached from its previous chain.
    pub(crate) fn splice_front(&mut self, head: &mut Option<NodeIndex>, node: NodeIndex) {
        self.node_mut(node).next = *head;
        *head = Some(node);
    }

    /// Iterates the charge indices of the chain starting at `head`
    pub fn chain(&self, head: Option<NodeIndex>) -> ChainIter<'_> {
        ChainIter {
            pool: self,
            cursor: head,
        }
    }
}

/// Iterator over the charge indices stored in one chain
#[derive(Clone)]
pub struct ChainIter<'a> {
    pool: &'a LinkPool,
    cursor: Option<NodeIndex>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.pool.node(self.cursor?);
        self.cursor = node.next;
        Some(node.charge_index)
    }
}
