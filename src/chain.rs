//! # Chains
//!
//! A doubly linked sequence of elements, addressed through stable [`NodeId`]
//! handles. Nodes live in a contiguous slot arena with a freelist, so the
//! headward/tailward links are plain indices rather than pointers.
//!
//! ## Key features:
//!
//! - **End access**: O(1) [`Chain::push_front`] / [`Chain::push_back`],
//!   [`Chain::front`] / [`Chain::back`] / [`Chain::penultimate`].
//! - **Concatenation**: [`Chain::concat_front`] / [`Chain::concat_back`]
//!   transfer every node of the operand (which is left empty) onto a free end
//!   of the receiver.
//! - **Removal**: O(1) [`Chain::remove_front`] / [`Chain::remove_back`] /
//!   [`Chain::clear`], O(N) scan [`Chain::remove`], and cursor-based removal
//!   through [`CursorMut`]. A chain that has absorbed a non-removable source
//!   via concatenation rejects all of these.
//! - **Splicing**: [`Chain::insert_before`] / [`Chain::insert_after`] splice a
//!   new node next to any handle in O(1); [`Chain::find`] returns a handle
//!   rather than a boolean.
//! - **Iteration**: lazy, fused, exact-size, double-ended [`Iter`]; a shared
//!   iterator cannot remove anything by construction.
//! - **Fault detection**: every mutating call snapshots a version stamp and
//!   verifies it immediately before commit. A mismatch means the chain was
//!   mutated reentrantly on the same thread mid-operation and the call aborts
//!   with [`ChainError::ConcurrentMutation`]. This is best-effort corruption
//!   detection, not a substitute for external synchronization.

use std::fmt::{self, Display};
use std::iter::FusedIterator;
use std::ops::Index;

use derive_more::{From, Into};
use itertools::Itertools;
use thiserror::Error;

mod cursor;
pub use cursor::CursorMut;

#[cfg(test)]
mod tests;

/// Stable handle to a node in a [`Chain`].
///
/// Handles are only meaningful for the chain that produced them, and only
/// while the node is still linked. Indexing a chain with a stale or foreign
/// handle panics; [`Chain::get`] is the non-panicking variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(usize);

/// The two ends of a chain. Also names a direction of travel: moving
/// `toward` an end means stepping along the links that lead to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum End {
    Head,
    Tail,
}

impl End {
    pub fn opposite(self) -> End {
        match self {
            End::Head => End::Tail,
            End::Tail => End::Head,
        }
    }
}

impl Display for End {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            End::Head => write!(f, "head"),
            End::Tail => write!(f, "tail"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("{0} end is attached to another chain and cannot be extended")]
    EndAttached(End),
    #[error("chain absorbed a non-removable source and elements cannot be removed")]
    NotRemovable,
    #[error("cursor has not yielded an element yet")]
    CursorNotAdvanced,
    #[error("chain is empty; there is nothing to remove")]
    EmptyChain,
    #[error("chain was mutated during an operation")]
    ConcurrentMutation,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct Node<T> {
    value: T,
    headward: Option<NodeId>,
    tailward: Option<NodeId>,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum Slot<T> {
    Occupied(Node<T>),
    Vacant { next_free: Option<usize> },
}

/// A doubly linked chain of elements backed by a slot arena.
///
/// # Examples
///
/// ```
/// use permcycle::chain::Chain;
///
/// let mut chain = Chain::new();
/// chain.push_back(2).unwrap();
/// chain.push_back(3).unwrap();
/// chain.push_front(1).unwrap();
///
/// assert_eq!(chain.len(), 3);
/// assert_eq!(chain.to_string(), "<1, 2, 3>");
/// assert_eq!(chain.display_with("|"), "<1|2|3>");
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chain<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<usize>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
    stamp: u64,
    removable: bool,
}

impl<T> Default for Chain<T> {
    fn default() -> Self {
        Chain::new()
    }
}

impl<T> Chain<T> {
    /// Creates an empty chain that allows element removal.
    pub fn new() -> Self {
        Chain {
            slots: Vec::new(),
            free_head: None,
            head: None,
            tail: None,
            len: 0,
            stamp: 0,
            removable: true,
        }
    }

    /// Creates an empty chain whose elements can never be removed.
    ///
    /// Concatenating an append-only chain into a removable one poisons the
    /// receiver: removal is rejected from then on.
    pub fn append_only() -> Self {
        Chain {
            removable: false,
            ..Chain::new()
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Chain {
            slots: Vec::with_capacity(capacity),
            ..Chain::new()
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether removal operations are currently permitted.
    pub fn is_removable(&self) -> bool {
        self.removable
    }

    // ------------------------------------------------------------------
    // Arena internals
    // ------------------------------------------------------------------

    fn node(&self, id: NodeId) -> &Node<T> {
        match &self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("stale chain handle {id:?}"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match &mut self.slots[id.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("stale chain handle {id:?}"),
        }
    }

    fn alloc(&mut self, node: Node<T>) -> NodeId {
        match self.free_head {
            Some(slot) => {
                let next_free = match &self.slots[slot] {
                    Slot::Vacant { next_free } => *next_free,
                    Slot::Occupied(_) => unreachable!("freelist points at an occupied slot"),
                };
                self.free_head = next_free;
                self.slots[slot] = Slot::Occupied(node);
                NodeId(slot)
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Node<T> {
        let slot = std::mem::replace(
            &mut self.slots[id.0],
            Slot::Vacant {
                next_free: self.free_head,
            },
        );
        self.free_head = Some(id.0);
        match slot {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("stale chain handle {id:?}"),
        }
    }

    /// Verifies the stamp is untouched since `stamp` was snapshotted, then
    /// bumps it. Called immediately before every mutating operation returns.
    fn commit(&mut self, stamp: u64) -> Result<(), ChainError> {
        if stamp != self.stamp {
            return Err(ChainError::ConcurrentMutation);
        }
        self.stamp = self.stamp.wrapping_add(1);
        Ok(())
    }

    fn end_is_free(&self, end: End) -> Result<(), ChainError> {
        let anchor = match end {
            End::Head => self.head,
            End::Tail => self.tail,
        };
        if let Some(id) = anchor {
            if self.neighbor(id, end).is_some() {
                return Err(ChainError::EndAttached(end));
            }
        }
        Ok(())
    }

    fn link_front(&mut self, value: T) -> NodeId {
        let id = self.alloc(Node {
            value,
            headward: None,
            tailward: self.head,
        });
        match self.head {
            Some(old) => self.node_mut(old).headward = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
        id
    }

    fn link_back(&mut self, value: T) -> NodeId {
        let id = self.alloc(Node {
            value,
            headward: self.tail,
            tailward: None,
        });
        match self.tail {
            Some(old) => self.node_mut(old).tailward = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
        id
    }

    /// Unlinks `id`, repairs the neighboring links and the chain ends, and
    /// returns the node with its former links intact.
    fn unlink(&mut self, id: NodeId) -> Node<T> {
        let node = self.release(id);
        match node.headward {
            Some(h) => self.node_mut(h).tailward = node.tailward,
            None => self.head = node.tailward,
        }
        match node.tailward {
            Some(t) => self.node_mut(t).headward = node.headward,
            None => self.tail = node.headward,
        }
        self.len -= 1;
        node
    }

    // ------------------------------------------------------------------
    // End access
    // ------------------------------------------------------------------

    /// The head element, or `None` on an empty chain.
    pub fn front(&self) -> Option<&T> {
        self.head.map(|id| &self.node(id).value)
    }

    /// The tail element, or `None` on an empty chain.
    pub fn back(&self) -> Option<&T> {
        self.tail.map(|id| &self.node(id).value)
    }

    /// The element immediately headward of the tail, or `None` if the chain
    /// holds fewer than two elements.
    pub fn penultimate(&self) -> Option<&T> {
        let tail = self.tail?;
        let id = self.node(tail).headward?;
        Some(&self.node(id).value)
    }

    /// Appends to the head end. O(1).
    pub fn push_front(&mut self, value: T) -> Result<NodeId, ChainError> {
        self.end_is_free(End::Head)?;
        let stamp = self.stamp;
        let id = self.link_front(value);
        self.commit(stamp)?;
        Ok(id)
    }

    /// Appends to the tail end. O(1).
    pub fn push_back(&mut self, value: T) -> Result<NodeId, ChainError> {
        self.end_is_free(End::Tail)?;
        let stamp = self.stamp;
        let id = self.link_back(value);
        self.commit(stamp)?;
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Concatenation
    // ------------------------------------------------------------------

    /// Transfers every element of `other`, in order, in front of this chain's
    /// head. `other` is left empty. The receiver stays removable only if both
    /// operands were.
    ///
    /// Concatenating an empty operand is a no-op that skips the removability
    /// merge entirely (longstanding behavior, kept deliberately).
    ///
    /// # Examples
    ///
    /// ```
    /// use permcycle::chain::Chain;
    ///
    /// let mut chain: Chain<_> = (3..=4).collect();
    /// let mut prefix: Chain<_> = (1..=2).collect();
    /// chain.concat_front(&mut prefix).unwrap();
    ///
    /// assert_eq!(chain.to_string(), "<1, 2, 3, 4>");
    /// assert!(prefix.is_empty());
    /// ```
    pub fn concat_front(&mut self, other: &mut Chain<T>) -> Result<(), ChainError> {
        self.end_is_free(End::Head)?;
        other.end_is_free(End::Tail)?;
        if other.is_empty() {
            return Ok(());
        }
        let stamp = self.stamp;
        let other_stamp = other.stamp;
        self.removable &= other.removable;
        // Walking tail-to-head and pushing front preserves the operand's
        // internal order.
        let mut cursor = other.tail;
        while let Some(id) = cursor {
            let node = other.release(id);
            cursor = node.headward;
            self.link_front(node.value);
        }
        other.reset();
        self.commit(stamp)?;
        other.commit(other_stamp)
    }

    /// Transfers every element of `other`, in order, after this chain's tail.
    /// Same contract as [`Chain::concat_front`].
    pub fn concat_back(&mut self, other: &mut Chain<T>) -> Result<(), ChainError> {
        self.end_is_free(End::Tail)?;
        other.end_is_free(End::Head)?;
        if other.is_empty() {
            return Ok(());
        }
        let stamp = self.stamp;
        let other_stamp = other.stamp;
        self.removable &= other.removable;
        let mut cursor = other.head;
        while let Some(id) = cursor {
            let node = other.release(id);
            cursor = node.tailward;
            self.link_back(node.value);
        }
        other.reset();
        self.commit(stamp)?;
        other.commit(other_stamp)
    }

    fn reset(&mut self) {
        self.head = None;
        self.tail = None;
        self.len = 0;
        self.slots.clear();
        self.free_head = None;
    }

    // ------------------------------------------------------------------
    // Handles and splicing
    // ------------------------------------------------------------------

    pub fn head_node(&self) -> Option<NodeId> {
        self.head
    }

    pub fn tail_node(&self) -> Option<NodeId> {
        self.tail
    }

    /// The neighboring node in the given direction of travel.
    pub fn neighbor(&self, id: NodeId, toward: End) -> Option<NodeId> {
        match toward {
            End::Head => self.node(id).headward,
            End::Tail => self.node(id).tailward,
        }
    }

    pub fn headward(&self, id: NodeId) -> Option<NodeId> {
        self.neighbor(id, End::Head)
    }

    pub fn tailward(&self, id: NodeId) -> Option<NodeId> {
        self.neighbor(id, End::Tail)
    }

    /// The value behind a handle, or `None` if the handle is stale.
    pub fn get(&self, id: NodeId) -> Option<&T> {
        match self.slots.get(id.0)? {
            Slot::Occupied(node) => Some(&node.value),
            Slot::Vacant { .. } => None,
        }
    }

    /// Splices a new node immediately headward of `anchor`. O(1). Degrades to
    /// [`Chain::push_front`] when `anchor` is the head.
    pub fn insert_before(&mut self, anchor: NodeId, value: T) -> Result<NodeId, ChainError> {
        if self.is_empty() || self.head == Some(anchor) {
            return self.push_front(value);
        }
        let stamp = self.stamp;
        let headward = self.node(anchor).headward;
        let id = self.alloc(Node {
            value,
            headward,
            tailward: Some(anchor),
        });
        self.node_mut(anchor).headward = Some(id);
        if let Some(h) = headward {
            self.node_mut(h).tailward = Some(id);
        }
        self.len += 1;
        self.commit(stamp)?;
        Ok(id)
    }

    /// Splices a new node immediately tailward of `anchor`. O(1). Degrades to
    /// [`Chain::push_back`] when `anchor` is the tail.
    pub fn insert_after(&mut self, anchor: NodeId, value: T) -> Result<NodeId, ChainError> {
        if self.is_empty() || self.tail == Some(anchor) {
            return self.push_back(value);
        }
        let stamp = self.stamp;
        let tailward = self.node(anchor).tailward;
        let id = self.alloc(Node {
            value,
            headward: Some(anchor),
            tailward,
        });
        self.node_mut(anchor).tailward = Some(id);
        if let Some(t) = tailward {
            self.node_mut(t).headward = Some(id);
        }
        self.len += 1;
        self.commit(stamp)?;
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Scans
    // ------------------------------------------------------------------

    /// Whether the chain holds an element equal to `value`. O(N).
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.find(value).is_some()
    }

    /// Handle of the first element equal to `value`, headmost first. O(N).
    pub fn find(&self, value: &T) -> Option<NodeId>
    where
        T: PartialEq,
    {
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let node = self.node(id);
            if node.value == *value {
                return Some(id);
            }
            cursor = node.tailward;
        }
        None
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Removes and returns the head element; `Ok(None)` on an empty chain.
    pub fn remove_front(&mut self) -> Result<Option<T>, ChainError> {
        if !self.removable {
            return Err(ChainError::NotRemovable);
        }
        let stamp = self.stamp;
        let value = self.head.map(|id| self.unlink(id).value);
        self.commit(stamp)?;
        Ok(value)
    }

    /// Removes and returns the tail element; `Ok(None)` on an empty chain.
    pub fn remove_back(&mut self) -> Result<Option<T>, ChainError> {
        if !self.removable {
            return Err(ChainError::NotRemovable);
        }
        let stamp = self.stamp;
        let value = self.tail.map(|id| self.unlink(id).value);
        self.commit(stamp)?;
        Ok(value)
    }

    /// Removes the first element equal to `value`. A missing element is an
    /// `Ok(false)` outcome, not an error.
    pub fn remove(&mut self, value: &T) -> Result<bool, ChainError>
    where
        T: PartialEq,
    {
        if !self.removable {
            return Err(ChainError::NotRemovable);
        }
        let stamp = self.stamp;
        let found = self.find(value);
        if let Some(id) = found {
            self.unlink(id);
        }
        self.commit(stamp)?;
        Ok(found.is_some())
    }

    /// Removes every element. O(1): the arena is truncated wholesale.
    pub fn clear(&mut self) -> Result<(), ChainError> {
        if !self.removable {
            return Err(ChainError::NotRemovable);
        }
        let stamp = self.stamp;
        self.reset();
        self.commit(stamp)
    }

    // ------------------------------------------------------------------
    // Iteration
    // ------------------------------------------------------------------

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            chain: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    /// A removal-capable cursor travelling head-to-tail.
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut::new(self, End::Tail)
    }

    /// A removal-capable cursor travelling tail-to-head.
    pub fn cursor_back_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut::new(self, End::Head)
    }

    /// Renders the chain as `<e1SEPe2SEP...>`.
    pub fn display_with(&self, separator: &str) -> String
    where
        T: Display,
    {
        format!("<{}>", self.iter().join(separator))
    }
}

impl<T: Display> Display for Chain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.iter().join(", "))
    }
}

impl<T> Index<NodeId> for Chain<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        &self.node(id).value
    }
}

/// Element-wise equality in chain order; arena layout is irrelevant.
impl<T: PartialEq> PartialEq for Chain<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Chain<T> {}

impl<T> FromIterator<T> for Chain<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut chain = Chain::new();
        for value in iter {
            chain.link_back(value);
        }
        chain.stamp = chain.len as u64;
        chain
    }
}

impl<'a, T> IntoIterator for &'a Chain<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Double-ended borrowing iterator over a [`Chain`].
#[derive(Clone, Debug)]
pub struct Iter<'a, T> {
    chain: &'a Chain<T>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.front = self.chain.tailward(id);
        self.remaining -= 1;
        Some(&self.chain.node(id).value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.back = self.chain.headward(id);
        self.remaining -= 1;
        Some(&self.chain.node(id).value)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for Iter<'_, T> {}
