use super::{Chain, ChainError, End, NodeId};

/// A lazy, non-restartable cursor over a [`Chain`] that can remove the
/// element it most recently yielded.
///
/// The cursor starts before the first element in its direction of travel;
/// [`CursorMut::remove`] is rejected until [`CursorMut::advance`] has yielded
/// something. After a removal the cursor backs up onto the neighbor opposite
/// its travel, so the next [`CursorMut::advance`] still yields the element
/// that was scheduled to come next — and a second `remove` without an
/// intervening `advance` deletes that neighbor.
///
/// # Examples
///
/// ```
/// use permcycle::chain::Chain;
///
/// let mut chain: Chain<_> = (1..=4).collect();
/// let mut cursor = chain.cursor_front_mut();
/// assert_eq!(cursor.advance(), Some(&1));
/// assert_eq!(cursor.advance(), Some(&2));
/// assert_eq!(cursor.remove().unwrap(), 2);
/// assert_eq!(cursor.advance(), Some(&3));
/// drop(cursor);
///
/// assert_eq!(chain.to_string(), "<1, 3, 4>");
/// ```
pub struct CursorMut<'a, T> {
    chain: &'a mut Chain<T>,
    yielded: Option<NodeId>,
    upcoming: Option<NodeId>,
    toward: End,
}

impl<'a, T> CursorMut<'a, T> {
    pub(super) fn new(chain: &'a mut Chain<T>, toward: End) -> Self {
        let upcoming = match toward {
            End::Tail => chain.head_node(),
            End::Head => chain.tail_node(),
        };
        CursorMut {
            chain,
            yielded: None,
            upcoming,
            toward,
        }
    }

    /// Yields the next element in the cursor's direction of travel, or `None`
    /// once the chain is exhausted.
    pub fn advance(&mut self) -> Option<&T> {
        let id = self.upcoming?;
        self.yielded = Some(id);
        self.upcoming = self.chain.neighbor(id, self.toward);
        self.chain.get(id)
    }

    /// The element most recently yielded, if it is still in the chain.
    pub fn current(&self) -> Option<&T> {
        self.yielded.and_then(|id| self.chain.get(id))
    }

    /// Removes the most recently yielded element and repairs the cursor onto
    /// its neighbor opposite the direction of travel.
    pub fn remove(&mut self) -> Result<T, ChainError> {
        if self.chain.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        let id = self.yielded.ok_or(ChainError::CursorNotAdvanced)?;
        if !self.chain.is_removable() {
            return Err(ChainError::NotRemovable);
        }
        let stamp = self.chain.stamp;
        let node = self.chain.unlink(id);
        self.yielded = match self.toward {
            End::Tail => node.headward,
            End::Head => node.tailward,
        };
        self.chain.commit(stamp)?;
        Ok(node.value)
    }
}
