//! # Permuters
//!
//! A [`Permuter`] walks the space of all N! orderings of a sequence of N
//! distinct elements without ever materializing more than one ordering.
//!
//! ## Key features:
//!
//! - **Stepping**: [`Permuter::next_permutation`] /
//!   [`Permuter::previous_permutation`] move to the neighboring permutation in
//!   Steinhaus-Johnson-Trotter order with a single adjacent transposition,
//!   amortized O(1) per step.
//! - **Jumping**: [`Permuter::jump_to`] lands on an arbitrary rank directly by
//!   decomposing it in the factorial number system: O(N) best case, O(N²)
//!   worst case, never a walk through intermediate permutations.
//! - **Constraints**: [`Permuter::add_constraint`] restricts the space to
//!   orderings where one element precedes another;
//!   [`Permuter::is_valid`] is revalidated incrementally in O(C) per swap
//!   rather than rescanned.
//! - **Observation**: an optional callback fires after every adjacent swap
//!   with the element values that ended up earlier and later.
//!
//! The engine is built by pushing or concatenating elements, then freezes on
//! the first permutation query ("generation"): a single O(N) walk assigns
//! each element an identity in sequence order and builds two parallel index
//! arrays, position→element and element→position. From then on the chain
//! itself never changes — every permutation is expressed purely through the
//! arrays, and the live view maps positions through them. Structural
//! mutation after generation fails with [`PermuterError::Frozen`].
//!
//! The SJT schedule falls out of the factorial number system: writing the
//! rank with descending radices N, N−1, …, 2, the first radix that does not
//! divide evenly names the mobile element, and the quotient's parity against
//! twice the radix names its direction of travel.

use std::fmt::{self, Debug, Display};
use std::iter::FusedIterator;

use itertools::Itertools;
use thiserror::Error;

use crate::chain::{Chain, ChainError, NodeId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermuterError {
    #[error("permutation tables have been generated; the sequence is frozen")]
    Frozen,
    #[error("constraint endpoints must differ")]
    EqualEndpoints,
    #[error("neither constraint endpoint is present in the sequence")]
    MissingEndpoints,
    #[error("permutation count overflows; sequences beyond 20 elements are not supported")]
    TooManyElements,
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// A precedence restriction: `before` must occur earlier than `after`.
///
/// Endpoints are held by value until generation resolves them to element
/// identities. The cached bit is flipped only by swaps that exchange exactly
/// the two endpoints; any other swap provably leaves their relative order
/// alone.
#[derive(Clone, Debug)]
struct Constraint<T> {
    before: T,
    after: T,
    ids: Option<(usize, usize)>,
    ok: bool,
}

impl<T: PartialEq> Constraint<T> {
    /// Resolves the endpoints against the element identities and evaluates
    /// the bit from the current positions. Exactly one endpoint being absent
    /// pins the bit permanently; both absent is an error.
    fn resolve(
        &mut self,
        seq: &Chain<T>,
        node_at: &[NodeId],
        pos_of: &[usize],
    ) -> Result<bool, PermuterError> {
        let mut before_id = None;
        let mut after_id = None;
        for (id, node) in node_at.iter().enumerate() {
            let value = &seq[*node];
            if before_id.is_none() && *value == self.before {
                before_id = Some(id);
            }
            if after_id.is_none() && *value == self.after {
                after_id = Some(id);
            }
        }
        match (before_id, after_id) {
            (Some(before), Some(after)) => {
                self.ids = Some((before, after));
                self.ok = pos_of[before] < pos_of[after];
            }
            (Some(_), None) => {
                self.ids = None;
                self.ok = true;
            }
            (None, Some(_)) => {
                self.ids = None;
                self.ok = false;
            }
            (None, None) => return Err(PermuterError::MissingEndpoints),
        }
        Ok(self.ok)
    }
}

impl<T> Constraint<T> {
    fn after_swap(&mut self, earlier: usize, later: usize) -> bool {
        if let Some((before, after)) = self.ids {
            if earlier == before && later == after {
                self.ok = true;
            } else if earlier == after && later == before {
                self.ok = false;
            }
        }
        self.ok
    }

    fn revalidate(&mut self, pos_of: &[usize]) -> bool {
        if let Some((before, after)) = self.ids {
            self.ok = pos_of[before] < pos_of[after];
        }
        self.ok
    }
}

/// The index arrays built at generation. `elem_at` and `pos_of` are exact
/// inverses at all times; `node_at` pins each element identity to its node,
/// so the value of identity `k` is always `seq[node_at[k]]`.
#[derive(Clone, Debug)]
struct Tables {
    node_at: Vec<NodeId>,
    elem_at: Vec<usize>,
    pos_of: Vec<usize>,
    total: u64,
}

impl Tables {
    /// Exchanges the mobile element with its neighbor in the given direction
    /// in both index arrays, and reports which identity ended up earlier and
    /// which later.
    fn swap_step(&mut self, mobile: usize, toward_head: bool) -> (usize, usize) {
        let from = self.pos_of[mobile];
        let to = if toward_head { from - 1 } else { from + 1 };
        let other = self.elem_at[to];
        self.elem_at.swap(from, to);
        self.pos_of[mobile] = to;
        self.pos_of[other] = from;
        if toward_head {
            (mobile, other)
        } else {
            (other, mobile)
        }
    }
}

/// A permutation engine over a sequence of distinct elements.
///
/// # Examples
///
/// ```
/// use permcycle::permuter::Permuter;
///
/// let mut engine: Permuter<u32> = (1..=5).collect();
/// assert_eq!(engine.total_permutations().unwrap(), 120);
///
/// engine.jump_to(23).unwrap();
/// assert_eq!(engine.permutation_string(", ").unwrap(), "<4, 5, 1, 3, 2>");
///
/// engine.next_permutation().unwrap();
/// assert_eq!(engine.current_rank().unwrap(), 24);
///
/// engine.jump_to(-1).unwrap();
/// assert_eq!(engine.current_rank().unwrap(), 119);
/// ```
pub struct Permuter<T> {
    seq: Chain<T>,
    tables: Option<Tables>,
    rank: u64,
    valid: bool,
    constraints: Vec<Constraint<T>>,
    observer: Option<Box<dyn FnMut(&T, &T)>>,
}

impl<T> Default for Permuter<T> {
    fn default() -> Self {
        Permuter::new()
    }
}

impl<T> From<Chain<T>> for Permuter<T> {
    fn from(seq: Chain<T>) -> Self {
        Permuter {
            seq,
            tables: None,
            rank: 0,
            valid: true,
            constraints: Vec::new(),
            observer: None,
        }
    }
}

impl<T> FromIterator<T> for Permuter<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Permuter::from(iter.into_iter().collect::<Chain<T>>())
    }
}

impl<T: Debug> Debug for Permuter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permuter")
            .field("seq", &self.seq)
            .field("rank", &self.rank)
            .field("valid", &self.valid)
            .field("generated", &self.tables.is_some())
            .field("constraints", &self.constraints.len())
            .finish_non_exhaustive()
    }
}

impl<T> Permuter<T> {
    pub fn new() -> Self {
        Permuter::from(Chain::append_only())
    }

    /// Creates an empty engine whose callback fires after every swap with the
    /// element values that are now earlier and later in the ordering.
    ///
    /// Jumps reorder wholesale and do not report individual swaps.
    pub fn with_observer(observer: impl FnMut(&T, &T) + 'static) -> Self {
        let mut permuter = Permuter::new();
        permuter.observer = Some(Box::new(observer));
        permuter
    }

    pub fn set_observer(&mut self, observer: impl FnMut(&T, &T) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// The underlying sequence, permanently in its original order.
    pub fn sequence(&self) -> &Chain<T> {
        &self.seq
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Whether the permutation tables exist yet.
    pub fn is_generated(&self) -> bool {
        self.tables.is_some()
    }

    /// Whether the current permutation satisfies every constraint. `true`
    /// until a constraint is violated; maintained incrementally across swaps.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    fn ensure_unfrozen(&self) -> Result<(), PermuterError> {
        if self.tables.is_some() {
            return Err(PermuterError::Frozen);
        }
        Ok(())
    }

    /// Appends an element at the head. Fails once generation has frozen the
    /// sequence.
    pub fn push_front(&mut self, value: T) -> Result<(), PermuterError> {
        self.ensure_unfrozen()?;
        self.seq.push_front(value)?;
        Ok(())
    }

    /// Appends an element at the tail. Fails once generation has frozen the
    /// sequence.
    pub fn push_back(&mut self, value: T) -> Result<(), PermuterError> {
        self.ensure_unfrozen()?;
        self.seq.push_back(value)?;
        Ok(())
    }

    /// Absorbs `other` in front of the sequence, leaving it empty.
    pub fn concat_front(&mut self, other: &mut Chain<T>) -> Result<(), PermuterError> {
        self.ensure_unfrozen()?;
        self.seq.concat_front(other)?;
        Ok(())
    }

    /// Absorbs `other` after the sequence's tail, leaving it empty.
    pub fn concat_back(&mut self, other: &mut Chain<T>) -> Result<(), PermuterError> {
        self.ensure_unfrozen()?;
        self.seq.concat_back(other)?;
        Ok(())
    }

    fn total(&self) -> u64 {
        self.tables.as_ref().map_or(0, |tables| tables.total)
    }

    /// Performs one adjacent transposition of `mobile` in the given
    /// direction, retests exactly the constraints whose endpoints are the
    /// swapped pair, and notifies the observer.
    fn exchange(&mut self, mobile: usize, toward_head: bool) {
        let Some(tables) = self.tables.as_mut() else {
            return;
        };
        let (earlier, later) = tables.swap_step(mobile, toward_head);
        let mut all = true;
        for constraint in &mut self.constraints {
            all &= constraint.after_swap(earlier, later);
        }
        self.valid = all;
        if let Some(observe) = self.observer.as_mut() {
            observe(
                &self.seq[tables.node_at[earlier]],
                &self.seq[tables.node_at[later]],
            );
        }
    }
}

impl<T: PartialEq> Permuter<T> {
    /// Whether the sequence holds an element equal to `value`. O(N).
    pub fn contains(&self, value: &T) -> bool {
        self.seq.contains(value)
    }

    /// Requires `before` to occur earlier in the permutation than `after`.
    ///
    /// Before generation the endpoints are held as-is; generation resolves
    /// them (erroring if neither is present). A constraint added after
    /// generation resolves immediately against the current arrangement.
    ///
    /// # Examples
    ///
    /// ```
    /// use permcycle::permuter::Permuter;
    ///
    /// let mut engine: Permuter<u32> = (1..=3).collect();
    /// engine.add_constraint(1, 3).unwrap();
    ///
    /// assert!(engine.is_valid());
    /// engine.next_permutation().unwrap(); // <1, 3, 2>
    /// assert!(engine.is_valid());
    /// engine.next_permutation().unwrap(); // <3, 1, 2>
    /// assert!(!engine.is_valid());
    /// ```
    pub fn add_constraint(&mut self, before: T, after: T) -> Result<(), PermuterError> {
        if before == after {
            return Err(PermuterError::EqualEndpoints);
        }
        let mut constraint = Constraint {
            before,
            after,
            ids: None,
            ok: true,
        };
        if let Some(tables) = self.tables.as_ref() {
            constraint.resolve(&self.seq, &tables.node_at, &tables.pos_of)?;
            self.valid &= constraint.ok;
        }
        self.constraints.push(constraint);
        Ok(())
    }

    /// Builds the permutation tables if the sequence is non-empty and they do
    /// not exist yet. One O(N) walk assigns identities in sequence order;
    /// constraints are then resolved by one scan each. Nothing commits if a
    /// constraint fails to resolve or the count overflows.
    fn ensure_generated(&mut self) -> Result<(), PermuterError> {
        if self.tables.is_some() || self.seq.is_empty() {
            return Ok(());
        }
        let n = self.seq.len();
        let mut node_at = Vec::with_capacity(n);
        let mut total: u64 = 1;
        let mut cursor = self.seq.head_node();
        while let Some(id) = cursor {
            node_at.push(id);
            total = total
                .checked_mul(node_at.len() as u64)
                .ok_or(PermuterError::TooManyElements)?;
            cursor = self.seq.tailward(id);
        }
        let tables = Tables {
            elem_at: (0..n).collect(),
            pos_of: (0..n).collect(),
            node_at,
            total,
        };
        let mut all = true;
        for constraint in &mut self.constraints {
            all &= constraint.resolve(&self.seq, &tables.node_at, &tables.pos_of)?;
        }
        self.valid = all;
        self.tables = Some(tables);
        Ok(())
    }

    /// N! for a sequence of N elements; 0 for an empty engine, which never
    /// generates. Triggers generation.
    pub fn total_permutations(&mut self) -> Result<u64, PermuterError> {
        self.ensure_generated()?;
        Ok(self.total())
    }

    /// Zero-based rank of the current permutation. Triggers generation.
    pub fn current_rank(&mut self) -> Result<u64, PermuterError> {
        self.ensure_generated()?;
        Ok(self.rank)
    }

    /// A view of the current permutation, head to tail. Triggers generation.
    /// Each call reflects the arrangement at that moment.
    pub fn current(&mut self) -> Result<Current<'_, T>, PermuterError> {
        self.ensure_generated()?;
        Ok(Current {
            seq: &self.seq,
            tables: self.tables.as_ref(),
            next: 0,
        })
    }

    /// Renders the current permutation as `<e1SEPe2SEP...>`.
    pub fn permutation_string(&mut self, separator: &str) -> Result<String, PermuterError>
    where
        T: Display,
    {
        Ok(format!("<{}>", self.current()?.join(separator)))
    }

    /// Steps to the successor permutation in SJT order, wrapping from the
    /// last rank back to rank 0 (the original ordering). Amortized O(1).
    pub fn next_permutation(&mut self) -> Result<(), PermuterError> {
        if self.seq.len() <= 1 {
            return Ok(());
        }
        self.ensure_generated()?;
        self.rank = (self.rank + 1) % self.total();
        let mut digits = self.rank;
        for radix in (2..=self.seq.len() as u64).rev() {
            if digits % radix != 0 {
                let toward_head = digits % (2 * radix) < radix;
                self.exchange(radix as usize - 1, toward_head);
                return Ok(());
            }
            digits /= radix;
        }
        // Every radix divides evenly only on the wrap to rank 0; the lowest
        // identity moves headward unconditionally.
        self.exchange(0, true);
        Ok(())
    }

    /// Steps to the predecessor permutation, wrapping from rank 0 to the last
    /// rank. The mobile element comes from the pre-decrement rank with the
    /// direction sense reversed.
    pub fn previous_permutation(&mut self) -> Result<(), PermuterError> {
        if self.seq.len() <= 1 {
            return Ok(());
        }
        self.ensure_generated()?;
        let digits_from = self.rank;
        self.rank = match self.rank {
            0 => self.total() - 1,
            rank => rank - 1,
        };
        let mut digits = digits_from;
        for radix in (2..=self.seq.len() as u64).rev() {
            if digits % radix != 0 {
                let toward_head = digits % (2 * radix) >= radix;
                self.exchange(radix as usize - 1, toward_head);
                return Ok(());
            }
            digits /= radix;
        }
        self.exchange(0, false);
        Ok(())
    }

    /// Jumps straight to the permutation of the given rank, normalized into
    /// `[0, N!)` with floor-style wraparound for negative input.
    ///
    /// The rank's factorial-number-system digits place the elements from the
    /// highest identity down. Each element's raw digit names a provisional
    /// position, which then shifts tailward past every already-placed higher
    /// identity at or before it; an ordered auxiliary chain of taken
    /// positions makes each shift an O(1) splice. O(N) when the digits
    /// ascend, O(N²) when fully reversed.
    pub fn jump_to(&mut self, rank: i64) -> Result<(), PermuterError> {
        if self.seq.len() <= 1 {
            return Ok(());
        }
        self.ensure_generated()?;
        let Some(tables) = self.tables.as_mut() else {
            return Ok(());
        };
        self.rank = rank.rem_euclid(tables.total as i64) as u64;
        let mut digits = self.rank;
        let mut taken: Chain<usize> = Chain::new();
        for radix in (1..=tables.node_at.len() as u64).rev() {
            let digit = (digits % radix) as usize;
            let mut position = if digits % (2 * radix) < radix {
                radix as usize - digit - 1
            } else {
                digit
            };
            let mut probe = taken.head_node();
            while let Some(id) = probe {
                if taken[id] <= position {
                    position += 1;
                    probe = taken.tailward(id);
                } else {
                    break;
                }
            }
            match probe {
                Some(id) => taken.insert_before(id, position)?,
                None => taken.push_back(position)?,
            };
            let element = radix as usize - 1;
            tables.elem_at[position] = element;
            tables.pos_of[element] = position;
            digits /= radix;
        }
        let mut all = true;
        for constraint in &mut self.constraints {
            all &= constraint.revalidate(&tables.pos_of);
        }
        self.valid = all;
        Ok(())
    }
}

/// Borrowing iterator over the current permutation of a [`Permuter`],
/// produced by [`Permuter::current`].
#[derive(Clone, Debug)]
pub struct Current<'a, T> {
    seq: &'a Chain<T>,
    tables: Option<&'a Tables>,
    next: usize,
}

impl<'a, T> Iterator for Current<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let tables = self.tables?;
        let element = *tables.elem_at.get(self.next)?;
        self.next += 1;
        Some(&self.seq[tables.node_at[element]])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self
            .tables
            .map_or(0, |tables| tables.elem_at.len() - self.next);
        (len, Some(len))
    }
}

impl<T> ExactSizeIterator for Current<'_, T> {}

impl<T> FusedIterator for Current<'_, T> {}
