//! # Permcycle
//!
//! Permcycle is a Rust library for cycling through the permutations of a
//! sequence in place. Its primary focus is on generating orderings one
//! adjacent transposition at a time, jumping straight to an arbitrary
//! permutation by rank, and tracking precedence constraints incrementally
//! while doing so.
//!
//! This library is useful for scenarios where you need to enumerate or sample
//! the arrangements of a collection without materializing them, or react to
//! each reordering as it happens.
//!
//! Sequences are held in a [`chain::Chain`], a doubly linked list with stable
//! node handles, splice-based concatenation, and a removal-capable cursor.
//! The [`permuter::Permuter`] engine freezes a chain on first use and drives
//! its orderings through the factorial number system.

pub mod chain;
pub mod permuter;
