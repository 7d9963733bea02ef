use super::*;

fn chain_of(values: impl IntoIterator<Item = i32>) -> Chain<i32> {
    values.into_iter().collect()
}

#[test]
fn push_mix_keeps_ends_straight() {
    let mut chain = Chain::new();
    chain.push_back(3).unwrap();
    chain.push_front(2).unwrap();
    chain.push_back(4).unwrap();
    chain.push_front(1).unwrap();

    assert_eq!(chain.len(), 4);
    assert_eq!(chain.front(), Some(&1));
    assert_eq!(chain.back(), Some(&4));
    assert_eq!(chain.penultimate(), Some(&3));
    assert_eq!(chain.to_string(), "<1, 2, 3, 4>");
}

#[test]
fn empty_chain_queries() {
    let chain: Chain<i32> = Chain::new();
    assert!(chain.is_empty());
    assert_eq!(chain.len(), 0);
    assert_eq!(chain.front(), None);
    assert_eq!(chain.back(), None);
    assert_eq!(chain.penultimate(), None);
    assert_eq!(chain.head_node(), None);
    assert_eq!(chain.to_string(), "<>");
}

#[test]
fn penultimate_needs_two_elements() {
    let chain = chain_of([7]);
    assert_eq!(chain.penultimate(), None);
    let chain = chain_of([7, 8]);
    assert_eq!(chain.penultimate(), Some(&7));
}

#[test]
fn display_separators() {
    let chain = chain_of(1..=3);
    similar_asserts::assert_eq!(chain.display_with(", "), "<1, 2, 3>");
    similar_asserts::assert_eq!(chain.display_with("|"), "<1|2|3>");
    similar_asserts::assert_eq!(chain.display_with(""), "<123>");
    similar_asserts::assert_eq!(format!("{chain}"), "<1, 2, 3>");
}

#[test]
fn contains_and_find() {
    let chain = chain_of([10, 20, 30]);
    assert!(chain.contains(&20));
    assert!(!chain.contains(&25));

    let id = chain.find(&30).unwrap();
    assert_eq!(chain[id], 30);
    assert_eq!(chain.tailward(id), None);
    assert_eq!(chain.find(&25), None);
}

#[test]
fn concat_back_transfers_and_empties_source() {
    let mut chain = chain_of(1..=2);
    let mut other = chain_of(3..=5);
    chain.concat_back(&mut other).unwrap();

    assert_eq!(chain.to_string(), "<1, 2, 3, 4, 5>");
    assert_eq!(chain.len(), 5);
    assert_eq!(other.len(), 0);
    assert_eq!(other.front(), None);
    assert_eq!(other.back(), None);
}

#[test]
fn concat_front_transfers_in_order() {
    let mut chain = chain_of(3..=4);
    let mut other = chain_of(1..=2);
    chain.concat_front(&mut other).unwrap();

    assert_eq!(chain.to_string(), "<1, 2, 3, 4>");
    assert!(other.is_empty());
}

#[test]
fn concat_into_empty_receiver() {
    let mut chain: Chain<i32> = Chain::new();
    let mut other = chain_of(1..=3);
    chain.concat_back(&mut other).unwrap();
    assert_eq!(chain.to_string(), "<1, 2, 3>");

    let mut chain: Chain<i32> = Chain::new();
    let mut other = chain_of(1..=3);
    chain.concat_front(&mut other).unwrap();
    assert_eq!(chain.to_string(), "<1, 2, 3>");
}

#[test]
fn concat_empty_operand_skips_removability_merge() {
    let mut chain = chain_of(1..=3);
    let mut empty_pinned: Chain<i32> = Chain::append_only();
    chain.concat_back(&mut empty_pinned).unwrap();

    // The no-op path never merges the flag.
    assert!(chain.is_removable());
    assert_eq!(chain.remove_front().unwrap(), Some(1));
}

#[test]
fn concat_non_removable_source_poisons_receiver() {
    let mut chain = chain_of(1..=2);
    let mut pinned = Chain::append_only();
    pinned.push_back(3).unwrap();
    chain.concat_back(&mut pinned).unwrap();

    assert!(!chain.is_removable());
    assert_eq!(chain.remove_front(), Err(ChainError::NotRemovable));
    assert_eq!(chain.remove_back(), Err(ChainError::NotRemovable));
    assert_eq!(chain.remove(&1), Err(ChainError::NotRemovable));
    assert_eq!(chain.clear(), Err(ChainError::NotRemovable));

    let mut cursor = chain.cursor_front_mut();
    assert_eq!(cursor.advance(), Some(&1));
    assert_eq!(cursor.remove(), Err(ChainError::NotRemovable));
}

#[test]
fn remove_front_and_back() {
    let mut chain = chain_of(1..=3);
    assert_eq!(chain.remove_front().unwrap(), Some(1));
    assert_eq!(chain.remove_back().unwrap(), Some(3));
    assert_eq!(chain.remove_back().unwrap(), Some(2));
    assert_eq!(chain.remove_front().unwrap(), None);
    assert_eq!(chain.remove_back().unwrap(), None);
    assert!(chain.is_empty());
}

#[test]
fn remove_by_value_reports_outcome() {
    let mut chain = chain_of(1..=4);
    assert!(chain.remove(&3).unwrap());
    assert_eq!(chain.to_string(), "<1, 2, 4>");
    assert!(chain.remove(&1).unwrap());
    assert!(chain.remove(&4).unwrap());
    assert_eq!(chain.to_string(), "<2>");
    assert!(!chain.remove(&9).unwrap());
    assert!(chain.remove(&2).unwrap());
    assert_eq!(chain.front(), None);
    assert_eq!(chain.back(), None);
}

#[test]
fn clear_empties_the_chain() {
    let mut chain = chain_of(1..=5);
    chain.clear().unwrap();
    assert!(chain.is_empty());
    assert_eq!(chain.front(), None);
    chain.push_back(9).unwrap();
    assert_eq!(chain.to_string(), "<9>");
}

#[test]
fn append_only_rejects_removal() {
    let mut chain = Chain::append_only();
    chain.push_back(1).unwrap();
    assert_eq!(chain.remove_front(), Err(ChainError::NotRemovable));
    assert_eq!(chain.clear(), Err(ChainError::NotRemovable));
    assert_eq!(chain.to_string(), "<1>");
}

#[test]
fn iteration_both_directions() {
    let chain = chain_of(1..=5);
    assert_eq!(chain.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    assert_eq!(
        chain.iter().rev().copied().collect::<Vec<_>>(),
        vec![5, 4, 3, 2, 1]
    );

    let mut iter = chain.iter();
    assert_eq!(iter.len(), 5);
    assert_eq!(iter.next(), Some(&1));
    assert_eq!(iter.next_back(), Some(&5));
    assert_eq!(iter.next(), Some(&2));
    assert_eq!(iter.next_back(), Some(&4));
    assert_eq!(iter.next(), Some(&3));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.next_back(), None);
    assert_eq!(iter.len(), 0);
}

#[test]
fn cursor_forward_removal() {
    let mut chain = chain_of(1..=4);
    let mut cursor = chain.cursor_front_mut();
    assert_eq!(cursor.advance(), Some(&1));
    assert_eq!(cursor.advance(), Some(&2));
    assert_eq!(cursor.remove().unwrap(), 2);
    assert_eq!(cursor.advance(), Some(&3));
    assert_eq!(cursor.remove().unwrap(), 3);
    assert_eq!(cursor.advance(), Some(&4));
    assert_eq!(cursor.remove().unwrap(), 4);
    assert_eq!(cursor.advance(), None);
    drop(cursor);
    assert_eq!(chain.to_string(), "<1>");
}

#[test]
fn cursor_backward_removal() {
    let mut chain = chain_of(1..=3);
    let mut cursor = chain.cursor_back_mut();
    assert_eq!(cursor.advance(), Some(&3));
    assert_eq!(cursor.advance(), Some(&2));
    assert_eq!(cursor.remove().unwrap(), 2);
    assert_eq!(cursor.advance(), Some(&1));
    assert_eq!(cursor.advance(), None);
    drop(cursor);
    assert_eq!(chain.to_string(), "<1, 3>");
}

#[test]
fn cursor_repeated_remove_walks_backwards() {
    let mut chain = chain_of(1..=3);
    let mut cursor = chain.cursor_front_mut();
    assert_eq!(cursor.advance(), Some(&1));
    assert_eq!(cursor.advance(), Some(&2));
    assert_eq!(cursor.remove().unwrap(), 2);
    // The cursor backed up onto 1; removing again deletes it.
    assert_eq!(cursor.remove().unwrap(), 1);
    assert_eq!(cursor.remove(), Err(ChainError::CursorNotAdvanced));
    assert_eq!(cursor.advance(), Some(&3));
    drop(cursor);
    assert_eq!(chain.to_string(), "<3>");
}

#[test]
fn cursor_remove_preconditions() {
    let mut empty: Chain<i32> = Chain::new();
    let mut cursor = empty.cursor_front_mut();
    assert_eq!(cursor.remove(), Err(ChainError::EmptyChain));

    let mut chain = chain_of(1..=2);
    let mut cursor = chain.cursor_front_mut();
    assert_eq!(cursor.remove(), Err(ChainError::CursorNotAdvanced));
    assert_eq!(cursor.current(), None);
}

#[test]
fn splice_with_handles() {
    let mut chain = chain_of([1, 3]);
    let anchor = chain.find(&3).unwrap();
    chain.insert_before(anchor, 2).unwrap();
    assert_eq!(chain.to_string(), "<1, 2, 3>");

    let head = chain.head_node().unwrap();
    chain.insert_before(head, 0).unwrap();
    assert_eq!(chain.front(), Some(&0));

    let tail = chain.tail_node().unwrap();
    chain.insert_after(tail, 4).unwrap();
    assert_eq!(chain.back(), Some(&4));

    let anchor = chain.find(&3).unwrap();
    let id = chain.insert_after(anchor, 9).unwrap();
    assert_eq!(chain[id], 9);
    assert_eq!(chain.to_string(), "<0, 1, 2, 3, 9, 4>");
}

#[test]
fn handles_go_stale_after_removal() {
    let mut chain = chain_of(1..=3);
    let id = chain.find(&2).unwrap();
    assert!(chain.remove(&2).unwrap());
    assert_eq!(chain.get(id), None);

    // The freed slot is recycled for the next insertion.
    let recycled = chain.push_back(4).unwrap();
    assert_eq!(recycled, id);
    assert_eq!(chain.to_string(), "<1, 3, 4>");
}

#[test]
fn equality_ignores_arena_layout() {
    let mut scrambled = chain_of([1, 9, 2, 3]);
    assert!(scrambled.remove(&9).unwrap());
    assert_eq!(scrambled, chain_of(1..=3));
    assert_ne!(scrambled, chain_of(1..=4));
}

#[test]
fn neighbor_walk_matches_iteration() {
    let chain = chain_of(1..=4);
    let mut walked = Vec::new();
    let mut cursor = chain.head_node();
    while let Some(id) = cursor {
        walked.push(chain[id]);
        cursor = chain.tailward(id);
    }
    assert_eq!(walked, chain.iter().copied().collect::<Vec<_>>());
    assert_eq!(chain.headward(chain.head_node().unwrap()), None);
}

mod model {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    #[derive(Clone, Debug)]
    enum Op {
        PushFront(i8),
        PushBack(i8),
        RemoveFront,
        RemoveBack,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<i8>().prop_map(Op::PushFront),
            any::<i8>().prop_map(Op::PushBack),
            Just(Op::RemoveFront),
            Just(Op::RemoveBack),
        ]
    }

    proptest! {
        #[test]
        fn matches_deque_model(ops in proptest::collection::vec(op(), 0..64)) {
            let mut chain = Chain::new();
            let mut deque = VecDeque::new();
            for op in ops {
                match op {
                    Op::PushFront(v) => {
                        chain.push_front(v).unwrap();
                        deque.push_front(v);
                    }
                    Op::PushBack(v) => {
                        chain.push_back(v).unwrap();
                        deque.push_back(v);
                    }
                    Op::RemoveFront => {
                        prop_assert_eq!(chain.remove_front().unwrap(), deque.pop_front());
                    }
                    Op::RemoveBack => {
                        prop_assert_eq!(chain.remove_back().unwrap(), deque.pop_back());
                    }
                }
                prop_assert_eq!(chain.len(), deque.len());
                prop_assert!(chain.iter().eq(deque.iter()));
            }
        }
    }
}
