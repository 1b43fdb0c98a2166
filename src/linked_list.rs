//! Intrusive doubly-linked lists over slot-map storage.
//!
//! Entities (widgets, timers) embed a [`Link`] and expose it through the
//! [`Linked`] trait. A [`ListRoot`] records the first and last member of a
//! list; all pointer surgery happens through the root with the owning
//! [`SlotMap`] passed in. The list never owns its members, it only rewires
//! their links, so insertion and removal are O(1) and keys stay stable.
//!
//! ```ignore
//! let mut store: SlotMap<TimerId, Timer> = SlotMap::with_key();
//! let mut list = ListRoot::new();
//! let a = store.insert(Timer::default());
//! list.push_back(&mut store, a);
//! for key in list.iter(&store).rev() { /* last to first */ }
//! ```

use slotmap::{Key, SlotMap};

/// Forward/backward links embedded in a list member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link<K: Key> {
    prev: Option<K>,
    next: Option<K>,
    linked: bool,
}

impl<K: Key> Default for Link<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> Link<K> {
    pub const fn new() -> Self {
        Self {
            prev: None,
            next: None,
            linked: false,
        }
    }

    /// Whether the owning entity is currently a member of some list
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub fn prev(&self) -> Option<K> {
        self.prev
    }

    pub fn next(&self) -> Option<K> {
        self.next
    }
}

/// Access to the [`Link`] embedded in a list member.
pub trait Linked<K: Key> {
    fn link(&self) -> &Link<K>;
    fn link_mut(&mut self) -> &mut Link<K>;
}

/// Head/tail descriptor of an intrusive list.
///
/// `ListRoot` is `Copy` so that a root stored inside one member of a store
/// (a container's child list) can be taken out, edited against the same
/// store and written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRoot<K: Key> {
    first: Option<K>,
    last: Option<K>,
    len: usize,
}

impl<K: Key> Default for ListRoot<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> ListRoot<K> {
    pub const fn new() -> Self {
        Self {
            first: None,
            last: None,
            len: 0,
        }
    }

    pub fn first(&self) -> Option<K> {
        self.first
    }

    pub fn last(&self) -> Option<K> {
        self.last
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Member following `key`, or `None` at the tail or for unknown keys
    pub fn next_of<T: Linked<K>>(store: &SlotMap<K, T>, key: K) -> Option<K> {
        store.get(key).and_then(|item| item.link().next)
    }

    /// Member preceding `key`, or `None` at the head or for unknown keys
    pub fn prev_of<T: Linked<K>>(store: &SlotMap<K, T>, key: K) -> Option<K> {
        store.get(key).and_then(|item| item.link().prev)
    }

    /// Append `key` at the tail of the list.
    ///
    /// The member must not already be linked into any list.
    pub fn push_back<T: Linked<K>>(&mut self, store: &mut SlotMap<K, T>, key: K) {
        let Some(item) = store.get_mut(key) else {
            debug_assert!(false, "push_back of a key missing from the store");
            return;
        };
        debug_assert!(!item.link().linked, "node is already linked");

        let old_last = self.last;
        *item.link_mut() = Link {
            prev: old_last,
            next: None,
            linked: true,
        };

        match old_last.and_then(|last| store.get_mut(last)) {
            Some(last) => last.link_mut().next = Some(key),
            None => self.first = Some(key),
        }
        self.last = Some(key);
        self.len += 1;
    }

    /// Insert `key` at the head of the list.
    ///
    /// The member must not already be linked into any list.
    pub fn push_front<T: Linked<K>>(&mut self, store: &mut SlotMap<K, T>, key: K) {
        let Some(item) = store.get_mut(key) else {
            debug_assert!(false, "push_front of a key missing from the store");
            return;
        };
        debug_assert!(!item.link().linked, "node is already linked");

        let old_first = self.first;
        *item.link_mut() = Link {
            prev: None,
            next: old_first,
            linked: true,
        };

        match old_first.and_then(|first| store.get_mut(first)) {
            Some(first) => first.link_mut().prev = Some(key),
            None => self.last = Some(key),
        }
        self.first = Some(key);
        self.len += 1;
    }

    /// Unlink `key` from this list. Returns `false` if it was not linked.
    ///
    /// The member stays in the store; only its links are cleared.
    pub fn remove<T: Linked<K>>(&mut self, store: &mut SlotMap<K, T>, key: K) -> bool {
        let Some(item) = store.get_mut(key) else {
            return false;
        };
        let link = *item.link();
        if !link.linked {
            return false;
        }
        *item.link_mut() = Link::new();

        match link.prev.and_then(|prev| store.get_mut(prev)) {
            Some(prev) => prev.link_mut().next = link.next,
            None => {
                debug_assert_eq!(self.first, Some(key), "node belongs to another list");
                self.first = link.next;
            }
        }
        match link.next.and_then(|next| store.get_mut(next)) {
            Some(next) => next.link_mut().prev = link.prev,
            None => {
                debug_assert_eq!(self.last, Some(key), "node belongs to another list");
                self.last = link.prev;
            }
        }
        self.len -= 1;
        true
    }

    /// Move a member to the tail, which is the top of the z-order for
    /// sibling lists. Returns `false` if it was not linked.
    pub fn move_to_back<T: Linked<K>>(&mut self, store: &mut SlotMap<K, T>, key: K) -> bool {
        if self.last == Some(key) {
            return true;
        }
        if !self.remove(store, key) {
            return false;
        }
        self.push_back(store, key);
        true
    }

    /// Iterate members first to last; use `.rev()` for last to first.
    pub fn iter<'a, T: Linked<K>>(&self, store: &'a SlotMap<K, T>) -> Iter<'a, K, T> {
        Iter {
            store,
            front: self.first,
            back: self.last,
            remaining: self.len,
        }
    }
}

/// Double-ended iterator over the keys of a [`ListRoot`].
pub struct Iter<'a, K: Key, T> {
    store: &'a SlotMap<K, T>,
    front: Option<K>,
    back: Option<K>,
    remaining: usize,
}

impl<K: Key, T: Linked<K>> Iterator for Iter<'_, K, T> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        if self.remaining == 0 {
            return None;
        }
        let key = self.front?;
        self.front = ListRoot::next_of(self.store, key);
        self.remaining -= 1;
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Key, T: Linked<K>> DoubleEndedIterator for Iter<'_, K, T> {
    fn next_back(&mut self) -> Option<K> {
        if self.remaining == 0 {
            return None;
        }
        let key = self.back?;
        self.back = ListRoot::prev_of(self.store, key);
        self.remaining -= 1;
        Some(key)
    }
}

impl<K: Key, T: Linked<K>> ExactSizeIterator for Iter<'_, K, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use slotmap::new_key_type;

    new_key_type! {
        struct ItemId;
    }

    #[derive(Default)]
    struct Item {
        value: u32,
        link: Link<ItemId>,
    }

    impl Linked<ItemId> for Item {
        fn link(&self) -> &Link<ItemId> {
            &self.link
        }

        fn link_mut(&mut self) -> &mut Link<ItemId> {
            &mut self.link
        }
    }

    fn store_with(values: &[u32]) -> (SlotMap<ItemId, Item>, Vec<ItemId>) {
        let mut store = SlotMap::with_key();
        let keys = values
            .iter()
            .map(|&value| {
                store.insert(Item {
                    value,
                    link: Link::new(),
                })
            })
            .collect();
        (store, keys)
    }

    fn values(list: &ListRoot<ItemId>, store: &SlotMap<ItemId, Item>) -> Vec<u32> {
        list.iter(store).map(|k| store[k].value).collect()
    }

    #[test]
    fn test_push_back_preserves_insertion_order() {
        let (mut store, keys) = store_with(&[1, 2, 3]);
        let mut list = ListRoot::new();
        for &k in &keys {
            list.push_back(&mut store, k);
        }

        assert_eq!(list.len(), 3);
        assert_eq!(values(&list, &store), [1, 2, 3]);
        assert_eq!(list.first(), Some(keys[0]));
        assert_eq!(list.last(), Some(keys[2]));
    }

    #[test]
    fn test_push_front_prepends() {
        let (mut store, keys) = store_with(&[1, 2, 3]);
        let mut list = ListRoot::new();
        for &k in &keys {
            list.push_front(&mut store, k);
        }

        assert_eq!(values(&list, &store), [3, 2, 1]);
    }

    #[test]
    fn test_reverse_iteration() {
        let (mut store, keys) = store_with(&[1, 2, 3, 4]);
        let mut list = ListRoot::new();
        for &k in &keys {
            list.push_back(&mut store, k);
        }

        let rev: Vec<u32> = list.iter(&store).rev().map(|k| store[k].value).collect();
        assert_eq!(rev, [4, 3, 2, 1]);
    }

    #[test]
    fn test_remove_head_middle_tail() {
        let (mut store, keys) = store_with(&[1, 2, 3, 4, 5]);
        let mut list = ListRoot::new();
        for &k in &keys {
            list.push_back(&mut store, k);
        }

        assert!(list.remove(&mut store, keys[2]));
        assert_eq!(values(&list, &store), [1, 2, 4, 5]);
        assert!(list.remove(&mut store, keys[0]));
        assert_eq!(values(&list, &store), [2, 4, 5]);
        assert!(list.remove(&mut store, keys[4]));
        assert_eq!(values(&list, &store), [2, 4]);
        assert_eq!(list.len(), 2);
        assert!(!store[keys[2]].link.is_linked());
    }

    #[test]
    fn test_remove_unlinked_is_noop() {
        let (mut store, keys) = store_with(&[1, 2]);
        let mut list = ListRoot::new();
        list.push_back(&mut store, keys[0]);

        assert!(!list.remove(&mut store, keys[1]));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove_last_member_empties_list() {
        let (mut store, keys) = store_with(&[7]);
        let mut list = ListRoot::new();
        list.push_back(&mut store, keys[0]);
        list.remove(&mut store, keys[0]);

        assert!(list.is_empty());
        assert_eq!(list.first(), None);
        assert_eq!(list.last(), None);
        assert_eq!(list.iter(&store).count(), 0);
    }

    #[test]
    fn test_move_to_back() {
        let (mut store, keys) = store_with(&[1, 2, 3]);
        let mut list = ListRoot::new();
        for &k in &keys {
            list.push_back(&mut store, k);
        }

        assert!(list.move_to_back(&mut store, keys[0]));
        assert_eq!(values(&list, &store), [2, 3, 1]);
        assert!(list.move_to_back(&mut store, keys[0]));
        assert_eq!(values(&list, &store), [2, 3, 1]);
    }

    #[test]
    fn test_relink_after_remove() {
        let (mut store, keys) = store_with(&[1, 2]);
        let mut a = ListRoot::new();
        let mut b = ListRoot::new();
        a.push_back(&mut store, keys[0]);
        a.push_back(&mut store, keys[1]);

        a.remove(&mut store, keys[0]);
        b.push_back(&mut store, keys[0]);

        assert_eq!(values(&a, &store), [2]);
        assert_eq!(values(&b, &store), [1]);
    }

    #[test]
    fn test_iteration_meets_in_the_middle() {
        let (mut store, keys) = store_with(&[1, 2, 3]);
        let mut list = ListRoot::new();
        for &k in &keys {
            list.push_back(&mut store, k);
        }

        let mut iter = list.iter(&store);
        assert_eq!(iter.next(), Some(keys[0]));
        assert_eq!(iter.next_back(), Some(keys[2]));
        assert_eq!(iter.next(), Some(keys[1]));
        assert_eq!(iter.next_back(), None);
    }
}
