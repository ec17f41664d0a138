/// A simple slab allocator.
///
/// A `Slab` stores values of type `T` in a contiguous array and
/// returns small indices that can be reused after removal.
///
/// The reactor uses these indices as poller tokens. A token may be reused
/// once its source has been removed, so a stale readiness event can reach
/// a newer source; callers treat readiness as a hint and retry.
pub(crate) struct Slab<T> {
    /// Storage for items; `None` marks a free slot.
    items: Vec<Option<T>>,

    /// Stack of free indices that can be reused.
    free: Vec<usize>,
}

impl<T> Slab<T> {
    /// Creates a new `Slab` with `size` free slots.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let slab = Slab::<i32>::new(16);
    /// ```
    pub(crate) fn new(size: usize) -> Self {
        let items = (0..size).map(|_| None).collect();
        let free = (0..size).rev().collect();

        Self { items, free }
    }

    /// Inserts a value into the slab and returns its index.
    ///
    /// If a free slot is available, it is reused.
    /// Otherwise, the slab grows exponentially.
    pub(crate) fn insert(&mut self, item: T) -> usize {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let len = self.items.len();
                let new_len = if len == 0 { 1 } else { 2 * len };

                self.items.resize_with(new_len, || None);
                self.free.extend(((len + 1)..new_len).rev());

                len
            }
        };

        self.items[index] = Some(item);
        index
    }

    /// Removes and returns the value stored at `index`, if any.
    ///
    /// The slot becomes free and may be reused by future insertions.
    pub(crate) fn try_remove(&mut self, index: usize) -> Option<T> {
        let item = self.items.get_mut(index)?.take()?;
        self.free.push(index);
        Some(item)
    }

    /// Returns a mutable reference to the value at `index`, if any.
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)?.as_mut()
    }

    /// Returns the number of stored values.
    pub(crate) fn len(&self) -> usize {
        self.items.len() - self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::Slab;

    #[test]
    fn insert_reuses_freed_slots() {
        let mut slab = Slab::new(2);

        let a = slab.insert("a");
        let b = slab.insert("b");
        assert_ne!(a, b);
        assert_eq!(slab.len(), 2);

        assert_eq!(slab.try_remove(a), Some("a"));
        assert_eq!(slab.len(), 1);

        let c = slab.insert("c");
        assert_eq!(c, a);
        assert_eq!(slab.get_mut(c), Some(&mut "c"));
    }

    #[test]
    fn grows_when_full() {
        let mut slab = Slab::new(0);

        let indices: Vec<usize> = (0..5).map(|i| slab.insert(i)).collect();

        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(slab.len(), 5);
        for (value, index) in indices.into_iter().enumerate() {
            assert_eq!(slab.get_mut(index).copied(), Some(value));
        }
    }

    #[test]
    fn stale_indices_are_ignored() {
        let mut slab = Slab::new(1);
        let index = slab.insert(1u8);

        assert_eq!(slab.try_remove(index), Some(1));
        assert_eq!(slab.try_remove(index), None);
        assert!(slab.get_mut(index).is_none());
        assert!(slab.get_mut(100).is_none());
    }
}
