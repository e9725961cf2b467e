use crate::slot::Slot;
use crate::subarray::SubArray;

/// Iterator over every live `(key, value)` pair in a table, in
/// (level ascending, slot ascending) order.
///
/// Borrows the table for `'a`; any mutation of the table the iterator was
/// created from is disallowed for the iterator's lifetime by the borrow
/// checker, which is the Rust-native form of "iteration is invalidated by
/// mutation."
pub struct Iter<'a> {
    pub(crate) levels: &'a [SubArray],
    pub(crate) level_idx: usize,
    pub(crate) slot_idx: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        while self.level_idx < self.levels.len() {
            let sub = &self.levels[self.level_idx];
            while self.slot_idx < sub.slots.len() {
                let idx = self.slot_idx;
                self.slot_idx += 1;
                if let Slot::Occupied { key, value } = &sub.slots[idx] {
                    return Some((key.as_slice(), value.as_slice()));
                }
            }
            self.level_idx += 1;
            self.slot_idx = 0;
        }
        None
    }
}
