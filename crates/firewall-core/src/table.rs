//! Fixed-depth rule storage and frozen snapshots.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{Dimensions, FirewallError, RuleWord};

/// Ordered, fixed-size collection of rule words indexed `0..depth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    dims: Dimensions,
    slots: Vec<RuleWord>,
}

impl RuleTable {
    /// Creates a table with every slot at the all-zero word.
    #[must_use]
    pub fn new(dims: Dimensions) -> Self {
        Self {
            dims,
            slots: vec![RuleWord::zero(&dims); dims.depth()],
        }
    }

    /// Copies a snapshot into a new, writable table.
    #[must_use]
    pub fn from_snapshot(snapshot: &TableSnapshot) -> Self {
        Self {
            dims: snapshot.dims,
            slots: snapshot.slots.to_vec(),
        }
    }

    /// Replaces one slot.
    ///
    /// # Errors
    ///
    /// Returns [`FirewallError::IndexOutOfRange`] for `index >= depth` and
    /// [`FirewallError::WidthMismatch`] for a word of the wrong width. The
    /// table is unchanged on error.
    pub fn write_rule(&mut self, index: usize, word: RuleWord) -> Result<(), FirewallError> {
        if word.width() != self.dims.word_width() {
            return Err(FirewallError::WidthMismatch {
                expected: self.dims.word_width(),
                actual: word.width(),
            });
        }

        let depth = self.slots.len();
        let Some(slot) = self.slots.get_mut(index) else {
            warn!(index, depth, "rejected rule write outside table");
            return Err(FirewallError::IndexOutOfRange { index, depth });
        };

        *slot = word;
        debug!(index, word = %word, "rule slot written");
        Ok(())
    }

    /// Sets every slot back to the all-zero word.
    pub fn reset(&mut self) {
        let zero = RuleWord::zero(&self.dims);
        self.slots.fill(zero);
        debug!(depth = self.slots.len(), "rule table reset");
    }

    /// Freezes the current contents into a shareable read-only view.
    #[must_use]
    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            dims: self.dims,
            slots: Arc::from(self.slots.as_slice()),
        }
    }

    /// Table dimensions.
    #[must_use]
    pub const fn dims(&self) -> &Dimensions {
        &self.dims
    }

    /// Current slot contents.
    #[must_use]
    pub fn slots(&self) -> &[RuleWord] {
        &self.slots
    }
}

/// Immutable view of a table's contents.
///
/// Cloning shares the underlying slots, so one snapshot can be handed to any
/// number of concurrent evaluations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    dims: Dimensions,
    slots: Arc<[RuleWord]>,
}

impl TableSnapshot {
    /// Snapshot of a freshly reset table.
    #[must_use]
    pub fn zeroed(dims: Dimensions) -> Self {
        RuleTable::new(dims).snapshot()
    }

    /// Table dimensions.
    #[must_use]
    pub const fn dims(&self) -> &Dimensions {
        &self.dims
    }

    /// Number of slots; always equals `dims().depth()`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false for valid dimensions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot contents in index order.
    #[must_use]
    pub fn slots(&self) -> &[RuleWord] {
        &self.slots
    }

    /// Word in slot `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RuleWord> {
        self.slots.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::{RuleTable, TableSnapshot};
    use crate::codec::encode_hex;
    use crate::{Dimensions, FirewallError, RuleWord};

    fn dims() -> Dimensions {
        Dimensions::derive(8, 16).unwrap()
    }

    fn word(hex: &str) -> RuleWord {
        RuleWord::from_bits(&dims(), encode_hex(hex, 16).unwrap()).unwrap()
    }

    #[test]
    fn new_table_is_all_zero() {
        let table = RuleTable::new(dims());
        assert_eq!(table.slots().len(), 8);
        assert!(table.slots().iter().all(RuleWord::is_zero));
    }

    #[test]
    fn write_replaces_only_the_target_slot() {
        let mut table = RuleTable::new(dims());
        table.write_rule(3, word("5004")).unwrap();

        for (index, slot) in table.slots().iter().enumerate() {
            if index == 3 {
                assert_eq!(*slot, word("5004"));
            } else {
                assert!(slot.is_zero());
            }
        }
    }

    #[test]
    fn out_of_range_write_is_rejected_without_wrapping() {
        let mut table = RuleTable::new(dims());
        table.write_rule(0, word("5004")).unwrap();

        assert_eq!(
            table.write_rule(8, word("FFFF")),
            Err(FirewallError::IndexOutOfRange { index: 8, depth: 8 })
        );
        assert_eq!(table.slots()[0], word("5004"));
        assert!(table.slots()[1..].iter().all(RuleWord::is_zero));
    }

    #[test]
    fn foreign_width_word_is_rejected() {
        let other = Dimensions::derive(8, 24).unwrap();
        let mut table = RuleTable::new(dims());
        assert_eq!(
            table.write_rule(0, RuleWord::zero(&other)),
            Err(FirewallError::WidthMismatch {
                expected: 16,
                actual: 24
            })
        );
    }

    #[test]
    fn reset_clears_every_slot() {
        let mut table = RuleTable::new(dims());
        for index in 0..8 {
            table.write_rule(index, word("FFFF")).unwrap();
        }
        table.reset();
        let snapshot = table.snapshot();
        assert_eq!(snapshot.len(), 8);
        assert!(snapshot.slots().iter().all(RuleWord::is_zero));
    }

    #[test]
    fn snapshot_is_frozen_against_later_writes() {
        let mut table = RuleTable::new(dims());
        table.write_rule(1, word("5004")).unwrap();
        let before = table.snapshot();

        table.write_rule(1, word("4804")).unwrap();
        table.reset();

        assert_eq!(before.get(1), Some(&word("5004")));
        assert_eq!(RuleTable::from_snapshot(&before).slots()[1], word("5004"));
    }

    #[test]
    fn zeroed_snapshot_matches_new_table() {
        assert_eq!(TableSnapshot::zeroed(dims()), RuleTable::new(dims()).snapshot());
    }
}
