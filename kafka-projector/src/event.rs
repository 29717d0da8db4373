use crate::types::Partition;

/// A change observed on a compacted topic.
///
/// `SetElement` and `DeleteElement` carry a key, and only `SetElement`
/// carries a value; `key()` and `value()` return `None` on every other
/// variant rather than panicking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent<K, V> {
    /// The latest record for `key` is `value`.
    SetElement {
        partition: Partition,
        key: K,
        value: V,
    },
    /// A tombstone was read for `key`; the key is gone.
    DeleteElement { partition: Partition, key: K },
    /// The partition moved to another consumer; cached state derived from it
    /// is no longer authoritative.
    ClearElements { partition: Partition },
    /// The consumer caught up to the end of the partition.
    ReachedEof { partition: Partition },
}

impl<K, V> ChangeEvent<K, V> {
    pub fn partition(&self) -> &Partition {
        match self {
            ChangeEvent::SetElement { partition, .. }
            | ChangeEvent::DeleteElement { partition, .. }
            | ChangeEvent::ClearElements { partition }
            | ChangeEvent::ReachedEof { partition } => partition,
        }
    }

    pub fn topic(&self) -> &str {
        self.partition().topic()
    }

    pub fn partition_number(&self) -> i32 {
        self.partition().partition_number()
    }

    pub fn key(&self) -> Option<&K> {
        match self {
            ChangeEvent::SetElement { key, .. } | ChangeEvent::DeleteElement { key, .. } => {
                Some(key)
            }
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&V> {
        match self {
            ChangeEvent::SetElement { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Stable label for metrics.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::SetElement { .. } => "set",
            ChangeEvent::DeleteElement { .. } => "delete",
            ChangeEvent::ClearElements { .. } => "clear",
            ChangeEvent::ReachedEof { .. } => "eof",
        }
    }
}
