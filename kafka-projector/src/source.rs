//! The seam between the projector and whatever feeds it records.
//!
//! The projector never owns the broker connection; it drives a [`LogSource`]
//! by reference and installs itself into the source's single
//! assignment-listener slot.

use std::time::Duration;

use rdkafka::error::KafkaError;

use crate::types::{Partition, PartitionAssignment};

/// Callback invoked with the mutable proposed assignment whenever the
/// source's partition assignment changes. Entries may be given an explicit
/// resume offset before the assignment is applied.
pub type AssignmentListener = Box<dyn FnMut(&mut Vec<PartitionAssignment>) + Send>;

/// A single polled record.
///
/// An empty payload marks a tombstone. A populated `error` slot means the
/// record carries a transport-level condition instead of data;
/// `KafkaError::PartitionEOF` is the end-of-partition flag.
#[derive(Debug)]
pub struct SourceRecord {
    partition: Partition,
    offset: i64,
    key: Vec<u8>,
    payload: Vec<u8>,
    error: Option<KafkaError>,
}

impl SourceRecord {
    pub fn message(partition: Partition, offset: i64, key: Vec<u8>, payload: Vec<u8>) -> Self {
        Self {
            partition,
            offset,
            key,
            payload,
            error: None,
        }
    }

    pub fn eof(partition: Partition) -> Self {
        let error = KafkaError::PartitionEOF(partition.partition_number());
        Self::failed(partition, error)
    }

    pub fn failed(partition: Partition, error: KafkaError) -> Self {
        Self {
            partition,
            offset: -1,
            key: Vec::new(),
            payload: Vec::new(),
            error: Some(error),
        }
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn topic(&self) -> &str {
        self.partition.topic()
    }

    pub fn partition_number(&self) -> i32 {
        self.partition.partition_number()
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn is_tombstone(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn error(&self) -> Option<&KafkaError> {
        self.error.as_ref()
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.error, Some(KafkaError::PartitionEOF(_)))
    }
}

/// Contract the projector consumes: a bounded-wait poll plus one swappable
/// assignment-listener slot.
///
/// Implementations must invoke the installed listener synchronously, on the
/// polling thread, with the proposed assignment whenever it changes, and must
/// honor resume offsets the listener pins on individual entries.
pub trait LogSource {
    /// Poll for the next record, waiting at most `timeout`. `None` means
    /// nothing was available.
    fn poll(&self, timeout: Duration) -> Option<SourceRecord>;

    /// Remove and return the currently installed assignment listener.
    fn take_assignment_listener(&self) -> Option<AssignmentListener>;

    /// Install `listener` (or clear the slot with `None`), replacing whatever
    /// was there.
    fn set_assignment_listener(&self, listener: Option<AssignmentListener>);
}
