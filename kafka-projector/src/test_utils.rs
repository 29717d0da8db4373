//! Scripted in-memory [`LogSource`] for unit and scenario tests.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use rdkafka::error::KafkaError;
use rdkafka::types::RDKafkaErrorCode;

use crate::source::{AssignmentListener, LogSource, SourceRecord};
use crate::types::{Partition, PartitionAssignment};

pub fn test_partition(topic: &str, partition_number: i32) -> Partition {
    Partition::new(topic.to_string(), partition_number)
}

/// UTF-8 decoders used by most tests.
pub fn utf8_key(raw: &[u8]) -> Option<String> {
    std::str::from_utf8(raw).ok().map(str::to_owned)
}

pub fn utf8_value(_key: &String, raw: &[u8]) -> Option<String> {
    std::str::from_utf8(raw).ok().map(str::to_owned)
}

/// A [`LogSource`] fed from a queue of records scripted by the test.
///
/// `rebalance` plays the broker's role: it invokes the installed assignment
/// listener with a mutable proposed list and hands back whatever the
/// listener left in it.
#[derive(Default)]
pub struct ScriptedSource {
    records: Mutex<VecDeque<SourceRecord>>,
    listener: Mutex<Option<AssignmentListener>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: SourceRecord) {
        self.records.lock().push_back(record);
    }

    pub fn push_message(&self, topic: &str, partition: i32, offset: i64, key: &[u8], payload: &[u8]) {
        self.push(SourceRecord::message(
            test_partition(topic, partition),
            offset,
            key.to_vec(),
            payload.to_vec(),
        ));
    }

    pub fn push_eof(&self, topic: &str, partition: i32) {
        self.push(SourceRecord::eof(test_partition(topic, partition)));
    }

    pub fn push_transport_error(&self, topic: &str) {
        self.push(SourceRecord::failed(
            test_partition(topic, -1),
            KafkaError::MessageConsumption(RDKafkaErrorCode::BrokerTransportFailure),
        ));
    }

    /// Propose a new assignment the way the broker would, returning the list
    /// as the listener left it.
    pub fn rebalance(&self, partitions: Vec<Partition>) -> Vec<PartitionAssignment> {
        let mut assignment: Vec<PartitionAssignment> = partitions
            .into_iter()
            .map(|partition| PartitionAssignment::new(partition, None))
            .collect();
        if let Some(listener) = self.listener.lock().as_mut() {
            listener(&mut assignment);
        }
        assignment
    }

    pub fn has_listener(&self) -> bool {
        self.listener.lock().is_some()
    }
}

impl LogSource for ScriptedSource {
    fn poll(&self, _timeout: Duration) -> Option<SourceRecord> {
        self.records.lock().pop_front()
    }

    fn take_assignment_listener(&self) -> Option<AssignmentListener> {
        self.listener.lock().take()
    }

    fn set_assignment_listener(&self, listener: Option<AssignmentListener>) {
        *self.listener.lock() = listener;
    }
}
