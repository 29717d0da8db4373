//! Turns a compacted Kafka topic into a stream of discrete change events.
//!
//! Compacted-topic semantics (latest value per key wins, empty payload
//! deletes) make naive polling insufficient: getting resumption after a
//! rebalance or the invalidation of moved partitions subtly wrong silently
//! rots downstream state. This crate keeps that logic in one place: a
//! [`CompactedTopicProjector`] polls a [`LogSource`] one record at a time,
//! decodes keys and values through caller-supplied functions, and emits
//! [`ChangeEvent`]s for an external state holder to apply. It stores no
//! decoded data itself, only per-partition last-seen offsets.
//!
//! [`KafkaLogSource`] is the production source over rdkafka; tests script
//! their own via [`test_utils::ScriptedSource`].

pub mod config;
pub mod event;
pub mod kafka_source;
pub mod metrics_consts;
pub mod offset_tracker;
pub mod projector;
pub mod source;
pub mod test_utils;
pub mod types;

pub use config::Config;
pub use event::ChangeEvent;
pub use kafka_source::{KafkaLogSource, SourceError};
pub use projector::CompactedTopicProjector;
pub use source::{AssignmentListener, LogSource, SourceRecord};
pub use types::{Partition, PartitionAssignment};
