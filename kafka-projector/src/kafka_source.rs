//! rdkafka-backed [`LogSource`].
//!
//! A single-topic `BaseConsumer` whose context drives the assignment
//! listener from librdkafka's rebalance callback, before the proposed
//! assignment is applied. Everything happens on the polling thread; the
//! consumer uses the default eager assignment protocol, so the full proposed
//! list arrives on every assign.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rdkafka::consumer::{BaseConsumer, Consumer, ConsumerContext};
use rdkafka::error::KafkaError;
use rdkafka::types::RDKafkaRespErr;
use rdkafka::{ClientConfig, ClientContext, Message, Offset, TopicPartitionList};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::source::{AssignmentListener, LogSource, SourceRecord};
use crate::types::{Partition, PartitionAssignment};

/// Partition number used when librdkafka reports an error it cannot
/// attribute to a partition.
pub const UNATTRIBUTED_PARTITION: i32 = -1;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("kafka error: {0}")]
    Kafka(#[from] KafkaError),
}

struct SourceContext {
    listener: Mutex<Option<AssignmentListener>>,
}

impl ClientContext for SourceContext {}

impl ConsumerContext for SourceContext {
    fn rebalance(
        &self,
        base_consumer: &BaseConsumer<Self>,
        err: RDKafkaRespErr,
        tpl: &mut TopicPartitionList,
    ) {
        match err {
            RDKafkaRespErr::RD_KAFKA_RESP_ERR__ASSIGN_PARTITIONS => {
                let resolved = self.resolve_assignment(tpl);
                info!(partitions = resolved.count(), "assigning partitions");
                if let Err(e) = base_consumer.assign(&resolved) {
                    error!(error = %e, "failed to apply partition assignment");
                }
            }
            RDKafkaRespErr::RD_KAFKA_RESP_ERR__REVOKE_PARTITIONS => {
                info!(partitions = tpl.count(), "revoking partitions");
                if let Err(e) = base_consumer.unassign() {
                    error!(error = %e, "failed to revoke partition assignment");
                }
            }
            _ => {
                error!(err = ?err, "rebalance error");
                if let Err(e) = base_consumer.unassign() {
                    error!(error = %e, "failed to revoke partition assignment");
                }
            }
        }
    }
}

impl SourceContext {
    /// Run the installed listener over the proposed assignment and fold any
    /// pinned resume offsets back into a list ready for `assign`. Entries the
    /// listener leaves alone keep librdkafka's proposed offset.
    fn resolve_assignment(&self, proposed: &TopicPartitionList) -> TopicPartitionList {
        let mut proposed_offsets: HashMap<Partition, Offset> = HashMap::new();
        let mut assignment: Vec<PartitionAssignment> = Vec::with_capacity(proposed.count());
        for elem in proposed.elements() {
            let partition = Partition::new(elem.topic().to_string(), elem.partition());
            proposed_offsets.insert(partition.clone(), elem.offset());
            let resume = match elem.offset() {
                Offset::Offset(offset) => Some(offset),
                _ => None,
            };
            assignment.push(PartitionAssignment::new(partition, resume));
        }

        if let Some(listener) = self.listener.lock().as_mut() {
            listener(&mut assignment);
        }

        let mut resolved = TopicPartitionList::with_capacity(assignment.len());
        for entry in &assignment {
            let fallback = proposed_offsets
                .get(entry.partition())
                .copied()
                .unwrap_or(Offset::Invalid);
            let offset = entry.resume_offset().map(Offset::Offset).unwrap_or(fallback);
            if let Err(e) =
                resolved.add_partition_offset(entry.topic(), entry.partition_number(), offset)
            {
                error!(
                    topic = entry.topic(),
                    partition = entry.partition_number(),
                    error = %e,
                    "failed to add partition to assignment"
                );
            }
        }
        resolved
    }
}

/// Single-topic Kafka consumer exposed as a [`LogSource`].
pub struct KafkaLogSource {
    consumer: BaseConsumer<SourceContext>,
    topic: String,
}

impl KafkaLogSource {
    pub fn from_config(config: &Config) -> Result<Arc<Self>, SourceError> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.kafka_hosts)
            .set("group.id", &config.kafka_consumer_group)
            .set("auto.offset.reset", &config.kafka_consumer_offset_reset)
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set(
                "enable.partition.eof",
                config.emit_partition_eof.to_string(),
            );

        if config.kafka_tls {
            client_config
                .set("security.protocol", "ssl")
                .set("enable.ssl.certificate.verification", "false");
        }

        let context = SourceContext {
            listener: Mutex::new(None),
        };
        let consumer: BaseConsumer<SourceContext> = client_config.create_with_context(context)?;
        consumer.subscribe(&[config.kafka_consumer_topic.as_str()])?;

        Ok(Arc::new(Self {
            consumer,
            topic: config.kafka_consumer_topic.clone(),
        }))
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl LogSource for KafkaLogSource {
    fn poll(&self, timeout: Duration) -> Option<SourceRecord> {
        match self.consumer.poll(timeout)? {
            Ok(message) => Some(SourceRecord::message(
                Partition::new(message.topic().to_string(), message.partition()),
                message.offset(),
                message.key().unwrap_or_default().to_vec(),
                message.payload().unwrap_or_default().to_vec(),
            )),
            Err(KafkaError::PartitionEOF(partition)) => {
                Some(SourceRecord::eof(Partition::new(self.topic.clone(), partition)))
            }
            Err(error) => {
                warn!(error = %error, "consumer poll returned error");
                Some(SourceRecord::failed(
                    Partition::new(self.topic.clone(), UNATTRIBUTED_PARTITION),
                    error,
                ))
            }
        }
    }

    fn take_assignment_listener(&self) -> Option<AssignmentListener> {
        self.consumer.context().listener.lock().take()
    }

    fn set_assignment_listener(&self, listener: Option<AssignmentListener>) {
        *self.consumer.context().listener.lock() = listener;
    }
}
