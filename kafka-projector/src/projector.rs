//! Single-step projection of a compacted topic into change events.
//!
//! One [`CompactedTopicProjector::process_next`] call is one
//! poll-decode-classify-emit cycle; the caller owns the loop. The projector
//! holds no decoded state of its own, only the per-partition last-seen
//! offsets it needs to resume without re-delivery after a rebalance.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::event::ChangeEvent;
use crate::metrics_consts::{
    EVENTS_EMITTED, KEY_DECODE_FAILURES, PARTITIONS_CLEARED, TRANSPORT_ERRORS,
    VALUE_DECODE_FAILURES,
};
use crate::offset_tracker::OffsetTracker;
use crate::source::{AssignmentListener, LogSource, SourceRecord};
use crate::types::{Partition, PartitionAssignment};

const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);

pub type KeyDecoder<K> = Box<dyn FnMut(&[u8]) -> Option<K> + Send>;
pub type ValueDecoder<K, V> = Box<dyn FnMut(&K, &[u8]) -> Option<V> + Send>;
pub type EventHandler<K, V> = Box<dyn FnMut(ChangeEvent<K, V>) + Send>;
pub type ErrorHandler = Box<dyn FnMut(SourceRecord) + Send>;

/// Projects a compacted topic from a [`LogSource`] into [`ChangeEvent`]s.
///
/// Construction installs the projector into the source's assignment-listener
/// slot, chaining whatever listener was there before; dropping the projector
/// puts the previous listener back. The source is referenced, never owned:
/// the projector does not close or otherwise reconfigure it.
///
/// Everything runs on the caller's thread. Decoders and handlers are invoked
/// with the projector's internal lock held and must not call back into the
/// projector or drive another step.
pub struct CompactedTopicProjector<K, V, S: LogSource> {
    source: Arc<S>,
    poll_timeout: Duration,
    shared: Arc<Mutex<Shared<K, V>>>,
}

/// State reachable from both the projector handle and the assignment
/// listener installed on the source.
struct Shared<K, V> {
    key_decoder: Option<KeyDecoder<K>>,
    value_decoder: Option<ValueDecoder<K, V>>,
    event_handler: Option<EventHandler<K, V>>,
    error_handler: Option<ErrorHandler>,
    offsets: OffsetTracker,
    chained_listener: Option<AssignmentListener>,
}

impl<K, V, S> CompactedTopicProjector<K, V, S>
where
    K: 'static,
    V: 'static,
    S: LogSource,
{
    pub fn new(source: Arc<S>) -> Self {
        let shared = Arc::new(Mutex::new(Shared {
            key_decoder: None,
            value_decoder: None,
            event_handler: None,
            error_handler: None,
            offsets: OffsetTracker::new(),
            chained_listener: source.take_assignment_listener(),
        }));

        let hook = Arc::clone(&shared);
        source.set_assignment_listener(Some(Box::new(move |assignment| {
            Shared::on_assignment(&hook, assignment);
        })));

        Self {
            source,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            shared,
        }
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn set_key_decoder(&self, decoder: impl FnMut(&[u8]) -> Option<K> + Send + 'static) {
        self.shared.lock().key_decoder = Some(Box::new(decoder));
    }

    pub fn set_value_decoder(&self, decoder: impl FnMut(&K, &[u8]) -> Option<V> + Send + 'static) {
        self.shared.lock().value_decoder = Some(Box::new(decoder));
    }

    pub fn set_event_handler(&self, handler: impl FnMut(ChangeEvent<K, V>) + Send + 'static) {
        self.shared.lock().event_handler = Some(Box::new(handler));
    }

    pub fn set_error_handler(&self, handler: impl FnMut(SourceRecord) + Send + 'static) {
        self.shared.lock().error_handler = Some(Box::new(handler));
    }

    /// Run one poll-decode-classify-emit cycle.
    ///
    /// Blocks for at most the configured poll timeout; returns with no
    /// effect when nothing is available. Rebalances surface during the poll,
    /// synchronously on this thread.
    pub fn process_next(&self) {
        // The lock is taken only after the poll returns: the assignment
        // listener fires from inside poll() and takes the same lock.
        let Some(record) = self.source.poll(self.poll_timeout) else {
            return;
        };
        self.shared.lock().handle_record(record);
    }

    /// Last offset seen for `partition`, if it is currently tracked.
    pub fn last_seen_offset(&self, partition: &Partition) -> Option<i64> {
        self.shared.lock().offsets.last_seen(partition)
    }

    pub fn tracked_partition_count(&self) -> usize {
        self.shared.lock().offsets.partition_count()
    }
}

impl<K, V, S: LogSource> Drop for CompactedTopicProjector<K, V, S> {
    fn drop(&mut self) {
        let chained = self.shared.lock().chained_listener.take();
        self.source.set_assignment_listener(chained);
    }
}

impl<K, V> Shared<K, V> {
    fn handle_record(&mut self, record: SourceRecord) {
        if let Some(error) = record.error() {
            // Transport conditions never touch the offset tracker.
            if record.is_eof() {
                debug!(
                    topic = record.topic(),
                    partition = record.partition_number(),
                    "reached end of partition"
                );
                self.emit(ChangeEvent::ReachedEof {
                    partition: record.partition().clone(),
                });
            } else {
                warn!(error = ?error, "transport error from log source");
                let taken = self.error_handler.is_some();
                metrics::counter!(
                    TRANSPORT_ERRORS,
                    "outcome" => if taken { "handled" } else { "dropped" }
                )
                .increment(1);
                if let Some(handler) = self.error_handler.as_mut() {
                    handler(record);
                }
            }
            return;
        }

        let partition = record.partition().clone();
        let offset = record.offset();

        let key = match self.key_decoder.as_mut() {
            Some(decoder) => decoder(record.key()),
            None => None,
        };
        match key {
            Some(key) => {
                if record.is_tombstone() {
                    self.emit(ChangeEvent::DeleteElement {
                        partition: partition.clone(),
                        key,
                    });
                } else {
                    let value = match self.value_decoder.as_mut() {
                        Some(decoder) => decoder(&key, record.payload()),
                        None => None,
                    };
                    match value {
                        Some(value) => self.emit(ChangeEvent::SetElement {
                            partition: partition.clone(),
                            key,
                            value,
                        }),
                        None => {
                            debug!(
                                topic = partition.topic(),
                                partition = partition.partition_number(),
                                offset,
                                "value did not decode, suppressing event"
                            );
                            metrics::counter!(VALUE_DECODE_FAILURES).increment(1);
                        }
                    }
                }
            }
            None => {
                debug!(
                    topic = partition.topic(),
                    partition = partition.partition_number(),
                    offset,
                    "key did not decode, suppressing event"
                );
                metrics::counter!(KEY_DECODE_FAILURES).increment(1);
            }
        }

        // Offset bookkeeping is unconditional on the no-transport-error path,
        // so undecodable records cannot stall resumption.
        self.offsets.advance(&partition, offset);
    }

    fn emit(&mut self, event: ChangeEvent<K, V>) {
        metrics::counter!(EVENTS_EMITTED, "kind" => event.kind()).increment(1);
        if let Some(handler) = self.event_handler.as_mut() {
            handler(event);
        }
    }

    fn on_assignment(shared: &Mutex<Shared<K, V>>, assignment: &mut Vec<PartitionAssignment>) {
        // The listener that was installed before us sees the assignment
        // first, unmodified.
        let chained = shared.lock().chained_listener.take();
        if let Some(mut chained) = chained {
            chained(assignment);
            shared.lock().chained_listener = Some(chained);
        }

        let mut guard = shared.lock();

        let mut resumed = 0usize;
        for entry in assignment.iter_mut() {
            if let Some(last_seen) = guard.offsets.last_seen(entry.partition()) {
                // Resume strictly after the last record we saw; re-polling it
                // would re-deliver a change the downstream already applied.
                entry.set_resume_offset(last_seen + 1);
                resumed += 1;
            }
        }

        let assigned: HashSet<Partition> = assignment
            .iter()
            .map(|entry| entry.partition().clone())
            .collect();

        // Entries leave the tracker before any clear event goes out: a
        // panicking handler must not leave stale partitions tracked.
        let dropped = guard.offsets.retain_assigned(&assigned);

        info!(
            assigned = assignment.len(),
            resumed,
            cleared = dropped.len(),
            "partition assignment changed"
        );
        if !dropped.is_empty() {
            metrics::counter!(PARTITIONS_CLEARED).increment(dropped.len() as u64);
        }

        for partition in dropped {
            guard.emit(ChangeEvent::ClearElements { partition });
        }
    }
}
