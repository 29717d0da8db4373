//! Per-partition last-seen-offset map.
//!
//! This is the only state the projector keeps between steps. An entry is
//! created the first time a partition delivers a non-error record, advanced
//! on every later one, and removed when the partition is revoked. Offsets
//! never move backwards, so a late re-delivery cannot regress the resume
//! point handed out at the next rebalance.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::types::Partition;

#[derive(Debug, Default)]
pub struct OffsetTracker {
    last_seen: HashMap<Partition, i64>,
}

impl OffsetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `offset` as the latest seen for `partition`, creating the
    /// entry if this is the first record for it.
    pub fn advance(&mut self, partition: &Partition, offset: i64) {
        match self.last_seen.get_mut(partition) {
            Some(last) => {
                if offset < *last {
                    warn!(
                        topic = partition.topic(),
                        partition = partition.partition_number(),
                        last_seen = *last,
                        offset,
                        "ignoring offset behind last seen"
                    );
                } else {
                    *last = offset;
                }
            }
            None => {
                debug!(
                    topic = partition.topic(),
                    partition = partition.partition_number(),
                    offset,
                    "tracking new partition"
                );
                self.last_seen.insert(partition.clone(), offset);
            }
        }
    }

    pub fn last_seen(&self, partition: &Partition) -> Option<i64> {
        self.last_seen.get(partition).copied()
    }

    pub fn partition_count(&self) -> usize {
        self.last_seen.len()
    }

    /// Drop every tracked partition not present in `assigned`, returning the
    /// removed partitions ordered by topic then partition number.
    pub fn retain_assigned(&mut self, assigned: &HashSet<Partition>) -> Vec<Partition> {
        let mut dropped: Vec<Partition> = self
            .last_seen
            .keys()
            .filter(|partition| !assigned.contains(*partition))
            .cloned()
            .collect();
        dropped.sort();

        for partition in &dropped {
            self.last_seen.remove(partition);
        }
        dropped
    }
}
