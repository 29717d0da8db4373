//! End-to-end scenarios for the projector against a scripted source:
//! compaction semantics, offset bookkeeping, and rebalance behavior.

use std::sync::Arc;

use parking_lot::Mutex;

use kafka_projector::test_utils::{test_partition, utf8_key, utf8_value, ScriptedSource};
use kafka_projector::{ChangeEvent, CompactedTopicProjector, Partition};

type Events = Arc<Mutex<Vec<ChangeEvent<String, String>>>>;

fn setup() -> (
    Arc<ScriptedSource>,
    CompactedTopicProjector<String, String, ScriptedSource>,
    Events,
) {
    let source = Arc::new(ScriptedSource::new());
    let projector = CompactedTopicProjector::new(Arc::clone(&source));
    projector.set_key_decoder(utf8_key);
    projector.set_value_decoder(utf8_value);

    let events: Events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    projector.set_event_handler(move |event| sink.lock().push(event));

    (source, projector, events)
}

fn drain(projector: &CompactedTopicProjector<String, String, ScriptedSource>, steps: usize) {
    for _ in 0..steps {
        projector.process_next();
    }
}

#[test]
fn set_then_tombstone_yields_set_and_delete() {
    let (source, projector, events) = setup();
    let partition_a = test_partition("settings", 0);

    source.push_message("settings", 0, 0, b"k1", b"v1");
    source.push_message("settings", 0, 1, b"k1", b"");
    drain(&projector, 2);

    assert_eq!(
        *events.lock(),
        vec![
            ChangeEvent::SetElement {
                partition: partition_a.clone(),
                key: "k1".to_string(),
                value: "v1".to_string(),
            },
            ChangeEvent::DeleteElement {
                partition: partition_a.clone(),
                key: "k1".to_string(),
            },
        ]
    );
    assert_eq!(projector.last_seen_offset(&partition_a), Some(1));
    assert_eq!(projector.tracked_partition_count(), 1);
}

#[test]
fn undecodable_key_yields_no_event_but_advances_offset() {
    let (source, projector, events) = setup();
    let partition = test_partition("settings", 3);

    source.push_message("settings", 3, 12, &[0xff, 0xfe], b"v1");
    drain(&projector, 1);

    assert!(events.lock().is_empty());
    assert_eq!(projector.last_seen_offset(&partition), Some(12));
}

#[test]
fn tracked_offsets_are_monotonic_under_redelivery() {
    let (source, projector, _events) = setup();
    let partition = test_partition("settings", 0);

    source.push_message("settings", 0, 10, b"k1", b"v1");
    source.push_message("settings", 0, 11, b"k1", b"v2");
    source.push_message("settings", 0, 10, b"k1", b"v1");
    drain(&projector, 3);

    assert_eq!(projector.last_seen_offset(&partition), Some(11));
}

#[test]
fn eof_emits_event_and_leaves_tracker_untouched() {
    let (source, projector, events) = setup();
    let partition = test_partition("settings", 0);

    source.push_message("settings", 0, 5, b"k1", b"v1");
    source.push_eof("settings", 0);
    drain(&projector, 2);

    let events = events.lock();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[1],
        ChangeEvent::ReachedEof {
            partition: partition.clone(),
        }
    );
    assert_eq!(projector.last_seen_offset(&partition), Some(5));
}

#[test]
fn eof_on_untracked_partition_does_not_create_entry() {
    let (source, projector, events) = setup();

    source.push_eof("settings", 4);
    drain(&projector, 1);

    assert_eq!(events.lock().len(), 1);
    assert_eq!(projector.tracked_partition_count(), 0);
}

#[test]
fn reassignment_resumes_strictly_after_last_seen_offset() {
    let (source, projector, _events) = setup();

    source.push_message("settings", 0, 1, b"k1", b"v1");
    drain(&projector, 1);

    let assignment = source.rebalance(vec![
        test_partition("settings", 0),
        test_partition("settings", 1),
    ]);

    // Tracked partition resumes after the last seen offset; the untracked
    // one keeps the source's default policy.
    assert_eq!(assignment[0].resume_offset(), Some(2));
    assert_eq!(assignment[1].resume_offset(), None);
}

#[test]
fn revoking_tracked_partition_clears_it_exactly_once() {
    let (source, projector, events) = setup();
    let partition_a = test_partition("settings", 0);
    let partition_b = test_partition("settings", 1);

    source.push_message("settings", 0, 3, b"k1", b"v1");
    source.push_message("settings", 1, 8, b"k2", b"v2");
    drain(&projector, 2);
    events.lock().clear();

    let assignment = source.rebalance(vec![partition_b.clone()]);
    assert_eq!(assignment[0].resume_offset(), Some(9));

    assert_eq!(
        *events.lock(),
        vec![ChangeEvent::ClearElements {
            partition: partition_a.clone(),
        }]
    );
    assert_eq!(projector.last_seen_offset(&partition_a), None);
    assert_eq!(projector.last_seen_offset(&partition_b), Some(8));

    // A second identical assignment has nothing left to clear.
    events.lock().clear();
    source.rebalance(vec![partition_b.clone()]);
    assert!(events.lock().is_empty());
}

#[test]
fn revoking_untracked_partition_emits_nothing() {
    let (source, projector, events) = setup();
    let partition_a = test_partition("settings", 0);

    // B was assigned but never delivered a record, so it is not tracked.
    source.push_message("settings", 0, 1, b"k1", b"v1");
    drain(&projector, 1);
    events.lock().clear();

    let assignment = source.rebalance(vec![partition_a.clone()]);

    assert!(events.lock().is_empty());
    assert_eq!(assignment[0].resume_offset(), Some(2));
    assert_eq!(projector.tracked_partition_count(), 1);
}

#[test]
fn losing_every_partition_clears_in_deterministic_order() {
    let (source, projector, events) = setup();

    source.push_message("settings", 2, 1, b"k1", b"v1");
    source.push_message("settings", 0, 2, b"k2", b"v2");
    source.push_message("settings", 1, 3, b"k3", b"v3");
    drain(&projector, 3);
    events.lock().clear();

    source.rebalance(Vec::<Partition>::new());

    let cleared: Vec<i32> = events
        .lock()
        .iter()
        .map(|event| event.partition_number())
        .collect();
    assert_eq!(cleared, vec![0, 1, 2]);
    assert_eq!(projector.tracked_partition_count(), 0);
}

#[test]
fn full_lifecycle_across_two_rebalances() {
    let (source, projector, events) = setup();
    let partition_a = test_partition("settings", 0);
    let partition_b = test_partition("settings", 1);

    source.rebalance(vec![partition_a.clone(), partition_b.clone()]);

    source.push_message("settings", 0, 0, b"k1", b"v1");
    source.push_message("settings", 0, 1, b"k1", b"");
    source.push_message("settings", 1, 0, b"k2", b"v2");
    drain(&projector, 3);

    // Partition B moves away, A stays.
    let assignment = source.rebalance(vec![partition_a.clone()]);
    assert_eq!(assignment[0].resume_offset(), Some(2));

    assert_eq!(
        *events.lock(),
        vec![
            ChangeEvent::SetElement {
                partition: partition_a.clone(),
                key: "k1".to_string(),
                value: "v1".to_string(),
            },
            ChangeEvent::DeleteElement {
                partition: partition_a.clone(),
                key: "k1".to_string(),
            },
            ChangeEvent::SetElement {
                partition: partition_b.clone(),
                key: "k2".to_string(),
                value: "v2".to_string(),
            },
            ChangeEvent::ClearElements {
                partition: partition_b.clone(),
            },
        ]
    );
    assert_eq!(projector.tracked_partition_count(), 1);
}
