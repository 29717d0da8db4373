// ==== Projector metrics ====
/// Counter for change events computed, labelled by event kind
pub const EVENTS_EMITTED: &str = "kafka_projector_events_emitted_total";

/// Counter for records whose key failed to decode
pub const KEY_DECODE_FAILURES: &str = "kafka_projector_key_decode_failures_total";

/// Counter for records whose value failed to decode
pub const VALUE_DECODE_FAILURES: &str = "kafka_projector_value_decode_failures_total";

/// Counter for non-EOF transport errors, labelled by whether a handler took them
pub const TRANSPORT_ERRORS: &str = "kafka_projector_transport_errors_total";

/// Counter for tracked partitions cleared at rebalance
pub const PARTITIONS_CLEARED: &str = "kafka_projector_partitions_cleared_total";
