use std::time::Duration;

use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(default = "localhost:9092")]
    pub kafka_hosts: String,

    #[envconfig(default = "kafka-projector")]
    pub kafka_consumer_group: String,

    pub kafka_consumer_topic: String,

    // We default to "earliest": a projector that misses the head of a
    // compacted topic would silently drop live keys.
    #[envconfig(default = "earliest")]
    pub kafka_consumer_offset_reset: String, // earliest, latest

    #[envconfig(default = "false")]
    pub kafka_tls: bool,

    // Surfacing partition EOF is what turns "caught up" into an observable
    // ReachedEof event; disable only if the downstream never waits for it.
    #[envconfig(default = "true")]
    pub emit_partition_eof: bool,

    #[envconfig(default = "1000")]
    pub poll_timeout_ms: u64,
}

impl Config {
    /// Programmatic construction for embedding; env-based `init_from_env` is
    /// the service path.
    pub fn for_topic(kafka_hosts: &str, consumer_group: &str, topic: &str) -> Self {
        Self {
            kafka_hosts: kafka_hosts.to_string(),
            kafka_consumer_group: consumer_group.to_string(),
            kafka_consumer_topic: topic.to_string(),
            kafka_consumer_offset_reset: "earliest".to_string(),
            kafka_tls: false,
            emit_partition_eof: true,
            poll_timeout_ms: 1000,
        }
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_topic_defaults() {
        let config = Config::for_topic("localhost:9092", "projector-group", "settings");

        assert_eq!(config.kafka_consumer_topic, "settings");
        assert_eq!(config.kafka_consumer_offset_reset, "earliest");
        assert!(config.emit_partition_eof);
        assert!(!config.kafka_tls);
        assert_eq!(config.poll_timeout(), Duration::from_millis(1000));
    }
}
