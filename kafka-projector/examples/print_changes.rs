//! Tails a compacted topic and prints every change event.
//!
//! Configuration comes from the environment; `KAFKA_CONSUMER_TOPIC` is
//! required, everything else has defaults:
//!
//! ```text
//! KAFKA_CONSUMER_TOPIC=settings cargo run --example print_changes
//! ```

use envconfig::Envconfig;

use kafka_projector::{CompactedTopicProjector, Config, KafkaLogSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::init_from_env()?;
    let source = KafkaLogSource::from_config(&config)?;
    let projector =
        CompactedTopicProjector::new(source).with_poll_timeout(config.poll_timeout());

    projector.set_key_decoder(|raw| std::str::from_utf8(raw).ok().map(str::to_owned));
    projector.set_value_decoder(|_key: &String, raw| {
        std::str::from_utf8(raw).ok().map(str::to_owned)
    });
    projector.set_event_handler(|event| println!("{event:?}"));
    projector.set_error_handler(|record| eprintln!("transport error: {:?}", record.error()));

    loop {
        projector.process_next();
    }
}
