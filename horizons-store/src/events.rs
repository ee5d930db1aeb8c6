use async_trait::async_trait;
use horizons_core::events::EventPublisher;
use horizons_core::StoreError;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::app_config::KafkaConfig;

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(config: &KafkaConfig) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .create()?;

        Ok(Self { producer })
    }

    pub async fn send(&self, topic: &str, key: &str, payload: &str) -> Result<(), KafkaError> {
        let record = FutureRecord::to(topic)
            .key(key)
            .payload(payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                info!("Sent message to {}/{}: partition {} offset {}", topic, key, delivery.partition, delivery.offset);
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(e)
            }
        }
    }

    /// Number of brokers answering a metadata request.
    pub async fn broker_count(&self, timeout: Duration) -> Result<usize, StoreError> {
        let producer = self.producer.clone();
        let count = tokio::task::spawn_blocking(move || {
            producer
                .client()
                .fetch_metadata(None, timeout)
                .map(|metadata| metadata.brokers().len())
        })
        .await??;
        Ok(count)
    }
}

#[async_trait]
impl EventPublisher for EventProducer {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), StoreError> {
        self.send(topic, key, payload).await?;
        Ok(())
    }
}

/// Creates the topics this service talks on, leaving existing ones untouched.
pub async fn declare_topics(config: &KafkaConfig, topics: &[&str]) -> Result<(), KafkaError> {
    let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
        .set("bootstrap.servers", &config.brokers)
        .create()?;

    let new_topics: Vec<NewTopic<'_>> = topics
        .iter()
        .map(|name| NewTopic::new(name, 1, TopicReplication::Fixed(1)))
        .collect();

    for result in admin.create_topics(&new_topics, &AdminOptions::new()).await? {
        match result {
            Ok(name) => info!("Declared topic {}", name),
            Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                info!("Topic {} already exists", name)
            }
            Err((name, code)) => warn!("Could not declare topic {}: {}", name, code),
        }
    }

    Ok(())
}

/// A consumed message, detached from the consumer's buffer.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub payload: Vec<u8>,
}

pub struct EventConsumer {
    consumer: StreamConsumer,
}

impl EventConsumer {
    /// Joins the consumer group `{group_id}.{name}` and subscribes to `topics`.
    pub fn subscribe(config: &KafkaConfig, name: &str, topics: &[&str]) -> Result<Self, KafkaError> {
        let group_id = format!("{}.{}", config.group_id, name);
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .create()?;

        consumer.subscribe(topics)?;
        info!("Consumer {} subscribed to {:?}", group_id, topics);

        Ok(Self { consumer })
    }

    /// Waits for the next message. Offsets are committed automatically.
    pub async fn next_message(&self) -> Result<InboundMessage, KafkaError> {
        let message = self.consumer.recv().await?;

        Ok(InboundMessage {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            key: message
                .key()
                .map(|k| String::from_utf8_lossy(k).into_owned()),
            payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        })
    }
}
