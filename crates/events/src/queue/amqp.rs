//! AMQP 0.9.1 broker backed by `lapin`.

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
    BasicQosOptions, ConfirmSelectOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer};

use crate::queue::broker::{Broker, BrokerChannel};
use crate::queue::error::QueueError;
use crate::queue::message::{QueueMessage, CONTENT_TYPE_JSON};

/// AMQP reply code for a normal close.
const REPLY_SUCCESS: u16 = 200;

/// Delivery mode 2 asks the broker to write the message to disk.
const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// Consumer tag prefix; the process id is appended.
const CONSUMER_TAG_PREFIX: &str = "ordercast";

/// Opens AMQP connections to a fixed URL.
#[derive(Debug, Clone)]
pub struct AmqpBroker {
    url: String,
}

impl AmqpBroker {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Broker for AmqpBroker {
    type Channel = AmqpChannel;

    async fn connect(&self) -> Result<AmqpChannel, QueueError> {
        let connection = Connection::connect(&self.url, ConnectionProperties::default()).await?;

        let channel = match connection.create_channel().await {
            Ok(channel) => channel,
            Err(e) => {
                let _ = connection.close(REPLY_SUCCESS, "channel open failed").await;
                return Err(e.into());
            }
        };

        // Publisher confirms let `publish` wait for the broker to take the
        // message instead of returning once it is buffered locally.
        if let Err(e) = channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
        {
            let _ = connection.close(REPLY_SUCCESS, "confirm select failed").await;
            return Err(e.into());
        }

        tracing::info!("Connected to AMQP broker");

        Ok(AmqpChannel {
            connection,
            channel,
            consumer: None,
            closed: false,
        })
    }
}

/// A `lapin` connection with its single channel.
pub struct AmqpChannel {
    connection: Connection,
    channel: Channel,
    consumer: Option<Consumer>,
    closed: bool,
}

#[async_trait]
impl BrokerChannel for AmqpChannel {
    async fn declare_queue(&mut self, queue: &str) -> Result<(), QueueError> {
        let options = QueueDeclareOptions {
            durable: true,
            exclusive: false,
            auto_delete: false,
            ..Default::default()
        };
        self.channel
            .queue_declare(queue, options, FieldTable::default())
            .await?;
        tracing::debug!(queue, "Declared durable queue");
        Ok(())
    }

    async fn set_prefetch(&mut self, count: u16) -> Result<(), QueueError> {
        self.channel
            .basic_qos(count, BasicQosOptions::default())
            .await?;
        Ok(())
    }

    async fn publish(&mut self, queue: &str, payload: &[u8]) -> Result<(), QueueError> {
        let properties = BasicProperties::default()
            .with_content_type(CONTENT_TYPE_JSON.into())
            .with_delivery_mode(DELIVERY_MODE_PERSISTENT)
            .with_timestamp(Utc::now().timestamp().max(0) as u64);

        let confirm = self
            .channel
            .basic_publish("", queue, BasicPublishOptions::default(), payload, properties)
            .await?
            .await?;

        if confirm.is_nack() {
            return Err(QueueError::Transport(format!(
                "Broker rejected message for queue '{queue}'"
            )));
        }
        Ok(())
    }

    async fn consume(&mut self, queue: &str) -> Result<(), QueueError> {
        let tag = format!("{CONSUMER_TAG_PREFIX}-{}", std::process::id());
        let consumer = self
            .channel
            .basic_consume(
                queue,
                &tag,
                BasicConsumeOptions {
                    no_ack: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        self.consumer = Some(consumer);
        Ok(())
    }

    async fn next_message(&mut self) -> Result<QueueMessage, QueueError> {
        let consumer = self
            .consumer
            .as_mut()
            .ok_or_else(|| QueueError::Transport("No active subscription".to_string()))?;

        match consumer.next().await {
            Some(Ok(delivery)) => Ok(QueueMessage {
                payload: delivery.data,
                delivery_tag: delivery.delivery_tag,
                redelivered: delivery.redelivered,
            }),
            Some(Err(e)) => Err(e.into()),
            None => Err(QueueError::Transport(
                "Subscription closed by broker".to_string(),
            )),
        }
    }

    async fn ack(&mut self, delivery_tag: u64) -> Result<(), QueueError> {
        self.channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await?;
        Ok(())
    }

    async fn requeue(&mut self, delivery_tag: u64) -> Result<(), QueueError> {
        self.channel
            .basic_nack(
                delivery_tag,
                BasicNackOptions {
                    multiple: false,
                    requeue: true,
                },
            )
            .await?;
        Ok(())
    }

    async fn reject(&mut self, delivery_tag: u64) -> Result<(), QueueError> {
        self.channel
            .basic_nack(
                delivery_tag,
                BasicNackOptions {
                    multiple: false,
                    requeue: false,
                },
            )
            .await?;
        Ok(())
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.consumer = None;

        if let Err(e) = self.channel.close(REPLY_SUCCESS, "closing").await {
            tracing::debug!(error = %e, "AMQP channel close failed");
        }
        if let Err(e) = self.connection.close(REPLY_SUCCESS, "closing").await {
            tracing::debug!(error = %e, "AMQP connection close failed");
        }
        tracing::info!("Closed AMQP connection");
    }
}
