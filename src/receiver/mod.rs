mod ack;
mod body;
mod error;
mod signature;

use std::{sync::Arc, time::Duration};
use async_trait::async_trait;
use lambda_runtime::tracing::{debug, warn};
use serde_json::{Map, Value};
use tokio::sync::oneshot;
use crate::utils::http::HttpRequest;

pub use self::ack::{render_ack_response, Acknowledger, EventEnvelope};
pub use self::body::parse_request_body;
pub use self::error::ReceiverError;
pub use self::signature::verify_request_signature;
use self::ack::is_truthy;

pub const ACK_TIMEOUT: Duration = Duration::from_millis(3001);
pub const ACK_TIMEOUT_MESSAGE: &str = "An incoming event was not acknowledged within 3 seconds. \
    Ensure that the ack() argument is called in a listener.";

pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Application side of the receiver: whatever consumes verified Slack events.
/// Implementations must call `ack` on the envelope exactly once.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    async fn process_event(&self, event: EventEnvelope) -> anyhow::Result<()>;
}

#[async_trait]
pub trait Receiver {
    fn init(&mut self, processor: Arc<dyn EventProcessor>);
    async fn start(&self) -> anyhow::Result<()>;
    async fn stop(&self) -> anyhow::Result<()>;
}

pub fn default_log_sink() -> LogSink {
    Arc::new(|message: &str| warn!("{}", message))
}

pub struct FunctionReceiver {
    signing_secret: String,
    log: LogSink,
    ack_timeout: Duration,
    processor: Option<Arc<dyn EventProcessor>>,
}

#[async_trait]
impl Receiver for FunctionReceiver {
    fn init(&mut self, processor: Arc<dyn EventProcessor>) {
        self.processor = Some(processor);
    }

    // nothing to bind, the function host owns the listener
    async fn start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl FunctionReceiver {
    pub fn new(signing_secret: impl Into<String>, log: LogSink) -> Self {
        FunctionReceiver {
            signing_secret: signing_secret.into(),
            log,
            ack_timeout: ACK_TIMEOUT,
            processor: None,
        }
    }

    pub fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.ack_timeout = ack_timeout;
        self
    }

    pub fn verify_signature_and_parse_body(&self, req: &HttpRequest) -> Result<Value, ReceiverError> {
        verify_request_signature(
            &self.signing_secret,
            &req.body,
            req.header("x-slack-signature"),
            req.header("x-slack-request-timestamp"),
        )?;

        parse_request_body(&req.body, req.header("content-type"))
    }

    pub async fn request_handler(&self, req: &HttpRequest) -> Result<String, ReceiverError> {
        let body = self.verify_signature_and_parse_body(req)?;

        if body.get("ssl_check").map_or(false, is_truthy) {
            return Ok(String::new());
        }

        if body.get("type").and_then(Value::as_str) == Some("url_verification") {
            let mut challenge = Map::new();
            if let Some(value) = body.get("challenge") {
                challenge.insert("challenge".to_string(), value.clone());
            }
            return Ok(Value::Object(challenge).to_string());
        }

        let Some(processor) = &self.processor else {
            warn!("No event processor registered, dropping event");
            return Ok(String::new());
        };

        let (ack, ack_rx) = Acknowledger::channel();
        let envelope = EventEnvelope { body, ack };

        // a failed processor ends the request even if an ack clone is still alive
        let processing = async {
            processor.process_event(envelope).await.map_err(ReceiverError::Processing)
        };
        let ((), response) = tokio::try_join!(processing, self.wait_for_ack(ack_rx))?;

        Ok(render_ack_response(response))
    }

    // Waits for the single ack. The timer only logs; it never ends the wait.
    async fn wait_for_ack(&self, mut ack_rx: oneshot::Receiver<Option<Value>>) -> Result<Option<Value>, ReceiverError> {
        let received = tokio::select! {
            received = &mut ack_rx => received,
            _ = tokio::time::sleep(self.ack_timeout) => {
                (self.log)(ACK_TIMEOUT_MESSAGE);
                ack_rx.await
            },
        };

        match received {
            Ok(response) => {
                debug!("Event acknowledged with {:?}", response);
                Ok(response)
            },
            Err(_) => {
                warn!("Event was dropped without being acknowledged");
                Ok(None)
            },
        }
    }
}
