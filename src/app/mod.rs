mod slack_input;

use std::future::Future;
use std::sync::Arc;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use lambda_runtime::tracing::{debug, info};
use serde_json::{json, Value};
use crate::receiver::{EventEnvelope, EventProcessor};

pub use self::slack_input::{SlackSlashCommandBody, SlackTrigger};

type Listener = Arc<dyn Fn(EventEnvelope) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Routes verified events to the first listener registered for their trigger.
#[derive(Default)]
pub struct App {
    listeners: Vec<(SlackTrigger, Listener)>,
}

impl App {
    pub fn new() -> Self {
        App::default()
    }

    pub fn event<F, Fut>(self, event_type: &str, listener: F) -> Self
    where
        F: Fn(EventEnvelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.listen(SlackTrigger::Event(event_type.to_string()), listener)
    }

    pub fn command<F, Fut>(self, command: &str, listener: F) -> Self
    where
        F: Fn(EventEnvelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.listen(SlackTrigger::Command(command.to_string()), listener)
    }

    fn listen<F, Fut>(mut self, trigger: SlackTrigger, listener: F) -> Self
    where
        F: Fn(EventEnvelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let boxed: Listener = Arc::new(move |envelope| listener(envelope).boxed());
        self.listeners.push((trigger, boxed));
        self
    }
}

#[async_trait]
impl EventProcessor for App {
    async fn process_event(&self, event: EventEnvelope) -> Result<()> {
        let trigger = SlackTrigger::from(&event.body);

        match self.listeners.iter().find(|(t, _)| *t == trigger) {
            Some((_, listener)) => {
                debug!("Dispatching {:?} to listener", trigger);
                listener(event).await
            },
            None => {
                debug!("No listener for {:?}, acknowledging", trigger);
                event.ack.ack(None).await?;
                Ok(())
            },
        }
    }
}

/// Listeners the deployed function ships with.
pub fn default_app() -> App {
    App::new()
        .command("/echo", echo_command)
        .event("app_mention", app_mention)
}

async fn echo_command(envelope: EventEnvelope) -> Result<()> {
    let body: SlackSlashCommandBody = serde_json::from_value(envelope.body)
        .context("Failed to parse slash command body")?;

    info!("{} invoked by {} in {}", body.command, body.user_id, body.channel_id);

    envelope.ack.ack(Some(json!({
        "response_type": "ephemeral",
        "text": body.text,
    }))).await?;

    Ok(())
}

async fn app_mention(envelope: EventEnvelope) -> Result<()> {
    envelope.ack.ack(None).await?;

    let event = envelope.body.get("event").cloned().unwrap_or(Value::Null);
    let user = event.get("user").and_then(Value::as_str).unwrap_or("unknown");
    let channel = event.get("channel").and_then(Value::as_str).unwrap_or("unknown");
    let text = event.get("text").and_then(Value::as_str).unwrap_or_default();
    info!("Mentioned by {} in {}: {}", user, channel, text);

    Ok(())
}
