use std::sync::Arc;
use serde_json::Value;
use tokio::sync::{oneshot, Mutex};
use super::error::ReceiverError;

/// An incoming Slack event together with the handle used to answer it.
#[derive(Debug)]
pub struct EventEnvelope {
    pub body: Value,
    pub ack: Acknowledger,
}

#[derive(Debug)]
enum AckState {
    Pending(oneshot::Sender<Option<Value>>),
    Acknowledged,
}

/// One-shot acknowledgement handle. Clones share state, so only the first
/// `ack` across all clones is accepted.
#[derive(Debug, Clone)]
pub struct Acknowledger {
    state: Arc<Mutex<AckState>>,
}

impl Acknowledger {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Option<Value>>) {
        let (tx, rx) = oneshot::channel();
        let acknowledger = Acknowledger {
            state: Arc::new(Mutex::new(AckState::Pending(tx))),
        };

        (acknowledger, rx)
    }

    pub async fn ack(&self, response: Option<Value>) -> Result<(), ReceiverError> {
        let mut state = self.state.lock().await;

        match std::mem::replace(&mut *state, AckState::Acknowledged) {
            AckState::Pending(tx) => {
                // the receiver is gone only if the request was already answered
                let _ = tx.send(response);
                Ok(())
            },
            AckState::Acknowledged => Err(ReceiverError::DoubleAcknowledgement),
        }
    }
}

/// Turns an acknowledgement payload into the HTTP response text.
pub fn render_ack_response(response: Option<Value>) -> String {
    match response {
        None => String::new(),
        Some(value) if is_truthy(&value) => match value {
            Value::String(text) => text,
            other => other.to_string(),
        },
        Some(_) => String::new(),
    }
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_first_ack_is_delivered() {
        let (acknowledger, mut rx) = Acknowledger::channel();
        assert!(rx.try_recv().is_err());

        acknowledger.ack(Some(json!("ok"))).await.unwrap();

        assert_eq!(rx.await.unwrap(), Some(json!("ok")));
    }

    #[tokio::test]
    async fn test_second_ack_fails_and_keeps_first_response() {
        let (acknowledger, rx) = Acknowledger::channel();
        let clone = acknowledger.clone();

        acknowledger.ack(Some(json!({"text": "first"}))).await.unwrap();
        let second = clone.ack(Some(json!({"text": "second"}))).await;

        assert!(matches!(second, Err(ReceiverError::DoubleAcknowledgement)));
        assert_eq!(rx.await.unwrap(), Some(json!({"text": "first"})));
    }

    #[tokio::test]
    async fn test_ack_after_receiver_dropped_still_succeeds_once() {
        let (acknowledger, rx) = Acknowledger::channel();
        drop(rx);

        assert!(acknowledger.ack(None).await.is_ok());
        assert!(matches!(acknowledger.ack(None).await, Err(ReceiverError::DoubleAcknowledgement)));
    }

    #[tokio::test]
    async fn test_dropping_every_handle_closes_the_channel() {
        let (acknowledger, rx) = Acknowledger::channel();
        drop(acknowledger);

        assert!(rx.await.is_err());
    }

    #[test]
    fn test_render_ack_response() {
        assert_eq!(render_ack_response(None), "");
        assert_eq!(render_ack_response(Some(json!("plain text"))), "plain text");
        assert_eq!(render_ack_response(Some(json!({"text": "hi"}))), "{\"text\":\"hi\"}");
        assert_eq!(render_ack_response(Some(json!([1, 2]))), "[1,2]");
        assert_eq!(render_ack_response(Some(json!(42))), "42");
    }

    #[test]
    fn test_render_falsy_ack_response_is_empty() {
        assert_eq!(render_ack_response(Some(Value::Null)), "");
        assert_eq!(render_ack_response(Some(json!(false))), "");
        assert_eq!(render_ack_response(Some(json!(0))), "");
        assert_eq!(render_ack_response(Some(json!(""))), "");
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!("1")));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!({})));
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0.0)));
    }
}
