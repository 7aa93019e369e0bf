mod app;
mod config;
mod receiver;
mod utils;

use std::sync::Arc;
use lambda_runtime::{run, service_fn, tracing::{self, error, info}, Error, LambdaEvent};
use serde_json::Value;
use crate::config::Config;
use crate::receiver::{default_log_sink, FunctionReceiver, Receiver};
use crate::utils::http::{HttpRequest, HttpResponse};

async fn function_handler(receiver: &FunctionReceiver, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let request: HttpRequest = event.into();
    Ok(handle_request(receiver, &request).await.into_lambda_response())
}

async fn handle_request(receiver: &FunctionReceiver, request: &HttpRequest) -> HttpResponse {
    info!("Handling request: Method: {:?}", request.http_method);

    match request.http_method.as_deref() {
        Some(method) if method.eq_ignore_ascii_case("POST") => {},
        _ => return HttpResponse::error(405, "Method not allowed"),
    }

    match receiver.request_handler(request).await {
        Ok(body) => HttpResponse::ok(body),
        Err(e) => {
            error!("Failed to handle Slack request: {}", e);
            HttpResponse::error(e.status_code(), &e.to_string())
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    let mut receiver = FunctionReceiver::new(config.signing_secret, default_log_sink())
        .with_ack_timeout(config.ack_timeout);
    receiver.init(Arc::new(app::default_app()));
    receiver.start().await?;

    let shared_receiver = &receiver;
    let result = run(service_fn(move |event: LambdaEvent<Value>| async move {
        function_handler(shared_receiver, event).await
    })).await;

    receiver.stop().await?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, time::Duration};
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use chrono::Utc;
    use hmac::{Hmac, Mac};
    use serde_json::json;
    use sha2::Sha256;

    const SECRET: &str = "function-test-secret";

    fn sign(ts: i64, body: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("v0:{}:{}", ts, body).as_bytes());
        format!("v0={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn lambda_event(method: &str, body: &str, content_type: &str) -> Value {
        let ts = Utc::now().timestamp();
        json!({
            "requestContext": { "http": { "method": method } },
            "headers": {
                "x-slack-signature": sign(ts, body),
                "x-slack-request-timestamp": ts.to_string(),
                "content-type": content_type,
            },
            "body": STANDARD.encode(body),
            "isBase64Encoded": true,
        })
    }

    fn test_receiver() -> FunctionReceiver {
        env::set_var("RUST_LOG", "debug");
        let _ = env_logger::try_init();

        let mut receiver = FunctionReceiver::new(SECRET, default_log_sink())
            .with_ack_timeout(Duration::from_secs(1));
        receiver.init(Arc::new(app::default_app()));
        receiver
    }

    #[tokio::test]
    async fn test_slash_command_round_trip() {
        let receiver = test_receiver();
        let request: HttpRequest = lambda_event("POST", "command=%2Fecho&text=ping&channel_id=C1&user_id=U1", "application/x-www-form-urlencoded").into();

        let response = handle_request(&receiver, &request).await;
        assert_eq!(response.status_code, 200);
        assert_eq!(response.content_type, "application/json");
        assert_eq!(serde_json::from_str::<Value>(&response.body).unwrap(), json!({"response_type": "ephemeral", "text": "ping"}));
    }

    #[tokio::test]
    async fn test_url_verification_handshake() {
        let receiver = test_receiver();
        let request: HttpRequest = lambda_event("POST", "{\"type\":\"url_verification\",\"challenge\":\"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P\"}", "application/json").into();

        let response = handle_request(&receiver, &request).await;
        assert_eq!(response, HttpResponse {
            status_code: 200,
            content_type: "application/json",
            body: "{\"challenge\":\"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P\"}".to_string(),
        });
    }

    #[tokio::test]
    async fn test_unhandled_event_gets_empty_ok() {
        let receiver = test_receiver();
        let request: HttpRequest = lambda_event("POST", "{\"type\":\"event_callback\",\"event\":{\"type\":\"reaction_added\"}}", "application/json").into();

        let response = handle_request(&receiver, &request).await;
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "");
    }

    #[tokio::test]
    async fn test_forged_request_is_unauthorized() {
        let receiver = test_receiver();
        let mut event = lambda_event("POST", "{\"type\":\"event_callback\"}", "application/json");
        event["headers"]["x-slack-signature"] = json!("v0=deadbeef");
        let request: HttpRequest = event.into();

        assert_eq!(handle_request(&receiver, &request).await.status_code, 401);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let receiver = test_receiver();
        let request: HttpRequest = lambda_event("POST", "{\"type\":", "application/json").into();

        assert_eq!(handle_request(&receiver, &request).await.status_code, 400);
    }

    #[tokio::test]
    async fn test_non_post_is_rejected() {
        let receiver = test_receiver();
        let request: HttpRequest = lambda_event("GET", "", "application/json").into();

        let response = handle_request(&receiver, &request).await;
        assert_eq!(response.status_code, 405);
    }
}
