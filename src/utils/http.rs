use std::collections::HashMap;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use lambda_runtime::{tracing::{debug, warn}, LambdaEvent};
use serde_json::{json, Value};

#[derive(Debug, Default, Clone)]
pub struct HttpRequest {
    pub http_method: Option<String>,
    pub body: String,
    headers: HashMap<String, String>,
}

impl From<LambdaEvent<Value>> for HttpRequest {
    fn from(event: LambdaEvent<Value>) -> Self {
        let (value, _context) = event.into_parts();
        value.into()
    }
}

impl From<Value> for HttpRequest {
    fn from(value: Value) -> Self {
        debug!("Event value is {}", value);

        let http_method = value
            .get("requestContext")
            .and_then(|rc| rc.get("http"))
            .and_then(|http| http.get("method"))
            .or_else(|| value.get("httpMethod"))
            .and_then(Value::as_str)
            .map(String::from);

        let raw_body = value.get("body").and_then(Value::as_str);
        let body = if value.get("isBase64Encoded").and_then(Value::as_bool) == Some(true) {
            raw_body
                .and_then(|b| STANDARD.decode(b).ok())
                .and_then(|bytes| String::from_utf8(bytes).ok())
                .unwrap_or_else(|| {
                    warn!("Body is flagged as base64 but could not be decoded to UTF-8 text");
                    String::new()
                })
        } else {
            raw_body.map(String::from).unwrap_or_default()
        };

        let headers = value.get("headers")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(name, v)| v.as_str().map(|v| (name.clone(), v.to_string())))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        HttpRequest::new(http_method, body, headers)
    }
}

impl HttpRequest {
    pub fn new<I, K, V>(http_method: Option<String>, body: String, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
            .collect();

        HttpRequest { http_method, body, headers }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: String) -> Self {
        let is_json_object = serde_json::from_str::<Value>(&body)
            .map(|value| value.is_object())
            .unwrap_or(false);

        HttpResponse {
            status_code: 200,
            content_type: if is_json_object { "application/json" } else { "text/plain" },
            body,
        }
    }

    pub fn error(status_code: u16, message: &str) -> Self {
        HttpResponse {
            status_code,
            content_type: "text/plain",
            body: message.to_string(),
        }
    }

    pub fn into_lambda_response(self) -> Value {
        json!({
            "statusCode": self.status_code,
            "headers": { "content-type": self.content_type },
            "body": self.body,
        })
    }
}
