//! Remote write (`=/=>`, `=/=>>`) and fetch (`<=/=`) (spec §4.4): synchronous
//! (from the script's point of view) blocking HTTP calls against a typed
//! endpoint wrapper, with a caller-configured timeout.

use std::time::Duration;

use parsley_core::errorvalue::{ErrorKind, ErrorValue};
use parsley_core::response::{build_typed_response, ResponseFormat};
use parsley_core::value::{Endpoint, HttpMethod};
use parsley_core::Value;
use reqwest::Method;
use tracing::{debug, warn};

use crate::json::{from_json, to_json};

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn network_error(message: impl Into<String>) -> Value {
    Value::error(ErrorValue::new(ErrorKind::Io, "NETWORK", message))
}

fn timeout_error() -> Value {
    Value::error(ErrorValue::new(ErrorKind::Io, "TIMEOUT", "request timed out"))
}

async fn send(endpoint: &Endpoint, method: HttpMethod, payload: Option<&Value>, timeout: Duration) -> Value {
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(c) => c,
        Err(e) => return network_error(e.to_string()),
    };
    let mut request = client.request(reqwest_method(method), &endpoint.url.raw);
    if let Some(payload) = payload {
        request = match endpoint.format {
            ResponseFormat::Json => request.json(&to_json(payload)),
            ResponseFormat::Text | ResponseFormat::Binary => request.body(payload.to_display_string()),
        };
    }

    debug!(url = %endpoint.url.raw, method = reqwest_method(method).as_str(), "sending request");
    let response = match request.send().await {
        Ok(r) => r,
        Err(e) if e.is_timeout() => {
            warn!(url = %endpoint.url.raw, "request timed out");
            return timeout_error();
        }
        Err(e) => {
            warn!(url = %endpoint.url.raw, error = %e, "request failed");
            return network_error(e.to_string());
        }
    };

    let status = response.status().as_u16();
    let headers: Vec<(String, String)> =
        response.headers().iter().map(|(name, value)| (name.to_string(), value.to_str().unwrap_or_default().to_string())).collect();

    let body_text = match response.text().await {
        Ok(text) => text,
        Err(e) => return network_error(e.to_string()),
    };
    let data = match endpoint.format {
        ResponseFormat::Json if body_text.is_empty() => Value::Null,
        ResponseFormat::Json => serde_json::from_str::<serde_json::Value>(&body_text).map_or_else(|_| Value::string(body_text.clone()), |j| from_json(&j)),
        ResponseFormat::Text | ResponseFormat::Binary => Value::string(body_text),
    };

    Value::Dict(build_typed_response(endpoint.format, data, status, headers))
}

/// `payload =/=> target`: default method POST unless overridden by a
/// `.put`/`.patch`/`.delete` accessor already baked into `endpoint`.
pub async fn remote_write(endpoint: &Endpoint, payload: &Value, timeout: Duration) -> Value {
    send(endpoint, endpoint.method, Some(payload), timeout).await
}

/// `payload =/=>> target`: PATCH-append semantics (spec §4.4) unless the
/// endpoint already carries an explicit non-default method.
pub async fn remote_append(endpoint: &Endpoint, payload: &Value, timeout: Duration) -> Value {
    send(endpoint, endpoint.append_method(), Some(payload), timeout).await
}

/// `<=/= source`: always GET.
pub async fn fetch(endpoint: &Endpoint, timeout: Duration) -> Value {
    send(endpoint, HttpMethod::Get, None, timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsley_core::value::literal::Url;

    #[tokio::test]
    async fn connection_failure_returns_a_network_error_value() {
        let endpoint = Endpoint::new(Url::parse("http://127.0.0.1:1").unwrap(), ResponseFormat::Json);
        let result = fetch(&endpoint, Duration::from_millis(200)).await;
        match result {
            Value::Error(e) => assert_eq!(e.kind, ErrorKind::Io),
            other => panic!("expected error value, got {other:?}"),
        }
    }
}
