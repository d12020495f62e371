//! Typed response shape (spec §3, §4.4, §6): a `Dict` with reserved keys
//! `__type`, `__format`, `__data`, `__response`, plus destructuring-capture
//! projection to `{data, error, status, headers}`.

use crate::errorvalue::ErrorValue;
use crate::value::dict::Dict;
use crate::value::function::Evaluate;
use crate::value::Value;

pub const TYPE_KEY: &str = "__type";
pub const FORMAT_KEY: &str = "__format";
pub const DATA_KEY: &str = "__data";
pub const RESPONSE_KEY: &str = "__response";

pub const STATUS_KEY: &str = "status";
pub const OK_KEY: &str = "ok";
pub const HEADERS_KEY: &str = "headers";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Text,
    Binary,
}

impl ResponseFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Binary => "binary",
        }
    }
}

/// Builds the reserved-key response dict produced by remote-write and fetch
/// (spec §4.4). `headers` keys are canonicalised to lowercase at
/// construction time (spec §9 Open Question ii).
#[must_use]
pub fn build_typed_response(
    format: ResponseFormat,
    data: Value,
    status: u16,
    headers: Vec<(String, String)>,
) -> Dict {
    let header_dict = Dict::new();
    for (k, v) in headers {
        header_dict.insert(k.to_lowercase(), Value::string(v));
    }
    let response = Dict::new();
    response.insert(STATUS_KEY, Value::Integer(i64::from(status)));
    response.insert(OK_KEY, Value::Boolean((200..300).contains(&status)));
    response.insert(HEADERS_KEY, Value::Dict(header_dict));

    let dict = Dict::new();
    dict.insert(TYPE_KEY, Value::string("response"));
    dict.insert(FORMAT_KEY, Value::string(format.as_str()));
    dict.insert(DATA_KEY, data);
    dict.insert(RESPONSE_KEY, Value::Dict(response));
    dict
}

#[must_use]
pub fn is_typed_response(dict: &Dict) -> bool {
    matches!(dict.peek(TYPE_KEY), Some(Value::String(s)) if &*s == "response")
}

pub struct Destructured {
    pub data: Value,
    pub error: Value,
    pub status: Value,
    pub headers: Value,
}

/// `let {data, error[, status, headers]} = <io-expr>` projection (spec §4.4,
/// §7): `data` is `__data` or null if not ok; `error` is null on success or
/// a string message on failure.
pub fn destructure(dict: &Dict, evaluator: &dyn Evaluate) -> Result<Destructured, ErrorValue> {
    let response = match dict.get(RESPONSE_KEY, evaluator)? {
        Some(Value::Dict(r)) => r,
        _ => {
            return Ok(Destructured {
                data: Value::Null,
                error: Value::string("malformed response: missing __response"),
                status: Value::Null,
                headers: Value::Null,
            })
        }
    };
    let ok = matches!(response.get(OK_KEY, evaluator)?, Some(Value::Boolean(true)));
    let status = response.get(STATUS_KEY, evaluator)?.unwrap_or(Value::Null);
    let headers = response.get(HEADERS_KEY, evaluator)?.unwrap_or(Value::Null);
    let data = dict.get(DATA_KEY, evaluator)?.unwrap_or(Value::Null);

    if ok {
        Ok(Destructured {
            data,
            error: Value::Null,
            status,
            headers,
        })
    } else {
        let message = match &data {
            Value::Dict(d) => d
                .get("message", evaluator)?
                .map(|v| v.to_display_string())
                .unwrap_or_else(|| format!("request failed with status {status}")),
            _ => format!("request failed with status {status}"),
        };
        Ok(Destructured {
            data: Value::Null,
            error: Value::string(message),
            status,
            headers,
        })
    }
}
