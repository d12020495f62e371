//! Wire-format conversion between the value model and `serde_json::Value`,
//! used to serialise JSON request bodies and decode JSON response bodies
//! (spec §4.4).

use parsley_core::value::{Dict, Value};

pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(n) => serde_json::Value::Number((*n).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Dict(dict) => {
            let map = dict.keys().into_iter().map(|k| (k.clone(), dict.peek(&k).map_or(serde_json::Value::Null, |v| to_json(&v)))).collect();
            serde_json::Value::Object(map)
        }
        other => serde_json::Value::String(other.to_display_string()),
    }
}

pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Value::string(s.clone()),
        serde_json::Value::Array(items) => Value::array(items.iter().map(from_json).collect()),
        serde_json::Value::Object(map) => {
            let pairs = map.iter().map(|(k, v)| (k.clone(), from_json(v))).collect();
            Value::Dict(Dict::from_values(pairs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_scalars() {
        assert_eq!(from_json(&to_json(&Value::Integer(5))), Value::Integer(5));
        assert_eq!(from_json(&to_json(&Value::Boolean(true))), Value::Boolean(true));
        assert_eq!(from_json(&to_json(&Value::string("x"))), Value::string("x"));
    }

    #[test]
    fn object_round_trips_as_dict() {
        let dict = Dict::from_values(vec![("a".to_string(), Value::Integer(1))]);
        let value = Value::Dict(dict);
        let json = to_json(&value);
        assert_eq!(json, serde_json::json!({"a": 1}));
        let back = from_json(&json);
        match back {
            Value::Dict(d) => assert_eq!(d.peek("a"), Some(Value::Integer(1))),
            _ => panic!("expected dict"),
        }
    }
}
