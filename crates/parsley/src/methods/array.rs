//! Array method table (spec §4.8): `length`, `map`, `filter`, `reduce`,
//! `sort`, `shuffle`, `pick`, `take`, `join`.

use std::rc::Rc;

use parsley_core::value::Value;
use parsley_core::ErrorValue;

use rand::seq::SliceRandom;

use super::require_arity;
use crate::evaluator::Evaluator;

const TYPE_NAME: &str = "array";

fn call_callback(evaluator: &Evaluator, callback: &Value, args: &[Value]) -> Result<Value, ErrorValue> {
    match callback {
        Value::Function(f) => evaluator.call_function(f, args),
        Value::Builtin(b) => b.call(args),
        other => Err(ErrorValue::type_error(
            "TYPE-0021",
            format!("{TYPE_NAME}: expected a function argument, got {}", other.value_type().as_str()),
        )),
    }
}

fn require_count(args: &[Value], index: usize, method: &str) -> Result<usize, ErrorValue> {
    match args.get(index) {
        Some(Value::Integer(n)) if *n >= 0 => Ok(*n as usize),
        _ => Err(ErrorValue::type_error("TYPE-0022", format!("{TYPE_NAME}.{method}: expected a non-negative integer argument"))),
    }
}

pub fn dispatch(evaluator: &Evaluator, items: &Rc<Vec<Value>>, method: &str, args: &[Value]) -> Result<Value, ErrorValue> {
    match method {
        "length" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::Integer(items.len() as i64))
        }
        "map" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            let mut mapped = Vec::with_capacity(items.len());
            for item in items.iter() {
                mapped.push(call_callback(evaluator, &args[0], std::slice::from_ref(item))?);
            }
            Ok(Value::array(mapped))
        }
        "filter" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            let mut kept = Vec::new();
            for item in items.iter() {
                if call_callback(evaluator, &args[0], std::slice::from_ref(item))?.truthy() {
                    kept.push(item.clone());
                }
            }
            Ok(Value::array(kept))
        }
        "reduce" => {
            require_arity(TYPE_NAME, method, args, 2)?;
            let mut acc = args[1].clone();
            for item in items.iter() {
                acc = call_callback(evaluator, &args[0], &[acc, item.clone()])?;
            }
            Ok(acc)
        }
        "sort" => {
            if args.is_empty() {
                let mut sorted = (**items).clone();
                sorted.sort_by(default_order);
                Ok(Value::array(sorted))
            } else if args.len() == 1 {
                let mut sorted = (**items).clone();
                let mut err = None;
                sorted.sort_by(|a, b| {
                    if err.is_some() {
                        return std::cmp::Ordering::Equal;
                    }
                    match call_callback(evaluator, &args[0], &[a.clone(), b.clone()]) {
                        Ok(Value::Integer(n)) => n.cmp(&0),
                        Ok(other) => {
                            err = Some(ErrorValue::type_error("TYPE-0023", format!("{TYPE_NAME}.sort: comparator must return an integer, got {}", other.value_type().as_str())));
                            std::cmp::Ordering::Equal
                        }
                        Err(e) => {
                            err = Some(e);
                            std::cmp::Ordering::Equal
                        }
                    }
                });
                if let Some(e) = err {
                    return Err(e);
                }
                Ok(Value::array(sorted))
            } else {
                Err(ErrorValue::arity(format!("{TYPE_NAME}.sort: wrong number of arguments")))
            }
        }
        "shuffle" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            let mut shuffled = (**items).clone();
            shuffled.shuffle(&mut rand::thread_rng());
            Ok(Value::array(shuffled))
        }
        "pick" => {
            // Open Question (i): sampling over an empty population is undefined,
            // so `pick` (with or without a count) returns null rather than an
            // empty array.
            if items.is_empty() {
                return Ok(Value::Null);
            }
            if args.is_empty() {
                Ok(items.choose(&mut rand::thread_rng()).cloned().unwrap_or(Value::Null))
            } else if args.len() == 1 {
                let n = require_count(args, 0, method)?;
                let mut rng = rand::thread_rng();
                let picked: Vec<Value> = items
                    .choose_multiple(&mut rng, n.min(items.len()))
                    .cloned()
                    .collect();
                Ok(Value::array(picked))
            } else {
                Err(ErrorValue::arity(format!("{TYPE_NAME}.pick: wrong number of arguments")))
            }
        }
        "take" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            let n = require_count(args, 0, method)?;
            // Open Question (i): unlike `pick`, sampling-without-replacement
            // semantics make `take(n > 0)` over an empty array a range error
            // rather than a silent empty result.
            if items.is_empty() && n > 0 {
                return Err(ErrorValue::type_error("TYPE-0024", format!("{TYPE_NAME}.take: cannot take {n} elements from an empty array")));
            }
            Ok(Value::array(items.iter().take(n).cloned().collect()))
        }
        "join" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            let Some(Value::String(sep)) = args.first() else {
                return Err(ErrorValue::type_error("TYPE-0010", format!("{TYPE_NAME}.join: expected a string separator")));
            };
            let joined = items
                .iter()
                .map(Value::to_display_string)
                .collect::<Vec<_>>()
                .join(sep);
            Ok(Value::string(joined))
        }
        other => Err(ErrorValue::name_error(format!("no method '{other}' on {TYPE_NAME}"))),
    }
}

fn default_order(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Integer(x), Value::Float(y)) => (*x as f64).partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Float(x), Value::Integer(y)) => x.partial_cmp(&(*y as f64)).unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsley_core::config::EngineConfig;
    use parsley_core::environment::HostContext;

    fn ev() -> Evaluator {
        Evaluator::new(Rc::new(HostContext::new(EngineConfig::default())))
    }

    fn arr(values: Vec<Value>) -> Rc<Vec<Value>> {
        Rc::new(values)
    }

    #[test]
    fn length_counts_elements() {
        let e = ev();
        let items = arr(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(dispatch(&e, &items, "length", &[]).unwrap(), Value::Integer(2));
    }

    #[test]
    fn sort_defaults_to_ascending() {
        let e = ev();
        let items = arr(vec![Value::Integer(3), Value::Integer(1), Value::Integer(2)]);
        let sorted = dispatch(&e, &items, "sort", &[]).unwrap();
        assert_eq!(sorted, Value::array(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]));
    }

    #[test]
    fn take_caps_at_the_array_length() {
        let e = ev();
        let items = arr(vec![Value::Integer(1)]);
        let taken = dispatch(&e, &items, "take", &[Value::Integer(5)]).unwrap();
        assert_eq!(taken, Value::array(vec![Value::Integer(1)]));
    }

    #[test]
    fn join_uses_display_string() {
        let e = ev();
        let items = arr(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(dispatch(&e, &items, "join", &[Value::string("-")]).unwrap(), Value::string("1-2"));
    }

    #[test]
    fn pick_on_an_empty_array_returns_null() {
        let e = ev();
        let items = arr(vec![]);
        assert_eq!(dispatch(&e, &items, "pick", &[]).unwrap(), Value::Null);
        assert_eq!(dispatch(&e, &items, "pick", &[Value::Integer(3)]).unwrap(), Value::Null);
    }

    #[test]
    fn take_from_an_empty_array_is_a_range_error() {
        let e = ev();
        let items = arr(vec![]);
        let err = dispatch(&e, &items, "take", &[Value::Integer(1)]).unwrap_err();
        assert_eq!(err.code, "TYPE-0024");
        // n == 0 is not a range violation even on an empty array.
        assert_eq!(dispatch(&e, &items, "take", &[Value::Integer(0)]).unwrap(), Value::array(vec![]));
    }
}
