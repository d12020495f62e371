//! String method table (spec §4.8): `length`, `toUpper`, `toLower`, `trim`,
//! `split`, `replace`, `contains`, `startsWith`, `endsWith`, `matches`.

use parsley_core::value::Value;
use parsley_core::ErrorValue;

use super::require_arity;

const TYPE_NAME: &str = "string";

fn arg_str<'a>(args: &'a [Value], index: usize, method: &str) -> Result<&'a str, ErrorValue> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.as_ref()),
        _ => Err(ErrorValue::type_error("TYPE-0010", format!("{TYPE_NAME}.{method}: expected a string argument"))),
    }
}

pub fn dispatch(s: &std::rc::Rc<str>, method: &str, args: &[Value]) -> Result<Value, ErrorValue> {
    match method {
        "length" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::Integer(s.chars().count() as i64))
        }
        "toUpper" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::string(s.to_uppercase()))
        }
        "toLower" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::string(s.to_lowercase()))
        }
        "trim" => {
            require_arity(TYPE_NAME, method, args, 0)?;
            Ok(Value::string(s.trim()))
        }
        "split" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            let sep = arg_str(args, 0, method)?;
            let parts = if sep.is_empty() {
                s.chars().map(|c| Value::string(c.to_string())).collect()
            } else {
                s.split(sep).map(Value::string).collect()
            };
            Ok(Value::array(parts))
        }
        "replace" => {
            require_arity(TYPE_NAME, method, args, 2)?;
            let from = arg_str(args, 0, method)?;
            let to = arg_str(args, 1, method)?;
            Ok(Value::string(s.replace(from, to)))
        }
        "contains" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            Ok(Value::Boolean(s.contains(arg_str(args, 0, method)?)))
        }
        "startsWith" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            Ok(Value::Boolean(s.starts_with(arg_str(args, 0, method)?)))
        }
        "endsWith" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            Ok(Value::Boolean(s.ends_with(arg_str(args, 0, method)?)))
        }
        "matches" => {
            require_arity(TYPE_NAME, method, args, 1)?;
            match args.first() {
                Some(Value::Regex(re)) => Ok(Value::Boolean(re.is_match(s))),
                _ => Err(ErrorValue::type_error("TYPE-0011", format!("{TYPE_NAME}.matches: expected a regex argument"))),
            }
        }
        other => Err(ErrorValue::name_error(format!("no method '{other}' on {TYPE_NAME}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> std::rc::Rc<str> {
        std::rc::Rc::from(v)
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        assert_eq!(dispatch(&s("héllo"), "length", &[]).unwrap(), Value::Integer(5));
    }

    #[test]
    fn split_on_separator() {
        let result = dispatch(&s("a,b,c"), "split", &[Value::string(",")]).unwrap();
        assert_eq!(result, Value::array(vec![Value::string("a"), Value::string("b"), Value::string("c")]));
    }

    #[test]
    fn wrong_arity_reports_expected_message() {
        let err = dispatch(&s("x"), "trim", &[Value::Integer(1)]).unwrap_err();
        assert!(err.message.contains("wrong number of arguments"));
    }

    #[test]
    fn unknown_method_is_a_name_error() {
        let err = dispatch(&s("x"), "frobnicate", &[]).unwrap_err();
        assert_eq!(err.kind, parsley_core::ErrorKind::Name);
    }
}
