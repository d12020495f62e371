//! Method tables for the domain-literal scalars (spec §4.8): `datetime`,
//! `money`, `duration`. Each exposes its fields and a handful of derived
//! accessors rather than routing through a generic getter.

use parsley_core::value::{DateTime, Duration, Money, Value};
use parsley_core::ErrorValue;

use super::require_arity;

fn opt_string(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::string)
}

fn opt_int(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

pub fn datetime_dispatch(dt: &DateTime, method: &str, args: &[Value]) -> Result<Value, ErrorValue> {
    const TYPE_NAME: &str = "datetime";
    require_arity(TYPE_NAME, method, args, 0)?;
    match method {
        "year" => Ok(Value::Integer(i64::from(dt.year))),
        "month" => Ok(Value::Integer(i64::from(dt.month))),
        "day" => Ok(Value::Integer(i64::from(dt.day))),
        "hour" => Ok(Value::Integer(i64::from(dt.hour))),
        "minute" => Ok(Value::Integer(i64::from(dt.minute))),
        "second" => Ok(Value::Integer(i64::from(dt.second))),
        "weekday" => Ok(opt_string(dt.weekday().map(str::to_string))),
        "unix" | "timestamp" => Ok(opt_int(dt.unix())),
        "iso" => Ok(opt_string(dt.iso())),
        "dayOfYear" => Ok(opt_int(dt.day_of_year().map(i64::from))),
        "week" => Ok(opt_int(dt.week().map(i64::from))),
        "kind" => Ok(Value::string(dt.kind.as_str())),
        other => Err(ErrorValue::name_error(format!("no method '{other}' on {TYPE_NAME}"))),
    }
}

pub fn money_dispatch(m: &Money, method: &str, args: &[Value]) -> Result<Value, ErrorValue> {
    const TYPE_NAME: &str = "money";
    require_arity(TYPE_NAME, method, args, 0)?;
    match method {
        "amount" => Ok(Value::Float(m.amount())),
        "currency" => Ok(Value::string(m.currency_code())),
        "scale" => Ok(Value::Integer(i64::from(m.scale))),
        "minorUnits" => Ok(Value::Integer(m.minor_units)),
        other => Err(ErrorValue::name_error(format!("no method '{other}' on {TYPE_NAME}"))),
    }
}

pub fn duration_dispatch(d: &Duration, method: &str, args: &[Value]) -> Result<Value, ErrorValue> {
    const TYPE_NAME: &str = "duration";
    require_arity(TYPE_NAME, method, args, 0)?;
    match method {
        "months" => Ok(Value::Integer(d.months)),
        "seconds" => Ok(Value::Integer(d.seconds)),
        "totalSeconds" => Ok(Value::Integer(d.total_seconds())),
        other => Err(ErrorValue::name_error(format!("no method '{other}' on {TYPE_NAME}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_weekday_reads_through_chrono() {
        let dt = DateTime::date(2024, 1, 1);
        assert_eq!(datetime_dispatch(&dt, "weekday", &[]).unwrap(), Value::string("Monday"));
    }

    #[test]
    fn datetime_unix_is_null_for_bare_time() {
        let t = DateTime::time(10, 30, 0);
        assert_eq!(datetime_dispatch(&t, "unix", &[]).unwrap(), Value::Null);
    }

    #[test]
    fn money_amount_divides_by_scale() {
        let m = Money::new(1234, "USD", 2);
        let Value::Float(amount) = money_dispatch(&m, "amount", &[]).unwrap() else { panic!("expected float") };
        assert!((amount - 12.34).abs() < f64::EPSILON);
    }

    #[test]
    fn duration_total_seconds_combines_months_and_seconds() {
        let d = Duration { months: 1, seconds: 60 };
        assert_eq!(duration_dispatch(&d, "totalSeconds", &[]).unwrap(), Value::Integer(30 * 86_400 + 60));
    }

    #[test]
    fn unknown_method_is_a_name_error() {
        let m = Money::new(0, "USD", 2);
        let err = money_dispatch(&m, "frobnicate", &[]).unwrap_err();
        assert_eq!(err.kind, parsley_core::ErrorKind::Name);
    }
}
