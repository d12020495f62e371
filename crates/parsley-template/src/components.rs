//! `<Label>`, `<Error>`, `<Meta>`, `<Select>` (spec §4.3): small components
//! that read the same `@record`/`@field` binding as `<input @field>`, so a
//! template author composes them around one input without re-stating the
//! field's constraints.

use parsley_core::errorvalue::{ErrorKind, ErrorValue};
use parsley_core::value::function::Evaluate;
use parsley_core::value::schema::{Constraint, FieldDescriptor};
use parsley_core::value::{Record, Value};

use crate::attrs::{AttrValue, TagAttrs};
use crate::escape::html_escape;
use crate::formbind::FormStack;

fn form_error(code: &str, message: impl Into<String>) -> ErrorValue {
    ErrorValue::new(ErrorKind::Validation, code, message)
}

fn field_of<'a>(stack: &'a FormStack, field_name: &str) -> Result<(&'a Record, &'a FieldDescriptor), ErrorValue> {
    let record = stack.current().ok_or_else(|| form_error("FORM-0001", "must be inside a <form @record=...>"))?;
    let field = record
        .schema()
        .field(field_name)
        .ok_or_else(|| form_error("FORM-0002", format!("unknown field '{field_name}' on schema '{}'", record.schema().name)))?;
    Ok((record, field))
}

fn label_text(field: &FieldDescriptor) -> String {
    match field.metadata.peek("label") {
        Some(Value::String(s)) => s.to_string(),
        _ => field.title_fallback(),
    }
}

/// `<Label @field=name>`.
pub fn render_label(stack: &FormStack, field_name: &str) -> Result<String, ErrorValue> {
    let (_, field) = field_of(stack, field_name)?;
    let id = format!("id_{field_name}");
    Ok(format!(r#"<label for="{}">{}</label>"#, html_escape(&id), html_escape(&label_text(field))))
}

/// `<Error @field=name>`: empty string when the bound record has no error
/// recorded for this field.
pub fn render_error(stack: &FormStack, field_name: &str) -> Result<String, ErrorValue> {
    let (record, _) = field_of(stack, field_name)?;
    Ok(match record.error(field_name) {
        Some(err) => format!(r#"<span class="field-error" data-code="{}">{}</span>"#, html_escape(&err.code), html_escape(&err.message)),
        None => String::new(),
    })
}

/// `<Meta @field=name>`: renders the field's `help` metadata, if declared.
pub fn render_meta(stack: &FormStack, field_name: &str) -> Result<String, ErrorValue> {
    let (_, field) = field_of(stack, field_name)?;
    Ok(match field.metadata.peek("help") {
        Some(Value::String(s)) => format!(r#"<small class="field-meta">{}</small>"#, html_escape(&s)),
        _ => String::new(),
    })
}

fn enum_choices(field: &FieldDescriptor) -> Option<&[Value]> {
    field.constraints.iter().find_map(|c| match c {
        Constraint::Enum(choices) => Some(choices.as_slice()),
        _ => None,
    })
}

/// `<Select @field=name>`: renders `<option>`s from the field's `Enum`
/// constraint, falling back to a plain text input derivation error if the
/// field declares no enum (a `<Select>` only makes sense against a
/// constrained choice set).
pub fn render_select(stack: &FormStack, evaluator: &dyn Evaluate, field_name: &str, overrides: &TagAttrs) -> Result<String, ErrorValue> {
    let (record, field) = field_of(stack, field_name)?;
    let choices =
        enum_choices(field).ok_or_else(|| form_error("FORM-0004", format!("'{field_name}' has no enum constraint; <Select> requires one")))?;
    let current = record.data().get(field_name, evaluator)?.unwrap_or(Value::Null);

    let mut attrs = TagAttrs::new();
    attrs.set("id", AttrValue::text(overrides.get_text("id").map_or_else(|| format!("id_{field_name}"), ToString::to_string)));
    attrs.set("name", AttrValue::text(field_name));
    attrs.set("required", AttrValue::Bool(!field.optional && !field.auto));
    for (name, v) in overrides.entries() {
        attrs.set(name.clone(), v.clone());
    }

    let mut html = format!("<select{}>", attrs.to_html());
    for choice in choices {
        let selected = *choice == current;
        let mut opt_attrs = TagAttrs::new();
        opt_attrs.set("value", AttrValue::text(choice.to_display_string()));
        opt_attrs.set("selected", AttrValue::Bool(selected));
        html.push_str(&format!("<option{}>{}</option>", opt_attrs.to_html(), html_escape(&choice.to_display_string())));
    }
    html.push_str("</select>");
    Ok(html)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use parsley_core::value::dict::Dict;
    use parsley_core::value::schema::{BaseType, Schema};
    use parsley_core::value::Record;

    use super::*;

    struct NoopEvaluator;
    impl Evaluate for NoopEvaluator {
        fn eval_node(&self, _node: &dyn parsley_core::value::function::AstNode, _env: &parsley_core::environment::Environment) -> Result<Value, ErrorValue> {
            unreachable!()
        }
        fn call_function(&self, _f: &parsley_core::value::Function, _args: &[Value]) -> Result<Value, ErrorValue> {
            unreachable!()
        }
    }

    fn status_record() -> Record {
        let mut status = FieldDescriptor::new("status", BaseType::String);
        status.constraints.push(Constraint::Enum(vec![Value::string("draft"), Value::string("published")]));
        let schema = Rc::new(Schema::new("Post", vec![status]));
        let data = Dict::from_values(vec![("status".into(), Value::string("published"))]);
        Record::new(schema, data)
    }

    #[test]
    fn label_falls_back_to_title_case() {
        let mut stack = FormStack::new();
        stack.push(status_record());
        let html = render_label(&stack, "status").unwrap();
        assert!(html.contains("Status"));
    }

    #[test]
    fn error_is_empty_when_the_record_has_none() {
        let mut stack = FormStack::new();
        stack.push(status_record());
        assert_eq!(render_error(&stack, "status").unwrap(), "");
    }

    #[test]
    fn select_marks_the_current_value_selected() {
        let mut stack = FormStack::new();
        stack.push(status_record());
        let html = render_select(&stack, &NoopEvaluator, "status", &TagAttrs::new()).unwrap();
        assert!(html.contains(r#"value="published""#));
        assert!(html.contains(" selected"));
        assert!(!html.contains(r#"value="draft" selected"#));
    }

    #[test]
    fn select_without_an_enum_constraint_errors() {
        let mut id = FieldDescriptor::new("id", BaseType::Integer);
        id.auto = true;
        let schema = Rc::new(Schema::new("Thing", vec![id]));
        let record = Record::new(schema, Dict::new());
        let mut stack = FormStack::new();
        stack.push(record);
        let err = render_select(&stack, &NoopEvaluator, "id", &TagAttrs::new()).unwrap_err();
        assert_eq!(err.code, "FORM-0004");
    }
}
