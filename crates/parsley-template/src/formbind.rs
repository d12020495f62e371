//! Form binding (spec §4.3): the `@record`/`@field`/`@tag`/`@key` reserved
//! attribute contract. `<input @field=...>` derives its HTML `type`,
//! `required`, `aria-*`, and constraint attributes from the bound schema
//! field; `<Label>`/`<Error>`/`<Meta>`/`<Select>` read the same binding.
//! Grounded on the teacher's `render_bootstrap_field` (attribute assembly
//! around a single field) and `fields/*.rs` (per-type widget selection),
//! adapted from a fixed Django-style `FormFieldDef` to a schema-declared
//! `FieldDescriptor` resolved at render time.

use parsley_core::errorvalue::{ErrorKind, ErrorValue};
use parsley_core::value::function::Evaluate;
use parsley_core::value::schema::{BaseType, Constraint, FieldDescriptor};
use parsley_core::value::{Record, Value};

use crate::attrs::{AttrValue, TagAttrs};
use crate::escape::html_escape;
use crate::tag::render_open_tag;

fn form_error(code: &str, message: impl Into<String>) -> ErrorValue {
    ErrorValue::new(ErrorKind::Validation, code, message)
}

/// The stack of `@record` bindings currently open while walking a template
/// (spec §4.3: forms do not nest, so in practice depth never exceeds one,
/// but a stack lets the writer give an exact "not inside a form" error when
/// it's empty rather than silently misbinding to an outer record).
#[derive(Debug, Clone, Default)]
pub struct FormStack(Vec<Record>);

impl FormStack {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, record: Record) {
        self.0.push(record);
    }

    pub fn pop(&mut self) -> Option<Record> {
        self.0.pop()
    }

    #[must_use]
    pub fn current(&self) -> Option<&Record> {
        self.0.last()
    }

    fn require_current(&self) -> Result<&Record, ErrorValue> {
        self.current().ok_or_else(|| form_error("FORM-0001", "<input @field> must be inside a <form @record=...>"))
    }
}

/// Resolves a `@field` binding to its declared field. Auto-flagged fields
/// are a legitimate `@field` target (spec §4.3: they render as a hidden,
/// readonly input rather than a normal one); the caller branches on
/// `field.auto` to pick which shape to render.
fn resolve_field<'a>(record: &'a Record, field_name: &str) -> Result<&'a FieldDescriptor, ErrorValue> {
    record
        .schema()
        .field(field_name)
        .ok_or_else(|| form_error("FORM-0002", format!("unknown field '{field_name}' on schema '{}'", record.schema().name)))
}

fn is_required(field: &FieldDescriptor) -> bool {
    !field.optional && !field.auto
}

fn input_type_for(field: &FieldDescriptor) -> &'static str {
    match field.base_type {
        BaseType::Boolean => "checkbox",
        BaseType::Integer | BaseType::Float | BaseType::Money => "number",
        BaseType::Email => "email",
        BaseType::Url => "url",
        BaseType::Phone => "tel",
        BaseType::Date => "date",
        BaseType::DateTime => "datetime-local",
        BaseType::Time => "time",
        BaseType::String | BaseType::Slug | BaseType::Uuid | BaseType::Ulid | BaseType::Array | BaseType::Schema(_) => "text",
    }
}

fn is_textarea(field: &FieldDescriptor) -> bool {
    matches!(field.metadata.peek("widget"), Some(Value::String(s)) if &*s == "textarea")
}

fn apply_constraints(attrs: &mut TagAttrs, field: &FieldDescriptor) {
    for constraint in &field.constraints {
        match constraint {
            Constraint::Min(n) => {
                attrs.set("min", AttrValue::text(n.to_string()));
            }
            Constraint::Max(n) => {
                attrs.set("max", AttrValue::text(n.to_string()));
            }
            Constraint::MinLength(n) => {
                attrs.set("minlength", AttrValue::text(n.to_string()));
            }
            Constraint::MaxLength(n) => {
                attrs.set("maxlength", AttrValue::text(n.to_string()));
            }
            Constraint::Pattern(p) => {
                attrs.set("pattern", AttrValue::text(p.clone()));
            }
            // choice rendering belongs to <Select>, not a bare <input>
            Constraint::Enum(_) => {}
        }
    }
}

fn field_id(field_name: &str, overrides: &TagAttrs) -> String {
    overrides.get_text("id").map_or_else(|| format!("id_{field_name}"), ToString::to_string)
}

/// `<input @field=name ...>`: derives type, binding attributes, and
/// constraint attributes, then layers the tag's own explicit attributes on
/// top (the author always wins over the derived defaults).
pub fn render_field_input(
    stack: &FormStack,
    evaluator: &dyn Evaluate,
    field_name: &str,
    overrides: &TagAttrs,
) -> Result<String, ErrorValue> {
    let record = stack.require_current()?;
    let field = resolve_field(record, field_name)?;
    let value = record.data().get(field_name, evaluator)?.unwrap_or(Value::Null);

    if field.auto {
        let mut attrs = TagAttrs::new();
        attrs.set("type", AttrValue::text("hidden"));
        attrs.set("name", AttrValue::text(field_name));
        attrs.set("readonly", AttrValue::Bool(true));
        if !matches!(value, Value::Null) {
            attrs.set("value", AttrValue::text(value.to_display_string()));
        }
        for (name, v) in overrides.entries() {
            attrs.set(name.clone(), v.clone());
        }
        return Ok(render_open_tag("input", &attrs));
    }

    if is_textarea(field) {
        return Ok(render_textarea(field_name, &value, &field_id(field_name, overrides), is_required(field), overrides));
    }

    let id = field_id(field_name, overrides);
    let mut attrs = TagAttrs::new();
    attrs.set("type", AttrValue::text(input_type_for(field)));
    attrs.set("id", AttrValue::text(id));
    attrs.set("name", AttrValue::text(field_name));
    apply_constraints(&mut attrs, field);

    let required = is_required(field);
    attrs.set("required", AttrValue::Bool(required));
    attrs.set("aria-required", AttrValue::text(required.to_string()));

    match field.base_type {
        BaseType::Boolean => {
            attrs.set("value", AttrValue::text("true"));
            attrs.set("checked", AttrValue::Bool(value.truthy()));
        }
        _ => {
            if !matches!(value, Value::Null) {
                attrs.set("value", AttrValue::text(value.to_display_string()));
            }
        }
    }

    for (name, v) in overrides.entries() {
        attrs.set(name.clone(), v.clone());
    }

    Ok(render_open_tag("input", &attrs))
}

fn render_textarea(field_name: &str, value: &Value, id: &str, required: bool, overrides: &TagAttrs) -> String {
    let mut attrs = TagAttrs::new();
    attrs.set("id", AttrValue::text(id));
    attrs.set("name", AttrValue::text(field_name));
    attrs.set("required", AttrValue::Bool(required));
    for (name, v) in overrides.entries() {
        attrs.set(name.clone(), v.clone());
    }
    let open = format!("<textarea{}>", attrs.to_html());
    let content = if matches!(value, Value::Null) { String::new() } else { html_escape(&value.to_display_string()) };
    format!("{open}{content}</textarea>")
}

/// Renders a single `<input type="hidden">` for one field.
fn hidden_input(field_name: &str, value: &Value, readonly: bool) -> String {
    let mut attrs = TagAttrs::new();
    attrs.set("type", AttrValue::text("hidden"));
    attrs.set("name", AttrValue::text(field_name));
    if readonly {
        attrs.set("readonly", AttrValue::Bool(true));
    }
    if !matches!(value, Value::Null) {
        attrs.set("value", AttrValue::text(value.to_display_string()));
    }
    render_open_tag("input", &attrs)
}

/// Auto-flagged fields (e.g. `createdAt`) never appear in `@field` inputs
/// but still need to round-trip on submit (spec §4.3), so they're rendered
/// as hidden inputs. `exclude` lets the caller keep the primary key's
/// hidden input ([`form_close_hidden_id`]) from being rendered twice.
pub fn auto_hidden_fields_html(record: &Record, evaluator: &dyn Evaluate, exclude: &[&str]) -> Result<String, ErrorValue> {
    let mut html = String::new();
    for field in &record.schema().fields {
        if !field.auto || exclude.contains(&field.name.as_str()) {
            continue;
        }
        let value = record.data().get(&field.name, evaluator)?.unwrap_or(Value::Null);
        html.push_str(&hidden_input(&field.name, &value, true));
    }
    Ok(html)
}

/// The hidden `id` input auto-inserted when a `<form @record=...>` closes
/// (spec §4.3), so an edit form round-trips the record's identity without
/// the author declaring an explicit `@field="id"` input. Triggers whenever
/// `r.id` is present and non-null, regardless of whether `id` is schema-flagged
/// `auto` — a hand-assigned id still needs to round-trip on submit.
pub fn form_close_hidden_id(record: &Record, evaluator: &dyn Evaluate) -> Result<String, ErrorValue> {
    if record.schema().field("id").is_none() {
        return Ok(String::new());
    }
    let value = record.data().get("id", evaluator)?.unwrap_or(Value::Null);
    if matches!(value, Value::Null) {
        return Ok(String::new());
    }
    Ok(hidden_input("id", &value, false))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use parsley_core::value::dict::Dict;
    use parsley_core::value::schema::Schema;

    use super::*;

    struct NoopEvaluator;
    impl Evaluate for NoopEvaluator {
        fn eval_node(&self, _node: &dyn parsley_core::value::function::AstNode, _env: &parsley_core::environment::Environment) -> Result<Value, ErrorValue> {
            unreachable!("no lazy slots in these tests")
        }
        fn call_function(&self, _f: &parsley_core::value::Function, _args: &[Value]) -> Result<Value, ErrorValue> {
            unreachable!()
        }
    }

    fn user_record(email: &str) -> Record {
        let mut id = FieldDescriptor::new("id", BaseType::Integer);
        id.auto = true;
        let mut email_field = FieldDescriptor::new("email", BaseType::Email);
        email_field.constraints.push(Constraint::MaxLength(120));
        let schema = Rc::new(Schema::new("User", vec![id, email_field]));
        let data = Dict::from_values(vec![("id".into(), Value::Integer(7)), ("email".into(), Value::string(email))]);
        Record::new(schema, data)
    }

    #[test]
    fn rejects_a_field_input_with_no_open_form() {
        let stack = FormStack::new();
        let err = render_field_input(&stack, &NoopEvaluator, "email", &TagAttrs::new()).unwrap_err();
        assert_eq!(err.code, "FORM-0001");
    }

    #[test]
    fn derives_email_type_and_maxlength() {
        let mut stack = FormStack::new();
        stack.push(user_record("a@b.com"));
        let html = render_field_input(&stack, &NoopEvaluator, "email", &TagAttrs::new()).unwrap();
        assert!(html.contains(r#"type="email""#));
        assert!(html.contains(r#"maxlength="120""#));
        assert!(html.contains(r#"value="a@b.com""#));
        assert!(html.contains("required"));
    }

    #[test]
    fn auto_field_renders_as_hidden_readonly_input() {
        let mut stack = FormStack::new();
        stack.push(user_record("a@b.com"));
        let html = render_field_input(&stack, &NoopEvaluator, "id", &TagAttrs::new()).unwrap();
        assert!(html.contains(r#"type="hidden""#));
        assert!(html.contains(r#"name="id""#));
        assert!(html.contains("readonly"));
        assert!(html.contains(r#"value="7""#));
        assert!(!html.contains("required"));
    }

    #[test]
    fn form_close_renders_the_primary_key_as_hidden() {
        let record = user_record("a@b.com");
        let html = form_close_hidden_id(&record, &NoopEvaluator).unwrap();
        assert!(html.contains(r#"type="hidden""#));
        assert!(html.contains(r#"name="id""#));
        assert!(html.contains(r#"value="7""#));
    }
}
