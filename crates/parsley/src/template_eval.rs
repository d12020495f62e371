//! Walks an `Expr::Tag` node and renders it to HTML (or, for `<SQL>`, to a
//! SQL-query value), per spec §4.2/§4.3. The tag-casing dispatch rule, void
//! elements, attribute escaping, and form-binding element assembly all live
//! in `parsley-template`; this module only walks the AST and feeds it
//! already-evaluated values.

use parsley_core::environment::Environment;
use parsley_core::value::sql::SqlValue;
use parsley_core::value::{Dict, Value};
use parsley_core::ErrorValue;

use parsley_template::attrs::{AttrValue, TagAttrs};
use parsley_template::tag::{is_component_tag, is_void_element, render_close_tag, render_open_tag};
use parsley_template::{build_sql_tag, render_error, render_label, render_meta, render_select};

use crate::ast::{not_callable_error, Expr, TagNode};
use crate::evaluator::Evaluator;

fn sql_value_to_value(v: &SqlValue) -> Value {
    match v {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Boolean(*b),
        SqlValue::Int(n) => Value::Integer(*n),
        SqlValue::Float(f) => Value::Float(*f),
        SqlValue::Text(s) => Value::string(s.clone()),
        SqlValue::Blob(b) => Value::array(b.iter().map(|byte| Value::Integer(i64::from(*byte))).collect()),
    }
}

/// The tag's literal inner text, for `<SQL>...</SQL>`: every child must be
/// a plain string literal (interpolation inside a `<SQL>` body has no
/// meaning — values are bound through attributes, not text).
fn literal_body(children: &[std::rc::Rc<Expr>]) -> Result<String, ErrorValue> {
    let mut body = String::new();
    for child in children {
        match child.as_ref() {
            Expr::Literal(Value::String(s)) => body.push_str(s),
            _ => return Err(ErrorValue::type_error("TYPE-0007", "<SQL> body must be literal text")),
        }
    }
    Ok(body)
}

fn eval_attrs(evaluator: &Evaluator, tag: &TagNode, env: &Environment) -> Result<(TagAttrs, Vec<Value>), ErrorValue> {
    let mut attrs = TagAttrs::new();
    let mut ordered_values = Vec::with_capacity(tag.attrs.len());
    for (name, expr) in &tag.attrs {
        let value = evaluator.eval(expr, env)?;
        ordered_values.push(value.clone());
        match &value {
            Value::Boolean(b) => {
                attrs.set(name.clone(), AttrValue::Bool(*b));
            }
            Value::Null => {}
            other => {
                attrs.set(name.clone(), AttrValue::text(other.to_display_string()));
            }
        }
    }
    for (name, b) in &tag.bool_attrs {
        attrs.set(name.clone(), AttrValue::Bool(*b));
    }
    Ok((attrs, ordered_values))
}

fn render_children(evaluator: &Evaluator, children: &[std::rc::Rc<Expr>], env: &Environment) -> Result<String, ErrorValue> {
    let mut html = String::new();
    for child in children {
        let value = evaluator.eval(child, env)?;
        html.push_str(&value.to_display_string());
    }
    Ok(html)
}

fn render_component(evaluator: &Evaluator, tag: &TagNode, env: &Environment) -> Result<Value, ErrorValue> {
    let callee = env.get(&tag.name)?;
    let (_, values) = eval_attrs(evaluator, tag, env)?;
    let props = Dict::new();
    for ((name, _), value) in tag.attrs.iter().zip(values) {
        props.insert(name.clone(), value);
    }
    for (name, b) in &tag.bool_attrs {
        props.insert(name.clone(), Value::Boolean(*b));
    }
    if !tag.children.is_empty() {
        let children_html = render_children(evaluator, &tag.children, env)?;
        props.insert("children", Value::string(children_html));
    }
    match callee {
        Value::Function(f) => evaluator.call_function(&f, &[Value::Dict(props)]),
        Value::Builtin(b) => b.call(&[Value::Dict(props)]),
        Value::Null => Err(not_callable_error("null", true)),
        other => Err(not_callable_error(other.value_type().as_str(), false)),
    }
}

/// `<CSS/>`, `<Javascript/>`, `<BasilJS/>` (spec §4.2): consult the asset
/// bundler collaborator, or render nothing if it isn't configured / has no
/// URL for that asset.
fn render_asset_tag(evaluator: &Evaluator, name: &str) -> String {
    let Some(bundler) = evaluator.asset_bundler() else {
        return String::new();
    };
    let url = match name {
        "CSS" => bundler.css_url(),
        "Javascript" => bundler.js_url(),
        "BasilJS" => bundler.basil_js_url(),
        _ => None,
    };
    match (name, url) {
        ("CSS", Some(url)) => format!(r#"<link rel="stylesheet" href="{url}">"#),
        ("Javascript" | "BasilJS", Some(url)) => format!(r#"<script src="{url}"></script>"#),
        _ => String::new(),
    }
}

fn render_form_scoped(evaluator: &Evaluator, tag: &TagNode, env: &Environment) -> Result<String, ErrorValue> {
    let stack = evaluator.form_stack();

    match (tag.name.as_str(), &tag.field_attr) {
        ("Label", Some(field)) => {
            let label = render_label(&stack.borrow(), field)?;
            if tag.children.is_empty() {
                return Ok(label);
            }
            let children_html = render_children(evaluator, &tag.children, env)?;
            return Ok(format!("{label}{children_html}"));
        }
        ("Error", Some(field)) => return render_error(&stack.borrow(), field),
        ("Meta", Some(field)) => {
            let key = tag.key_attr.as_deref().unwrap_or_default();
            let _ = key;
            return render_meta(&stack.borrow(), field);
        }
        ("Select", Some(field)) => {
            let (overrides, _) = eval_attrs(evaluator, tag, env)?;
            return render_select(&stack.borrow(), evaluator, field, &overrides);
        }
        _ => {}
    }

    if let Some(field) = &tag.field_attr {
        let (overrides, _) = eval_attrs(evaluator, tag, env)?;
        return parsley_template::formbind::render_field_input(&stack.borrow(), evaluator, field, &overrides);
    }

    render_raw_element(evaluator, tag, env)
}

fn render_raw_element(evaluator: &Evaluator, tag: &TagNode, env: &Environment) -> Result<String, ErrorValue> {
    let (attrs, _) = eval_attrs(evaluator, tag, env)?;
    let mut html = render_open_tag(&tag.name, &attrs);

    if tag.name == "form" {
        if let Some(record_expr) = &tag.record_attr {
            if let Value::Record(record) = evaluator.eval(record_expr, env)? {
                html.push_str(&parsley_template::formbind::form_close_hidden_id(&record, evaluator)?);
            }
        }
    }

    if !is_void_element(&tag.name) {
        html.push_str(&render_children(evaluator, &tag.children, env)?);
        html.push_str(&render_close_tag(&tag.name));
    }
    Ok(html)
}

pub fn render_tag(evaluator: &Evaluator, tag: &TagNode, env: &Environment) -> Result<Value, ErrorValue> {
    if tag.name == "SQL" {
        let body = literal_body(&tag.children)?;
        let (_, values) = eval_attrs(evaluator, tag, env)?;
        let query = build_sql_tag(&body, &values);
        let pairs = vec![
            ("sql".to_string(), Value::string(query.sql)),
            ("params".to_string(), Value::array(query.params.iter().map(sql_value_to_value).collect())),
        ];
        return Ok(Value::Dict(Dict::from_values(pairs)));
    }

    if tag.name == "basil.cache.Cache" {
        let (attrs, _) = eval_attrs(evaluator, tag, env)?;
        let key = attrs.get("key").map(|v| match v {
            AttrValue::Text(s) => Value::string(s.clone()),
            AttrValue::Bool(b) => Value::Boolean(*b),
        });
        let max_age = tag.attrs.iter().find(|(n, _)| n == "maxAge").map(|(_, expr)| evaluator.eval(expr, env)).transpose()?;
        let enabled = match attrs.get("enabled") {
            Some(AttrValue::Bool(b)) => Some(*b),
            _ => None,
        };
        let handler_path = evaluator.handler_path();
        let cacher = evaluator.fragment_cache();
        let dev_mode = evaluator.config().dev_mode;
        let html = parsley_template::cache::render_fragment(
            cacher.as_deref(),
            &handler_path,
            key.as_ref(),
            max_age.as_ref(),
            enabled,
            dev_mode,
            || render_children(evaluator, &tag.children, env),
        )?;
        return Ok(Value::string(html));
    }

    if matches!(tag.name.as_str(), "CSS" | "Javascript" | "BasilJS") {
        return Ok(Value::string(render_asset_tag(evaluator, &tag.name)));
    }

    if is_component_tag(&tag.name) {
        return render_component(evaluator, tag, env);
    }

    if let Some(record_expr) = &tag.record_attr {
        let record = match evaluator.eval(record_expr, env)? {
            Value::Record(r) => r,
            other => return Err(ErrorValue::type_error("TYPE-0008", format!("@record must be a record, got {}", other.value_type().as_str()))),
        };
        evaluator.form_stack().borrow_mut().push(record);
        let result = render_raw_element(evaluator, tag, env);
        evaluator.form_stack().borrow_mut().pop();
        return result.map(Value::string);
    }

    if tag.field_attr.is_some() {
        return render_form_scoped(evaluator, tag, env).map(Value::string);
    }

    render_raw_element(evaluator, tag, env).map(Value::string)
}
