//! Ordered tag attribute list and its HTML rendering rule (spec §4.2:
//! "boolean attributes render bare when true, and are omitted when false").
//! Grounded on the teacher's `widgets::WidgetAttrs`, generalised from a
//! `HashMap` (order didn't matter for a single widget's own attrs) to an
//! insertion-ordered `Vec`, since declared order is load-bearing here: the
//! `<SQL>` tag reads its attribute values in declaration order as `?` params.

use crate::escape::html_escape;

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Text(String),
}

impl AttrValue {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

/// A tag's attributes in declaration order, e.g. `<input @field=name required>`.
#[derive(Debug, Clone, Default)]
pub struct TagAttrs(Vec<(String, AttrValue)>);

impl TagAttrs {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Sets (or overwrites, keeping the original position) an attribute.
    pub fn set(&mut self, name: impl Into<String>, value: AttrValue) -> &mut Self {
        let name = name.into();
        if let Some(existing) = self.0.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = value;
        } else {
            self.0.push((name, value));
        }
        self
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.set(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    #[must_use]
    pub fn get_text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(AttrValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Values in the order attributes were declared, e.g. for `<SQL>`'s
    /// positional `?` params.
    #[must_use]
    pub fn values_in_order(&self) -> Vec<&AttrValue> {
        self.0.iter().map(|(_, v)| v).collect()
    }

    /// `(name, value)` pairs in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[(String, AttrValue)] {
        &self.0
    }

    pub fn remove(&mut self, name: &str) {
        self.0.retain(|(n, _)| n != name);
    }

    /// Renders ` name="value"` pairs (leading space), escaping text values
    /// and special-casing booleans (bare when true, omitted when false).
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.0 {
            match value {
                AttrValue::Bool(true) => {
                    out.push(' ');
                    out.push_str(name);
                }
                AttrValue::Bool(false) => {}
                AttrValue::Text(s) => {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html_escape(s));
                    out.push('"');
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_true_renders_bare() {
        let attrs = TagAttrs::new().with("required", AttrValue::Bool(true));
        assert_eq!(attrs.to_html(), " required");
    }

    #[test]
    fn boolean_false_is_omitted() {
        let attrs = TagAttrs::new().with("disabled", AttrValue::Bool(false));
        assert_eq!(attrs.to_html(), "");
    }

    #[test]
    fn text_value_is_escaped() {
        let attrs = TagAttrs::new().with("value", AttrValue::text("<b>"));
        assert_eq!(attrs.to_html(), r#" value="&lt;b&gt;""#);
    }

    #[test]
    fn set_preserves_original_position_on_overwrite() {
        let mut attrs = TagAttrs::new();
        attrs.set("a", AttrValue::text("1"));
        attrs.set("b", AttrValue::text("2"));
        attrs.set("a", AttrValue::text("3"));
        assert_eq!(attrs.values_in_order(), vec![&AttrValue::text("3"), &AttrValue::text("2")]);
    }
}
