//! Tag-casing dispatch (spec §4.2: "a tag whose name starts with an
//! uppercase letter is a component reference; lowercase is raw HTML") and
//! void-element rendering.

use crate::attrs::TagAttrs;

/// HTML void elements never take a closing tag or children.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

#[must_use]
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// `<Foo>` vs `<foo>`: first character casing decides component-vs-raw-HTML
/// routing.
#[must_use]
pub fn is_component_tag(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Attributes prefixed `part-` pass through to the rendered element
/// unchanged and untouched by component-level attribute handling (spec
/// §4.2: "`part-*` passthrough").
#[must_use]
pub fn is_passthrough_attr(name: &str) -> bool {
    name.starts_with("part-")
}

/// Renders `<name attrs>` or, for void elements, `<name attrs/>` with no
/// separate close tag expected.
#[must_use]
pub fn render_open_tag(name: &str, attrs: &TagAttrs) -> String {
    if is_void_element(name) {
        format!("<{name}{}/>", attrs.to_html())
    } else {
        format!("<{name}{}>", attrs.to_html())
    }
}

#[must_use]
pub fn render_close_tag(name: &str) -> String {
    if is_void_element(name) {
        String::new()
    } else {
        format!("</{name}>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercase_first_letter_is_a_component() {
        assert!(is_component_tag("Label"));
        assert!(!is_component_tag("div"));
    }

    #[test]
    fn void_elements_self_close() {
        let attrs = TagAttrs::new();
        assert_eq!(render_open_tag("input", &attrs), "<input/>");
        assert_eq!(render_close_tag("input"), "");
    }

    #[test]
    fn paired_elements_get_a_close_tag() {
        assert_eq!(render_close_tag("div"), "</div>");
    }

    #[test]
    fn part_prefixed_attrs_are_recognised_as_passthrough() {
        assert!(is_passthrough_attr("part-header"));
        assert!(!is_passthrough_attr("class"));
    }
}
