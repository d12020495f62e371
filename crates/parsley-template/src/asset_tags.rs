//! The special `<CSS/>`, `<Javascript/>`, `<BasilJS/>` tags (spec §4.2):
//! each consults the host's `AssetBundler` and renders nothing when the
//! bundler has no URL for that asset.

use parsley_core::environment::AssetBundler;

#[must_use]
pub fn render_css_tag(bundler: Option<&dyn AssetBundler>) -> String {
    match bundler.and_then(AssetBundler::css_url) {
        Some(url) => format!(r#"<link rel="stylesheet" href="{url}"/>"#),
        None => String::new(),
    }
}

#[must_use]
pub fn render_javascript_tag(bundler: Option<&dyn AssetBundler>) -> String {
    match bundler.and_then(AssetBundler::js_url) {
        Some(url) => format!(r#"<script src="{url}"></script>"#),
        None => String::new(),
    }
}

#[must_use]
pub fn render_basiljs_tag(bundler: Option<&dyn AssetBundler>) -> String {
    match bundler.and_then(AssetBundler::basil_js_url) {
        Some(url) => format!(r#"<script src="{url}"></script>"#),
        None => String::new(),
    }
}
