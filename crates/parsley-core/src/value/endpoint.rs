//! Typed endpoint wrapper (spec §4.4): `JSON(url(...))` / `text(url(...))`,
//! optionally refined by `.put`/`.patch`/`.delete` method accessors. The
//! evaluator matches on this variant to reject remote-write/fetch targets
//! that are bare strings or untyped URLs.

use crate::response::ResponseFormat;
use crate::value::literal::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: Url,
    pub format: ResponseFormat,
    pub method: HttpMethod,
}

impl Endpoint {
    #[must_use]
    pub const fn new(url: Url, format: ResponseFormat) -> Self {
        Self { url, format, method: HttpMethod::Post }
    }

    #[must_use]
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// `=/=>>` append-write method override (spec §4.4: "driver-defined"
    /// PATCH-append semantics for the default write method).
    #[must_use]
    pub fn append_method(&self) -> HttpMethod {
        match self.method {
            HttpMethod::Post => HttpMethod::Patch,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://example.com/a").unwrap()
    }

    #[test]
    fn default_method_is_post() {
        let e = Endpoint::new(url(), ResponseFormat::Json);
        assert_eq!(e.method.as_str(), "POST");
    }

    #[test]
    fn method_accessor_overrides_default() {
        let e = Endpoint::new(url(), ResponseFormat::Json).with_method(HttpMethod::Put);
        assert_eq!(e.method.as_str(), "PUT");
    }

    #[test]
    fn append_write_defaults_to_patch() {
        let e = Endpoint::new(url(), ResponseFormat::Json);
        assert_eq!(e.append_method().as_str(), "PATCH");
    }
}
