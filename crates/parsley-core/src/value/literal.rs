//! URL, Path, Regex, and Range domain literals (spec §3, §6).

use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    pub raw: String,
    pub scheme: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Url {
    /// Minimal parse sufficient for the `@https://...` literal form (spec
    /// §6); full RFC 3986 compliance is the parser collaborator's concern,
    /// not the value model's.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (scheme, rest) = raw.split_once("://")?;
        let (authority_and_path, fragment) = match rest.split_once('#') {
            Some((a, f)) => (a, Some(f.to_string())),
            None => (rest, None),
        };
        let (authority_and_path, query) = match authority_and_path.split_once('?') {
            Some((a, q)) => (a, Some(q.to_string())),
            None => (authority_and_path, None),
        };
        let (authority, path) = match authority_and_path.find('/') {
            Some(idx) => (&authority_and_path[..idx], authority_and_path[idx..].to_string()),
            None => (authority_and_path, String::new()),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((h, p)) => (Some(h.to_string()), p.parse().ok()),
            None => (Some(authority.to_string()).filter(|s| !s.is_empty()), None),
        };
        Some(Self {
            raw: raw.to_string(),
            scheme: scheme.to_string(),
            host,
            port,
            path,
            query,
            fragment,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// `@/x`
    Absolute,
    /// `@~/x`
    Home,
    /// `@./x`
    Relative,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathLit {
    pub raw: String,
    pub kind: PathKind,
}

impl PathLit {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let kind = if raw.starts_with("./") {
            PathKind::Relative
        } else if raw.starts_with("~/") {
            PathKind::Home
        } else if raw.starts_with('/') {
            PathKind::Absolute
        } else {
            return None;
        };
        Some(Self {
            raw: raw.to_string(),
            kind,
        })
    }
}

/// `/pattern/` literal, compiled eagerly so `.matches()` dispatch never has
/// to re-parse the pattern.
#[derive(Debug, Clone)]
pub struct RegexLit {
    pub pattern: String,
    compiled: Rc<regex::Regex>,
}

impl RegexLit {
    pub fn new(pattern: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        let compiled = Rc::new(regex::Regex::new(&pattern)?);
        Ok(Self { pattern, compiled })
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.compiled.is_match(text)
    }
}

impl PartialEq for RegexLit {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

/// Start, end, inclusive/exclusive endpoints, step (spec §3). Used both as a
/// value and as the `for (k in a..b)` iteration source (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: i64,
    pub end: i64,
    pub inclusive: bool,
    pub step: i64,
}

impl Range {
    #[must_use]
    pub const fn new(start: i64, end: i64, inclusive: bool) -> Self {
        Self {
            start,
            end,
            inclusive,
            step: 1,
        }
    }

    #[must_use]
    pub const fn with_step(mut self, step: i64) -> Self {
        self.step = step;
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        let step = if self.step == 0 { 1 } else { self.step };
        let mut current = self.start;
        let inclusive = self.inclusive;
        let end = self.end;
        std::iter::from_fn(move || {
            let done = if step > 0 {
                if inclusive { current > end } else { current >= end }
            } else if inclusive {
                current < end
            } else {
                current <= end
            };
            if done {
                return None;
            }
            let v = current;
            current += step;
            Some(v)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_parse_splits_components() {
        let u = Url::parse("https://example.com:8080/a/b?q=1#frag").unwrap();
        assert_eq!(u.scheme, "https");
        assert_eq!(u.host.as_deref(), Some("example.com"));
        assert_eq!(u.port, Some(8080));
        assert_eq!(u.path, "/a/b");
        assert_eq!(u.query.as_deref(), Some("q=1"));
        assert_eq!(u.fragment.as_deref(), Some("frag"));
    }

    #[test]
    fn path_kinds() {
        assert_eq!(PathLit::parse("./x").unwrap().kind, PathKind::Relative);
        assert_eq!(PathLit::parse("~/x").unwrap().kind, PathKind::Home);
        assert_eq!(PathLit::parse("/x").unwrap().kind, PathKind::Absolute);
    }

    #[test]
    fn range_iterates_inclusive() {
        let r = Range::new(1, 3, true);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn range_iterates_exclusive_with_step() {
        let r = Range::new(0, 10, false).with_step(3);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![0, 3, 6, 9]);
    }
}
