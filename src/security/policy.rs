//! Protected-path classification.
//!
//! Path matching is case-sensitive prefix matching, compiled once at startup.
//! Paths are percent-decoded and repeated slashes collapsed before matching,
//! since the document service routes on the decoded path.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// Decides which request paths go through admission control.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    prefixes: Vec<String>,
}

impl AdmissionPolicy {
    pub fn from_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// True iff the decoded `path` starts with any protected prefix.
    pub fn is_protected(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

/// Decode `%XX` escapes and collapse runs of `/` into one.
pub fn normalize_path(raw: &str) -> Cow<'_, str> {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    if !decoded.contains("//") {
        return decoded;
    }

    let mut out = String::with_capacity(decoded.len());
    for c in decoded.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    Cow::Owned(out)
}
