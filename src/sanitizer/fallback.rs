//! Regex-based fallback sanitizer.

use std::sync::LazyLock;

use regex::Regex;

use super::{FORBIDDEN_TAGS, Sanitizer};
use crate::dom::{IMAGE_MARKER_ATTR, MOUNTED_ATTR};
use crate::record::Provider;

/// Upper bound on rewrite rounds; each round can only shrink the input.
const MAX_ROUNDS: usize = 16;

static HANDLER_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    compile(r#"(?i)\s+on[a-z0-9_-]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#)
});

static SCRIPT_URL: LazyLock<Regex> = LazyLock::new(|| {
    compile(r#"(?i)(\s(?:href|src|action|formaction|xlink:href)\s*=\s*["']?)\s*(?:javascript|vbscript)\s*:"#)
});

static RESERVED_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    let names = Provider::EXTRACTION_ORDER
        .iter()
        .map(|p| p.marker_attr())
        .chain([IMAGE_MARKER_ATTR, MOUNTED_ATTR])
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    compile(&format!(
        r#"(?i)\s+(?:{names})(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+))?([\s/>])"#
    ))
});

static FORBIDDEN_BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    FORBIDDEN_TAGS
        .iter()
        .flat_map(|tag| {
            [
                // element with content
                format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>"),
                // unclosed opening or stray closing tag
                format!(r"(?i)<{tag}\b[^>]*>"),
                format!(r"(?i)</{tag}\s*>"),
            ]
        })
        .map(|pattern| compile(&pattern))
        .collect()
});

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid fallback pattern {pattern}: {e}"))
}

/// Sanitizer that strips obvious script vectors with regular expressions.
///
/// This is a weaker guarantee than [`AllowListSanitizer`](super::AllowListSanitizer):
/// it removes forbidden tags (with their content), inline `on*` handlers,
/// `javascript:` URLs and placeholder marker attributes, but knows nothing
/// about the allow-list. Rules are
/// reapplied until the output stops changing, so running it twice is a no-op.
///
/// # Example
///
/// ```
/// use wp_content::{FallbackSanitizer, Sanitizer};
///
/// let sanitizer = FallbackSanitizer::new();
/// let result = sanitizer.sanitize(r#"<script>alert(1)</script><p onclick="x()">Safe</p>"#);
/// assert_eq!(result, "<p>Safe</p>");
/// ```
#[derive(Clone, Debug, Default)]
pub struct FallbackSanitizer;

impl FallbackSanitizer {
    pub fn new() -> Self {
        Self
    }

    fn round(html: &str) -> String {
        let stripped = FORBIDDEN_BLOCKS
            .iter()
            .fold(html.to_string(), |acc, re| re.replace_all(&acc, "").into_owned());
        let stripped = HANDLER_ATTR.replace_all(&stripped, "");
        let stripped = RESERVED_ATTR.replace_all(&stripped, "${1}");
        SCRIPT_URL.replace_all(&stripped, "${1}#").into_owned()
    }
}

impl Sanitizer for FallbackSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let mut current = html.to_string();
        for _ in 0..MAX_ROUNDS {
            let next = Self::round(&current);
            if next == current {
                return current;
            }
            current = next;
        }
        tracing::warn!("Fallback sanitizer did not settle after {MAX_ROUNDS} rounds");
        current
    }
}
