//! Parser-based allow-list sanitizer.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use super::{FORBIDDEN_TAGS, Sanitizer};
use crate::dom;
use crate::error::{ContentError, Result};

const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "article", "aside", "audio", "b", "blockquote", "br", "caption", "cite", "code",
    "col", "colgroup", "dd", "del", "details", "div", "dl", "dt", "em", "figcaption", "figure",
    "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "iframe", "img", "ins", "kbd", "li",
    "lite-youtube", "mark", "ol", "p", "picture", "pre", "q", "s", "section", "small", "source",
    "span", "strong", "sub", "summary", "sup", "table", "tbody", "td", "tfoot", "th", "thead",
    "time", "tr", "track", "u", "ul", "video",
];

const GENERIC_ATTRIBUTES: &[&str] = &["class", "id", "title", "lang", "dir", "style", "role"];

const GENERIC_ATTRIBUTE_PREFIXES: &[&str] = &["data-", "aria-"];

const TAG_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "target", "rel", "name"]),
    (
        "img",
        &["src", "srcset", "sizes", "alt", "width", "height", "loading", "decoding"],
    ),
    (
        "iframe",
        &[
            "src",
            "width",
            "height",
            "title",
            "allow",
            "allowfullscreen",
            "frameborder",
            "loading",
            "referrerpolicy",
        ],
    ),
    (
        "video",
        &[
            "src", "controls", "poster", "width", "height", "preload", "muted", "loop",
            "playsinline",
        ],
    ),
    ("audio", &["src", "controls", "preload", "loop"]),
    ("source", &["src", "srcset", "type", "media", "sizes"]),
    ("track", &["src", "kind", "srclang", "label", "default"]),
    ("td", &["colspan", "rowspan", "headers"]),
    ("th", &["colspan", "rowspan", "headers", "scope"]),
    ("col", &["span"]),
    ("colgroup", &["span"]),
    ("ol", &["start", "reversed", "type"]),
    ("li", &["value"]),
    ("time", &["datetime"]),
    ("blockquote", &["cite"]),
    ("q", &["cite"]),
    ("del", &["cite", "datetime"]),
    ("ins", &["cite", "datetime"]),
    ("details", &["open"]),
    ("lite-youtube", &["videoid", "params", "playlabel"]),
];

/// Elements whose `src` must point at a trusted embed host.
const HOST_CHECKED_ELEMENTS: &[&str] = &["iframe", "video", "audio", "source", "track"];

/// Hostnames trusted as embed sources; subdomains are trusted too.
pub const TRUSTED_EMBED_HOSTS: &[&str] = &[
    "youtube.com",
    "youtube-nocookie.com",
    "youtu.be",
    "vimeo.com",
    "twitter.com",
    "x.com",
    "facebook.com",
    "instagram.com",
    "spotify.com",
    "soundcloud.com",
    "podcasts.apple.com",
    "streamable.com",
    "tiktok.com",
    "dailymotion.com",
    "twitch.tv",
];

static DEFAULT_TRUSTED_SRC: LazyLock<Regex> = LazyLock::new(|| {
    trusted_src_pattern(&[]).unwrap_or_else(|e| panic!("built-in host pattern is invalid: {e}"))
});

/// Build the `src` allow-list regex for the built-in hosts plus `extra`.
fn trusted_src_pattern(extra: &[String]) -> Result<Regex> {
    let hosts = TRUSTED_EMBED_HOSTS
        .iter()
        .map(|h| regex::escape(h))
        .chain(extra.iter().map(|h| regex::escape(h.trim())))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i)^(?:https?:)?//(?:[a-z0-9-]+\.)*(?:{hosts})(?:[:/?#]|$)");
    Regex::new(&pattern).map_err(|e| ContentError::Config(format!("trusted hosts: {e}")))
}

/// Allow-list sanitizer backed by `ammonia`.
///
/// Only the allow-listed tags survive (others are unwrapped, keeping their text),
/// attributes are allow-listed per tag plus `data-*` / `aria-*`, and the
/// `src` of iframes and media elements must match a trusted embed host.
/// The crate's own placeholder marker attributes are always dropped.
/// Forbidden tags are dropped together with their content.
///
/// # Example
///
/// ```
/// use wp_content::{AllowListSanitizer, Sanitizer};
///
/// let sanitizer = AllowListSanitizer::default();
/// let html = r#"<p onclick="x()">Hi</p><iframe src="https://evil.example/"></iframe>"#;
/// assert_eq!(sanitizer.sanitize(html), "<p>Hi</p><iframe></iframe>");
/// ```
pub struct AllowListSanitizer {
    cleaner: ammonia::Builder<'static>,
    trusted: Regex,
}

impl AllowListSanitizer {
    /// Trust `extra_hosts` as embed sources in addition to the built-in list.
    pub fn with_extra_hosts(extra_hosts: &[String]) -> Result<Self> {
        let trusted = if extra_hosts.is_empty() {
            DEFAULT_TRUSTED_SRC.clone()
        } else {
            trusted_src_pattern(extra_hosts)?
        };
        Ok(Self {
            cleaner: cleaner(trusted.clone()),
            trusted,
        })
    }

    /// Whether `src` would be kept on an iframe or media element.
    pub fn is_trusted_src(&self, src: &str) -> bool {
        self.trusted.is_match(src)
    }
}

impl Default for AllowListSanitizer {
    fn default() -> Self {
        Self {
            cleaner: cleaner(DEFAULT_TRUSTED_SRC.clone()),
            trusted: DEFAULT_TRUSTED_SRC.clone(),
        }
    }
}

fn cleaner(trusted: Regex) -> ammonia::Builder<'static> {
    let tag_attributes: HashMap<&str, HashSet<&str>> = TAG_ATTRIBUTES
        .iter()
        .map(|(tag, attrs)| (*tag, attrs.iter().copied().collect()))
        .collect();

    let mut builder = ammonia::Builder::default();
    builder
        .tags(ALLOWED_TAGS.iter().copied().collect())
        .clean_content_tags(FORBIDDEN_TAGS.iter().copied().collect())
        .generic_attributes(GENERIC_ATTRIBUTES.iter().copied().collect())
        .generic_attribute_prefixes(GENERIC_ATTRIBUTE_PREFIXES.iter().copied().collect())
        .tag_attributes(tag_attributes)
        .link_rel(None)
        .strip_comments(true)
        .attribute_filter(move |element, attribute, value| {
            if dom::is_reserved_attr(attribute) {
                tracing::trace!("Dropping reserved attribute {attribute} on <{element}>");
                return None;
            }
            if attribute == "src"
                && HOST_CHECKED_ELEMENTS.contains(&element)
                && !trusted.is_match(value)
            {
                tracing::trace!("Dropping untrusted <{element}> src: {value}");
                return None;
            }
            Some(Cow::Borrowed(value))
        });
    builder
}

impl Sanitizer for AllowListSanitizer {
    fn sanitize(&self, html: &str) -> String {
        self.cleaner.clean(html).to_string()
    }
}
