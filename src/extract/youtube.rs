//! YouTube embeds.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::{EmbedExtractor, descendant_attr, embed_block_url, is_embed_block, query_param, selector};
use crate::dom;
use crate::record::{EmbedKind, Provider, YouTubeVideo};

static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:youtube(?:-nocookie)?\.com/(?:embed/|shorts/|live/|v/|watch/?\?(?:[^#]*&)?v=)|youtu\.be/)([A-Za-z0-9_-]+)",
    )
    .unwrap_or_else(|e| panic!("invalid YouTube URL pattern: {e}"))
});

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").unwrap_or_else(|e| panic!("invalid video id pattern: {e}"))
});

static IFRAME: LazyLock<Selector> = LazyLock::new(|| selector("iframe[src]"));

/// Wrapper classes themes put around a lone YouTube iframe.
const WRAPPER_CLASSES: &[&str] = &[
    "youtube-embed",
    "embed-youtube",
    "youtube-wrapper",
    "youtube-container",
    "video-container",
    "video-wrapper",
    "responsive-video",
];

/// Attributes shortcode output uses for the video ID.
const SHORTCODE_ID_ATTRS: &[&str] = &["data-video-id", "data-videoid", "data-id"];

/// Recognizes, in order of precedence:
///
/// 1. block-editor embed figures (`figure.wp-block-embed.is-provider-youtube`),
/// 2. wrapper divs holding a single YouTube iframe,
/// 3. bare YouTube iframes,
/// 4. shortcode output (`data-youtube-id`, or a `*youtube*` class with a
///    `data-video-id`),
/// 5. `<lite-youtube videoid="...">` custom elements.
pub struct YouTubeExtractor;

impl EmbedExtractor for YouTubeExtractor {
    fn provider(&self) -> Provider {
        Provider::YouTube
    }

    fn extract(&self, element: ElementRef<'_>) -> Option<EmbedKind> {
        embed_block(element)
            .or_else(|| wrapper_div(element))
            .or_else(|| bare_iframe(element))
            .or_else(|| shortcode(element))
            .or_else(|| custom_element(element))
            .map(EmbedKind::YouTube)
    }
}

/// Parse a watch, embed, shorts or short-link URL.
pub(crate) fn video_from_url(url: &str) -> Option<YouTubeVideo> {
    let video_id = VIDEO_URL.captures(url)?.get(1)?.as_str().to_string();
    let autoplay = query_param(url, "autoplay").is_some_and(|v| is_truthy(&v));
    let caption_language = query_param(url, "cc_lang_pref").filter(|v| !v.is_empty());
    Some(YouTubeVideo {
        video_id,
        autoplay,
        caption_language,
    })
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim(), "1" | "true")
}

fn embed_block(el: ElementRef<'_>) -> Option<YouTubeVideo> {
    if !is_embed_block(el, Provider::YouTube) {
        return None;
    }
    descendant_attr(el, &IFRAME, "src")
        .and_then(|src| video_from_url(&src))
        .or_else(|| embed_block_url(el).and_then(|url| video_from_url(&url)))
}

fn wrapper_div(el: ElementRef<'_>) -> Option<YouTubeVideo> {
    if el.value().name() != "div" || !WRAPPER_CLASSES.iter().any(|c| dom::has_class(el, c)) {
        return None;
    }
    if !dom::text(el).is_empty() {
        return None;
    }
    let mut children = el.children().filter_map(ElementRef::wrap);
    let (Some(only), None) = (children.next(), children.next()) else {
        return None;
    };
    bare_iframe(only)
}

fn bare_iframe(el: ElementRef<'_>) -> Option<YouTubeVideo> {
    if el.value().name() != "iframe" {
        return None;
    }
    dom::attr(el, "src").and_then(video_from_url)
}

fn shortcode(el: ElementRef<'_>) -> Option<YouTubeVideo> {
    let id = dom::attr(el, "data-youtube-id").or_else(|| {
        let youtube_class = el
            .value()
            .classes()
            .any(|c| c.to_ascii_lowercase().contains("youtube"));
        if !youtube_class {
            return None;
        }
        SHORTCODE_ID_ATTRS.iter().find_map(|a| dom::attr(el, a))
    })?;
    if !VIDEO_ID.is_match(id) {
        return None;
    }
    Some(YouTubeVideo {
        video_id: id.to_string(),
        autoplay: dom::attr(el, "data-autoplay").is_some_and(is_truthy),
        caption_language: dom::attr(el, "data-cc-lang").map(str::to_string),
    })
}

fn custom_element(el: ElementRef<'_>) -> Option<YouTubeVideo> {
    if el.value().name() != "lite-youtube" {
        return None;
    }
    let id = dom::attr(el, "videoid").filter(|id| VIDEO_ID.is_match(id))?;
    let params = dom::attr(el, "params").unwrap_or_default();
    let mut autoplay = false;
    let mut caption_language = None;
    for (key, value) in url::form_urlencoded::parse(params.as_bytes()) {
        match &*key {
            "autoplay" => autoplay = is_truthy(&value),
            "cc_lang_pref" if !value.is_empty() => caption_language = Some(value.into_owned()),
            _ => {}
        }
    }
    Some(YouTubeVideo {
        video_id: id.to_string(),
        autoplay,
        caption_language,
    })
}
