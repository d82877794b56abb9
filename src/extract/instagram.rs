//! Instagram post, reel and IGTV embeds.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::{EmbedExtractor, embed_block_url, is_embed_block, selector};
use crate::dom;
use crate::record::{EmbedKind, InstagramKind, InstagramPost, Provider};

static PERMALINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)instagram\.com/(?:[A-Za-z0-9_.]+/)?(p|reels?|tv)/([A-Za-z0-9_-]+)")
        .unwrap_or_else(|e| panic!("invalid Instagram URL pattern: {e}"))
});

static MEDIA_BLOCKQUOTE: LazyLock<Selector> =
    LazyLock::new(|| selector("blockquote.instagram-media"));

static LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

static IFRAME: LazyLock<Selector> = LazyLock::new(|| selector("iframe[src]"));

/// Recognizes block-editor embed figures for Instagram, the
/// `blockquote.instagram-media` embed code, and `/embed` iframes.
///
/// Permalinks are normalized to `https://www.instagram.com/{p|reel|tv}/CODE/`
/// so widget markup does not depend on tracking parameters or the username
/// prefix some share links carry.
pub struct InstagramExtractor;

impl EmbedExtractor for InstagramExtractor {
    fn provider(&self) -> Provider {
        Provider::Instagram
    }

    fn extract(&self, element: ElementRef<'_>) -> Option<EmbedKind> {
        embed_block(element)
            .or_else(|| blockquote(element))
            .or_else(|| embed_iframe(element))
            .map(EmbedKind::Instagram)
    }
}

/// Canonical permalink and kind for an Instagram URL.
pub(crate) fn permalink(url: &str) -> Option<(String, InstagramKind)> {
    let caps = PERMALINK.captures(url)?;
    let (segment, kind) = match caps[1].to_ascii_lowercase().as_str() {
        "p" => ("p", InstagramKind::Post),
        "tv" => ("tv", InstagramKind::Tv),
        _ => ("reel", InstagramKind::Reel),
    };
    Some((
        format!("https://www.instagram.com/{segment}/{}/", &caps[2]),
        kind,
    ))
}

fn post(url: &str, captioned: bool) -> Option<InstagramPost> {
    let (url, kind) = permalink(url)?;
    Some(InstagramPost {
        url,
        kind,
        captioned,
    })
}

fn is_media_blockquote(el: ElementRef<'_>) -> bool {
    el.value().name() == "blockquote" && dom::has_class(el, "instagram-media")
}

fn embed_block(el: ElementRef<'_>) -> Option<InstagramPost> {
    if !is_embed_block(el, Provider::Instagram) {
        return None;
    }
    el.select(&MEDIA_BLOCKQUOTE)
        .find_map(blockquote)
        .or_else(|| el.select(&IFRAME).find_map(embed_iframe))
        .or_else(|| embed_block_url(el).and_then(|url| post(&url, false)))
}

fn blockquote(el: ElementRef<'_>) -> Option<InstagramPost> {
    if !is_media_blockquote(el) {
        return None;
    }
    let captioned = el.value().attr("data-instgrm-captioned").is_some();
    dom::attr(el, "data-instgrm-permalink")
        .and_then(|url| post(url, captioned))
        .or_else(|| {
            el.select(&LINKS)
                .find_map(|a| dom::attr(a, "href").and_then(|url| post(url, captioned)))
        })
}

fn embed_iframe(el: ElementRef<'_>) -> Option<InstagramPost> {
    if el.value().name() != "iframe" {
        return None;
    }
    let src = dom::attr(el, "src")?;
    if !src.to_ascii_lowercase().contains("/embed") {
        return None;
    }
    post(src, src.contains("/captioned"))
}
