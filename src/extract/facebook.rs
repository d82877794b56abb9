//! Facebook post and video embeds.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::{EmbedExtractor, embed_block_url, is_embed_block, query_param, selector};
use crate::dom;
use crate::record::{EmbedKind, FacebookKind, FacebookPost, Provider};

static FACEBOOK_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:(?:www|m|web|business)\.)?(?:facebook\.com|fb\.watch)/\S+$")
        .unwrap_or_else(|e| panic!("invalid Facebook URL pattern: {e}"))
});

static VIDEO_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/videos?/|/watch|fb\.watch/|/reel/")
        .unwrap_or_else(|e| panic!("invalid Facebook video pattern: {e}"))
});

static PLUGIN_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?:)?//(?:www\.)?facebook\.com/plugins/(post|video)\.php")
        .unwrap_or_else(|e| panic!("invalid Facebook plugin pattern: {e}"))
});

static SDK_MARKUP: LazyLock<Selector> =
    LazyLock::new(|| selector("div.fb-post[data-href], div.fb-video[data-href]"));

static IFRAME: LazyLock<Selector> = LazyLock::new(|| selector("iframe[src]"));

/// Recognizes block-editor embed figures for Facebook, the SDK markup
/// (`div.fb-post` / `div.fb-video` with `data-href`), and plugin iframes
/// (`facebook.com/plugins/post.php?href=...`).
///
/// SDK markup without a usable `data-href` is left untouched.
pub struct FacebookExtractor;

impl EmbedExtractor for FacebookExtractor {
    fn provider(&self) -> Provider {
        Provider::Facebook
    }

    fn extract(&self, element: ElementRef<'_>) -> Option<EmbedKind> {
        embed_block(element)
            .or_else(|| sdk_markup(element))
            .or_else(|| plugin_iframe(element))
            .map(EmbedKind::Facebook)
    }
}

fn kind_from_url(url: &str) -> FacebookKind {
    if VIDEO_HINT.is_match(url) {
        FacebookKind::Video
    } else {
        FacebookKind::Post
    }
}

fn post(url: &str, kind: Option<FacebookKind>) -> Option<FacebookPost> {
    let url = url.trim();
    if !FACEBOOK_URL.is_match(url) {
        return None;
    }
    Some(FacebookPost {
        url: url.to_string(),
        kind: kind.unwrap_or_else(|| kind_from_url(url)),
    })
}

fn embed_block(el: ElementRef<'_>) -> Option<FacebookPost> {
    if !is_embed_block(el, Provider::Facebook) {
        return None;
    }
    el.select(&SDK_MARKUP)
        .find_map(sdk_markup)
        .or_else(|| el.select(&IFRAME).find_map(plugin_iframe))
        .or_else(|| embed_block_url(el).and_then(|url| post(&url, None)))
}

fn sdk_markup(el: ElementRef<'_>) -> Option<FacebookPost> {
    if el.value().name() != "div" {
        return None;
    }
    let kind = if dom::has_class(el, "fb-video") {
        FacebookKind::Video
    } else if dom::has_class(el, "fb-post") {
        FacebookKind::Post
    } else {
        return None;
    };
    post(dom::attr(el, "data-href")?, Some(kind))
}

fn plugin_iframe(el: ElementRef<'_>) -> Option<FacebookPost> {
    if el.value().name() != "iframe" {
        return None;
    }
    let src = dom::attr(el, "src")?;
    let caps = PLUGIN_SRC.captures(src)?;
    let kind = if caps[1].eq_ignore_ascii_case("video") {
        FacebookKind::Video
    } else {
        FacebookKind::Post
    };
    post(&query_param(src, "href")?, Some(kind))
}
