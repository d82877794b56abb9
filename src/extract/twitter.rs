//! Twitter / X embeds.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::{EmbedExtractor, embed_block_url, is_embed_block, selector};
use crate::dom;
use crate::record::{EmbedKind, Provider, Tweet};

static STATUS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[/.])(?:twitter|x)\.com/(?:[A-Za-z0-9_#!]+/)*?status(?:es)?/(\d+)")
        .unwrap_or_else(|e| panic!("invalid tweet URL pattern: {e}"))
});

static TWEET_BLOCKQUOTE: LazyLock<Selector> =
    LazyLock::new(|| selector("blockquote.twitter-tweet, blockquote.twitter-video"));

static LINKS: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

/// Recognizes block-editor embed figures for Twitter and the
/// `blockquote.twitter-tweet` markup the tweet embed code produces.
///
/// The tweet ID is read from the last status link in the blockquote (the
/// date link), or from the bare URL in the block wrapper.
pub struct TwitterExtractor;

impl EmbedExtractor for TwitterExtractor {
    fn provider(&self) -> Provider {
        Provider::Twitter
    }

    fn extract(&self, element: ElementRef<'_>) -> Option<EmbedKind> {
        embed_block(element)
            .or_else(|| blockquote(element))
            .map(EmbedKind::Twitter)
    }
}

pub(crate) fn tweet_id(url: &str) -> Option<String> {
    STATUS_URL
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn is_tweet_blockquote(el: ElementRef<'_>) -> bool {
    el.value().name() == "blockquote"
        && (dom::has_class(el, "twitter-tweet") || dom::has_class(el, "twitter-video"))
}

fn hides_thread(el: ElementRef<'_>) -> bool {
    dom::attr(el, "data-conversation").is_some_and(|v| v.eq_ignore_ascii_case("none"))
}

fn status_link(el: ElementRef<'_>) -> Option<String> {
    el.select(&LINKS)
        .filter_map(|a| dom::attr(a, "href").and_then(tweet_id))
        .last()
}

fn embed_block(el: ElementRef<'_>) -> Option<Tweet> {
    if !is_embed_block(el, Provider::Twitter) {
        return None;
    }
    let quote = el.select(&TWEET_BLOCKQUOTE).next();
    let tweet_id = quote
        .and_then(status_link)
        .or_else(|| embed_block_url(el).and_then(|url| tweet_id(&url)))?;
    Some(Tweet {
        tweet_id,
        hide_thread: quote.is_some_and(hides_thread),
    })
}

fn blockquote(el: ElementRef<'_>) -> Option<Tweet> {
    if !is_tweet_blockquote(el) {
        return None;
    }
    Some(Tweet {
        tweet_id: status_link(el)?,
        hide_thread: hides_thread(el),
    })
}
