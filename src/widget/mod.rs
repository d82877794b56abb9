//! Interactive components mounted into placeholders.
//!
//! A widget renders the markup that replaces one placeholder's contents. The
//! social widgets emit the markup their provider's script upgrades in place,
//! so they declare the [`Sdk`] they need; if it cannot be loaded the
//! orchestrator mounts [`Widget::render_fallback`] instead.

mod image;
mod social;
mod youtube;

pub use image::OptimizedImage;
pub use social::{FacebookEmbed, InstagramEmbed, TweetEmbed};
pub use youtube::YouTubePlayer;

use crate::config::RenderOptions;
use crate::dom;
use crate::record::{EmbedKind, EmbedRecord, ImageRecord};
use crate::sdk::Sdk;

/// Renders the live markup for one placeholder.
pub trait Widget: Send + Sync {
    /// SDK that must be loaded before [`render`](Self::render) is usable.
    fn sdk(&self) -> Option<Sdk> {
        None
    }

    fn render(&self) -> String;

    /// Static markup used when the SDK failed to load.
    fn render_fallback(&self) -> String;
}

/// The widget for an extracted embed.
pub fn for_embed(record: &EmbedRecord) -> Box<dyn Widget> {
    match &record.kind {
        EmbedKind::YouTube(video) => Box::new(YouTubePlayer::new(video.clone())),
        EmbedKind::Twitter(tweet) => Box::new(TweetEmbed::new(tweet.clone())),
        EmbedKind::Facebook(post) => Box::new(FacebookEmbed::new(post.clone())),
        EmbedKind::Instagram(post) => Box::new(InstagramEmbed::new(post.clone())),
    }
}

/// The widget for an extracted image.
pub fn for_image(record: &ImageRecord, options: RenderOptions) -> Box<dyn Widget> {
    Box::new(OptimizedImage::new(record.clone(), options))
}

/// Message and link-out shown when an embed cannot be loaded.
pub(crate) fn fallback_card(slug: &str, message: &str, url: &str, link_text: &str) -> String {
    let link = dom::element(
        "a",
        &[
            ("href", url),
            ("target", "_blank"),
            ("rel", "noopener noreferrer"),
        ],
        &html_escape::encode_text(link_text),
    );
    let body = format!("<p>{}</p>{link}", html_escape::encode_text(message));
    let class = format!("embed-fallback {slug}-embed-fallback");
    dom::element("div", &[("class", class.as_str())], &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Tweet, YouTubeVideo};

    #[test]
    fn embed_widgets_declare_their_sdk() {
        let video = EmbedRecord {
            placeholder_id: "youtube-embed-0".into(),
            kind: EmbedKind::YouTube(YouTubeVideo {
                video_id: "abc".into(),
                autoplay: false,
                caption_language: None,
            }),
        };
        let tweet = EmbedRecord {
            placeholder_id: "twitter-embed-0".into(),
            kind: EmbedKind::Twitter(Tweet {
                tweet_id: "1".into(),
                hide_thread: false,
            }),
        };
        assert_eq!(for_embed(&video).sdk(), None);
        assert_eq!(for_embed(&tweet).sdk(), Some(Sdk::Twitter));
    }

    #[test]
    fn fallback_card_escapes_text() {
        assert_eq!(
            fallback_card("twitter", "Can't <load>", "https://x.com/a?b=1&c=2", "View"),
            concat!(
                r#"<div class="embed-fallback twitter-embed-fallback"><p>Can't &lt;load&gt;</p>"#,
                r#"<a href="https://x.com/a?b=1&amp;c=2" target="_blank" rel="noopener noreferrer">View</a></div>"#,
            )
        );
    }
}
