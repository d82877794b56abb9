//! Embeds upgraded in place by the provider's own script.

use super::{Widget, fallback_card};
use crate::dom;
use crate::record::{FacebookKind, FacebookPost, InstagramKind, InstagramPost, Tweet};
use crate::sdk::Sdk;

/// `blockquote.twitter-tweet` for `widgets.js`.
pub struct TweetEmbed {
    tweet: Tweet,
}

impl TweetEmbed {
    pub fn new(tweet: Tweet) -> Self {
        Self { tweet }
    }

    fn url(&self) -> String {
        format!("https://twitter.com/i/status/{}", self.tweet.tweet_id)
    }
}

impl Widget for TweetEmbed {
    fn sdk(&self) -> Option<Sdk> {
        Some(Sdk::Twitter)
    }

    fn render(&self) -> String {
        let url = self.url();
        let link = dom::element("a", &[("href", url.as_str())], "");
        let mut attrs = vec![("class", "twitter-tweet"), ("data-dnt", "true")];
        if self.tweet.hide_thread {
            attrs.push(("data-conversation", "none"));
        }
        dom::element("blockquote", &attrs, &link)
    }

    fn render_fallback(&self) -> String {
        fallback_card(
            "twitter",
            "This post could not be loaded.",
            &self.url(),
            "View on X",
        )
    }
}

/// `div.fb-post` / `div.fb-video` for the Facebook SDK's XFBML parser.
pub struct FacebookEmbed {
    post: FacebookPost,
}

impl FacebookEmbed {
    pub fn new(post: FacebookPost) -> Self {
        Self { post }
    }
}

impl Widget for FacebookEmbed {
    fn sdk(&self) -> Option<Sdk> {
        Some(Sdk::Facebook)
    }

    fn render(&self) -> String {
        let url = self.post.url.as_str();
        let mut attrs = vec![("data-href", url), ("data-width", "auto")];
        match self.post.kind {
            FacebookKind::Post => {
                attrs.insert(0, ("class", "fb-post"));
                attrs.push(("data-show-text", "true"));
            }
            FacebookKind::Video => {
                attrs.insert(0, ("class", "fb-video"));
                attrs.push(("data-allowfullscreen", "true"));
            }
        }
        dom::element("div", &attrs, "")
    }

    fn render_fallback(&self) -> String {
        let message = match self.post.kind {
            FacebookKind::Post => "This post could not be loaded.",
            FacebookKind::Video => "This video could not be loaded.",
        };
        fallback_card("facebook", message, &self.post.url, "View on Facebook")
    }
}

/// `blockquote.instagram-media` for Instagram's `embed.js`.
pub struct InstagramEmbed {
    post: InstagramPost,
}

impl InstagramEmbed {
    pub fn new(post: InstagramPost) -> Self {
        Self { post }
    }
}

impl Widget for InstagramEmbed {
    fn sdk(&self) -> Option<Sdk> {
        Some(Sdk::Instagram)
    }

    fn render(&self) -> String {
        let url = self.post.url.as_str();
        let link = dom::element(
            "a",
            &[("href", url), ("target", "_blank"), ("rel", "noopener noreferrer")],
            "View this post on Instagram",
        );
        let mut attrs = vec![
            ("class", "instagram-media"),
            ("data-instgrm-permalink", url),
            ("data-instgrm-version", "14"),
        ];
        if self.post.captioned {
            attrs.push(("data-instgrm-captioned", ""));
        }
        dom::element("blockquote", &attrs, &link)
    }

    fn render_fallback(&self) -> String {
        let message = match self.post.kind {
            InstagramKind::Post => "This post could not be loaded.",
            InstagramKind::Reel | InstagramKind::Tv => "This video could not be loaded.",
        };
        fallback_card("instagram", message, &self.post.url, "View on Instagram")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tweet_markup() {
        let widget = TweetEmbed::new(Tweet {
            tweet_id: "42".into(),
            hide_thread: true,
        });
        assert_eq!(
            widget.render(),
            concat!(
                r#"<blockquote class="twitter-tweet" data-dnt="true" data-conversation="none">"#,
                r#"<a href="https://twitter.com/i/status/42"></a></blockquote>"#,
            )
        );
        assert!(widget.render_fallback().contains("View on X"));
    }

    #[test]
    fn facebook_video_markup() {
        let widget = FacebookEmbed::new(FacebookPost {
            url: "https://www.facebook.com/a/videos/1/".into(),
            kind: FacebookKind::Video,
        });
        assert_eq!(
            widget.render(),
            concat!(
                r#"<div class="fb-video" data-href="https://www.facebook.com/a/videos/1/" "#,
                r#"data-width="auto" data-allowfullscreen="true"></div>"#,
            )
        );
        assert!(widget.render_fallback().contains("This video could not be loaded."));
    }

    #[test]
    fn instagram_markup() {
        let widget = InstagramEmbed::new(InstagramPost {
            url: "https://www.instagram.com/p/C1/".into(),
            kind: InstagramKind::Post,
            captioned: true,
        });
        let html = widget.render();
        assert!(html.starts_with(r#"<blockquote class="instagram-media" data-instgrm-permalink="https://www.instagram.com/p/C1/""#));
        assert!(html.contains(r#"data-instgrm-captioned="""#));
        assert_eq!(widget.sdk(), Some(Sdk::Instagram));
    }
}
