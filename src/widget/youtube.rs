//! Privacy-enhanced YouTube player.

use url::form_urlencoded;

use super::{Widget, fallback_card};
use crate::dom;
use crate::record::YouTubeVideo;

const EMBED_BASE: &str = "https://www.youtube-nocookie.com/embed/";

const ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

/// Privacy-enhanced YouTube iframe player. Needs no SDK.
pub struct YouTubePlayer {
    video: YouTubeVideo,
}

impl YouTubePlayer {
    pub fn new(video: YouTubeVideo) -> Self {
        Self { video }
    }

    /// Player URL with autoplay and caption preferences applied.
    pub fn embed_url(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("rel", "0");
        if self.video.autoplay {
            // browsers only allow muted autoplay
            query.append_pair("autoplay", "1");
            query.append_pair("mute", "1");
        }
        if let Some(lang) = &self.video.caption_language {
            query.append_pair("cc_load_policy", "1");
            query.append_pair("cc_lang_pref", lang);
        }
        format!(
            "{EMBED_BASE}{}?{}",
            form_urlencoded::byte_serialize(self.video.video_id.as_bytes()).collect::<String>(),
            query.finish()
        )
    }

    fn watch_url(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("v", &self.video.video_id);
        format!("https://www.youtube.com/watch?{}", query.finish())
    }
}

impl Widget for YouTubePlayer {
    fn render(&self) -> String {
        let src = self.embed_url();
        let iframe = dom::element(
            "iframe",
            &[
                ("src", src.as_str()),
                ("title", "YouTube video player"),
                ("allow", ALLOW),
                ("allowfullscreen", ""),
                ("loading", "lazy"),
                ("referrerpolicy", "strict-origin-when-cross-origin"),
            ],
            "",
        );
        dom::element("div", &[("class", "youtube-player")], &iframe)
    }

    fn render_fallback(&self) -> String {
        fallback_card(
            "youtube",
            "This video could not be loaded.",
            &self.watch_url(),
            "Watch on YouTube",
        )
    }
}
