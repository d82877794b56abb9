//! Value types produced by one sanitize-and-extract pass.
//!
//! Records are created by the extraction passes and consumed once when the
//! matching placeholder is rehydrated. Nothing here is persisted.

use std::collections::HashSet;
use std::fmt;

use crate::dom;
use crate::error::{ContentError, Result};

/// Embed providers recognized by the extraction passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Provider {
    YouTube,
    Twitter,
    Facebook,
    Instagram,
}

impl Provider {
    /// The order extraction passes always run in.
    ///
    /// YouTube runs first so that video markup nested in social wrappers is
    /// claimed before the social passes see it.
    pub const EXTRACTION_ORDER: [Provider; 4] = [
        Provider::YouTube,
        Provider::Twitter,
        Provider::Facebook,
        Provider::Instagram,
    ];

    /// Lowercase slug used in placeholder IDs and marker attributes.
    pub fn slug(self) -> &'static str {
        match self {
            Provider::YouTube => "youtube",
            Provider::Twitter => "twitter",
            Provider::Facebook => "facebook",
            Provider::Instagram => "instagram",
        }
    }

    /// Name of the marker attribute, e.g. `data-youtube-placeholder`.
    pub fn marker_attr(self) -> &'static str {
        match self {
            Provider::YouTube => "data-youtube-placeholder",
            Provider::Twitter => "data-twitter-placeholder",
            Provider::Facebook => "data-facebook-placeholder",
            Provider::Instagram => "data-instagram-placeholder",
        }
    }

    pub(crate) fn from_marker_attr(attr: &str) -> Option<Self> {
        Self::EXTRACTION_ORDER
            .into_iter()
            .find(|p| p.marker_attr() == attr)
    }

    /// Placeholder ID for the `n`-th embed of this provider in one pass.
    pub fn placeholder_id(self, n: usize) -> String {
        format!("{}-embed-{n}", self.slug())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::YouTube => "YouTube",
            Provider::Twitter => "Twitter",
            Provider::Facebook => "Facebook",
            Provider::Instagram => "Instagram",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct YouTubeVideo {
    pub video_id: String,
    pub autoplay: bool,
    /// Preferred caption language (`cc_lang_pref`), if the embed set one.
    pub caption_language: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tweet {
    pub tweet_id: String,
    /// `data-conversation="none"`: render without the parent thread.
    pub hide_thread: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacebookKind {
    Post,
    Video,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacebookPost {
    pub url: String,
    pub kind: FacebookKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstagramKind {
    Post,
    Reel,
    Tv,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstagramPost {
    /// Canonical permalink, e.g. `https://www.instagram.com/p/CODE/`.
    pub url: String,
    pub kind: InstagramKind,
    pub captioned: bool,
}

/// Provider-specific payload of an [`EmbedRecord`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmbedKind {
    YouTube(YouTubeVideo),
    Twitter(Tweet),
    Facebook(FacebookPost),
    Instagram(InstagramPost),
}

impl EmbedKind {
    pub fn provider(&self) -> Provider {
        match self {
            EmbedKind::YouTube(_) => Provider::YouTube,
            EmbedKind::Twitter(_) => Provider::Twitter,
            EmbedKind::Facebook(_) => Provider::Facebook,
            EmbedKind::Instagram(_) => Provider::Instagram,
        }
    }
}

/// One extracted embed and the placeholder that stands in for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedRecord {
    /// `{provider}-embed-{n}`, unique within one extraction call.
    pub placeholder_id: String,
    pub kind: EmbedKind,
}

impl EmbedRecord {
    pub fn provider(&self) -> Provider {
        self.kind.provider()
    }

    pub fn key(&self) -> PlaceholderKey {
        PlaceholderKey::Embed(self.provider(), self.placeholder_id.clone())
    }
}

/// One content image lifted out of the HTML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRecord {
    /// 0-based position in document order.
    pub index: usize,
    pub src: String,
    pub alt: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub classes: Vec<String>,
    pub srcset: Option<String>,
    pub sizes: Option<String>,
}

impl ImageRecord {
    /// Both explicit dimensions are known, so no aspect-ratio frame is needed.
    pub fn has_intrinsic_size(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }

    /// The first image may be above the fold.
    pub fn is_lead(&self) -> bool {
        self.index == 0
    }

    pub fn key(&self) -> PlaceholderKey {
        PlaceholderKey::Image(self.index)
    }
}

/// Address of a placeholder marker element.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlaceholderKey {
    Embed(Provider, String),
    Image(usize),
}

impl PlaceholderKey {
    /// The marker attribute name and value that identify this placeholder.
    pub fn marker(&self) -> (&'static str, String) {
        match self {
            PlaceholderKey::Embed(provider, id) => (provider.marker_attr(), id.clone()),
            PlaceholderKey::Image(index) => (dom::IMAGE_MARKER_ATTR, index.to_string()),
        }
    }
}

impl fmt::Display for PlaceholderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceholderKey::Embed(_, id) => f.write_str(id),
            PlaceholderKey::Image(index) => write!(f, "content-image-{index}"),
        }
    }
}

/// Output of [`ContentPipeline::process`](crate::ContentPipeline::process).
///
/// `html` holds no live embeds and no live `<img>` tags, only placeholder
/// markers; `embeds` and `images` describe what each marker stands for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessedContent {
    pub html: String,
    pub embeds: Vec<EmbedRecord>,
    pub images: Vec<ImageRecord>,
    /// Tweets left in place for the Twitter script to upgrade.
    pub deferred_tweets: usize,
}

impl ProcessedContent {
    /// Keys of every record, embeds first then images.
    pub fn record_keys(&self) -> Vec<PlaceholderKey> {
        self.embeds
            .iter()
            .map(EmbedRecord::key)
            .chain(self.images.iter().map(ImageRecord::key))
            .collect()
    }

    /// Marker keys found in `html`, in document order.
    pub fn markers(&self) -> Vec<PlaceholderKey> {
        dom::find_markers(&self.html)
    }

    /// Check that markers and records correspond one-to-one.
    pub fn verify(&self) -> Result<()> {
        let records: HashSet<PlaceholderKey> = self.record_keys().into_iter().collect();
        let mut seen = HashSet::new();

        for key in self.markers() {
            if !seen.insert(key.clone()) {
                return Err(ContentError::DuplicatePlaceholder(key));
            }
            if !records.contains(&key) {
                return Err(ContentError::OrphanPlaceholder(key));
            }
        }

        match records.into_iter().find(|key| !seen.contains(key)) {
            Some(key) => Err(ContentError::MissingPlaceholder(key)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(index: usize) -> ImageRecord {
        ImageRecord {
            index,
            src: format!("{index}.jpg"),
            alt: String::new(),
            width: None,
            height: None,
            classes: Vec::new(),
            srcset: None,
            sizes: None,
        }
    }

    #[test]
    fn placeholder_ids_follow_provider_slug() {
        assert_eq!(Provider::YouTube.placeholder_id(0), "youtube-embed-0");
        assert_eq!(Provider::Instagram.placeholder_id(3), "instagram-embed-3");
    }

    #[test]
    fn marker_attr_round_trips() {
        for provider in Provider::EXTRACTION_ORDER {
            assert_eq!(
                Provider::from_marker_attr(provider.marker_attr()),
                Some(provider)
            );
        }
        assert_eq!(Provider::from_marker_attr("data-other-placeholder"), None);
    }

    #[test]
    fn verify_accepts_matching_markers() {
        let content = ProcessedContent {
            html: r#"<p>a</p><span data-content-image="0"></span>"#.into(),
            images: vec![image(0)],
            ..Default::default()
        };
        assert!(content.verify().is_ok());
    }

    #[test]
    fn verify_reports_orphan_marker() {
        let content = ProcessedContent {
            html: r#"<div data-youtube-placeholder="youtube-embed-0"></div>"#.into(),
            ..Default::default()
        };
        assert!(matches!(
            content.verify(),
            Err(ContentError::OrphanPlaceholder(_))
        ));
    }

    #[test]
    fn verify_reports_missing_marker() {
        let content = ProcessedContent {
            html: "<p>no markers</p>".into(),
            images: vec![image(0)],
            ..Default::default()
        };
        assert!(matches!(
            content.verify(),
            Err(ContentError::MissingPlaceholder(PlaceholderKey::Image(0)))
        ));
    }

    #[test]
    fn verify_reports_duplicate_marker() {
        let content = ProcessedContent {
            html: r#"<span data-content-image="0"></span><span data-content-image="0"></span>"#
                .into(),
            images: vec![image(0)],
            ..Default::default()
        };
        assert!(matches!(
            content.verify(),
            Err(ContentError::DuplicatePlaceholder(_))
        ));
    }

    #[test]
    fn intrinsic_size_requires_both_dimensions() {
        let mut record = image(1);
        record.width = Some(100);
        assert!(!record.has_intrinsic_size());
        record.height = Some(50);
        assert!(record.has_intrinsic_size());
        assert!(!record.is_lead());
    }
}
