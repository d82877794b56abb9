//! The sanitize-then-extract pipeline.

use std::collections::BTreeSet;

use crate::config::{RenderOptions, TwitterStrategy};
use crate::dom;
use crate::extract::{self, Claims};
use crate::record::{ProcessedContent, Provider};
use crate::sanitizer::ContentSanitizer;

/// Turns raw CMS HTML into placeholder HTML plus embed and image records.
///
/// Built with [`PipelineBuilder`](crate::PipelineBuilder). The stages always
/// run in the same order: sanitize, the enabled provider passes in
/// [`Provider::EXTRACTION_ORDER`], then images.
pub struct ContentPipeline {
    sanitizer: ContentSanitizer,
    providers: BTreeSet<Provider>,
    twitter_strategy: TwitterStrategy,
    options: RenderOptions,
}

impl ContentPipeline {
    pub(crate) fn new(
        sanitizer: ContentSanitizer,
        providers: BTreeSet<Provider>,
        twitter_strategy: TwitterStrategy,
        options: RenderOptions,
    ) -> Self {
        Self {
            sanitizer,
            providers,
            twitter_strategy,
            options,
        }
    }

    pub fn is_enabled(&self, provider: Provider) -> bool {
        self.providers.contains(&provider)
    }

    pub fn twitter_strategy(&self) -> TwitterStrategy {
        self.twitter_strategy
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn sanitizer(&self) -> &ContentSanitizer {
        &self.sanitizer
    }

    /// Sanitize `raw` and lift its embeds and images out into records.
    ///
    /// Never fails: markup no pass recognizes stays in the HTML as sanitized.
    pub fn process(&self, raw: &str) -> ProcessedContent {
        let sanitized = self.sanitizer.sanitize(raw);
        let sanitized = self.sanitizer.authoritative(sanitized);

        let document = dom::parse(sanitized.as_str());
        let mut claims = Claims::default();
        let mut content = ProcessedContent::default();

        for provider in Provider::EXTRACTION_ORDER {
            if !self.is_enabled(provider) {
                continue;
            }
            let extractor = extract::extractor_for(provider);
            if provider == Provider::Twitter && self.twitter_strategy == TwitterStrategy::Defer {
                content.deferred_tweets = extract::preserve_pass(&document, extractor, &mut claims);
            } else {
                content
                    .embeds
                    .extend(extract::run_pass(&document, extractor, &mut claims));
            }
        }

        content.images = extract::extract_images(&document, &mut claims);
        content.html = dom::serialize(&document, claims.replacements());

        tracing::debug!(
            embeds = content.embeds.len(),
            images = content.images.len(),
            deferred_tweets = content.deferred_tweets,
            "Processed content"
        );
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineBuilder;
    use crate::record::{EmbedKind, PlaceholderKey};

    fn pipeline() -> ContentPipeline {
        PipelineBuilder::new().build().unwrap()
    }

    #[test]
    fn script_is_removed_and_paragraph_kept() {
        let processed = pipeline().process("<p>Hi</p><script>alert(1)</script>");
        assert_eq!(processed.html, "<p>Hi</p>");
        assert!(processed.embeds.is_empty());
        assert!(processed.images.is_empty());
    }

    #[test]
    fn youtube_figure_becomes_placeholder() {
        let processed = pipeline().process(concat!(
            r#"<figure class="wp-block-embed is-provider-youtube"><div class="wp-block-embed__wrapper">"#,
            r#"<iframe src="https://youtube.com/embed/abc123"></iframe></div></figure>"#,
        ));
        assert_eq!(
            processed.html,
            r#"<div class="youtube-embed-placeholder" data-youtube-placeholder="youtube-embed-0"></div>"#
        );
        assert_eq!(processed.embeds.len(), 1);
        let record = &processed.embeds[0];
        assert_eq!(record.placeholder_id, "youtube-embed-0");
        match &record.kind {
            EmbedKind::YouTube(video) => {
                assert_eq!(video.video_id, "abc123");
                assert!(!video.autoplay);
            }
            other => panic!("unexpected embed {other:?}"),
        }
        processed.verify().unwrap();
    }

    #[test]
    fn images_get_indexed_records() {
        let processed =
            pipeline().process(r#"<img src="a.jpg"><img src="b.jpg" width="100" height="50">"#);
        assert_eq!(processed.images.len(), 2);
        assert_eq!(processed.images[0].index, 0);
        assert!(!processed.images[0].has_intrinsic_size());
        assert_eq!(processed.images[1].width, Some(100));
        assert_eq!(processed.images[1].height, Some(50));
        assert_eq!(
            processed.markers(),
            vec![PlaceholderKey::Image(0), PlaceholderKey::Image(1)]
        );
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let processed = pipeline().process("");
        assert_eq!(processed, ProcessedContent::default());
    }

    #[test]
    fn youtube_claims_before_social_passes() {
        // A YouTube iframe inside a Facebook-looking wrapper belongs to YouTube.
        let processed = pipeline().process(concat!(
            r#"<figure class="wp-block-embed is-provider-facebook"><div class="wp-block-embed__wrapper">"#,
            r#"<iframe src="https://www.youtube.com/embed/nested1"></iframe></div></figure>"#,
        ));
        let providers: Vec<_> = processed.embeds.iter().map(|e| e.provider()).collect();
        assert_eq!(providers, vec![Provider::YouTube]);
        processed.verify().unwrap();
    }

    #[test]
    fn embed_preview_images_are_not_content_images() {
        let processed = pipeline().process(concat!(
            r#"<blockquote class="instagram-media" data-instgrm-permalink="https://www.instagram.com/p/C1/">"#,
            r#"<img src="https://scontent.cdninstagram.com/preview.jpg"></blockquote>"#,
            r#"<img src="content.jpg">"#,
        ));
        assert_eq!(processed.embeds.len(), 1);
        assert_eq!(processed.images.len(), 1);
        assert_eq!(processed.images[0].src, "content.jpg");
        processed.verify().unwrap();
    }

    #[test]
    fn disabled_providers_are_left_in_place() {
        let pipeline = PipelineBuilder::new()
            .providers([Provider::YouTube])
            .build()
            .unwrap();
        let processed = pipeline.process(
            r#"<div class="fb-post" data-href="https://www.facebook.com/a/posts/1"></div>"#,
        );
        assert!(processed.embeds.is_empty());
        assert!(processed.html.contains("fb-post"));
    }

    #[test]
    fn deferred_tweets_stay_in_place() {
        let pipeline = PipelineBuilder::new()
            .twitter_strategy(TwitterStrategy::Defer)
            .build()
            .unwrap();
        let processed = pipeline.process(concat!(
            r#"<blockquote class="twitter-tweet"><p>Hi <img src="emoji.png"></p>"#,
            r#"<a href="https://twitter.com/a/status/5">date</a></blockquote>"#,
        ));
        assert!(processed.embeds.is_empty());
        assert!(processed.images.is_empty());
        assert_eq!(processed.deferred_tweets, 1);
        assert!(processed.html.contains(r#"class="twitter-tweet""#));
        processed.verify().unwrap();
    }

    #[test]
    fn placeholder_ids_restart_per_call() {
        let pipeline = pipeline();
        let html = r#"<iframe src="https://www.youtube.com/embed/a"></iframe>"#;
        let first = pipeline.process(html);
        let second = pipeline.process(html);
        assert_eq!(first.embeds[0].placeholder_id, "youtube-embed-0");
        assert_eq!(first, second);
    }
}
