//! Builder for configuring the content pipeline and its orchestrator.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ContentError, Result};
use crate::orchestrator::ContentOrchestrator;
use crate::pipeline::ContentPipeline;
use crate::record::Provider;
use crate::sanitizer::{AllowListSanitizer, ContentSanitizer, RelatedPostsFilter};
use crate::sdk::{SdkLoader, SdkRegistry};

/// Which sanitizer runs before extraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SanitizerBackend {
    /// Parser-based allow-list cleaning.
    #[default]
    Structural,
    /// Regex stripping only. Extraction still upgrades to structural output.
    Fallback,
}

/// How tweets are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TwitterStrategy {
    /// Replace tweets with placeholders and mount a tweet widget into each.
    #[default]
    Extract,
    /// Leave tweet blockquotes in place for the Twitter script to upgrade.
    Defer,
}

/// Presentation settings consumed by the widgets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Aspect ratio (width, height) of the frame around unsized images.
    pub image_aspect_ratio: (u32, u32),
    /// Number of leading images loaded eagerly with high priority.
    pub priority_images: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            image_aspect_ratio: (16, 9),
            priority_images: 1,
        }
    }
}

/// Builder for a [`ContentPipeline`] or [`ContentOrchestrator`].
///
/// # Example
///
/// ```
/// use wp_content::{PipelineBuilder, Provider, TwitterStrategy};
///
/// let pipeline = PipelineBuilder::new()
///     .providers([Provider::YouTube, Provider::Instagram])
///     .twitter_strategy(TwitterStrategy::Defer)
///     .related_posts_selector(".more-stories")
///     .image_aspect_ratio(4, 3)
///     .build()
///     .unwrap();
///
/// let processed = pipeline.process("<p>Hello</p>");
/// assert_eq!(processed.html, "<p>Hello</p>");
/// ```
#[derive(Clone, Debug)]
pub struct PipelineBuilder {
    providers: BTreeSet<Provider>,
    twitter_strategy: TwitterStrategy,
    backend: SanitizerBackend,
    related_posts_selectors: Vec<String>,
    trusted_hosts: Vec<String>,
    options: RenderOptions,
    sdk_timeout: Duration,
}

impl PipelineBuilder {
    /// Create a builder with every provider enabled and sensible defaults.
    ///
    /// Defaults: all providers, tweets extracted, structural sanitizer,
    /// 16:9 image frames, one priority image, 5 s SDK timeout.
    pub fn new() -> Self {
        Self {
            providers: Provider::EXTRACTION_ORDER.into_iter().collect(),
            twitter_strategy: TwitterStrategy::default(),
            backend: SanitizerBackend::default(),
            related_posts_selectors: Vec::new(),
            trusted_hosts: Vec::new(),
            options: RenderOptions::default(),
            sdk_timeout: Duration::from_secs(5),
        }
    }

    /// Restrict extraction to the given providers.
    ///
    /// Passes always run in [`Provider::EXTRACTION_ORDER`], whatever order
    /// they are listed in here.
    pub fn providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers = providers.into_iter().collect();
        self
    }

    pub fn twitter_strategy(mut self, strategy: TwitterStrategy) -> Self {
        self.twitter_strategy = strategy;
        self
    }

    pub fn sanitizer_backend(mut self, backend: SanitizerBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Add a CSS selector for site-specific related-posts blocks.
    pub fn related_posts_selector(mut self, selector: impl Into<String>) -> Self {
        self.related_posts_selectors.push(selector.into());
        self
    }

    /// Trust an additional embed hostname (and its subdomains) for iframe
    /// and media `src` values.
    pub fn trusted_host(mut self, host: impl Into<String>) -> Self {
        self.trusted_hosts.push(host.into());
        self
    }

    pub fn image_aspect_ratio(mut self, width: u32, height: u32) -> Self {
        self.options.image_aspect_ratio = (width, height);
        self
    }

    pub fn priority_images(mut self, count: usize) -> Self {
        self.options.priority_images = count;
        self
    }

    /// Time allowed for a third-party SDK to load before the widget falls back.
    pub fn sdk_timeout(mut self, timeout: Duration) -> Self {
        self.sdk_timeout = timeout;
        self
    }

    /// Validate the configuration and build the pipeline.
    pub fn build(&self) -> Result<ContentPipeline> {
        let (w, h) = self.options.image_aspect_ratio;
        if w == 0 || h == 0 {
            return Err(ContentError::Config(format!(
                "image aspect ratio must be non-zero, got {w}:{h}"
            )));
        }
        if self.trusted_hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(ContentError::Config("trusted host must not be empty".into()));
        }

        let sanitizer = ContentSanitizer::new(
            self.backend,
            RelatedPostsFilter::new(&self.related_posts_selectors)?,
            AllowListSanitizer::with_extra_hosts(&self.trusted_hosts)?,
        );

        Ok(ContentPipeline::new(
            sanitizer,
            self.providers.clone(),
            self.twitter_strategy,
            self.options,
        ))
    }

    /// Build an orchestrator with its own SDK registry around `loader`.
    pub fn build_orchestrator<L: SdkLoader>(&self, loader: L) -> Result<ContentOrchestrator<L>> {
        let registry = Arc::new(SdkRegistry::new(loader, self.sdk_timeout));
        self.build_orchestrator_with(registry)
    }

    /// Build an orchestrator sharing an existing SDK registry, e.g. the
    /// process-wide one from [`global`](crate::global).
    pub fn build_orchestrator_with<L: SdkLoader>(
        &self,
        registry: Arc<SdkRegistry<L>>,
    ) -> Result<ContentOrchestrator<L>> {
        Ok(ContentOrchestrator::new(self.build()?, registry))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
