//! # wp_content
//!
//! Renders untrusted WordPress post HTML safely, with interactive embeds.
//!
//! ## Overview
//!
//! `wp_content` sanitizes CMS-supplied HTML, lifts YouTube, Twitter,
//! Facebook and Instagram embeds and content images out of it into typed
//! records, and leaves placeholder markers in their place. A
//! [`ContentOrchestrator`] then loads whatever third-party SDKs the embeds
//! need and mounts a widget into every placeholder.
//!
//! The stages always run in the same order: sanitize, YouTube, Twitter,
//! Facebook, Instagram, images. Sanitizing first keeps hostile markup away
//! from the extractors; extracting embeds before images keeps an embed's
//! preview images from being treated as content.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use wp_content::{PipelineBuilder, ScriptManifest};
//!
//! # async fn example() -> wp_content::Result<()> {
//! let manifest = ScriptManifest::new();
//! let orchestrator = PipelineBuilder::new()
//!     .related_posts_selector(".more-from-espn")
//!     .build_orchestrator(manifest.clone())?;
//!
//! let rendered = orchestrator
//!     .render(r#"<p>Recap</p><iframe src="https://www.youtube.com/embed/abc123"></iframe>"#)
//!     .await;
//!
//! println!("{}{}", rendered.html, rendered.script_tags());
//! # Ok(())
//! # }
//! ```
//!
//! ## Process-wide SDK registry
//!
//! SDKs should be loaded once per process, not once per render. Register a
//! shared registry with [`init`] at startup and build orchestrators around
//! [`global`] with [`PipelineBuilder::build_orchestrator_with`].

pub mod config;
mod dom;
pub mod error;
pub mod extract;
pub mod mount;
pub mod orchestrator;
pub mod pipeline;
pub mod record;
pub mod sanitizer;
pub mod sdk;
pub mod widget;

pub use config::{PipelineBuilder, RenderOptions, SanitizerBackend, TwitterStrategy};
pub use error::{ContentError, Result};
pub use extract::{EmbedExtractor, extractor_for};
pub use mount::{Island, MountState, Rehydration, Rehydrator};
pub use orchestrator::{ContentOrchestrator, RenderedContent};
pub use pipeline::ContentPipeline;
pub use record::{
    EmbedKind, EmbedRecord, FacebookKind, FacebookPost, ImageRecord, InstagramKind,
    InstagramPost, PlaceholderKey, ProcessedContent, Provider, Tweet, YouTubeVideo,
};
pub use sanitizer::{
    AllowListSanitizer, ContentSanitizer, FallbackSanitizer, RelatedPostsFilter, SanitizedHtml,
    Sanitizer, SanitizerPipeline, Strength,
};
pub use sdk::{ScriptManifest, Sdk, SdkLoader, SdkRegistry};
pub use widget::Widget;

use std::any::Any;
use std::sync::{Arc, OnceLock};

// Global state for the optional singleton pattern
static GLOBAL: OnceLock<Box<dyn Any + Send + Sync>> = OnceLock::new();

/// Register `registry` as the process-wide SDK registry.
///
/// Call once at application startup. Returns
/// [`ContentError::RegistryInitialized`] if a registry was already
/// registered; the existing one stays in place.
pub fn init<L: SdkLoader>(registry: SdkRegistry<L>) -> Result<Arc<SdkRegistry<L>>> {
    let registry = Arc::new(registry);
    GLOBAL
        .set(Box::new(Arc::clone(&registry)))
        .map_err(|_| ContentError::RegistryInitialized)?;
    tracing::info!("Process-wide SDK registry initialized");
    Ok(registry)
}

/// Retrieve the registry previously registered with [`init()`].
///
/// Returns `None` if [`init()`] has not been called or if the loader type `L`
/// does not match the type used during initialization.
pub fn global<L: SdkLoader>() -> Option<Arc<SdkRegistry<L>>> {
    GLOBAL
        .get()
        .and_then(|any| any.downcast_ref::<Arc<SdkRegistry<L>>>())
        .map(Arc::clone)
}
