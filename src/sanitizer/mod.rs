//! Sanitization of CMS-supplied HTML before any extraction pass sees it.
//!
//! Sanitizers implement the [`Sanitizer`] trait and are composed into a
//! [`SanitizerPipeline`] that runs them sequentially.
//!
//! Built-in sanitizers:
//!
//! - [`RelatedPostsFilter`] -- removes CMS-injected "Related Posts" blocks.
//! - [`AllowListSanitizer`] -- parser-based allow-list cleaning (authoritative).
//! - [`FallbackSanitizer`] -- regex-based stripping of scripts and handlers.
//!
//! [`ContentSanitizer`] wires these together for the content pipeline.

mod allow_list;
mod fallback;
mod related_posts;

pub use allow_list::AllowListSanitizer;
pub use fallback::FallbackSanitizer;
pub use related_posts::RelatedPostsFilter;

use crate::config::SanitizerBackend;

/// Tags removed together with their content, whatever the allow-list says.
pub const FORBIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "slot"];

/// Trait for HTML content sanitizers.
///
/// Each sanitizer receives an HTML string and returns a transformed version.
/// Running a sanitizer on its own output must not change it.
pub trait Sanitizer: Send + Sync {
    /// Transform the given HTML content, returning the sanitized result.
    fn sanitize(&self, html: &str) -> String;
}

/// An ordered chain of [`Sanitizer`] implementations applied sequentially.
///
/// Each sanitizer receives the output of the previous one. An empty pipeline
/// is a no-op.
pub struct SanitizerPipeline {
    sanitizers: Vec<Box<dyn Sanitizer>>,
}

impl SanitizerPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self {
            sanitizers: Vec::new(),
        }
    }

    /// Append a sanitizer to the end of the pipeline.
    pub fn add(&mut self, sanitizer: impl Sanitizer + 'static) {
        self.sanitizers.push(Box::new(sanitizer));
    }

    /// Run the full pipeline on the given HTML, returning the final result.
    pub fn sanitize(&self, html: &str) -> String {
        self.sanitizers
            .iter()
            .fold(html.to_string(), |acc, s| s.sanitize(&acc))
    }

    /// Returns `true` if no sanitizers have been added.
    pub fn is_empty(&self) -> bool {
        self.sanitizers.is_empty()
    }
}

impl Default for SanitizerPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// How strong the guarantee behind a [`SanitizedHtml`] is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    /// Regex stripping only; must be re-sanitized before it is trusted.
    Fallback,
    /// Parsed and cleaned against the allow-list.
    Authoritative,
}

/// HTML that has been through one of the sanitizer backends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SanitizedHtml {
    html: String,
    strength: Strength,
}

impl SanitizedHtml {
    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    pub fn is_authoritative(&self) -> bool {
        self.strength == Strength::Authoritative
    }

    pub fn into_string(self) -> String {
        self.html
    }
}

/// The sanitizer used by the content pipeline.
///
/// Runs the Related-Posts pre-pass, then either the allow-list sanitizer or
/// the regex fallback. Fallback output is tagged as such and can be upgraded
/// with [`authoritative`](Self::authoritative).
pub struct ContentSanitizer {
    backend: SanitizerBackend,
    structural: SanitizerPipeline,
    fallback: SanitizerPipeline,
}

impl ContentSanitizer {
    pub fn new(
        backend: SanitizerBackend,
        related_posts: RelatedPostsFilter,
        allow_list: AllowListSanitizer,
    ) -> Self {
        let mut structural = SanitizerPipeline::new();
        structural.add(related_posts.clone());
        structural.add(allow_list);

        let mut fallback = SanitizerPipeline::new();
        fallback.add(related_posts);
        fallback.add(FallbackSanitizer::new());

        Self {
            backend,
            structural,
            fallback,
        }
    }

    /// Sanitize with the configured backend.
    pub fn sanitize(&self, html: &str) -> SanitizedHtml {
        self.sanitize_with(html, self.backend)
    }

    /// Sanitize with an explicit backend.
    pub fn sanitize_with(&self, html: &str, backend: SanitizerBackend) -> SanitizedHtml {
        match backend {
            SanitizerBackend::Structural => SanitizedHtml {
                html: self.structural.sanitize(html),
                strength: Strength::Authoritative,
            },
            SanitizerBackend::Fallback => SanitizedHtml {
                html: self.fallback.sanitize(html),
                strength: Strength::Fallback,
            },
        }
    }

    /// Re-run the structural pass on content that only had the fallback.
    pub fn authoritative(&self, content: SanitizedHtml) -> SanitizedHtml {
        if content.is_authoritative() {
            return content;
        }
        tracing::debug!("Upgrading fallback-sanitized content");
        self.sanitize_with(&content.html, SanitizerBackend::Structural)
    }
}
