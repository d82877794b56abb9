//! Removal of CMS-injected "Related Posts" blocks.

use std::sync::{Arc, LazyLock};

use ego_tree::NodeRef;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Selector};

use super::Sanitizer;
use crate::dom::{self, Replacements};
use crate::error::{ContentError, Result};

/// Class and ID conventions used by common related-posts plugins.
pub const RELATED_POSTS_SELECTORS: &[&str] = &[
    "#jp-relatedposts",
    ".jp-relatedposts",
    ".wp-block-jetpack-related-posts",
    ".related-posts",
    ".yarpp-related",
    ".crp_related",
    "[class*=\"related-posts\"]",
    "[id*=\"related-posts\"]",
    "[class*=\"relatedposts\"]",
];

static RELATED_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^related\s+posts?\s*:?$")
        .unwrap_or_else(|e| panic!("invalid related heading pattern: {e}"))
});

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Lists or containers that hold the links under a "Related Posts" heading.
const HEADING_FOLLOWERS: &[&str] = &["ul", "ol", "div", "section", "aside", "nav"];

/// Sanitizer that drops related-posts blocks injected by the CMS.
///
/// Matches elements by the plugin selectors in [`RELATED_POSTS_SELECTORS`]
/// (plus any configured extras), and headings whose text is "Related Posts"
/// together with the list that follows them. If nothing matches, the input
/// is returned unchanged.
///
/// # Example
///
/// ```
/// use wp_content::{RelatedPostsFilter, Sanitizer};
///
/// let filter = RelatedPostsFilter::default();
/// let html = r#"<p>Story</p><div id="jp-relatedposts"><a href="/x">X</a></div>"#;
/// assert_eq!(filter.sanitize(html), "<p>Story</p>");
/// ```
#[derive(Clone)]
pub struct RelatedPostsFilter {
    selectors: Arc<Vec<Selector>>,
}

impl RelatedPostsFilter {
    /// Build a filter from the built-in selectors plus `extra` CSS selectors.
    pub fn new(extra: &[String]) -> Result<Self> {
        let selectors = RELATED_POSTS_SELECTORS
            .iter()
            .copied()
            .chain(extra.iter().map(String::as_str))
            .map(|css| {
                Selector::parse(css)
                    .map_err(|e| ContentError::Config(format!("invalid selector {css:?}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            selectors: Arc::new(selectors),
        })
    }
}

impl Default for RelatedPostsFilter {
    fn default() -> Self {
        let selectors = RELATED_POSTS_SELECTORS
            .iter()
            .filter_map(|css| Selector::parse(css).ok())
            .collect();
        Self {
            selectors: Arc::new(selectors),
        }
    }
}

fn is_related_heading(el: ElementRef<'_>) -> bool {
    HEADINGS.contains(&el.value().name()) && RELATED_HEADING.is_match(&dom::text(el))
}

fn next_element_sibling(node: NodeRef<'_, Node>) -> Option<ElementRef<'_>> {
    node.next_siblings().find_map(ElementRef::wrap)
}

impl Sanitizer for RelatedPostsFilter {
    fn sanitize(&self, html: &str) -> String {
        let document = dom::parse(html);
        let mut removed = Replacements::new();

        for selector in self.selectors.iter() {
            for element in document.select(selector) {
                removed.insert(element.id(), String::new());
            }
        }

        for node in document.root_element().descendants() {
            let Some(heading) = ElementRef::wrap(node) else {
                continue;
            };
            if !is_related_heading(heading) {
                continue;
            }
            removed.insert(heading.id(), String::new());
            if let Some(list) = next_element_sibling(node)
                .filter(|el| HEADING_FOLLOWERS.contains(&el.value().name()))
            {
                removed.insert(list.id(), String::new());
            }
        }

        if removed.is_empty() {
            return html.to_string();
        }

        tracing::debug!("Removing {} related-posts node(s)", removed.len());
        dom::serialize(&document, &removed)
    }
}
