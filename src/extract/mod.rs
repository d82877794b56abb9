//! Extraction passes that lift embeds and images out of sanitized HTML.
//!
//! The sanitized fragment is parsed once. Each pass walks the tree in
//! document order and *claims* the subtrees it recognizes; later passes never
//! descend into claimed subtrees, so an embed claimed by the YouTube pass is
//! invisible to the social passes and its preview images are invisible to the
//! image pass. Claimed nodes are swapped for placeholder markers when the tree
//! is serialized.

mod facebook;
mod image;
mod instagram;
mod twitter;
mod youtube;

pub use facebook::FacebookExtractor;
pub(crate) use image::extract_images;
pub use instagram::InstagramExtractor;
pub use twitter::TwitterExtractor;
pub use youtube::YouTubeExtractor;

use std::collections::HashSet;
use std::sync::LazyLock;

use ego_tree::{NodeId, NodeRef};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::dom::{self, Replacements};
use crate::record::{EmbedKind, EmbedRecord, PlaceholderKey, Provider};

/// Recognizes one provider's embed markup.
///
/// An extractor is asked about every unclaimed element, outermost first. It
/// returns `None` for anything it cannot describe with a valid identifier;
/// such markup is left in the HTML unchanged and its children are still
/// offered to the extractor.
pub trait EmbedExtractor: Send + Sync {
    fn provider(&self) -> Provider;

    fn extract(&self, element: ElementRef<'_>) -> Option<EmbedKind>;
}

/// The extractor for `provider`.
pub fn extractor_for(provider: Provider) -> &'static dyn EmbedExtractor {
    match provider {
        Provider::YouTube => &YouTubeExtractor,
        Provider::Twitter => &TwitterExtractor,
        Provider::Facebook => &FacebookExtractor,
        Provider::Instagram => &InstagramExtractor,
    }
}

/// Subtrees taken by earlier passes.
#[derive(Default)]
pub(crate) struct Claims {
    replacements: Replacements,
    preserved: HashSet<NodeId>,
}

impl Claims {
    fn is_claimed(&self, id: NodeId) -> bool {
        self.replacements.contains_key(&id) || self.preserved.contains(&id)
    }

    /// Swap the node for `html` at serialization time.
    pub(crate) fn replace(&mut self, id: NodeId, html: String) {
        self.replacements.insert(id, html);
    }

    /// Keep the node as-is but hide it from later passes.
    pub(crate) fn preserve(&mut self, id: NodeId) {
        self.preserved.insert(id);
    }

    pub(crate) fn replacements(&self) -> &Replacements {
        &self.replacements
    }
}

/// Collect `(node, value)` for every unclaimed element `matcher` accepts,
/// without descending into accepted or claimed subtrees.
pub(crate) fn collect_unclaimed<'a, T>(
    node: NodeRef<'a, Node>,
    claims: &Claims,
    matcher: &mut dyn FnMut(ElementRef<'a>) -> Option<T>,
    found: &mut Vec<(NodeRef<'a, Node>, T)>,
) {
    for child in node.children() {
        if claims.is_claimed(child.id()) {
            continue;
        }
        if let Some(value) = ElementRef::wrap(child).and_then(|el| matcher(el)) {
            found.push((child, value));
            continue;
        }
        collect_unclaimed(child, claims, matcher, found);
    }
}

/// Run one provider pass, replacing each match with a placeholder.
pub(crate) fn run_pass(
    document: &Html,
    extractor: &dyn EmbedExtractor,
    claims: &mut Claims,
) -> Vec<EmbedRecord> {
    let provider = extractor.provider();
    let mut found = Vec::new();
    collect_unclaimed(
        *document.root_element(),
        claims,
        &mut |el| extractor.extract(el),
        &mut found,
    );

    let class = format!("{}-embed-placeholder", provider.slug());
    let records: Vec<EmbedRecord> = found
        .into_iter()
        .enumerate()
        .map(|(n, (node, kind))| {
            let placeholder_id = provider.placeholder_id(n);
            let key = PlaceholderKey::Embed(provider, placeholder_id.clone());
            let tag = dom::placeholder_tag(node);
            claims.replace(node.id(), dom::placeholder(tag, &class, &key));
            EmbedRecord {
                placeholder_id,
                kind,
            }
        })
        .collect();

    tracing::debug!("{provider} pass extracted {} embed(s)", records.len());
    records
}

/// Run one provider pass, leaving matches in place but claimed.
pub(crate) fn preserve_pass(
    document: &Html,
    extractor: &dyn EmbedExtractor,
    claims: &mut Claims,
) -> usize {
    let mut found = Vec::new();
    collect_unclaimed(
        *document.root_element(),
        claims,
        &mut |el| extractor.extract(el),
        &mut found,
    );
    for (node, _) in &found {
        claims.preserve(node.id());
    }
    tracing::debug!(
        "{} pass left {} embed(s) in place",
        extractor.provider(),
        found.len()
    );
    found.len()
}

static EMBED_WRAPPER: LazyLock<Selector> =
    LazyLock::new(|| selector(".wp-block-embed__wrapper"));

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css}: {e}"))
}

/// A block-editor embed figure for `provider`, e.g.
/// `<figure class="wp-block-embed is-provider-youtube">`.
pub(crate) fn is_embed_block(el: ElementRef<'_>, provider: Provider) -> bool {
    let slug = provider.slug();
    el.value().name() == "figure"
        && dom::has_class(el, "wp-block-embed")
        && (dom::has_class(el, &format!("is-provider-{slug}"))
            || dom::has_class(el, &format!("wp-block-embed-{slug}")))
}

/// The bare URL the block editor leaves in an embed wrapper when the
/// provider's oEmbed markup was not stored.
pub(crate) fn embed_block_url(el: ElementRef<'_>) -> Option<String> {
    el.select(&EMBED_WRAPPER)
        .map(dom::text)
        .find(|text| text.starts_with("http://") || text.starts_with("https://"))
}

/// Parse absolute or protocol-relative URLs.
pub(crate) fn parse_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.starts_with("//") {
        Url::parse(&format!("https:{raw}")).ok()
    } else {
        Url::parse(raw).ok()
    }
}

/// Value of query parameter `name` in `raw`.
pub(crate) fn query_param(raw: &str, name: &str) -> Option<String> {
    parse_url(raw)?
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Value of `attr` on the first descendant of `el` matching `selector`.
pub(crate) fn descendant_attr(el: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    el.select(selector)
        .find_map(|child| dom::attr(child, attr))
        .map(str::to_string)
}
