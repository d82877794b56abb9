//! Content image pass.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html};

use super::{Claims, collect_unclaimed};
use crate::dom;
use crate::record::{ImageRecord, PlaceholderKey};

/// Class carried by image placeholders.
pub(crate) const IMAGE_PLACEHOLDER_CLASS: &str = "content-image-placeholder";

/// Attributes lazy-load plugins move the real source into.
const LAZY_SRC_ATTRS: &[&str] = &["data-src", "data-lazy-src"];

/// Replace every unclaimed `<img>` with an indexed placeholder.
///
/// Runs after every embed pass, so preview images inside claimed embeds are
/// never seen. Images without a usable source are removed outright.
pub(crate) fn extract_images(document: &Html, claims: &mut Claims) -> Vec<ImageRecord> {
    let mut found: Vec<(NodeRef<'_, Node>, Option<Image>)> = Vec::new();
    collect_unclaimed(
        *document.root_element(),
        claims,
        &mut |el| (el.value().name() == "img").then(|| Image::read(el)),
        &mut found,
    );

    let mut records = Vec::new();
    for (node, image) in found {
        let Some(image) = image else {
            tracing::trace!("dropping image without a usable source");
            claims.replace(node.id(), String::new());
            continue;
        };
        let record = image.into_record(records.len());
        let tag = dom::placeholder_tag(node);
        claims.replace(
            node.id(),
            dom::placeholder(tag, IMAGE_PLACEHOLDER_CLASS, &PlaceholderKey::Image(record.index)),
        );
        records.push(record);
    }

    tracing::debug!("image pass extracted {} image(s)", records.len());
    records
}

struct Image {
    src: String,
    alt: String,
    width: Option<u32>,
    height: Option<u32>,
    classes: Vec<String>,
    srcset: Option<String>,
    sizes: Option<String>,
}

impl Image {
    fn read(el: ElementRef<'_>) -> Option<Self> {
        Some(Self {
            src: source(el)?,
            alt: el.value().attr("alt").unwrap_or_default().trim().to_string(),
            width: dimension(el, "width"),
            height: dimension(el, "height"),
            classes: el.value().classes().map(str::to_string).collect(),
            srcset: dom::attr(el, "srcset")
                .or_else(|| dom::attr(el, "data-srcset"))
                .map(str::to_string),
            sizes: dom::attr(el, "sizes").map(str::to_string),
        })
    }

    fn into_record(self, index: usize) -> ImageRecord {
        ImageRecord {
            index,
            src: self.src,
            alt: self.alt,
            width: self.width,
            height: self.height,
            classes: self.classes,
            srcset: self.srcset,
            sizes: self.sizes,
        }
    }
}

/// `src`, unless it is missing or an inline `data:` stand-in for a lazily
/// loaded source.
fn source(el: ElementRef<'_>) -> Option<String> {
    let lazy = LAZY_SRC_ATTRS.iter().find_map(|a| dom::attr(el, a));
    let src = dom::attr(el, "src");
    match (src, lazy) {
        (Some(src), Some(lazy)) if src.starts_with("data:") => Some(lazy),
        (Some(src), _) => Some(src),
        (None, lazy) => lazy,
    }
    .map(str::to_string)
}

/// Positive pixel dimension; `"640"` and `"640px"` both parse.
fn dimension(el: ElementRef<'_>, name: &str) -> Option<u32> {
    let raw = dom::attr(el, name)?;
    let raw = raw.strip_suffix("px").unwrap_or(raw).trim();
    raw.parse().ok().filter(|&v| v > 0)
}
