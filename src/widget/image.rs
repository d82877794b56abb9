//! Responsive content images.

use super::Widget;
use crate::config::RenderOptions;
use crate::dom;
use crate::record::ImageRecord;

const FRAME_CLASS: &str = "content-image-frame";

const FILL_STYLE: &str = "position:absolute;inset:0;width:100%;height:100%;object-fit:cover";

/// Responsive `<img>` with loading hints.
///
/// The first `priority_images` images load eagerly with high fetch
/// priority; the rest are lazy. Images without both dimensions are placed in
/// a fixed aspect-ratio frame so the layout does not shift when they load.
pub struct OptimizedImage {
    image: ImageRecord,
    options: RenderOptions,
}

impl OptimizedImage {
    pub fn new(image: ImageRecord, options: RenderOptions) -> Self {
        Self { image, options }
    }

    pub fn is_priority(&self) -> bool {
        self.image.index < self.options.priority_images
    }

    fn img(&self, framed: bool) -> String {
        let image = &self.image;
        let width = image.width.map(|w| w.to_string());
        let height = image.height.map(|h| h.to_string());
        let classes = image.classes.join(" ");

        let mut attrs = vec![("src", image.src.as_str()), ("alt", image.alt.as_str())];
        if let Some(width) = width.as_deref() {
            attrs.push(("width", width));
        }
        if let Some(height) = height.as_deref() {
            attrs.push(("height", height));
        }
        if let Some(srcset) = image.srcset.as_deref() {
            attrs.push(("srcset", srcset));
        }
        if let Some(sizes) = image.sizes.as_deref() {
            attrs.push(("sizes", sizes));
        }
        if !classes.is_empty() {
            attrs.push(("class", classes.as_str()));
        }
        if self.is_priority() {
            attrs.push(("loading", "eager"));
            attrs.push(("fetchpriority", "high"));
        } else {
            attrs.push(("loading", "lazy"));
        }
        attrs.push(("decoding", "async"));
        if framed {
            attrs.push(("style", FILL_STYLE));
        }
        dom::element("img", &attrs, "")
    }
}

impl Widget for OptimizedImage {
    fn render(&self) -> String {
        if self.image.has_intrinsic_size() {
            return self.img(false);
        }
        let (w, h) = self.options.image_aspect_ratio;
        let style = format!("display:block;position:relative;width:100%;aspect-ratio:{w} / {h}");
        dom::element(
            "span",
            &[("class", FRAME_CLASS), ("style", style.as_str())],
            &self.img(true),
        )
    }

    fn render_fallback(&self) -> String {
        self.img(false)
    }
}
