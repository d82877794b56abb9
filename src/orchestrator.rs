//! Ties the pipeline, widgets, SDK registry and rehydration together.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use futures::future::join_all;

use crate::mount::Rehydrator;
use crate::pipeline::ContentPipeline;
use crate::record::{PlaceholderKey, ProcessedContent};
use crate::sdk::{Sdk, SdkLoader, SdkRegistry};
use crate::widget::{self, Widget};

/// Fully rendered content: placeholder HTML with widgets mounted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedContent {
    pub html: String,
    /// SDKs the mounted widgets rely on, in a stable order.
    pub loaded_sdks: Vec<Sdk>,
    /// Placeholders that got fallback markup because their SDK failed.
    pub fallbacks: Vec<PlaceholderKey>,
    /// Placeholders whose marker could not be found.
    pub unmounted: Vec<PlaceholderKey>,
}

impl RenderedContent {
    /// `<script>` tags for [`loaded_sdks`](Self::loaded_sdks).
    pub fn script_tags(&self) -> String {
        self.loaded_sdks.iter().map(|sdk| sdk.script_tag()).collect()
    }
}

/// Renders CMS HTML end to end.
///
/// Processing is memoized on the raw input: rendering the same string again
/// reuses the previous [`ProcessedContent`] instead of re-sanitizing it. A
/// failed or slow SDK only affects the widgets that need it; they are
/// mounted with their fallback markup and every other placeholder renders
/// normally.
pub struct ContentOrchestrator<L: SdkLoader> {
    pipeline: ContentPipeline,
    registry: Arc<SdkRegistry<L>>,
    memo: Mutex<Option<(String, Arc<ProcessedContent>)>>,
}

impl<L: SdkLoader> ContentOrchestrator<L> {
    pub fn new(pipeline: ContentPipeline, registry: Arc<SdkRegistry<L>>) -> Self {
        Self {
            pipeline,
            registry,
            memo: Mutex::new(None),
        }
    }

    pub fn pipeline(&self) -> &ContentPipeline {
        &self.pipeline
    }

    pub fn registry(&self) -> &Arc<SdkRegistry<L>> {
        &self.registry
    }

    /// Run the pipeline on `raw`, or return the cached result for the same input.
    pub fn process(&self, raw: &str) -> Arc<ProcessedContent> {
        let mut memo = self.memo.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((input, processed)) = memo.as_ref() {
            if input == raw {
                return Arc::clone(processed);
            }
        }
        let processed = Arc::new(self.pipeline.process(raw));
        *memo = Some((raw.to_string(), Arc::clone(&processed)));
        processed
    }

    /// Process `raw`, load the SDKs its widgets need and mount every widget.
    pub async fn render(&self, raw: &str) -> RenderedContent {
        let processed = self.process(raw);
        let options = self.pipeline.options();

        let widgets: Vec<(PlaceholderKey, Box<dyn Widget>)> = processed
            .embeds
            .iter()
            .map(|record| (record.key(), widget::for_embed(record)))
            .chain(
                processed
                    .images
                    .iter()
                    .map(|record| (record.key(), widget::for_image(record, options))),
            )
            .collect();

        let prepared = join_all(
            widgets
                .iter()
                .map(|(key, widget)| self.prepare(key, &**widget)),
        )
        .await;

        let mut loaded_sdks = BTreeSet::new();
        let mut fallbacks = Vec::new();
        let mut islands = Vec::with_capacity(prepared.len());
        for (key, html, outcome) in prepared {
            match outcome {
                SdkOutcome::NotNeeded => {}
                SdkOutcome::Loaded(sdk) => {
                    loaded_sdks.insert(sdk);
                }
                SdkOutcome::Failed => fallbacks.push(key.clone()),
            }
            islands.push((key, html));
        }

        if processed.deferred_tweets > 0 {
            match self.registry.ensure(Sdk::Twitter).await {
                Ok(()) => {
                    loaded_sdks.insert(Sdk::Twitter);
                }
                Err(e) => tracing::warn!("Deferred tweets will render as quotes: {e}"),
            }
        }

        let rehydration = Rehydrator::new(islands).rehydrate(&processed.html);
        if !rehydration.missing.is_empty() {
            tracing::warn!(
                "{} placeholder(s) not found while mounting",
                rehydration.missing.len()
            );
        }

        RenderedContent {
            html: rehydration.html,
            loaded_sdks: loaded_sdks.into_iter().collect(),
            fallbacks,
            unmounted: rehydration.missing,
        }
    }

    async fn prepare(
        &self,
        key: &PlaceholderKey,
        widget: &dyn Widget,
    ) -> (PlaceholderKey, String, SdkOutcome) {
        let Some(sdk) = widget.sdk() else {
            return (key.clone(), widget.render(), SdkOutcome::NotNeeded);
        };
        match self.registry.ensure(sdk).await {
            Ok(()) => (key.clone(), widget.render(), SdkOutcome::Loaded(sdk)),
            Err(e) => {
                tracing::warn!("Rendering fallback for {key}: {e}");
                (key.clone(), widget.render_fallback(), SdkOutcome::Failed)
            }
        }
    }
}

enum SdkOutcome {
    NotNeeded,
    Loaded(Sdk),
    Failed,
}
