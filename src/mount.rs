//! Mounting widget markup into placeholder elements.
//!
//! Each placeholder gets an [`Island`]: the markup to mount and a
//! [`MountState`]. A rehydration pass parses the HTML, finds every marker
//! element and fills the ones whose island is still pending. Filled markers
//! are tagged with a guard attribute, so running the pass again over its
//! own output changes nothing. A marker with no island, or an island whose
//! marker is absent, is skipped without affecting the others.

use std::collections::HashMap;

use scraper::node::Node;

use crate::dom::{self, MOUNTED_ATTR, Replacements};
use crate::record::PlaceholderKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountState {
    Pending,
    Mounted,
}

/// Markup waiting to be mounted into one placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Island {
    key: PlaceholderKey,
    html: String,
    state: MountState,
}

impl Island {
    pub fn new(key: PlaceholderKey, html: String) -> Self {
        Self {
            key,
            html,
            state: MountState::Pending,
        }
    }

    pub fn key(&self) -> &PlaceholderKey {
        &self.key
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn state(&self) -> MountState {
        self.state
    }
}

/// Result of one rehydration pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rehydration {
    pub html: String,
    /// Islands mounted by this pass, in document order.
    pub mounted: Vec<PlaceholderKey>,
    /// Islands still pending because their marker was not found.
    pub missing: Vec<PlaceholderKey>,
}

pub struct Rehydrator {
    islands: Vec<Island>,
    index: HashMap<PlaceholderKey, usize>,
}

impl Rehydrator {
    pub fn new(islands: impl IntoIterator<Item = (PlaceholderKey, String)>) -> Self {
        let islands: Vec<Island> = islands
            .into_iter()
            .map(|(key, html)| Island::new(key, html))
            .collect();
        let index = islands
            .iter()
            .enumerate()
            .map(|(i, island)| (island.key.clone(), i))
            .collect();
        Self { islands, index }
    }

    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    pub fn is_complete(&self) -> bool {
        self.islands.iter().all(|i| i.state == MountState::Mounted)
    }

    /// Mount every pending island whose marker is present in `html`.
    pub fn rehydrate(&mut self, html: &str) -> Rehydration {
        let document = dom::parse(html);
        let mut replacements = Replacements::new();
        let mut mounted = Vec::new();

        for node in document.root_element().descendants() {
            let Node::Element(el) = node.value() else {
                continue;
            };
            let Some(key) = dom::marker_key(el) else {
                continue;
            };
            let Some(&i) = self.index.get(&key) else {
                tracing::trace!("no island for placeholder {key}");
                continue;
            };
            let island = &mut self.islands[i];
            if el.attr(MOUNTED_ATTR).is_some() {
                island.state = MountState::Mounted;
                continue;
            }
            if island.state == MountState::Mounted {
                continue;
            }

            let mut filled = dom::start_tag(el, &[(MOUNTED_ATTR, "true")]);
            filled.push_str(&island.html);
            filled.push_str(&dom::end_tag(el));
            replacements.insert(node.id(), filled);

            island.state = MountState::Mounted;
            mounted.push(key);
        }

        let missing: Vec<PlaceholderKey> = self
            .islands
            .iter()
            .filter(|i| i.state == MountState::Pending)
            .map(|i| i.key.clone())
            .collect();

        tracing::debug!(
            "Mounted {} island(s), {} pending",
            mounted.len(),
            missing.len()
        );

        Rehydration {
            html: if replacements.is_empty() {
                html.to_string()
            } else {
                dom::serialize(&document, &replacements)
            },
            mounted,
            missing,
        }
    }
}
