//! Third-party SDK loading for the social widgets.
//!
//! Each [`Sdk`] is loaded at most once per [`SdkRegistry`]: the first
//! widget to need it starts a load attempt and every concurrent caller
//! awaits that same attempt, success or failure. A failed or timed-out
//! attempt is then discarded, so a later render may retry it.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::OnceCell;

use crate::error::{ContentError, Result};

/// Scripts the social widgets depend on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sdk {
    Twitter,
    Facebook,
    Instagram,
}

impl Sdk {
    /// URL of the provider's embed script.
    pub fn script_url(self) -> &'static str {
        match self {
            Sdk::Twitter => "https://platform.twitter.com/widgets.js",
            Sdk::Facebook => "https://connect.facebook.net/en_US/sdk.js#xfbml=1&version=v18.0",
            Sdk::Instagram => "https://www.instagram.com/embed.js",
        }
    }

    /// `<script>` tag that loads the SDK asynchronously.
    pub fn script_tag(self) -> String {
        let mut tag = format!(
            r#"<script async src="{}""#,
            html_escape::encode_double_quoted_attribute(self.script_url())
        );
        if self == Sdk::Facebook {
            tag.push_str(r#" defer crossorigin="anonymous""#);
        } else {
            tag.push_str(r#" charset="utf-8""#);
        }
        tag.push_str("></script>");
        tag
    }
}

impl fmt::Display for Sdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sdk::Twitter => "Twitter",
            Sdk::Facebook => "Facebook",
            Sdk::Instagram => "Instagram",
        };
        f.write_str(name)
    }
}

/// Loads a third-party SDK.
///
/// Implementations must be `Send + Sync + 'static` so a registry can be
/// shared process-wide.
///
/// # Implementing a custom loader
///
/// ```rust,no_run
/// use wp_content::{Result, Sdk, SdkLoader};
///
/// struct Preloaded;
///
/// impl SdkLoader for Preloaded {
///     async fn load(&self, sdk: Sdk) -> Result<()> {
///         // make sure `sdk.script_url()` is available ...
///         Ok(())
///     }
/// }
/// ```
pub trait SdkLoader: Send + Sync + 'static {
    fn load(&self, sdk: Sdk) -> impl Future<Output = Result<()>> + Send;
}

/// One load attempt; every caller that joins it sees the same outcome.
type Attempt = Arc<OnceCell<Result<()>>>;

/// Lookup-or-create registry of loaded SDKs.
///
/// A successful attempt stays in place for the registry's lifetime; a
/// failed one is removed once it settles.
pub struct SdkRegistry<L: SdkLoader> {
    loader: L,
    timeout: Duration,
    attempts: tokio::sync::Mutex<HashMap<Sdk, Attempt>>,
}

impl<L: SdkLoader> SdkRegistry<L> {
    pub fn new(loader: L, timeout: Duration) -> Self {
        Self {
            loader,
            timeout,
            attempts: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Load `sdk` unless it is already loaded.
    ///
    /// Concurrent callers share a single attempt, so however many widgets
    /// wait on a stalled SDK they all give up after one registry timeout.
    /// Returns [`ContentError::SdkTimeout`] if the loader does not finish in
    /// time, or the loader's own error.
    pub async fn ensure(&self, sdk: Sdk) -> Result<()> {
        let attempt = {
            let mut attempts = self.attempts.lock().await;
            Arc::clone(attempts.entry(sdk).or_default())
        };

        let timeout = self.timeout;
        let loader = &self.loader;
        let outcome = attempt
            .get_or_init(|| async move {
                tracing::debug!("Loading {sdk} SDK");
                match tokio::time::timeout(timeout, loader.load(sdk)).await {
                    Ok(result) => result,
                    Err(_) => Err(ContentError::SdkTimeout { sdk, timeout }),
                }
            })
            .await
            .clone();

        if outcome.is_err() {
            let mut attempts = self.attempts.lock().await;
            if attempts.get(&sdk).is_some_and(|current| Arc::ptr_eq(current, &attempt)) {
                attempts.remove(&sdk);
            }
        }
        outcome
    }

    /// Whether `sdk` has finished loading.
    pub async fn is_loaded(&self, sdk: Sdk) -> bool {
        self.attempts
            .lock()
            .await
            .get(&sdk)
            .and_then(|attempt| attempt.get())
            .is_some_and(|outcome| outcome.is_ok())
    }
}

/// Loader that records which scripts a page needs instead of fetching them.
///
/// Server-side renders use it to collect the `<script>` tags to emit with
/// the content. Loading always succeeds immediately. Clones share the same
/// set of requested SDKs.
#[derive(Clone, Debug, Default)]
pub struct ScriptManifest {
    requested: Arc<Mutex<BTreeSet<Sdk>>>,
}

impl ScriptManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// SDKs requested so far, in a stable order.
    pub fn requested(&self) -> Vec<Sdk> {
        self.requested
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .copied()
            .collect()
    }

    /// `<script>` tags for every requested SDK.
    pub fn script_tags(&self) -> String {
        self.requested().into_iter().map(Sdk::script_tag).collect()
    }
}

impl SdkLoader for ScriptManifest {
    async fn load(&self, sdk: Sdk) -> Result<()> {
        self.requested
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(sdk);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        loads: AtomicUsize,
        fail_first: bool,
    }

    impl SdkLoader for Counting {
        async fn load(&self, sdk: Sdk) -> Result<()> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail_first && n == 0 {
                return Err(ContentError::SdkLoad {
                    sdk,
                    reason: "network".into(),
                });
            }
            Ok(())
        }
    }

    struct Hanging;

    impl SdkLoader for Hanging {
        async fn load(&self, _sdk: Sdk) -> Result<()> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn counting(fail_first: bool) -> SdkRegistry<Counting> {
        SdkRegistry::new(
            Counting {
                loads: AtomicUsize::new(0),
                fail_first,
            },
            Duration::from_secs(1),
        )
    }

    #[test]
    fn script_tags() {
        assert_eq!(
            Sdk::Twitter.script_tag(),
            r#"<script async src="https://platform.twitter.com/widgets.js" charset="utf-8"></script>"#
        );
        assert!(Sdk::Facebook.script_tag().contains("xfbml=1&amp;version"));
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_load() {
        let registry = counting(false);
        let results = futures::future::join_all(
            (0..8).map(|_| registry.ensure(Sdk::Instagram)),
        )
        .await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(registry.loader().loads.load(Ordering::SeqCst), 1);
        assert!(registry.is_loaded(Sdk::Instagram).await);
        assert!(!registry.is_loaded(Sdk::Twitter).await);
    }

    #[tokio::test]
    async fn failed_load_is_retried() {
        let registry = counting(true);
        assert!(matches!(
            registry.ensure(Sdk::Facebook).await,
            Err(ContentError::SdkLoad { sdk: Sdk::Facebook, .. })
        ));
        assert!(!registry.is_loaded(Sdk::Facebook).await);

        registry.ensure(Sdk::Facebook).await.unwrap();
        registry.ensure(Sdk::Facebook).await.unwrap();
        assert_eq!(registry.loader().loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_load_times_out() {
        let registry = SdkRegistry::new(Hanging, Duration::from_millis(50));
        let err = registry.ensure(Sdk::Twitter).await.unwrap_err();
        assert!(matches!(err, ContentError::SdkTimeout { sdk: Sdk::Twitter, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_timeout() {
        let registry = SdkRegistry::new(Hanging, Duration::from_secs(5));
        let started = tokio::time::Instant::now();
        let results = futures::future::join_all(
            (0..4).map(|_| registry.ensure(Sdk::Twitter)),
        )
        .await;

        assert!(results
            .iter()
            .all(|r| matches!(r, Err(ContentError::SdkTimeout { .. }))));
        assert!(started.elapsed() < Duration::from_secs(6));
        assert!(!registry.is_loaded(Sdk::Twitter).await);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_failure() {
        let registry = counting(true);
        let results = futures::future::join_all(
            (0..3).map(|_| registry.ensure(Sdk::Facebook)),
        )
        .await;
        assert!(results.iter().all(|r| r.is_err()));
        assert_eq!(registry.loader().loads.load(Ordering::SeqCst), 1);

        registry.ensure(Sdk::Facebook).await.unwrap();
        assert_eq!(registry.loader().loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn manifest_collects_requested_scripts() {
        let manifest = ScriptManifest::new();
        let registry = SdkRegistry::new(manifest.clone(), Duration::from_secs(1));
        registry.ensure(Sdk::Twitter).await.unwrap();
        registry.ensure(Sdk::Facebook).await.unwrap();
        assert_eq!(manifest.requested(), vec![Sdk::Twitter, Sdk::Facebook]);
        assert!(manifest.script_tags().contains("widgets.js"));
    }
}
