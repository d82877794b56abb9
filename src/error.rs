//! Error types for the `wp_content` crate.

use std::time::Duration;

use crate::record::PlaceholderKey;
use crate::sdk::Sdk;

/// All errors that can occur while configuring or rendering CMS content.
///
/// None of these abort a render: SDK failures degrade to a fallback widget
/// and placeholder mismatches are only reported by
/// [`ProcessedContent::verify`](crate::ProcessedContent::verify).
#[derive(Clone, Debug, thiserror::Error)]
pub enum ContentError {
    /// The builder configuration is invalid.
    #[error("Config error: {0}")]
    Config(String),

    /// A third-party SDK loader reported a failure.
    #[error("Failed to load {sdk} SDK: {reason}")]
    SdkLoad { sdk: Sdk, reason: String },

    /// A third-party SDK did not finish loading in time.
    #[error("{sdk} SDK did not load within {timeout:?}")]
    SdkTimeout { sdk: Sdk, timeout: Duration },

    /// The process-wide SDK registry was already initialized.
    #[error("SDK registry already initialized")]
    RegistryInitialized,

    /// A placeholder marker in the HTML has no matching record.
    #[error("Placeholder {0} has no matching record")]
    OrphanPlaceholder(PlaceholderKey),

    /// A record has no matching placeholder marker in the HTML.
    #[error("Record {0} has no placeholder in the processed HTML")]
    MissingPlaceholder(PlaceholderKey),

    /// The same placeholder marker appears more than once.
    #[error("Placeholder {0} appears more than once")]
    DuplicatePlaceholder(PlaceholderKey),
}

/// A type alias for `Result<T, ContentError>`.
pub type Result<T> = std::result::Result<T, ContentError>;
