/// Errors raised while building or driving notification channels.
///
/// The [`crate::NotificationChannel`] trait itself returns
/// `anyhow::Result` so channel internals can bubble transport errors
/// without wrapping; this type covers configuration and API-level
/// failures where the variant matters to the caller.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Channel configuration is missing a required field or contains an
    /// invalid value.
    #[error("notify: invalid channel configuration: {0}")]
    InvalidConfig(String),

    /// SMTP transport could not be constructed or refused the message.
    #[error("notify: SMTP error: {0}")]
    Smtp(String),

    /// An HTTP request to an external notification endpoint failed.
    #[error("notify: HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The external API accepted the request but reported a failure.
    #[error("notify: API error from {service}: {detail}")]
    Api { service: String, detail: String },
}

pub type Result<T> = std::result::Result<T, NotifyError>;
