use thiserror::Error;

/// Failures surfaced by the exchange layer. All of them are terminal for the
/// current attempt and reported once; nothing here should crash the process.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// The exchange answered with a non-success code. Treated as a normal
    /// outcome; the message is relayed verbatim to the requester.
    #[error("exchange rejected order (code {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected exchange payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Mark price could not be fetched. Non-fatal: the limit-order guard
    /// fails open on this.
    #[error("price feed unavailable for {0}")]
    PriceUnavailable(String),

    /// Parsed but nonsensical signal (stop on the wrong side of entry,
    /// target on the wrong side, zero quantity).
    #[error("invalid signal: {0}")]
    InvalidSignal(String),
}
