use thiserror::Error;

/// Failures inside the SQLite-backed stores. Decode failures never reach
/// callers (the stores self-heal by deleting the corrupt entry); what
/// escapes here is opening the database or writing to it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Every way obtaining a plan from the generation service can fail.
/// One attempt per call; retrying is the user's decision.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("GEMINI_API_KEY is not configured")]
    Unconfigured,
    #[error("generation request failed: {0}")]
    Request(String),
    #[error("could not decode the generated plan: {0}")]
    Decode(String),
    #[error("generated plan has an invalid shape: {0}")]
    InvalidShape(String),
}
