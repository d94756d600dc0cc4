use std::future::Future;

/// Failure raised by a scoring connection or the key pool wrapped around it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("no scoring credentials configured")]
    NoCredentialsConfigured,
    #[error("scoring backend rejected the request: {0}")]
    Rejected(String),
    #[error("scoring transport failed: {0}")]
    Transport(String),
    #[error("scoring call exceeded {0} ms")]
    Timeout(u64),
}

/// Known response shapes the scoring backend may return.
///
/// Backends differ in how they hand text back; modelling the shapes as a
/// tagged union keeps the parser to explicit pattern matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutput {
    /// Body already resolved to text by the connection.
    Text(String),
    /// Candidate list whose content is split into parts.
    Candidates(Vec<Candidate>),
    /// Raw string payload with no surrounding structure.
    Plain(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub parts: Vec<String>,
}

/// One live handle bound to a single credential.
pub trait ScoringConnection: Send + Sync {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<ModelOutput, BackendError>> + Send;
}

/// Creates connections on demand so the key pool can memoize one handle
/// per credential for the process lifetime.
pub trait ConnectionFactory: Send + Sync {
    type Connection: ScoringConnection + 'static;

    fn connect(&self, api_key: &str) -> Result<Self::Connection, BackendError>;
}
