use thiserror::Error;

/// Result type alias using TallyError
pub type Result<T> = std::result::Result<T, TallyError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure the engines can report maps onto one of these kinds, and
/// each kind has a stable code used in structured logs and by callers that
/// branch on failures programmatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Rating out of domain, blank body, bad configuration value
    InvalidInput,
    /// The author already reviewed this item
    DuplicateSubmission,
    /// The addressed document does not exist (any more)
    NotFound,
    /// A per-user operation was attempted without a signed-in identity
    Unauthenticated,
    /// Any failure reported by the remote store, passed through verbatim
    RemoteFailure,
    Serialization,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::DuplicateSubmission => "ERR_DUPLICATE_SUBMISSION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Unauthenticated => "ERR_UNAUTHENTICATED",
            ExErrorKind::RemoteFailure => "ERR_REMOTE_FAILURE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
        }
    }

    /// Whether re-submitting the same request can succeed without the caller
    /// changing anything
    pub fn is_transient(&self) -> bool {
        matches!(self, ExErrorKind::RemoteFailure)
    }
}

/// Canonical structured error
///
/// Flattened, log-friendly view of a `TallyError`: classification plus the
/// context needed to find the document involved.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    remote_code: Option<StoreErrorCode>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            remote_code: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add the remote store's own error code
    pub fn with_remote_code(mut self, code: StoreErrorCode) -> Self {
        self.remote_code = Some(code);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn remote_code(&self) -> Option<StoreErrorCode> {
        self.remote_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Stable classification of remote store failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    NotFound,
    InvalidArgument,
    PermissionDenied,
    Unavailable,
    ResourceExhausted,
    Internal,
}

impl std::fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StoreErrorCode::NotFound => "not-found",
            StoreErrorCode::InvalidArgument => "invalid-argument",
            StoreErrorCode::PermissionDenied => "permission-denied",
            StoreErrorCode::Unavailable => "unavailable",
            StoreErrorCode::ResourceExhausted => "resource-exhausted",
            StoreErrorCode::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Error reported by a `RemoteStore` implementation
#[derive(Error, Debug, Clone, PartialEq)]
#[error("remote store {code}: {message}")]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::new(
            StoreErrorCode::NotFound,
            format!("no document {}/{}", collection, id),
        )
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::InvalidArgument, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Unavailable, message)
    }
}

/// Error taxonomy for engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TallyError {
    /// Input rejected before any write was attempted
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The author already has a review on this item
    #[error("Author {author_id} has already reviewed item {item_id}")]
    DuplicateSubmission { item_id: String, author_id: String },

    /// The addressed document does not exist
    #[error("Not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// No signed-in user for a per-user operation
    #[error("Operation '{op}' requires a signed-in user")]
    Unauthenticated { op: String },

    /// Remote store failure, passed through unchanged
    #[error(transparent)]
    Remote(#[from] StoreError),

    /// JSON encoding/decoding of documents or seeds
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl TallyError {
    /// Classify this error without converting it
    pub fn kind(&self) -> ExErrorKind {
        match self {
            TallyError::InvalidInput { .. } => ExErrorKind::InvalidInput,
            TallyError::DuplicateSubmission { .. } => ExErrorKind::DuplicateSubmission,
            TallyError::NotFound { .. } => ExErrorKind::NotFound,
            TallyError::Unauthenticated { .. } => ExErrorKind::Unauthenticated,
            TallyError::Remote(_) => ExErrorKind::RemoteFailure,
            TallyError::Serialization { .. } => ExErrorKind::Serialization,
        }
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        TallyError::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Conversion from TallyError to the canonical structured error
impl From<TallyError> for ExError {
    fn from(err: TallyError) -> Self {
        match err {
            TallyError::InvalidInput { reason } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(reason)
            }

            TallyError::DuplicateSubmission { item_id, author_id } => {
                ExError::new(ExErrorKind::DuplicateSubmission)
                    .with_entity_id(item_id)
                    .with_message(format!("Author {} already reviewed this item", author_id))
            }

            TallyError::NotFound { collection, id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(id)
                .with_message(format!("No document in {}", collection)),

            TallyError::Unauthenticated { op } => ExError::new(ExErrorKind::Unauthenticated)
                .with_op(op)
                .with_message("Not signed in"),

            TallyError::Remote(store_err) => ExError::new(ExErrorKind::RemoteFailure)
                .with_remote_code(store_err.code)
                .with_message(store_err.message),

            TallyError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<&TallyError> for ExError {
    fn from(err: &TallyError) -> Self {
        err.clone().into()
    }
}

/// Conversion from serde_json::Error to TallyError
impl From<serde_json::Error> for TallyError {
    fn from(err: serde_json::Error) -> Self {
        TallyError::Serialization {
            message: err.to_string(),
        }
    }
}
