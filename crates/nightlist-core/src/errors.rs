use nightlist_core_types::CycleId;
use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// raised by the list engine. Each kind maps to a stable error code that can be
/// used for programmatic error handling, testing, and log assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    /// Two items in one sequence share an identity (the header included)
    DuplicateIdentity,
    /// An entry uses the identity reserved for the header
    ReservedIdentity,
    /// An edit script does not fit the sequence it is applied to
    InvalidEditScript,

    // Coordination
    /// The background diff task panicked or was aborted
    ComputationFault,
    /// The coordinator or its consumer has been torn down
    Cancelled,
    Configuration,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::DuplicateIdentity => "ERR_DUPLICATE_IDENTITY",
            ExErrorKind::ReservedIdentity => "ERR_RESERVED_IDENTITY",
            ExErrorKind::InvalidEditScript => "ERR_INVALID_EDIT_SCRIPT",
            ExErrorKind::ComputationFault => "ERR_COMPUTATION_FAULT",
            ExErrorKind::Cancelled => "ERR_CANCELLED",
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling and the context
/// (operation, item identity, position, cycle) needed to debug a failed cycle.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    item_id: Option<i64>,
    position: Option<usize>,
    cycle_id: Option<CycleId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            item_id: None,
            position: None,
            cycle_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Set the operation name
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Set the identity of the offending item
    pub fn with_item_id(mut self, id: i64) -> Self {
        self.item_id = Some(id);
        self
    }

    /// Set the offending position
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the update cycle this error belongs to
    pub fn with_cycle_id(mut self, cycle_id: CycleId) -> Self {
        self.cycle_id = Some(cycle_id);
        self
    }

    /// Set the error message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
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

    pub fn item_id(&self) -> Option<i64> {
        self.item_id
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn cycle_id(&self) -> Option<&CycleId> {
        self.cycle_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
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
        if let Some(item_id) = self.item_id {
            write!(f, " (item_id: {})", item_id)?;
        }
        if let Some(position) = self.position {
            write!(f, " (position: {})", position)?;
        }
        if let Some(cycle_id) = &self.cycle_id {
            write!(f, " (cycle_id: {})", cycle_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain errors for malformed sequences and edit scripts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// Two items of one sequence share an identity
    #[error("Duplicate identity {item_id} at positions {first} and {second}")]
    DuplicateIdentity {
        item_id: i64,
        first: usize,
        second: usize,
    },

    /// An entry carries the identity reserved for the header
    #[error("Entry at position {position} uses the reserved header identity")]
    ReservedIdentity { position: usize },

    /// A script position lies outside the sequence it addresses
    #[error("Position {position} is out of range for length {len}")]
    PositionOutOfRange { position: usize, len: usize },

    /// Two operations of one script claim the same position
    #[error("Position {position} is claimed by more than one operation")]
    SlotConflict { position: usize },

    /// The script was computed for a sequence of a different length
    #[error("Edit script expects a source of length {expected}, got {actual}")]
    SourceLengthMismatch { expected: usize, actual: usize },
}

impl From<DiffError> for ExError {
    fn from(err: DiffError) -> Self {
        let message = err.to_string();
        match err {
            DiffError::DuplicateIdentity {
                item_id, second, ..
            } => ExError::new(ExErrorKind::DuplicateIdentity)
                .with_item_id(item_id)
                .with_position(second)
                .with_message(message),

            DiffError::ReservedIdentity { position } => {
                ExError::new(ExErrorKind::ReservedIdentity)
                    .with_position(position)
                    .with_message(message)
            }

            DiffError::PositionOutOfRange { position, .. }
            | DiffError::SlotConflict { position } => {
                ExError::new(ExErrorKind::InvalidEditScript)
                    .with_position(position)
                    .with_message(message)
            }

            DiffError::SourceLengthMismatch { .. } => {
                ExError::new(ExErrorKind::InvalidEditScript).with_message(message)
            }
        }
    }
}
