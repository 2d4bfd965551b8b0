use crate::errors::{EngineError, EngineResult, ErrorKind};
use crate::ID_GENERATOR;
use std::fmt::{Debug, Display};
use std::sync::LazyLock;

static MAX_VALUE: LazyLock<u64> = LazyLock::new(|| 10u64.pow(19));
static MIN_VALUE: LazyLock<u64> = LazyLock::new(|| 10u64.pow(18));

/// A generated unique identifier for documents.
///
/// When a document is inserted without an `_id` field, the engine generates a
/// `DocumentId` for it. User-supplied `_id` values (strings, numbers, and so
/// on) are stored as ordinary values; `DocumentId` is only used for generated
/// identifiers.
///
/// # ID Generation
///
/// Ids come from a Snowflake-style generator that produces 64-bit unsigned
/// integers in the range [10^18, 10^19). This ensures:
/// - Uniqueness across all documents of a process
/// - Approximate timestamp ordering
/// - No central coordination
#[derive(PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentId {
    id_value: u64,
}

impl DocumentId {
    /// Generates a new unique `DocumentId`.
    pub fn new() -> Self {
        let id_value = ID_GENERATOR.get_id();
        DocumentId { id_value }
    }

    /// Creates a `DocumentId` from a specific value.
    ///
    /// The value must be within the valid range [10^18, 10^19).
    ///
    /// # Arguments
    ///
    /// * `id_value` - A 64-bit unsigned integer id
    ///
    /// # Returns
    ///
    /// `Ok(DocumentId)` if the value is valid, or an `InvalidId` error if it
    /// falls outside the valid range.
    pub fn create_id(id_value: u64) -> EngineResult<DocumentId> {
        DocumentId::valid_id(id_value)?;
        Ok(DocumentId { id_value })
    }

    /// Gets the numeric value of this id.
    pub fn id_value(&self) -> u64 {
        self.id_value
    }

    pub(crate) fn valid_id(id_value: u64) -> EngineResult<bool> {
        if id_value >= *MAX_VALUE {
            log::error!("Id value is too large");
            return Err(EngineError::new(
                &format!("Id value must be less than 10^19 ({})", *MAX_VALUE),
                ErrorKind::InvalidId,
            ));
        } else if id_value < *MIN_VALUE {
            log::error!("Id value is too small");
            return Err(EngineError::new(
                &format!(
                    "Id value must be greater than or equal to 10^18 ({})",
                    *MIN_VALUE
                ),
                ErrorKind::InvalidId,
            ));
        }

        Ok(true)
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        DocumentId::new()
    }
}

impl Debug for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.id_value)
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.id_value)
    }
}
