/// Options applied to update and replace operations.
///
/// # Upsert
///
/// When `upsert` is set and no document matches the selector, a new document
/// is synthesized and inserted: the equality constraints of the selector are
/// merged with the update's `$set` fields (or, for a replace, the
/// replacement document is inserted as-is).
#[derive(Clone, Copy, Default)]
pub struct UpdateOptions {
    pub(crate) upsert: bool,
}

impl UpdateOptions {
    pub fn new() -> Self {
        UpdateOptions::default()
    }

    /// Enables insertion of a synthesized document when nothing matches.
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }
}

/// Creates an `UpdateOptions` with upsert enabled.
pub fn insert_if_absent() -> UpdateOptions {
    UpdateOptions::new().upsert(true)
}
