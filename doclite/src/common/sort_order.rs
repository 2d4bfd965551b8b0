/// Specifies the direction for sorting documents.
///
/// # Purpose
/// Defines whether documents should be sorted in ascending (low to high) or
/// descending (high to low) order. Used in query options and the `$sort`
/// pipeline stage to control result ordering.
///
/// # Variants
/// - `Ascending`: Sort from smallest to largest value (A to Z, 0 to 9, oldest to newest)
/// - `Descending`: Sort from largest to smallest value (Z to A, 9 to 0, newest to oldest)
///
/// # Usage
/// Used with the `order_by()` helper when querying collections:
/// ```text
/// let options = order_by("age", SortOrder::Ascending);
/// let cursor = collection.find(&predicate, options)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in ascending order (smallest to largest, A-Z, oldest to newest)
    Ascending,
    /// Sort in descending order (largest to smallest, Z-A, newest to oldest)
    Descending,
}
