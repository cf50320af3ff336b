// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// The cacheable outcome of a read query.
///
/// A `QueryResult` pairs a snapshot of the query's destination buffer with the number of
/// rows the query affected. It is what a cache backend stores under an identifier and what
/// it hands back on a hit.
///
/// # Examples
///
/// ```
/// use easel_backend::QueryResult;
///
/// let result = QueryResult::new(vec!["alice", "bob"], 2);
/// assert_eq!(result.dest(), &vec!["alice", "bob"]);
/// assert_eq!(result.rows_affected(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct QueryResult<D> {
    dest: D,
    rows_affected: u64,
}

impl<D> QueryResult<D> {
    /// Creates a result from a destination snapshot and a row count.
    pub fn new(dest: D, rows_affected: u64) -> Self {
        Self { dest, rows_affected }
    }

    /// Returns the destination snapshot.
    #[must_use]
    pub fn dest(&self) -> &D {
        &self.dest
    }

    /// Returns the number of rows affected by the query that produced this result.
    #[must_use]
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Consumes the result and returns the destination snapshot and the row count.
    #[must_use]
    pub fn into_parts(self) -> (D, u64) {
        (self.dest, self.rows_affected)
    }

    /// Maps the destination snapshot, keeping the row count.
    ///
    /// Backends that persist an encoded form use this to convert between the caller's
    /// destination type and their storage representation.
    pub fn map<T>(self, f: impl FnOnce(D) -> T) -> QueryResult<T> {
        QueryResult {
            dest: f(self.dest),
            rows_affected: self.rows_affected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_parts_returns_both_fields() {
        let (dest, rows) = QueryResult::new("row".to_string(), 1).into_parts();
        assert_eq!(dest, "row");
        assert_eq!(rows, 1);
    }

    #[test]
    fn map_keeps_row_count() {
        let mapped = QueryResult::new(vec![1, 2, 3], 3).map(|rows| rows.len());
        assert_eq!(*mapped.dest(), 3);
        assert_eq!(mapped.rows_affected(), 3);
    }

    #[test]
    fn default_is_empty() {
        let result = QueryResult::<Vec<u8>>::default();
        assert!(result.dest().is_empty());
        assert_eq!(result.rows_affected(), 0);
    }
}
