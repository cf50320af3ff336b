// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use easel_backend::QueryResult;

use crate::call::QueryCall;

/// Copies a result's destination contents and row count onto `target`.
///
/// Nothing else on the call changes; errors in particular are never copied.
pub(crate) fn transfer<D>(result: QueryResult<D>, target: &mut QueryCall<D>) {
    let (dest, rows_affected) = result.into_parts();
    *target.dest_mut() = dest;
    target.set_rows_affected(rows_affected);
}

/// Captures a call's destination contents and row count.
pub(crate) fn snapshot<D: Clone>(call: &QueryCall<D>) -> QueryResult<D> {
    QueryResult::new(call.dest().clone(), call.rows_affected())
}
