// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Field names of the `query.event` record; they must match the literal field names in
// `emit_event!`.

pub(crate) const QUERY_EVENT_NAME: &str = "query.event";

pub(crate) const QUERY_CACHE_NAME: &str = "query.cache";

pub(crate) const QUERY_IDENTIFIER_NAME: &str = "query.identifier";

pub(crate) const QUERY_OPERATION_NAME: &str = "query.operation";

pub(crate) const QUERY_ACTIVITY_NAME: &str = "query.activity";

pub(crate) const QUERY_DURATION_NAME: &str = "query.duration_ns";
