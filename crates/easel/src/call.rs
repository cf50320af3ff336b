// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The unit of work flowing through the query cache.

use std::fmt;

use easel_backend::{CallContext, Error};

use crate::directive::CacheDirective;
use crate::value::{ToValue, Value};

type Compile = Box<dyn FnOnce(&mut Statement) + Send + Sync>;

/// Query text plus bound argument values.
///
/// A statement may carry a deferred compilation step that produces (or rewrites) its final
/// text and arguments. The step runs at most once, the first time the statement is
/// [materialized](Self::materialize).
///
/// # Examples
///
/// ```
/// use easel::Statement;
///
/// let mut statement = Statement::new("SELECT * FROM users WHERE id = ?").bind(7);
/// assert_eq!(statement.sql(), "SELECT * FROM users WHERE id = ?");
///
/// let mut deferred = Statement::deferred(|s| {
///     s.set_sql("SELECT 1");
/// });
/// assert_eq!(deferred.sql(), "");
/// deferred.materialize();
/// assert_eq!(deferred.sql(), "SELECT 1");
/// ```
#[derive(Default)]
pub struct Statement {
    sql: String,
    vars: Vec<Value>,
    compile: Option<Compile>,
}

impl Statement {
    /// Creates a statement with the given text and no arguments.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            vars: Vec::new(),
            compile: None,
        }
    }

    /// Creates a statement whose text and arguments are produced by `compile`.
    #[must_use]
    pub fn deferred(compile: impl FnOnce(&mut Self) + Send + Sync + 'static) -> Self {
        Self {
            sql: String::new(),
            vars: Vec::new(),
            compile: Some(Box::new(compile)),
        }
    }

    /// Appends a bound argument.
    #[must_use]
    pub fn bind(mut self, value: impl ToValue) -> Self {
        self.push(value);
        self
    }

    /// Appends a bound argument in place.
    pub fn push(&mut self, value: impl ToValue) {
        self.vars.push(value.to_value());
    }

    /// Replaces the statement text.
    pub fn set_sql(&mut self, sql: impl Into<String>) {
        self.sql = sql.into();
    }

    /// Appends to the statement text.
    pub fn push_sql(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Runs the deferred compilation step, if one is still pending.
    pub fn materialize(&mut self) {
        if let Some(compile) = self.compile.take() {
            compile(self);
        }
    }

    /// Returns `true` if a deferred compilation step has not run yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.compile.is_some()
    }

    /// Returns the statement text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the bound arguments.
    #[must_use]
    pub fn vars(&self) -> &[Value] {
        &self.vars
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("vars", &self.vars)
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Self::new(sql)
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Self::new(sql)
    }
}

/// One query or mutation in flight.
///
/// A `QueryCall` owns the destination buffer `D` that execution callbacks fill in, the
/// number of affected rows, every error recorded while serving the call, the
/// [`Statement`] being run, and the ambient [`CallContext`].
///
/// Errors accumulate: [`error`](Self::error) returns the last one recorded and
/// [`errors`](Self::errors) all of them in order.
///
/// # Examples
///
/// ```
/// use easel::{Error, QueryCall};
///
/// let mut call = QueryCall::new("SELECT name FROM users", Vec::<String>::new());
/// call.dest_mut().push("alice".to_string());
/// call.set_rows_affected(1);
/// assert_eq!(call.dest().len(), 1);
///
/// call.add_error(Error::execution("boom"));
/// assert!(call.has_error());
/// ```
pub struct QueryCall<D> {
    statement: Statement,
    dest: D,
    rows_affected: u64,
    errors: Vec<Error>,
    context: CallContext,
    directive: Option<CacheDirective>,
}

impl<D> QueryCall<D> {
    /// Creates a call for `statement` writing into `dest`, with a fresh context.
    pub fn new(statement: impl Into<Statement>, dest: D) -> Self {
        Self::with_context(statement, dest, CallContext::new())
    }

    /// Creates a call with an explicit context.
    pub fn with_context(statement: impl Into<Statement>, dest: D, context: CallContext) -> Self {
        Self {
            statement: statement.into(),
            dest,
            rows_affected: 0,
            errors: Vec::new(),
            context,
            directive: None,
        }
    }

    /// Returns the statement.
    #[must_use]
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Returns the statement for modification.
    pub fn statement_mut(&mut self) -> &mut Statement {
        &mut self.statement
    }

    /// Returns the destination buffer.
    #[must_use]
    pub fn dest(&self) -> &D {
        &self.dest
    }

    /// Returns the destination buffer for writing.
    pub fn dest_mut(&mut self) -> &mut D {
        &mut self.dest
    }

    /// Consumes the call and returns the destination buffer.
    #[must_use]
    pub fn into_dest(self) -> D {
        self.dest
    }

    /// Returns the number of rows the call affected.
    #[must_use]
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Sets the number of rows the call affected.
    pub fn set_rows_affected(&mut self, rows: u64) {
        self.rows_affected = rows;
    }

    /// Records an error on the call.
    pub fn add_error(&mut self, error: Error) {
        self.errors.push(error);
    }

    /// Returns the most recently recorded error.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        self.errors.last()
    }

    /// Returns every recorded error, oldest first.
    #[must_use]
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Returns `true` if any error was recorded.
    #[must_use]
    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the call's context.
    #[must_use]
    pub fn context(&self) -> &CallContext {
        &self.context
    }

    /// Returns the call's context for modification.
    pub fn context_mut(&mut self) -> &mut CallContext {
        &mut self.context
    }

    /// Returns the cache directive attached to this call, if any.
    #[must_use]
    pub fn directive(&self) -> Option<&CacheDirective> {
        self.directive.as_ref()
    }

    /// Applies a directive to this call.
    ///
    /// The directive only takes effect when a query cache is reachable from the call's
    /// context; see [`CacheDirective::apply`].
    #[must_use]
    pub fn scope(mut self, directive: CacheDirective) -> Self {
        directive.apply(&mut self);
        self
    }

    pub(crate) fn set_directive(&mut self, directive: CacheDirective) {
        self.directive = Some(directive);
    }

    pub(crate) fn clear_directive(&mut self) {
        self.directive = None;
    }
}

impl<D: fmt::Debug> fmt::Debug for QueryCall<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCall")
            .field("statement", &self.statement)
            .field("dest", &self.dest)
            .field("rows_affected", &self.rows_affected)
            .field("errors", &self.errors)
            .field("context", &self.context)
            .field("directive", &self.directive)
            .finish()
    }
}
