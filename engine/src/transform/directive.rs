//! The directive capability and its per-batch output.
//!
//! A directive reports failure in one of two ways:
//!
//! - returning `Err(DirectiveError)` aborts the whole run (fatal);
//! - diverting individual rows through [`DirectiveOutput::divert`] keeps the
//!   run going while those rows are collected as [`ErrorRecord`]s.

use serde::Serialize;
use std::fmt;

use super::context::ExecutionContext;
use super::dsl::{Arguments, UsageDefinition};
use crate::error::{ArgumentResult, DirectiveResult};
use crate::models::Row;

/// Default error code for diverted rows.
pub const DEFAULT_ERROR_CODE: i32 = 1;

/// One named, parameterized transformation step.
///
/// Instances are created by a registry factory, configured once through
/// [`Directive::initialize`], then shared read-only across every batch and
/// every run. Anything that varies per run belongs in the
/// [`ExecutionContext`].
pub trait Directive: Send + Sync + fmt::Debug {
    /// Declared grammar. Must not depend on initialization.
    fn define(&self) -> UsageDefinition;

    /// Configure the instance from its bound arguments.
    fn initialize(&mut self, args: &Arguments) -> ArgumentResult<()>;

    /// Transform a whole batch.
    fn execute(
        &self,
        rows: Vec<Row>,
        context: &mut ExecutionContext,
    ) -> DirectiveResult<DirectiveOutput>;
}

/// A row a directive rejected, before the executor tags it with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub row: Row,
    pub message: String,
    pub code: i32,
}

/// Per-row outcome, kept in batch order.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Keep(Row),
    Divert(RowError),
}

/// Result of running one directive over a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveOutput {
    outcomes: Vec<RowOutcome>,
}

impl DirectiveOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(capacity),
        }
    }

    pub fn keep(&mut self, row: Row) {
        self.outcomes.push(RowOutcome::Keep(row));
    }

    /// Divert `row` with the default error code.
    pub fn divert(&mut self, row: Row, message: impl Into<String>) {
        self.divert_with_code(row, message, DEFAULT_ERROR_CODE);
    }

    pub fn divert_with_code(&mut self, row: Row, message: impl Into<String>, code: i32) {
        self.outcomes.push(RowOutcome::Divert(RowError {
            row,
            message: message.into(),
            code,
        }));
    }

    pub fn outcomes(&self) -> &[RowOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<RowOutcome> {
        self.outcomes
    }

    /// Number of kept rows.
    pub fn kept(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RowOutcome::Keep(_)))
            .count()
    }

    pub fn diverted(&self) -> usize {
        self.outcomes.len() - self.kept()
    }
}

impl From<Vec<Row>> for DirectiveOutput {
    fn from(rows: Vec<Row>) -> Self {
        Self {
            outcomes: rows.into_iter().map(RowOutcome::Keep).collect(),
        }
    }
}

/// A row diverted from the main batch, tagged with the directive that did it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub row: Row,
    pub directive: String,
    pub line: usize,
    pub message: String,
    pub code: i32,
}
