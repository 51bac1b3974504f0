//! respcheck-core: Core types and comparison logic for API contract checks
//!
//! This crate holds the expected-schema model, the response fixture format,
//! the structural comparator and the aggregation of findings into report rows.
//! Loading contracts and fixtures from disk lives in `respcheck-runner`.

pub mod aggregate;
pub mod compare;
pub mod config;
pub mod finding;
pub mod fixture;
pub mod index;
pub mod key;
pub mod plan;
pub mod report;
pub mod schema;

pub use aggregate::{
    ApiGroup, CheckedFixture, Evaluation, ReportRow, RowResult, Summary, aggregate, evaluate,
    evaluate_all, group_by_api,
};
pub use compare::{CompareContext, CompareError, compare};
pub use config::{Config, ConfigError};
pub use finding::{FieldPath, Finding, FindingKind};
pub use fixture::{FixtureError, FixtureSet, FixtureSource, ResponseFixture, SkippedFixture};
pub use index::ExpectedSchemaIndex;
pub use key::{KeyRules, OperationId, OperationKey};
pub use plan::CheckPlan;
pub use report::{ContractReport, CsvReport, HtmlReport, JsonReport, ReportError, ReportSink};
pub use schema::{RefResolver, Schema, SchemaError};
