//! vaultql Query Engine
//!
//! Runs structured queries over the document records of a vault.
//!
//! # Overview
//!
//! The query engine implements:
//! - A two-tier field resolver (`file.*` virtual fields, then front matter)
//! - Loose, total predicate evaluation
//! - A fixed-order pipeline: scope, flatten, filter, group, sort, limit, project
//! - Grouped results with per-group aggregates
//! - Concurrent batch execution against a shared record store

pub mod config;
pub mod engine;
pub mod evaluator;
pub mod executor;
pub mod grouping;
pub mod planner;
pub mod query;
pub mod resolver;
pub mod result;
pub mod sorter;


pub use config::EngineConfig;
pub use engine::QueryEngine;
pub use executor::{QueryExecutor, execute};
pub use planner::{ExecutionPlan, PipelineStage, QueryPlanner};
pub use query::{
    AggregateFunction, Column, Condition, FlattenClause, GROUP_SIZE_EXPR, Operator, Query,
    SortClause, SortDirection, SortKey, Source,
};
pub use resolver::{VirtualField, resolve};
pub use result::{AggregateValue, ExecutionStats, QueryResult, ResultEntry, ResultGroup};
