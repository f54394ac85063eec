//! # Scanbay Core
//!
//! Core library for Scanbay, an asynchronous domain-scan service: a
//! caller submits a domain, a worker runs an external vulnerability
//! scanner against it, and the structured report plus a rendered HTML
//! table become downloadable artifacts.
//!
//! ## Overview
//!
//! The crate provides the pieces both binaries are built from:
//!
//! - **Domain validation**: the [`domain::Domain`] newtype, the only
//!   gate through which a scan target enters the system
//! - **Task queue**: Redis-backed submission, claiming, and state
//!   tracking in [`queue`]
//! - **Scan execution**: the [`executor::ScanExecutor`] child-process
//!   driver with timeout and staged artifact publication
//! - **Report rendering**: structured-XML-to-HTML-table transform in
//!   [`report`]
//! - **Result storage**: deterministic per-domain artifact paths and
//!   the traversal-safe download resolver in [`artifacts`]
//!
//! ## Architecture
//!
//! The API server validates and submits; workers claim envelopes from
//! the queue list, drive the executor, and write task state records
//! back. Artifacts are produced in a task-keyed staging directory and
//! published into the flat domain-keyed namespace by atomic rename, so
//! concurrent scans of the same domain never expose partial files.

/// Artifact path resolution and the on-disk result store.
pub mod artifacts;
/// Environment-driven runtime configuration.
pub mod config;
/// Domain validation.
pub mod domain;
/// Crate-wide error type.
pub mod error;
/// Scan execution against the external scanner process.
pub mod executor;
/// Redis task queue client and task state model.
pub mod queue;
/// Structured report parsing and HTML rendering.
pub mod report;

pub use artifacts::ResultStore;
pub use config::Config;
pub use domain::Domain;
pub use error::{Result, ScanError};
pub use executor::ScanExecutor;
pub use queue::{RedisTaskQueue, ScanQueue, TaskState, TaskStatus};
