// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Model Service Adapter
//!
//! This crate turns an object holding a fitted model into an HTTP service.
//! The object implements [`WebService`] and marks the methods to expose;
//! materialization validates every declaration and builds an immutable route
//! table, and [`Server`] serves it with Axum.
//!
//! # Module Structure
//!
//! - [`endpoint`]: Endpoint declarations, the [`WebService`] trait and handler errors
//! - [`route_table`]: Materialization into routes and per-request dispatch
//! - [`config`]: Server configuration and environment management with hierarchical loading
//! - [`error`]: Error types and HTTP response handling with proper status codes
//! - [`state`]: Shared application state management with cancellation token support
//! - [`server`]: Main server implementation, lifecycle, and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//! - [`middleware`]: Reporting of internal errors
//! - [`docs`] and [`openapi`]: Generated `OpenAPI` document, Swagger UI and `ReDoc`
//! - [`metrics`]: Prometheus metrics
//! - [`demo`]: The classifier served by the `model-service` binary
//!
//! # Example
//!
//! ```rust
//! use web_service::{Endpoint, EndpointRegistry, WebService, WebServiceExt};
//!
//! struct Adder;
//!
//! impl WebService for Adder {
//!     fn endpoints(registry: &mut EndpointRegistry<Self>) {
//!         registry.mark(
//!             Endpoint::new("add").param::<i64>("a").param::<i64>("b").returns::<i64>(),
//!             |_, args| Ok(args.get::<i64>("a")? + args.get::<i64>("b")?),
//!         );
//!     }
//! }
//!
//! let app = Adder.into_app().expect("complete declarations");
//! assert_eq!(app.route_count(), 1);
//! ```

pub mod config;
pub mod demo;
pub mod docs;
pub mod endpoint;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod route_table;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig};
pub use endpoint::{
    Arguments, Endpoint, EndpointError, EndpointMethod, EndpointRegistry, ReturnType, WebService,
    WebServiceExt,
};
pub use error::{ServerError, ServerResult};
pub use route_table::{ConfigurationError, Route, RouteTable, ServiceApp};
pub use server::{Server, ShutdownConfig};
pub use service_schema::{RecordSchema, Schema, TypeDescriptor};
pub use state::{HealthCheck, ServerState};
