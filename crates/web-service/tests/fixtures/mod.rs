// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(dead_code)]

//! Shared test fixtures
//!
//! Services exercising the adapter and helpers to serve them on an ephemeral
//! port.

use std::{
    collections::BTreeMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use web_service::{
    Endpoint, EndpointError, EndpointMethod, EndpointRegistry, RecordSchema, Schema, Server,
    ServerConfig, ServiceApp, ShutdownConfig, TypeDescriptor, WebService, WebServiceExt,
};

/// Integer calculator with a call log
#[derive(Debug, Default)]
pub struct Calculator {
    /// Arguments of every successful `add` call
    pub calls: Mutex<Vec<(i64, i64)>>,
}

impl Calculator {
    /// Plain method, also reachable in-process
    pub fn add(&self, a: i64, b: i64) -> i64 {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((a, b));
        }
        a + b
    }

    /// Number of recorded `add` calls
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
    }
}

impl WebService for Calculator {
    fn endpoints(registry: &mut EndpointRegistry<Self>) {
        registry
            .mark(
                Endpoint::new("add")
                    .param::<i64>("a")
                    .param::<i64>("b")
                    .returns::<i64>(),
                |calc, args| Ok(calc.add(args.get("a")?, args.get("b")?)),
            )
            .mark(
                Endpoint::new("negate")
                    .path("/ops/negate")
                    .param::<i64>("value")
                    .returns::<i64>(),
                |_, args| Ok(-args.get::<i64>("value")?),
            )
            .mark(
                Endpoint::new("calls")
                    .method(EndpointMethod::Get)
                    .returns::<usize>(),
                |calc, _| Ok(calc.call_count()),
            );
    }
}

/// Nested record returned by [`Catalog`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Report title
    pub title: String,
    /// Scores per class
    pub scores: BTreeMap<String, f64>,
    /// Nested rows
    pub rows: Vec<Row>,
    /// Optional note
    pub note: Option<String>,
}

/// Row of a [`Report`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Row label
    pub label: String,
    /// Values
    pub values: Vec<i64>,
}

impl Schema for Row {
    fn schema() -> TypeDescriptor {
        RecordSchema::new("Row")
            .field::<String>("label")
            .field::<Vec<i64>>("values")
            .into()
    }
}

impl Schema for Report {
    fn schema() -> TypeDescriptor {
        RecordSchema::new("Report")
            .field::<String>("title")
            .field::<BTreeMap<String, f64>>("scores")
            .field::<Vec<Row>>("rows")
            .field::<Option<String>>("note")
            .into()
    }
}

/// Service returning nested records
#[derive(Debug)]
pub struct Catalog;

impl Catalog {
    /// Report with `rows` rows
    pub fn report(&self, rows: u32) -> Report {
        Report {
            title: "quarterly".to_string(),
            scores: BTreeMap::from([("a".to_string(), 0.25), ("b".to_string(), 0.75)]),
            rows: (0..rows)
                .map(|i| Row {
                    label: format!("row-{i}"),
                    values: vec![i64::from(i), i64::from(i) * 2],
                })
                .collect(),
            note: None,
        }
    }
}

impl WebService for Catalog {
    fn endpoints(registry: &mut EndpointRegistry<Self>) {
        registry.mark(
            Endpoint::new("report")
                .param::<u32>("rows")
                .returns::<Report>(),
            |catalog, args| Ok(catalog.report(args.get("rows")?)),
        );
    }
}

/// Service whose endpoints fail in every supported way
#[derive(Debug)]
pub struct Faulty;

impl WebService for Faulty {
    fn endpoints(registry: &mut EndpointRegistry<Self>) {
        registry
            .mark(Endpoint::new("crash").returns::<()>(), |_, _| {
                Err::<(), _>(EndpointError::internal("weights file is corrupt"))
            })
            .mark(Endpoint::new("reload").returns::<()>(), |_, _| {
                Err::<(), _>(EndpointError::http(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "model is reloading",
                ))
            })
            .mark(Endpoint::new("reject").returns::<()>(), |_, _| {
                Err::<(), _>(EndpointError::bad_request("input rejected"))
            })
            .mark(Endpoint::new("mislabel").returns::<Vec<f64>>(), |_, _| {
                Ok(vec!["not", "numbers"])
            });
    }
}

/// Serve `app` on an ephemeral port
pub async fn serve(app: ServiceApp) -> (SocketAddr, CancellationToken) {
    serve_with_config(app, ServerConfig::for_testing()).await
}

/// Serve `app` with a custom configuration
pub async fn serve_with_config(
    app: ServiceApp,
    config: ServerConfig,
) -> (SocketAddr, CancellationToken) {
    Server::new(config, ShutdownConfig::default(), app)
        .expect("Failed to create server")
        .run_for_testing()
        .await
        .expect("Failed to start test server")
}

/// Serve a calculator the test keeps a handle to
pub async fn serve_calculator() -> (Arc<Calculator>, SocketAddr, CancellationToken) {
    let calculator = Arc::new(Calculator::default());
    let app = ServiceApp::materialize_shared(Arc::clone(&calculator))
        .expect("calculator declarations are complete");
    let (addr, token) = serve(app).await;
    (calculator, addr, token)
}

/// Materialize any service, panicking on configuration errors
pub fn app<S: WebService>(service: S) -> ServiceApp {
    service.into_app().expect("declarations are complete")
}
