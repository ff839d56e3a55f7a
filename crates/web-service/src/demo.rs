// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Demonstration model served by the `model-service` binary
//!
//! [`ModeClassifier`] learns the most frequent label during `fit` and predicts
//! it for every input row. It keeps its fitted state behind a lock because
//! endpoints are invoked concurrently.

use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use tracing::info;

use crate::endpoint::{Endpoint, EndpointError, EndpointMethod, EndpointRegistry, WebService};

/// Predicts the most frequent training label
#[derive(Debug, Default)]
pub struct ModeClassifier {
    mode: RwLock<Option<f64>>,
}

impl ModeClassifier {
    /// Unfitted classifier
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the most frequent value of `y`; ties go to the smallest value
    ///
    /// # Errors
    ///
    /// Returns a 400 error when `y` is empty or its length differs from `x`.
    pub fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<(), EndpointError> {
        if y.is_empty() {
            return Err(EndpointError::bad_request("y must not be empty"));
        }
        if x.len() != y.len() {
            return Err(EndpointError::bad_request(format!(
                "X has {} rows but y has {} labels",
                x.len(),
                y.len()
            )));
        }

        // f64 is not Ord; count by bit pattern and keep the first seen value.
        let mut counts: BTreeMap<u64, (f64, usize)> = BTreeMap::new();
        for label in y {
            counts.entry(label.to_bits()).or_insert((*label, 0)).1 += 1;
        }
        let mode = counts
            .into_values()
            .max_by(|(a, count_a), (b, count_b)| count_a.cmp(count_b).then(b.total_cmp(a)))
            .map(|(label, _)| label);

        *self.mode.write().unwrap_or_else(PoisonError::into_inner) = mode;
        info!(mode = ?mode, samples = y.len(), "fitted mode classifier");
        Ok(())
    }

    /// Predict the fitted mode for every row of `x`
    ///
    /// # Errors
    ///
    /// Returns a 409 error when the classifier has not been fitted.
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, EndpointError> {
        let mode = self
            .mode()
            .ok_or_else(|| EndpointError::conflict("model has not been fitted"))?;
        Ok(vec![mode; x.len()])
    }

    /// Fitted mode, if any
    pub fn mode(&self) -> Option<f64> {
        *self.mode.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WebService for ModeClassifier {
    fn endpoints(registry: &mut EndpointRegistry<Self>) {
        registry
            .mark(
                Endpoint::new("fit")
                    .param::<Vec<Vec<f64>>>("X")
                    .param::<Vec<f64>>("y")
                    .returns::<()>()
                    .summary("Fit the classifier"),
                |model, args| model.fit(&args.get::<Vec<Vec<f64>>>("X")?, &args.get::<Vec<f64>>("y")?),
            )
            .mark(
                Endpoint::new("predict")
                    .param::<Vec<Vec<f64>>>("X")
                    .returns::<Vec<f64>>()
                    .summary("Predict a label per row"),
                |model, args| model.predict(&args.get::<Vec<Vec<f64>>>("X")?),
            )
            .mark(
                Endpoint::new("mode")
                    .method(EndpointMethod::Get)
                    .returns::<Option<f64>>()
                    .summary("Fitted mode"),
                |model, _| Ok(model.mode()),
            );
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    fn status_of(error: EndpointError) -> StatusCode {
        match error {
            EndpointError::Http { status, .. } => status,
            EndpointError::Internal(e) => panic!("unexpected internal error: {e}"),
        }
    }

    #[test]
    fn fit_then_predict() {
        let model = ModeClassifier::new();
        model
            .fit(&[vec![1.0], vec![2.0], vec![3.0]], &[8.0, 8.0, 1.0])
            .unwrap();
        assert_eq!(model.mode(), Some(8.0));
        assert_eq!(model.predict(&[vec![0.0], vec![5.0]]).unwrap(), vec![8.0, 8.0]);
    }

    #[test]
    fn ties_pick_the_smallest_label() {
        let model = ModeClassifier::new();
        model.fit(&[vec![], vec![]], &[3.0, 2.0]).unwrap();
        assert_eq!(model.mode(), Some(2.0));
    }

    #[test]
    fn predict_requires_fit() {
        let model = ModeClassifier::new();
        assert_eq!(
            status_of(model.predict(&[vec![1.0]]).unwrap_err()),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn fit_rejects_bad_shapes() {
        let model = ModeClassifier::new();
        assert_eq!(
            status_of(model.fit(&[], &[]).unwrap_err()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(model.fit(&[vec![1.0]], &[1.0, 2.0]).unwrap_err()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(model.mode(), None);
    }

    #[test]
    fn marks_three_endpoints() {
        let mut registry = EndpointRegistry::new();
        ModeClassifier::endpoints(&mut registry);
        let names: Vec<_> = registry.endpoints().map(Endpoint::name).collect();
        assert_eq!(names, ["fit", "predict", "mode"]);
    }
}
