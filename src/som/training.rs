//! SOM training: decay schedules and the neighborhood update.
//!
//! Each `train` call uses the iteration number before it is incremented, so the
//! first call trains at iteration 1 and the last at `iteration_count`.

use crate::error::{Result, SomError};
use crate::som::{FeatureVector, Node, Som};
use log::{debug, info, warn};
use rayon::prelude::*;

/// Iterations between schedule log lines.
const LOG_INTERVAL: usize = 1000;

impl Som {
    /// Computes the neighborhood radius at a given iteration.
    ///
    /// `radius = r0 * exp(-t / (n / ln r0))`. For `r0 <= 1` the time constant is
    /// not positive and the result can grow or become NaN; a NaN or negative
    /// radius simply matches no node.
    #[inline]
    pub fn radius(&self, iteration: usize) -> f64 {
        let time_constant = self.iteration_count() as f64 / self.initial_radius().ln();
        self.initial_radius() * (-(iteration as f64 / time_constant)).exp()
    }

    /// Computes the learning rate at a given iteration.
    #[inline]
    pub fn learning_rate(&self, iteration: usize) -> f64 {
        self.initial_learning_rate() * (-(iteration as f64 / self.iteration_count() as f64)).exp()
    }

    /// Trains the map with one sample.
    ///
    /// Finds the BMU, records `id` on it, and pulls every node within the
    /// current radius of the BMU towards `vector`. Fails without touching the
    /// map once the iteration budget is used up.
    pub fn train(&mut self, id: impl Into<String>, vector: FeatureVector) -> Result<()> {
        if self.is_exhausted() {
            warn!(
                "Training refused: iteration {} exceeds the expected iteration count of {}",
                self.current_iteration,
                self.iteration_count()
            );
            return Err(SomError::TrainingExhausted {
                iteration_count: self.iteration_count(),
            });
        }
        self.ensure_initialized()?;

        let iteration = self.current_iteration;
        self.current_iteration += 1;

        let radius = self.radius(iteration);
        let learning_rate = self.learning_rate(iteration);

        let bmu_idx = self.find_bmu(&vector)?;
        self.update(&vector, bmu_idx, learning_rate, radius);
        self.record_trainee(id.into(), bmu_idx, vector);

        if iteration % LOG_INTERVAL == 0 || iteration == self.iteration_count() {
            debug!(
                "Iteration {}/{}: lr={:.4}, radius={:.4}",
                iteration,
                self.iteration_count(),
                learning_rate,
                radius
            );
        }
        if self.is_exhausted() {
            info!("SOM training completed after {} iterations", self.iteration_count());
        }

        Ok(())
    }

    /// Updates every node within `radius` of the BMU towards `input`.
    ///
    /// Distances are taken as `distance(bmu.weights, node.weights)`. The
    /// sequential pass walks the grid in order and reads the BMU weights live,
    /// so nodes after the BMU are measured against it once it has moved. The
    /// parallel pass measures every node against a snapshot taken before the
    /// pass.
    pub(crate) fn update(&mut self, input: &FeatureVector, bmu_idx: usize, learning_rate: f64, radius: f64) {
        if self.parallel {
            let bmu_weights = self.nodes[bmu_idx].weights.clone();
            let distance = self.distance.clone();

            self.nodes.par_iter_mut().for_each(|node: &mut Node| {
                let dist = distance.distance(&bmu_weights, &node.weights);
                if dist < radius {
                    node.adapt(input, neighborhood_influence(dist, radius) * learning_rate);
                }
            });
        } else {
            for position in 0..self.nodes.len() {
                let dist = self
                    .distance
                    .distance(&self.nodes[bmu_idx].weights, &self.nodes[position].weights);
                if dist < radius {
                    self.nodes[position].adapt(input, neighborhood_influence(dist, radius) * learning_rate);
                }
            }
        }
    }
}

/// Influence of the BMU on a node at weight-space distance `distance`.
///
/// A non-positive influence is clamped to 1.
#[inline]
pub fn neighborhood_influence(distance: f64, radius: f64) -> f64 {
    let influence = (-(distance / (2.0 * radius))).exp();
    if influence <= 0.0 { 1.0 } else { influence }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InitConfig, SomConfig};
    use crate::distance::FnDistance;

    fn vector(pairs: &[(&str, f64)]) -> FeatureVector {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn line_som(values: &[f64], iterations: usize, initial_radius: Option<f64>) -> Som {
        let config = SomConfig {
            width: values.len(),
            height: 1,
            initial_radius,
            ..SomConfig::with_iterations(iterations)
        };
        let mut som = Som::new(&config).unwrap();
        let nodes = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Node::new_with_weights(0, i, i, vector(&[("f", v)])))
            .collect();
        som.init(InitConfig::with_nodes(nodes)).unwrap();
        som
    }

    #[test]
    fn test_learning_rate_decay() {
        let som = line_som(&[0.0, 1.0], 100, Some(4.0));

        assert!((som.learning_rate(0) - 0.1).abs() < 1e-10);
        assert!((som.learning_rate(100) - 0.1 * (-1.0f64).exp()).abs() < 1e-10);
        for t in 1..100 {
            assert!(som.learning_rate(t + 1) < som.learning_rate(t));
        }
    }

    #[test]
    fn test_radius_decay() {
        let som = line_som(&[0.0, 1.0], 100, Some(4.0));

        assert!((som.radius(0) - 4.0).abs() < 1e-10);
        // After the full schedule the radius has decayed to 1
        assert!((som.radius(100) - 1.0).abs() < 1e-10);
        for t in 1..100 {
            assert!(som.radius(t + 1) < som.radius(t));
        }
    }

    #[test]
    fn test_radius_degenerate_initial_radius() {
        let som = line_som(&[0.0, 1.0], 10, Some(1.0));
        assert!((som.radius(5) - 1.0).abs() < 1e-10);

        // ln(r0) < 0 makes the time constant negative and the radius grows
        let som = line_som(&[0.0, 1.0], 10, Some(0.5));
        assert!(som.radius(2) > som.radius(1));
    }

    #[test]
    fn test_influence() {
        assert!((neighborhood_influence(0.0, 2.0) - 1.0).abs() < 1e-10);
        assert!((neighborhood_influence(2.0, 2.0) - (-0.5f64).exp()).abs() < 1e-10);
        // Underflow to zero is clamped to full influence
        assert_eq!(neighborhood_influence(1e6, 1e-3), 1.0);
    }

    #[test]
    fn test_train_uses_pre_increment_iteration() {
        let mut som = line_som(&[0.0, 1.0], 10, None);
        let before = som.nodes()[1].weights["f"];

        som.train("a", vector(&[("f", 0.9)])).unwrap();
        assert_eq!(som.current_iteration(), 2);

        // BMU at distance 0 gets influence 1 and the rate of iteration 1
        let expected = before + som.learning_rate(1) * (0.9 - before);
        assert!((som.nodes()[1].weights["f"] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_train_exhaustion() {
        let mut som = line_som(&[0.0, 1.0], 3, None);
        for i in 0..3 {
            som.train(format!("t{i}"), vector(&[("f", 0.5)])).unwrap();
        }
        assert!(som.is_exhausted());
        assert_eq!(som.remaining_iterations(), 0);

        let snapshot = som.nodes().to_vec();
        let err = som.train("late", vector(&[("f", 0.5)])).unwrap_err();
        assert_eq!(err, SomError::TrainingExhausted { iteration_count: 3 });
        assert_eq!(som.current_iteration(), 4);
        assert_eq!(som.nodes(), snapshot.as_slice());
        assert!(som.trained_position("late").is_none());
    }

    #[test]
    fn test_zero_iteration_budget_refuses_first_call() {
        let mut som = line_som(&[0.0, 1.0], 0, None);
        assert!(matches!(
            som.train("a", vector(&[("f", 0.0)])),
            Err(SomError::TrainingExhausted { iteration_count: 0 })
        ));
    }

    #[test]
    fn test_train_uninitialized() {
        let mut som = Som::new(&SomConfig::with_iterations(5)).unwrap();
        assert!(som.train("a", vector(&[("f", 0.0)])).unwrap_err().is_config());
        assert_eq!(som.current_iteration(), 1);
    }

    #[test]
    fn test_nodes_outside_radius_unchanged() {
        // initial radius 2 gives radius ~1.93 at iteration 1 of 20
        let mut som = line_som(&[0.0, 1.0, 1.5, 5.0], 20, Some(2.0));
        let far = som.nodes()[3].weights.clone();
        let radius = som.radius(1);

        som.train("a", vector(&[("f", 0.1)])).unwrap();

        assert!(radius < 5.0);
        assert_eq!(som.nodes()[3].weights, far);
        assert!(som.nodes()[1].weights["f"] < 1.0);
        assert!(som.nodes()[2].weights["f"] < 1.5);
    }

    #[test]
    fn test_missing_input_feature_is_skipped() {
        let config = SomConfig {
            width: 1,
            height: 1,
            ..SomConfig::with_iterations(5)
        };
        let mut som = Som::new(&config).unwrap();
        som.init(InitConfig::with_nodes(vec![Node::new_with_weights(
            0,
            0,
            0,
            vector(&[("x", 0.0), ("y", 0.5)]),
        )]))
        .unwrap();

        som.train("a", vector(&[("x", 1.0)])).unwrap();

        let weights = &som.nodes()[0].weights;
        assert!(weights["x"] > 0.0);
        assert_eq!(weights["y"], 0.5);
        assert!(weights.values().all(|w| w.is_finite()));
    }

    #[test]
    fn test_nodes_after_bmu_see_the_moved_bmu() {
        // r0 = 12.63 gives radius ~9.80 at iteration 1 of 10: node 1 is outside
        // the radius of the old BMU weights (10) but inside it once the BMU moved
        let mut som = line_som(&[0.0, 10.0], 10, Some(12.63));
        let radius = som.radius(1);
        let learning_rate = som.learning_rate(1);

        som.train("a", vector(&[("f", 4.0)])).unwrap();

        let moved_bmu = 4.0 * learning_rate;
        assert!((som.nodes()[0].weights["f"] - moved_bmu).abs() < 1e-12);
        assert!(10.0 > radius);

        let dist = 10.0 - moved_bmu;
        assert!(dist < radius);
        let expected = 10.0 + neighborhood_influence(dist, radius) * learning_rate * (4.0 - 10.0);
        assert!((som.nodes()[1].weights["f"] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_update_uses_bmu_snapshot() {
        let mut som = line_som(&[0.0, 10.0], 10, Some(12.63));
        som.parallel = true;

        som.train("a", vector(&[("f", 4.0)])).unwrap();

        assert!(som.nodes()[0].weights["f"] > 0.0);
        assert_eq!(som.nodes()[1].weights["f"], 10.0);
    }

    #[test]
    fn test_parallel_update_matches_sequential_when_bmu_is_last() {
        let mut sequential = line_som(&[0.0, 0.5, 1.0], 10, Some(3.0));
        let mut parallel = sequential.clone();
        parallel.parallel = true;

        let sample = vector(&[("f", 1.2)]);
        sequential.train("a", sample.clone()).unwrap();
        parallel.train("a", sample).unwrap();

        assert_eq!(sequential.trained_position("a"), Some(2));
        assert_eq!(sequential.nodes(), parallel.nodes());
    }

    #[test]
    fn test_parallel_training_is_deterministic() {
        let config = SomConfig {
            width: 6,
            height: 6,
            seed: Some(7),
            parallel: true,
            ..SomConfig::with_iterations(30)
        };
        let mut first = Som::new(&config).unwrap();
        first.init(InitConfig::with_features(["a", "b"])).unwrap();
        let mut second = first.clone();

        for i in 0..30 {
            let t = i as f64 / 30.0;
            let sample = vector(&[("a", t), ("b", 1.0 - t)]);
            first.train(format!("s{i}"), sample.clone()).unwrap();
            second.train(format!("s{i}"), sample).unwrap();
        }

        assert_eq!(first.nodes(), second.nodes());
    }

    #[test]
    fn test_update_distance_argument_order() {
        // Only the first argument's "side" counts, and only the candidate node carries it
        let asymmetric = FnDistance(|a: &FeatureVector, b: &FeatureVector| {
            (a["f"] - b["f"]).abs() + a.get("side").copied().unwrap_or(0.0)
        });
        let config = SomConfig {
            width: 2,
            height: 1,
            initial_radius: Some(4.0),
            ..SomConfig::with_iterations(10)
        };
        let mut som = Som::new(&config).unwrap().with_distance(asymmetric);
        som.init(InitConfig::with_nodes(vec![
            Node::new_with_weights(0, 0, 0, vector(&[("f", 0.0), ("side", 0.0)])),
            Node::new_with_weights(0, 1, 1, vector(&[("f", 1.0), ("side", 100.0)])),
        ]))
        .unwrap();

        som.train("a", vector(&[("f", 0.0)])).unwrap();

        // distance(bmu, node 1) = 1 is inside the radius; the swapped order would give 101
        assert_eq!(som.trained_position("a"), Some(0));
        assert!(som.nodes()[1].weights["f"] < 1.0);
        assert_eq!(som.nodes()[1].weights["side"], 100.0);
    }
}
