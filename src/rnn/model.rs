//! Recursive crack-growth model over a whole fleet batch.
//!
//! Wraps a [`CumulativeDamageCell`] with the batch shape it was built for and
//! the per-unit initial crack lengths, and unrolls the recursion over every
//! cycle of every unit. The batch shape is fixed at construction, so a batch
//! of a different size is rejected instead of silently broadcast.

use ndarray::{Array2, ArrayView1};

use crate::fleet::StressBatch;
use crate::rnn::cell::{AnalyticalStressIntensity, CumulativeDamageCell, StressIntensity};
use crate::rnn::mlp::DenseRegressor;
use crate::rnn::{CrackGrowthModel, CrackPrediction, ModelError};
use crate::types::BatchShape;

/// Hybrid model: learned ΔK inside the Paris recursion.
pub type HybridModel = CumulativeDamageModel<DenseRegressor>;

/// Physics-only model: closed-form ΔK inside the Paris recursion.
pub type PhysicsModel = CumulativeDamageModel<AnalyticalStressIntensity>;

/// Paris-law recursion unrolled over a fixed-shape fleet batch.
#[derive(Debug, Clone)]
pub struct CumulativeDamageModel<K> {
    cell: CumulativeDamageCell<K>,
    batch_shape: BatchShape,
    /// Initial crack length per unit, `(units, 1)`.
    initial_crack: Array2<f64>,
    return_sequences: bool,
}

impl<K: StressIntensity> CumulativeDamageModel<K> {
    /// Assemble a model, checking the initial condition against the batch.
    pub fn new(
        cell: CumulativeDamageCell<K>,
        batch_shape: BatchShape,
        initial_crack: Array2<f64>,
        return_sequences: bool,
    ) -> Result<Self, ModelError> {
        if batch_shape.features != 1 {
            return Err(ModelError::ShapeMismatch {
                expected: BatchShape::new(batch_shape.units, batch_shape.cycles),
                found: batch_shape,
            });
        }
        if initial_crack.dim() != (batch_shape.units, 1) {
            return Err(ModelError::InitialCondition {
                units: batch_shape.units,
                found: initial_crack.dim(),
            });
        }
        if initial_crack.iter().any(|a| !a.is_finite() || *a <= 0.0) {
            return Err(ModelError::InvalidInitialCrack);
        }

        let precision = cell.precision();
        Ok(Self {
            cell,
            batch_shape,
            initial_crack: initial_crack.mapv(|a| precision.quantize(a)),
            return_sequences,
        })
    }

    pub fn cell(&self) -> &CumulativeDamageCell<K> {
        &self.cell
    }

    pub fn cell_mut(&mut self) -> &mut CumulativeDamageCell<K> {
        &mut self.cell
    }

    pub fn initial_crack(&self) -> &Array2<f64> {
        &self.initial_crack
    }

    /// Unroll one unit: crack length after each cycle.
    fn run_unit(&self, stress: ArrayView1<'_, f64>, a0: f64, out: &mut [f64]) {
        let mut a = a0;
        if self.return_sequences {
            for (slot, &s) in out.iter_mut().zip(stress.iter()) {
                a = self.cell.step(s, a);
                *slot = a;
            }
        } else {
            for &s in stress {
                a = self.cell.step(s, a);
            }
            if let Some(last) = out.first_mut() {
                *last = a;
            }
        }
    }
}

impl<K: StressIntensity> CrackGrowthModel for CumulativeDamageModel<K> {
    fn batch_shape(&self) -> BatchShape {
        self.batch_shape
    }

    fn predict_on_batch(&self, batch: &StressBatch) -> Result<CrackPrediction, ModelError> {
        let shape = batch.shape();
        if shape != self.batch_shape {
            return Err(ModelError::ShapeMismatch {
                expected: self.batch_shape,
                found: shape,
            });
        }

        let steps = if self.return_sequences { shape.cycles } else { 1 };
        let mut lengths = Array2::<f64>::zeros((shape.units, steps));

        for (unit, mut row) in lengths.rows_mut().into_iter().enumerate() {
            let a0 = self.initial_crack[[unit, 0]];
            let stress = batch.unit_series(unit);
            match row.as_slice_mut() {
                Some(out) => self.run_unit(stress, a0, out),
                None => {
                    let mut buf = vec![0.0; steps];
                    self.run_unit(stress, a0, &mut buf);
                    row.assign(&ArrayView1::from(&buf));
                }
            }
        }

        tracing::debug!(
            units = shape.units,
            cycles = shape.cycles,
            return_sequences = self.return_sequences,
            "Batch forward pass complete"
        );
        Ok(CrackPrediction::new(lengths))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::initial_crack_column;
    use crate::rnn::mlp::tests::linear_regressor;
    use crate::types::Precision;

    fn physics_model(units: usize, cycles: usize, return_sequences: bool) -> PhysicsModel {
        let cell = CumulativeDamageCell::new(
            AnalyticalStressIntensity { geometry_factor: 1.0 },
            1.5e-11,
            3.8,
            Precision::F64,
        );
        CumulativeDamageModel::new(
            cell,
            BatchShape::new(units, cycles),
            initial_crack_column(units, 0.005, Precision::F64),
            return_sequences,
        )
        .expect("model")
    }

    fn constant_batch(units: usize, cycles: usize, stress: f64) -> StressBatch {
        StressBatch::from_unit_major(&Array2::from_elem((units, cycles), stress))
    }

    #[test]
    fn test_output_shape_with_sequences() {
        let model = physics_model(4, 25, true);
        let pred = model.predict_on_batch(&constant_batch(4, 25, 90.0)).expect("predict");
        assert_eq!(pred.dim(), (4, 25));
        assert_eq!(pred.final_cycle().len(), 4);
    }

    #[test]
    fn test_output_shape_last_only() {
        let seq = physics_model(3, 40, true);
        let last = physics_model(3, 40, false);
        let batch = constant_batch(3, 40, 110.0);
        let p_seq = seq.predict_on_batch(&batch).expect("predict");
        let p_last = last.predict_on_batch(&batch).expect("predict");
        assert_eq!(p_last.dim(), (3, 1));
        assert_eq!(p_seq.final_cycle(), p_last.final_cycle());
    }

    #[test]
    fn test_monotonic_growth() {
        let model = physics_model(2, 100, true);
        let pred = model.predict_on_batch(&constant_batch(2, 100, 120.0)).expect("predict");
        for row in pred.lengths().rows() {
            assert!(row[0] > 0.005);
            for w in row.to_vec().windows(2) {
                assert!(w[1] >= w[0]);
            }
        }
    }

    #[test]
    fn test_units_are_independent() {
        let model = physics_model(2, 50, true);
        let mut stress = Array2::from_elem((2, 50), 80.0);
        stress.row_mut(1).fill(140.0);
        let pred = model
            .predict_on_batch(&StressBatch::from_unit_major(&stress))
            .expect("predict");
        let finals = pred.final_cycle();
        assert!(finals[1] > finals[0]);

        // Unit 0 alone gives the same trajectory
        let single = physics_model(1, 50, true);
        let alone = single.predict_on_batch(&constant_batch(1, 50, 80.0)).expect("predict");
        assert_eq!(alone.final_cycle()[0], finals[0]);
    }

    #[test]
    fn test_batch_shape_mismatch() {
        let model = physics_model(3, 10, true);
        let err = model.predict_on_batch(&constant_batch(4, 10, 90.0)).expect_err("mismatch");
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_initial_condition_length_checked() {
        let cell = CumulativeDamageCell::new(
            AnalyticalStressIntensity { geometry_factor: 1.0 },
            1.5e-11,
            3.8,
            Precision::F64,
        );
        let result = CumulativeDamageModel::new(
            cell,
            BatchShape::new(5, 10),
            initial_crack_column(4, 0.005, Precision::F64),
            true,
        );
        assert!(matches!(
            result,
            Err(ModelError::InitialCondition { units: 5, found: (4, 1) })
        ));
    }

    #[test]
    fn test_hybrid_with_linear_regressor_matches_manual_unroll() {
        // ΔK = 0.1 S + 0 a + 2
        let regressor = linear_regressor(0.1, 0.0, 2.0);
        let cell = CumulativeDamageCell::new(regressor, 1e-10, 3.0, Precision::F64);
        let model: HybridModel = CumulativeDamageModel::new(
            cell,
            BatchShape::new(1, 3),
            initial_crack_column(1, 0.01, Precision::F64),
            true,
        )
        .expect("model");

        let stress = Array2::from_shape_vec((1, 3), vec![80.0, 100.0, 60.0]).expect("shape");
        let pred = model
            .predict_on_batch(&StressBatch::from_unit_major(&stress))
            .expect("predict");

        let mut a = 0.01;
        let mut expected = Vec::new();
        for s in [80.0, 100.0, 60.0] {
            let dk: f64 = 0.1 * s + 2.0;
            a += 1e-10 * dk.powf(3.0);
            expected.push(a);
        }
        for (got, want) in pred.lengths().row(0).iter().zip(&expected) {
            assert!((got - want).abs() < 1e-15, "{got} vs {want}");
        }
    }
}
