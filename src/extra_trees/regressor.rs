use super::core::{ExtraTrees, ExtraTreesOptions};
use crate::criterion::RegressionCriterion;
use crate::error::Error;
use crate::features::FeatureVector;
use crate::functions;
use crate::leaf::RegressionLeaf;
use crate::view::{ColumnType, DataAccess, DataView};
use std::io::{Read, Write};
use std::num::NonZeroUsize;

/// Extra-trees regressor options.
#[derive(Debug, Clone, Default)]
pub struct ExtraTreesRegressorOptions {
    inner: ExtraTreesOptions,
}

impl ExtraTreesRegressorOptions {
    /// Makes an `ExtraTreesRegressorOptions` instance with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the random generator seed.
    ///
    /// The default value is random.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.inner.tree.seed(seed);
        self
    }

    /// Sets the number of trees.
    ///
    /// The default value is `100`.
    pub fn trees(&mut self, trees: NonZeroUsize) -> &mut Self {
        self.inner.trees(trees);
        self
    }

    /// Sets the subset size at or below which a node becomes a leaf.
    ///
    /// The default value is `1`.
    pub fn nmin(&mut self, nmin: usize) -> &mut Self {
        self.inner.tree.nmin(nmin);
        self
    }

    /// Sets the number of random candidate splits drawn at each node.
    ///
    /// The default value is `the number of features`.
    pub fn k(&mut self, k: NonZeroUsize) -> &mut Self {
        self.inner.tree.k(k);
        self
    }

    /// Sets the maximum depth of each tree.
    pub fn max_depth(&mut self, depth: NonZeroUsize) -> &mut Self {
        self.inner.tree.max_depth(depth);
        self
    }

    /// Sets the split score at or below which a node becomes a leaf.
    pub fn min_score(&mut self, score: f64) -> &mut Self {
        self.inner.tree.min_score(score);
        self
    }

    pub fn column_types(&mut self, column_types: &[ColumnType]) -> &mut Self {
        self.inner.tree.column_types(column_types);
        self
    }

    /// Trains each tree on a bootstrap sample instead of the whole view.
    pub fn bootstrap(&mut self) -> &mut Self {
        self.inner.bootstrap();
        self
    }

    pub fn max_samples(&mut self, max: NonZeroUsize) -> &mut Self {
        self.inner.max_samples(max);
        self
    }

    /// Enables parallel executions of `ExtraTreesRegressorOptions::fit`.
    ///
    /// This library use `rayon` for parallel execution.
    /// Please see [the rayon document](https://docs.rs/rayon) if you want to configure the behavior
    /// (e.g., the number of worker threads).
    pub fn parallel(&mut self) -> &mut Self {
        self.inner.parallel();
        self
    }

    /// Builds a regressor model fitting the given view.
    pub fn fit<C, R, A>(&self, criterion: C, view: DataView<R, A>) -> Result<ExtraTreesRegressor, Error>
    where
        C: RegressionCriterion,
        R: Sync,
        A: DataAccess<R, Output = f64> + Clone + Sync,
    {
        Ok(ExtraTreesRegressor {
            inner: self.inner.fit(criterion, false, view)?,
        })
    }
}

/// Extra-trees regressor.
#[derive(Debug, Clone)]
pub struct ExtraTreesRegressor {
    inner: ExtraTrees<RegressionLeaf>,
}

impl ExtraTreesRegressor {
    /// Predicts the target value as the mean of the values predicted by each tree.
    pub fn predict<X: FeatureVector + ?Sized>(&self, features: &X) -> f64 {
        functions::mean(self.predict_individuals(features))
    }

    /// Returns an iterator that iterates over a target value predicted by each tree.
    pub fn predict_individuals<'a, X: FeatureVector + ?Sized>(
        &'a self,
        features: &'a X,
    ) -> impl 'a + Iterator<Item = f64> {
        self.inner.leaves(features).map(RegressionLeaf::value)
    }

    /// Writes this regressor to the given byte stream.
    pub fn serialize<W: Write>(&self, writer: W) -> std::io::Result<()> {
        self.inner.serialize(writer)
    }

    /// Reads a regressor from the given byte stream.
    pub fn deserialize<R: Read>(reader: R) -> Result<Self, Error> {
        let inner = ExtraTrees::deserialize(reader)?;
        Ok(Self { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::Variance;

    type Sample = (Vec<f64>, f64);

    #[test]
    fn regression_works() -> Result<(), anyhow::Error> {
        let features = [
            [0.0, 2.0, 1.0, 0.0],
            [0.0, 2.0, 1.0, 1.0],
            [1.0, 2.0, 1.0, 0.0],
            [2.0, 1.0, 1.0, 0.0],
            [2.0, 0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0, 1.0],
            [0.0, 1.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
            [2.0, 1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0, 1.0],
            [1.0, 2.0, 0.0, 0.0],
            [2.0, 1.0, 1.0, 1.0],
        ];
        let target = [
            25.0, 30.0, 46.0, 45.0, 52.0, 23.0, 43.0, 35.0, 38.0, 46.0, 48.0, 52.0, 44.0, 30.0,
        ];
        let train_len = target.len() - 2;
        let samples = features
            .iter()
            .zip(target.iter())
            .take(train_len)
            .map(|(x, y)| (x.to_vec(), *y))
            .collect::<Vec<Sample>>();
        let view = || DataView::new(&samples, |s: &Sample| &s.0, |s| s.1);

        let regressor = ExtraTreesRegressorOptions::new()
            .seed(0)
            .fit(Variance, view())?;
        let prediction = regressor.predict(&features[train_len]);
        assert!(prediction >= 23.0 && prediction <= 52.0);
        for (x, _) in &samples {
            let y = regressor.predict(x);
            assert!(y >= 23.0 && y <= 52.0);
        }

        let regressor_parallel = ExtraTreesRegressorOptions::new()
            .seed(0)
            .parallel()
            .fit(Variance, view())?;
        assert_eq!(
            regressor.predict(&features[train_len]),
            regressor_parallel.predict(&features[train_len])
        );
        assert_eq!(
            regressor.predict(&features[train_len + 1]),
            regressor_parallel.predict(&features[train_len + 1])
        );

        let mut bytes = Vec::new();
        regressor.serialize(&mut bytes)?;
        let regressor_deserialized = ExtraTreesRegressor::deserialize(&mut &bytes[..])?;
        assert_eq!(
            regressor.predict(&features[train_len]),
            regressor_deserialized.predict(&features[train_len])
        );

        Ok(())
    }

    #[test]
    fn bootstrap_averages_shallow_trees() -> Result<(), anyhow::Error> {
        let samples = (0..50)
            .map(|i| (vec![i as f64], if i < 25 { 1.0 } else { 3.0 }))
            .collect::<Vec<Sample>>();
        let view = DataView::new(&samples, |s: &Sample| &s.0, |s| s.1);
        let regressor = ExtraTreesRegressorOptions::new()
            .seed(7)
            .trees(NonZeroUsize::new(10).expect("unreachable"))
            .bootstrap()
            .max_samples(NonZeroUsize::new(20).expect("unreachable"))
            .max_depth(NonZeroUsize::new(1).expect("unreachable"))
            .fit(Variance, view)?;
        assert_eq!(regressor.predict_individuals(&[0.0]).count(), 10);
        for (x, _) in &samples {
            let y = regressor.predict(x);
            assert!(y >= 1.0 && y <= 3.0);
        }
        Ok(())
    }

    #[test]
    fn empty_forest_is_rejected() {
        assert!(matches!(
            ExtraTreesRegressor::deserialize(&mut &[0u8, 0, 0, 0][..]),
            Err(Error::SerializationFormat(_))
        ));
    }
}
