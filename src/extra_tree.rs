use crate::criterion::{ClassificationCriterion, RegressionCriterion};
use crate::error::Error;
use crate::leaf::{ClassificationLeaf, Label, RegressionLeaf};
use crate::predictor::Predictor;
use crate::tree::{self, TreeOptions};
use crate::view::{ColumnType, DataAccess, DataView};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::num::NonZeroUsize;

/// Extremely randomized tree classifier.
pub type ExtraTreeClassifier<L> = Predictor<ClassificationLeaf<L>>;

/// Extremely randomized tree regressor.
pub type ExtraTreeRegressor = Predictor<RegressionLeaf>;

/// Extremely randomized tree options.
#[derive(Debug, Clone, Default)]
pub struct ExtraTreeOptions {
    tree: TreeOptions,
    k: Option<NonZeroUsize>,
    seed: Option<u64>,
}

impl ExtraTreeOptions {
    /// Makes an `ExtraTreeOptions` instance with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the random generator seed.
    ///
    /// The default value is random.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the subset size at or below which a node becomes a leaf.
    ///
    /// The default value is `1`.
    pub fn nmin(&mut self, nmin: usize) -> &mut Self {
        self.tree.nmin = nmin;
        self
    }

    /// Sets the number of random candidate splits drawn at each node.
    ///
    /// The default value is `sqrt(the number of features)` for classification and
    /// `the number of features` for regression.
    pub fn k(&mut self, k: NonZeroUsize) -> &mut Self {
        self.k = Some(k);
        self
    }

    /// Sets the maximum depth of the tree.
    ///
    /// The default value is unlimited.
    pub fn max_depth(&mut self, depth: NonZeroUsize) -> &mut Self {
        self.tree.max_depth = Some(depth);
        self
    }

    /// Sets the split score at or below which a node becomes a leaf.
    ///
    /// The default value is `0.0`.
    pub fn min_score(&mut self, score: f64) -> &mut Self {
        self.tree.min_score = score;
        self
    }

    /// Sets how each feature dimension is tested.
    ///
    /// The default is to treat every feature as numerical.
    pub fn column_types(&mut self, column_types: &[ColumnType]) -> &mut Self {
        self.tree.column_types = Some(column_types.to_owned());
        self
    }

    /// Builds a classifier fitting the records of the given view.
    pub fn fit_classifier<L, C, R, A>(
        &self,
        criterion: C,
        mut view: DataView<R, A>,
    ) -> Result<ExtraTreeClassifier<L>, Error>
    where
        L: Label,
        C: ClassificationCriterion<L>,
        A: DataAccess<R, Output = L>,
    {
        let options = self.tree_options(view.dimension().unwrap_or(0), true);
        let mut rng = seeded_rng(self.seed);
        tree::build_tree::<ClassificationLeaf<L>, _, _, _, _>(
            &mut view, &criterion, &options, &mut rng,
        )
        .map(Predictor::from)
    }

    /// Builds a regressor fitting the records of the given view.
    pub fn fit_regressor<C, R, A>(
        &self,
        criterion: C,
        mut view: DataView<R, A>,
    ) -> Result<ExtraTreeRegressor, Error>
    where
        C: RegressionCriterion,
        A: DataAccess<R, Output = f64>,
    {
        let options = self.tree_options(view.dimension().unwrap_or(0), false);
        let mut rng = seeded_rng(self.seed);
        tree::build_tree::<RegressionLeaf, _, _, _, _>(&mut view, &criterion, &options, &mut rng)
            .map(Predictor::from)
    }

    pub(crate) fn seed_value(&self) -> Option<u64> {
        self.seed
    }

    pub(crate) fn tree_options(&self, dimension: usize, is_classification: bool) -> TreeOptions {
        let k = self.k.map_or_else(
            || {
                let k = if is_classification {
                    (dimension as f64).sqrt().ceil() as usize
                } else {
                    dimension
                };
                NonZeroUsize::new(k.max(1)).expect("unreachable")
            },
            |k| k,
        );
        TreeOptions {
            k,
            ..self.tree.clone()
        }
    }
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    let seed_u64 = seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut seed = [0u8; 32];
    (&mut seed[0..8]).copy_from_slice(&seed_u64.to_be_bytes()[..]);
    StdRng::from_seed(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::{Entropy, Gini, Variance};
    use crate::error::Error;

    type Sample = ([f64; 2], u8);

    fn samples() -> Vec<Sample> {
        (0..200)
            .map(|i| {
                let x0 = ((i * 37) % 200) as f64 / 20.0 - 5.0;
                let x1 = ((i * 91) % 200) as f64 / 20.0 - 5.0;
                let class = if x0 * x1 > 0.0 { 1 } else { 0 };
                ([x0, x1], class)
            })
            .collect()
    }

    #[test]
    fn classification_works() -> Result<(), anyhow::Error> {
        let samples = samples();
        let view = DataView::new(&samples, |s: &Sample| &s.0, |s| s.1);
        let classifier = ExtraTreeOptions::new()
            .seed(0)
            .fit_classifier(Entropy, view)?;
        let correct = samples
            .iter()
            .filter(|(x, class)| classifier.predict(x) == *class)
            .count();
        assert!(correct >= 180);
        Ok(())
    }

    #[test]
    fn unrestricted_splits_fit_the_training_set() -> Result<(), anyhow::Error> {
        let samples = samples();
        let view = DataView::new(&samples, |s: &Sample| &s.0, |s| s.1);
        let classifier = ExtraTreeOptions::new()
            .seed(3)
            .min_score(-1.0)
            .fit_classifier(Gini, view)?;
        for (x, class) in &samples {
            assert_eq!(classifier.predict(x), *class);
            assert_eq!(classifier.try_predict(x)?, *class);
            assert_eq!(classifier.predict_confidence(x), 1.0);
        }

        let view = DataView::new(&samples, |s: &Sample| &s.0, |s| s.1);
        let classifier = ExtraTreeOptions::new()
            .seed(3)
            .min_score(-1.0)
            .fit_classifier(Entropy, view)?;
        for (x, class) in &samples {
            assert_eq!(classifier.predict(x), *class);
        }
        Ok(())
    }

    #[test]
    fn classifier_round_trip_works() -> Result<(), anyhow::Error> {
        let samples = samples();
        let view = DataView::new(&samples, |s: &Sample| &s.0, |s| s.1);
        let classifier = ExtraTreeOptions::new()
            .seed(1)
            .nmin(5)
            .fit_classifier(Entropy, view)?;

        let mut bytes = Vec::new();
        classifier.serialize(&mut bytes)?;
        let decoded = ExtraTreeClassifier::<u8>::deserialize(&mut &bytes[..])?;
        assert_eq!(decoded.root(), classifier.root());
        for (x, _) in &samples {
            assert_eq!(decoded.predict(x), classifier.predict(x));
            assert_eq!(
                decoded.predict_frequencies(x),
                classifier.predict_frequencies(x)
            );
        }

        assert!(matches!(
            ExtraTreeRegressor::deserialize(&mut &bytes[..]),
            Err(Error::SerializationFormat(_))
        ));
        assert!(matches!(
            ExtraTreeClassifier::<u8>::deserialize(&mut &b"X"[..]),
            Err(Error::SerializationFormat(_))
        ));
        assert!(matches!(
            ExtraTreeClassifier::<u8>::deserialize(&mut &b""[..]),
            Err(Error::SerializationFormat(_))
        ));
        Ok(())
    }

    #[test]
    fn regression_works() -> Result<(), anyhow::Error> {
        let samples = (0..4).map(|i| ([i as f64], i as f64)).collect::<Vec<_>>();
        let view = DataView::new(&samples, |s: &([f64; 1], f64)| &s.0, |s| s.1);
        let regressor = ExtraTreeOptions::new()
            .seed(0)
            .k(NonZeroUsize::new(32).expect("unreachable"))
            .fit_regressor(Variance, view)?;
        for (x, y) in &samples {
            assert_eq!(regressor.predict(x), *y);
        }

        let shared = regressor.clone();
        let handle = std::thread::spawn(move || shared.predict(&[2.0]));
        assert_eq!(handle.join().expect("prediction thread panicked"), 2.0);

        let mut bytes = Vec::new();
        regressor.serialize(&mut bytes)?;
        let decoded = ExtraTreeRegressor::deserialize(&mut &bytes[..])?;
        for (x, _) in &samples {
            assert_eq!(decoded.predict(x), regressor.predict(x));
        }
        Ok(())
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let samples: Vec<([f64; 1], f64)> = Vec::new();
        let view = DataView::new(&samples, |s: &([f64; 1], f64)| &s.0, |s| s.1);
        assert!(matches!(
            ExtraTreeOptions::new().fit_regressor(Variance, view),
            Err(Error::EmptyDataset)
        ));
    }

    #[test]
    fn default_k_depends_on_task() {
        let options = ExtraTreeOptions::new();
        assert_eq!(options.tree_options(10, true).k.get(), 4);
        assert_eq!(options.tree_options(10, false).k.get(), 10);
        assert_eq!(options.tree_options(0, true).k.get(), 1);
    }
}
