use super::core::{ExtraTrees, ExtraTreesOptions};
use crate::criterion::ClassificationCriterion;
use crate::error::Error;
use crate::features::FeatureVector;
use crate::functions;
use crate::leaf::{ClassificationLeaf, Label};
use crate::view::{ColumnType, DataAccess, DataView};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::num::NonZeroUsize;

/// Extra-trees classifier options.
#[derive(Debug, Clone, Default)]
pub struct ExtraTreesClassifierOptions {
    inner: ExtraTreesOptions,
}

impl ExtraTreesClassifierOptions {
    /// Makes an `ExtraTreesClassifierOptions` instance with the default settings.
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
    /// The default value is `sqrt(the number of features)`.
    pub fn k(&mut self, k: NonZeroUsize) -> &mut Self {
        self.inner.tree.k(k);
        self
    }

    /// Sets the maximum depth of each tree.
    ///
    /// The default value is unlimited.
    pub fn max_depth(&mut self, depth: NonZeroUsize) -> &mut Self {
        self.inner.tree.max_depth(depth);
        self
    }

    /// Sets the split score at or below which a node becomes a leaf.
    ///
    /// The default value is `0.0`.
    pub fn min_score(&mut self, score: f64) -> &mut Self {
        self.inner.tree.min_score(score);
        self
    }

    /// Sets how each feature dimension is tested.
    pub fn column_types(&mut self, column_types: &[ColumnType]) -> &mut Self {
        self.inner.tree.column_types(column_types);
        self
    }

    /// Trains each tree on a bootstrap sample instead of the whole view.
    pub fn bootstrap(&mut self) -> &mut Self {
        self.inner.bootstrap();
        self
    }

    /// Sets the size of each bootstrap sample.
    ///
    /// The default value is the number of records in the view.
    pub fn max_samples(&mut self, max: NonZeroUsize) -> &mut Self {
        self.inner.max_samples(max);
        self
    }

    /// Enables parallel executions of `ExtraTreesClassifierOptions::fit`.
    ///
    /// This library use `rayon` for parallel execution.
    /// Please see [the rayon document](https://docs.rs/rayon) if you want to configure the behavior
    /// (e.g., the number of worker threads).
    pub fn parallel(&mut self) -> &mut Self {
        self.inner.parallel();
        self
    }

    /// Builds a classifier model fitting the given view.
    pub fn fit<L, C, R, A>(
        &self,
        criterion: C,
        view: DataView<R, A>,
    ) -> Result<ExtraTreesClassifier<L>, Error>
    where
        L: Label,
        C: ClassificationCriterion<L>,
        R: Sync,
        A: DataAccess<R, Output = L> + Clone + Sync,
    {
        Ok(ExtraTreesClassifier {
            inner: self.inner.fit(criterion, true, view)?,
        })
    }
}

/// Extra-trees classifier.
#[derive(Debug, Clone)]
pub struct ExtraTreesClassifier<L> {
    inner: ExtraTrees<ClassificationLeaf<L>>,
}

impl<L: Label> ExtraTreesClassifier<L> {
    /// Predicts the label with the highest frequency summed over every tree.
    pub fn predict<X: FeatureVector + ?Sized>(&self, features: &X) -> L {
        let frequencies = self.cumulated_frequencies(features);
        functions::most_frequent(&frequencies)
            .cloned()
            .expect("unreachable")
    }

    /// `(label, mean relative frequency)` pairs over every tree, in ascending label order.
    pub fn predict_frequencies<X: FeatureVector + ?Sized>(&self, features: &X) -> Vec<(L, f64)> {
        let n = self.inner.trees().len() as f64;
        self.cumulated_frequencies(features)
            .into_iter()
            .map(|(label, total)| (label, total / n))
            .collect()
    }

    /// Returns an iterator that iterates over a label predicted by each tree.
    pub fn predict_individuals<'a, X: FeatureVector + ?Sized>(
        &'a self,
        features: &'a X,
    ) -> impl 'a + Iterator<Item = L> {
        self.inner.leaves(features).map(|leaf| leaf.label().clone())
    }

    fn cumulated_frequencies<X: FeatureVector + ?Sized>(&self, features: &X) -> BTreeMap<L, f64> {
        let mut frequencies = BTreeMap::<L, f64>::new();
        for leaf in self.inner.leaves(features) {
            for (label, frequency) in leaf.frequencies() {
                *frequencies.entry(label.clone()).or_default() += frequency;
            }
        }
        frequencies
    }

    /// Writes this classifier to the given byte stream.
    pub fn serialize<W: Write>(&self, writer: W) -> std::io::Result<()> {
        self.inner.serialize(writer)
    }

    /// Reads a classifier from the given byte stream.
    pub fn deserialize<R: Read>(reader: R) -> Result<Self, Error> {
        let inner = ExtraTrees::deserialize(reader)?;
        Ok(Self { inner })
    }
}
