//! Extremely randomized trees for classification and regression.
//!
//! A tree is grown top-down from a [`DataView`]: every node draws `k` random
//! candidate tests, keeps the one with the best normalized impurity reduction
//! and recurses on both sides of the split.
pub use self::criterion::{
    ClassificationCriterion, Criterion, Entropy, Gini, RegressionCriterion, Variance,
};
pub use self::error::Error;
pub use self::extra_tree::{ExtraTreeClassifier, ExtraTreeOptions, ExtraTreeRegressor};
pub use self::extra_trees::{
    ExtraTreesClassifier, ExtraTreesClassifierOptions, ExtraTreesRegressor,
    ExtraTreesRegressorOptions,
};
pub use self::features::FeatureVector;
pub use self::leaf::{ClassificationLeaf, Label, Leaf, RegressionLeaf};
pub use self::predictor::Predictor;
pub use self::tree::{build_tree, Node, Test, TreeOptions, MAX_STREAM_DEPTH};
pub use self::view::{Accessors, ColumnType, DataAccess, DataView, Split};

mod criterion;
mod error;
mod extra_tree;
mod extra_trees;
mod features;
mod functions;
mod leaf;
mod predictor;
mod tree;
mod view;
