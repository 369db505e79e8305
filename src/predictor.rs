use crate::error::Error;
use crate::features::FeatureVector;
use crate::leaf::{ClassificationLeaf, Label, Leaf};
use crate::tree::Node;
use std::io::{Read, Write};
use std::sync::Arc;

/// Shared handle on a built tree.
///
/// Clones share the same immutable tree, so a predictor can be handed to many threads.
#[derive(Debug)]
pub struct Predictor<V> {
    root: Arc<Node<V>>,
}

impl<V> Clone for Predictor<V> {
    fn clone(&self) -> Self {
        Self {
            root: Arc::clone(&self.root),
        }
    }
}

impl<V> From<Node<V>> for Predictor<V> {
    fn from(root: Node<V>) -> Self {
        Self {
            root: Arc::new(root),
        }
    }
}

impl<V: Leaf> Predictor<V> {
    pub fn root(&self) -> &Node<V> {
        &self.root
    }

    /// Predicts the output for the given features.
    ///
    /// `features` must have at least as many dimensions as the training inputs.
    pub fn predict<X: FeatureVector + ?Sized>(&self, features: &X) -> V::Prediction {
        self.root.leaf(features).prediction()
    }

    /// Returns the leaf reached by the given features.
    pub fn leaf<X: FeatureVector + ?Sized>(&self, features: &X) -> &V {
        self.root.leaf(features)
    }

    /// Like [`predict`](Self::predict), but fails instead of panicking on too short inputs.
    pub fn try_predict<X: FeatureVector + ?Sized>(
        &self,
        features: &X,
    ) -> Result<V::Prediction, Error> {
        self.root.try_leaf(features).map(V::prediction)
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Writes the tree to the given byte stream.
    pub fn serialize<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        self.root.serialize(&mut writer)
    }

    /// Reads a tree from the given byte stream.
    pub fn deserialize<R: Read>(mut reader: R) -> Result<Self, Error> {
        Node::deserialize(&mut reader).map(Self::from)
    }
}

impl<L: Label> Predictor<ClassificationLeaf<L>> {
    /// `(label, relative frequency)` pairs of the leaf reached by the given features.
    pub fn predict_frequencies<X: FeatureVector + ?Sized>(&self, features: &X) -> &[(L, f64)] {
        self.leaf(features).frequencies()
    }

    /// Relative frequency of the predicted label in its leaf.
    pub fn predict_confidence<X: FeatureVector + ?Sized>(&self, features: &X) -> f64 {
        self.leaf(features).confidence()
    }
}
