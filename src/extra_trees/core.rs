use crate::criterion::Criterion;
use crate::error::Error;
use crate::extra_tree::{seeded_rng, ExtraTreeOptions};
use crate::features::FeatureVector;
use crate::leaf::Leaf;
use crate::predictor::Predictor;
use crate::tree::{self, TreeOptions};
use crate::view::{DataAccess, DataView};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::io::{Read, Write};
use std::num::NonZeroUsize;

#[derive(Debug, Clone)]
pub struct ExtraTreesOptions {
    pub(crate) tree: ExtraTreeOptions,
    trees: NonZeroUsize,
    bootstrap: bool,
    max_samples: Option<NonZeroUsize>,
    parallel: bool,
}

impl ExtraTreesOptions {
    pub fn trees(&mut self, trees: NonZeroUsize) -> &mut Self {
        self.trees = trees;
        self
    }

    pub fn bootstrap(&mut self) -> &mut Self {
        self.bootstrap = true;
        self
    }

    pub fn max_samples(&mut self, max: NonZeroUsize) -> &mut Self {
        self.max_samples = Some(max);
        self
    }

    pub fn parallel(&mut self) -> &mut Self {
        self.parallel = true;
        self
    }

    pub fn fit<V, C, R, A>(
        &self,
        criterion: C,
        is_classification: bool,
        view: DataView<R, A>,
    ) -> Result<ExtraTrees<V>, Error>
    where
        V: Leaf + Send + Sync,
        V::Output: PartialEq,
        C: Criterion<V::Output>,
        R: Sync,
        A: DataAccess<R, Output = V::Output> + Clone + Sync,
    {
        let dimension = view.dimension().ok_or(Error::EmptyDataset)?;
        let tree_options = self.tree.tree_options(dimension, is_classification);
        let forest: Vec<Predictor<V>> = if self.parallel {
            self.tree_rngs()
                .collect::<Vec<_>>()
                .into_par_iter()
                .map(|mut rng| self.tree_fit(&mut rng, &criterion, &tree_options, &view))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            self.tree_rngs()
                .map(|mut rng| self.tree_fit(&mut rng, &criterion, &tree_options, &view))
                .collect::<Result<Vec<_>, _>>()?
        };
        log::debug!(
            "built a forest of {} trees ({} nodes in total) from {} records",
            forest.len(),
            forest.iter().map(Predictor::node_count).sum::<usize>(),
            view.len()
        );
        Ok(ExtraTrees { forest })
    }

    fn tree_fit<G, V, C, R, A>(
        &self,
        rng: &mut G,
        criterion: &C,
        tree_options: &TreeOptions,
        view: &DataView<R, A>,
    ) -> Result<Predictor<V>, Error>
    where
        G: Rng + ?Sized,
        V: Leaf,
        V::Output: PartialEq,
        C: Criterion<V::Output>,
        A: DataAccess<R, Output = V::Output> + Clone,
    {
        let mut view = if self.bootstrap {
            let max_samples = self.max_samples.map_or(view.len(), |n| n.get());
            view.bootstrap_sample(rng, max_samples)
        } else {
            view.clone()
        };
        tree::build_tree(&mut view, criterion, tree_options, rng).map(Predictor::from)
    }

    fn tree_rngs(&self) -> impl Iterator<Item = StdRng> {
        let mut rng = seeded_rng(self.tree.seed_value());
        (0..self.trees.get()).map(move |_| {
            let mut seed = [0u8; 32];
            rng.fill(&mut seed);
            StdRng::from_seed(seed)
        })
    }
}

impl Default for ExtraTreesOptions {
    fn default() -> Self {
        Self {
            tree: ExtraTreeOptions::default(),
            trees: NonZeroUsize::new(100).expect("unreachable"),
            bootstrap: false,
            max_samples: None,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtraTrees<V> {
    forest: Vec<Predictor<V>>,
}

impl<V: Leaf> ExtraTrees<V> {
    pub fn trees(&self) -> &[Predictor<V>] {
        &self.forest
    }

    pub fn leaves<'a, X: FeatureVector + ?Sized>(
        &'a self,
        xs: &'a X,
    ) -> impl 'a + Iterator<Item = &'a V> {
        self.forest.iter().map(move |tree| tree.leaf(xs))
    }

    pub fn serialize<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writer.write_u32::<BigEndian>(self.forest.len() as u32)?;
        for tree in &self.forest {
            tree.root().serialize(&mut writer)?;
        }
        Ok(())
    }

    pub fn deserialize<R: Read>(mut reader: R) -> Result<Self, Error> {
        let forest_len = reader.read_u32::<BigEndian>().map_err(Error::from_read)?;
        if forest_len == 0 {
            return Err(Error::SerializationFormat("forest without trees".to_owned()));
        }
        let forest = (0..forest_len)
            .map(|_| Predictor::deserialize(&mut reader))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { forest })
    }
}
