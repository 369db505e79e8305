use crate::criterion::Criterion;
use crate::error::Error;
use crate::features::FeatureVector;
use crate::leaf::Leaf;
use crate::view::{ColumnType, DataAccess, DataView};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use ordered_float::OrderedFloat;
use rand::seq::SliceRandom as _;
use rand::Rng;
use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::num::NonZeroUsize;

const NODE_TAG: u8 = b'N';
const THRESHOLD_TAG: u8 = b'T';
const MEMBERSHIP_TAG: u8 = b'S';

/// Deepest tree accepted by [`Node::deserialize`].
pub const MAX_STREAM_DEPTH: usize = 2048;

/// Hyperparameters of a single tree induction.
#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// Subsets of at most `nmin` records become leaves.
    pub nmin: usize,
    /// Number of random candidate splits drawn at each node.
    pub k: NonZeroUsize,
    pub max_depth: Option<NonZeroUsize>,
    /// A node whose best candidate scores at most this value becomes a leaf.
    pub min_score: f64,
    /// How each feature dimension is tested. All numerical when `None`.
    pub column_types: Option<Vec<ColumnType>>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            nmin: 1,
            k: NonZeroUsize::new(1).expect("unreachable"),
            max_depth: None,
            min_score: 0.0,
            column_types: None,
        }
    }
}

/// Boolean test of an internal node.
#[derive(Debug, Clone, PartialEq)]
pub enum Test {
    /// Passes when `x[column] < threshold`.
    Threshold { column: usize, threshold: f64 },
    /// Passes when `x[column]` is one of `categories` (sorted ascending).
    Membership { column: usize, categories: Vec<f64> },
}

impl Test {
    pub fn column(&self) -> usize {
        match self {
            Self::Threshold { column, .. } | Self::Membership { column, .. } => *column,
        }
    }

    pub fn evaluate<X: FeatureVector + ?Sized>(&self, x: &X) -> bool {
        match self {
            Self::Threshold { column, threshold } => x.feature(*column) < *threshold,
            Self::Membership { column, categories } => {
                let v = OrderedFloat(x.feature(*column));
                categories
                    .binary_search_by(|c| OrderedFloat(*c).cmp(&v))
                    .is_ok()
            }
        }
    }

    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Self::Threshold { column, threshold } => {
                writer.write_u8(THRESHOLD_TAG)?;
                writer.write_u32::<BigEndian>(*column as u32)?;
                writer.write_f64::<BigEndian>(*threshold)?;
            }
            Self::Membership { column, categories } => {
                writer.write_u8(MEMBERSHIP_TAG)?;
                writer.write_u32::<BigEndian>(*column as u32)?;
                writer.write_u32::<BigEndian>(categories.len() as u32)?;
                for &c in categories {
                    writer.write_f64::<BigEndian>(c)?;
                }
            }
        }
        Ok(())
    }

    fn deserialize<R: Read>(reader: &mut R) -> Result<Self, Error> {
        match reader.read_u8().map_err(Error::from_read)? {
            THRESHOLD_TAG => {
                let column = Self::read_column(reader)?;
                let threshold = reader.read_f64::<BigEndian>().map_err(Error::from_read)?;
                Ok(Self::Threshold { column, threshold })
            }
            MEMBERSHIP_TAG => {
                let column = Self::read_column(reader)?;
                let len = reader.read_u32::<BigEndian>().map_err(Error::from_read)?;
                let categories = (0..len)
                    .map(|_| reader.read_f64::<BigEndian>().map_err(Error::from_read))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Membership { column, categories })
            }
            t => Err(Error::SerializationFormat(format!(
                "unknown test tag {:?}",
                t as char
            ))),
        }
    }

    fn read_column<R: Read>(reader: &mut R) -> Result<usize, Error> {
        let column = reader.read_u32::<BigEndian>().map_err(Error::from_read)?;
        Ok(column as usize)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node<V> {
    Internal {
        test: Test,
        true_branch: Box<Node<V>>,
        false_branch: Box<Node<V>>,
    },
    Leaf(V),
}

impl<V: Leaf> Node<V> {
    /// Walks down to the leaf reached by `x`.
    ///
    /// # Panics
    ///
    /// Panics if `x` is shorter than a feature index tested on its path.
    pub fn leaf<X: FeatureVector + ?Sized>(&self, x: &X) -> &V {
        let mut node = self;
        loop {
            match node {
                Self::Leaf(leaf) => return leaf,
                Self::Internal {
                    test,
                    true_branch,
                    false_branch,
                } => {
                    node = if test.evaluate(x) {
                        &**true_branch
                    } else {
                        &**false_branch
                    };
                }
            }
        }
    }

    /// Same as [`leaf`](Self::leaf), reporting a too short input as an error.
    pub fn try_leaf<X: FeatureVector + ?Sized>(&self, x: &X) -> Result<&V, Error> {
        let dimension = x.dimension();
        let mut node = self;
        loop {
            match node {
                Self::Leaf(leaf) => return Ok(leaf),
                Self::Internal {
                    test,
                    true_branch,
                    false_branch,
                } => {
                    if test.column() >= dimension {
                        return Err(Error::InconsistentDimension {
                            index: test.column(),
                            dimension,
                        });
                    }
                    node = if test.evaluate(x) {
                        &**true_branch
                    } else {
                        &**false_branch
                    };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Internal {
                true_branch,
                false_branch,
                ..
            } => 1 + true_branch.node_count() + false_branch.node_count(),
        }
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf(_) => 0,
            Self::Internal {
                true_branch,
                false_branch,
                ..
            } => 1 + std::cmp::max(true_branch.depth(), false_branch.depth()),
        }
    }

    pub fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Self::Leaf(leaf) => {
                writer.write_u8(V::TAG)?;
                leaf.write_payload(writer)
            }
            Self::Internal {
                test,
                true_branch,
                false_branch,
            } => {
                writer.write_u8(NODE_TAG)?;
                test.serialize(writer)?;
                true_branch.serialize(writer)?;
                false_branch.serialize(writer)
            }
        }
    }

    /// Reads a tree written by [`serialize`](Self::serialize).
    ///
    /// Trees deeper than `MAX_STREAM_DEPTH` are rejected as malformed.
    pub fn deserialize<R: Read>(reader: &mut R) -> Result<Self, Error> {
        Self::deserialize_at(reader, 0)
    }

    fn deserialize_at<R: Read>(reader: &mut R, depth: usize) -> Result<Self, Error> {
        if depth > MAX_STREAM_DEPTH {
            return Err(Error::SerializationFormat(format!(
                "tree deeper than {} levels",
                MAX_STREAM_DEPTH
            )));
        }
        match reader.read_u8().map_err(Error::from_read)? {
            NODE_TAG => {
                let test = Test::deserialize(reader)?;
                let true_branch = Box::new(Self::deserialize_at(reader, depth + 1)?);
                let false_branch = Box::new(Self::deserialize_at(reader, depth + 1)?);
                Ok(Self::Internal {
                    test,
                    true_branch,
                    false_branch,
                })
            }
            tag if tag == V::TAG => V::read_payload(reader).map(Self::Leaf),
            tag => Err(Error::SerializationFormat(format!(
                "{:?} node tag found, {:?} or {:?} expected",
                tag as char,
                NODE_TAG as char,
                V::TAG as char
            ))),
        }
    }
}

/// Grows an extremely randomized tree over every record of `view`.
///
/// The view's row order is permuted in place. Given the same row order and the same `rng`
/// state, the returned tree is always the same.
pub fn build_tree<V, C, R, A, G>(
    view: &mut DataView<R, A>,
    criterion: &C,
    options: &TreeOptions,
    rng: &mut G,
) -> Result<Node<V>, Error>
where
    V: Leaf,
    V::Output: PartialEq,
    C: Criterion<V::Output>,
    A: DataAccess<R, Output = V::Output>,
    G: Rng + ?Sized,
{
    let dimension = view.dimension().ok_or(Error::EmptyDataset)?;
    let column_types = match &options.column_types {
        Some(types) if types.len() != dimension => {
            return Err(Error::ColumnTypeMismatch {
                expected: dimension,
                actual: types.len(),
            });
        }
        Some(types) => types.clone(),
        None => vec![ColumnType::Numerical; dimension],
    };
    if let Some((index, x)) = view
        .inputs()
        .enumerate()
        .find(|(_, x)| x.dimension() < dimension)
    {
        log::debug!("record #{} has {} features", index, x.dimension());
        return Err(Error::InconsistentDimension {
            index: dimension - 1,
            dimension: x.dimension(),
        });
    }

    let mut builder = NodeBuilder {
        rng,
        criterion,
        options,
        column_types,
    };
    let root = builder.build::<V, R, A>(view, 0);
    log::debug!(
        "built a tree of {} nodes (depth {}) from {} records",
        root.node_count(),
        root.depth(),
        view.len()
    );
    Ok(root)
}

struct NodeBuilder<'a, G: ?Sized, C> {
    rng: &'a mut G,
    criterion: &'a C,
    options: &'a TreeOptions,
    column_types: Vec<ColumnType>,
}

impl<'a, G, C> NodeBuilder<'a, G, C>
where
    G: Rng + ?Sized,
{
    fn build<V, R, A>(&mut self, view: &mut DataView<R, A>, depth: usize) -> Node<V>
    where
        V: Leaf,
        V::Output: PartialEq,
        C: Criterion<V::Output>,
        A: DataAccess<R, Output = V::Output>,
    {
        if view.len() <= self.options.nmin
            || self.options.max_depth.map_or(false, |d| depth >= d.get())
            || Self::is_output_constant(view)
        {
            return Node::Leaf(V::from_outputs(view.outputs()));
        }

        let columns = self.varying_columns(view);
        if columns.is_empty() {
            return Node::Leaf(V::from_outputs(view.outputs()));
        }

        let mut best: Option<(Test, f64)> = None;
        for _ in 0..self.options.k.get() {
            let column = columns[self.rng.gen_range(0, columns.len())];
            let test = self.draw_test(view, column);
            let score = {
                let test = &test;
                self.criterion
                    .split_score(view.outputs_with(move |x| test.evaluate(x)))
            };
            if best.as_ref().map_or(true, |(_, s)| score > *s) {
                best = Some((test, score));
            }
        }

        match best {
            Some((test, score)) if score > self.options.min_score => {
                let row = view.partition(|x| test.evaluate(x));
                let split = view.with_split(row, |view| {
                    Box::new(self.build::<V, R, A>(view, depth + 1))
                });
                Node::Internal {
                    test,
                    true_branch: split.true_values,
                    false_branch: split.false_values,
                }
            }
            _ => {
                log::trace!(
                    "no candidate split scored above {} among {} records",
                    self.options.min_score,
                    view.len()
                );
                Node::Leaf(V::from_outputs(view.outputs()))
            }
        }
    }

    fn is_output_constant<R, A>(view: &DataView<R, A>) -> bool
    where
        A: DataAccess<R>,
        A::Output: PartialEq,
    {
        let mut ys = view.outputs();
        match ys.next() {
            Some(y0) => ys.all(|y| y == y0),
            None => true,
        }
    }

    fn varying_columns<R, A>(&self, view: &DataView<R, A>) -> Vec<usize>
    where
        A: DataAccess<R>,
    {
        self.column_types
            .iter()
            .enumerate()
            .filter(|&(column, ty)| match ty {
                ColumnType::Categorical => {
                    let mut values = view.column(column).map(OrderedFloat);
                    match values.next() {
                        Some(v0) => values.any(|v| v != v0),
                        None => false,
                    }
                }
                _ => {
                    let (min, max) = Self::bounds(view, column);
                    min < max
                }
            })
            .map(|(column, _)| column)
            .collect()
    }

    /// Bounds of the finite values of `column`.
    fn bounds<R, A>(view: &DataView<R, A>, column: usize) -> (f64, f64)
    where
        A: DataAccess<R>,
    {
        view.column(column)
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
                (min.min(v), max.max(v))
            })
    }

    fn draw_test<R, A>(&mut self, view: &DataView<R, A>, column: usize) -> Test
    where
        A: DataAccess<R>,
    {
        match self.column_types[column] {
            ColumnType::Categorical => {
                let mut values = view
                    .column(column)
                    .map(OrderedFloat)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .map(|v| v.0)
                    .collect::<Vec<_>>();
                values.shuffle(&mut *self.rng);
                let count = self.rng.gen_range(1, values.len());
                let mut categories = values[..count].to_vec();
                categories.sort_by_key(|&c| OrderedFloat(c));
                Test::Membership { column, categories }
            }
            _ => {
                let (min, max) = Self::bounds(view, column);
                let mut threshold = self.rng.gen_range(min, max);
                if threshold <= min {
                    // Adjacent floats leave nothing strictly inside `(min, max)`.
                    threshold = max;
                }
                Test::Threshold { column, threshold }
            }
        }
    }
}
