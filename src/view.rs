use crate::features::FeatureVector;
use rand::seq::SliceRandom as _;
use rand::Rng;
use std::marker::PhantomData;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ColumnType {
    /// Tested with `x < threshold`.
    Numerical,
    /// Values are category codes, tested by set membership.
    Categorical,
}

/// Pure accessors projecting an opaque record onto its input and output.
pub trait DataAccess<R> {
    type Input: FeatureVector + ?Sized;
    type Output;

    fn input_of<'r>(&self, record: &'r R) -> &'r Self::Input;
    fn output_of(&self, record: &R) -> Self::Output;
}

/// [`DataAccess`] made of two closures.
pub struct Accessors<I, O, X: ?Sized, Y> {
    input_of: I,
    output_of: O,
    _types: PhantomData<fn(&X) -> Y>,
}

impl<I, O, X: ?Sized, Y> Accessors<I, O, X, Y> {
    pub fn new<R>(input_of: I, output_of: O) -> Self
    where
        I: Fn(&R) -> &X,
        O: Fn(&R) -> Y,
    {
        Self {
            input_of,
            output_of,
            _types: PhantomData,
        }
    }
}

impl<I: Clone, O: Clone, X: ?Sized, Y> Clone for Accessors<I, O, X, Y> {
    fn clone(&self) -> Self {
        Self {
            input_of: self.input_of.clone(),
            output_of: self.output_of.clone(),
            _types: PhantomData,
        }
    }
}

impl<I, O, X: ?Sized, Y> std::fmt::Debug for Accessors<I, O, X, Y> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accessors").finish()
    }
}

impl<R, I, O, X, Y> DataAccess<R> for Accessors<I, O, X, Y>
where
    I: Fn(&R) -> &X,
    O: Fn(&R) -> Y,
    X: FeatureVector + ?Sized,
{
    type Input = X;
    type Output = Y;

    fn input_of<'r>(&self, record: &'r R) -> &'r X {
        (self.input_of)(record)
    }

    fn output_of(&self, record: &R) -> Y {
        (self.output_of)(record)
    }
}

/// The two disjoint parts of a view cut by a boolean test.
#[derive(Debug, Clone, PartialEq)]
pub struct Split<T> {
    pub true_values: T,
    pub false_values: T,
}

/// A reorderable view over borrowed records.
///
/// Partitioning only permutes an index vector, the records themselves are never copied.
#[derive(Debug)]
pub struct DataView<'a, R, A> {
    records: &'a [R],
    access: A,
    row_index: Vec<usize>,
    row_range: Range<usize>,
}

impl<'a, R, A: Clone> Clone for DataView<'a, R, A> {
    fn clone(&self) -> Self {
        Self {
            records: self.records,
            access: self.access.clone(),
            row_index: self.row_index.clone(),
            row_range: self.row_range.clone(),
        }
    }
}

impl<'a, R, X: ?Sized, Y, I, O> DataView<'a, R, Accessors<I, O, X, Y>>
where
    I: Fn(&R) -> &X,
    O: Fn(&R) -> Y,
    X: FeatureVector,
{
    /// Makes a view over all `records`, read through the `input_of` and `output_of` closures.
    pub fn new(records: &'a [R], input_of: I, output_of: O) -> Self {
        Self::with_access(records, Accessors::new::<R>(input_of, output_of))
    }
}

impl<'a, R, A: DataAccess<R>> DataView<'a, R, A> {
    pub fn with_access(records: &'a [R], access: A) -> Self {
        Self {
            records,
            access,
            row_index: (0..records.len()).collect(),
            row_range: 0..records.len(),
        }
    }

    pub fn access(&self) -> &A {
        &self.access
    }

    pub fn len(&self) -> usize {
        self.row_range.end - self.row_range.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn rows<'b>(&'b self) -> impl 'b + Iterator<Item = usize> + Clone {
        self.row_index[self.row_range.start..self.row_range.end]
            .iter()
            .copied()
    }

    pub fn records<'b>(&'b self) -> impl 'b + Iterator<Item = &'a R> + Clone {
        let records = self.records;
        self.rows().map(move |i| &records[i])
    }

    pub fn inputs<'b>(&'b self) -> impl 'b + Iterator<Item = &'b A::Input> + Clone {
        let access = &self.access;
        self.records().map(move |r| access.input_of(r))
    }

    pub fn outputs<'b>(&'b self) -> impl 'b + Iterator<Item = A::Output> + Clone {
        let access = &self.access;
        self.records().map(move |r| access.output_of(r))
    }

    /// Outputs paired with the outcome of `test` on the matching input.
    pub fn outputs_with<'b, F>(
        &'b self,
        test: F,
    ) -> impl 'b + Iterator<Item = (bool, A::Output)> + Clone
    where
        F: 'b + Fn(&A::Input) -> bool + Clone,
    {
        let access = &self.access;
        self.records()
            .map(move |r| (test(access.input_of(r)), access.output_of(r)))
    }

    pub fn column<'b>(&'b self, column: usize) -> impl 'b + Iterator<Item = f64> + Clone {
        self.inputs().map(move |x| x.feature(column))
    }

    /// Dimension of the first input, or `None` for an empty view.
    pub fn dimension(&self) -> Option<usize> {
        self.inputs().next().map(|x| x.dimension())
    }

    pub fn shuffle<G: Rng + ?Sized>(&mut self, rng: &mut G) {
        self.row_index[self.row_range.start..self.row_range.end].shuffle(rng);
    }

    /// Draws `samples` rows with replacement.
    pub fn bootstrap_sample<G: Rng + ?Sized>(&self, rng: &mut G, samples: usize) -> Self
    where
        A: Clone,
    {
        let row_index = (0..samples)
            .map(|_| self.row_index[rng.gen_range(self.row_range.start, self.row_range.end)])
            .collect::<Vec<_>>();
        Self {
            records: self.records,
            access: self.access.clone(),
            row_index,
            row_range: 0..samples,
        }
    }

    /// Stably moves the rows whose input passes `test` to the front of the view.
    ///
    /// Returns the number of passing rows.
    pub fn partition<F>(&mut self, mut test: F) -> usize
    where
        F: FnMut(&A::Input) -> bool,
    {
        let records = self.records;
        let access = &self.access;
        let rows = &mut self.row_index[self.row_range.start..self.row_range.end];
        let (passed, failed): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&i| test(access.input_of(&records[i])));
        let n = passed.len();
        for (slot, i) in rows.iter_mut().zip(passed.into_iter().chain(failed)) {
            *slot = i;
        }
        n
    }

    /// Runs `f` on the first `row` rows, then on the rest.
    pub fn with_split<F, T>(&mut self, row: usize, mut f: F) -> Split<T>
    where
        F: FnMut(&mut Self) -> T,
    {
        let row = row + self.row_range.start;
        let original = self.row_range.clone();

        self.row_range.end = row;
        let true_values = f(self);
        self.row_range.end = original.end;

        self.row_range.start = row;
        let false_values = f(self);
        self.row_range.start = original.start;

        Split {
            true_values,
            false_values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn records() -> Vec<([f64; 2], u8)> {
        vec![
            ([0.0, 5.0], 0),
            ([3.0, 1.0], 1),
            ([1.0, 2.0], 0),
            ([4.0, 0.0], 1),
            ([2.0, 9.0], 0),
        ]
    }

    #[test]
    fn partition_and_split_work() {
        let records = records();
        let mut view = DataView::new(&records, |r: &([f64; 2], u8)| &r.0, |r| r.1);
        assert_eq!(view.len(), 5);
        assert_eq!(view.dimension(), Some(2));

        let n = view.partition(|x| x[0] < 2.5);
        assert_eq!(n, 3);
        assert_eq!(view.outputs().collect::<Vec<_>>(), vec![0, 0, 0, 1, 1]);
        assert_eq!(
            view.column(0).collect::<Vec<_>>(),
            vec![0.0, 1.0, 2.0, 3.0, 4.0]
        );

        let split = view.with_split(n, |v| v.outputs().collect::<Vec<_>>());
        assert_eq!(split.true_values, vec![0, 0, 0]);
        assert_eq!(split.false_values, vec![1, 1]);
        assert_eq!(view.len(), 5);
    }

    #[test]
    fn nested_split_restores_ranges() {
        let records = records();
        let mut view = DataView::new(&records, |r: &([f64; 2], u8)| &r.0, |r| r.1);
        let n = view.partition(|x| x[1] < 3.0);
        let split = view.with_split(n, |v| {
            let m = v.partition(|x| x[0] < 2.0);
            v.with_split(m, |w| w.len())
        });
        assert_eq!(split.true_values.true_values, 1);
        assert_eq!(split.true_values.false_values, 2);
        assert_eq!(split.false_values.true_values, 1);
        assert_eq!(split.false_values.false_values, 1);
        assert_eq!(view.len(), 5);
    }

    #[test]
    fn bootstrap_sample_works() {
        let records = records();
        let view = DataView::new(&records, |r: &([f64; 2], u8)| &r.0, |r| r.1);
        let mut rng = StdRng::seed_from_u64(7);
        let sample = view.bootstrap_sample(&mut rng, 8);
        assert_eq!(sample.len(), 8);
        assert!(sample.records().all(|r| records.contains(r)));

        let mut shuffled = view.clone();
        shuffled.shuffle(&mut rng);
        let mut outputs = shuffled.outputs().collect::<Vec<_>>();
        outputs.sort();
        assert_eq!(outputs, vec![0, 0, 0, 1, 1]);
    }
}
