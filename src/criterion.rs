use crate::functions;

/// Impurity measure used to rank candidate splits.
pub trait Criterion<Y>: Send + Sync + Clone {
    /// Impurity of a multiset of outputs. Must be `0.0` for an empty one.
    fn calculate<T>(&self, ys: T) -> f64
    where
        T: Iterator<Item = Y> + Clone;

    /// Relative impurity reduction of a split.
    ///
    /// `ys` yields every output of the parent subset together with the side of the split it
    /// falls on. The score is `0.0` for a pure parent, non-positive for a useless split and `1.0`
    /// for a split leaving both sides pure.
    fn split_score<T>(&self, ys: T) -> f64
    where
        T: Iterator<Item = (bool, Y)> + Clone,
    {
        let impurity = self.calculate(ys.clone().map(|(_, y)| y));
        if !(impurity > 0.0) {
            return 0.0;
        }

        let n = ys.clone().count() as f64;
        let n_true = ys.clone().filter(|(t, _)| *t).count() as f64;
        let impurity_t = self.calculate(ys.clone().filter(|(t, _)| *t).map(|(_, y)| y));
        let impurity_f = self.calculate(ys.filter(|(t, _)| !*t).map(|(_, y)| y));
        let ratio_t = n_true / n;
        let ratio_f = 1.0 - ratio_t;

        (impurity - (ratio_t * impurity_t + ratio_f * impurity_f)) / impurity
    }
}

pub trait RegressionCriterion: Criterion<f64> {}

/// Population variance. Its split score is the relative variance reduction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Variance;

impl Criterion<f64> for Variance {
    fn calculate<T>(&self, ys: T) -> f64
    where
        T: Iterator<Item = f64> + Clone,
    {
        functions::variance(ys)
    }
}

impl RegressionCriterion for Variance {}

pub trait ClassificationCriterion<L>: Criterion<L> {}

/// Gini impurity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gini;

impl<L: Ord> Criterion<L> for Gini {
    fn calculate<T>(&self, ys: T) -> f64
    where
        T: Iterator<Item = L> + Clone,
    {
        let (histogram, n) = functions::histogram(ys);
        if n == 0 {
            return 0.0;
        }
        1.0 - histogram
            .into_iter()
            .map(|(_, count)| (count as f64 / n as f64).powi(2))
            .sum::<f64>()
    }
}

impl<L: Ord> ClassificationCriterion<L> for Gini {}

/// Shannon entropy (base 2). Its split score is the normalized information gain.
#[derive(Debug, Clone, Copy, Default)]
pub struct Entropy;

impl<L: Ord> Criterion<L> for Entropy {
    fn calculate<T>(&self, ys: T) -> f64
    where
        T: Iterator<Item = L> + Clone,
    {
        let (histogram, n) = functions::histogram(ys);
        histogram
            .into_iter()
            .map(|(_, count)| {
                let p = count as f64 / n as f64;
                -p * p.log2()
            })
            .sum()
    }
}

impl<L: Ord> ClassificationCriterion<L> for Entropy {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_works() {
        assert_eq!(Entropy.calculate(std::iter::empty::<u8>()), 0.0);
        assert_eq!(Entropy.calculate([1, 1, 1].iter().copied()), 0.0);
        assert_eq!(Entropy.calculate([0, 1, 0, 1].iter().copied()), 1.0);
        assert_eq!(Entropy.calculate([0, 1, 2, 3].iter().copied()), 2.0);
    }

    #[test]
    fn information_gain_bounds() {
        let perfect = [(true, 'a'), (true, 'a'), (false, 'b'), (false, 'b')];
        assert_eq!(Entropy.split_score(perfect.iter().copied()), 1.0);

        let useless = [(true, 'a'), (true, 'b'), (false, 'a'), (false, 'b')];
        assert_eq!(Entropy.split_score(useless.iter().copied()), 0.0);

        let pure = [(true, 'a'), (false, 'a')];
        assert_eq!(Entropy.split_score(pure.iter().copied()), 0.0);

        let partial = [(true, 'a'), (true, 'a'), (true, 'b'), (false, 'b')];
        let score = Entropy.split_score(partial.iter().copied());
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn gini_works() {
        assert_eq!(Gini.calculate([0, 1, 0, 1].iter().copied()), 0.5);
        let perfect = [(true, 0), (false, 1)];
        assert_eq!(Gini.split_score(perfect.iter().copied()), 1.0);
    }

    #[test]
    fn variance_reduction_works() {
        let perfect = [(true, 1.0), (true, 1.0), (false, 3.0), (false, 3.0)];
        assert_eq!(Variance.split_score(perfect.iter().copied()), 1.0);

        let useless = [(true, 1.0), (true, 3.0), (false, 1.0), (false, 3.0)];
        assert_eq!(Variance.split_score(useless.iter().copied()), 0.0);

        let constant = [(true, 2.0), (false, 2.0)];
        assert_eq!(Variance.split_score(constant.iter().copied()), 0.0);

        let ys = [(true, 0.0), (false, 1.0), (false, 2.0), (false, 3.0)];
        let score = Variance.split_score(ys.iter().copied());
        assert!((score - 0.6).abs() < 1e-12);
    }
}
