use std::collections::BTreeMap;

/// Incremental mean, so long runs of similar values do not accumulate a large partial sum.
///
/// # Panics
///
/// Panics if `xs` is empty.
pub fn mean(xs: impl Iterator<Item = f64>) -> f64 {
    let mut count = 0;
    let mut mean = 0.0;
    for x in xs {
        count += 1;
        mean += (x - mean) / count as f64;
    }
    assert_ne!(count, 0);
    mean
}

/// Population variance (Welford). Returns `0.0` for fewer than two values.
pub fn variance(xs: impl Iterator<Item = f64>) -> f64 {
    let mut count = 0;
    let mut mean = 0.0;
    let mut m2 = 0.0;
    for x in xs {
        count += 1;
        let delta = x - mean;
        mean += delta / count as f64;
        m2 += delta * (x - mean);
    }
    if count < 2 {
        0.0
    } else {
        m2 / count as f64
    }
}

pub fn histogram<L: Ord>(xs: impl Iterator<Item = L>) -> (BTreeMap<L, usize>, usize) {
    let mut histogram = BTreeMap::new();
    let mut n = 0;
    for x in xs {
        *histogram.entry(x).or_default() += 1;
        n += 1;
    }
    (histogram, n)
}

/// Returns the label with the highest count; ties go to the smallest label.
pub fn most_frequent<L: Ord, C: PartialOrd + Copy>(histogram: &BTreeMap<L, C>) -> Option<&L> {
    let mut best: Option<(&L, C)> = None;
    for (label, &count) in histogram {
        match best {
            Some((_, c)) if !(count > c) => {}
            _ => best = Some((label, count)),
        }
    }
    best.map(|t| t.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_variance_work() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(mean(xs.iter().copied()), 2.5);
        assert_eq!(variance(xs.iter().copied()), 1.25);
        assert_eq!(variance(std::iter::once(3.0)), 0.0);
        assert_eq!(variance(std::iter::empty()), 0.0);
    }

    #[test]
    fn most_frequent_breaks_ties_by_smallest_label() {
        let (h, n) = histogram(vec!["b", "a", "b", "a", "c"].into_iter());
        assert_eq!(n, 5);
        assert_eq!(most_frequent(&h), Some(&"a"));

        let (h, _) = histogram(vec![3, 1, 3].into_iter());
        assert_eq!(most_frequent(&h), Some(&3));

        let empty = BTreeMap::<u8, usize>::new();
        assert_eq!(most_frequent(&empty), None);
    }
}
