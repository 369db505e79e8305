/// Indexable feature vector of a record.
///
/// Categorical components are encoded as `f64` category codes; how a
/// dimension is tested is decided by its [`ColumnType`](crate::ColumnType).
pub trait FeatureVector {
    fn dimension(&self) -> usize;

    /// # Panics
    ///
    /// Panics if `index >= self.dimension()`.
    fn feature(&self, index: usize) -> f64;
}

macro_rules! impl_feature_vector {
    ($t:ty) => {
        impl FeatureVector for [$t] {
            fn dimension(&self) -> usize {
                self.len()
            }

            fn feature(&self, index: usize) -> f64 {
                f64::from(self[index])
            }
        }

        impl FeatureVector for Vec<$t> {
            fn dimension(&self) -> usize {
                self.len()
            }

            fn feature(&self, index: usize) -> f64 {
                f64::from(self[index])
            }
        }

        impl<const N: usize> FeatureVector for [$t; N] {
            fn dimension(&self) -> usize {
                N
            }

            fn feature(&self, index: usize) -> f64 {
                f64::from(self[index])
            }
        }
    };
}

impl_feature_vector!(f64);
impl_feature_vector!(f32);

impl<T: FeatureVector + ?Sized> FeatureVector for &T {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn feature(&self, index: usize) -> f64 {
        (**self).feature(index)
    }
}
