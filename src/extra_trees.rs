pub use self::classifier::{ExtraTreesClassifier, ExtraTreesClassifierOptions};
pub use self::regressor::{ExtraTreesRegressor, ExtraTreesRegressorOptions};

mod classifier;
mod core;
mod regressor;
