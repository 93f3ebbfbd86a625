mod base;
pub use base::AsyncEvaluator;
