//! Strategy types selectable from configuration

pub use crate::pricing::combiner::{ConflictPolicy, WeightStrategy};
