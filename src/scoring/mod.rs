pub mod components;
pub mod engine;
pub mod tier;

pub use engine::{score, Adjustment, ComponentScores, ScoreResult};
pub use tier::{assign_tier, Classification, Classifier, Tier};
