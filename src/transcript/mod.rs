pub mod cache;
pub mod normalize;
