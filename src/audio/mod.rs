pub mod fit;
pub mod mix;
