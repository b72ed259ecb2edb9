pub mod jobs;
pub mod synth;
