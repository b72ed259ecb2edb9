pub mod dub;
