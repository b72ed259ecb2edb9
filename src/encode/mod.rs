pub mod remux;
