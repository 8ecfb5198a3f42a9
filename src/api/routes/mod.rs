pub mod games;
pub mod statistics;
