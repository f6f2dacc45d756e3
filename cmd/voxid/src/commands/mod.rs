pub mod models;
pub mod predict;
pub mod stats;
pub mod train;
