pub mod lock;
pub mod merge;
pub mod series;
pub mod store;
