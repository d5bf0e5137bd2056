#![forbid(unsafe_code)]

pub mod model;
pub mod stats;
pub mod storage;
pub mod store;
