// Detection domain: detector contract, adaptation, and built-in backends.

pub mod adapter;
pub mod backend;
pub mod error;
pub mod luma;
pub mod mock;
pub mod types;
