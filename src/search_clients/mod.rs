pub mod elasticsearch;
pub mod memory;
