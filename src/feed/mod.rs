// src/feed/mod.rs
pub mod client;
pub mod generator;

pub use client::MockNewsClient;
pub use generator::NewsContentGenerator;
