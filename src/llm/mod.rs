pub mod client;
pub mod tools;

pub use client::LLMClient;
