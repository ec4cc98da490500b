pub mod cli;
pub mod config;
pub mod frontend;
pub mod generator;
pub mod llm;
pub mod logging;
pub mod notify;

// Re-export commonly used types
pub use config::Config;
pub use generator::workflow::{EduFlow, FlowError, launch};
pub use notify::{StatusMessage, UpdateReceiver, UpdateSender, update_queue};
