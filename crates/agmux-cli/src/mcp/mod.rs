mod dto;
mod server;
mod tools;

pub use dto::*;
pub use server::{McpServer, run_server};
pub use tools::*;
