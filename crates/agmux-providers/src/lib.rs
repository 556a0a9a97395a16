mod command;
mod normalizer;
mod registry;
mod shellfs;

pub mod claude;
pub mod codex;
pub mod cursor;
pub mod gemini;
pub mod opencode;

pub use command::*;
pub use normalizer::*;
pub use registry::*;
pub use shellfs::*;
