mod error;
mod manager;
mod process;
mod safety;
mod tailer;

pub use error::*;
pub use manager::*;
