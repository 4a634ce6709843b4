//! Tarn Core - Fundamental types shared by the lexer and the runtime

mod error;
mod positions;

pub use error::*;
pub use positions::*;
