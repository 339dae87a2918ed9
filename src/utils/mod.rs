//! Utility modules
//!
//! Helpers shared by the MSR layer.

pub mod english_words;

// Re-export commonly used functions
pub use english_words::*;
