//! Utility functions for display formatting.

pub mod format;

pub use format::{balance_display, format_currency};
