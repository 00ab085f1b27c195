//! Channel layer for prompt-driven reads over an SSH PTY.
//!
//! Handles output accumulation, ANSI stripping and tail-only prompt search.

mod buffer;
mod pty;

pub use buffer::PatternBuffer;
pub use pty::PtyChannel;
