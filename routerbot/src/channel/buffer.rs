//! Router output accumulated between prompts.
//!
//! Only the last `search_depth` bytes are searched for a prompt, so a long
//! `show running-config` is not rescanned on every read.

use regex::bytes::Regex;

const DEFAULT_SEARCH_DEPTH: usize = 1000;

#[derive(Debug)]
pub struct PatternBuffer {
    data: Vec<u8>,
    search_depth: usize,
}

impl PatternBuffer {
    pub fn new(search_depth: usize) -> Self {
        Self {
            data: Vec::with_capacity(4096),
            search_depth,
        }
    }

    /// Append raw channel bytes. Terminal escapes and `\r` are dropped.
    pub fn extend(&mut self, raw: &[u8]) {
        self.data.extend(
            strip_ansi_escapes::strip(raw)
                .into_iter()
                .filter(|&b| b != b'\r'),
        );
    }

    /// Whether `pattern` matches within the searched tail.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        let from = self.data.len().saturating_sub(self.search_depth);
        pattern.is_match(&self.data[from..])
    }

    /// Hand over everything accumulated so far.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEPTH)
    }
}
