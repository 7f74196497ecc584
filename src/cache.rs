//! Parse cache: a small bounded LFU cache in front of the parser, keyed on
//! whitespace-stripped input text.

use std::collections::HashMap;

use crate::ast::Node;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug)]
struct Entry {
    ast: Node,
    freq: u64,
}

#[derive(Debug)]
pub struct ParseCache {
    capacity: usize,
    entries: HashMap<String, Entry>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ParseCache {
            capacity,
            entries: HashMap::new(),
        }
    }

    fn normalize(input: &str) -> String {
        input.chars().filter(|c| !c.is_whitespace()).collect()
    }

    pub fn get(&mut self, input: &str) -> Option<Node> {
        let key = Self::normalize(input);
        let entry = self.entries.get_mut(&key)?;
        entry.freq += 1;
        Some(entry.ast.clone())
    }

    pub fn insert(&mut self, input: &str, ast: Node) {
        let key = Self::normalize(input);
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.ast = ast;
            entry.freq += 1;
            return;
        }
        if self.entries.len() >= self.capacity {
            self.evict_least_frequent();
        }
        self.entries.insert(key, Entry { ast, freq: 1 });
    }

    fn evict_least_frequent(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.freq)
            .map(|(k, _)| k.clone());
        if let Some(key) = victim {
            tracing::debug!(key = %key, "evicting parse cache entry");
            self.entries.remove(&key);
        }
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new()
    }
}
