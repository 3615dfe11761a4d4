//! Translation file optimizer.
//!
//! Shrinks a dictionary before it is cached or served: drops empty values,
//! trims whitespace, normalizes `{{ name }}` placeholders and removes later
//! entries whose text duplicates an earlier one.

use crate::i18n::dictionary::{flatten, placeholder_regex, unflatten, Dictionary};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// Which optimizations to apply. Everything is on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeOptions {
    pub remove_empty: bool,
    pub trim_whitespace: bool,
    pub normalize_placeholders: bool,
    /// Drops any entry whose value was already seen under another key.
    /// Distinct keys that happen to share text collapse into the first one.
    pub deduplicate: bool,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            remove_empty: true,
            trim_whitespace: true,
            normalize_placeholders: true,
            deduplicate: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptimizationStats {
    /// Compact JSON size in bytes before optimization
    pub original_size: usize,
    pub optimized_size: usize,
    pub original_keys: usize,
    pub optimized_keys: usize,
    pub bytes_saved: usize,
    /// Percentage of `original_size` saved (0-100)
    pub percent_saved: f64,
    pub duplicates_removed: usize,
    pub empty_removed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub optimized: Dictionary,
    pub stats: OptimizationStats,
}

pub fn optimize(dict: &Dictionary, options: &OptimizeOptions) -> OptimizationResult {
    let pairs = flatten(dict);
    let original_keys = pairs.len();

    let mut seen_values: HashSet<String> = HashSet::new();
    let mut duplicates_removed = 0;
    let mut empty_removed = 0;
    let mut survivors = Vec::with_capacity(pairs.len());

    for (key, value) in pairs {
        let value = match value {
            Value::String(text) => {
                if options.remove_empty && text.trim().is_empty() {
                    empty_removed += 1;
                    continue;
                }

                let mut text = if options.trim_whitespace {
                    text.trim().to_string()
                } else {
                    text
                };
                if options.normalize_placeholders {
                    text = placeholder_regex()
                        .replace_all(&text, "{{$1}}")
                        .into_owned();
                }

                if options.deduplicate && !seen_values.insert(text.clone()) {
                    duplicates_removed += 1;
                    continue;
                }
                Value::String(text)
            }
            other => other,
        };
        survivors.push((key, value));
    }

    // Dotted keys can collide on rebuild, so count what actually survived
    let optimized = unflatten(survivors);
    let optimized_keys = flatten(&optimized).len();

    let original_size = serialized_size(dict);
    let optimized_size = serialized_size(&optimized);
    let bytes_saved = original_size.saturating_sub(optimized_size);
    let percent_saved = if original_size > 0 {
        (bytes_saved as f64 / original_size as f64) * 100.0
    } else {
        0.0
    };

    OptimizationResult {
        optimized,
        stats: OptimizationStats {
            original_size,
            optimized_size,
            original_keys,
            optimized_keys,
            bytes_saved,
            percent_saved,
            duplicates_removed,
            empty_removed,
        },
    }
}

fn serialized_size(dict: &Dictionary) -> usize {
    serde_json::to_vec(dict).map(|bytes| bytes.len()).unwrap_or(0)
}
