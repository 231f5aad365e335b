//! The parsing strategy triple `{preprocess, tokenize, threshold}`
//! (spec.md §4.2). Strategies are stateless and shareable across engines;
//! the default strategy applies the built-in [`crate::patterns`] catalogue
//! then whitespace-tokenizes.

use std::sync::Arc;

use crate::patterns::{self, Pattern};

/// One of the three strategy callables, boxed so a caller can plug in a
/// closure without this crate knowing its concrete type — the same shape
/// `tokf_common::config::types` gives wrappers for user-supplied behaviour.
type PreprocessFn = dyn Fn(&str) -> String + Send + Sync;
type TokenizeFn = dyn Fn(&str) -> Vec<String> + Send + Sync;
type ThresholdFn = dyn Fn(usize) -> f64 + Send + Sync;

/// A parsing strategy: how a raw line becomes a masked line, how a masked
/// line becomes tokens, and what similarity threshold applies at a given
/// tree depth. Cheap to clone — internally an `Arc` to each callable.
#[derive(Clone)]
pub struct Strategy {
    preprocess: Arc<PreprocessFn>,
    tokenize: Arc<TokenizeFn>,
    threshold: Arc<ThresholdFn>,
}

impl Strategy {
    pub fn preprocess(&self, line: &str) -> String {
        (self.preprocess)(line)
    }

    pub fn tokenize(&self, line: &str) -> Vec<String> {
        (self.tokenize)(line)
    }

    pub fn threshold(&self, depth: usize) -> f64 {
        (self.threshold)(depth)
    }
}

/// Default `preprocess`: mask variable-shaped substrings with the built-in
/// catalogue, then trim. Never empties a line that had non-whitespace
/// content (spec.md §4.2).
fn default_preprocess(line: &str) -> String {
    let catalogue: &[Pattern] = patterns::default_catalogue();
    patterns::mask(line, catalogue).trim().to_string()
}

/// Default `tokenize`: split on runs of whitespace, discarding empty tokens.
fn default_tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Default `threshold`: a constant `0.4` regardless of depth.
const DEFAULT_SIM_THRESHOLD: f64 = 0.4;

const fn default_threshold(_depth: usize) -> f64 {
    DEFAULT_SIM_THRESHOLD
}

impl Default for Strategy {
    fn default() -> Self {
        Self {
            preprocess: Arc::new(default_preprocess),
            tokenize: Arc::new(default_tokenize),
            threshold: Arc::new(default_threshold),
        }
    }
}

/// Overrides for [`define_strategy`]. Any field left `None` falls back to
/// the corresponding built-in. `patterns` appends to (never replaces) the
/// built-in catalogue, per spec.md §9's design note.
#[derive(Default)]
pub struct StrategyOverrides {
    pub preprocess: Option<Arc<PreprocessFn>>,
    pub tokenize: Option<Arc<TokenizeFn>>,
    pub threshold: Option<Arc<ThresholdFn>>,
    /// Named custom patterns appended after the built-in catalogue.
    /// Invalid regex strings are silently dropped, mirroring
    /// `tokf_filter::filter::compile_patterns`.
    pub patterns: Vec<(String, String)>,
}

/// Build a [`Strategy`] from overrides, falling back to built-ins for any
/// field left unset (spec.md §4.2, §6: `define_strategy(overrides) →
/// strategy`).
#[must_use]
pub fn define_strategy(overrides: StrategyOverrides) -> Strategy {
    let custom_patterns = compile_custom_patterns(&overrides.patterns);

    let preprocess: Arc<PreprocessFn> = overrides.preprocess.unwrap_or_else(|| {
        if custom_patterns.is_empty() {
            Arc::new(default_preprocess)
        } else {
            Arc::new(move |line: &str| preprocess_with_custom(line, &custom_patterns))
        }
    });

    Strategy {
        preprocess,
        tokenize: overrides.tokenize.unwrap_or_else(|| Arc::new(default_tokenize)),
        threshold: overrides.threshold.unwrap_or_else(|| Arc::new(default_threshold)),
    }
}

fn compile_custom_patterns(named: &[(String, String)]) -> Vec<Pattern> {
    named
        .iter()
        .filter_map(|(name, pattern)| {
            regex::Regex::new(pattern)
                .ok()
                .map(|regex| Pattern::from_compiled(name.clone(), regex))
        })
        .collect()
}

fn preprocess_with_custom(line: &str, custom: &[Pattern]) -> String {
    let mut masked = patterns::mask(line, patterns::default_catalogue());
    masked = patterns::mask(&masked, custom);
    masked.trim().to_string()
}
