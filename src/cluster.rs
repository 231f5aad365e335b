//! A log cluster: the template, its occurrence count, and the bounded
//! diagnostic samples harvested from matching lines (spec.md §3, §4.3).

use crate::extract::{self, Severity};
use crate::patterns::WILDCARD;

/// A bounded, deduplicated, insertion-ordered collection (spec.md §3's
/// "sample container" invariant: at most `capacity` entries, no
/// duplicates, insertion order preserved).
#[derive(Debug, Clone, Default)]
pub struct BoundedSamples<T> {
    capacity: usize,
    items: Vec<T>,
}

impl<T: PartialEq> BoundedSamples<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::new(),
        }
    }

    /// Insert `value` if capacity remains and it isn't already present.
    /// Returns `true` if it was inserted.
    pub fn insert(&mut self, value: T) -> bool {
        if self.items.len() >= self.capacity || self.items.contains(&value) {
            return false;
        }
        self.items.push(value);
        true
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One token-sequence variable binding: the values that occupied the
/// template's wildcard positions for a single matching line.
pub type VariableBinding = Vec<String>;

/// An equivalence class of log lines sharing a template, plus the
/// metadata spec.md §3 requires.
#[derive(Debug, Clone)]
pub struct LogCluster {
    pub id: String,
    tokens: Vec<String>,
    count: u64,
    first_line_index: u64,
    last_line_index: u64,
    sample_variables: BoundedSamples<VariableBinding>,
    url_samples: BoundedSamples<String>,
    full_url_samples: BoundedSamples<String>,
    status_code_samples: BoundedSamples<String>,
    correlation_id_samples: BoundedSamples<String>,
    duration_samples: BoundedSamples<String>,
    severity: Severity,
    is_stack_frame: bool,
}

/// Per-cluster sample capacities (spec.md §3).
pub struct SampleCapacities {
    pub variables: usize,
    pub urls: usize,
    pub full_urls: usize,
    pub status_codes: usize,
    pub correlation_ids: usize,
    pub durations: usize,
}

impl Default for SampleCapacities {
    fn default() -> Self {
        Self {
            variables: 3,
            urls: 5,
            full_urls: 5,
            status_codes: 5,
            correlation_ids: 3,
            durations: 5,
        }
    }
}

impl LogCluster {
    /// Create a cluster from its first matching line. Severity, the
    /// stack-frame flag, and every diagnostic sample are seeded from
    /// `original_line` via the extractors in [`crate::extract`];
    /// `sample_variables` starts empty (spec.md §4.3 `create`).
    pub fn create(
        id: String,
        tokens: Vec<String>,
        line_index: u64,
        original_line: &str,
        capacities: &SampleCapacities,
    ) -> Self {
        let mut cluster = Self {
            id,
            tokens,
            count: 1,
            first_line_index: line_index,
            last_line_index: line_index,
            sample_variables: BoundedSamples::new(capacities.variables),
            url_samples: BoundedSamples::new(capacities.urls),
            full_url_samples: BoundedSamples::new(capacities.full_urls),
            status_code_samples: BoundedSamples::new(capacities.status_codes),
            correlation_id_samples: BoundedSamples::new(capacities.correlation_ids),
            duration_samples: BoundedSamples::new(capacities.durations),
            severity: extract::detect_severity(original_line),
            is_stack_frame: extract::is_stack_frame(original_line),
        };
        cluster.ingest_diagnostics(original_line);
        cluster
    }

    fn ingest_diagnostics(&mut self, original_line: &str) {
        for url in extract::extract_urls(original_line) {
            self.url_samples.insert(url);
        }
        for url in extract::extract_full_urls(original_line) {
            self.full_url_samples.insert(url);
        }
        for code in extract::extract_status_codes(original_line) {
            self.status_code_samples.insert(code);
        }
        for id in extract::extract_correlation_ids(original_line) {
            self.correlation_id_samples.insert(id);
        }
        for d in extract::extract_durations(original_line) {
            self.duration_samples.insert(d);
        }
    }

    /// Fraction of positions where the template agrees with `tokens`
    /// (wildcard counts as agreement). Zero if lengths differ
    /// (spec.md §4.3 `similarity`). Precondition: `!tokens.is_empty()`.
    #[must_use]
    pub fn similarity(&self, tokens: &[String]) -> f64 {
        debug_assert!(!tokens.is_empty());
        if tokens.len() != self.tokens.len() {
            return 0.0;
        }
        if self.tokens.is_empty() {
            return 1.0;
        }
        let matches = self
            .tokens
            .iter()
            .zip(tokens)
            .filter(|(t, c)| t.as_str() == WILDCARD || *t == *c)
            .count();
        #[allow(clippy::cast_precision_loss)]
        let ratio = matches as f64 / self.tokens.len() as f64;
        ratio
    }

    /// Record a matching line: bump `count`, extend `last_line_index`,
    /// capture variable bindings and diagnostic samples. Does not touch
    /// `severity` or `is_stack_frame` (spec.md §4.3 `update`, §9). Does
    /// not generalise the template — call [`Self::merge`] separately,
    /// after `update`, per spec.md §4.5 step 6's ordering note.
    pub fn update(&mut self, tokens: &[String], line_index: u64, original_line: &str) {
        debug_assert_eq!(tokens.len(), self.tokens.len());
        self.count += 1;
        self.last_line_index = line_index;

        let bindings: VariableBinding = self
            .tokens
            .iter()
            .zip(tokens)
            .filter(|(t, _)| t.as_str() == WILDCARD)
            .map(|(_, candidate)| candidate.clone())
            .collect();
        if !bindings.is_empty() {
            self.sample_variables.insert(bindings);
        }

        self.ingest_diagnostics(original_line);
    }

    /// Generalise the template in place: any position where the
    /// template disagrees with `tokens` becomes the wildcard marker
    /// (spec.md §4.3 `merge`). Precondition: `tokens.len() ==
    /// template.len()`.
    pub fn merge(&mut self, tokens: &[String]) {
        debug_assert_eq!(tokens.len(), self.tokens.len());
        for (template_token, candidate) in self.tokens.iter_mut().zip(tokens) {
            if template_token.as_str() != WILDCARD && template_token != candidate {
                *template_token = WILDCARD.to_string();
            }
        }
    }

    /// The template, tokens joined with single spaces.
    #[must_use]
    pub fn pattern(&self) -> String {
        self.tokens.join(" ")
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub const fn first_line_index(&self) -> u64 {
        self.first_line_index
    }

    #[must_use]
    pub const fn last_line_index(&self) -> u64 {
        self.last_line_index
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub const fn is_stack_frame(&self) -> bool {
        self.is_stack_frame
    }

    #[must_use]
    pub fn sample_variables(&self) -> &[VariableBinding] {
        self.sample_variables.as_slice()
    }

    #[must_use]
    pub fn url_samples(&self) -> &[String] {
        self.url_samples.as_slice()
    }

    #[must_use]
    pub fn full_url_samples(&self) -> &[String] {
        self.full_url_samples.as_slice()
    }

    #[must_use]
    pub fn status_code_samples(&self) -> &[String] {
        self.status_code_samples.as_slice()
    }

    #[must_use]
    pub fn correlation_id_samples(&self) -> &[String] {
        self.correlation_id_samples.as_slice()
    }

    #[must_use]
    pub fn duration_samples(&self) -> &[String] {
        self.duration_samples.as_slice()
    }
}
