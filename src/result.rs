//! Turning a finished engine's clusters into an ordered, size-bounded
//! result (spec.md §4.6, §5): one record per template plus aggregate
//! stats, independent of how the caller will render it.

use crate::engine::DrainEngine;
use crate::extract::Severity;

/// One mined template and the metadata accumulated for it. Field names
/// match spec.md §4.6's JSON contract directly (`occurrences`,
/// `samples`, `first_seen`, `last_seen`) so [`crate::format::render`]'s
/// `json`/`stable_json` variants can serialize this struct with no
/// further remapping.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TemplateRecord {
    pub id: String,
    pub pattern: String,
    pub occurrences: u64,
    pub severity: Severity,
    pub is_stack_frame: bool,
    pub samples: Vec<Vec<String>>,
    pub url_samples: Vec<String>,
    pub full_url_samples: Vec<String>,
    pub status_code_samples: Vec<String>,
    pub correlation_id_samples: Vec<String>,
    pub duration_samples: Vec<String>,
    pub first_seen: u64,
    pub last_seen: u64,
}

/// Aggregate statistics over every template the engine mined, computed
/// before any `max_templates` truncation is applied — except
/// `estimated_token_reduction`, which spec.md §4.6 defines over the
/// *truncated* template list (it is a property of what actually gets
/// rendered, not of everything the engine ever saw).
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct Stats {
    pub input_lines: u64,
    pub unique_templates: usize,
    pub compression_ratio: f64,
    pub estimated_token_reduction: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

/// The assembled, format-independent result of a compression run.
/// `version` is the stable-wire-contract version spec.md §4.6/§6 calls
/// out: `"1.1"`, carried unchanged by every format that emits JSON.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CompressResult {
    pub version: &'static str,
    pub stats: Stats,
    pub templates: Vec<TemplateRecord>,
}

const RESULT_VERSION: &str = "1.1";

/// The value returned by [`crate::engine::DrainEngine::get_result`]:
/// spec.md §6's result record — `templates[]`, `stats{…}`, and
/// `formatted` (the chosen textual rendering), as three flat fields
/// rather than nested inside a format-specific wrapper.
#[derive(Debug, Clone)]
pub struct EngineResult {
    pub stats: Stats,
    pub templates: Vec<TemplateRecord>,
    pub formatted: String,
}

fn to_record(cluster: &crate::cluster::LogCluster) -> TemplateRecord {
    TemplateRecord {
        id: cluster.id.clone(),
        pattern: cluster.pattern(),
        occurrences: cluster.count(),
        severity: cluster.severity(),
        is_stack_frame: cluster.is_stack_frame(),
        samples: cluster.sample_variables().to_vec(),
        url_samples: cluster.url_samples().to_vec(),
        full_url_samples: cluster.full_url_samples().to_vec(),
        status_code_samples: cluster.status_code_samples().to_vec(),
        correlation_id_samples: cluster.correlation_id_samples().to_vec(),
        duration_samples: cluster.duration_samples().to_vec(),
        first_seen: cluster.first_line_index(),
        last_seen: cluster.last_line_index(),
    }
}

/// `1 - unique_templates/input_lines`, clamped to `[0, 1]`; `0` when
/// there were no input lines (spec.md §4.6).
fn compression_ratio(unique_templates: usize, input_lines: u64) -> f64 {
    if input_lines == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = 1.0 - (unique_templates as f64 / input_lines as f64);
    ratio.clamp(0.0, 1.0)
}

/// `1 - compressed_chars/original_chars`, clamped to `[0, 1]`, computed
/// over the *truncated* template list (spec.md §4.6): `original_chars`
/// sums `pattern.len() * occurrences`, `compressed_chars` sums
/// `pattern.len() + 20` (a flat per-template overhead standing in for a
/// template-reference marker in whatever the caller re-encodes this
/// into). `0` when there were no truncated templates to measure.
fn estimated_token_reduction(templates: &[TemplateRecord]) -> f64 {
    let (original_chars, compressed_chars) =
        templates
            .iter()
            .fold((0u64, 0u64), |(original, compressed), template| {
                let len = template.pattern.len() as u64;
                (original + len * template.occurrences, compressed + len + 20)
            });
    if original_chars == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = 1.0 - (compressed_chars as f64 / original_chars as f64);
    ratio.clamp(0.0, 1.0)
}

/// Assemble a [`CompressResult`] from a finished engine's clusters,
/// sorted by occurrence count descending (ties keep insertion order —
/// the arena's natural order, which is creation order), then truncated
/// to `max_templates`. `unique_templates` always reflects every cluster
/// the engine mined, pre-truncation; `estimated_token_reduction` is
/// computed over the truncated list (see that function's doc comment).
#[must_use]
pub fn assemble(engine: &DrainEngine, max_templates: usize, processing_time_ms: Option<u64>) -> CompressResult {
    let unique_templates = engine.clusters().len();

    let mut indexed: Vec<(usize, &crate::cluster::LogCluster)> = engine.clusters().iter().enumerate().collect();
    indexed.sort_by(|(ai, a), (bi, b)| b.count().cmp(&a.count()).then(ai.cmp(bi)));

    let templates: Vec<TemplateRecord> = indexed
        .into_iter()
        .take(max_templates)
        .map(|(_, cluster)| to_record(cluster))
        .collect();

    CompressResult {
        version: RESULT_VERSION,
        stats: Stats {
            input_lines: engine.line_count(),
            unique_templates,
            compression_ratio: compression_ratio(unique_templates, engine.line_count()),
            estimated_token_reduction: estimated_token_reduction(&templates),
            processing_time_ms,
        },
        templates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CreateEngineOptions, DrainOptions};

    #[test]
    fn sorts_by_count_descending_with_insertion_order_tiebreak() {
        let mut engine = DrainEngine::new(CreateEngineOptions::default());
        engine.add_line("alpha one");
        engine.add_line("beta two");
        engine.add_line("alpha two");
        let result = assemble(&engine, 10, None);
        assert_eq!(result.templates[0].occurrences, 2);
        assert_eq!(result.templates[0].pattern, "alpha <*>");
        assert_eq!(result.stats.unique_templates, 2);
    }

    #[test]
    fn max_templates_truncates_list_but_not_unique_template_count() {
        let mut engine = DrainEngine::new(CreateEngineOptions::default());
        engine.add_line("alpha one");
        engine.add_line("beta two");
        engine.add_line("gamma three");
        let result = assemble(&engine, 1, None);
        assert_eq!(result.templates.len(), 1);
        assert_eq!(result.stats.unique_templates, 3);
    }

    #[test]
    fn empty_engine_has_zero_ratio_and_no_templates() {
        let engine = DrainEngine::new(CreateEngineOptions::default());
        let result = assemble(&engine, 50, None);
        assert_eq!(result.stats.input_lines, 0);
        assert_eq!(result.stats.compression_ratio, 0.0);
        assert_eq!(result.stats.estimated_token_reduction, 0.0);
        assert!(result.templates.is_empty());
    }

    #[test]
    fn max_clusters_one_still_assembles_a_single_template() {
        let mut engine = DrainEngine::new(CreateEngineOptions {
            drain: DrainOptions {
                max_clusters: 1,
                ..DrainOptions::default()
            },
            ..CreateEngineOptions::default()
        });
        engine.add_line("alpha one");
        engine.add_line("totally different shape entirely");
        let result = assemble(&engine, 10, None);
        assert_eq!(result.templates.len(), 1);
    }

    #[test]
    fn compression_ratio_is_one_minus_template_fraction() {
        // spec.md §2 S2: 4 lines, 2 templates -> 1 - 2/4 = 0.5.
        let mut engine = DrainEngine::new(CreateEngineOptions::default());
        engine.add_line("INFO Starting server");
        engine.add_line("INFO Starting server");
        engine.add_line("ERROR Connection failed");
        engine.add_line("ERROR Connection failed");
        let result = assemble(&engine, 50, None);
        assert_eq!(result.stats.compression_ratio, 0.5);
    }

    #[test]
    fn all_identical_input_approaches_full_compression() {
        // spec.md §8 boundary: N identical lines, one cluster ->
        // compression_ratio >= (N-1)/N.
        let mut engine = DrainEngine::new(CreateEngineOptions::default());
        for _ in 0..5 {
            engine.add_line("heartbeat ok");
        }
        let result = assemble(&engine, 50, None);
        assert_eq!(result.stats.unique_templates, 1);
        assert!(result.stats.compression_ratio >= 4.0 / 5.0);
    }

    #[test]
    fn result_carries_stable_version_field() {
        let engine = DrainEngine::new(CreateEngineOptions::default());
        let result = assemble(&engine, 50, None);
        assert_eq!(result.version, "1.1");
    }
}
