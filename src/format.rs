//! Rendering a [`crate::result::CompressResult`] into one of the three
//! output formats spec.md §4.6 defines.

use crate::result::CompressResult;

/// Which of the three output shapes [`render`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Summary,
    Detailed,
    Json,
    /// Same fields as `Json`, but with object keys sorted and no
    /// insignificant whitespace — two independent runs over the same
    /// input produce byte-identical output (spec.md §4.6, §9).
    StableJson,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Summary
    }
}

#[must_use]
pub fn render(result: &CompressResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Summary => render_summary(result),
        OutputFormat::Detailed => render_detailed(result),
        OutputFormat::Json => render_json(result),
        OutputFormat::StableJson => render_stable_json(result),
    }
}

const NO_TEMPLATES: &str = "No templates discovered.\n";

/// Up to the top 20 templates as `N. [Mx] pattern`, a `... and K more
/// templates` trailer if the (already `max_templates`-truncated) list
/// runs past 20, and a trailing "rare events" block listing templates
/// with `occurrences <= 5` (up to 5 shown) — spec.md §4.6.
fn render_summary(result: &CompressResult) -> String {
    if result.stats.unique_templates == 0 {
        return NO_TEMPLATES.to_string();
    }

    let mut out = String::new();
    out.push_str("Log Compression Summary\n");
    out.push_str(&format!(
        "{} input lines, {} templates, {:.1}% estimated token reduction\n\n",
        comma_grouped(result.stats.input_lines),
        result.stats.unique_templates,
        result.stats.estimated_token_reduction * 100.0,
    ));

    let top20: Vec<_> = result.templates.iter().take(20).collect();
    for (index, template) in top20.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}x] {}\n",
            index + 1,
            comma_grouped(template.occurrences),
            template.pattern
        ));
    }
    let remaining = result.templates.len().saturating_sub(top20.len());
    if remaining > 0 {
        out.push_str(&format!("... and {remaining} more templates\n"));
    }

    let rare: Vec<_> = result
        .templates
        .iter()
        .filter(|t| t.occurrences <= 5)
        .take(5)
        .collect();
    if !rare.is_empty() {
        out.push_str("\nRare events:\n");
        for template in rare {
            out.push_str(&format!("  [{}x] {}\n", template.occurrences, template.pattern));
        }
    }
    out
}

/// Per template: id, occurrence count, pattern, severity (with
/// `(stack frame)` appended when set), 1-indexed first/last line
/// numbers, and — only when non-empty — full URLs, status codes,
/// correlation ids, durations, sample variables (spec.md §4.6).
fn render_detailed(result: &CompressResult) -> String {
    if result.stats.unique_templates == 0 {
        return NO_TEMPLATES.to_string();
    }

    let mut out = String::new();
    out.push_str("Detailed Template Report\n");
    for template in &result.templates {
        out.push_str(&format!("\n[{}]\n", template.id));
        out.push_str(&format!("  Occurrences: {}\n", comma_grouped(template.occurrences)));
        out.push_str(&format!("  Pattern: {}\n", template.pattern));
        let severity = if template.is_stack_frame {
            format!("{} (stack frame)", template.severity.as_str())
        } else {
            template.severity.as_str().to_string()
        };
        out.push_str(&format!("  Severity: {severity}\n"));
        out.push_str(&format!(
            "  Lines: {}-{}\n",
            template.first_seen + 1,
            template.last_seen + 1
        ));
        write_sample_line(&mut out, "Full URLs", &template.full_url_samples);
        write_sample_line(&mut out, "Status codes", &template.status_code_samples);
        write_sample_line(&mut out, "Correlation IDs", &template.correlation_id_samples);
        write_sample_line(&mut out, "Durations", &template.duration_samples);
        write_sample_line(&mut out, "Sample variables", &template.samples);
    }
    out
}

fn write_sample_line<T: std::fmt::Debug>(out: &mut String, label: &str, samples: &[T]) {
    if !samples.is_empty() {
        out.push_str(&format!("  {label}: {samples:?}\n"));
    }
}

/// Group a non-negative integer's digits with commas, e.g. `12345` →
/// `"12,345"` (spec.md §4.6: occurrence counts are "comma-grouped").
fn comma_grouped(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().rev().enumerate() {
        if index > 0 && index % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped.chars().rev().collect()
}

/// Round `value` to 3 decimal places (spec.md §4.6: "Stats floats are
/// rounded to three decimals").
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn rounded_stats(result: &CompressResult) -> CompressResult {
    let mut rounded = result.clone();
    rounded.stats.compression_ratio = round3(rounded.stats.compression_ratio);
    rounded.stats.estimated_token_reduction = round3(rounded.stats.estimated_token_reduction);
    rounded
}

/// Serializing the struct directly walks its fields in declaration
/// order — unlike [`render_stable_json`], this is readable but not a
/// byte-stability guarantee.
fn render_json(result: &CompressResult) -> String {
    serde_json::to_string(&rounded_stats(result)).unwrap_or_default()
}

/// Round-trips through [`serde_json::Value`] before serializing.
/// `serde_json::Map` is backed by a `BTreeMap` unless the crate's
/// `preserve_order` feature is enabled (it isn't here), so converting to
/// `Value` sorts every object's keys for free — giving the
/// deterministic, byte-stable output spec.md §4.6 calls `stable_json`.
fn render_stable_json(result: &CompressResult) -> String {
    match serde_json::to_value(rounded_stats(result)) {
        Ok(value) => serde_json::to_string(&value).unwrap_or_default(),
        Err(_) => String::new(),
    }
}
