//! Semantic log-compression: mine Drain-style message templates out of a
//! stream of log lines, classify each template's severity, and harvest
//! bounded diagnostic samples (URLs, status codes, correlation ids,
//! durations) without having to re-read the raw lines afterwards.
//!
//! The pipeline is three layers, outside in:
//!
//! - [`compress`] / [`compress_text`]: one-shot entry points that build an
//!   engine, feed it every line, and render the requested output format.
//! - [`DrainEngine`]: the stateful clustering engine, for callers who want
//!   to stream lines in over time rather than hand over the whole input
//!   at once.
//! - [`patterns`], [`extract`], [`strategy`], [`cluster`], [`tree`]: the
//!   building blocks the engine is assembled from.

pub mod cluster;
pub mod engine;
pub mod extract;
pub mod format;
pub mod patterns;
pub mod progress;
pub mod result;
pub mod strategy;
pub mod tree;

pub use engine::{CreateEngineOptions, DrainEngine, DrainOptions};
pub use extract::Severity;
pub use format::OutputFormat;
pub use progress::{Phase, ProgressCallback, ProgressEvent};
pub use result::{CompressResult, EngineResult, Stats, TemplateRecord};
pub use strategy::{define_strategy, Strategy, StrategyOverrides};

/// Options for a one-shot [`compress`] / [`compress_text`] call: the
/// engine's construction options, which output format to render, and how
/// many templates to keep in that output (spec.md §6).
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompressOptions {
    pub engine: CreateEngineOptions,
    pub format: OutputFormat,
    pub max_templates: usize,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            engine: CreateEngineOptions::default(),
            format: OutputFormat::default(),
            max_templates: 50,
        }
    }
}

/// Build a fresh, empty engine from [`DrainOptions`], using the default
/// strategy and no progress callback (spec.md §6: `create_engine`). For
/// a custom strategy or progress callback, construct
/// [`CreateEngineOptions`] directly and call [`DrainEngine::new`].
#[must_use]
pub fn create_engine(drain: DrainOptions) -> DrainEngine {
    DrainEngine::new(CreateEngineOptions {
        drain,
        ..CreateEngineOptions::default()
    })
}

/// Feed every line in `lines` through a freshly built engine and render
/// the result in `options.format`, truncated to `options.max_templates`
/// templates.
#[must_use]
pub fn compress<I, S>(lines: I, options: CompressOptions) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let started = std::time::Instant::now();
    let mut engine = DrainEngine::new(options.engine);
    engine.add_lines(lines);
    #[allow(clippy::cast_possible_truncation)]
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let result = result::assemble(&engine, options.max_templates, Some(elapsed_ms));
    format::render(&result, options.format)
}

/// Split `text` into lines on `\n` (tolerating a trailing `\r`, so `\r\n`
/// works too) and [`compress`] them.
#[must_use]
pub fn compress_text(text: &str, options: CompressOptions) -> String {
    compress(text.lines(), options)
}
