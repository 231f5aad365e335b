//! The Drain clustering engine (spec.md §4.4, §4.5): owns the parse tree
//! and the cluster arena, and runs the per-line ingestion pipeline.

use crate::cluster::{LogCluster, SampleCapacities};
use crate::format::{self, OutputFormat};
use crate::patterns::WILDCARD;
use crate::progress::{ProgressCallback, ProgressReporter};
use crate::result::{self, EngineResult};
use crate::strategy::Strategy;
use crate::tree::{Tree, WILDCARD_KEY};

/// The numeric knobs of a Drain engine, independent of any runtime-only
/// behaviour (strategy overrides, progress callbacks). This is the part
/// of an engine's configuration a wrapper can load from TOML/JSON/CLI
/// flags (spec.md §6's options record).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DrainOptions {
    /// Maximum tree depth walked during search/creation, root inclusive.
    pub depth: usize,
    /// A candidate cluster must exceed this similarity to match.
    pub sim_threshold: f64,
    /// Above this many children, a node only grows its wildcard child.
    pub max_children: usize,
    /// Hard cap on the number of distinct clusters an engine will create.
    pub max_clusters: usize,
    /// Per-cluster capacity for captured variable-binding samples.
    pub max_samples: usize,
}

impl Default for DrainOptions {
    fn default() -> Self {
        Self {
            depth: 4,
            sim_threshold: 0.4,
            max_children: 100,
            max_clusters: 1000,
            max_samples: 3,
        }
    }
}

/// Full engine construction options: the serializable [`DrainOptions`] plus
/// the two runtime-only fields a wire format can't carry. `preprocessing`
/// and `on_progress` are always defaulted (empty) when this struct itself
/// is deserialized — set them programmatically after loading the rest.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CreateEngineOptions {
    pub drain: DrainOptions,
    #[serde(skip)]
    pub preprocessing: Strategy,
    #[serde(skip)]
    pub on_progress: Option<ProgressCallback>,
}

impl Default for CreateEngineOptions {
    fn default() -> Self {
        Self {
            drain: DrainOptions::default(),
            preprocessing: Strategy::default(),
            on_progress: None,
        }
    }
}

/// The key a token occupies at a given schedule level: level 1 is the
/// token-count string, level `k >= 2` is `tokens[k - 2]` (spec.md §4.5
/// step 4). Returns `None` once the schedule runs past the end of
/// `tokens` — the "natural end" terminal state.
fn level_key(level: usize, tokens: &[String]) -> Option<String> {
    if level == 1 {
        Some(tokens.len().to_string())
    } else {
        tokens.get(level - 2).cloned()
    }
}

/// Decide whether `token` becomes the wildcard child key at `node`
/// (spec.md §4.4's promotion rule). Applies only to content levels
/// (2 and above) — the token-count level is never promoted.
fn promote_key(node: &crate::tree::Node, token: &str, max_children: usize) -> String {
    if node.has_child(token) {
        token.to_string()
    } else if token == WILDCARD
        || token.chars().next().is_some_and(|c| c.is_ascii_digit())
        || (token.len() > 8 && token.chars().all(|c| c.is_ascii_hexdigit()))
        || (node.has_child(WILDCARD_KEY) && node.child_count() >= max_children)
    {
        WILDCARD_KEY.to_string()
    } else {
        token.to_string()
    }
}

/// Walk from `root` following the key schedule, trying each level's exact
/// key then the wildcard fallback. Returns `None` the moment a level has
/// neither (spec.md §4.5 step 4: "search fails — no match"); returns
/// `Some` early if the schedule naturally runs out of tokens before
/// `depth` is reached.
///
/// The loop runs levels `1..depth` (not `1..=depth`): level 1 is the
/// token-count key, so reaching `depth` total tree levels (root
/// inclusive) means visiting `depth - 1` keyed levels — the count level
/// plus `depth - 2` content-token levels. `depth` is "the tree level at
/// which cluster search occurs" (spec.md §4.5), i.e. the leaf itself,
/// not one past it.
fn descend_for_search<'a>(
    root: &'a crate::tree::Node,
    tokens: &[String],
    depth: usize,
) -> Option<&'a crate::tree::Node> {
    let mut node = root;
    for level in 1..depth {
        let Some(key) = level_key(level, tokens) else {
            break;
        };
        node = node
            .get_child(&key)
            .or_else(|| node.get_child(WILDCARD_KEY))?;
    }
    Some(node)
}

/// Walk from `root`, creating children as needed and applying the
/// promotion rule at every content level, and return the terminal node
/// where a new cluster should be appended. Uses the same `1..depth`
/// schedule as [`descend_for_search`] so a line created here is found by
/// the same search on a later, differently-worded match.
fn descend_and_create<'a>(
    root: &'a mut crate::tree::Node,
    tokens: &[String],
    depth: usize,
    max_children: usize,
) -> &'a mut crate::tree::Node {
    let mut node = root;
    for level in 1..depth {
        let key = match level {
            1 => tokens.len().to_string(),
            level => {
                let Some(token) = tokens.get(level - 2) else {
                    break;
                };
                promote_key(node, token, max_children)
            }
        };
        node = node.get_or_create_child(&key);
    }
    node
}

/// A running Drain engine: a parse tree plus the arena of clusters it
/// references by index (spec.md §9's arena design note).
pub struct DrainEngine {
    tree: Tree,
    clusters: Vec<LogCluster>,
    options: DrainOptions,
    strategy: Strategy,
    on_progress: Option<ProgressCallback>,
    sample_capacities: SampleCapacities,
    line_count: u64,
    next_cluster_id: u64,
}

impl DrainEngine {
    #[must_use]
    pub fn new(options: CreateEngineOptions) -> Self {
        let sample_capacities = SampleCapacities {
            variables: options.drain.max_samples,
            ..SampleCapacities::default()
        };
        Self {
            tree: Tree::new(),
            clusters: Vec::new(),
            options: options.drain,
            strategy: options.preprocessing,
            on_progress: options.on_progress,
            sample_capacities,
            line_count: 0,
            next_cluster_id: 0,
        }
    }

    /// Ingest one line (spec.md §4.5): assign it the next line index,
    /// skip it if blank after trimming, otherwise preprocess, tokenize,
    /// search the tree for a matching cluster, and either update+merge
    /// that cluster or create a new one.
    pub fn add_line(&mut self, line: &str) {
        let line_index = self.line_count;
        self.line_count += 1;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }

        let masked = self.strategy.preprocess(trimmed);
        let tokens = self.strategy.tokenize(&masked);
        if tokens.is_empty() {
            eprintln!("[logdrain] line {line_index} tokenised to nothing, skipping");
            return;
        }

        if let Some(node) = descend_for_search(self.tree.root(), &tokens, self.options.depth) {
            let threshold = self
                .options
                .sim_threshold
                .max(self.strategy.threshold(node.depth()));
            if let Some((idx, _)) = node.best_match(&tokens, threshold, &self.clusters) {
                self.clusters[idx].update(&tokens, line_index, trimmed);
                self.clusters[idx].merge(&tokens);
                return;
            }
        }

        if self.clusters.len() >= self.options.max_clusters {
            eprintln!(
                "[logdrain] max_clusters ({}) reached, dropping line {line_index}",
                self.options.max_clusters
            );
            return;
        }

        let id = format!("c{}", self.next_cluster_id);
        self.next_cluster_id += 1;
        let cluster = LogCluster::create(id, tokens.clone(), line_index, trimmed, &self.sample_capacities);
        let idx = self.clusters.len();
        self.clusters.push(cluster);

        let leaf = descend_and_create(
            self.tree.root_mut(),
            &tokens,
            self.options.depth,
            self.options.max_children,
        );
        leaf.add_cluster(idx);
    }

    /// Ingest a batch of lines, reporting progress through this engine's
    /// `on_progress` callback (spec.md §5), if one was set.
    pub fn add_lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<S> = lines.into_iter().collect();
        let reporter = ProgressReporter::new(self.on_progress.as_ref(), lines.len());
        reporter.start();
        for (index, line) in lines.iter().enumerate() {
            self.add_line(line.as_ref());
            reporter.tick(index);
        }
        reporter.finish();
    }

    #[must_use]
    pub fn clusters(&self) -> &[LogCluster] {
        &self.clusters
    }

    #[must_use]
    pub const fn line_count(&self) -> u64 {
        self.line_count
    }

    /// Assemble this engine's clusters into a result and render it in
    /// one shot (spec.md §6: `engine.get_result(format, max_templates)`).
    /// Does not consume the engine — more lines may be added afterwards.
    #[must_use]
    pub fn get_result(&self, output_format: OutputFormat, max_templates: usize) -> EngineResult {
        let assembled = result::assemble(self, max_templates, None);
        let formatted = format::render(&assembled, output_format);
        EngineResult {
            stats: assembled.stats,
            templates: assembled.templates,
            formatted,
        }
    }
}
