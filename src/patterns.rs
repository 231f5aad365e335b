//! Ordered catalogue of variable-shaped regex patterns used to mask a raw
//! log line before tokenisation, plus the wildcard marker they all emit.
//!
//! Order matters: earlier replacements hide substrings from later patterns
//! (an IPv6 address masked first can't later be mis-read as a run of bare
//! numbers). See spec.md §4.1 for the canonical catalogue and §9's design
//! note on why this order is part of the observable contract.

use std::sync::OnceLock;

use regex::Regex;

/// The sentinel token that replaces every masked variable-shaped substring.
pub const WILDCARD: &str = "<*>";

/// One named entry in the pattern catalogue.
///
/// `replacement` is almost always the bare [`WILDCARD`]. The one exception
/// is `abs_file_path`, whose regex captures the non-slash boundary
/// character (or start-of-string) in front of the path so that masking a
/// path doesn't also eat the whitespace separating it from its neighbours;
/// that pattern's replacement is `"$1<*>"` to put the boundary back.
fn compiled(name: &str, pattern: &str) -> Pattern {
    compiled_with_replacement(name, pattern, WILDCARD)
}

fn compiled_with_replacement(name: &str, pattern: &str, replacement: &'static str) -> Pattern {
    // Built-in patterns are hand-verified at compile time; a constant regex
    // failing to compile is a bug in this module, not bad input.
    #[allow(clippy::expect_used)]
    let regex = Regex::new(pattern).expect("built-in pattern must compile");
    Pattern {
        name: name.to_string(),
        regex,
        replacement,
    }
}

pub struct Pattern {
    pub name: String,
    pub regex: Regex,
    replacement: &'static str,
}

impl Pattern {
    /// Build a pattern from a caller-supplied, already-compiled regex
    /// (used by `define_strategy`'s custom pattern overrides). Always
    /// replaces a match with the bare [`WILDCARD`]. Takes the name as
    /// owned `String` so a per-request strategy built from caller-supplied
    /// pattern names never has to leak memory to satisfy a `'static`
    /// bound (mirrors `tokf_filter::filter::compile_patterns`, which also
    /// keeps its patterns as owned data).
    pub(crate) fn from_compiled(name: String, regex: Regex) -> Self {
        Self {
            name,
            regex,
            replacement: WILDCARD,
        }
    }
}

/// Build the default catalogue in the exact order spec.md §4.1 requires.
fn build_default_catalogue() -> Vec<Pattern> {
    vec![
        compiled(
            "iso_timestamp",
            r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?",
        ),
        compiled("unix_timestamp", r"\b\d{10,13}\b"),
        compiled(
            "uuid",
            r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
        ),
        compiled(
            "ipv6",
            r"(?i)\b(?:[0-9a-f]{1,4}:){2,7}(?:[0-9a-f]{1,4}|:)\b|::1\b|\B::\B",
        ),
        compiled(
            "ipv4",
            r"\b(?:\d{1,3}\.){3}\d{1,3}\b",
        ),
        compiled("hex_prefixed", r"0x[0-9a-fA-F]+"),
        compiled("hex_bare_long", r"\b[0-9a-fA-F]{9,}\b"),
        compiled("hdfs_block_id", r"blk_-?\d+"),
        compiled_with_replacement(
            "abs_file_path",
            r"(^|[^:/\w])(?:/[\w.\-]+){2,}",
            "$1<*>",
        ),
        compiled("url", r#"https?://[^\s'"]+"#),
        compiled(
            "numeric_with_unit",
            r"\b\d+(?:\.\d+)?(?:ns|µs|us|ms|s|sec|min|h|hr)\b",
        ),
        compiled("bare_integer", r"\b\d+\b"),
    ]
}

static DEFAULT_CATALOGUE: OnceLock<Vec<Pattern>> = OnceLock::new();

/// The built-in pattern catalogue, compiled once on first use and shared by
/// every default [`crate::strategy::Strategy`] for the lifetime of the
/// process (spec.md §5: "Regex patterns are compiled once at library
/// initialisation").
pub fn default_catalogue() -> &'static [Pattern] {
    DEFAULT_CATALOGUE.get_or_init(build_default_catalogue)
}

/// Apply a catalogue of patterns to `line` in order, replacing every match
/// with [`WILDCARD`]. Never empties a line that had non-whitespace content,
/// per spec.md §4.2's `preprocess` contract (the worst case is a line that
/// becomes entirely wildcards, which is still non-empty).
pub fn mask(line: &str, catalogue: &[Pattern]) -> String {
    let mut masked = line.to_string();
    for pattern in catalogue {
        if pattern.regex.is_match(&masked) {
            masked = pattern
                .regex
                .replace_all(&masked, pattern.replacement)
                .into_owned();
        }
    }
    masked
}
