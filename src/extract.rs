//! Diagnostic extractors that run over the **original, unmasked** line
//! (spec.md §4.1): severity classification, stack-frame detection, and the
//! five bounded sample extractors a [`crate::cluster::LogCluster`] keeps.
//!
//! Failure policy: these never fail. No match simply means an empty
//! sequence — there is no `Result` anywhere in this module.

use std::sync::OnceLock;

use regex::Regex;

/// Three-valued severity classification, set once per cluster from its
/// first matching line and never revised (spec.md §3, §4.3, §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

struct ExtractRegexes {
    error_words: Regex,
    warning_words: Regex,
    v8_frame: Regex,
    firefox_frame: Regex,
    chrome_devtools_frame: Regex,
    url: Regex,
    status_after_keyword: Regex,
    http_version: Regex,
    correlation_keyword: Regex,
    bare_uuid: Regex,
    duration: Regex,
}

#[allow(clippy::expect_used)]
fn build_regexes() -> ExtractRegexes {
    ExtractRegexes {
        error_words: Regex::new(r"ERROR|FATAL|(?i)Exception|(?i)Failed|TypeError|ReferenceError")
            .expect("built-in pattern must compile"),
        warning_words: Regex::new(r"WARN|(?i)Warning|(?i)Deprecated|\[Violation\]")
            .expect("built-in pattern must compile"),
        v8_frame: Regex::new(r"^\s*at [^ ]+ \([^)]+:\d+:\d+\)")
            .expect("built-in pattern must compile"),
        // No whitespace allowed before the `@`: a real frame name is one
        // token (`doWork`, `<anonymous>`, a dotted/slashed path), so a
        // prefix containing a space (e.g. "peer closed svc@db01:5432")
        // must not match.
        firefox_frame: Regex::new(r"^[\w.$<>/]*@[^\s:]+:\d+(:\d+)?$")
            .expect("built-in pattern must compile"),
        chrome_devtools_frame: Regex::new(r"^\(anonymous\) @ [^\s:]+:\d+")
            .expect("built-in pattern must compile"),
        url: Regex::new(r#"https?://[^\s'"]+"#).expect("built-in pattern must compile"),
        status_after_keyword: Regex::new(r"(?i)(?:\bstatus\b[=:]?|\bcode[=:])\s*(\d{3})\b")
            .expect("built-in pattern must compile"),
        http_version: Regex::new(r"HTTP/\d\.\d\s+(\d{3})").expect("built-in pattern must compile"),
        correlation_keyword: Regex::new(
            r"(?i)\b(?:trace-id|request-id|x-request-id|correlation-id)[:=]?\s*([\w-]+)",
        )
        .expect("built-in pattern must compile"),
        bare_uuid: Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
            .expect("built-in pattern must compile"),
        duration: Regex::new(r"\b\d+(?:\.\d+)?(?:ns|µs|us|ms|s|sec|min|h|hr)\b")
            .expect("built-in pattern must compile"),
    }
}

static REGEXES: OnceLock<ExtractRegexes> = OnceLock::new();

fn regexes() -> &'static ExtractRegexes {
    REGEXES.get_or_init(build_regexes)
}

/// `error` if any ERROR/FATAL/Exception/Failed/TypeError/ReferenceError
/// marker is present; else `warning` for WARN/Warning/Deprecated/
/// `[Violation]`; else `info`.
pub fn detect_severity(line: &str) -> Severity {
    let re = regexes();
    if re.error_words.is_match(line) {
        Severity::Error
    } else if re.warning_words.is_match(line) {
        Severity::Warning
    } else {
        Severity::Info
    }
}

/// True if `line` looks like a single stack-trace frame: a V8-style frame
/// (`at fn (file:line:col)`), a Firefox frame (`name@path:line`), or a
/// Chrome-devtools frame (`(anonymous) @ path:line`).
pub fn is_stack_frame(line: &str) -> bool {
    let re = regexes();
    re.v8_frame.is_match(line) || re.firefox_frame.is_match(line) || re.chrome_devtools_frame.is_match(line)
}

/// Deduplicated host components of every URL in `line`, in first-seen order.
pub fn extract_urls(line: &str) -> Vec<String> {
    let re = regexes();
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for m in re.url.find_iter(line) {
        if let Some(host) = url_host(m.as_str())
            && seen.insert(host.clone())
        {
            out.push(host);
        }
    }
    out
}

/// Deduplicated full URL strings in `line`, in first-seen order.
pub fn extract_full_urls(line: &str) -> Vec<String> {
    let re = regexes();
    dedup_in_order(re.url.find_iter(line).map(|m| m.as_str().to_string()))
}

/// Extract the host component from a URL, e.g. `https://api.example.com/v1`
/// → `api.example.com`.
fn url_host(url: &str) -> Option<String> {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let host = after_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(after_scheme);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Integers in the range 100-599 appearing after `status`, `HTTP/\d.\d`,
/// `code=`, or `code:`, deduplicated in first-seen order.
pub fn extract_status_codes(line: &str) -> Vec<String> {
    let re = regexes();
    let mut codes: Vec<String> = Vec::new();
    for caps in re.status_after_keyword.captures_iter(line) {
        push_if_valid_status(&mut codes, &caps[1]);
    }
    for caps in re.http_version.captures_iter(line) {
        push_if_valid_status(&mut codes, &caps[1]);
    }
    dedup_in_order(codes)
}

fn push_if_valid_status(codes: &mut Vec<String>, candidate: &str) {
    if let Ok(n) = candidate.parse::<u32>()
        && (100..=599).contains(&n)
    {
        codes.push(candidate.to_string());
    }
}

/// Values following `trace-id`, `request-id`, `x-request-id`, or
/// `correlation-id` (case-insensitive, optional `:`/`=`), plus any bare
/// UUID, deduplicated in first-seen order.
pub fn extract_correlation_ids(line: &str) -> Vec<String> {
    let re = regexes();
    let mut ids: Vec<String> = re
        .correlation_keyword
        .captures_iter(line)
        .map(|caps| caps[1].to_string())
        .collect();
    ids.extend(re.bare_uuid.find_iter(line).map(|m| m.as_str().to_string()));
    dedup_in_order(ids)
}

/// Numeric literals with a duration-unit suffix, deduplicated in
/// first-seen order.
pub fn extract_durations(line: &str) -> Vec<String> {
    let re = regexes();
    dedup_in_order(re.duration.find_iter(line).map(|m| m.as_str().to_string()))
}

fn dedup_in_order<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_error_takes_priority() {
        assert_eq!(detect_severity("ERROR and also WARN"), Severity::Error);
    }

    #[test]
    fn severity_warning_when_no_error() {
        assert_eq!(detect_severity("WARN: disk nearly full"), Severity::Warning);
    }

    #[test]
    fn severity_info_default() {
        assert_eq!(detect_severity("Starting server on port 8080"), Severity::Info);
    }

    #[test]
    fn severity_case_sensitive_for_all_caps() {
        // "error" lowercase is not the all-caps ERROR marker, and isn't one
        // of the case-insensitive mixed-case words either.
        assert_eq!(detect_severity("error: something"), Severity::Info);
    }

    #[test]
    fn detects_v8_stack_frame() {
        assert!(is_stack_frame("    at Object.<anonymous> (/app/index.js:10:5)"));
    }

    #[test]
    fn detects_firefox_stack_frame() {
        assert!(is_stack_frame("doWork@app.js:42:7"));
    }

    #[test]
    fn plain_line_is_not_a_stack_frame() {
        assert!(!is_stack_frame("Connection established"));
    }

    #[test]
    fn host_port_line_is_not_mistaken_for_a_firefox_frame() {
        assert!(!is_stack_frame("peer closed svc@db01:5432"));
    }

    #[test]
    fn extracts_url_host() {
        let hosts = extract_urls("fetching https://api.example.com/v1/items/42 now");
        assert_eq!(hosts, vec!["api.example.com"]);
    }

    #[test]
    fn extracts_full_url() {
        let urls = extract_full_urls("fetching https://api.example.com/v1/items/42 now");
        assert_eq!(urls, vec!["https://api.example.com/v1/items/42"]);
    }

    #[test]
    fn extracts_status_code_after_keyword() {
        assert_eq!(extract_status_codes("request failed status=503"), vec!["503"]);
    }

    #[test]
    fn extracts_status_code_from_http_version() {
        assert_eq!(extract_status_codes("HTTP/1.1 404 Not Found"), vec!["404"]);
    }

    #[test]
    fn rejects_out_of_range_status_code() {
        assert!(extract_status_codes("count=700").is_empty());
    }

    #[test]
    fn extracts_correlation_id() {
        assert_eq!(
            extract_correlation_ids("request-id: abc-123-xyz done"),
            vec!["abc-123-xyz"]
        );
    }

    #[test]
    fn extracts_bare_uuid_as_correlation_id() {
        let ids = extract_correlation_ids("trace 550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(ids, vec!["550e8400-e29b-41d4-a716-446655440000"]);
    }

    #[test]
    fn extracts_duration_literal() {
        assert_eq!(extract_durations("request took 120ms to complete"), vec!["120ms"]);
    }

    #[test]
    fn dedups_repeated_values_in_first_seen_order() {
        let ids = extract_correlation_ids("trace-id=abc trace-id=abc trace-id=def");
        assert_eq!(ids, vec!["abc", "def"]);
    }
}
