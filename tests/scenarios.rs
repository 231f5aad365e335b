#![allow(clippy::unwrap_used, clippy::expect_used)]

use logdrain::{
    compress, create_engine, CompressOptions, DrainOptions, OutputFormat,
};

fn unique_templates(lines: &[&str], options: CompressOptions) -> serde_json::Value {
    let out = compress(
        lines.iter().copied(),
        CompressOptions {
            format: OutputFormat::Json,
            ..options
        },
    );
    serde_json::from_str(&out).expect("valid json")
}

/// S1: three variable-IP lines collapse to one template; these IPs
/// aren't URLs, so `url_samples` stays empty.
#[test]
fn s1_variable_ip_lines_collapse_to_one_template() {
    let lines = [
        "Connection from 192.168.1.1 established",
        "Connection from 192.168.1.2 established",
        "Connection from 10.0.0.1 established",
    ];
    let value = unique_templates(&lines, CompressOptions::default());
    let templates = value["templates"].as_array().unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0]["pattern"], "Connection from <*> established");
    assert_eq!(templates[0]["occurrences"], 3);
    assert_eq!(templates[0]["severity"], "info");
    assert!(templates[0]["url_samples"].as_array().unwrap().is_empty());
}

/// S2: two severities stay in separate clusters with a 50% compression
/// ratio (`1 - unique_templates/input_lines` = `1 - 2/4`).
#[test]
fn s2_two_severities_produce_two_templates_and_half_compression() {
    let lines = [
        "INFO Starting server",
        "INFO Starting server",
        "ERROR Connection failed",
        "ERROR Connection failed",
    ];
    let value = unique_templates(&lines, CompressOptions::default());
    let templates = value["templates"].as_array().unwrap();
    assert_eq!(templates.len(), 2);
    for template in templates {
        assert_eq!(template["occurrences"], 2);
    }
    let severities: Vec<&str> = templates.iter().map(|t| t["severity"].as_str().unwrap()).collect();
    assert!(severities.contains(&"info"));
    assert!(severities.contains(&"error"));
    assert_eq!(value["stats"]["compression_ratio"], 0.5);
}

/// S3: an HDFS block id is masked, so the template doesn't end with the
/// literal block id.
#[test]
fn s3_hdfs_block_id_is_masked() {
    let lines = ["Received block blk_-1234567890123456789"];
    let value = unique_templates(&lines, CompressOptions::default());
    let templates = value["templates"].as_array().unwrap();
    let pattern = templates[0]["pattern"].as_str().unwrap();
    assert!(pattern.ends_with("<*>"));
    assert!(!pattern.contains("blk_-1234567890123456789"));
}

/// S4: `max_clusters` caps cluster creation without raising, and every
/// line is still counted.
#[test]
fn s4_max_clusters_enforced_without_error() {
    let lines = [
        "shape one alpha",
        "shape two beta gamma",
        "shape three delta epsilon zeta",
        "shape four",
        "shape five eta theta iota kappa",
    ];
    let options = CompressOptions {
        engine: logdrain::CreateEngineOptions {
            drain: DrainOptions {
                max_clusters: 3,
                ..DrainOptions::default()
            },
            ..logdrain::CreateEngineOptions::default()
        },
        ..CompressOptions::default()
    };
    let value = unique_templates(&lines, options);
    assert!(value["stats"]["unique_templates"].as_u64().unwrap() <= 3);
    assert_eq!(value["stats"]["input_lines"], 5);
}

/// S5: both routes (update+merge, and no-match create via the wildcard
/// fallback) converge on the same generalised template.
#[test]
fn s5_wildcard_fallback_generalises_second_token() {
    let lines = ["INFO user alice logged in", "INFO user bob logged in"];
    let value = unique_templates(&lines, CompressOptions::default());
    let templates = value["templates"].as_array().unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0]["pattern"], "INFO user <*> logged in");
}

/// S6: two independent engines fed the same lines produce byte-identical
/// stable JSON output.
#[test]
fn s6_stable_json_is_byte_identical_across_independent_engines() {
    let lines = [
        "Connection from 192.168.1.1 established",
        "ERROR disk full on /dev/sda1",
        "Connection from 10.0.0.9 established",
    ];
    let mut first = create_engine(DrainOptions::default());
    let mut second = create_engine(DrainOptions::default());
    first.add_lines(lines);
    second.add_lines(lines);
    let a = first.get_result(OutputFormat::StableJson, 50).formatted;
    let b = second.get_result(OutputFormat::StableJson, 50).formatted;
    assert_eq!(a, b);
}

/// Universal invariant (spec.md §8 #1, #2): bounds on `unique_templates`
/// and on each cluster's line-index range.
#[test]
fn invariant_unique_templates_bounded_by_lines_and_cap() {
    let lines = [
        "alpha one", "beta two", "gamma three", "delta four", "epsilon five",
    ];
    let options = CompressOptions {
        engine: logdrain::CreateEngineOptions {
            drain: DrainOptions {
                max_clusters: 2,
                ..DrainOptions::default()
            },
            ..logdrain::CreateEngineOptions::default()
        },
        ..CompressOptions::default()
    };
    let value = unique_templates(&lines, options);
    let unique = value["stats"]["unique_templates"].as_u64().unwrap();
    let input_lines = value["stats"]["input_lines"].as_u64().unwrap();
    assert!(unique <= input_lines.min(2));
    for template in value["templates"].as_array().unwrap() {
        let first = template["first_seen"].as_u64().unwrap();
        let last = template["last_seen"].as_u64().unwrap();
        assert!(first <= last);
        assert!(last < input_lines);
    }
}

/// Boundary (spec.md §8): empty input yields zeroed stats and the
/// "No templates discovered." message in text formats.
#[test]
fn boundary_empty_input() {
    let lines: Vec<&str> = vec![];
    let summary = compress(lines.clone(), CompressOptions::default());
    assert_eq!(summary, "No templates discovered.\n");

    let value = unique_templates(&lines, CompressOptions::default());
    assert_eq!(value["stats"]["input_lines"], 0);
    assert_eq!(value["stats"]["unique_templates"], 0);
    assert_eq!(value["stats"]["compression_ratio"], 0.0);
    assert_eq!(value["stats"]["estimated_token_reduction"], 0.0);
}

/// Boundary: N identical lines produce exactly one cluster whose count
/// is N and whose compression ratio is at least `(N-1)/N`.
#[test]
fn boundary_all_identical_input() {
    let lines = ["heartbeat ok"; 6];
    let value = unique_templates(&lines, CompressOptions::default());
    let templates = value["templates"].as_array().unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0]["occurrences"], 6);
    assert_eq!(templates[0]["pattern"], "heartbeat ok");
    let ratio = value["stats"]["compression_ratio"].as_f64().unwrap();
    assert!(ratio >= 5.0 / 6.0 - 1e-9);
}

/// Boundary: `max_clusters == 1` with diverse input collapses everything
/// into the single surviving cluster, without ever raising.
#[test]
fn boundary_single_cluster_cap_with_diverse_input() {
    let lines = ["alpha one two", "totally different shape entirely", "third kind of line"];
    let options = CompressOptions {
        engine: logdrain::CreateEngineOptions {
            drain: DrainOptions {
                max_clusters: 1,
                ..DrainOptions::default()
            },
            ..logdrain::CreateEngineOptions::default()
        },
        ..CompressOptions::default()
    };
    let value = unique_templates(&lines, options);
    assert_eq!(value["templates"].as_array().unwrap().len(), 1);
    assert_eq!(value["stats"]["input_lines"], 3);
}

/// Preprocessing is idempotent on its own output (spec.md §8): feeding
/// an already-masked line back through the default strategy is a no-op.
#[test]
fn preprocessing_is_idempotent() {
    let strategy = logdrain::strategy::Strategy::default();
    let once = strategy.preprocess("Connection from 192.168.1.1 established at 10:00:00");
    let twice = strategy.preprocess(&once);
    assert_eq!(once, twice);
}

/// `define_strategy` lets a caller append a domain-specific pattern
/// without losing the built-in catalogue.
#[test]
fn custom_strategy_pattern_masks_alongside_builtins() {
    let strategy = logdrain::define_strategy(logdrain::StrategyOverrides {
        patterns: vec![("account_id".to_string(), r"ACC-\d{6}".to_string())],
        ..logdrain::StrategyOverrides::default()
    });
    let masked = strategy.preprocess("Charged ACC-123456 at 192.168.1.1");
    assert!(!masked.contains("ACC-123456"));
    assert!(!masked.contains("192.168.1.1"));
}
