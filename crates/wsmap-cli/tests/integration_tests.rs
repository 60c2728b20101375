//! End-to-end tests for the `wsmap` binary
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p wsmap-cli --test integration_tests
//! ```

mod fixtures;

use fixtures::{read_json, run_model_service, stdout, Project, DETECTOR_SCRIPT};
use pretty_assertions::assert_eq;

// =============================================================================
// Model service
// =============================================================================

#[test]
fn test_model_service_answers_on_stdout() {
    let output = run_model_service(r#"{"question": "How many walls?", "model_data": [{}, {}]}"#);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout(&output).trim(),
        "Received question: How many walls?. Number of model elements: 2."
    );
}

#[test]
fn test_model_service_malformed_request_exits_one() {
    let output = run_model_service("not json");

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stdout(&output).starts_with("Error:"),
        "unexpected stdout: {}",
        stdout(&output)
    );
}

// =============================================================================
// Query
// =============================================================================

#[cfg(unix)]
#[test]
fn test_query_sends_instance_names() {
    // A service that echoes the request back lets us see what was sent
    let project = Project::new(
        r#"
[model_service]
program = "sh"
args = ["-c", "cat"]
cache_file = "model_data.json"
"#,
    );

    let output = project.run(&["query", "--snapshot", "model.json", "Which walls?"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let request: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(request["question"], "Which walls?");
    assert_eq!(
        request["model_data"],
        serde_json::json!([
            {"Id": 1, "Category": "Walls", "Name": "Basic Wall"},
            {"Id": 2, "Category": "Walls", "Name": "Curtain Wall"}
        ])
    );

    let cache = read_json(&project.path("model_data.json"));
    assert_eq!(cache[0]["Name"], "Basic Wall");
}

// =============================================================================
// Feature detection
// =============================================================================

#[cfg(unix)]
#[test]
fn test_detect_annotates_point_clouds_in_snapshot() {
    let project = Project::new(
        r#"
[pipeline]
program = "sh"
args = ["detect.sh"]
working_dir = "."
"#,
    );
    project.write("detect.sh", DETECTOR_SCRIPT);

    let output = project.run(&[
        "detect",
        "--snapshot",
        "model.json",
        "--annotate",
        "feature_count",
        "--write",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let snapshot = project.snapshot();
    assert_eq!(snapshot["point_clouds"][0]["attributes"]["feature_count"]["value"], 2);
    assert_eq!(snapshot["elements"][0]["attributes"]["workset"]["value"], 0);
}
