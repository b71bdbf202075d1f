//! Integration tests for dag rendering and pipeline tracking
//!
//! These tests drive the public API end to end: JSON export in, DOT out;
//! pipeline state through suspend/resume; documents served from disk.

use flowviz_rs::dag::{DagExport, DepthChange, FlowError, Pipeline, PipelineError};
use flowviz_rs::viz::{
    describe_flow, list_requests, make_dot_graph, request_trace, DirectorySource, DotGenerator,
    FlowSource, RenderStyle,
};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;

// ============================================================================
// Fixtures
// ============================================================================

fn func(name: &str) -> Value {
    json!({"IsFunction": true, "Name": name})
}

/// upload -> (sub-dag: resize, store) -> check {ok: notify, fail: alert}
///                                     -> each (foreach: thumb)
static FLOW: Lazy<String> = Lazy::new(|| {
    json!({
        "Id": "0",
        "StartNode": "upload",
        "Nodes": {
            "upload": {
                "Id": "upload", "Index": 1,
                "Operations": [func("upload"), {"IsCallback": false, "Name": ""}],
                "Childrens": ["process"]
            },
            "process": {
                "Id": "process", "Index": 2,
                "Childrens": ["check", "each"],
                "SubDag": {
                    "Id": "2",
                    "StartNode": "resize",
                    "Nodes": {
                        "resize": {"Id": "resize", "Index": 1, "Operations": [func("resize")],
                                   "Childrens": ["store"]},
                        "store": {"Id": "store", "Index": 2,
                                  "Operations": [{"IsCallback": true, "Name": "store"}]}
                    }
                }
            },
            "check": {
                "Id": "check", "Index": 3, "IsDynamic": true, "IsCondition": true,
                "ConditionalDags": {
                    "ok": {"Id": "3-ok", "StartNode": "notify",
                           "Nodes": {"notify": {"Id": "notify", "Index": 1,
                                                "Operations": [func("notify")]}}},
                    "fail": {"Id": "3-fail", "StartNode": "alert",
                             "Nodes": {"alert": {"Id": "alert", "Index": 1,
                                                 "Operations": [func("alert")]}}}
                }
            },
            "each": {
                "Id": "each", "Index": 4, "IsDynamic": true, "IsForeach": true,
                "SubDag": {"Id": "4", "StartNode": "thumb",
                           "Nodes": {"thumb": {"Id": "thumb", "Index": 1,
                                               "Operations": [func("thumb")]}}}
            }
        }
    })
    .to_string()
});

// ============================================================================
// Rendering Tests
// ============================================================================

#[test]
fn test_render_full_flow() {
    let doc = make_dot_graph(&FLOW).unwrap();

    assert!(doc.starts_with("digraph depgraph {\n"));
    assert!(doc.ends_with("}\n"));

    // operation chain with a trailing modifier
    assert!(doc.contains("\"1.1-func-upload\" -> \"1.2-modifier\""));
    // children edge into the static sub-dag lands on its first operation
    assert!(doc.contains("\"1.2-modifier\" -> \"2.1.1-func-resize\""));
    assert!(doc.contains("\"2.1.1-func-resize\" -> \"2.2.1-callback-store\""));
    // sub-dag contribution fans out to both dynamic nodes
    assert!(doc.contains("\"2.2.1-callback-store\" -> \"3.0-conditions\""));
    assert!(doc.contains("\"2.2.1-callback-store\" -> \"4.0-foreach\""));

    // conditional branches
    assert!(doc.contains("\"3.0-conditions\" -> \"3-ok.1.1-func-notify\" [label=\"ok\""));
    assert!(doc.contains("\"3.0-conditions\" -> \"3-fail.1.1-func-alert\" [label=\"fail\""));
    assert!(doc.contains("\"3-ok.1.1-func-notify\" -> \"3.0-end\""));
    assert!(doc.contains("\"3-fail.1.1-func-alert\" -> \"3.0-end\""));

    // foreach
    assert!(doc.contains("\"4.0-foreach\" -> \"4.1.1-func-thumb\""));
    assert!(doc.contains("\"4.1.1-func-thumb\" -> \"4.0-end\""));
}

#[test]
fn test_every_vertex_declared_once() {
    let doc = make_dot_graph(&FLOW).unwrap();
    for key in [
        "1.1-func-upload",
        "2.1.1-func-resize",
        "3.0-conditions",
        "3.0-end",
        "4.0-foreach",
        "4.0-end",
        "4.1.1-func-thumb",
    ] {
        let declaration = format!("\"{}\" [shape=", key);
        assert_eq!(doc.matches(&declaration).count(), 1, "vertex {}", key);
    }
}

#[test]
fn test_cluster_names_are_unique() {
    let doc = make_dot_graph(&FLOW).unwrap();
    let names: Vec<&str> = doc
        .lines()
        .filter_map(|line| line.trim().strip_prefix("subgraph "))
        .collect();
    let mut unique = names.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(names.len(), unique.len());
    // upload, process, resize, store, ok, notify, fail, alert, thumb
    assert_eq!(names.len(), 9);
}

#[test]
fn test_render_is_deterministic() {
    let generator = DotGenerator::default();
    let first = generator.generate_from_json(&FLOW).unwrap();
    let second = generator.generate_from_slice(FLOW.as_bytes()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_style_file_changes_palette() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("style.yaml");
    fs::write(
        &path,
        "dynamic_end:\n  shape: doublecircle\n  style: filled\n  color: white\n",
    )
    .unwrap();

    let style = RenderStyle::from_yaml_file(&path).unwrap();
    let doc = DotGenerator::new(style).generate_from_json(&FLOW).unwrap();
    assert!(doc.contains("\"3.0-end\" [shape=doublecircle style=filled color=white];"));
    assert!(doc.contains("\"1.1-func-upload\" [shape=rectangle"));
}

#[test]
fn test_invalid_documents_are_rejected() {
    assert!(matches!(make_dot_graph("[]"), Err(FlowError::Decode(_))));

    let cyclic_only = json!({
        "Id": "0", "StartNode": "a",
        "Nodes": {
            "a": {"Id": "a", "Index": 1, "Operations": [func("f")], "Childrens": ["b"]},
            "b": {"Id": "b", "Index": 2, "Operations": [func("g")], "Childrens": ["a"]}
        }
    })
    .to_string();
    assert!(matches!(
        make_dot_graph(&cyclic_only),
        Err(FlowError::Structure(_))
    ));
}

// ============================================================================
// Pipeline Tests
// ============================================================================

fn pipeline() -> Pipeline {
    Pipeline::new(DagExport::from_json(&FLOW).unwrap().into_dag().unwrap())
}

#[test]
fn test_pipeline_walks_nested_dags() {
    let mut p = pipeline();
    assert_eq!(p.initial_node_id(), "upload");
    assert_eq!(p.count_nodes(), 4);

    p.update_execution_position(DepthChange::Same, "process").unwrap();
    p.update_execution_position(DepthChange::Increment, "store").unwrap();
    let (node, dag) = p.current_node_dag().unwrap();
    assert_eq!((node.id(), dag.id()), ("store", "2"));

    p.update_execution_position(DepthChange::Decrement, "check").unwrap();
    p.set_dynamic_option("0_check", "fail");
    p.update_execution_position(DepthChange::Increment, "alert").unwrap();
    let (node, dag) = p.current_node_dag().unwrap();
    assert_eq!((node.unique_id(), dag.id()), ("3-fail_alert", "3-fail"));
}

#[test]
fn test_pipeline_state_survives_suspend_resume() {
    let mut p = pipeline();
    p.update_execution_position(DepthChange::Same, "each").unwrap();
    p.update_execution_position(DepthChange::Increment, "thumb").unwrap();
    p.set_all_dynamic_options("0_each", vec!["a".into(), "b".into()]);
    p.set_dynamic_dependency_count("0_each", 2);

    let saved = p.get_state().unwrap();

    let mut resumed = pipeline();
    resumed.apply_state(&saved).unwrap();
    assert_eq!(resumed.state(), p.state());
    assert_eq!(resumed.current_node_dag().unwrap().0.id(), "thumb");
    assert_eq!(resumed.resolve_dynamic_dependency("0_each").unwrap(), 1);
    assert_eq!(resumed.resolve_dynamic_dependency("0_each").unwrap(), 0);
    assert_eq!(
        resumed.all_dynamic_options("0_each"),
        Some(&["a".to_string(), "b".to_string()][..])
    );
}

#[test]
fn test_pipeline_unchosen_branch_is_an_error() {
    let mut p = pipeline();
    p.update_execution_position(DepthChange::Same, "check").unwrap();
    p.update_execution_position(DepthChange::Increment, "notify").unwrap();
    assert_eq!(
        p.current_node_dag().unwrap_err(),
        PipelineError::MissingDynamicOption {
            node: "0_check".to_string()
        }
    );
}

#[test]
fn test_all_node_unique_ids() {
    let ids = pipeline().all_node_unique_ids();
    assert_eq!(
        ids,
        vec![
            "0_upload",
            "0_process",
            "2_resize",
            "2_store",
            "0_check",
            "3-fail_alert",
            "3-ok_notify",
            "0_each",
            "4_thumb",
        ]
    );
}

// ============================================================================
// Source Tests
// ============================================================================

#[tokio::test]
async fn test_directory_source_end_to_end() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("dags")).unwrap();
    fs::create_dir_all(root.join("requests")).unwrap();
    fs::create_dir_all(root.join("traces")).unwrap();

    fs::write(
        root.join("functions.json"),
        json!([{"name": "media", "image": "media:latest", "replicas": 1,
                "labels": {"faas-flow": "1"}}])
        .to_string(),
    )
    .unwrap();
    fs::write(root.join("dags/media.json"), FLOW.as_str()).unwrap();

    let spans = json!([
        {"traceID": "abc", "spanID": "abc", "operationName": "req-42",
         "startTime": 100, "duration": 50},
        {"traceID": "abc", "spanID": "s1", "operationName": "upload",
         "startTime": 110, "duration": 10},
        {"traceID": "abc", "spanID": "s2", "operationName": "resize",
         "startTime": 125, "duration": 30}
    ]);
    let traces = json!({"data": [{"traceID": "abc", "spans": spans}]}).to_string();
    fs::write(root.join("requests/media.json"), &traces).unwrap();
    fs::write(root.join("traces/abc.json"), &traces).unwrap();

    let source = DirectorySource::new(root);

    let desc = describe_flow(&source, &DotGenerator::default(), "media")
        .await
        .unwrap();
    assert_eq!(desc.image, "media:latest");
    assert!(desc.dot.unwrap().contains("\"3.0-conditions\""));

    let requests = list_requests(&source.requests("media").await.unwrap());
    assert_eq!(requests.get("req-42").map(String::as_str), Some("abc"));

    let trace = request_trace(&source.trace("abc").await.unwrap(), "abc").unwrap();
    assert_eq!(trace.request_id, "req-42");
    assert_eq!(trace.duration, 55);
    assert_eq!(trace.node_traces.len(), 2);

    let missing = describe_flow(&source, &DotGenerator::default(), "other").await;
    assert!(matches!(missing, Err(FlowError::FunctionNotFound(_))));
}
