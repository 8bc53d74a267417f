use std::fs;
use std::sync::Arc;
use std::time::Instant;

use disease_network::documents::DocumentViewer;
use disease_network::engine::{EngineConfig, FilterProperty, FilterValue, Session};
use disease_network::export::{full_graph, payload_3d, pruned_graph, write_json};
use disease_network::network::load_graph;
use pretty_assertions::assert_eq;
use serde_json::Value;

const FIBROSIS: &str = include_str!("fixtures/fibrosis.json");

fn loaded() -> (tempfile::TempDir, Session) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fibrosis.json");
    fs::write(&path, FIBROSIS).unwrap();
    let model = Arc::new(load_graph(&path).unwrap());
    (dir, Session::new(model, EngineConfig::default()).unwrap())
}

fn read(path: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn full_export_reloads_into_an_identical_model() {
    let (dir, session) = loaded();
    let path = dir.path().join("full.json");
    write_json(&path, &full_graph(session.model())).unwrap();

    let reloaded = load_graph(&path).unwrap();
    assert_eq!(reloaded.nodes(), session.model().nodes());
    assert_eq!(reloaded.edges(), session.model().edges());
}

#[test]
fn exports_do_not_touch_the_session() {
    let (dir, mut session) = loaded();
    session
        .set_filter(FilterProperty::Document, &FilterValue::text("d4"), false, Instant::now())
        .unwrap();
    session.flush().unwrap();
    let before = session.pruned().clone();
    let revision = session.revision();

    let path = dir.path().join("pruned.json");
    write_json(&path, &pruned_graph(session.model(), session.pruned())).unwrap();
    write_json(&dir.path().join("full.json"), &full_graph(session.model())).unwrap();

    assert_eq!(session.pruned(), &before);
    assert_eq!(session.revision(), revision);

    let exported = read(&path);
    assert_eq!(exported["nodes"].as_array().unwrap().len(), 5);
    assert_eq!(exported["links"].as_array().unwrap().len(), 4);
    assert_eq!(exported["maxInstances"], 2);

    let e0 = exported["links"]
        .as_array()
        .unwrap()
        .iter()
        .find(|link| link["id"] == "e0")
        .unwrap();
    assert_eq!(e0["source"], "C0040690");
    assert_eq!(e0["width"], 5.0);
    assert_eq!(e0["displayType"], "Positive_regulation");
}

#[test]
fn payload_3d_uses_payload_indices_and_instance_counts() {
    let (dir, session) = loaded();
    let payload = payload_3d(session.pruned(), |node| [node.degree as f32, node.index as f32]);
    let path = dir.path().join("network-3d.json");
    write_json(&path, &payload).unwrap();

    let exported = read(&path);
    let nodes = exported["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 7);
    for node in nodes {
        for axis in ["x", "y", "z"] {
            let value = node[axis].as_f64().unwrap();
            assert!((0.04..=0.96).contains(&value), "{axis} = {value}");
        }
    }

    let first_edge = &exported["edges"][0];
    assert_eq!(first_edge["source"], 1);
    assert_eq!(first_edge["target"], 0);
    assert_eq!(first_edge["size"], 2);
    assert_eq!(first_edge["type"], "Positive_regulation");
}

#[test]
fn document_handoff_resolves_instance_references() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("d1.txt"),
        "TGF-beta promotes fibrosis and collagen deposition.",
    )
    .unwrap();
    fs::write(
        dir.path().join("d1.ann"),
        "T1\tGGPs 0 8\tTGF-beta\nT2\tPositive_regulation 9 17\tpromotes\nT3\tDisorder 18 26\tfibrosis\nE1\tPositive_regulation:T2 Theme:T3 Cause:T1\n",
    )
    .unwrap();

    let (_graph_dir, session) = loaded();
    let instance = &session.model().edges()[0].instances[0];
    let viewer = DocumentViewer::with_directory(Some(dir.path().to_path_buf()));

    let request = viewer.request(&instance.doc, &instance.brat_ids).unwrap();
    assert_eq!(request.doc, "d1");
    assert_eq!(request.highlights.len(), 1);
    assert_eq!(request.highlights[0].text, "promotes");

    let missing = &session.model().edges()[0].instances[1];
    assert_eq!(viewer.request(&missing.doc, &missing.brat_ids), None);
}
