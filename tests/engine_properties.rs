use std::sync::Arc;
use std::time::{Duration, Instant};

use disease_network::engine::{
    EngineConfig, EngineError, FilterBank, FilterProperty, FilterValue, PrunedGraph, ScaleMode,
    Session, recompute,
};
use disease_network::network::{Edge, GraphModel, Instance, Node, Regulation, parse_graph_document};
use pretty_assertions::assert_eq;

const FIBROSIS: &str = include_str!("fixtures/fibrosis.json");

fn fibrosis() -> Arc<GraphModel> {
    Arc::new(parse_graph_document(FIBROSIS).unwrap())
}

fn session() -> Session {
    Session::new(fibrosis(), EngineConfig::default()).unwrap()
}

fn doc(name: &str) -> FilterValue {
    FilterValue::text(name)
}

fn regulation(value: Regulation) -> FilterValue {
    FilterValue::Regulation(value)
}

fn ids(pruned: &PrunedGraph) -> (Vec<&str>, Vec<&str>) {
    (pruned.node_ids(), pruned.edge_ids())
}

#[test]
fn recompute_is_idempotent() {
    let mut session = session();
    let first = session.recompute().unwrap().clone();
    let second = session.recompute().unwrap().clone();
    assert_eq!(first, second);

    let model = fibrosis();
    let filters = FilterBank::from_model(&model);
    assert_eq!(recompute(&model, &filters, 1).unwrap(), recompute(&model, &filters, 1).unwrap());
}

#[test]
fn toggle_order_does_not_matter() {
    let now = Instant::now();

    let mut first = session();
    first.set_filter(FilterProperty::Document, &doc("d1"), false, now).unwrap();
    first
        .set_filter(FilterProperty::Regulation, &regulation(Regulation::Negative), false, now)
        .unwrap();
    first.set_filter(FilterProperty::Document, &doc("d1"), true, now).unwrap();
    first.flush().unwrap();

    let mut second = session();
    second
        .set_filter(FilterProperty::Regulation, &regulation(Regulation::Negative), false, now)
        .unwrap();
    second.set_filter(FilterProperty::Document, &doc("d1"), false, now).unwrap();
    second.set_filter(FilterProperty::Document, &doc("d1"), true, now).unwrap();
    second.flush().unwrap();

    assert_eq!(first.pruned(), second.pruned());

    let model = fibrosis();
    let mut filters = FilterBank::from_model(&model);
    filters
        .set_enabled(FilterProperty::Regulation, &regulation(Regulation::Negative), false)
        .unwrap();
    assert_eq!(first.pruned(), &recompute(&model, &filters, 1).unwrap());
}

#[test]
fn re_enabling_a_value_restores_the_previous_graph() {
    let mut session = session();
    let baseline = session.pruned().clone();
    let start = Instant::now();

    session.set_filter(FilterProperty::Document, &doc("d2"), false, start).unwrap();
    session.flush().unwrap();
    let (nodes, edges) = ids(session.pruned());
    assert!(!nodes.contains(&"C0024109"));
    assert!(!edges.contains(&"e3"));
    assert_eq!(session.pruned().edge_by_id("e0").unwrap().instance_count(), 1);

    session.set_filter(FilterProperty::Document, &doc("d2"), true, start).unwrap();
    session.flush().unwrap();
    assert_eq!(session.pruned(), &baseline);
}

#[test]
fn node_whose_only_edge_is_filtered_out_disappears() {
    let model = fibrosis();
    let mut filters = FilterBank::from_model(&model);
    filters
        .set_enabled(FilterProperty::Regulation, &regulation(Regulation::Neutral), false)
        .unwrap();

    let pruned = recompute(&model, &filters, 1).unwrap();
    assert!(pruned.node_by_id("C0024109").is_none());
    assert!(pruned.edge_by_id("e3").is_none());
    assert!(pruned.node_by_id("C0016059").is_some());
}

#[test]
fn small_components_are_pruned_by_size() {
    let model = fibrosis();
    let filters = FilterBank::from_model(&model);

    let everything = recompute(&model, &filters, 1).unwrap();
    assert_eq!(everything.nodes.len(), 7);

    let pruned = recompute(&model, &filters, 3).unwrap();
    assert_eq!(
        pruned.node_ids(),
        vec!["C0016059", "C0040690", "C0009325", "C0016030", "C0024109"]
    );
    assert!(pruned.edge_by_id("e4").is_none());
    assert_eq!(pruned.removed_nodes, 2);
}

#[test]
fn two_triangles_below_threshold_leave_nothing() {
    let node = |id: &str| {
        Node::new(id, id, "Cell").with_instances(vec![Instance::new("Cell", Regulation::Neutral, "d1")])
    };
    let edge = |id: &str, source, target| {
        Edge::new(id, source, target, vec![Instance::new("up", Regulation::Positive, "d1")])
    };
    let model = GraphModel::new(
        ["a", "b", "c", "x", "y", "z"].into_iter().map(node).collect(),
        vec![
            edge("ab", 0, 1),
            edge("bc", 1, 2),
            edge("ca", 2, 0),
            edge("xy", 3, 4),
            edge("yz", 4, 5),
            edge("zx", 5, 3),
        ],
    )
    .unwrap();

    let pruned = recompute(&model, &FilterBank::from_model(&model), 4).unwrap();
    assert!(pruned.nodes.is_empty());
    assert!(pruned.edges.is_empty());
}

#[test]
fn end_to_end_two_node_scenario() {
    let raw = r#"{
        "nodes": [{"id": "A", "entityType": "Disorder"}, {"id": "B", "entityType": "GGPs"}],
        "links": [{"source": "A", "target": "B", "instances": [
            {"type": "up", "regulation": 1, "doc": "d1"},
            {"type": "down", "regulation": -1, "doc": "d1"}
        ]}]
    }"#;
    let model = parse_graph_document(raw).unwrap();
    let pruned = recompute(&model, &FilterBank::from_model(&model), 1).unwrap();

    let edge = &pruned.edges[0];
    assert_eq!(edge.display_regulation, Regulation::Positive);
    assert_eq!(pruned.max_instances, 2);
    assert_eq!(pruned.scale_mode, Some(ScaleMode::Linear));
    assert_eq!(edge.width, 5.0);
    assert_eq!(pruned.node_ids(), vec!["A", "B"]);
}

#[test]
fn a_burst_of_toggles_runs_one_pass() {
    let mut session = session();
    let revision = session.revision();
    let start = Instant::now();

    for (offset, value) in ["d1", "d2", "d3"].into_iter().enumerate() {
        let at = start + Duration::from_millis(offset as u64 * 100);
        session.set_filter(FilterProperty::Document, &doc(value), false, at).unwrap();
        assert!(!session.poll(at).unwrap());
    }

    assert_eq!(
        session.time_until_due(start + Duration::from_millis(300)),
        Some(Duration::from_millis(150))
    );
    assert!(!session.poll(start + Duration::from_millis(449)).unwrap());
    assert!(session.poll(start + Duration::from_millis(450)).unwrap());
    assert_eq!(session.revision(), revision + 1);
    assert!(!session.poll(start + Duration::from_secs(5)).unwrap());

    assert_eq!(session.pruned().node_ids(), vec!["C0021760", "C0021368"]);
}

#[test]
fn live_counts_track_the_pruned_graph() {
    let mut session = session();
    let counts = |session: &Session| {
        let filter = session.filters().filter(FilterProperty::Document).unwrap();
        ["d1", "d2", "d3", "d4"].map(|name| filter.live_count(&doc(name)))
    };

    // edges: e0 d1+d2, e1 d1, e2 d3, e3 d2, e4 d4; nodes add one instance per incident doc
    assert_eq!(counts(&session), [2 + 3, 2 + 3, 1 + 2, 1 + 2]);

    session
        .set_min_component_size(3, Instant::now())
        .unwrap();
    session.flush().unwrap();
    assert_eq!(counts(&session)[3], 0);
}

#[test]
fn unknown_values_are_rejected() {
    let mut session = session();
    let error = session
        .set_filter(FilterProperty::Document, &doc("d99"), false, Instant::now())
        .unwrap_err();
    assert_eq!(
        error,
        EngineError::UnknownFilterValue {
            property: FilterProperty::Document,
            value: doc("d99"),
        }
    );
    assert!(!session.is_pending());
}
