use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::network::{GraphModel, Instance, Regulation};

use super::aggregate::aggregate;
use super::error::EngineError;
use super::filter::{FilterBank, FilterProperty, FilterValue};
use super::prune::ComponentPruner;
use super::scheduler::{DEFAULT_QUIET_WINDOW, RecomputeScheduler};
use super::width::{ScaleMode, WidthConfig, WidthScaler};
use super::working::WorkingGraph;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    pub width: WidthConfig,
    pub min_component_size: usize,
    pub quiet_window: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: WidthConfig::default(),
            min_component_size: 1,
            quiet_window: DEFAULT_QUIET_WINDOW,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrunedNode {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub entity_type: String,
    pub filtered_instances: Vec<usize>,
    pub display_type: String,
    pub display_doc: String,
    pub degree: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrunedEdge {
    pub index: usize,
    pub id: String,
    pub source: usize,
    pub target: usize,
    pub filtered_instances: Vec<usize>,
    pub display_regulation: Regulation,
    pub display_type: String,
    pub display_doc: String,
    pub width: f64,
}

impl PrunedEdge {
    pub fn instance_count(&self) -> usize {
        self.filtered_instances.len()
    }

    pub fn label(&self) -> String {
        let marker = self.display_regulation.marker();
        if marker.is_empty() {
            self.display_type.clone()
        } else {
            format!("{} {marker}", self.display_type)
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrunedGraph {
    pub nodes: Vec<PrunedNode>,
    pub edges: Vec<PrunedEdge>,
    pub max_instances: usize,
    pub scale_mode: Option<ScaleMode>,
    pub removed_nodes: usize,
    pub removed_edges: usize,
}

impl PrunedGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|node| node.id.as_str()).collect()
    }

    pub fn edge_ids(&self) -> Vec<&str> {
        self.edges.iter().map(|edge| edge.id.as_str()).collect()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&PrunedNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge_by_id(&self, id: &str) -> Option<&PrunedEdge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    pub fn filtered_node_instances<'a>(
        &self,
        model: &'a GraphModel,
        node: &PrunedNode,
    ) -> Vec<&'a Instance> {
        let instances = &model.nodes()[node.index].instances;
        node.filtered_instances
            .iter()
            .map(|&slot| &instances[slot])
            .collect()
    }

    pub fn filtered_edge_instances<'a>(
        &self,
        model: &'a GraphModel,
        edge: &PrunedEdge,
    ) -> Vec<&'a Instance> {
        let instances = &model.edges()[edge.index].instances;
        edge.filtered_instances
            .iter()
            .map(|&slot| &instances[slot])
            .collect()
    }
}

fn run_pass(
    model: &GraphModel,
    filters: &FilterBank,
    working: &mut WorkingGraph,
    min_component_size: usize,
    width: WidthConfig,
) -> Result<PrunedGraph, EngineError> {
    let pruner = ComponentPruner::new(min_component_size)?;
    let aggregation = aggregate(model, filters)?;
    let report = pruner.prune(model, working, &aggregation);
    let scaler = WidthScaler::new(aggregation.max_instances, width);

    let mut nodes = Vec::with_capacity(working.node_count());
    for (index, aggregate) in aggregation.nodes.into_iter().enumerate() {
        if !working.has_node(index) {
            continue;
        }

        let node = &model.nodes()[index];
        let (filtered_instances, display_type, display_doc) = aggregate.into_parts();
        nodes.push(PrunedNode {
            index,
            id: node.id.clone(),
            name: node.name.clone(),
            entity_type: node.entity_type.clone(),
            filtered_instances,
            display_type,
            display_doc,
            degree: working.degree(model, index),
        });
    }

    let mut edges = Vec::with_capacity(working.edge_count());
    for (index, aggregate) in aggregation.edges.into_iter().enumerate() {
        if !working.has_edge(index) {
            continue;
        }

        let edge = &model.edges()[index];
        let (filtered_instances, display_regulation, display_type, display_doc) =
            aggregate.into_parts();
        let width = scaler
            .map(|scaler| scaler.scale(filtered_instances.len()))
            .unwrap_or(width.min_width);
        edges.push(PrunedEdge {
            index,
            id: edge.id.clone(),
            source: edge.source,
            target: edge.target,
            filtered_instances,
            display_regulation,
            display_type,
            display_doc,
            width,
        });
    }

    debug!(
        kept_nodes = nodes.len(),
        kept_edges = edges.len(),
        removed_nodes = report.removed_node_count(),
        removed_edges = report.removed_edge_count(),
        components = report.components_kept,
        max_instances = aggregation.max_instances,
        scale = scaler.map(|scaler| scaler.mode().label()).unwrap_or("skipped"),
        "recompute pass finished"
    );

    Ok(PrunedGraph {
        nodes,
        edges,
        max_instances: aggregation.max_instances,
        scale_mode: scaler.map(|scaler| scaler.mode()),
        removed_nodes: report.removed_node_count(),
        removed_edges: report.removed_edge_count(),
    })
}

/// Runs one full pass from the base graph. Depends only on its arguments.
pub fn recompute(
    model: &GraphModel,
    filters: &FilterBank,
    min_component_size: usize,
) -> Result<PrunedGraph, EngineError> {
    let mut working = WorkingGraph::new(model);
    run_pass(
        model,
        filters,
        &mut working,
        min_component_size,
        WidthConfig::default(),
    )
}

pub struct Session {
    model: Arc<GraphModel>,
    filters: FilterBank,
    working: WorkingGraph,
    scheduler: RecomputeScheduler,
    config: EngineConfig,
    pruned: PrunedGraph,
    revision: u64,
}

impl Session {
    pub fn new(model: Arc<GraphModel>, config: EngineConfig) -> Result<Self, EngineError> {
        ComponentPruner::new(config.min_component_size)?;

        let filters = FilterBank::from_model(&model);
        let working = WorkingGraph::new(&model);
        let mut session = Self {
            model,
            filters,
            working,
            scheduler: RecomputeScheduler::new(config.quiet_window),
            config,
            pruned: PrunedGraph::default(),
            revision: 0,
        };
        session.recompute()?;
        Ok(session)
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn filters(&self) -> &FilterBank {
        &self.filters
    }

    pub fn pruned(&self) -> &PrunedGraph {
        &self.pruned
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn min_component_size(&self) -> usize {
        self.config.min_component_size
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.scheduler.time_until_due(now)
    }

    pub fn set_filter(
        &mut self,
        property: FilterProperty,
        value: &FilterValue,
        enabled: bool,
        now: Instant,
    ) -> Result<bool, EngineError> {
        let changed = self.filters.set_enabled(property, value, enabled)?;
        if changed {
            self.scheduler.notify(now);
        }
        Ok(changed)
    }

    pub fn set_all(&mut self, property: FilterProperty, enabled: bool, now: Instant) -> bool {
        let changed = self
            .filters
            .filter_mut(property)
            .is_some_and(|filter| filter.set_all(enabled));
        if changed {
            self.scheduler.notify(now);
        }
        changed
    }

    pub fn set_min_component_size(&mut self, size: usize, now: Instant) -> Result<bool, EngineError> {
        ComponentPruner::new(size)?;
        if size == self.config.min_component_size {
            return Ok(false);
        }

        self.config.min_component_size = size;
        self.scheduler.notify(now);
        Ok(true)
    }

    pub fn poll(&mut self, now: Instant) -> Result<bool, EngineError> {
        if !self.scheduler.poll(now) {
            return Ok(false);
        }
        self.recompute()?;
        Ok(true)
    }

    pub fn flush(&mut self) -> Result<bool, EngineError> {
        if !self.scheduler.take_pending() {
            return Ok(false);
        }
        self.recompute()?;
        Ok(true)
    }

    pub fn recompute(&mut self) -> Result<&PrunedGraph, EngineError> {
        self.working.restore();
        let pruned = run_pass(
            &self.model,
            &self.filters,
            &mut self.working,
            self.config.min_component_size,
            self.config.width,
        )?;
        self.filters.update_counts(&self.model, &pruned)?;
        self.filters.clear_dirty();

        self.pruned = pruned;
        self.revision = self.revision.wrapping_add(1);
        Ok(&self.pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Edge, Node};

    fn scenario() -> GraphModel {
        GraphModel::new(
            vec![
                Node::new("A", "A", "Disorder")
                    .with_instances(vec![Instance::new("Disorder", Regulation::Neutral, "d1")]),
                Node::new("B", "B", "GGPs")
                    .with_instances(vec![Instance::new("GGPs", Regulation::Neutral, "d1")]),
            ],
            vec![Edge::new(
                "AB",
                0,
                1,
                vec![
                    Instance::new("up", Regulation::Positive, "d1"),
                    Instance::new("down", Regulation::Negative, "d1"),
                ],
            )],
        )
        .unwrap()
    }

    #[test]
    fn two_instance_edge_uses_first_seen_regulation_and_linear_width() {
        let model = scenario();
        let pruned = recompute(&model, &FilterBank::from_model(&model), 1).unwrap();

        assert_eq!(pruned.node_ids(), vec!["A", "B"]);
        let edge = &pruned.edges[0];
        assert_eq!(edge.display_regulation, Regulation::Positive);
        assert_eq!(edge.display_type, "up");
        assert_eq!(pruned.max_instances, 2);
        assert_eq!(pruned.scale_mode, Some(ScaleMode::Linear));
        assert_eq!(edge.width, 5.0);
        assert_eq!(edge.label(), "up ⊕");
    }

    #[test]
    fn session_publishes_live_counts_after_each_pass() {
        let start = Instant::now();
        let mut session = Session::new(Arc::new(scenario()), EngineConfig::default()).unwrap();
        let up = FilterValue::text("up");
        let relation = FilterProperty::RelationType;

        assert_eq!(session.filters().filter(relation).unwrap().live_count(&up), 1);

        session.set_filter(relation, &up, false, start).unwrap();
        assert_eq!(session.filters().filter(relation).unwrap().live_count(&up), 1);
        assert!(session.filters().is_dirty());

        assert!(!session.poll(start + Duration::from_millis(100)).unwrap());
        assert!(session.poll(start + Duration::from_millis(300)).unwrap());
        assert_eq!(session.filters().filter(relation).unwrap().live_count(&up), 0);
        assert!(!session.filters().is_dirty());

        let edge = &session.pruned().edges[0];
        assert_eq!(edge.display_regulation, Regulation::Negative);
        assert_eq!(edge.width, 3.0);
    }

    #[test]
    fn disabling_every_document_leaves_an_empty_graph() {
        let mut session = Session::new(Arc::new(scenario()), EngineConfig::default()).unwrap();
        session.set_all(FilterProperty::Document, false, Instant::now());
        session.flush().unwrap();

        assert!(session.pruned().is_empty());
        assert!(session.pruned().edges.is_empty());
        assert_eq!(session.pruned().scale_mode, None);
        assert_eq!(session.pruned().removed_nodes, 2);
    }

    #[test]
    fn flush_runs_the_pending_pass_exactly_once() {
        let start = Instant::now();
        let mut session = Session::new(Arc::new(scenario()), EngineConfig::default()).unwrap();
        let revision = session.revision();
        assert!(!session.flush().unwrap());

        session
            .set_filter(FilterProperty::RelationType, &FilterValue::text("up"), false, start)
            .unwrap();
        assert!(session.flush().unwrap());
        assert_eq!(session.revision(), revision + 1);
        assert!(!session.is_pending());
        assert!(!session.poll(start + Duration::from_secs(1)).unwrap());
        assert_eq!(session.revision(), revision + 1);
    }

    #[test]
    fn rejects_zero_component_size() {
        let mut session = Session::new(Arc::new(scenario()), EngineConfig::default()).unwrap();
        assert_eq!(
            session.set_min_component_size(0, Instant::now()),
            Err(EngineError::InvalidComponentSize(0))
        );
        assert!(session.set_min_component_size(3, Instant::now()).unwrap());
        session.flush().unwrap();
        assert!(session.pruned().is_empty());
    }
}
