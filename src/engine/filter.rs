use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::network::{GraphModel, Instance, Regulation};

use super::error::EngineError;
use super::session::PrunedGraph;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Edge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterProperty {
    Regulation,
    RelationType,
    EntityType,
    Document,
}

impl FilterProperty {
    pub const ALL: [FilterProperty; 4] = [
        Self::Regulation,
        Self::RelationType,
        Self::EntityType,
        Self::Document,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Regulation => "regulation",
            Self::RelationType => "relation type",
            Self::EntityType => "entity type",
            Self::Document => "document",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Regulation => "regulation",
            Self::RelationType => "type",
            Self::EntityType => "entity",
            Self::Document => "doc",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|property| property.key() == key)
    }

    pub fn applies_to(self, kind: ElementKind) -> bool {
        match self {
            Self::Regulation | Self::RelationType => kind == ElementKind::Edge,
            Self::EntityType => kind == ElementKind::Node,
            Self::Document => true,
        }
    }

    pub fn value_of(self, instance: &Instance) -> FilterValue {
        match self {
            Self::Regulation => FilterValue::Regulation(instance.regulation),
            Self::RelationType | Self::EntityType => FilterValue::Text(instance.kind.clone()),
            Self::Document => FilterValue::Text(instance.doc.clone()),
        }
    }

    pub fn parse_value(self, raw: &str) -> Option<FilterValue> {
        match self {
            Self::Regulation => raw
                .parse::<i8>()
                .ok()
                .and_then(|code| Regulation::try_from(code).ok())
                .or_else(|| {
                    Regulation::ALL
                        .into_iter()
                        .find(|regulation| regulation.label() == raw)
                })
                .map(FilterValue::Regulation),
            _ => Some(FilterValue::Text(raw.to_owned())),
        }
    }
}

impl fmt::Display for FilterProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterValue {
    Regulation(Regulation),
    Text(String),
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    fn admits(&self, property: FilterProperty, instance: &Instance) -> bool {
        match (self, property) {
            (Self::Regulation(regulation), FilterProperty::Regulation) => {
                *regulation == instance.regulation
            }
            (Self::Text(kind), FilterProperty::RelationType | FilterProperty::EntityType) => {
                *kind == instance.kind
            }
            (Self::Text(doc), FilterProperty::Document) => *doc == instance.doc,
            _ => false,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regulation(regulation) => f.write_str(regulation.label()),
            Self::Text(text) if text.is_empty() => f.write_str("(none)"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterEntry {
    pub value: FilterValue,
    pub enabled: bool,
    pub live_count: usize,
}

#[derive(Clone, Debug)]
pub struct Filter {
    property: FilterProperty,
    entries: Vec<FilterEntry>,
    index: HashMap<FilterValue, usize>,
    dirty: bool,
}

impl Filter {
    pub fn new(property: FilterProperty, values: impl IntoIterator<Item = FilterValue>) -> Self {
        let mut entries = Vec::new();
        let mut index = HashMap::new();
        for value in values {
            if index.contains_key(&value) {
                continue;
            }
            index.insert(value.clone(), entries.len());
            entries.push(FilterEntry {
                value,
                enabled: true,
                live_count: 0,
            });
        }

        Self {
            property,
            entries,
            index,
            dirty: false,
        }
    }

    pub fn from_model(property: FilterProperty, model: &GraphModel) -> Self {
        let mut values = BTreeSet::new();
        if property.applies_to(ElementKind::Node) {
            for node in model.nodes() {
                values.extend(node.instances.iter().map(|instance| property.value_of(instance)));
            }
        }
        if property.applies_to(ElementKind::Edge) {
            for edge in model.edges() {
                values.extend(edge.instances.iter().map(|instance| property.value_of(instance)));
            }
        }

        Self::new(property, values)
    }

    pub fn property(&self) -> FilterProperty {
        self.property
    }

    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.enabled).count()
    }

    /// Flips one value. Only marks the filter dirty; recomputation is up to the caller.
    pub fn set_enabled(&mut self, value: &FilterValue, enabled: bool) -> Result<bool, EngineError> {
        let slot = self.slot(value)?;
        let entry = &mut self.entries[slot];
        if entry.enabled == enabled {
            return Ok(false);
        }

        entry.enabled = enabled;
        self.dirty = true;
        Ok(true)
    }

    pub fn set_all(&mut self, enabled: bool) -> bool {
        let mut changed = false;
        for entry in &mut self.entries {
            changed |= entry.enabled != enabled;
            entry.enabled = enabled;
        }
        self.dirty |= changed;
        changed
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn admits(&self, instance: &Instance) -> Result<bool, EngineError> {
        let value = self.property.value_of(instance);
        let slot = self.slot(&value)?;
        let entry = &self.entries[slot];
        debug_assert!(entry.value.admits(self.property, instance));
        Ok(entry.enabled)
    }

    /// The subsequence of `instances` whose value is enabled, in original order.
    pub fn apply_to<'a>(&self, instances: &'a [Instance]) -> Result<Vec<&'a Instance>, EngineError> {
        let mut kept = Vec::with_capacity(instances.len());
        for instance in instances {
            if self.admits(instance)? {
                kept.push(instance);
            }
        }
        Ok(kept)
    }

    fn retain(&self, instances: &[Instance], selection: &mut Vec<usize>) -> Result<(), EngineError> {
        let mut kept = Vec::with_capacity(selection.len());
        for &index in selection.iter() {
            if self.admits(&instances[index])? {
                kept.push(index);
            }
        }
        *selection = kept;
        Ok(())
    }

    /// Replaces the live counts with a tally of `filtered`; untallied values report zero.
    pub fn update_counts<'a>(
        &mut self,
        filtered: impl IntoIterator<Item = &'a Instance>,
    ) -> Result<(), EngineError> {
        let mut counts = vec![0usize; self.entries.len()];
        for instance in filtered {
            let value = self.property.value_of(instance);
            counts[self.slot(&value)?] += 1;
        }

        for (entry, count) in self.entries.iter_mut().zip(counts) {
            entry.live_count = count;
        }
        Ok(())
    }

    pub fn live_count(&self, value: &FilterValue) -> usize {
        self.index
            .get(value)
            .map(|&slot| self.entries[slot].live_count)
            .unwrap_or(0)
    }

    fn slot(&self, value: &FilterValue) -> Result<usize, EngineError> {
        self.index
            .get(value)
            .copied()
            .ok_or_else(|| EngineError::UnknownFilterValue {
                property: self.property,
                value: value.clone(),
            })
    }
}

#[derive(Clone, Debug)]
pub struct FilterBank {
    filters: Vec<Filter>,
}

impl FilterBank {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    pub fn from_model(model: &GraphModel) -> Self {
        Self::new(
            FilterProperty::ALL
                .into_iter()
                .map(|property| Filter::from_model(property, model))
                .collect(),
        )
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn filter(&self, property: FilterProperty) -> Option<&Filter> {
        self.filters
            .iter()
            .find(|filter| filter.property() == property)
    }

    pub fn filter_mut(&mut self, property: FilterProperty) -> Option<&mut Filter> {
        self.filters
            .iter_mut()
            .find(|filter| filter.property() == property)
    }

    /// Indices of the instances passing every filter that applies to `kind`,
    /// folded left to right over the bank.
    pub fn apply_all(&self, kind: ElementKind, instances: &[Instance]) -> Result<Vec<usize>, EngineError> {
        let mut selection = (0..instances.len()).collect::<Vec<_>>();
        for filter in &self.filters {
            if selection.is_empty() {
                break;
            }
            if filter.property().applies_to(kind) {
                filter.retain(instances, &mut selection)?;
            }
        }
        Ok(selection)
    }

    pub fn set_enabled(
        &mut self,
        property: FilterProperty,
        value: &FilterValue,
        enabled: bool,
    ) -> Result<bool, EngineError> {
        match self.filter_mut(property) {
            Some(filter) => filter.set_enabled(value, enabled),
            None => Err(EngineError::UnknownFilterValue {
                property,
                value: value.clone(),
            }),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.filters.iter().any(Filter::is_dirty)
    }

    pub fn clear_dirty(&mut self) {
        self.filters.iter_mut().for_each(Filter::clear_dirty);
    }

    pub fn update_counts(&mut self, model: &GraphModel, pruned: &PrunedGraph) -> Result<(), EngineError> {
        for filter in &mut self.filters {
            let property = filter.property();
            let mut filtered: Vec<&Instance> = Vec::new();

            if property.applies_to(ElementKind::Node) {
                for node in &pruned.nodes {
                    let instances = &model.nodes()[node.index].instances;
                    filtered.extend(node.filtered_instances.iter().map(|&slot| &instances[slot]));
                }
            }
            if property.applies_to(ElementKind::Edge) {
                for edge in &pruned.edges {
                    let instances = &model.edges()[edge.index].instances;
                    filtered.extend(edge.filtered_instances.iter().map(|&slot| &instances[slot]));
                }
            }

            filter.update_counts(filtered)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instances() -> Vec<Instance> {
        vec![
            Instance::new("up", Regulation::Positive, "d1"),
            Instance::new("down", Regulation::Negative, "d2"),
            Instance::new("up", Regulation::Negative, "d1"),
        ]
    }

    #[test]
    fn apply_to_preserves_order_of_enabled_values() {
        let mut filter = Filter::new(
            FilterProperty::RelationType,
            [FilterValue::text("up"), FilterValue::text("down")],
        );
        filter.set_enabled(&FilterValue::text("down"), false).unwrap();

        let all = instances();
        let kept = filter.apply_to(&all).unwrap();
        assert_eq!(kept, vec![&all[0], &all[2]]);
    }

    #[test]
    fn toggling_only_flags_dirty() {
        let mut filter = Filter::new(
            FilterProperty::Regulation,
            [FilterValue::Regulation(Regulation::Positive)],
        );
        assert!(!filter.is_dirty());

        let changed = filter
            .set_enabled(&FilterValue::Regulation(Regulation::Positive), false)
            .unwrap();
        assert!(changed);
        assert!(filter.is_dirty());

        let unchanged = filter
            .set_enabled(&FilterValue::Regulation(Regulation::Positive), false)
            .unwrap();
        assert!(!unchanged);
    }

    #[test]
    fn unknown_values_fail_fast() {
        let filter = Filter::new(FilterProperty::Document, [FilterValue::text("d1")]);
        let error = filter.apply_to(&instances()).unwrap_err();
        assert_eq!(
            error,
            EngineError::UnknownFilterValue {
                property: FilterProperty::Document,
                value: FilterValue::text("d2"),
            }
        );
    }

    #[test]
    fn bank_ands_across_properties_and_respects_scope() {
        let mut bank = FilterBank::new(vec![
            Filter::new(
                FilterProperty::Regulation,
                [
                    FilterValue::Regulation(Regulation::Positive),
                    FilterValue::Regulation(Regulation::Negative),
                ],
            ),
            Filter::new(
                FilterProperty::Document,
                [FilterValue::text("d1"), FilterValue::text("d2")],
            ),
        ]);
        bank.set_enabled(
            FilterProperty::Regulation,
            &FilterValue::Regulation(Regulation::Negative),
            false,
        )
        .unwrap();
        bank.set_enabled(FilterProperty::Document, &FilterValue::text("d2"), false)
            .unwrap();

        let all = instances();
        assert_eq!(bank.apply_all(ElementKind::Edge, &all).unwrap(), vec![0]);
        // regulation does not apply to node instances
        assert_eq!(bank.apply_all(ElementKind::Node, &all).unwrap(), vec![0, 2]);
    }

    #[test]
    fn update_counts_reports_zero_for_untallied_values() {
        let mut filter = Filter::new(
            FilterProperty::RelationType,
            [FilterValue::text("down"), FilterValue::text("up"), FilterValue::text("other")],
        );
        filter.update_counts(&instances()).unwrap();

        assert_eq!(filter.live_count(&FilterValue::text("up")), 2);
        assert_eq!(filter.live_count(&FilterValue::text("down")), 1);
        assert_eq!(filter.live_count(&FilterValue::text("other")), 0);
        assert_eq!(filter.live_count(&FilterValue::text("never-seen")), 0);
    }

    #[test]
    fn from_model_sorts_distinct_values() {
        use crate::network::{Edge, Node};

        let model = GraphModel::new(
            vec![
                Node::new("a", "A", "Cell").with_instances(vec![Instance::new("Cell", Regulation::Neutral, "d2")]),
                Node::new("b", "B", "GGPs").with_instances(vec![Instance::new("GGPs", Regulation::Neutral, "d1")]),
            ],
            vec![Edge::new(
                "e0",
                0,
                1,
                vec![
                    Instance::new("up", Regulation::Positive, "d3"),
                    Instance::new("down", Regulation::Negative, "d1"),
                ],
            )],
        )
        .unwrap();

        let values = |property| {
            Filter::from_model(property, &model)
                .entries()
                .iter()
                .map(|entry| entry.value.to_string())
                .collect::<Vec<_>>()
        };

        assert_eq!(values(FilterProperty::Document), vec!["d1", "d2", "d3"]);
        assert_eq!(values(FilterProperty::RelationType), vec!["down", "up"]);
        assert_eq!(values(FilterProperty::EntityType), vec!["Cell", "GGPs"]);
        assert_eq!(values(FilterProperty::Regulation), vec!["negative", "positive"]);
    }

    #[test]
    fn parses_regulation_by_code_or_name() {
        assert_eq!(
            FilterProperty::Regulation.parse_value("-1"),
            Some(FilterValue::Regulation(Regulation::Negative))
        );
        assert_eq!(
            FilterProperty::Regulation.parse_value("mixed"),
            Some(FilterValue::Regulation(Regulation::Mixed))
        );
        assert_eq!(FilterProperty::Regulation.parse_value("9"), None);
        assert_eq!(FilterProperty::from_key("doc"), Some(FilterProperty::Document));
    }
}
