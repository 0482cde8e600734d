//! Collaborator interfaces that feed the engine, plus in-memory versions.
//!
//! The engine itself never loads data. Callers resolve which resources a query
//! touches (property subtrees, related resources) and load their rules, busy
//! slots and capacities through these traits. Tenant identity is passed
//! explicitly on every call; nothing here holds ambient tenant state.
//!
//! Hierarchies are stored as arenas keyed by integer id and closed with an
//! iterative breadth-first walk, so cyclic relation data cannot loop.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{Days, NaiveTime};

use crate::capacity::{BusySlot, CapacityMap};
use crate::combine::{AvailabilityQuery, UtcSlot};
use crate::engine::{compute, EngineInputs};
use crate::error::{EngineError, Result};
use crate::interval::TimeSpan;
use crate::period::DatePeriod;
use crate::rule::{ResourceId, Rule};

/// Opaque tenant identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Identifier of a node in a property hierarchy.
pub type PropertyId = u32;

/// Loads the rules, busy slots and capacities relevant to a set of resources.
pub trait RuleAndBusyDataSource {
    /// # Errors
    /// Implementations report lookup failures as [`EngineError::Source`].
    fn load(
        &self,
        tenant: &TenantId,
        period: &DatePeriod,
        resources: &BTreeSet<ResourceId>,
    ) -> Result<EngineInputs>;
}

/// Expands a property into the set of properties in its subtree.
pub trait PropertyTreeExpander {
    /// The result always contains `property` itself.
    ///
    /// # Errors
    /// Implementations report unknown tenants or properties as [`EngineError::Source`].
    fn expand(
        &self,
        tenant: &TenantId,
        property: PropertyId,
        include_descendants: bool,
    ) -> Result<BTreeSet<PropertyId>>;
}

/// Direction of a resource relation walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalMode {
    /// Follow child → parent links.
    Ancestors,
    /// Follow parent → child links.
    Descendants,
    /// Union of both walks (siblings are not reached).
    Both,
}

/// Expands resource ids through parent/child relations.
pub trait ResourceAncestorResolver {
    /// The result always contains the starting `resources`. An empty
    /// `relation_types` set follows every relation type.
    ///
    /// # Errors
    /// Implementations report unknown tenants as [`EngineError::Source`].
    fn resolve(
        &self,
        tenant: &TenantId,
        resources: &BTreeSet<ResourceId>,
        relation_types: &BTreeSet<String>,
        mode: TraversalMode,
    ) -> Result<BTreeSet<ResourceId>>;
}

/// Load inputs for every resource the query mentions, then compute.
///
/// # Errors
/// Propagates data-source errors and every error of [`compute`].
pub fn compute_from_source<S>(
    source: &S,
    tenant: &TenantId,
    query: &AvailabilityQuery,
) -> Result<Vec<UtcSlot>>
where
    S: RuleAndBusyDataSource + ?Sized,
{
    let inputs = source.load(tenant, query.period(), &query.resource_ids())?;
    compute(query, &inputs)
}

fn unknown_tenant(tenant: &TenantId) -> EngineError {
    EngineError::Source(format!("unknown tenant '{}'", tenant.0))
}

// ── In-memory rule and busy storage ─────────────────────────────────────────

/// Everything stored for one tenant.
#[derive(Debug, Clone, Default)]
pub struct TenantData {
    pub rules: Vec<Rule>,
    pub busy: Vec<BusySlot>,
    pub capacities: CapacityMap,
}

/// A [`RuleAndBusyDataSource`] backed by per-tenant vectors.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    tenants: BTreeMap<TenantId, TenantData>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_tenant(&mut self, tenant: TenantId, data: TenantData) {
        self.tenants.insert(tenant, data);
    }
}

impl RuleAndBusyDataSource for InMemoryDataSource {
    fn load(
        &self,
        tenant: &TenantId,
        period: &DatePeriod,
        resources: &BTreeSet<ResourceId>,
    ) -> Result<EngineInputs> {
        let data = self.tenants.get(tenant).ok_or_else(|| unknown_tenant(tenant))?;

        let window_end = period
            .to()
            .checked_add_days(Days::new(1))
            .ok_or_else(|| EngineError::Source(format!("period end {} overflows", period.to())))?;
        let window = TimeSpan::new(
            period.from().and_time(NaiveTime::MIN).and_utc(),
            window_end.and_time(NaiveTime::MIN).and_utc(),
        )?;

        let rules = data
            .rules
            .iter()
            .filter(|rule| resources.contains(&rule.resource_id()))
            .cloned()
            .collect();
        let busy = data
            .busy
            .iter()
            .filter(|slot| resources.contains(&slot.resource_id()) && slot.span().overlaps(&window))
            .copied()
            .collect();
        let capacities = CapacityMap::from_pairs(
            data.capacities
                .iter()
                .filter(|(id, _)| resources.contains(id)),
        )?;

        Ok(EngineInputs {
            rules,
            busy,
            capacities,
        })
    }
}

// ── Property hierarchy ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct PropertyNode {
    parent: Option<PropertyId>,
    children: Vec<PropertyId>,
}

/// A forest of properties. Parents must be inserted before their children,
/// which keeps the structure acyclic.
#[derive(Debug, Clone, Default)]
pub struct PropertyTree {
    nodes: BTreeMap<PropertyId, PropertyNode>,
}

impl PropertyTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns [`EngineError::Source`] for a duplicate id or an unknown parent.
    pub fn insert(&mut self, id: PropertyId, parent: Option<PropertyId>) -> Result<()> {
        if self.nodes.contains_key(&id) {
            return Err(EngineError::Source(format!("property {} already exists", id)));
        }
        if let Some(parent) = parent {
            self.nodes
                .get_mut(&parent)
                .ok_or_else(|| EngineError::Source(format!("unknown parent property {}", parent)))?
                .children
                .push(id);
        }
        self.nodes.insert(
            id,
            PropertyNode {
                parent,
                children: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn parent(&self, id: PropertyId) -> Option<PropertyId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    /// `id` and, when asked, every property below it.
    ///
    /// # Errors
    /// Returns [`EngineError::Source`] for an unknown property.
    pub fn subtree(
        &self,
        id: PropertyId,
        include_descendants: bool,
    ) -> Result<BTreeSet<PropertyId>> {
        if !self.nodes.contains_key(&id) {
            return Err(EngineError::Source(format!("unknown property {}", id)));
        }

        let mut closed = BTreeSet::from([id]);
        if !include_descendants {
            return Ok(closed);
        }

        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if let Some(node) = self.nodes.get(&current) {
                for child in &node.children {
                    if closed.insert(*child) {
                        queue.push_back(*child);
                    }
                }
            }
        }
        Ok(closed)
    }
}

// ── Resource relations ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct Relation {
    parent: ResourceId,
    child: ResourceId,
    relation_type: String,
}

/// Typed parent/child relations between resources. Cycles are tolerated.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    relations: Vec<Relation>,
    by_parent: BTreeMap<ResourceId, Vec<usize>>,
    by_child: BTreeMap<ResourceId, Vec<usize>>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns [`EngineError::Source`] for a zero id or a self-relation.
    pub fn add_relation(
        &mut self,
        parent: ResourceId,
        child: ResourceId,
        relation_type: impl Into<String>,
    ) -> Result<()> {
        if parent == 0 || child == 0 {
            return Err(EngineError::Source("relation uses resource id 0".to_string()));
        }
        if parent == child {
            return Err(EngineError::Source(format!(
                "resource {} cannot relate to itself",
                parent
            )));
        }
        let idx = self.relations.len();
        self.relations.push(Relation {
            parent,
            child,
            relation_type: relation_type.into(),
        });
        self.by_parent.entry(parent).or_default().push(idx);
        self.by_child.entry(child).or_default().push(idx);
        Ok(())
    }

    /// Resources reachable from `start` in the given direction.
    pub fn closure(
        &self,
        start: &BTreeSet<ResourceId>,
        relation_types: &BTreeSet<String>,
        mode: TraversalMode,
    ) -> BTreeSet<ResourceId> {
        match mode {
            TraversalMode::Ancestors => self.walk(start, relation_types, true),
            TraversalMode::Descendants => self.walk(start, relation_types, false),
            TraversalMode::Both => {
                let mut up = self.walk(start, relation_types, true);
                up.extend(self.walk(start, relation_types, false));
                up
            }
        }
    }

    fn walk(
        &self,
        start: &BTreeSet<ResourceId>,
        relation_types: &BTreeSet<String>,
        upward: bool,
    ) -> BTreeSet<ResourceId> {
        let index = if upward { &self.by_child } else { &self.by_parent };
        let mut closed = start.clone();
        let mut queue: VecDeque<ResourceId> = start.iter().copied().collect();

        while let Some(current) = queue.pop_front() {
            let Some(edges) = index.get(&current) else {
                continue;
            };
            for relation in edges.iter().map(|idx| &self.relations[*idx]) {
                if !relation_types.is_empty() && !relation_types.contains(&relation.relation_type) {
                    continue;
                }
                let next = if upward {
                    relation.parent
                } else {
                    relation.child
                };
                if closed.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        closed
    }
}

/// Per-tenant property trees and resource graphs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHierarchy {
    properties: BTreeMap<TenantId, PropertyTree>,
    relations: BTreeMap<TenantId, ResourceGraph>,
}

impl InMemoryHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_properties(&mut self, tenant: TenantId, tree: PropertyTree) {
        self.properties.insert(tenant, tree);
    }

    pub fn insert_relations(&mut self, tenant: TenantId, graph: ResourceGraph) {
        self.relations.insert(tenant, graph);
    }
}

impl PropertyTreeExpander for InMemoryHierarchy {
    fn expand(
        &self,
        tenant: &TenantId,
        property: PropertyId,
        include_descendants: bool,
    ) -> Result<BTreeSet<PropertyId>> {
        self.properties
            .get(tenant)
            .ok_or_else(|| unknown_tenant(tenant))?
            .subtree(property, include_descendants)
    }
}

impl ResourceAncestorResolver for InMemoryHierarchy {
    fn resolve(
        &self,
        tenant: &TenantId,
        resources: &BTreeSet<ResourceId>,
        relation_types: &BTreeSet<String>,
        mode: TraversalMode,
    ) -> Result<BTreeSet<ResourceId>> {
        Ok(self
            .relations
            .get(tenant)
            .ok_or_else(|| unknown_tenant(tenant))?
            .closure(resources, relation_types, mode))
    }
}
