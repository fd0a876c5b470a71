//! Dependency-ordered upsert pipeline
//!
//! Resolves a row's entity chain against the authoritative store in
//! declared dependency order, looking up or creating each node and
//! wiring dependents together via the identifiers that come back.
//!
//! Each node walks the state machine
//! `Unresolved → LookedUp | Creating → Created → Linked`:
//!
//! 1. `Unresolved → LookedUp`: hit in the identifier cache or found in
//!    the store by natural key; creation is skipped.
//! 2. `Unresolved → Creating → Created`: not found; the creation
//!    payload is rendered with the identifiers of already-resolved
//!    dependencies bound in, then submitted.
//! 3. `Created → Linked`: the new identifier is recorded in the cache,
//!    so siblings and later runs observe it instead of re-creating.
//!
//! A missing required dependency is a hard `DependencyUnresolved`
//! error - never a silent null reference. A failed node aborts only
//! its dependent subtree; unrelated nodes of the same chain, and all
//! other rows of the batch, continue.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use regsync_core::{EntityKind, RegistryId};
use regsync_connector::{RegistryStore, SyncError, SyncResult};

use crate::cache::IdentifierCache;
use crate::chain::{Dependency, DependencyChain, NodeSpec};

/// Marker object binding a dependency's identifier into a payload:
/// `{"$ref": "<kind>"}`.
pub const REF_KEY: &str = "$ref";

/// Build a lookup-bind reference to a dependency's identifier.
#[must_use]
pub fn ref_to(kind: EntityKind) -> Value {
    let mut map = Map::new();
    map.insert(REF_KEY.to_string(), Value::String(kind.as_str().to_string()));
    Value::Object(map)
}

/// Per-node resolution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Unresolved,
    LookedUp,
    Creating,
    Created,
    Linked,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeState::Unresolved => "unresolved",
            NodeState::LookedUp => "looked_up",
            NodeState::Creating => "creating",
            NodeState::Created => "created",
            NodeState::Linked => "linked",
        };
        write!(f, "{s}")
    }
}

/// One planned node instance: which entity, found by which natural
/// key, created from which payload template.
#[derive(Debug, Clone)]
pub struct ChainNode {
    pub kind: EntityKind,
    pub natural_key: String,
    /// Creation payload; `{"$ref": "<kind>"}` markers are replaced by
    /// resolved dependency identifiers before submission.
    pub payload: Value,
}

/// The per-row input to the pipeline: instances for some subset of the
/// chain's declared kinds. Kinds without an instance are simply absent
/// for this row.
#[derive(Debug, Clone, Default)]
pub struct ChainPlan {
    nodes: Vec<ChainNode>,
}

impl ChainPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance for a kind.
    #[must_use]
    pub fn with_node(
        mut self,
        kind: EntityKind,
        natural_key: impl Into<String>,
        payload: Value,
    ) -> Self {
        self.nodes.push(ChainNode {
            kind,
            natural_key: natural_key.into(),
            payload,
        });
        self
    }

    /// The planned instance for a kind, if any.
    #[must_use]
    pub fn node(&self, kind: EntityKind) -> Option<&ChainNode> {
        self.nodes.iter().find(|n| n.kind == kind)
    }
}

/// Terminal record for one chain node.
#[derive(Debug)]
pub struct NodeResolution {
    pub kind: EntityKind,
    /// State reached; `Linked` for every successful node.
    pub state: NodeState,
    pub registry_id: Option<RegistryId>,
    /// Whether this run created the record (as opposed to reusing an
    /// existing one).
    pub created: bool,
    pub error: Option<SyncError>,
}

/// Outcome of resolving one chain.
#[derive(Debug, Default)]
pub struct ChainOutcome {
    nodes: Vec<NodeResolution>,
}

impl ChainOutcome {
    /// All per-node records, in chain order.
    #[must_use]
    pub fn nodes(&self) -> &[NodeResolution] {
        &self.nodes
    }

    /// The resolved identifier for a kind, if it reached `Linked`.
    #[must_use]
    pub fn id_of(&self, kind: EntityKind) -> Option<RegistryId> {
        self.nodes
            .iter()
            .find(|n| n.kind == kind)
            .and_then(|n| n.registry_id)
    }

    /// True when no node failed.
    #[must_use]
    pub fn is_fully_resolved(&self) -> bool {
        self.nodes.iter().all(|n| n.error.is_none())
    }

    /// Nodes that failed, in chain order.
    pub fn failures(&self) -> impl Iterator<Item = &NodeResolution> {
        self.nodes.iter().filter(|n| n.error.is_some())
    }

    /// Consume the outcome, yielding the first failure if any.
    #[must_use]
    pub fn into_first_error(self) -> Option<SyncError> {
        self.nodes.into_iter().find_map(|n| n.error)
    }

    fn record(&mut self, resolution: NodeResolution) {
        self.nodes.push(resolution);
    }
}

/// The dependency-ordered upsert pipeline.
pub struct UpsertPipeline {
    store: Arc<dyn RegistryStore>,
    cache: Arc<dyn IdentifierCache>,
    chain: DependencyChain,
}

impl UpsertPipeline {
    /// Create a pipeline over a store, a cache and a declared chain.
    #[must_use]
    pub fn new(
        store: Arc<dyn RegistryStore>,
        cache: Arc<dyn IdentifierCache>,
        chain: DependencyChain,
    ) -> Self {
        Self {
            store,
            cache,
            chain,
        }
    }

    /// The declared chain.
    #[must_use]
    pub fn chain(&self) -> &DependencyChain {
        &self.chain
    }

    /// Resolve one row's chain. Node failures are recorded in the
    /// outcome, never returned: a failed node poisons only its
    /// dependent subtree.
    #[instrument(skip(self, plan))]
    pub async fn resolve(&self, plan: &ChainPlan) -> ChainOutcome {
        let mut outcome = ChainOutcome::default();
        let mut resolved: HashMap<EntityKind, RegistryId> = HashMap::new();
        let mut failed: Vec<EntityKind> = Vec::new();

        for spec in self.chain.nodes() {
            let Some(node) = plan.node(spec.kind) else {
                outcome.record(NodeResolution {
                    kind: spec.kind,
                    state: NodeState::Unresolved,
                    registry_id: None,
                    created: false,
                    error: None,
                });
                continue;
            };

            // A failed required dependency means this node is not
            // attempted at all.
            if let Some(dep) = spec
                .depends_on
                .iter()
                .find(|d| d.required && failed.contains(&d.kind))
            {
                debug!(
                    kind = %spec.kind,
                    dependency = %dep.kind,
                    "skipping node, required dependency failed"
                );
                failed.push(spec.kind);
                outcome.record(NodeResolution {
                    kind: spec.kind,
                    state: NodeState::Unresolved,
                    registry_id: None,
                    created: false,
                    error: Some(SyncError::DependencyUnresolved {
                        kind: dep.kind,
                        dependent: spec.kind,
                    }),
                });
                continue;
            }

            match self.resolve_node(spec, node, &resolved).await {
                Ok((id, created)) => {
                    resolved.insert(spec.kind, id);
                    outcome.record(NodeResolution {
                        kind: spec.kind,
                        state: NodeState::Linked,
                        registry_id: Some(id),
                        created,
                        error: None,
                    });
                }
                Err((state, error)) => {
                    failed.push(spec.kind);
                    outcome.record(NodeResolution {
                        kind: spec.kind,
                        state,
                        registry_id: None,
                        created: false,
                        error: Some(error),
                    });
                }
            }
        }

        outcome
    }

    /// Resolve a single entity outside any chain: cache, then store
    /// lookup, then creation with a dependency-free payload.
    pub async fn lookup_or_create(
        &self,
        kind: EntityKind,
        natural_key: &str,
        payload: &Value,
    ) -> SyncResult<RegistryId> {
        let spec = NodeSpec::root(kind);
        let node = ChainNode {
            kind,
            natural_key: natural_key.to_string(),
            payload: payload.clone(),
        };
        self.resolve_node(&spec, &node, &HashMap::new())
            .await
            .map(|(id, _)| id)
            .map_err(|(_, e)| e)
    }

    /// Walk one node through the state machine. On error, reports the
    /// state that was reached.
    async fn resolve_node(
        &self,
        spec: &NodeSpec,
        node: &ChainNode,
        resolved: &HashMap<EntityKind, RegistryId>,
    ) -> Result<(RegistryId, bool), (NodeState, SyncError)> {
        let kind = spec.kind;
        let key = node.natural_key.as_str();

        // Unresolved → LookedUp via cache
        match self.cache.get(kind, key).await {
            Ok(Some(id)) => {
                debug!(kind = %kind, key = key, id = %id, "cache hit");
                return Ok((id, false));
            }
            Ok(None) => {}
            Err(e) => return Err((NodeState::Unresolved, e)),
        }

        // Unresolved → LookedUp via store
        match self.store.lookup(kind, key).await {
            Ok(Some(id)) => {
                debug!(kind = %kind, key = key, id = %id, "found by natural key");
                let winner = self
                    .cache
                    .put_if_absent(kind, key, id)
                    .await
                    .map_err(|e| (NodeState::LookedUp, e))?;
                return Ok((winner, false));
            }
            Ok(None) => {}
            Err(e) => return Err((NodeState::Unresolved, e)),
        }

        // Creation requires every declared required dependency to be
        // resolved, whether or not the payload references it.
        if let Some(dep) = spec
            .depends_on
            .iter()
            .find(|d| d.required && !resolved.contains_key(&d.kind))
        {
            return Err((
                NodeState::Unresolved,
                SyncError::DependencyUnresolved {
                    kind: dep.kind,
                    dependent: kind,
                },
            ));
        }

        // Unresolved → Creating: bind dependency identifiers first.
        let payload = render_payload(&node.payload, kind, &spec.depends_on, resolved)
            .map_err(|e| (NodeState::Unresolved, e))?;

        let created_id = self
            .store
            .create(kind, &payload)
            .await
            .map_err(|e| (NodeState::Creating, e))?;

        // Created → Linked: record so siblings and later runs reuse it.
        let winner = self
            .cache
            .put_if_absent(kind, key, created_id)
            .await
            .map_err(|e| (NodeState::Created, e))?;

        if winner != created_id {
            warn!(
                kind = %kind,
                key = key,
                created = %created_id,
                winner = %winner,
                "lost creation race, reusing winning identifier"
            );
            return Ok((winner, false));
        }

        debug!(kind = %kind, key = key, id = %winner, "created");
        Ok((winner, true))
    }
}

/// Render a creation payload, binding `{"$ref": "<kind>"}` markers to
/// resolved dependency identifiers.
///
/// A marker for an optional, unresolved dependency drops the
/// containing field; a marker for a required, unresolved dependency is
/// a hard `DependencyUnresolved`. A marker for a kind the chain never
/// declared as a dependency is a plan bug and fails validation.
fn render_payload(
    template: &Value,
    node_kind: EntityKind,
    deps: &[Dependency],
    resolved: &HashMap<EntityKind, RegistryId>,
) -> SyncResult<Value> {
    render_value(template, node_kind, deps, resolved)?.ok_or_else(|| {
        SyncError::validation(format!(
            "payload for {node_kind} reduced to nothing during dependency binding"
        ))
    })
}

fn render_value(
    value: &Value,
    node_kind: EntityKind,
    deps: &[Dependency],
    resolved: &HashMap<EntityKind, RegistryId>,
) -> SyncResult<Option<Value>> {
    match value {
        Value::Object(map) if map.len() == 1 && map.contains_key(REF_KEY) => {
            let kind_str = map[REF_KEY].as_str().ok_or_else(|| {
                SyncError::validation(format!("non-string $ref in payload for {node_kind}"))
            })?;
            let kind: EntityKind = kind_str
                .parse()
                .map_err(|e: String| SyncError::validation(e))?;
            let dep = deps.iter().find(|d| d.kind == kind).ok_or_else(|| {
                SyncError::validation(format!(
                    "payload for {node_kind} references undeclared dependency {kind}"
                ))
            })?;

            match resolved.get(&kind) {
                Some(id) => Ok(Some(Value::String(id.to_string()))),
                None if dep.required => Err(SyncError::DependencyUnresolved {
                    kind,
                    dependent: node_kind,
                }),
                None => Ok(None),
            }
        }
        Value::Object(map) => {
            let mut rendered = Map::with_capacity(map.len());
            for (k, v) in map {
                if let Some(rv) = render_value(v, node_kind, deps, resolved)? {
                    rendered.insert(k.clone(), rv);
                }
            }
            Ok(Some(Value::Object(rendered)))
        }
        Value::Array(items) => {
            let mut rendered = Vec::with_capacity(items.len());
            for item in items {
                if let Some(rv) = render_value(item, node_kind, deps, resolved)? {
                    rendered.push(rv);
                }
            }
            Ok(Some(Value::Array(rendered)))
        }
        other => Ok(Some(other.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deps() -> Vec<Dependency> {
        vec![
            Dependency::required(EntityKind::Account),
            Dependency::optional(EntityKind::Address),
        ]
    }

    #[test]
    fn test_render_binds_resolved_reference() {
        let account_id = RegistryId::new();
        let mut resolved = HashMap::new();
        resolved.insert(EntityKind::Account, account_id);

        let template = json!({
            "name": "Aftale 7",
            "account": ref_to(EntityKind::Account),
        });

        let payload =
            render_payload(&template, EntityKind::Agreement, &deps(), &resolved).unwrap();
        assert_eq!(payload["account"], account_id.to_string());
        assert_eq!(payload["name"], "Aftale 7");
    }

    #[test]
    fn test_render_missing_required_is_hard_error() {
        let template = json!({ "account": ref_to(EntityKind::Account) });
        let err = render_payload(&template, EntityKind::Agreement, &deps(), &HashMap::new())
            .unwrap_err();
        assert_eq!(err.error_code(), "DEPENDENCY_UNRESOLVED");
    }

    #[test]
    fn test_render_missing_optional_drops_field() {
        let account_id = RegistryId::new();
        let mut resolved = HashMap::new();
        resolved.insert(EntityKind::Account, account_id);

        let template = json!({
            "account": ref_to(EntityKind::Account),
            "supply_address": ref_to(EntityKind::Address),
        });

        let payload =
            render_payload(&template, EntityKind::Agreement, &deps(), &resolved).unwrap();
        assert!(payload.get("supply_address").is_none());
        assert_eq!(payload["account"], account_id.to_string());
    }

    #[test]
    fn test_render_rejects_undeclared_dependency() {
        let template = json!({ "contact": ref_to(EntityKind::Contact) });
        let resolved = HashMap::new();
        let err =
            render_payload(&template, EntityKind::Agreement, &deps(), &resolved).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }

    #[test]
    fn test_render_handles_nested_arrays() {
        let account_id = RegistryId::new();
        let mut resolved = HashMap::new();
        resolved.insert(EntityKind::Account, account_id);

        let template = json!({
            "links": [ref_to(EntityKind::Account), ref_to(EntityKind::Address), "literal"],
        });

        let payload =
            render_payload(&template, EntityKind::Agreement, &deps(), &resolved).unwrap();
        let links = payload["links"].as_array().unwrap();
        // The optional, unresolved address reference is dropped.
        assert_eq!(links.len(), 2);
        assert_eq!(links[0], account_id.to_string());
        assert_eq!(links[1], "literal");
    }

    #[test]
    fn test_node_state_display() {
        assert_eq!(NodeState::Linked.to_string(), "linked");
        assert_eq!(NodeState::Creating.to_string(), "creating");
    }
}
