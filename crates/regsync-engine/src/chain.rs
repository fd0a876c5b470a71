//! Dependency chains
//!
//! The order in which an entity's dependency roles are resolved is
//! data, not control flow: a chain is declared once per entity family,
//! validated at construction, and executed by the generic pipeline.

use thiserror::Error;

use regsync_core::EntityKind;

/// One dependency edge of a chain node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub kind: EntityKind,

    /// Required edges make [`crate::upsert`] fail the dependent with
    /// `DependencyUnresolved` when the dependency is absent or failed;
    /// optional edges are simply dropped from the payload.
    pub required: bool,
}

impl Dependency {
    #[must_use]
    pub fn required(kind: EntityKind) -> Self {
        Self {
            kind,
            required: true,
        }
    }

    #[must_use]
    pub fn optional(kind: EntityKind) -> Self {
        Self {
            kind,
            required: false,
        }
    }
}

/// Declaration of one node in a chain.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub kind: EntityKind,
    pub depends_on: Vec<Dependency>,
}

impl NodeSpec {
    #[must_use]
    pub fn new(kind: EntityKind, depends_on: Vec<Dependency>) -> Self {
        Self { kind, depends_on }
    }

    /// A node without dependencies.
    #[must_use]
    pub fn root(kind: EntityKind) -> Self {
        Self::new(kind, Vec::new())
    }
}

/// Errors raised when declaring an invalid chain.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    /// The same kind is declared twice.
    #[error("duplicate chain node: {0}")]
    DuplicateNode(EntityKind),

    /// A node depends on a kind not declared earlier in the chain.
    #[error("node {node} depends on {dependency}, which is not declared before it")]
    ForwardDependency {
        node: EntityKind,
        dependency: EntityKind,
    },
}

/// A validated, ordered dependency chain.
///
/// Every node's dependencies are declared earlier in the chain, so
/// executing nodes in declaration order is a topological order by
/// construction.
#[derive(Debug, Clone)]
pub struct DependencyChain {
    nodes: Vec<NodeSpec>,
}

impl DependencyChain {
    /// Validate and construct a chain.
    pub fn new(nodes: Vec<NodeSpec>) -> Result<Self, ChainError> {
        let mut seen: Vec<EntityKind> = Vec::with_capacity(nodes.len());

        for node in &nodes {
            if seen.contains(&node.kind) {
                return Err(ChainError::DuplicateNode(node.kind));
            }
            for dep in &node.depends_on {
                if !seen.contains(&dep.kind) {
                    return Err(ChainError::ForwardDependency {
                        node: node.kind,
                        dependency: dep.kind,
                    });
                }
            }
            seen.push(node.kind);
        }

        Ok(Self { nodes })
    }

    /// Nodes in resolution order.
    #[must_use]
    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    /// The declared spec for one kind, if present.
    #[must_use]
    pub fn spec(&self, kind: EntityKind) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.kind == kind)
    }

    /// The chain used by the customer-record importers and the CRM
    /// export: address → contact → account → customer role →
    /// agreement → product.
    #[must_use]
    pub fn customer_chain() -> Self {
        Self::new(vec![
            NodeSpec::root(EntityKind::Address),
            NodeSpec::new(
                EntityKind::Contact,
                vec![Dependency::optional(EntityKind::Address)],
            ),
            NodeSpec::new(
                EntityKind::Account,
                vec![Dependency::required(EntityKind::Contact)],
            ),
            NodeSpec::new(
                EntityKind::CustomerRole,
                vec![
                    Dependency::required(EntityKind::Contact),
                    Dependency::required(EntityKind::Account),
                ],
            ),
            NodeSpec::new(
                EntityKind::Agreement,
                vec![
                    Dependency::required(EntityKind::Account),
                    Dependency::optional(EntityKind::Address),
                ],
            ),
            NodeSpec::new(
                EntityKind::Product,
                vec![Dependency::required(EntityKind::Agreement)],
            ),
        ])
        .expect("customer chain is well-formed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_chain_is_valid() {
        let chain = DependencyChain::customer_chain();
        assert_eq!(chain.nodes().len(), 6);
        assert_eq!(chain.nodes()[0].kind, EntityKind::Address);
        assert_eq!(chain.nodes()[5].kind, EntityKind::Product);
    }

    #[test]
    fn test_rejects_duplicate_node() {
        let err = DependencyChain::new(vec![
            NodeSpec::root(EntityKind::Contact),
            NodeSpec::root(EntityKind::Contact),
        ])
        .unwrap_err();
        assert_eq!(err, ChainError::DuplicateNode(EntityKind::Contact));
    }

    #[test]
    fn test_rejects_forward_dependency() {
        let err = DependencyChain::new(vec![
            NodeSpec::new(
                EntityKind::Account,
                vec![Dependency::required(EntityKind::Contact)],
            ),
            NodeSpec::root(EntityKind::Contact),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ChainError::ForwardDependency {
                node: EntityKind::Account,
                dependency: EntityKind::Contact,
            }
        );
    }

    #[test]
    fn test_rejects_self_dependency() {
        let err = DependencyChain::new(vec![NodeSpec::new(
            EntityKind::Contact,
            vec![Dependency::required(EntityKind::Contact)],
        )])
        .unwrap_err();
        assert!(matches!(err, ChainError::ForwardDependency { .. }));
    }

    #[test]
    fn test_spec_lookup() {
        let chain = DependencyChain::customer_chain();
        let role = chain.spec(EntityKind::CustomerRole).unwrap();
        assert_eq!(role.depends_on.len(), 2);
        assert!(chain.spec(EntityKind::Organisation).is_none());
    }
}
