//! the rule catalogue
//!
//! A [Registry] is plain data: constraint specs for resource attributes and
//! interface specs for module variables. The engine owns no per-resource
//! knowledge; everything it enforces comes from here. [Registry::builtin]
//! carries the Azure Verified Modules tables, [Registry::new] accepts any
//! other set.
use crate::check::ConstraintSpec;
use crate::conform::InterfaceSpec;
use crate::{interfaces, waf};
use indexmap::IndexMap;

pub struct Registry {
    rules: Vec<ConstraintSpec>,
    interfaces: Vec<InterfaceSpec>,
    by_resource_type: IndexMap<String, Vec<usize>>,
}

impl Registry {
    pub fn new(rules: Vec<ConstraintSpec>, interfaces: Vec<InterfaceSpec>) -> Self {
        debug_assert!(
            rules.iter().all(ConstraintSpec::is_well_formed),
            "registry holds a malformed constraint"
        );

        let mut by_resource_type: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (index, rule) in rules.iter().enumerate() {
            by_resource_type
                .entry(rule.resource_type.clone())
                .or_default()
                .push(index);
        }
        tracing::debug!(
            rules = rules.len(),
            interfaces = interfaces.len(),
            resource_types = by_resource_type.len(),
            "registry built"
        );

        Self {
            rules,
            interfaces,
            by_resource_type,
        }
    }

    /// The Azure Verified Modules rule set
    pub fn builtin() -> Self {
        Self::new(waf::rules(), interfaces::interfaces())
    }

    pub fn rules(&self) -> &[ConstraintSpec] {
        &self.rules
    }

    pub fn interfaces(&self) -> &[InterfaceSpec] {
        &self.interfaces
    }

    /// All rules registered for one resource type, in registration order
    pub fn rules_for(&self, resource_type: &str) -> impl Iterator<Item = &ConstraintSpec> {
        self.by_resource_type
            .get(resource_type)
            .into_iter()
            .flatten()
            .map(|index| &self.rules[*index])
    }
}
