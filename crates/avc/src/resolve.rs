//! attribute value resolution
//!
//! Turns a classified expression into the set of concrete values it can take
//! within the module, without any knowledge of plan-time inputs:
//! - literals resolve to themselves
//! - `var.x` resolves through the declared default, following chains of
//!   variable-to-variable defaults (with loop detection)
//! - `each.value` resolves by enumerating the members of the enclosing
//!   `for_each` collection, one value per distinct member
//!
//! Resolution never fails loudly. Whatever we cannot pin down statically is
//! reported as unresolvable and the caller skips the check. An explicit `null`
//! is a resolved value, not an unresolvable one.
use crate::document::{ModuleDocument, ResourceBlock};
use crate::expr::ExpressionNode;
use crate::value::Value;

/// Everything a single expression can resolve to
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionResult {
    pub values: Vec<ResolvedValue>,
    /// `false` when the expression (or its `for_each` source) could not be
    /// followed; `values` is empty in that case
    pub resolvable: bool,
}

impl ResolutionResult {
    pub fn of(values: Vec<ResolvedValue>) -> Self {
        Self {
            values,
            resolvable: true,
        }
    }

    pub fn unresolvable() -> Self {
        Self {
            values: Vec::new(),
            resolvable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedValue {
    pub value: Value,
    pub origin: Origin,
}

/// Where a resolved value came from
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    Literal,
    Variable { name: String },
    Iteration { key: String },
}

/// Lookup scope for a resolution
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    document: &'a ModuleDocument,
    for_each: Option<&'a ExpressionNode>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(document: &'a ModuleDocument) -> Self {
        Self {
            document,
            for_each: None,
        }
    }

    /// Scope with the resource's `for_each` binding (if any)
    pub fn for_resource(document: &'a ModuleDocument, resource: &'a ResourceBlock) -> Self {
        Self {
            document,
            for_each: resource.for_each.as_ref().map(|value| &value.node),
        }
    }
}

pub fn resolve(node: &ExpressionNode, context: &ResolveContext<'_>) -> ResolutionResult {
    match node {
        ExpressionNode::Literal(value) => ResolutionResult::of(vec![ResolvedValue {
            value: value.clone(),
            origin: Origin::Literal,
        }]),
        ExpressionNode::Variable(name) => match chase_default(name, context.document) {
            Some(value) => ResolutionResult::of(vec![ResolvedValue {
                value,
                origin: Origin::Variable { name: name.clone() },
            }]),
            None => ResolutionResult::unresolvable(),
        },
        ExpressionNode::EachValue => {
            let Some(source) = context.for_each else {
                tracing::debug!("each.value used without a for_each in scope");
                return ResolutionResult::unresolvable();
            };

            // for_each itself cannot reference each.value
            let source_result = resolve(source, &ResolveContext::new(context.document));
            if !source_result.resolvable {
                return ResolutionResult::unresolvable();
            }
            match source_result.values.first() {
                Some(collection) => enumerate(&collection.value),
                None => ResolutionResult::unresolvable(),
            }
        }
        ExpressionNode::Unsupported => ResolutionResult::unresolvable(),
    }
}

/// Follows `var.<name>` through declared defaults
///
/// A default may itself be a `var.<other>` reference, so this walks the chain
/// until it hits a literal. Visited names are tracked to catch declaration
/// loops, which resolve to nothing rather than hanging.
fn chase_default(name: &str, document: &ModuleDocument) -> Option<Value> {
    let mut visited: Vec<&str> = Vec::new();
    let mut current = name;

    loop {
        if visited.contains(&current) {
            tracing::debug!(variable = name, "default chain loops, giving up");
            return None;
        }
        visited.push(current);

        let declaration = document.variable(current)?;
        match &declaration.default {
            Some(ExpressionNode::Literal(value)) => return Some(value.clone()),
            Some(ExpressionNode::Variable(next)) => current = next,
            Some(_) | None => return None,
        }
    }
}

/// One resolved value per distinct collection member
fn enumerate(collection: &Value) -> ResolutionResult {
    match collection {
        Value::Array(items) => {
            let mut seen: Vec<&Value> = Vec::new();
            let mut values = Vec::new();
            for item in items {
                // for_each semantics are set semantics; duplicates collapse
                if seen.contains(&item) {
                    continue;
                }
                seen.push(item);
                values.push(ResolvedValue {
                    value: item.clone(),
                    origin: Origin::Iteration {
                        key: iteration_key(item),
                    },
                });
            }
            ResolutionResult::of(values)
        }
        Value::Object(entries) => ResolutionResult::of(
            entries
                .iter()
                .map(|(key, value)| ResolvedValue {
                    value: value.clone(),
                    origin: Origin::Iteration { key: key.clone() },
                })
                .collect(),
        ),
        other => {
            tracing::debug!(?other, "for_each source is not a collection");
            ResolutionResult::unresolvable()
        }
    }
}

fn iteration_key(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::ModuleDocument;
    use crate::hcl_sources;
    use pretty_assertions::assert_eq;

    fn module(content: &str) -> ModuleDocument {
        ModuleDocument::new(&hcl_sources! {content}).expect("module must parse")
    }

    fn values_of(result: &ResolutionResult) -> Vec<Value> {
        result
            .values
            .iter()
            .map(|resolved| resolved.value.clone())
            .collect()
    }

    #[test]
    fn literal_resolves_to_itself() {
        let document = module("");
        let context = ResolveContext::new(&document);

        let result = resolve(&ExpressionNode::Literal("Standard".into()), &context);
        assert!(result.resolvable);
        assert_eq!(values_of(&result), vec![Value::from("Standard")]);
        assert_eq!(result.values[0].origin, Origin::Literal);
    }

    #[test]
    fn explicit_null_literal_is_a_value() {
        let document = module("");
        let context = ResolveContext::new(&document);

        let result = resolve(&ExpressionNode::Literal(Value::Null), &context);
        assert!(result.resolvable);
        assert_eq!(values_of(&result), vec![Value::Null]);
    }

    #[test]
    fn variable_resolves_through_default() {
        let document = module(
            r#"
            variable "sku" {
              type    = string
              default = "Standard"
            }
            "#,
        );
        let context = ResolveContext::new(&document);

        let result = resolve(&ExpressionNode::Variable("sku".to_string()), &context);
        assert!(result.resolvable);
        assert_eq!(values_of(&result), vec![Value::from("Standard")]);
        assert_eq!(
            result.values[0].origin,
            Origin::Variable {
                name: "sku".to_string()
            }
        );
    }

    #[test]
    fn variable_with_null_default_resolves_to_null() {
        let document = module(
            r#"
            variable "replication" {
              type    = string
              default = null
            }
            "#,
        );
        let context = ResolveContext::new(&document);

        let result = resolve(&ExpressionNode::Variable("replication".to_string()), &context);
        assert!(result.resolvable);
        assert_eq!(values_of(&result), vec![Value::Null]);
    }

    #[test]
    fn variable_without_default_is_unresolvable() {
        let document = module("variable \"sku\" { type = string }");
        let context = ResolveContext::new(&document);

        let result = resolve(&ExpressionNode::Variable("sku".to_string()), &context);
        assert_eq!(result, ResolutionResult::unresolvable());
    }

    #[test]
    fn undeclared_variable_is_unresolvable() {
        let document = module("");
        let context = ResolveContext::new(&document);

        let result = resolve(&ExpressionNode::Variable("ghost".to_string()), &context);
        assert_eq!(result, ResolutionResult::unresolvable());
    }

    #[test]
    fn defaults_chain_across_variables() {
        let document = module(
            r#"
            variable "specific" {
              default = var.general
            }

            variable "general" {
              default = "GRS"
            }
            "#,
        );
        let context = ResolveContext::new(&document);

        let result = resolve(&ExpressionNode::Variable("specific".to_string()), &context);
        assert!(result.resolvable);
        assert_eq!(values_of(&result), vec![Value::from("GRS")]);
        // origin names the referenced variable, not the end of the chain
        assert_eq!(
            result.values[0].origin,
            Origin::Variable {
                name: "specific".to_string()
            }
        );
    }

    #[test]
    fn looping_defaults_are_unresolvable() {
        let document = module(
            r#"
            variable "a" {
              default = var.b
            }

            variable "b" {
              default = var.a
            }
            "#,
        );
        let context = ResolveContext::new(&document);

        let result = resolve(&ExpressionNode::Variable("a".to_string()), &context);
        assert_eq!(result, ResolutionResult::unresolvable());

        // self loop
        let document = module("variable \"me\" { default = var.me }");
        let context = ResolveContext::new(&document);
        let result = resolve(&ExpressionNode::Variable("me".to_string()), &context);
        assert_eq!(result, ResolutionResult::unresolvable());
    }

    #[test]
    fn each_value_enumerates_literal_collection() {
        let document = module(
            r#"
            resource "azurerm_storage_account" "example" {
              for_each = ["GRS", "ZRS", "GRS"]
              account_replication_type = each.value
            }
            "#,
        );
        let resource = &document.resources()[0];
        let context = ResolveContext::for_resource(&document, resource);

        let result = resolve(&ExpressionNode::EachValue, &context);
        assert!(result.resolvable);
        // duplicates collapse
        assert_eq!(
            values_of(&result),
            vec![Value::from("GRS"), Value::from("ZRS")]
        );
        assert_eq!(
            result.values[0].origin,
            Origin::Iteration {
                key: "GRS".to_string()
            }
        );
    }

    #[test]
    fn each_value_enumerates_variable_default() {
        let document = module(
            r#"
            variable "skus" {
              type    = list(string)
              default = ["Standard_v2", "WAF_v2"]
            }

            resource "azurerm_application_gateway" "example" {
              for_each = var.skus
              sku {
                name = each.value
              }
            }
            "#,
        );
        let resource = &document.resources()[0];
        let context = ResolveContext::for_resource(&document, resource);

        let result = resolve(&ExpressionNode::EachValue, &context);
        assert!(result.resolvable);
        assert_eq!(
            values_of(&result),
            vec![Value::from("Standard_v2"), Value::from("WAF_v2")]
        );
    }

    #[test]
    fn each_value_enumerates_map_entries() {
        let document = module(
            r#"
            resource "azurerm_lb" "example" {
              for_each = { primary = "Standard", legacy = "Basic" }
              sku      = each.value
            }
            "#,
        );
        let resource = &document.resources()[0];
        let context = ResolveContext::for_resource(&document, resource);

        let result = resolve(&ExpressionNode::EachValue, &context);
        assert!(result.resolvable);
        assert_eq!(
            values_of(&result),
            vec![Value::from("Standard"), Value::from("Basic")]
        );
        assert_eq!(
            result.values[0].origin,
            Origin::Iteration {
                key: "primary".to_string()
            }
        );
    }

    #[test]
    fn each_value_without_for_each_is_unresolvable() {
        let document = module(
            r#"
            resource "azurerm_lb" "example" {
              sku = each.value
            }
            "#,
        );
        let resource = &document.resources()[0];
        let context = ResolveContext::for_resource(&document, resource);

        let result = resolve(&ExpressionNode::EachValue, &context);
        assert_eq!(result, ResolutionResult::unresolvable());
    }

    #[test]
    fn each_value_over_function_call_is_unresolvable() {
        let document = module(
            r#"
            variable "skus" {
              default = ["Standard_v2"]
            }

            resource "azurerm_application_gateway" "example" {
              for_each = toset(var.skus)
              sku {
                name = each.value
              }
            }
            "#,
        );
        let resource = &document.resources()[0];
        let context = ResolveContext::for_resource(&document, resource);

        let result = resolve(&ExpressionNode::EachValue, &context);
        assert_eq!(result, ResolutionResult::unresolvable());
    }

    #[test]
    fn each_value_over_scalar_is_unresolvable() {
        let document = module(
            r#"
            resource "azurerm_lb" "example" {
              for_each = "not-a-collection"
              sku      = each.value
            }
            "#,
        );
        let resource = &document.resources()[0];
        let context = ResolveContext::for_resource(&document, resource);

        let result = resolve(&ExpressionNode::EachValue, &context);
        assert_eq!(result, ResolutionResult::unresolvable());
    }

    #[test]
    fn resolution_is_idempotent() {
        let document = module(
            r#"
            variable "zones" {
              default = [1, 2, 3]
            }
            "#,
        );
        let context = ResolveContext::new(&document);
        let node = ExpressionNode::Variable("zones".to_string());

        assert_eq!(resolve(&node, &context), resolve(&node, &context));
    }
}
