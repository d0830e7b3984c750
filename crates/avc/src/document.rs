//! structural model of a terraform module
//!
//! [ModuleDocument::new] walks all loaded sources and picks up the two block
//! kinds the checks care about: `variable` declarations and `resource` blocks.
//! Nested blocks inside resources are flattened into dot-separated attribute
//! paths (`sku { name = ... }` becomes `sku.name`), which is also how rules
//! address them.
use crate::expr::{self, ExpressionNode};
use crate::hcl_sources::{HclSources, Source};
use crate::typeexpr::{self, TypeExpr};
use hcl_edit::structure::{Block, Body};
use hcl_edit::Span;
use indexmap::IndexMap;
use std::path::PathBuf;

/// A byte range within a named source file
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SourceSpan {
    pub path: Option<PathBuf>,
    pub start: usize,
    pub end: usize,
}

/// All variable declarations and resource blocks of a module
#[derive(Debug, Default)]
pub struct ModuleDocument {
    variables: IndexMap<String, VariableDeclaration>,
    resources: Vec<ResourceBlock>,
}

#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub name: String,
    /// `None` when there is no `type` attribute or its expression is not a
    /// type constraint we understand
    pub declared_type: Option<TypeExpr>,
    pub default: Option<ExpressionNode>,
    pub nullable: bool,
    pub span: Option<SourceSpan>,
}

#[derive(Debug)]
pub struct ResourceBlock {
    pub resource_type: String,
    pub name: String,
    pub for_each: Option<AttributeValue>,
    attributes: IndexMap<String, Vec<AttributeValue>>,
    pub span: Option<SourceSpan>,
}

/// A single attribute assignment, classified and located
#[derive(Debug, Clone)]
pub struct AttributeValue {
    pub node: ExpressionNode,
    pub span: Option<SourceSpan>,
}

impl ModuleDocument {
    pub fn new(sources: &HclSources) -> Result<Self, ModuleIssues> {
        let mut issues = ModuleIssues::new();
        let mut variables: IndexMap<String, VariableDeclaration> = IndexMap::new();
        let mut resources = Vec::new();

        for (index, _source, _attribute) in sources.attributes() {
            issues.log(Issue::RootAttribute(index));
        }

        for (index, source, block) in sources.blocks() {
            match block.ident.value().as_str() {
                "variable" => {
                    if block.labels.is_empty() {
                        issues.log(Issue::VariableLabelMissing(index));
                        continue;
                    }
                    if block.labels.len() > 1 {
                        issues.log(Issue::VariableTooManyLabels(index));
                        continue;
                    }

                    let name = block.labels[0].as_str().to_string();
                    if variables.contains_key(&name) {
                        issues.log(Issue::VariableCollision { name, new: index });
                        continue;
                    }

                    variables.insert(name.clone(), variable_declaration(name, source, block));
                }
                "resource" => {
                    if block.labels.len() != 2 {
                        issues.log(Issue::ResourceLabelsInvalid(index));
                        continue;
                    }

                    resources.push(resource_block(source, block));
                }
                // terraform, provider, locals, output, data, module, ...
                other => tracing::trace!(block = other, "ignoring block"),
            }
        }

        if !issues.issues.is_empty() {
            return Err(issues);
        }

        Ok(Self {
            variables,
            resources,
        })
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDeclaration> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = &VariableDeclaration> {
        self.variables.values()
    }

    pub fn resources(&self) -> &[ResourceBlock] {
        &self.resources
    }
}

impl ResourceBlock {
    /// `azurerm_lb.this`
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }

    /// All assignments of a (possibly nested) attribute path
    ///
    /// Empty when the attribute does not appear anywhere in the block.
    pub fn values(&self, path: &str) -> &[AttributeValue] {
        self.attributes
            .get(path)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn attribute_paths(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }
}

fn variable_declaration(name: String, source: &Source, block: &Block) -> VariableDeclaration {
    let mut declared_type = None;
    let mut default = None;
    let mut nullable = true;

    for attribute in block.body.attributes() {
        let expression: hcl::Expression = attribute.value.clone().into();
        match attribute.key.value().as_str() {
            "type" => match typeexpr::from_expression(&expression) {
                Ok(parsed) => declared_type = Some(parsed),
                Err(error) => {
                    tracing::debug!(variable = name.as_str(), %error, "type constraint not understood")
                }
            },
            "default" => default = Some(expr::classify(&expression)),
            "nullable" => {
                if let hcl::Expression::Bool(value) = expression {
                    nullable = value;
                }
            }
            // description, sensitive, validation blocks, ...
            _ => {}
        }
    }

    let span = span_for(source, block.ident.span());
    VariableDeclaration {
        name,
        declared_type,
        default,
        nullable,
        span,
    }
}

fn resource_block(source: &Source, block: &Block) -> ResourceBlock {
    let resource_type = block.labels[0].as_str().to_string();
    let name = block.labels[1].as_str().to_string();

    let mut for_each = None;
    let mut attributes: IndexMap<String, Vec<AttributeValue>> = IndexMap::new();
    collect_attributes(source, &block.body, "", &mut for_each, &mut attributes);

    let span = span_for(source, block.ident.span());
    ResourceBlock {
        resource_type,
        name,
        for_each,
        attributes,
        span,
    }
}

fn collect_attributes(
    source: &Source,
    body: &Body,
    prefix: &str,
    for_each: &mut Option<AttributeValue>,
    out: &mut IndexMap<String, Vec<AttributeValue>>,
) {
    for attribute in body.attributes() {
        let key = attribute.key.value().as_str();
        let value = AttributeValue {
            node: expr::classify(&attribute.value.clone().into()),
            span: span_for(source, attribute.value.span()),
        };

        if prefix.is_empty() && key == "for_each" {
            *for_each = Some(value);
            continue;
        }

        out.entry(join_path(prefix, key)).or_default().push(value);
    }

    for child in body.blocks() {
        // dynamic blocks iterate with their own scope; we cannot see through them
        if child.ident.value().as_str() == "dynamic" {
            tracing::trace!("skipping dynamic block");
            continue;
        }
        if !child.labels.is_empty() {
            tracing::trace!(
                block = child.ident.value().as_str(),
                "skipping labeled nested block"
            );
            continue;
        }

        let path = join_path(prefix, child.ident.value().as_str());
        collect_attributes(source, &child.body, &path, for_each, out);
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn span_for(source: &Source, range: Option<std::ops::Range<usize>>) -> Option<SourceSpan> {
    range.map(|range| SourceSpan {
        path: source.clone(),
        start: range.start,
        end: range.end,
    })
}

#[derive(derive_new::new, Debug)]
pub struct ModuleIssues {
    #[new(default)]
    issues: Vec<Issue>,
}

impl ModuleIssues {
    pub fn log(&mut self, issue: Issue) {
        tracing::trace!(?issue, "issue found");
        self.issues.push(issue);
    }
}

impl std::error::Error for ModuleIssues {}

impl std::fmt::Display for ModuleIssues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use std::fmt::Debug;
        match self.issues.first() {
            Some(issue) => issue.fmt(f),
            None => f.write_str("no issues"),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Issue {
    RootAttribute(usize),
    VariableLabelMissing(usize),
    VariableTooManyLabels(usize),
    VariableCollision { name: String, new: usize },
    ResourceLabelsInvalid(usize),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hcl_sources;
    use pretty_assertions::assert_eq;

    fn issues_for(sources: HclSources) -> Vec<Issue> {
        ModuleDocument::new(&sources).expect_err("must error").issues
    }

    #[test]
    fn root_attribute_errors() {
        let issues = issues_for(hcl_sources! {"root_attr = 1"});
        assert_eq!(issues, vec![Issue::RootAttribute(0)]);
    }

    #[test]
    fn variable_label_errors() {
        assert_eq!(
            issues_for(hcl_sources! {"variable {}"}),
            vec![Issue::VariableLabelMissing(0)]
        );
        assert_eq!(
            issues_for(hcl_sources! {"variable \"a\" \"b\" {}"}),
            vec![Issue::VariableTooManyLabels(0)]
        );
    }

    #[test]
    fn variable_collision_errors() {
        let issues = issues_for(hcl_sources! {
            "variables.tf" => "variable \"sku\" {}",
            "extra.tf" => "variable \"sku\" {}",
        });
        assert_eq!(
            issues,
            vec![Issue::VariableCollision {
                name: "sku".to_string(),
                new: 1
            }]
        );
    }

    #[test]
    fn resource_label_errors() {
        assert_eq!(
            issues_for(hcl_sources! {"resource \"azurerm_lb\" {}"}),
            vec![Issue::ResourceLabelsInvalid(0)]
        );
    }

    #[test]
    fn unknown_blocks_are_ignored() {
        let document = ModuleDocument::new(&hcl_sources! {r#"
        terraform {
          required_version = ">= 1.5"
        }

        locals {
          sku = "Standard"
        }

        output "id" {
          value = 1
        }
        "#})
        .expect("must parse");

        assert_eq!(document.resources().len(), 0);
        assert_eq!(document.variables().count(), 0);
    }

    #[test]
    fn variable_declarations_are_modelled() {
        let document = ModuleDocument::new(&hcl_sources! {r#"
        variable "sku" {
          type     = string
          default  = "Standard"
          nullable = false
        }

        variable "zones" {
          description = "zones to use"
        }
        "#})
        .expect("must parse");

        let sku = document.variable("sku").expect("sku must exist");
        assert_eq!(sku.declared_type, Some(TypeExpr::String));
        assert_eq!(sku.default, Some(ExpressionNode::Literal("Standard".into())));
        assert!(!sku.nullable);
        assert!(sku.span.is_some());

        let zones = document.variable("zones").expect("zones must exist");
        assert_eq!(zones.declared_type, None);
        assert_eq!(zones.default, None);
        assert!(zones.nullable);
    }

    #[test]
    fn nested_blocks_flatten_to_dotted_paths() {
        let document = ModuleDocument::new(&hcl_sources! {r#"
        resource "azurerm_application_gateway" "example" {
          for_each = var.skus

          zones = [1, 2, 3]

          sku {
            name = each.value
            tier = "regional"
          }

          sku {
            name = "WAF_v2"
          }
        }
        "#})
        .expect("must parse");

        let resource = &document.resources()[0];
        assert_eq!(resource.address(), "azurerm_application_gateway.example");
        assert_eq!(
            resource.for_each.as_ref().map(|value| value.node.clone()),
            Some(ExpressionNode::Variable("skus".to_string()))
        );
        assert_eq!(resource.values("zones").len(), 1);
        assert_eq!(resource.values("sku.name").len(), 2);
        assert_eq!(resource.values("sku.tier").len(), 1);
        assert_eq!(resource.values("sku.name")[0].node, ExpressionNode::EachValue);
        assert!(resource.values("sku.name")[1].span.is_some());
        assert!(resource.values("absent").is_empty());
    }

    #[test]
    fn dynamic_blocks_are_skipped() {
        let document = ModuleDocument::new(&hcl_sources! {r#"
        resource "azurerm_lb" "example" {
          dynamic "frontend_ip_configuration" {
            for_each = var.frontends
            content {
              name = frontend_ip_configuration.value
            }
          }
        }
        "#})
        .expect("must parse");

        let resource = &document.resources()[0];
        assert_eq!(resource.attribute_paths().count(), 0);
        assert!(resource.for_each.is_none());
    }
}
