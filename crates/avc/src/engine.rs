//! the evaluation pipeline
//!
//! [run] walks a [ModuleDocument] against a [Registry]: interface contracts
//! over the variable declarations first, then every registered constraint
//! against every matching resource block. Resolution, normalization and
//! comparison all happen per attribute value; nothing here mutates the
//! document and nothing is carried between runs.
use crate::check::{check, Violation};
use crate::conform;
use crate::document::ModuleDocument;
use crate::registry::Registry;
use crate::resolve::{resolve, ResolutionResult, ResolveContext};
use crate::typeexpr;

pub fn run(document: &ModuleDocument, registry: &Registry) -> Vec<Violation> {
    let mut violations = Vec::new();

    for interface in registry.interfaces() {
        if !interface.enabled {
            continue;
        }
        let Some(declaration) = document.variable(&interface.name) else {
            continue;
        };
        let schema = match typeexpr::from_str(&interface.type_definition) {
            Ok(schema) => schema,
            Err(error) => {
                debug_assert!(false, "interface {} is malformed: {error}", interface.rule);
                tracing::warn!(
                    rule = interface.rule.as_str(),
                    %error,
                    "malformed interface type definition, skipping"
                );
                continue;
            }
        };

        if let Err(mismatch) = conform::check_variable(
            declaration,
            &schema,
            interface.default.as_ref(),
            interface.strict,
        ) {
            tracing::debug!(
                rule = interface.rule.as_str(),
                variable = interface.name.as_str(),
                %mismatch,
                "interface contract violated"
            );
            violations.push(Violation {
                rule: interface.rule.clone(),
                severity: interface.severity,
                message: format!(
                    "variable `{}` does not match the expected type definition: {mismatch}",
                    interface.name
                ),
                address: format!("var.{}", interface.name),
                attribute: interface.name.clone(),
                link: interface.link.clone(),
                range: declaration.span.clone(),
            });
        }
    }

    for resource in document.resources() {
        for spec in registry.rules_for(&resource.resource_type) {
            let values = resource.values(&spec.attribute);
            if values.is_empty() {
                // only presence rules can flag an attribute that is not there
                for violation in check(&ResolutionResult::unresolvable(), spec) {
                    violations.push(violation.locate(&resource.address(), resource.span.clone()));
                }
                continue;
            }

            let context = ResolveContext::for_resource(document, resource);
            for value in values {
                let result = resolve(&value.node, &context);
                for violation in check(&result, spec) {
                    violations.push(violation.locate(&resource.address(), value.span.clone()));
                }
            }
        }
    }

    tracing::debug!(
        resources = document.resources().len(),
        violations = violations.len(),
        "evaluation finished"
    );
    violations
}
