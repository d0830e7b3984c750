//! Azure Verified Modules shared interfaces
//!
//! Interface contracts for the module variables AVM standardises across
//! modules. Like [crate::waf] this is data; [crate::conform] does the
//! comparing.
use crate::check::Severity;
use crate::conform::InterfaceSpec;
use crate::value::Value;
use indexmap::IndexMap;

const SHARED_INTERFACES: &str =
    "https://azure.github.io/Azure-Verified-Modules/specs/shared/interfaces";

pub fn interfaces() -> Vec<InterfaceSpec> {
    vec![InterfaceSpec {
        rule: "interface_managed_identities".to_string(),
        name: "managed_identities".to_string(),
        type_definition: "object({\n  kind = string\n  name = optional(string, null)\n})"
            .to_string(),
        default: Some(Value::Object(IndexMap::new())),
        strict: false,
        enabled: true,
        severity: Severity::Error,
        link: format!("{SHARED_INTERFACES}/#managed-identities"),
    }]
}
