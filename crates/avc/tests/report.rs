//! Rendered report shapes
//!
//! Locks the text rendering, the report ordering and the serde layout of
//! violations against one module that trips a bit of everything.

use avc::check::Violation;
use avc::document::ModuleDocument;
use avc::hcl_sources;
use avc::registry::Registry;

fn violations() -> Vec<Violation> {
    let sources = hcl_sources!(
        r#"
        variable "managed_identities" {
          type = object({
            kind = number
          })
          default = {}
        }

        resource "azurerm_storage_account" "example" {
          account_replication_type = "LRS"
        }

        resource "azurerm_lb" "main" {
          sku = "Basic"
        }

        resource "azurerm_public_ip" "ip" {
          zones = [2, 3]
        }

        resource "azurerm_virtual_machine" "vm" {
        }
        "#
    );
    let document = ModuleDocument::new(&sources).expect("module parses");
    avc::engine::run(&document, &Registry::builtin())
}

#[test]
fn text_report_renders_one_line_per_violation() {
    let rendered = violations()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");

    insta::assert_snapshot!(rendered, @r###"
error: var.managed_identities: variable `managed_identities` does not match the expected type definition: attribute `kind`: expected string, found number [interface_managed_identities]
warning: azurerm_storage_account.example: LRS is an invalid attribute value of `account_replication_type` - expecting (one of) [GRS ZRS] [azurerm_storage_account_account_replication_type]
warning: azurerm_lb.main: Basic is an invalid attribute value of `sku` - expecting (one of) [Standard] [azurerm_lb_sku]
warning: azurerm_public_ip.ip: "[2 3]" is an invalid attribute value of `zones` - expecting (one of) [[1 2 3]] [azurerm_public_ip_zones]
warning: azurerm_virtual_machine.vm: The attribute `zone` must be specified [azurerm_virtual_machine_zone]
"###);
}

#[test]
fn interfaces_report_before_resources_in_document_order() {
    let rules: Vec<String> = violations()
        .into_iter()
        .map(|violation| violation.rule)
        .collect();

    insta::assert_yaml_snapshot!(rules, @r###"
---
- interface_managed_identities
- azurerm_storage_account_account_replication_type
- azurerm_lb_sku
- azurerm_public_ip_zones
- azurerm_virtual_machine_zone
"###);
}

#[test]
fn violations_serialize_for_machine_sinks() {
    let violations = violations();
    let json = serde_json::to_value(&violations[1]).expect("violation serializes");

    assert_eq!(json["rule"], "azurerm_storage_account_account_replication_type");
    assert_eq!(json["severity"], "warning");
    assert_eq!(json["address"], "azurerm_storage_account.example");
    assert_eq!(json["attribute"], "account_replication_type");
    assert!(json["link"]
        .as_str()
        .is_some_and(|link| link.contains("Azure-Proactive-Resiliency-Library")));
    // inline sources have no path, but the byte range is real
    assert_eq!(json["range"]["path"], serde_json::Value::Null);
    assert!(json["range"]["start"].as_u64() < json["range"]["end"].as_u64());

    let yaml = serde_yaml::to_string(&violations[4]).expect("violation serializes");
    assert!(yaml.contains("rule: azurerm_virtual_machine_zone"));
    assert!(yaml.contains("severity: warning"));
}
