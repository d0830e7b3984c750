//! Well-Architected rules for `azurerm` resources
//!
//! Each rule pins one resource attribute to the values the Azure Proactive
//! Resiliency Library recommends. Data only; evaluation lives in
//! [crate::check] and [crate::engine].
use crate::check::{ConstraintSpec, Severity};
use crate::value::Value;

const APRL: &str = "https://azure.github.io/Azure-Proactive-Resiliency-Library-v2/azure-resources";

pub fn rules() -> Vec<ConstraintSpec> {
    let rules = vec![
        ConstraintSpec::set_one_of(
            "azurerm_application_gateway_zones",
            "azurerm_application_gateway",
            "zones",
            vec![vec![1, 2, 3].into()],
            format!("{APRL}/Network/applicationGateways/"),
        ),
        ConstraintSpec::one_of(
            "azurerm_application_gateway_sku_name",
            "azurerm_application_gateway",
            "sku.name",
            vec!["Standard_v2".into(), "WAF_v2".into()],
            format!("{APRL}/Network/applicationGateways/"),
        ),
        ConstraintSpec::set_one_of(
            "azurerm_kubernetes_cluster_zones",
            "azurerm_kubernetes_cluster",
            "zones",
            vec![vec![1, 2, 3].into()],
            format!("{APRL}/ContainerService/managedClusters/"),
        ),
        ConstraintSpec::one_of(
            "azurerm_lb_sku",
            "azurerm_lb",
            "sku",
            vec!["Standard".into()],
            format!("{APRL}/Network/loadBalancers/#use-standard-load-balancer-sku"),
        ),
        ConstraintSpec::one_of(
            "azurerm_public_ip_sku",
            "azurerm_public_ip",
            "sku",
            vec!["Standard".into()],
            format!("{APRL}/Network/publicIPAddresses/"),
        ),
        ConstraintSpec::set_one_of(
            "azurerm_public_ip_zones",
            "azurerm_public_ip",
            "zones",
            vec![vec![1, 2, 3].into()],
            format!("{APRL}/Network/publicIPAddresses/"),
        ),
        ConstraintSpec::one_of(
            "azurerm_service_plan_zone_balancing_enabled",
            "azurerm_service_plan",
            "zone_balancing_enabled",
            vec![true.into()],
            format!("{APRL}/Web/serverFarms/"),
        ),
        ConstraintSpec::one_of(
            "azurerm_storage_account_account_replication_type",
            "azurerm_storage_account",
            "account_replication_type",
            vec!["GRS".into(), "ZRS".into()],
            format!("{APRL}/Storage/storageAccounts/"),
        ),
        ConstraintSpec::required(
            "azurerm_virtual_machine_zone",
            "azurerm_virtual_machine",
            "zone",
            format!("{APRL}/Compute/virtualMachines/"),
        ),
        ConstraintSpec::one_of(
            "azurerm_virtual_network_gateway_sku",
            "azurerm_virtual_network_gateway",
            "sku",
            vec![
                "ErGw1AZ".into(),
                "ErGw2AZ".into(),
                "ErGw3AZ".into(),
                "VpnGw1AZ".into(),
                "VpnGw2AZ".into(),
                "VpnGw3AZ".into(),
                "VpnGw4AZ".into(),
                "VpnGw5AZ".into(),
            ],
            format!("{APRL}/Network/virtualNetworkGateways/"),
        ),
        ConstraintSpec::one_of(
            "azurerm_virtual_network_gateway_active_active",
            "azurerm_virtual_network_gateway",
            "active_active",
            vec![true.into()],
            format!("{APRL}/Network/virtualNetworkGateways/"),
        ),
    ];

    // resiliency alignment is a recommendation; interface contracts are the
    // hard requirements
    rules
        .into_iter()
        .map(|rule| rule.with_severity(Severity::Warning))
        .collect()
}
