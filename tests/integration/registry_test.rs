//! Capability Registry Integration Tests
//!
//! Resolution determinism, family scoping and route ordering.

use ran_assistant_core::{
    BackendKind, CapabilityFamily, CapabilityId, CapabilityRegistry, FailureKind, Vendor,
};
use ran_assistant_tools::{extract_identifier, TemplateCatalog};

// ============================================================================
// Catalog shape
// ============================================================================

#[test]
fn test_builtin_catalog_shape() {
    let registry = CapabilityRegistry::builtin();
    assert_eq!(registry.len(), 18);
    assert_eq!(registry.in_family(CapabilityFamily::NetworkConfig).count(), 9);
    assert_eq!(registry.in_family(CapabilityFamily::RecommendedConfig).count(), 7);
    assert_eq!(registry.in_family(CapabilityFamily::Misalignment).count(), 2);
}

#[test]
fn test_every_capability_has_one_distinct_fallback_hop() {
    let registry = CapabilityRegistry::builtin();
    for capability in registry.entries() {
        assert_ne!(
            capability.primary.backend, capability.secondary.backend,
            "{} falls back to its own backend",
            capability.key
        );
        assert_ne!(capability.primary.template_id, capability.secondary.template_id);
    }
}

#[test]
fn test_every_route_has_a_template() {
    let registry = CapabilityRegistry::builtin();
    let templates = TemplateCatalog::from_registry(&registry);
    for capability in registry.entries() {
        for route in [&capability.primary, &capability.secondary] {
            let template = templates
                .get(&route.template_id)
                .unwrap_or_else(|| panic!("missing template {}", route.template_id));
            assert_eq!(template.backend, route.backend);
            assert_eq!(template.table, route.table);
        }
    }
}

#[test]
fn test_vendor_tags_follow_keys() {
    let registry = CapabilityRegistry::builtin();
    for capability in registry.entries() {
        if capability.key.starts_with("mavenir_") {
            assert_eq!(capability.vendor, Some(Vendor::Mavenir));
        } else if capability.key.starts_with("samsung_") {
            assert_eq!(capability.vendor, Some(Vendor::Samsung));
        } else {
            assert_eq!(capability.vendor, None);
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_ret_state_never_resolves_to_topology() {
    let registry = CapabilityRegistry::builtin();
    let text = "Use hive.ran_cm.ran_ret_state_12hr for antenna tilt.";
    for _ in 0..50 {
        let id = extract_identifier(text).unwrap();
        let capability = registry
            .resolve(CapabilityFamily::NetworkConfig, &id.normalized)
            .unwrap();
        assert_eq!(capability.id, CapabilityId::RetState12hr);
    }

    let topology = registry
        .resolve(CapabilityFamily::NetworkConfig, "ran_topology")
        .unwrap();
    assert_eq!(topology.id, CapabilityId::Topology);
}

#[test]
fn test_ambiguous_identifier_resolves_by_declaration_order() {
    let registry = CapabilityRegistry::builtin();
    // "mavenir_gpl" is contained in all four Mavenir GPL keys.
    for _ in 0..10 {
        let capability = registry
            .resolve(CapabilityFamily::RecommendedConfig, "mavenir_gpl")
            .unwrap();
        assert_eq!(capability.id, CapabilityId::MavenirGplCucp);
    }
}

#[test]
fn test_containment_works_both_ways() {
    let registry = CapabilityRegistry::builtin();
    // identifier contains the key
    let longer = registry
        .resolve(CapabilityFamily::Misalignment, "samsung_misalignment_v2")
        .unwrap();
    assert_eq!(longer.id, CapabilityId::SamsungMisalignment);
    // key contains the identifier
    let shorter = registry
        .resolve(CapabilityFamily::RecommendedConfig, "SAMSUNG_GPL_D")
        .unwrap();
    assert_eq!(shorter.id, CapabilityId::SamsungGplDu);
}

#[test]
fn test_resolution_is_scoped_to_family() {
    let registry = CapabilityRegistry::builtin();
    let failure = registry
        .resolve(CapabilityFamily::RecommendedConfig, "mavenir_du_config")
        .unwrap_err();
    assert_eq!(failure.reason, FailureKind::NoToolMatch);

    let failure = registry
        .resolve(CapabilityFamily::NetworkConfig, "   ")
        .unwrap_err();
    assert_eq!(failure.reason, FailureKind::NoIdentifier);
}

// ============================================================================
// Namespace ownership
// ============================================================================

#[test]
fn test_namespace_owner_reorders_routes() {
    let registry = CapabilityRegistry::builtin();
    let capability = registry.get(CapabilityId::Topology).unwrap();

    let (primary, secondary) = capability.routes_for(Some(BackendKind::Postgres));
    assert_eq!(primary.backend, BackendKind::Postgres);
    assert_eq!(secondary.backend, BackendKind::Trino);

    let (primary, _) = capability.routes_for(Some(BackendKind::Trino));
    assert_eq!(primary.backend, BackendKind::Trino);

    // an owner unrelated to either route leaves the default order
    let (primary, secondary) = capability.routes_for(Some(BackendKind::Sqlite));
    assert_eq!(primary.backend, BackendKind::Trino);
    assert_eq!(secondary.backend, BackendKind::Postgres);
}

#[test]
fn test_identifier_namespaces_map_to_backends() {
    let cases = [
        ("hive.ran_cm.ran_topology", Some(BackendKind::Trino)),
        ("iceberg.ran_cm.samsung_du_config", Some(BackendKind::Trino)),
        ("gpl.samsung_gpl_rru", Some(BackendKind::Postgres)),
        ("audit.mavenir_misalignment", Some(BackendKind::Postgres)),
        ("cm_snapshot.ran_topology", Some(BackendKind::Postgres)),
        ("mavenir_cuup_config", None),
    ];
    for (text, owner) in cases {
        let id = extract_identifier(text).unwrap();
        assert_eq!(id.owner(), owner, "{}", text);
    }
}
