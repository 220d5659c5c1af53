//! Placement-policy decision logic.
//!
//! Deciding which placement policy a client should run is separated from
//! applying that decision. [`decide_placement`] is a pure function over the
//! service configuration; the factory applies the resulting
//! [`PlacementDecision`] by writing properties and binding cache slots.

use crate::core::config::ServiceConfig;
use std::collections::BTreeMap;

/// Property key naming the DNS resolver used for rack mapping.
pub const PROP_DNS_RESOLVER_CLASS: &str = "placement.dns_resolver_class";

/// Property key toggling region placement validation.
pub const PROP_REGION_ENABLE_VALIDATION: &str = "placement.region.enable_validation";

/// Property key listing the regions writes may land in.
pub const PROP_REGION_REGIONS_TO_WRITE: &str = "placement.region.regions_to_write";

/// Property key for the minimum region spread required for durability.
pub const PROP_REGION_MIN_REGIONS_FOR_DURABILITY: &str =
    "placement.region.min_regions_for_durability";

/// Property key toggling durability enforcement on replica replacement.
pub const PROP_REGION_ENFORCE_DURABILITY_IN_REPLACE: &str =
    "placement.region.enforce_durability_in_replace";

/// Property key carrying the primary isolation groups.
pub const PROP_ISOLATION_GROUPS: &str = "placement.isolation.groups";

/// Property key carrying the secondary isolation groups.
pub const PROP_SECONDARY_ISOLATION_GROUPS: &str = "placement.isolation.secondary_groups";

/// Default DNS resolver: maps nodes to racks from coordination metadata.
pub const RACK_AFFINITY_RESOLVER: &str = "coordination-rack-affinity-resolver";

/// Placement policy selector handed to the ensemble client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementPolicy {
    /// Spread replicas across racks.
    RackAware,
    /// Spread replicas across geographic regions.
    RegionAware,
    /// Restrict placement to configured isolation groups.
    IsolationGroups,
    /// Caller-supplied policy, named by its registration key.
    Custom(String),
}

/// Which factory cache slot a decision binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPurpose {
    /// Rack and region metadata.
    RackAwareness,
    /// Isolation-group metadata, when rack awareness is off.
    Isolation,
    /// Dedicated slot for explicitly overridden policies.
    Override,
}

/// Outcome of a placement decision.
///
/// Derived per call, never stored. At most one slot is bound: the client
/// configuration carries a single topology-cache handle, and composing
/// branches share it rather than creating a second cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementDecision {
    /// Effective policy class, if any. `None` leaves the builder default.
    pub policy: Option<PlacementPolicy>,

    /// Policy properties to write onto the client configuration.
    pub properties: BTreeMap<String, String>,

    /// Cache slot whose handle backs the selected policy.
    pub slot: Option<SlotPurpose>,
}

/// Decide the placement policy for one client construction.
///
/// An explicit override is terminal: the automatic rules do not run. The
/// automatic rules evaluate in fixed order; rack/region awareness and
/// isolation groups compose, with isolation winning the policy class.
pub fn decide_placement(
    conf: &ServiceConfig,
    policy_override: Option<&PlacementPolicy>,
) -> PlacementDecision {
    if let Some(policy) = policy_override {
        return PlacementDecision {
            policy: Some(policy.clone()),
            properties: BTreeMap::new(),
            slot: Some(SlotPurpose::Override),
        };
    }

    let mut decision = PlacementDecision::default();
    let placement = &conf.placement;

    if placement.rack_awareness_enabled || placement.region_awareness_enabled {
        if placement.region_awareness_enabled {
            decision.policy = Some(PlacementPolicy::RegionAware);
            decision.properties.insert(
                PROP_REGION_ENABLE_VALIDATION.to_string(),
                overlay_or(conf, PROP_REGION_ENABLE_VALIDATION, "true"),
            );
            if let Some(regions) = conf.properties.get(PROP_REGION_REGIONS_TO_WRITE) {
                decision
                    .properties
                    .insert(PROP_REGION_REGIONS_TO_WRITE.to_string(), regions.clone());
            }
            decision.properties.insert(
                PROP_REGION_MIN_REGIONS_FOR_DURABILITY.to_string(),
                overlay_or(conf, PROP_REGION_MIN_REGIONS_FOR_DURABILITY, "2"),
            );
            decision.properties.insert(
                PROP_REGION_ENFORCE_DURABILITY_IN_REPLACE.to_string(),
                overlay_or(conf, PROP_REGION_ENFORCE_DURABILITY_IN_REPLACE, "true"),
            );
        } else {
            decision.policy = Some(PlacementPolicy::RackAware);
        }
        decision.properties.insert(
            PROP_DNS_RESOLVER_CLASS.to_string(),
            overlay_or(conf, PROP_DNS_RESOLVER_CLASS, RACK_AFFINITY_RESOLVER),
        );
        decision.slot = Some(SlotPurpose::RackAwareness);
    }

    let groups = placement.trimmed_isolation_groups();
    if !groups.is_empty() {
        decision.policy = Some(PlacementPolicy::IsolationGroups);
        decision
            .properties
            .insert(PROP_ISOLATION_GROUPS.to_string(), groups.join(","));
        decision.properties.insert(
            PROP_SECONDARY_ISOLATION_GROUPS.to_string(),
            placement.trimmed_secondary_isolation_groups().join(","),
        );
        if decision.slot.is_none() {
            decision.slot = Some(SlotPurpose::Isolation);
        }
    }

    decision
}

fn overlay_or(conf: &ServiceConfig, key: &str, default: &str) -> String {
    conf.properties
        .get(key)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ServiceConfig {
        ServiceConfig::from_toml(
            r#"
[coordination]
servers = "coord1:2181,coord2:2181"
"#,
        )
        .unwrap()
    }

    #[test]
    fn no_toggles_leaves_builder_default() {
        let conf = base_config();
        let decision = decide_placement(&conf, None);
        assert_eq!(decision, PlacementDecision::default());
    }

    #[test]
    fn rack_awareness_selects_rack_policy_and_resolver() {
        let mut conf = base_config();
        conf.placement.rack_awareness_enabled = true;

        let decision = decide_placement(&conf, None);
        assert_eq!(decision.policy, Some(PlacementPolicy::RackAware));
        assert_eq!(decision.slot, Some(SlotPurpose::RackAwareness));
        assert_eq!(
            decision.properties.get(PROP_DNS_RESOLVER_CLASS).unwrap(),
            RACK_AFFINITY_RESOLVER
        );
        assert!(!decision.properties.contains_key(PROP_REGION_ENABLE_VALIDATION));
    }

    #[test]
    fn region_awareness_defaults_the_tunables() {
        let mut conf = base_config();
        conf.placement.region_awareness_enabled = true;

        let decision = decide_placement(&conf, None);
        assert_eq!(decision.policy, Some(PlacementPolicy::RegionAware));
        assert_eq!(
            decision.properties.get(PROP_REGION_ENABLE_VALIDATION).unwrap(),
            "true"
        );
        assert_eq!(
            decision
                .properties
                .get(PROP_REGION_MIN_REGIONS_FOR_DURABILITY)
                .unwrap(),
            "2"
        );
        assert_eq!(
            decision
                .properties
                .get(PROP_REGION_ENFORCE_DURABILITY_IN_REPLACE)
                .unwrap(),
            "true"
        );
        // Unset regions-to-write stays unset rather than defaulting.
        assert!(!decision.properties.contains_key(PROP_REGION_REGIONS_TO_WRITE));
    }

    #[test]
    fn region_tunables_read_from_overlay() {
        let mut conf = base_config();
        conf.placement.region_awareness_enabled = true;
        conf.properties.insert(
            PROP_REGION_REGIONS_TO_WRITE.to_string(),
            "emea,apac".to_string(),
        );
        conf.properties.insert(
            PROP_REGION_MIN_REGIONS_FOR_DURABILITY.to_string(),
            "3".to_string(),
        );

        let decision = decide_placement(&conf, None);
        assert_eq!(
            decision.properties.get(PROP_REGION_REGIONS_TO_WRITE).unwrap(),
            "emea,apac"
        );
        assert_eq!(
            decision
                .properties
                .get(PROP_REGION_MIN_REGIONS_FOR_DURABILITY)
                .unwrap(),
            "3"
        );
    }

    #[test]
    fn region_takes_precedence_over_rack() {
        let mut conf = base_config();
        conf.placement.rack_awareness_enabled = true;
        conf.placement.region_awareness_enabled = true;

        let decision = decide_placement(&conf, None);
        assert_eq!(decision.policy, Some(PlacementPolicy::RegionAware));
    }

    #[test]
    fn isolation_overrides_policy_class_but_keeps_rack_binding() {
        let mut conf = base_config();
        conf.placement.rack_awareness_enabled = true;
        conf.placement.isolation_groups = vec!["group-a".to_string()];

        let decision = decide_placement(&conf, None);
        assert_eq!(decision.policy, Some(PlacementPolicy::IsolationGroups));
        assert_eq!(decision.slot, Some(SlotPurpose::RackAwareness));
        assert!(decision.properties.contains_key(PROP_DNS_RESOLVER_CLASS));
        assert_eq!(
            decision.properties.get(PROP_ISOLATION_GROUPS).unwrap(),
            "group-a"
        );
    }

    #[test]
    fn isolation_alone_binds_its_own_slot() {
        let mut conf = base_config();
        conf.placement.isolation_groups =
            vec![" group-a ".to_string(), "group-b".to_string(), "".to_string()];
        conf.placement.secondary_isolation_groups = vec!["fallback".to_string()];

        let decision = decide_placement(&conf, None);
        assert_eq!(decision.policy, Some(PlacementPolicy::IsolationGroups));
        assert_eq!(decision.slot, Some(SlotPurpose::Isolation));
        assert_eq!(
            decision.properties.get(PROP_ISOLATION_GROUPS).unwrap(),
            "group-a,group-b"
        );
        assert_eq!(
            decision
                .properties
                .get(PROP_SECONDARY_ISOLATION_GROUPS)
                .unwrap(),
            "fallback"
        );
    }

    #[test]
    fn secondary_groups_copied_verbatim_even_when_empty() {
        let mut conf = base_config();
        conf.placement.isolation_groups = vec!["group-a".to_string()];

        let decision = decide_placement(&conf, None);
        assert_eq!(
            decision
                .properties
                .get(PROP_SECONDARY_ISOLATION_GROUPS)
                .unwrap(),
            ""
        );
    }

    #[test]
    fn explicit_override_is_terminal() {
        let mut conf = base_config();
        conf.placement.rack_awareness_enabled = true;
        conf.placement.region_awareness_enabled = true;
        conf.placement.isolation_groups = vec!["group-a".to_string()];

        let policy = PlacementPolicy::Custom("weighted-random".to_string());
        let decision = decide_placement(&conf, Some(&policy));

        assert_eq!(decision.policy, Some(policy));
        assert_eq!(decision.slot, Some(SlotPurpose::Override));
        assert!(decision.properties.is_empty());
    }
}
