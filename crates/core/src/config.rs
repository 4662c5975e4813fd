//! Validated, immutable engine configuration.

use crate::catalog::Catalog;
use crate::error::ConfigError;
use crate::model::SLOT_COUNT;
use crate::router::{Route, RoutingTable};

/// Achievement catalog plus routing table, checked against each other.
///
/// Build once at startup and share behind an `Arc`. Tests can assemble a
/// smaller catalog and table through `EngineConfig::new`.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    catalog: Catalog,
    routes: RoutingTable,
}

impl EngineConfig {
    /// Validate and assemble a configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any routing rule is malformed: goal/slot count
    /// mismatch, empty rule, non-positive or non-finite goal, slot outside the
    /// vector, slot without a catalog entry, or a metric owned by the other role.
    pub fn new(catalog: Catalog, routes: RoutingTable) -> Result<Self, ConfigError> {
        for route in routes.routes() {
            validate_route(&catalog, route)?;
        }
        Ok(Self { catalog, routes })
    }

    /// The production catalog and routing table.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` only if the built-in tables disagree.
    pub fn standard() -> Result<Self, ConfigError> {
        Self::new(Catalog::standard()?, RoutingTable::standard())
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }
}

fn validate_route(catalog: &Catalog, route: &Route) -> Result<(), ConfigError> {
    let rule = &route.rule;
    let metric = rule.metric;

    if rule.metric.role() != rule.role {
        return Err(ConfigError::ForeignMetric {
            event: route.event,
            metric,
            role: rule.role,
            owner: rule.metric.role(),
        });
    }
    if rule.goals.len() != rule.slots.len() {
        return Err(ConfigError::LengthMismatch {
            metric,
            goals: rule.goals.len(),
            slots: rule.slots.len(),
        });
    }
    if rule.goals.is_empty() {
        return Err(ConfigError::EmptyRule { metric });
    }
    if let Some(goal) = rule.goals.iter().copied().find(|g| !g.is_finite() || *g <= 0.0) {
        return Err(ConfigError::InvalidGoal { metric, goal });
    }
    for slot in rule.slots.iter().copied() {
        if slot >= SLOT_COUNT {
            return Err(ConfigError::SlotOutOfRange {
                role: rule.role,
                slot,
            });
        }
        if catalog.get(rule.role, slot).is_none() {
            return Err(ConfigError::UnknownSlot {
                metric,
                role: rule.role,
                slot,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AchievementDefinition;
    use crate::model::{EventKind, Metric, Role};
    use crate::router::ProjectionRule;

    fn small_catalog() -> Catalog {
        Catalog::new([
            AchievementDefinition::new(Role::Tutor, 4, "One", ""),
            AchievementDefinition::new(Role::Tutor, 5, "Three", ""),
        ])
        .unwrap()
    }

    fn table(rule: ProjectionRule) -> RoutingTable {
        RoutingTable::new(vec![Route {
            event: EventKind::RequestDenied,
            rule,
        }])
    }

    #[test]
    fn standard_configuration_validates() {
        let config = EngineConfig::standard().unwrap();
        assert!(!config.routes().is_empty());
    }

    #[test]
    fn small_catalog_with_matching_rule_is_accepted() {
        let rule = ProjectionRule::new(Role::Tutor, Metric::RequestsDenied, &[1.0, 3.0], &[4, 5]);
        assert!(EngineConfig::new(small_catalog(), table(rule)).is_ok());
    }

    #[test]
    fn rejects_length_mismatch() {
        let rule = ProjectionRule::new(Role::Tutor, Metric::RequestsDenied, &[1.0], &[4, 5]);
        assert!(matches!(
            EngineConfig::new(small_catalog(), table(rule)),
            Err(ConfigError::LengthMismatch { goals: 1, slots: 2, .. })
        ));
    }

    #[test]
    fn rejects_non_positive_goal() {
        let rule = ProjectionRule::new(Role::Tutor, Metric::RequestsDenied, &[0.0], &[4]);
        assert!(matches!(
            EngineConfig::new(small_catalog(), table(rule)),
            Err(ConfigError::InvalidGoal { .. })
        ));
    }

    #[test]
    fn rejects_slot_without_achievement() {
        let rule = ProjectionRule::new(Role::Tutor, Metric::RequestsDenied, &[1.0], &[6]);
        assert!(matches!(
            EngineConfig::new(small_catalog(), table(rule)),
            Err(ConfigError::UnknownSlot { slot: 6, .. })
        ));
    }

    #[test]
    fn rejects_slot_outside_vector() {
        let rule = ProjectionRule::new(Role::Tutor, Metric::RequestsDenied, &[1.0], &[28]);
        assert!(matches!(
            EngineConfig::new(small_catalog(), table(rule)),
            Err(ConfigError::SlotOutOfRange { slot: 28, .. })
        ));
    }

    #[test]
    fn rejects_metric_from_the_other_role() {
        let rule = ProjectionRule::new(Role::Tutor, Metric::DeniedRequests, &[1.0], &[4]);
        assert!(matches!(
            EngineConfig::new(small_catalog(), table(rule)),
            Err(ConfigError::ForeignMetric { owner: Role::Student, .. })
        ));
    }

    #[test]
    fn rejects_empty_rule() {
        let rule = ProjectionRule::new(Role::Tutor, Metric::RequestsDenied, &[], &[]);
        assert!(matches!(
            EngineConfig::new(small_catalog(), table(rule)),
            Err(ConfigError::EmptyRule { .. })
        ));
    }
}
