//! First-seen browser versions in which a feature became available.

use webstatus_core::{BrowserFeatureAvailabilityKey, EntityKind, StoredBrowserFeatureAvailability};

use crate::mapper::EntityMapper;
use crate::statement::{Statement, TableSchema};

pub const BROWSER_FEATURE_AVAILABILITIES_TABLE: &str = "BrowserFeatureAvailabilities";
pub const BROWSER_FEATURE_AVAILABILITIES_SCHEMA: TableSchema = TableSchema::new(
    BROWSER_FEATURE_AVAILABILITIES_TABLE,
    &["WebFeatureID", "BrowserName"],
);

/// Mapper for browser availability facts.
///
/// An availability, once recorded, is never rewritten: merge keeps the stored
/// row and ignores the incoming one.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserFeatureAvailabilityMapper;

impl EntityMapper for BrowserFeatureAvailabilityMapper {
    type Key = BrowserFeatureAvailabilityKey;
    type Entity = StoredBrowserFeatureAvailability;
    const KIND: EntityKind = EntityKind::BrowserFeatureAvailability;

    fn table(&self) -> &'static str {
        BROWSER_FEATURE_AVAILABILITIES_TABLE
    }

    fn select_one(&self, key: &BrowserFeatureAvailabilityKey) -> Statement {
        Statement::select(self.table())
            .where_eq("WebFeatureID", key.web_feature_id.to_string())
            .where_eq("BrowserName", key.browser_name.clone())
            .limit(1)
    }

    fn merge(
        &self,
        incoming: StoredBrowserFeatureAvailability,
        existing: Option<StoredBrowserFeatureAvailability>,
    ) -> StoredBrowserFeatureAvailability {
        existing.unwrap_or(incoming)
    }

    fn get_key(&self, entity: &StoredBrowserFeatureAvailability) -> BrowserFeatureAvailabilityKey {
        BrowserFeatureAvailabilityKey {
            web_feature_id: entity.web_feature_id,
            browser_name: entity.browser_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn availability(version: &str) -> StoredBrowserFeatureAvailability {
        StoredBrowserFeatureAvailability {
            web_feature_id: Uuid::from_u128(7),
            browser_name: "chrome".to_string(),
            browser_version: version.to_string(),
        }
    }

    #[test]
    fn test_merge_keeps_existing() {
        let merged = BrowserFeatureAvailabilityMapper.merge(availability("121"), Some(availability("120")));
        assert_eq!(merged.browser_version, "120");
    }

    #[test]
    fn test_merge_without_existing_is_incoming() {
        let merged = BrowserFeatureAvailabilityMapper.merge(availability("121"), None);
        assert_eq!(merged.browser_version, "121");
    }

    #[test]
    fn test_select_one_filters_on_both_key_columns() {
        let key = BrowserFeatureAvailabilityMapper.get_key(&availability("120"));
        let stmt = BrowserFeatureAvailabilityMapper.select_one(&key);
        assert_eq!(stmt.table(), BROWSER_FEATURE_AVAILABILITIES_TABLE);
        assert_eq!(stmt.predicates().len(), 2);
    }
}
