//! Web features, keyed by their external feature key.

use webstatus_core::{EntityKind, WebFeature, WebFeatureKey};

use crate::mapper::EntityMapper;
use crate::statement::{Statement, TableSchema};

pub const WEB_FEATURES_TABLE: &str = "WebFeatures";
pub const WEB_FEATURES_SCHEMA: TableSchema = TableSchema::new(WEB_FEATURES_TABLE, &["FeatureKey"]);

/// Mapper for [`WebFeature`] rows, keyed by the external feature key.
///
/// Merge overlays the incoming name but keeps the stored internal id, so the
/// id handed out on first insert stays stable for dependent rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebFeatureMapper;

impl EntityMapper for WebFeatureMapper {
    type Key = WebFeatureKey;
    type Entity = WebFeature;
    const KIND: EntityKind = EntityKind::WebFeature;

    fn table(&self) -> &'static str {
        WEB_FEATURES_TABLE
    }

    fn select_one(&self, key: &WebFeatureKey) -> Statement {
        Statement::select(self.table())
            .where_eq("FeatureKey", key.feature_key.clone())
            .limit(1)
    }

    fn merge(&self, incoming: WebFeature, existing: Option<WebFeature>) -> WebFeature {
        match existing {
            Some(existing) => WebFeature {
                name: incoming.name,
                ..existing
            },
            None => incoming,
        }
    }

    fn get_key(&self, entity: &WebFeature) -> WebFeatureKey {
        WebFeatureKey::new(entity.feature_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn feature(id: Uuid, name: &str) -> WebFeature {
        WebFeature {
            id,
            feature_key: "grid".to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_merge_keeps_existing_id() {
        let stored = feature(Uuid::from_u128(1), "Grid");
        let incoming = feature(Uuid::from_u128(2), "CSS Grid");
        let merged = WebFeatureMapper.merge(incoming, Some(stored));
        assert_eq!(merged.id, Uuid::from_u128(1));
        assert_eq!(merged.name, "CSS Grid");
    }

    #[test]
    fn test_merge_without_existing_is_incoming() {
        let incoming = feature(Uuid::from_u128(2), "CSS Grid");
        assert_eq!(WebFeatureMapper.merge(incoming.clone(), None), incoming);
    }
}
