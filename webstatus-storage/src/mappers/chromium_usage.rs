//! Daily Chromium usage per feature.

use webstatus_core::{ChromiumDailyUsageStatKey, EntityKind, StoredChromiumDailyUsageStat};

use crate::mapper::EntityMapper;
use crate::statement::{Statement, TableSchema};

pub const DAILY_CHROMIUM_USAGE_TABLE: &str = "DailyChromiumHistogramMetrics";
pub const DAILY_CHROMIUM_USAGE_SCHEMA: TableSchema =
    TableSchema::new(DAILY_CHROMIUM_USAGE_TABLE, &["WebFeatureID", "Date"]);

/// Mapper for daily Chromium usage. Re-ingesting a day overwrites its usage.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromiumDailyUsageStatMapper;

impl EntityMapper for ChromiumDailyUsageStatMapper {
    type Key = ChromiumDailyUsageStatKey;
    type Entity = StoredChromiumDailyUsageStat;
    const KIND: EntityKind = EntityKind::ChromiumDailyUsageStat;

    fn table(&self) -> &'static str {
        DAILY_CHROMIUM_USAGE_TABLE
    }

    fn select_one(&self, key: &ChromiumDailyUsageStatKey) -> Statement {
        Statement::select(self.table())
            .where_eq("WebFeatureID", key.web_feature_id.to_string())
            .where_eq("Date", key.date.to_string())
            .limit(1)
    }

    fn merge(
        &self,
        incoming: StoredChromiumDailyUsageStat,
        existing: Option<StoredChromiumDailyUsageStat>,
    ) -> StoredChromiumDailyUsageStat {
        match existing {
            Some(existing) => StoredChromiumDailyUsageStat {
                usage: incoming.usage,
                ..existing
            },
            None => incoming,
        }
    }

    fn get_key(&self, entity: &StoredChromiumDailyUsageStat) -> ChromiumDailyUsageStatKey {
        ChromiumDailyUsageStatKey {
            web_feature_id: entity.web_feature_id,
            date: entity.date,
        }
    }
}
