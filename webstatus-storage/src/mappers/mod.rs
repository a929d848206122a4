//! Entity mappers, one per entity kind.

mod browser_availability;
mod chromium_usage;
mod web_feature;

pub use browser_availability::{
    BrowserFeatureAvailabilityMapper, BROWSER_FEATURE_AVAILABILITIES_SCHEMA,
    BROWSER_FEATURE_AVAILABILITIES_TABLE,
};
pub use chromium_usage::{
    ChromiumDailyUsageStatMapper, DAILY_CHROMIUM_USAGE_SCHEMA, DAILY_CHROMIUM_USAGE_TABLE,
};
pub use web_feature::{WebFeatureMapper, WEB_FEATURES_SCHEMA, WEB_FEATURES_TABLE};

use crate::statement::TableSchema;

/// Every table written by the mappers in this module.
pub const ALL_TABLES: &[TableSchema] = &[
    WEB_FEATURES_SCHEMA,
    BROWSER_FEATURE_AVAILABILITIES_SCHEMA,
    DAILY_CHROMIUM_USAGE_SCHEMA,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::EntityMapper;
    use crate::statement::to_row;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use uuid::Uuid;
    use webstatus_core::{StoredBrowserFeatureAvailability, StoredChromiumDailyUsageStat, WebFeature};

    fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<u128>().prop_map(Uuid::from_u128)
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (2000i32..2030, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default())
    }

    fn arb_web_feature() -> impl Strategy<Value = WebFeature> {
        (arb_uuid(), "[a-z][a-z0-9-]{0,15}", ".{0,20}").prop_map(|(id, feature_key, name)| {
            WebFeature {
                id,
                feature_key,
                name,
            }
        })
    }

    fn arb_availability() -> impl Strategy<Value = StoredBrowserFeatureAvailability> {
        (arb_uuid(), "[a-z_]{1,10}", "[0-9]{1,3}").prop_map(
            |(web_feature_id, browser_name, browser_version)| StoredBrowserFeatureAvailability {
                web_feature_id,
                browser_name,
                browser_version,
            },
        )
    }

    fn arb_usage() -> impl Strategy<Value = StoredChromiumDailyUsageStat> {
        (arb_uuid(), arb_date(), 0.0f64..=1.0).prop_map(|(web_feature_id, date, usage)| {
            StoredChromiumDailyUsageStat {
                web_feature_id,
                date,
                usage,
            }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Merging never moves a value to a different natural key.
        #[test]
        fn prop_web_feature_merge_keeps_key(
            incoming in arb_web_feature(),
            existing in arb_web_feature(),
        ) {
            let mapper = WebFeatureMapper;
            let existing = WebFeature { feature_key: incoming.feature_key.clone(), ..existing };
            let key = mapper.get_key(&incoming);
            prop_assert_eq!(mapper.get_key(&mapper.merge(incoming.clone(), None)), key.clone());
            prop_assert_eq!(mapper.get_key(&mapper.merge(incoming, Some(existing))), key);
        }

        #[test]
        fn prop_availability_merge_keeps_key(
            incoming in arb_availability(),
            version in "[0-9]{1,3}",
        ) {
            let mapper = BrowserFeatureAvailabilityMapper;
            let existing = StoredBrowserFeatureAvailability {
                browser_version: version,
                ..incoming.clone()
            };
            let key = mapper.get_key(&incoming);
            prop_assert_eq!(mapper.get_key(&mapper.merge(incoming.clone(), None)), key.clone());
            prop_assert_eq!(mapper.get_key(&mapper.merge(incoming, Some(existing))), key);
        }

        #[test]
        fn prop_usage_merge_keeps_key(
            incoming in arb_usage(),
            usage in 0.0f64..=1.0,
        ) {
            let mapper = ChromiumDailyUsageStatMapper;
            let existing = StoredChromiumDailyUsageStat { usage, ..incoming.clone() };
            let key = mapper.get_key(&incoming);
            prop_assert_eq!(mapper.get_key(&mapper.merge(incoming.clone(), None)), key.clone());
            prop_assert_eq!(mapper.get_key(&mapper.merge(incoming, Some(existing))), key);
        }

        /// Every point lookup is limited to a single row.
        #[test]
        fn prop_select_one_is_limited(
            feature in arb_web_feature(),
            availability in arb_availability(),
            usage in arb_usage(),
        ) {
            prop_assert_eq!(WebFeatureMapper.select_one(&WebFeatureMapper.get_key(&feature)).row_limit(), Some(1));
            let m = BrowserFeatureAvailabilityMapper;
            prop_assert_eq!(m.select_one(&m.get_key(&availability)).row_limit(), Some(1));
            let m = ChromiumDailyUsageStatMapper;
            prop_assert_eq!(m.select_one(&m.get_key(&usage)).row_limit(), Some(1));
        }

        /// The lookup statement selects exactly the row whose key it was built from.
        #[test]
        fn prop_select_one_matches_own_row(availability in arb_availability()) {
            let m = BrowserFeatureAvailabilityMapper;
            let row = to_row(&availability).unwrap();
            prop_assert!(m.select_one(&m.get_key(&availability)).matches(&row));
        }

        /// The lookup statement pins the same primary key the writer stores
        /// the row under, so keyed stores can read it directly.
        #[test]
        fn prop_select_one_pins_primary_key(
            feature in arb_web_feature(),
            availability in arb_availability(),
            usage in arb_usage(),
        ) {
            let m = WebFeatureMapper;
            let key = m.get_key(&feature);
            prop_assert_eq!(
                m.select_one(&key).key_projection(WEB_FEATURES_SCHEMA.key_columns),
                Some(to_row(&key).unwrap())
            );

            let m = BrowserFeatureAvailabilityMapper;
            let key = m.get_key(&availability);
            prop_assert_eq!(
                m.select_one(&key).key_projection(BROWSER_FEATURE_AVAILABILITIES_SCHEMA.key_columns),
                Some(to_row(&key).unwrap())
            );

            let m = ChromiumDailyUsageStatMapper;
            let key = m.get_key(&usage);
            prop_assert_eq!(
                m.select_one(&key).key_projection(DAILY_CHROMIUM_USAGE_SCHEMA.key_columns),
                Some(to_row(&key).unwrap())
            );
        }
    }
}
