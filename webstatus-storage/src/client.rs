//! Storage client: typed operations over the webstatus entities.
//!
//! Writes go through an [`EntityWriter`] per entity kind. Reads are plain
//! statements run with [`Store::single_read`]. Features are addressed by
//! their external feature key; the internal id is resolved here and never
//! leaves the storage layer except as a return value of
//! [`StorageClient::upsert_web_feature`].

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use webstatus_core::{
    BrowserFeatureAvailability, ChromiumDailyUsageStat, EntityKind, FeatureDetails,
    StorageError, StorageResult, StoredBrowserFeatureAvailability, StoredChromiumDailyUsageStat,
    UsageStatsPage, WebFeature, WebFeatureId, WebFeatureKey,
};

use crate::mapper::EntityMapper;
use crate::mappers::{
    BrowserFeatureAvailabilityMapper, ChromiumDailyUsageStatMapper, WebFeatureMapper,
    BROWSER_FEATURE_AVAILABILITIES_TABLE, DAILY_CHROMIUM_USAGE_TABLE,
};
use crate::statement::{Direction, Row, Statement};
use crate::store::Store;
use crate::writer::EntityWriter;

/// Cursor carried inside a usage stats page token.
#[derive(Debug, Serialize, Deserialize)]
struct UsageCursor {
    last_date: NaiveDate,
}

fn encode_usage_cursor(last_date: NaiveDate) -> StorageResult<String> {
    let json = serde_json::to_vec(&UsageCursor { last_date })?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_usage_cursor(token: &str) -> StorageResult<UsageCursor> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| StorageError::InvalidPageToken)?;
    serde_json::from_slice(&bytes).map_err(|_| StorageError::InvalidPageToken)
}

fn decode_row<T: DeserializeOwned>(row: Row) -> StorageResult<T> {
    Ok(serde_json::from_value(serde_json::Value::Object(row))?)
}

/// Typed storage operations over a [`Store`].
pub struct StorageClient<S> {
    store: Arc<S>,
    web_features: EntityWriter<WebFeatureMapper, S>,
    availabilities: EntityWriter<BrowserFeatureAvailabilityMapper, S>,
    chromium_usage: EntityWriter<ChromiumDailyUsageStatMapper, S>,
}

impl<S> Clone for StorageClient<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            web_features: self.web_features.clone(),
            availabilities: self.availabilities.clone(),
            chromium_usage: self.chromium_usage.clone(),
        }
    }
}

impl<S: Store> StorageClient<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            web_features: EntityWriter::new(Arc::clone(&store)),
            availabilities: EntityWriter::new(Arc::clone(&store)),
            chromium_usage: EntityWriter::new(Arc::clone(&store)),
            store,
        }
    }

    /// The underlying store handle.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // ========================================================================
    // WEB FEATURES
    // ========================================================================

    /// Insert or update a feature and return its persisted internal id.
    ///
    /// The id on `feature` is only used if the feature key is new; an
    /// existing feature keeps the id it was first stored with.
    pub async fn upsert_web_feature(&self, feature: WebFeature) -> StorageResult<WebFeatureId> {
        let feature_key = feature.feature_key.clone();
        self.web_features.upsert(feature).await?;
        self.get_id_from_feature_key(&feature_key)
            .await?
            .ok_or(StorageError::InternalQueryFailure)
    }

    /// Resolve the internal id of a feature, if it exists.
    pub async fn get_id_from_feature_key(
        &self,
        feature_key: &str,
    ) -> StorageResult<Option<WebFeatureId>> {
        Ok(self.find_web_feature(feature_key).await?.map(|f| f.id))
    }

    /// Feature with its browser implementations.
    pub async fn get_feature(&self, feature_key: &str) -> StorageResult<FeatureDetails> {
        let feature = self
            .find_web_feature(feature_key)
            .await?
            .ok_or_else(|| not_found(feature_key))?;
        let browser_implementations = self.availabilities_for(feature.id).await?;
        Ok(FeatureDetails {
            feature_key: feature.feature_key,
            name: feature.name,
            browser_implementations,
        })
    }

    async fn find_web_feature(&self, feature_key: &str) -> StorageResult<Option<WebFeature>> {
        let statement = WebFeatureMapper.select_one(&WebFeatureKey::new(feature_key));
        match self.store.single_read(&statement).await?.into_iter().next() {
            Some(row) => Ok(Some(decode_row(row)?)),
            None => Ok(None),
        }
    }

    async fn require_feature_id(&self, feature_key: &str) -> StorageResult<WebFeatureId> {
        self.get_id_from_feature_key(feature_key)
            .await?
            .ok_or_else(|| not_found(feature_key))
    }

    // ========================================================================
    // BROWSER AVAILABILITY
    // ========================================================================

    /// Record that a browser ships a feature. Re-recording keeps the first
    /// version seen.
    pub async fn insert_browser_feature_availability(
        &self,
        feature_key: &str,
        availability: BrowserFeatureAvailability,
    ) -> StorageResult<()> {
        let id = self.require_feature_id(feature_key).await?;
        self.availabilities
            .upsert(StoredBrowserFeatureAvailability::new(id, availability))
            .await
    }

    /// Browser availabilities of a feature, ordered by browser name.
    pub async fn list_browser_feature_availabilities(
        &self,
        feature_key: &str,
    ) -> StorageResult<Vec<BrowserFeatureAvailability>> {
        let id = self.require_feature_id(feature_key).await?;
        self.availabilities_for(id).await
    }

    async fn availabilities_for(
        &self,
        id: WebFeatureId,
    ) -> StorageResult<Vec<BrowserFeatureAvailability>> {
        let statement = Statement::select(BROWSER_FEATURE_AVAILABILITIES_TABLE)
            .where_eq("WebFeatureID", id.to_string())
            .order_by("BrowserName", Direction::Asc);
        self.store
            .single_read(&statement)
            .await?
            .into_iter()
            .map(|row| decode_row::<StoredBrowserFeatureAvailability>(row).map(Into::into))
            .collect()
    }

    // ========================================================================
    // CHROMIUM USAGE
    // ========================================================================

    /// Insert or overwrite one day of Chromium usage for a feature.
    pub async fn upsert_chromium_daily_usage_stat(
        &self,
        feature_key: &str,
        stat: ChromiumDailyUsageStat,
    ) -> StorageResult<()> {
        let id = self.require_feature_id(feature_key).await?;
        self.chromium_usage
            .upsert(StoredChromiumDailyUsageStat::new(id, stat))
            .await
    }

    /// Daily usage in `[start, end)`, newest first.
    ///
    /// `page_token` is the `next_page_token` of a previous page. A token that
    /// does not decode yields [`StorageError::InvalidPageToken`]. An unknown
    /// feature yields an empty page.
    pub async fn list_chromium_daily_usage_stats(
        &self,
        feature_key: &str,
        start: NaiveDate,
        end: NaiveDate,
        page_size: usize,
        page_token: Option<&str>,
    ) -> StorageResult<UsageStatsPage> {
        let cursor = page_token.map(decode_usage_cursor).transpose()?;
        let Some(id) = self.get_id_from_feature_key(feature_key).await? else {
            return Ok(UsageStatsPage {
                stats: Vec::new(),
                next_page_token: None,
            });
        };

        let page_size = page_size.max(1);
        let upper = match cursor {
            Some(cursor) if cursor.last_date < end => cursor.last_date,
            _ => end,
        };
        let statement = Statement::select(DAILY_CHROMIUM_USAGE_TABLE)
            .where_eq("WebFeatureID", id.to_string())
            .where_gte("Date", start.to_string())
            .where_lt("Date", upper.to_string())
            .order_by("Date", Direction::Desc)
            .limit(page_size.saturating_add(1));

        let mut stats = self
            .store
            .single_read(&statement)
            .await?
            .into_iter()
            .map(|row| decode_row::<StoredChromiumDailyUsageStat>(row).map(Into::into))
            .collect::<StorageResult<Vec<ChromiumDailyUsageStat>>>()?;

        let next_page_token = if stats.len() > page_size {
            stats.truncate(page_size);
            match stats.last() {
                Some(last) => Some(encode_usage_cursor(last.date)?),
                None => None,
            }
        } else {
            None
        };

        Ok(UsageStatsPage {
            stats,
            next_page_token,
        })
    }
}

fn not_found(feature_key: &str) -> StorageError {
    StorageError::NotFound {
        kind: EntityKind::WebFeature,
        key: feature_key.to_string(),
    }
}
