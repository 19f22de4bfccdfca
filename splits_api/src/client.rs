use crate::error::ApiError;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::ApiConfig;
use shared::splits::api::{
    ACTIVE_ENDPOINT, AREAS_ENDPOINT, Ack, ApiErrorBody, Area, AreaPatch, AreaUpdate,
    AreasList, CONFIGS_ENDPOINT, ConfigDetail, ConfigStatus, ConfigSummary, ConfigUpdate,
    ConfigsList, ConfigsSnapshot, FacilitySectors, NewArea, NewConfig, NewPreset,
    PRESETS_ENDPOINT, Preset, PresetDetail, PresetPositionPatch, PresetSummary, PresetsList,
    SCHEDULED_ENDPOINT, SECTORS_ENDPOINT, SavedArea, SavedConfig, SavedPreset, SectorFilter,
    SplitConfig, TRACONS_ENDPOINT, TraconDirectory,
};
use shared::splits::boundaries::{
    BoundaryKind, BoundarySets, FeatureCollection, boundary_asset_path,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Status for a config being saved. Publishing forces it active, a
/// future start schedules it, and otherwise an existing status is
/// preserved.
pub fn derive_status(
    publish_now: bool,
    start_time_utc: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    existing: Option<ConfigStatus>,
) -> ConfigStatus {
    if publish_now {
        return ConfigStatus::Active;
    }
    if let Some(start) = start_time_utc
        && start > now
    {
        return ConfigStatus::Scheduled;
    }
    existing.unwrap_or(ConfigStatus::Draft)
}

#[derive(Debug, Clone)]
pub struct SplitsApi {
    client: Client,
    base_url: String,
}

impl SplitsApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    // Non-OK responses carry { "error": ... } when the server produced
    // the failure itself; other bodies fall through as raw text.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            return serde_json::from_str(&body).map_err(ApiError::from);
        }
        let message = match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(parsed) => parsed.error,
                Err(_) if !body.trim().is_empty() => body,
                Err(_) => status.to_string(),
            },
            Err(_) => status.to_string(),
        };
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }

    // ---- configs ----

    pub async fn list_configs(&self) -> Result<Vec<ConfigSummary>, ApiError> {
        let response = self.client.get(self.url(CONFIGS_ENDPOINT)).send().await?;
        let list: ConfigsList = Self::decode(response).await?;
        Ok(list.configs)
    }

    pub async fn get_config(&self, id: i64) -> Result<SplitConfig, ApiError> {
        let response = self
            .client
            .get(self.url(CONFIGS_ENDPOINT))
            .query(&[("id", id)])
            .send()
            .await?;
        let detail: ConfigDetail = Self::decode(response).await?;
        Ok(detail.config)
    }

    pub async fn create_config(&self, payload: &NewConfig) -> Result<SavedConfig, ApiError> {
        debug!(
            artcc = %payload.artcc,
            name = %payload.config_name,
            status = %payload.status,
            "creating split config"
        );
        let response = self
            .client
            .post(self.url(CONFIGS_ENDPOINT))
            .json(payload)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn update_config(
        &self,
        id: i64,
        payload: &ConfigUpdate,
    ) -> Result<SavedConfig, ApiError> {
        let response = self
            .client
            .put(self.url(CONFIGS_ENDPOINT))
            .query(&[("id", id)])
            .json(payload)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn delete_config(&self, id: i64) -> Result<Ack, ApiError> {
        let response = self
            .client
            .delete(self.url(CONFIGS_ENDPOINT))
            .query(&[("id", id)])
            .send()
            .await?;
        Self::decode(response).await
    }

    // ---- areas ----

    pub async fn list_areas(&self) -> Result<Vec<Area>, ApiError> {
        let response = self.client.get(self.url(AREAS_ENDPOINT)).send().await?;
        let list: AreasList = Self::decode(response).await?;
        Ok(list.areas)
    }

    pub async fn create_area(&self, payload: &NewArea) -> Result<SavedArea, ApiError> {
        let response = self
            .client
            .post(self.url(AREAS_ENDPOINT))
            .json(payload)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn update_area(&self, id: i64, payload: &AreaUpdate) -> Result<SavedArea, ApiError> {
        let response = self
            .client
            .put(self.url(AREAS_ENDPOINT))
            .query(&[("id", id)])
            .json(payload)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn patch_area_color(&self, id: i64, color: &str) -> Result<Ack, ApiError> {
        let patch = AreaPatch {
            color: Some(color.to_string()),
            description: None,
        };
        let response = self
            .client
            .patch(self.url(AREAS_ENDPOINT))
            .query(&[("id", id)])
            .json(&patch)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn delete_area(&self, id: i64) -> Result<Ack, ApiError> {
        let response = self
            .client
            .delete(self.url(AREAS_ENDPOINT))
            .query(&[("id", id)])
            .send()
            .await?;
        Self::decode(response).await
    }

    // ---- presets ----

    pub async fn list_presets(&self) -> Result<Vec<PresetSummary>, ApiError> {
        let response = self.client.get(self.url(PRESETS_ENDPOINT)).send().await?;
        let list: PresetsList = Self::decode(response).await?;
        Ok(list.presets)
    }

    pub async fn get_preset(&self, id: i64) -> Result<Preset, ApiError> {
        let response = self
            .client
            .get(self.url(PRESETS_ENDPOINT))
            .query(&[("id", id)])
            .send()
            .await?;
        let detail: PresetDetail = Self::decode(response).await?;
        Ok(detail.preset)
    }

    pub async fn create_preset(&self, payload: &NewPreset) -> Result<SavedPreset, ApiError> {
        debug!(
            artcc = %payload.artcc,
            name = %payload.preset_name,
            positions = payload.positions.len(),
            "creating preset"
        );
        let response = self
            .client
            .post(self.url(PRESETS_ENDPOINT))
            .json(payload)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn update_preset(&self, id: i64, payload: &NewPreset) -> Result<SavedPreset, ApiError> {
        let response = self
            .client
            .put(self.url(PRESETS_ENDPOINT))
            .query(&[("id", id)])
            .json(payload)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn patch_preset_position_color(
        &self,
        position_id: i64,
        color: &str,
    ) -> Result<Ack, ApiError> {
        let patch = PresetPositionPatch {
            color: Some(color.to_string()),
            strata_filter: None,
        };
        let response = self
            .client
            .patch(self.url(PRESETS_ENDPOINT))
            .query(&[("position_id", position_id)])
            .json(&patch)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn delete_preset(&self, id: i64) -> Result<Ack, ApiError> {
        let response = self
            .client
            .delete(self.url(PRESETS_ENDPOINT))
            .query(&[("id", id)])
            .send()
            .await?;
        Self::decode(response).await
    }

    // ---- active and scheduled ----

    pub async fn get_active_configs(&self) -> Result<ConfigsSnapshot, ApiError> {
        let response = self.client.get(self.url(ACTIVE_ENDPOINT)).send().await?;
        Self::decode(response).await
    }

    pub async fn get_scheduled_configs(&self) -> Result<ConfigsSnapshot, ApiError> {
        let response = self.client.get(self.url(SCHEDULED_ENDPOINT)).send().await?;
        Self::decode(response).await
    }

    pub async fn update_scheduled_config(
        &self,
        id: i64,
        start_time_utc: Option<DateTime<Utc>>,
        end_time_utc: Option<DateTime<Utc>>,
    ) -> Result<Ack, ApiError> {
        let payload = ConfigUpdate {
            start_time_utc,
            end_time_utc,
            ..ConfigUpdate::default()
        };
        let response = self
            .client
            .put(self.url(SCHEDULED_ENDPOINT))
            .query(&[("id", id)])
            .json(&payload)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn delete_scheduled_config(&self, id: i64) -> Result<Ack, ApiError> {
        let response = self
            .client
            .delete(self.url(SCHEDULED_ENDPOINT))
            .query(&[("id", id)])
            .send()
            .await?;
        Self::decode(response).await
    }

    // ---- facility metadata ----

    pub async fn get_tracons(&self) -> Result<TraconDirectory, ApiError> {
        let response = self.client.get(self.url(TRACONS_ENDPOINT)).send().await?;
        Self::decode(response).await
    }

    pub async fn get_facility_sectors(
        &self,
        facility: &str,
        filter: SectorFilter,
    ) -> Result<FacilitySectors, ApiError> {
        let filter = filter.to_string();
        let response = self
            .client
            .get(self.url(SECTORS_ENDPOINT))
            .query(&[("facility", facility), ("filter", filter.as_str())])
            .send()
            .await?;
        Self::decode(response).await
    }

    // ---- boundary assets ----

    pub async fn fetch_boundary_set(
        &self,
        kind: BoundaryKind,
    ) -> Result<FeatureCollection, ApiError> {
        let response = self
            .client
            .get(self.url(boundary_asset_path(kind)))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Fetches all five boundary files concurrently. A file that fails
    /// to load logs a warning and yields an empty collection so the
    /// editor can start with whatever geometry is available.
    pub async fn load_boundary_sets(&self) -> BoundarySets {
        let (artcc, tracon, low, high, superhigh) = tokio::join!(
            self.fetch_boundary_set(BoundaryKind::Artcc),
            self.fetch_boundary_set(BoundaryKind::Tracon),
            self.fetch_boundary_set(BoundaryKind::Low),
            self.fetch_boundary_set(BoundaryKind::High),
            self.fetch_boundary_set(BoundaryKind::SuperHigh),
        );

        let mut sets = BoundarySets::default();
        for (kind, result) in [
            (BoundaryKind::Artcc, artcc),
            (BoundaryKind::Tracon, tracon),
            (BoundaryKind::Low, low),
            (BoundaryKind::High, high),
            (BoundaryKind::SuperHigh, superhigh),
        ] {
            match result {
                Ok(collection) => {
                    debug!(kind = %kind, features = collection.features.len(), "loaded boundary file");
                    sets.set(kind, collection);
                }
                Err(error) => warn!(kind = %kind, %error, "failed to load boundary file"),
            }
        }
        sets
    }
}
