use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    config::RaptSettings,
    db::models::{BrewingReading, NewBrewingReading},
    rapt::{clock::Clock, RaptClient, RaptError},
    storage::Storage,
};

use super::{
    mapper::{map_to_reading, RawTelemetry},
    selector::{candidates, select_device},
};

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Serves the brewing dashboard: live RAPT telemetry when possible, else the
/// stored reading, else a placeholder.
#[derive(Clone)]
pub struct BrewingService {
    storage: Arc<dyn Storage>,
    rapt: RaptClient,
    settings: RaptSettings,
    clock: Arc<dyn Clock>,
}

impl BrewingService {
    pub fn new(
        storage: Arc<dyn Storage>,
        rapt: RaptClient,
        settings: RaptSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            rapt,
            settings,
            clock,
        }
    }

    /// Never fails; every upstream or storage problem is logged and absorbed.
    pub async fn current_reading(&self) -> BrewingReading {
        match self.live_reading().await {
            Ok(reading) => {
                info!(id = %reading.id, "Serving live RAPT reading");
                return reading;
            }
            Err(e) => warn!(error = %e, "Live RAPT reading unavailable, using stored data"),
        }

        match self.storage.brewing_reading().await {
            Ok(Some(reading)) => reading,
            Ok(None) => {
                debug!("No stored brewing reading, serving placeholder");
                BrewingReading::placeholder(self.clock.now())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load stored brewing reading, serving placeholder");
                BrewingReading::placeholder(self.clock.now())
            }
        }
    }

    async fn live_reading(&self) -> Result<BrewingReading, LiveError> {
        let credentials = self.settings.credentials().ok_or(LiveError::NotConfigured)?;

        let token = self.rapt.access_token(&credentials).await?;
        let devices = self.rapt.list_devices(&token).await?;
        let target = self.settings.target_mac.as_deref();

        let selected = select_device(&devices, target)?;
        debug!(device_id = %selected.id, device_type = %selected.device_type, "Selected RAPT device");

        for device in candidates(&devices, target) {
            match self.rapt.fetch_telemetry(device, &token).await {
                Ok(payload) => {
                    let raw = RawTelemetry::from_value(&payload);
                    return Ok(map_to_reading(&raw, device, self.clock.now()));
                }
                // The remaining candidates would be asked with the same token.
                Err(e @ RaptError::TokenRejected { .. }) => return Err(e.into()),
                Err(e) => warn!(
                    device_id = %device.id,
                    device_type = %device.device_type,
                    error = %e,
                    "RAPT telemetry fetch failed, trying next device"
                ),
            }
        }

        Err(LiveError::AllCandidatesFailed)
    }

    /// Replace the stored reading with an admin-supplied one.
    pub async fn update_reading(
        &self,
        input: NewBrewingReading,
    ) -> Result<BrewingReading, UpdateError> {
        input.validate().map_err(UpdateError::Invalid)?;
        let reading = self.storage.upsert_brewing_reading(input).await?;
        info!(id = %reading.id, "Brewing reading updated");
        Ok(reading)
    }
}

#[derive(Debug, thiserror::Error)]
enum LiveError {
    #[error("RAPT credentials are not configured")]
    NotConfigured,

    #[error(transparent)]
    Rapt(#[from] RaptError),

    #[error("every candidate device failed to report telemetry")]
    AllCandidatesFailed,
}
