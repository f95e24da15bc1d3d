use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use locus_core::{
    Coordinates, Position, PositionError, PositionSensor, PositionSource, SensorOptions,
    SensorReading,
};

use super::{PositionTier, TierContext};
use crate::address::AddressResolver;
use crate::resolver::ResolveRequest;

/// Upper bound on a single sensor attempt.
pub const MAX_SENSOR_TIMEOUT: Duration = Duration::from_secs(15);
/// Lower bound on the age of a cached fix the sensor may return.
pub const MIN_MAXIMUM_AGE: Duration = Duration::from_secs(60);

/// Live device sensor with a bounded number of reads.
pub struct SensorTier {
    sensor: Arc<dyn PositionSensor>,
    address: Arc<AddressResolver>,
    max_attempts: u32,
    backoff_base: Duration,
}

impl SensorTier {
    #[must_use]
    pub fn new(
        sensor: Arc<dyn PositionSensor>,
        address: Arc<AddressResolver>,
        max_attempts: u32,
        backoff_base: Duration,
    ) -> Self {
        Self {
            sensor,
            address,
            max_attempts,
            backoff_base,
        }
    }

    fn options(request: &ResolveRequest) -> SensorOptions {
        SensorOptions {
            enable_high_accuracy: true,
            timeout: request.sensor_timeout.min(MAX_SENSOR_TIMEOUT),
            maximum_age: request.maximum_age.max(MIN_MAXIMUM_AGE),
        }
    }

    /// One sensor read raced against `options.timeout`, range-checked.
    async fn read_once(&self, options: SensorOptions) -> Result<SensorReading, PositionError> {
        let reading =
            match tokio::time::timeout(options.timeout, self.sensor.current_position(options))
                .await
            {
                Ok(result) => result?,
                Err(_) => return Err(PositionError::Timeout(options.timeout)),
            };
        if !Coordinates::new(reading.latitude, reading.longitude).is_valid() {
            return Err(PositionError::InvalidCoordinates {
                lat: reading.latitude,
                lng: reading.longitude,
            });
        }
        Ok(reading)
    }

    /// Read up to `max_attempts` times, sleeping base, 2×base, 4×base…
    /// between transient failures.
    async fn acquire(&self, options: SensorOptions) -> Result<SensorReading, PositionError> {
        let mut attempt = 1u32;
        loop {
            match self.read_once(options).await {
                Ok(reading) => return Ok(reading),
                Err(err) if err.is_retriable() && attempt < self.max_attempts => {
                    let delay = self.backoff_base.saturating_mul(1u32 << (attempt - 1).min(16));
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "sensor read failed, retrying after back-off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl PositionTier for SensorTier {
    fn source(&self) -> PositionSource {
        PositionSource::Sensor
    }

    fn attempt<'a>(
        &'a self,
        ctx: &'a TierContext<'a>,
    ) -> BoxFuture<'a, Result<Position, PositionError>> {
        async move {
            let reading = self.acquire(Self::options(ctx.request)).await?;
            let coordinates = Coordinates::new(reading.latitude, reading.longitude);
            let resolved = self.address.resolve(coordinates).await;
            Ok(Position {
                address: resolved.address,
                latitude: reading.latitude,
                longitude: reading.longitude,
                source: PositionSource::Sensor,
                address_source: resolved.source,
                accuracy_meters: reading.accuracy,
                captured_at: ctx.clock.now(),
            })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_are_clamped() {
        let request = ResolveRequest {
            sensor_timeout: Duration::from_secs(60),
            maximum_age: Duration::from_secs(5),
            ..ResolveRequest::default()
        };
        let options = SensorTier::options(&request);
        assert!(options.enable_high_accuracy);
        assert_eq!(options.timeout, MAX_SENSOR_TIMEOUT);
        assert_eq!(options.maximum_age, MIN_MAXIMUM_AGE);

        let request = ResolveRequest {
            sensor_timeout: Duration::from_secs(3),
            maximum_age: Duration::from_secs(600),
            ..ResolveRequest::default()
        };
        let options = SensorTier::options(&request);
        assert_eq!(options.timeout, Duration::from_secs(3));
        assert_eq!(options.maximum_age, Duration::from_secs(600));
    }
}
