//! Sensor implementations for environments without a device location API.

use futures::future::{BoxFuture, FutureExt};
use locus_core::{PositionError, PositionSensor, SensorOptions, SensorReading};

/// No location hardware: every read fails with `Unsupported`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSensor;

impl PositionSensor for UnavailableSensor {
    fn current_position(
        &self,
        _options: SensorOptions,
    ) -> BoxFuture<'_, Result<SensorReading, PositionError>> {
        async { Err(PositionError::Unsupported) }.boxed()
    }
}

/// Replays a fix supplied by the caller (command line, tests).
#[derive(Debug, Clone, Copy)]
pub struct FixedSensor(pub SensorReading);

impl PositionSensor for FixedSensor {
    fn current_position(
        &self,
        _options: SensorOptions,
    ) -> BoxFuture<'_, Result<SensorReading, PositionError>> {
        let reading = self.0;
        async move { Ok(reading) }.boxed()
    }
}
