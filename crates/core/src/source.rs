//! The seam between the local pipeline and the remote collection service.

use crate::error::Result;
use crate::geo::{DayWindow, RegionOfInterest};
use crate::image::Scene;
use crate::sensor::Sensor;

/// Supplies the acquisitions of one sensor for one year, day window and
/// region.
///
/// The cloud client implements this against the remote engine; tests
/// implement it over in-memory fixtures. Implementations return scenes in
/// acquisition order, already filtered spatially and temporally.
pub trait SceneSource {
    fn scenes(
        &self,
        sensor: Sensor,
        year: i32,
        window: &DayWindow,
        region: &RegionOfInterest,
    ) -> Result<Vec<Scene>>;
}
