//! Annual collection building.
//!
//! Assembles the surface-reflectance time series handed to segmentation: per
//! sensor the acquisitions of a year's seasonal window are prepared
//! (harmonized, resampled, masked), merged across sensors, reduced to one
//! composite per year, and finally transformed to a single-band index series.
//! A year with no usable acquisition still contributes a fully-masked
//! composite so the series length always equals the year count.

use trendr_core::geo::{august_first_ms, DayWindow, RegionOfInterest, YearRange};
use trendr_core::image::{Image, Scene};
use trendr_core::raster::Raster;
use trendr_core::sensor::{Sensor, SR_BANDS};
use trendr_core::source::SceneSource;
use trendr_core::Result;

use crate::harmonize::harmonize_oli;
use crate::index::{calc_index, SpectralIndex};
use crate::mask::{qa_mask, MaskFeature};
use crate::medoid::medoid_composite;
use crate::resample::{resample_bicubic, resample_nearest};

/// How a year's prepared acquisitions are reduced to one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compositor {
    /// Per-pixel medoid of all candidates.
    Medoid,
    /// The first acquisition of the window, taken as-is. Used by small
    /// verification runs where compositing would hide what the service sees.
    FirstScene,
}

/// The per-run knobs of collection building, fixed before the first year is
/// fetched.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sensors merged into the combined collection, in merge order.
    pub sensors: Vec<Sensor>,
    /// QA features masked out of every acquisition. Empty disables masking.
    pub mask_features: Vec<MaskFeature>,
    /// Annual reduction strategy.
    pub compositor: Compositor,
    /// Index derived from each composite for the segmentation series.
    pub index: SpectralIndex,
    /// Seasonal capture window, reused unchanged across years.
    pub day_window: DayWindow,
    /// Acquisition ids dropped before preparation.
    pub exclude_ids: Vec<String>,
    /// Common output grid (rows, cols) every band is resampled onto.
    pub grid: (usize, usize),
}

impl PipelineConfig {
    /// The standard disturbance-mapping profile: all three sensors, medoid
    /// compositing of the June-September window, cloud/shadow/snow masking,
    /// NBR series.
    pub fn medoid_nbr(grid: (usize, usize)) -> Self {
        Self {
            sensors: Sensor::ALL.to_vec(),
            mask_features: MaskFeature::DEFAULT.to_vec(),
            compositor: Compositor::Medoid,
            index: SpectralIndex::Nbr,
            day_window: DayWindow {
                start: trendr_core::geo::MonthDay { month: 6, day: 1 },
                end: trendr_core::geo::MonthDay { month: 9, day: 30 },
            },
            exclude_ids: Vec::new(),
            grid,
        }
    }

    /// Minimal single-sensor profile: TM only, first scene per year, no
    /// masking, raw B5 series. Cheap enough to run against a live service as
    /// a connectivity check.
    pub fn toy(grid: (usize, usize)) -> Self {
        Self {
            sensors: vec![Sensor::Tm05],
            mask_features: Vec::new(),
            compositor: Compositor::FirstScene,
            index: SpectralIndex::B5,
            day_window: DayWindow {
                start: trendr_core::geo::MonthDay { month: 6, day: 15 },
                end: trendr_core::geo::MonthDay { month: 9, day: 15 },
            },
            exclude_ids: Vec::new(),
            grid,
        }
    }
}

/// Prepare one acquisition for compositing: rename onto the reference band
/// layout (harmonizing OLI radiometry), resample every band onto the common
/// grid, and apply the QA mask.
pub fn prepare_scene(scene: &Scene, sensor: Sensor, config: &PipelineConfig) -> Result<Image> {
    let (rows, cols) = config.grid;

    let image = if sensor.needs_harmonization() {
        harmonize_oli(&scene.image, config.grid)?
    } else {
        let selected = scene.image.select(&SR_BANDS, &SR_BANDS)?;
        let bands = selected
            .iter_bands()
            .map(|(n, r)| (n.to_string(), resample_bicubic(r, rows, cols)))
            .collect();
        Image::new(bands, scene.image.time_start())?
    };

    if config.mask_features.is_empty() {
        return Ok(image);
    }
    let qa = resample_nearest(&scene.qa, rows, cols);
    image.mask(&qa_mask(&qa, &config.mask_features))
}

/// One sensor's prepared acquisitions for one year, exclusions applied.
pub fn sensor_collection(
    source: &dyn SceneSource,
    sensor: Sensor,
    year: i32,
    config: &PipelineConfig,
    region: &RegionOfInterest,
) -> Result<Vec<Image>> {
    let scenes = source.scenes(sensor, year, &config.day_window, region)?;
    scenes
        .iter()
        .filter(|s| !config.exclude_ids.iter().any(|id| id == &s.id))
        .map(|s| prepare_scene(s, sensor, config))
        .collect()
}

/// All configured sensors' prepared acquisitions for one year, concatenated
/// in sensor merge order.
pub fn merged_collection(
    source: &dyn SceneSource,
    year: i32,
    config: &PipelineConfig,
    region: &RegionOfInterest,
) -> Result<Vec<Image>> {
    let mut merged = Vec::new();
    for &sensor in &config.sensors {
        merged.extend(sensor_collection(source, sensor, year, config, region)?);
    }
    Ok(merged)
}

/// Reduce one year to a single composite carrying the synthetic August 1st
/// timestamp. A year with no candidates yields a fully-masked composite.
pub fn build_composite(
    source: &dyn SceneSource,
    year: i32,
    config: &PipelineConfig,
    region: &RegionOfInterest,
) -> Result<Image> {
    let collection = merged_collection(source, year, config, region)?;
    let (rows, cols) = config.grid;
    let fallback = Image::fully_masked(&SR_BANDS, rows, cols, 0);

    let composite = match config.compositor {
        Compositor::Medoid => medoid_composite(&collection, &fallback)?,
        Compositor::FirstScene => collection.into_iter().next().unwrap_or(fallback),
    };
    Ok(composite.with_time_start(august_first_ms(year)))
}

/// One composite per year, in ascending year order. The output length always
/// equals the year count; gap years appear as fully-masked composites.
pub fn build_annual_series(
    source: &dyn SceneSource,
    years: YearRange,
    config: &PipelineConfig,
    region: &RegionOfInterest,
) -> Result<Vec<Image>> {
    years
        .iter()
        .map(|year| build_composite(source, year, config, region))
        .collect()
}

/// Transform an annual composite series into the single-band, sign-flipped
/// index series the segmentation service consumes.
pub fn build_index_series(series: &[Image], index: SpectralIndex) -> Result<Vec<Image>> {
    series.iter().map(|img| calc_index(img, index, true)).collect()
}

/// Per-year count of unmasked observations per pixel. Years with no
/// candidates count zero everywhere.
pub fn clear_pixel_count_series(
    source: &dyn SceneSource,
    years: YearRange,
    config: &PipelineConfig,
    region: &RegionOfInterest,
) -> Result<Vec<Raster<f64>>> {
    let (rows, cols) = config.grid;
    years
        .iter()
        .map(|year| {
            let collection = merged_collection(source, year, config, region)?;
            if collection.is_empty() {
                Ok(Raster::filled(rows, cols, 0.0))
            } else {
                crate::medoid::count_clear_pixels(&collection)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use trendr_core::sensor::OLI_BANDS;

    /// In-memory source keyed by (sensor, year).
    struct FixtureSource {
        scenes: HashMap<(Sensor, i32), Vec<Scene>>,
    }

    impl SceneSource for FixtureSource {
        fn scenes(
            &self,
            sensor: Sensor,
            year: i32,
            _window: &DayWindow,
            _region: &RegionOfInterest,
        ) -> Result<Vec<Scene>> {
            Ok(self
                .scenes
                .get(&(sensor, year))
                .cloned()
                .unwrap_or_default())
        }
    }

    fn region() -> RegionOfInterest {
        RegionOfInterest::new(vec![(-123.9, 47.5), (-123.8, 47.5), (-123.8, 47.6)]).unwrap()
    }

    fn tm_scene(id: &str, value: f64, qa: u16) -> Scene {
        let bands = SR_BANDS
            .iter()
            .map(|n| {
                let mut r = Raster::filled(2, 2, value);
                r.set_nodata(Some(f64::NAN));
                (n.to_string(), r)
            })
            .collect();
        Scene {
            id: id.to_string(),
            image: Image::new(bands, 0).unwrap(),
            qa: Raster::filled(2, 2, qa),
        }
    }

    fn oli_scene(id: &str, value: f64) -> Scene {
        let bands = OLI_BANDS
            .iter()
            .map(|n| {
                let mut r = Raster::filled(2, 2, value);
                r.set_nodata(Some(f64::NAN));
                (n.to_string(), r)
            })
            .collect();
        Scene {
            id: id.to_string(),
            image: Image::new(bands, 0).unwrap(),
            qa: Raster::filled(2, 2, 0),
        }
    }

    #[test]
    fn composite_carries_august_timestamp() {
        let mut scenes = HashMap::new();
        scenes.insert(
            (Sensor::Tm05, 1987),
            vec![tm_scene("LT05_046028_19870725", 1000.0, 0)],
        );
        let source = FixtureSource { scenes };
        let config = PipelineConfig::medoid_nbr((2, 2));

        let composite = build_composite(&source, 1987, &config, &region()).unwrap();
        assert_eq!(composite.time_start(), august_first_ms(1987));
        assert_eq!(composite.band_names(), SR_BANDS.to_vec());
    }

    #[test]
    fn gap_year_yields_masked_composite_of_full_length() {
        let mut scenes = HashMap::new();
        scenes.insert((Sensor::Tm05, 1985), vec![tm_scene("a", 1000.0, 0)]);
        scenes.insert((Sensor::Tm05, 1987), vec![tm_scene("b", 1200.0, 0)]);
        let source = FixtureSource { scenes };
        let config = PipelineConfig::medoid_nbr((2, 2));

        let years = YearRange::new(1985, 1987).unwrap();
        let series = build_annual_series(&source, years, &config, &region()).unwrap();

        assert_eq!(series.len(), 3);
        assert!(!series[0].is_fully_masked());
        assert!(series[1].is_fully_masked());
        assert_eq!(series[1].time_start(), august_first_ms(1986));
        assert!(!series[2].is_fully_masked());
    }

    #[test]
    fn cloudy_scene_is_masked_out_of_the_composite() {
        let mut scenes = HashMap::new();
        scenes.insert(
            (Sensor::Tm05, 1990),
            vec![tm_scene("cloudy", 9000.0, 32), tm_scene("clear", 1000.0, 0)],
        );
        let source = FixtureSource { scenes };
        let config = PipelineConfig::medoid_nbr((2, 2));

        let composite = build_composite(&source, 1990, &config, &region()).unwrap();
        assert_eq!(composite.band("B4").unwrap().get(0, 0).unwrap(), 1000.0);
    }

    #[test]
    fn excluded_ids_are_dropped() {
        let mut scenes = HashMap::new();
        scenes.insert(
            (Sensor::Tm05, 1990),
            vec![tm_scene("bad", 9000.0, 0), tm_scene("good", 1000.0, 0)],
        );
        let source = FixtureSource { scenes };
        let mut config = PipelineConfig::medoid_nbr((2, 2));
        config.exclude_ids = vec!["bad".to_string()];

        let composite = build_composite(&source, 1990, &config, &region()).unwrap();
        assert_eq!(composite.band("B1").unwrap().get(0, 0).unwrap(), 1000.0);
    }

    #[test]
    fn oli_acquisitions_are_harmonized_into_the_merge() {
        let mut scenes = HashMap::new();
        scenes.insert((Sensor::Oli08, 2014), vec![oli_scene("oli", 5000.0)]);
        let source = FixtureSource { scenes };
        let config = PipelineConfig::medoid_nbr((2, 2));

        let composite = build_composite(&source, 2014, &config, &region()).unwrap();
        let expected =
            ((5000.0 - crate::harmonize::ROY_INTERCEPTS[0] * 10_000.0) / crate::harmonize::ROY_SLOPES[0])
                .trunc();
        assert_eq!(composite.band("B1").unwrap().get(0, 0).unwrap(), expected);
    }

    #[test]
    fn toy_profile_takes_first_scene_unmasked() {
        let mut scenes = HashMap::new();
        scenes.insert(
            (Sensor::Tm05, 1995),
            vec![tm_scene("first", 2000.0, 32), tm_scene("second", 3000.0, 0)],
        );
        let source = FixtureSource { scenes };
        let config = PipelineConfig::toy((2, 2));

        // No masking: the cloudy first scene passes through untouched
        let composite = build_composite(&source, 1995, &config, &region()).unwrap();
        assert_eq!(composite.band("B5").unwrap().get(0, 0).unwrap(), 2000.0);
    }

    #[test]
    fn index_series_is_single_band_and_flipped() {
        let mut scenes = HashMap::new();
        scenes.insert((Sensor::Tm05, 1985), vec![tm_scene("a", 1000.0, 0)]);
        let source = FixtureSource { scenes };
        let config = PipelineConfig::medoid_nbr((2, 2));

        let years = YearRange::new(1985, 1985).unwrap();
        let series = build_annual_series(&source, years, &config, &region()).unwrap();
        let index_series = build_index_series(&series, SpectralIndex::Nbr).unwrap();

        assert_eq!(index_series.len(), 1);
        assert_eq!(index_series[0].band_names(), vec!["NBR"]);
        // All bands equal, so NBR is 0; the flip leaves zero unchanged
        assert_eq!(index_series[0].band("NBR").unwrap().get(0, 0).unwrap(), 0.0);
        assert_eq!(index_series[0].time_start(), august_first_ms(1985));
    }

    #[test]
    fn clear_counts_including_gap_year() {
        let mut scenes = HashMap::new();
        scenes.insert(
            (Sensor::Tm05, 1985),
            vec![tm_scene("a", 1000.0, 0), tm_scene("b", 1100.0, 32)],
        );
        let source = FixtureSource { scenes };
        let config = PipelineConfig::medoid_nbr((2, 2));

        let years = YearRange::new(1985, 1986).unwrap();
        let counts = clear_pixel_count_series(&source, years, &config, &region()).unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].get(0, 0).unwrap(), 1.0); // cloudy scene masked
        assert_eq!(counts[1].get(0, 0).unwrap(), 0.0); // gap year
    }
}
