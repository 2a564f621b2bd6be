//! Query geometry: region polygons, year ranges and seasonal day windows.
//!
//! These types only describe *what* to ask the remote collection service for;
//! no local georeferencing is attached to pixel grids.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Region of interest
// ---------------------------------------------------------------------------

/// A closed polygon of (longitude, latitude) pairs.
///
/// The first and last point need not coincide, but the ring must enclose a
/// non-degenerate area. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    ring: Vec<(f64, f64)>,
}

impl RegionOfInterest {
    /// Create a region from an ordered ring of (lon, lat) pairs.
    pub fn new(ring: Vec<(f64, f64)>) -> Result<Self> {
        if ring.len() < 3 || shoelace_area(&ring).abs() < 1e-12 {
            return Err(Error::DegenerateRegion);
        }
        Ok(Self { ring })
    }

    /// The polygon ring.
    pub fn ring(&self) -> &[(f64, f64)] {
        &self.ring
    }

    /// Bounding box `[west, south, east, north]`.
    pub fn bbox(&self) -> [f64; 4] {
        let mut west = f64::MAX;
        let mut south = f64::MAX;
        let mut east = f64::MIN;
        let mut north = f64::MIN;
        for &(lon, lat) in &self.ring {
            west = west.min(lon);
            south = south.min(lat);
            east = east.max(lon);
            north = north.max(lat);
        }
        [west, south, east, north]
    }
}

/// Twice-signed shoelace area of a ring (not closed).
fn shoelace_area(ring: &[(f64, f64)]) -> f64 {
    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let (x1, y1) = ring[i];
        let (x2, y2) = ring[(i + 1) % n];
        sum += x1 * y2 - x2 * y1;
    }
    sum / 2.0
}

// ---------------------------------------------------------------------------
// Year range
// ---------------------------------------------------------------------------

/// Inclusive integer year interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    /// Create a range; `start` must not exceed `end`.
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidYearRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    /// Number of years in the range (always >= 1).
    pub fn len(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate the years in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }
}

// ---------------------------------------------------------------------------
// Day window
// ---------------------------------------------------------------------------

/// A month-day pair, e.g. `06-01`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    /// Parse a `"MM-DD"` string with calendar validation.
    ///
    /// Day 29 of February is accepted (leap years exist in any range of
    /// interest).
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidDayWindow(s.to_string());
        let (m, d) = s.split_once('-').ok_or_else(invalid)?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        let day: u32 = d.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) || day < 1 || day > days_in_month(month) {
            return Err(invalid());
        }
        Ok(Self { month, day })
    }
}

impl std::fmt::Display for MonthDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

fn days_in_month(month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => 29,
        _ => 0,
    }
}

/// The seasonal capture window within each year, reused unchanged across
/// years.
///
/// A window whose start month is later than its end month crosses the year
/// boundary: for year Y it covers `[Y-1 start .. Y-1 12-31]` plus
/// `[Y 01-01 .. Y end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub start: MonthDay,
    pub end: MonthDay,
}

impl DayWindow {
    /// Parse a pair of `"MM-DD"` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            start: MonthDay::parse(start)?,
            end: MonthDay::parse(end)?,
        })
    }

    /// Whether the window wraps past December 31st.
    pub fn crosses_year(&self) -> bool {
        self.start.month > self.end.month
    }

    /// Datetime filter strings (`"YYYY-MM-DD/YYYY-MM-DD"`) for a given year.
    ///
    /// Returns one range for an in-year window, two for a cross-year window.
    pub fn datetime_ranges(&self, year: i32) -> Vec<String> {
        if self.crosses_year() {
            vec![
                format!("{}-{}/{}-12-31", year - 1, self.start, year - 1),
                format!("{}-01-01/{}-{}", year, year, self.end),
            ]
        } else {
            vec![format!("{}-{}/{}-{}", year, self.start, year, self.end)]
        }
    }
}

// ---------------------------------------------------------------------------
// Synthetic composite timestamp
// ---------------------------------------------------------------------------

/// Epoch milliseconds of August 1st (UTC midnight) of the given year.
///
/// Annual composites carry this synthetic timestamp purely as an ordering key
/// for the segmentation call; it is not an acquisition time.
pub fn august_first_ms(year: i32) -> i64 {
    days_from_civil(year, 8, 1) * 86_400_000
}

/// Days from 1970-01-01 to the given civil date (proleptic Gregorian).
fn days_from_civil(y: i32, m: u32, d: u32) -> i64 {
    let y = i64::from(y) - i64::from(m <= 2);
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = i64::from((m + 9) % 12);
    let doy = (153 * mp + 2) / 5 + i64::from(d) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn quinault_ring() -> Vec<(f64, f64)> {
        vec![
            (-123.98757934570312, 47.49679221520181),
            (-123.90655517578125, 47.49586436835716),
            (-123.90449523925781, 47.55243302404593),
            (-123.98551940917969, 47.553359870859),
        ]
    }

    #[test]
    fn region_accepts_open_ring() {
        let region = RegionOfInterest::new(quinault_ring()).unwrap();
        assert_eq!(region.ring().len(), 4);
    }

    #[test]
    fn region_bbox() {
        let region = RegionOfInterest::new(quinault_ring()).unwrap();
        let [w, s, e, n] = region.bbox();
        assert!(w < e && s < n);
        assert!((w - -123.98757934570312).abs() < 1e-12);
        assert!((n - 47.553359870859).abs() < 1e-12);
    }

    #[test]
    fn region_rejects_degenerate() {
        assert!(RegionOfInterest::new(vec![(0.0, 0.0), (1.0, 1.0)]).is_err());
        // Collinear points enclose no area
        assert!(RegionOfInterest::new(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]).is_err());
    }

    #[test]
    fn year_range_len() {
        let r = YearRange::new(1985, 2017).unwrap();
        assert_eq!(r.len(), 33);
        assert_eq!(r.iter().count(), 33);

        let single = YearRange::new(2000, 2000).unwrap();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn year_range_rejects_inverted() {
        assert!(YearRange::new(2017, 1985).is_err());
    }

    #[test]
    fn day_window_parse() {
        let w = DayWindow::parse("06-01", "09-30").unwrap();
        assert!(!w.crosses_year());
        assert_eq!(w.datetime_ranges(1999), vec!["1999-06-01/1999-09-30"]);
    }

    #[test]
    fn day_window_rejects_bad_dates() {
        assert!(DayWindow::parse("13-01", "09-30").is_err());
        assert!(DayWindow::parse("06-31", "09-30").is_err());
        assert!(DayWindow::parse("0601", "09-30").is_err());
    }

    #[test]
    fn day_window_cross_year_splits() {
        // Southern-hemisphere style window: Nov 1 through Feb 28
        let w = DayWindow::parse("11-01", "02-28").unwrap();
        assert!(w.crosses_year());
        assert_eq!(
            w.datetime_ranges(2001),
            vec!["2000-11-01/2000-12-31", "2001-01-01/2001-02-28"]
        );
    }

    #[test]
    fn august_first_epoch() {
        // 1970-08-01 is 212 days into the epoch year
        assert_eq!(august_first_ms(1970), 212 * 86_400_000);
        // Known value: 2017-08-01T00:00:00Z = 1501545600 s
        assert_eq!(august_first_ms(2017), 1_501_545_600_000);
        // Strictly increasing by year
        assert!(august_first_ms(1986) > august_first_ms(1985));
    }
}
