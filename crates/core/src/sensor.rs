//! The closed set of Landsat surface-reflectance sources.

/// The six reference reflectance bands, in stack order. All prepared scenes
/// and composites use this layout.
pub const SR_BANDS: [&str; 6] = ["B1", "B2", "B3", "B4", "B5", "B7"];

/// Native band layout of the OLI sensor; harmonization renames these onto
/// [`SR_BANDS`].
pub const OLI_BANDS: [&str; 6] = ["B2", "B3", "B4", "B5", "B6", "B7"];

/// Name of the per-pixel quality bitmask band.
pub const QA_BAND: &str = "pixel_qa";

/// A Landsat mission whose surface-reflectance collection feeds the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    /// Landsat 5 Thematic Mapper
    Tm05,
    /// Landsat 7 Enhanced Thematic Mapper+
    Etm07,
    /// Landsat 8 Operational Land Imager
    Oli08,
}

impl Sensor {
    /// All three missions, merge order used by the combined collection.
    pub const ALL: [Sensor; 3] = [Sensor::Tm05, Sensor::Etm07, Sensor::Oli08];

    /// Remote collection identifier.
    pub fn collection_id(&self) -> &'static str {
        match self {
            Sensor::Tm05 => "LANDSAT/LT05/C01/T1_SR",
            Sensor::Etm07 => "LANDSAT/LE07/C01/T1_SR",
            Sensor::Oli08 => "LANDSAT/LC08/C01/T1_SR",
        }
    }

    /// Native reflectance band names in reference order.
    pub fn native_bands(&self) -> &'static [&'static str; 6] {
        match self {
            Sensor::Oli08 => &OLI_BANDS,
            _ => &SR_BANDS,
        }
    }

    /// Whether this sensor's reflectance scale must be harmonized onto the
    /// reference (ETM+) scale before compositing.
    pub fn needs_harmonization(&self) -> bool {
        matches!(self, Sensor::Oli08)
    }
}

impl std::fmt::Display for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Sensor::Tm05 => "LT05",
            Sensor::Etm07 => "LE07",
            Sensor::Oli08 => "LC08",
        };
        write!(f, "{name}")
    }
}
