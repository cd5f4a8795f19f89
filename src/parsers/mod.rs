//! Format parsers for uploaded geospatial files.
//!
//! The format is resolved once from the file extension into [`UploadFormat`];
//! each variant owns its parser and there is no fallthrough for unknown types.

pub mod geojson;
pub mod kml;
pub mod tiff;

use serde_json::Value;
use std::fmt;

use crate::core::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    GeoJson,
    Kml,
    Tiff,
}

/// Knobs shared by the parsers
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Reject GeoJSON that is not a FeatureCollection instead of passing it through
    pub strict_geojson: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict_geojson: true,
        }
    }
}

impl UploadFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "geojson" => Some(UploadFormat::GeoJson),
            "kml" => Some(UploadFormat::Kml),
            "tiff" => Some(UploadFormat::Tiff),
            _ => None,
        }
    }

    /// Resolve the format from the text after the last `.` of a file name
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn extension(self) -> &'static str {
        match self {
            UploadFormat::GeoJson => "geojson",
            UploadFormat::Kml => "kml",
            UploadFormat::Tiff => "tiff",
        }
    }

    pub fn parse(self, bytes: &[u8], options: &ParseOptions) -> Result<Value, ParseError> {
        match self {
            UploadFormat::GeoJson => geojson::parse(bytes, options.strict_geojson),
            UploadFormat::Kml => kml::parse(bytes),
            UploadFormat::Tiff => tiff::parse(bytes),
        }
    }
}

impl fmt::Display for UploadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
