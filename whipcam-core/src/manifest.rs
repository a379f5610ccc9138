//! Which raw table feeds which camera.
//!
//! A manifest lists the cameras to encode, in output order. Each entry
//! names a raw table in the dataset and the active pixel count to take
//! from it, so one table can back several cameras.

use crate::error::{Error, Result};
use crate::geometry::CHANNELS_PER_ADC;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Default description written at the top of the geometry document.
pub const WHIPPLE_HEADER: &str = "whipple_cams.json - Stephen Fegan - 2024-12-26\n\n\
Pixel positions, radii and neighbor map for Whipple cameras, extracted from\n\
WhippleCams.h, a part of ChiLA. The cameras are keyed by the number of ADC\n\
channels read out, which is larger than the number of pixels, each ADC having\n\
twelve channels.\n\n\
This file is part of \"pyfzreader\".\n\n\
\"pyfzreader\" is free software: you can redistribute it and/or modify it under\n\
the terms of the GNU General Public License version 2 or later, as published by\n\
the Free Software Foundation.\n\n\
\"pyfzreader\" is distributed in the hope that it will be useful, but WITHOUT ANY\n\
WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR\n\
A PARTICULAR PURPOSE.  See the GNU General Public License for more details.\n";

/// One camera to encode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraSpec {
    /// ADC channel count, the output key.
    pub nadc: u32,
    /// Name of the raw table in the dataset.
    pub table: String,
    /// Active pixel count taken from the table.
    pub npix: usize,
}

impl CameraSpec {
    /// Creates a camera entry.
    pub fn new(nadc: u32, table: impl Into<String>, npix: usize) -> Self {
        Self {
            nadc,
            table: table.into(),
            npix,
        }
    }
}

/// Ordered list of cameras plus the document header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraManifest {
    /// Free-text header for the output document.
    pub header: String,
    /// Cameras in output order.
    pub cameras: Vec<CameraSpec>,
}

impl Default for CameraManifest {
    fn default() -> Self {
        Self::whipple()
    }
}

// Partial-override schema: anything left out keeps the Whipple default.
#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonManifest {
    header: Option<String>,
    cameras: Option<Vec<CameraSpec>>,
}

impl CameraManifest {
    /// The five Whipple 10m camera configurations.
    ///
    /// - 120 channels: 109-pixel camera
    /// - 156 channels: 151-pixel camera
    /// - 336 channels: 331-pixel camera
    /// - 492 channels: 490-pixel camera
    /// - 384 channels: inner 379 pixels of the 490-pixel camera
    pub fn whipple() -> Self {
        Self {
            header: WHIPPLE_HEADER.to_string(),
            cameras: vec![
                CameraSpec::new(120, "WC109", 109),
                CameraSpec::new(156, "WC151", 151),
                CameraSpec::new(336, "WC331", 331),
                CameraSpec::new(492, "WC490", 490),
                CameraSpec::new(384, "WC490", 379),
            ],
        }
    }

    /// Loads a manifest from a JSON file.
    ///
    /// # Errors
    /// Fails if the file cannot be read, is not valid JSON, or the result
    /// does not pass [`validate`](Self::validate).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let json: JsonManifest = serde_json::from_reader(BufReader::new(file))?;
        Self::from_json_manifest(json)
    }

    /// Loads a manifest from a JSON string.
    ///
    /// # Errors
    /// Fails on invalid JSON or if [`validate`](Self::validate) fails.
    pub fn from_json(json: &str) -> Result<Self> {
        let json: JsonManifest = serde_json::from_str(json)?;
        Self::from_json_manifest(json)
    }

    fn from_json_manifest(json: JsonManifest) -> Result<Self> {
        let defaults = Self::whipple();
        let manifest = Self {
            header: json.header.unwrap_or(defaults.header),
            cameras: json.cameras.unwrap_or(defaults.cameras),
        };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Checks every camera entry.
    ///
    /// A channel count must be a positive multiple of twelve and cover the
    /// pixel count. Reused channel counts are allowed but logged, since the
    /// later camera replaces the earlier one in the output.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] for the first invalid entry.
    pub fn validate(&self) -> Result<()> {
        for (i, camera) in self.cameras.iter().enumerate() {
            if camera.nadc == 0 || camera.nadc % CHANNELS_PER_ADC != 0 {
                return Err(Error::ConfigError(format!(
                    "camera {i}: nadc {} is not a positive multiple of {CHANNELS_PER_ADC}",
                    camera.nadc
                )));
            }
            if (camera.nadc as usize) < camera.npix {
                return Err(Error::ConfigError(format!(
                    "camera {i}: nadc {} is smaller than npix {}",
                    camera.nadc, camera.npix
                )));
            }
            if self.cameras[..i].iter().any(|c| c.nadc == camera.nadc) {
                log::warn!(
                    "camera {i}: nadc {} already used, the later entry wins",
                    camera.nadc
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_whipple_defaults() {
        let manifest = CameraManifest::whipple();
        let keys: Vec<u32> = manifest.cameras.iter().map(|c| c.nadc).collect();
        assert_eq!(keys, vec![120, 156, 336, 492, 384]);
        assert_eq!(manifest.cameras[4], CameraSpec::new(384, "WC490", 379));
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_whipple_header_text() {
        assert!(WHIPPLE_HEADER.starts_with("whipple_cams.json - Stephen Fegan - 2024-12-26\n\n"));
        assert!(WHIPPLE_HEADER.contains("extracted from\nWhippleCams.h, a part of ChiLA."));
        assert!(WHIPPLE_HEADER.contains("version 2 or later"));
        assert!(WHIPPLE_HEADER.ends_with("for more details.\n"));
    }

    #[test]
    fn test_json_header_only() {
        let manifest = CameraManifest::from_json(r#"{ "header": "custom" }"#).unwrap();
        assert_eq!(manifest.header, "custom");
        assert_eq!(manifest.cameras, CameraManifest::whipple().cameras);
    }

    #[test]
    fn test_json_empty() {
        let manifest = CameraManifest::from_json("{}").unwrap();
        assert_eq!(manifest, CameraManifest::whipple());
    }

    #[test]
    fn test_json_cameras_only() {
        let json = r#"{ "cameras": [ { "nadc": 24, "table": "T", "npix": 19 } ] }"#;
        let manifest = CameraManifest::from_json(json).unwrap();
        assert_eq!(manifest.header, WHIPPLE_HEADER);
        assert_eq!(manifest.cameras, vec![CameraSpec::new(24, "T", 19)]);
    }

    #[test]
    fn test_invalid_nadc_rejected() {
        let json = r#"{ "cameras": [ { "nadc": 100, "table": "T", "npix": 19 } ] }"#;
        let err = CameraManifest::from_json(json).unwrap_err().to_string();
        assert!(err.contains("multiple of 12"), "{err}");

        let json = r#"{ "cameras": [ { "nadc": 12, "table": "T", "npix": 19 } ] }"#;
        let err = CameraManifest::from_json(json).unwrap_err().to_string();
        assert!(err.contains("smaller than npix"), "{err}");
    }

    #[test]
    fn test_from_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{ "header": "from disk" }"#).unwrap();
        let manifest = CameraManifest::from_file(file.path()).unwrap();
        assert_eq!(manifest.header, "from disk");
    }
}
