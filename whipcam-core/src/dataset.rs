//! Raw geometry tables.
//!
//! The dataset is the external input: named tables of pixel coordinates,
//! radii and fixed-width neighbor rows, as transcribed from the camera
//! definition headers. It is read once and then only borrowed.
//!
//! # JSON schema
//!
//! ```text
//! {
//!   "tables": {
//!     "WC109": {
//!       "x": [...], "y": [...], "radius": [...],
//!       "neighbors": [[1, 2, 3, -1, -1, -1, -1], ...]
//!     }
//!   }
//! }
//! ```

use crate::encoder::{encode_document, GeometryDocument};
use crate::error::{Error, Result};
use crate::geometry::CameraGeometry;
use crate::manifest::CameraManifest;
use crate::neighbors::NeighborTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::OnceLock;

static INSTALLED: OnceLock<Dataset> = OnceLock::new();

/// One physical camera table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Pixel X coordinates.
    pub x: Vec<f32>,
    /// Pixel Y coordinates.
    pub y: Vec<f32>,
    /// Pixel radii.
    pub radius: Vec<f32>,
    /// Sentinel-terminated neighbor rows.
    pub neighbors: NeighborTable,
}

impl RawTable {
    /// Largest pixel count every array of the table can serve.
    pub fn capacity(&self) -> usize {
        self.x
            .len()
            .min(self.y.len())
            .min(self.radius.len())
            .min(self.neighbors.len())
    }

    /// Views the first `npix` pixels as a camera keyed by `nadc`.
    pub fn camera(&self, nadc: u32, npix: usize) -> CameraGeometry<'_> {
        CameraGeometry::new(nadc, npix, &self.x, &self.y, &self.radius, &self.neighbors)
    }
}

/// Named raw tables.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Tables by name.
    pub tables: BTreeMap<String, RawTable>,
}

impl Dataset {
    /// Creates an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a dataset from a JSON file.
    ///
    /// # Errors
    /// Fails if the file cannot be read or is not a valid dataset; neighbor
    /// tables with rows of differing widths are rejected here.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset: Self = serde_json::from_reader(BufReader::new(file))?;
        log::info!(
            "loaded {} geometry tables from {}",
            dataset.tables.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Loads a dataset from a JSON string.
    ///
    /// # Errors
    /// Fails if the JSON is not a valid dataset.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Adds or replaces a table.
    pub fn insert(&mut self, name: impl Into<String>, table: RawTable) -> Option<RawTable> {
        self.tables.insert(name.into(), table)
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&RawTable> {
        self.tables.get(name)
    }

    /// Resolves manifest entries into camera views, in manifest order.
    ///
    /// # Errors
    /// Returns [`Error::UnknownTable`] for an entry naming a missing table.
    pub fn cameras<'a>(&'a self, manifest: &CameraManifest) -> Result<Vec<CameraGeometry<'a>>> {
        manifest
            .cameras
            .iter()
            .map(|spec| {
                let table = self
                    .table(&spec.table)
                    .ok_or_else(|| Error::UnknownTable(spec.table.clone()))?;
                log::debug!(
                    "camera {} uses {} of {} pixels from {}",
                    spec.nadc,
                    spec.npix,
                    table.capacity(),
                    spec.table
                );
                Ok(table.camera(spec.nadc, spec.npix))
            })
            .collect()
    }

    /// Encodes every camera of `manifest` into a document carrying the
    /// manifest header.
    ///
    /// # Errors
    /// Fails on an unknown table or any camera that does not encode.
    pub fn encode(&self, manifest: &CameraManifest) -> Result<GeometryDocument> {
        let document = encode_document(self.cameras(manifest)?)?;
        Ok(document.with_header(manifest.header.clone()))
    }
}

/// Installs the process-wide dataset. It cannot be replaced afterwards.
///
/// # Errors
/// Returns [`Error::AlreadyInstalled`] if a dataset is already installed;
/// the given one is dropped.
pub fn install(dataset: Dataset) -> Result<&'static Dataset> {
    let mut fresh = false;
    let installed = INSTALLED.get_or_init(|| {
        fresh = true;
        dataset
    });
    if fresh {
        Ok(installed)
    } else {
        Err(Error::AlreadyInstalled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::CameraSpec;
    use tempfile::NamedTempFile;

    const JSON: &str = r#"{
        "tables": {
            "HEX7": {
                "x": [0.0, 1.0, 0.5, -0.5, -1.0, -0.5, 0.5],
                "y": [0.0, 0.0, 0.866, 0.866, 0.0, -0.866, -0.866],
                "radius": [0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5],
                "neighbors": [
                    [1, 2, 3, 4, 5, 6, -1],
                    [0, 2, 6, -1, -1, -1, -1],
                    [0, 1, 3, -1, -1, -1, -1],
                    [0, 2, 4, -1, -1, -1, -1],
                    [0, 3, 5, -1, -1, -1, -1],
                    [0, 4, 6, -1, -1, -1, -1],
                    [0, 1, 5, -1, -1, -1, -1]
                ]
            }
        }
    }"#;

    fn manifest() -> CameraManifest {
        CameraManifest {
            header: "hex".to_string(),
            cameras: vec![CameraSpec::new(12, "HEX7", 7), CameraSpec::new(24, "HEX7", 3)],
        }
    }

    #[test]
    fn test_from_json() {
        let dataset = Dataset::from_json(JSON).unwrap();
        let table = dataset.table("HEX7").unwrap();
        assert_eq!(table.capacity(), 7);
        assert_eq!(table.neighbors.width(), 7);
    }

    #[test]
    fn test_ragged_neighbor_rows_rejected() {
        let json = r#"{ "tables": { "T": {
            "x": [0.0, 1.0], "y": [0.0, 0.0], "radius": [0.5, 0.5],
            "neighbors": [[1, -1], [0, -1, -1]]
        } } }"#;
        let err = Dataset::from_json(json).unwrap_err().to_string();
        assert!(err.contains("expected 2"), "{err}");
    }

    #[test]
    fn test_encode_reuses_table() {
        let dataset = Dataset::from_json(JSON).unwrap();
        let doc = dataset.encode(&manifest()).unwrap();

        assert_eq!(doc.header(), Some("hex"));
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get(12).unwrap().neighbors[0], vec![1, 2, 3, 4, 5, 6]);

        let truncated = doc.get(24).unwrap();
        assert_eq!(truncated.npix, 3);
        assert_eq!(
            truncated.neighbors,
            vec![vec![1, 2], vec![0, 2], vec![0, 1]]
        );
    }

    #[test]
    fn test_unknown_table() {
        let dataset = Dataset::from_json(JSON).unwrap();
        let manifest = CameraManifest {
            header: String::new(),
            cameras: vec![CameraSpec::new(12, "MISSING", 1)],
        };
        assert!(matches!(
            dataset.encode(&manifest),
            Err(Error::UnknownTable(name)) if name == "MISSING"
        ));
    }

    #[test]
    fn test_from_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), JSON).unwrap();
        let dataset = Dataset::from_file(file.path()).unwrap();
        assert!(dataset.table("HEX7").is_some());
    }

    #[test]
    fn test_install_once() {
        let first = install(Dataset::from_json(JSON).unwrap()).unwrap();
        assert!(first.table("HEX7").is_some());
        assert!(matches!(install(Dataset::new()), Err(Error::AlreadyInstalled)));
        assert!(std::ptr::eq(INSTALLED.get().unwrap(), first));
    }
}
