//! whipcam-core: Whipple camera geometry and its JSON encoding.
//!
//! This crate turns raw camera tables (pixel coordinates, radii and
//! fixed-width, sentinel-terminated neighbor rows) into a JSON document
//! keyed by ADC channel count.
//!

pub mod dataset;
pub mod encoder;
pub mod error;
pub mod geometry;
pub mod manifest;
pub mod neighbors;

pub use dataset::{Dataset, RawTable};
pub use encoder::{encode_camera, encode_document, GeometryDocument, GeometryRecord};
pub use error::{DataShapeError, Error, Result};
pub use geometry::{CameraGeometry, CHANNELS_PER_ADC};
pub use manifest::{CameraManifest, CameraSpec};
pub use neighbors::{decode_row, NeighborTable, SENTINEL};
