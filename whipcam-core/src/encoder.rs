//! Encoding of camera geometries into the JSON geometry document.
//!
//! The document is a single JSON object: an optional `"header"` string
//! followed by one entry per camera keyed by its ADC channel count.
//!
//! ```text
//! {
//!   "header": "...",
//!   "120": { "nadc": 120, "npix": 109, "x": [...], "y": [...], "r": [...],
//!            "neighbors": [[...], ...] },
//!   ...
//! }
//! ```

use crate::error::{DataShapeError, Error, Result};
use crate::geometry::{CameraGeometry, CHANNELS_PER_ADC};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io::Write;

/// Key of the free-text description in the document.
pub const HEADER_KEY: &str = "header";

/// One encoded camera: coordinates truncated to `npix` and decoded
/// neighbor lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRecord {
    /// ADC channel count.
    pub nadc: u32,
    /// Active pixel count.
    pub npix: usize,
    /// Pixel X coordinates.
    pub x: Vec<f32>,
    /// Pixel Y coordinates.
    pub y: Vec<f32>,
    /// Pixel radii.
    pub r: Vec<f32>,
    /// Neighbor indices per pixel, all below `npix`.
    pub neighbors: Vec<Vec<u32>>,
}

impl GeometryRecord {
    /// Total number of neighbor entries over all pixels.
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum()
    }
}

/// Encodes one camera.
///
/// Copies the first `pixel_count` coordinates and radii and decodes each
/// neighbor row up to its sentinel, keeping only indices of active pixels.
///
/// # Errors
/// Returns a [`DataShapeError`] if the backing arrays are shorter than
/// `pixel_count` or a neighbor row is malformed.
pub fn encode_camera(
    camera: &CameraGeometry<'_>,
) -> std::result::Result<GeometryRecord, DataShapeError> {
    camera.validate()?;
    let npix = camera.pixel_count;
    let neighbors = camera.neighbor_rows.decode(npix)?;

    Ok(GeometryRecord {
        nadc: camera.channel_count,
        npix,
        x: camera.x[..npix].to_vec(),
        y: camera.y[..npix].to_vec(),
        r: camera.radius[..npix].to_vec(),
        neighbors,
    })
}

/// Encodes cameras in order into one document.
///
/// A later camera with an already used channel count replaces the earlier
/// one in place.
///
/// # Errors
/// Fails on the first camera that does not encode; nothing is returned
/// for the others.
pub fn encode_document<'a, I>(cameras: I) -> Result<GeometryDocument>
where
    I: IntoIterator<Item = CameraGeometry<'a>>,
{
    let mut document = GeometryDocument::new();
    for camera in cameras {
        let record = encode_camera(&camera)?;
        log::debug!(
            "encoded camera {}: {} pixels, {} neighbor entries",
            record.nadc,
            record.npix,
            record.neighbor_count()
        );
        if let Some(previous) = document.insert(record) {
            log::warn!(
                "camera {} ({} pixels) replaced by a later entry",
                previous.nadc,
                previous.npix
            );
        }
    }
    Ok(document)
}

/// Encoded cameras keyed by channel count, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryDocument {
    header: Option<String>,
    cameras: Vec<GeometryRecord>,
}

impl GeometryDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the free-text header emitted ahead of the cameras.
    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Returns the header, if any.
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// Inserts a record, replacing any record with the same `nadc` without
    /// moving it. Returns the replaced record.
    pub fn insert(&mut self, record: GeometryRecord) -> Option<GeometryRecord> {
        match self.cameras.iter_mut().find(|r| r.nadc == record.nadc) {
            Some(slot) => Some(std::mem::replace(slot, record)),
            None => {
                self.cameras.push(record);
                None
            }
        }
    }

    /// Looks up a camera by exact channel count.
    pub fn get(&self, nadc: u32) -> Option<&GeometryRecord> {
        self.cameras.iter().find(|r| r.nadc == nadc)
    }

    /// Looks up the camera read out by `channels` ADC channels, or by
    /// `channels` pixels.
    ///
    /// The count is rounded up to a whole number of ADC boards first, so
    /// 331 finds the 336-channel camera.
    pub fn camera_for_channels(&self, channels: u32) -> Option<&GeometryRecord> {
        self.get(channels.checked_next_multiple_of(CHANNELS_PER_ADC)?)
    }

    /// Number of cameras.
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// Returns true if the document holds no cameras.
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Iterates over cameras in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &GeometryRecord> {
        self.cameras.iter()
    }

    /// Renders the document as indented JSON.
    ///
    /// # Errors
    /// Propagates serializer failures.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the document as indented JSON followed by a newline.
    ///
    /// # Errors
    /// Returns an error if serialization or the underlying writer fails.
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Parses a document previously produced by [`to_json_pretty`](Self::to_json_pretty).
    ///
    /// # Errors
    /// Returns [`Error::Json`] for malformed JSON or records, including a
    /// key that disagrees with its record's `nadc`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::from)
    }
}

impl<'a> IntoIterator for &'a GeometryDocument {
    type Item = &'a GeometryRecord;
    type IntoIter = std::slice::Iter<'a, GeometryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.cameras.iter()
    }
}

impl Serialize for GeometryDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = self.cameras.len() + usize::from(self.header.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(header) = &self.header {
            map.serialize_entry(HEADER_KEY, header)?;
        }
        for record in &self.cameras {
            map.serialize_entry(&record.nadc.to_string(), record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for GeometryDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = GeometryDocument;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of channel counts to camera geometry records")
    }

    fn visit_map<A: MapAccess<'de>>(
        self,
        mut access: A,
    ) -> std::result::Result<Self::Value, A::Error> {
        let mut document = GeometryDocument::new();
        while let Some(key) = access.next_key::<String>()? {
            if key == HEADER_KEY {
                document.header = Some(access.next_value()?);
                continue;
            }
            let nadc: u32 = key.parse().map_err(|_| {
                <A::Error as de::Error>::custom(format!("camera key {key:?} is not a channel count"))
            })?;
            let record: GeometryRecord = access.next_value()?;
            if record.nadc != nadc {
                return Err(<A::Error as de::Error>::custom(format!(
                    "camera key {nadc} holds a record with nadc {}",
                    record.nadc
                )));
            }
            document.insert(record);
        }
        Ok(document)
    }
}
