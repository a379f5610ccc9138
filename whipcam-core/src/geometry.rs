//! Camera geometry records.

use crate::error::DataShapeError;
use crate::neighbors::NeighborTable;

/// Number of channels on one ADC board; every `channel_count` is a multiple.
pub const CHANNELS_PER_ADC: u32 = 12;

/// One camera configuration as a view into a raw geometry table.
///
/// The backing arrays may be longer than `pixel_count`: the same physical
/// table can describe a truncated camera, in which case the trailing
/// entries are ignored.
#[derive(Debug, Clone, Copy)]
pub struct CameraGeometry<'a> {
    /// Number of ADC channels read out; the output key.
    pub channel_count: u32,
    /// Number of active pixels.
    pub pixel_count: usize,
    /// Pixel X coordinates.
    pub x: &'a [f32],
    /// Pixel Y coordinates.
    pub y: &'a [f32],
    /// Pixel radii.
    pub radius: &'a [f32],
    /// Fixed-width, sentinel-terminated neighbor rows.
    pub neighbor_rows: &'a NeighborTable,
}

impl<'a> CameraGeometry<'a> {
    /// Creates a camera view.
    pub fn new(
        channel_count: u32,
        pixel_count: usize,
        x: &'a [f32],
        y: &'a [f32],
        radius: &'a [f32],
        neighbor_rows: &'a NeighborTable,
    ) -> Self {
        Self {
            channel_count,
            pixel_count,
            x,
            y,
            radius,
            neighbor_rows,
        }
    }

    /// Checks that every backing array covers `pixel_count` pixels and that
    /// the active coordinates and radii are finite.
    ///
    /// # Errors
    /// [`DataShapeError::RaggedCoordinates`] for a short coordinate array,
    /// [`DataShapeError::NonFiniteCoordinate`] for a NaN or infinite value,
    /// [`DataShapeError::PixelCountExceedsTable`] for a short neighbor table.
    pub fn validate(&self) -> Result<(), DataShapeError> {
        for (array, values) in [("x", self.x), ("y", self.y), ("radius", self.radius)] {
            if values.len() < self.pixel_count {
                return Err(DataShapeError::RaggedCoordinates {
                    nadc: self.channel_count,
                    array,
                    len: values.len(),
                    npix: self.pixel_count,
                });
            }
            if let Some((pixel, &value)) = values[..self.pixel_count]
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_finite())
            {
                return Err(DataShapeError::NonFiniteCoordinate {
                    nadc: self.channel_count,
                    array,
                    pixel,
                    value,
                });
            }
        }
        if self.neighbor_rows.len() < self.pixel_count {
            return Err(DataShapeError::PixelCountExceedsTable {
                nadc: self.channel_count,
                rows: self.neighbor_rows.len(),
                npix: self.pixel_count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> NeighborTable {
        NeighborTable::from_rows(&[[1, -1], [0, -1]]).unwrap()
    }

    #[test]
    fn test_validate_ok_with_trailing_entries() {
        let table = table();
        let xs = [0.0, 1.0, 2.0];
        let camera = CameraGeometry::new(12, 2, &xs, &xs, &xs, &table);
        assert!(camera.validate().is_ok());
    }

    #[test]
    fn test_validate_short_radius() {
        let table = table();
        let xs = [0.0, 1.0];
        let camera = CameraGeometry::new(12, 2, &xs, &xs, &xs[..1], &table);
        assert_eq!(
            camera.validate().unwrap_err(),
            DataShapeError::RaggedCoordinates {
                nadc: 12,
                array: "radius",
                len: 1,
                npix: 2
            }
        );
    }

    #[test]
    fn test_validate_non_finite() {
        let table = table();
        let xs = [0.0, 1.0];
        let ys = [0.0, f32::INFINITY];
        let camera = CameraGeometry::new(12, 2, &xs, &ys, &xs, &table);
        assert!(matches!(
            camera.validate().unwrap_err(),
            DataShapeError::NonFiniteCoordinate {
                nadc: 12,
                array: "y",
                pixel: 1,
                ..
            }
        ));

        // Only active pixels are checked.
        let rs = [0.5, 0.5, f32::NAN];
        let camera = CameraGeometry::new(12, 2, &xs, &xs, &rs, &table);
        assert!(camera.validate().is_ok());
    }

    #[test]
    fn test_validate_short_table() {
        let table = table();
        let xs = [0.0; 3];
        let camera = CameraGeometry::new(12, 3, &xs, &xs, &xs, &table);
        assert_eq!(
            camera.validate().unwrap_err(),
            DataShapeError::PixelCountExceedsTable {
                nadc: 12,
                rows: 2,
                npix: 3
            }
        );
    }
}
