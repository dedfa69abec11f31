//! Read access to rectangular pixel grids

/// A grid of pixel intensities addressed by (row, column)
///
/// Dataset samples and the sketch canvas both implement this so one routine
/// can draw either.
pub trait PixelGrid {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Intensity at `(row, col)`, `None` when out of bounds
    fn pixel(&self, row: u32, col: u32) -> Option<u8>;

    /// Intensity drawn at full ink; binary grids keep the default of 1
    fn max_intensity(&self) -> u8 {
        1
    }
}
