//! Column-oriented elevation grid, the shared output type of both loaders.
//!
//! A [`Grid`] owns its [`Column`]s in ascending-x order. Columns run
//! south-to-north: sample index 0 is the southernmost row. Row counts may
//! differ between columns — the USGS 24k format legitimately produces
//! profiles of different lengths with sparse leading rows.

/// Sentinel for rows with no data. Matches the SRTM void value.
pub const INVALID_ELEVATION: i32 = -32768;

/// Horizontal coordinate unit of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalUnit {
    /// Geographic coordinates in arc-seconds (1/3600 degree).
    ArcSeconds,
    /// Projected (UTM) coordinates in meters.
    ProjectedMeters,
}

/// Vertical unit the source file encoded elevations in.
///
/// Samples are always *stored* in meters; this tag records the source
/// encoding (24k 10 m grids carry decimeters, converted on ingest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalUnit {
    Meters,
    Decimeters,
}

/// UTM hemisphere band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    Northern,
    Southern,
}

/// UTM zone of a projected grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    pub number: i32,
    pub hemisphere: Hemisphere,
}

/// Horizontal sample spacing, in the grid's horizontal unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

/// Geographic or projected bounds, in the grid's horizontal unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_north: f64,
    pub max_north: f64,
    pub min_east: f64,
    pub max_east: f64,
}

/// A single south-to-north column of elevation samples.
#[derive(Debug, Clone)]
pub struct Column {
    x: f64,
    y: f64,
    samples: Vec<i32>,
}

impl Column {
    /// Create an empty column with its southwest origin and expected length.
    pub fn new(x: f64, y: f64, capacity: usize) -> Self {
        Self {
            x,
            y,
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Append a sample at the next row northward.
    pub fn push(&mut self, elevation: i32) {
        self.samples.push(elevation);
    }

    /// X-coordinate (east/west origin).
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Y-coordinate (south origin of row 0).
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Number of rows, padding rows included.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at `row` (0 = southernmost), if in range.
    pub fn get(&self, row: usize) -> Option<i32> {
        self.samples.get(row).copied()
    }

    /// All samples, south to north.
    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    pub(crate) fn offset(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }
}

/// An in-memory elevation grid produced by one loader invocation.
///
/// Exclusively owned by the caller; loaders never return a partially built
/// grid on failure.
#[derive(Debug, Clone)]
pub struct Grid {
    columns: Vec<Column>,
    scale: Scale,
    bounds: Bounds,
    horizontal_unit: HorizontalUnit,
    vertical_unit: VerticalUnit,
    zone: Option<Zone>,
}

impl Grid {
    pub fn new(
        scale: Scale,
        bounds: Bounds,
        horizontal_unit: HorizontalUnit,
        vertical_unit: VerticalUnit,
    ) -> Self {
        Self {
            columns: Vec::new(),
            scale,
            bounds,
            horizontal_unit,
            vertical_unit,
            zone: None,
        }
    }

    pub(crate) fn with_zone(mut self, zone: Zone) -> Self {
        self.zone = Some(zone);
        self
    }

    /// Append a column. Callers insert in ascending-x order.
    pub fn push_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Columns in ascending-x order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column at `index`, if in range.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn horizontal_unit(&self) -> HorizontalUnit {
        self.horizontal_unit
    }

    pub fn vertical_unit(&self) -> VerticalUnit {
        self.vertical_unit
    }

    /// UTM zone, for projected grids.
    pub fn zone(&self) -> Option<Zone> {
        self.zone
    }

    /// Nearest-sample elevation at `(x, y)` in the grid's horizontal unit.
    ///
    /// Returns `None` outside the grid or where the sample is the
    /// [`INVALID_ELEVATION`] sentinel.
    pub fn elevation_at(&self, x: f64, y: f64) -> Option<i32> {
        let first = self.columns.first()?;
        let col_index = (x - first.x()) / self.scale.x;
        if col_index < -0.5 {
            return None;
        }
        let column = self.columns.get(col_index.round() as usize)?;
        let row_index = (y - column.y()) / self.scale.y;
        if row_index < -0.5 {
            return None;
        }
        match column.get(row_index.round() as usize) {
            Some(INVALID_ELEVATION) | None => None,
            sample => sample,
        }
    }

    pub(crate) fn last_column_mut(&mut self) -> Option<&mut Column> {
        self.columns.last_mut()
    }

    pub(crate) fn set_x_scale(&mut self, x: f64) {
        self.scale.x = x;
    }

    /// Shift every coordinate in the grid by a fixed amount.
    pub(crate) fn offset_coordinates(&mut self, dx: f64, dy: f64) {
        self.bounds.min_east += dx;
        self.bounds.max_east += dx;
        self.bounds.min_north += dy;
        self.bounds.max_north += dy;
        for column in &mut self.columns {
            column.offset(dx, dy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_grid() -> Grid {
        let mut grid = Grid::new(
            Scale { x: 10.0, y: 10.0 },
            Bounds {
                min_north: 0.0,
                max_north: 30.0,
                min_east: 100.0,
                max_east: 120.0,
            },
            HorizontalUnit::ProjectedMeters,
            VerticalUnit::Meters,
        );
        for i in 0..3 {
            let mut column = Column::new(100.0 + i as f64 * 10.0, 0.0, 4);
            for row in 0..4 {
                column.push((i * 100 + row) as i32);
            }
            grid.push_column(column);
        }
        grid
    }

    #[test]
    fn test_elevation_at_exact() {
        let grid = test_grid();
        assert_eq!(grid.elevation_at(100.0, 0.0), Some(0));
        assert_eq!(grid.elevation_at(110.0, 20.0), Some(102));
        assert_eq!(grid.elevation_at(120.0, 30.0), Some(203));
    }

    #[test]
    fn test_elevation_at_nearest() {
        let grid = test_grid();
        // 104 east rounds to the column at 100, 11 north to row 1
        assert_eq!(grid.elevation_at(104.0, 11.0), Some(1));
    }

    #[test]
    fn test_elevation_at_out_of_range() {
        let grid = test_grid();
        assert_eq!(grid.elevation_at(90.0, 0.0), None);
        assert_eq!(grid.elevation_at(100.0, -10.0), None);
        assert_eq!(grid.elevation_at(200.0, 0.0), None);
        assert_eq!(grid.elevation_at(100.0, 45.0), None);
    }

    #[test]
    fn test_elevation_at_void() {
        let mut grid = test_grid();
        let mut column = Column::new(130.0, 0.0, 1);
        column.push(INVALID_ELEVATION);
        grid.push_column(column);
        assert_eq!(grid.elevation_at(130.0, 0.0), None);
    }

    #[test]
    fn test_offset_coordinates() {
        let mut grid = test_grid();
        grid.offset_coordinates(-100.0, 200.0);
        assert_eq!(grid.bounds().min_east, 0.0);
        assert_eq!(grid.bounds().min_north, 200.0);
        assert_eq!(grid.column(0).unwrap().x(), 0.0);
        assert_eq!(grid.column(0).unwrap().y(), 200.0);
    }

    #[test]
    fn test_columns_keep_insertion_order() {
        let grid = test_grid();
        let xs: Vec<f64> = grid.columns().iter().map(|c| c.x()).collect();
        assert_eq!(xs, vec![100.0, 110.0, 120.0]);
    }
}
