//! Web-Mercator tile addressing.
//!
//! Tiles follow the XYZ scheme: `x` grows eastwards from the antimeridian and
//! `y` grows southwards from the northern Mercator limit. MBTiles rows use
//! the flipped TMS order, exposed through [`TileCoord::tms_row`].

use std::f64::consts::PI;
use std::fmt;

use geo::{Coord, Rect};

/// Lowest zoom level produced.
pub const MIN_ZOOM: u8 = 0;
/// Highest zoom level produced.
pub const MAX_ZOOM: u8 = 14;
/// Latitude limit of the square Web-Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;

/// Number of tiles along each axis at `zoom`.
#[must_use]
pub const fn tiles_per_axis(zoom: u8) -> u32 {
    let shift = if zoom > 31 { 31 } else { zoom };
    1_u32 << shift
}

/// Fractional tile-space position of `location` at `zoom`.
///
/// Latitudes beyond the Mercator limit are clamped first and longitudes are
/// clamped to `[-180, 180]`, so the result always lies in `[0, 2^zoom]` on
/// both axes.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "Web-Mercator forward projection")]
pub fn world_position(location: Coord<f64>, zoom: u8) -> Coord<f64> {
    let n = f64::from(tiles_per_axis(zoom));
    let lon = location.x.clamp(-180.0, 180.0);
    let lat_rad = location.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    Coord {
        x: (lon + 180.0) / 360.0 * n,
        y: (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n,
    }
}

/// Address of one tile in the pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Zoom level.
    pub zoom: u8,
    /// Column, counted from the west.
    pub x: u32,
    /// Row, counted from the north.
    pub y: u32,
}

impl TileCoord {
    /// Construct a tile address.
    #[must_use]
    pub const fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Tile at `zoom` containing `location`, clamped into the grid.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use tilepress_core::TileCoord;
    ///
    /// let tile = TileCoord::containing(Coord { x: 0.0, y: 0.0 }, 1);
    /// assert_eq!(tile, TileCoord::new(1, 1, 1));
    ///
    /// let pole = TileCoord::containing(Coord { x: 180.0, y: -90.0 }, 3);
    /// assert_eq!(pole, TileCoord::new(3, 7, 7));
    /// ```
    #[must_use]
    pub fn containing(location: Coord<f64>, zoom: u8) -> Self {
        let n = tiles_per_axis(zoom);
        let position = world_position(location, zoom);
        Self {
            zoom,
            x: grid_index(position.x, n),
            y: grid_index(position.y, n),
        }
    }

    /// Geographic box covered by the tile, `x = longitude`, `y = latitude`.
    ///
    /// Columns and rows saturate at `u32::MAX`, so addresses outside the grid
    /// yield a box that is meaningless but never panic.
    #[must_use]
    pub fn bounds(&self) -> Rect<f64> {
        let n = f64::from(tiles_per_axis(self.zoom));
        let west = column_longitude(f64::from(self.x), n);
        let east = column_longitude(f64::from(self.x.saturating_add(1)), n);
        let north = row_latitude(f64::from(self.y), n);
        let south = row_latitude(f64::from(self.y.saturating_add(1)), n);
        Rect::new(Coord { x: west, y: south }, Coord { x: east, y: north })
    }

    /// Whether `location` lies inside the tile's box, edges included.
    #[must_use]
    pub fn contains(&self, location: Coord<f64>) -> bool {
        let bounds = self.bounds();
        (bounds.min().x..=bounds.max().x).contains(&location.x)
            && (bounds.min().y..=bounds.max().y).contains(&location.y)
    }

    /// The tile plus its edge-adjacent neighbours that exist in the grid.
    pub fn with_neighbours(&self) -> impl Iterator<Item = Self> + use<> {
        let n = tiles_per_axis(self.zoom);
        let Self { zoom, x, y } = *self;
        let offsets: [(i64, i64); 5] = [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)];
        offsets.into_iter().filter_map(move |(dx, dy)| {
            let nx = u32::try_from(i64::from(x) + dx).ok()?;
            let ny = u32::try_from(i64::from(y) + dy).ok()?;
            (nx < n && ny < n).then_some(Self::new(zoom, nx, ny))
        })
    }

    /// Whether the address exists in the grid at its zoom.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        let n = tiles_per_axis(self.zoom);
        self.zoom < 32 && self.x < n && self.y < n
    }

    /// Row index counted from the south, as stored by MBTiles.
    ///
    /// Saturates at zero for rows outside the grid; check
    /// [`TileCoord::is_valid`] first when the address is untrusted.
    #[must_use]
    pub const fn tms_row(&self) -> u32 {
        tiles_per_axis(self.zoom)
            .saturating_sub(1)
            .saturating_sub(self.y)
    }

    /// Project `location` into tile-local units where the tile spans
    /// `0..extent` on both axes. Positions outside the tile fall outside that
    /// range.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "tile-local scaling")]
    pub fn project(&self, location: Coord<f64>, extent: u32) -> Coord<f64> {
        let position = world_position(location, self.zoom);
        let scale = f64::from(extent);
        Coord {
            x: (position.x - f64::from(self.x)) * scale,
            y: (position.y - f64::from(self.y)) * scale,
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

#[expect(clippy::float_arithmetic, reason = "inverse Web-Mercator projection")]
fn column_longitude(column: f64, n: f64) -> f64 {
    column / n * 360.0 - 180.0
}

#[expect(clippy::float_arithmetic, reason = "inverse Web-Mercator projection")]
fn row_latitude(row: f64, n: f64) -> f64 {
    (PI * (1.0 - 2.0 * row / n)).sinh().atan().to_degrees()
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is floored and clamped into [0, n) before the cast"
)]
fn grid_index(value: f64, n: u32) -> u32 {
    value.floor().clamp(0.0, f64::from(n - 1)) as u32
}
