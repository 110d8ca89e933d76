//! Track surfaces the vehicles drive on.
//!
//! The simulation never looks at pixels directly; it asks a [`TrackSurface`]
//! what [`Category`] a point belongs to. Decoding an actual bitmap is left to
//! whoever builds the surface.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a single track pixel means to the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Track,
    Border,
    Sector1,
    Sector2,
    Sector3,
    OutOfBounds,
}

impl Category {
    /// Sector number (1..=3) for sector categories.
    pub fn sector(self) -> Option<u8> {
        match self {
            Category::Sector1 => Some(1),
            Category::Sector2 => Some(2),
            Category::Sector3 => Some(3),
            _ => None,
        }
    }

    /// Categories that stop a radar ray.
    pub fn blocks_radar(self) -> bool {
        !matches!(self, Category::Track)
    }
}

/// Upper bound on the pixel count of a loaded map.
pub const MAX_TRACK_PIXELS: u64 = 1 << 26;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    #[error("Track map is empty")]
    Empty,

    #[error("Track scale must be at least 1")]
    InvalidScale,

    #[error("Track of {columns}x{rows} cells at scale {scale} is too large")]
    TooLarge { columns: usize, rows: usize, scale: u32 },

    #[error("Unknown track symbol {symbol:?} at row {row}, column {column}")]
    UnknownSymbol {
        symbol: char,
        row: usize,
        column: usize,
    },
}

/// Point-sampling oracle over a rectangular color-indexed surface.
pub trait TrackSurface: Send + Sync {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Category of an in-bounds pixel.
    fn category_at(&self, x: u32, y: u32) -> Category;

    /// Bounds-checked sampling; anything outside the surface is `OutOfBounds`.
    fn sample(&self, x: i64, y: i64) -> Category {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return Category::OutOfBounds;
        }
        self.category_at(x as u32, y as u32)
    }
}

/// Row-major in-memory category grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridTrack {
    width: u32,
    height: u32,
    cells: Vec<Category>,
}

impl GridTrack {
    pub fn filled(width: u32, height: u32, category: Category) -> Self {
        Self {
            width,
            height,
            cells: vec![category; width as usize * height as usize],
        }
    }

    /// Sets one pixel; writes outside the grid are ignored.
    pub fn set(&mut self, x: u32, y: u32, category: Category) {
        if x < self.width && y < self.height {
            let index = self.index(x, y);
            self.cells[index] = category;
        }
    }

    /// Paints a rectangle, clipped to the grid.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, category: Category) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for row in y..y_end {
            for column in x..x_end {
                let index = self.index(column, row);
                self.cells[index] = category;
            }
        }
    }

    /// Parses a text map where every character stands for a `scale`×`scale` block.
    ///
    /// `#` is border, `.` or space is track, `1`/`2`/`3` are the sectors.
    /// Short rows are padded with track.
    pub fn from_ascii(text: &str, scale: u32) -> Result<Self, TrackError> {
        if scale == 0 {
            return Err(TrackError::InvalidScale);
        }

        let rows: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
        let columns = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        if rows.is_empty() || columns == 0 {
            return Err(TrackError::Empty);
        }

        let too_large = || TrackError::TooLarge {
            columns,
            rows: rows.len(),
            scale,
        };
        let width = u32::try_from(columns)
            .ok()
            .and_then(|columns| columns.checked_mul(scale))
            .ok_or_else(too_large)?;
        let height = u32::try_from(rows.len())
            .ok()
            .and_then(|rows| rows.checked_mul(scale))
            .ok_or_else(too_large)?;
        if width as u64 * height as u64 > MAX_TRACK_PIXELS {
            return Err(too_large());
        }

        let mut track = Self::filled(width, height, Category::Track);

        for (row, line) in rows.iter().enumerate() {
            for (column, symbol) in line.chars().enumerate() {
                let category = match symbol {
                    '#' => Category::Border,
                    '.' | ' ' => Category::Track,
                    '1' => Category::Sector1,
                    '2' => Category::Sector2,
                    '3' => Category::Sector3,
                    _ => {
                        return Err(TrackError::UnknownSymbol {
                            symbol,
                            row,
                            column,
                        })
                    }
                };
                if category != Category::Track {
                    track.fill_rect(
                        column as u32 * scale,
                        row as u32 * scale,
                        scale,
                        scale,
                        category,
                    );
                }
            }
        }

        Ok(track)
    }

    /// Rectangular circuit used when no map is supplied.
    ///
    /// Everything off the lane is border. The default spawn pose sits on the
    /// bottom straight facing +x; turning left at each corner crosses sector
    /// lines 1, 2 and 3 in order before returning to sector 1.
    pub fn ring(width: u32, height: u32) -> Self {
        let mut track = Self::filled(width, height, Category::Border);

        let outer = 40;
        let lane = 200;
        let inner_x0 = outer + lane;
        let inner_y0 = outer + lane;
        let outer_w = width.saturating_sub(2 * outer);
        let outer_h = height.saturating_sub(2 * outer);
        let inner_w = width.saturating_sub(2 * inner_x0);
        let inner_h = height.saturating_sub(2 * inner_y0);

        track.fill_rect(outer, outer, outer_w, outer_h, Category::Track);
        track.fill_rect(inner_x0, inner_y0, inner_w, inner_h, Category::Border);

        let bottom_lane_y = height.saturating_sub(outer + lane);
        let line = 2;
        track.fill_rect(width * 4 / 7, bottom_lane_y, line, lane, Category::Sector1);
        track.fill_rect(width / 2, outer, line, lane, Category::Sector2);
        track.fill_rect(outer, height / 2, lane, line, Category::Sector3);

        track
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

impl TrackSurface for GridTrack {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn category_at(&self, x: u32, y: u32) -> Category {
        self.cells[self.index(x, y)]
    }
}
