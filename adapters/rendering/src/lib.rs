#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Skirmish adapters.
//!
//! The visualizer draws a battle as a fixed-size window split into one cell
//! per grid node: white cells, dark grey grid lines and a filled circle for
//! every unit. Geometry is computed here so backends only issue draw calls.

use anyhow::Result as AnyResult;
use glam::Vec2;
use skirmish_core::Node;
use std::{error::Error, fmt, time::Duration};

/// Width of the visualizer window in pixels.
pub const WINDOW_WIDTH: f32 = 800.0;

/// Height of the visualizer window in pixels.
pub const WINDOW_HEIGHT: f32 = 800.0;

/// Ratio between a unit marker's radius and the cell width.
pub const UNIT_RADIUS_FACTOR: f32 = 0.45;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::from_rgb_u8(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::from_rgb_u8(255, 255, 255);
    /// Grid line grey.
    pub const DARK_GREY: Self = Self::from_rgb_u8(40, 40, 40);
    /// Marker color of units that died.
    pub const FADED_GREY: Self = Self::from_rgb_u8(160, 160, 160);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Maps grid nodes onto window pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    columns: u32,
    rows: u32,
    window: Vec2,
    cell_size: Vec2,
}

impl GridLayout {
    /// Lays out a `columns` by `rows` grid across a window of `window` pixels.
    pub fn new(columns: u32, rows: u32, window: Vec2) -> Result<Self, RenderingError> {
        if columns == 0 || rows == 0 {
            return Err(RenderingError::EmptyGrid { columns, rows });
        }
        if window.x <= 0.0 || window.y <= 0.0 {
            return Err(RenderingError::EmptyWindow {
                width: window.x,
                height: window.y,
            });
        }

        Ok(Self {
            columns,
            rows,
            window,
            cell_size: Vec2::new(window.x / columns as f32, window.y / rows as f32),
        })
    }

    /// Lays out a grid across the standard visualizer window.
    pub fn standard(columns: u32, rows: u32) -> Result<Self, RenderingError> {
        Self::new(columns, rows, Vec2::new(WINDOW_WIDTH, WINDOW_HEIGHT))
    }

    /// Number of grid columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of grid rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Window dimensions in pixels.
    #[must_use]
    pub const fn window(&self) -> Vec2 {
        self.window
    }

    /// Pixel dimensions of a single cell.
    #[must_use]
    pub const fn cell_size(&self) -> Vec2 {
        self.cell_size
    }

    /// Top-left pixel of the cell drawn for `node`.
    #[must_use]
    pub fn cell_origin(&self, node: Node) -> Vec2 {
        Vec2::new(node.x() as f32, node.y() as f32) * self.cell_size
    }

    /// Centre pixel of the cell drawn for `node`.
    #[must_use]
    pub fn cell_center(&self, node: Node) -> Vec2 {
        self.cell_origin(node) + self.cell_size * 0.5
    }

    /// Radius of a unit marker.
    #[must_use]
    pub fn unit_radius(&self) -> f32 {
        UNIT_RADIUS_FACTOR * self.cell_size.x
    }

    /// Filled rectangles covering every cell in row-major order.
    #[must_use]
    pub fn cells(&self) -> Vec<CellRect> {
        (0..self.rows)
            .flat_map(|y| (0..self.columns).map(move |x| Node::new(x, y)))
            .map(|node| CellRect {
                origin: self.cell_origin(node),
                size: self.cell_size,
            })
            .collect()
    }

    /// Vertical lines at every column boundary followed by horizontal lines
    /// at every row boundary, starting from the window's top-left edge.
    #[must_use]
    pub fn grid_lines(&self) -> Vec<LineSegment> {
        let vertical = (0..self.columns).map(|column| {
            let x = column as f32 * self.cell_size.x;
            LineSegment {
                start: Vec2::new(x, 0.0),
                end: Vec2::new(x, self.window.y),
            }
        });
        let horizontal = (0..self.rows).map(|row| {
            let y = row as f32 * self.cell_size.y;
            LineSegment {
                start: Vec2::new(0.0, y),
                end: Vec2::new(self.window.x, y),
            }
        });
        vertical.chain(horizontal).collect()
    }
}

/// Axis-aligned rectangle in window pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellRect {
    /// Top-left corner.
    pub origin: Vec2,
    /// Width and height.
    pub size: Vec2,
}

/// Straight line in window pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    /// First endpoint.
    pub start: Vec2,
    /// Second endpoint.
    pub end: Vec2,
}

/// Unit state the visualizer needs to place a marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitMarker {
    /// Node the unit stands on.
    pub node: Node,
    /// Whether the unit is still fighting.
    pub alive: bool,
}

/// Circle drawn for a single unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitPresentation {
    /// Centre of the circle in window pixels.
    pub center: Vec2,
    /// Radius in pixels.
    pub radius: f32,
    /// Fill color.
    pub color: Color,
}

/// Everything a backend draws for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Mapping between nodes and pixels.
    pub layout: GridLayout,
    /// Fill color of every cell.
    pub cell_color: Color,
    /// Color of the grid lines.
    pub line_color: Color,
    /// Unit markers in join order.
    pub units: Vec<UnitPresentation>,
}

impl Scene {
    /// Creates a scene with the standard palette and the provided units.
    #[must_use]
    pub fn new<I>(layout: GridLayout, units: I) -> Self
    where
        I: IntoIterator<Item = UnitMarker>,
    {
        let mut scene = Self {
            layout,
            cell_color: Color::WHITE,
            line_color: Color::DARK_GREY,
            units: Vec::new(),
        };
        scene.set_units(units);
        scene
    }

    /// Replaces the unit markers.
    pub fn set_units<I>(&mut self, units: I)
    where
        I: IntoIterator<Item = UnitMarker>,
    {
        let radius = self.layout.unit_radius();
        self.units = units
            .into_iter()
            .map(|marker| UnitPresentation {
                center: self.layout.cell_center(marker.node),
                radius,
                color: if marker.alive {
                    Color::BLACK
                } else {
                    Color::FADED_GREY
                },
            })
            .collect();
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    /// Whether the viewer asked for the next turn to be played.
    pub advance_turn: bool,
}

/// Rendering backend capable of presenting Skirmish scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// `update_scene` receives the frame delta and the input captured by the
    /// adapter, and may mutate the scene before it is drawn.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RenderingError {
    /// A grid needs at least one column and one row.
    EmptyGrid {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// The window must have a positive area.
    EmptyWindow {
        /// Requested width in pixels.
        width: f32,
        /// Requested height in pixels.
        height: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid { columns, rows } => {
                write!(f, "cannot lay out a {columns}x{rows} grid")
            }
            Self::EmptyWindow { width, height } => {
                write!(f, "window size must be positive (received {width}x{height})")
            }
        }
    }
}

impl Error for RenderingError {}
