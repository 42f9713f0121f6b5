#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Skirmish.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, so the dependency is declared without default features.
//! Consumers that need sound can enable `macroquad/audio` themselves.

use anyhow::Result;
use glam::Vec2;
use macroquad::input::{is_key_down, is_key_pressed, KeyCode};
use skirmish_rendering::{Color, FrameInput, Presentation, RenderingBackend, Scene};
use std::time::Duration;

/// Thickness of grid lines in pixels.
const GRID_LINE_THICKNESS: f32 = 1.0;

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to close the window.
    quit_requested: bool,
    /// `Space` pressed this frame to play one turn.
    advance_pressed: bool,
    /// `Space` held down to keep playing turns.
    advance_held: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q),
            advance_pressed: is_key_pressed(KeyCode::Space),
            advance_held: is_key_down(KeyCode::Space),
        }
    }
}

/// Turns a held key into a steady stream of turn requests.
///
/// A fresh press fires immediately; holding the key fires again every
/// `interval`.
#[doc(hidden)]
#[derive(Clone, Copy, Debug)]
pub struct AutoAdvance {
    interval: Duration,
    held_for: Duration,
}

impl AutoAdvance {
    /// Creates a repeater firing every `interval` while held.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            held_for: Duration::ZERO,
        }
    }

    /// Feeds one frame of input and reports whether a turn should be played.
    pub fn update(&mut self, frame_dt: Duration, pressed: bool, held: bool) -> bool {
        if pressed {
            self.held_for = Duration::ZERO;
            return true;
        }
        if !held || self.interval.is_zero() {
            self.held_for = Duration::ZERO;
            return false;
        }

        self.held_for += frame_dt;
        if self.held_for >= self.interval {
            self.held_for -= self.interval;
            return true;
        }
        false
    }
}

impl Default for AutoAdvance {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Clone, Copy, Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    auto_advance: AutoAdvance,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures how often turns repeat while the advance key is held.
    #[must_use]
    pub fn with_auto_advance(mut self, interval: Duration) -> Self {
        self.auto_advance = AutoAdvance::new(interval);
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            mut auto_advance,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let window = scene.layout.window();
        let mut config = macroquad::window::Conf {
            window_title,
            window_width: window.x.round() as i32,
            window_height: window.y.round() as i32,
            window_resizable: false,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        tracing::info!(width = window.x, height = window.y, "opening visualizer window");
        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input = FrameInput {
                    advance_turn: auto_advance.update(
                        frame_dt,
                        keyboard.advance_pressed,
                        keyboard.advance_held,
                    ),
                };

                update_scene(frame_dt, frame_input, &mut scene);

                macroquad::window::clear_background(background);
                draw_cells(&scene);
                draw_grid_lines(&scene);
                draw_units(&scene);

                macroquad::window::next_frame().await;
            }
        });

        tracing::info!("visualizer window closed");
        Ok(())
    }
}

fn draw_cells(scene: &Scene) {
    let color = to_macroquad_color(scene.cell_color);
    for cell in scene.layout.cells() {
        macroquad::shapes::draw_rectangle(
            cell.origin.x,
            cell.origin.y,
            cell.size.x,
            cell.size.y,
            color,
        );
    }
}

fn draw_grid_lines(scene: &Scene) {
    let color = to_macroquad_color(scene.line_color);
    for line in scene.layout.grid_lines() {
        let (start, end) = (snap(line.start), snap(line.end));
        macroquad::shapes::draw_line(start.x, start.y, end.x, end.y, GRID_LINE_THICKNESS, color);
    }
}

fn draw_units(scene: &Scene) {
    for unit in &scene.units {
        macroquad::shapes::draw_circle(
            unit.center.x,
            unit.center.y,
            unit.radius.floor(),
            to_macroquad_color(unit.color),
        );
    }
}

/// Offsets a point onto the pixel centre so one pixel lines stay crisp.
fn snap(point: Vec2) -> Vec2 {
    point.floor() + Vec2::splat(0.5)
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
