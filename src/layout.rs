use macroquad::math::{vec2, Rect};

use crate::app::Tool;
use crate::config::Config;
use crate::grid::Coord;

const BUTTON_X: f32 = 10.0;
const BUTTON_WIDTH: f32 = 160.0;
const BUTTON_HEIGHT: f32 = 40.0;
const TOOL_BUTTON_TOP: f32 = 60.0;
const TOOL_BUTTON_STRIDE: f32 = 50.0;

/// Clickable areas of the options panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Tool(Tool),
    Run,
    Reset,
}

impl Button {
    pub fn label(self) -> &'static str {
        match self {
            Button::Tool(tool) => tool.label(),
            Button::Run => "Start",
            Button::Reset => "Reset",
        }
    }
}

/// Screen geometry: options panel on the left, square grid to its right
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub options_width: f32,
    pub padding: f32,
    pub grid_size: usize,
    /// Pixel side of one cell
    pub cell_side: f32,
}

impl Layout {
    pub fn new(config: &Config) -> Self {
        let grid_size = config.grid.size.max(1);
        Layout {
            width: config.window.width,
            height: config.window.height,
            options_width: config.window.options_width,
            padding: config.window.padding,
            grid_size,
            cell_side: (config.grid.area / grid_size as f32).floor(),
        }
    }

    /// Top-left pixel of the grid
    pub fn grid_origin(&self) -> (f32, f32) {
        (self.options_width + self.padding, self.padding)
    }

    /// Pixel side of the whole grid
    pub fn grid_extent(&self) -> f32 {
        self.cell_side * self.grid_size as f32
    }

    pub fn cell_rect(&self, coord: Coord) -> Rect {
        let (x, y) = self.grid_origin();
        Rect::new(
            x + coord.col as f32 * self.cell_side,
            y + coord.row as f32 * self.cell_side,
            self.cell_side,
            self.cell_side,
        )
    }

    /// Cell under a pixel, if the pixel lies on the grid
    pub fn cell_at(&self, x: f32, y: f32) -> Option<Coord> {
        let (origin_x, origin_y) = self.grid_origin();
        if x < origin_x || y < origin_y || self.cell_side <= 0.0 {
            return None;
        }
        let col = ((x - origin_x) / self.cell_side) as usize;
        let row = ((y - origin_y) / self.cell_side) as usize;
        (row < self.grid_size && col < self.grid_size).then(|| Coord::new(row, col))
    }

    /// Every panel button with its rectangle
    pub fn buttons(&self) -> Vec<(Button, Rect)> {
        let mut buttons: Vec<(Button, Rect)> = Tool::ALL
            .iter()
            .enumerate()
            .map(|(i, &tool)| {
                let y = TOOL_BUTTON_TOP + i as f32 * TOOL_BUTTON_STRIDE;
                (Button::Tool(tool), Rect::new(BUTTON_X, y, BUTTON_WIDTH, BUTTON_HEIGHT))
            })
            .collect();

        buttons.push((
            Button::Run,
            Rect::new(BUTTON_X, self.height - 100.0, BUTTON_WIDTH, BUTTON_HEIGHT),
        ));
        buttons.push((
            Button::Reset,
            Rect::new(BUTTON_X, self.height - 50.0, BUTTON_WIDTH, BUTTON_HEIGHT),
        ));
        buttons
    }

    pub fn button_at(&self, x: f32, y: f32) -> Option<Button> {
        if x >= self.options_width {
            return None;
        }
        self.buttons()
            .into_iter()
            .find(|(_, rect)| rect.contains(vec2(x, y)))
            .map(|(button, _)| button)
    }
}
