//! Alternate backdrop: a square grid whose cells light up around the pointer.

use crate::math::Vec2;
use crate::surface::{Pixel, PixelCanvas};
use serde::{Deserialize, Serialize};

const CELL_COLOR: Pixel = Pixel::rgba(255, 255, 255, 255);
const GLOW_COLOR: Pixel = Pixel::rgba(255, 255, 255, 77);
const POINTER_LINK: Pixel = Pixel::rgba(255, 255, 255, 89);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    pub cell_size: f32,
    pub illumination_radius: f32,
    pub max_opacity: f32,
    /// Fraction of the remaining opacity gap closed per frame.
    pub fade: f32,
    pub visible_threshold: f32,
    pub glow_threshold: f32,
    pub connection_radius: f32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            cell_size: 20.0,
            illumination_radius: 150.0,
            max_opacity: 0.6,
            fade: 0.1,
            visible_threshold: 0.01,
            glow_threshold: 0.2,
            connection_radius: 100.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridCell {
    pub origin: Vec2,
    pub opacity: f32,
    pub target_opacity: f32,
    pub illuminated: bool,
}

pub struct GridField {
    pub params: GridParams,
    cols: usize,
    rows: usize,
    cells: Vec<GridCell>,
}

impl GridField {
    pub fn new(params: GridParams) -> Self {
        Self {
            params,
            cols: 0,
            rows: 0,
            cells: Vec::new(),
        }
    }

    /// Rebuild the lattice of cell origins, one past each edge.
    pub fn initialize(&mut self, width: f32, height: f32) {
        let size = self.params.cell_size.max(1.0);
        self.cols = (width.max(0.0) / size).ceil() as usize;
        self.rows = (height.max(0.0) / size).ceil() as usize;
        self.cells.clear();
        for i in 0..=self.cols {
            for j in 0..=self.rows {
                self.cells.push(GridCell {
                    origin: Vec2::new(i as f32 * size, j as f32 * size),
                    opacity: 0.0,
                    target_opacity: 0.0,
                    illuminated: false,
                });
            }
        }
        log::debug!("grid: {}x{} cells", self.cols + 1, self.rows + 1);
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Recompute target opacities for the current pointer.
    pub fn illuminate(&mut self, pointer: Option<Vec2>) {
        let r = self.params.illumination_radius;
        for cell in &mut self.cells {
            let lit = pointer
                .map(|p| cell.origin.distance(p))
                .filter(|d| *d < r);
            match lit {
                Some(d) => {
                    cell.target_opacity = (1.0 - d / r) * self.params.max_opacity;
                    cell.illuminated = true;
                }
                None => {
                    cell.target_opacity = 0.0;
                    cell.illuminated = false;
                }
            }
        }
    }

    /// Ease every cell toward its target.
    pub fn update(&mut self) {
        let fade = self.params.fade;
        for cell in &mut self.cells {
            cell.opacity += (cell.target_opacity - cell.opacity) * fade;
        }
    }

    fn center(&self, cell: &GridCell) -> Vec2 {
        let half = self.params.cell_size * 0.5;
        cell.origin.add(Vec2::new(half, half))
    }

    /// Centres of lit cells close enough to be tied to the pointer.
    pub fn pointer_links(&self, pointer: Vec2) -> impl Iterator<Item = Vec2> + '_ {
        let r = self.params.connection_radius;
        self.cells
            .iter()
            .filter(move |c| c.illuminated && c.origin.distance(pointer) < r)
            .map(|c| self.center(c))
    }

    pub fn render(&self, canvas: &mut PixelCanvas, pointer: Option<Vec2>) {
        let size = self.params.cell_size;
        for cell in &self.cells {
            if cell.opacity <= self.params.visible_threshold {
                continue;
            }
            canvas.stroke_rect(cell.origin, size, size, CELL_COLOR.with_opacity(cell.opacity));
            if cell.illuminated && cell.opacity > self.params.glow_threshold {
                canvas.stroke_rect(cell.origin, size, size, GLOW_COLOR);
            }
        }
        if let Some(p) = pointer {
            for c in self.pointer_links(p) {
                canvas.line(p, c, POINTER_LINK);
            }
        }
    }
}
