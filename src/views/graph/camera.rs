//! Zoom and pan transform for the graph view
//!
//! Pure calculations, no drawing. The camera maps simulation coordinates onto the
//! drawing surface; zooming and panning only change the transform, never the layout.

/// Camera state for 2D view transformations
#[derive(Debug, Clone, PartialEq)]
pub struct Camera2D {
    /// Surface width in pixels
    pub width: f64,
    /// Surface height in pixels
    pub height: f64,
    /// Camera offset (pan) in world coordinates
    pub offset_x: f64,
    pub offset_y: f64,
    /// Zoom level (1.0 = 100%)
    pub scale: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
            min_scale: 0.2,
            max_scale: 4.0,
        }
    }
}

impl Camera2D {
    /// Create a camera for a surface, zoom limited to `min_scale..=max_scale`
    pub fn new(width: f64, height: f64, min_scale: f64, max_scale: f64) -> Self {
        Self {
            width,
            height,
            min_scale,
            max_scale,
            ..Default::default()
        }
    }

    /// Convert world coordinates to surface coordinates
    pub fn world_to_canvas(&self, x: f64, y: f64) -> (f64, f64) {
        let cx = (x + self.offset_x) * self.scale + self.width / 2.0;
        let cy = (y + self.offset_y) * self.scale + self.height / 2.0;
        (cx, cy)
    }

    /// Convert surface coordinates to world coordinates
    pub fn canvas_to_world(&self, cx: f64, cy: f64) -> (f64, f64) {
        let x = (cx - self.width / 2.0) / self.scale - self.offset_x;
        let y = (cy - self.height / 2.0) / self.scale - self.offset_y;
        (x, y)
    }

    /// Pan the view by delta pixels
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx / self.scale;
        self.offset_y += dy / self.scale;
    }

    /// Zoom the view by factor (1.1 = zoom in 10%, 0.9 = zoom out 10%)
    pub fn zoom(&mut self, factor: f64) {
        self.scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
    }

    /// Center the bounds and scale them to fill the surface minus `padding`.
    ///
    /// The chosen scale never exceeds `max_fit_scale`, so a small graph is not
    /// blown up to fill the screen.
    pub fn fit_to_bounds(&mut self, bounds: &BoundingBox, padding: f64, max_fit_scale: f64) {
        if bounds.is_empty() {
            return;
        }

        let available_width = (self.width - 2.0 * padding).max(1.0);
        let available_height = (self.height - 2.0 * padding).max(1.0);

        let scale_x = available_width / bounds.width();
        let scale_y = available_height / bounds.height();
        self.scale = scale_x
            .min(scale_y)
            .min(max_fit_scale)
            .clamp(self.min_scale, self.max_scale);

        self.offset_x = -bounds.center_x();
        self.offset_y = -bounds.center_y();
    }

    /// Resize the surface dimensions
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Surface position of the world origin
    pub fn translation(&self) -> (f64, f64) {
        (
            self.width / 2.0 + self.offset_x * self.scale,
            self.height / 2.0 + self.offset_y * self.scale,
        )
    }

    /// SVG transform equivalent to [`Camera2D::world_to_canvas`]
    pub fn transform(&self) -> String {
        let (tx, ty) = self.translation();
        format!("translate({tx:.2},{ty:.2}) scale({:.4})", self.scale)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create an empty bounding box
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Expand the bounding box to include a circle
    pub fn include_circle(&mut self, x: f64, y: f64, radius: f64) {
        self.min_x = self.min_x.min(x - radius);
        self.max_x = self.max_x.max(x + radius);
        self.min_y = self.min_y.min(y - radius);
        self.max_y = self.max_y.max(y + radius);
    }

    /// Width of the bounding box, at least 1
    pub fn width(&self) -> f64 {
        (self.max_x - self.min_x).max(1.0)
    }

    /// Height of the bounding box, at least 1
    pub fn height(&self) -> f64 {
        (self.max_y - self.min_y).max(1.0)
    }

    pub fn center_x(&self) -> f64 {
        (self.min_x + self.max_x) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.min_y + self.max_y) / 2.0
    }
}
