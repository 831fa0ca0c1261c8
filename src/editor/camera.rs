use crate::config::EditorConfig;
use crate::simulation::Point;

/// Top-down orthographic camera over the ground plane. `zoom` is the height
/// of the visible area in world units; screen up is world +z.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorCamera {
    pub x: f32,
    pub z: f32,
    pub zoom: f32,

    width: f32,
    height: f32,

    min_zoom: f32,
    max_zoom: f32,
    pan_divisor: f32,
}

impl EditorCamera {
    pub fn new(config: &EditorConfig, width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            z: 0.0,
            zoom: config.initial_zoom,
            width: width.max(1.0),
            height: height.max(1.0),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            pan_divisor: config.pan_divisor,
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
    }

    pub fn viewport(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn view_size(&self) -> (f32, f32) {
        let aspect_ratio = self.width / self.height;
        (self.zoom * aspect_ratio, self.zoom)
    }

    pub fn screen_to_world(&self, screen_x: f32, screen_y: f32) -> Point {
        let (view_width, view_height) = self.view_size();

        let norm_x = (2.0 * screen_x / self.width) - 1.0;
        let norm_y = 1.0 - (2.0 * screen_y / self.height);

        Point::new(
            self.x + norm_x * view_width / 2.0,
            self.z + norm_y * view_height / 2.0,
        )
    }

    pub fn world_to_screen(&self, world: Point) -> (f32, f32) {
        let (view_width, view_height) = self.view_size();

        let norm_x = (world.x - self.x) / (view_width / 2.0);
        let norm_y = (world.y - self.z) / (view_height / 2.0);

        ((norm_x + 1.0) * self.width / 2.0, (1.0 - norm_y) * self.height / 2.0)
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// One wheel notch moves the zoom by one world unit; scrolling up zooms in.
    pub fn wheel(&mut self, lines: f32) {
        self.set_zoom(self.zoom - lines);
    }

    /// Middle-button drag: moving the pointer down zooms out.
    pub fn drag_zoom(&mut self, pixels_dy: f32) {
        self.set_zoom(self.zoom + pixels_dy * 0.1);
    }

    /// Right-button drag relative to where the drag started. The scene
    /// follows the pointer.
    pub fn pan_from(&mut self, anchor: (f32, f32), pixels_dx: f32, pixels_dy: f32) {
        let scale = self.zoom / self.pan_divisor;
        self.x = anchor.0 - pixels_dx * scale;
        self.z = anchor.1 + pixels_dy * scale;
    }

    pub fn center_on(&mut self, world: Point) {
        self.x = world.x;
        self.z = world.y;
    }
}
