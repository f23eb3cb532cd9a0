//! Orbit camera controller driven by pointer and wheel input.
//!
//! There is no damping: every input event is turned into a delta that
//! [`OrbitControls::update`] applies in full, so the camera stops as soon as
//! the pointer does.

use std::f32::consts::PI;

use nalgebra::{Point3, Vector2, Vector3};

use crate::engine::camera::PerspectiveCamera;

const POLAR_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Pen,
    Touch,
}

impl PointerKind {
    pub fn from_dom(pointer_type: &str) -> Self {
        match pointer_type {
            "touch" => PointerKind::Touch,
            "pen" => PointerKind::Pen,
            _ => PointerKind::Mouse,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub id: i32,
    pub kind: PointerKind,
    /// DOM button index: 0 primary, 1 middle, 2 secondary.
    pub button: i16,
    pub x: f32,
    pub y: f32,
    /// Shift, Ctrl or Meta held; turns a primary drag into a pan.
    pub pan_modifier: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    None,
    Rotate,
    Dolly,
    Pan,
    TouchRotate,
    TouchDollyPan,
}

#[derive(Debug, Clone, Copy, Default)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y.
    phi: f32,
    /// Azimuth around +Y measured from +Z.
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: &Vector3<f32>) -> Self {
        let radius = offset.norm();
        if radius == 0.0 {
            return Spherical::default();
        }
        Spherical {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vector3<f32> {
        let sin_phi = self.phi.sin();
        Vector3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

pub struct OrbitControls {
    pub target: Point3<f32>,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    viewport_height: f32,
    gesture: Gesture,
    pointers: Vec<(i32, Vector2<f32>)>,
    last: Vector2<f32>,
    last_pinch: f32,
    spherical_delta: Spherical,
    scale: f32,
    pan_offset: Vector3<f32>,
    pending_pan: Vector2<f32>,
}

impl OrbitControls {
    pub fn new(viewport_height: f32) -> Self {
        OrbitControls {
            target: Point3::origin(),
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            viewport_height: viewport_height.max(1.0),
            gesture: Gesture::None,
            pointers: Vec::new(),
            last: Vector2::zeros(),
            last_pinch: 0.0,
            spherical_delta: Spherical::default(),
            scale: 1.0,
            pan_offset: Vector3::zeros(),
            pending_pan: Vector2::zeros(),
        }
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height.max(1.0);
    }

    pub fn pointer_down(&mut self, input: PointerInput) {
        let pos = Vector2::new(input.x, input.y);
        match self.pointers.iter_mut().find(|(id, _)| *id == input.id) {
            Some(entry) => entry.1 = pos,
            None => self.pointers.push((input.id, pos)),
        }

        self.gesture = match input.kind {
            PointerKind::Touch => match self.pointers.len() {
                1 => Gesture::TouchRotate,
                2 => Gesture::TouchDollyPan,
                _ => Gesture::None,
            },
            PointerKind::Mouse | PointerKind::Pen => match input.button {
                0 if input.pan_modifier => Gesture::Pan,
                0 => Gesture::Rotate,
                1 => Gesture::Dolly,
                2 => Gesture::Pan,
                _ => Gesture::None,
            },
        };

        if self.gesture == Gesture::TouchDollyPan {
            self.last = self.midpoint();
            self.last_pinch = self.pinch_distance();
        } else {
            self.last = pos;
        }
    }

    pub fn pointer_move(&mut self, id: i32, x: f32, y: f32) {
        let pos = Vector2::new(x, y);
        match self.pointers.iter_mut().find(|(pid, _)| *pid == id) {
            Some(entry) => entry.1 = pos,
            None => return,
        }

        match self.gesture {
            Gesture::None => {}
            Gesture::Rotate | Gesture::TouchRotate => {
                let delta = (pos - self.last) * self.rotate_speed;
                self.rotate_left(2.0 * PI * delta.x / self.viewport_height);
                self.rotate_up(2.0 * PI * delta.y / self.viewport_height);
                self.last = pos;
            }
            Gesture::Dolly => {
                let dy = pos.y - self.last.y;
                if dy > 0.0 {
                    self.dolly_out(self.zoom_scale(dy));
                } else if dy < 0.0 {
                    self.dolly_in(self.zoom_scale(dy));
                }
                self.last = pos;
            }
            Gesture::Pan => {
                self.pending_pan += (pos - self.last) * self.pan_speed;
                self.last = pos;
            }
            Gesture::TouchDollyPan => {
                let distance = self.pinch_distance();
                if self.last_pinch > 0.0 && distance > 0.0 {
                    self.dolly_out((distance / self.last_pinch).powf(self.zoom_speed));
                }
                self.last_pinch = distance;

                let mid = self.midpoint();
                self.pending_pan += (mid - self.last) * self.pan_speed;
                self.last = mid;
            }
        }
    }

    pub fn pointer_up(&mut self, id: i32) {
        self.pointers.retain(|(pid, _)| *pid != id);
        self.gesture = match (self.gesture, self.pointers.first()) {
            (Gesture::TouchDollyPan, Some(&(_, pos))) => {
                self.last = pos;
                Gesture::TouchRotate
            }
            _ => {
                self.pointers.clear();
                Gesture::None
            }
        };
    }

    /// Positive `delta_y` (scrolling down) moves the camera away from the target.
    pub fn wheel(&mut self, delta_y: f32) {
        if delta_y < 0.0 {
            self.dolly_in(self.zoom_scale(delta_y * 0.01));
        } else if delta_y > 0.0 {
            self.dolly_out(self.zoom_scale(delta_y * 0.01));
        }
    }

    /// Applies accumulated input to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        if self.pending_pan != Vector2::zeros() {
            self.apply_pan(camera);
        }

        let idle = self.spherical_delta.theta == 0.0
            && self.spherical_delta.phi == 0.0
            && self.scale == 1.0
            && self.pan_offset == Vector3::zeros();
        if idle {
            camera.target = self.target;
            return false;
        }

        let offset = camera.position - camera.target;
        let mut spherical = Spherical::from_offset(&offset);

        spherical.theta += self.spherical_delta.theta;
        spherical.phi += self.spherical_delta.phi;
        spherical.phi = spherical.phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        spherical.radius =
            (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset;

        let previous = camera.position;
        camera.target = self.target;
        camera.position = self.target + spherical.to_offset();

        self.spherical_delta = Spherical::default();
        self.scale = 1.0;
        self.pan_offset = Vector3::zeros();

        (camera.position - previous).norm_squared() > 1e-12
    }

    fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    fn dolly_in(&mut self, dolly_scale: f32) {
        self.scale *= dolly_scale;
    }

    fn dolly_out(&mut self, dolly_scale: f32) {
        self.scale /= dolly_scale;
    }

    fn zoom_scale(&self, delta: f32) -> f32 {
        0.95f32.powf(self.zoom_speed * delta.abs())
    }

    /// Screen-space pan: a drag across the full viewport height moves the
    /// target by the visible height at the target's depth.
    fn apply_pan(&mut self, camera: &PerspectiveCamera) {
        let distance = (camera.position - camera.target).norm();
        let target_distance = distance * (camera.fov.to_radians() / 2.0).tan();
        let dx = 2.0 * self.pending_pan.x * target_distance / self.viewport_height;
        let dy = 2.0 * self.pending_pan.y * target_distance / self.viewport_height;

        self.pan_offset += camera.right() * -dx + camera.up_vector() * dy;
        self.pending_pan = Vector2::zeros();
    }

    fn midpoint(&self) -> Vector2<f32> {
        match self.pointers.as_slice() {
            [(_, a), (_, b), ..] => (a + b) / 2.0,
            [(_, a)] => *a,
            [] => Vector2::zeros(),
        }
    }

    fn pinch_distance(&self) -> f32 {
        match self.pointers.as_slice() {
            [(_, a), (_, b), ..] => (a - b).norm(),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
impl OrbitControls {
    pub fn is_active(&self) -> bool {
        self.gesture != Gesture::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(45.0, 1.0, 0.1, 1000.0);
        camera.position = Point3::new(-90.0, 140.0, 140.0);
        camera
    }

    fn mouse(id: i32, button: i16, x: f32, y: f32) -> PointerInput {
        PointerInput { id, kind: PointerKind::Mouse, button, x, y, pan_modifier: false }
    }

    fn touch(id: i32, x: f32, y: f32) -> PointerInput {
        PointerInput { id, kind: PointerKind::Touch, button: 0, x, y, pan_modifier: false }
    }

    fn distance(camera: &PerspectiveCamera) -> f32 {
        (camera.position - camera.target).norm()
    }

    #[test]
    fn test_settle_keeps_position() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(800.0);
        controls.update(&mut camera);
        assert!((camera.position - Point3::new(-90.0, 140.0, 140.0)).norm() < 1e-3);
    }

    #[test]
    fn test_rotate_keeps_distance() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(800.0);
        let before = distance(&camera);

        controls.pointer_down(mouse(1, 0, 100.0, 100.0));
        controls.pointer_move(1, 300.0, 150.0);
        assert!(controls.update(&mut camera));
        assert!((distance(&camera) - before).abs() < 1e-2);
    }

    #[test]
    fn test_horizontal_drag_of_full_height_is_full_turn() {
        let mut camera = camera();
        let start = camera.position;
        let mut controls = OrbitControls::new(800.0);

        controls.pointer_down(mouse(1, 0, 0.0, 0.0));
        controls.pointer_move(1, 800.0, 0.0);
        controls.update(&mut camera);
        assert!((camera.position - start).norm() < 1e-2);
    }

    #[test]
    fn test_no_motion_after_release() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(800.0);
        controls.pointer_down(mouse(1, 0, 0.0, 0.0));
        controls.pointer_move(1, 50.0, 0.0);
        controls.pointer_up(1);
        controls.update(&mut camera);

        let settled = camera.position;
        controls.pointer_move(1, 400.0, 0.0);
        assert!(!controls.update(&mut camera));
        assert_eq!(camera.position, settled);
        assert!(!controls.is_active());
    }

    #[test]
    fn test_polar_angle_is_clamped() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(800.0);
        controls.pointer_down(mouse(1, 0, 0.0, 0.0));
        controls.pointer_move(1, 0.0, 5000.0);
        controls.update(&mut camera);
        let offset = camera.position - camera.target;
        assert!(offset.y > 0.0 && offset.y.is_finite());
        assert!(offset.xz().norm() < 0.1);
        assert!(camera.right().iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_wheel_zooms() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(800.0);
        let before = distance(&camera);

        controls.wheel(-100.0);
        controls.update(&mut camera);
        let closer = distance(&camera);
        assert!((closer - before * 0.95).abs() < 1e-2);

        controls.wheel(100.0);
        controls.update(&mut camera);
        assert!((distance(&camera) - before).abs() < 1e-2);
    }

    #[test]
    fn test_zoom_respects_limits() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(800.0);
        controls.min_distance = 50.0;
        for _ in 0..200 {
            controls.wheel(-100.0);
        }
        controls.update(&mut camera);
        assert!((distance(&camera) - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_pan_moves_target_and_camera_together() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(800.0);
        let offset_before = camera.position - camera.target;

        controls.pointer_down(mouse(1, 2, 400.0, 400.0));
        controls.pointer_move(1, 500.0, 400.0);
        controls.update(&mut camera);

        assert!(camera.target != Point3::origin());
        let offset_after = camera.position - camera.target;
        assert!((offset_after - offset_before).norm() < 1e-2);
        // Dragging right pulls the scene right, so the target moves left.
        assert!(camera.target.coords.dot(&camera.right()) < 0.0);
    }

    #[test]
    fn test_modifier_drag_pans() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(800.0);
        let mut input = mouse(1, 0, 0.0, 0.0);
        input.pan_modifier = true;
        controls.pointer_down(input);
        controls.pointer_move(1, 0.0, 40.0);
        controls.update(&mut camera);
        assert!(camera.target != Point3::origin());
    }

    #[test]
    fn test_pinch_out_zooms_in() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(800.0);
        let before = distance(&camera);

        controls.pointer_down(touch(1, 100.0, 100.0));
        controls.pointer_down(touch(2, 200.0, 100.0));
        controls.pointer_move(1, 50.0, 100.0);
        controls.pointer_move(2, 250.0, 100.0);
        controls.update(&mut camera);
        assert!(distance(&camera) < before);

        controls.pointer_up(2);
        assert!(controls.is_active());
        controls.pointer_up(1);
        assert!(!controls.is_active());
    }

    #[test]
    fn test_spherical_round_trip() {
        let offset = Vector3::new(-90.0, 140.0, 140.0);
        let back = Spherical::from_offset(&offset).to_offset();
        assert!((back - offset).norm() < 1e-3);
    }
}
