use glam::{DVec2, Quat, Vec3};

use crate::camera::{Camera, CameraController};
use crate::input::{InputState, MouseButton};

/// World units (pan, dolly) or radians (orbit) per pixel of cursor movement.
const SENSITIVITY: f32 = 0.01;
/// Sine of the smallest angle allowed between the view direction and world up.
const POLE_EPSILON: f32 = 1e-3;

/// Orbits around the camera's center while dragging with the middle mouse
/// button. Holding shift pans instead, and holding ctrl dollies the eye
/// towards or away from the center.
pub struct TrackballCameraController {
    camera: Camera,
    world_up: Vec3,
    middle_button_pressed: bool,
    last_cursor_position: DVec2,
}

impl TrackballCameraController {
    pub fn new() -> TrackballCameraController {
        TrackballCameraController {
            camera: Camera::new(Vec3::ZERO, -Vec3::Z, Vec3::Y),
            world_up: Vec3::Y,
            middle_button_pressed: false,
            last_cursor_position: DVec2::ZERO,
        }
    }

    fn cursor_delta(&mut self, input: &InputState) -> DVec2 {
        let pressed = input.is_button_down(MouseButton::Middle);
        if pressed && !self.middle_button_pressed {
            self.middle_button_pressed = true;
            self.last_cursor_position = input.cursor;
        } else if !pressed && self.middle_button_pressed {
            self.middle_button_pressed = false;
        }
        if !self.middle_button_pressed {
            return DVec2::ZERO;
        }
        let delta = input.cursor - self.last_cursor_position;
        self.last_cursor_position = input.cursor;
        delta
    }

    fn pan(&mut self, cursor_delta: DVec2) -> bool {
        let truck_left = SENSITIVITY * cursor_delta.x as f32;
        let pedestal_up = SENSITIVITY * cursor_delta.y as f32;
        if truck_left == 0.0 && pedestal_up == 0.0 {
            return false;
        }
        self.camera.move_local(truck_left, pedestal_up, 0.0);
        true
    }

    fn dolly(&mut self, cursor_delta: DVec2) -> bool {
        let dolly_in = SENSITIVITY * cursor_delta.x as f32;
        if dolly_in == 0.0 {
            return false;
        }
        self.camera.dolly_in(dolly_in)
    }

    fn orbit(&mut self, cursor_delta: DVec2) -> bool {
        let horizontal_angle = -SENSITIVITY * cursor_delta.x as f32;
        let vertical_angle = SENSITIVITY * cursor_delta.y as f32;
        if horizontal_angle == 0.0 && vertical_angle == 0.0 {
            return false;
        }
        let center = self.camera.center();
        let depth_axis = self.camera.eye() - center;
        let vertical = Quat::from_axis_angle(self.camera.left(), vertical_angle);
        let horizontal = Quat::from_axis_angle(self.world_up, horizontal_angle);
        let depth_axis = horizontal * (vertical * depth_axis);
        // Looking along world up leaves the view without a defined left axis.
        if depth_axis.normalize_or_zero().cross(self.world_up).length() < POLE_EPSILON {
            return false;
        }
        self.camera = Camera::new(center + depth_axis, center, self.world_up);
        true
    }
}

impl Default for TrackballCameraController {
    fn default() -> TrackballCameraController {
        TrackballCameraController::new()
    }
}

impl CameraController for TrackballCameraController {
    fn update(&mut self, input: &InputState, _elapsed_time: f32) -> bool {
        let cursor_delta = self.cursor_delta(input);
        if input.is_shift_down() {
            self.pan(cursor_delta)
        } else if input.is_ctrl_down() {
            self.dolly(cursor_delta)
        } else {
            self.orbit(cursor_delta)
        }
    }

    fn camera(&self) -> Camera {
        self.camera
    }

    fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
        self.middle_button_pressed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Key;

    fn start_drag(keys: &[Key]) -> (TrackballCameraController, InputState) {
        let mut controller = TrackballCameraController::new();
        controller.set_camera(Camera::new(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::new(0.0, 1.0, 0.2).normalize(),
        ));
        let input = InputState {
            cursor: DVec2::new(50.0, 50.0),
            buttons: vec![MouseButton::Middle],
            keys: keys.to_vec(),
        };
        assert!(!controller.update(&input, 0.016));
        (controller, input)
    }

    #[test]
    fn nothing_happens_without_the_middle_button() {
        let mut controller = TrackballCameraController::new();
        let before = controller.camera();
        let input = InputState {
            cursor: DVec2::new(100.0, 100.0),
            buttons: vec![MouseButton::Left],
            keys: vec![],
        };
        assert!(!controller.update(&input, 0.016));
        assert_eq!(controller.camera(), before);
    }

    #[test]
    fn ctrl_drag_dollies_only_the_eye() {
        let (mut controller, mut input) = start_drag(&[Key::LeftCtrl]);
        input.cursor.x += 100.0;
        assert!(controller.update(&input, 0.016));
        let camera = controller.camera();
        assert_eq!(camera.center(), Vec3::ZERO);
        assert!(camera.eye().abs_diff_eq(Vec3::new(0.0, 0.0, 4.0), 1e-5));

        // Vertical movement alone doesn't dolly.
        input.cursor.y += 100.0;
        assert!(!controller.update(&input, 0.016));
    }

    #[test]
    fn dolly_stops_short_of_the_center() {
        let (mut controller, mut input) = start_drag(&[Key::RightCtrl]);
        input.cursor.x += 10_000.0;
        assert!(controller.update(&input, 0.016));
        let camera = controller.camera();
        assert!(camera.eye() != camera.center());
        input.cursor.x += 10_000.0;
        assert!(!controller.update(&input, 0.016));
    }

    #[test]
    fn shift_drag_pans_eye_and_center() {
        let (mut controller, mut input) = start_drag(&[Key::LeftShift, Key::LeftCtrl]);
        input.cursor.x += 100.0;
        assert!(controller.update(&input, 0.016));
        let camera = controller.camera();
        assert!(camera.center() != Vec3::ZERO);
        let offset = camera.eye() - camera.center();
        assert!(offset.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-5));
    }

    #[test]
    fn vertical_orbit_keeps_center_and_resets_up() {
        let (mut controller, mut input) = start_drag(&[]);
        input.cursor.y += 50.0;
        assert!(controller.update(&input, 0.016));
        let camera = controller.camera();
        assert_eq!(camera.center(), Vec3::ZERO);
        assert_eq!(camera.up(), Vec3::Y);
        assert!(camera.eye().y.abs() > 1.0);
        assert!((camera.eye().length() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn orbit_refuses_to_look_straight_down() {
        let mut controller = TrackballCameraController::new();
        let top_down = Camera::new(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, -Vec3::Z);
        controller.set_camera(top_down);
        let mut input = InputState {
            cursor: DVec2::new(50.0, 50.0),
            buttons: vec![MouseButton::Middle],
            keys: vec![],
        };
        controller.update(&input, 0.016);

        input.cursor.x += 100.0;
        assert!(!controller.update(&input, 0.016));
        assert_eq!(controller.camera(), top_down);
        input.cursor.x += 100.0;
        assert!(!controller.update(&input, 0.016));
        assert!(controller.camera().view_matrix().is_finite());

        // Tilting away from the pole still works.
        input.cursor.y += 50.0;
        assert!(controller.update(&input, 0.016));
        let camera = controller.camera();
        assert!(camera.view_matrix().is_finite());
        assert!(camera.eye().is_finite());
        assert_eq!(camera.up(), Vec3::Y);
    }

    #[test]
    fn horizontal_orbit_rotates_around_world_up() {
        let (mut controller, mut input) = start_drag(&[]);
        input.cursor.x -= 100.0;
        assert!(controller.update(&input, 0.016));
        let eye = controller.camera().eye();
        assert!(eye.abs_diff_eq(Vec3::new(5.0 * 1f32.sin(), 0.0, 5.0 * 1f32.cos()), 1e-4));
    }
}
