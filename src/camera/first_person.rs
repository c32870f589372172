use glam::{DVec2, Vec3};

use crate::camera::{Camera, CameraController};
use crate::input::{InputState, Key, MouseButton};

/// Radians of rotation per pixel of cursor movement.
const ROTATION_SENSITIVITY: f32 = 0.01;
/// Radians of roll per update while a roll key is held.
const ROLL_STEP: f32 = 0.001;

/// Free-fly camera: WASD and the up/down arrows move, dragging with the left
/// mouse button looks around, Q and E roll.
pub struct FirstPersonCameraController {
    camera: Camera,
    speed: f32,
    world_up: Vec3,
    left_button_pressed: bool,
    last_cursor_position: DVec2,
}

impl FirstPersonCameraController {
    pub fn new(speed: f32) -> FirstPersonCameraController {
        FirstPersonCameraController {
            camera: Camera::new(Vec3::ZERO, -Vec3::Z, Vec3::Y),
            speed,
            world_up: Vec3::Y,
            left_button_pressed: false,
            last_cursor_position: DVec2::ZERO,
        }
    }

    fn cursor_delta(&mut self, input: &InputState) -> DVec2 {
        let pressed = input.is_button_down(MouseButton::Left);
        if pressed && !self.left_button_pressed {
            self.left_button_pressed = true;
            self.last_cursor_position = input.cursor;
        } else if !pressed && self.left_button_pressed {
            self.left_button_pressed = false;
        }
        if !self.left_button_pressed {
            return DVec2::ZERO;
        }
        let delta = input.cursor - self.last_cursor_position;
        self.last_cursor_position = input.cursor;
        delta
    }
}

impl CameraController for FirstPersonCameraController {
    fn update(&mut self, input: &InputState, elapsed_time: f32) -> bool {
        let cursor_delta = self.cursor_delta(input);

        let step = self.speed * elapsed_time;
        let mut truck_left = 0.0;
        let mut pedestal_up = 0.0;
        let mut dolly_in = 0.0;
        let mut roll_right = 0.0;
        if input.is_key_down(Key::W) {
            dolly_in += step;
        }
        if input.is_key_down(Key::S) {
            dolly_in -= step;
        }
        if input.is_key_down(Key::A) {
            truck_left += step;
        }
        if input.is_key_down(Key::D) {
            truck_left -= step;
        }
        if input.is_key_down(Key::Up) {
            pedestal_up += step;
        }
        if input.is_key_down(Key::Down) {
            pedestal_up -= step;
        }
        if input.is_key_down(Key::Q) {
            roll_right -= ROLL_STEP;
        }
        if input.is_key_down(Key::E) {
            roll_right += ROLL_STEP;
        }

        // Cursor going right turns the view right, i.e. a negative pan left.
        let pan_left = -ROTATION_SENSITIVITY * cursor_delta.x as f32;
        let tilt_down = ROTATION_SENSITIVITY * cursor_delta.y as f32;

        let has_moved = [truck_left, pedestal_up, dolly_in, roll_right, pan_left, tilt_down]
            .iter()
            .any(|&delta| delta != 0.0);
        if !has_moved {
            return false;
        }

        self.camera.move_local(truck_left, pedestal_up, dolly_in);
        self.camera.rotate_local(roll_right, tilt_down, 0.0);
        self.camera.rotate_world(pan_left, self.world_up);
        true
    }

    fn camera(&self) -> Camera {
        self.camera
    }

    fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
        self.left_button_pressed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> FirstPersonCameraController {
        let mut controller = FirstPersonCameraController::new(2.0);
        controller.set_camera(Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y));
        controller
    }

    fn keys(keys: &[Key]) -> InputState {
        InputState {
            keys: keys.to_vec(),
            ..InputState::default()
        }
    }

    #[test]
    fn no_input_does_not_move() {
        let mut controller = controller();
        let before = controller.camera();
        assert!(!controller.update(&InputState::default(), 0.5));
        assert_eq!(controller.camera(), before);
    }

    #[test]
    fn forward_is_scaled_by_speed_and_time() {
        let mut controller = controller();
        assert!(controller.update(&keys(&[Key::W]), 0.5));
        let camera = controller.camera();
        assert!(camera.eye().abs_diff_eq(Vec3::new(0.0, 0.0, 4.0), 1e-5));
        assert!(camera.center().abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5));
    }

    #[test]
    fn opposite_keys_cancel_out() {
        let mut controller = controller();
        assert!(!controller.update(&keys(&[Key::A, Key::D, Key::Up, Key::Down]), 0.5));
    }

    #[test]
    fn strafe_and_pedestal() {
        let mut controller = controller();
        controller.update(&keys(&[Key::A, Key::Up]), 1.0);
        assert!(controller
            .camera()
            .eye()
            .abs_diff_eq(Vec3::new(-2.0, 2.0, 5.0), 1e-5));
    }

    #[test]
    fn roll_ignores_elapsed_time() {
        let mut controller = controller();
        assert!(controller.update(&keys(&[Key::E]), 0.0));
        let camera = controller.camera();
        assert_eq!(camera.eye(), Vec3::new(0.0, 0.0, 5.0));
        let roll = camera.up().angle_between(Vec3::Y);
        assert!((roll - ROLL_STEP).abs() < 1e-4);
    }

    #[test]
    fn dragging_pans_around_world_up() {
        let mut controller = controller();
        let mut input = InputState {
            buttons: vec![MouseButton::Left],
            ..InputState::default()
        };
        // Pressing alone only starts tracking.
        assert!(!controller.update(&input, 0.016));

        input.cursor = DVec2::new(100.0, 0.0);
        assert!(controller.update(&input, 0.016));
        let camera = controller.camera();
        assert_eq!(camera.eye(), Vec3::new(0.0, 0.0, 5.0));
        // Turned right: looking towards +x.
        assert!(camera.front().x > 0.0);
        assert!(camera.up().abs_diff_eq(Vec3::Y, 1e-5));

        input.buttons.clear();
        input.cursor = DVec2::new(500.0, 300.0);
        assert!(!controller.update(&input, 0.016));
    }
}
