//! Look-at camera and the controllers that turn user input into camera
//! motion.

use glam::{Mat4, Quat, Vec3};

use crate::input::InputState;

mod first_person;
mod trackball;

pub use first_person::FirstPersonCameraController;
pub use trackball::TrackballCameraController;

/// The eye never gets closer to the center than this when dollying in.
pub const MIN_EYE_CENTER_DISTANCE: f32 = 0.001;

/// Camera defined by an eye position, the point it looks at, and an up
/// vector, all in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    eye: Vec3,
    center: Vec3,
    up: Vec3,
}

impl Camera {
    pub fn new(eye: Vec3, center: Vec3, up: Vec3) -> Camera {
        Camera { eye, center, up }
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.center, self.up)
    }

    pub fn front(&self) -> Vec3 {
        (self.center - self.eye).normalize()
    }

    pub fn left(&self) -> Vec3 {
        self.up.cross(self.front()).normalize()
    }

    /// The up axis of the view, orthogonal to front and left. Unlike
    /// [Camera::up], which is only a hint for the view orientation.
    pub fn real_up(&self) -> Vec3 {
        self.front().cross(self.left()).normalize()
    }

    /// Moves both eye and center along the camera's own axes.
    pub fn move_local(&mut self, truck_left: f32, pedestal_up: f32, dolly_in: f32) {
        let movement =
            truck_left * self.left() + pedestal_up * self.real_up() + dolly_in * self.front();
        self.eye += movement;
        self.center += movement;
    }

    /// Rotates the view around the camera's own axes, keeping the eye in place.
    pub fn rotate_local(&mut self, roll_right: f32, tilt_down: f32, pan_left: f32) {
        let front = self.center - self.eye;
        let roll = Quat::from_axis_angle(front.normalize(), roll_right);
        self.up = roll * self.up;

        let tilt = Quat::from_axis_angle(self.left(), tilt_down);
        let front = tilt * front;
        self.center = self.eye + front;
        self.up = tilt * self.up;

        let pan = Quat::from_axis_angle(self.real_up(), pan_left);
        self.center = self.eye + pan * front;
    }

    /// Rotates the view around a world space axis, keeping the eye in place.
    pub fn rotate_world(&mut self, angle: f32, axis: Vec3) {
        let rotation = Quat::from_axis_angle(axis.normalize(), angle);
        let front = self.center - self.eye;
        self.center = self.eye + rotation * front;
        self.up = rotation * self.up;
    }

    /// Moves only the eye towards the center, stopping at
    /// [MIN_EYE_CENTER_DISTANCE]. Negative amounts move away from the center.
    /// Returns false if the eye stayed where it was.
    pub fn dolly_in(&mut self, amount: f32) -> bool {
        let front = self.center - self.eye;
        let distance = front.length();
        // An eye rebuilt at the clamp lands within rounding error of it.
        let at_clamp = distance <= MIN_EYE_CENTER_DISTANCE * (1.0 + 1e-3);
        if amount == 0.0 || distance == 0.0 || (amount > 0.0 && at_clamp) {
            return false;
        }
        let new_distance = (distance - amount).max(MIN_EYE_CENTER_DISTANCE);
        self.eye = self.center - front / distance * new_distance;
        true
    }

    /// The camera as the value of the `--lookat` command line argument.
    pub fn to_lookat_arg(&self) -> String {
        let Camera { eye, center, up } = self;
        format!(
            "--lookat {},{},{},{},{},{},{},{},{}",
            eye.x, eye.y, eye.z, center.x, center.y, center.z, up.x, up.y, up.z,
        )
    }
}

/// Turns the current input state into camera motion.
pub trait CameraController {
    /// Moves the camera according to the input. Returns true if the camera
    /// moved.
    fn update(&mut self, input: &InputState, elapsed_time: f32) -> bool;
    fn camera(&self) -> Camera;
    /// Replaces the camera pose, dropping any drag in progress.
    fn set_camera(&mut self, camera: Camera);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    FirstPerson,
    Trackball,
}

/// Whichever controller is currently driving the camera.
pub enum ActiveController {
    FirstPerson(FirstPersonCameraController),
    Trackball(TrackballCameraController),
}

impl ActiveController {
    /// `speed` is the first-person translation speed in units per second.
    pub fn new(kind: ControllerKind, speed: f32, camera: Camera) -> ActiveController {
        let mut controller = match kind {
            ControllerKind::FirstPerson => {
                ActiveController::FirstPerson(FirstPersonCameraController::new(speed))
            }
            ControllerKind::Trackball => {
                ActiveController::Trackball(TrackballCameraController::new())
            }
        };
        controller.set_camera(camera);
        controller
    }

    pub fn kind(&self) -> ControllerKind {
        match self {
            ActiveController::FirstPerson(_) => ControllerKind::FirstPerson,
            ActiveController::Trackball(_) => ControllerKind::Trackball,
        }
    }

    /// Replaces the controller with a fresh one of the given kind, carrying
    /// the camera pose over.
    pub fn switch_to(&mut self, kind: ControllerKind, speed: f32) {
        *self = ActiveController::new(kind, speed, self.camera());
    }

    pub fn toggle(&mut self, speed: f32) {
        let kind = match self.kind() {
            ControllerKind::FirstPerson => ControllerKind::Trackball,
            ControllerKind::Trackball => ControllerKind::FirstPerson,
        };
        self.switch_to(kind, speed);
    }

    fn controller(&self) -> &dyn CameraController {
        match self {
            ActiveController::FirstPerson(controller) => controller,
            ActiveController::Trackball(controller) => controller,
        }
    }

    fn controller_mut(&mut self) -> &mut dyn CameraController {
        match self {
            ActiveController::FirstPerson(controller) => controller,
            ActiveController::Trackball(controller) => controller,
        }
    }
}

impl CameraController for ActiveController {
    fn update(&mut self, input: &InputState, elapsed_time: f32) -> bool {
        self.controller_mut().update(input, elapsed_time)
    }

    fn camera(&self) -> Camera {
        self.controller().camera()
    }

    fn set_camera(&mut self, camera: Camera) {
        self.controller_mut().set_camera(camera);
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::*;
    use crate::input::MouseButton;

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
    }

    #[test]
    fn axes_of_a_camera_looking_down_negative_z() {
        let camera = camera();
        assert!(camera.front().abs_diff_eq(-Vec3::Z, 1e-6));
        assert!(camera.left().abs_diff_eq(-Vec3::X, 1e-6));
        assert!(camera.real_up().abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn move_local_moves_eye_and_center_together() {
        let mut camera = camera();
        camera.move_local(1.0, 2.0, 3.0);
        assert!(camera.eye().abs_diff_eq(Vec3::new(-1.0, 2.0, 2.0), 1e-6));
        assert!(camera.center().abs_diff_eq(Vec3::new(-1.0, 2.0, -3.0), 1e-6));
    }

    #[test]
    fn dolly_never_reaches_the_center() {
        let mut camera = camera();
        camera.dolly_in(2.0);
        assert!(camera.eye().abs_diff_eq(Vec3::new(0.0, 0.0, 3.0), 1e-6));
        camera.dolly_in(100.0);
        assert!((camera.eye() - camera.center()).length() >= MIN_EYE_CENTER_DISTANCE * 0.99);
        assert_eq!(camera.center(), Vec3::ZERO);
        camera.dolly_in(-1.0);
        assert!(camera.eye().z > 1.0);
    }

    #[test]
    fn dolly_at_the_clamp_reports_no_movement() {
        for start in [3.0, 5.0, 7.3, 11.1, 0.37] {
            let mut camera = Camera::new(Vec3::new(0.0, 0.0, start), Vec3::ZERO, Vec3::Y);
            assert!(camera.dolly_in(start * 2.0));
            let clamped = camera;
            assert!(!camera.dolly_in(1.0), "start {start}");
            assert_eq!(camera, clamped);
            assert!(camera.dolly_in(-1.0));
        }
        let mut degenerate = Camera::new(Vec3::ONE, Vec3::ONE, Vec3::Y);
        assert!(!degenerate.dolly_in(-1.0));
        assert_eq!(degenerate.eye(), Vec3::ONE);
    }

    #[test]
    fn lookat_arg_lists_all_nine_floats() {
        assert_eq!(camera().to_lookat_arg(), "--lookat 0,0,5,0,0,0,0,1,0");
    }

    #[test]
    fn switching_controller_keeps_pose_and_drops_drag() {
        let mut controller = ActiveController::new(ControllerKind::FirstPerson, 1.0, camera());
        let mut input = InputState {
            cursor: DVec2::new(10.0, 10.0),
            buttons: vec![MouseButton::Left, MouseButton::Middle],
            keys: vec![],
        };
        controller.update(&input, 0.016);

        controller.toggle(1.0);
        assert_eq!(controller.kind(), ControllerKind::Trackball);
        assert_eq!(controller.camera(), camera());

        // The middle button was already down before the switch, but the new
        // controller starts tracking from the first update it sees.
        assert!(!controller.update(&input, 0.016));
        input.cursor = DVec2::new(30.0, 10.0);
        assert!(controller.update(&input, 0.016));
        assert_eq!(controller.camera().center(), Vec3::ZERO);
    }
}
