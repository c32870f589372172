use glam::DVec2;
use sdl2::keyboard::Scancode;
use sdl2::mouse::MouseButton as SdlMouseButton;
use sdl2::EventPump;

/// The keys the camera controllers react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    Up,
    Down,
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
}

impl Key {
    const ALL: [Key; 12] = [
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::Q,
        Key::E,
        Key::Up,
        Key::Down,
        Key::LeftShift,
        Key::RightShift,
        Key::LeftCtrl,
        Key::RightCtrl,
    ];

    fn scancode(self) -> Scancode {
        match self {
            Key::W => Scancode::W,
            Key::A => Scancode::A,
            Key::S => Scancode::S,
            Key::D => Scancode::D,
            Key::Q => Scancode::Q,
            Key::E => Scancode::E,
            Key::Up => Scancode::Up,
            Key::Down => Scancode::Down,
            Key::LeftShift => Scancode::LShift,
            Key::RightShift => Scancode::RShift,
            Key::LeftCtrl => Scancode::LCtrl,
            Key::RightCtrl => Scancode::RCtrl,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Pointer and keyboard state at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    pub cursor: DVec2,
    pub buttons: Vec<MouseButton>,
    pub keys: Vec<Key>,
}

impl InputState {
    pub fn sample(event_pump: &EventPump) -> InputState {
        let mouse = event_pump.mouse_state();
        let buttons = [
            (SdlMouseButton::Left, MouseButton::Left),
            (SdlMouseButton::Middle, MouseButton::Middle),
            (SdlMouseButton::Right, MouseButton::Right),
        ]
        .into_iter()
        .filter(|&(sdl_button, _)| mouse.is_mouse_button_pressed(sdl_button))
        .map(|(_, button)| button)
        .collect();
        let keyboard = event_pump.keyboard_state();
        let keys = Key::ALL
            .into_iter()
            .filter(|key| keyboard.is_scancode_pressed(key.scancode()))
            .collect();
        InputState {
            cursor: DVec2::new(mouse.x() as f64, mouse.y() as f64),
            buttons,
            keys,
        }
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn is_shift_down(&self) -> bool {
        self.is_key_down(Key::LeftShift) || self.is_key_down(Key::RightShift)
    }

    pub fn is_ctrl_down(&self) -> bool {
        self.is_key_down(Key::LeftCtrl) || self.is_key_down(Key::RightCtrl)
    }
}
