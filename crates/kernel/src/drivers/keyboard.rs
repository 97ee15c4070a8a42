use super::{DeviceDriver, DriverStatus};

pub const KEY_BACKSPACE: u8 = 8;
pub const KEY_ENTER: u8 = 13;

/// Shifted digit row, indexed by digit.
const SHIFTED_DIGITS: [char; 10] = [')', '!', '@', '#', '$', '%', '^', '&', '*', '('];

/// Translates raw key codes into characters for the kernel input queue.
#[derive(Debug, Default)]
pub struct KeyboardDriver {
    status: DriverStatus,
}

impl KeyboardDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` for keys that produce no character.
    pub fn translate(&self, key_code: u8, shifted: bool) -> Option<char> {
        match key_code {
            b'A'..=b'Z' if shifted => Some(key_code as char),
            b'A'..=b'Z' => Some(key_code.to_ascii_lowercase() as char),
            b'0'..=b'9' if shifted => Some(SHIFTED_DIGITS[(key_code - b'0') as usize]),
            32..=126 => Some(key_code as char),
            KEY_BACKSPACE => Some('\u{8}'),
            KEY_ENTER => Some('\n'),
            _ => None,
        }
    }
}

impl DeviceDriver for KeyboardDriver {
    fn name(&self) -> &'static str {
        "keyboard"
    }

    fn driver_entry(&mut self) {
        self.status = DriverStatus::Loaded;
    }

    fn status(&self) -> DriverStatus {
        self.status
    }
}
