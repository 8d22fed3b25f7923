//! Navigation hook: which screens capture motion data.
//!
//! Sensitive entry screens (login, amount, recipient document, auth code) turn
//! sensor capture on and tag readings with the matching [`CaptureAction`].
//! Every other screen turns it off.  Back navigation turns it off, then the
//! screen underneath re-applies its own policy.

use std::str::FromStr;
use std::sync::Arc;

use gesture_core::{CaptureAction, ParseEnumError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::sensor_tap::SensorControl;

/// Screens of the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Control,
    SignIn,
    Option,
    LogIn,
    Home,
    PixHome,
    PixMoney,
    PixReceiver,
    Auth,
}

impl Screen {
    /// The UI action sensor samples are tagged with on this screen, or `None`
    /// when the screen does not capture motion.
    pub fn capture_action(self) -> Option<CaptureAction> {
        match self {
            Screen::LogIn => Some(CaptureAction::KeyboardLogin),
            Screen::PixMoney => Some(CaptureAction::KeyboardMoney),
            Screen::PixReceiver => Some(CaptureAction::KeyboardCpf),
            Screen::Auth => Some(CaptureAction::KeyboardAuth),
            Screen::Control
            | Screen::SignIn
            | Screen::Option
            | Screen::Home
            | Screen::PixHome => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Screen::Control => "control",
            Screen::SignIn => "sign_in",
            Screen::Option => "option",
            Screen::LogIn => "log_in",
            Screen::Home => "home",
            Screen::PixHome => "pix_home",
            Screen::PixMoney => "pix_money",
            Screen::PixReceiver => "pix_receiver",
            Screen::Auth => "auth",
        }
    }
}

impl FromStr for Screen {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [Screen; 9] = [
            Screen::Control,
            Screen::SignIn,
            Screen::Option,
            Screen::LogIn,
            Screen::Home,
            Screen::PixHome,
            Screen::PixMoney,
            Screen::PixReceiver,
            Screen::Auth,
        ];
        ALL.into_iter()
            .find(|screen| screen.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseEnumError::new("screen", s))
    }
}

/// Applies the capture policy on every screen transition.
///
/// Keeps the back stack so that navigating up lands on the previous screen
/// with that screen's capture state.
pub struct NavigationHook {
    control: Arc<dyn SensorControl>,
    stack: Mutex<Vec<Screen>>,
}

impl NavigationHook {
    pub fn new(control: Arc<dyn SensorControl>) -> Self {
        Self {
            control,
            stack: Mutex::new(Vec::new()),
        }
    }

    pub fn current(&self) -> Option<Screen> {
        self.stack.lock().last().copied()
    }

    pub fn depth(&self) -> usize {
        self.stack.lock().len()
    }

    pub fn navigate_to(&self, screen: Screen) {
        debug!(screen = screen.as_str(), "navigate");
        self.stack.lock().push(screen);
        self.apply(screen);
    }

    /// Pops the current screen and stops capture; the revealed screen then
    /// re-enters its own policy.
    pub fn navigate_up(&self) {
        let (left, revealed) = {
            let mut stack = self.stack.lock();
            let left = stack.pop();
            (left, stack.last().copied())
        };
        debug!(from = ?left, to = ?revealed, "navigate up");
        self.control.disable_sensor();
        if let Some(screen) = revealed {
            if screen.capture_action().is_some() {
                self.apply(screen);
            }
        }
    }

    fn apply(&self, screen: Screen) {
        match screen.capture_action() {
            Some(action) => {
                self.control.set_action_context(action);
                self.control.active_sensor();
            }
            None => self.control.disable_sensor(),
        }
    }
}
