//! The activation control seam between the hotkey layer and the session.
//!
//! Global hotkey registration is an external collaborator; the session only
//! observes an abstract control: a level (is the shortcut held down?) and a
//! latched edge (has it fired again?). The hotkey layer decides which
//! presses reach the session — the press that *started* a session is its
//! activation, not a toggle signal.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// State of the activation shortcut as seen by the capture loop.
///
/// Both methods are queried at most once per frame. `toggle_requested`
/// consumes the latch.
pub trait ActivationControl: Send {
    /// Whether the activation control is currently asserted (held down).
    fn is_asserted(&mut self) -> bool;

    /// Whether the control fired again since the last query. Consuming.
    fn toggle_requested(&mut self) -> bool;
}

/// Shared-state control driven by a real hotkey handler.
///
/// The handler keeps one clone and the session another; `set_asserted` and
/// `signal_toggle` may be called from any thread.
#[derive(Clone, Default)]
pub struct HotkeyControl {
    asserted: Arc<AtomicBool>,
    toggled: Arc<AtomicBool>,
}

impl HotkeyControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the shortcut's held state (key-down / key-up).
    pub fn set_asserted(&self, asserted: bool) {
        self.asserted.store(asserted, Ordering::Relaxed);
    }

    /// Latch a repeat activation of the shortcut.
    pub fn signal_toggle(&self) {
        self.toggled.store(true, Ordering::Relaxed);
    }
}

impl ActivationControl for HotkeyControl {
    fn is_asserted(&mut self) -> bool {
        self.asserted.load(Ordering::Relaxed)
    }

    fn toggle_requested(&mut self) -> bool {
        self.toggled.swap(false, Ordering::Relaxed)
    }
}

impl fmt::Debug for HotkeyControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyControl")
            .field("asserted", &self.asserted.load(Ordering::Relaxed))
            .field("toggled", &self.toggled.load(Ordering::Relaxed))
            .finish()
    }
}

/// Deterministic control scripted by query count. For tests.
///
/// The session queries each method once per frame, so "the Nth query"
/// corresponds exactly to "the Nth frame".
#[derive(Debug, Clone, Default)]
pub struct ScriptedControl {
    hold_frames: usize,
    toggle_after: Option<usize>,
    held_queries: usize,
    toggle_queries: usize,
    toggle_fired: bool,
}

impl ScriptedControl {
    /// Never asserted, never toggled.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Asserted for the first `frames` queries, released afterwards.
    pub fn hold_for_frames(frames: usize) -> Self {
        Self {
            hold_frames: frames,
            ..Default::default()
        }
    }

    /// Fires the toggle once, on the query after `frames` queries.
    pub fn toggle_after_frames(frames: usize) -> Self {
        Self {
            toggle_after: Some(frames),
            ..Default::default()
        }
    }
}

impl ActivationControl for ScriptedControl {
    fn is_asserted(&mut self) -> bool {
        self.held_queries += 1;
        self.held_queries <= self.hold_frames
    }

    fn toggle_requested(&mut self) -> bool {
        self.toggle_queries += 1;
        match self.toggle_after {
            Some(after) if !self.toggle_fired && self.toggle_queries > after => {
                self.toggle_fired = true;
                true
            }
            _ => false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotkey_control_level() {
        let mut control = HotkeyControl::new();
        assert!(!control.is_asserted());

        control.set_asserted(true);
        assert!(control.is_asserted());
        control.set_asserted(false);
        assert!(!control.is_asserted());
    }

    #[test]
    fn test_hotkey_control_toggle_latch_is_consumed() {
        let mut control = HotkeyControl::new();
        assert!(!control.toggle_requested());

        control.signal_toggle();
        assert!(control.toggle_requested());
        assert!(!control.toggle_requested());
    }

    #[test]
    fn test_hotkey_control_clones_share_state() {
        let handler_side = HotkeyControl::new();
        let mut session_side = handler_side.clone();

        handler_side.signal_toggle();
        handler_side.set_asserted(true);
        assert!(session_side.toggle_requested());
        assert!(session_side.is_asserted());
    }

    #[test]
    fn test_scripted_hold() {
        let mut control = ScriptedControl::hold_for_frames(2);
        assert!(control.is_asserted());
        assert!(control.is_asserted());
        assert!(!control.is_asserted());
        assert!(!control.is_asserted());
    }

    #[test]
    fn test_scripted_toggle_fires_once() {
        let mut control = ScriptedControl::toggle_after_frames(2);
        assert!(!control.toggle_requested());
        assert!(!control.toggle_requested());
        assert!(control.toggle_requested());
        assert!(!control.toggle_requested());
    }

    #[test]
    fn test_scripted_idle() {
        let mut control = ScriptedControl::idle();
        assert!(!control.is_asserted());
        assert!(!control.toggle_requested());
    }
}
