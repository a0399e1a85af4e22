use super::types::{InputEvent, Modifiers, PointerButtonEvent, PointerMoveEvent};

/// Input context the platform layer needs to complete events: winit reports
/// neither the pointer position with button events nor modifiers with keys.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    /// Pointer position in logical pixels; `None` while outside the window.
    pub pointer_pos: Option<(f32, f32)>,
}

impl InputState {
    /// Folds `ev` into the current state.
    pub fn apply_event(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::ModifiersChanged(m) => self.modifiers = *m,

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                self.pointer_pos = Some((*x, *y));
            }

            InputEvent::PointerLeft => self.pointer_pos = None,

            InputEvent::Key { modifiers, .. } => self.modifiers = *modifiers,

            InputEvent::PointerButton(PointerButtonEvent { x, y, modifiers, .. }) => {
                self.pointer_pos = Some((*x, *y));
                self.modifiers = *modifiers;
            }

            InputEvent::Focused(_) | InputEvent::Resized { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{MouseButton, MouseButtonState};

    #[test]
    fn pointer_position_follows_moves_and_leaves() {
        let mut state = InputState::default();
        state.apply_event(&InputEvent::PointerMoved(PointerMoveEvent { x: 10.0, y: 20.0 }));
        assert_eq!(state.pointer_pos, Some((10.0, 20.0)));

        state.apply_event(&InputEvent::PointerLeft);
        assert_eq!(state.pointer_pos, None);
    }

    #[test]
    fn button_event_carries_position_and_modifiers() {
        let mut state = InputState::default();
        let shift = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        state.apply_event(&InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Left,
            state: MouseButtonState::Pressed,
            x: 3.0,
            y: 4.0,
            modifiers: shift,
        }));
        assert_eq!(state.pointer_pos, Some((3.0, 4.0)));
        assert!(state.modifiers.shift);
    }

    #[test]
    fn modifiers_changed_replaces_modifiers() {
        let mut state = InputState::default();
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        state.apply_event(&InputEvent::ModifiersChanged(ctrl));
        assert_eq!(state.modifiers, ctrl);
        state.apply_event(&InputEvent::ModifiersChanged(Modifiers::default()));
        assert!(!state.modifiers.ctrl);
    }
}
