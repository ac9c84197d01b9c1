use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// A named keyboard action.
///
/// Gameplay code reads actions, never raw key codes, so the bindings can be
/// changed from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Forward,
    Backward,
    Leftward,
    Rightward,
    Jump,
    Esc,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Forward,
        Action::Backward,
        Action::Leftward,
        Action::Rightward,
        Action::Jump,
        Action::Esc,
    ];
}

/// Action -> key codes. Codes use the DOM `KeyboardEvent.code` names
/// (`KeyW`, `Space`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyMap(pub BTreeMap<Action, Vec<String>>);

impl Default for KeyMap {
    fn default() -> Self {
        let bind = |a, k: &str| (a, vec![k.to_string()]);
        Self(BTreeMap::from([
            bind(Action::Forward, "KeyW"),
            bind(Action::Backward, "KeyS"),
            bind(Action::Leftward, "KeyA"),
            bind(Action::Rightward, "KeyD"),
            bind(Action::Jump, "Space"),
            bind(Action::Esc, "Escape"),
        ]))
    }
}

impl KeyMap {
    pub fn keys_for(&self, action: Action) -> &[String] {
        self.0.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Held-key tracker over a [`KeyMap`].
#[derive(Debug, Clone, Default)]
pub struct KeyboardControls {
    map: KeyMap,
    held: HashSet<String>,
    pressed_this_frame: HashSet<Action>,
}

impl KeyboardControls {
    pub fn new(map: KeyMap) -> Self {
        Self {
            map,
            ..Self::default()
        }
    }

    pub fn key_down(&mut self, code: &str) {
        let newly_held = self.held.insert(code.to_string());
        if !newly_held {
            return;
        }
        for action in Action::ALL {
            if self.map.keys_for(action).iter().any(|k| k == code) && self.is_first_key(action, code) {
                tracing::trace!(?action, code, "action pressed");
                self.pressed_this_frame.insert(action);
            }
        }
    }

    // Rising edge only when no other binding of the action was already held.
    fn is_first_key(&self, action: Action, code: &str) -> bool {
        !self
            .map
            .keys_for(action)
            .iter()
            .any(|k| k != code && self.held.contains(k))
    }

    pub fn key_up(&mut self, code: &str) {
        self.held.remove(code);
    }

    /// Drop all held keys, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held.clear();
        self.pressed_this_frame.clear();
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.map
            .keys_for(action)
            .iter()
            .any(|k| self.held.contains(k))
    }

    /// Actions whose first key went down since the last call.
    pub fn take_pressed(&mut self) -> HashSet<Action> {
        std::mem::take(&mut self.pressed_this_frame)
    }

    pub fn snapshot(&self) -> KeyboardState {
        KeyboardState {
            forward: self.is_held(Action::Forward),
            backward: self.is_held(Action::Backward),
            leftward: self.is_held(Action::Leftward),
            rightward: self.is_held(Action::Rightward),
            jump: self.is_held(Action::Jump),
        }
    }
}

/// Held movement actions for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardState {
    pub forward: bool,
    pub backward: bool,
    pub leftward: bool,
    pub rightward: bool,
    pub jump: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings() {
        let map = KeyMap::default();
        assert_eq!(map.keys_for(Action::Forward), ["KeyW".to_string()]);
        assert_eq!(map.keys_for(Action::Jump), ["Space".to_string()]);
        assert_eq!(map.keys_for(Action::Esc), ["Escape".to_string()]);
    }

    #[test]
    fn held_keys_map_to_actions() {
        let mut kb = KeyboardControls::new(KeyMap::default());
        kb.key_down("KeyW");
        kb.key_down("KeyD");
        let s = kb.snapshot();
        assert!(s.forward && s.rightward);
        assert!(!s.backward && !s.leftward);

        kb.key_up("KeyW");
        assert!(!kb.is_held(Action::Forward));
    }

    #[test]
    fn pressed_is_a_rising_edge() {
        let mut kb = KeyboardControls::new(KeyMap::default());
        kb.key_down("Space");
        kb.key_down("Space"); // key repeat
        assert_eq!(kb.take_pressed(), HashSet::from([Action::Jump]));
        assert!(kb.take_pressed().is_empty());

        kb.key_up("Space");
        kb.key_down("Space");
        assert!(kb.take_pressed().contains(&Action::Jump));
    }

    #[test]
    fn second_binding_is_not_a_new_press() {
        let mut map = KeyMap::default();
        map.0.insert(Action::Jump, vec!["Space".into(), "KeyJ".into()]);
        let mut kb = KeyboardControls::new(map);
        kb.key_down("Space");
        kb.take_pressed();
        kb.key_down("KeyJ");
        assert!(kb.take_pressed().is_empty());
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let mut kb = KeyboardControls::new(KeyMap::default());
        kb.key_down("KeyQ");
        assert_eq!(kb.snapshot(), KeyboardState::default());
        assert!(kb.take_pressed().is_empty());
    }

    #[test]
    fn keymap_yaml_round_trip() {
        let map: KeyMap = serde_yaml::from_str("forward: [ArrowUp]\njump: [Space, KeyJ]").unwrap();
        assert_eq!(map.keys_for(Action::Forward), ["ArrowUp".to_string()]);
        assert_eq!(map.keys_for(Action::Jump).len(), 2);
        assert!(map.keys_for(Action::Esc).is_empty());
    }
}
