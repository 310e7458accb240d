//! Keyboard / mouse bindings and per-tick input sampling.
//!
//! Continuous input (movement axes, jump) is sampled into the
//! [`FrameInput`] resource once per tick. Discrete actions are sent as
//! [`PlayerAction`] events on the frame their binding is pressed.

use bevy::prelude::*;

use crate::player::FrameInput;
use crate::settings::{ControlsSettings, Settings};

/// A key or mouse button an action is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Key(KeyCode),
    Mouse(MouseButton),
}

impl Binding {
    /// Parse a binding name: any key accepted by [`Settings::keycode_from_str`],
    /// or `MouseLeft` / `MouseRight` / `MouseMiddle`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "MOUSELEFT" | "LMB" => Some(Binding::Mouse(MouseButton::Left)),
            "MOUSERIGHT" | "RMB" => Some(Binding::Mouse(MouseButton::Right)),
            "MOUSEMIDDLE" | "MMB" => Some(Binding::Mouse(MouseButton::Middle)),
            _ => Settings::keycode_from_str(name).map(Binding::Key),
        }
    }

    #[must_use]
    pub fn pressed(self, keys: &ButtonInput<KeyCode>, mouse: &ButtonInput<MouseButton>) -> bool {
        match self {
            Binding::Key(k) => keys.pressed(k),
            Binding::Mouse(b) => mouse.pressed(b),
        }
    }

    #[must_use]
    pub fn just_pressed(self, keys: &ButtonInput<KeyCode>, mouse: &ButtonInput<MouseButton>) -> bool {
        match self {
            Binding::Key(k) => keys.just_pressed(k),
            Binding::Mouse(b) => mouse.just_pressed(b),
        }
    }
}

/// Discrete player actions.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Shoot,
    Interact,
    FirstPersonCamera,
    ThirdPersonCamera,
    ToggleCamera,
}

/// Resolved bindings for every action the game reads.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct InputBindings {
    pub forward: Binding,
    pub back: Binding,
    pub left: Binding,
    pub right: Binding,
    pub jump: Binding,
    pub shoot: Binding,
    pub interact: Binding,
    pub first_person: Binding,
    pub third_person: Binding,
    pub toggle_camera: Binding,
    pub pause: Binding,
    pub toggle_debug: Binding,
    pub dump_debug: Binding,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self::from_controls(&ControlsSettings::default())
    }
}

impl InputBindings {
    /// Resolve the `keybinds` map. Missing or unknown names fall back to the
    /// built-in default for that action and are logged.
    #[must_use]
    pub fn from_controls(controls: &ControlsSettings) -> Self {
        let bind = |action: &str, fallback: Binding| match controls.keybinds.get(action) {
            None => fallback,
            Some(name) => Binding::parse(name).unwrap_or_else(|| {
                warn!("unknown binding '{name}' for '{action}', using {fallback:?}");
                fallback
            }),
        };
        Self {
            forward: bind("forward", Binding::Key(KeyCode::KeyW)),
            back: bind("back", Binding::Key(KeyCode::KeyS)),
            left: bind("left", Binding::Key(KeyCode::KeyA)),
            right: bind("right", Binding::Key(KeyCode::KeyD)),
            jump: bind("jump", Binding::Key(KeyCode::Space)),
            shoot: bind("shoot", Binding::Mouse(MouseButton::Left)),
            interact: bind("interact", Binding::Key(KeyCode::KeyE)),
            first_person: bind("first_person", Binding::Key(KeyCode::Digit1)),
            third_person: bind("third_person", Binding::Key(KeyCode::Digit3)),
            toggle_camera: bind("toggle_camera", Binding::Key(KeyCode::KeyV)),
            pause: bind("pause", Binding::Key(KeyCode::Escape)),
            toggle_debug: bind("toggle_debug", Binding::Key(KeyCode::F1)),
            dump_debug: bind("dump_debug", Binding::Key(KeyCode::F3)),
        }
    }

    /// Actions whose binding went down this frame, in a fixed order.
    pub fn just_pressed_actions<'a>(
        &'a self,
        keys: &'a ButtonInput<KeyCode>,
        mouse: &'a ButtonInput<MouseButton>,
    ) -> impl Iterator<Item = PlayerAction> + 'a {
        [
            (self.shoot, PlayerAction::Shoot),
            (self.interact, PlayerAction::Interact),
            (self.first_person, PlayerAction::FirstPersonCamera),
            (self.third_person, PlayerAction::ThirdPersonCamera),
            (self.toggle_camera, PlayerAction::ToggleCamera),
        ]
        .into_iter()
        .filter(move |(binding, _)| binding.just_pressed(keys, mouse))
        .map(|(_, action)| action)
    }
}

/// Build the tick's input snapshot. Opposing keys cancel out.
#[must_use]
pub fn sample(bindings: &InputBindings, keys: &ButtonInput<KeyCode>, mouse: &ButtonInput<MouseButton>) -> FrameInput {
    let axis = |pos: Binding, neg: Binding| {
        f32::from(u8::from(pos.pressed(keys, mouse))) - f32::from(u8::from(neg.pressed(keys, mouse)))
    };
    FrameInput {
        horizontal: axis(bindings.right, bindings.left),
        vertical: axis(bindings.forward, bindings.back),
        jump: bindings.jump.pressed(keys, mouse),
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn sample_frame_input(
    bindings: Res<InputBindings>,
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut input: ResMut<FrameInput>,
) {
    *input = sample(&bindings, &keys, &mouse);
}

#[allow(clippy::needless_pass_by_value)]
pub fn emit_player_actions(
    bindings: Res<InputBindings>,
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut actions: EventWriter<PlayerAction>,
) {
    for action in bindings.just_pressed_actions(&keys, &mouse) {
        actions.send(action);
    }
}

/// Rebuild bindings when the settings resource changes.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_input_bindings(settings: Res<Settings>, mut bindings: ResMut<InputBindings>) {
    if !settings.is_changed() {
        return;
    }
    let rebuilt = InputBindings::from_controls(&settings.controls);
    if *bindings != rebuilt {
        *bindings = rebuilt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_and_mouse_buttons() {
        assert_eq!(Binding::parse("MouseLeft"), Some(Binding::Mouse(MouseButton::Left)));
        assert_eq!(Binding::parse("mouseright"), Some(Binding::Mouse(MouseButton::Right)));
        assert_eq!(Binding::parse("e"), Some(Binding::Key(KeyCode::KeyE)));
        assert_eq!(Binding::parse("Space"), Some(Binding::Key(KeyCode::Space)));
        assert_eq!(Binding::parse("Banana"), None);
    }

    #[test]
    fn unknown_names_fall_back_to_defaults() {
        let mut controls = ControlsSettings::default();
        controls.keybinds.insert("jump".into(), "Banana".into());
        controls.keybinds.insert("forward".into(), "Up".into());
        let b = InputBindings::from_controls(&controls);
        assert_eq!(b.jump, Binding::Key(KeyCode::Space));
        assert_eq!(b.forward, Binding::Key(KeyCode::ArrowUp));
    }

    #[test]
    fn opposing_keys_cancel() {
        let b = InputBindings::default();
        let mut keys = ButtonInput::<KeyCode>::default();
        let mouse = ButtonInput::<MouseButton>::default();
        keys.press(KeyCode::KeyW);
        keys.press(KeyCode::KeyS);
        keys.press(KeyCode::KeyD);
        keys.press(KeyCode::Space);
        let input = sample(&b, &keys, &mouse);
        assert_eq!(input, FrameInput { horizontal: 1.0, vertical: 0.0, jump: true });
    }

    #[test]
    fn actions_fire_once_per_press() {
        let b = InputBindings::default();
        let mut keys = ButtonInput::<KeyCode>::default();
        let mut mouse = ButtonInput::<MouseButton>::default();
        mouse.press(MouseButton::Left);
        keys.press(KeyCode::KeyV);
        let fired: Vec<_> = b.just_pressed_actions(&keys, &mouse).collect();
        assert_eq!(fired, vec![PlayerAction::Shoot, PlayerAction::ToggleCamera]);

        keys.clear();
        mouse.clear();
        assert_eq!(b.just_pressed_actions(&keys, &mouse).count(), 0);
    }

    #[test]
    fn actions_are_sent_as_events() {
        let mut app = App::new();
        app.add_event::<PlayerAction>();
        app.init_resource::<InputBindings>();
        app.init_resource::<ButtonInput<KeyCode>>();
        app.init_resource::<ButtonInput<MouseButton>>();
        app.add_systems(Update, emit_player_actions);
        app.world_mut().resource_mut::<ButtonInput<KeyCode>>().press(KeyCode::KeyE);
        app.update();

        let events = app.world().resource::<Events<PlayerAction>>();
        let mut reader = events.get_reader();
        let sent: Vec<_> = reader.read(events).copied().collect();
        assert_eq!(sent, vec![PlayerAction::Interact]);
    }
}
