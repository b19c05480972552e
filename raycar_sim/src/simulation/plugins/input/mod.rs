// raycar_sim/src/simulation/plugins/input/mod.rs

//! Input collection. Both collectors below only ever write press/release
//! events into the shared action state; the tick takes its own snapshot.

use crate::prelude::*;
use std::sync::Arc;

/// The shared action cell. Clone the `Arc` to drive the car from another
/// thread; the simulation sees the writes at its next snapshot.
#[derive(Resource, Debug, Clone, Default)]
pub struct ActionInput(pub Arc<SharedActionState>);

impl ActionInput {
    pub fn handle(&self) -> Arc<SharedActionState> {
        Arc::clone(&self.0)
    }
}

/// The scenario's `[[inputs]]`, replayed against simulation time.
#[derive(Resource, Debug, Clone, Default)]
pub struct ScriptedTimeline {
    events: Vec<ScriptedInput>,
    cursor: usize,
}

impl ScriptedTimeline {
    /// `events` must be sorted by `at`.
    pub fn new(events: Vec<ScriptedInput>) -> Self {
        Self { events, cursor: 0 }
    }

    /// Events due at or before `time` that have not fired yet.
    pub fn drain_due(&mut self, time: f64) -> &[ScriptedInput] {
        let start = self.cursor;
        while self.events.get(self.cursor).is_some_and(|e| e.at <= time) {
            self.cursor += 1;
        }
        &self.events[start..self.cursor]
    }

    pub fn remaining(&self) -> usize {
        self.events.len() - self.cursor
    }
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActionInput>()
            .init_resource::<ScriptedTimeline>()
            .add_systems(OnEnter(AppState::Running), load_timeline)
            .add_systems(
                Update,
                (
                    keyboard_input.run_if(resource_exists::<ButtonInput<KeyCode>>),
                    replay_scripted_inputs.run_if(resource_exists::<Simulation>),
                )
                    .in_set(TickSet::Input),
            );
    }
}

// --- Key Map ---

const BINDINGS: [(KeyCode, Action); 12] = [
    (KeyCode::ArrowUp, Action::Accelerate),
    (KeyCode::KeyW, Action::Accelerate),
    (KeyCode::ArrowDown, Action::Reverse),
    (KeyCode::KeyS, Action::Reverse),
    (KeyCode::ArrowLeft, Action::SteerLeft),
    (KeyCode::KeyA, Action::SteerLeft),
    (KeyCode::ArrowRight, Action::SteerRight),
    (KeyCode::KeyD, Action::SteerRight),
    (KeyCode::Space, Action::Brake),
    (KeyCode::ShiftLeft, Action::Boost),
    (KeyCode::ShiftRight, Action::Boost),
    (KeyCode::KeyR, Action::Reset),
];

pub fn action_for_key(key: KeyCode) -> Option<Action> {
    BINDINGS
        .iter()
        .find_map(|(k, action)| (*k == key).then_some(*action))
}

fn keys_for(action: Action) -> impl Iterator<Item = KeyCode> {
    BINDINGS
        .iter()
        .filter(move |(_, a)| *a == action)
        .map(|(k, _)| *k)
}

// --- SYSTEMS ---

fn load_timeline(scenario: Res<ScenarioConfig>, mut timeline: ResMut<ScriptedTimeline>) {
    *timeline = ScriptedTimeline::new(scenario.inputs.clone());
    if timeline.remaining() > 0 {
        info!("[INPUT] {} scripted input(s) queued.", timeline.remaining());
    }
}

/// Forwards key edges. An action is released only once none of its keys is
/// still held.
fn keyboard_input(keys: Res<ButtonInput<KeyCode>>, input: Res<ActionInput>) {
    for key in keys.get_just_pressed() {
        if let Some(action) = action_for_key(*key) {
            input.0.press(action);
        }
    }
    for key in keys.get_just_released() {
        if let Some(action) = action_for_key(*key) {
            if !keys.any_pressed(keys_for(action)) {
                input.0.release(action);
            }
        }
    }
}

fn replay_scripted_inputs(
    sim: Res<Simulation>,
    input: Res<ActionInput>,
    mut timeline: ResMut<ScriptedTimeline>,
) {
    let now = sim.time();
    for event in timeline.drain_due(now) {
        debug!(
            "[INPUT] t={:.3}s {:?} {}",
            now,
            event.action,
            if event.pressed { "pressed" } else { "released" }
        );
        let event = if event.pressed {
            InputEvent::Pressed(event.action)
        } else {
            InputEvent::Released(event.action)
        };
        input.0.apply(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(at: f64, action: Action, pressed: bool) -> ScriptedInput {
        ScriptedInput { at, action, pressed }
    }

    #[test]
    fn key_map_covers_every_action() {
        for action in Action::ALL {
            assert!(keys_for(action).next().is_some(), "{action:?} has no key");
        }
        assert_eq!(action_for_key(KeyCode::KeyW), Some(Action::Accelerate));
        assert_eq!(action_for_key(KeyCode::ArrowRight), Some(Action::SteerRight));
        assert_eq!(action_for_key(KeyCode::Space), Some(Action::Brake));
        assert_eq!(action_for_key(KeyCode::ShiftRight), Some(Action::Boost));
        assert_eq!(action_for_key(KeyCode::KeyR), Some(Action::Reset));
        assert_eq!(action_for_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn timeline_fires_each_event_once_in_order() {
        let mut timeline = ScriptedTimeline::new(vec![
            event(0.0, Action::Accelerate, true),
            event(0.5, Action::SteerLeft, true),
            event(0.5, Action::SteerLeft, false),
            event(2.0, Action::Accelerate, false),
        ]);

        assert_eq!(timeline.drain_due(0.0).len(), 1);
        assert!(timeline.drain_due(0.4).is_empty());
        let due = timeline.drain_due(1.0);
        assert_eq!(due.len(), 2);
        assert!(due[0].pressed && !due[1].pressed);
        assert_eq!(timeline.remaining(), 1);
        assert_eq!(timeline.drain_due(10.0)[0].action, Action::Accelerate);
        assert!(timeline.drain_due(20.0).is_empty());
    }

    #[test]
    fn keyboard_edges_reach_the_shared_state() {
        let mut app = App::new();
        app.init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<ActionInput>()
            .add_systems(Update, keyboard_input);

        app.world_mut().resource_mut::<ButtonInput<KeyCode>>().press(KeyCode::KeyW);
        app.world_mut().resource_mut::<ButtonInput<KeyCode>>().press(KeyCode::ArrowUp);
        app.update();
        let input = app.world().resource::<ActionInput>().handle();
        assert!(input.peek().accelerate);

        // One of two accelerate keys released: still held.
        {
            let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keys.clear();
            keys.release(KeyCode::KeyW);
        }
        app.update();
        assert!(input.peek().accelerate);

        {
            let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keys.clear();
            keys.release(KeyCode::ArrowUp);
        }
        app.update();
        assert!(!input.peek().accelerate);
    }
}
