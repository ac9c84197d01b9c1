//! Real gamepads through `gilrs`.

use gilrs::{Axis, EventType, Gilrs};

use crate::aggregator::InputEvent;
use crate::gamepad::{GamepadPoll, GamepadSnapshot};
use crate::joystick::InputError;

/// Turns `gilrs` events into [`InputEvent`]s and keeps per-frame axis
/// snapshots in the standard layout (0/1 left stick, 2/3 right stick, +y
/// down).
pub struct GilrsBackend {
    gilrs: Gilrs,
    snapshots: Vec<GamepadSnapshot>,
}

impl GilrsBackend {
    pub fn new() -> Result<Self, InputError> {
        let gilrs = Gilrs::new().map_err(|e| InputError::Backend(e.to_string()))?;
        Ok(Self {
            gilrs,
            snapshots: Vec::new(),
        })
    }

    /// Drain pending platform events and refresh the snapshots. Call once
    /// per frame before sampling the aggregator.
    pub fn pump(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        while let Some(gilrs::Event { id, event, .. }) = self.gilrs.next_event() {
            let index = usize::from(id);
            match event {
                EventType::Connected => {
                    let name = self.gilrs.gamepad(id).name().to_string();
                    events.push(InputEvent::GamepadConnected {
                        index,
                        id: name,
                        axis_count: 4,
                    });
                }
                EventType::Disconnected => {
                    events.push(InputEvent::GamepadDisconnected { index });
                }
                _ => {}
            }
        }

        self.snapshots = self
            .gilrs
            .gamepads()
            .map(|(id, gp)| {
                GamepadSnapshot::new(
                    usize::from(id),
                    gp.name(),
                    vec![
                        gp.value(Axis::LeftStickX),
                        -gp.value(Axis::LeftStickY),
                        gp.value(Axis::RightStickX),
                        -gp.value(Axis::RightStickY),
                    ],
                )
            })
            .collect();
        events
    }
}

impl GamepadPoll for GilrsBackend {
    fn gamepad(&self, index: usize) -> Option<&GamepadSnapshot> {
        self.snapshots.gamepad(index)
    }
}
