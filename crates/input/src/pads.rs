use rigspace_common::{Pad, PadSide};
use serde::{Deserialize, Serialize};

/// Which kind of device last wrote a pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Gamepad,
    XrController,
    VirtualJoystick,
}

/// One pad plus the source that wrote it last.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PadChannel {
    value: Pad,
    writer: Option<SourceKind>,
}

impl PadChannel {
    /// Current value of the channel.
    pub fn value(&self) -> Pad {
        self.value
    }

    /// Source that wrote the value, `None` before any write.
    pub fn last_writer(&self) -> Option<SourceKind> {
        self.writer
    }
}

/// The two shared pads.
///
/// Writers never merge: each `write` replaces the value and records the
/// writer, so the last source to write in a frame wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PadState {
    left: PadChannel,
    right: PadChannel,
}

impl PadState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value and last writer of one pad.
    pub fn channel(&self, side: PadSide) -> &PadChannel {
        match side {
            PadSide::Left => &self.left,
            PadSide::Right => &self.right,
        }
    }

    fn channel_mut(&mut self, side: PadSide) -> &mut PadChannel {
        match side {
            PadSide::Left => &mut self.left,
            PadSide::Right => &mut self.right,
        }
    }

    /// Movement pad.
    pub fn left(&self) -> Pad {
        self.left.value
    }

    /// Turn and height pad.
    pub fn right(&self) -> Pad {
        self.right.value
    }

    /// Replace the value of `side` and record `source` as its writer.
    pub fn write(&mut self, side: PadSide, value: Pad, source: SourceKind) {
        let channel = self.channel_mut(side);
        if channel.writer != Some(source) {
            tracing::trace!(?side, ?source, "pad writer changed");
        }
        channel.value = value;
        channel.writer = Some(source);
    }

    /// Zero every pad whose last writer is `source`. Returns the sides that
    /// were cleared.
    pub fn clear_written_by(&mut self, source: SourceKind) -> Vec<PadSide> {
        let mut cleared = Vec::new();
        for side in [PadSide::Left, PadSide::Right] {
            let channel = self.channel_mut(side);
            if channel.writer == Some(source) {
                channel.value = Pad::ZERO;
                cleared.push(side);
            }
        }
        cleared
    }

    /// The values the integrator reads this frame.
    pub fn snapshot(&self) -> PadSnapshot {
        PadSnapshot {
            left: self.left.value,
            right: self.right.value,
        }
    }
}

/// Copy of both pad values taken once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PadSnapshot {
    pub left: Pad,
    pub right: Pad,
}
