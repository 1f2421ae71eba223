//! Frame-indexed input capture and playback.
//!
//! The recorder is either idle, recording or replaying; the mode enum makes
//! simultaneous recording and replay unrepresentable. The frame counter
//! advances through [`InputRecorder::next_frame`] in every mode.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::sim::error::ImportError;
use crate::sim::Frame;

/// Version written into and required from the replay envelope.
pub const REPLAY_FORMAT_VERSION: u32 = 1;

/// Buttons held during one frame. Missing fields default to released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct InputButtons {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub attack: bool,
}

/// A recorded input sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputState {
    pub frame: Frame,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub attack: bool,
    /// Wall-clock milliseconds at capture; informational only.
    pub timestamp: i64,
}

impl InputState {
    pub fn buttons(&self) -> InputButtons {
        InputButtons {
            left: self.left,
            right: self.right,
            jump: self.jump,
            attack: self.attack,
        }
    }
}

/// On-disk/on-wire replay format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayEnvelope {
    pub version: u32,
    pub frame_count: Frame,
    pub inputs: Vec<InputState>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecorderMode {
    #[default]
    Idle,
    Recording,
    Replaying,
}

#[derive(Resource, Clone, Debug, Default, PartialEq, Eq)]
pub struct InputRecorder {
    mode: RecorderMode,
    current_frame: Frame,
    inputs: Vec<InputState>,
    replay_cursor: usize,
}

impl InputRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> RecorderMode {
        self.mode
    }

    pub fn is_recording(&self) -> bool {
        self.mode == RecorderMode::Recording
    }

    pub fn is_replaying(&self) -> bool {
        self.mode == RecorderMode::Replaying
    }

    pub fn current_frame(&self) -> Frame {
        self.current_frame
    }

    /// Recorded samples in capture order.
    pub fn inputs(&self) -> &[InputState] {
        &self.inputs
    }

    /// Discard the log and start recording from frame 0.
    pub fn start_recording(&mut self) {
        if self.is_replaying() {
            debug!("[REPLAY] Replay interrupted by start_recording");
        }
        self.inputs.clear();
        self.current_frame = 0;
        self.replay_cursor = 0;
        self.mode = RecorderMode::Recording;
        info!("[REPLAY] Recording started");
    }

    pub fn stop_recording(&mut self) {
        if self.is_recording() {
            self.mode = RecorderMode::Idle;
            info!(
                "[REPLAY] Recording stopped: {} inputs over {} frames",
                self.inputs.len(),
                self.current_frame
            );
        }
    }

    /// Append `buttons` stamped with the current frame.
    ///
    /// A no-op unless recording, so callers may record unconditionally every tick.
    pub fn record_input(&mut self, buttons: InputButtons) {
        if !self.is_recording() {
            return;
        }
        self.inputs.push(InputState {
            frame: self.current_frame,
            left: buttons.left,
            right: buttons.right,
            jump: buttons.jump,
            attack: buttons.attack,
            timestamp: crate::sim::wall_clock_millis(),
        });
    }

    /// Advance the frame counter. Runs in every mode.
    pub fn next_frame(&mut self) {
        self.current_frame += 1;
    }

    /// Rewind to frame 0 and start handing back recorded inputs.
    pub fn start_replay(&mut self) {
        self.mode = RecorderMode::Replaying;
        self.current_frame = 0;
        self.replay_cursor = 0;
        info!("[REPLAY] Replay started: {} inputs", self.inputs.len());
    }

    pub fn stop_replay(&mut self) {
        if self.is_replaying() {
            self.mode = RecorderMode::Idle;
        }
    }

    /// The next recorded input, if it belongs to the current frame.
    ///
    /// `None` means "no input recorded for this frame", not an error; use
    /// [`is_replay_finished`](Self::is_replay_finished) to detect the end.
    pub fn get_replay_input(&mut self) -> Option<InputState> {
        if !self.is_replaying() {
            return None;
        }
        let next = self.inputs.get(self.replay_cursor)?;
        if next.frame != self.current_frame {
            return None;
        }
        self.replay_cursor += 1;
        Some(*next)
    }

    pub fn is_replay_finished(&self) -> bool {
        self.replay_cursor >= self.inputs.len()
    }

    /// Frames covered by the log: the frame counter when it was exported or recorded.
    pub fn frame_count(&self) -> Frame {
        self.current_frame
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn to_envelope(&self) -> ReplayEnvelope {
        ReplayEnvelope {
            version: REPLAY_FORMAT_VERSION,
            frame_count: self.frame_count(),
            inputs: self.inputs.clone(),
        }
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_envelope())
    }

    /// Load a replay exported by [`export_json`](Self::export_json).
    ///
    /// The version must be exactly 1 and `inputs` must be an array; otherwise
    /// the recorder is left untouched. On success the recorder is idle.
    pub fn import_json(&mut self, json: &str) -> Result<(), ImportError> {
        let value: Value = serde_json::from_str(json)?;

        let version = value.get("version").ok_or(ImportError::MissingVersion)?;
        if version.as_u64() != Some(REPLAY_FORMAT_VERSION as u64) {
            let found = version.as_u64().unwrap_or(0);
            warn!("[REPLAY] Rejected replay with version {}", version);
            return Err(ImportError::UnsupportedVersion {
                found,
                expected: REPLAY_FORMAT_VERSION,
            });
        }
        if !value.get("inputs").is_some_and(Value::is_array) {
            return Err(ImportError::MissingInputs);
        }

        let envelope: ReplayEnvelope = serde_json::from_value(value)?;
        self.mode = RecorderMode::Idle;
        self.current_frame = envelope.frame_count;
        self.inputs = envelope.inputs;
        self.replay_cursor = 0;

        info!(
            "[REPLAY] Imported {} inputs over {} frames",
            self.inputs.len(),
            self.current_frame
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jump() -> InputButtons {
        InputButtons { jump: true, ..Default::default() }
    }

    #[test]
    fn test_record_is_noop_when_idle() {
        let mut recorder = InputRecorder::new();
        recorder.record_input(jump());
        assert!(recorder.inputs().is_empty());
    }

    #[test]
    fn test_recording_stamps_current_frame() {
        let mut recorder = InputRecorder::new();
        recorder.start_recording();
        recorder.record_input(jump());
        recorder.next_frame();
        recorder.next_frame();
        recorder.record_input(InputButtons { left: true, ..Default::default() });

        let frames: Vec<Frame> = recorder.inputs().iter().map(|i| i.frame).collect();
        assert_eq!(frames, vec![0, 2]);
        assert!(recorder.inputs()[0].jump);
        assert!(recorder.inputs()[1].left);
    }

    #[test]
    fn test_start_recording_resets_log() {
        let mut recorder = InputRecorder::new();
        recorder.start_recording();
        recorder.record_input(jump());
        recorder.next_frame();

        recorder.start_recording();
        assert!(recorder.inputs().is_empty());
        assert_eq!(recorder.current_frame(), 0);
    }

    #[test]
    fn test_sparse_replay() {
        let mut recorder = InputRecorder::new();
        recorder.start_recording();
        recorder.record_input(jump()); // frame 0
        recorder.next_frame();
        recorder.next_frame();
        recorder.record_input(jump()); // frame 2
        recorder.next_frame();
        recorder.stop_recording();

        recorder.start_replay();
        assert_eq!(recorder.get_replay_input().map(|i| i.frame), Some(0));
        assert_eq!(recorder.get_replay_input(), None, "Only one input on frame 0");
        recorder.next_frame();
        assert_eq!(recorder.get_replay_input(), None, "Nothing recorded for frame 1");
        assert!(!recorder.is_replay_finished());
        recorder.next_frame();
        assert_eq!(recorder.get_replay_input().map(|i| i.frame), Some(2));
        assert!(recorder.is_replay_finished());
    }

    #[test]
    fn test_replay_input_requires_replay_mode() {
        let mut recorder = InputRecorder::new();
        recorder.start_recording();
        recorder.record_input(jump());
        assert_eq!(recorder.get_replay_input(), None);
    }

    #[test]
    fn test_json_round_trip() {
        let mut recorder = InputRecorder::new();
        recorder.start_recording();
        for frame in 0..30 {
            if frame % 3 == 0 {
                recorder.record_input(InputButtons { right: true, attack: frame % 2 == 0, ..Default::default() });
            }
            recorder.next_frame();
        }
        recorder.stop_recording();

        let json = recorder.export_json().unwrap();
        let mut restored = InputRecorder::new();
        restored.import_json(&json).unwrap();

        assert_eq!(restored.inputs(), recorder.inputs());
        assert_eq!(restored.frame_count(), recorder.frame_count());
        assert_eq!(restored.to_envelope(), recorder.to_envelope());
    }

    #[test]
    fn test_envelope_uses_camel_case() {
        let recorder = InputRecorder::new();
        let json = recorder.export_json().unwrap();
        assert!(json.contains("\"frameCount\""));
        assert!(json.contains("\"version\":1"));
    }

    #[test]
    fn test_import_rejects_wrong_version() {
        let mut recorder = InputRecorder::new();
        let err = recorder.import_json(r#"{"version": 2, "frameCount": 0, "inputs": []}"#);
        assert!(matches!(err, Err(ImportError::UnsupportedVersion { found: 2, .. })));
    }

    #[test]
    fn test_import_rejects_non_array_inputs() {
        let mut recorder = InputRecorder::new();
        recorder.start_recording();
        recorder.record_input(jump());

        let err = recorder.import_json(r#"{"version": 1, "frameCount": 3, "inputs": {"0": {}}}"#);
        assert!(matches!(err, Err(ImportError::MissingInputs)));
        assert_eq!(recorder.inputs().len(), 1, "Failed import must not touch state");
    }
}
