//! Frame-scheduled player commands.
//!
//! Commands are queued against the frame they must execute on and drained
//! once per tick. Within a frame, commands run in sequence-number order;
//! every command is stamped on first enqueue and keeps its number when
//! re-queued during resimulation.

use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::sim::fixed_math::FixedNum;
use crate::sim::Frame;

pub type PlayerId = u8;

/// What a command does. Consumers match on this exhaustively.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CommandKind {
    Move { dx: FixedNum, dy: FixedNum },
    Jump { force: FixedNum },
    Attack { target_x: FixedNum, target_y: FixedNum },
    Spawn {
        entity_type: String,
        x: FixedNum,
        y: FixedNum,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<u32>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCommand {
    pub frame: Frame,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    /// Queue-assigned, strictly increasing across the queue's lifetime.
    pub seq: u64,
    #[serde(flatten)]
    pub kind: CommandKind,
}

#[derive(Resource, Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandQueue {
    /// Per-frame commands, each list kept sorted by `seq`.
    commands: BTreeMap<Frame, Vec<GameCommand>>,
    current_frame: Frame,
    next_seq: u64,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_frame(&self) -> Frame {
        self.current_frame
    }

    pub fn set_frame(&mut self, frame: Frame) {
        self.current_frame = frame;
    }

    pub fn advance_frame(&mut self) {
        self.current_frame += 1;
    }

    /// Schedule `kind` for `frame` and return the sequence number it was given.
    pub fn enqueue(&mut self, frame: Frame, player_id: Option<PlayerId>, kind: CommandKind) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;

        trace!("[COMMANDS] Enqueue #{} for frame {}: {:?}", seq, frame, kind);
        self.commands.entry(frame).or_default().push(GameCommand {
            frame,
            player_id,
            seq,
            kind,
        });
        seq
    }

    /// Put back a command that was already dequeued, keeping its sequence number.
    ///
    /// Lands in its original position relative to the frame's other commands,
    /// whatever order re-queued commands arrive in.
    pub fn requeue(&mut self, command: GameCommand) {
        self.next_seq = self.next_seq.max(command.seq + 1);

        let list = self.commands.entry(command.frame).or_default();
        let at = list.partition_point(|queued| queued.seq < command.seq);
        list.insert(at, command);
    }

    /// Remove and return the current frame's commands in sequence order.
    pub fn dequeue(&mut self) -> Vec<GameCommand> {
        self.commands.remove(&self.current_frame).unwrap_or_default()
    }

    /// Commands scheduled for `frame`, without removing them.
    pub fn peek(&self, frame: Frame) -> &[GameCommand] {
        self.commands.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop every frame strictly before `frame`.
    pub fn clear_before(&mut self, frame: Frame) {
        let before = self.commands.len();
        self.commands = self.commands.split_off(&frame);
        let dropped = before - self.commands.len();
        if dropped > 0 {
            debug!("[COMMANDS] Evicted {} frames before {}", dropped, frame);
        }
    }

    /// Total queued commands across all frames.
    pub fn len(&self) -> usize {
        self.commands.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Frames with at least one queued command, ascending.
    pub fn pending_frames(&self) -> impl Iterator<Item = Frame> + '_ {
        self.commands.keys().copied()
    }

    /// Drop all queued commands. The frame and sequence counters are kept.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jump(force: i32) -> CommandKind {
        CommandKind::Jump { force: FixedNum::from_int(force) }
    }

    #[test]
    fn test_dequeue_returns_current_frame_in_enqueue_order() {
        let mut queue = CommandQueue::new();
        queue.enqueue(0, Some(1), jump(1));
        queue.enqueue(1, Some(1), jump(9));
        queue.enqueue(0, Some(2), jump(2));

        let frame0 = queue.dequeue();
        let forces: Vec<_> = frame0
            .iter()
            .map(|c| match c.kind {
                CommandKind::Jump { force } => force.to_int(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(forces, vec![1, 2]);
        assert_eq!(frame0[0].player_id, Some(1));
        assert_eq!(frame0[1].player_id, Some(2));

        assert!(queue.dequeue().is_empty(), "Frame 0 was drained");
        queue.advance_frame();
        assert_eq!(queue.dequeue().len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_requeue_restores_original_order() {
        let mut queue = CommandQueue::new();
        for force in 0..4 {
            queue.enqueue(5, None, jump(force));
        }
        queue.set_frame(5);
        let mut drained = queue.dequeue();

        // Re-insert in reverse, as a rollback might.
        drained.reverse();
        for command in drained.clone() {
            queue.requeue(command);
        }
        drained.reverse();

        assert_eq!(queue.peek(5), drained.as_slice());
        assert_eq!(queue.dequeue(), drained);
    }

    #[test]
    fn test_sequence_numbers_stay_monotonic_after_requeue() {
        let mut queue = CommandQueue::new();
        let first = queue.enqueue(0, None, jump(1));
        let command = queue.dequeue().remove(0);
        queue.requeue(command);
        let second = queue.enqueue(0, None, jump(2));
        assert!(second > first);
    }

    #[test]
    fn test_clear_before_is_exclusive() {
        let mut queue = CommandQueue::new();
        for frame in 0..10 {
            queue.enqueue(frame, None, jump(0));
        }
        queue.clear_before(7);
        assert_eq!(queue.pending_frames().collect::<Vec<_>>(), vec![7, 8, 9]);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_peek_unknown_frame_is_empty() {
        let queue = CommandQueue::new();
        assert!(queue.peek(3).is_empty());
    }

    #[test]
    fn test_command_json_is_internally_tagged() {
        let mut queue = CommandQueue::new();
        queue.enqueue(
            4,
            Some(0),
            CommandKind::Spawn {
                entity_type: "crate".to_string(),
                x: FixedNum::from_int(1),
                y: FixedNum::from_int(2),
                seed: Some(7),
            },
        );
        let command = queue.peek(4)[0].clone();

        let json = serde_json::to_string(&command).unwrap();
        assert!(json.contains("\"type\":\"Spawn\""), "{}", json);
        assert!(json.contains("\"x\":65536"), "{}", json);

        let back: GameCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, command);
    }
}
