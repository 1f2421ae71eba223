//! Desync detection through per-frame state checksums.
//!
//! Each peer records a checksum of its simulation state every frame. Peers
//! exchange histories and [`StateChecksumValidator::find_divergence_point`]
//! reports the first frame where they disagree.
//!
//! The hash is 32-bit FNV-1a over little-endian bytes. Any implementation
//! that feeds the same bytes gets the same checksum, whatever the machine.

use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::sim::error::ImportError;
use crate::sim::fixed_math::FixedNum;
use crate::sim::Frame;

/// FNV-1a 32-bit offset basis.
pub const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
/// FNV-1a 32-bit prime.
pub const FNV_PRIME: u32 = 0x0100_0193;

/// Default number of frames of checksum history kept.
pub const DEFAULT_MAX_HISTORY: usize = 300;

/// Streaming 32-bit FNV-1a hasher. Multi-byte values are written little-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fnv1a(u32);

impl Fnv1a {
    pub fn new() -> Self {
        Self(FNV_OFFSET_BASIS)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u32;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    pub fn write_u8(&mut self, v: u8) {
        self.write(&[v]);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(v as u8);
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_fixed(&mut self, v: FixedNum) {
        self.write_i32(v.to_bits());
    }

    pub fn finish(self) -> u32 {
        self.0
    }
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}

/// FNV-1a of a raw byte slice.
pub fn compute_data_checksum(bytes: &[u8]) -> u32 {
    let mut hasher = Fnv1a::new();
    hasher.write(bytes);
    hasher.finish()
}

// ============================================================================
// Validator
// ============================================================================

/// One frame's recorded checksum, as exported to JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumRecord {
    pub frame: Frame,
    pub checksum: u32,
    pub timestamp: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ChecksumEntry {
    checksum: u32,
    timestamp: i64,
}

/// Bounded history of per-frame checksums.
///
/// # Absence is not a mismatch
///
/// Validating a frame with no recorded baseline passes. Only a stored
/// checksum that differs from the given one fails.
#[derive(Resource, Clone, Debug, PartialEq, Eq)]
pub struct StateChecksumValidator {
    history: BTreeMap<Frame, ChecksumEntry>,
    max_history: usize,
}

impl StateChecksumValidator {
    pub fn new(max_history: usize) -> Self {
        Self {
            history: BTreeMap::new(),
            max_history: max_history.max(1),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Store `checksum` for `frame`, then evict every record at or before `frame - max_history`.
    pub fn record_checksum(&mut self, frame: Frame, checksum: u32) {
        self.history.insert(
            frame,
            ChecksumEntry {
                checksum,
                timestamp: crate::sim::wall_clock_millis(),
            },
        );

        self.evict_window_ending_at(frame);
    }

    /// Drop every record at or before `frame - max_history`.
    fn evict_window_ending_at(&mut self, frame: Frame) {
        let cutoff = frame.saturating_sub(self.max_history as Frame);
        if self.history.first_key_value().is_some_and(|(&oldest, _)| oldest <= cutoff) {
            self.history = self.history.split_off(&(cutoff + 1));
        }
    }

    pub fn get_checksum(&self, frame: Frame) -> Option<u32> {
        self.history.get(&frame).map(|entry| entry.checksum)
    }

    /// True unless a checksum is stored for `frame` and differs from `checksum`.
    pub fn validate_checksum(&self, frame: Frame, checksum: u32) -> bool {
        match self.history.get(&frame) {
            Some(entry) if entry.checksum != checksum => {
                warn!(
                    "[CHECKSUM] Mismatch at frame {}: local {:#010x}, remote {:#010x}",
                    frame, entry.checksum, checksum
                );
                false
            }
            _ => true,
        }
    }

    /// Frame → checksum view of the history, ascending by frame.
    pub fn checksums(&self) -> BTreeMap<Frame, u32> {
        self.history
            .iter()
            .map(|(&frame, entry)| (frame, entry.checksum))
            .collect()
    }

    /// First frame, in ascending order, where both sides hold a checksum and they differ.
    pub fn find_divergence_point(&self, other: &BTreeMap<Frame, u32>) -> Option<Frame> {
        let divergence = self
            .history
            .iter()
            .find(|(frame, entry)| other.get(frame).is_some_and(|&theirs| theirs != entry.checksum))
            .map(|(&frame, _)| frame);

        if let Some(frame) = divergence {
            info!("[CHECKSUM] Histories diverge at frame {}", frame);
        }
        divergence
    }

    pub fn find_divergence_with(&self, other: &StateChecksumValidator) -> Option<Frame> {
        self.find_divergence_point(&other.checksums())
    }

    /// History as JSON records, ascending by frame.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        let records: Vec<ChecksumRecord> = self
            .history
            .iter()
            .map(|(&frame, entry)| ChecksumRecord {
                frame,
                checksum: entry.checksum,
                timestamp: entry.timestamp,
            })
            .collect();
        serde_json::to_string(&records)
    }

    /// Replace the history with records parsed from `json`, keeping only the
    /// `max_history` window that ends at the newest imported frame.
    ///
    /// Leaves the current history untouched if parsing fails.
    pub fn import_json(&mut self, json: &str) -> Result<(), ImportError> {
        let records: Vec<ChecksumRecord> = serde_json::from_str(json)?;
        self.history = records
            .into_iter()
            .map(|r| {
                (
                    r.frame,
                    ChecksumEntry {
                        checksum: r.checksum,
                        timestamp: r.timestamp,
                    },
                )
            })
            .collect();
        let imported = self.history.len();
        if let Some(newest) = self.history.last_key_value().map(|(&frame, _)| frame) {
            self.evict_window_ending_at(newest);
        }
        debug!(
            "[CHECKSUM] Imported {} records, kept {}",
            imported,
            self.history.len()
        );
        Ok(())
    }
}

impl Default for StateChecksumValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}
