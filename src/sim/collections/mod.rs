//! Bounded history containers for rollback.
//!
//! Both buffers hold a fixed number of entries and silently overwrite the
//! oldest once full, so memory stays constant however long a session runs.
//!
//! # Example
//!
//! ```rust
//! use kestrel::sim::collections::FrameRingBuffer;
//!
//! let mut history = FrameRingBuffer::new(3);
//! for frame in 0..5 {
//!     history.set(frame, frame * 10);
//! }
//! assert_eq!(history.get(1), None);
//! assert_eq!(history.get(4), Some(&40));
//! ```

pub mod frame_ring_buffer;
pub mod ring_buffer;


pub use frame_ring_buffer::{FrameEntry, FrameRingBuffer};
pub use ring_buffer::RingBuffer;
