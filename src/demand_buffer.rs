//! A pull-based byte queue.
//!
//! Producers [`push`](DemandBuffer::push) blocks of any size. Consumers
//! [`request`](DemandBuffer::request) reads of a known size, each tagged with a
//! continuation value `T`. The owner then calls
//! [`pop_ready`](DemandBuffer::pop_ready) in a loop, and each read that can be
//! served comes back out as `(T, bytes)` in the order it was requested.
//!
//! A read is either *exact* (delivered only once `length` bytes are buffered,
//! spanning pushed blocks as needed) or *allow less* (delivered as soon as any
//! bytes exist, with at most `length` bytes taken from the oldest block).

use alloc::{collections::VecDeque, vec::Vec};

use crate::{PngError, PngResult};

/// One queued read.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReadRequest<T> {
  length: usize,
  allow_less: bool,
  token: T,
}

/// FIFO byte buffer that serves reads on demand.
#[derive(Debug, Clone)]
pub struct DemandBuffer<T> {
  blocks: VecDeque<Vec<u8>>,
  buffered: usize,
  reads: VecDeque<ReadRequest<T>>,
  paused: bool,
  drain_signal: bool,
  closed: bool,
  finished: bool,
  disposed: bool,
}
impl<T> Default for DemandBuffer<T> {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
impl<T> DemandBuffer<T> {
  /// Makes an empty, open buffer.
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self {
      blocks: VecDeque::new(),
      buffered: 0,
      reads: VecDeque::new(),
      paused: false,
      drain_signal: false,
      closed: false,
      finished: false,
      disposed: false,
    }
  }

  /// Makes an open buffer with one read already queued.
  #[must_use]
  pub fn with_request(length: usize, allow_less: bool, token: T) -> Self {
    let mut reads = VecDeque::new();
    reads.push_back(ReadRequest { length, allow_less, token });
    Self { reads, ..Self::new() }
  }

  /// Appends a block of bytes.
  ///
  /// If no read is waiting when the block arrives the buffer becomes paused,
  /// which tells the producer to hold off until more demand shows up.
  ///
  /// ## Failure
  /// * [`PngError::WriteAfterClose`] once the buffer is closed or disposed.
  pub fn push(&mut self, bytes: Vec<u8>) -> PngResult<()> {
    if self.closed || self.disposed {
      return Err(PngError::WriteAfterClose);
    }
    if self.reads.is_empty() && !self.paused {
      log::debug!("demand buffer paused with {} bytes buffered", self.buffered + bytes.len());
      self.paused = true;
    }
    if !bytes.is_empty() {
      self.buffered += bytes.len();
      self.blocks.push_back(bytes);
    }
    Ok(())
  }

  /// Queues a read of `length` bytes, tagged with `token`.
  ///
  /// Queuing a read while paused un-pauses the buffer and raises the drain
  /// signal (see [`take_drain_signal`](Self::take_drain_signal)).
  ///
  /// ## Failure
  /// * [`PngError::ReadAfterDispose`] once the buffer is disposed.
  pub fn request(&mut self, length: usize, allow_less: bool, token: T) -> PngResult<()> {
    if self.disposed {
      return Err(PngError::ReadAfterDispose);
    }
    self.reads.push_back(ReadRequest { length, allow_less, token });
    if self.paused {
      log::debug!("demand buffer drained");
      self.paused = false;
      self.drain_signal = true;
    }
    Ok(())
  }

  /// Serves the oldest read if it can be served now.
  ///
  /// Returns `Ok(None)` when the oldest read needs more bytes, or when there
  /// are no reads. Reads are only ever served in the order they were queued.
  ///
  /// Once the buffer is closed, a read that can't be served will never be
  /// served, so that's reported as [`PngError::PendingReadsOnClose`] and the
  /// buffer is disposed. A closed buffer with no reads left becomes finished.
  pub fn pop_ready(&mut self) -> PngResult<Option<(T, Vec<u8>)>> {
    if self.disposed {
      return Ok(None);
    }
    if let Some(read) = self.reads.front() {
      let ready = if read.allow_less {
        self.buffered > 0
      } else {
        self.buffered >= read.length
      };
      if ready {
        if let Some(read) = self.reads.pop_front() {
          let bytes = if read.allow_less {
            self.take_some(read.length)
          } else {
            self.take_exact(read.length)
          };
          return Ok(Some((read.token, bytes)));
        }
      }
    }
    if self.closed && !self.finished {
      if self.reads.is_empty() {
        self.finalize();
      } else {
        log::warn!("demand buffer closed with {} reads pending", self.reads.len());
        self.dispose();
        return Err(PngError::PendingReadsOnClose);
      }
    }
    Ok(None)
  }

  /// Marks the end of input, optionally pushing one final block first.
  ///
  /// With no reads pending the buffer finishes right away. Otherwise it
  /// finishes once [`pop_ready`](Self::pop_ready) has served all the reads it
  /// can.
  pub fn close(&mut self, final_bytes: Option<Vec<u8>>) -> PngResult<()> {
    if let Some(bytes) = final_bytes {
      self.push(bytes)?;
    }
    if self.disposed {
      return Ok(());
    }
    self.closed = true;
    if self.reads.is_empty() {
      self.finalize();
    }
    Ok(())
  }

  /// Drops all buffered bytes and pending reads.
  ///
  /// Pending continuations are never run. Calling this more than once is fine.
  pub fn dispose(&mut self) {
    if self.disposed {
      return;
    }
    self.blocks = VecDeque::new();
    self.reads = VecDeque::new();
    self.buffered = 0;
    self.paused = false;
    self.drain_signal = false;
    self.closed = true;
    self.finished = true;
    self.disposed = true;
  }

  /// If pushes arrived with no demand and no read has been queued since.
  #[inline]
  #[must_use]
  pub const fn is_paused(&self) -> bool {
    self.paused
  }

  /// Returns (and clears) the drain signal raised when a read un-paused the
  /// buffer.
  #[inline]
  pub fn take_drain_signal(&mut self) -> bool {
    core::mem::take(&mut self.drain_signal)
  }

  /// Total bytes pushed but not yet delivered.
  #[inline]
  #[must_use]
  pub const fn buffered(&self) -> usize {
    self.buffered
  }

  /// Reads queued but not yet served.
  #[inline]
  #[must_use]
  pub fn pending_reads(&self) -> usize {
    self.reads.len()
  }

  /// If [`close`](Self::close) has been called.
  #[inline]
  #[must_use]
  pub const fn is_closed(&self) -> bool {
    self.closed
  }

  /// If the buffer is closed with nothing left to serve, or disposed.
  #[inline]
  #[must_use]
  pub const fn is_finished(&self) -> bool {
    self.finished
  }

  /// If [`dispose`](Self::dispose) has been called.
  #[inline]
  #[must_use]
  pub const fn is_disposed(&self) -> bool {
    self.disposed
  }

  fn finalize(&mut self) {
    if self.buffered > 0 {
      log::debug!("demand buffer discarding {} unread bytes", self.buffered);
    }
    self.blocks = VecDeque::new();
    self.buffered = 0;
    self.finished = true;
  }

  /// Takes up to `length` bytes, only ever from the front block.
  fn take_some(&mut self, length: usize) -> Vec<u8> {
    let Some(mut front) = self.blocks.pop_front() else { return Vec::new() };
    if front.len() > length {
      let rest = front.split_off(length);
      self.blocks.push_front(rest);
    }
    self.buffered -= front.len();
    front
  }

  /// Takes exactly `length` bytes, which the caller has checked are buffered.
  fn take_exact(&mut self, length: usize) -> Vec<u8> {
    if let Some(front) = self.blocks.front() {
      if front.len() == length {
        return self.take_some(length);
      }
    }
    let mut out = Vec::with_capacity(length);
    while out.len() < length {
      let Some(mut block) = self.blocks.pop_front() else { break };
      let want = length - out.len();
      if block.len() > want {
        let rest = block.split_off(want);
        self.blocks.push_front(rest);
      }
      out.extend_from_slice(&block);
    }
    self.buffered -= out.len();
    out
  }
}
