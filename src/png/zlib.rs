//! The zlib stream boundary, on top of `miniz_oxide`'s streaming API.

use alloc::{boxed::Box, vec, vec::Vec};

use miniz_oxide::{
  deflate::{
    core::{create_comp_flags_from_zip_params, CompressorOxide},
    stream::deflate,
  },
  inflate::stream::{inflate, InflateState},
  DataFormat, MZError, MZFlush, MZStatus,
};

use super::options::EncodeOptions;
use crate::{PngError, PngResult};

const INFLATE_OUT_SIZE: usize = 32 * 1024;

/// Incremental zlib decompression.
///
/// Input goes in by [`write`](Self::write) in pieces of any size, and all the
/// output those pieces make is passed to a sink as it comes out.
pub struct ZlibInflater {
  state: Box<InflateState>,
  out: Vec<u8>,
  ended: bool,
}
impl core::fmt::Debug for ZlibInflater {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("ZlibInflater").field("ended", &self.ended).finish_non_exhaustive()
  }
}
impl Default for ZlibInflater {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
impl ZlibInflater {
  #[inline]
  #[must_use]
  pub fn new() -> Self {
    Self {
      state: InflateState::new_boxed(DataFormat::Zlib),
      out: vec![0; INFLATE_OUT_SIZE],
      ended: false,
    }
  }

  /// If the end of the zlib stream has been seen.
  #[inline]
  #[must_use]
  pub const fn is_ended(&self) -> bool {
    self.ended
  }

  /// Decompresses as much as `input` allows.
  pub fn write(
    &mut self, mut input: &[u8], mut sink: impl FnMut(&[u8]) -> PngResult<()>,
  ) -> PngResult<()> {
    while !self.ended {
      let res = inflate(&mut self.state, input, &mut self.out, MZFlush::None);
      input = &input[res.bytes_consumed..];
      if res.bytes_written > 0 {
        sink(&self.out[..res.bytes_written])?;
      }
      match res.status {
        Ok(MZStatus::StreamEnd) => self.ended = true,
        Ok(_) => {
          if input.is_empty() && res.bytes_written < self.out.len() {
            break;
          }
          if res.bytes_consumed == 0 && res.bytes_written == 0 {
            return Err(PngError::Decompression);
          }
        }
        // needs more input
        Err(MZError::Buf) => break,
        Err(e) => {
          log::warn!("inflate failed: {e:?}");
          return Err(PngError::Decompression);
        }
      }
    }
    if !input.is_empty() {
      log::debug!("ignoring {} bytes after the end of the zlib stream", input.len());
    }
    Ok(())
  }

  /// Signals the end of input and flushes what's left.
  ///
  /// ## Failure
  /// * [`PngError::Decompression`] if the zlib stream was cut short.
  pub fn finish(&mut self, mut sink: impl FnMut(&[u8]) -> PngResult<()>) -> PngResult<()> {
    while !self.ended {
      let res = inflate(&mut self.state, &[], &mut self.out, MZFlush::Finish);
      if res.bytes_written > 0 {
        sink(&self.out[..res.bytes_written])?;
      }
      match res.status {
        Ok(MZStatus::StreamEnd) => self.ended = true,
        Ok(_) if res.bytes_written > 0 => (),
        other => {
          log::warn!("zlib stream ended early: {other:?}");
          return Err(PngError::Decompression);
        }
      }
    }
    Ok(())
  }
}

/// Compresses `data` as one zlib stream, passing each output block of at most
/// `deflate_chunk_size` bytes to `emit` in order.
pub fn deflate_blocks(
  data: &[u8], options: &EncodeOptions, mut emit: impl FnMut(&[u8]) -> PngResult<()>,
) -> PngResult<()> {
  let flags = create_comp_flags_from_zip_params(
    i32::from(options.deflate_level.min(10)),
    15,
    options.deflate_strategy as i32,
  );
  let mut compressor = CompressorOxide::new(flags);
  let mut out = Vec::new();
  let chunk_size = options.deflate_chunk_size.max(EncodeOptions::MIN_CHUNK_SIZE);
  out.try_reserve_exact(chunk_size)?;
  out.resize(chunk_size, 0);
  let mut input = data;
  loop {
    let res = deflate(&mut compressor, input, &mut out, MZFlush::Finish);
    input = &input[res.bytes_consumed..];
    if res.bytes_written > 0 {
      emit(&out[..res.bytes_written])?;
    }
    match res.status {
      Ok(MZStatus::StreamEnd) => return Ok(()),
      Ok(_) if res.bytes_consumed > 0 || res.bytes_written > 0 => (),
      other => {
        log::warn!("deflate stopped making progress: {other:?}");
        return Err(PngError::Compression);
      }
    }
  }
}
