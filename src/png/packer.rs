use alloc::vec::Vec;

use super::{
  chunk::{ChunkType, ImageHeader, MAX_CHUNK_LENGTH, PNG_SIGNATURE},
  crc32::Crc32,
  filter::FilterEngine,
  options::EncodeOptions,
  zlib::deflate_blocks,
};
use crate::{PngError, PngResult};

/// Appends one complete chunk (`length`, type, payload, CRC) to `out`.
pub fn write_chunk(ty: ChunkType, payload: &[u8], out: &mut Vec<u8>) -> PngResult<()> {
  let length = u32::try_from(payload.len()).map_err(|_| PngError::ChunkTooLong)?;
  if length > MAX_CHUNK_LENGTH {
    return Err(PngError::ChunkTooLong);
  }
  out.try_reserve(payload.len() + 12)?;
  out.extend_from_slice(&length.to_be_bytes());
  out.extend_from_slice(&ty.0);
  out.extend_from_slice(payload);
  let mut crc = Crc32::new();
  crc.update(&ty.0);
  crc.update(payload);
  out.extend_from_slice(&crc.finish().to_be_bytes());
  Ok(())
}

/// Turns RGBA8 pixels into a PNG byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Packer {
  options: EncodeOptions,
}
impl Packer {
  #[inline]
  #[must_use]
  pub const fn new(options: EncodeOptions) -> Self {
    Self { options }
  }

  #[inline]
  #[must_use]
  pub const fn options(&self) -> &EncodeOptions {
    &self.options
  }

  /// Encodes `pixels`, an image of `width * height` RGBA8 pixels.
  ///
  /// The output goes to `emit` in order: the signature, then `IHDR`, then one
  /// `IDAT` per compressed block, then `IEND`. Getting `Ok(())` back means the
  /// stream is complete.
  ///
  /// ## Failure
  /// * [`PngError::InvalidDimensions`] if either dimension is 0.
  /// * [`PngError::PixelBufferLengthMismatch`] if `pixels` is the wrong size.
  ///
  /// Nothing is emitted when the input is rejected.
  pub fn pack(
    &self, pixels: &[u8], width: u32, height: u32, mut emit: impl FnMut(&[u8]),
  ) -> PngResult<()> {
    let header = ImageHeader::rgba8(width, height);
    header.validate()?;
    let engine = FilterEngine::new(width, height, header.bpp(), self.options.filter);
    let filtered = engine.filter(pixels)?;
    log::debug!("packing {width}x{height}, {} filtered bytes", filtered.len());

    emit(&PNG_SIGNATURE);
    let mut chunk = Vec::new();
    write_chunk(ChunkType::IHDR, &header.to_bytes(), &mut chunk)?;
    emit(&chunk);
    deflate_blocks(&filtered, &self.options, |block| {
      chunk.clear();
      write_chunk(ChunkType::IDAT, block, &mut chunk)?;
      log::trace!("IDAT of {} bytes", block.len());
      emit(&chunk);
      Ok(())
    })?;
    chunk.clear();
    write_chunk(ChunkType::IEND, &[], &mut chunk)?;
    emit(&chunk);
    Ok(())
  }

  /// Like [`pack`](Self::pack), collecting the stream into one `Vec`.
  pub fn pack_to_vec(&self, pixels: &[u8], width: u32, height: u32) -> PngResult<Vec<u8>> {
    let mut out = Vec::new();
    self.pack(pixels, width, height, |bytes| out.extend_from_slice(bytes))?;
    Ok(out)
  }
}

/// Encodes RGBA8 pixels into a complete PNG.
#[inline]
pub fn encode(
  pixels: &[u8], width: u32, height: u32, options: &EncodeOptions,
) -> PngResult<Vec<u8>> {
  Packer::new(*options).pack_to_vec(pixels, width, height)
}
