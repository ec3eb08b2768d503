//! The push-driven decode session.
//!
//! Every step of the chunk grammar is a read against the session's
//! [`DemandBuffer`]. The continuation for each read is a [`Step`] value, and
//! [`Decoder::push`] runs steps for as long as the buffer can serve them.

use alloc::vec::Vec;

use super::{
  chunk::{
    ChunkType, ImageHeader, KnownChunk, Metadata, TransparencyKey, MAX_CHUNK_LENGTH, PNG_SIGNATURE,
  },
  crc32::Crc32,
  filter::ScanlineDecoder,
  options::DecodeOptions,
  zlib::ZlibInflater,
};
use crate::{DemandBuffer, PngError, PngResult};

/// What to do with the bytes of a read once it's served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
  Signature,
  ChunkHeader,
  /// An unknown ancillary chunk's payload and CRC.
  SkipChunk,
  Payload(KnownChunk),
  /// `remaining` counts the bytes of this `IDAT` not yet read.
  ImageData { remaining: usize },
  ChunkCrc,
}

/// A fully decoded image.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
  pub metadata: Metadata,
  /// From `gAMA`, already divided by 100,000. Never applied to the pixels.
  pub gamma: Option<f64>,
  /// From `tRNS` on a greyscale or RGB image. Never applied to the pixels.
  pub transparency: Option<TransparencyKey>,
  /// `width * height` RGBA8 pixels, row major.
  pub pixels: Vec<u8>,
}

/// One PNG decode.
///
/// Push the PNG bytes in with [`push`](Self::push) in whatever sizes they
/// arrive in, then call [`finish`](Self::finish). Header info is available
/// from [`metadata`](Self::metadata) as soon as the `IHDR` chunk has been
/// parsed.
///
/// A session always has a read waiting, so it takes every push as it comes
/// and never asks its producer to slow down.
///
/// The first error ends the session. The buffered input, the decompressor and
/// the partial pixels are all dropped, and every later call gives the same
/// error back.
#[derive(Debug)]
pub struct Decoder {
  options: DecodeOptions,
  input: DemandBuffer<Step>,
  crc: Crc32,
  chunk_ty: ChunkType,
  header: Option<ImageHeader>,
  palette: Vec<[u8; 4]>,
  transparency: Option<TransparencyKey>,
  gamma: Option<f64>,
  seen_idat: bool,
  seen_iend: bool,
  inflater: Option<ZlibInflater>,
  scanlines: Option<ScanlineDecoder>,
  pixels: Option<Vec<u8>>,
  failure: Option<PngError>,
}
impl Default for Decoder {
  #[inline]
  fn default() -> Self {
    Self::new(DecodeOptions::default())
  }
}
impl Decoder {
  #[must_use]
  pub fn new(options: DecodeOptions) -> Self {
    Self {
      options,
      input: DemandBuffer::with_request(PNG_SIGNATURE.len(), false, Step::Signature),
      crc: Crc32::new(),
      chunk_ty: ChunkType::IHDR,
      header: None,
      palette: Vec::new(),
      transparency: None,
      gamma: None,
      seen_idat: false,
      seen_iend: false,
      inflater: None,
      scanlines: None,
      pixels: None,
      failure: None,
    }
  }

  /// Header info, once `IHDR` has been parsed.
  #[inline]
  #[must_use]
  pub fn metadata(&self) -> Option<Metadata> {
    self.header.as_ref().map(Metadata::from)
  }

  /// The gamma, once `gAMA` has been parsed.
  #[inline]
  #[must_use]
  pub const fn gamma(&self) -> Option<f64> {
    self.gamma
  }

  /// The palette so far, with alpha from `tRNS` applied.
  #[inline]
  #[must_use]
  pub fn palette(&self) -> &[[u8; 4]] {
    &self.palette
  }

  /// If the session has either failed or read through `IEND`.
  #[inline]
  #[must_use]
  pub const fn is_terminated(&self) -> bool {
    self.failure.is_some() || self.input.is_finished()
  }

  /// Feeds more PNG bytes in, running the decode as far as they allow.
  pub fn push(&mut self, bytes: &[u8]) -> PngResult<()> {
    if let Some(e) = self.failure {
      return Err(e);
    }
    let result = match self.input.push(bytes.to_vec()) {
      Ok(()) => self.pump(),
      Err(e) => Err(e),
    };
    result.map_err(|e| self.fail(e))
  }

  /// Signals the end of the input and gives back the image.
  ///
  /// ## Failure
  /// * [`PngError::PendingReadsOnClose`] if the stream stopped before `IEND`.
  pub fn finish(mut self) -> PngResult<DecodedImage> {
    if let Some(e) = self.failure {
      return Err(e);
    }
    if !self.input.is_closed() {
      let result = self.input.close(None).and_then(|()| self.pump());
      if let Err(e) = result {
        return Err(self.fail(e));
      }
    }
    match (self.header, self.pixels) {
      (Some(header), Some(pixels)) => Ok(DecodedImage {
        metadata: Metadata::from(&header),
        gamma: self.gamma,
        transparency: self.transparency,
        pixels,
      }),
      _ => Err(PngError::MissingImageData),
    }
  }

  /// Runs every step the buffer can serve right now.
  fn pump(&mut self) -> PngResult<()> {
    while let Some((step, bytes)) = self.input.pop_ready()? {
      self.run_step(step, bytes)?;
    }
    Ok(())
  }

  fn fail(&mut self, e: PngError) -> PngError {
    log::warn!("png decode failed: {e}");
    self.input.dispose();
    self.inflater = None;
    self.scanlines = None;
    self.pixels = None;
    self.failure = Some(e);
    e
  }

  fn run_step(&mut self, step: Step, bytes: Vec<u8>) -> PngResult<()> {
    match step {
      Step::Signature => {
        if bytes != PNG_SIGNATURE {
          return Err(PngError::InvalidSignature);
        }
        self.input.request(8, false, Step::ChunkHeader)
      }
      Step::ChunkHeader => self.chunk_header(&bytes),
      Step::SkipChunk => self.input.request(8, false, Step::ChunkHeader),
      Step::Payload(kind) => {
        self.crc.update(&bytes);
        self.chunk_payload(kind, &bytes)?;
        self.input.request(4, false, Step::ChunkCrc)
      }
      Step::ImageData { remaining } => {
        self.crc.update(&bytes);
        log::trace!("IDAT slice of {} bytes", bytes.len());
        self.inflate(&bytes)?;
        let remaining = remaining - bytes.len();
        if remaining > 0 {
          self.input.request(remaining, true, Step::ImageData { remaining })
        } else {
          self.input.request(4, false, Step::ChunkCrc)
        }
      }
      Step::ChunkCrc => self.chunk_crc(&bytes),
    }
  }

  fn chunk_header(&mut self, bytes: &[u8]) -> PngResult<()> {
    let [l0, l1, l2, l3, t0, t1, t2, t3] = *bytes else { return Err(PngError::MalformedChunk) };
    let length = u32::from_be_bytes([l0, l1, l2, l3]);
    let ty = ChunkType([t0, t1, t2, t3]);
    log::trace!("chunk {ty:?} with length {length}");
    if length > MAX_CHUNK_LENGTH {
      return Err(PngError::ChunkTooLong);
    }
    if self.header.is_none() && ty != ChunkType::IHDR {
      return Err(PngError::MissingHeader);
    }
    let length = usize::try_from(length)?;
    self.chunk_ty = ty;
    self.crc = Crc32::new();
    self.crc.update(&ty.0);

    match KnownChunk::from_type(ty) {
      Some(KnownChunk::IDAT) => {
        if self.header.is_some_and(|h| h.is_indexed()) && self.palette.is_empty() {
          return Err(PngError::MissingPalette);
        }
        self.seen_idat = true;
        if length == 0 {
          self.input.request(4, false, Step::ChunkCrc)
        } else {
          self.input.request(length, true, Step::ImageData { remaining: length })
        }
      }
      Some(kind) => {
        kind.check_length(length as u32)?;
        self.input.request(length, false, Step::Payload(kind))
      }
      None if ty.is_ancillary() => {
        log::warn!("skipping unknown ancillary chunk {ty:?}");
        self.input.request(length + 4, false, Step::SkipChunk)
      }
      None => Err(PngError::UnsupportedChunk),
    }
  }

  fn chunk_payload(&mut self, kind: KnownChunk, data: &[u8]) -> PngResult<()> {
    match kind {
      KnownChunk::IHDR => {
        if self.header.is_some() {
          return Err(PngError::MalformedChunk);
        }
        let header = ImageHeader::parse(data)?;
        log::debug!("png header: {header:?}");
        let limit = self.options.max_dimension;
        if header.width > limit || header.height > limit {
          return Err(PngError::DimensionsTooLarge);
        }
        self.scanlines = Some(ScanlineDecoder::new(header.width, header.height, header.bpp())?);
        self.inflater = Some(ZlibInflater::new());
        self.header = Some(header);
        Ok(())
      }
      KnownChunk::PLTE => {
        self.palette.clear();
        self.palette.try_reserve_exact(data.len() / 3)?;
        self.palette.extend(data.chunks_exact(3).map(|rgb| [rgb[0], rgb[1], rgb[2], 0xFF]));
        log::debug!("palette with {} entries", self.palette.len());
        Ok(())
      }
      KnownChunk::tRNS => self.transparency_chunk(data),
      KnownChunk::gAMA => {
        let [g0, g1, g2, g3] = *data else { return Err(PngError::MalformedChunk) };
        let gamma = f64::from(u32::from_be_bytes([g0, g1, g2, g3])) / 100_000.0;
        log::debug!("gamma {gamma}");
        self.gamma = Some(gamma);
        Ok(())
      }
      KnownChunk::IEND => self.image_end(),
      KnownChunk::IDAT => Ok(()),
    }
  }

  fn transparency_chunk(&mut self, data: &[u8]) -> PngResult<()> {
    let Some(header) = self.header else { return Err(PngError::MissingHeader) };
    if header.is_indexed() {
      if self.palette.is_empty() {
        return Err(PngError::TransparencyBeforePalette);
      }
      if data.len() > self.palette.len() {
        return Err(PngError::TooManyTransparentEntries);
      }
      for (i, entry) in self.palette.iter_mut().enumerate() {
        entry[3] = data.get(i).copied().unwrap_or(0xFF);
      }
    } else {
      self.transparency = TransparencyKey::parse(header.color_type, data)?;
      if self.transparency.is_none() {
        log::warn!("ignoring tRNS for color type {}", header.color_type);
      }
    }
    Ok(())
  }

  fn inflate(&mut self, data: &[u8]) -> PngResult<()> {
    let (Some(inflater), Some(scanlines)) = (self.inflater.as_mut(), self.scanlines.as_mut()) else {
      return Err(PngError::MissingHeader);
    };
    inflater.write(data, |out| scanlines.write(out))
  }

  fn image_end(&mut self) -> PngResult<()> {
    if !self.seen_idat {
      return Err(PngError::MissingImageData);
    }
    let (Some(mut inflater), Some(mut scanlines)) = (self.inflater.take(), self.scanlines.take())
    else {
      return Err(PngError::MissingImageData);
    };
    inflater.finish(|out| scanlines.write(out))?;
    let palette = self.header.is_some_and(|h| h.is_indexed()).then_some(self.palette.as_slice());
    self.pixels = Some(scanlines.finish(palette)?);
    self.seen_iend = true;
    Ok(())
  }

  fn chunk_crc(&mut self, bytes: &[u8]) -> PngResult<()> {
    let [c0, c1, c2, c3] = *bytes else { return Err(PngError::MalformedChunk) };
    let declared = u32::from_be_bytes([c0, c1, c2, c3]);
    let actual = self.crc.finish();
    if declared != actual {
      if self.options.check_crc {
        let ty = self.chunk_ty;
        log::warn!("{ty:?} CRC mismatch: declared {declared:08X}, actual {actual:08X}");
        return Err(PngError::CrcMismatch);
      }
      log::debug!("accepting {:?} with a bad CRC", self.chunk_ty);
    }
    if self.seen_iend {
      self.input.close(None)
    } else {
      self.input.request(8, false, Step::ChunkHeader)
    }
  }
}

/// Decodes a complete PNG held in memory.
pub fn decode(bytes: &[u8], options: &DecodeOptions) -> PngResult<DecodedImage> {
  let mut decoder = Decoder::new(*options);
  decoder.push(bytes)?;
  decoder.finish()
}
