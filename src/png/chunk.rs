use core::fmt::{Debug, Write};

use crate::{PngError, PngResult};

/// The 8 bytes that every PNG stream starts with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// The largest chunk length a PNG may declare.
pub const MAX_CHUNK_LENGTH: u32 = (1 << 31) - 1;

/// A chunk's 4 byte type code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkType(pub [u8; 4]);
#[allow(nonstandard_style)]
impl ChunkType {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const tRNS: Self = Self(*b"tRNS");
  pub const gAMA: Self = Self(*b"gAMA");

  /// Ancillary chunks have bit 5 set in their first byte (a lowercase first
  /// letter). Decoders may skip these when they don't know them.
  #[inline]
  #[must_use]
  pub const fn is_ancillary(self) -> bool {
    (self.0[0] & 0x20) != 0
  }
}
impl Debug for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for b in self.0 {
      if b.is_ascii_alphabetic() {
        f.write_char(b as char)?;
      } else {
        write!(f, "\\x{b:02X}")?;
      }
    }
    Ok(())
  }
}

/// The chunk types that the decoder has handlers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(nonstandard_style)]
pub enum KnownChunk {
  IHDR,
  PLTE,
  tRNS,
  gAMA,
  IDAT,
  IEND,
}
impl KnownChunk {
  #[inline]
  #[must_use]
  pub const fn from_type(ty: ChunkType) -> Option<Self> {
    Some(match &ty.0 {
      b"IHDR" => Self::IHDR,
      b"PLTE" => Self::PLTE,
      b"tRNS" => Self::tRNS,
      b"gAMA" => Self::gAMA,
      b"IDAT" => Self::IDAT,
      b"IEND" => Self::IEND,
      _ => return None,
    })
  }

  /// Checks a declared payload length for this chunk type.
  ///
  /// `IDAT` and `tRNS` can't be judged without more context, so they always
  /// pass here.
  pub const fn check_length(self, length: u32) -> PngResult<()> {
    let ok = match self {
      Self::IHDR => length == 13,
      Self::gAMA => length == 4,
      Self::IEND => length == 0,
      Self::PLTE => {
        return if length == 0 || length % 3 != 0 || length > 256 * 3 {
          Err(PngError::InvalidPaletteLength)
        } else {
          Ok(())
        }
      }
      Self::tRNS | Self::IDAT => true,
    };
    if ok {
      Ok(())
    } else {
      Err(PngError::MalformedChunk)
    }
  }
}

/// The color flags packed into a PNG color type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorFlags {
  /// Pixels are palette indexes (bit 0).
  pub palette: bool,
  /// Pixels have color rather than just luma (bit 1).
  pub color: bool,
  /// Pixels carry an alpha channel (bit 2).
  pub alpha: bool,
}
impl ColorFlags {
  #[inline]
  #[must_use]
  pub const fn from_color_type(color_type: u8) -> Self {
    Self {
      palette: (color_type & 1) != 0,
      color: (color_type & 2) != 0,
      alpha: (color_type & 4) != 0,
    }
  }
}

/// The contents of an `IHDR` chunk.
///
/// A header that came from [`ImageHeader::parse`] has already been checked for
/// the formats this crate supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHeader {
  pub width: u32,
  pub height: u32,
  pub bit_depth: u8,
  pub color_type: u8,
  pub compression_method: u8,
  pub filter_method: u8,
  pub interlace_method: u8,
}
impl ImageHeader {
  /// The header the encoder always writes: 8-bit RGBA, no interlacing.
  #[inline]
  #[must_use]
  pub const fn rgba8(width: u32, height: u32) -> Self {
    Self {
      width,
      height,
      bit_depth: 8,
      color_type: 6,
      compression_method: 0,
      filter_method: 0,
      interlace_method: 0,
    }
  }

  /// Parses and validates a 13 byte `IHDR` payload.
  pub fn parse(data: &[u8]) -> PngResult<Self> {
    let data: &[u8; 13] = data.try_into().map_err(|_| PngError::MalformedChunk)?;
    let [w0, w1, w2, w3, h0, h1, h2, h3, rest @ ..] = *data;
    let [bit_depth, color_type, compression_method, filter_method, interlace_method] = rest;
    let header = Self {
      width: u32::from_be_bytes([w0, w1, w2, w3]),
      height: u32::from_be_bytes([h0, h1, h2, h3]),
      bit_depth,
      color_type,
      compression_method,
      filter_method,
      interlace_method,
    };
    header.validate()?;
    Ok(header)
  }

  /// Checks this header against what the codec supports.
  pub const fn validate(&self) -> PngResult<()> {
    if self.bit_depth != 8 {
      Err(PngError::UnsupportedBitDepth)
    } else if !matches!(self.color_type, 0 | 2 | 3 | 4 | 6) {
      Err(PngError::UnsupportedColorType)
    } else if self.compression_method != 0 {
      Err(PngError::UnsupportedCompressionMethod)
    } else if self.filter_method != 0 {
      Err(PngError::UnsupportedFilterMethod)
    } else if self.interlace_method != 0 {
      Err(PngError::UnsupportedInterlaceMethod)
    } else if self.width == 0 || self.height == 0 {
      Err(PngError::InvalidDimensions)
    } else {
      Ok(())
    }
  }

  /// The 13 byte `IHDR` payload for this header.
  #[inline]
  #[must_use]
  pub const fn to_bytes(&self) -> [u8; 13] {
    let [w0, w1, w2, w3] = self.width.to_be_bytes();
    let [h0, h1, h2, h3] = self.height.to_be_bytes();
    [
      w0,
      w1,
      w2,
      w3,
      h0,
      h1,
      h2,
      h3,
      self.bit_depth,
      self.color_type,
      self.compression_method,
      self.filter_method,
      self.interlace_method,
    ]
  }

  /// Bytes per pixel in the filtered data.
  #[inline]
  #[must_use]
  pub const fn bpp(&self) -> usize {
    match self.color_type {
      0 | 3 => 1,
      4 => 2,
      2 => 3,
      _ => 4,
    }
  }

  #[inline]
  #[must_use]
  pub const fn color_flags(&self) -> ColorFlags {
    ColorFlags::from_color_type(self.color_type)
  }

  #[inline]
  #[must_use]
  pub const fn is_indexed(&self) -> bool {
    self.color_type == 3
  }
}

/// Image info made available once the header is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Metadata {
  pub width: u32,
  pub height: u32,
  pub palette: bool,
  pub color: bool,
  pub alpha: bool,
}
impl From<&ImageHeader> for Metadata {
  #[inline]
  fn from(header: &ImageHeader) -> Self {
    let ColorFlags { palette, color, alpha } = header.color_flags();
    Self { width: header.width, height: header.height, palette, color, alpha }
  }
}

/// The single transparent color a `tRNS` chunk gives a non-indexed image.
///
/// This is reported but never applied to the decoded pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransparencyKey {
  Gray(u16),
  Rgb(u16, u16, u16),
}
impl TransparencyKey {
  /// Reads the key for a greyscale (0) or RGB (2) image. Other color types
  /// don't have a key and give `Ok(None)`.
  pub fn parse(color_type: u8, data: &[u8]) -> PngResult<Option<Self>> {
    match (color_type, data) {
      (0, [g0, g1]) => Ok(Some(Self::Gray(u16::from_be_bytes([*g0, *g1])))),
      (2, [r0, r1, g0, g1, b0, b1]) => Ok(Some(Self::Rgb(
        u16::from_be_bytes([*r0, *r1]),
        u16::from_be_bytes([*g0, *g1]),
        u16::from_be_bytes([*b0, *b1]),
      ))),
      (0 | 2, _) => Err(PngError::MalformedChunk),
      _ => Ok(None),
    }
  }
}
