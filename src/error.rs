use core::{fmt, num::TryFromIntError};

/// An error from the `pngstream` crate.
///
/// Every error is fatal to the session that raised it. After a session has
/// failed it keeps returning the same error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PngError {
  /// The first 8 bytes aren't the PNG signature.
  InvalidSignature,
  /// The first chunk wasn't `IHDR`.
  MissingHeader,
  /// Only bit depth 8 is supported.
  UnsupportedBitDepth,
  /// Color type not in `{0, 2, 3, 4, 6}`.
  UnsupportedColorType,
  /// Compression method other than 0.
  UnsupportedCompressionMethod,
  /// Filter method other than 0.
  UnsupportedFilterMethod,
  /// Interlace method other than 0.
  UnsupportedInterlaceMethod,
  /// A critical chunk type that this crate doesn't know about.
  UnsupportedChunk,
  /// A chunk's CRC didn't match the CRC of its type and payload.
  CrcMismatch,
  /// An indexed image reached `IDAT` without a palette.
  MissingPalette,
  /// An indexed image got `tRNS` before `PLTE`.
  TransparencyBeforePalette,
  /// `tRNS` has more entries than the palette.
  TooManyTransparentEntries,
  /// The stream was closed while reads were still waiting for bytes.
  PendingReadsOnClose,
  /// Bytes were pushed after the stream was closed.
  WriteAfterClose,
  /// A read was requested after the buffer was disposed.
  ReadAfterDispose,

  /// A chunk declared a length above `2^31 - 1`.
  ChunkTooLong,
  /// A known chunk had the wrong payload length for its type.
  MalformedChunk,
  /// `PLTE` was empty, not a multiple of 3, or over 256 entries.
  InvalidPaletteLength,
  /// The width or height is 0.
  InvalidDimensions,
  /// The width or height is over the decoder's configured limit, which keeps
  /// a tiny header from claiming a huge pixel buffer.
  DimensionsTooLarge,
  /// A scanline started with a filter type byte above 4.
  InvalidFilterType(u8),
  /// An indexed pixel points past the end of the palette.
  InvalidPaletteIndex(u8),
  /// `IEND` arrived without any `IDAT` before it.
  MissingImageData,
  /// The decompressed image data continues after the last scanline.
  TooMuchImageData,
  /// The zlib stream inside the `IDAT` chunks is corrupt or truncated.
  Decompression,
  /// The compressor stopped making progress.
  Compression,
  /// The pixel buffer to encode isn't `width * height * 4` bytes.
  PixelBufferLengthMismatch,

  /// A checked math operation failed.
  CheckedMath,
  /// The allocator couldn't give us enough space.
  AllocationFailed,
}

/// Alias for a result with a [`PngError`].
pub type PngResult<T> = Result<T, PngError>;

impl fmt::Display for PngError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::InvalidSignature => f.write_str("invalid PNG signature"),
      Self::MissingHeader => f.write_str("expected IHDR as the first chunk"),
      Self::UnsupportedBitDepth => f.write_str("unsupported bit depth"),
      Self::UnsupportedColorType => f.write_str("unsupported color type"),
      Self::UnsupportedCompressionMethod => f.write_str("unsupported compression method"),
      Self::UnsupportedFilterMethod => f.write_str("unsupported filter method"),
      Self::UnsupportedInterlaceMethod => f.write_str("unsupported interlace method"),
      Self::UnsupportedChunk => f.write_str("unsupported critical chunk"),
      Self::CrcMismatch => f.write_str("chunk CRC mismatch"),
      Self::MissingPalette => f.write_str("indexed image data without a palette"),
      Self::TransparencyBeforePalette => f.write_str("transparency chunk before palette"),
      Self::TooManyTransparentEntries => {
        f.write_str("more transparency entries than palette entries")
      }
      Self::PendingReadsOnClose => f.write_str("reads pending on finished stream"),
      Self::WriteAfterClose => f.write_str("write after the stream was closed"),
      Self::ReadAfterDispose => f.write_str("read after the stream was disposed"),
      Self::ChunkTooLong => f.write_str("chunk length over 2^31 - 1"),
      Self::MalformedChunk => f.write_str("chunk has the wrong length for its type"),
      Self::InvalidPaletteLength => f.write_str("invalid palette length"),
      Self::InvalidDimensions => f.write_str("width and height must be non-zero"),
      Self::DimensionsTooLarge => f.write_str("width or height over the decoder's limit"),
      Self::InvalidFilterType(t) => write!(f, "invalid scanline filter type {t}"),
      Self::InvalidPaletteIndex(i) => write!(f, "palette index {i} is out of range"),
      Self::MissingImageData => f.write_str("no image data before IEND"),
      Self::TooMuchImageData => f.write_str("image data continues past the last scanline"),
      Self::Decompression => f.write_str("zlib decompression failed"),
      Self::Compression => f.write_str("zlib compression failed"),
      Self::PixelBufferLengthMismatch => {
        f.write_str("pixel buffer length doesn't match width and height")
      }
      Self::CheckedMath => f.write_str("a checked math operation failed"),
      Self::AllocationFailed => f.write_str("allocation failed"),
    }
  }
}

impl core::error::Error for PngError {}

impl From<alloc::collections::TryReserveError> for PngError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::AllocationFailed
  }
}
impl From<TryFromIntError> for PngError {
  #[inline]
  fn from(_: TryFromIntError) -> Self {
    Self::CheckedMath
  }
}
