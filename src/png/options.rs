use super::filter::{FilterSelection, FilterType};

/// Settings for a [`Decoder`](super::Decoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodeOptions {
  /// Reject chunks whose CRC doesn't match. On by default.
  pub check_crc: bool,
  /// The largest width or height the decoder will allocate pixels for.
  /// Defaults to [`DecodeOptions::DEFAULT_MAX_DIMENSION`].
  pub max_dimension: u32,
}
impl Default for DecodeOptions {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
impl DecodeOptions {
  /// 17,000 pixels per side, a little over 1 GiB of RGBA8 at most.
  pub const DEFAULT_MAX_DIMENSION: u32 = 17_000;

  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self { check_crc: true, max_dimension: Self::DEFAULT_MAX_DIMENSION }
  }

  #[inline]
  #[must_use]
  pub const fn with_check_crc(self, check_crc: bool) -> Self {
    Self { check_crc, ..self }
  }

  #[inline]
  #[must_use]
  pub const fn with_max_dimension(self, max_dimension: u32) -> Self {
    Self { max_dimension, ..self }
  }
}

/// The zlib compression strategies, with zlib's numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DeflateStrategy {
  Default = 0,
  Filtered = 1,
  HuffmanOnly = 2,
  /// Run length encoding only. Well suited to filtered image rows.
  #[default]
  Rle = 3,
  Fixed = 4,
}

/// Settings for a [`Packer`](super::Packer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodeOptions {
  pub filter: FilterSelection,
  /// Upper bound on the size of each `IDAT` payload. Values below
  /// [`EncodeOptions::MIN_CHUNK_SIZE`] are raised to it.
  pub deflate_chunk_size: usize,
  /// 0 (store only) through 10 (slowest).
  pub deflate_level: u8,
  pub deflate_strategy: DeflateStrategy,
}
impl Default for EncodeOptions {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
impl EncodeOptions {
  /// The smallest `IDAT` payload size the packer will use.
  pub const MIN_CHUNK_SIZE: usize = 64;

  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self {
      filter: FilterSelection::Adaptive,
      deflate_chunk_size: 32 * 1024,
      deflate_level: 9,
      deflate_strategy: DeflateStrategy::Rle,
    }
  }

  #[inline]
  #[must_use]
  pub const fn with_filter(self, filter: FilterSelection) -> Self {
    Self { filter, ..self }
  }

  /// Shorthand for `with_filter(FilterSelection::Fixed(filter))`.
  #[inline]
  #[must_use]
  pub const fn with_fixed_filter(self, filter: FilterType) -> Self {
    self.with_filter(FilterSelection::Fixed(filter))
  }

  #[inline]
  #[must_use]
  pub const fn with_deflate_chunk_size(self, deflate_chunk_size: usize) -> Self {
    Self { deflate_chunk_size, ..self }
  }

  #[inline]
  #[must_use]
  pub const fn with_deflate_level(self, deflate_level: u8) -> Self {
    Self { deflate_level, ..self }
  }

  #[inline]
  #[must_use]
  pub const fn with_deflate_strategy(self, deflate_strategy: DeflateStrategy) -> Self {
    Self { deflate_strategy, ..self }
  }
}
