//! Scanline filtering, both directions.
//!
//! From the W3C PNG standard:
//!
//! > Filters are applied to **bytes**, not to pixels, regardless of the bit
//! > depth or color type of the image.
//!
//! Each filter predicts a byte from the byte to its left (`a`, one *pixel*
//! back), the byte above it (`b`) and the byte above and to the left (`c`).
//! Any neighbor that would fall outside the image counts as 0.

use alloc::vec::Vec;

use crate::{DemandBuffer, PngError, PngResult};

/// The per-scanline filter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum FilterType {
  None = 0,
  Sub = 1,
  Up = 2,
  Average = 3,
  Paeth = 4,
}
impl FilterType {
  /// All five filters, in type order.
  pub const ALL: [Self; 5] = [Self::None, Self::Sub, Self::Up, Self::Average, Self::Paeth];

  /// The value this filter predicts for a byte.
  #[inline]
  #[must_use]
  pub const fn predict(self, a: u8, b: u8, c: u8) -> u8 {
    match self {
      Self::None => 0,
      Self::Sub => a,
      Self::Up => b,
      Self::Average => ((a as u16 + b as u16) >> 1) as u8,
      Self::Paeth => paeth_predictor(a, b, c),
    }
  }
}
impl TryFrom<u8> for FilterType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => Self::None,
      1 => Self::Sub,
      2 => Self::Up,
      3 => Self::Average,
      4 => Self::Paeth,
      other => return Err(PngError::InvalidFilterType(other)),
    })
  }
}

/// The Paeth filter function computes a simple linear function of the three
/// neighboring pixels (left `a`, above `b`, upper left `c`).
///
/// The output is the "predictor" of the neighboring pixel closest to the
/// computed value. Ties go to `a`, then to `b`.
#[inline]
#[must_use]
pub const fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
  // The PNG standard says "The calculations within the PaethPredictor function
  // shall be performed exactly, without overflow.", so this is in i32.
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Gets the `(a, b, c)` neighbors of byte `i`.
#[inline]
fn neighbors(row: &[u8], prev: Option<&[u8]>, i: usize, bpp: usize) -> (u8, u8, u8) {
  let a = if i >= bpp { row[i - bpp] } else { 0 };
  let (b, c) = match prev {
    Some(prev) => (prev[i], if i >= bpp { prev[i - bpp] } else { 0 }),
    None => (0, 0),
  };
  (a, b, c)
}

/// Sum of how far each byte is from its prediction.
///
/// This is done exactly (not mod 256) so that it measures the size of the
/// residuals the way a compressor sees them. Lower is better.
#[must_use]
pub fn scanline_cost(filter: FilterType, row: &[u8], prev: Option<&[u8]>, bpp: usize) -> u64 {
  (0..row.len())
    .map(|i| {
      let (a, b, c) = neighbors(row, prev, i, bpp);
      u64::from(row[i].abs_diff(filter.predict(a, b, c)))
    })
    .sum()
}

/// Writes the filtered form of `row` into `out`.
///
/// `out` must be the same length as `row`, and `prev` (when present) too.
pub fn filter_scanline(
  filter: FilterType, row: &[u8], prev: Option<&[u8]>, bpp: usize, out: &mut [u8],
) {
  debug_assert_eq!(row.len(), out.len());
  for (i, o) in out.iter_mut().enumerate() {
    let (a, b, c) = neighbors(row, prev, i, bpp);
    *o = row[i].wrapping_sub(filter.predict(a, b, c));
  }
}

/// Undoes a filter, in place.
///
/// `prev` is the already reconstructed line above, if any.
pub fn unfilter_scanline(filter: FilterType, line: &mut [u8], prev: Option<&[u8]>, bpp: usize) {
  match (filter, prev) {
    (FilterType::None, _) | (FilterType::Up, None) => (),
    (FilterType::Sub, _) | (FilterType::Average, None) | (FilterType::Paeth, None) => {
      // Note: with no line above, Average and Paeth only depend on `a`. Paeth
      // gives `a` outright, Average gives half of it.
      let halve = filter == FilterType::Average;
      for i in bpp..line.len() {
        let a = line[i - bpp];
        line[i] = line[i].wrapping_add(if halve { a >> 1 } else { a });
      }
    }
    (FilterType::Up, Some(prev)) => {
      line.iter_mut().zip(prev).for_each(|(x, b)| *x = x.wrapping_add(*b));
    }
    (FilterType::Average, Some(prev)) | (FilterType::Paeth, Some(prev)) => {
      for i in 0..line.len() {
        let (a, b, c) = neighbors(line, Some(prev), i, bpp);
        line[i] = line[i].wrapping_add(filter.predict(a, b, c));
      }
    }
  }
}

/// Which filters the encoder is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterSelection {
  /// Try all five per scanline and keep the cheapest.
  #[default]
  Adaptive,
  /// Always use this one filter.
  Fixed(FilterType),
}
impl FilterSelection {
  #[inline]
  #[must_use]
  pub fn candidates(self) -> &'static [FilterType] {
    match self {
      Self::Adaptive => &FilterType::ALL,
      Self::Fixed(FilterType::None) => &[FilterType::None],
      Self::Fixed(FilterType::Sub) => &[FilterType::Sub],
      Self::Fixed(FilterType::Up) => &[FilterType::Up],
      Self::Fixed(FilterType::Average) => &[FilterType::Average],
      Self::Fixed(FilterType::Paeth) => &[FilterType::Paeth],
    }
  }
}

/// The encode side: turns whole pixel rows into filtered scanlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterEngine {
  width: usize,
  height: usize,
  bpp: usize,
  candidates: &'static [FilterType],
}
impl FilterEngine {
  #[inline]
  #[must_use]
  pub fn new(width: u32, height: u32, bpp: usize, selection: FilterSelection) -> Self {
    Self { width: width as usize, height: height as usize, bpp, candidates: selection.candidates() }
  }

  /// Filters a full image of unfiltered rows.
  ///
  /// Output is `height` scanlines of `1 + width * bpp` bytes, each led by the
  /// filter type that was chosen for it.
  pub fn filter(&self, pixels: &[u8]) -> PngResult<Vec<u8>> {
    let row_len = self.width.checked_mul(self.bpp).ok_or(PngError::CheckedMath)?;
    if row_len == 0 {
      return Err(PngError::InvalidDimensions);
    }
    let total =
      row_len.checked_add(1).and_then(|l| l.checked_mul(self.height)).ok_or(PngError::CheckedMath)?;
    if pixels.len() != row_len * self.height {
      return Err(PngError::PixelBufferLengthMismatch);
    }
    let mut out = Vec::new();
    out.try_reserve_exact(total)?;
    out.resize(total, 0);
    let mut prev: Option<&[u8]> = None;
    for (row, line) in pixels.chunks_exact(row_len).zip(out.chunks_exact_mut(row_len + 1)) {
      let filter = self.choose(row, prev);
      let (filter_byte, data) = line.split_at_mut(1);
      filter_byte[0] = filter as u8;
      filter_scanline(filter, row, prev, self.bpp, data);
      prev = Some(row);
    }
    Ok(out)
  }

  /// Measures every candidate, keeping the first one with the lowest cost.
  fn choose(&self, row: &[u8], prev: Option<&[u8]>) -> FilterType {
    let mut best = FilterType::None;
    let mut best_cost = u64::MAX;
    for &filter in self.candidates {
      let cost = scanline_cost(filter, row, prev, self.bpp);
      if cost < best_cost {
        best = filter;
        best_cost = cost;
      }
    }
    best
  }
}

/// For each RGBA output channel, which filtered channel it copies from. `None`
/// channels are set to `0xFF`.
const fn channel_map(bpp: usize) -> [Option<usize>; 4] {
  match bpp {
    1 => [Some(0), Some(0), Some(0), None],
    2 => [Some(0), Some(0), Some(0), Some(1)],
    3 => [Some(0), Some(1), Some(2), None],
    _ => [Some(0), Some(1), Some(2), Some(3)],
  }
}

/// The decode side: takes decompressed image data in pieces of any size and
/// fills in an RGBA8 pixel buffer one scanline at a time.
///
/// This owns the pixel buffer until [`finish`](Self::finish) hands it back.
#[derive(Debug, Clone)]
pub struct ScanlineDecoder {
  width: usize,
  height: usize,
  bpp: usize,
  line_len: usize,
  row: usize,
  previous: Vec<u8>,
  pixels: Vec<u8>,
  input: DemandBuffer<()>,
}
impl ScanlineDecoder {
  /// Allocates the pixel buffer for the image.
  pub fn new(width: u32, height: u32, bpp: usize) -> PngResult<Self> {
    if !(1..=4).contains(&bpp) {
      return Err(PngError::UnsupportedColorType);
    }
    let width = usize::try_from(width)?;
    let height = usize::try_from(height)?;
    let line_len =
      width.checked_mul(bpp).and_then(|l| l.checked_add(1)).ok_or(PngError::CheckedMath)?;
    let pixel_count =
      width.checked_mul(height).and_then(|c| c.checked_mul(4)).ok_or(PngError::CheckedMath)?;
    let mut pixels = Vec::new();
    pixels.try_reserve_exact(pixel_count)?;
    pixels.resize(pixel_count, 0);
    let mut previous = Vec::new();
    previous.try_reserve_exact(line_len - 1)?;
    let input = DemandBuffer::with_request(line_len, false, ());
    Ok(Self { width, height, bpp, line_len, row: 0, previous, pixels, input })
  }

  /// If every scanline has been reconstructed.
  #[inline]
  #[must_use]
  pub const fn is_complete(&self) -> bool {
    self.row == self.height
  }

  /// Feeds decompressed bytes in.
  ///
  /// ## Failure
  /// * [`PngError::TooMuchImageData`] for any bytes past the last scanline.
  /// * [`PngError::InvalidFilterType`] for a bad filter type byte.
  pub fn write(&mut self, bytes: &[u8]) -> PngResult<()> {
    if bytes.is_empty() {
      return Ok(());
    }
    if self.is_complete() {
      return Err(PngError::TooMuchImageData);
    }
    self.input.push(bytes.to_vec())?;
    while let Some(((), line)) = self.input.pop_ready()? {
      self.reconstruct(line)?;
      if self.is_complete() {
        if self.input.buffered() > 0 {
          return Err(PngError::TooMuchImageData);
        }
      } else {
        self.input.request(self.line_len, false, ())?;
      }
    }
    Ok(())
  }

  fn reconstruct(&mut self, mut line: Vec<u8>) -> PngResult<()> {
    let filter = FilterType::try_from(line[0])?;
    let data = &mut line[1..];
    let prev = if self.row == 0 { None } else { Some(self.previous.as_slice()) };
    unfilter_scanline(filter, data, prev, self.bpp);

    let map = channel_map(self.bpp);
    let start = self.row * self.width * 4;
    let out_row = &mut self.pixels[start..start + self.width * 4];
    for (px, src) in out_row.chunks_exact_mut(4).zip(data.chunks_exact(self.bpp)) {
      for (channel, source) in px.iter_mut().zip(map) {
        *channel = match source {
          Some(i) => src[i],
          None => 0xFF,
        };
      }
    }

    self.previous.clear();
    self.previous.extend_from_slice(data);
    self.row += 1;
    Ok(())
  }

  /// Ends the input and gives back the pixels.
  ///
  /// When `palette` is given, every pixel holds an index in its red channel at
  /// this point, and that gets replaced by the palette entry.
  ///
  /// ## Failure
  /// * [`PngError::PendingReadsOnClose`] when scanlines are still missing.
  /// * [`PngError::InvalidPaletteIndex`] for an index past the palette's end.
  pub fn finish(mut self, palette: Option<&[[u8; 4]]>) -> PngResult<Vec<u8>> {
    self.input.close(None)?;
    if self.input.pop_ready()?.is_some() || !self.is_complete() {
      return Err(PngError::PendingReadsOnClose);
    }
    if let Some(palette) = palette {
      let pixels: &mut [[u8; 4]] = bytemuck::try_cast_slice_mut(self.pixels.as_mut_slice())
        .map_err(|_| PngError::CheckedMath)?;
      for px in pixels.iter_mut() {
        let index = px[0];
        *px = *palette.get(usize::from(index)).ok_or(PngError::InvalidPaletteIndex(index))?;
      }
    }
    Ok(self.pixels)
  }
}
