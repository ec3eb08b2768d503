use pngstream::png::*;

#[test]
fn test_filter_unfilter_inverse() {
  for bpp in [1, 2, 3, 4] {
    let prev = super::rand_bytes(bpp * 17);
    let row = super::rand_bytes(bpp * 17);
    for filter in FilterType::ALL {
      for above in [None, Some(prev.as_slice())] {
        let mut line = vec![0; row.len()];
        filter_scanline(filter, &row, above, bpp, &mut line);
        unfilter_scanline(filter, &mut line, above, bpp);
        assert_eq!(line, row, "filter {filter:?}, bpp {bpp}, above {}", above.is_some());
      }
    }
  }
}

#[test]
fn test_edge_neighbors_are_zero() {
  // with no row above, Up is the same as None
  let row = [5, 200, 17, 3];
  let mut up = [0; 4];
  filter_scanline(FilterType::Up, &row, None, 2, &mut up);
  assert_eq!(up, row);
  // the first pixel of a Sub line is unchanged, the rest subtract with wrap
  let mut sub = [0; 4];
  filter_scanline(FilterType::Sub, &row, None, 2, &mut sub);
  assert_eq!(sub, [5, 200, 12, 3_u8.wrapping_sub(200)]);
}

#[test]
fn test_paeth_predictor_tie_order() {
  for a in [0, 1, 127, 255] {
    assert_eq!(paeth_predictor(a, a, a), a);
  }
  assert_eq!(paeth_predictor(10, 10, 0), 10);
}

#[test]
fn test_adaptive_picks_up() {
  let row0 = [100_u8; 8];
  let row1 = [99, 99, 99, 99, 101, 101, 101, 101];
  let pixels: Vec<u8> = row0.iter().chain(row1.iter()).copied().collect();
  assert_eq!(scanline_cost(FilterType::Up, &row1, Some(&row0), 4), 8);
  assert_eq!(scanline_cost(FilterType::Paeth, &row1, Some(&row0), 4), 12);
  let filtered = FilterEngine::new(2, 2, 4, FilterSelection::Adaptive).filter(&pixels).unwrap();
  assert_eq!(filtered.len(), 2 * 9);
  // the first row ties Sub with Paeth, and the earlier candidate wins
  assert_eq!(filtered[0], FilterType::Sub as u8);
  assert_eq!(filtered[9], FilterType::Up as u8);
  assert_eq!(&filtered[10..], &[255, 255, 255, 255, 1, 1, 1, 1]);
}

#[test]
fn test_fixed_filter_is_used_everywhere() {
  let pixels = super::rand_bytes(4 * 5 * 3);
  let engine = FilterEngine::new(5, 3, 4, FilterSelection::Fixed(FilterType::Average));
  let filtered = engine.filter(&pixels).unwrap();
  for line in filtered.chunks_exact(1 + 4 * 5) {
    assert_eq!(line[0], FilterType::Average as u8);
  }
}

#[test]
fn test_filter_engine_rejects_wrong_length() {
  let engine = FilterEngine::new(2, 2, 4, FilterSelection::Adaptive);
  assert_eq!(engine.filter(&[0; 15]), Err(pngstream::PngError::PixelBufferLengthMismatch));
}

#[test]
fn test_scanline_decoder_round_trip() {
  let (width, height) = (7, 5);
  let pixels = super::rand_bytes(width * height * 4);
  let engine = FilterEngine::new(width as u32, height as u32, 4, FilterSelection::Adaptive);
  let filtered = engine.filter(&pixels).unwrap();
  let mut decoder = ScanlineDecoder::new(width as u32, height as u32, 4).unwrap();
  for piece in filtered.chunks(11) {
    decoder.write(piece).unwrap();
  }
  assert!(decoder.is_complete());
  assert_eq!(decoder.finish(None).unwrap(), pixels);
}

#[test]
fn test_scanline_decoder_rejects_bad_filter_byte() {
  let mut decoder = ScanlineDecoder::new(1, 1, 3).unwrap();
  assert_eq!(decoder.write(&[5, 1, 2, 3]), Err(pngstream::PngError::InvalidFilterType(5)));
}
