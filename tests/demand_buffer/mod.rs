use pngstream::{DemandBuffer, PngError};

#[test]
fn test_DemandBuffer_exact_reads_ignore_push_boundaries() {
  let mut buf = DemandBuffer::new();
  buf.push(vec![0, 1, 2]).unwrap();
  buf.push(vec![3, 4, 5, 6, 7]).unwrap();
  buf.push(vec![8, 9]).unwrap();
  buf.request(4, false, "first").unwrap();
  buf.request(6, false, "second").unwrap();
  assert_eq!(buf.pop_ready().unwrap(), Some(("first", vec![0, 1, 2, 3])));
  assert_eq!(buf.pop_ready().unwrap(), Some(("second", vec![4, 5, 6, 7, 8, 9])));
  assert_eq!(buf.pop_ready().unwrap(), None);
  assert_eq!(buf.buffered(), 0);
}

#[test]
fn test_DemandBuffer_reads_before_pushes() {
  let mut buf = DemandBuffer::new();
  buf.request(4, false, 0).unwrap();
  buf.request(6, false, 1).unwrap();
  let mut got = Vec::new();
  for block in [vec![0, 1, 2], vec![3, 4, 5, 6, 7], vec![8, 9]] {
    buf.push(block).unwrap();
    while let Some(read) = buf.pop_ready().unwrap() {
      got.push(read);
    }
  }
  assert_eq!(got, vec![(0, vec![0, 1, 2, 3]), (1, vec![4, 5, 6, 7, 8, 9])]);
}

#[test]
fn test_DemandBuffer_backpressure() {
  let mut buf = DemandBuffer::new();
  assert!(!buf.is_paused());
  buf.push(vec![1, 2]).unwrap();
  assert!(buf.is_paused());
  assert!(!buf.take_drain_signal());
  buf.request(2, false, ()).unwrap();
  assert!(!buf.is_paused());
  assert!(buf.take_drain_signal());
  // the signal only fires once
  assert!(!buf.take_drain_signal());
  // a push that has demand waiting doesn't pause
  buf.request(1, false, ()).unwrap();
  buf.push(vec![3]).unwrap();
  assert!(!buf.is_paused());
}

#[test]
fn test_DemandBuffer_close_with_pending_reads() {
  let mut buf = DemandBuffer::new();
  buf.request(4, false, ()).unwrap();
  buf.close(Some(vec![1, 2, 3])).unwrap();
  assert!(!buf.is_finished());
  assert_eq!(buf.pop_ready(), Err(PngError::PendingReadsOnClose));
  assert!(buf.is_disposed());
}

#[test]
fn test_DemandBuffer_close_drains_then_finishes() {
  let mut buf = DemandBuffer::new();
  buf.request(2, false, ()).unwrap();
  buf.close(Some(vec![1, 2, 3])).unwrap();
  assert_eq!(buf.pop_ready().unwrap(), Some(((), vec![1, 2])));
  assert_eq!(buf.pop_ready().unwrap(), None);
  assert!(buf.is_finished());
  assert_eq!(buf.buffered(), 0);
}

#[test]
fn test_DemandBuffer_close_without_reads_finishes_now() {
  let mut buf = DemandBuffer::<()>::new();
  buf.push(vec![1]).unwrap();
  buf.close(None).unwrap();
  assert!(buf.is_finished());
  assert_eq!(buf.push(vec![2]), Err(PngError::WriteAfterClose));
}

#[test]
fn test_DemandBuffer_dispose() {
  let mut buf = DemandBuffer::new();
  buf.push(vec![1, 2, 3]).unwrap();
  buf.request(10, false, ()).unwrap();
  buf.dispose();
  buf.dispose();
  assert_eq!(buf.pending_reads(), 0);
  assert_eq!(buf.buffered(), 0);
  assert_eq!(buf.pop_ready().unwrap(), None);
  assert_eq!(buf.request(1, true, ()), Err(PngError::ReadAfterDispose));
  assert_eq!(buf.push(vec![1]), Err(PngError::WriteAfterClose));
}

#[test]
fn test_DemandBuffer_random_splits() {
  let data = super::rand_bytes(1000);
  let cuts = super::rand_bytes(64);
  let mut buf = DemandBuffer::new();
  let mut pos = 0;
  for cut in cuts.iter() {
    let end = (pos + usize::from(*cut)).min(data.len());
    buf.push(data[pos..end].to_vec()).unwrap();
    pos = end;
  }
  buf.push(data[pos..].to_vec()).unwrap();
  let mut out = Vec::new();
  for len in [1, 7, 100, 0, 392, 500] {
    buf.request(len, false, len).unwrap();
    let (token, bytes) = buf.pop_ready().unwrap().unwrap();
    assert_eq!(token, len);
    assert_eq!(bytes.len(), len);
    out.extend(bytes);
  }
  assert_eq!(out, data);
}
