//! Holds all the tools for decoding and encoding PNG data.
//!
//! The general format of a PNG is that the information is stored in "chunks".
//! Each chunk is a big-endian length, a 4 byte type, the payload, and a CRC
//! of the type and payload. There's four "critical" chunk types:
//! * **Header** (`IHDR`) - The image's dimensions and pixel format. It must be
//!   the first chunk.
//! * **Palette** (`PLTE`) - If an image uses indexed color it will have a
//!   palette of what index values map to what `RGB8` values.
//! * **Image Data** (`IDAT`) - One or more chunks of compressed data. All of
//!   the compressed data forms a single zlib data stream.
//! * **End** (`IEND`) - The last chunk, lets you know you had the full PNG and
//!   your data wasn't truncated accidentally.
//!
//! The decoder also understands the `tRNS` and `gAMA` ancillary chunks, and
//! skips any other ancillary chunk. Any other critical chunk is an error.
//!
//! ## Decoding
//!
//! ```
//! use pngstream::png::*;
//! # let png = encode(&[255; 4], 1, 1, &EncodeOptions::default()).unwrap();
//! let mut decoder = Decoder::new(DecodeOptions::default());
//! for piece in png.chunks(7) {
//!   decoder.push(piece).unwrap();
//! }
//! let image = decoder.finish().unwrap();
//! assert_eq!(image.pixels, [255, 255, 255, 255]);
//! ```
//!
//! When storing the PNG, the raw pixel values are first "filtered" (to try and
//! make them more compression-friendly), and then compressed into a Zlib data
//! stream. The decoder reverses both as the data arrives, and expands every
//! color type into RGBA8.
//!
//! ## Encoding
//!
//! The [`Packer`] always writes 8-bit RGBA. Each scanline gets whichever
//! filter gives it the smallest residuals, unless
//! [`EncodeOptions::filter`] picks one fixed filter.

mod chunk;
pub use chunk::*;

mod crc32;
pub use crc32::*;

mod filter;
pub use filter::*;

mod options;
pub use options::*;

mod packer;
pub use packer::*;

mod parser;
pub use parser::*;

mod zlib;
pub use zlib::*;
