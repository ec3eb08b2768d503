#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![forbid(unsafe_code)]

//! A streaming PNG codec.
//!
//! Decoding accepts PNG bytes in pushes of any size and produces a flat RGBA8
//! pixel buffer. Encoding takes an RGBA8 pixel buffer and produces a complete
//! PNG byte stream, one chunk at a time.
//!
//! * [`png::Decoder`] is the push-driven decode session.
//! * [`png::Packer`] is the encoder.
//! * [`DemandBuffer`] is the byte queue both of the decode stages pull from.
//!
//! Only 8-bit, non-interlaced images are supported. Every supported color type
//! decodes into 4 bytes per pixel.

extern crate alloc;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

mod error;
pub use error::*;

pub mod demand_buffer;
pub use demand_buffer::DemandBuffer;

pub mod png;
