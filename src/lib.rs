//! Display core of a Palm OS device emulator.
//!
//! Covers the pieces between emulated LCD memory and a host window:
//! region algebra, pixel maps with format conversion and color
//! quantization, chunked session files, skins, and the window paint
//! pipeline that decides what to redraw each idle tick.

pub mod chunk;
pub mod env;
pub mod error;
pub mod geometry;
pub mod host;
pub mod pixmap;
pub mod quantizer;
pub mod region;
pub mod regs;
pub mod screen;
pub mod session;
pub mod skin;
pub mod window;

pub use error::{CoreError, Result};
