//! Individual preprocessing steps

pub mod decode;
pub mod encode;
pub mod grayscale;
pub mod resize;
