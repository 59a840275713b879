// Deterministic per-series colors

use md5::{Digest, Md5};
use std::fmt;

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// `#rrggbb`
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

/// Color for a series name: the first six hex digits of the MD5 digest of
/// the name's UTF-8 bytes. Pure and stable across runs. Distinct names may
/// collide; that is accepted.
pub fn color_for(name: &str) -> Rgb {
    let digest = Md5::digest(name.as_bytes());
    Rgb {
        r: digest[0],
        g: digest[1],
        b: digest[2],
    }
}
