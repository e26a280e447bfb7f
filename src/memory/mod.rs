//! Session memory of pinned municipalities
//!
//! Holds at most [`MAX_PINS`] municipality names with one palette colour
//! each. Names and colours are kept in lock-step: evicting the oldest pin
//! drops its colour too, and a new pin takes the first palette colour not
//! currently in use.

use std::fmt;

use log::debug;
use smallvec::SmallVec;

/// Maximum number of pinned municipalities
pub const MAX_PINS: usize = 3;

/// An RGB colour as rendered by the charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaletteColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PaletteColor {
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const TEAL: Self = Self::rgb(13, 143, 148);
    pub const GREY: Self = Self::rgb(173, 173, 173);
    pub const BURGUNDY: Self = Self::rgb(102, 21, 32);
}

impl fmt::Display for PaletteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// Colour of the national trace, never used for pins
pub const NATIONAL_COLOR: PaletteColor = PaletteColor::rgb(242, 146, 12);

/// Pin colours in search order
pub const PALETTE: [PaletteColor; MAX_PINS] =
    [PaletteColor::TEAL, PaletteColor::GREY, PaletteColor::BURGUNDY];

/// Pinned municipalities of one session, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesMemory {
    names: SmallVec<[String; MAX_PINS]>,
    colors: SmallVec<[PaletteColor; MAX_PINS]>,
}

impl SeriesMemory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a municipality by name
    ///
    /// Pinning a name that is already pinned changes nothing. A fourth
    /// distinct pin evicts the oldest one.
    pub fn pin(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.names.contains(&name) {
            return;
        }
        if self.names.len() == MAX_PINS {
            let evicted = self.names.remove(0);
            self.colors.remove(0);
            debug!("Evicted pinned municipality {evicted}");
        }
        let color = PALETTE
            .into_iter()
            .find(|c| !self.colors.contains(c))
            .unwrap_or(PaletteColor::BURGUNDY);
        self.names.push(name);
        self.colors.push(color);
    }

    /// Remove every pin
    pub fn clear(&mut self) {
        self.names.clear();
        self.colors.clear();
    }

    /// Colour of the pin at `index`
    #[must_use]
    pub fn color_for(&self, index: usize) -> Option<PaletteColor> {
        self.colors.get(index).copied()
    }

    /// Pinned names, oldest first
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// `(name, colour)` pairs, oldest first
    pub fn iter(&self) -> impl Iterator<Item = (&str, PaletteColor)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.colors.iter().copied())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
