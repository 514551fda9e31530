//! 256-entry colour palette.
//!
//! Entry 0 is reserved for empty space. On the wire the RGBA chunk stores 256
//! slots where slot `i` holds palette entry `i + 1`; the last slot is unused.

use bytemuck::{Pod, Zeroable};

use crate::util::{Error, Result};

/// Number of palette entries.
pub const PALETTE_SIZE: usize = 256;

/// RGBA colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(C)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black, the colour of entry 0.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack a `0xAABBGGRR` word.
    pub const fn from_abgr(v: u32) -> Self {
        Self {
            r: (v & 0xff) as u8,
            g: ((v >> 8) & 0xff) as u8,
            b: ((v >> 16) & 0xff) as u8,
            a: ((v >> 24) & 0xff) as u8,
        }
    }

    /// Pack into a `0xAABBGGRR` word.
    pub const fn to_abgr(self) -> u32 {
        (self.r as u32) | (self.g as u32) << 8 | (self.b as u32) << 16 | (self.a as u32) << 24
    }
}

/// Colour table indexed by voxel colour index.
#[derive(Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgba; PALETTE_SIZE],
}

impl Palette {
    /// The legacy default palette used when a file has no RGBA chunk.
    pub fn legacy_default() -> Self {
        let mut colors = [Rgba::TRANSPARENT; PALETTE_SIZE];
        for (c, v) in colors.iter_mut().zip(DEFAULT_PALETTE.iter()) {
            *c = Rgba::from_abgr(*v);
        }
        Self { colors }
    }

    /// Build from the 256 wire slots of an RGBA chunk.
    pub fn from_wire_slots(slots: &[Rgba; PALETTE_SIZE]) -> Self {
        let mut colors = [Rgba::TRANSPARENT; PALETTE_SIZE];
        colors[1..].copy_from_slice(&slots[..PALETTE_SIZE - 1]);
        Self { colors }
    }

    /// The 256 wire slots for an RGBA chunk.
    pub fn to_wire_slots(&self) -> [Rgba; PALETTE_SIZE] {
        let mut slots = [Rgba::TRANSPARENT; PALETTE_SIZE];
        slots[..PALETTE_SIZE - 1].copy_from_slice(&self.colors[1..]);
        slots
    }

    /// Colour of a palette entry.
    #[inline]
    pub fn get(&self, index: u8) -> Rgba {
        self.colors[index as usize]
    }

    /// Set a palette entry. Entry 0 is reserved.
    pub fn set(&mut self, index: u8, color: Rgba) -> Result<()> {
        if index == 0 {
            return Err(Error::InvalidPaletteIndex(0));
        }
        self.colors[index as usize] = color;
        Ok(())
    }

    /// All entries, index 0 included.
    #[inline]
    pub fn colors(&self) -> &[Rgba; PALETTE_SIZE] {
        &self.colors
    }

    /// Raw RGBA bytes of all entries.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Check if this equals the legacy default palette.
    pub fn is_legacy_default(&self) -> bool {
        *self == Self::legacy_default()
    }

    /// Check the palette invariants (entry 0 stays transparent).
    pub fn validate(&self) -> Result<()> {
        if self.colors[0] != Rgba::TRANSPARENT {
            return Err(Error::InvalidPaletteIndex(0));
        }
        Ok(())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::legacy_default()
    }
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_legacy_default() {
            write!(f, "Palette(default)")
        } else {
            f.debug_list().entries(self.colors.iter().map(|c| c.to_abgr())).finish()
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Palette {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.colors.iter())
    }
}

/// MagicaVoxel's built-in palette as `0xAABBGGRR` words, indexed by palette entry.
pub const DEFAULT_PALETTE: [u32; PALETTE_SIZE] = [
    0x00000000, 0xffffffff, 0xffccffff, 0xff99ffff, 0xff66ffff, 0xff33ffff, 0xff00ffff, 0xffffccff,
    0xffccccff, 0xff99ccff, 0xff66ccff, 0xff33ccff, 0xff00ccff, 0xffff99ff, 0xffcc99ff, 0xff9999ff,
    0xff6699ff, 0xff3399ff, 0xff0099ff, 0xffff66ff, 0xffcc66ff, 0xff9966ff, 0xff6666ff, 0xff3366ff,
    0xff0066ff, 0xffff33ff, 0xffcc33ff, 0xff9933ff, 0xff6633ff, 0xff3333ff, 0xff0033ff, 0xffff00ff,
    0xffcc00ff, 0xff9900ff, 0xff6600ff, 0xff3300ff, 0xff0000ff, 0xffffffcc, 0xffccffcc, 0xff99ffcc,
    0xff66ffcc, 0xff33ffcc, 0xff00ffcc, 0xffffcccc, 0xffcccccc, 0xff99cccc, 0xff66cccc, 0xff33cccc,
    0xff00cccc, 0xffff99cc, 0xffcc99cc, 0xff9999cc, 0xff6699cc, 0xff3399cc, 0xff0099cc, 0xffff66cc,
    0xffcc66cc, 0xff9966cc, 0xff6666cc, 0xff3366cc, 0xff0066cc, 0xffff33cc, 0xffcc33cc, 0xff9933cc,
    0xff6633cc, 0xff3333cc, 0xff0033cc, 0xffff00cc, 0xffcc00cc, 0xff9900cc, 0xff6600cc, 0xff3300cc,
    0xff0000cc, 0xffffff99, 0xffccff99, 0xff99ff99, 0xff66ff99, 0xff33ff99, 0xff00ff99, 0xffffcc99,
    0xffcccc99, 0xff99cc99, 0xff66cc99, 0xff33cc99, 0xff00cc99, 0xffff9999, 0xffcc9999, 0xff999999,
    0xff669999, 0xff339999, 0xff009999, 0xffff6699, 0xffcc6699, 0xff996699, 0xff666699, 0xff336699,
    0xff006699, 0xffff3399, 0xffcc3399, 0xff993399, 0xff663399, 0xff333399, 0xff003399, 0xffff0099,
    0xffcc0099, 0xff990099, 0xff660099, 0xff330099, 0xff000099, 0xffffff66, 0xffccff66, 0xff99ff66,
    0xff66ff66, 0xff33ff66, 0xff00ff66, 0xffffcc66, 0xffcccc66, 0xff99cc66, 0xff66cc66, 0xff33cc66,
    0xff00cc66, 0xffff9966, 0xffcc9966, 0xff999966, 0xff669966, 0xff339966, 0xff009966, 0xffff6666,
    0xffcc6666, 0xff996666, 0xff666666, 0xff336666, 0xff006666, 0xffff3366, 0xffcc3366, 0xff993366,
    0xff663366, 0xff333366, 0xff003366, 0xffff0066, 0xffcc0066, 0xff990066, 0xff660066, 0xff330066,
    0xff000066, 0xffffff33, 0xffccff33, 0xff99ff33, 0xff66ff33, 0xff33ff33, 0xff00ff33, 0xffffcc33,
    0xffcccc33, 0xff99cc33, 0xff66cc33, 0xff33cc33, 0xff00cc33, 0xffff9933, 0xffcc9933, 0xff999933,
    0xff669933, 0xff339933, 0xff009933, 0xffff6633, 0xffcc6633, 0xff996633, 0xff666633, 0xff336633,
    0xff006633, 0xffff3333, 0xffcc3333, 0xff993333, 0xff663333, 0xff333333, 0xff003333, 0xffff0033,
    0xffcc0033, 0xff990033, 0xff660033, 0xff330033, 0xff000033, 0xffffff00, 0xffccff00, 0xff99ff00,
    0xff66ff00, 0xff33ff00, 0xff00ff00, 0xffffcc00, 0xffcccc00, 0xff99cc00, 0xff66cc00, 0xff33cc00,
    0xff00cc00, 0xffff9900, 0xffcc9900, 0xff999900, 0xff669900, 0xff339900, 0xff009900, 0xffff6600,
    0xffcc6600, 0xff996600, 0xff666600, 0xff336600, 0xff006600, 0xffff3300, 0xffcc3300, 0xff993300,
    0xff663300, 0xff333300, 0xff003300, 0xffff0000, 0xffcc0000, 0xff990000, 0xff660000, 0xff330000,
    0xff0000ee, 0xff0000dd, 0xff0000bb, 0xff0000aa, 0xff000088, 0xff000077, 0xff000055, 0xff000044,
    0xff000022, 0xff000011, 0xff00ee00, 0xff00dd00, 0xff00bb00, 0xff00aa00, 0xff008800, 0xff007700,
    0xff005500, 0xff004400, 0xff002200, 0xff001100, 0xffee0000, 0xffdd0000, 0xffbb0000, 0xffaa0000,
    0xff880000, 0xff770000, 0xff550000, 0xff440000, 0xff220000, 0xff110000, 0xffeeeeee, 0xffdddddd,
    0xffbbbbbb, 0xffaaaaaa, 0xff888888, 0xff777777, 0xff555555, 0xff444444, 0xff222222, 0xff111111,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abgr_packing() {
        let c = Rgba::from_abgr(0xff3366cc);
        assert_eq!(c, Rgba::new(0xcc, 0x66, 0x33, 0xff));
        assert_eq!(c.to_abgr(), 0xff3366cc);
    }

    #[test]
    fn test_default_palette() {
        let p = Palette::default();
        assert_eq!(p.get(0), Rgba::TRANSPARENT);
        assert_eq!(p.get(1), Rgba::new(255, 255, 255, 255));
        assert_eq!(p.get(255), Rgba::from_abgr(0xff111111));
        p.validate().unwrap();
    }

    #[test]
    fn test_wire_remap() {
        let mut p = Palette::default();
        p.set(1, Rgba::new(255, 0, 0, 255)).unwrap();
        let slots = p.to_wire_slots();
        assert_eq!(slots[0], Rgba::new(255, 0, 0, 255));
        assert_eq!(slots[255], Rgba::TRANSPARENT);

        let decoded = Palette::from_wire_slots(&slots);
        assert_eq!(decoded.get(1), Rgba::new(255, 0, 0, 255));
        assert_eq!(decoded, p);
    }

    #[test]
    fn test_entry_zero_reserved() {
        let mut p = Palette::default();
        assert!(matches!(p.set(0, Rgba::new(1, 2, 3, 4)), Err(Error::InvalidPaletteIndex(0))));
        assert_eq!(p.as_bytes().len(), 1024);
    }
}
