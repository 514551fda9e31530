//! Materials.
//!
//! Two incompatible encodings exist and are kept apart:
//! - MATT (legacy): fixed type enum, weight and bit-flagged float properties
//! - MATL (modern): a free-form string dictionary

use std::collections::BTreeMap;

use crate::core::Dict;

/// Legacy material type (MATT).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MaterialKind {
    Diffuse = 0,
    Metal = 1,
    Glass = 2,
    Emissive = 3,
}

impl MaterialKind {
    /// Map a MATT type word.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Diffuse),
            1 => Some(Self::Metal),
            2 => Some(Self::Glass),
            3 => Some(Self::Emissive),
            _ => None,
        }
    }

    /// `_type` value of the equivalent modern material.
    pub fn modern_name(self) -> &'static str {
        match self {
            Self::Diffuse => "_diffuse",
            Self::Metal => "_metal",
            Self::Glass => "_glass",
            Self::Emissive => "_emit",
        }
    }
}

/// Optional float property of a legacy material.
///
/// Ordering follows the MATT property bitmask, which is also the order the
/// values are stored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LegacyProperty {
    Plastic,
    Roughness,
    Specular,
    Ior,
    Attenuation,
    Power,
    Glow,
}

impl LegacyProperty {
    /// All properties in bitmask order.
    pub const ALL: [Self; 7] = [
        Self::Plastic,
        Self::Roughness,
        Self::Specular,
        Self::Ior,
        Self::Attenuation,
        Self::Power,
        Self::Glow,
    ];

    /// Bitmask flag of this property.
    #[inline]
    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Key of the equivalent modern property.
    pub fn modern_key(self) -> &'static str {
        match self {
            Self::Plastic => "_plastic",
            Self::Roughness => "_rough",
            Self::Specular => "_spec",
            Self::Ior => "_ior",
            Self::Attenuation => "_att",
            Self::Power => "_flux",
            Self::Glow => "_glow",
        }
    }
}

/// Bit 7 of the MATT bitmask: power is total power. Carries no value.
pub const TOTAL_POWER_BIT: u32 = 1 << 7;

/// Legacy (MATT) material.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LegacyMaterial {
    pub kind: MaterialKind,
    /// Blend between this type and diffuse, `(0.0, 1.0]`; 1.0 for diffuse.
    pub weight: f32,
    pub properties: BTreeMap<LegacyProperty, f32>,
    pub is_total_power: bool,
}

impl LegacyMaterial {
    pub fn new(kind: MaterialKind, weight: f32) -> Self {
        Self {
            kind,
            weight,
            properties: BTreeMap::new(),
            is_total_power: false,
        }
    }

    /// Builder-style property setter.
    pub fn with(mut self, property: LegacyProperty, value: f32) -> Self {
        self.properties.insert(property, value);
        self
    }

    /// Get an optional property.
    pub fn get(&self, property: LegacyProperty) -> Option<f32> {
        self.properties.get(&property).copied()
    }

    /// MATT property bitmask for the properties present.
    pub fn property_bits(&self) -> u32 {
        let bits = self.properties.keys().fold(0, |acc, p| acc | p.bit());
        if self.is_total_power {
            bits | TOTAL_POWER_BIT
        } else {
            bits
        }
    }

    /// Convert to the modern dictionary form.
    pub fn to_modern(&self) -> Dict {
        let mut dict = Dict::new();
        dict.insert(Dict::TYPE, self.kind.modern_name());
        dict.insert("_weight", self.weight.to_string());
        for (p, v) in &self.properties {
            dict.insert(p.modern_key(), v.to_string());
        }
        dict
    }
}

/// A material of either encoding.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Material {
    /// Written as MATT.
    Legacy(LegacyMaterial),
    /// Written as MATL.
    Modern(Dict),
}

impl Material {
    /// Material type name (`_diffuse`, `_metal`, ...), if known.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Legacy(m) => Some(m.kind.modern_name()),
            Self::Modern(props) => props.get(Dict::TYPE),
        }
    }

    /// Check if this is a legacy material.
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    /// Modern dictionary form, converting legacy materials.
    pub fn to_modern(&self) -> Dict {
        match self {
            Self::Legacy(m) => m.to_modern(),
            Self::Modern(props) => props.clone(),
        }
    }
}
