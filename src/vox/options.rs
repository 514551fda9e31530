//! Decoder and encoder settings.

/// Decoder settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Fail instead of warning when PACK disagrees with the decoded models.
    pub strict_model_count: bool,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict settings used by `vox check`.
    pub fn strict() -> Self {
        Self { strict_model_count: true }
    }

    pub fn strict_model_count(mut self, strict: bool) -> Self {
        self.strict_model_count = strict;
        self
    }
}

/// When to emit a PACK chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PackPolicy {
    /// Always, even for a single model.
    #[default]
    Always,
    /// Only when the model count is not 1.
    WhenMultiple,
    /// Never.
    Never,
}

impl PackPolicy {
    /// Check if PACK is written for `model_count` models.
    pub fn emits(self, model_count: usize) -> bool {
        match self {
            Self::Always => true,
            Self::WhenMultiple => model_count != 1,
            Self::Never => false,
        }
    }
}

/// How materials are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaterialPolicy {
    /// Legacy materials as MATT, modern ones as MATL.
    #[default]
    Preserve,
    /// Everything as MATL.
    Modern,
}

/// Encoder settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub pack: PackPolicy,
    pub materials: MaterialPolicy,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pack(mut self, pack: PackPolicy) -> Self {
        self.pack = pack;
        self
    }

    pub fn materials(mut self, materials: MaterialPolicy) -> Self {
        self.materials = materials;
        self
    }
}
