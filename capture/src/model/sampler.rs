//! Sampler descriptors and their extension chain.

use super::wire_enum;

wire_enum! {
    /// Texel filtering for magnification/minification.
    Filter {
        Nearest = 0,
        Linear = 1,
    }
}

wire_enum! {
    /// Mipmap level selection mode.
    MipmapMode {
        Nearest = 0,
        Linear = 1,
    }
}

wire_enum! {
    /// Out-of-range texture coordinate handling, per axis.
    AddressMode {
        Repeat = 0,
        MirroredRepeat = 1,
        ClampToEdge = 2,
        ClampToBorder = 3,
        MirrorClampToEdge = 4,
    }
}

wire_enum! {
    /// Depth/stencil comparison operator.
    CompareOp {
        Never = 0,
        Less = 1,
        Equal = 2,
        LessOrEqual = 3,
        Greater = 4,
        NotEqual = 5,
        GreaterOrEqual = 6,
        Always = 7,
    }
}

wire_enum! {
    /// Border color used with [`AddressMode::ClampToBorder`].
    BorderColor {
        FloatTransparentBlack = 0,
        IntTransparentBlack = 1,
        FloatOpaqueBlack = 2,
        IntOpaqueBlack = 3,
        FloatOpaqueWhite = 4,
        IntOpaqueWhite = 5,
    }
}

wire_enum! {
    /// Per-channel swizzle in a YCbCr component mapping.
    ComponentSwizzle {
        Identity = 0,
        Zero = 1,
        One = 2,
        R = 3,
        G = 4,
        B = 5,
        A = 6,
    }
}

/// YCbCr conversion parameters chained onto a sampler.
///
/// `format`, `ycbcr_model`, `ycbcr_range`, and the chroma offsets are raw
/// passthrough values.
#[derive(Debug, Clone, PartialEq)]
pub struct YcbcrConversionInfo {
    pub format: u32,
    pub ycbcr_model: u32,
    pub ycbcr_range: u32,
    pub components: [ComponentSwizzle; 4],
    pub x_chroma_offset: u32,
    pub y_chroma_offset: u32,
    pub chroma_filter: Filter,
    pub force_explicit_reconstruction: bool,
}

/// Reduction mode parameters chained onto a sampler.
///
/// Carried by the model so chains can be expressed, but not recognized by
/// the hasher: recording a sampler with this entry fails.
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionModeInfo {
    pub reduction_mode: u32,
}

/// One entry in a sampler's extension chain.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplerChain {
    YcbcrConversion(YcbcrConversionInfo),
    ReductionMode(ReductionModeInfo),
}

impl SamplerChain {
    /// The structure tag identifying this entry.
    #[must_use]
    pub fn stype(&self) -> u32 {
        match self {
            Self::YcbcrConversion(_) => super::stype::SAMPLER_YCBCR_CONVERSION,
            Self::ReductionMode(_) => super::stype::SAMPLER_REDUCTION_MODE,
        }
    }
}

/// A sampler creation descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDesc {
    pub flags: u32,
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub mipmap_mode: MipmapMode,
    pub address_mode_u: AddressMode,
    pub address_mode_v: AddressMode,
    pub address_mode_w: AddressMode,
    pub mip_lod_bias: f32,
    pub anisotropy_enable: bool,
    pub max_anisotropy: f32,
    pub compare_enable: bool,
    pub compare_op: CompareOp,
    pub min_lod: f32,
    pub max_lod: f32,
    pub border_color: BorderColor,
    pub unnormalized_coordinates: bool,
    pub chain: Vec<SamplerChain>,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            flags: 0,
            mag_filter: Filter::Nearest,
            min_filter: Filter::Nearest,
            mipmap_mode: MipmapMode::Nearest,
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            address_mode_w: AddressMode::Repeat,
            mip_lod_bias: 0.0,
            anisotropy_enable: false,
            max_anisotropy: 1.0,
            compare_enable: false,
            compare_op: CompareOp::Never,
            min_lod: 0.0,
            max_lod: 0.0,
            border_color: BorderColor::FloatTransparentBlack,
            unnormalized_coordinates: false,
            chain: Vec::new(),
        }
    }
}
