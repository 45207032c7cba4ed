//! Descriptor model: owned Rust structs for the captured object kinds.
//!
//! Strong enums exist where the system distinguishes behavior (filters,
//! address modes, descriptor types, load/store ops). Values the system only
//! stores and replays opaquely — formats, image layouts, blend enums,
//! primitive topologies — stay raw `u32`s: interpreting them is explicitly
//! out of scope.
//!
//! Extension chains are typed `Vec`s per descriptor; each entry identifies
//! itself with a structure tag from [`stype`]. The hasher decides which tags
//! it recognizes — carrying an entry here does not imply it can be recorded.

/// Declares a wire enum: a field enum with a stable `u32` tag per variant.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $tag:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// The stable `u32` wire tag for this variant.
            #[must_use]
            pub const fn tag(self) -> u32 {
                match self {
                    $( Self::$variant => $tag ),+
                }
            }

            /// Inverse of `tag()`. Unknown tags return `None`.
            #[must_use]
            pub fn from_tag(tag: u32) -> Option<Self> {
                match tag {
                    $( $tag => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

pub(crate) use wire_enum;

mod meta;
mod pipeline;
mod render_pass;
mod sampler;
mod set_layout;
mod shader;

pub use meta::{ApplicationInfo, PhysicalDeviceFeatures};
pub use pipeline::{
    ColorBlendAttachment, ColorBlendState, ComputePipelineDesc, DepthStencilState, DynamicState,
    GraphicsPipelineDesc, InputAssemblyState, InputRate, MultisampleState, PipelineShaderStage,
    RasterizationState, ScissorRect, SpecializationInfo, SpecializationMapEntry, StencilOpState,
    TessellationState, VertexInputAttribute, VertexInputBinding, VertexInputState, Viewport,
    ViewportState,
};
pub use render_pass::{
    AttachmentDescription, AttachmentReference, BindPoint, LoadOp, MultiviewInfo, RenderPassChain,
    RenderPassDesc, StoreOp, SubpassDependency, SubpassDescription, ATTACHMENT_UNUSED,
    SUBPASS_EXTERNAL,
};
pub use sampler::{
    AddressMode, BorderColor, CompareOp, ComponentSwizzle, Filter, MipmapMode, ReductionModeInfo,
    SamplerChain, SamplerDesc, YcbcrConversionInfo,
};
pub use set_layout::{
    DescriptorSetLayoutBinding, DescriptorType, PipelineLayoutDesc, PushConstantRange,
    SetLayoutDesc,
};
pub use shader::ShaderModuleDesc;

/// Structure tags for extension-chain entries.
///
/// Tags are append-only and never reused, like resource kind tags.
pub mod stype {
    /// Sampler YCbCr conversion attachment.
    pub const SAMPLER_YCBCR_CONVERSION: u32 = 1;
    /// Sampler reduction mode attachment.
    pub const SAMPLER_REDUCTION_MODE: u32 = 2;
    /// Render pass multiview attachment.
    pub const RENDER_PASS_MULTIVIEW: u32 = 3;
}

bitflags::bitflags! {
    /// Shader stage mask. Bit values are stable wire values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const TESSELLATION_CONTROL = 1 << 1;
        const TESSELLATION_EVALUATION = 1 << 2;
        const GEOMETRY = 1 << 3;
        const FRAGMENT = 1 << 4;
        const COMPUTE = 1 << 5;
    }
}
