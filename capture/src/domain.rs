//! Typed domain separators for content hashing.
//!
//! Every hash computation selects a domain via [`HashDomain`]. This module
//! is the single authority for domain-separator byte strings. Adding a
//! domain is a single change here: the enum, `as_bytes()`, `ALL`, and
//! `Display` are all generated from the same macro invocation.

use crate::kind::ResourceKind;

/// Declares `HashDomain`, `as_bytes()`, `ALL`, and `Display` from one list.
macro_rules! define_hash_domains {
    (
        $(
            $(#[$meta:meta])*
            $variant:ident => $bytes:expr
        ),+ $(,)?
    ) => {
        /// Typed domain separator for content hashing.
        ///
        /// Every variant maps to a unique, null-terminated byte string used
        /// as a SHA-256 prefix.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum HashDomain {
            $(
                $(#[$meta])*
                $variant,
            )+
        }

        impl HashDomain {
            /// The raw domain-separator bytes (null-terminated).
            #[must_use]
            pub const fn as_bytes(&self) -> &'static [u8] {
                match self {
                    $( Self::$variant => $bytes, )+
                }
            }

            /// All domain variants in declaration order.
            pub const ALL: &[HashDomain] = &[
                $( Self::$variant, )+
            ];
        }

        impl core::fmt::Display for HashDomain {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                match self {
                    $( Self::$variant => write!(f, stringify!($variant)), )+
                }
            }
        }
    };
}

define_hash_domains! {
    /// Sampler descriptor hashing.
    Sampler => b"AMBER::SAMPLER::V1\0",

    /// Descriptor set layout hashing.
    DescriptorSetLayout => b"AMBER::DESCRIPTOR_SET_LAYOUT::V1\0",

    /// Pipeline layout hashing.
    PipelineLayout => b"AMBER::PIPELINE_LAYOUT::V1\0",

    /// Shader module hashing.
    ShaderModule => b"AMBER::SHADER_MODULE::V1\0",

    /// Render pass hashing.
    RenderPass => b"AMBER::RENDER_PASS::V1\0",

    /// Compute pipeline hashing.
    ComputePipeline => b"AMBER::COMPUTE_PIPELINE::V1\0",

    /// Graphics pipeline hashing.
    GraphicsPipeline => b"AMBER::GRAPHICS_PIPELINE::V1\0",

    /// Application info hashing.
    ApplicationInfo => b"AMBER::APPLICATION_INFO::V1\0",

    /// Physical device features hashing.
    PhysicalDeviceFeatures => b"AMBER::PHYSICAL_DEVICE_FEATURES::V1\0",
}

impl HashDomain {
    /// The hashing domain for a resource kind.
    #[must_use]
    pub fn for_kind(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Sampler => Self::Sampler,
            ResourceKind::DescriptorSetLayout => Self::DescriptorSetLayout,
            ResourceKind::PipelineLayout => Self::PipelineLayout,
            ResourceKind::ShaderModule => Self::ShaderModule,
            ResourceKind::RenderPass => Self::RenderPass,
            ResourceKind::ComputePipeline => Self::ComputePipeline,
            ResourceKind::GraphicsPipeline => Self::GraphicsPipeline,
            ResourceKind::ApplicationInfo => Self::ApplicationInfo,
            ResourceKind::PhysicalDeviceFeatures => Self::PhysicalDeviceFeatures,
        }
    }
}
