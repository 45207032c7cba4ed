//! Descriptor set layout and pipeline layout descriptors.

use super::{wire_enum, ShaderStageFlags};
use crate::id::{SamplerId, SetLayoutId};

wire_enum! {
    /// Descriptor binding class.
    DescriptorType {
        Sampler = 0,
        CombinedImageSampler = 1,
        SampledImage = 2,
        StorageImage = 3,
        UniformTexelBuffer = 4,
        StorageTexelBuffer = 5,
        UniformBuffer = 6,
        StorageBuffer = 7,
        UniformBufferDynamic = 8,
        StorageBufferDynamic = 9,
        InputAttachment = 10,
    }
}

impl DescriptorType {
    /// Whether bindings of this type may carry immutable samplers.
    #[must_use]
    pub fn uses_immutable_samplers(self) -> bool {
        matches!(self, Self::Sampler | Self::CombinedImageSampler)
    }
}

/// One binding in a descriptor set layout.
///
/// `immutable_samplers` is consulted only when the descriptor type uses
/// them; for any other type the field is ignored by hashing and
/// serialization, like a pointer governed by a disabled feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub descriptor_count: u32,
    pub stage_flags: ShaderStageFlags,
    pub immutable_samplers: Vec<SamplerId>,
}

/// A descriptor set layout creation descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetLayoutDesc {
    pub flags: u32,
    pub bindings: Vec<DescriptorSetLayoutBinding>,
}

/// A push constant range in a pipeline layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushConstantRange {
    pub stage_flags: ShaderStageFlags,
    pub offset: u32,
    pub size: u32,
}

/// A pipeline layout creation descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineLayoutDesc {
    pub flags: u32,
    pub set_layouts: Vec<SetLayoutId>,
    pub push_constant_ranges: Vec<PushConstantRange>,
}
