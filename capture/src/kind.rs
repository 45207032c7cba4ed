//! Resource kinds: the nine object classes the system captures.
//!
//! Kinds are ordered by dependency depth. [`ResourceKind::OBJECTS`] lists the
//! seven creatable object kinds in the order a replayer must deliver them so
//! that every reference points at an already-delivered object.

/// One captured object class.
///
/// Every kind maps to a stable `u32` wire tag used by the archive record
/// header. Tags are append-only: a new kind gets the next tag, existing tags
/// never change meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Sampler,
    DescriptorSetLayout,
    PipelineLayout,
    ShaderModule,
    RenderPass,
    ComputePipeline,
    GraphicsPipeline,
    ApplicationInfo,
    PhysicalDeviceFeatures,
}

impl ResourceKind {
    /// All kinds in dependency-depth order, singletons last.
    pub const ALL: [ResourceKind; 9] = [
        ResourceKind::Sampler,
        ResourceKind::DescriptorSetLayout,
        ResourceKind::PipelineLayout,
        ResourceKind::ShaderModule,
        ResourceKind::RenderPass,
        ResourceKind::ComputePipeline,
        ResourceKind::GraphicsPipeline,
        ResourceKind::ApplicationInfo,
        ResourceKind::PhysicalDeviceFeatures,
    ];

    /// The seven creatable object kinds in topological delivery order.
    pub const OBJECTS: [ResourceKind; 7] = [
        ResourceKind::Sampler,
        ResourceKind::DescriptorSetLayout,
        ResourceKind::PipelineLayout,
        ResourceKind::ShaderModule,
        ResourceKind::RenderPass,
        ResourceKind::ComputePipeline,
        ResourceKind::GraphicsPipeline,
    ];

    /// The stable `u32` wire tag for this kind.
    #[must_use]
    pub const fn tag(self) -> u32 {
        match self {
            Self::Sampler => 1,
            Self::DescriptorSetLayout => 2,
            Self::PipelineLayout => 3,
            Self::ShaderModule => 4,
            Self::RenderPass => 5,
            Self::ComputePipeline => 6,
            Self::GraphicsPipeline => 7,
            Self::ApplicationInfo => 8,
            Self::PhysicalDeviceFeatures => 9,
        }
    }

    /// Inverse of [`ResourceKind::tag`]. Unknown tags return `None`.
    #[must_use]
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(Self::Sampler),
            2 => Some(Self::DescriptorSetLayout),
            3 => Some(Self::PipelineLayout),
            4 => Some(Self::ShaderModule),
            5 => Some(Self::RenderPass),
            6 => Some(Self::ComputePipeline),
            7 => Some(Self::GraphicsPipeline),
            8 => Some(Self::ApplicationInfo),
            9 => Some(Self::PhysicalDeviceFeatures),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Sampler => "sampler",
            Self::DescriptorSetLayout => "descriptor-set-layout",
            Self::PipelineLayout => "pipeline-layout",
            Self::ShaderModule => "shader-module",
            Self::RenderPass => "render-pass",
            Self::ComputePipeline => "compute-pipeline",
            Self::GraphicsPipeline => "graphics-pipeline",
            Self::ApplicationInfo => "application-info",
            Self::PhysicalDeviceFeatures => "physical-device-features",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_tag(kind.tag()), Some(kind));
        }
    }

    #[test]
    fn tags_are_unique() {
        let mut seen = std::collections::BTreeSet::new();
        for kind in ResourceKind::ALL {
            assert!(seen.insert(kind.tag()), "duplicate tag for {kind}");
        }
    }

    #[test]
    fn unknown_tag_rejected() {
        assert_eq!(ResourceKind::from_tag(0), None);
        assert_eq!(ResourceKind::from_tag(10), None);
        assert_eq!(ResourceKind::from_tag(u32::MAX), None);
    }

    #[test]
    fn objects_precede_singletons() {
        assert_eq!(ResourceKind::OBJECTS.len() + 2, ResourceKind::ALL.len());
        for (a, b) in ResourceKind::OBJECTS.iter().zip(ResourceKind::ALL.iter()) {
            assert_eq!(a, b);
        }
    }
}
