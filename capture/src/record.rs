//! The recorder: per-kind intern tables with content-hash deduplication.
//!
//! Each accepted descriptor is canonicalized (every dependency id rewritten
//! to the referenced object's content hash), hashed, interned under its hash
//! (first insert wins), and registered under the caller's id so later
//! descriptors can reference it. A rejected call leaves every table
//! unchanged.
//!
//! Canonical descriptors are what serialization emits and what replay
//! re-hashes: their reference ids hold content hashes, so
//! [`IdentityResolver`] recomputes the same hash on any machine.

use std::collections::{BTreeMap, HashMap};

use crate::error::RecordError;
use crate::hash::{self, DependencyResolver, IdentityResolver};
use crate::id::{
    Hash64, PipelineId, PipelineLayoutId, RenderPassId, SamplerId, SetLayoutId, ShaderModuleId,
};
use crate::kind::ResourceKind;
use crate::model::{
    ApplicationInfo, ComputePipelineDesc, DescriptorSetLayoutBinding, GraphicsPipelineDesc,
    PhysicalDeviceFeatures, PipelineLayoutDesc, PipelineShaderStage, RenderPassDesc, SamplerDesc,
    SetLayoutDesc, ShaderModuleDesc,
};

/// In-memory capture state for one producer.
///
/// Intern tables are `BTreeMap`s so iteration (and therefore serialization)
/// is deterministic. The id maps translate the application's opaque handles
/// into content hashes when later descriptors reference them.
#[derive(Debug, Default)]
pub struct Recorder {
    samplers: BTreeMap<Hash64, SamplerDesc>,
    set_layouts: BTreeMap<Hash64, SetLayoutDesc>,
    pipeline_layouts: BTreeMap<Hash64, PipelineLayoutDesc>,
    shader_modules: BTreeMap<Hash64, ShaderModuleDesc>,
    render_passes: BTreeMap<Hash64, RenderPassDesc>,
    compute_pipelines: BTreeMap<Hash64, ComputePipelineDesc>,
    graphics_pipelines: BTreeMap<Hash64, GraphicsPipelineDesc>,

    application_info: Option<ApplicationInfo>,
    physical_device_features: Option<PhysicalDeviceFeatures>,

    sampler_ids: HashMap<u64, Hash64>,
    set_layout_ids: HashMap<u64, Hash64>,
    pipeline_layout_ids: HashMap<u64, Hash64>,
    shader_module_ids: HashMap<u64, Hash64>,
    render_pass_ids: HashMap<u64, Hash64>,
    pipeline_ids: HashMap<u64, Hash64>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sampler under the application's id.
    ///
    /// # Errors
    ///
    /// [`RecordError::UnsupportedExtension`] for an unrecognized chain entry.
    pub fn record_sampler(
        &mut self,
        id: SamplerId,
        desc: &SamplerDesc,
    ) -> Result<Hash64, RecordError> {
        // The rejection path is exercised deliberately by capture tests; a
        // note helps tell it apart from real corruption in logs.
        let hash = hash::sampler_hash(desc).inspect_err(|e| {
            log::debug!("sampler record rejected: {e}");
        })?;
        self.samplers.entry(hash).or_insert_with(|| desc.clone());
        self.sampler_ids.insert(id.value(), hash);
        Ok(hash)
    }

    /// Record a descriptor set layout under the application's id.
    ///
    /// # Errors
    ///
    /// [`RecordError::UnknownReference`] for an unregistered immutable
    /// sampler reference.
    pub fn record_descriptor_set_layout(
        &mut self,
        id: SetLayoutId,
        desc: &SetLayoutDesc,
    ) -> Result<Hash64, RecordError> {
        let canonical = self.canonical_set_layout(desc)?;
        let hash = hash::set_layout_hash(&canonical, &IdentityResolver)?;
        self.set_layouts.entry(hash).or_insert(canonical);
        self.set_layout_ids.insert(id.value(), hash);
        Ok(hash)
    }

    /// Record a pipeline layout under the application's id.
    ///
    /// # Errors
    ///
    /// [`RecordError::UnknownReference`] for an unregistered set layout.
    pub fn record_pipeline_layout(
        &mut self,
        id: PipelineLayoutId,
        desc: &PipelineLayoutDesc,
    ) -> Result<Hash64, RecordError> {
        let canonical = self.canonical_pipeline_layout(desc)?;
        let hash = hash::pipeline_layout_hash(&canonical, &IdentityResolver)?;
        self.pipeline_layouts.entry(hash).or_insert(canonical);
        self.pipeline_layout_ids.insert(id.value(), hash);
        Ok(hash)
    }

    /// Record a shader module under the application's id.
    ///
    /// # Errors
    ///
    /// Infallible today; `Result` keeps the record surface uniform.
    pub fn record_shader_module(
        &mut self,
        id: ShaderModuleId,
        desc: &ShaderModuleDesc,
    ) -> Result<Hash64, RecordError> {
        let hash = hash::shader_module_hash(desc)?;
        self.shader_modules
            .entry(hash)
            .or_insert_with(|| desc.clone());
        self.shader_module_ids.insert(id.value(), hash);
        Ok(hash)
    }

    /// Record a render pass under the application's id.
    ///
    /// # Errors
    ///
    /// [`RecordError::UnsupportedExtension`] for an unrecognized chain entry.
    pub fn record_render_pass(
        &mut self,
        id: RenderPassId,
        desc: &RenderPassDesc,
    ) -> Result<Hash64, RecordError> {
        let hash = hash::render_pass_hash(desc).inspect_err(|e| {
            log::debug!("render pass record rejected: {e}");
        })?;
        self.render_passes
            .entry(hash)
            .or_insert_with(|| desc.clone());
        self.render_pass_ids.insert(id.value(), hash);
        Ok(hash)
    }

    /// Record a compute pipeline under the application's id.
    ///
    /// # Errors
    ///
    /// [`RecordError::UnknownReference`] for an unregistered layout, module,
    /// or base pipeline.
    pub fn record_compute_pipeline(
        &mut self,
        id: PipelineId,
        desc: &ComputePipelineDesc,
    ) -> Result<Hash64, RecordError> {
        let canonical = self.canonical_compute_pipeline(desc)?;
        let hash = hash::compute_pipeline_hash(&canonical, &IdentityResolver)?;
        self.compute_pipelines.entry(hash).or_insert(canonical);
        self.pipeline_ids.insert(id.value(), hash);
        Ok(hash)
    }

    /// Record a graphics pipeline under the application's id.
    ///
    /// # Errors
    ///
    /// [`RecordError::UnknownReference`] for an unregistered layout, module,
    /// render pass, or base pipeline.
    pub fn record_graphics_pipeline(
        &mut self,
        id: PipelineId,
        desc: &GraphicsPipelineDesc,
    ) -> Result<Hash64, RecordError> {
        let canonical = self.canonical_graphics_pipeline(desc)?;
        let hash = hash::graphics_pipeline_hash(&canonical, &IdentityResolver)?;
        self.graphics_pipelines.entry(hash).or_insert(canonical);
        self.pipeline_ids.insert(id.value(), hash);
        Ok(hash)
    }

    /// Record the application info singleton. Re-recording replaces it.
    pub fn record_application_info(&mut self, info: &ApplicationInfo) -> Hash64 {
        let hash = hash::application_info_hash(info);
        self.application_info = Some(info.clone());
        hash
    }

    /// Record the device features singleton. Re-recording replaces it.
    pub fn record_physical_device_features(&mut self, features: &PhysicalDeviceFeatures) -> Hash64 {
        let hash = hash::physical_device_features_hash(features);
        self.physical_device_features = Some(*features);
        hash
    }

    // -- canonicalization ---------------------------------------------------

    fn sampler_ref(&self, id: SamplerId) -> Result<SamplerId, RecordError> {
        self.resolve_sampler(id)
            .map(SamplerId::from)
            .ok_or_else(|| RecordError::UnknownReference {
                kind: ResourceKind::Sampler,
                id: id.value(),
            })
    }

    fn set_layout_ref(&self, id: SetLayoutId) -> Result<SetLayoutId, RecordError> {
        self.resolve_set_layout(id)
            .map(SetLayoutId::from)
            .ok_or_else(|| RecordError::UnknownReference {
                kind: ResourceKind::DescriptorSetLayout,
                id: id.value(),
            })
    }

    fn pipeline_layout_ref(&self, id: PipelineLayoutId) -> Result<PipelineLayoutId, RecordError> {
        self.resolve_pipeline_layout(id)
            .map(PipelineLayoutId::from)
            .ok_or_else(|| RecordError::UnknownReference {
                kind: ResourceKind::PipelineLayout,
                id: id.value(),
            })
    }

    fn shader_module_ref(&self, id: ShaderModuleId) -> Result<ShaderModuleId, RecordError> {
        self.resolve_shader_module(id)
            .map(ShaderModuleId::from)
            .ok_or_else(|| RecordError::UnknownReference {
                kind: ResourceKind::ShaderModule,
                id: id.value(),
            })
    }

    fn render_pass_ref(&self, id: RenderPassId) -> Result<RenderPassId, RecordError> {
        self.resolve_render_pass(id)
            .map(RenderPassId::from)
            .ok_or_else(|| RecordError::UnknownReference {
                kind: ResourceKind::RenderPass,
                id: id.value(),
            })
    }

    fn pipeline_ref(&self, id: PipelineId) -> Result<PipelineId, RecordError> {
        self.resolve_pipeline(id)
            .map(PipelineId::from)
            .ok_or_else(|| RecordError::UnknownReference {
                kind: ResourceKind::GraphicsPipeline,
                id: id.value(),
            })
    }

    fn canonical_set_layout(&self, desc: &SetLayoutDesc) -> Result<SetLayoutDesc, RecordError> {
        let mut bindings = Vec::with_capacity(desc.bindings.len());
        for binding in &desc.bindings {
            // Samplers on binding types that cannot use them are dead state;
            // the canonical form drops them.
            let immutable_samplers = if binding.descriptor_type.uses_immutable_samplers() {
                binding
                    .immutable_samplers
                    .iter()
                    .map(|&id| self.sampler_ref(id))
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                Vec::new()
            };
            bindings.push(DescriptorSetLayoutBinding {
                binding: binding.binding,
                descriptor_type: binding.descriptor_type,
                descriptor_count: binding.descriptor_count,
                stage_flags: binding.stage_flags,
                immutable_samplers,
            });
        }
        Ok(SetLayoutDesc {
            flags: desc.flags,
            bindings,
        })
    }

    fn canonical_pipeline_layout(
        &self,
        desc: &PipelineLayoutDesc,
    ) -> Result<PipelineLayoutDesc, RecordError> {
        Ok(PipelineLayoutDesc {
            flags: desc.flags,
            set_layouts: desc
                .set_layouts
                .iter()
                .map(|&id| self.set_layout_ref(id))
                .collect::<Result<Vec<_>, _>>()?,
            push_constant_ranges: desc.push_constant_ranges.clone(),
        })
    }

    fn canonical_stage(
        &self,
        stage: &PipelineShaderStage,
    ) -> Result<PipelineShaderStage, RecordError> {
        Ok(PipelineShaderStage {
            flags: stage.flags,
            stage: stage.stage,
            module: self.shader_module_ref(stage.module)?,
            name: stage.name.clone(),
            specialization: stage.specialization.clone(),
        })
    }

    fn canonical_compute_pipeline(
        &self,
        desc: &ComputePipelineDesc,
    ) -> Result<ComputePipelineDesc, RecordError> {
        Ok(ComputePipelineDesc {
            flags: desc.flags,
            stage: self.canonical_stage(&desc.stage)?,
            layout: self.pipeline_layout_ref(desc.layout)?,
            base_pipeline: desc
                .base_pipeline
                .map(|id| self.pipeline_ref(id))
                .transpose()?,
        })
    }

    fn canonical_graphics_pipeline(
        &self,
        desc: &GraphicsPipelineDesc,
    ) -> Result<GraphicsPipelineDesc, RecordError> {
        Ok(GraphicsPipelineDesc {
            flags: desc.flags,
            stages: desc
                .stages
                .iter()
                .map(|stage| self.canonical_stage(stage))
                .collect::<Result<Vec<_>, _>>()?,
            vertex_input: desc.vertex_input.clone(),
            input_assembly: desc.input_assembly,
            tessellation: desc.tessellation,
            viewport: desc.viewport.clone(),
            rasterization: desc.rasterization,
            multisample: desc.multisample.clone(),
            depth_stencil: desc.depth_stencil,
            color_blend: desc.color_blend.clone(),
            dynamic: desc.dynamic.clone(),
            layout: self.pipeline_layout_ref(desc.layout)?,
            render_pass: self.render_pass_ref(desc.render_pass)?,
            subpass: desc.subpass,
            base_pipeline: desc
                .base_pipeline
                .map(|id| self.pipeline_ref(id))
                .transpose()?,
        })
    }

    // -- accessors ----------------------------------------------------------

    /// Number of interned entries for a kind (singletons count 0 or 1).
    #[must_use]
    pub fn entry_count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Sampler => self.samplers.len(),
            ResourceKind::DescriptorSetLayout => self.set_layouts.len(),
            ResourceKind::PipelineLayout => self.pipeline_layouts.len(),
            ResourceKind::ShaderModule => self.shader_modules.len(),
            ResourceKind::RenderPass => self.render_passes.len(),
            ResourceKind::ComputePipeline => self.compute_pipelines.len(),
            ResourceKind::GraphicsPipeline => self.graphics_pipelines.len(),
            ResourceKind::ApplicationInfo => usize::from(self.application_info.is_some()),
            ResourceKind::PhysicalDeviceFeatures => {
                usize::from(self.physical_device_features.is_some())
            }
        }
    }

    /// Interned hashes for a kind, ascending.
    #[must_use]
    pub fn hashes_for_kind(&self, kind: ResourceKind) -> Vec<Hash64> {
        match kind {
            ResourceKind::Sampler => self.samplers.keys().copied().collect(),
            ResourceKind::DescriptorSetLayout => self.set_layouts.keys().copied().collect(),
            ResourceKind::PipelineLayout => self.pipeline_layouts.keys().copied().collect(),
            ResourceKind::ShaderModule => self.shader_modules.keys().copied().collect(),
            ResourceKind::RenderPass => self.render_passes.keys().copied().collect(),
            ResourceKind::ComputePipeline => self.compute_pipelines.keys().copied().collect(),
            ResourceKind::GraphicsPipeline => self.graphics_pipelines.keys().copied().collect(),
            ResourceKind::ApplicationInfo => self
                .application_info
                .as_ref()
                .map(hash::application_info_hash)
                .into_iter()
                .collect(),
            ResourceKind::PhysicalDeviceFeatures => self
                .physical_device_features
                .as_ref()
                .map(hash::physical_device_features_hash)
                .into_iter()
                .collect(),
        }
    }

    #[must_use]
    pub fn sampler(&self, hash: Hash64) -> Option<&SamplerDesc> {
        self.samplers.get(&hash)
    }

    #[must_use]
    pub fn set_layout(&self, hash: Hash64) -> Option<&SetLayoutDesc> {
        self.set_layouts.get(&hash)
    }

    #[must_use]
    pub fn pipeline_layout(&self, hash: Hash64) -> Option<&PipelineLayoutDesc> {
        self.pipeline_layouts.get(&hash)
    }

    #[must_use]
    pub fn shader_module(&self, hash: Hash64) -> Option<&ShaderModuleDesc> {
        self.shader_modules.get(&hash)
    }

    #[must_use]
    pub fn render_pass(&self, hash: Hash64) -> Option<&RenderPassDesc> {
        self.render_passes.get(&hash)
    }

    #[must_use]
    pub fn compute_pipeline(&self, hash: Hash64) -> Option<&ComputePipelineDesc> {
        self.compute_pipelines.get(&hash)
    }

    #[must_use]
    pub fn graphics_pipeline(&self, hash: Hash64) -> Option<&GraphicsPipelineDesc> {
        self.graphics_pipelines.get(&hash)
    }

    #[must_use]
    pub fn application_info(&self) -> Option<&ApplicationInfo> {
        self.application_info.as_ref()
    }

    #[must_use]
    pub fn physical_device_features(&self) -> Option<&PhysicalDeviceFeatures> {
        self.physical_device_features.as_ref()
    }

    pub(crate) fn samplers(&self) -> &BTreeMap<Hash64, SamplerDesc> {
        &self.samplers
    }

    pub(crate) fn set_layouts(&self) -> &BTreeMap<Hash64, SetLayoutDesc> {
        &self.set_layouts
    }

    pub(crate) fn pipeline_layouts(&self) -> &BTreeMap<Hash64, PipelineLayoutDesc> {
        &self.pipeline_layouts
    }

    pub(crate) fn shader_modules(&self) -> &BTreeMap<Hash64, ShaderModuleDesc> {
        &self.shader_modules
    }

    pub(crate) fn render_passes(&self) -> &BTreeMap<Hash64, RenderPassDesc> {
        &self.render_passes
    }

    pub(crate) fn compute_pipelines(&self) -> &BTreeMap<Hash64, ComputePipelineDesc> {
        &self.compute_pipelines
    }

    pub(crate) fn graphics_pipelines(&self) -> &BTreeMap<Hash64, GraphicsPipelineDesc> {
        &self.graphics_pipelines
    }
}

impl DependencyResolver for Recorder {
    fn resolve_sampler(&self, id: SamplerId) -> Option<Hash64> {
        self.sampler_ids.get(&id.value()).copied()
    }

    fn resolve_set_layout(&self, id: SetLayoutId) -> Option<Hash64> {
        self.set_layout_ids.get(&id.value()).copied()
    }

    fn resolve_pipeline_layout(&self, id: PipelineLayoutId) -> Option<Hash64> {
        self.pipeline_layout_ids.get(&id.value()).copied()
    }

    fn resolve_shader_module(&self, id: ShaderModuleId) -> Option<Hash64> {
        self.shader_module_ids.get(&id.value()).copied()
    }

    fn resolve_render_pass(&self, id: RenderPassId) -> Option<Hash64> {
        self.render_pass_ids.get(&id.value()).copied()
    }

    fn resolve_pipeline(&self, id: PipelineId) -> Option<Hash64> {
        self.pipeline_ids.get(&id.value()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DescriptorType, ReductionModeInfo, SamplerChain, ShaderStageFlags, SpecializationInfo,
    };

    #[test]
    fn equal_descriptors_intern_once() {
        let mut recorder = Recorder::new();
        let desc = SamplerDesc {
            min_lod: 10.0,
            ..SamplerDesc::default()
        };
        let first = recorder.record_sampler(SamplerId::new(1), &desc).unwrap();
        let second = recorder.record_sampler(SamplerId::new(2), &desc).unwrap();
        assert_eq!(first, second);
        assert_eq!(recorder.entry_count(ResourceKind::Sampler), 1);
    }

    #[test]
    fn distinct_descriptors_intern_separately() {
        let mut recorder = Recorder::new();
        let a = SamplerDesc {
            min_lod: 10.0,
            ..SamplerDesc::default()
        };
        let b = SamplerDesc {
            min_lod: 11.0,
            ..SamplerDesc::default()
        };
        let ha = recorder.record_sampler(SamplerId::new(1), &a).unwrap();
        let hb = recorder.record_sampler(SamplerId::new(2), &b).unwrap();
        assert_ne!(ha, hb);
        assert_eq!(recorder.entry_count(ResourceKind::Sampler), 2);
    }

    #[test]
    fn rejected_record_leaves_tables_unchanged() {
        let mut recorder = Recorder::new();
        let desc = SamplerDesc {
            chain: vec![SamplerChain::ReductionMode(ReductionModeInfo {
                reduction_mode: 0,
            })],
            ..SamplerDesc::default()
        };
        assert!(recorder.record_sampler(SamplerId::new(1), &desc).is_err());
        assert_eq!(recorder.entry_count(ResourceKind::Sampler), 0);
        assert_eq!(recorder.resolve_sampler(SamplerId::new(1)), None);
    }

    #[test]
    fn recorded_hash_recomputes_to_itself() {
        let mut recorder = Recorder::new();
        let desc = SamplerDesc::default();
        let hash = recorder.record_sampler(SamplerId::new(1), &desc).unwrap();
        let canonical = recorder.sampler(hash).unwrap();
        assert_eq!(crate::hash::sampler_hash(canonical).unwrap(), hash);
    }

    #[test]
    fn canonical_form_holds_content_hashes() {
        let mut recorder = Recorder::new();
        let sampler_hash = recorder
            .record_sampler(SamplerId::new(5), &SamplerDesc::default())
            .unwrap();

        let layout = SetLayoutDesc {
            flags: 0,
            bindings: vec![DescriptorSetLayoutBinding {
                binding: 0,
                descriptor_type: DescriptorType::Sampler,
                descriptor_count: 1,
                stage_flags: ShaderStageFlags::FRAGMENT,
                immutable_samplers: vec![SamplerId::new(5)],
            }],
        };
        let layout_hash = recorder
            .record_descriptor_set_layout(SetLayoutId::new(1), &layout)
            .unwrap();

        let canonical = recorder.set_layout(layout_hash).unwrap();
        assert_eq!(
            canonical.bindings[0].immutable_samplers,
            vec![SamplerId::from(sampler_hash)]
        );
        // Canonical form re-hashes to the recorded hash with no id maps.
        assert_eq!(
            hash::set_layout_hash(canonical, &IdentityResolver).unwrap(),
            layout_hash
        );
    }

    #[test]
    fn dangling_reference_rejected_before_any_mutation() {
        let mut recorder = Recorder::new();
        let layout = SetLayoutDesc {
            flags: 0,
            bindings: vec![DescriptorSetLayoutBinding {
                binding: 0,
                descriptor_type: DescriptorType::CombinedImageSampler,
                descriptor_count: 1,
                stage_flags: ShaderStageFlags::FRAGMENT,
                immutable_samplers: vec![SamplerId::new(404)],
            }],
        };
        assert_eq!(
            recorder.record_descriptor_set_layout(SetLayoutId::new(1), &layout),
            Err(RecordError::UnknownReference {
                kind: ResourceKind::Sampler,
                id: 404,
            })
        );
        assert_eq!(recorder.entry_count(ResourceKind::DescriptorSetLayout), 0);
        assert_eq!(recorder.resolve_set_layout(SetLayoutId::new(1)), None);
    }

    #[test]
    fn compute_pipeline_canonicalizes_through_two_levels() {
        let mut recorder = Recorder::new();
        let module_hash = recorder
            .record_shader_module(
                ShaderModuleId::new(10),
                &ShaderModuleDesc {
                    flags: 0,
                    code: vec![3, 2, 35, 7, 0, 0, 1, 0],
                },
            )
            .unwrap();
        let layout_hash = recorder
            .record_pipeline_layout(PipelineLayoutId::new(20), &PipelineLayoutDesc::default())
            .unwrap();

        let desc = ComputePipelineDesc {
            flags: 0,
            stage: PipelineShaderStage {
                flags: 0,
                stage: ShaderStageFlags::COMPUTE,
                module: ShaderModuleId::new(10),
                name: "main".to_string(),
                specialization: Some(SpecializationInfo::default()),
            },
            layout: PipelineLayoutId::new(20),
            base_pipeline: None,
        };
        let hash = recorder
            .record_compute_pipeline(PipelineId::new(30), &desc)
            .unwrap();

        let canonical = recorder.compute_pipeline(hash).unwrap();
        assert_eq!(canonical.stage.module, ShaderModuleId::from(module_hash));
        assert_eq!(canonical.layout, PipelineLayoutId::from(layout_hash));
    }
}
