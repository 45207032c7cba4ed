//! Content hashing: one deterministic function per resource kind.
//!
//! Every field folds into a domain-prefixed SHA-256 in declaration order
//! using explicit little-endian encodings; the first eight digest bytes
//! (little-endian) become the [`Hash64`]. The encoding is framed so no two
//! distinct descriptors fold to the same byte stream:
//!
//! - integers: little-endian fixed width
//! - floats: IEEE-754 bit pattern, little-endian
//! - bools: one byte, 0 or 1
//! - byte blobs and strings: `u64` length then content
//! - arrays: `u32` count then elements in array order
//! - optionals: one presence byte, then content when present
//! - object references: the referenced object's content hash (`u64`)
//!
//! Dependencies fold by hash, never by structural recursion: a pipeline
//! folds its layout's hash, not the layout's fields. References resolve
//! through [`DependencyResolver`]; an unresolvable id fails with
//! [`RecordError::UnknownReference`].
//!
//! Extension chains fold recognized entries in ascending structure-tag
//! order. Any entry the hasher does not recognize for the descriptor's kind
//! fails with [`RecordError::UnsupportedExtension`] — silently skipping a
//! chain entry would capture state the replay cannot reproduce.

use sha2::{Digest, Sha256};

use crate::domain::HashDomain;
use crate::error::RecordError;
use crate::id::{
    Hash64, PipelineId, PipelineLayoutId, RenderPassId, SamplerId, SetLayoutId, ShaderModuleId,
};
use crate::kind::ResourceKind;
use crate::model::{
    ApplicationInfo, AttachmentReference, ComputePipelineDesc, GraphicsPipelineDesc,
    PhysicalDeviceFeatures, PipelineLayoutDesc, PipelineShaderStage, RenderPassChain,
    RenderPassDesc, SamplerChain, SamplerDesc, SetLayoutDesc, ShaderModuleDesc, StencilOpState,
};

/// Resolves object references to content hashes during hashing.
///
/// The recorder implements this over its id registrations; the replayer
/// implements it over the set of already-delivered objects.
pub trait DependencyResolver {
    fn resolve_sampler(&self, id: SamplerId) -> Option<Hash64>;
    fn resolve_set_layout(&self, id: SetLayoutId) -> Option<Hash64>;
    fn resolve_pipeline_layout(&self, id: PipelineLayoutId) -> Option<Hash64>;
    fn resolve_shader_module(&self, id: ShaderModuleId) -> Option<Hash64>;
    fn resolve_render_pass(&self, id: RenderPassId) -> Option<Hash64>;
    fn resolve_pipeline(&self, id: PipelineId) -> Option<Hash64>;
}

/// Resolver for canonical descriptors, whose reference ids hold content
/// hashes already: every id resolves to itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl DependencyResolver for IdentityResolver {
    fn resolve_sampler(&self, id: SamplerId) -> Option<Hash64> {
        Some(Hash64::new(id.value()))
    }
    fn resolve_set_layout(&self, id: SetLayoutId) -> Option<Hash64> {
        Some(Hash64::new(id.value()))
    }
    fn resolve_pipeline_layout(&self, id: PipelineLayoutId) -> Option<Hash64> {
        Some(Hash64::new(id.value()))
    }
    fn resolve_shader_module(&self, id: ShaderModuleId) -> Option<Hash64> {
        Some(Hash64::new(id.value()))
    }
    fn resolve_render_pass(&self, id: RenderPassId) -> Option<Hash64> {
        Some(Hash64::new(id.value()))
    }
    fn resolve_pipeline(&self, id: PipelineId) -> Option<Hash64> {
        Some(Hash64::new(id.value()))
    }
}

/// Streaming field fold over a domain-prefixed SHA-256.
struct Fold {
    hasher: Sha256,
}

impl Fold {
    fn new(domain: HashDomain) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain.as_bytes());
        Self { hasher }
    }

    fn u8(&mut self, v: u8) {
        self.hasher.update([v]);
    }

    fn u32(&mut self, v: u32) {
        self.hasher.update(v.to_le_bytes());
    }

    fn i32(&mut self, v: i32) {
        self.hasher.update(v.to_le_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.hasher.update(v.to_le_bytes());
    }

    fn f32(&mut self, v: f32) {
        self.hasher.update(v.to_bits().to_le_bytes());
    }

    fn boolean(&mut self, v: bool) {
        self.u8(u8::from(v));
    }

    #[allow(clippy::cast_possible_truncation)]
    fn bytes(&mut self, v: &[u8]) {
        self.u64(v.len() as u64);
        self.hasher.update(v);
    }

    fn string(&mut self, v: &str) {
        self.bytes(v.as_bytes());
    }

    #[allow(clippy::cast_possible_truncation)]
    fn count(&mut self, n: usize) {
        self.u32(n as u32);
    }

    fn hash(&mut self, h: Hash64) {
        self.u64(h.value());
    }

    fn finish(self) -> Hash64 {
        let digest = self.hasher.finalize();
        let mut first = [0u8; 8];
        first.copy_from_slice(&digest[..8]);
        Hash64::new(u64::from_le_bytes(first))
    }
}

// ---------------------------------------------------------------------------
// Sampler
// ---------------------------------------------------------------------------

/// Hash a sampler descriptor.
///
/// # Errors
///
/// [`RecordError::UnsupportedExtension`] if the chain carries an entry the
/// hasher does not recognize on samplers.
pub fn sampler_hash(desc: &SamplerDesc) -> Result<Hash64, RecordError> {
    // Validate before folding anything.
    let mut chain: Vec<&SamplerChain> = Vec::with_capacity(desc.chain.len());
    for entry in &desc.chain {
        match entry {
            SamplerChain::YcbcrConversion(_) => chain.push(entry),
            SamplerChain::ReductionMode(_) => {
                return Err(RecordError::UnsupportedExtension {
                    kind: ResourceKind::Sampler,
                    stype: entry.stype(),
                })
            }
        }
    }
    chain.sort_by_key(|entry| entry.stype());

    let mut fold = Fold::new(HashDomain::Sampler);
    fold.u32(desc.flags);
    fold.u32(desc.mag_filter.tag());
    fold.u32(desc.min_filter.tag());
    fold.u32(desc.mipmap_mode.tag());
    fold.u32(desc.address_mode_u.tag());
    fold.u32(desc.address_mode_v.tag());
    fold.u32(desc.address_mode_w.tag());
    fold.f32(desc.mip_lod_bias);
    fold.boolean(desc.anisotropy_enable);
    fold.f32(desc.max_anisotropy);
    fold.boolean(desc.compare_enable);
    fold.u32(desc.compare_op.tag());
    fold.f32(desc.min_lod);
    fold.f32(desc.max_lod);
    fold.u32(desc.border_color.tag());
    fold.boolean(desc.unnormalized_coordinates);

    fold.count(chain.len());
    for entry in chain {
        fold.u32(entry.stype());
        match entry {
            SamplerChain::YcbcrConversion(info) => {
                fold.u32(info.format);
                fold.u32(info.ycbcr_model);
                fold.u32(info.ycbcr_range);
                for swizzle in info.components {
                    fold.u32(swizzle.tag());
                }
                fold.u32(info.x_chroma_offset);
                fold.u32(info.y_chroma_offset);
                fold.u32(info.chroma_filter.tag());
                fold.boolean(info.force_explicit_reconstruction);
            }
            SamplerChain::ReductionMode(_) => unreachable!("rejected above"),
        }
    }
    Ok(fold.finish())
}

// ---------------------------------------------------------------------------
// Descriptor set layout
// ---------------------------------------------------------------------------

/// Hash a descriptor set layout descriptor.
///
/// Immutable sampler references fold only for binding types that use them;
/// for every other type the field contributes nothing.
///
/// # Errors
///
/// [`RecordError::UnknownReference`] for an unregistered sampler id.
pub fn set_layout_hash(
    desc: &SetLayoutDesc,
    deps: &impl DependencyResolver,
) -> Result<Hash64, RecordError> {
    let mut fold = Fold::new(HashDomain::DescriptorSetLayout);
    fold.u32(desc.flags);
    fold.count(desc.bindings.len());
    for binding in &desc.bindings {
        fold.u32(binding.binding);
        fold.u32(binding.descriptor_type.tag());
        fold.u32(binding.descriptor_count);
        fold.u32(binding.stage_flags.bits());
        if binding.descriptor_type.uses_immutable_samplers() {
            fold.count(binding.immutable_samplers.len());
            for &id in &binding.immutable_samplers {
                let hash =
                    deps.resolve_sampler(id)
                        .ok_or_else(|| RecordError::UnknownReference {
                            kind: ResourceKind::Sampler,
                            id: id.value(),
                        })?;
                fold.hash(hash);
            }
        } else {
            fold.count(0);
        }
    }
    Ok(fold.finish())
}

// ---------------------------------------------------------------------------
// Pipeline layout
// ---------------------------------------------------------------------------

/// Hash a pipeline layout descriptor.
///
/// # Errors
///
/// [`RecordError::UnknownReference`] for an unregistered set layout id.
pub fn pipeline_layout_hash(
    desc: &PipelineLayoutDesc,
    deps: &impl DependencyResolver,
) -> Result<Hash64, RecordError> {
    let mut fold = Fold::new(HashDomain::PipelineLayout);
    fold.u32(desc.flags);
    fold.count(desc.set_layouts.len());
    for &id in &desc.set_layouts {
        let hash = deps
            .resolve_set_layout(id)
            .ok_or_else(|| RecordError::UnknownReference {
                kind: ResourceKind::DescriptorSetLayout,
                id: id.value(),
            })?;
        fold.hash(hash);
    }
    fold.count(desc.push_constant_ranges.len());
    for range in &desc.push_constant_ranges {
        fold.u32(range.stage_flags.bits());
        fold.u32(range.offset);
        fold.u32(range.size);
    }
    Ok(fold.finish())
}

// ---------------------------------------------------------------------------
// Shader module
// ---------------------------------------------------------------------------

/// Hash a shader module descriptor.
///
/// # Errors
///
/// Infallible today; `Result` keeps the signature uniform across kinds.
pub fn shader_module_hash(desc: &ShaderModuleDesc) -> Result<Hash64, RecordError> {
    let mut fold = Fold::new(HashDomain::ShaderModule);
    fold.u32(desc.flags);
    fold.bytes(&desc.code);
    Ok(fold.finish())
}

// ---------------------------------------------------------------------------
// Render pass
// ---------------------------------------------------------------------------

fn fold_attachment_ref(fold: &mut Fold, reference: AttachmentReference) {
    fold.u32(reference.attachment);
    fold.u32(reference.layout);
}

/// Hash a render pass descriptor.
///
/// Dependency arrays fold exactly their `Vec` contents: the length is the
/// count, there is no detached pointer to over-read.
///
/// # Errors
///
/// [`RecordError::UnsupportedExtension`] if the chain carries an entry the
/// hasher does not recognize on render passes.
pub fn render_pass_hash(desc: &RenderPassDesc) -> Result<Hash64, RecordError> {
    let mut chain: Vec<&RenderPassChain> = desc.chain.iter().collect();
    chain.sort_by_key(|entry| entry.stype());

    let mut fold = Fold::new(HashDomain::RenderPass);
    fold.u32(desc.flags);

    fold.count(desc.attachments.len());
    for attachment in &desc.attachments {
        fold.u32(attachment.flags);
        fold.u32(attachment.format);
        fold.u32(attachment.samples);
        fold.u32(attachment.load_op.tag());
        fold.u32(attachment.store_op.tag());
        fold.u32(attachment.stencil_load_op.tag());
        fold.u32(attachment.stencil_store_op.tag());
        fold.u32(attachment.initial_layout);
        fold.u32(attachment.final_layout);
    }

    fold.count(desc.subpasses.len());
    for subpass in &desc.subpasses {
        fold.u32(subpass.flags);
        fold.u32(subpass.pipeline_bind_point.tag());
        fold.count(subpass.input_attachments.len());
        for &reference in &subpass.input_attachments {
            fold_attachment_ref(&mut fold, reference);
        }
        fold.count(subpass.color_attachments.len());
        for &reference in &subpass.color_attachments {
            fold_attachment_ref(&mut fold, reference);
        }
        fold.count(subpass.resolve_attachments.len());
        for &reference in &subpass.resolve_attachments {
            fold_attachment_ref(&mut fold, reference);
        }
        match subpass.depth_stencil_attachment {
            Some(reference) => {
                fold.u8(1);
                fold_attachment_ref(&mut fold, reference);
            }
            None => fold.u8(0),
        }
        fold.count(subpass.preserve_attachments.len());
        for &index in &subpass.preserve_attachments {
            fold.u32(index);
        }
    }

    fold.count(desc.dependencies.len());
    for dependency in &desc.dependencies {
        fold.u32(dependency.src_subpass);
        fold.u32(dependency.dst_subpass);
        fold.u32(dependency.src_stage_mask);
        fold.u32(dependency.dst_stage_mask);
        fold.u32(dependency.src_access_mask);
        fold.u32(dependency.dst_access_mask);
        fold.u32(dependency.dependency_flags);
    }

    fold.count(chain.len());
    for entry in chain {
        fold.u32(entry.stype());
        match entry {
            RenderPassChain::Multiview(info) => {
                fold.count(info.view_masks.len());
                for &mask in &info.view_masks {
                    fold.u32(mask);
                }
                fold.count(info.view_offsets.len());
                for &offset in &info.view_offsets {
                    fold.i32(offset);
                }
                fold.count(info.correlation_masks.len());
                for &mask in &info.correlation_masks {
                    fold.u32(mask);
                }
            }
        }
    }
    Ok(fold.finish())
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

fn fold_stage(
    fold: &mut Fold,
    stage: &PipelineShaderStage,
    deps: &impl DependencyResolver,
) -> Result<(), RecordError> {
    fold.u32(stage.flags);
    fold.u32(stage.stage.bits());
    let module =
        deps.resolve_shader_module(stage.module)
            .ok_or_else(|| RecordError::UnknownReference {
                kind: ResourceKind::ShaderModule,
                id: stage.module.value(),
            })?;
    fold.hash(module);
    fold.string(&stage.name);
    match &stage.specialization {
        Some(info) => {
            fold.u8(1);
            fold.count(info.map_entries.len());
            for entry in &info.map_entries {
                fold.u32(entry.constant_id);
                fold.u32(entry.offset);
                fold.u32(entry.size);
            }
            fold.bytes(&info.data);
        }
        None => fold.u8(0),
    }
    Ok(())
}

fn fold_base_pipeline(
    fold: &mut Fold,
    base: Option<PipelineId>,
    deps: &impl DependencyResolver,
) -> Result<(), RecordError> {
    match base {
        Some(id) => {
            let hash = deps
                .resolve_pipeline(id)
                .ok_or_else(|| RecordError::UnknownReference {
                    kind: ResourceKind::GraphicsPipeline,
                    id: id.value(),
                })?;
            fold.u8(1);
            fold.hash(hash);
        }
        None => fold.u8(0),
    }
    Ok(())
}

/// Hash a compute pipeline descriptor.
///
/// # Errors
///
/// [`RecordError::UnknownReference`] for an unregistered layout, module, or
/// base pipeline id.
pub fn compute_pipeline_hash(
    desc: &ComputePipelineDesc,
    deps: &impl DependencyResolver,
) -> Result<Hash64, RecordError> {
    let mut fold = Fold::new(HashDomain::ComputePipeline);
    fold.u32(desc.flags);
    fold_stage(&mut fold, &desc.stage, deps)?;
    let layout =
        deps.resolve_pipeline_layout(desc.layout)
            .ok_or_else(|| RecordError::UnknownReference {
                kind: ResourceKind::PipelineLayout,
                id: desc.layout.value(),
            })?;
    fold.hash(layout);
    fold_base_pipeline(&mut fold, desc.base_pipeline, deps)?;
    Ok(fold.finish())
}

fn fold_stencil_face(fold: &mut Fold, face: StencilOpState) {
    fold.u32(face.fail_op);
    fold.u32(face.pass_op);
    fold.u32(face.depth_fail_op);
    fold.u32(face.compare_op.tag());
    fold.u32(face.compare_mask);
    fold.u32(face.write_mask);
    fold.u32(face.reference);
}

/// Hash a graphics pipeline descriptor.
///
/// Absent state blocks contribute a single absence byte; a pipeline with a
/// rasterization block never collides with one without.
///
/// # Errors
///
/// [`RecordError::UnknownReference`] for an unregistered layout, module,
/// render pass, or base pipeline id.
#[allow(clippy::too_many_lines)]
pub fn graphics_pipeline_hash(
    desc: &GraphicsPipelineDesc,
    deps: &impl DependencyResolver,
) -> Result<Hash64, RecordError> {
    let mut fold = Fold::new(HashDomain::GraphicsPipeline);
    fold.u32(desc.flags);

    fold.count(desc.stages.len());
    for stage in &desc.stages {
        fold_stage(&mut fold, stage, deps)?;
    }

    match &desc.vertex_input {
        Some(state) => {
            fold.u8(1);
            fold.u32(state.flags);
            fold.count(state.bindings.len());
            for binding in &state.bindings {
                fold.u32(binding.binding);
                fold.u32(binding.stride);
                fold.u32(binding.input_rate.tag());
            }
            fold.count(state.attributes.len());
            for attribute in &state.attributes {
                fold.u32(attribute.location);
                fold.u32(attribute.binding);
                fold.u32(attribute.format);
                fold.u32(attribute.offset);
            }
        }
        None => fold.u8(0),
    }

    match &desc.input_assembly {
        Some(state) => {
            fold.u8(1);
            fold.u32(state.flags);
            fold.u32(state.topology);
            fold.boolean(state.primitive_restart_enable);
        }
        None => fold.u8(0),
    }

    match &desc.tessellation {
        Some(state) => {
            fold.u8(1);
            fold.u32(state.flags);
            fold.u32(state.patch_control_points);
        }
        None => fold.u8(0),
    }

    match &desc.viewport {
        Some(state) => {
            fold.u8(1);
            fold.u32(state.flags);
            fold.u32(state.viewport_count);
            fold.count(state.viewports.len());
            for viewport in &state.viewports {
                fold.f32(viewport.x);
                fold.f32(viewport.y);
                fold.f32(viewport.width);
                fold.f32(viewport.height);
                fold.f32(viewport.min_depth);
                fold.f32(viewport.max_depth);
            }
            fold.u32(state.scissor_count);
            fold.count(state.scissors.len());
            for scissor in &state.scissors {
                fold.i32(scissor.x);
                fold.i32(scissor.y);
                fold.u32(scissor.width);
                fold.u32(scissor.height);
            }
        }
        None => fold.u8(0),
    }

    match &desc.rasterization {
        Some(state) => {
            fold.u8(1);
            fold.u32(state.flags);
            fold.boolean(state.depth_clamp_enable);
            fold.boolean(state.rasterizer_discard_enable);
            fold.u32(state.polygon_mode);
            fold.u32(state.cull_mode);
            fold.u32(state.front_face);
            fold.boolean(state.depth_bias_enable);
            fold.f32(state.depth_bias_constant_factor);
            fold.f32(state.depth_bias_clamp);
            fold.f32(state.depth_bias_slope_factor);
            fold.f32(state.line_width);
        }
        None => fold.u8(0),
    }

    match &desc.multisample {
        Some(state) => {
            fold.u8(1);
            fold.u32(state.flags);
            fold.u32(state.rasterization_samples);
            fold.boolean(state.sample_shading_enable);
            fold.f32(state.min_sample_shading);
            fold.count(state.sample_mask.len());
            for &word in &state.sample_mask {
                fold.u32(word);
            }
            fold.boolean(state.alpha_to_coverage_enable);
            fold.boolean(state.alpha_to_one_enable);
        }
        None => fold.u8(0),
    }

    match &desc.depth_stencil {
        Some(state) => {
            fold.u8(1);
            fold.u32(state.flags);
            fold.boolean(state.depth_test_enable);
            fold.boolean(state.depth_write_enable);
            fold.u32(state.depth_compare_op.tag());
            fold.boolean(state.depth_bounds_test_enable);
            fold.boolean(state.stencil_test_enable);
            fold_stencil_face(&mut fold, state.front);
            fold_stencil_face(&mut fold, state.back);
            fold.f32(state.min_depth_bounds);
            fold.f32(state.max_depth_bounds);
        }
        None => fold.u8(0),
    }

    match &desc.color_blend {
        Some(state) => {
            fold.u8(1);
            fold.u32(state.flags);
            fold.boolean(state.logic_op_enable);
            fold.u32(state.logic_op);
            fold.count(state.attachments.len());
            for attachment in &state.attachments {
                fold.boolean(attachment.blend_enable);
                fold.u32(attachment.src_color_blend_factor);
                fold.u32(attachment.dst_color_blend_factor);
                fold.u32(attachment.color_blend_op);
                fold.u32(attachment.src_alpha_blend_factor);
                fold.u32(attachment.dst_alpha_blend_factor);
                fold.u32(attachment.alpha_blend_op);
                fold.u32(attachment.color_write_mask);
            }
            for constant in state.blend_constants {
                fold.f32(constant);
            }
        }
        None => fold.u8(0),
    }

    match &desc.dynamic {
        Some(state) => {
            fold.u8(1);
            fold.u32(state.flags);
            fold.count(state.dynamic_states.len());
            for &value in &state.dynamic_states {
                fold.u32(value);
            }
        }
        None => fold.u8(0),
    }

    let layout =
        deps.resolve_pipeline_layout(desc.layout)
            .ok_or_else(|| RecordError::UnknownReference {
                kind: ResourceKind::PipelineLayout,
                id: desc.layout.value(),
            })?;
    fold.hash(layout);
    let render_pass =
        deps.resolve_render_pass(desc.render_pass)
            .ok_or_else(|| RecordError::UnknownReference {
                kind: ResourceKind::RenderPass,
                id: desc.render_pass.value(),
            })?;
    fold.hash(render_pass);
    fold.u32(desc.subpass);
    fold_base_pipeline(&mut fold, desc.base_pipeline, deps)?;
    Ok(fold.finish())
}

// ---------------------------------------------------------------------------
// Singletons
// ---------------------------------------------------------------------------

/// Hash the application info singleton.
#[must_use]
pub fn application_info_hash(info: &ApplicationInfo) -> Hash64 {
    let mut fold = Fold::new(HashDomain::ApplicationInfo);
    fold.string(&info.application_name);
    fold.u32(info.application_version);
    fold.string(&info.engine_name);
    fold.u32(info.engine_version);
    fold.u32(info.api_version);
    fold.finish()
}

/// Hash the device features singleton.
#[must_use]
pub fn physical_device_features_hash(features: &PhysicalDeviceFeatures) -> Hash64 {
    let mut fold = Fold::new(HashDomain::PhysicalDeviceFeatures);
    let toggles = features.toggles();
    fold.count(toggles.len());
    for toggle in toggles {
        fold.boolean(toggle);
    }
    fold.finish()
}
