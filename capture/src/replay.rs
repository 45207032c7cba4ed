//! The replayer: topological delivery with per-object hash re-verification.
//!
//! Objects are delivered in dependency order (metadata singletons first,
//! then the seven object kinds). For every object the replayer recomputes
//! the content hash from the parsed descriptor; a mismatch against the
//! document's recorded hash skips that object but replay continues with its
//! siblings. An object whose dependency was skipped is itself skipped: its
//! hash cannot be verified and its handles cannot be substituted.
//!
//! Before delivery, dependency ids (content hashes in the document) are
//! rewritten to the handles the sink returned for the dependencies. A sink
//! that uses identity handles simply returns the hash it was given.

use std::collections::HashMap;

use crate::error::{ParseError, RecordError, SkipReason};
use crate::hash::{self, DependencyResolver};
use crate::id::{
    Hash64, PipelineId, PipelineLayoutId, RenderPassId, SamplerId, SetLayoutId, ShaderModuleId,
};
use crate::kind::ResourceKind;
use crate::model::{
    ApplicationInfo, ComputePipelineDesc, GraphicsPipelineDesc, PhysicalDeviceFeatures,
    PipelineLayoutDesc, PipelineShaderStage, RenderPassDesc, SamplerDesc, SetLayoutDesc,
    ShaderModuleDesc,
};
use crate::parse::{parse_document, StateDocument};

/// A sink's refusal of one object. Carries a human-readable reason for the
/// replay report; it does not abort the replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkRejection {
    pub detail: String,
}

impl SinkRejection {
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Consumer of replayed state.
///
/// Each method receives the expected content hash and the reconstructed
/// descriptor (dependency ids already rewritten to this sink's handles) and
/// returns the sink's handle for the new object. Returning an error skips
/// the object and everything that depends on it, nothing more.
pub trait StateSink {
    /// Accept the application info singleton.
    ///
    /// # Errors
    ///
    /// Rejection skips the singleton; replay continues.
    fn application_info(
        &mut self,
        _hash: Hash64,
        _info: &ApplicationInfo,
    ) -> Result<(), SinkRejection> {
        Ok(())
    }

    /// Accept the device features singleton.
    ///
    /// # Errors
    ///
    /// Rejection skips the singleton; replay continues.
    fn physical_device_features(
        &mut self,
        _hash: Hash64,
        _features: &PhysicalDeviceFeatures,
    ) -> Result<(), SinkRejection> {
        Ok(())
    }

    /// Accept a sampler.
    ///
    /// # Errors
    ///
    /// Rejection skips this object and its dependents.
    fn sampler(&mut self, hash: Hash64, desc: &SamplerDesc) -> Result<SamplerId, SinkRejection>;

    /// Accept a descriptor set layout.
    ///
    /// # Errors
    ///
    /// Rejection skips this object and its dependents.
    fn descriptor_set_layout(
        &mut self,
        hash: Hash64,
        desc: &SetLayoutDesc,
    ) -> Result<SetLayoutId, SinkRejection>;

    /// Accept a pipeline layout.
    ///
    /// # Errors
    ///
    /// Rejection skips this object and its dependents.
    fn pipeline_layout(
        &mut self,
        hash: Hash64,
        desc: &PipelineLayoutDesc,
    ) -> Result<PipelineLayoutId, SinkRejection>;

    /// Accept a shader module.
    ///
    /// # Errors
    ///
    /// Rejection skips this object and its dependents.
    fn shader_module(
        &mut self,
        hash: Hash64,
        desc: &ShaderModuleDesc,
    ) -> Result<ShaderModuleId, SinkRejection>;

    /// Accept a render pass.
    ///
    /// # Errors
    ///
    /// Rejection skips this object and its dependents.
    fn render_pass(
        &mut self,
        hash: Hash64,
        desc: &RenderPassDesc,
    ) -> Result<RenderPassId, SinkRejection>;

    /// Accept a compute pipeline.
    ///
    /// # Errors
    ///
    /// Rejection skips this object and its dependents.
    fn compute_pipeline(
        &mut self,
        hash: Hash64,
        desc: &ComputePipelineDesc,
    ) -> Result<PipelineId, SinkRejection>;

    /// Accept a graphics pipeline.
    ///
    /// # Errors
    ///
    /// Rejection skips this object and its dependents.
    fn graphics_pipeline(
        &mut self,
        hash: Hash64,
        desc: &GraphicsPipelineDesc,
    ) -> Result<PipelineId, SinkRejection>;
}

/// One skipped object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySkip {
    pub kind: ResourceKind,
    pub hash: Hash64,
    pub reason: SkipReason,
}

/// Outcome of a replay: how many objects were delivered, and which were
/// skipped and why.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub delivered: usize,
    pub skipped: Vec<ReplaySkip>,
}

impl ReplayReport {
    fn skip(&mut self, kind: ResourceKind, hash: Hash64, reason: SkipReason) {
        log::warn!("replay skipped {kind} {hash}: {reason}");
        self.skipped.push(ReplaySkip { kind, hash, reason });
    }
}

/// Content hashes of delivered objects mapped to the sink's handles.
///
/// Doubles as the [`DependencyResolver`] for re-verification: a reference id
/// in a parsed descriptor is the dependency's content hash, and it resolves
/// only if that dependency was actually delivered.
#[derive(Debug, Default)]
struct Delivered {
    samplers: HashMap<u64, u64>,
    set_layouts: HashMap<u64, u64>,
    pipeline_layouts: HashMap<u64, u64>,
    shader_modules: HashMap<u64, u64>,
    render_passes: HashMap<u64, u64>,
    pipelines: HashMap<u64, u64>,
}

fn resolve_in(map: &HashMap<u64, u64>, raw: u64) -> Option<Hash64> {
    map.contains_key(&raw).then_some(Hash64::new(raw))
}

impl DependencyResolver for Delivered {
    fn resolve_sampler(&self, id: SamplerId) -> Option<Hash64> {
        resolve_in(&self.samplers, id.value())
    }
    fn resolve_set_layout(&self, id: SetLayoutId) -> Option<Hash64> {
        resolve_in(&self.set_layouts, id.value())
    }
    fn resolve_pipeline_layout(&self, id: PipelineLayoutId) -> Option<Hash64> {
        resolve_in(&self.pipeline_layouts, id.value())
    }
    fn resolve_shader_module(&self, id: ShaderModuleId) -> Option<Hash64> {
        resolve_in(&self.shader_modules, id.value())
    }
    fn resolve_render_pass(&self, id: RenderPassId) -> Option<Hash64> {
        resolve_in(&self.render_passes, id.value())
    }
    fn resolve_pipeline(&self, id: PipelineId) -> Option<Hash64> {
        resolve_in(&self.pipelines, id.value())
    }
}

impl Delivered {
    // Substitution helpers. A reference that did not resolve is left
    // untouched; re-verification has already guaranteed that every folded
    // reference resolved, so only dead fields can pass through unmapped.

    fn sampler_handle(&self, id: SamplerId) -> SamplerId {
        self.samplers
            .get(&id.value())
            .map_or(id, |&handle| SamplerId::new(handle))
    }

    fn set_layout_handle(&self, id: SetLayoutId) -> SetLayoutId {
        self.set_layouts
            .get(&id.value())
            .map_or(id, |&handle| SetLayoutId::new(handle))
    }

    fn pipeline_layout_handle(&self, id: PipelineLayoutId) -> PipelineLayoutId {
        self.pipeline_layouts
            .get(&id.value())
            .map_or(id, |&handle| PipelineLayoutId::new(handle))
    }

    fn shader_module_handle(&self, id: ShaderModuleId) -> ShaderModuleId {
        self.shader_modules
            .get(&id.value())
            .map_or(id, |&handle| ShaderModuleId::new(handle))
    }

    fn render_pass_handle(&self, id: RenderPassId) -> RenderPassId {
        self.render_passes
            .get(&id.value())
            .map_or(id, |&handle| RenderPassId::new(handle))
    }

    fn pipeline_handle(&self, id: PipelineId) -> PipelineId {
        self.pipelines
            .get(&id.value())
            .map_or(id, |&handle| PipelineId::new(handle))
    }

    fn subst_set_layout(&self, desc: &SetLayoutDesc) -> SetLayoutDesc {
        let mut out = desc.clone();
        for binding in &mut out.bindings {
            for id in &mut binding.immutable_samplers {
                *id = self.sampler_handle(*id);
            }
        }
        out
    }

    fn subst_pipeline_layout(&self, desc: &PipelineLayoutDesc) -> PipelineLayoutDesc {
        let mut out = desc.clone();
        for id in &mut out.set_layouts {
            *id = self.set_layout_handle(*id);
        }
        out
    }

    fn subst_stage(&self, stage: &mut PipelineShaderStage) {
        stage.module = self.shader_module_handle(stage.module);
    }

    fn subst_compute_pipeline(&self, desc: &ComputePipelineDesc) -> ComputePipelineDesc {
        let mut out = desc.clone();
        self.subst_stage(&mut out.stage);
        out.layout = self.pipeline_layout_handle(out.layout);
        out.base_pipeline = out.base_pipeline.map(|id| self.pipeline_handle(id));
        out
    }

    fn subst_graphics_pipeline(&self, desc: &GraphicsPipelineDesc) -> GraphicsPipelineDesc {
        let mut out = desc.clone();
        for stage in &mut out.stages {
            self.subst_stage(stage);
        }
        out.layout = self.pipeline_layout_handle(out.layout);
        out.render_pass = self.render_pass_handle(out.render_pass);
        out.base_pipeline = out.base_pipeline.map(|id| self.pipeline_handle(id));
        out
    }
}

fn skip_reason(error: RecordError) -> SkipReason {
    match error {
        RecordError::UnknownReference { kind, id } => SkipReason::MissingDependency {
            kind,
            hash: Hash64::new(id),
        },
        RecordError::UnsupportedExtension { stype, .. } => {
            SkipReason::UnsupportedExtension { stype }
        }
    }
}

/// Replay a parsed document into `sink`.
///
/// # Errors
///
/// Never fails as a whole once the document is parsed; per-object failures
/// are collected in the returned [`ReplayReport`].
#[allow(clippy::too_many_lines)]
#[must_use]
pub fn replay_document(document: &StateDocument, sink: &mut dyn StateSink) -> ReplayReport {
    let mut report = ReplayReport::default();
    let mut delivered = Delivered::default();

    if let Some(info) = &document.application_info {
        let hash = hash::application_info_hash(info);
        match sink.application_info(hash, info) {
            Ok(()) => report.delivered += 1,
            Err(rejection) => report.skip(
                ResourceKind::ApplicationInfo,
                hash,
                SkipReason::SinkRejected {
                    detail: rejection.detail,
                },
            ),
        }
    }

    if let Some(features) = &document.physical_device_features {
        let hash = hash::physical_device_features_hash(features);
        match sink.physical_device_features(hash, features) {
            Ok(()) => report.delivered += 1,
            Err(rejection) => report.skip(
                ResourceKind::PhysicalDeviceFeatures,
                hash,
                SkipReason::SinkRejected {
                    detail: rejection.detail,
                },
            ),
        }
    }

    for (hash, desc) in &document.samplers {
        let kind = ResourceKind::Sampler;
        match hash::sampler_hash(desc) {
            Ok(recomputed) if recomputed == *hash => match sink.sampler(*hash, desc) {
                Ok(id) => {
                    delivered.samplers.insert(hash.value(), id.value());
                    report.delivered += 1;
                }
                Err(rejection) => report.skip(
                    kind,
                    *hash,
                    SkipReason::SinkRejected {
                        detail: rejection.detail,
                    },
                ),
            },
            Ok(recomputed) => report.skip(kind, *hash, SkipReason::HashMismatch { recomputed }),
            Err(error) => report.skip(kind, *hash, skip_reason(error)),
        }
    }

    for (hash, desc) in &document.set_layouts {
        let kind = ResourceKind::DescriptorSetLayout;
        match hash::set_layout_hash(desc, &delivered) {
            Ok(recomputed) if recomputed == *hash => {
                let substituted = delivered.subst_set_layout(desc);
                match sink.descriptor_set_layout(*hash, &substituted) {
                    Ok(id) => {
                        delivered.set_layouts.insert(hash.value(), id.value());
                        report.delivered += 1;
                    }
                    Err(rejection) => report.skip(
                        kind,
                        *hash,
                        SkipReason::SinkRejected {
                            detail: rejection.detail,
                        },
                    ),
                }
            }
            Ok(recomputed) => report.skip(kind, *hash, SkipReason::HashMismatch { recomputed }),
            Err(error) => report.skip(kind, *hash, skip_reason(error)),
        }
    }

    for (hash, desc) in &document.pipeline_layouts {
        let kind = ResourceKind::PipelineLayout;
        match hash::pipeline_layout_hash(desc, &delivered) {
            Ok(recomputed) if recomputed == *hash => {
                let substituted = delivered.subst_pipeline_layout(desc);
                match sink.pipeline_layout(*hash, &substituted) {
                    Ok(id) => {
                        delivered.pipeline_layouts.insert(hash.value(), id.value());
                        report.delivered += 1;
                    }
                    Err(rejection) => report.skip(
                        kind,
                        *hash,
                        SkipReason::SinkRejected {
                            detail: rejection.detail,
                        },
                    ),
                }
            }
            Ok(recomputed) => report.skip(kind, *hash, SkipReason::HashMismatch { recomputed }),
            Err(error) => report.skip(kind, *hash, skip_reason(error)),
        }
    }

    for (hash, desc) in &document.shader_modules {
        let kind = ResourceKind::ShaderModule;
        match hash::shader_module_hash(desc) {
            Ok(recomputed) if recomputed == *hash => match sink.shader_module(*hash, desc) {
                Ok(id) => {
                    delivered.shader_modules.insert(hash.value(), id.value());
                    report.delivered += 1;
                }
                Err(rejection) => report.skip(
                    kind,
                    *hash,
                    SkipReason::SinkRejected {
                        detail: rejection.detail,
                    },
                ),
            },
            Ok(recomputed) => report.skip(kind, *hash, SkipReason::HashMismatch { recomputed }),
            Err(error) => report.skip(kind, *hash, skip_reason(error)),
        }
    }

    for (hash, desc) in &document.render_passes {
        let kind = ResourceKind::RenderPass;
        match hash::render_pass_hash(desc) {
            Ok(recomputed) if recomputed == *hash => match sink.render_pass(*hash, desc) {
                Ok(id) => {
                    delivered.render_passes.insert(hash.value(), id.value());
                    report.delivered += 1;
                }
                Err(rejection) => report.skip(
                    kind,
                    *hash,
                    SkipReason::SinkRejected {
                        detail: rejection.detail,
                    },
                ),
            },
            Ok(recomputed) => report.skip(kind, *hash, SkipReason::HashMismatch { recomputed }),
            Err(error) => report.skip(kind, *hash, skip_reason(error)),
        }
    }

    for (hash, desc) in &document.compute_pipelines {
        let kind = ResourceKind::ComputePipeline;
        match hash::compute_pipeline_hash(desc, &delivered) {
            Ok(recomputed) if recomputed == *hash => {
                let substituted = delivered.subst_compute_pipeline(desc);
                match sink.compute_pipeline(*hash, &substituted) {
                    Ok(id) => {
                        delivered.pipelines.insert(hash.value(), id.value());
                        report.delivered += 1;
                    }
                    Err(rejection) => report.skip(
                        kind,
                        *hash,
                        SkipReason::SinkRejected {
                            detail: rejection.detail,
                        },
                    ),
                }
            }
            Ok(recomputed) => report.skip(kind, *hash, SkipReason::HashMismatch { recomputed }),
            Err(error) => report.skip(kind, *hash, skip_reason(error)),
        }
    }

    for (hash, desc) in &document.graphics_pipelines {
        let kind = ResourceKind::GraphicsPipeline;
        match hash::graphics_pipeline_hash(desc, &delivered) {
            Ok(recomputed) if recomputed == *hash => {
                let substituted = delivered.subst_graphics_pipeline(desc);
                match sink.graphics_pipeline(*hash, &substituted) {
                    Ok(id) => {
                        delivered.pipelines.insert(hash.value(), id.value());
                        report.delivered += 1;
                    }
                    Err(rejection) => report.skip(
                        kind,
                        *hash,
                        SkipReason::SinkRejected {
                            detail: rejection.detail,
                        },
                    ),
                }
            }
            Ok(recomputed) => report.skip(kind, *hash, SkipReason::HashMismatch { recomputed }),
            Err(error) => report.skip(kind, *hash, skip_reason(error)),
        }
    }

    report
}

/// Parse a textual document and replay it into `sink`.
///
/// # Errors
///
/// [`ParseError`] if the document itself is malformed. Per-object problems
/// do not fail the call; they are reported in the [`ReplayReport`].
pub fn replay(payload: &[u8], sink: &mut dyn StateSink) -> Result<ReplayReport, ParseError> {
    let document = parse_document(payload)?;
    Ok(replay_document(&document, sink))
}
