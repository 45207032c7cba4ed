//! Serialization of recorder state into the versioned textual document.
//!
//! The document is JSON built from `serde_json::Value` trees. Three rules
//! keep it byte-deterministic and portable:
//!
//! - object keys serialize sorted (`serde_json::Map` is a `BTreeMap`), and
//!   intern tables iterate in ascending hash order
//! - 64-bit values render as decimal strings to survive parsers without
//!   64-bit integers
//! - byte blobs render as base64
//!
//! Floats render as JSON numbers; NaN and infinity have no JSON rendering
//! and fail serialization rather than drifting silently.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::error::SerializeError;
use crate::id::Hash64;
use crate::kind::ResourceKind;
use crate::model::{
    ApplicationInfo, AttachmentReference, ColorBlendState, ComputePipelineDesc, DepthStencilState,
    DynamicState, GraphicsPipelineDesc, InputAssemblyState, MultisampleState,
    PhysicalDeviceFeatures, PipelineLayoutDesc, PipelineShaderStage, RasterizationState,
    RenderPassChain, RenderPassDesc, SamplerChain, SamplerDesc, SetLayoutDesc, ShaderModuleDesc,
    StencilOpState, TessellationState, VertexInputState, ViewportState,
};
use crate::record::Recorder;

/// Schema version tag of the textual document.
pub const DOCUMENT_VERSION: u64 = 1;

fn obj() -> Map<String, Value> {
    Map::new()
}

fn put_u32(map: &mut Map<String, Value>, field: &str, v: u32) {
    map.insert(field.to_string(), Value::from(v));
}

fn put_bool(map: &mut Map<String, Value>, field: &str, v: bool) {
    map.insert(field.to_string(), Value::Bool(v));
}

fn put_u64_str(map: &mut Map<String, Value>, field: &str, v: u64) {
    map.insert(field.to_string(), Value::String(v.to_string()));
}

fn put_blob(map: &mut Map<String, Value>, field: &str, bytes: &[u8]) {
    map.insert(field.to_string(), Value::String(BASE64.encode(bytes)));
}

fn put_f32(
    map: &mut Map<String, Value>,
    field: &'static str,
    v: f32,
) -> Result<(), SerializeError> {
    if !v.is_finite() {
        return Err(SerializeError::NonFiniteFloat { field });
    }
    map.insert(field.to_string(), Value::from(f64::from(v)));
    Ok(())
}

fn attachment_ref_json(reference: AttachmentReference) -> Value {
    let mut map = obj();
    put_u32(&mut map, "attachment", reference.attachment);
    put_u32(&mut map, "layout", reference.layout);
    Value::Object(map)
}

fn attachment_ref_list(references: &[AttachmentReference]) -> Value {
    Value::Array(
        references
            .iter()
            .map(|&reference| attachment_ref_json(reference))
            .collect(),
    )
}

pub(crate) fn sampler_json(desc: &SamplerDesc) -> Result<Value, SerializeError> {
    let mut map = obj();
    put_u32(&mut map, "flags", desc.flags);
    put_u32(&mut map, "magFilter", desc.mag_filter.tag());
    put_u32(&mut map, "minFilter", desc.min_filter.tag());
    put_u32(&mut map, "mipmapMode", desc.mipmap_mode.tag());
    put_u32(&mut map, "addressModeU", desc.address_mode_u.tag());
    put_u32(&mut map, "addressModeV", desc.address_mode_v.tag());
    put_u32(&mut map, "addressModeW", desc.address_mode_w.tag());
    put_f32(&mut map, "mipLodBias", desc.mip_lod_bias)?;
    put_bool(&mut map, "anisotropyEnable", desc.anisotropy_enable);
    put_f32(&mut map, "maxAnisotropy", desc.max_anisotropy)?;
    put_bool(&mut map, "compareEnable", desc.compare_enable);
    put_u32(&mut map, "compareOp", desc.compare_op.tag());
    put_f32(&mut map, "minLod", desc.min_lod)?;
    put_f32(&mut map, "maxLod", desc.max_lod)?;
    put_u32(&mut map, "borderColor", desc.border_color.tag());
    put_bool(
        &mut map,
        "unnormalizedCoordinates",
        desc.unnormalized_coordinates,
    );

    if !desc.chain.is_empty() {
        let mut entries = Vec::with_capacity(desc.chain.len());
        for entry in &desc.chain {
            let mut entry_map = obj();
            put_u32(&mut entry_map, "sType", entry.stype());
            match entry {
                SamplerChain::YcbcrConversion(info) => {
                    put_u32(&mut entry_map, "format", info.format);
                    put_u32(&mut entry_map, "ycbcrModel", info.ycbcr_model);
                    put_u32(&mut entry_map, "ycbcrRange", info.ycbcr_range);
                    entry_map.insert(
                        "components".to_string(),
                        Value::Array(
                            info.components
                                .iter()
                                .map(|swizzle| Value::from(swizzle.tag()))
                                .collect(),
                        ),
                    );
                    put_u32(&mut entry_map, "xChromaOffset", info.x_chroma_offset);
                    put_u32(&mut entry_map, "yChromaOffset", info.y_chroma_offset);
                    put_u32(&mut entry_map, "chromaFilter", info.chroma_filter.tag());
                    put_bool(
                        &mut entry_map,
                        "forceExplicitReconstruction",
                        info.force_explicit_reconstruction,
                    );
                }
                SamplerChain::ReductionMode(info) => {
                    put_u32(&mut entry_map, "reductionMode", info.reduction_mode);
                }
            }
            entries.push(Value::Object(entry_map));
        }
        map.insert("chain".to_string(), Value::Array(entries));
    }
    Ok(Value::Object(map))
}

pub(crate) fn set_layout_json(desc: &SetLayoutDesc) -> Value {
    let mut map = obj();
    put_u32(&mut map, "flags", desc.flags);
    let bindings = desc
        .bindings
        .iter()
        .map(|binding| {
            let mut binding_map = obj();
            put_u32(&mut binding_map, "binding", binding.binding);
            put_u32(
                &mut binding_map,
                "descriptorType",
                binding.descriptor_type.tag(),
            );
            put_u32(&mut binding_map, "descriptorCount", binding.descriptor_count);
            put_u32(&mut binding_map, "stageFlags", binding.stage_flags.bits());
            if !binding.immutable_samplers.is_empty() {
                binding_map.insert(
                    "immutableSamplers".to_string(),
                    Value::Array(
                        binding
                            .immutable_samplers
                            .iter()
                            .map(|id| Value::String(id.value().to_string()))
                            .collect(),
                    ),
                );
            }
            Value::Object(binding_map)
        })
        .collect();
    map.insert("bindings".to_string(), Value::Array(bindings));
    Value::Object(map)
}

pub(crate) fn pipeline_layout_json(desc: &PipelineLayoutDesc) -> Value {
    let mut map = obj();
    put_u32(&mut map, "flags", desc.flags);
    map.insert(
        "setLayouts".to_string(),
        Value::Array(
            desc.set_layouts
                .iter()
                .map(|id| Value::String(id.value().to_string()))
                .collect(),
        ),
    );
    let ranges = desc
        .push_constant_ranges
        .iter()
        .map(|range| {
            let mut range_map = obj();
            put_u32(&mut range_map, "stageFlags", range.stage_flags.bits());
            put_u32(&mut range_map, "offset", range.offset);
            put_u32(&mut range_map, "size", range.size);
            Value::Object(range_map)
        })
        .collect();
    map.insert("pushConstantRanges".to_string(), Value::Array(ranges));
    Value::Object(map)
}

pub(crate) fn shader_module_json(desc: &ShaderModuleDesc) -> Value {
    let mut map = obj();
    put_u32(&mut map, "flags", desc.flags);
    put_blob(&mut map, "code", &desc.code);
    Value::Object(map)
}

pub(crate) fn render_pass_json(desc: &RenderPassDesc) -> Value {
    let mut map = obj();
    put_u32(&mut map, "flags", desc.flags);

    let attachments = desc
        .attachments
        .iter()
        .map(|attachment| {
            let mut a = obj();
            put_u32(&mut a, "flags", attachment.flags);
            put_u32(&mut a, "format", attachment.format);
            put_u32(&mut a, "samples", attachment.samples);
            put_u32(&mut a, "loadOp", attachment.load_op.tag());
            put_u32(&mut a, "storeOp", attachment.store_op.tag());
            put_u32(&mut a, "stencilLoadOp", attachment.stencil_load_op.tag());
            put_u32(&mut a, "stencilStoreOp", attachment.stencil_store_op.tag());
            put_u32(&mut a, "initialLayout", attachment.initial_layout);
            put_u32(&mut a, "finalLayout", attachment.final_layout);
            Value::Object(a)
        })
        .collect();
    map.insert("attachments".to_string(), Value::Array(attachments));

    let subpasses = desc
        .subpasses
        .iter()
        .map(|subpass| {
            let mut s = obj();
            put_u32(&mut s, "flags", subpass.flags);
            put_u32(
                &mut s,
                "pipelineBindPoint",
                subpass.pipeline_bind_point.tag(),
            );
            s.insert(
                "inputAttachments".to_string(),
                attachment_ref_list(&subpass.input_attachments),
            );
            s.insert(
                "colorAttachments".to_string(),
                attachment_ref_list(&subpass.color_attachments),
            );
            s.insert(
                "resolveAttachments".to_string(),
                attachment_ref_list(&subpass.resolve_attachments),
            );
            if let Some(reference) = subpass.depth_stencil_attachment {
                s.insert(
                    "depthStencilAttachment".to_string(),
                    attachment_ref_json(reference),
                );
            }
            s.insert(
                "preserveAttachments".to_string(),
                Value::Array(
                    subpass
                        .preserve_attachments
                        .iter()
                        .map(|&index| Value::from(index))
                        .collect(),
                ),
            );
            Value::Object(s)
        })
        .collect();
    map.insert("subpasses".to_string(), Value::Array(subpasses));

    let dependencies = desc
        .dependencies
        .iter()
        .map(|dependency| {
            let mut d = obj();
            put_u32(&mut d, "srcSubpass", dependency.src_subpass);
            put_u32(&mut d, "dstSubpass", dependency.dst_subpass);
            put_u32(&mut d, "srcStageMask", dependency.src_stage_mask);
            put_u32(&mut d, "dstStageMask", dependency.dst_stage_mask);
            put_u32(&mut d, "srcAccessMask", dependency.src_access_mask);
            put_u32(&mut d, "dstAccessMask", dependency.dst_access_mask);
            put_u32(&mut d, "dependencyFlags", dependency.dependency_flags);
            Value::Object(d)
        })
        .collect();
    map.insert("dependencies".to_string(), Value::Array(dependencies));

    if !desc.chain.is_empty() {
        let entries = desc
            .chain
            .iter()
            .map(|entry| {
                let mut entry_map = obj();
                put_u32(&mut entry_map, "sType", entry.stype());
                match entry {
                    RenderPassChain::Multiview(info) => {
                        entry_map.insert(
                            "viewMasks".to_string(),
                            Value::Array(
                                info.view_masks.iter().map(|&m| Value::from(m)).collect(),
                            ),
                        );
                        entry_map.insert(
                            "viewOffsets".to_string(),
                            Value::Array(
                                info.view_offsets.iter().map(|&o| Value::from(o)).collect(),
                            ),
                        );
                        entry_map.insert(
                            "correlationMasks".to_string(),
                            Value::Array(
                                info.correlation_masks
                                    .iter()
                                    .map(|&m| Value::from(m))
                                    .collect(),
                            ),
                        );
                    }
                }
                Value::Object(entry_map)
            })
            .collect();
        map.insert("chain".to_string(), Value::Array(entries));
    }
    Value::Object(map)
}

fn stage_json(stage: &PipelineShaderStage) -> Value {
    let mut map = obj();
    put_u32(&mut map, "flags", stage.flags);
    put_u32(&mut map, "stage", stage.stage.bits());
    put_u64_str(&mut map, "module", stage.module.value());
    map.insert("name".to_string(), Value::String(stage.name.clone()));
    if let Some(info) = &stage.specialization {
        let mut spec_map = obj();
        let entries = info
            .map_entries
            .iter()
            .map(|entry| {
                let mut e = obj();
                put_u32(&mut e, "constantID", entry.constant_id);
                put_u32(&mut e, "offset", entry.offset);
                put_u32(&mut e, "size", entry.size);
                Value::Object(e)
            })
            .collect();
        spec_map.insert("mapEntries".to_string(), Value::Array(entries));
        put_blob(&mut spec_map, "data", &info.data);
        map.insert("specialization".to_string(), Value::Object(spec_map));
    }
    Value::Object(map)
}

pub(crate) fn compute_pipeline_json(desc: &ComputePipelineDesc) -> Value {
    let mut map = obj();
    put_u32(&mut map, "flags", desc.flags);
    map.insert("stage".to_string(), stage_json(&desc.stage));
    put_u64_str(&mut map, "layout", desc.layout.value());
    if let Some(base) = desc.base_pipeline {
        put_u64_str(&mut map, "basePipeline", base.value());
    }
    Value::Object(map)
}

fn vertex_input_json(state: &VertexInputState) -> Value {
    let mut map = obj();
    put_u32(&mut map, "flags", state.flags);
    let bindings = state
        .bindings
        .iter()
        .map(|binding| {
            let mut b = obj();
            put_u32(&mut b, "binding", binding.binding);
            put_u32(&mut b, "stride", binding.stride);
            put_u32(&mut b, "inputRate", binding.input_rate.tag());
            Value::Object(b)
        })
        .collect();
    map.insert("bindings".to_string(), Value::Array(bindings));
    let attributes = state
        .attributes
        .iter()
        .map(|attribute| {
            let mut a = obj();
            put_u32(&mut a, "location", attribute.location);
            put_u32(&mut a, "binding", attribute.binding);
            put_u32(&mut a, "format", attribute.format);
            put_u32(&mut a, "offset", attribute.offset);
            Value::Object(a)
        })
        .collect();
    map.insert("attributes".to_string(), Value::Array(attributes));
    Value::Object(map)
}

fn input_assembly_json(state: &InputAssemblyState) -> Value {
    let mut map = obj();
    put_u32(&mut map, "flags", state.flags);
    put_u32(&mut map, "topology", state.topology);
    put_bool(
        &mut map,
        "primitiveRestartEnable",
        state.primitive_restart_enable,
    );
    Value::Object(map)
}

fn tessellation_json(state: &TessellationState) -> Value {
    let mut map = obj();
    put_u32(&mut map, "flags", state.flags);
    put_u32(&mut map, "patchControlPoints", state.patch_control_points);
    Value::Object(map)
}

fn viewport_json(state: &ViewportState) -> Result<Value, SerializeError> {
    let mut map = obj();
    put_u32(&mut map, "flags", state.flags);
    put_u32(&mut map, "viewportCount", state.viewport_count);
    let mut viewports = Vec::with_capacity(state.viewports.len());
    for viewport in &state.viewports {
        let mut v = obj();
        put_f32(&mut v, "x", viewport.x)?;
        put_f32(&mut v, "y", viewport.y)?;
        put_f32(&mut v, "width", viewport.width)?;
        put_f32(&mut v, "height", viewport.height)?;
        put_f32(&mut v, "minDepth", viewport.min_depth)?;
        put_f32(&mut v, "maxDepth", viewport.max_depth)?;
        viewports.push(Value::Object(v));
    }
    map.insert("viewports".to_string(), Value::Array(viewports));
    put_u32(&mut map, "scissorCount", state.scissor_count);
    let scissors = state
        .scissors
        .iter()
        .map(|scissor| {
            let mut s = obj();
            s.insert("x".to_string(), Value::from(scissor.x));
            s.insert("y".to_string(), Value::from(scissor.y));
            put_u32(&mut s, "width", scissor.width);
            put_u32(&mut s, "height", scissor.height);
            Value::Object(s)
        })
        .collect();
    map.insert("scissors".to_string(), Value::Array(scissors));
    Ok(Value::Object(map))
}

fn rasterization_json(state: &RasterizationState) -> Result<Value, SerializeError> {
    let mut map = obj();
    put_u32(&mut map, "flags", state.flags);
    put_bool(&mut map, "depthClampEnable", state.depth_clamp_enable);
    put_bool(
        &mut map,
        "rasterizerDiscardEnable",
        state.rasterizer_discard_enable,
    );
    put_u32(&mut map, "polygonMode", state.polygon_mode);
    put_u32(&mut map, "cullMode", state.cull_mode);
    put_u32(&mut map, "frontFace", state.front_face);
    put_bool(&mut map, "depthBiasEnable", state.depth_bias_enable);
    put_f32(
        &mut map,
        "depthBiasConstantFactor",
        state.depth_bias_constant_factor,
    )?;
    put_f32(&mut map, "depthBiasClamp", state.depth_bias_clamp)?;
    put_f32(
        &mut map,
        "depthBiasSlopeFactor",
        state.depth_bias_slope_factor,
    )?;
    put_f32(&mut map, "lineWidth", state.line_width)?;
    Ok(Value::Object(map))
}

fn multisample_json(state: &MultisampleState) -> Result<Value, SerializeError> {
    let mut map = obj();
    put_u32(&mut map, "flags", state.flags);
    put_u32(&mut map, "rasterizationSamples", state.rasterization_samples);
    put_bool(&mut map, "sampleShadingEnable", state.sample_shading_enable);
    put_f32(&mut map, "minSampleShading", state.min_sample_shading)?;
    map.insert(
        "sampleMask".to_string(),
        Value::Array(state.sample_mask.iter().map(|&w| Value::from(w)).collect()),
    );
    put_bool(
        &mut map,
        "alphaToCoverageEnable",
        state.alpha_to_coverage_enable,
    );
    put_bool(&mut map, "alphaToOneEnable", state.alpha_to_one_enable);
    Ok(Value::Object(map))
}

fn stencil_face_json(face: StencilOpState) -> Value {
    let mut map = obj();
    put_u32(&mut map, "failOp", face.fail_op);
    put_u32(&mut map, "passOp", face.pass_op);
    put_u32(&mut map, "depthFailOp", face.depth_fail_op);
    put_u32(&mut map, "compareOp", face.compare_op.tag());
    put_u32(&mut map, "compareMask", face.compare_mask);
    put_u32(&mut map, "writeMask", face.write_mask);
    put_u32(&mut map, "reference", face.reference);
    Value::Object(map)
}

fn depth_stencil_json(state: &DepthStencilState) -> Result<Value, SerializeError> {
    let mut map = obj();
    put_u32(&mut map, "flags", state.flags);
    put_bool(&mut map, "depthTestEnable", state.depth_test_enable);
    put_bool(&mut map, "depthWriteEnable", state.depth_write_enable);
    put_u32(&mut map, "depthCompareOp", state.depth_compare_op.tag());
    put_bool(
        &mut map,
        "depthBoundsTestEnable",
        state.depth_bounds_test_enable,
    );
    put_bool(&mut map, "stencilTestEnable", state.stencil_test_enable);
    map.insert("front".to_string(), stencil_face_json(state.front));
    map.insert("back".to_string(), stencil_face_json(state.back));
    put_f32(&mut map, "minDepthBounds", state.min_depth_bounds)?;
    put_f32(&mut map, "maxDepthBounds", state.max_depth_bounds)?;
    Ok(Value::Object(map))
}

fn color_blend_json(state: &ColorBlendState) -> Result<Value, SerializeError> {
    let mut map = obj();
    put_u32(&mut map, "flags", state.flags);
    put_bool(&mut map, "logicOpEnable", state.logic_op_enable);
    put_u32(&mut map, "logicOp", state.logic_op);
    let attachments = state
        .attachments
        .iter()
        .map(|attachment| {
            let mut a = obj();
            put_bool(&mut a, "blendEnable", attachment.blend_enable);
            put_u32(
                &mut a,
                "srcColorBlendFactor",
                attachment.src_color_blend_factor,
            );
            put_u32(
                &mut a,
                "dstColorBlendFactor",
                attachment.dst_color_blend_factor,
            );
            put_u32(&mut a, "colorBlendOp", attachment.color_blend_op);
            put_u32(
                &mut a,
                "srcAlphaBlendFactor",
                attachment.src_alpha_blend_factor,
            );
            put_u32(
                &mut a,
                "dstAlphaBlendFactor",
                attachment.dst_alpha_blend_factor,
            );
            put_u32(&mut a, "alphaBlendOp", attachment.alpha_blend_op);
            put_u32(&mut a, "colorWriteMask", attachment.color_write_mask);
            Value::Object(a)
        })
        .collect();
    map.insert("attachments".to_string(), Value::Array(attachments));
    let mut constants = Vec::with_capacity(4);
    for constant in state.blend_constants {
        if !constant.is_finite() {
            return Err(SerializeError::NonFiniteFloat {
                field: "blendConstants",
            });
        }
        constants.push(Value::from(f64::from(constant)));
    }
    map.insert("blendConstants".to_string(), Value::Array(constants));
    Ok(Value::Object(map))
}

fn dynamic_json(state: &DynamicState) -> Value {
    let mut map = obj();
    put_u32(&mut map, "flags", state.flags);
    map.insert(
        "dynamicStates".to_string(),
        Value::Array(
            state
                .dynamic_states
                .iter()
                .map(|&v| Value::from(v))
                .collect(),
        ),
    );
    Value::Object(map)
}

pub(crate) fn graphics_pipeline_json(desc: &GraphicsPipelineDesc) -> Result<Value, SerializeError> {
    let mut map = obj();
    put_u32(&mut map, "flags", desc.flags);
    map.insert(
        "stages".to_string(),
        Value::Array(desc.stages.iter().map(stage_json).collect()),
    );
    if let Some(state) = &desc.vertex_input {
        map.insert("vertexInput".to_string(), vertex_input_json(state));
    }
    if let Some(state) = &desc.input_assembly {
        map.insert("inputAssembly".to_string(), input_assembly_json(state));
    }
    if let Some(state) = &desc.tessellation {
        map.insert("tessellation".to_string(), tessellation_json(state));
    }
    if let Some(state) = &desc.viewport {
        map.insert("viewport".to_string(), viewport_json(state)?);
    }
    if let Some(state) = &desc.rasterization {
        map.insert("rasterization".to_string(), rasterization_json(state)?);
    }
    if let Some(state) = &desc.multisample {
        map.insert("multisample".to_string(), multisample_json(state)?);
    }
    if let Some(state) = &desc.depth_stencil {
        map.insert("depthStencil".to_string(), depth_stencil_json(state)?);
    }
    if let Some(state) = &desc.color_blend {
        map.insert("colorBlend".to_string(), color_blend_json(state)?);
    }
    if let Some(state) = &desc.dynamic {
        map.insert("dynamic".to_string(), dynamic_json(state));
    }
    put_u64_str(&mut map, "layout", desc.layout.value());
    put_u64_str(&mut map, "renderPass", desc.render_pass.value());
    put_u32(&mut map, "subpass", desc.subpass);
    if let Some(base) = desc.base_pipeline {
        put_u64_str(&mut map, "basePipeline", base.value());
    }
    Ok(Value::Object(map))
}

pub(crate) fn application_info_json(info: &ApplicationInfo) -> Value {
    let mut map = obj();
    map.insert(
        "applicationName".to_string(),
        Value::String(info.application_name.clone()),
    );
    put_u32(&mut map, "applicationVersion", info.application_version);
    map.insert(
        "engineName".to_string(),
        Value::String(info.engine_name.clone()),
    );
    put_u32(&mut map, "engineVersion", info.engine_version);
    put_u32(&mut map, "apiVersion", info.api_version);
    Value::Object(map)
}

pub(crate) fn physical_device_features_json(features: &PhysicalDeviceFeatures) -> Value {
    let mut map = obj();
    for (name, value) in features.named_toggles() {
        map.insert(name.to_string(), Value::Bool(value));
    }
    Value::Object(map)
}

fn with_hash(hash: Hash64, value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            put_u64_str(&mut map, "hash", hash.value());
            Value::Object(map)
        }
        other => other,
    }
}

/// JSON array keys per kind, shared with the parser.
pub(crate) fn kind_key(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Sampler => "samplers",
        ResourceKind::DescriptorSetLayout => "setLayouts",
        ResourceKind::PipelineLayout => "pipelineLayouts",
        ResourceKind::ShaderModule => "shaderModules",
        ResourceKind::RenderPass => "renderPasses",
        ResourceKind::ComputePipeline => "computePipelines",
        ResourceKind::GraphicsPipeline => "graphicsPipelines",
        ResourceKind::ApplicationInfo => "applicationInfo",
        ResourceKind::PhysicalDeviceFeatures => "physicalDeviceFeatures",
    }
}

impl Recorder {
    /// Serialize the entire interned state into the textual document.
    ///
    /// Byte-identical output for equal intern state.
    ///
    /// # Errors
    ///
    /// [`SerializeError::NonFiniteFloat`] if any recorded float is NaN or
    /// infinite.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let mut root = obj();
        root.insert("version".to_string(), Value::from(DOCUMENT_VERSION));

        if let Some(info) = self.application_info() {
            root.insert(
                kind_key(ResourceKind::ApplicationInfo).to_string(),
                application_info_json(info),
            );
        }
        if let Some(features) = self.physical_device_features() {
            root.insert(
                kind_key(ResourceKind::PhysicalDeviceFeatures).to_string(),
                physical_device_features_json(features),
            );
        }

        let mut samplers = Vec::new();
        for (&hash, desc) in self.samplers() {
            samplers.push(with_hash(hash, sampler_json(desc)?));
        }
        insert_kind(&mut root, ResourceKind::Sampler, samplers);

        let set_layouts = self
            .set_layouts()
            .iter()
            .map(|(&hash, desc)| with_hash(hash, set_layout_json(desc)))
            .collect();
        insert_kind(&mut root, ResourceKind::DescriptorSetLayout, set_layouts);

        let pipeline_layouts = self
            .pipeline_layouts()
            .iter()
            .map(|(&hash, desc)| with_hash(hash, pipeline_layout_json(desc)))
            .collect();
        insert_kind(&mut root, ResourceKind::PipelineLayout, pipeline_layouts);

        let shader_modules = self
            .shader_modules()
            .iter()
            .map(|(&hash, desc)| with_hash(hash, shader_module_json(desc)))
            .collect();
        insert_kind(&mut root, ResourceKind::ShaderModule, shader_modules);

        let render_passes = self
            .render_passes()
            .iter()
            .map(|(&hash, desc)| with_hash(hash, render_pass_json(desc)))
            .collect();
        insert_kind(&mut root, ResourceKind::RenderPass, render_passes);

        let compute_pipelines = self
            .compute_pipelines()
            .iter()
            .map(|(&hash, desc)| with_hash(hash, compute_pipeline_json(desc)))
            .collect();
        insert_kind(&mut root, ResourceKind::ComputePipeline, compute_pipelines);

        let mut graphics_pipelines = Vec::new();
        for (&hash, desc) in self.graphics_pipelines() {
            graphics_pipelines.push(with_hash(hash, graphics_pipeline_json(desc)?));
        }
        insert_kind(&mut root, ResourceKind::GraphicsPipeline, graphics_pipelines);

        render(root)
    }

    /// Serialize one interned object as a single-entry document, suitable as
    /// an archive blob payload. The replayer accepts such documents
    /// transparently.
    ///
    /// # Errors
    ///
    /// [`SerializeError::UnknownEntry`] if `(kind, hash)` is not interned;
    /// [`SerializeError::NonFiniteFloat`] as for [`Recorder::serialize`].
    pub fn serialize_entry(
        &self,
        kind: ResourceKind,
        hash: Hash64,
    ) -> Result<Vec<u8>, SerializeError> {
        let mut root = obj();
        root.insert("version".to_string(), Value::from(DOCUMENT_VERSION));

        let missing = || SerializeError::UnknownEntry { kind, hash };
        match kind {
            ResourceKind::Sampler => {
                let desc = self.sampler(hash).ok_or_else(missing)?;
                let entry = with_hash(hash, sampler_json(desc)?);
                insert_kind(&mut root, kind, vec![entry]);
            }
            ResourceKind::DescriptorSetLayout => {
                let desc = self.set_layout(hash).ok_or_else(missing)?;
                insert_kind(&mut root, kind, vec![with_hash(hash, set_layout_json(desc))]);
            }
            ResourceKind::PipelineLayout => {
                let desc = self.pipeline_layout(hash).ok_or_else(missing)?;
                insert_kind(
                    &mut root,
                    kind,
                    vec![with_hash(hash, pipeline_layout_json(desc))],
                );
            }
            ResourceKind::ShaderModule => {
                let desc = self.shader_module(hash).ok_or_else(missing)?;
                insert_kind(
                    &mut root,
                    kind,
                    vec![with_hash(hash, shader_module_json(desc))],
                );
            }
            ResourceKind::RenderPass => {
                let desc = self.render_pass(hash).ok_or_else(missing)?;
                insert_kind(&mut root, kind, vec![with_hash(hash, render_pass_json(desc))]);
            }
            ResourceKind::ComputePipeline => {
                let desc = self.compute_pipeline(hash).ok_or_else(missing)?;
                insert_kind(
                    &mut root,
                    kind,
                    vec![with_hash(hash, compute_pipeline_json(desc))],
                );
            }
            ResourceKind::GraphicsPipeline => {
                let desc = self.graphics_pipeline(hash).ok_or_else(missing)?;
                let entry = with_hash(hash, graphics_pipeline_json(desc)?);
                insert_kind(&mut root, kind, vec![entry]);
            }
            ResourceKind::ApplicationInfo => {
                let info = self.application_info().ok_or_else(missing)?;
                root.insert(kind_key(kind).to_string(), application_info_json(info));
            }
            ResourceKind::PhysicalDeviceFeatures => {
                let features = self.physical_device_features().ok_or_else(missing)?;
                root.insert(
                    kind_key(kind).to_string(),
                    physical_device_features_json(features),
                );
            }
        }
        render(root)
    }
}

fn insert_kind(root: &mut Map<String, Value>, kind: ResourceKind, entries: Vec<Value>) {
    if !entries.is_empty() {
        root.insert(kind_key(kind).to_string(), Value::Array(entries));
    }
}

fn render(root: Map<String, Value>) -> Result<Vec<u8>, SerializeError> {
    // Compact form; Map iterates key-sorted, so the bytes are stable.
    serde_json::to_vec(&Value::Object(root)).map_err(|e| SerializeError::Render {
        detail: e.to_string(),
    })
}
