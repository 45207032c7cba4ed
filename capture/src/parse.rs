//! Fail-closed parsing of the textual state document.
//!
//! Every field access is typed and produces a [`ParseError`] naming the
//! offending field; nothing is defaulted silently except arrays the
//! serializer omits when empty.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::id::{
    Hash64, PipelineId, PipelineLayoutId, RenderPassId, SamplerId, SetLayoutId, ShaderModuleId,
};
use crate::kind::ResourceKind;
use crate::model::{
    AddressMode, ApplicationInfo, AttachmentDescription, AttachmentReference, BindPoint,
    BorderColor, ColorBlendAttachment, ColorBlendState, CompareOp, ComponentSwizzle,
    ComputePipelineDesc, DepthStencilState, DescriptorSetLayoutBinding, DescriptorType,
    DynamicState, Filter, GraphicsPipelineDesc, InputAssemblyState, InputRate, LoadOp,
    MipmapMode, MultisampleState, MultiviewInfo, PhysicalDeviceFeatures, PipelineLayoutDesc,
    PipelineShaderStage, PushConstantRange, RasterizationState, ReductionModeInfo,
    RenderPassChain, RenderPassDesc, SamplerChain, SamplerDesc, ScissorRect, SetLayoutDesc,
    ShaderModuleDesc, ShaderStageFlags, SpecializationInfo, SpecializationMapEntry, StencilOpState,
    StoreOp, SubpassDependency, SubpassDescription, TessellationState, VertexInputAttribute,
    VertexInputBinding, VertexInputState, Viewport, ViewportState, YcbcrConversionInfo,
};
use crate::serialize::{kind_key, DOCUMENT_VERSION};

/// A fully parsed state document, descriptors in canonical form (reference
/// ids hold content hashes).
#[derive(Debug, Default, PartialEq)]
pub struct StateDocument {
    pub application_info: Option<ApplicationInfo>,
    pub physical_device_features: Option<PhysicalDeviceFeatures>,
    pub samplers: Vec<(Hash64, SamplerDesc)>,
    pub set_layouts: Vec<(Hash64, SetLayoutDesc)>,
    pub pipeline_layouts: Vec<(Hash64, PipelineLayoutDesc)>,
    pub shader_modules: Vec<(Hash64, ShaderModuleDesc)>,
    pub render_passes: Vec<(Hash64, RenderPassDesc)>,
    pub compute_pipelines: Vec<(Hash64, ComputePipelineDesc)>,
    pub graphics_pipelines: Vec<(Hash64, GraphicsPipelineDesc)>,
}

// ---------------------------------------------------------------------------
// Field access helpers
// ---------------------------------------------------------------------------

fn as_object<'a>(
    value: &'a Value,
    field: &'static str,
) -> Result<&'a Map<String, Value>, ParseError> {
    value.as_object().ok_or_else(|| ParseError::InvalidField {
        field,
        detail: "expected object".to_string(),
    })
}

fn get<'a>(map: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, ParseError> {
    map.get(field).ok_or(ParseError::MissingField { field })
}

fn get_u32(map: &Map<String, Value>, field: &'static str) -> Result<u32, ParseError> {
    let value = get(map, field)?;
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| ParseError::InvalidField {
            field,
            detail: format!("expected u32, got {value}"),
        })
}

fn get_i32(map: &Map<String, Value>, field: &'static str) -> Result<i32, ParseError> {
    let value = get(map, field)?;
    value
        .as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| ParseError::InvalidField {
            field,
            detail: format!("expected i32, got {value}"),
        })
}

fn get_bool(map: &Map<String, Value>, field: &'static str) -> Result<bool, ParseError> {
    let value = get(map, field)?;
    value.as_bool().ok_or_else(|| ParseError::InvalidField {
        field,
        detail: format!("expected bool, got {value}"),
    })
}

#[allow(clippy::cast_possible_truncation)]
fn get_f32(map: &Map<String, Value>, field: &'static str) -> Result<f32, ParseError> {
    let value = get(map, field)?;
    value
        .as_f64()
        .map(|v| v as f32)
        .ok_or_else(|| ParseError::InvalidField {
            field,
            detail: format!("expected number, got {value}"),
        })
}

fn get_str<'a>(map: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, ParseError> {
    let value = get(map, field)?;
    value.as_str().ok_or_else(|| ParseError::InvalidField {
        field,
        detail: format!("expected string, got {value}"),
    })
}

fn decimal_u64(raw: &str) -> Result<u64, ParseError> {
    Hash64::parse_decimal(raw)
        .map(Hash64::value)
        .ok_or_else(|| ParseError::InvalidHash {
            raw: raw.to_string(),
        })
}

fn get_u64_str(map: &Map<String, Value>, field: &'static str) -> Result<u64, ParseError> {
    decimal_u64(get_str(map, field)?)
}

fn get_blob(map: &Map<String, Value>, field: &'static str) -> Result<Vec<u8>, ParseError> {
    BASE64
        .decode(get_str(map, field)?)
        .map_err(|_| ParseError::InvalidBlob { field })
}

fn get_array<'a>(
    map: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a [Value], ParseError> {
    let value = get(map, field)?;
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| ParseError::InvalidField {
            field,
            detail: format!("expected array, got {value}"),
        })
}

/// Array the serializer omits when empty.
fn opt_array<'a>(
    map: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a [Value], ParseError> {
    match map.get(field) {
        None => Ok(&[]),
        Some(value) => value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| ParseError::InvalidField {
                field,
                detail: format!("expected array, got {value}"),
            }),
    }
}

fn get_tagged<T>(
    map: &Map<String, Value>,
    field: &'static str,
    from_tag: impl Fn(u32) -> Option<T>,
) -> Result<T, ParseError> {
    let tag = get_u32(map, field)?;
    from_tag(tag).ok_or_else(|| ParseError::InvalidField {
        field,
        detail: format!("unknown tag {tag}"),
    })
}

fn get_stage_flags(map: &Map<String, Value>, field: &'static str) -> Result<ShaderStageFlags, ParseError> {
    let bits = get_u32(map, field)?;
    ShaderStageFlags::from_bits(bits).ok_or_else(|| ParseError::InvalidField {
        field,
        detail: format!("unknown stage bits {bits:#x}"),
    })
}

fn entry_hash(map: &Map<String, Value>) -> Result<Hash64, ParseError> {
    Ok(Hash64::new(get_u64_str(map, "hash")?))
}

// ---------------------------------------------------------------------------
// Descriptor parsers
// ---------------------------------------------------------------------------

fn parse_sampler(map: &Map<String, Value>) -> Result<SamplerDesc, ParseError> {
    let mut chain = Vec::new();
    for entry in opt_array(map, "chain")? {
        let entry_map = as_object(entry, "chain")?;
        let stype = get_u32(entry_map, "sType")?;
        match stype {
            crate::model::stype::SAMPLER_YCBCR_CONVERSION => {
                let raw_components = get_array(entry_map, "components")?;
                if raw_components.len() != 4 {
                    return Err(ParseError::InvalidField {
                        field: "components",
                        detail: format!("expected 4 entries, got {}", raw_components.len()),
                    });
                }
                let mut components = [ComponentSwizzle::Identity; 4];
                for (slot, value) in components.iter_mut().zip(raw_components) {
                    let tag = value.as_u64().and_then(|v| u32::try_from(v).ok()).ok_or_else(
                        || ParseError::InvalidField {
                            field: "components",
                            detail: "expected u32 tags".to_string(),
                        },
                    )?;
                    *slot =
                        ComponentSwizzle::from_tag(tag).ok_or_else(|| ParseError::InvalidField {
                            field: "components",
                            detail: format!("unknown tag {tag}"),
                        })?;
                }
                chain.push(SamplerChain::YcbcrConversion(YcbcrConversionInfo {
                    format: get_u32(entry_map, "format")?,
                    ycbcr_model: get_u32(entry_map, "ycbcrModel")?,
                    ycbcr_range: get_u32(entry_map, "ycbcrRange")?,
                    components,
                    x_chroma_offset: get_u32(entry_map, "xChromaOffset")?,
                    y_chroma_offset: get_u32(entry_map, "yChromaOffset")?,
                    chroma_filter: get_tagged(entry_map, "chromaFilter", Filter::from_tag)?,
                    force_explicit_reconstruction: get_bool(
                        entry_map,
                        "forceExplicitReconstruction",
                    )?,
                }));
            }
            crate::model::stype::SAMPLER_REDUCTION_MODE => {
                chain.push(SamplerChain::ReductionMode(ReductionModeInfo {
                    reduction_mode: get_u32(entry_map, "reductionMode")?,
                }));
            }
            other => {
                return Err(ParseError::InvalidField {
                    field: "sType",
                    detail: format!("unknown structure tag {other}"),
                })
            }
        }
    }

    Ok(SamplerDesc {
        flags: get_u32(map, "flags")?,
        mag_filter: get_tagged(map, "magFilter", Filter::from_tag)?,
        min_filter: get_tagged(map, "minFilter", Filter::from_tag)?,
        mipmap_mode: get_tagged(map, "mipmapMode", MipmapMode::from_tag)?,
        address_mode_u: get_tagged(map, "addressModeU", AddressMode::from_tag)?,
        address_mode_v: get_tagged(map, "addressModeV", AddressMode::from_tag)?,
        address_mode_w: get_tagged(map, "addressModeW", AddressMode::from_tag)?,
        mip_lod_bias: get_f32(map, "mipLodBias")?,
        anisotropy_enable: get_bool(map, "anisotropyEnable")?,
        max_anisotropy: get_f32(map, "maxAnisotropy")?,
        compare_enable: get_bool(map, "compareEnable")?,
        compare_op: get_tagged(map, "compareOp", CompareOp::from_tag)?,
        min_lod: get_f32(map, "minLod")?,
        max_lod: get_f32(map, "maxLod")?,
        border_color: get_tagged(map, "borderColor", BorderColor::from_tag)?,
        unnormalized_coordinates: get_bool(map, "unnormalizedCoordinates")?,
        chain,
    })
}

fn parse_set_layout(map: &Map<String, Value>) -> Result<SetLayoutDesc, ParseError> {
    let mut bindings = Vec::new();
    for entry in get_array(map, "bindings")? {
        let binding_map = as_object(entry, "bindings")?;
        let mut immutable_samplers = Vec::new();
        for id in opt_array(binding_map, "immutableSamplers")? {
            let raw = id.as_str().ok_or_else(|| ParseError::InvalidField {
                field: "immutableSamplers",
                detail: "expected decimal strings".to_string(),
            })?;
            immutable_samplers.push(SamplerId::new(decimal_u64(raw)?));
        }
        bindings.push(DescriptorSetLayoutBinding {
            binding: get_u32(binding_map, "binding")?,
            descriptor_type: get_tagged(binding_map, "descriptorType", DescriptorType::from_tag)?,
            descriptor_count: get_u32(binding_map, "descriptorCount")?,
            stage_flags: get_stage_flags(binding_map, "stageFlags")?,
            immutable_samplers,
        });
    }
    Ok(SetLayoutDesc {
        flags: get_u32(map, "flags")?,
        bindings,
    })
}

fn parse_pipeline_layout(map: &Map<String, Value>) -> Result<PipelineLayoutDesc, ParseError> {
    let mut set_layouts = Vec::new();
    for id in get_array(map, "setLayouts")? {
        let raw = id.as_str().ok_or_else(|| ParseError::InvalidField {
            field: "setLayouts",
            detail: "expected decimal strings".to_string(),
        })?;
        set_layouts.push(SetLayoutId::new(decimal_u64(raw)?));
    }
    let mut push_constant_ranges = Vec::new();
    for entry in get_array(map, "pushConstantRanges")? {
        let range_map = as_object(entry, "pushConstantRanges")?;
        push_constant_ranges.push(PushConstantRange {
            stage_flags: get_stage_flags(range_map, "stageFlags")?,
            offset: get_u32(range_map, "offset")?,
            size: get_u32(range_map, "size")?,
        });
    }
    Ok(PipelineLayoutDesc {
        flags: get_u32(map, "flags")?,
        set_layouts,
        push_constant_ranges,
    })
}

fn parse_shader_module(map: &Map<String, Value>) -> Result<ShaderModuleDesc, ParseError> {
    Ok(ShaderModuleDesc {
        flags: get_u32(map, "flags")?,
        code: get_blob(map, "code")?,
    })
}

fn parse_attachment_ref(value: &Value) -> Result<AttachmentReference, ParseError> {
    let map = as_object(value, "attachment reference")?;
    Ok(AttachmentReference {
        attachment: get_u32(map, "attachment")?,
        layout: get_u32(map, "layout")?,
    })
}

fn parse_attachment_refs(values: &[Value]) -> Result<Vec<AttachmentReference>, ParseError> {
    values.iter().map(parse_attachment_ref).collect()
}

fn parse_render_pass(map: &Map<String, Value>) -> Result<RenderPassDesc, ParseError> {
    let mut attachments = Vec::new();
    for entry in get_array(map, "attachments")? {
        let a = as_object(entry, "attachments")?;
        attachments.push(AttachmentDescription {
            flags: get_u32(a, "flags")?,
            format: get_u32(a, "format")?,
            samples: get_u32(a, "samples")?,
            load_op: get_tagged(a, "loadOp", LoadOp::from_tag)?,
            store_op: get_tagged(a, "storeOp", StoreOp::from_tag)?,
            stencil_load_op: get_tagged(a, "stencilLoadOp", LoadOp::from_tag)?,
            stencil_store_op: get_tagged(a, "stencilStoreOp", StoreOp::from_tag)?,
            initial_layout: get_u32(a, "initialLayout")?,
            final_layout: get_u32(a, "finalLayout")?,
        });
    }

    let mut subpasses = Vec::new();
    for entry in get_array(map, "subpasses")? {
        let s = as_object(entry, "subpasses")?;
        let depth_stencil_attachment = match s.get("depthStencilAttachment") {
            None => None,
            Some(value) => Some(parse_attachment_ref(value)?),
        };
        let mut preserve_attachments = Vec::new();
        for index in get_array(s, "preserveAttachments")? {
            let value = index.as_u64().and_then(|v| u32::try_from(v).ok()).ok_or_else(
                || ParseError::InvalidField {
                    field: "preserveAttachments",
                    detail: "expected u32 entries".to_string(),
                },
            )?;
            preserve_attachments.push(value);
        }
        subpasses.push(SubpassDescription {
            flags: get_u32(s, "flags")?,
            pipeline_bind_point: get_tagged(s, "pipelineBindPoint", BindPoint::from_tag)?,
            input_attachments: parse_attachment_refs(get_array(s, "inputAttachments")?)?,
            color_attachments: parse_attachment_refs(get_array(s, "colorAttachments")?)?,
            resolve_attachments: parse_attachment_refs(get_array(s, "resolveAttachments")?)?,
            depth_stencil_attachment,
            preserve_attachments,
        });
    }

    let mut dependencies = Vec::new();
    for entry in get_array(map, "dependencies")? {
        let d = as_object(entry, "dependencies")?;
        dependencies.push(SubpassDependency {
            src_subpass: get_u32(d, "srcSubpass")?,
            dst_subpass: get_u32(d, "dstSubpass")?,
            src_stage_mask: get_u32(d, "srcStageMask")?,
            dst_stage_mask: get_u32(d, "dstStageMask")?,
            src_access_mask: get_u32(d, "srcAccessMask")?,
            dst_access_mask: get_u32(d, "dstAccessMask")?,
            dependency_flags: get_u32(d, "dependencyFlags")?,
        });
    }

    let mut chain = Vec::new();
    for entry in opt_array(map, "chain")? {
        let entry_map = as_object(entry, "chain")?;
        let stype = get_u32(entry_map, "sType")?;
        match stype {
            crate::model::stype::RENDER_PASS_MULTIVIEW => {
                chain.push(RenderPassChain::Multiview(MultiviewInfo {
                    view_masks: parse_u32_array(entry_map, "viewMasks")?,
                    view_offsets: parse_i32_array(entry_map, "viewOffsets")?,
                    correlation_masks: parse_u32_array(entry_map, "correlationMasks")?,
                }));
            }
            other => {
                return Err(ParseError::InvalidField {
                    field: "sType",
                    detail: format!("unknown structure tag {other}"),
                })
            }
        }
    }

    Ok(RenderPassDesc {
        flags: get_u32(map, "flags")?,
        attachments,
        subpasses,
        dependencies,
        chain,
    })
}

fn parse_u32_array(map: &Map<String, Value>, field: &'static str) -> Result<Vec<u32>, ParseError> {
    get_array(map, field)?
        .iter()
        .map(|value| {
            value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| ParseError::InvalidField {
                    field,
                    detail: "expected u32 entries".to_string(),
                })
        })
        .collect()
}

fn parse_i32_array(map: &Map<String, Value>, field: &'static str) -> Result<Vec<i32>, ParseError> {
    get_array(map, field)?
        .iter()
        .map(|value| {
            value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| ParseError::InvalidField {
                    field,
                    detail: "expected i32 entries".to_string(),
                })
        })
        .collect()
}

fn parse_stage(value: &Value) -> Result<PipelineShaderStage, ParseError> {
    let map = as_object(value, "stage")?;
    let specialization = match map.get("specialization") {
        None => None,
        Some(spec) => {
            let spec_map = as_object(spec, "specialization")?;
            let mut map_entries = Vec::new();
            for entry in get_array(spec_map, "mapEntries")? {
                let e = as_object(entry, "mapEntries")?;
                map_entries.push(SpecializationMapEntry {
                    constant_id: get_u32(e, "constantID")?,
                    offset: get_u32(e, "offset")?,
                    size: get_u32(e, "size")?,
                });
            }
            Some(SpecializationInfo {
                map_entries,
                data: get_blob(spec_map, "data")?,
            })
        }
    };
    Ok(PipelineShaderStage {
        flags: get_u32(map, "flags")?,
        stage: get_stage_flags(map, "stage")?,
        module: ShaderModuleId::new(get_u64_str(map, "module")?),
        name: get_str(map, "name")?.to_string(),
        specialization,
    })
}

fn parse_base_pipeline(map: &Map<String, Value>) -> Result<Option<PipelineId>, ParseError> {
    match map.get("basePipeline") {
        None => Ok(None),
        Some(value) => {
            let raw = value.as_str().ok_or_else(|| ParseError::InvalidField {
                field: "basePipeline",
                detail: "expected decimal string".to_string(),
            })?;
            Ok(Some(PipelineId::new(decimal_u64(raw)?)))
        }
    }
}

fn parse_compute_pipeline(map: &Map<String, Value>) -> Result<ComputePipelineDesc, ParseError> {
    Ok(ComputePipelineDesc {
        flags: get_u32(map, "flags")?,
        stage: parse_stage(get(map, "stage")?)?,
        layout: PipelineLayoutId::new(get_u64_str(map, "layout")?),
        base_pipeline: parse_base_pipeline(map)?,
    })
}

#[allow(clippy::too_many_lines)]
fn parse_graphics_pipeline(map: &Map<String, Value>) -> Result<GraphicsPipelineDesc, ParseError> {
    let mut stages = Vec::new();
    for stage in get_array(map, "stages")? {
        stages.push(parse_stage(stage)?);
    }

    let vertex_input = match map.get("vertexInput") {
        None => None,
        Some(value) => {
            let v = as_object(value, "vertexInput")?;
            let mut bindings = Vec::new();
            for entry in get_array(v, "bindings")? {
                let b = as_object(entry, "bindings")?;
                bindings.push(VertexInputBinding {
                    binding: get_u32(b, "binding")?,
                    stride: get_u32(b, "stride")?,
                    input_rate: get_tagged(b, "inputRate", InputRate::from_tag)?,
                });
            }
            let mut attributes = Vec::new();
            for entry in get_array(v, "attributes")? {
                let a = as_object(entry, "attributes")?;
                attributes.push(VertexInputAttribute {
                    location: get_u32(a, "location")?,
                    binding: get_u32(a, "binding")?,
                    format: get_u32(a, "format")?,
                    offset: get_u32(a, "offset")?,
                });
            }
            Some(VertexInputState {
                flags: get_u32(v, "flags")?,
                bindings,
                attributes,
            })
        }
    };

    let input_assembly = match map.get("inputAssembly") {
        None => None,
        Some(value) => {
            let i = as_object(value, "inputAssembly")?;
            Some(InputAssemblyState {
                flags: get_u32(i, "flags")?,
                topology: get_u32(i, "topology")?,
                primitive_restart_enable: get_bool(i, "primitiveRestartEnable")?,
            })
        }
    };

    let tessellation = match map.get("tessellation") {
        None => None,
        Some(value) => {
            let t = as_object(value, "tessellation")?;
            Some(TessellationState {
                flags: get_u32(t, "flags")?,
                patch_control_points: get_u32(t, "patchControlPoints")?,
            })
        }
    };

    let viewport = match map.get("viewport") {
        None => None,
        Some(value) => {
            let v = as_object(value, "viewport")?;
            let mut viewports = Vec::new();
            for entry in get_array(v, "viewports")? {
                let vp = as_object(entry, "viewports")?;
                viewports.push(Viewport {
                    x: get_f32(vp, "x")?,
                    y: get_f32(vp, "y")?,
                    width: get_f32(vp, "width")?,
                    height: get_f32(vp, "height")?,
                    min_depth: get_f32(vp, "minDepth")?,
                    max_depth: get_f32(vp, "maxDepth")?,
                });
            }
            let mut scissors = Vec::new();
            for entry in get_array(v, "scissors")? {
                let sc = as_object(entry, "scissors")?;
                scissors.push(ScissorRect {
                    x: get_i32(sc, "x")?,
                    y: get_i32(sc, "y")?,
                    width: get_u32(sc, "width")?,
                    height: get_u32(sc, "height")?,
                });
            }
            Some(ViewportState {
                flags: get_u32(v, "flags")?,
                viewport_count: get_u32(v, "viewportCount")?,
                viewports,
                scissor_count: get_u32(v, "scissorCount")?,
                scissors,
            })
        }
    };

    let rasterization = match map.get("rasterization") {
        None => None,
        Some(value) => {
            let r = as_object(value, "rasterization")?;
            Some(RasterizationState {
                flags: get_u32(r, "flags")?,
                depth_clamp_enable: get_bool(r, "depthClampEnable")?,
                rasterizer_discard_enable: get_bool(r, "rasterizerDiscardEnable")?,
                polygon_mode: get_u32(r, "polygonMode")?,
                cull_mode: get_u32(r, "cullMode")?,
                front_face: get_u32(r, "frontFace")?,
                depth_bias_enable: get_bool(r, "depthBiasEnable")?,
                depth_bias_constant_factor: get_f32(r, "depthBiasConstantFactor")?,
                depth_bias_clamp: get_f32(r, "depthBiasClamp")?,
                depth_bias_slope_factor: get_f32(r, "depthBiasSlopeFactor")?,
                line_width: get_f32(r, "lineWidth")?,
            })
        }
    };

    let multisample = match map.get("multisample") {
        None => None,
        Some(value) => {
            let m = as_object(value, "multisample")?;
            Some(MultisampleState {
                flags: get_u32(m, "flags")?,
                rasterization_samples: get_u32(m, "rasterizationSamples")?,
                sample_shading_enable: get_bool(m, "sampleShadingEnable")?,
                min_sample_shading: get_f32(m, "minSampleShading")?,
                sample_mask: parse_u32_array(m, "sampleMask")?,
                alpha_to_coverage_enable: get_bool(m, "alphaToCoverageEnable")?,
                alpha_to_one_enable: get_bool(m, "alphaToOneEnable")?,
            })
        }
    };

    let depth_stencil = match map.get("depthStencil") {
        None => None,
        Some(value) => {
            let d = as_object(value, "depthStencil")?;
            Some(DepthStencilState {
                flags: get_u32(d, "flags")?,
                depth_test_enable: get_bool(d, "depthTestEnable")?,
                depth_write_enable: get_bool(d, "depthWriteEnable")?,
                depth_compare_op: get_tagged(d, "depthCompareOp", CompareOp::from_tag)?,
                depth_bounds_test_enable: get_bool(d, "depthBoundsTestEnable")?,
                stencil_test_enable: get_bool(d, "stencilTestEnable")?,
                front: parse_stencil_face(get(d, "front")?)?,
                back: parse_stencil_face(get(d, "back")?)?,
                min_depth_bounds: get_f32(d, "minDepthBounds")?,
                max_depth_bounds: get_f32(d, "maxDepthBounds")?,
            })
        }
    };

    let color_blend = match map.get("colorBlend") {
        None => None,
        Some(value) => {
            let c = as_object(value, "colorBlend")?;
            let mut attachments = Vec::new();
            for entry in get_array(c, "attachments")? {
                let a = as_object(entry, "attachments")?;
                attachments.push(ColorBlendAttachment {
                    blend_enable: get_bool(a, "blendEnable")?,
                    src_color_blend_factor: get_u32(a, "srcColorBlendFactor")?,
                    dst_color_blend_factor: get_u32(a, "dstColorBlendFactor")?,
                    color_blend_op: get_u32(a, "colorBlendOp")?,
                    src_alpha_blend_factor: get_u32(a, "srcAlphaBlendFactor")?,
                    dst_alpha_blend_factor: get_u32(a, "dstAlphaBlendFactor")?,
                    alpha_blend_op: get_u32(a, "alphaBlendOp")?,
                    color_write_mask: get_u32(a, "colorWriteMask")?,
                });
            }
            let raw_constants = get_array(c, "blendConstants")?;
            if raw_constants.len() != 4 {
                return Err(ParseError::InvalidField {
                    field: "blendConstants",
                    detail: format!("expected 4 entries, got {}", raw_constants.len()),
                });
            }
            let mut blend_constants = [0.0f32; 4];
            for (slot, value) in blend_constants.iter_mut().zip(raw_constants) {
                #[allow(clippy::cast_possible_truncation)]
                let v = value
                    .as_f64()
                    .map(|v| v as f32)
                    .ok_or_else(|| ParseError::InvalidField {
                        field: "blendConstants",
                        detail: "expected numbers".to_string(),
                    })?;
                *slot = v;
            }
            Some(ColorBlendState {
                flags: get_u32(c, "flags")?,
                logic_op_enable: get_bool(c, "logicOpEnable")?,
                logic_op: get_u32(c, "logicOp")?,
                attachments,
                blend_constants,
            })
        }
    };

    let dynamic = match map.get("dynamic") {
        None => None,
        Some(value) => {
            let d = as_object(value, "dynamic")?;
            Some(DynamicState {
                flags: get_u32(d, "flags")?,
                dynamic_states: parse_u32_array(d, "dynamicStates")?,
            })
        }
    };

    Ok(GraphicsPipelineDesc {
        flags: get_u32(map, "flags")?,
        stages,
        vertex_input,
        input_assembly,
        tessellation,
        viewport,
        rasterization,
        multisample,
        depth_stencil,
        color_blend,
        dynamic,
        layout: PipelineLayoutId::new(get_u64_str(map, "layout")?),
        render_pass: RenderPassId::new(get_u64_str(map, "renderPass")?),
        subpass: get_u32(map, "subpass")?,
        base_pipeline: parse_base_pipeline(map)?,
    })
}

fn parse_stencil_face(value: &Value) -> Result<StencilOpState, ParseError> {
    let map = as_object(value, "stencil face")?;
    Ok(StencilOpState {
        fail_op: get_u32(map, "failOp")?,
        pass_op: get_u32(map, "passOp")?,
        depth_fail_op: get_u32(map, "depthFailOp")?,
        compare_op: get_tagged(map, "compareOp", CompareOp::from_tag)?,
        compare_mask: get_u32(map, "compareMask")?,
        write_mask: get_u32(map, "writeMask")?,
        reference: get_u32(map, "reference")?,
    })
}

fn parse_application_info(value: &Value) -> Result<ApplicationInfo, ParseError> {
    let map = as_object(value, "applicationInfo")?;
    Ok(ApplicationInfo {
        application_name: get_str(map, "applicationName")?.to_string(),
        application_version: get_u32(map, "applicationVersion")?,
        engine_name: get_str(map, "engineName")?.to_string(),
        engine_version: get_u32(map, "engineVersion")?,
        api_version: get_u32(map, "apiVersion")?,
    })
}

fn parse_physical_device_features(value: &Value) -> Result<PhysicalDeviceFeatures, ParseError> {
    let map = as_object(value, "physicalDeviceFeatures")?;
    let mut features = PhysicalDeviceFeatures::default();
    for (name, toggle) in map {
        let enabled = toggle.as_bool().ok_or_else(|| ParseError::InvalidField {
            field: "physicalDeviceFeatures",
            detail: format!("toggle {name} is not a bool"),
        })?;
        if !features.set_by_name(name, enabled) {
            return Err(ParseError::InvalidField {
                field: "physicalDeviceFeatures",
                detail: format!("unknown toggle {name}"),
            });
        }
    }
    Ok(features)
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

fn parse_kind_entries<T>(
    root: &Map<String, Value>,
    kind: ResourceKind,
    parse_one: impl Fn(&Map<String, Value>) -> Result<T, ParseError>,
) -> Result<Vec<(Hash64, T)>, ParseError> {
    let mut entries = Vec::new();
    for entry in opt_array(root, kind_key(kind))? {
        let map = as_object(entry, kind_key(kind))?;
        entries.push((entry_hash(map)?, parse_one(map)?));
    }
    Ok(entries)
}

/// Parse a textual state document.
///
/// # Errors
///
/// [`ParseError`] on malformed JSON, an unsupported version tag, or any
/// malformed field.
pub fn parse_document(bytes: &[u8]) -> Result<StateDocument, ParseError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| ParseError::InvalidJson {
        detail: e.to_string(),
    })?;
    let root = value.as_object().ok_or(ParseError::NotAnObject)?;

    let version = root.get("version").ok_or(ParseError::MissingField {
        field: "version",
    })?;
    if version.as_u64() != Some(DOCUMENT_VERSION) {
        return Err(ParseError::UnsupportedVersion {
            got: version.to_string(),
        });
    }

    let application_info = match root.get(kind_key(ResourceKind::ApplicationInfo)) {
        None => None,
        Some(value) => Some(parse_application_info(value)?),
    };
    let physical_device_features = match root.get(kind_key(ResourceKind::PhysicalDeviceFeatures)) {
        None => None,
        Some(value) => Some(parse_physical_device_features(value)?),
    };

    Ok(StateDocument {
        application_info,
        physical_device_features,
        samplers: parse_kind_entries(root, ResourceKind::Sampler, parse_sampler)?,
        set_layouts: parse_kind_entries(root, ResourceKind::DescriptorSetLayout, parse_set_layout)?,
        pipeline_layouts: parse_kind_entries(
            root,
            ResourceKind::PipelineLayout,
            parse_pipeline_layout,
        )?,
        shader_modules: parse_kind_entries(root, ResourceKind::ShaderModule, parse_shader_module)?,
        render_passes: parse_kind_entries(root, ResourceKind::RenderPass, parse_render_pass)?,
        compute_pipelines: parse_kind_entries(
            root,
            ResourceKind::ComputePipeline,
            parse_compute_pipeline,
        )?,
        graphics_pipelines: parse_kind_entries(
            root,
            ResourceKind::GraphicsPipeline,
            parse_graphics_pipeline,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SamplerId;
    use crate::record::Recorder;

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            parse_document(b"not json"),
            Err(ParseError::InvalidJson { .. })
        ));
    }

    #[test]
    fn rejects_non_object_root() {
        assert_eq!(parse_document(b"[1,2,3]"), Err(ParseError::NotAnObject));
    }

    #[test]
    fn rejects_missing_version() {
        assert_eq!(
            parse_document(b"{}"),
            Err(ParseError::MissingField { field: "version" })
        );
    }

    #[test]
    fn rejects_unknown_version() {
        assert_eq!(
            parse_document(br#"{"version": 9000}"#),
            Err(ParseError::UnsupportedVersion {
                got: "9000".to_string()
            })
        );
    }

    #[test]
    fn round_trips_a_sampler() {
        let mut recorder = Recorder::new();
        let desc = SamplerDesc {
            min_lod: 10.0,
            max_lod: 12.5,
            ..SamplerDesc::default()
        };
        let hash = recorder.record_sampler(SamplerId::new(1), &desc).unwrap();

        let document = parse_document(&recorder.serialize().unwrap()).unwrap();
        assert_eq!(document.samplers.len(), 1);
        assert_eq!(document.samplers[0].0, hash);
        assert_eq!(document.samplers[0].1, desc);
    }

    #[test]
    fn rejects_unknown_feature_toggle() {
        let doc = br#"{"version":1,"physicalDeviceFeatures":{"sparseBinding":true}}"#;
        assert!(matches!(
            parse_document(doc),
            Err(ParseError::InvalidField { .. })
        ));
    }
}
