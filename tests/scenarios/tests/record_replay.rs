//! Capture-side acceptance scenarios: dedup, intentional rejection, and
//! serialize/replay round-trips over the full descriptor surface.

use amber_capture::id::{
    PipelineId, PipelineLayoutId, RenderPassId, SamplerId, SetLayoutId, ShaderModuleId,
};
use amber_capture::model::{
    AddressMode, ApplicationInfo, AttachmentDescription, AttachmentReference, BindPoint,
    BorderColor, ColorBlendAttachment, ColorBlendState, CompareOp, ComponentSwizzle,
    ComputePipelineDesc, DepthStencilState, DescriptorSetLayoutBinding, DescriptorType,
    DynamicState, Filter, GraphicsPipelineDesc, InputAssemblyState, InputRate, LoadOp, MipmapMode,
    MultisampleState, MultiviewInfo, PhysicalDeviceFeatures, PipelineLayoutDesc,
    PipelineShaderStage, PushConstantRange, RasterizationState, ReductionModeInfo,
    RenderPassChain, RenderPassDesc, SamplerChain, SamplerDesc, ScissorRect, SetLayoutDesc,
    ShaderModuleDesc, ShaderStageFlags, SpecializationInfo, SpecializationMapEntry, StencilOpState,
    StoreOp, SubpassDependency, SubpassDescription, TessellationState, VertexInputAttribute,
    VertexInputBinding, VertexInputState, Viewport, ViewportState, YcbcrConversionInfo,
    SUBPASS_EXTERNAL,
};
use amber_capture::{replay, Recorder, ResourceKind};
use scenario_tests::InterningSink;

fn ycbcr_sampler() -> SamplerDesc {
    SamplerDesc {
        mag_filter: Filter::Linear,
        min_filter: Filter::Linear,
        mipmap_mode: MipmapMode::Linear,
        address_mode_u: AddressMode::ClampToEdge,
        address_mode_v: AddressMode::ClampToBorder,
        address_mode_w: AddressMode::MirroredRepeat,
        mip_lod_bias: 0.5,
        anisotropy_enable: true,
        max_anisotropy: 16.0,
        compare_enable: true,
        compare_op: CompareOp::LessOrEqual,
        min_lod: 0.0,
        max_lod: 12.0,
        border_color: BorderColor::IntOpaqueWhite,
        unnormalized_coordinates: false,
        chain: vec![SamplerChain::YcbcrConversion(YcbcrConversionInfo {
            format: 1_000_156_002,
            ycbcr_model: 2,
            ycbcr_range: 1,
            components: [
                ComponentSwizzle::Identity,
                ComponentSwizzle::R,
                ComponentSwizzle::B,
                ComponentSwizzle::One,
            ],
            x_chroma_offset: 1,
            y_chroma_offset: 0,
            chroma_filter: Filter::Linear,
            force_explicit_reconstruction: false,
        })],
        ..SamplerDesc::default()
    }
}

/// A recorder populated across every resource kind, dependency ids in the
/// application's own handle space.
fn full_capture() -> Recorder {
    let mut recorder = Recorder::new();

    recorder.record_application_info(&ApplicationInfo {
        application_name: "demo-app".to_string(),
        application_version: 7,
        engine_name: "demo-engine".to_string(),
        engine_version: 12,
        api_version: 4_202_496,
    });
    recorder.record_physical_device_features(&PhysicalDeviceFeatures {
        sampler_anisotropy: true,
        geometry_shader: true,
        shader_int64: true,
        ..PhysicalDeviceFeatures::default()
    });

    recorder
        .record_sampler(SamplerId::new(100), &SamplerDesc::default())
        .unwrap();
    recorder
        .record_sampler(SamplerId::new(101), &ycbcr_sampler())
        .unwrap();

    recorder
        .record_descriptor_set_layout(
            SetLayoutId::new(200),
            &SetLayoutDesc {
                flags: 0,
                bindings: vec![
                    DescriptorSetLayoutBinding {
                        binding: 0,
                        descriptor_type: DescriptorType::CombinedImageSampler,
                        descriptor_count: 2,
                        stage_flags: ShaderStageFlags::FRAGMENT,
                        immutable_samplers: vec![SamplerId::new(100), SamplerId::new(101)],
                    },
                    DescriptorSetLayoutBinding {
                        binding: 1,
                        descriptor_type: DescriptorType::UniformBuffer,
                        descriptor_count: 1,
                        stage_flags: ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
                        immutable_samplers: Vec::new(),
                    },
                ],
            },
        )
        .unwrap();

    recorder
        .record_pipeline_layout(
            PipelineLayoutId::new(300),
            &PipelineLayoutDesc {
                flags: 0,
                set_layouts: vec![SetLayoutId::new(200)],
                push_constant_ranges: vec![PushConstantRange {
                    stage_flags: ShaderStageFlags::VERTEX,
                    offset: 0,
                    size: 64,
                }],
            },
        )
        .unwrap();

    recorder
        .record_shader_module(
            ShaderModuleId::new(400),
            &ShaderModuleDesc {
                flags: 0,
                code: vec![0x03, 0x02, 0x23, 0x07, 0x00, 0x05, 0x01, 0x00, 0xAA, 0xBB],
            },
        )
        .unwrap();
    recorder
        .record_shader_module(
            ShaderModuleId::new(401),
            &ShaderModuleDesc {
                flags: 0,
                code: vec![0x03, 0x02, 0x23, 0x07, 0x10, 0x00, 0x01, 0x00],
            },
        )
        .unwrap();

    recorder
        .record_render_pass(
            RenderPassId::new(500),
            &RenderPassDesc {
                flags: 0,
                attachments: vec![AttachmentDescription {
                    flags: 0,
                    format: 44,
                    samples: 1,
                    load_op: LoadOp::Clear,
                    store_op: StoreOp::Store,
                    stencil_load_op: LoadOp::DontCare,
                    stencil_store_op: StoreOp::DontCare,
                    initial_layout: 0,
                    final_layout: 1000,
                }],
                subpasses: vec![SubpassDescription {
                    flags: 0,
                    pipeline_bind_point: BindPoint::Graphics,
                    input_attachments: Vec::new(),
                    color_attachments: vec![AttachmentReference {
                        attachment: 0,
                        layout: 2,
                    }],
                    resolve_attachments: Vec::new(),
                    depth_stencil_attachment: None,
                    preserve_attachments: vec![0],
                }],
                dependencies: vec![SubpassDependency {
                    src_subpass: SUBPASS_EXTERNAL,
                    dst_subpass: 0,
                    src_stage_mask: 0x400,
                    dst_stage_mask: 0x400,
                    src_access_mask: 0,
                    dst_access_mask: 0x100,
                    dependency_flags: 1,
                }],
                chain: vec![RenderPassChain::Multiview(MultiviewInfo {
                    view_masks: vec![0b11],
                    view_offsets: vec![-1],
                    correlation_masks: vec![0b11],
                })],
            },
        )
        .unwrap();

    recorder
        .record_compute_pipeline(
            PipelineId::new(600),
            &ComputePipelineDesc {
                flags: 0,
                stage: PipelineShaderStage {
                    flags: 0,
                    stage: ShaderStageFlags::COMPUTE,
                    module: ShaderModuleId::new(400),
                    name: "main".to_string(),
                    specialization: Some(SpecializationInfo {
                        map_entries: vec![SpecializationMapEntry {
                            constant_id: 0,
                            offset: 0,
                            size: 4,
                        }],
                        data: vec![64, 0, 0, 0],
                    }),
                },
                layout: PipelineLayoutId::new(300),
                base_pipeline: None,
            },
        )
        .unwrap();
    // A derived compute pipeline referencing the one above.
    recorder
        .record_compute_pipeline(
            PipelineId::new(601),
            &ComputePipelineDesc {
                flags: 4,
                stage: PipelineShaderStage {
                    flags: 0,
                    stage: ShaderStageFlags::COMPUTE,
                    module: ShaderModuleId::new(400),
                    name: "variant".to_string(),
                    specialization: None,
                },
                layout: PipelineLayoutId::new(300),
                base_pipeline: Some(PipelineId::new(600)),
            },
        )
        .unwrap();

    recorder
        .record_graphics_pipeline(
            PipelineId::new(700),
            &GraphicsPipelineDesc {
                flags: 0,
                stages: vec![
                    PipelineShaderStage {
                        flags: 0,
                        stage: ShaderStageFlags::VERTEX,
                        module: ShaderModuleId::new(400),
                        name: "main".to_string(),
                        specialization: None,
                    },
                    PipelineShaderStage {
                        flags: 0,
                        stage: ShaderStageFlags::FRAGMENT,
                        module: ShaderModuleId::new(401),
                        name: "main".to_string(),
                        specialization: None,
                    },
                ],
                vertex_input: Some(VertexInputState {
                    flags: 0,
                    bindings: vec![VertexInputBinding {
                        binding: 0,
                        stride: 32,
                        input_rate: InputRate::Vertex,
                    }],
                    attributes: vec![
                        VertexInputAttribute {
                            location: 0,
                            binding: 0,
                            format: 106,
                            offset: 0,
                        },
                        VertexInputAttribute {
                            location: 1,
                            binding: 0,
                            format: 103,
                            offset: 16,
                        },
                    ],
                }),
                input_assembly: Some(InputAssemblyState {
                    flags: 0,
                    topology: 3,
                    primitive_restart_enable: false,
                }),
                tessellation: Some(TessellationState {
                    flags: 0,
                    patch_control_points: 3,
                }),
                viewport: Some(ViewportState {
                    flags: 0,
                    viewport_count: 1,
                    viewports: vec![Viewport {
                        x: 0.0,
                        y: 0.0,
                        width: 1920.0,
                        height: 1080.0,
                        min_depth: 0.0,
                        max_depth: 1.0,
                    }],
                    scissor_count: 1,
                    scissors: vec![ScissorRect {
                        x: 0,
                        y: 0,
                        width: 1920,
                        height: 1080,
                    }],
                }),
                rasterization: Some(RasterizationState {
                    flags: 0,
                    depth_clamp_enable: false,
                    rasterizer_discard_enable: false,
                    polygon_mode: 0,
                    cull_mode: 2,
                    front_face: 1,
                    depth_bias_enable: true,
                    depth_bias_constant_factor: 1.25,
                    depth_bias_clamp: 0.0,
                    depth_bias_slope_factor: 1.75,
                    line_width: 1.0,
                }),
                multisample: Some(MultisampleState {
                    flags: 0,
                    rasterization_samples: 4,
                    sample_shading_enable: true,
                    min_sample_shading: 0.25,
                    sample_mask: vec![0xFFFF_FFFF],
                    alpha_to_coverage_enable: false,
                    alpha_to_one_enable: false,
                }),
                depth_stencil: Some(DepthStencilState {
                    flags: 0,
                    depth_test_enable: true,
                    depth_write_enable: true,
                    depth_compare_op: CompareOp::Less,
                    depth_bounds_test_enable: false,
                    stencil_test_enable: true,
                    front: StencilOpState {
                        fail_op: 0,
                        pass_op: 2,
                        depth_fail_op: 0,
                        compare_op: CompareOp::Always,
                        compare_mask: 0xFF,
                        write_mask: 0xFF,
                        reference: 1,
                    },
                    back: StencilOpState {
                        fail_op: 0,
                        pass_op: 0,
                        depth_fail_op: 0,
                        compare_op: CompareOp::Never,
                        compare_mask: 0,
                        write_mask: 0,
                        reference: 0,
                    },
                    min_depth_bounds: 0.0,
                    max_depth_bounds: 1.0,
                }),
                color_blend: Some(ColorBlendState {
                    flags: 0,
                    logic_op_enable: false,
                    logic_op: 0,
                    attachments: vec![ColorBlendAttachment {
                        blend_enable: true,
                        src_color_blend_factor: 6,
                        dst_color_blend_factor: 7,
                        color_blend_op: 0,
                        src_alpha_blend_factor: 1,
                        dst_alpha_blend_factor: 0,
                        alpha_blend_op: 0,
                        color_write_mask: 0xF,
                    }],
                    blend_constants: [0.0, 0.25, 0.5, 1.0],
                }),
                dynamic: Some(DynamicState {
                    flags: 0,
                    dynamic_states: vec![0, 1],
                }),
                layout: PipelineLayoutId::new(300),
                render_pass: RenderPassId::new(500),
                subpass: 0,
                base_pipeline: None,
            },
        )
        .unwrap();

    recorder
}

#[test]
fn sampler_dedup_by_field_change() {
    let mut recorder = Recorder::new();
    let first = recorder
        .record_sampler(
            SamplerId::new(1),
            &SamplerDesc {
                min_lod: 10.0,
                ..SamplerDesc::default()
            },
        )
        .unwrap();
    let second = recorder
        .record_sampler(
            SamplerId::new(2),
            &SamplerDesc {
                min_lod: 11.0,
                ..SamplerDesc::default()
            },
        )
        .unwrap();
    assert_ne!(first, second);
    assert_eq!(recorder.entry_count(ResourceKind::Sampler), 2);

    // Re-recording the first is a no-op.
    let again = recorder
        .record_sampler(
            SamplerId::new(3),
            &SamplerDesc {
                min_lod: 10.0,
                ..SamplerDesc::default()
            },
        )
        .unwrap();
    assert_eq!(again, first);
    assert_eq!(recorder.entry_count(ResourceKind::Sampler), 2);
}

#[test]
fn unsupported_extension_chain_rejected() {
    let mut recorder = Recorder::new();
    let mut desc = ycbcr_sampler();
    desc.chain.push(SamplerChain::ReductionMode(ReductionModeInfo {
        reduction_mode: 1,
    }));
    assert!(recorder.record_sampler(SamplerId::new(1), &desc).is_err());
    assert_eq!(recorder.entry_count(ResourceKind::Sampler), 0);
}

#[test]
fn serialize_replay_round_trip_is_equivalent() {
    let recorder = full_capture();
    let serialized = recorder.serialize().unwrap();

    let mut sink = InterningSink::new();
    let report = replay(&serialized, &mut sink).unwrap();
    assert!(report.skipped.is_empty(), "skips: {:?}", report.skipped);
    // 2 singletons + 2 samplers + 1 layout + 1 pipeline layout + 2 modules
    // + 1 render pass + 2 compute + 1 graphics.
    assert_eq!(report.delivered, 12);

    // Equivalent recorder state serializes to identical bytes.
    assert_eq!(sink.recorder.serialize().unwrap(), serialized);
}

#[test]
fn replay_is_idempotent_over_reserialization() {
    let recorder = full_capture();
    let first = recorder.serialize().unwrap();

    let mut sink_a = InterningSink::new();
    replay(&first, &mut sink_a).unwrap();
    let second = sink_a.recorder.serialize().unwrap();

    let mut sink_b = InterningSink::new();
    let report = replay(&second, &mut sink_b).unwrap();
    assert!(report.skipped.is_empty());
    assert_eq!(sink_b.recorder.serialize().unwrap(), second);
}

#[test]
fn single_entry_documents_replay_transparently() {
    let recorder = full_capture();

    for kind in [ResourceKind::Sampler, ResourceKind::ShaderModule] {
        for hash in recorder.hashes_for_kind(kind) {
            let payload = recorder.serialize_entry(kind, hash).unwrap();
            let mut sink = InterningSink::new();
            let report = replay(&payload, &mut sink).unwrap();
            assert_eq!(report.delivered, 1);
            assert!(report.skipped.is_empty());
            assert_eq!(sink.recorder.hashes_for_kind(kind), vec![hash]);
        }
    }
}

#[test]
fn document_renders_hashes_as_decimal_strings_and_blobs_as_base64() {
    let recorder = full_capture();
    let value: serde_json::Value =
        serde_json::from_slice(&recorder.serialize().unwrap()).unwrap();

    assert_eq!(value["version"], serde_json::json!(1));

    for sampler in value["samplers"].as_array().unwrap() {
        let hash = sampler["hash"].as_str().unwrap();
        assert!(hash.bytes().all(|b| b.is_ascii_digit()), "hash {hash:?}");
    }

    for module in value["shaderModules"].as_array().unwrap() {
        // base64 alphabet only; decodes without error.
        let code = module["code"].as_str().unwrap();
        assert!(code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'='));
    }

    // Pipeline dependency references are decimal strings of dependency
    // hashes that exist in the document.
    let module_hashes: Vec<&str> = value["shaderModules"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["hash"].as_str().unwrap())
        .collect();
    for pipeline in value["computePipelines"].as_array().unwrap() {
        let module = pipeline["stage"]["module"].as_str().unwrap();
        assert!(module_hashes.contains(&module));
    }
}

#[test]
fn intern_table_sizes_survive_round_trip() {
    let recorder = full_capture();
    let mut sink = InterningSink::new();
    replay(&recorder.serialize().unwrap(), &mut sink).unwrap();

    for kind in ResourceKind::ALL {
        assert_eq!(
            sink.recorder.entry_count(kind),
            recorder.entry_count(kind),
            "{kind}"
        );
        assert_eq!(
            sink.recorder.hashes_for_kind(kind),
            recorder.hashes_for_kind(kind),
            "{kind}"
        );
    }
}
