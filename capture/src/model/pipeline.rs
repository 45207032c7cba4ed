//! Compute and graphics pipeline descriptors.
//!
//! Graphics state blocks are `Option`s: an absent block contributes nothing
//! to the hash or the document, matching the count-zero/feature-disable
//! convention used everywhere else in the model.

use super::{wire_enum, CompareOp, ShaderStageFlags};
use crate::id::{PipelineId, PipelineLayoutId, RenderPassId, ShaderModuleId};

/// One specialization constant override location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecializationMapEntry {
    pub constant_id: u32,
    pub offset: u32,
    pub size: u32,
}

/// Specialization constants for one shader stage. `data` round-trips
/// byte-exactly (base64 in the textual document).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecializationInfo {
    pub map_entries: Vec<SpecializationMapEntry>,
    pub data: Vec<u8>,
}

/// One shader stage of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineShaderStage {
    pub flags: u32,
    pub stage: ShaderStageFlags,
    pub module: ShaderModuleId,
    pub name: String,
    pub specialization: Option<SpecializationInfo>,
}

/// A compute pipeline creation descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputePipelineDesc {
    pub flags: u32,
    pub stage: PipelineShaderStage,
    pub layout: PipelineLayoutId,
    pub base_pipeline: Option<PipelineId>,
}

wire_enum! {
    /// Vertex input rate of a binding.
    InputRate {
        Vertex = 0,
        Instance = 1,
    }
}

/// One vertex buffer binding slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexInputBinding {
    pub binding: u32,
    pub stride: u32,
    pub input_rate: InputRate,
}

/// One vertex attribute. `format` is a raw passthrough value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexInputAttribute {
    pub location: u32,
    pub binding: u32,
    pub format: u32,
    pub offset: u32,
}

/// Vertex input state block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexInputState {
    pub flags: u32,
    pub bindings: Vec<VertexInputBinding>,
    pub attributes: Vec<VertexInputAttribute>,
}

/// Input assembly state block. `topology` is a raw passthrough value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputAssemblyState {
    pub flags: u32,
    pub topology: u32,
    pub primitive_restart_enable: bool,
}

/// Tessellation state block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TessellationState {
    pub flags: u32,
    pub patch_control_points: u32,
}

/// One viewport rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// One scissor rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Viewport state block.
///
/// The counts stand alone: when viewports/scissors are dynamic the arrays
/// are empty while the counts still describe how many slots the pipeline
/// uses. Hashing folds the counts and then exactly the array contents.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewportState {
    pub flags: u32,
    pub viewport_count: u32,
    pub viewports: Vec<Viewport>,
    pub scissor_count: u32,
    pub scissors: Vec<ScissorRect>,
}

/// Rasterization state block. `polygon_mode`, `cull_mode`, and
/// `front_face` are raw passthrough values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizationState {
    pub flags: u32,
    pub depth_clamp_enable: bool,
    pub rasterizer_discard_enable: bool,
    pub polygon_mode: u32,
    pub cull_mode: u32,
    pub front_face: u32,
    pub depth_bias_enable: bool,
    pub depth_bias_constant_factor: f32,
    pub depth_bias_clamp: f32,
    pub depth_bias_slope_factor: f32,
    pub line_width: f32,
}

/// Multisample state block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultisampleState {
    pub flags: u32,
    pub rasterization_samples: u32,
    pub sample_shading_enable: bool,
    pub min_sample_shading: f32,
    pub sample_mask: Vec<u32>,
    pub alpha_to_coverage_enable: bool,
    pub alpha_to_one_enable: bool,
}

/// Stencil face operation state. The op fields are raw passthrough values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilOpState {
    pub fail_op: u32,
    pub pass_op: u32,
    pub depth_fail_op: u32,
    pub compare_op: CompareOp,
    pub compare_mask: u32,
    pub write_mask: u32,
    pub reference: u32,
}

/// Depth/stencil state block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStencilState {
    pub flags: u32,
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: CompareOp,
    pub depth_bounds_test_enable: bool,
    pub stencil_test_enable: bool,
    pub front: StencilOpState,
    pub back: StencilOpState,
    pub min_depth_bounds: f32,
    pub max_depth_bounds: f32,
}

/// Per-attachment blend state. Factor/op fields are raw passthrough values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorBlendAttachment {
    pub blend_enable: bool,
    pub src_color_blend_factor: u32,
    pub dst_color_blend_factor: u32,
    pub color_blend_op: u32,
    pub src_alpha_blend_factor: u32,
    pub dst_alpha_blend_factor: u32,
    pub alpha_blend_op: u32,
    pub color_write_mask: u32,
}

/// Color blend state block. `logic_op` is a raw passthrough value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColorBlendState {
    pub flags: u32,
    pub logic_op_enable: bool,
    pub logic_op: u32,
    pub attachments: Vec<ColorBlendAttachment>,
    pub blend_constants: [f32; 4],
}

/// Dynamic state block; entries are raw passthrough values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DynamicState {
    pub flags: u32,
    pub dynamic_states: Vec<u32>,
}

/// A graphics pipeline creation descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsPipelineDesc {
    pub flags: u32,
    pub stages: Vec<PipelineShaderStage>,
    pub vertex_input: Option<VertexInputState>,
    pub input_assembly: Option<InputAssemblyState>,
    pub tessellation: Option<TessellationState>,
    pub viewport: Option<ViewportState>,
    pub rasterization: Option<RasterizationState>,
    pub multisample: Option<MultisampleState>,
    pub depth_stencil: Option<DepthStencilState>,
    pub color_blend: Option<ColorBlendState>,
    pub dynamic: Option<DynamicState>,
    pub layout: PipelineLayoutId,
    pub render_pass: RenderPassId,
    pub subpass: u32,
    pub base_pipeline: Option<PipelineId>,
}
