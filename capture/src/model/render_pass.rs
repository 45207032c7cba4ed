//! Render pass descriptors and their extension chain.

use super::wire_enum;

/// Sentinel: an attachment reference that points at nothing.
pub const ATTACHMENT_UNUSED: u32 = u32::MAX;

/// Sentinel: a subpass dependency edge to outside the render pass.
pub const SUBPASS_EXTERNAL: u32 = u32::MAX;

wire_enum! {
    /// Attachment load behavior at subpass begin.
    LoadOp {
        Load = 0,
        Clear = 1,
        DontCare = 2,
    }
}

wire_enum! {
    /// Attachment store behavior at subpass end.
    StoreOp {
        Store = 0,
        DontCare = 1,
    }
}

wire_enum! {
    /// Pipeline bind point of a subpass.
    BindPoint {
        Graphics = 0,
        Compute = 1,
    }
}

/// One attachment of a render pass. `format`, `samples`, and the layouts
/// are raw passthrough values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentDescription {
    pub flags: u32,
    pub format: u32,
    pub samples: u32,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub initial_layout: u32,
    pub final_layout: u32,
}

/// A reference from a subpass to an attachment index (or
/// [`ATTACHMENT_UNUSED`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentReference {
    pub attachment: u32,
    pub layout: u32,
}

/// One subpass of a render pass.
///
/// If `resolve_attachments` is non-empty it must parallel
/// `color_attachments`; callers that do not resolve leave it empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubpassDescription {
    pub flags: u32,
    pub pipeline_bind_point: BindPoint,
    pub input_attachments: Vec<AttachmentReference>,
    pub color_attachments: Vec<AttachmentReference>,
    pub resolve_attachments: Vec<AttachmentReference>,
    pub depth_stencil_attachment: Option<AttachmentReference>,
    pub preserve_attachments: Vec<u32>,
}

/// An execution/memory dependency between two subpasses. Stage and access
/// masks are raw passthrough values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubpassDependency {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stage_mask: u32,
    pub dst_stage_mask: u32,
    pub src_access_mask: u32,
    pub dst_access_mask: u32,
    pub dependency_flags: u32,
}

/// Multiview parameters chained onto a render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiviewInfo {
    pub view_masks: Vec<u32>,
    pub view_offsets: Vec<i32>,
    pub correlation_masks: Vec<u32>,
}

/// One entry in a render pass's extension chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderPassChain {
    Multiview(MultiviewInfo),
}

impl RenderPassChain {
    /// The structure tag identifying this entry.
    #[must_use]
    pub fn stype(&self) -> u32 {
        match self {
            Self::Multiview(_) => super::stype::RENDER_PASS_MULTIVIEW,
        }
    }
}

/// A render pass creation descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderPassDesc {
    pub flags: u32,
    pub attachments: Vec<AttachmentDescription>,
    pub subpasses: Vec<SubpassDescription>,
    pub dependencies: Vec<SubpassDependency>,
    pub chain: Vec<RenderPassChain>,
}
