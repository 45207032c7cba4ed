//! Shader module descriptors.

/// A shader module creation descriptor.
///
/// `code` is the SPIR-V blob as raw bytes. The system never inspects it;
/// it hashes and round-trips byte-exactly (base64 in the textual document).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderModuleDesc {
    pub flags: u32,
    pub code: Vec<u8>,
}
