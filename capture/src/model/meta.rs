//! Per-archive metadata singletons.

/// Application identity metadata, recorded once per capture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationInfo {
    pub application_name: String,
    pub application_version: u32,
    pub engine_name: String,
    pub engine_version: u32,
    pub api_version: u32,
}

/// Device feature toggles that shaped the captured pipelines, recorded once
/// per capture. A subset is carried: the toggles that change pipeline
/// compilation, not the full device feature surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhysicalDeviceFeatures {
    pub robust_buffer_access: bool,
    pub independent_blend: bool,
    pub geometry_shader: bool,
    pub tessellation_shader: bool,
    pub sample_rate_shading: bool,
    pub dual_src_blend: bool,
    pub logic_op: bool,
    pub depth_clamp: bool,
    pub depth_bias_clamp: bool,
    pub fill_mode_non_solid: bool,
    pub wide_lines: bool,
    pub large_points: bool,
    pub alpha_to_one: bool,
    pub multi_viewport: bool,
    pub sampler_anisotropy: bool,
    pub shader_float64: bool,
    pub shader_int64: bool,
    pub shader_int16: bool,
}

impl PhysicalDeviceFeatures {
    /// The feature toggles in declaration order, for field-order folds.
    #[must_use]
    pub fn toggles(&self) -> [bool; 18] {
        [
            self.robust_buffer_access,
            self.independent_blend,
            self.geometry_shader,
            self.tessellation_shader,
            self.sample_rate_shading,
            self.dual_src_blend,
            self.logic_op,
            self.depth_clamp,
            self.depth_bias_clamp,
            self.fill_mode_non_solid,
            self.wide_lines,
            self.large_points,
            self.alpha_to_one,
            self.multi_viewport,
            self.sampler_anisotropy,
            self.shader_float64,
            self.shader_int64,
            self.shader_int16,
        ]
    }

    /// Stable field names paired with toggle values, for the textual
    /// document. Order matches [`PhysicalDeviceFeatures::toggles`].
    #[must_use]
    pub fn named_toggles(&self) -> [(&'static str, bool); 18] {
        let t = self.toggles();
        [
            ("robustBufferAccess", t[0]),
            ("independentBlend", t[1]),
            ("geometryShader", t[2]),
            ("tessellationShader", t[3]),
            ("sampleRateShading", t[4]),
            ("dualSrcBlend", t[5]),
            ("logicOp", t[6]),
            ("depthClamp", t[7]),
            ("depthBiasClamp", t[8]),
            ("fillModeNonSolid", t[9]),
            ("wideLines", t[10]),
            ("largePoints", t[11]),
            ("alphaToOne", t[12]),
            ("multiViewport", t[13]),
            ("samplerAnisotropy", t[14]),
            ("shaderFloat64", t[15]),
            ("shaderInt64", t[16]),
            ("shaderInt16", t[17]),
        ]
    }

    /// Set a toggle by its document field name. Unknown names return `false`.
    pub fn set_by_name(&mut self, name: &str, value: bool) -> bool {
        let slot = match name {
            "robustBufferAccess" => &mut self.robust_buffer_access,
            "independentBlend" => &mut self.independent_blend,
            "geometryShader" => &mut self.geometry_shader,
            "tessellationShader" => &mut self.tessellation_shader,
            "sampleRateShading" => &mut self.sample_rate_shading,
            "dualSrcBlend" => &mut self.dual_src_blend,
            "logicOp" => &mut self.logic_op,
            "depthClamp" => &mut self.depth_clamp,
            "depthBiasClamp" => &mut self.depth_bias_clamp,
            "fillModeNonSolid" => &mut self.fill_mode_non_solid,
            "wideLines" => &mut self.wide_lines,
            "largePoints" => &mut self.large_points,
            "alphaToOne" => &mut self.alpha_to_one,
            "multiViewport" => &mut self.multi_viewport,
            "samplerAnisotropy" => &mut self.sampler_anisotropy,
            "shaderFloat64" => &mut self.shader_float64,
            "shaderInt64" => &mut self.shader_int64,
            "shaderInt16" => &mut self.shader_int16,
            _ => return false,
        };
        *slot = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_toggles_round_trip_through_set_by_name() {
        let features = PhysicalDeviceFeatures {
            geometry_shader: true,
            shader_int16: true,
            ..PhysicalDeviceFeatures::default()
        };

        let mut rebuilt = PhysicalDeviceFeatures::default();
        for (name, value) in features.named_toggles() {
            assert!(rebuilt.set_by_name(name, value), "unknown toggle {name}");
        }
        assert_eq!(rebuilt, features);
    }

    #[test]
    fn set_by_name_rejects_unknown() {
        let mut features = PhysicalDeviceFeatures::default();
        assert!(!features.set_by_name("sparseBinding", true));
        assert_eq!(features, PhysicalDeviceFeatures::default());
    }
}
