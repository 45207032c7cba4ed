//! Shared fixtures for the acceptance scenarios.
//!
//! [`InterningSink`] is the reference consumer: it re-records every
//! delivered object into a fresh [`Recorder`] under identity handles
//! (handle = content hash) and rejects delivery on any recompute mismatch.
//! Replaying a serialized recorder into it must reproduce an equivalent
//! recorder, which the round-trip tests check byte-for-byte through
//! serialization.

use amber_capture::model::{
    ApplicationInfo, ComputePipelineDesc, GraphicsPipelineDesc, PhysicalDeviceFeatures,
    PipelineLayoutDesc, RenderPassDesc, SamplerDesc, SetLayoutDesc, ShaderModuleDesc,
};
use amber_capture::id::{
    PipelineId, PipelineLayoutId, RenderPassId, SamplerId, SetLayoutId, ShaderModuleId,
};
use amber_capture::{Hash64, Recorder, SinkRejection, StateSink};

/// A sink that interns everything it accepts, using identity handles.
#[derive(Default)]
pub struct InterningSink {
    pub recorder: Recorder,
}

impl InterningSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn verify(expected: Hash64, recorded: Hash64) -> Result<Hash64, SinkRejection> {
        if recorded == expected {
            Ok(recorded)
        } else {
            Err(SinkRejection::new(format!(
                "recompute mismatch: expected {expected}, recorded {recorded}"
            )))
        }
    }
}

impl StateSink for InterningSink {
    fn application_info(
        &mut self,
        hash: Hash64,
        info: &ApplicationInfo,
    ) -> Result<(), SinkRejection> {
        let recorded = self.recorder.record_application_info(info);
        Self::verify(hash, recorded).map(|_| ())
    }

    fn physical_device_features(
        &mut self,
        hash: Hash64,
        features: &PhysicalDeviceFeatures,
    ) -> Result<(), SinkRejection> {
        let recorded = self.recorder.record_physical_device_features(features);
        Self::verify(hash, recorded).map(|_| ())
    }

    fn sampler(&mut self, hash: Hash64, desc: &SamplerDesc) -> Result<SamplerId, SinkRejection> {
        let recorded = self
            .recorder
            .record_sampler(SamplerId::from(hash), desc)
            .map_err(|e| SinkRejection::new(e.to_string()))?;
        Self::verify(hash, recorded).map(SamplerId::from)
    }

    fn descriptor_set_layout(
        &mut self,
        hash: Hash64,
        desc: &SetLayoutDesc,
    ) -> Result<SetLayoutId, SinkRejection> {
        let recorded = self
            .recorder
            .record_descriptor_set_layout(SetLayoutId::from(hash), desc)
            .map_err(|e| SinkRejection::new(e.to_string()))?;
        Self::verify(hash, recorded).map(SetLayoutId::from)
    }

    fn pipeline_layout(
        &mut self,
        hash: Hash64,
        desc: &PipelineLayoutDesc,
    ) -> Result<PipelineLayoutId, SinkRejection> {
        let recorded = self
            .recorder
            .record_pipeline_layout(PipelineLayoutId::from(hash), desc)
            .map_err(|e| SinkRejection::new(e.to_string()))?;
        Self::verify(hash, recorded).map(PipelineLayoutId::from)
    }

    fn shader_module(
        &mut self,
        hash: Hash64,
        desc: &ShaderModuleDesc,
    ) -> Result<ShaderModuleId, SinkRejection> {
        let recorded = self
            .recorder
            .record_shader_module(ShaderModuleId::from(hash), desc)
            .map_err(|e| SinkRejection::new(e.to_string()))?;
        Self::verify(hash, recorded).map(ShaderModuleId::from)
    }

    fn render_pass(
        &mut self,
        hash: Hash64,
        desc: &RenderPassDesc,
    ) -> Result<RenderPassId, SinkRejection> {
        let recorded = self
            .recorder
            .record_render_pass(RenderPassId::from(hash), desc)
            .map_err(|e| SinkRejection::new(e.to_string()))?;
        Self::verify(hash, recorded).map(RenderPassId::from)
    }

    fn compute_pipeline(
        &mut self,
        hash: Hash64,
        desc: &ComputePipelineDesc,
    ) -> Result<PipelineId, SinkRejection> {
        let recorded = self
            .recorder
            .record_compute_pipeline(PipelineId::from(hash), desc)
            .map_err(|e| SinkRejection::new(e.to_string()))?;
        Self::verify(hash, recorded).map(PipelineId::from)
    }

    fn graphics_pipeline(
        &mut self,
        hash: Hash64,
        desc: &GraphicsPipelineDesc,
    ) -> Result<PipelineId, SinkRejection> {
        let recorded = self
            .recorder
            .record_graphics_pipeline(PipelineId::from(hash), desc)
            .map_err(|e| SinkRejection::new(e.to_string()))?;
        Self::verify(hash, recorded).map(PipelineId::from)
    }
}
