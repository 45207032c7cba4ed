//! Shared fixture builders for the amber benchmark suite.

use amber_capture::id::{SamplerId, ShaderModuleId};
use amber_capture::model::{AddressMode, Filter, SamplerDesc, ShaderModuleDesc};
use amber_capture::Recorder;

/// A sampler with every commonly-varied field populated.
#[must_use]
pub fn bench_sampler(lod: f32) -> SamplerDesc {
    SamplerDesc {
        mag_filter: Filter::Linear,
        min_filter: Filter::Linear,
        address_mode_u: AddressMode::ClampToEdge,
        address_mode_v: AddressMode::ClampToEdge,
        anisotropy_enable: true,
        max_anisotropy: 16.0,
        min_lod: 0.0,
        max_lod: lod,
        ..SamplerDesc::default()
    }
}

/// A pseudo-random shader blob of `len` bytes (deterministic contents).
#[must_use]
pub fn bench_shader_code(len: usize) -> Vec<u8> {
    let mut state = 0x9E37_79B9_u32;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect()
}

/// A recorder holding `samplers` sampler variants and `modules` shader
/// modules of `module_size` bytes each.
#[must_use]
pub fn populated_recorder(samplers: u32, modules: u32, module_size: usize) -> Recorder {
    let mut recorder = Recorder::new();
    for i in 0..samplers {
        #[allow(clippy::cast_precision_loss)]
        let lod = i as f32;
        let desc = bench_sampler(lod);
        let _ = recorder.record_sampler(SamplerId::new(u64::from(i)), &desc);
    }
    for i in 0..modules {
        let mut code = bench_shader_code(module_size);
        code[0] = (i & 0xFF) as u8;
        let desc = ShaderModuleDesc { flags: 0, code };
        let _ = recorder.record_shader_module(ShaderModuleId::new(u64::from(i)), &desc);
    }
    recorder
}
