//! Layered particle simulation driven by mapped audio targets.

mod layer;
mod system;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

pub use layer::{partition, Layer};
pub use system::ParticleSystem;

use crate::mapping::Hsl;

/// One simulated particle
///
/// Created once per session and only ever mutated by [`ParticleSystem`].
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: u32,
    pub layer: Layer,
    pub frequency_band: usize,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Anchor the mapper placed this particle at
    pub target_position: Vec3,
    pub base_size: f32,
    pub current_size: f32,
    pub target_size: f32,
    pub color: Hsl,
    pub target_color: Hsl,
    pub opacity: f32,
    pub target_opacity: f32,
    /// 0..1, advances one full turn per beat
    pub pulse_phase: f32,
    pub harmonic_resonance: f32,
    /// Fixed -0.5..0.5 draw the mapper scales by spectral flatness
    pub angle_jitter: f32,
}

/// Per-particle data handed to the render surface
///
/// Index `i` of the exported array always belongs to particle id `i`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub scale: f32,
    /// Linear RGB plus opacity
    pub color_rgba: [f32; 4],
    pub id: u32,
}
