//! Layer identities and the fixed-proportion partition.

use crate::params::LayerProfile;

/// Particle subgroup bound to a frequency range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Foundation,
    Harmony,
    Atmosphere,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Foundation, Layer::Harmony, Layer::Atmosphere];

    /// Position in the configured layer table
    pub fn index(self) -> usize {
        match self {
            Layer::Foundation => 0,
            Layer::Harmony => 1,
            Layer::Atmosphere => 2,
        }
    }
}

/// Split `total` particles across the layers by share
///
/// The first two layers are rounded; the last takes the remainder so the
/// counts always add up to `total`.
pub fn partition(total: usize, layers: &[LayerProfile; 3]) -> [usize; 3] {
    let foundation = ((total as f32 * layers[0].share).round() as usize).min(total);
    let harmony = ((total as f32 * layers[1].share).round() as usize).min(total - foundation);
    [foundation, harmony, total - foundation - harmony]
}
