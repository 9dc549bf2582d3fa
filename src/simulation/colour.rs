//! Temperature and distance to render colour

/// Which branch of the colour mapping a particle fell into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    /// Inside the accretion disk, white to blue by depth
    Disk,
    White,
    YellowWhite,
    RedOrange,
}

/// Red and green channels of a particle's colour
///
/// The blue channel is fixed per band and filled in by [`ParticleColour::rgb`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleColour {
    pub band: Band,
    pub red: f32,
    pub green: f32,
}

impl ParticleColour {
    pub fn rgb(&self) -> [f32; 3] {
        let blue = match self.band {
            Band::Disk => 1.0,
            _ => 0.2,
        };
        [self.red, self.green, blue]
    }
}

/// Maps temperature and distance from the centre to a colour
pub fn particle_colour(temperature: f32, distance: f32, disk_radius: f32) -> ParticleColour {
    if distance < disk_radius {
        let depth = 1.0 - distance / disk_radius;
        return ParticleColour {
            band: Band::Disk,
            red: 0.8 + depth * 0.2,
            green: 0.9 + depth * 0.1,
        };
    }

    if temperature > 2.0 {
        ParticleColour {
            band: Band::White,
            red: 1.0,
            green: 1.0,
        }
    } else if temperature > 1.0 {
        ParticleColour {
            band: Band::YellowWhite,
            red: 1.0,
            green: 1.0,
        }
    } else {
        ParticleColour {
            band: Band::RedOrange,
            red: 1.0,
            green: 0.3 + temperature * 0.4,
        }
    }
}
