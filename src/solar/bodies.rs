//! Static description of the sun and planets. Sizes, distances and speeds are
//! hand-tuned for the view, not physical.

use crate::solar::assets::TextureAsset;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingSpec {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub texture: TextureAsset,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CelestialBodySpec {
    pub name: &'static str,
    pub radius: f32,
    pub texture: TextureAsset,
    /// Distance from the sun along the pivot's X axis.
    pub orbit_distance: f32,
    pub ring: Option<RingSpec>,
    /// Radians per frame about the body's own axis.
    pub spin_speed: f32,
    /// Radians per frame about the sun.
    pub revolution_speed: f32,
}

impl CelestialBodySpec {
    /// A body that spins in place and does not revolve.
    pub const fn new(
        name: &'static str,
        radius: f32,
        texture: TextureAsset,
        orbit_distance: f32,
        spin_speed: f32,
    ) -> Self {
        CelestialBodySpec {
            name,
            radius,
            texture,
            orbit_distance,
            ring: None,
            spin_speed,
            revolution_speed: 0.0,
        }
    }

    pub const fn with_ring(
        mut self,
        inner_radius: f32,
        outer_radius: f32,
        texture: TextureAsset,
    ) -> Self {
        self.ring = Some(RingSpec { inner_radius, outer_radius, texture });
        self
    }

    pub const fn with_revolution(mut self, revolution_speed: f32) -> Self {
        self.revolution_speed = revolution_speed;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunSpec {
    pub radius: f32,
    pub texture: TextureAsset,
}

pub const SUN: SunSpec = SunSpec { radius: 16.0, texture: TextureAsset::Sun };

pub const SPHERE_SEGMENTS: u16 = 30;
pub const RING_SEGMENTS: u16 = 32;
pub const ORBIT_GUIDE_SEGMENTS: u16 = 64;
pub const ORBIT_GUIDE_WIDTH: f32 = 0.01;

pub const PLANETS: [CelestialBodySpec; 9] = [
    CelestialBodySpec::new("Mercury", 3.2, TextureAsset::Mercury, 28.0, 0.004)
        .with_revolution(0.04),
    CelestialBodySpec::new("Venus", 5.8, TextureAsset::Venus, 44.0, 0.002).with_revolution(0.015),
    CelestialBodySpec::new("Earth", 6.0, TextureAsset::Earth, 62.0, 0.01).with_revolution(0.01),
    CelestialBodySpec::new("Mars", 4.0, TextureAsset::Mars, 78.0, 0.018).with_revolution(0.008),
    CelestialBodySpec::new("Jupiter", 12.0, TextureAsset::Jupiter, 100.0, 0.04)
        .with_revolution(0.002),
    CelestialBodySpec::new("Saturn", 10.0, TextureAsset::Saturn, 138.0, 0.038)
        .with_ring(10.0, 20.0, TextureAsset::SaturnRing)
        .with_revolution(0.0009),
    CelestialBodySpec::new("Uranus", 7.0, TextureAsset::Uranus, 176.0, 0.03)
        .with_ring(7.0, 12.0, TextureAsset::UranusRing)
        .with_revolution(0.0004),
    CelestialBodySpec::new("Neptune", 7.0, TextureAsset::Neptune, 200.0, 0.032)
        .with_revolution(0.0001),
    CelestialBodySpec::new("Pluto", 2.8, TextureAsset::Pluto, 216.0, 0.008)
        .with_revolution(0.00007),
];
