use crate::engine::scene::{Scene, TextureSource};
use crate::error::ViewerError;
use crate::solar::bodies::CelestialBodySpec;
use crate::solar::builder::{build_body, AssetLoader, CelestialBody};

/// The planets in table order.
#[derive(Debug, Default)]
pub struct PlanetRegistry {
    bodies: Vec<CelestialBody>,
}

impl PlanetRegistry {
    pub fn build<T: TextureSource>(
        scene: &mut Scene,
        assets: &mut AssetLoader<T>,
        specs: &[CelestialBodySpec],
        label_reference_distance: f32,
    ) -> Result<Self, ViewerError> {
        let bodies = specs
            .iter()
            .map(|spec| build_body(scene, assets, spec, label_reference_distance))
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("registered {} bodies", bodies.len());
        Ok(PlanetRegistry { bodies })
    }

    pub fn iter(&self) -> impl Iterator<Item = &CelestialBody> {
        self.bodies.iter()
    }
}

#[cfg(test)]
impl PlanetRegistry {
    pub fn get(&self, name: &str) -> Option<&CelestialBody> {
        self.bodies.iter().find(|b| b.name == name)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use crate::solar::bodies::PLANETS;
    use crate::solar::builder::tests::FakeTextures;

    fn registry(scene: &mut Scene) -> PlanetRegistry {
        let mut textures = FakeTextures::default();
        let config = ViewerConfig::default();
        let mut assets = AssetLoader::new(&mut textures, &config);
        PlanetRegistry::build(scene, &mut assets, &PLANETS, 200.0).unwrap()
    }

    #[test]
    fn test_nine_bodies_in_table_order() {
        let mut scene = Scene::new();
        let registry = registry(&mut scene);
        let names: Vec<_> = registry.iter().map(|b| b.name).collect();
        let expected = [
            "Mercury", "Venus", "Earth", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune", "Pluto",
        ];
        assert_eq!(names, expected);
        assert_eq!(registry.len(), 9);
    }

    #[test]
    fn test_pivots_are_roots() {
        let mut scene = Scene::new();
        let registry = registry(&mut scene);
        for body in registry.iter() {
            assert!(scene.roots().contains(&body.pivot));
            assert_eq!(scene.parent(body.pivot), None);
        }
    }

    #[test]
    fn test_only_saturn_and_uranus_own_rings() {
        let mut scene = Scene::new();
        let registry = registry(&mut scene);
        for body in registry.iter() {
            let ringed = matches!(body.name, "Saturn" | "Uranus");
            assert_eq!(body.ring.is_some(), ringed, "{}", body.name);
        }
    }

    #[test]
    fn test_mesh_offset_matches_orbit_distance() {
        let mut scene = Scene::new();
        let registry = registry(&mut scene);
        for (body, spec) in registry.iter().zip(PLANETS.iter()) {
            assert_eq!(scene.node(body.mesh).position.x, spec.orbit_distance);
            assert_eq!(body.spin_speed, spec.spin_speed);
            assert_eq!(body.revolution_speed, spec.revolution_speed);
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let mut scene = Scene::new();
        let registry = registry(&mut scene);
        assert_eq!(registry.get("Earth").map(|b| b.spin_speed), Some(0.01));
        assert!(registry.get("Vulcan").is_none());
    }
}
