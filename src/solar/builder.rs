use std::f32::consts::FRAC_PI_2;

use nalgebra::Vector3;

use crate::config::ViewerConfig;
use crate::engine::label::create_text_sprite;
use crate::engine::mesh::Mesh;
use crate::engine::scene::{
    color_from_hex, AmbientLight, Material, Node, NodeId, PointLight, Scene, TextureId,
    TextureSource,
};
use crate::error::ViewerError;
use crate::solar::assets::TextureAsset;
use crate::solar::bodies::{
    CelestialBodySpec, SunSpec, ORBIT_GUIDE_SEGMENTS, ORBIT_GUIDE_WIDTH, RING_SEGMENTS,
    SPHERE_SEGMENTS,
};

pub const AMBIENT_COLOR: u32 = 0x333333;
pub const SUN_LIGHT_INTENSITY: f32 = 30000.0;
pub const SUN_LIGHT_RANGE: f32 = 300.0;
/// Label height above the body centre, in body radii.
pub const LABEL_LIFT: f32 = 1.5;
/// The orbit guide is shifted along X by this fraction of the body radius.
pub const ORBIT_GUIDE_OFFSET: f32 = 0.5;

/// A planet in the running scene. `pivot` is a root node; `mesh`, `label` and
/// `ring` are its children, so turning the pivot revolves all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct CelestialBody {
    pub name: &'static str,
    pub mesh: NodeId,
    pub pivot: NodeId,
    pub label: NodeId,
    pub ring: Option<NodeId>,
    /// Static guide circle, attached to the scene root.
    pub orbit_guide: NodeId,
    pub spin_speed: f32,
    pub revolution_speed: f32,
}

/// Resolves asset files against the configured base before loading them.
pub struct AssetLoader<'a, T: TextureSource> {
    pub textures: &'a mut T,
    pub config: &'a ViewerConfig,
}

impl<'a, T: TextureSource> AssetLoader<'a, T> {
    pub fn new(textures: &'a mut T, config: &'a ViewerConfig) -> Self {
        AssetLoader { textures, config }
    }

    pub fn load(&mut self, asset: TextureAsset) -> TextureId {
        let url = self.config.asset_url(asset.file_name());
        self.textures.load_texture(&url)
    }
}

/// Background, lights and the sun.
pub fn build_environment<T: TextureSource>(
    scene: &mut Scene,
    assets: &mut AssetLoader<T>,
    sun: &SunSpec,
) -> NodeId {
    let stars = assets.config.asset_url(TextureAsset::Stars.file_name());
    scene.background = Some(assets.textures.load_cube_texture([stars.as_str(); 6]));

    scene.ambient_light = Some(AmbientLight {
        color: color_from_hex(AMBIENT_COLOR),
        intensity: 1.0,
    });
    scene.point_light = Some(PointLight {
        color: color_from_hex(0xffffff),
        intensity: SUN_LIGHT_INTENSITY,
        distance: SUN_LIGHT_RANGE,
        position: Vector3::zeros(),
    });

    let geometry = scene.add_geometry(Mesh::sphere(sun.radius, SPHERE_SEGMENTS, SPHERE_SEGMENTS));
    let map = assets.load(sun.texture);
    scene.add(Node::mesh(geometry, Material::basic_map(map)), None)
}

/// Builds one planet: textured sphere, optional ring and label under a fresh
/// pivot, plus a static orbit guide at the root.
pub fn build_body<T: TextureSource>(
    scene: &mut Scene,
    assets: &mut AssetLoader<T>,
    spec: &CelestialBodySpec,
    label_reference_distance: f32,
) -> Result<CelestialBody, ViewerError> {
    let map = assets.load(spec.texture);
    let geometry = scene.add_geometry(Mesh::sphere(spec.radius, SPHERE_SEGMENTS, SPHERE_SEGMENTS));

    let guide_geometry = scene.add_geometry(Mesh::ring(
        spec.orbit_distance,
        spec.orbit_distance + ORBIT_GUIDE_WIDTH,
        ORBIT_GUIDE_SEGMENTS,
    ));
    let guide_material = Material::Basic {
        color: color_from_hex(0xffffff),
        map: None,
        wireframe: true,
        transparent: false,
    };
    let orbit_guide = scene.add(
        Node::mesh(guide_geometry, guide_material)
            .with_position(ORBIT_GUIDE_OFFSET * spec.radius, 0.0, 0.0)
            .with_rotation_x(-FRAC_PI_2),
        None,
    );

    let pivot = scene.add(Node::group(), None);
    let mesh = scene.add(
        Node::mesh(geometry, Material::standard_map(map))
            .with_position(spec.orbit_distance, 0.0, 0.0),
        Some(pivot),
    );

    let ring = match spec.ring {
        Some(ring) => {
            let ring_map = assets.load(ring.texture);
            let ring_mesh = Mesh::ring(ring.inner_radius, ring.outer_radius, RING_SEGMENTS);
            let ring_geometry = scene.add_geometry(ring_mesh);
            let material = Material::Basic {
                color: color_from_hex(0xffffff),
                map: Some(ring_map),
                wireframe: false,
                transparent: true,
            };
            Some(scene.add(
                Node::mesh(ring_geometry, material)
                    .with_position(spec.orbit_distance, 0.0, 0.0)
                    .with_rotation_x(-FRAC_PI_2),
                Some(pivot),
            ))
        }
        None => None,
    };

    let label = create_text_sprite(
        scene,
        &mut *assets.textures,
        spec.name,
        label_reference_distance,
        Some(pivot),
    )?;
    scene.node_mut(label).position =
        Vector3::new(spec.orbit_distance, spec.radius * LABEL_LIFT, 0.0);

    log::debug!(
        "built {} at {} (radius {}, ring: {})",
        spec.name,
        spec.orbit_distance,
        spec.radius,
        ring.is_some()
    );

    Ok(CelestialBody {
        name: spec.name,
        mesh,
        pivot,
        label,
        ring,
        orbit_guide,
        spin_speed: spec.spin_speed,
        revolution_speed: spec.revolution_speed,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::scene::{NodeKind, SpriteSizing};
    use crate::solar::bodies::{PLANETS, SUN};

    /// Hands out sequential handles and records what was asked for.
    #[derive(Default)]
    pub struct FakeTextures {
        pub urls: Vec<String>,
        pub cube_urls: Vec<[String; 6]>,
        pub texts: Vec<String>,
    }

    impl FakeTextures {
        fn next(&self) -> TextureId {
            TextureId(self.urls.len() + self.cube_urls.len() + self.texts.len())
        }
    }

    impl TextureSource for FakeTextures {
        fn load_texture(&mut self, url: &str) -> TextureId {
            let id = self.next();
            self.urls.push(url.to_string());
            id
        }

        fn load_cube_texture(&mut self, urls: [&str; 6]) -> TextureId {
            let id = self.next();
            self.cube_urls.push(urls.map(str::to_string));
            id
        }

        fn text_texture(&mut self, text: &str) -> Result<TextureId, ViewerError> {
            let id = self.next();
            self.texts.push(text.to_string());
            Ok(id)
        }
    }

    fn build(spec: &CelestialBodySpec) -> (Scene, FakeTextures, CelestialBody) {
        let mut scene = Scene::new();
        let mut textures = FakeTextures::default();
        let config = ViewerConfig::default();
        let mut assets = AssetLoader::new(&mut textures, &config);
        let body = build_body(&mut scene, &mut assets, spec, 200.0).unwrap();
        (scene, textures, body)
    }

    #[test]
    fn test_environment() {
        let mut scene = Scene::new();
        let mut textures = FakeTextures::default();
        let config = ViewerConfig::default();
        let mut assets = AssetLoader::new(&mut textures, &config);
        let sun = build_environment(&mut scene, &mut assets, &SUN);

        assert_eq!(scene.roots(), &[sun]);
        assert!(scene.background.is_some());
        assert_eq!(textures.cube_urls[0][5], "assets/images/stars.jpg");
        assert_eq!(textures.urls, vec!["assets/images/sun.jpg"]);
        let light = scene.point_light.unwrap();
        assert_eq!((light.intensity, light.distance), (30000.0, 300.0));
        assert!(matches!(
            scene.node(sun).kind,
            NodeKind::Mesh { material: Material::Basic { wireframe: false, .. }, .. }
        ));
    }

    #[test]
    fn test_body_layout() {
        let (scene, textures, body) = build(&PLANETS[0]);

        assert_eq!(scene.parent(body.pivot), None);
        assert_eq!(scene.parent(body.mesh), Some(body.pivot));
        assert_eq!(scene.parent(body.label), Some(body.pivot));
        assert_eq!(scene.parent(body.orbit_guide), None);
        assert_eq!(body.ring, None);

        assert_eq!(scene.node(body.mesh).position.x, 28.0);
        let label = scene.node(body.label).position;
        assert_eq!((label.x, label.y, label.z), (28.0, 3.2 * 1.5, 0.0));
        assert_eq!(textures.texts, vec!["Mercury"]);
        assert_eq!(textures.urls, vec!["assets/images/mercury.jpg"]);
    }

    #[test]
    fn test_label_is_fixed_size_sprite() {
        for spec in PLANETS.iter() {
            let (scene, _, body) = build(spec);
            let label = scene.node(body.label);
            assert!(
                matches!(
                    label.kind,
                    NodeKind::Sprite {
                        sizing: SpriteSizing::Screen { reference_distance: 200.0 },
                        ..
                    }
                ),
                "{}",
                spec.name
            );
            assert_eq!(label.scale, Vector3::new(20.0, 10.0, 1.0));
        }
    }

    #[test]
    fn test_orbit_guide_is_flat_wireframe() {
        let (scene, _, body) = build(&PLANETS[2]);

        let guide = scene.node(body.orbit_guide);
        assert_eq!(guide.position.x, 3.0);
        let NodeKind::Mesh { geometry, material } = &guide.kind else {
            panic!("orbit guide is not a mesh");
        };
        assert!(matches!(material, Material::Basic { wireframe: true, .. }));
        // Lying flat: the ring's +Z normal now points along world +Y.
        let normal = scene.world_matrix(body.orbit_guide).transform_vector(&Vector3::z());
        assert!((normal - Vector3::y()).norm() < 1e-5);
        let [x, y, _] = scene.geometry(*geometry).position(0);
        assert!(((x * x + y * y).sqrt() - 62.0).abs() < 1e-3);
    }

    #[test]
    fn test_ringed_body() {
        let (scene, textures, body) = build(&PLANETS[5]);

        let ring = body.ring.expect("saturn has a ring");
        assert_eq!(scene.parent(ring), Some(body.pivot));
        assert_eq!(scene.node(ring).position.x, 138.0);
        assert!(textures.urls.contains(&"assets/images/saturn_ring.png".to_string()));
        assert_eq!(scene.children(body.pivot).len(), 3);
    }
}
