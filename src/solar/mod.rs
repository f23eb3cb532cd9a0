//! The solar system scene and the state that drives it between frames.

pub mod assets;
pub mod bodies;
pub mod builder;
pub mod driver;
pub mod registry;

use nalgebra::Point3;

use crate::config::ViewerConfig;
use crate::engine::camera::PerspectiveCamera;
use crate::engine::controls::{OrbitControls, PointerInput};
use crate::engine::renderer::RenderTarget;
use crate::engine::scene::{Scene, TextureSource};
use crate::error::ViewerError;

use self::bodies::{PLANETS, SUN};
use self::builder::{build_environment, AssetLoader};
use self::driver::FrameDriver;
use self::registry::PlanetRegistry;

pub const CAMERA_POSITION: [f32; 3] = [-90.0, 140.0, 140.0];
pub const CAMERA_FOV: f32 = 45.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;

/// Everything the page keeps alive: the scene, the camera and its controls,
/// the planets, and the surface they are drawn to.
pub struct SolarSystem<T: RenderTarget + TextureSource> {
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    registry: PlanetRegistry,
    driver: FrameDriver,
    target: T,
}

impl<T: RenderTarget + TextureSource> SolarSystem<T> {
    pub fn new(mut target: T, config: &ViewerConfig) -> Result<Self, ViewerError> {
        let (width, height) = target.size();
        let aspect = if height == 0 { 1.0 } else { width as f32 / height as f32 };

        let mut camera = PerspectiveCamera::new(CAMERA_FOV, aspect, CAMERA_NEAR, CAMERA_FAR);
        let [x, y, z] = CAMERA_POSITION;
        camera.position = Point3::new(x, y, z);

        let mut controls = OrbitControls::new(height as f32);
        controls.update(&mut camera);

        // Labels keep the size they have from the starting viewpoint.
        let label_reference_distance = camera.distance_to(&Point3::origin());

        let mut scene = Scene::new();
        let mut assets = AssetLoader::new(&mut target, config);
        build_environment(&mut scene, &mut assets, &SUN);
        let registry =
            PlanetRegistry::build(&mut scene, &mut assets, &PLANETS, label_reference_distance)?;

        log::info!("scene ready: {} geometries", scene.geometry_count());

        Ok(SolarSystem {
            scene,
            camera,
            controls,
            registry,
            driver: FrameDriver::new(),
            target,
        })
    }

    pub fn start(&mut self) {
        self.driver.start();
    }

    /// One animation tick: advance the planets, then draw. Does nothing until
    /// [`SolarSystem::start`] has been called.
    pub fn frame(&mut self) {
        if !self.driver.advance(&mut self.scene, &self.registry) {
            return;
        }
        self.target.render(&self.scene, &self.camera);
    }

    /// Matches the camera and drawing surface to a new viewport. Zero-sized
    /// viewports (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("ignoring resize to {}x{}", width, height);
            return;
        }
        log::debug!("resize to {}x{}", width, height);
        self.camera.aspect = width as f32 / height as f32;
        self.camera.update_projection_matrix();
        self.target.set_size(width, height);
        self.controls.set_viewport_height(height as f32);
    }

    pub fn pointer_down(&mut self, input: PointerInput) {
        self.controls.pointer_down(input);
    }

    pub fn pointer_move(&mut self, id: i32, x: f32, y: f32) {
        self.controls.pointer_move(id, x, y);
        self.controls.update(&mut self.camera);
    }

    pub fn pointer_up(&mut self, id: i32) {
        self.controls.pointer_up(id);
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.controls.wheel(delta_y);
        self.controls.update(&mut self.camera);
    }
}

#[cfg(test)]
impl<T: RenderTarget + TextureSource> SolarSystem<T> {
    pub fn state(&self) -> driver::DriverState {
        self.driver.state()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn registry(&self) -> &PlanetRegistry {
        &self.registry
    }

    pub fn target(&self) -> &T {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::controls::PointerKind;
    use crate::engine::scene::{NodeId, NodeKind, TextureId};
    use crate::solar::builder::tests::FakeTextures;
    use crate::solar::driver::DriverState;
    use nalgebra::UnitQuaternion;

    #[derive(Default)]
    struct FakeSurface {
        textures: FakeTextures,
        size: (u32, u32),
        renders: usize,
        last_aspect: Option<f32>,
    }

    impl TextureSource for FakeSurface {
        fn load_texture(&mut self, url: &str) -> TextureId {
            self.textures.load_texture(url)
        }

        fn load_cube_texture(&mut self, urls: [&str; 6]) -> TextureId {
            self.textures.load_cube_texture(urls)
        }

        fn text_texture(&mut self, text: &str) -> Result<TextureId, ViewerError> {
            self.textures.text_texture(text)
        }
    }

    impl RenderTarget for FakeSurface {
        fn set_size(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }

        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn render(&mut self, _scene: &Scene, camera: &PerspectiveCamera) {
            self.renders += 1;
            self.last_aspect = Some(camera.aspect);
        }
    }

    fn system() -> SolarSystem<FakeSurface> {
        let surface = FakeSurface { size: (800, 600), ..Default::default() };
        SolarSystem::new(surface, &ViewerConfig::default()).unwrap()
    }

    // The sun is the first node the environment adds.
    fn sun(system: &SolarSystem<FakeSurface>) -> NodeId {
        system.scene().roots()[0]
    }

    #[test]
    fn test_initial_view() {
        let system = system();
        let camera = system.camera();
        assert_eq!(camera.position, Point3::new(-90.0, 140.0, 140.0));
        assert_eq!(camera.target, Point3::origin());
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(system.registry().len(), 9);
        assert_eq!(system.state(), DriverState::Idle);
        let sun_id = sun(&system);
        assert!(matches!(system.scene().node(sun_id).kind, NodeKind::Mesh { .. }));
        assert!(system.scene().children(sun_id).is_empty());
        // stars cube, sun, nine planets, two rings
        assert_eq!(system.target().textures.urls.len(), 12);
        assert_eq!(system.target().textures.cube_urls.len(), 1);
        assert_eq!(system.target().textures.texts.len(), 9);
    }

    #[test]
    fn test_frame_before_start_is_ignored() {
        let mut system = system();
        system.frame();
        assert_eq!(system.target().renders, 0);
        let earth = system.registry().get("Earth").unwrap().mesh;
        assert_eq!(system.scene().node(earth).rotation, UnitQuaternion::identity());
    }

    #[test]
    fn test_one_render_per_frame() {
        let mut system = system();
        system.start();
        for _ in 0..3 {
            system.frame();
        }
        assert_eq!(system.target().renders, 3);
        let earth = system.registry().get("Earth").unwrap().mesh;
        assert!((system.scene().node(earth).rotation.angle() - 0.03).abs() < 1e-5);
        // The sun is not a registered body and stays still.
        assert_eq!(system.scene().node(sun(&system)).rotation, UnitQuaternion::identity());
    }

    #[test]
    fn test_frame_leaves_camera_alone() {
        let mut system = system();
        system.start();
        let position = system.camera().position;
        let view = system.camera().view();
        for _ in 0..10 {
            system.frame();
        }
        assert_eq!(system.camera().position, position);
        assert_eq!(system.camera().view(), view);
    }

    #[test]
    fn test_resize_sets_aspect_and_surface() {
        let mut system = system();
        system.start();
        let sizes = [(1280, 720), (1, 1), (3, 7), (1920, 1080), (7, 3), (640, 4000)];
        for (width, height) in sizes {
            system.resize(width, height);
            system.frame();
            let aspect = width as f32 / height as f32;
            assert_eq!(system.target().size(), (width, height));
            assert_eq!(system.camera().aspect, aspect, "{}x{}", width, height);
            assert_eq!(system.target().last_aspect, Some(aspect));

            let expected = PerspectiveCamera::new(CAMERA_FOV, aspect, CAMERA_NEAR, CAMERA_FAR);
            assert_eq!(system.camera().projection(), expected.projection());
        }
    }

    #[test]
    fn test_zero_resize_ignored() {
        let mut system = system();
        system.resize(0, 500);
        system.resize(500, 0);
        assert_eq!(system.target().size(), (800, 600));
        assert!((system.camera().aspect - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_wheel_zooms_towards_target() {
        let mut system = system();
        let before = system.camera().distance_to(&Point3::origin());
        system.wheel(-100.0);
        let after = system.camera().distance_to(&Point3::origin());
        assert!((after - before * 0.95).abs() < 1e-2);
    }

    #[test]
    fn test_drag_orbits_camera() {
        let mut system = system();
        let before = system.camera().position;
        let distance = system.camera().distance_to(&Point3::origin());
        system.pointer_down(PointerInput {
            id: 1,
            kind: PointerKind::Mouse,
            button: 0,
            x: 100.0,
            y: 100.0,
            pan_modifier: false,
        });
        system.pointer_move(1, 160.0, 100.0);
        system.pointer_up(1);

        let camera = system.camera();
        assert!((camera.position - before).norm() > 1.0);
        assert!((camera.distance_to(&Point3::origin()) - distance).abs() < 1e-2);
        assert_eq!(camera.target, Point3::origin());
    }
}
