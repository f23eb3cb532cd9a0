use nalgebra::{Matrix4, Perspective3, Point3, Vector3};

pub struct PerspectiveCamera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = PerspectiveCamera {
            position: Point3::origin(),
            target: Point3::origin(),
            up: Vector3::y(),
            fov,
            aspect,
            near,
            far,
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recomputes the cached projection after `fov`, `aspect`, `near` or `far` change.
    pub fn update_projection_matrix(&mut self) {
        self.projection =
            Perspective3::new(self.aspect, self.fov.to_radians(), self.near, self.far)
                .to_homogeneous();
    }

    pub fn projection(&self) -> &Matrix4<f32> {
        &self.projection
    }

    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view()
    }

    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.position).normalize()
    }

    /// Camera-space +X in world coordinates.
    pub fn right(&self) -> Vector3<f32> {
        self.forward().cross(&self.up).normalize()
    }

    /// Camera-space +Y in world coordinates.
    pub fn up_vector(&self) -> Vector3<f32> {
        self.right().cross(&self.forward())
    }

    pub fn distance_to(&self, point: &Point3<f32>) -> f32 {
        (point - self.position).norm()
    }
}
