//! Scene graph: an arena of transform nodes owned by a single [`Scene`].
//!
//! Nodes never leave the arena; the graph lives as long as the page. Each node
//! carries a local transform and an optional drawable kind. World transforms
//! are resolved top-down while walking the graph from its roots.

use nalgebra::{Matrix4, UnitQuaternion, Vector3};

use crate::engine::mesh::Mesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryId(usize);

/// Handle to a GPU texture issued by a [`TextureSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// Issues texture handles. Implementations may fill the texture later; the
/// handle is usable immediately.
pub trait TextureSource {
    fn load_texture(&mut self, url: &str) -> TextureId;
    fn load_cube_texture(&mut self, urls: [&str; 6]) -> TextureId;
    fn text_texture(&mut self, text: &str) -> Result<TextureId, crate::error::ViewerError>;
}

/// Converts a `0xRRGGBB` colour to normalised sRGB components.
pub fn color_from_hex(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Unlit.
    Basic {
        color: [f32; 3],
        map: Option<TextureId>,
        wireframe: bool,
        transparent: bool,
    },
    /// Lit by the ambient and point lights.
    Standard {
        color: [f32; 3],
        map: Option<TextureId>,
    },
}

impl Material {
    pub fn basic_map(map: TextureId) -> Self {
        Material::Basic {
            color: [1.0, 1.0, 1.0],
            map: Some(map),
            wireframe: false,
            transparent: false,
        }
    }

    pub fn standard_map(map: TextureId) -> Self {
        Material::Standard { color: [1.0, 1.0, 1.0], map: Some(map) }
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, Material::Basic { transparent: true, .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpriteSizing {
    /// Keeps the on-screen size the sprite has when seen from `reference_distance`.
    Screen { reference_distance: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh { geometry: GeometryId, material: Material },
    Sprite { map: TextureId, sizing: SpriteSizing },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            children: Vec::new(),
        }
    }

    pub fn group() -> Self {
        Node::new(NodeKind::Group)
    }

    pub fn mesh(geometry: GeometryId, material: Material) -> Self {
        Node::new(NodeKind::Mesh { geometry, material })
    }

    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vector3::new(x, y, z);
        self
    }

    pub fn with_rotation_x(mut self, angle: f32) -> Self {
        self.rotation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angle);
        self
    }

    pub fn with_scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = Vector3::new(x, y, z);
        self
    }

    pub fn local_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: [f32; 3],
    pub intensity: f32,
    /// Range beyond which the light contributes nothing; `0.0` is unlimited.
    pub distance: f32,
    pub position: Vector3<f32>,
}

pub struct Scene {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    geometries: Vec<Mesh>,
    pub background: Option<TextureId>,
    pub ambient_light: Option<AmbientLight>,
    pub point_light: Option<PointLight>,
}

impl Default for Scene {
    fn default() -> Self {
        Scene::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Scene {
            nodes: Vec::new(),
            roots: Vec::new(),
            geometries: Vec::new(),
            background: None,
            ambient_light: None,
            point_light: None,
        }
    }

    pub fn add_geometry(&mut self, mesh: Mesh) -> GeometryId {
        self.geometries.push(mesh);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn geometry(&self, id: GeometryId) -> &Mesh {
        &self.geometries[id.0]
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Adds `node` under `parent`, or at the root when `parent` is `None`.
    pub fn add(&mut self, mut node: Node, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.children.clear();
        self.nodes.push(node);
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Rotates a node about its own local Y axis.
    pub fn rotate_y(&mut self, id: NodeId, angle: f32) {
        let node = &mut self.nodes[id.0];
        node.rotation *= UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle);
    }

    /// Depth-first walk over every node with its resolved world matrix.
    pub fn visit<'a, F: FnMut(NodeId, &'a Node, &Matrix4<f32>)>(&'a self, mut f: F) {
        let mut stack: Vec<(NodeId, Matrix4<f32>)> = self
            .roots
            .iter()
            .rev()
            .map(|&id| (id, Matrix4::identity()))
            .collect();

        while let Some((id, parent_world)) = stack.pop() {
            let node = &self.nodes[id.0];
            let world = parent_world * node.local_matrix();
            f(id, node, &world);
            for &child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }
}

#[cfg(test)]
impl Scene {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.children.contains(&id)).map(NodeId)
    }

    pub fn world_matrix(&self, id: NodeId) -> Matrix4<f32> {
        let mut found = Matrix4::identity();
        self.visit(|node, _, world| {
            if node == id {
                found = *world;
            }
        });
        found
    }

    pub fn world_position(&self, id: NodeId) -> nalgebra::Point3<f32> {
        self.world_matrix(id).transform_point(&nalgebra::Point3::origin())
    }
}
