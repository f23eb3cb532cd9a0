use std::collections::HashMap;
use std::future::Future;

use nalgebra::{Matrix4, Point3, Vector3};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    HtmlCanvasElement, HtmlImageElement, WebGlBuffer, WebGlProgram, WebGlRenderingContext,
    WebGlShader, WebGlTexture, WebGlUniformLocation,
};

use crate::engine::camera::PerspectiveCamera;
use crate::engine::label::{rasterize_text, TextStyle};
use crate::engine::mesh::{Mesh, NORMAL_OFFSET, UV_OFFSET, VERTEX_STRIDE};
use crate::engine::scene::{
    GeometryId, Material, NodeKind, Scene, SpriteSizing, TextureId, TextureSource,
};
use crate::error::ViewerError;

type Gl = WebGlRenderingContext;

const VERTEX_SHADER: &str = r#"
    attribute vec3 aPosition;
    attribute vec3 aNormal;
    attribute vec2 aTexCoord;
    uniform mat4 uModel;
    uniform mat4 uViewProjection;
    varying vec3 vWorldPos;
    varying vec3 vNormal;
    varying vec2 vTexCoord;
    void main() {
        vec4 world = uModel * vec4(aPosition, 1.0);
        vWorldPos = world.xyz;
        vNormal = (uModel * vec4(aNormal, 0.0)).xyz;
        vTexCoord = aTexCoord;
        gl_Position = uViewProjection * world;
    }
"#;

const FRAGMENT_SHADER: &str = r#"
    precision highp float;
    varying vec3 vWorldPos;
    varying vec3 vNormal;
    varying vec2 vTexCoord;
    uniform sampler2D uTexture;
    uniform int uUseTexture;
    uniform int uLit;
    uniform vec3 uColor;
    uniform vec3 uAmbientLight;
    uniform vec3 uLightPosition;
    uniform vec3 uLightColor;
    uniform float uLightDistance;

    const float PI = 3.141592653589793;

    vec3 toLinear(vec3 c) {
        return pow(c, vec3(2.2));
    }

    vec3 toSrgb(vec3 c) {
        return pow(clamp(c, 0.0, 1.0), vec3(1.0 / 2.2));
    }

    void main() {
        vec4 base = vec4(toLinear(uColor), 1.0);
        if (uUseTexture == 1) {
            vec4 texColor = texture2D(uTexture, vTexCoord);
            base *= vec4(toLinear(texColor.rgb), texColor.a);
        }

        vec3 color = base.rgb;
        if (uLit == 1) {
            vec3 normal = normalize(vNormal);
            vec3 toLight = uLightPosition - vWorldPos;
            float dist = length(toLight);
            vec3 lightDir = toLight / max(dist, 0.0001);

            // Inverse-square falloff, faded to zero at the light's range.
            float attenuation = 1.0 / max(dist * dist, 0.01);
            if (uLightDistance > 0.0) {
                float window = clamp(1.0 - pow(dist / uLightDistance, 4.0), 0.0, 1.0);
                attenuation *= window * window;
            }

            float diffuse = max(dot(normal, lightDir), 0.0);
            vec3 irradiance = uAmbientLight + uLightColor * attenuation * diffuse;
            color = irradiance * base.rgb / PI;
        }

        gl_FragColor = vec4(toSrgb(color), base.a);
    }
"#;

const SKYBOX_VERTEX_SHADER: &str = r#"
    attribute vec3 aPosition;
    uniform mat4 uViewRotationProjection;
    varying vec3 vDirection;
    void main() {
        vDirection = aPosition;
        vec4 pos = uViewRotationProjection * vec4(aPosition, 1.0);
        gl_Position = pos.xyww;
    }
"#;

const SKYBOX_FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    varying vec3 vDirection;
    uniform samplerCube uCube;
    void main() {
        gl_FragColor = textureCube(uCube, vDirection);
    }
"#;

const CUBE_FACES: [u32; 6] = [
    Gl::TEXTURE_CUBE_MAP_POSITIVE_X,
    Gl::TEXTURE_CUBE_MAP_NEGATIVE_X,
    Gl::TEXTURE_CUBE_MAP_POSITIVE_Y,
    Gl::TEXTURE_CUBE_MAP_NEGATIVE_Y,
    Gl::TEXTURE_CUBE_MAP_POSITIVE_Z,
    Gl::TEXTURE_CUBE_MAP_NEGATIVE_Z,
];

/// A drawing surface the scene can be rendered into.
pub trait RenderTarget {
    fn set_size(&mut self, width: u32, height: u32);
    fn size(&self) -> (u32, u32);
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera);
}

struct MeshProgram {
    program: WebGlProgram,
    a_position: u32,
    a_normal: u32,
    a_tex_coord: u32,
    u_model: WebGlUniformLocation,
    u_view_projection: WebGlUniformLocation,
    u_use_texture: WebGlUniformLocation,
    u_lit: WebGlUniformLocation,
    u_color: WebGlUniformLocation,
    u_ambient_light: WebGlUniformLocation,
    u_light_position: WebGlUniformLocation,
    u_light_color: WebGlUniformLocation,
    u_light_distance: WebGlUniformLocation,
}

struct SkyboxProgram {
    program: WebGlProgram,
    a_position: u32,
    u_view_rotation_projection: WebGlUniformLocation,
}

struct GpuGeometry {
    vertex_buffer: WebGlBuffer,
    index_buffer: WebGlBuffer,
    index_count: i32,
    line_buffer: Option<(WebGlBuffer, i32)>,
}

struct DrawItem<'a> {
    material: DrawMaterial<'a>,
    model: Matrix4<f32>,
    depth: f32,
}

enum DrawMaterial<'a> {
    Mesh { geometry: GeometryId, material: &'a Material },
    Sprite { map: TextureId },
}

pub struct Renderer {
    pub gl: WebGlRenderingContext,
    canvas: HtmlCanvasElement,
    mesh_program: MeshProgram,
    skybox_program: SkyboxProgram,
    skybox: GpuGeometry,
    quad: GpuGeometry,
    geometries: HashMap<GeometryId, GpuGeometry>,
    textures: Vec<(WebGlTexture, u32)>,
    width: u32,
    height: u32,
}

impl Renderer {
    pub fn new(gl: WebGlRenderingContext) -> Result<Self, ViewerError> {
        let canvas = gl
            .canvas()
            .and_then(|c| c.dyn_into::<HtmlCanvasElement>().ok())
            .ok_or(ViewerError::WebGlUnavailable)?;

        let mesh_program = MeshProgram::new(&gl)?;
        let skybox_program = SkyboxProgram::new(&gl)?;
        let skybox = upload_geometry(&gl, &Mesh::cube(2.0), false)?;
        let quad = upload_geometry(&gl, &Mesh::quad(), false)?;

        gl.enable(Gl::DEPTH_TEST);
        gl.depth_func(Gl::LEQUAL);

        let (width, height) = (canvas.width(), canvas.height());
        Ok(Renderer {
            gl,
            canvas,
            mesh_program,
            skybox_program,
            skybox,
            quad,
            geometries: HashMap::new(),
            textures: Vec::new(),
            width,
            height,
        })
    }

    fn clear(&self, r: f32, g: f32, b: f32) {
        self.gl.clear_color(r, g, b, 1.0);
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
    }

    fn enable_blend(&self) {
        self.gl.enable(Gl::BLEND);
        self.gl.blend_func(Gl::SRC_ALPHA, Gl::ONE_MINUS_SRC_ALPHA);
    }

    fn disable_blend(&self) {
        self.gl.disable(Gl::BLEND);
    }

    /// Creates a texture holding a transparent placeholder pixel so it can be
    /// bound before its image arrives.
    fn placeholder_texture(&mut self, target: u32) -> Result<TextureId, ViewerError> {
        let texture = self.gl.create_texture().ok_or(ViewerError::ResourceCreation("texture"))?;
        self.gl.bind_texture(target, Some(&texture));

        let pixel = [0u8, 0, 0, 0];
        let faces: &[u32] = if target == Gl::TEXTURE_CUBE_MAP {
            &CUBE_FACES
        } else {
            &[Gl::TEXTURE_2D]
        };
        for &face in faces {
            self.gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
                face,
                0,
                Gl::RGBA as i32,
                1,
                1,
                0,
                Gl::RGBA,
                Gl::UNSIGNED_BYTE,
                Some(&pixel),
            )?;
        }

        self.textures.push((texture, target));
        Ok(TextureId(self.textures.len() - 1))
    }

    fn try_load_texture(&mut self, url: &str, target: u32) -> Result<TextureId, ViewerError> {
        let id = self.placeholder_texture(target)?;
        let gl = self.gl.clone();
        let texture = self.textures[id.0].0.clone();
        let url = url.to_owned();

        spawn_local(async move {
            match load_image(&url).await {
                Ok(image) => match upload_image(&gl, &texture, target, &image) {
                    Ok(()) => {
                        log::debug!("texture {} ready ({}x{})", url, image.width(), image.height())
                    }
                    Err(e) => log::warn!("texture {} upload failed: {}", url, e),
                },
                Err(e) => log::warn!("{}", e),
            }
        });

        Ok(id)
    }

    fn gpu_geometry(
        &mut self,
        scene: &Scene,
        id: GeometryId,
        wireframe: bool,
    ) -> Result<(), ViewerError> {
        let needs_upload = match self.geometries.get(&id) {
            None => true,
            Some(gpu) => wireframe && gpu.line_buffer.is_none(),
        };
        if needs_upload {
            let gpu = upload_geometry(&self.gl, scene.geometry(id), wireframe)?;
            self.geometries.insert(id, gpu);
        }
        Ok(())
    }

    fn draw_background(&self, texture: TextureId, camera: &PerspectiveCamera) {
        let Some((cube, _)) = self.textures.get(texture.0) else {
            return;
        };
        let program = &self.skybox_program;
        self.gl.use_program(Some(&program.program));
        self.gl.depth_mask(false);

        let mut view = camera.view();
        view[(0, 3)] = 0.0;
        view[(1, 3)] = 0.0;
        view[(2, 3)] = 0.0;
        let view_rotation_projection = camera.projection() * view;
        self.gl.uniform_matrix4fv_with_f32_array(
            Some(&program.u_view_rotation_projection),
            false,
            view_rotation_projection.as_slice(),
        );

        self.gl.active_texture(Gl::TEXTURE0);
        self.gl.bind_texture(Gl::TEXTURE_CUBE_MAP, Some(cube));

        let gl = &self.gl;
        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&self.skybox.vertex_buffer));
        let location = program.a_position;
        gl.vertex_attrib_pointer_with_i32(location, 3, Gl::FLOAT, false, VERTEX_STRIDE, 0);
        gl.enable_vertex_attrib_array(location);
        gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&self.skybox.index_buffer));
        gl.draw_elements_with_i32(Gl::TRIANGLES, self.skybox.index_count, Gl::UNSIGNED_SHORT, 0);

        self.gl.depth_mask(true);
    }

    fn bind_mesh_attributes(&self, gpu: &GpuGeometry) {
        let program = &self.mesh_program;
        let gl = &self.gl;
        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&gpu.vertex_buffer));

        let attributes = [
            (program.a_position, 3, 0),
            (program.a_normal, 3, NORMAL_OFFSET),
            (program.a_tex_coord, 2, UV_OFFSET),
        ];
        for (location, size, offset) in attributes {
            gl.vertex_attrib_pointer_with_i32(
                location,
                size,
                Gl::FLOAT,
                false,
                VERTEX_STRIDE,
                offset,
            );
            gl.enable_vertex_attrib_array(location);
        }
    }

    fn bind_map(&self, map: Option<TextureId>) {
        let program = &self.mesh_program;
        match map.and_then(|id| self.textures.get(id.0)) {
            Some((texture, _)) => {
                self.gl.active_texture(Gl::TEXTURE0);
                self.gl.bind_texture(Gl::TEXTURE_2D, Some(texture));
                self.gl.uniform1i(Some(&program.u_use_texture), 1);
            }
            None => self.gl.uniform1i(Some(&program.u_use_texture), 0),
        }
    }

    fn set_lights(&self, scene: &Scene) {
        let program = &self.mesh_program;

        let ambient = scene
            .ambient_light
            .map(|light| linear(light.color).map(|c| c * light.intensity))
            .unwrap_or([0.0; 3]);
        self.gl.uniform3f(Some(&program.u_ambient_light), ambient[0], ambient[1], ambient[2]);

        match scene.point_light {
            Some(light) => {
                let color = linear(light.color).map(|c| c * light.intensity);
                self.gl.uniform3f(Some(&program.u_light_color), color[0], color[1], color[2]);
                self.gl.uniform3f(
                    Some(&program.u_light_position),
                    light.position.x,
                    light.position.y,
                    light.position.z,
                );
                self.gl.uniform1f(Some(&program.u_light_distance), light.distance);
            }
            None => self.gl.uniform3f(Some(&program.u_light_color), 0.0, 0.0, 0.0),
        }
    }

    fn draw_item(&self, item: &DrawItem) {
        let program = &self.mesh_program;
        let model = item.model.as_slice();
        self.gl.uniform_matrix4fv_with_f32_array(Some(&program.u_model), false, model);

        match item.material {
            DrawMaterial::Sprite { map } => {
                self.gl.uniform1i(Some(&program.u_lit), 0);
                self.gl.uniform3f(Some(&program.u_color), 1.0, 1.0, 1.0);
                self.bind_map(Some(map));
                self.bind_mesh_attributes(&self.quad);
                self.gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&self.quad.index_buffer));
                let count = self.quad.index_count;
                self.gl.draw_elements_with_i32(Gl::TRIANGLES, count, Gl::UNSIGNED_SHORT, 0);
            }
            DrawMaterial::Mesh { geometry, material } => {
                let Some(gpu) = self.geometries.get(&geometry) else {
                    return;
                };
                let (color, map, lit, wireframe) = match material {
                    Material::Basic { color, map, wireframe, .. } => {
                        (*color, *map, false, *wireframe)
                    }
                    Material::Standard { color, map } => (*color, *map, true, false),
                };
                self.gl.uniform1i(Some(&program.u_lit), lit as i32);
                self.gl.uniform3f(Some(&program.u_color), color[0], color[1], color[2]);
                self.bind_map(map);
                self.bind_mesh_attributes(gpu);

                match (&gpu.line_buffer, wireframe) {
                    (Some((lines, count)), true) => {
                        self.gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(lines));
                        self.gl.draw_elements_with_i32(Gl::LINES, *count, Gl::UNSIGNED_SHORT, 0);
                    }
                    _ => {
                        self.gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&gpu.index_buffer));
                        let count = gpu.index_count;
                        self.gl.draw_elements_with_i32(Gl::TRIANGLES, count, Gl::UNSIGNED_SHORT, 0);
                    }
                }
            }
        }
    }
}

impl TextureSource for Renderer {
    fn load_texture(&mut self, url: &str) -> TextureId {
        match self.try_load_texture(url, Gl::TEXTURE_2D) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("texture {} unavailable: {}", url, e);
                self.missing_texture()
            }
        }
    }

    /// Loads each distinct face image once and uploads it to every face that
    /// names it.
    fn load_cube_texture(&mut self, urls: [&str; 6]) -> TextureId {
        let id = match self.placeholder_texture(Gl::TEXTURE_CUBE_MAP) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("cube texture unavailable: {}", e);
                return self.missing_texture();
            }
        };

        let mut distinct: Vec<(String, Vec<u32>)> = Vec::new();
        for (face, url) in CUBE_FACES.iter().zip(urls.iter()) {
            match distinct.iter_mut().find(|(u, _)| u == url) {
                Some((_, faces)) => faces.push(*face),
                None => distinct.push((url.to_string(), vec![*face])),
            }
        }

        for (url, faces) in distinct {
            let gl = self.gl.clone();
            let texture = self.textures[id.0].0.clone();
            spawn_local(async move {
                let image = match load_image(&url).await {
                    Ok(image) => image,
                    Err(e) => {
                        log::warn!("{}", e);
                        return;
                    }
                };
                gl.bind_texture(Gl::TEXTURE_CUBE_MAP, Some(&texture));
                gl.pixel_storei(Gl::UNPACK_FLIP_Y_WEBGL, 0);
                for face in faces {
                    if let Err(e) = gl.tex_image_2d_with_u32_and_u32_and_image(
                        face,
                        0,
                        Gl::RGBA as i32,
                        Gl::RGBA,
                        Gl::UNSIGNED_BYTE,
                        &image,
                    ) {
                        log::warn!("cube face {} upload failed: {:?}", url, e);
                        return;
                    }
                }
                set_sampling(&gl, Gl::TEXTURE_CUBE_MAP, image.width(), image.height());
                log::debug!("cube texture {} ready", url);
            });
        }

        id
    }

    fn text_texture(&mut self, text: &str) -> Result<TextureId, ViewerError> {
        let canvas = rasterize_text(text, &TextStyle::default())?;
        let texture = self
            .gl
            .create_texture()
            .ok_or(ViewerError::ResourceCreation("label texture"))?;
        self.gl.bind_texture(Gl::TEXTURE_2D, Some(&texture));
        self.gl.pixel_storei(Gl::UNPACK_FLIP_Y_WEBGL, 1);
        self.gl.tex_image_2d_with_u32_and_u32_and_canvas(
            Gl::TEXTURE_2D,
            0,
            Gl::RGBA as i32,
            Gl::RGBA,
            Gl::UNSIGNED_BYTE,
            &canvas,
        )?;
        set_sampling(&self.gl, Gl::TEXTURE_2D, canvas.width(), canvas.height());

        self.textures.push((texture, Gl::TEXTURE_2D));
        Ok(TextureId(self.textures.len() - 1))
    }
}

impl Renderer {
    /// Handle used when even a placeholder could not be created; binding it
    /// falls back to untextured drawing.
    fn missing_texture(&self) -> TextureId {
        TextureId(usize::MAX)
    }
}

impl RenderTarget for Renderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        if let Err(e) = self
            .canvas
            .style()
            .set_property("width", &format!("{}px", width))
            .and_then(|_| self.canvas.style().set_property("height", &format!("{}px", height)))
        {
            log::warn!("could not size canvas: {:?}", e);
        }
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        let mut wireframes = Vec::new();
        let mut solids = Vec::new();
        scene.visit(|_, node, _| {
            if let NodeKind::Mesh { geometry, material } = &node.kind {
                match material {
                    Material::Basic { wireframe: true, .. } => wireframes.push(*geometry),
                    _ => solids.push(*geometry),
                }
            }
        });
        let uploads = solids
            .into_iter()
            .map(|g| (g, false))
            .chain(wireframes.into_iter().map(|g| (g, true)));
        for (id, wireframe) in uploads {
            if let Err(e) = self.gpu_geometry(scene, id, wireframe) {
                log::error!("geometry upload failed: {}", e);
            }
        }

        self.clear(0.0, 0.0, 0.0);
        self.disable_blend();

        if let Some(background) = scene.background {
            self.draw_background(background, camera);
        }

        let view_projection = camera.view_projection();
        let mut opaque = Vec::new();
        let mut transparent = Vec::new();

        scene.visit(|_, node, world| {
            let position = world.transform_point(&Point3::origin());
            let depth = camera.distance_to(&position);
            match &node.kind {
                NodeKind::Group => {}
                NodeKind::Mesh { geometry, material } => {
                    let item = DrawItem {
                        material: DrawMaterial::Mesh { geometry: *geometry, material },
                        model: *world,
                        depth,
                    };
                    if material.is_transparent() {
                        transparent.push(item);
                    } else {
                        opaque.push(item);
                    }
                }
                NodeKind::Sprite { map, sizing } => {
                    let scale = sprite_scale(world, *sizing, depth);
                    transparent.push(DrawItem {
                        material: DrawMaterial::Sprite { map: *map },
                        model: billboard(&position, camera, scale),
                        depth,
                    });
                }
            }
        });

        let program = &self.mesh_program;
        self.gl.use_program(Some(&program.program));
        self.gl.uniform_matrix4fv_with_f32_array(
            Some(&program.u_view_projection),
            false,
            view_projection.as_slice(),
        );
        self.set_lights(scene);

        for item in &opaque {
            self.draw_item(item);
        }

        transparent.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        self.enable_blend();
        for item in &transparent {
            self.draw_item(item);
        }
        self.disable_blend();
    }
}

impl MeshProgram {
    fn new(gl: &WebGlRenderingContext) -> Result<Self, ViewerError> {
        let program = create_program(gl, VERTEX_SHADER, FRAGMENT_SHADER)?;
        gl.use_program(Some(&program));
        gl.uniform1i(gl.get_uniform_location(&program, "uTexture").as_ref(), 0);

        Ok(MeshProgram {
            a_position: attrib(gl, &program, "aPosition")?,
            a_normal: attrib(gl, &program, "aNormal")?,
            a_tex_coord: attrib(gl, &program, "aTexCoord")?,
            u_model: uniform(gl, &program, "uModel")?,
            u_view_projection: uniform(gl, &program, "uViewProjection")?,
            u_use_texture: uniform(gl, &program, "uUseTexture")?,
            u_lit: uniform(gl, &program, "uLit")?,
            u_color: uniform(gl, &program, "uColor")?,
            u_ambient_light: uniform(gl, &program, "uAmbientLight")?,
            u_light_position: uniform(gl, &program, "uLightPosition")?,
            u_light_color: uniform(gl, &program, "uLightColor")?,
            u_light_distance: uniform(gl, &program, "uLightDistance")?,
            program,
        })
    }
}

impl SkyboxProgram {
    fn new(gl: &WebGlRenderingContext) -> Result<Self, ViewerError> {
        let program = create_program(gl, SKYBOX_VERTEX_SHADER, SKYBOX_FRAGMENT_SHADER)?;
        gl.use_program(Some(&program));
        gl.uniform1i(gl.get_uniform_location(&program, "uCube").as_ref(), 0);

        Ok(SkyboxProgram {
            a_position: attrib(gl, &program, "aPosition")?,
            u_view_rotation_projection: uniform(gl, &program, "uViewRotationProjection")?,
            program,
        })
    }
}

/// World-space scale of a sprite drawn `distance` away from the camera.
pub fn sprite_scale(world: &Matrix4<f32>, sizing: SpriteSizing, distance: f32) -> Vector3<f32> {
    let SpriteSizing::Screen { reference_distance } = sizing;
    let scale = Vector3::new(
        world.fixed_view::<3, 1>(0, 0).norm(),
        world.fixed_view::<3, 1>(0, 1).norm(),
        1.0,
    );
    if reference_distance <= 0.0 {
        return scale;
    }
    let k = distance / reference_distance;
    Vector3::new(scale.x * k, scale.y * k, 1.0)
}

/// Model matrix placing a unit quad at `position`, facing the camera.
pub fn billboard(
    position: &Point3<f32>,
    camera: &PerspectiveCamera,
    scale: Vector3<f32>,
) -> Matrix4<f32> {
    let right = camera.right();
    let up = camera.up_vector();
    let back = -camera.forward();
    #[rustfmt::skip]
    let rotation = Matrix4::new(
        right.x, up.x, back.x, 0.0,
        right.y, up.y, back.y, 0.0,
        right.z, up.z, back.z, 0.0,
        0.0, 0.0, 0.0, 1.0,
    );
    Matrix4::new_translation(&position.coords) * rotation * Matrix4::new_nonuniform_scaling(&scale)
}

/// sRGB components to linear light.
pub fn linear(color: [f32; 3]) -> [f32; 3] {
    color.map(|c| c.powf(2.2))
}

/// Resolves once `url` has been decoded into an image element.
pub fn load_image(url: &str) -> impl Future<Output = Result<HtmlImageElement, ViewerError>> {
    let url = url.to_owned();
    async move {
        let image = HtmlImageElement::new()?;
        image.set_cross_origin(Some("anonymous"));
        let promise = js_sys::Promise::new(&mut |resolve, reject| {
            image.set_onload(Some(&resolve));
            image.set_onerror(Some(&reject));
        });
        image.set_src(&url);

        let result = JsFuture::from(promise).await;
        image.set_onload(None);
        image.set_onerror(None);
        result.map_err(|_| ViewerError::TextureLoad { url })?;
        Ok(image)
    }
}

fn upload_image(
    gl: &WebGlRenderingContext,
    texture: &WebGlTexture,
    target: u32,
    image: &HtmlImageElement,
) -> Result<(), ViewerError> {
    gl.bind_texture(target, Some(texture));
    gl.pixel_storei(Gl::UNPACK_FLIP_Y_WEBGL, 1);
    let (format, kind) = (Gl::RGBA, Gl::UNSIGNED_BYTE);
    gl.tex_image_2d_with_u32_and_u32_and_image(target, 0, format as i32, format, kind, image)?;
    set_sampling(gl, target, image.width(), image.height());
    Ok(())
}

fn set_sampling(gl: &WebGlRenderingContext, target: u32, width: u32, height: u32) {
    if is_power_of_2(width) && is_power_of_2(height) {
        gl.generate_mipmap(target);
        gl.tex_parameteri(target, Gl::TEXTURE_MIN_FILTER, Gl::LINEAR_MIPMAP_LINEAR as i32);
    } else {
        gl.tex_parameteri(target, Gl::TEXTURE_WRAP_S, Gl::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(target, Gl::TEXTURE_WRAP_T, Gl::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(target, Gl::TEXTURE_MIN_FILTER, Gl::LINEAR as i32);
    }
    gl.tex_parameteri(target, Gl::TEXTURE_MAG_FILTER, Gl::LINEAR as i32);
}

fn upload_geometry(
    gl: &WebGlRenderingContext,
    mesh: &Mesh,
    wireframe: bool,
) -> Result<GpuGeometry, ViewerError> {
    let vertex_buffer = gl.create_buffer().ok_or(ViewerError::ResourceCreation("vertex buffer"))?;
    gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&vertex_buffer));
    unsafe {
        let vert_array = js_sys::Float32Array::view(&mesh.vertices);
        gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &vert_array, Gl::STATIC_DRAW);
    }

    let index_buffer = upload_indices(gl, &mesh.indices)?;
    let line_buffer = if wireframe {
        let lines = mesh.wireframe_indices();
        Some((upload_indices(gl, &lines)?, lines.len() as i32))
    } else {
        None
    };

    Ok(GpuGeometry {
        vertex_buffer,
        index_buffer,
        index_count: mesh.indices.len() as i32,
        line_buffer,
    })
}

fn upload_indices(gl: &WebGlRenderingContext, indices: &[u16]) -> Result<WebGlBuffer, ViewerError> {
    let buffer = gl.create_buffer().ok_or(ViewerError::ResourceCreation("index buffer"))?;
    gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&buffer));
    unsafe {
        let idx_array = js_sys::Uint16Array::view(indices);
        gl.buffer_data_with_array_buffer_view(
            Gl::ELEMENT_ARRAY_BUFFER,
            &idx_array,
            Gl::STATIC_DRAW,
        );
    }
    Ok(buffer)
}

fn attrib(
    gl: &WebGlRenderingContext,
    program: &WebGlProgram,
    name: &'static str,
) -> Result<u32, ViewerError> {
    let location = gl.get_attrib_location(program, name);
    if location < 0 {
        return Err(ViewerError::MissingAttribute(name));
    }
    Ok(location as u32)
}

fn uniform(
    gl: &WebGlRenderingContext,
    program: &WebGlProgram,
    name: &'static str,
) -> Result<WebGlUniformLocation, ViewerError> {
    gl.get_uniform_location(program, name).ok_or(ViewerError::MissingUniform(name))
}

fn is_power_of_2(value: u32) -> bool {
    value != 0 && (value & (value - 1)) == 0
}

fn create_program(
    gl: &WebGlRenderingContext,
    vertex: &str,
    fragment: &str,
) -> Result<WebGlProgram, ViewerError> {
    let vert_shader = compile_shader(gl, Gl::VERTEX_SHADER, vertex)?;
    let frag_shader = compile_shader(gl, Gl::FRAGMENT_SHADER, fragment)?;

    let program = gl.create_program().ok_or(ViewerError::ResourceCreation("program"))?;
    gl.attach_shader(&program, &vert_shader);
    gl.attach_shader(&program, &frag_shader);
    gl.link_program(&program);

    if gl.get_program_parameter(&program, Gl::LINK_STATUS).as_bool().unwrap_or(false) {
        Ok(program)
    } else {
        Err(ViewerError::ProgramLink(gl.get_program_info_log(&program).unwrap_or_default()))
    }
}

fn compile_shader(
    gl: &WebGlRenderingContext,
    shader_type: u32,
    source: &str,
) -> Result<WebGlShader, ViewerError> {
    let shader = gl.create_shader(shader_type).ok_or(ViewerError::ResourceCreation("shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl.get_shader_parameter(&shader, Gl::COMPILE_STATUS).as_bool().unwrap_or(false) {
        Ok(shader)
    } else {
        Err(ViewerError::ShaderCompile(gl.get_shader_info_log(&shader).unwrap_or_default()))
    }
}
