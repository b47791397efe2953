use crate::assets::LoadError;
use glam::{Mat3, Mat4, Vec2, Vec3};
use gltf::mesh::Mode;
use std::path::Path;

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl ModelVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self { position: position.to_array(), normal: normal.to_array(), uv: uv.to_array() }
    }

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x3 },
                wgpu::VertexAttribute { offset: 12, shader_location: 1, format: wgpu::VertexFormat::Float32x3 },
                wgpu::VertexAttribute { offset: 24, shader_location: 2, format: wgpu::VertexFormat::Float32x2 },
            ],
        }
    }
}

#[derive(Clone, Debug)]
pub struct BaseColorTexture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// The renderable subtree of an imported model, flattened into one indexed triangle list.
#[derive(Clone, Debug)]
pub struct ModelData {
    pub label: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub base_color_factor: [f32; 4],
    pub base_color_texture: Option<BaseColorTexture>,
}

impl ModelData {
    pub fn new(label: impl Into<String>, vertices: Vec<ModelVertex>, indices: Vec<u32>) -> Self {
        Self {
            label: label.into(),
            vertices,
            indices,
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            base_color_texture: None,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Imports every triangle primitive reachable from the default scene, baking node transforms.
    pub fn load_gltf(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path_ref = path.as_ref();
        let (document, buffers, images) = gltf::import(path_ref)?;

        let mut vertices: Vec<ModelVertex> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        let mut base_color_factor = [1.0, 1.0, 1.0, 1.0];
        let mut base_color_texture = None;

        let mut stack: Vec<(gltf::Node, Mat4)> = match document.default_scene().or_else(|| document.scenes().next()) {
            Some(scene) => scene.nodes().map(|node| (node, Mat4::IDENTITY)).collect(),
            None => document.nodes().map(|node| (node, Mat4::IDENTITY)).collect(),
        };
        while let Some((node, parent)) = stack.pop() {
            let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
            for child in node.children() {
                stack.push((child, world));
            }
            let Some(mesh) = node.mesh() else {
                continue;
            };
            let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
            for primitive in mesh.primitives() {
                if primitive.mode() != Mode::Triangles {
                    continue;
                }
                let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
                let Some(positions_iter) = reader.read_positions() else {
                    continue;
                };
                let positions: Vec<Vec3> = positions_iter.map(Vec3::from_array).collect();
                if positions.is_empty() {
                    continue;
                }
                let local_indices: Vec<u32> = reader
                    .read_indices()
                    .map(|read| read.into_u32().collect())
                    .unwrap_or_else(|| (0..positions.len() as u32).collect());
                let mut normals: Vec<Vec3> = reader
                    .read_normals()
                    .map(|it| it.map(Vec3::from_array).collect())
                    .unwrap_or_default();
                if normals.len() != positions.len() || normals.iter().all(|n| n.length_squared() == 0.0) {
                    normals = compute_normals(&positions, &local_indices);
                }
                let tex_coords: Vec<Vec2> = reader
                    .read_tex_coords(0)
                    .map(|coords| coords.into_f32().map(Vec2::from_array).collect())
                    .unwrap_or_default();

                let base_vertex = vertices.len() as u32;
                vertices.extend(positions.iter().enumerate().map(|(i, pos)| {
                    let normal = (normal_matrix * normals[i]).normalize_or_zero();
                    let uv = tex_coords.get(i).copied().unwrap_or(Vec2::ZERO);
                    ModelVertex::new(world.transform_point3(*pos), normal, uv)
                }));
                for tri in local_indices.chunks_exact(3) {
                    if tri.iter().all(|idx| (*idx as usize) < positions.len()) {
                        indices.extend(tri.iter().map(|idx| idx + base_vertex));
                    }
                }

                let pbr = primitive.material().pbr_metallic_roughness();
                if base_color_texture.is_none() {
                    base_color_factor = pbr.base_color_factor();
                    if let Some(info) = pbr.base_color_texture() {
                        let source = info.texture().source().index();
                        if let Some(image) = images.get(source) {
                            base_color_texture = Some(BaseColorTexture {
                                width: image.width,
                                height: image.height,
                                rgba: convert_image_to_rgba(image)?,
                            });
                        }
                    }
                }
            }
        }

        if indices.is_empty() {
            return Err(LoadError::MissingMesh(path_ref.to_path_buf()));
        }
        let label = path_ref.file_stem().and_then(|s| s.to_str()).unwrap_or("model");
        let mut model = ModelData::new(label, vertices, indices);
        model.base_color_factor = base_color_factor;
        model.base_color_texture = base_color_texture;
        Ok(model)
    }
}

fn convert_image_to_rgba(image: &gltf::image::Data) -> Result<Vec<u8>, LoadError> {
    match image.format {
        gltf::image::Format::R8 => Ok(image.pixels.iter().flat_map(|&v| [v, v, v, 255]).collect()),
        gltf::image::Format::R8G8 => {
            Ok(image.pixels.chunks_exact(2).flat_map(|c| [c[0], c[1], 0, 255]).collect())
        }
        gltf::image::Format::R8G8B8 => {
            Ok(image.pixels.chunks_exact(3).flat_map(|c| [c[0], c[1], c[2], 255]).collect())
        }
        gltf::image::Format::R8G8B8A8 => Ok(image.pixels.clone()),
        other => Err(LoadError::UnsupportedFormat { what: "base colour texture", detail: format!("{other:?}") }),
    }
}

fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        let normal = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        normals[i0] += normal;
        normals[i1] += normal;
        normals[i2] += normal;
    }
    for normal in &mut normals {
        *normal = if normal.length_squared() > 0.0 { normal.normalize() } else { Vec3::Y };
    }
    normals
}
