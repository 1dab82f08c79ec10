use crate::scene::{placeholder_desk, Material, MeshGeometry, SceneGraph};
use glam::{Mat3, Mat4, Vec3};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};

/// Largest remote scene accepted.
const MAX_SCENE_BYTES: u64 = 256 << 20;
/// Upper bound on the buffer reserved up front from `Content-Length`.
const PREALLOCATE_LIMIT: u64 = 64 << 20;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to import glTF {path}: {source}")]
    Import {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("failed to read response body from {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{url} exceeds the {limit} byte scene size limit")]
    TooLarge { url: String, limit: u64 },
    #[error("scene {name} contains no triangle geometry")]
    NoGeometry { name: String },
    #[error("failed to start scene loader: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AssetError>;

/// Where a scene asset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneSource {
    File(PathBuf),
    Remote(String),
}

impl SceneSource {
    pub fn display_name(&self) -> String {
        match self {
            SceneSource::File(path) => path
                .file_name()
                .and_then(|value| value.to_str())
                .unwrap_or("scene")
                .to_string(),
            SceneSource::Remote(url) => url.rsplit('/').next().unwrap_or(url).to_string(),
        }
    }
}

#[derive(Debug)]
pub enum LoadEvent {
    /// Fraction in `[0, 1]`.
    Progress(f32),
    Loaded(SceneGraph),
    Failed(String),
}

/// Runs one fetch-and-parse on a worker thread; the frame loop drains events with [`SceneLoader::poll`].
pub struct SceneLoader {
    source: SceneSource,
    receiver: Receiver<LoadEvent>,
    finished: bool,
}

impl SceneLoader {
    pub fn spawn(source: SceneSource) -> Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let worker_source = source.clone();
        std::thread::Builder::new()
            .name("scene-loader".to_string())
            .spawn(move || {
                let progress_sender = sender.clone();
                let mut report = move |fraction: f32| {
                    let _ = progress_sender.send(LoadEvent::Progress(fraction.clamp(0.0, 1.0)));
                };
                let event = match load_scene(&worker_source, &mut report) {
                    Ok(scene) => LoadEvent::Loaded(scene),
                    Err(err) => LoadEvent::Failed(err.to_string()),
                };
                let _ = sender.send(event);
            })
            .map_err(AssetError::Spawn)?;
        log::info!("Loading scene from {:?}", source);
        Ok(Self {
            source,
            receiver,
            finished: false,
        })
    }

    pub fn source(&self) -> &SceneSource {
        &self.source
    }

    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if matches!(event, LoadEvent::Loaded(_) | LoadEvent::Failed(_)) {
                        self.finished = true;
                    }
                    events.push(event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.finished {
                        self.finished = true;
                        events.push(LoadEvent::Failed("scene loader stopped".to_string()));
                    }
                    break;
                }
            }
        }
        events
    }
}

pub fn load_scene(source: &SceneSource, progress: &mut dyn FnMut(f32)) -> Result<SceneGraph> {
    let name = source.display_name();
    let scene = match source {
        SceneSource::File(path) if !path.exists() => {
            log::warn!(
                "Scene file {} not found, using the placeholder desk",
                path.display()
            );
            progress(1.0);
            placeholder_desk()
        }
        SceneSource::File(path) => {
            progress(0.0);
            let scene = load_scene_from_path(path)?;
            progress(1.0);
            scene
        }
        SceneSource::Remote(url) => {
            let bytes = fetch_bytes(url, progress)?;
            load_scene_from_slice(&bytes, &name)?
        }
    };
    log::info!(
        "Scene {} ready: {} meshes, {} triangles",
        scene.name(),
        scene.meshes().len(),
        scene.triangle_count()
    );
    Ok(scene)
}

pub fn load_scene_from_path(path: &Path) -> Result<SceneGraph> {
    let (document, buffers, _images) = gltf::import(path).map_err(|source| AssetError::Import {
        path: path.display().to_string(),
        source,
    })?;
    let name = path
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or("gltf")
        .to_string();
    build_scene(&document, &buffers, &name)
}

pub fn load_scene_from_slice(bytes: &[u8], name: &str) -> Result<SceneGraph> {
    let (document, buffers, _images) =
        gltf::import_slice(bytes).map_err(|source| AssetError::Import {
            path: name.to_string(),
            source,
        })?;
    build_scene(&document, &buffers, name)
}

fn fetch_bytes(url: &str, progress: &mut dyn FnMut(f32)) -> Result<Vec<u8>> {
    let response = ureq::get(url).call().map_err(|source| AssetError::Fetch {
        url: url.to_string(),
        source: Box::new(source),
    })?;
    let total = response
        .header("Content-Length")
        .and_then(|value| value.parse::<u64>().ok());
    read_limited(response.into_reader(), total, MAX_SCENE_BYTES, url, progress)
}

/// Reads at most `limit` bytes; the advertised length only sizes the buffer and drives progress.
fn read_limited(
    reader: impl Read,
    total: Option<u64>,
    limit: u64,
    url: &str,
    progress: &mut dyn FnMut(f32),
) -> Result<Vec<u8>> {
    let capacity = total.map_or(0, |total| total.min(limit).min(PREALLOCATE_LIMIT));
    let mut bytes = Vec::with_capacity(capacity as usize);
    let mut reader = reader.take(limit.saturating_add(1));
    let mut chunk = [0u8; 64 * 1024];
    loop {
        let read = reader.read(&mut chunk).map_err(|source| AssetError::Read {
            url: url.to_string(),
            source,
        })?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        if bytes.len() as u64 > limit {
            return Err(AssetError::TooLarge {
                url: url.to_string(),
                limit,
            });
        }
        if let Some(total) = total.filter(|total| *total > 0) {
            progress((bytes.len() as f64 / total as f64) as f32);
        }
    }
    progress(1.0);
    Ok(bytes)
}

fn build_scene(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    name: &str,
) -> Result<SceneGraph> {
    let mut scene = SceneGraph::new(name);
    let root = document
        .default_scene()
        .or_else(|| document.scenes().next());
    if let Some(root) = root {
        for node in root.nodes() {
            process_node(&node, buffers, &Mat4::IDENTITY, &mut scene);
        }
    }
    if scene.is_empty() {
        return Err(AssetError::NoGeometry {
            name: name.to_string(),
        });
    }
    Ok(scene)
}

fn process_node(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    parent_transform: &Mat4,
    scene: &mut SceneGraph,
) {
    let local_transform = Mat4::from_cols_array_2d(&node.transform().matrix());
    let global_transform = *parent_transform * local_transform;

    if let Some(mesh) = node.mesh() {
        let mesh_name = node
            .name()
            .or_else(|| mesh.name())
            .unwrap_or_default()
            .to_string();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::debug!("Skipping non-triangle primitive on {}", mesh_name);
                continue;
            }
            if let Some(geometry) = read_primitive(&primitive, buffers, &global_transform) {
                scene.push_mesh(mesh_name.clone(), geometry, read_material(&primitive));
            }
        }
    }

    for child in node.children() {
        process_node(&child, buffers, &global_transform, scene);
    }
}

fn read_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    transform: &Mat4,
) -> Option<MeshGeometry> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
    let positions: Vec<[f32; 3]> = reader
        .read_positions()?
        .map(|pos| transform.transform_point3(Vec3::from(pos)).to_array())
        .collect();
    if positions.is_empty() {
        return None;
    }
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let normal_matrix = Mat3::from_mat4(*transform).inverse().transpose();
    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(normals) => normals
            .map(|n| (normal_matrix * Vec3::from(n)).normalize_or_zero().to_array())
            .collect(),
        None => accumulate_normals(&positions, &indices),
    };
    if normals.len() != positions.len() {
        return None;
    }
    Some(MeshGeometry {
        positions,
        normals,
        indices,
    })
}

fn read_material(primitive: &gltf::Primitive) -> Material {
    let material = primitive.material();
    Material {
        base_color: material.pbr_metallic_roughness().base_color_factor(),
        emissive: material.emissive_factor(),
    }
}

fn accumulate_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let (Some(pa), Some(pb), Some(pc)) = (positions.get(a), positions.get(b), positions.get(c))
        else {
            continue;
        };
        let (pa, pb, pc) = (Vec3::from(*pa), Vec3::from(*pb), Vec3::from(*pc));
        let face = (pb - pa).cross(pc - pa);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|n| n.normalize_or_zero().to_array())
        .collect()
}

/// Binary glTF holding one unindexed triangle on a node named `node_name`.
#[cfg(test)]
pub(crate) fn single_triangle_glb(node_name: &str, translation: [f32; 3]) -> Vec<u8> {
    const GLB_MAGIC: u32 = 0x4654_6C67;
    const CHUNK_JSON: u32 = 0x4E4F_534A;
    const CHUNK_BIN: u32 = 0x004E_4942;

    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let mut bin: Vec<u8> = positions.iter().flat_map(|v| v.to_le_bytes()).collect();
    let json = serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": node_name, "mesh": 0, "translation": translation }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "buffers": [{ "byteLength": bin.len() }],
        "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": bin.len() }],
        "accessors": [{
            "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
            "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
        }]
    });
    let mut json = json.to_string().into_bytes();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());
    glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(&json);
    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    glb.extend_from_slice(&bin);
    glb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_uses_last_segment() {
        assert_eq!(
            SceneSource::File(PathBuf::from("assets/portfolio.glb")).display_name(),
            "portfolio.glb"
        );
        assert_eq!(
            SceneSource::Remote("https://example.com/scenes/room.glb".to_string()).display_name(),
            "room.glb"
        );
    }

    #[test]
    fn accumulated_normals_follow_winding() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals = accumulate_normals(&positions, &[0, 1, 2]);
        for normal in normals {
            assert!((normal[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn missing_file_is_an_import_error() {
        let path = std::env::temp_dir().join("deskfolio_missing_scene.glb");
        let err = load_scene_from_path(&path).unwrap_err();
        assert!(matches!(err, AssetError::Import { .. }));
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let err = load_scene_from_slice(b"not a gltf", "junk").unwrap_err();
        assert!(matches!(err, AssetError::Import { .. }));
    }

    #[test]
    fn minimal_glb_builds_named_mesh() {
        let bytes = single_triangle_glb("OfficeDesk01", [0.0, 0.0, 2.0]);
        let scene = load_scene_from_slice(&bytes, "inline").unwrap();
        assert_eq!(scene.meshes().len(), 1);
        let mesh = &scene.meshes()[0];
        assert_eq!(mesh.name, "OfficeDesk01");
        assert_eq!(mesh.geometry.indices, vec![0, 1, 2]);
        assert!((mesh.bounds.min.z - 2.0).abs() < 1e-6);
        assert_eq!(mesh.material, Material {
            base_color: [1.0, 1.0, 1.0, 1.0],
            emissive: [0.0, 0.0, 0.0],
        });
    }

    #[test]
    fn missing_local_scene_falls_back_to_placeholder() {
        let path = std::env::temp_dir().join("deskfolio_absent_portfolio.glb");
        let mut last = 0.0;
        let scene = load_scene(&SceneSource::File(path), &mut |fraction: f32| last = fraction).unwrap();
        assert_eq!(scene.name(), "placeholder desk");
        assert!(scene.meshes().iter().any(|mesh| mesh.name == "Computer_Monitor"));
        assert_eq!(last, 1.0);
    }

    #[test]
    fn body_over_limit_is_rejected() {
        let body = std::io::repeat(0).take(100);
        let err = read_limited(body, Some(100), 64, "http://local/big.glb", &mut |_: f32| {}).unwrap_err();
        assert!(matches!(err, AssetError::TooLarge { limit: 64, .. }));

        let body = std::io::repeat(7).take(64);
        let bytes = read_limited(body, None, 64, "http://local/ok.glb", &mut |_: f32| {}).unwrap();
        assert_eq!(bytes.len(), 64);
    }

    #[test]
    fn bogus_content_length_does_not_preallocate() {
        let body = std::io::repeat(0).take(10);
        let mut reported = Vec::new();
        let bytes = read_limited(
            body,
            Some(1 << 60),
            MAX_SCENE_BYTES,
            "http://local/liar.glb",
            &mut |fraction: f32| reported.push(fraction),
        )
        .unwrap();
        assert_eq!(bytes.len(), 10);
        assert!(bytes.capacity() <= PREALLOCATE_LIMIT as usize);
        assert_eq!(reported.last(), Some(&1.0));
    }

    #[test]
    fn remote_fetch_survives_hostile_content_length() {
        use std::io::Write;
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut byte = [0u8; 1];
            while !request.ends_with(b"\r\n\r\n") {
                if stream.read(&mut byte).unwrap_or(0) == 0 {
                    break;
                }
                request.push(byte[0]);
            }
            let _ = stream.write_all(
                b"HTTP/1.1 200 OK\r\nContent-Length: 1152921504606846976\r\nConnection: close\r\n\r\nglTF",
            );
        });

        let url = format!("http://{}/scene.glb", addr);
        let result = load_scene(&SceneSource::Remote(url), &mut |_: f32| {});
        assert!(result.is_err());
        server.join().unwrap();
    }
}
