//! MagicaVoxel `.vox` reader. Emits one colored cube per voxel, skipping
//! faces shared with a neighbour. MagicaVoxel is Z-up; output is Y-up.

use std::collections::HashSet;

use crate::error::{AssetError, AssetResult};
use crate::mesh::model::{MaterialData, MeshData, MeshVertex, ModelData};

const MAGIC: &[u8; 4] = b"VOX ";

/// Corner offsets per face, counter-clockwise seen from outside.
const FACES: [([i32; 3], [[f32; 3]; 4]); 6] = [
    ([1, 0, 0], [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]]),
    ([-1, 0, 0], [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]]),
    ([0, 1, 0], [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]]),
    ([0, -1, 0], [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]]),
    ([0, 0, 1], [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]]),
    ([0, 0, -1], [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Voxel {
    x: u8,
    y: u8,
    z: u8,
    color: u8,
}

#[derive(Debug, Default)]
struct VoxScene {
    sizes: Vec<[u32; 3]>,
    models: Vec<Vec<Voxel>>,
    palette: Option<Vec<[u8; 4]>>,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> AssetResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(AssetError::Vox(format!(
                "unexpected end of data at byte {} (wanted {} more)",
                self.pos, n
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u32(&mut self) -> AssetResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn id(&mut self) -> AssetResult<[u8; 4]> {
        let b = self.take(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }
}

/// Parse a `.vox` file already read into memory.
pub fn load_vox_from_bytes(bytes: &[u8]) -> AssetResult<ModelData> {
    let scene = parse(bytes)?;
    let palette = scene.palette.unwrap_or_else(default_palette);

    let meshes: Vec<MeshData> = scene
        .models
        .iter()
        .enumerate()
        .map(|(i, voxels)| {
            let size = scene.sizes.get(i).copied().unwrap_or([0, 0, 0]);
            build_mesh(voxels, size, &palette)
        })
        .filter(|mesh| !mesh.indices.is_empty())
        .collect();

    if meshes.is_empty() {
        return Err(AssetError::Vox("no voxels found".to_string()));
    }

    Ok(ModelData::new(
        meshes,
        vec![MaterialData {
            name: "voxels".to_string(),
            ..MaterialData::default()
        }],
    ))
}

fn parse(bytes: &[u8]) -> AssetResult<VoxScene> {
    let mut reader = Reader::new(bytes);
    if &reader.id()? != MAGIC {
        return Err(AssetError::Vox("missing 'VOX ' header".to_string()));
    }
    let _version = reader.u32()?;

    let mut scene = VoxScene::default();
    while reader.remaining() >= 12 {
        let id = reader.id()?;
        let content_len = reader.u32()? as usize;
        let _children_len = reader.u32()?;
        match &id {
            // MAIN only wraps the other chunks; walk straight into its children.
            b"MAIN" => {
                reader.take(content_len)?;
            }
            b"SIZE" => {
                let mut content = Reader::new(reader.take(content_len)?);
                scene
                    .sizes
                    .push([content.u32()?, content.u32()?, content.u32()?]);
            }
            b"XYZI" => {
                let mut content = Reader::new(reader.take(content_len)?);
                let count = content.u32()? as usize;
                let raw = content.take(count * 4)?;
                let voxels = raw
                    .chunks_exact(4)
                    .map(|v| Voxel {
                        x: v[0],
                        y: v[1],
                        z: v[2],
                        color: v[3],
                    })
                    .collect();
                scene.models.push(voxels);
            }
            b"RGBA" => {
                let content = reader.take(content_len)?;
                let palette = content
                    .chunks_exact(4)
                    .take(256)
                    .map(|c| [c[0], c[1], c[2], c[3]])
                    .collect();
                scene.palette = Some(palette);
            }
            _ => {
                reader.take(content_len)?;
            }
        }
    }

    Ok(scene)
}

/// MagicaVoxel's built-in palette, used when a file has no RGBA chunk.
/// Entries are 0xAABBGGRR and indexed directly by voxel color index.
#[rustfmt::skip]
const DEFAULT_PALETTE: [u32; 256] = [
    0x00000000, 0xffffffff, 0xffccffff, 0xff99ffff, 0xff66ffff, 0xff33ffff, 0xff00ffff, 0xffffccff,
    0xffccccff, 0xff99ccff, 0xff66ccff, 0xff33ccff, 0xff00ccff, 0xffff99ff, 0xffcc99ff, 0xff9999ff,
    0xff6699ff, 0xff3399ff, 0xff0099ff, 0xffff66ff, 0xffcc66ff, 0xff9966ff, 0xff6666ff, 0xff3366ff,
    0xff0066ff, 0xffff33ff, 0xffcc33ff, 0xff9933ff, 0xff6633ff, 0xff3333ff, 0xff0033ff, 0xffff00ff,
    0xffcc00ff, 0xff9900ff, 0xff6600ff, 0xff3300ff, 0xff0000ff, 0xffffffcc, 0xffccffcc, 0xff99ffcc,
    0xff66ffcc, 0xff33ffcc, 0xff00ffcc, 0xffffcccc, 0xffcccccc, 0xff99cccc, 0xff66cccc, 0xff33cccc,
    0xff00cccc, 0xffff99cc, 0xffcc99cc, 0xff9999cc, 0xff6699cc, 0xff3399cc, 0xff0099cc, 0xffff66cc,
    0xffcc66cc, 0xff9966cc, 0xff6666cc, 0xff3366cc, 0xff0066cc, 0xffff33cc, 0xffcc33cc, 0xff9933cc,
    0xff6633cc, 0xff3333cc, 0xff0033cc, 0xffff00cc, 0xffcc00cc, 0xff9900cc, 0xff6600cc, 0xff3300cc,
    0xff0000cc, 0xffffff99, 0xffccff99, 0xff99ff99, 0xff66ff99, 0xff33ff99, 0xff00ff99, 0xffffcc99,
    0xffcccc99, 0xff99cc99, 0xff66cc99, 0xff33cc99, 0xff00cc99, 0xffff9999, 0xffcc9999, 0xff999999,
    0xff669999, 0xff339999, 0xff009999, 0xffff6699, 0xffcc6699, 0xff996699, 0xff666699, 0xff336699,
    0xff006699, 0xffff3399, 0xffcc3399, 0xff993399, 0xff663399, 0xff333399, 0xff003399, 0xffff0099,
    0xffcc0099, 0xff990099, 0xff660099, 0xff330099, 0xff000099, 0xffffff66, 0xffccff66, 0xff99ff66,
    0xff66ff66, 0xff33ff66, 0xff00ff66, 0xffffcc66, 0xffcccc66, 0xff99cc66, 0xff66cc66, 0xff33cc66,
    0xff00cc66, 0xffff9966, 0xffcc9966, 0xff999966, 0xff669966, 0xff339966, 0xff009966, 0xffff6666,
    0xffcc6666, 0xff996666, 0xff666666, 0xff336666, 0xff006666, 0xffff3366, 0xffcc3366, 0xff993366,
    0xff663366, 0xff333366, 0xff003366, 0xffff0066, 0xffcc0066, 0xff990066, 0xff660066, 0xff330066,
    0xff000066, 0xffffff33, 0xffccff33, 0xff99ff33, 0xff66ff33, 0xff33ff33, 0xff00ff33, 0xffffcc33,
    0xffcccc33, 0xff99cc33, 0xff66cc33, 0xff33cc33, 0xff00cc33, 0xffff9933, 0xffcc9933, 0xff999933,
    0xff669933, 0xff339933, 0xff009933, 0xffff6633, 0xffcc6633, 0xff996633, 0xff666633, 0xff336633,
    0xff006633, 0xffff3333, 0xffcc3333, 0xff993333, 0xff663333, 0xff333333, 0xff003333, 0xffff0033,
    0xffcc0033, 0xff990033, 0xff660033, 0xff330033, 0xff000033, 0xffffff00, 0xffccff00, 0xff99ff00,
    0xff66ff00, 0xff33ff00, 0xff00ff00, 0xffffcc00, 0xffcccc00, 0xff99cc00, 0xff66cc00, 0xff33cc00,
    0xff00cc00, 0xffff9900, 0xffcc9900, 0xff999900, 0xff669900, 0xff339900, 0xff009900, 0xffff6600,
    0xffcc6600, 0xff996600, 0xff666600, 0xff336600, 0xff006600, 0xffff3300, 0xffcc3300, 0xff993300,
    0xff663300, 0xff333300, 0xff003300, 0xffff0000, 0xffcc0000, 0xff990000, 0xff660000, 0xff330000,
    0xff0000ee, 0xff0000dd, 0xff0000bb, 0xff0000aa, 0xff000088, 0xff000077, 0xff000055, 0xff000044,
    0xff000022, 0xff000011, 0xff00ee00, 0xff00dd00, 0xff00bb00, 0xff00aa00, 0xff008800, 0xff007700,
    0xff005500, 0xff004400, 0xff002200, 0xff001100, 0xffee0000, 0xffdd0000, 0xffbb0000, 0xffaa0000,
    0xff880000, 0xff770000, 0xff550000, 0xff440000, 0xff220000, 0xff110000, 0xffeeeeee, 0xffdddddd,
    0xffbbbbbb, 0xffaaaaaa, 0xff888888, 0xff777777, 0xff555555, 0xff444444, 0xff222222, 0xff111111,
];

/// The default palette in the same layout as an RGBA chunk, where voxel
/// color index i reads entry i-1.
fn default_palette() -> Vec<[u8; 4]> {
    DEFAULT_PALETTE[1..].iter().map(|c| c.to_le_bytes()).collect()
}

fn build_mesh(voxels: &[Voxel], size: [u32; 3], palette: &[[u8; 4]]) -> MeshData {
    // Cell coordinates in Y-up space: (x, z, -y).
    let cell = |v: &Voxel| [v.x as i32, v.z as i32, -(v.y as i32) - 1];
    let occupied: HashSet<[i32; 3]> = voxels.iter().map(cell).collect();

    let offset = [size[0] as f32 / 2.0, 0.0, -(size[1] as f32) / 2.0];

    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for voxel in voxels {
        let c = cell(voxel);
        // Palette index i refers to entry i-1.
        let rgba = palette
            .get((voxel.color as usize).wrapping_sub(1))
            .copied()
            .unwrap_or([255, 255, 255, 255]);
        let color = rgba.map(|b| b as f32 / 255.0);

        for (dir, corners) in FACES.iter() {
            let neighbour = [c[0] + dir[0], c[1] + dir[1], c[2] + dir[2]];
            if occupied.contains(&neighbour) {
                continue;
            }
            let base = vertices.len() as u32;
            let normal = dir.map(|d| d as f32);
            for corner in corners {
                let position = [
                    c[0] as f32 + corner[0] - offset[0],
                    c[1] as f32 + corner[1] - offset[1],
                    c[2] as f32 + corner[2] - offset[2],
                ];
                vertices.push(MeshVertex::new(position, normal, [0.0, 0.0]).with_color(color));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    MeshData::new(vertices, indices, 0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn chunk(id: &[u8; 4], content: &[u8]) -> Vec<u8> {
        let mut out = id.to_vec();
        out.extend_from_slice(&(content.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(content);
        out
    }

    /// Minimal file with the given voxels in a `size` grid and a red palette entry 1.
    pub(crate) fn vox_file(size: [u32; 3], voxels: &[[u8; 4]]) -> Vec<u8> {
        build_file(size, voxels, true)
    }

    fn build_file(size: [u32; 3], voxels: &[[u8; 4]], with_palette: bool) -> Vec<u8> {
        let mut size_content = Vec::new();
        for s in size {
            size_content.extend_from_slice(&s.to_le_bytes());
        }
        let mut xyzi = (voxels.len() as u32).to_le_bytes().to_vec();
        for v in voxels {
            xyzi.extend_from_slice(v);
        }
        let mut rgba = vec![255, 0, 0, 255];
        rgba.resize(256 * 4, 128);

        let mut children = chunk(b"SIZE", &size_content);
        children.extend(chunk(b"XYZI", &xyzi));
        if with_palette {
            children.extend(chunk(b"RGBA", &rgba));
        }

        let mut out = MAGIC.to_vec();
        out.extend_from_slice(&150u32.to_le_bytes());
        out.extend_from_slice(b"MAIN");
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(children.len() as u32).to_le_bytes());
        out.extend(children);
        out
    }

    #[test]
    fn single_voxel_is_a_closed_cube() {
        let model = load_vox_from_bytes(&vox_file([1, 1, 1], &[[0, 0, 0, 1]])).unwrap();
        let mesh = &model.meshes[0];
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_eq!(mesh.vertices[0].color, [1.0, 0.0, 0.0, 1.0]);

        let size = mesh.bounding_box().size();
        assert!((size.x - 1.0).abs() < 1e-6);
        assert!((size.y - 1.0).abs() < 1e-6);
        assert!((size.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn shared_faces_are_culled() {
        let model =
            load_vox_from_bytes(&vox_file([2, 1, 1], &[[0, 0, 0, 1], [1, 0, 0, 1]])).unwrap();
        assert_eq!(model.meshes[0].triangle_count(), 10 * 2);
    }

    #[test]
    fn vox_z_axis_becomes_height() {
        let model = load_vox_from_bytes(&vox_file([1, 1, 3], &[[0, 0, 2, 1]])).unwrap();
        let bounds = model.first_mesh_bounds();
        assert!((bounds.min.y - 2.0).abs() < 1e-6);
        assert!((bounds.max.y - 3.0).abs() < 1e-6);
    }

    #[test]
    fn missing_rgba_chunk_uses_magicavoxel_default_palette() {
        let file = build_file([3, 1, 1], &[[0, 0, 0, 1], [1, 0, 0, 6], [2, 0, 0, 216]], false);
        let model = load_vox_from_bytes(&file).unwrap();
        let colors: HashSet<[u8; 4]> = model.meshes[0]
            .vertices
            .iter()
            .map(|v| v.color.map(|c| (c * 255.0).round() as u8))
            .collect();
        // 1 is white, 6 is yellow (0xff00ffff), 216 opens the red ramp (0xff0000ee).
        assert!(colors.contains(&[255, 255, 255, 255]));
        assert!(colors.contains(&[255, 255, 0, 255]));
        assert!(colors.contains(&[238, 0, 0, 255]));
        assert_eq!(colors.len(), 3);
    }

    #[test]
    fn rejects_bad_header_and_truncation() {
        assert!(matches!(
            load_vox_from_bytes(b"NOPE\x96\0\0\0"),
            Err(AssetError::Vox(_))
        ));
        let mut file = vox_file([1, 1, 1], &[[0, 0, 0, 1]]);
        file.truncate(file.len() - 10);
        assert!(load_vox_from_bytes(&file).is_err());
    }
}
