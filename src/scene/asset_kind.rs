use std::path::Path;

const MODEL_EXTENSIONS: &[&str] = &["obj", "gltf", "glb", "vox", "iqm", "m3d"];
const TEXTURE_EXTENSIONS: &[&str] = &["png"];

/// What a dropped file is, judged by its extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Model,
    Texture,
}

impl AssetKind {
    /// Case-insensitive. `None` for anything the viewer does not take.
    pub fn classify(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        if MODEL_EXTENSIONS.contains(&extension.as_str()) {
            Some(Self::Model)
        } else if TEXTURE_EXTENSIONS.contains(&extension.as_str()) {
            Some(Self::Texture)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_ignores_case() {
        assert_eq!(AssetKind::classify(Path::new("a/house.OBJ")), Some(AssetKind::Model));
        assert_eq!(AssetKind::classify(Path::new("scene.GlB")), Some(AssetKind::Model));
        assert_eq!(AssetKind::classify(Path::new("chr_knight.vox")), Some(AssetKind::Model));
        assert_eq!(AssetKind::classify(Path::new("skin.Png")), Some(AssetKind::Texture));
    }

    #[test]
    fn unknown_or_missing_extension_is_rejected() {
        assert_eq!(AssetKind::classify(Path::new("notes.txt")), None);
        assert_eq!(AssetKind::classify(Path::new("photo.jpg")), None);
        assert_eq!(AssetKind::classify(Path::new("Makefile")), None);
        assert_eq!(AssetKind::classify(Path::new("archive.obj.zip")), None);
    }
}
