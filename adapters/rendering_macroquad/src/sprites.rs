use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use glam::Vec2;
use macroquad::{
    math::Vec2 as MacroquadVec2,
    texture::{self, DrawTextureParams, Texture2D},
};
use room_for_change_rendering::SpriteKey;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Screen placement of a sprite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DrawParams {
    /// Top-left corner in screen pixels.
    position: Vec2,
    /// Destination size in screen pixels.
    size: Vec2,
    /// Mirrors the texture horizontally.
    flip_x: bool,
}

impl DrawParams {
    pub(crate) fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            flip_x: false,
        }
    }

    pub(crate) fn with_flip_x(mut self, flip_x: bool) -> Self {
        self.flip_x = flip_x;
        self
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn size(&self) -> Vec2 {
        self.size
    }
}

/// Cache of textures loaded from the sprite manifest.
#[derive(Debug)]
pub(crate) struct SpriteAtlas {
    textures: HashMap<SpriteKey, Texture2D>,
}

impl SpriteAtlas {
    /// Loads sprites from the manifest located at the provided path.
    pub(crate) fn from_manifest_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_manifest_with_loader(path, default_loader)
    }

    /// Manifest location relative to the working directory.
    pub(crate) fn default_manifest_path() -> PathBuf {
        PathBuf::from("assets/manifest.toml")
    }

    pub(crate) fn draw(&self, key: SpriteKey, params: DrawParams) -> Result<()> {
        let texture = *self
            .textures
            .get(&key)
            .with_context(|| format!("sprite {key:?} missing from atlas"))?;

        let draw_params = DrawTextureParams {
            dest_size: Some(MacroquadVec2::new(params.size.x, params.size.y)),
            flip_x: params.flip_x,
            ..DrawTextureParams::default()
        };

        texture::draw_texture_ex(
            texture,
            params.position.x,
            params.position.y,
            macroquad::color::WHITE,
            draw_params,
        );

        Ok(())
    }

    pub(crate) fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn from_manifest_with_loader(
        path: impl AsRef<Path>,
        mut loader: impl FnMut(SpriteKey, &Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read sprite manifest at {}",
                manifest_path.display()
            )
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let entries = parse_manifest(&contents, &base)?;
        Self::from_entries(entries, &mut loader)
    }

    fn from_entries(
        entries: Vec<(SpriteKey, PathBuf)>,
        loader: &mut impl FnMut(SpriteKey, &Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let mut textures = HashMap::with_capacity(entries.len());
        for (key, path) in entries {
            let texture = loader(key, &path).with_context(|| {
                format!("failed to load sprite {key:?} from {}", path.display())
            })?;
            if textures.insert(key, texture).is_some() {
                bail!("duplicate sprite entry for {key:?}");
            }
        }
        Ok(Self { textures })
    }
}

fn default_loader(_key: SpriteKey, path: &Path) -> Result<Texture2D> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read sprite asset at {}", path.display()))?;
    let texture = Texture2D::from_file_with_format(&bytes, None);
    // Pixel art tiles blur under linear filtering.
    texture.set_filter(texture::FilterMode::Nearest);
    Ok(texture)
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    sprites: HashMap<String, String>,
}

/// Resolves manifest entries into `SpriteKey::ALL` order.
fn parse_manifest(contents: &str, base_path: &Path) -> Result<Vec<(SpriteKey, PathBuf)>> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse sprite manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported sprite manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let mut resolved = HashMap::new();
    for (name, relative_path) in manifest.sprites {
        let Some(key) = SpriteKey::ALL
            .into_iter()
            .find(|key| key.manifest_name() == name)
        else {
            bail!("unknown sprite key `{name}` in manifest");
        };
        let _ = resolved.insert(key, base_path.join(relative_path));
    }

    SpriteKey::ALL
        .into_iter()
        .map(|key| match resolved.remove(&key) {
            Some(path) => Ok((key, path)),
            None => bail!("sprite manifest missing entry for {}", key.manifest_name()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const FULL_MANIFEST: &str = r#"
        version = 1

        [sprites]
        Mummy = "entities/mummy.png"
        Player = "entities/player.png"
        DoorOpen = "tiles/door_open.png"
        DoorClosed = "tiles/door_closed.png"
        Wall = "tiles/wall.png"
        Floor = "tiles/floor.png"
    "#;

    #[test]
    fn parse_manifest_requires_all_known_keys() {
        let manifest = r#"
            version = 1

            [sprites]
            Floor = "tiles/floor.png"
            Wall = "tiles/wall.png"
        "#;

        let error = parse_manifest(manifest, Path::new("assets")).expect_err("incomplete");
        assert!(error.to_string().contains("DoorClosed"));
    }

    #[test]
    fn manifest_rejects_unknown_keys_and_versions() {
        let extra = FULL_MANIFEST.replace("[sprites]", "[sprites]\nTower = \"tower.png\"");
        assert!(parse_manifest(&extra, Path::new("assets")).is_err());

        let future = FULL_MANIFEST.replace("version = 1", "version = 2");
        assert!(parse_manifest(&future, Path::new("assets")).is_err());
    }

    #[test]
    fn manifest_resolves_paths_in_canonical_order() {
        let parsed = parse_manifest(FULL_MANIFEST, Path::new("root")).expect("manifest parses");
        let keys: Vec<_> = parsed.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, SpriteKey::ALL);
        assert_eq!(parsed[1].1, PathBuf::from("root/tiles/wall.png"));
        assert_eq!(parsed[5].1, PathBuf::from("root/entities/mummy.png"));
    }

    #[test]
    fn atlas_loads_each_texture_once() {
        let entries = parse_manifest(FULL_MANIFEST, Path::new("assets")).expect("parses");
        let load_order = RefCell::new(Vec::new());
        let atlas = SpriteAtlas::from_entries(entries, &mut |key, _| {
            load_order.borrow_mut().push(key);
            Ok(Texture2D::empty())
        })
        .expect("atlas should load using provided loader");

        assert_eq!(load_order.borrow().as_slice(), &SpriteKey::ALL);
        assert_eq!(atlas.texture_count(), SpriteKey::ALL.len());
    }

    #[test]
    fn atlas_rejects_duplicate_entries() {
        let entries = vec![
            (SpriteKey::Wall, PathBuf::from("a.png")),
            (SpriteKey::Wall, PathBuf::from("b.png")),
        ];
        let result = SpriteAtlas::from_entries(entries, &mut |_, _| Ok(Texture2D::empty()));
        assert!(result.is_err());
    }

    #[test]
    fn bundled_manifest_lists_every_sprite() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/manifest.toml");
        let contents = fs::read_to_string(&path).expect("bundled manifest exists");
        let base = path.parent().expect("manifest has a parent directory");
        let entries = parse_manifest(&contents, base).expect("bundled manifest parses");
        for (key, path) in entries {
            assert!(path.is_file(), "{key:?} asset missing at {}", path.display());
        }
    }
}
