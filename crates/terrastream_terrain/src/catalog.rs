//! # Tile Catalog
//!
//! Maps tile-type ids and variant names to mesh prototypes. Built once at
//! startup from a [`CatalogManifest`]; every lookup miss afterwards is a
//! configuration error.
//!
//! ## Manifest Format
//!
//! ```toml
//! [[tiles]]
//! id = 5
//! name = "Stone"
//! family = "Stone"        # autotiled: loads Stone0a .. Stone4f
//!
//! [[tiles]]
//! id = 4
//! name = "Forest"
//! decoration = "Reed"     # one foliage entity per tile
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::autotile::{TileVariant, AUTOTILE_SUFFIXES, BASE_SUFFIX};
use crate::error::{TerrainError, TerrainResult};
use crate::mesh::Mesh;
use crate::tile::TileId;

/// Supplies mesh prototypes by name (the host's asset loader).
pub trait PrototypeSource {
    /// Loads the prototype called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::MissingPrototype`] if the asset does not exist.
    fn load(&mut self, name: &str) -> TerrainResult<Arc<Mesh>>;
}

/// Prototype source that needs no assets: unit tiles for terrain, crossed
/// quads for anything registered as foliage.
#[derive(Clone, Debug)]
pub struct ProceduralPrototypes {
    tile: Arc<Mesh>,
    foliage: Arc<Mesh>,
    foliage_names: Vec<String>,
}

impl ProceduralPrototypes {
    /// Creates a source with no foliage names.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tile: Arc::new(Mesh::unit_tile()),
            foliage: Arc::new(Mesh::crossed_quads()),
            foliage_names: Vec::new(),
        }
    }

    /// Creates a source that serves crossed quads for every decoration in
    /// `manifest`.
    #[must_use]
    pub fn for_manifest(manifest: &CatalogManifest) -> Self {
        let mut source = Self::new();
        for def in &manifest.tiles {
            if let Some(decoration) = &def.decoration {
                if !source.foliage_names.contains(decoration) {
                    source.foliage_names.push(decoration.clone());
                }
            }
        }
        source
    }
}

impl Default for ProceduralPrototypes {
    fn default() -> Self {
        Self::new()
    }
}

impl PrototypeSource for ProceduralPrototypes {
    fn load(&mut self, name: &str) -> TerrainResult<Arc<Mesh>> {
        if name.is_empty() {
            return Err(TerrainError::MissingPrototype(String::new()));
        }
        if self.foliage_names.iter().any(|n| n == name) {
            Ok(Arc::clone(&self.foliage))
        } else {
            Ok(Arc::clone(&self.tile))
        }
    }
}

fn default_shown() -> bool {
    true
}

/// One tile type as written in the manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileTypeDef {
    /// Tile id used in the world grid.
    pub id: u16,
    /// Base prototype name.
    pub name: String,
    /// Autotile family whose `<family><suffix>` variants this type uses.
    #[serde(default)]
    pub family: Option<String>,
    /// Decoration prototype spawned on every tile of this type.
    #[serde(default)]
    pub decoration: Option<String>,
    /// Whether the decoration is shown for this type (false = depleted).
    #[serde(default = "default_shown")]
    pub decoration_shown: bool,
}

impl TileTypeDef {
    fn plain(id: u16, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            family: None,
            decoration: None,
            decoration_shown: true,
        }
    }

    fn autotiled(id: u16, name: &str, family: &str) -> Self {
        Self { family: Some(family.to_string()), ..Self::plain(id, name) }
    }

    fn decorated(id: u16, name: &str, decoration: &str, shown: bool) -> Self {
        Self {
            decoration: Some(decoration.to_string()),
            decoration_shown: shown,
            ..Self::plain(id, name)
        }
    }
}

/// The full list of tile types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// Tile types in registration order.
    pub tiles: Vec<TileTypeDef>,
}

impl Default for CatalogManifest {
    /// The stock client manifest. Lava shares the Sand family meshes and
    /// an unmatched Stone tile draws as `Stone0a`.
    fn default() -> Self {
        Self {
            tiles: vec![
                TileTypeDef::autotiled(0, "Lava", "Sand"),
                TileTypeDef::autotiled(1, "Sand", "Sand"),
                TileTypeDef::plain(2, "Grass"),
                TileTypeDef::decorated(3, "Scrub", "Reed", false),
                TileTypeDef::decorated(4, "Forest", "Reed", true),
                TileTypeDef::autotiled(5, "Stone0a", "Stone"),
            ],
        }
    }
}

impl CatalogManifest {
    /// Parses a manifest from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] on parse errors.
    pub fn from_toml_str(text: &str) -> TerrainResult<Self> {
        toml::from_str(text).map_err(|e| TerrainError::InvalidConfig(e.to_string()))
    }

    /// Loads a manifest from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> TerrainResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TerrainError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

/// A registered tile type.
#[derive(Clone, Debug)]
pub struct TileType {
    /// Tile id.
    pub id: TileId,
    /// Base prototype name.
    pub name: String,
    /// Autotile family, if the type is autotiled.
    pub family: Option<String>,
    /// Decoration prototype name.
    pub decoration: Option<String>,
    /// Whether the decoration is shown for this type.
    pub decoration_shown: bool,
    /// Base prototype.
    pub prototype: Arc<Mesh>,
}

impl TileType {
    /// Prototype name for a resolved autotile variant.
    ///
    /// Non-autotiled types and the base variant use the base prototype.
    #[must_use]
    pub fn variant_name(&self, variant: &TileVariant) -> String {
        match &self.family {
            Some(family) if variant.mesh_suffix != BASE_SUFFIX => {
                format!("{family}{}", variant.mesh_suffix)
            }
            _ => self.name.clone(),
        }
    }
}

/// Tile-type and prototype registry.
#[derive(Clone, Debug, Default)]
pub struct TileCatalog {
    types: HashMap<TileId, TileType>,
    prototypes: HashMap<String, Arc<Mesh>>,
}

impl TileCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from a manifest, loading every prototype it names:
    /// base meshes, all autotile variants of each family, and decorations.
    ///
    /// # Errors
    ///
    /// Fails on duplicate ids or any prototype the source cannot load.
    pub fn from_manifest(
        manifest: &CatalogManifest,
        source: &mut impl PrototypeSource,
    ) -> TerrainResult<Self> {
        let mut catalog = Self::new();

        for def in &manifest.tiles {
            let prototype = source.load(&def.name)?;
            let ty = catalog.register_type(TileId(def.id), &def.name, prototype)?;
            ty.family = def.family.clone();
            ty.decoration = def.decoration.clone();
            ty.decoration_shown = def.decoration_shown;

            if let Some(family) = &def.family {
                for suffix in AUTOTILE_SUFFIXES {
                    let name = format!("{family}{suffix}");
                    if !catalog.contains_name(&name) {
                        let mesh = source.load(&name)?;
                        catalog.register_prototype(&name, mesh);
                    }
                }
            }
            if let Some(decoration) = &def.decoration {
                if !catalog.contains_name(decoration) {
                    let mesh = source.load(decoration)?;
                    catalog.register_prototype(decoration, mesh);
                }
            }
        }

        tracing::info!(
            types = catalog.types.len(),
            prototypes = catalog.prototypes.len(),
            "tile catalog loaded"
        );
        Ok(catalog)
    }

    /// Registers a tile type and its base prototype under `name`.
    ///
    /// Returns the new entry so callers can fill in family/decoration.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] if `id` is already registered.
    pub fn register_type(
        &mut self,
        id: TileId,
        name: &str,
        prototype: Arc<Mesh>,
    ) -> TerrainResult<&mut TileType> {
        if self.types.contains_key(&id) {
            return Err(TerrainError::InvalidConfig(format!("tile id {id} registered twice")));
        }
        self.prototypes.insert(name.to_string(), Arc::clone(&prototype));
        Ok(self.types.entry(id).or_insert(TileType {
            id,
            name: name.to_string(),
            family: None,
            decoration: None,
            decoration_shown: true,
            prototype,
        }))
    }

    /// Registers (or replaces) a named prototype.
    pub fn register_prototype(&mut self, name: &str, prototype: Arc<Mesh>) {
        self.prototypes.insert(name.to_string(), prototype);
    }

    /// Tile type for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::UnknownTileId`] for unregistered ids.
    pub fn tile_type(&self, id: TileId) -> TerrainResult<&TileType> {
        self.types.get(&id).ok_or(TerrainError::UnknownTileId(id))
    }

    /// Base prototype for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::UnknownTileId`] for unregistered ids.
    pub fn lookup_by_id(&self, id: TileId) -> TerrainResult<&Arc<Mesh>> {
        self.tile_type(id).map(|ty| &ty.prototype)
    }

    /// Prototype registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::MissingPrototype`] for unknown names.
    pub fn lookup_by_name(&self, name: &str) -> TerrainResult<&Arc<Mesh>> {
        self.prototypes
            .get(name)
            .ok_or_else(|| TerrainError::MissingPrototype(name.to_string()))
    }

    /// Whether a prototype is registered under `name`.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.prototypes.contains_key(name)
    }

    /// Number of registered tile types.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Strict(Vec<&'static str>);

    impl PrototypeSource for Strict {
        fn load(&mut self, name: &str) -> TerrainResult<Arc<Mesh>> {
            if self.0.iter().any(|n| *n == name) {
                Ok(Arc::new(Mesh::unit_tile()))
            } else {
                Err(TerrainError::MissingPrototype(name.to_string()))
            }
        }
    }

    #[test]
    fn test_default_manifest_loads_all_variants() {
        let manifest = CatalogManifest::default();
        let catalog =
            TileCatalog::from_manifest(&manifest, &mut ProceduralPrototypes::for_manifest(&manifest))
                .unwrap();

        assert_eq!(catalog.type_count(), 6);
        for family in ["Stone", "Sand"] {
            for suffix in AUTOTILE_SUFFIXES {
                assert!(catalog.contains_name(&format!("{family}{suffix}")));
            }
        }
        assert!(catalog.lookup_by_name("Reed").is_ok());
        assert_eq!(catalog.tile_type(TileId(0)).unwrap().family.as_deref(), Some("Sand"));
    }

    #[test]
    fn test_lookup_misses_are_errors() {
        let catalog = TileCatalog::from_manifest(
            &CatalogManifest::default(),
            &mut ProceduralPrototypes::new(),
        )
        .unwrap();
        assert_eq!(catalog.lookup_by_id(TileId(99)).unwrap_err(), TerrainError::UnknownTileId(TileId(99)));
        assert!(matches!(catalog.lookup_by_name("Marble4f"), Err(TerrainError::MissingPrototype(_))));
    }

    #[test]
    fn test_missing_variant_asset_fails_fast() {
        let manifest = CatalogManifest { tiles: vec![TileTypeDef::autotiled(5, "Stone", "Stone")] };
        let mut source = Strict(vec!["Stone", "Stone0a", "Stone1a"]);
        let err = TileCatalog::from_manifest(&manifest, &mut source).unwrap_err();
        assert_eq!(err, TerrainError::MissingPrototype("Stone2a".to_string()));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut catalog = TileCatalog::new();
        let mesh = Arc::new(Mesh::unit_tile());
        catalog.register_type(TileId(1), "Sand", Arc::clone(&mesh)).unwrap();
        assert!(catalog.register_type(TileId(1), "Dune", mesh).is_err());
    }

    #[test]
    fn test_variant_names() {
        let mut catalog = TileCatalog::new();
        let ty = catalog.register_type(TileId(0), "Lava", Arc::new(Mesh::unit_tile())).unwrap();
        ty.family = Some("Sand".to_string());
        let lava = catalog.tile_type(TileId(0)).unwrap();
        assert_eq!(lava.variant_name(&TileVariant::EDGE), "Sand4f");
        assert_eq!(lava.variant_name(&TileVariant::PLAIN), "Lava");

        let grass = TileType { family: None, name: "Grass".to_string(), ..lava.clone() };
        assert_eq!(grass.variant_name(&TileVariant::EDGE), "Grass");
    }

    #[test]
    fn test_manifest_from_toml() {
        let text = r#"
            [[tiles]]
            id = 5
            name = "Stone"
            family = "Stone"

            [[tiles]]
            id = 3
            name = "Scrub"
            decoration = "Reed"
            decoration_shown = false
        "#;
        let manifest = CatalogManifest::from_toml_str(text).unwrap();
        assert_eq!(manifest.tiles.len(), 2);
        assert_eq!(manifest.tiles[0].family.as_deref(), Some("Stone"));
        assert!(manifest.tiles[0].decoration_shown);
        assert!(!manifest.tiles[1].decoration_shown);

        assert!(CatalogManifest::from_toml_str("tiles = 3").is_err());
    }
}
