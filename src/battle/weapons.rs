//! Weapon definitions and the catalog that resolves weapon ids
//!
//! The catalog is plain data handed to mission build; there is no global table.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};

/// Fully resolved ranged weapon stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponDef {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Maximum range in tiles
    pub range: f32,
    pub damage: u32,
    /// Base accuracy before range and cover (0.0 to 1.0)
    pub accuracy: f32,
    /// Ticks between shots
    pub cooldown_ticks: u32,
    pub magazine_size: u32,
    /// Ticks to refill the magazine from reserve
    pub reload_ticks: u32,
}

impl WeaponDef {
    /// Is the target distance within this weapon's reach?
    pub fn in_range(&self, distance: f32) -> bool {
        distance <= self.range
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    weapons: BTreeMap<String, WeaponDef>,
}

/// Weapon definitions keyed by string id
#[derive(Debug, Clone, Default)]
pub struct WeaponCatalog {
    weapons: BTreeMap<String, WeaponDef>,
}

impl WeaponCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a weapon, replacing any previous definition with the same id
    pub fn insert(&mut self, mut weapon: WeaponDef, id: impl Into<String>) {
        let id = id.into();
        weapon.id = id.clone();
        self.weapons.insert(id, weapon);
    }

    pub fn get(&self, id: &str) -> Option<&WeaponDef> {
        self.weapons.get(id)
    }

    /// Resolve a weapon id or fail mission build
    pub fn resolve(&self, id: &str) -> Result<WeaponDef> {
        self.get(id)
            .cloned()
            .ok_or_else(|| SimError::UnknownWeapon(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    /// Parse a `[weapons.<id>]` TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents)?;
        let mut catalog = Self::new();
        for (id, weapon) in file.weapons {
            if weapon.range <= 0.0 || !(0.0..=1.0).contains(&weapon.accuracy) {
                return Err(SimError::InvalidConfig(format!(
                    "weapon {} needs a positive range and accuracy in [0, 1]",
                    id
                )));
            }
            catalog.insert(weapon, id);
        }
        Ok(catalog)
    }

    /// Load a catalog file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
