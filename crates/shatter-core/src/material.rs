use serde::{Deserialize, Serialize};

use crate::error::MaterialError;
use crate::types::MaterialId;

/// A single material definition loaded from RON data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialDef {
    /// Stable material ID referenced by level images.
    pub id: u16,
    /// Human-readable name for debug display.
    pub name: String,
    /// Mass per unit area, used for group mass and inertia.
    pub density: f32,
    /// Strength assigned to cells of this material when the level image
    /// does not carry its own (255 = immutable).
    #[serde(default)]
    pub strength: u8,
    /// Friction coefficient for the collision triangles of shapes made
    /// mostly of this material.
    #[serde(default = "default_friction")]
    pub friction: f32,
}

fn default_friction() -> f32 {
    0.7
}

/// Collection of material definitions indexed by ID.
#[derive(Debug, Clone, Default)]
pub struct MaterialTable {
    pub materials: Vec<MaterialDef>,
}

impl MaterialTable {
    /// Look up a material by ID. Returns None if not found.
    pub fn get(&self, id: MaterialId) -> Option<&MaterialDef> {
        self.materials.iter().find(|m| m.id == id.0)
    }

    /// Density of a material, or `fallback` for unknown ids.
    pub fn density_or(&self, id: MaterialId, fallback: f32) -> f32 {
        self.get(id).map(|m| m.density).unwrap_or(fallback)
    }

    /// Friction of a material, or `fallback` for unknown ids.
    pub fn friction_or(&self, id: MaterialId, fallback: f32) -> f32 {
        self.get(id).map(|m| m.friction).unwrap_or(fallback)
    }

    /// Number of materials.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

/// Parse a materials RON string (a list of `MaterialDef`) into a table,
/// rejecting duplicate ids and non-positive densities.
pub fn load_materials_from_str(ron_str: &str) -> Result<MaterialTable, MaterialError> {
    let options = ron::Options::default();
    let materials: Vec<MaterialDef> = options
        .from_str(ron_str)
        .map_err(|e| MaterialError::ParseError(e.to_string()))?;

    for (i, m) in materials.iter().enumerate() {
        if m.density <= 0.0 || !m.density.is_finite() {
            return Err(MaterialError::InvalidDensity {
                id: m.id,
                density: m.density,
            });
        }
        if materials[..i].iter().any(|prev| prev.id == m.id) {
            return Err(MaterialError::DuplicateId(m.id));
        }
    }

    Ok(MaterialTable { materials })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROCK_AND_BEDROCK: &str = r#"[
        (id: 1, name: "Rock", density: 2.5),
        (id: 2, name: "Bedrock", density: 4.0, strength: 255, friction: 0.9),
    ]"#;

    #[test]
    fn test_load_materials() {
        let table = load_materials_from_str(ROCK_AND_BEDROCK).expect("valid RON");
        assert_eq!(table.len(), 2);
        let rock = table.get(MaterialId(1)).expect("rock present");
        assert_eq!(rock.strength, 0);
        assert!((rock.friction - 0.7).abs() < 1e-6, "default friction applied");
        assert_eq!(table.get(MaterialId(2)).map(|m| m.strength), Some(255));
    }

    #[test]
    fn test_density_fallback() {
        let table = load_materials_from_str(ROCK_AND_BEDROCK).expect("valid RON");
        assert_eq!(table.density_or(MaterialId(2), 1.0), 4.0);
        assert_eq!(table.density_or(MaterialId(99), 1.0), 1.0);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let src = r#"[(id: 1, name: "A", density: 1.0), (id: 1, name: "B", density: 1.0)]"#;
        assert!(matches!(
            load_materials_from_str(src),
            Err(MaterialError::DuplicateId(1))
        ));
    }

    #[test]
    fn test_bad_density_rejected() {
        let src = r#"[(id: 3, name: "Foam", density: 0.0)]"#;
        assert!(matches!(
            load_materials_from_str(src),
            Err(MaterialError::InvalidDensity { id: 3, .. })
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            load_materials_from_str("not ron"),
            Err(MaterialError::ParseError(_))
        ));
    }
}
