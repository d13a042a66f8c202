use serde::{Deserialize, Serialize};

/// Difficulty tier selected by the user. Only affects the generation
/// request; a cached plan carries the level it was generated for.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    #[serde(rename = "Nivel 1: Iniciación")]
    Level1,
    #[serde(rename = "Nivel 2: Medio")]
    Level2,
    #[serde(rename = "Nivel 3: Avanzado")]
    Level3,
}

impl Level {
    pub fn display_name(&self) -> &'static str {
        match self {
            Level::Level1 => "Nivel 1: Iniciación",
            Level::Level2 => "Nivel 2: Medio",
            Level::Level3 => "Nivel 3: Avanzado",
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Level::Level1),
            2 => Some(Level::Level2),
            3 => Some(Level::Level3),
            _ => None,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Exercise {
    #[serde(rename = "nombre")]
    pub name: String,
    /// Free text: either a countdown ("45 segundos") or rep-based
    /// ("3 series de 10 repeticiones"). Parsed at render time.
    #[serde(rename = "duracion")]
    pub duration: String,
    #[serde(rename = "descripcion")]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Block {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "frase_motivadora")]
    pub motivational_phrase: String,
    #[serde(rename = "ejercicios")]
    pub exercises: Vec<Exercise>,
}

/// One full day's routine: always exactly 4 blocks of ~15 minutes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Plan {
    #[serde(rename = "bloques")]
    pub blocks: Vec<Block>,
}

pub const EXPECTED_BLOCKS: usize = 4;

impl Plan {
    /// Checks the shape a generated plan must have: exactly 4 blocks,
    /// each with at least one exercise. Exercise counts per block are
    /// requested via the prompt (4-5) but not enforced here.
    pub fn validate(&self) -> Result<(), String> {
        if self.blocks.len() != EXPECTED_BLOCKS {
            return Err(format!(
                "plan must contain {} blocks, got {}",
                EXPECTED_BLOCKS,
                self.blocks.len()
            ));
        }
        for (index, block) in self.blocks.iter().enumerate() {
            if block.exercises.is_empty() {
                return Err(format!("block {} has no exercises", index + 1));
            }
        }
        Ok(())
    }
}

/// One completed day, at most one entry per distinct date.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Local calendar date, YYYY-MM-DD.
    pub date: String,
    pub level: Level,
}

#[cfg(test)]
pub(crate) fn sample_plan() -> Plan {
    let block = |title: &str| Block {
        title: title.to_string(),
        motivational_phrase: "Cada día más fuerte.".to_string(),
        exercises: vec![
            Exercise {
                name: "Marcha en el sitio".to_string(),
                duration: "45 segundos".to_string(),
                description: "Espalda recta".to_string(),
            },
            Exercise {
                name: "Sentadilla con silla".to_string(),
                duration: "3 series de 10 repeticiones".to_string(),
                description: "Controla el movimiento".to_string(),
            },
        ],
    };
    Plan {
        blocks: vec![
            block("Bloque 1: Activación Matutina"),
            block("Bloque 2: Fuerza de Piernas"),
            block("Bloque 3: Tren Superior"),
            block("Bloque 4: Core y Estiramientos"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_with_four_blocks_is_valid() {
        assert!(sample_plan().validate().is_ok());
    }

    #[test]
    fn plan_with_three_blocks_is_rejected() {
        let mut plan = sample_plan();
        plan.blocks.pop();
        assert!(plan.validate().is_err());
    }

    #[test]
    fn plan_with_empty_block_is_rejected() {
        let mut plan = sample_plan();
        plan.blocks[2].exercises.clear();
        assert!(plan.validate().is_err());
    }

    #[test]
    fn plan_deserializes_from_spanish_wire_names() {
        let json = r#"{
            "bloques": [{
                "titulo": "Bloque 1: Activación Matutina",
                "frase_motivadora": "Tu fuerza crece contigo.",
                "ejercicios": [{
                    "nombre": "Círculos de brazos",
                    "duracion": "30 segundos",
                    "descripcion": "Movimiento amplio y suave"
                }]
            }]
        }"#;
        let plan: Plan = serde_json::from_str(json).expect("plan should deserialize");
        assert_eq!(plan.blocks.len(), 1);
        assert_eq!(plan.blocks[0].exercises[0].name, "Círculos de brazos");
        assert_eq!(plan.blocks[0].exercises[0].duration, "30 segundos");
    }

    #[test]
    fn level_serializes_to_display_name() {
        let encoded = serde_json::to_string(&Level::Level2).expect("serialize level");
        assert_eq!(encoded, "\"Nivel 2: Medio\"");
        let decoded: Level = serde_json::from_str(&encoded).expect("deserialize level");
        assert_eq!(decoded, Level::Level2);
    }

    #[test]
    fn level_from_number_maps_valid_tiers() {
        assert_eq!(Level::from_number(1), Some(Level::Level1));
        assert_eq!(Level::from_number(3), Some(Level::Level3));
        assert_eq!(Level::from_number(4), None);
    }
}
