use std::sync::Arc;
use tracing::info;

use crate::ai_client::PlanGenerator;
use crate::error::GenerationError;
use crate::models::{Level, Plan};

/// Obtains a validated plan for a level from the injected generator.
/// Single attempt per call; retrying is a user decision.
pub struct PlanService {
    generator: Arc<dyn PlanGenerator>,
    debug_prompt: bool,
}

impl PlanService {
    pub fn new(generator: Arc<dyn PlanGenerator>) -> Self {
        PlanService {
            generator,
            debug_prompt: false,
        }
    }

    pub fn with_debug_prompt(mut self, debug_prompt: bool) -> Self {
        self.debug_prompt = debug_prompt;
        self
    }

    pub async fn request_plan(&self, level: Level) -> Result<Plan, GenerationError> {
        let prompt = build_prompt(level);
        if self.debug_prompt {
            info!("generation prompt:\n{prompt}");
        }

        let payload = self.generator.generate(&prompt).await?;

        let plan: Plan = serde_json::from_str(&payload)
            .map_err(|e| GenerationError::Decode(format!("invalid plan JSON: {e}")))?;

        plan.validate().map_err(GenerationError::InvalidShape)?;

        info!(level = %level, "generated a new plan");
        Ok(plan)
    }
}

fn build_prompt(level: Level) -> String {
    format!(
        r#"Eres una experta entrenadora personal especializada en fitness para mujeres mayores de 50 años. Tu enfoque es en la seguridad, el fortalecimiento progresivo, la salud articular y el bienestar general. Hablas y escribes en español europeo (castellano de España).

Tu tarea es crear una rutina de ejercicios de fuerza para un día completo, dividida en 4 bloques de 15 minutos cada uno, para el nivel de dificultad: "{level}".

El significado de cada nivel es:
- Nivel 1 (Iniciación): Ejercicios de muy bajo impacto, centrados en la movilidad y la activación muscular básica. Usar el propio peso corporal. Deben ser seguros para las articulaciones.
- Nivel 2 (Medio): Ejercicios con un poco más de intensidad. Se pueden introducir bandas elásticas de baja resistencia o mancuernas muy ligeras (1-2 kg).
- Nivel 3 (Avanzado): Ejercicios que suponen un mayor reto, usando bandas de mayor resistencia o mancuernas de peso moderado (2-4 kg), siempre priorizando la técnica correcta sobre el peso.

Para cada uno de los 4 bloques, debes proporcionar:
1. Un título claro (ej: "Bloque 1: Activación Matutina").
2. Una frase motivadora, positiva y empoderadora, específicamente pensada para mujeres mayores de 50 años. Debe reforzar la autoestima, el bienestar y la constancia. Evita clichés y céntrate en la fuerza y el autocuidado.
3. Una lista de 4-5 ejercicios. Para cada ejercicio, especifica:
    - nombre: El nombre del ejercicio.
    - duracion: El tiempo recomendado para realizar el ejercicio o el número de series y repeticiones (ej: "45 segundos" o "3 series de 10 repeticiones").
    - descripcion: Una descripción muy breve y clara de cómo hacer el ejercicio, un consejo de seguridad o el enfoque del mismo (ej: "Espalda recta" o "Controla el movimiento").

La rutina debe ser equilibrada y trabajar diferentes grupos musculares a lo largo del día. Los ejercicios deben ser variados entre los bloques.
La suma de los ejercicios y pequeños descansos entre ellos debe completar aproximadamente 15 minutos por bloque.

Devuelve la respuesta EXCLUSIVAMENTE en formato JSON, siguiendo el esquema proporcionado. No incluyas explicaciones adicionales, solo el JSON."#
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Generator stub returning a canned payload and counting calls.
    pub struct StubGenerator {
        payload: Result<String, String>,
        pub calls: AtomicUsize,
    }

    impl StubGenerator {
        pub fn returning(payload: &str) -> Self {
            StubGenerator {
                payload: Ok(payload.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(message: &str) -> Self {
            StubGenerator {
                payload: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlanGenerator for StubGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.payload {
                Ok(payload) => Ok(payload.clone()),
                Err(message) => Err(GenerationError::Request(message.clone())),
            }
        }
    }

    pub fn plan_json(blocks: usize) -> String {
        let block = serde_json::json!({
            "titulo": "Bloque: Activación",
            "frase_motivadora": "Tu constancia es tu fuerza.",
            "ejercicios": [
                {
                    "nombre": "Marcha en el sitio",
                    "duracion": "45 segundos",
                    "descripcion": "Espalda recta"
                },
                {
                    "nombre": "Sentadilla con silla",
                    "duracion": "3 series de 10 repeticiones",
                    "descripcion": "Controla el movimiento"
                }
            ]
        });
        serde_json::json!({ "bloques": vec![block; blocks] }).to_string()
    }
}
