use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::GenerationError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: Option<SystemInstruction>,
    contents: Vec<Content>,
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
    temperature: f32,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Clone)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiError {
    message: String,
}

#[derive(Deserialize)]
struct Candidate {
    content: ContentResponse,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<Part>,
}

/// The text-generation collaborator PlanService talks to. A trait seam so
/// the service and controller can be exercised without network access.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    /// One generation attempt; the returned string should be the JSON
    /// encoding of a plan.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Fails fast when no credential is configured instead of deferring
    /// the failure to the first request.
    pub fn new(api_key: &str, model: &str) -> Result<Self, GenerationError> {
        if api_key.trim().is_empty() {
            return Err(GenerationError::Unconfigured);
        }
        Ok(GeminiClient {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Schema the model is constrained to: 4 blocks, each with a title, a
    /// motivational phrase and 4-5 exercises.
    fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "bloques": {
                    "type": "ARRAY",
                    "description": "Array de 4 bloques de ejercicios para el día.",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "titulo": {
                                "type": "STRING",
                                "description": "Título del bloque (ej: 'Bloque 1: Activación Matutina')."
                            },
                            "frase_motivadora": {
                                "type": "STRING",
                                "description": "Frase motivadora para mujeres mayores de 50 años."
                            },
                            "ejercicios": {
                                "type": "ARRAY",
                                "description": "Lista de 4-5 ejercicios para el bloque.",
                                "items": {
                                    "type": "OBJECT",
                                    "properties": {
                                        "nombre": {
                                            "type": "STRING",
                                            "description": "Nombre del ejercicio."
                                        },
                                        "duracion": {
                                            "type": "STRING",
                                            "description": "Tiempo recomendado (ej: '45 segundos')."
                                        },
                                        "descripcion": {
                                            "type": "STRING",
                                            "description": "Descripción breve o número de repeticiones."
                                        }
                                    },
                                    "required": ["nombre", "duracion", "descripcion"]
                                }
                            }
                        },
                        "required": ["titulo", "frase_motivadora", "ejercicios"]
                    }
                }
            },
            "required": ["bloques"]
        })
    }

    /// Tolerates a markdown-fenced payload even though the JSON response
    /// mode should return the raw object.
    pub fn extract_json_block(text: &str) -> Result<String, GenerationError> {
        let start_marker = "```json";
        let end_marker = "```";

        if let Some(start_idx) = text.find(start_marker) {
            let json_start = start_idx + start_marker.len();
            if let Some(end_idx) = text[json_start..].find(end_marker) {
                let json_content = &text[json_start..json_start + end_idx];
                return Ok(json_content.trim().to_string());
            }
        }

        if serde_json::from_str::<Value>(text).is_ok() {
            return Ok(text.trim().to_string());
        }

        Err(GenerationError::Decode(
            "response is neither raw JSON nor a fenced JSON block".to_string(),
        ))
    }
}

#[async_trait]
impl PlanGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request_body = GeminiRequest {
            system_instruction: Some(SystemInstruction {
                parts: vec![Part {
                    text: "Eres una experta entrenadora personal especializada en fitness para mujeres mayores de 50 años.".to_string(),
                }],
            }),
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: Self::response_schema(),
                temperature: 0.8,
            }),
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let err_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Request(format!(
                "Gemini API error: {} - {}",
                status, err_text
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Decode(format!("failed to parse Gemini JSON: {e}")))?;

        if let Some(error) = gemini_response.error {
            return Err(GenerationError::Request(format!(
                "Gemini returned an error: {}",
                error.message
            )));
        }

        if let Some(candidates) = gemini_response.candidates {
            if let Some(candidate) = candidates.first() {
                if let Some(part) = candidate.content.parts.first() {
                    return Self::extract_json_block(&part.text);
                }
            }
        }

        Err(GenerationError::Decode(
            "no valid content returned from Gemini".to_string(),
        ))
    }
}
