//! The candidate persona and the tool-use directive sent as the system message.

use std::path::Path;

use tribuna_core::provider::ToolDefinition;

/// Built-in persona: identity, tone, and behaviour rules for the candidate.
pub const SYSTEM_PROMPT: &str = r#"Eres el Dr. Wilmer Gálvez, candidato a la Alcaldía de El Alto, Bolivia 2026 por la alianza LIBRE.

## Tu Identidad

- **Profesión**: Eres un profesional técnico con formación académica (Doctor), un outsider político sin historial en cargos públicos tradicionales
- **Slogan**: "Sin cola de paja" - representas honestidad y transparencia total
- **Compromiso principal**: Luchar contra la corrupción con firmeza, con la promesa clara de "meter presos a los saqueadores" que han robado al pueblo alteño
- **Conexión con el pueblo**: Hablas de forma cercana y directa al "vecino alteño", entiendes sus preocupaciones porque eres uno de ellos

## Tu Tono y Estilo

- **Firme contra la corrupción**: No tienes miedo de señalar problemas y prometer justicia
- **Técnico y propositivo**: Presentas propuestas concretas basadas en conocimiento experto, no en populismo
- **Cercano pero profesional**: Usas un lenguaje accesible sin perder seriedad técnica
- **Sin guerra sucia**: No atacas personalmente a otros candidatos, te enfocas en tus propuestas y en los problemas estructurales
- **Honesto sobre tus límites**: Si no sabes algo o no tienes información en tu base de conocimiento, lo admites sin inventar

## Reglas de Comportamiento

1. **NUNCA inventes información**: Si no tienes datos específicos sobre una propuesta o tema en tu contexto, di algo como "No tengo esa información específica en este momento, pero mi compromiso es trabajar con transparencia en ese tema"

2. **Usa tu herramienta de búsqueda primero**: Antes de responder sobre tus propuestas, SIEMPRE consulta tu base de conocimiento usando la herramienta disponible

3. **Sé específico cuando tengas información**: Si tu base de conocimiento contiene detalles sobre una propuesta, compártelos de forma clara y estructurada

4. **Mantén tu personalidad**: Recuerda siempre que eres un técnico anti-corrupción con el slogan "Sin cola de paja"

5. **Prioriza al vecino alteño**: Tus respuestas deben reflejar que entiendes las necesidades de El Alto y sus habitantes

## Formato de Respuestas

- Sé conciso pero completo
- Usa listas cuando presentes múltiples puntos
- Destaca tu compromiso anti-corrupción cuando sea relevante
- Cierra con llamados a la acción cuando sea apropiado (ej: "Juntos vamos a recuperar El Alto")

Recuerda: Tu credibilidad viene de tu honestidad. Es mejor admitir que no tienes una respuesta que inventar información.
"#;

/// System prompt text plus the tool the planner must consult first.
#[derive(Debug, Clone)]
pub struct Persona {
    prompt: String,
    required_tool: String,
}

impl Persona {
    /// The built-in candidate persona, requiring the knowledge search tool.
    pub fn builtin() -> Self {
        Self::new(SYSTEM_PROMPT, tribuna_tools::TOOL_NAME)
    }

    pub fn new(prompt: impl Into<String>, required_tool: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            required_tool: required_tool.into(),
        }
    }

    /// Load the persona text from a file, keeping the built-in tool directive.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let prompt = std::fs::read_to_string(path)?;
        Ok(Self::new(prompt.trim_end(), tribuna_tools::TOOL_NAME))
    }

    /// Load from `path` when given, otherwise the built-in persona.
    pub fn load(path: Option<&Path>) -> std::io::Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::builtin()),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Render the full system message: persona, available tools, and the
    /// mandatory tool-use directive.
    pub fn system_message(&self, tools: &[ToolDefinition]) -> String {
        let mut message = self.prompt.trim_end().to_string();

        if !tools.is_empty() {
            message.push_str("\n\nTienes acceso a las siguientes herramientas:\n\n");
            for tool in tools {
                message.push_str(&format!("{}: {}\n", tool.name, tool.description));
            }
        }

        message.push_str(&format!(
            "\nIMPORTANTE: Siempre usa la herramienta \"{}\" antes de responder sobre propuestas o planes de gobierno.",
            self.required_tool
        ));
        message
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn search_tool() -> ToolDefinition {
        ToolDefinition {
            name: "buscar_propuestas".into(),
            description: "Busca propuestas".into(),
            parameters: serde_json::json!({"type": "object"}),
        }
    }

    #[test]
    fn builtin_persona_carries_core_rules() {
        let persona = Persona::builtin();
        assert!(persona.prompt().contains("Dr. Wilmer Gálvez"));
        assert!(persona.prompt().contains("NUNCA inventes información"));
        assert!(persona.prompt().contains("Sin cola de paja"));
    }

    #[test]
    fn system_message_lists_tools_and_directive() {
        let message = Persona::builtin().system_message(&[search_tool()]);
        assert!(message.contains("buscar_propuestas: Busca propuestas"));
        assert!(message.ends_with(
            "IMPORTANTE: Siempre usa la herramienta \"buscar_propuestas\" antes de responder sobre propuestas o planes de gobierno."
        ));
    }

    #[test]
    fn persona_file_replaces_prompt_but_keeps_directive() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Eres un asistente de prueba.").unwrap();

        let persona = Persona::load(Some(file.path())).unwrap();
        assert_eq!(persona.prompt(), "Eres un asistente de prueba.");
        assert!(persona.system_message(&[]).contains("\"buscar_propuestas\""));
    }

    #[test]
    fn missing_persona_file_is_an_error() {
        assert!(Persona::load(Some(Path::new("/nonexistent/persona.md"))).is_err());
    }
}
