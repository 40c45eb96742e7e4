//! Recovery policy for planner output that is neither a tool call nor a
//! clean final answer.
//!
//! The raw text usually still contains the answer the model meant to give,
//! wrapped in quotes. The first double-quoted literal is taken as the answer;
//! without one, a fixed apology is returned instead of failing the request.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Shown to the user when nothing can be salvaged from the planner output.
pub const FALLBACK_MESSAGE: &str =
    "Lo siento, tuve un problema técnico al procesar tu pregunta. Por favor, intenta de nuevo.";

static QUOTED_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("valid quoted-literal regex"));

/// Best-effort final answer from malformed planner output.
pub fn recover_final_answer(raw: &str) -> String {
    extract_quoted_literal(raw).unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

/// First non-empty double-quoted literal in `raw`, with JSON escapes decoded.
fn extract_quoted_literal(raw: &str) -> Option<String> {
    QUOTED_LITERAL
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|inner| !inner.trim().is_empty())
        .map(|inner| {
            serde_json::from_str::<String>(&format!("\"{inner}\""))
                .unwrap_or_else(|_| inner.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern_compiles_and_captures_inner_text() {
        let caps = LazyLock::force(&QUOTED_LITERAL).captures(r#"x "a \"b\" c" y"#).unwrap();
        assert_eq!(&caps[1], r#"a \"b\" c"#);
    }

    #[test]
    fn quoted_literal_is_recovered_exactly() {
        let raw = r#"Thought: ya tengo la respuesta
Final Answer: "Mi propuesta es un hospital de tercer nivel para El Alto.""#;
        assert_eq!(
            recover_final_answer(raw),
            "Mi propuesta es un hospital de tercer nivel para El Alto."
        );
    }

    #[test]
    fn first_literal_wins() {
        let raw = r#"Action: "primera" y luego "segunda""#;
        assert_eq!(recover_final_answer(raw), "primera");
    }

    #[test]
    fn escapes_are_decoded() {
        let raw = r#"Final Answer: "Línea uno\nLínea dos""#;
        assert_eq!(recover_final_answer(raw), "Línea uno\nLínea dos");

        let raw = r#"respuesta: "Dijo \"basta\" y se fue""#;
        assert_eq!(recover_final_answer(raw), "Dijo \"basta\" y se fue");
    }

    #[test]
    fn empty_literals_are_skipped() {
        let raw = r#"Action Input: "" Final: "Hola vecino""#;
        assert_eq!(recover_final_answer(raw), "Hola vecino");
    }

    #[test]
    fn no_literal_yields_fallback() {
        assert_eq!(recover_final_answer("Action: buscar_propuestas sin formato"), FALLBACK_MESSAGE);
        assert_eq!(recover_final_answer(""), FALLBACK_MESSAGE);
    }

    #[test]
    fn invalid_escape_keeps_raw_text() {
        let raw = r#"say "bad \q escape""#;
        assert_eq!(recover_final_answer(raw), r"bad \q escape");
    }
}
