use serde::Serialize;

/// Hard ceiling on transcript characters sent to the model
pub const TRANSCRIPT_CHAR_LIMIT: usize = 20_000;

const PERSONA: &str = "Você é Fiorelo, um assistente que resume vídeos do YouTube para ajudar os usuários a ganhar tempo. \
Ignore anúncios, saudações, despedidas, agradecimentos e qualquer coisa fora do assunto principal. \
Após o resumo, responda perguntas extras com base no vídeo e no seu conhecimento geral. \
Por se tratar de uma transcrição, poderam ter muitos erros de escrita. \
Se atente a incoerências que podem ser erro da transcrição automática do vídeo. \
Evite frases como 'A transcriçao do vídeo fala sobre..'.";

const TRANSCRIPT_PREFIX: &str = "Transcrição do vídeo: ";

const INSTRUCTION: &str = "Faça um resumo da transcrição acima.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// First `limit` characters of `text`, never splitting a code point
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Persona, then transcript, then the summarize instruction
pub fn build_messages(transcript: &str, char_limit: usize) -> Vec<ChatMessage> {
    let excerpt = truncate_chars(transcript, char_limit);
    vec![
        ChatMessage::system(PERSONA),
        ChatMessage::system(format!("{TRANSCRIPT_PREFIX}{excerpt}")),
        ChatMessage::system(INSTRUCTION),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_order() {
        let messages = build_messages("texto de exemplo...", TRANSCRIPT_CHAR_LIMIT);
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| m.role == Role::System));
        assert!(messages[0].content.starts_with("Você é Fiorelo"));
        assert_eq!(messages[1].content, "Transcrição do vídeo: texto de exemplo...");
        assert_eq!(messages[2].content, INSTRUCTION);
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("ação", 2), "aç");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_transcript_truncated_to_limit() {
        let long = "é".repeat(TRANSCRIPT_CHAR_LIMIT + 500);
        let messages = build_messages(&long, TRANSCRIPT_CHAR_LIMIT);
        let excerpt = messages[1].content.strip_prefix(TRANSCRIPT_PREFIX).unwrap();
        assert_eq!(excerpt.chars().count(), TRANSCRIPT_CHAR_LIMIT);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(ChatMessage::system("x")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "x"}));
    }
}
