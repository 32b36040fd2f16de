//! Conversational access to Arlo over the user's network.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::InsightsConfig;
use crate::insights::prompt::{format_contact, ContactInsight};
use crate::insights::recommend::rule_based;
use crate::insights::{analyze_network, CHAT_SYSTEM_PROMPT};
use crate::llm::TextGenerator;
use crate::model::{Contact, Interaction};

/// Turns of history included in each prompt.
const HISTORY_TURNS: usize = 6;

/// Prefix of every fallback reply.
pub const FALLBACK_PREFIX: &str = "**Sorry!**";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub message: ChatMessage,
    /// `false` when the reply is the rule-based fallback.
    pub ai_available: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Send a user message and append Arlo's answer.
    ///
    /// Never fails: if the generator errors, a `**Sorry!**` reply with a
    /// heuristic tip is appended instead.
    pub async fn send<G: TextGenerator>(
        &mut self,
        generator: &G,
        text: &str,
        contacts: &[Contact],
        interactions: &[Interaction],
        config: &InsightsConfig,
        now: DateTime<Utc>,
    ) -> ChatReply {
        let network = analyze_network(contacts, interactions, now, config.recent_activity_days);
        let mut prompt = network.context(config.recent_activity_days, config.max_context_contacts);

        let mentioned = mentioned_contacts(&network.insights, text);
        if !mentioned.is_empty() {
            prompt.push_str("\n\nMentioned in this message:\n");
            let blocks: Vec<String> = mentioned.into_iter().map(format_contact).collect();
            prompt.push_str(&blocks.join("\n"));
        }

        let start = self.messages.len().saturating_sub(HISTORY_TURNS);
        if start < self.messages.len() {
            prompt.push_str("\n\nConversation so far:\n");
            for m in &self.messages[start..] {
                let who = match m.role {
                    Role::User => "User",
                    Role::Assistant => "Arlo",
                };
                prompt.push_str(&format!("{who}: {}\n", m.content));
            }
        }
        prompt.push_str(&format!("\nUser: {text}"));

        self.messages.push(ChatMessage {
            role: Role::User,
            content: text.to_string(),
            created_at: now,
        });

        let (content, ai_available) = match generator.generate(&prompt, Some(CHAT_SYSTEM_PROMPT)).await {
            Ok(reply) if !reply.trim().is_empty() => (reply.trim().to_string(), true),
            Ok(_) => {
                tracing::warn!("empty chat reply, using fallback");
                (fallback_reply(&network.insights, now), false)
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat generation failed, using fallback");
                (fallback_reply(&network.insights, now), false)
            }
        };

        let message = ChatMessage {
            role: Role::Assistant,
            content,
            created_at: now,
        };
        self.messages.push(message.clone());
        ChatReply {
            message,
            ai_available,
        }
    }
}

/// Contacts whose full or first name appears in `text`.
fn mentioned_contacts<'b, 'a>(insights: &'b [ContactInsight<'a>], text: &str) -> Vec<&'b ContactInsight<'a>> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    insights
        .iter()
        .filter(|i| {
            let name = i.contact.name().to_lowercase();
            let first = i.contact.first_name().to_lowercase();
            lower.contains(&name) || (first.len() > 2 && words.contains(&first.as_str()))
        })
        .take(5)
        .collect()
}

fn fallback_reply(insights: &[ContactInsight<'_>], now: DateTime<Utc>) -> String {
    let tip = match rule_based(insights, 1, now).into_iter().next() {
        Some(r) => format!("**{}**. {}", r.suggestion, r.reasoning),
        None => "Import your contacts or add a few people so I can help you keep in touch.".to_string(),
    };
    format!("{FALLBACK_PREFIX} I couldn't reach the AI service just now. Here's a quick tip instead:\n\n- {tip}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CirclError, Result};
    use crate::model::{Circle, NewContact};
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct Recorder {
        prompts: Mutex<Vec<String>>,
    }

    impl TextGenerator for Recorder {
        async fn generate(&self, prompt: &str, _system: Option<&str>) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("Call **Jane** this week.".to_string())
        }
    }

    struct Offline;

    impl TextGenerator for Offline {
        async fn generate(&self, _prompt: &str, _system: Option<&str>) -> Result<String> {
            Err(CirclError::Llm("connection refused".into()))
        }
    }

    fn contacts() -> Vec<Contact> {
        let user = Uuid::now_v7();
        vec![
            Contact::new(user, NewContact::new("Jane Doe").with_circle(Circle::Inner)),
            Contact::new(user, NewContact::new("Omar Haddad")),
        ]
    }

    #[tokio::test]
    async fn appends_user_and_assistant_messages() {
        let gen = Recorder::default();
        let mut chat = ChatSession::new();
        let cs = contacts();
        let reply = chat
            .send(&gen, "Who should I call?", &cs, &[], &InsightsConfig::default(), Utc::now())
            .await;
        assert!(reply.ai_available);
        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.messages()[0].role, Role::User);
        assert_eq!(chat.messages()[1].content, "Call **Jane** this week.");
    }

    #[tokio::test]
    async fn prompt_carries_context_and_history() {
        let gen = Recorder::default();
        let mut chat = ChatSession::new();
        let cs = contacts();
        let config = InsightsConfig::default();
        chat.send(&gen, "hello", &cs, &[], &config, Utc::now()).await;
        chat.send(&gen, "What about jane?", &cs, &[], &config, Utc::now()).await;

        let prompts = gen.prompts.lock().unwrap();
        let last = prompts.last().unwrap();
        assert!(last.starts_with("Network: 2 contacts"));
        assert!(last.contains("Mentioned in this message:\n- Jane Doe"));
        assert!(last.contains("User: hello"));
        assert!(last.ends_with("User: What about jane?"));
    }

    #[tokio::test]
    async fn network_error_yields_sorry_message() {
        let mut chat = ChatSession::new();
        let cs = contacts();
        let reply = chat
            .send(&Offline, "Any ideas?", &cs, &[], &InsightsConfig::default(), Utc::now())
            .await;
        assert!(!reply.ai_available);
        assert!(reply.message.content.starts_with("**Sorry!**"));
        assert!(reply.message.content.contains("Jane"));
        assert_eq!(chat.messages().len(), 2);
    }

    #[tokio::test]
    async fn fallback_without_contacts() {
        let mut chat = ChatSession::new();
        let reply = chat
            .send(&Offline, "hi", &[], &[], &InsightsConfig::default(), Utc::now())
            .await;
        assert!(reply.message.content.starts_with(FALLBACK_PREFIX));
        assert!(reply.message.content.contains("Import your contacts"));
    }
}
