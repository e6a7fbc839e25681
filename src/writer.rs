//! Blog draft generation.
//!
//! Asks an OpenAI-compatible chat-completions endpoint for a Norwegian
//! draft. Without an API key, or when the call fails for any reason, a
//! canned draft is returned instead. Drafts are never persisted.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::config::WriterSettings;

const SYSTEM_PROMPT: &str = "You are a Norwegian brewing expert writing for a home brewing blog. \
Write engaging, informative content about beer brewing techniques, equipment, and experiences.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Draft {
    pub title: String,
    pub summary: String,
    pub content: String,
}

impl Draft {
    fn is_complete(&self) -> bool {
        ![&self.title, &self.summary, &self.content]
            .iter()
            .any(|s| s.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Chat completions wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// BlogWriter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BlogWriter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    settings: WriterSettings,
}

impl BlogWriter {
    pub fn new(settings: WriterSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("Failed to build HTTP client for blog writer")?;

        Ok(Self {
            inner: Arc::new(Inner { http, settings }),
        })
    }

    /// Produce a draft for `topic`. Never fails.
    pub async fn generate(&self, topic: &str, additional_context: Option<&str>) -> Draft {
        if self.inner.settings.api_key.is_none() {
            debug!("No text generation key configured, using canned draft");
            return fallback_draft(topic);
        }

        match self.request_draft(topic, additional_context).await {
            Ok(draft) => {
                info!(topic = %topic, "Generated blog draft");
                draft
            }
            Err(e) => {
                warn!(topic = %topic, error = %e, "Draft generation failed, using canned draft");
                fallback_draft(topic)
            }
        }
    }

    async fn request_draft(&self, topic: &str, additional_context: Option<&str>) -> Result<Draft> {
        let settings = &self.inner.settings;
        let api_key = settings
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("no API key"))?;
        let url = format!("{}/chat/completions", settings.base_url.trim_end_matches('/'));

        let body = json!({
            "model": settings.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt(topic, additional_context) },
            ],
            "response_format": { "type": "json_object" },
        });

        let resp = self
            .inner
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("Chat completion request failed")?
            .error_for_status()
            .context("Chat completion returned an error status")?;

        let chat: ChatResponse = resp
            .json()
            .await
            .context("Chat completion response was not valid JSON")?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("chat completion carried no message"))?;

        let draft: Draft =
            serde_json::from_str(&content).context("Assistant message was not a draft object")?;
        if !draft.is_complete() {
            return Err(anyhow!("draft is missing title, summary or content"));
        }
        Ok(draft)
    }
}

fn user_prompt(topic: &str, additional_context: Option<&str>) -> String {
    let context = additional_context
        .filter(|c| !c.trim().is_empty())
        .map(|c| format!(" Additional context: {c}"))
        .unwrap_or_default();

    format!(
        "Generate a blog post about brewing beer with the following topic: \"{topic}\".{context}\n\n\
Write the blog post in Norwegian language suitable for a brewing blog called \"Prefab Brew Crew\". \
The post should be informative, engaging, and focused on home brewing techniques, experiences, or equipment.\n\n\
Respond with JSON in this exact format:\n\
{{\"title\": \"Blog post title in Norwegian\", \
\"summary\": \"A brief 1-2 sentence summary in Norwegian\", \
\"content\": \"Full blog post content in Norwegian (3-5 paragraphs)\"}}"
    )
}

// ---------------------------------------------------------------------------
// Canned drafts
// ---------------------------------------------------------------------------

/// Static draft chosen by a case-insensitive match on the topic.
pub fn fallback_draft(topic: &str) -> Draft {
    let lower = topic.to_lowercase();

    if lower.contains("ipa") {
        Draft {
            title: "Mesterskap i IPA-brygging - Fra bitter til balansert".to_owned(),
            summary: "En dyptykk i kunsten å brygge IPA - fra humlevalg til perfekt bitterhet."
                .to_owned(),
            content: "IPA har blitt synonymt med moderne øl-revolusjon, og som hjemmebryggere har vi en unik mulighet til å utforske denne stilen i dybden. Nøkkelen til en god IPA ligger i balansen mellom malt-søthet og humle-bitterhet.\n\n\
Gjennom våre eksperimenter har vi funnet at timing av humletilsetning er kritisk. Sen humling gir aroma, tidlig humling gir bitterhet, og midt-humling gir balanse.\n\n\
Med vårt RAPT-utstyr kan vi nå overvåke fermentering nøye og sikre at gjærtemperaturen holder seg stabil rundt 18-20°C for optimal humlekarakter.\n\n\
Vårt råd er å starte enkelt med single-hop IPA-er før dere beveger dere til mer komplekse humlekombinasjoner!"
                .to_owned(),
        }
    } else if lower.contains("stout") {
        Draft {
            title: "Stout-brygging - Mørkhet med karakter".to_owned(),
            summary: "Teknikker for å brygge rike, komplekse stouts med perfekt balanse av røstede smaker."
                .to_owned(),
            content: "Stout er øl-brygging på sitt mest utfordrende og givende. Den mørke, rike karakteren kommer fra nøye utvalgte røstede malter som gir kompleksitet uten bitterhet.\n\n\
Vi har lært at malt-temperaturen er kritisk - for høy kan gi aske-smak, for lav gir ikke nok røst-karakter. Våre beste stouts kommer fra 60-65°C mashing.\n\n\
Fermentering av stout krever tålmodighet. Vi bruker RAPT-sensorer for å overvåke den langsomme prosessen og sikre riktig gjær-helse gjennom hele fermenteringen.\n\n\
Resultatet er øl med dybde og kompleksitet som rivaliserer kommersielle bryggerier!"
                .to_owned(),
        }
    } else {
        Draft {
            title: format!("Brygging og {topic} - Hjemmebryggernes guide"),
            summary: "En praktisk utforskning av bryggemetoder og teknikker for entusiastiske hjemmebryggere."
                .to_owned(),
            content: format!(
                "Som hjemmebryggere i Prefab Brew Crew er vi alltid interessert i å utforske nye aspekter ved brygging, spesielt når det gjelder {topic}. Dette er et område som har fanget vår oppmerksomhet og gitt oss mange spennende lærdommer.\n\n\
Gjennom systematisk eksperimentering og nøye dokumentasjon har vi utviklet metoder som gir konsistente og deilige resultater. Hver batch lærer oss noe nytt om prosessen.\n\n\
Vårt moderne utstyr, inkludert RAPT-sensorer, lar oss overvåke kritiske parametere i sanntid. Dette har revolusjonert måten vi brygger på og gitt oss mulighet til å gjøre presise justeringer underveis.\n\n\
Vi deler gjerne våre erfaringer med bryggemiljøet og oppfordrer andre til å eksperimentere trygt med egne variasjoner!"
            ),
        }
    }
}
