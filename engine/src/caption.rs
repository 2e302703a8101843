use std::{future::Future, pin::Pin};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

mod error;
pub use error::CaptionError;

pub mod gemini;
pub use gemini::Gemini;

pub mod open_ai_chat;
pub use open_ai_chat::OpenAIChat;

use crate::CaptionBox;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

const FILLER_PREFIXES: [&str; 9] = [
    "meme caption:",
    "caption:",
    "here's a caption:",
    "here's your meme caption:",
    "a funny caption:",
    "your caption:",
    "meme text:",
    "caption text:",
    "here is a caption:",
];

pub type CaptionFuture<'a> = Pin<Box<dyn Future<Output = Result<String, CaptionError>> + Send + 'a>>;

pub trait CaptionModel: Send + Sync {
    /// Sends the caption instruction for `topic` and returns the raw answer text.
    fn get_caption<'a>(&'a self, topic: &'a str) -> CaptionFuture<'a>;
    fn provider(&self) -> Provider;
}

#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    Hash,
    PartialEq,
    Eq,
    EnumIter,
    Default,
)]
pub enum Provider {
    #[default]
    Gemini,
    #[strum(to_string = "OpenAI compatible")]
    OpenAI,
}

impl Provider {
    pub fn make(
        &self,
        api_key: &str,
        model: Option<&str>,
        base_url: Option<&str>,
    ) -> Result<CaptionBox, CaptionError> {
        if api_key.trim().is_empty() {
            return Err(CaptionError::NotInitialized {
                reason: format!("No API key configured for {self}."),
            });
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CaptionError::NotInitialized {
                reason: e.to_string(),
            })?;

        let model = model.unwrap_or(self.default_model()).to_string();
        Ok(match self {
            Provider::Gemini => {
                let mut gemini = Gemini::new(api_key.to_string(), model, client);
                if let Some(url) = base_url {
                    gemini = gemini.with_base_url(url);
                }
                Box::new(gemini)
            }
            Provider::OpenAI => Box::new(OpenAIChat::new(
                api_key.to_string(),
                base_url.unwrap_or(open_ai_chat::DEFAULT_URL),
                model,
                client,
            )),
        })
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => DEFAULT_GEMINI_MODEL,
            Provider::OpenAI => DEFAULT_OPENAI_MODEL,
        }
    }

    /// Environment variable consulted when no key is configured
    pub fn key_env_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
        }
    }
}

pub fn caption_instruction(topic: &str) -> String {
    format!(
        "Generate only a funny and clever meme caption about: '{topic}'. \
         Do not include any introductory or concluding remarks, just the caption text itself. \
         Ensure the caption is suitable for a visual meme."
    )
}

/// Requests a caption and normalizes it.
pub async fn request_caption(model: &dyn CaptionModel, topic: &str) -> Result<String, CaptionError> {
    let raw = model.get_caption(topic).await?;
    log::debug!("raw caption from {}: {raw:?}", model.provider());
    let caption = normalize_caption(&raw);
    if caption.is_empty() {
        return Err(CaptionError::EmptyResponse);
    }
    Ok(caption)
}

/// Strips known filler prefixes and one pair of wrapping quotes.
///
/// A pass applies the prefix rule at most once and removes at most one quote
/// pair. Passes are repeated until nothing changes, which makes the function
/// idempotent. Nested wrappers therefore all go: `""x""` becomes `x`, where a
/// single pass would leave `"x"`.
pub fn normalize_caption(raw: &str) -> String {
    let mut current = raw.trim().to_string();
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_pass(text: &str) -> String {
    let mut text = text.trim();

    for prefix in FILLER_PREFIXES {
        let starts_with_prefix = text
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if starts_with_prefix {
            text = text[prefix.len()..].trim();
            break;
        }
    }

    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            text = text[1..text.len() - 1].trim();
            break;
        }
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use expect_test::expect;

    use super::*;

    #[test]
    fn instruction_embeds_topic() {
        let expect = expect![[r#"Generate only a funny and clever meme caption about: 'mondays'. Do not include any introductory or concluding remarks, just the caption text itself. Ensure the caption is suitable for a visual meme."#]];
        expect.assert_eq(&caption_instruction("mondays"));
    }

    #[test]
    fn strips_filler_prefix_case_insensitively() {
        assert_eq!(normalize_caption("Caption: When the code compiles"), "When the code compiles");
        assert_eq!(normalize_caption("MEME TEXT:   hello"), "hello");
        assert_eq!(normalize_caption("Here's your meme caption: ok"), "ok");
    }

    #[test]
    fn strips_one_matching_quote_pair() {
        assert_eq!(normalize_caption("\"Always has been\""), "Always has been");
        assert_eq!(normalize_caption("'single'"), "single");
        assert_eq!(normalize_caption("\"mismatched'"), "\"mismatched'");
        assert_eq!(normalize_caption("\""), "\"");
    }

    #[test]
    fn prefix_then_quotes() {
        assert_eq!(
            normalize_caption("  caption: \"Me explaining Rust lifetimes\"  "),
            "Me explaining Rust lifetimes"
        );
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(normalize_caption("One does not simply"), "One does not simply");
        assert_eq!(normalize_caption("Ça va: caption"), "Ça va: caption");
    }

    #[test]
    fn nested_wrappers_are_all_removed() {
        assert_eq!(normalize_caption("\"\"x\"\""), "x");
        assert_eq!(normalize_pass("\"\"x\"\""), "\"x\"");
        assert_eq!(normalize_caption("caption: 'meme text: \"deep\"'"), "deep");
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "caption: \"meme text: 'nested'\"",
            "\"\"double wrapped\"\"",
            "Meme Caption: plain",
            "'  spaced  '",
            "\u{e9}t\u{e9}: caption:",
            "",
            "Error: not really",
        ];
        for s in samples {
            let once = normalize_caption(s);
            assert_eq!(normalize_caption(&once), once, "input: {s:?}");
        }
    }

    struct Canned {
        answer: &'static str,
        calls: AtomicUsize,
    }

    impl CaptionModel for Canned {
        fn get_caption<'a>(&'a self, _topic: &'a str) -> CaptionFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(self.answer.to_string()) })
        }

        fn provider(&self) -> Provider {
            Provider::Gemini
        }
    }

    #[tokio::test]
    async fn request_caption_normalizes() {
        let model = Canned {
            answer: "Caption: \"Always has been\"",
            calls: AtomicUsize::new(0),
        };
        let caption = request_caption(&model, "space").await.unwrap();
        assert_eq!(caption, "Always has been");
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn blank_answer_is_an_error() {
        let model = Canned {
            answer: "caption: \"\"",
            calls: AtomicUsize::new(0),
        };
        assert_eq!(
            request_caption(&model, "space").await,
            Err(CaptionError::EmptyResponse)
        );
    }

    #[test]
    fn blank_key_fails_to_initialize() {
        let res = Provider::Gemini.make("  ", None, None);
        assert!(matches!(res, Err(CaptionError::NotInitialized { .. })));
    }
}
