use color_eyre::Result;
use iced::{
    Length,
    widget::{button, column, radio, row, space, text, text_input},
};
use strum::IntoEnumIterator;

use engine::{
    caption::{Provider, gemini, open_ai_chat},
    config::Config,
};

use crate::{
    Context, TryIntoExt, bold_text, elem_list,
    message::{UiMessage, ui_messages::OptionsMenu as MyMessage},
    state::{Generator, State, StateCommand, cmd},
    top_level_container,
};

/// Edits a copy of the config, which is saved and applied on Ok
#[derive(Debug, Clone)]
pub struct OptionsMenu {
    draft: Config,
    model: String,
    base_url: String,
    templates_dir: String,
    tag_index: String,
    output_dir: String,
    font_path: String,
}

impl OptionsMenu {
    pub fn new(config: Config) -> Self {
        Self {
            model: config.model.clone().unwrap_or_default(),
            base_url: config.base_url.clone().unwrap_or_default(),
            templates_dir: config.templates_dir.display().to_string(),
            tag_index: config.tag_index.display().to_string(),
            output_dir: config.output_dir.display().to_string(),
            font_path: config.font_path.display().to_string(),
            draft: config,
        }
    }

    fn finished_config(&self) -> Config {
        Config {
            model: non_blank(&self.model),
            base_url: non_blank(&self.base_url),
            templates_dir: self.templates_dir.trim().into(),
            tag_index: self.tag_index.trim().into(),
            output_dir: self.output_dir.trim().into(),
            font_path: self.font_path.trim().into(),
            ..self.draft.clone()
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn base_url_hint(provider: Provider) -> &'static str {
    match provider {
        Provider::Gemini => gemini::DEFAULT_BASE_URL,
        Provider::OpenAI => open_ai_chat::DEFAULT_URL,
    }
}

impl State for OptionsMenu {
    fn update(&mut self, event: UiMessage, ctx: &mut Context) -> Result<StateCommand> {
        use MyMessage::*;
        match event.try_into_ex()? {
            SelectProvider(provider) => {
                if provider != self.draft.provider {
                    self.draft.provider = provider;
                    self.draft.api_key.clear();
                    self.model.clear();
                    self.base_url.clear();
                }
                cmd::none()
            }
            ApiKeyChanged(val) => {
                self.draft.api_key = val;
                cmd::none()
            }
            ModelChanged(val) => {
                self.model = val;
                cmd::none()
            }
            BaseUrlChanged(val) => {
                self.base_url = val;
                cmd::none()
            }
            TemplatesDirChanged(val) => {
                self.templates_dir = val;
                cmd::none()
            }
            TagIndexChanged(val) => {
                self.tag_index = val;
                cmd::none()
            }
            OutputDirChanged(val) => {
                self.output_dir = val;
                cmd::none()
            }
            FontPathChanged(val) => {
                self.font_path = val;
                cmd::none()
            }
            Ok => {
                ctx.save_config(self.finished_config())?;
                cmd::transition(Generator::new(ctx))
            }
            Cancel => cmd::transition(Generator::new(ctx)),
        }
    }

    fn view<'a>(&'a self, _ctx: &'a Context) -> iced::Element<'a, UiMessage> {
        let provider = self.draft.provider;
        let path_input = |label: &'a str, value: &'a str, on_input: fn(String) -> MyMessage| {
            column![
                text(label),
                text_input(label, value)
                    .on_input(move |s| on_input(s).into())
                    .width(Length::Fill),
            ]
            .spacing(6)
        };

        let items = elem_list![
            bold_text("Options").width(Length::Fill).center(),
            space().height(20),
            text("Caption Provider"),
            column(Provider::iter().map(|p| -> iced::Element<'a, UiMessage> {
                radio(format!("{p}"), p, Some(provider), |p| {
                    MyMessage::SelectProvider(p).into()
                })
                .into()
            }))
            .spacing(10),
            text(format!("API Key (falls back to ${})", provider.key_env_var())),
            text_input("API key", &self.draft.api_key)
                .secure(true)
                .on_input(|s| MyMessage::ApiKeyChanged(s).into())
                .width(Length::Fill),
            text("Model"),
            text_input(provider.default_model(), &self.model)
                .on_input(|s| MyMessage::ModelChanged(s).into())
                .width(Length::Fill),
            text("Base URL (leave empty for the official endpoint)"),
            text_input(base_url_hint(provider), &self.base_url)
                .on_input(|s| MyMessage::BaseUrlChanged(s).into())
                .width(Length::Fill),
            space().height(20),
            bold_text("Files"),
            path_input("Template directory", &self.templates_dir, MyMessage::TemplatesDirChanged),
            path_input("Tag file", &self.tag_index, MyMessage::TagIndexChanged),
            path_input("Output directory", &self.output_dir, MyMessage::OutputDirChanged),
            path_input("Font file", &self.font_path, MyMessage::FontPathChanged),
            space().height(30),
            row![
                button("Cancel").on_press(MyMessage::Cancel.into()),
                button("Ok").on_press(MyMessage::Ok.into()),
            ]
            .spacing(10),
        ];

        top_level_container(
            column(items)
                .spacing(12)
                .width(Length::Fill)
                .height(Length::Fill),
        )
        .into()
    }

    fn clone(&self) -> Box<dyn State> {
        Box::new(Clone::clone(self))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use color_eyre::Result;
    use engine::config::{ConfigOverrides, load_config_from};
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn blank_fields_mean_provider_defaults() {
        let mut menu = OptionsMenu::new(Config {
            model: Some("gemini-1.5-pro".into()),
            base_url: Some("http://localhost:8080".into()),
            ..Config::default()
        });
        menu.model = "  ".into();
        menu.base_url = String::new();
        menu.output_dir = " /tmp/out ".into();

        let cfg = menu.finished_config();
        assert_eq!(cfg.model, None);
        assert_eq!(cfg.base_url, None);
        assert_eq!(cfg.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(cfg.tag_index, PathBuf::from("meme_tags.json"));
    }

    #[test]
    fn switching_provider_forgets_endpoint_settings() -> Result<()> {
        let dir = TempDir::new()?;
        let mut ctx = Context::new(
            Config::default(),
            ConfigOverrides::default(),
            dir.path().join("cfg.ron"),
        );
        let mut menu = OptionsMenu::new(Config {
            api_key: "gemini-key".into(),
            model: Some("gemini-1.5-pro".into()),
            base_url: Some("https://gemini-proxy.internal".into()),
            ..Config::default()
        });

        menu.update(MyMessage::SelectProvider(Provider::OpenAI).into(), &mut ctx)?;
        let cfg = menu.finished_config();
        assert_eq!(cfg.provider, Provider::OpenAI);
        assert_eq!(cfg.api_key, "");
        assert_eq!(cfg.model, None);
        assert_eq!(cfg.base_url, None);
        Ok(())
    }

    #[test]
    fn ok_saves_the_edit_without_command_line_values() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("cfg.ron");
        let overrides = ConfigOverrides {
            api_key: Some("one-off-key".into()),
            model: Some("gemini-exp".into()),
            ..ConfigOverrides::default()
        };
        let mut ctx = Context::new(Config::default(), overrides, path.clone());

        let mut menu = OptionsMenu::new(ctx.saved.clone());
        menu.update(MyMessage::TagIndexChanged("tags.json".into()).into(), &mut ctx)?;
        let cmd = menu.update(MyMessage::Ok.into(), &mut ctx)?;
        assert!(cmd.transition.is_some());

        let on_disk = load_config_from(&path)?.unwrap();
        assert_eq!(on_disk.api_key, "");
        assert_eq!(on_disk.model, None);
        assert_eq!(on_disk.tag_index, PathBuf::from("tags.json"));
        assert_eq!(ctx.config.api_key, "one-off-key");
        assert_eq!(ctx.config.tag_index, PathBuf::from("tags.json"));
        Ok(())
    }
}
