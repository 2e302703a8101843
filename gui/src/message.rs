use derive_more::{From, TryInto};

#[derive(Debug, Clone, From, TryInto)]
pub enum UiMessage {
    Generator(ui_messages::Generator),
    OptionsMenu(ui_messages::OptionsMenu),
    MessageDialog(ui_messages::MessageDialog),
}

pub mod ui_messages {
    use engine::{GenerateError, Meme, caption::Provider};

    #[derive(Debug, Clone)]
    pub enum Generator {
        TopicChanged(String),
        Submit,
        Finished(Result<Meme, GenerateError>),
        OpenOptions,
    }

    #[derive(Debug, Clone)]
    pub enum OptionsMenu {
        SelectProvider(Provider),
        ApiKeyChanged(String),
        ModelChanged(String),
        BaseUrlChanged(String),
        TemplatesDirChanged(String),
        TagIndexChanged(String),
        OutputDirChanged(String),
        FontPathChanged(String),
        Ok,
        Cancel,
    }

    #[derive(Debug, Clone)]
    pub enum MessageDialog {
        Confirm,
    }
}
