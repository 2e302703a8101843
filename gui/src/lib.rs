use std::{fmt, path::PathBuf};

use color_eyre::{Result, eyre::WrapErr as _};
use iced::{
    Element, Font, Length, Task,
    font::{self},
    padding,
    widget::{container, scrollable, text},
};

use engine::config::{Config, ConfigOverrides};

use crate::{
    message::UiMessage,
    state::{Generator, Modal, State, StateExt, options_menu::OptionsMenu},
};

pub mod cli;
pub mod context;
pub mod message;
pub mod state;

pub use context::Context;

pub struct Gui {
    state: Box<dyn State>,
    ctx: Context,
}

impl Gui {
    /// `mb_config` is the stored config, `None` on first start
    pub fn new(mb_config: Option<Config>, overrides: ConfigOverrides, config_path: PathBuf) -> Self {
        let first_start = mb_config.is_none();
        let ctx = Context::new(mb_config.unwrap_or_default(), overrides, config_path);
        let state = if first_start {
            Modal::message(
                OptionsMenu::new(ctx.saved.clone()).boxed(),
                "Welcome",
                indoc::indoc! {"
                Hi, since this is your first time starting Meme Forge, please configure the
                caption provider and its API key. Gemini keys can be created in Google AI
                Studio. Templates (.jpg or .png) go into the templates directory, and an
                optional JSON tag file maps template paths to lists of tags.
                "
                },
            )
            .boxed()
        } else {
            Generator::new(&ctx).boxed()
        };
        Gui { state, ctx }
    }

    pub fn update(&mut self, message: UiMessage) -> Task<UiMessage> {
        match self.try_update(message) {
            Ok(task) => task,
            Err(e) => {
                self.state = Modal::message(self.state.clone(), "Error", format!("{e:?}")).boxed();
                Task::none()
            }
        }
    }

    fn try_update(&mut self, message: UiMessage) -> Result<Task<UiMessage>> {
        let cmd = self.state.update(message, &mut self.ctx)?;
        Ok(cmd.apply(&mut self.state))
    }

    pub fn view(&self) -> Element<'_, UiMessage> {
        self.state.view(&self.ctx)
    }
}

macro_rules! elem_list {
    ($($elems:expr),+ $(,)?) => {
        [$(iced::Element::from($elems)),*]
    };
}
pub(crate) use elem_list;

fn bold_text<'a>(t: impl text::IntoFragment<'a>) -> iced::widget::Text<'a> {
    iced::widget::text(t).font(bold_default_font())
}

fn bold_default_font() -> Font {
    Font {
        weight: font::Weight::Bold,
        ..Font::DEFAULT
    }
}

fn top_level_container<'a, T: Send + 'static>(
    elem: impl Into<Element<'a, T>>,
) -> container::Container<'a, T> {
    container(
        container(scrollable(
            container(elem).padding(padding::all(10).right(20)),
        ))
        .padding(20)
        .max_width(900),
    )
    .center(Length::Fill)
}

pub trait TryIntoExt<T> {
    fn try_into_ex(self) -> color_eyre::Result<T>;
}

impl<T, Target, E> TryIntoExt<Target> for T
where
    T: TryInto<Target, Error = E>,
    T: fmt::Debug,
    T: Clone,
    E: std::error::Error + Send + Sync + 'static,
{
    fn try_into_ex(self) -> color_eyre::Result<Target> {
        self.clone()
            .try_into()
            .with_context(|| format!("{self:#?}"))
    }
}
