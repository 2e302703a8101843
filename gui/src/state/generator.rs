use color_eyre::Result;
use iced::{
    Element, Length, Task,
    alignment::{Horizontal, Vertical},
    widget::{self, button, column, container, image, row, space, text, text_input},
};

use crate::{
    Context, TryIntoExt, bold_text, elem_list,
    message::{UiMessage, ui_messages::Generator as MyMessage},
    state::{State, StateCommand, cmd, options_menu::OptionsMenu},
    top_level_container,
};

const PLACEHOLDER: &str = "Enter a short topic or emotion (e.g. 'confusion', 'success', 'dilemma')";
const IMAGE_HEIGHT: f32 = 520.0;

/// The meme form: one topic input, the last generated image and a status line.
#[derive(Debug, Clone)]
pub struct Generator {
    topic: String,
    status: String,
    image: Option<image::Handle>,
    busy: bool,
}

impl Generator {
    pub fn new(ctx: &Context) -> Self {
        Self {
            topic: String::new(),
            status: ctx.startup_problem().unwrap_or_default(),
            image: None,
            busy: false,
        }
    }

    fn submit(&mut self, ctx: &Context) -> Result<StateCommand> {
        if self.busy {
            return cmd::none();
        }
        self.busy = true;
        self.status = "generating…".into();
        let request = ctx.memes.clone().generate(self.topic.clone());
        cmd::task(Task::perform(request, |res| MyMessage::Finished(res).into()))
    }
}

impl State for Generator {
    fn update(&mut self, event: UiMessage, ctx: &mut Context) -> Result<StateCommand> {
        use MyMessage::*;
        match event.try_into_ex()? {
            TopicChanged(topic) => {
                self.topic = topic;
                cmd::none()
            }
            Submit => self.submit(ctx),
            Finished(res) => {
                self.busy = false;
                match res {
                    Ok(meme) => {
                        log::info!("Showing {:?}", meme.path);
                        self.image = Some(image::Handle::from_path(&meme.path));
                        self.status = format!("{} ({})", meme.message(), meme.template);
                    }
                    Err(e) => {
                        self.image = None;
                        self.status = e.to_string();
                    }
                }
                cmd::none()
            }
            OpenOptions => cmd::transition(OptionsMenu::new(ctx.saved.clone())),
        }
    }

    fn view<'a>(&'a self, ctx: &'a Context) -> Element<'a, UiMessage> {
        let submit = (!self.busy).then_some(MyMessage::Submit.into());

        let picture: Element<'a, UiMessage> = match &self.image {
            Some(handle) => widget::image(handle)
                .height(IMAGE_HEIGHT)
                .width(Length::Fill)
                .into(),
            None => container(text("No meme yet").size(14))
                .center_x(Length::Fill)
                .center_y(IMAGE_HEIGHT)
                .into(),
        };

        let template_info = if ctx.memes.catalog().is_tagged() {
            format!("{} tagged templates", ctx.memes.catalog().templates().len())
        } else {
            format!("{} untagged templates", ctx.memes.catalog().templates().len())
        };

        let items = elem_list![
            bold_text(engine::APP_NAME).size(24).width(Length::Fill).center(),
            text("Enter a topic and get a matching template with a generated caption."),
            row![
                text_input(PLACEHOLDER, &self.topic)
                    .on_input(|s| MyMessage::TopicChanged(s).into())
                    .on_submit_maybe(submit.clone())
                    .width(Length::Fill),
                button("Generate").on_press_maybe(submit),
            ]
            .spacing(10)
            .align_y(Vertical::Center),
            picture,
            text(&self.status),
            row![
                text(template_info).size(12),
                space::horizontal(),
                button("Options")
                    .on_press_maybe((!self.busy).then_some(MyMessage::OpenOptions.into())),
            ]
            .align_y(Vertical::Center),
        ];

        top_level_container(
            column(items)
                .spacing(16)
                .align_x(Horizontal::Center)
                .width(Length::Fill),
        )
        .into()
    }

    fn clone(&self) -> Box<dyn State> {
        Box::new(Clone::clone(self))
    }
}
