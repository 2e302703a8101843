use color_eyre::Result;
use iced::{
    Border, Color, Element, Length, Task,
    widget::{button, column, container, scrollable, text},
};

use crate::{
    Context, TryIntoExt, bold_text,
    message::{UiMessage, ui_messages::MessageDialog as MyMessage},
};

use super::DialogResult;

#[derive(Debug, Clone)]
pub struct MessageDialog {
    title: String,
    message: String,
}

impl MessageDialog {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl super::Dialog for MessageDialog {
    fn update(&mut self, event: UiMessage, _ctx: &mut Context) -> Result<DialogResult> {
        match event.try_into_ex()? {
            MyMessage::Confirm => Ok(DialogResult::Close(Task::none())),
        }
    }

    fn view<'a>(&'a self, _ctx: &'a Context) -> Element<'a, UiMessage> {
        container(
            column![
                bold_text(&self.title).size(20),
                container(scrollable(text(&self.message)).height(Length::Shrink))
                    .style(|_theme| container::background(Color::from_rgb(0.95, 0.95, 0.95)))
                    .padding(20),
                container(button("Ok").on_press(MyMessage::Confirm.into()))
                    .align_right(Length::Fill)
            ]
            .spacing(10),
        )
        .height(Length::Shrink)
        .padding(20)
        .max_width(700)
        .max_height(700)
        .style(|_theme| container::background(Color::WHITE).border(Border::default().rounded(10)))
        .into()
    }
}
