//! Screens of the GUI.
//!
//! Exactly one boxed [`State`] is active. It handles every message and
//! answers with a [`StateCommand`], which may replace the active state and
//! may start a background task whose result comes back as another message.

use color_eyre::Result;
use iced::{Element, Task};
use std::fmt;

mod generator;
pub use generator::Generator;

pub mod modal;
pub use modal::{Dialog, Modal};

pub mod options_menu;

use crate::{Context, message::UiMessage};

pub trait State: fmt::Debug {
    fn update(&mut self, event: UiMessage, ctx: &mut Context) -> Result<StateCommand>;
    fn view<'a>(&'a self, ctx: &'a Context) -> Element<'a, UiMessage>;
    fn clone(&self) -> Box<dyn State>;
}

pub trait StateExt: State + Sized + 'static {
    fn boxed(self) -> Box<dyn State> {
        Box::new(self)
    }
}

impl<T: State + Sized + 'static> StateExt for T {}

#[derive(Debug, Default)]
pub struct StateCommand {
    pub task: Option<Task<UiMessage>>,
    pub transition: Option<Box<dyn State>>,
}

impl StateCommand {
    /// Swaps in the next state, if any, and hands back the task to run
    pub fn apply(self, active: &mut Box<dyn State>) -> Task<UiMessage> {
        if let Some(next) = self.transition {
            log::debug!("Switching to {next:?}");
            *active = next;
        }
        self.task.unwrap_or(Task::none())
    }
}

pub mod cmd {
    use super::*;

    pub fn none() -> Result<StateCommand> {
        Ok(StateCommand::default())
    }

    pub fn task(t: Task<UiMessage>) -> Result<StateCommand> {
        Ok(StateCommand {
            task: Some(t),
            transition: None,
        })
    }

    pub fn transition(s: impl StateExt) -> Result<StateCommand> {
        go_to(s.boxed(), Task::none())
    }

    /// Returns to an already boxed state, e.g. the one below a closing modal
    pub fn go_to(s: Box<dyn State>, t: Task<UiMessage>) -> Result<StateCommand> {
        Ok(StateCommand {
            task: Some(t),
            transition: Some(s),
        })
    }
}
