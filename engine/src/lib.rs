use crate::caption::CaptionModel;

pub mod caption;
pub mod catalog;
pub mod config;
pub mod generator;
pub mod render;

pub use generator::{GenerateError, Meme, MemeContext};

pub type CaptionBox = Box<dyn CaptionModel>;
pub const APP_NAME: &str = "Meme Forge";
