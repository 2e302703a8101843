use std::{path::PathBuf, sync::Arc};

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    CaptionBox,
    caption::{self, CaptionError},
    catalog::Catalog,
    config::Config,
    render::MemeRenderer,
};

pub const SUCCESS_MESSAGE: &str = "meme generated successfully";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("please enter a topic")]
    EmptyTopic,
    #[error("no templates found")]
    NoTemplates,
    #[error("no templates available")]
    NoTemplateAvailable,
    #[error(transparent)]
    Caption(#[from] CaptionError),
    #[error("failed to draw the meme")]
    Render,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meme {
    pub path: PathBuf,
    pub template: String,
    pub caption: String,
}

impl Meme {
    pub fn message(&self) -> &'static str {
        SUCCESS_MESSAGE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    ValidateInput,
    SelectTemplate,
    RequestCaption,
    RenderImage,
}

/// Everything a request needs, built once at startup and shared read-only.
pub struct MemeContext {
    catalog: Catalog,
    captioner: Result<CaptionBox, CaptionError>,
    renderer: MemeRenderer,
}

impl MemeContext {
    pub fn new(
        catalog: Catalog,
        captioner: Result<CaptionBox, CaptionError>,
        renderer: MemeRenderer,
    ) -> Self {
        Self {
            catalog,
            captioner,
            renderer,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let catalog = Catalog::load(&cfg.tag_index, &cfg.templates_dir);
        let captioner = cfg.provider.make(
            &cfg.api_key,
            cfg.model.as_deref(),
            cfg.base_url.as_deref(),
        );
        match &captioner {
            Ok(c) => info!("Caption model ready: {}", c.provider()),
            Err(e) => warn!("Caption generation disabled: {e}"),
        }
        let renderer = MemeRenderer::new(&cfg.templates_dir, &cfg.output_dir, &cfg.font_path);
        Self::new(catalog, captioner, renderer)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn caption_error(&self) -> Option<&CaptionError> {
        self.captioner.as_ref().err()
    }

    pub async fn generate(self: Arc<Self>, topic: String) -> Result<Meme, GenerateError> {
        let mut stage = Stage::ValidateInput;
        debug!("{stage:?}: {topic:?}");
        if topic.trim().is_empty() {
            return Err(GenerateError::EmptyTopic);
        }
        if self.catalog.is_empty() {
            return Err(GenerateError::NoTemplates);
        }

        stage = Stage::SelectTemplate;
        debug!("{stage:?}");
        let template = self
            .catalog
            .select(&topic)
            .ok_or(GenerateError::NoTemplateAvailable)?;

        stage = Stage::RequestCaption;
        debug!("{stage:?}: template {template:?}");
        let captioner = self.captioner.as_ref().map_err(Clone::clone)?;
        let caption = caption::request_caption(&**captioner, &topic).await?;

        stage = Stage::RenderImage;
        debug!("{stage:?}: caption {caption:?}");
        let ctx = self.clone();
        let (template, caption, path) = tokio::task::spawn_blocking(move || {
            let path = ctx.renderer.render(&template, &caption);
            (template, caption, path)
        })
        .await
        .map_err(|e| {
            warn!("Render task failed: {e}");
            GenerateError::Render
        })?;
        let path = path.ok_or(GenerateError::Render)?;

        info!("Generated {path:?} from {template:?} for {topic:?}");
        Ok(Meme {
            path,
            template,
            caption,
        })
    }
}
