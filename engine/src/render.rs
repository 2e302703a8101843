use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use color_eyre::{Result, eyre::WrapErr as _};
use image::{ImageFormat, Rgb, RgbImage};
use log::{debug, error, warn};
use rand::Rng;

mod builtin_font;
pub mod typeface;
pub use typeface::{TextSize, Typeface};

pub const MIN_FONT_SIZE: u32 = 25;
/// Share of the image width a caption line may occupy
pub const MAX_LINE_WIDTH_RATIO: f32 = 0.9;
pub const BOTTOM_MARGIN: i64 = 30;
pub const TOP_FALLBACK: i64 = 10;
pub const STROKE_WIDTH: i32 = 2;
pub const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
pub const STROKE_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

const NAME_ATTEMPTS: usize = 16;

#[derive(Debug, Clone)]
pub struct MemeRenderer {
    templates_dir: PathBuf,
    output_dir: PathBuf,
    font_path: PathBuf,
}

impl MemeRenderer {
    pub fn new(
        templates_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        font_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            output_dir: output_dir.into(),
            font_path: font_path.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Draws `caption` onto the template and writes a new file to the output
    /// directory. Returns `None` if the template can't be opened or the result
    /// can't be written.
    pub fn render(&self, template_file: &str, caption: &str) -> Option<PathBuf> {
        let template_path = self.templates_dir.join(template_file);
        let mut img = match image::open(&template_path) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                error!("Couldn't open template {template_path:?}: {e}");
                return None;
            }
        };

        let face = self.typeface_for(img.width());
        draw_caption(&mut img, &face, caption);

        match save_unique(&img, &self.output_dir, &mut rand::thread_rng()) {
            Ok(path) => {
                debug!("Wrote meme to {path:?}");
                Some(path)
            }
            Err(e) => {
                error!("Couldn't save meme: {e:#}");
                None
            }
        }
    }

    fn typeface_for(&self, image_width: u32) -> Typeface {
        let px = font_size_for(image_width);
        Typeface::load(&self.font_path, px).unwrap_or_else(|e| {
            warn!(
                "Couldn't load font {:?} ({e}), using the builtin font",
                self.font_path
            );
            Typeface::builtin(px)
        })
    }
}

#[cfg(test)]
pub(crate) fn test_font() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/DejaVuSans.ttf")
}

pub fn font_size_for(image_width: u32) -> u32 {
    (image_width / 12).max(MIN_FONT_SIZE)
}

/// Greedily packs whitespace separated words into lines no wider than
/// `max_width`. A word that is too wide on its own gets a line to itself.
pub fn wrap_words(text: &str, max_width: f32, measure: impl Fn(&str) -> u32) -> Vec<String> {
    let mut lines = vec![];
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{current} {word}");
        if measure(&candidate) as f32 <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Top-left position of every line: horizontally centered, stacked so the
/// block ends `BOTTOM_MARGIN` above the bottom edge.
pub fn layout_lines(image_width: u32, image_height: u32, sizes: &[TextSize]) -> Vec<(i32, i32)> {
    let total: i64 = sizes.iter().map(|s| s.height as i64).sum();
    let mut y = image_height as i64 - total - BOTTOM_MARGIN;
    if y < 0 {
        y = TOP_FALLBACK;
    }

    sizes
        .iter()
        .map(|size| {
            let x = (image_width as i64 - size.width as i64) / 2;
            let pos = (x as i32, y as i32);
            y += size.height as i64;
            pos
        })
        .collect()
}

pub fn draw_caption(img: &mut RgbImage, face: &Typeface, caption: &str) {
    let (width, height) = img.dimensions();
    let max_width = width as f32 * MAX_LINE_WIDTH_RATIO;
    let lines = wrap_words(caption, max_width, |l| face.measure(l).width);
    let sizes: Vec<TextSize> = lines.iter().map(|l| face.measure(l)).collect();

    for (line, (x, y)) in lines.iter().zip(layout_lines(width, height, &sizes)) {
        draw_outlined(img, face, x, y, line);
    }
}

fn draw_outlined(img: &mut RgbImage, face: &Typeface, x: i32, y: i32, text: &str) {
    let r = STROKE_WIDTH;
    for dy in -r..=r {
        for dx in -r..=r {
            if (dx, dy) != (0, 0) && dx * dx + dy * dy <= r * r {
                face.draw(img, x + dx, y + dy, STROKE_COLOR, text);
            }
        }
    }
    face.draw(img, x, y, TEXT_COLOR, text);
}

/// Writes `img` as `meme_<5 digits>.png`, drawing a new number if the name is taken.
pub fn save_unique<R: Rng + ?Sized>(img: &RgbImage, output_dir: &Path, rng: &mut R) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .wrap_err_with(|| format!("Couldn't create output directory {output_dir:?}"))?;

    let mut last_err = None;
    for _ in 0..NAME_ATTEMPTS {
        let path = output_dir.join(format!("meme_{}.png", rng.gen_range(10000..=99999)));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => {
                write_png(img, file).wrap_err_with(|| format!("Couldn't encode {path:?}"))?;
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!("{path:?} already exists, drawing another name");
                last_err = Some(e);
            }
            Err(e) => return Err(e).wrap_err_with(|| format!("Couldn't create {path:?}")),
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::other("no attempts made")))
        .wrap_err("Couldn't find a free output file name")
}

fn write_png(img: &RgbImage, file: File) -> Result<()> {
    let mut writer = BufWriter::new(file);
    img.write_to(&mut writer, ImageFormat::Png)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use tempfile::TempDir;

    use super::*;

    fn char_measure(l: &str) -> u32 {
        l.chars().count() as u32 * 10
    }

    #[test]
    fn font_size_scales_with_width() {
        assert_eq!(font_size_for(1200), 100);
        assert_eq!(font_size_for(120), MIN_FONT_SIZE);
        assert_eq!(font_size_for(311), 25);
    }

    #[test]
    fn wraps_greedily() {
        let lines = wrap_words("one two three four", 95.0, char_measure);
        assert_eq!(lines, ["one two", "three four"]);
    }

    #[test]
    fn oversized_word_gets_its_own_line() {
        let lines = wrap_words("a supercalifragilistic b", 50.0, char_measure);
        assert_eq!(lines, ["a", "supercalifragilistic", "b"]);

        let lines = wrap_words("supercalifragilistic", 50.0, char_measure);
        assert_eq!(lines, ["supercalifragilistic"]);
    }

    #[test]
    fn wrapped_lines_respect_budget() {
        let text = "the quick brown fox jumps over the lazy dog while a remarkably \
                    longwindedwordthatcannotfit sits around doing nothing at all";
        for budget in [40.0, 75.0, 120.0, 333.0] {
            for line in wrap_words(text, budget, char_measure) {
                let w = char_measure(&line) as f32;
                assert!(w <= budget || !line.contains(' '), "{line:?} at {budget}");
            }
        }
    }

    #[test]
    fn blank_caption_has_no_lines() {
        assert!(wrap_words("   \n\t ", 100.0, char_measure).is_empty());
    }

    #[test]
    fn lines_stack_up_from_the_bottom() {
        let sizes = [
            TextSize { width: 200, height: 50 },
            TextSize { width: 100, height: 40 },
        ];
        let pos = layout_lines(1000, 600, &sizes);
        assert_eq!(pos, [(400, 480), (450, 530)]);
    }

    #[test]
    fn tall_block_starts_near_the_top() {
        let sizes = [TextSize { width: 10, height: 500 }; 2];
        let pos = layout_lines(100, 600, &sizes);
        assert_eq!(pos[0].1, TOP_FALLBACK as i32);
        assert_eq!(pos[1].1, TOP_FALLBACK as i32 + 500);
    }

    #[test]
    fn caption_is_drawn_near_the_bottom() {
        let mut img = RgbImage::from_pixel(400, 300, Rgb([40, 90, 160]));
        draw_caption(&mut img, &Typeface::builtin(font_size_for(400)), "Hello");

        let touched: Vec<u32> = img
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 != [40, 90, 160])
            .map(|(_, y, _)| y)
            .collect();
        assert!(!touched.is_empty());
        assert!(touched.iter().all(|y| *y > 150));
        assert!(img.pixels().any(|p| p.0 == TEXT_COLOR.0));
        assert!(img.pixels().any(|p| p.0 == STROKE_COLOR.0));
    }

    #[test]
    fn outline_lines_fit_the_budget() {
        let face = Typeface::load(&test_font(), font_size_for(600)).unwrap();
        let caption = "When you finally fix the bug and three new ones show up to celebrate";
        let budget = 600.0 * MAX_LINE_WIDTH_RATIO;

        let lines = wrap_words(caption, budget, |l| face.measure(l).width);
        assert!(lines.len() > 1, "{lines:?}");
        for line in &lines {
            let w = face.measure(line).width as f32;
            assert!(w <= budget, "{line:?} is {w}px wide");
        }
    }

    #[test]
    fn outline_caption_stays_centered_in_the_margin() {
        let face = Typeface::load(&test_font(), font_size_for(600)).unwrap();
        let background = [90, 140, 60];
        let mut img = RgbImage::from_pixel(600, 400, Rgb(background));
        draw_caption(&mut img, &face, "Me pretending to understand the standup update");

        let touched: Vec<(u32, u32)> = img
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 != background)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!touched.is_empty());
        let margin = (600.0 * (1.0 - MAX_LINE_WIDTH_RATIO) / 2.0) as u32 - STROKE_WIDTH as u32;
        for (x, y) in touched {
            assert!((margin..600 - margin).contains(&x), "x={x}");
            assert!(y > 150 && y < 400 - BOTTOM_MARGIN as u32 + STROKE_WIDTH as u32, "y={y}");
        }
    }

    #[test]
    fn save_unique_avoids_existing_names() {
        let dir = TempDir::new().unwrap();
        let img = RgbImage::new(8, 8);

        let first = save_unique(&img, dir.path(), &mut StdRng::seed_from_u64(11)).unwrap();
        let second = save_unique(&img, dir.path(), &mut StdRng::seed_from_u64(11)).unwrap();
        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
    }

    #[test]
    fn renders_always_has_been() {
        let dir = TempDir::new().unwrap();
        let templates = dir.path().join("templates");
        let output = dir.path().join("out");
        fs::create_dir(&templates).unwrap();
        RgbImage::from_pixel(1200, 800, Rgb([20, 20, 60]))
            .save(templates.join("astronaut.png"))
            .unwrap();

        let renderer = MemeRenderer::new(&templates, &output, dir.path().join("no_font.ttf"));
        let path = renderer.render("astronaut.png", "Always has been").unwrap();

        assert_eq!(path.parent(), Some(output.as_path()));
        let name = path.file_name().unwrap().to_str().unwrap();
        let digits = name
            .strip_prefix("meme_")
            .and_then(|n| n.strip_suffix(".png"))
            .unwrap();
        assert_eq!(digits.len(), 5);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1200, 800));
    }

    #[test]
    fn renders_with_a_truetype_font() {
        let dir = TempDir::new().unwrap();
        RgbImage::from_pixel(1200, 800, Rgb([20, 20, 60]))
            .save(dir.path().join("drake.jpg"))
            .unwrap();

        let renderer = MemeRenderer::new(dir.path(), dir.path().join("out"), test_font());
        let path = renderer.render("drake.jpg", "Tabs or spaces").unwrap();
        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (1200, 800));
        assert!(decoded.pixels().any(|p| p.0 == TEXT_COLOR.0));
    }

    #[test]
    fn missing_template_renders_nothing() {
        let dir = TempDir::new().unwrap();
        let renderer = MemeRenderer::new(dir.path(), dir.path().join("out"), "arial.ttf");
        assert_eq!(renderer.render("ghost.jpg", "boo"), None);
    }
}
