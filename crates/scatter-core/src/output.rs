//! Запись результатов сцены на диск
//!
//! На каждую сцену: PNG, текстовый файл аннотаций YOLO и, по запросу,
//! GIF-анимация размещения и превью с нарисованными боксами.

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::scene::Scene;
use crate::ScatterError;

/// Задержка между кадрами анимации, мс
pub const GIF_FRAME_DELAY_MS: u32 = 20;

/// Цвета рамок превью по категориям (по кругу)
const PREVIEW_PALETTE: [[u8; 4]; 6] = [
    [255, 64, 64, 255],
    [64, 200, 64, 255],
    [64, 128, 255, 255],
    [255, 200, 0, 255],
    [200, 64, 255, 255],
    [0, 220, 220, 255],
];

/// Пути записанных файлов
#[derive(Debug, Clone)]
pub struct WrittenScene {
    pub stem: String,
    pub image: PathBuf,
    pub annotations: PathBuf,
    pub animation: Option<PathBuf>,
    pub preview: Option<PathBuf>,
}

/// Запись сцен в каталог
#[derive(Debug, Clone)]
pub struct SceneWriter {
    output_dir: PathBuf,
    file_prefix: String,
    preview: bool,
}

impl SceneWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_prefix: String::new(),
            preview: false,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Запись сцены с номером `index`
    pub fn write(&self, index: usize, scene: &Scene) -> Result<WrittenScene, ScatterError> {
        let stem = scene.file_stem(index, &self.file_prefix);
        let path_for = |suffix: &str| self.output_dir.join(format!("{stem}{suffix}"));

        let animation = if scene.frames.is_empty() {
            None
        } else {
            let path = path_for(".gif");
            write_animation(&path, &scene.frames)?;
            Some(path)
        };

        let image = path_for(".png");
        scene.image.save(&image)?;

        let annotations = path_for(".txt");
        fs::write(&annotations, scene.annotation_text())?;

        let preview = if self.preview {
            let path = path_for(".preview.png");
            render_preview(scene).save(&path)?;
            Some(path)
        } else {
            None
        };

        Ok(WrittenScene {
            stem,
            image,
            annotations,
            animation,
            preview,
        })
    }
}

/// Бесконечно повторяющаяся GIF-анимация из кадров
pub fn write_animation(path: &Path, frames: &[RgbaImage]) -> Result<(), ScatterError> {
    let file = BufWriter::new(File::create(path)?);
    let mut encoder = GifEncoder::new_with_speed(file, 10);
    encoder.set_repeat(Repeat::Infinite)?;
    let delay = Delay::from_numer_denom_ms(GIF_FRAME_DELAY_MS, 1);
    encoder.encode_frames(
        frames
            .iter()
            .map(|frame| Frame::from_parts(frame.clone(), 0, 0, delay)),
    )?;
    Ok(())
}

/// Копия изображения с рамками вокруг каждого размещённого объекта
pub fn render_preview(scene: &Scene) -> RgbaImage {
    let mut preview = scene.image.clone();
    for (ann, bbox) in scene.annotations.iter().zip(&scene.boxes) {
        let color = PREVIEW_PALETTE[ann.category % PREVIEW_PALETTE.len()];
        let width = bbox.width().max(1) as u32;
        let height = bbox.height().max(1) as u32;
        let rect = Rect::at(bbox.left, bbox.top).of_size(width, height);
        draw_hollow_rect_mut(&mut preview, rect, Rgba(color));
    }
    preview
}
