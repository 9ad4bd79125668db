//! Последовательная генерация серии изображений
//!
//! Каждое изображение получает собственный ГПСЧ с зерном из
//! `(batch_seed, index)`, поэтому любое изображение серии можно повторить
//! отдельно. Ошибка записи одного изображения не останавливает серию;
//! фатальные ошибки (пустая категория и т.п.) останавливают.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Instant;

use crate::assets::AssetSource;
use crate::config::BatchConfig;
use crate::output::{SceneWriter, WrittenScene};
use crate::scene::{PlacementOutcome, Scene};
use crate::{ScatterError, SyntheticGenerator};

/// Успешно записанное изображение
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub index: usize,
    pub stem: String,
    pub counts: Vec<usize>,
    pub target_count: usize,
    pub outcome: PlacementOutcome,
}

/// Изображение, которое не удалось сгенерировать или записать
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedImage {
    pub index: usize,
    pub error: String,
}

/// Итог серии
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Базовое зерно серии
    pub seed: u64,
    pub generated: Vec<GeneratedImage>,
    pub failed: Vec<FailedImage>,
    /// Фатальная ошибка, на которой серия остановилась
    pub aborted: Option<FailedImage>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.aborted.is_none()
    }

    /// Сколько сцен закончились раньше цели
    pub fn exhausted_count(&self) -> usize {
        self.generated
            .iter()
            .filter(|g| matches!(g.outcome, PlacementOutcome::Exhausted { .. }))
            .count()
    }
}

/// Зерно изображения `index` в серии с базовым зерном `seed`
pub fn image_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

impl<A: AssetSource> SyntheticGenerator<A> {
    /// Генерация и запись серии изображений
    pub fn generate_batch(&self, batch: &BatchConfig) -> Result<BatchReport, ScatterError> {
        let seed = batch.seed.unwrap_or_else(|| rand::thread_rng().gen());
        log::info!(
            "Generating {} images into {} (seed {})",
            batch.image_count,
            batch.output_dir.display(),
            seed
        );

        fs::create_dir_all(&batch.output_dir)?;
        let writer = SceneWriter::new(&batch.output_dir)
            .with_prefix(batch.file_prefix.clone())
            .with_preview(batch.preview);

        let mut report = BatchReport {
            seed,
            ..Default::default()
        };

        for index in 0..batch.image_count {
            let start = Instant::now();
            let mut rng = StdRng::seed_from_u64(image_seed(seed, index));

            match self.generate_and_write(&writer, index, &mut rng) {
                Ok((scene, written)) => {
                    log::info!(
                        "Generated {} in {:.3} seconds",
                        written.image.display(),
                        start.elapsed().as_secs_f64()
                    );
                    report.generated.push(GeneratedImage {
                        index,
                        stem: written.stem,
                        counts: scene.counts,
                        target_count: scene.target_count,
                        outcome: scene.outcome,
                    });
                }
                Err(e) if e.is_fatal() => {
                    log::error!("Image {} aborted the batch: {}", index, e);
                    report.aborted = Some(FailedImage {
                        index,
                        error: e.to_string(),
                    });
                    break;
                }
                Err(e) => {
                    log::error!("Image {} failed: {}", index, e);
                    report.failed.push(FailedImage {
                        index,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    fn generate_and_write(
        &self,
        writer: &SceneWriter,
        index: usize,
        rng: &mut StdRng,
    ) -> Result<(Scene, WrittenScene), ScatterError> {
        let scene = self.generate_scene(rng)?;
        let written = writer.write(index, &scene)?;
        Ok((scene, written))
    }
}
