//! Модуль поиска позиции для следующего объекта
//!
//! Два способа получить кандидата:
//! - "телепорт": случайная точка внутри круга обрезки;
//! - "шаг": сдвиг предыдущего бокса на `object_size + OBJECT_SPACING` в одном
//!   из восьми направлений.
//!
//! Доля телепортов задаётся `separation_chance = 1 - cluster_idx`: чем она
//! меньше, тем плотнее объекты цепляются друг за друга.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::bounds::BoundaryValidator;
use crate::geometry::{compass_directions, random_point_in_disc, round_half_even, BoundingBox};
use crate::overlap::{OverlapDetector, RegionSum};

/// Зазор между соседними объектами при шаге, px
pub const OBJECT_SPACING: u32 = 3;

/// Лимит повторных попыток поиска позиции
pub const RANDOM_LOCATION_RETRIES_LIMIT: usize = 300;

/// Поиск позиции по границам и перекрытию
#[derive(Debug, Clone)]
pub struct PlacementSearch {
    validator: BoundaryValidator,
    detector: OverlapDetector,
    object_size: u32,
    canvas_center: (i32, i32),
    boundary_radius: u32,
    step_distance: f64,
    retry_limit: usize,
}

impl PlacementSearch {
    /// Поиск для квадратного холста `canvas_size` с отступом `padding`
    pub fn new(canvas_size: u32, object_size: u32, padding: u32) -> Self {
        let validator = BoundaryValidator::new(canvas_size, object_size, padding);
        let half = round_half_even(canvas_size as f64 / 2.0);
        Self {
            boundary_radius: validator.boundary_radius().max(0) as u32,
            validator,
            detector: OverlapDetector::new(object_size),
            object_size,
            canvas_center: (half, half),
            step_distance: (object_size + OBJECT_SPACING) as f64,
            retry_limit: RANDOM_LOCATION_RETRIES_LIMIT,
        }
    }

    pub fn with_retry_limit(mut self, retry_limit: usize) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    pub fn with_detector(mut self, detector: OverlapDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn validator(&self) -> &BoundaryValidator {
        &self.validator
    }

    pub fn detector(&self) -> &OverlapDetector {
        &self.detector
    }

    /// Кандидат в границах и на свободном месте
    pub fn is_valid<P: RegionSum + ?Sized>(&self, pixels: &P, bbox: &BoundingBox) -> bool {
        self.validator.is_in_bounds(bbox) && self.detector.is_region_empty(pixels, bbox)
    }

    fn teleport<R: Rng + ?Sized>(&self, rng: &mut R) -> BoundingBox {
        let center = random_point_in_disc(self.canvas_center, self.boundary_radius, rng);
        BoundingBox::from_center(center, self.object_size)
    }

    /// Поиск позиции для очередного объекта.
    ///
    /// `previous`: бокс предыдущего объекта (`None` для первого объекта сцены),
    /// `pixels`: состояние холста на момент вызова. `None` в ответе означает,
    /// что лимит попыток исчерпан; это штатное завершение, а не ошибка.
    pub fn find_location<P, R>(
        &self,
        previous: Option<BoundingBox>,
        pixels: &P,
        separation_chance: f64,
        rng: &mut R,
    ) -> Option<BoundingBox>
    where
        P: RegionSum + ?Sized,
        R: Rng + ?Sized,
    {
        // Без предыдущего бокса шагать не от чего
        let mut directions = if previous.is_some() {
            compass_directions()
        } else {
            Vec::new()
        };

        let draw: f64 = rng.gen();
        let mut candidate = match previous {
            Some(prev) if draw >= separation_chance => {
                directions.shuffle(rng);
                match directions.pop() {
                    Some(angle) => prev.translate_polar(self.step_distance, angle),
                    None => self.teleport(rng),
                }
            }
            _ => self.teleport(rng),
        };

        let mut retries = 0;
        while !self.is_valid(pixels, &candidate) {
            if retries >= self.retry_limit {
                log::debug!("No free location after {} retries", retries);
                return None;
            }
            candidate = match (previous, directions.pop()) {
                (Some(prev), Some(angle)) => prev.translate_polar(self.step_distance, angle),
                _ => self.teleport(rng),
            };
            retries += 1;
        }

        log::trace!("Location {:?} accepted after {} retries", candidate, retries);
        Some(candidate)
    }
}
