//! Модуль проверки перекрытия
//!
//! Область считается свободной, если сумма всех каналов всех пикселей блока
//! `object_size × object_size` строго меньше порога. Это грубая оценка
//! "почти прозрачно", а не честная проверка по альфа-каналу.
//!
//! Сумму можно получать двумя способами:
//! - полным перечитыванием буфера холста ([`RgbaImage`]);
//! - через двумерное дерево Фенвика ([`FenwickIndex`]), которое обновляется
//!   при каждой вставке объекта. Ответы совпадают, меняется только цена запроса.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::geometry::BoundingBox;

/// Порог суммы каналов для "пустой" области
pub const OVERLAP_PIXEL_THRESHOLD: u64 = 50_000;

/// Источник сумм каналов по квадратным блокам холста
pub trait RegionSum {
    /// Сумма всех каналов блока `size × size` с левым верхним углом
    /// `(left, top)`. `None`, если блок выходит за пределы холста.
    fn region_sum(&self, left: i32, top: i32, size: u32) -> Option<u64>;
}

/// Способ вычисления сумм для проверки перекрытия
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapIndex {
    /// Перечитывание буфера холста на каждый запрос, O(size²)
    #[default]
    Scan,
    /// Инкрементальное дерево Фенвика, O(log² n) на запрос
    Fenwick,
}

fn block_in_canvas(width: u32, height: u32, left: i32, top: i32, size: u32) -> bool {
    left >= 0
        && top >= 0
        && left as u64 + size as u64 <= width as u64
        && top as u64 + size as u64 <= height as u64
}

impl RegionSum for RgbaImage {
    fn region_sum(&self, left: i32, top: i32, size: u32) -> Option<u64> {
        let (width, height) = self.dimensions();
        if !block_in_canvas(width, height, left, top, size) {
            return None;
        }

        let raw = self.as_raw();
        let stride = width as usize * 4;
        let row_len = size as usize * 4;
        let mut offset = top as usize * stride + left as usize * 4;
        let mut sum = 0u64;

        for _ in 0..size {
            sum += raw[offset..offset + row_len].iter().map(|&c| c as u64).sum::<u64>();
            offset += stride;
        }

        Some(sum)
    }
}

/// Двумерное дерево Фенвика по суммам каналов пикселей
#[derive(Debug, Clone)]
pub struct FenwickIndex {
    width: u32,
    height: u32,
    tree: Vec<i64>,
}

impl FenwickIndex {
    /// Пустой индекс (полностью прозрачный холст)
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tree: vec![0; width as usize * height as usize],
        }
    }

    /// Индекс по существующему изображению
    pub fn from_image(img: &RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut index = Self::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels() {
            let sum = channel_sum(pixel.0);
            if sum != 0 {
                index.add(x, y, sum);
            }
        }
        index
    }

    /// Добавляет `delta` к значению пикселя `(x, y)`
    pub fn add(&mut self, x: u32, y: u32, delta: i64) {
        let w = self.width as usize;
        let mut i = y as usize + 1;
        while i <= self.height as usize {
            let mut j = x as usize + 1;
            while j <= w {
                self.tree[(i - 1) * w + (j - 1)] += delta;
                j += j & j.wrapping_neg();
            }
            i += i & i.wrapping_neg();
        }
    }

    /// Сумма по прямоугольнику `[0, x) × [0, y)`
    fn prefix(&self, x: u32, y: u32) -> i64 {
        let w = self.width as usize;
        let mut sum = 0;
        let mut i = y as usize;
        while i > 0 {
            let mut j = x as usize;
            while j > 0 {
                sum += self.tree[(i - 1) * w + (j - 1)];
                j -= j & j.wrapping_neg();
            }
            i -= i & i.wrapping_neg();
        }
        sum
    }

    /// Пересчёт прямоугольника после изменения пикселей: `before` хранит
    /// суммы каналов до изменения в построчном порядке.
    pub fn apply_block_change(&mut self, img: &RgbaImage, xs: Range<u32>, ys: Range<u32>, before: &[i64]) {
        let mut k = 0;
        for y in ys {
            for x in xs.clone() {
                let delta = channel_sum(img.get_pixel(x, y).0) - before[k];
                if delta != 0 {
                    self.add(x, y, delta);
                }
                k += 1;
            }
        }
    }
}

impl RegionSum for FenwickIndex {
    fn region_sum(&self, left: i32, top: i32, size: u32) -> Option<u64> {
        if !block_in_canvas(self.width, self.height, left, top, size) {
            return None;
        }
        let (x0, y0) = (left as u32, top as u32);
        let (x1, y1) = (x0 + size, y0 + size);
        let sum = self.prefix(x1, y1) - self.prefix(x0, y1) - self.prefix(x1, y0) + self.prefix(x0, y0);
        Some(sum.max(0) as u64)
    }
}

/// Сумма четырёх каналов пикселя
pub fn channel_sum(rgba: [u8; 4]) -> i64 {
    rgba.iter().map(|&c| c as i64).sum()
}

/// Детектор перекрытия объектов
#[derive(Debug, Clone)]
pub struct OverlapDetector {
    object_size: u32,
    threshold: u64,
}

impl OverlapDetector {
    /// Детектор со стандартным порогом
    pub fn new(object_size: u32) -> Self {
        Self::with_threshold(object_size, OVERLAP_PIXEL_THRESHOLD)
    }

    pub fn with_threshold(object_size: u32, threshold: u64) -> Self {
        Self {
            object_size,
            threshold,
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Свободна ли область под `bbox`. Блок вне холста свободным не бывает.
    pub fn is_region_empty<P: RegionSum + ?Sized>(&self, pixels: &P, bbox: &BoundingBox) -> bool {
        match pixels.region_sum(bbox.left, bbox.top, self.object_size) {
            Some(sum) => sum < self.threshold,
            None => false,
        }
    }
}
