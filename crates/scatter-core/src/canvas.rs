//! Слой объектов одной сцены: RGBA-буфер и, по выбору, индекс сумм
//!
//! Вставка идёт по маске из альфа-канала объекта: каждый канал результата,
//! включая альфу, равен `(dst * (255 - a) + src * a) / 255` с округлением.

use image::RgbaImage;

use crate::geometry::BoundingBox;
use crate::overlap::{channel_sum, FenwickIndex, OverlapIndex, RegionSum};

/// Прозрачный холст, на который вставляются объекты
#[derive(Debug, Clone)]
pub struct Canvas {
    layer: RgbaImage,
    index: Option<FenwickIndex>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, overlap_index: OverlapIndex) -> Self {
        let index = match overlap_index {
            OverlapIndex::Scan => None,
            OverlapIndex::Fenwick => Some(FenwickIndex::new(width, height)),
        };
        Self {
            layer: RgbaImage::new(width, height),
            index,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.layer.dimensions()
    }

    pub fn layer(&self) -> &RgbaImage {
        &self.layer
    }

    pub fn into_layer(self) -> RgbaImage {
        self.layer
    }

    /// Вставка `object` левым верхним углом в начало бокса.
    /// Всё, что выходит за холст, отсекается.
    pub fn paste(&mut self, object: &RgbaImage, bbox: &BoundingBox) {
        let (width, height) = self.layer.dimensions();
        let x0 = bbox.left.max(0) as u32;
        let y0 = bbox.top.max(0) as u32;
        let x1 = (bbox.left as i64 + object.width() as i64).clamp(0, width as i64) as u32;
        let y1 = (bbox.top as i64 + object.height() as i64).clamp(0, height as i64) as u32;

        let before: Vec<i64> = match self.index {
            Some(_) => (y0..y1)
                .flat_map(|y| (x0..x1).map(move |x| (x, y)))
                .map(|(x, y)| channel_sum(self.layer.get_pixel(x, y).0))
                .collect(),
            None => Vec::new(),
        };

        paste_masked(&mut self.layer, object, bbox.left as i64, bbox.top as i64);

        if let Some(index) = self.index.as_mut() {
            index.apply_block_change(&self.layer, x0..x1, y0..y1, &before);
        }
    }
}

/// Целочисленное деление на 255 с округлением до ближайшего
fn div255(value: u32) -> u8 {
    let tmp = value + 128;
    (((tmp >> 8) + tmp) >> 8) as u8
}

/// Вставка `src` в `dst` по маске из собственного альфа-канала `src`.
///
/// В отличие от `imageops::overlay`, альфа результата смешивается так же,
/// как цветовые каналы, поэтому полупрозрачные края остаются полупрозрачными.
pub fn paste_masked(dst: &mut RgbaImage, src: &RgbaImage, left: i64, top: i64) {
    let (width, height) = dst.dimensions();
    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = (left + src.width() as i64).min(width as i64);
    let y1 = (top + src.height() as i64).min(height as i64);

    for y in y0..y1 {
        for x in x0..x1 {
            let s = src.get_pixel((x - left) as u32, (y - top) as u32).0;
            let mask = s[3] as u32;
            if mask == 0 {
                continue;
            }
            let d = dst.get_pixel_mut(x as u32, y as u32);
            for c in 0..4 {
                d.0[c] = div255(d.0[c] as u32 * (255 - mask) + s[c] as u32 * mask);
            }
        }
    }
}

impl RegionSum for Canvas {
    fn region_sum(&self, left: i32, top: i32, size: u32) -> Option<u64> {
        match &self.index {
            Some(index) => index.region_sum(left, top, size),
            None => self.layer.region_sum(left, top, size),
        }
    }
}
