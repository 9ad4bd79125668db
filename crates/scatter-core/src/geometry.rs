//! Геометрия боксов и случайных точек на холсте

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_4, TAU};

/// Бокс в пикселях холста; `left`/`top` входят в бокс
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    /// Зарезервированное значение "позиция не найдена"
    pub const INVALID: BoundingBox = BoundingBox {
        left: -1,
        top: -1,
        right: -1,
        bottom: -1,
    };

    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn is_invalid(&self) -> bool {
        *self == Self::INVALID
    }

    /// Квадрат со стороной `size` с центром в `center`
    pub fn from_center(center: (i32, i32), size: u32) -> Self {
        let half = size as f64 / 2.0;
        let (cx, cy) = (center.0 as f64, center.1 as f64);
        Self {
            left: round_half_even(cx - half),
            top: round_half_even(cy - half),
            right: round_half_even(cx + half),
            bottom: round_half_even(cy + half),
        }
    }

    /// Центр по левому верхнему углу и номинальному размеру объекта
    pub fn center(&self, size: u32) -> (i32, i32) {
        let half = size as f64 / 2.0;
        (
            round_half_even(self.left as f64 + half),
            round_half_even(self.top as f64 + half),
        )
    }

    /// Сдвиг обоих углов на одинаковый полярный вектор; размер сохраняется
    pub fn translate_polar(&self, distance: f64, angle: f64) -> Self {
        let dx = distance * angle.sin();
        let dy = distance * angle.cos();
        Self {
            left: round_half_even(self.left as f64 + dx),
            top: round_half_even(self.top as f64 + dy),
            right: round_half_even(self.right as f64 + dx),
            bottom: round_half_even(self.bottom as f64 + dy),
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Восемь направлений `i * pi/4` для `i = 1..=8`
pub fn compass_directions() -> Vec<f64> {
    (1..=8).map(|i| i as f64 * FRAC_PI_4).collect()
}

/// Случайная точка не дальше `radius` от `center`.
///
/// Радиус берётся равномерно, а не пропорционально площади, поэтому точки
/// гуще у центра: половина из них попадает в круг радиуса `radius / 2`.
pub fn random_point_in_disc<R: Rng + ?Sized>(center: (i32, i32), radius: u32, rng: &mut R) -> (i32, i32) {
    let r = if radius == 0 {
        0.0
    } else {
        rng.gen_range(0..radius) as f64
    };
    let angle = rng.gen::<f64>() * TAU;
    (
        round_half_even(center.0 as f64 + r * angle.sin()),
        round_half_even(center.1 as f64 + r * angle.cos()),
    )
}

/// Банковское округление (половина к чётному) для всех координат
pub fn round_half_even(value: f64) -> i32 {
    value.round_ties_even() as i32
}
