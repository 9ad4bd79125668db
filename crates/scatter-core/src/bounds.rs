//! Проверка границ кандидата
//!
//! Кандидат должен целиком лежать в прямоугольнике холста (с отступом на
//! размер объекта) и его центр должен попадать в круг обрезки вокруг центра
//! холста.

use crate::geometry::BoundingBox;

/// Геометрический валидатор позиций
#[derive(Debug, Clone)]
pub struct BoundaryValidator {
    canvas_width: u32,
    canvas_height: u32,
    object_size: u32,
    boundary_radius: i64,
}

impl BoundaryValidator {
    /// Создание валидатора для квадратного холста с отступом `padding`
    pub fn new(canvas_size: u32, object_size: u32, padding: u32) -> Self {
        Self::with_dimensions(canvas_size, canvas_size, object_size, padding)
    }

    /// Создание валидатора для холста произвольных размеров.
    /// Радиус считается по ширине.
    pub fn with_dimensions(canvas_width: u32, canvas_height: u32, object_size: u32, padding: u32) -> Self {
        Self {
            canvas_width,
            canvas_height,
            object_size,
            boundary_radius: boundary_radius(canvas_width, padding),
        }
    }

    /// Радиус круга обрезки в пикселях
    pub fn boundary_radius(&self) -> i64 {
        self.boundary_radius
    }

    /// Центр холста (дробный, как при делении пополам)
    pub fn canvas_center(&self) -> (f64, f64) {
        (self.canvas_width as f64 / 2.0, self.canvas_height as f64 / 2.0)
    }

    /// Лежит ли кандидат в допустимой области
    pub fn is_in_bounds(&self, bbox: &BoundingBox) -> bool {
        let max_x = self.canvas_width as i64 - self.object_size as i64;
        let max_y = self.canvas_height as i64 - self.object_size as i64;
        let in_range = |v: i32, max: i64| (0..=max).contains(&(v as i64));

        let fits_horizontal = in_range(bbox.left, max_x) && in_range(bbox.right, max_x);
        let fits_vertical = in_range(bbox.top, max_y) && in_range(bbox.bottom, max_y);
        if !(fits_horizontal && fits_vertical) {
            return false;
        }

        let (cx, cy) = bbox.center(self.object_size);
        let (ix, iy) = self.canvas_center();
        let distance = (cx as f64 - ix).hypot(cy as f64 - iy);
        distance <= self.boundary_radius as f64
    }
}

/// `floor(size / 2) - padding`
pub fn boundary_radius(canvas_size: u32, padding: u32) -> i64 {
    (canvas_size / 2) as i64 - padding as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_radius() {
        assert_eq!(boundary_radius(500, 10), 240);
        assert_eq!(boundary_radius(501, 10), 240);
        assert_eq!(boundary_radius(20, 15), -5);
    }

    #[test]
    fn test_center_box_is_valid() {
        let validator = BoundaryValidator::new(500, 20, 10);
        let bbox = BoundingBox::from_center((250, 250), 20);
        assert!(validator.is_in_bounds(&bbox));
    }

    #[test]
    fn test_rectangular_margin() {
        let validator = BoundaryValidator::new(100, 10, 0);
        assert!(!validator.is_in_bounds(&BoundingBox::new(-1, 45, 9, 55)));
        assert!(!validator.is_in_bounds(&BoundingBox::new(45, 85, 55, 95)));
        // Все углы сверяются с одним пределом 100 - 10
        assert!(!validator.is_in_bounds(&BoundingBox::new(85, 45, 95, 55)));
        assert!(validator.is_in_bounds(&BoundingBox::new(80, 45, 90, 55)));
    }

    #[test]
    fn test_circular_crop() {
        let validator = BoundaryValidator::new(500, 20, 10);
        let corner = BoundingBox::new(0, 0, 20, 20);
        assert!(!validator.is_in_bounds(&corner));

        // Внутри прямоугольника, но центр на расстоянии ~240.4
        let diagonal = BoundingBox::from_center((420, 420), 20);
        assert!(!validator.is_in_bounds(&diagonal));

        // Ровно на окружности радиуса 240
        let on_circle = BoundingBox::from_center((250, 10), 20);
        assert!(validator.is_in_bounds(&on_circle));
    }

    #[test]
    fn test_invalid_sentinel_rejected() {
        let validator = BoundaryValidator::new(500, 18, 10);
        assert!(!validator.is_in_bounds(&BoundingBox::INVALID));
    }

    #[test]
    fn test_object_larger_than_circle() {
        let validator = BoundaryValidator::new(100, 90, 10);
        for x in -10..20 {
            for y in -10..20 {
                let bbox = BoundingBox::new(x, y, x + 90, y + 90);
                assert!(!validator.is_in_bounds(&bbox));
            }
        }
    }
}
