//! Generator of demo object and background folders
//!
//! Usage: cargo run -p scatter-core --example gen_assets
//! Then:  cargo run -p scatter-cli -- generate demo_assets/circles demo_assets/squares \
//!            demo_assets/triangles -b demo_assets/backgrounds

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut};
use imageproc::filter::gaussian_blur_f32;
use imageproc::point::Point;
use imageproc::rect::Rect;
use rand::Rng;
use std::fs;
use std::path::Path;

const VARIANTS: usize = 8;
const OBJECT_SIZE: u32 = 64;

fn main() {
    let output_dir = Path::new("demo_assets");
    if output_dir.exists() {
        fs::remove_dir_all(output_dir).unwrap();
    }

    println!("Generating demo assets in {:?}", output_dir);
    let mut rng = rand::thread_rng();
    let mut count = 0;

    for category in ["circles", "squares", "triangles"] {
        let dir = output_dir.join(category);
        fs::create_dir_all(&dir).unwrap();

        for i in 0..VARIANTS {
            let color = Rgba([rng.gen_range(64..=255), rng.gen_range(64..=255), rng.gen_range(64..=255), 255]);
            let mut img = RgbaImage::new(OBJECT_SIZE, OBJECT_SIZE);
            let half = OBJECT_SIZE as i32 / 2;

            match category {
                "circles" => draw_filled_circle_mut(&mut img, (half, half), rng.gen_range(20..half), color),
                "squares" => {
                    let side = rng.gen_range(32..OBJECT_SIZE);
                    let offset = ((OBJECT_SIZE - side) / 2) as i32;
                    draw_filled_rect_mut(&mut img, Rect::at(offset, offset).of_size(side, side), color);
                }
                _ => {
                    let apex = rng.gen_range(4..16);
                    let triangle = [
                        Point::new(half, apex),
                        Point::new(4, OBJECT_SIZE as i32 - 4),
                        Point::new(OBJECT_SIZE as i32 - 4, OBJECT_SIZE as i32 - 4),
                    ];
                    draw_polygon_mut(&mut img, &triangle, color);
                }
            }

            img.save(dir.join(format!("{category}_{i}.png"))).unwrap();
            count += 1;
        }
    }

    // Backgrounds: blurred noise over a vertical gradient
    let bg_dir = output_dir.join("backgrounds");
    fs::create_dir_all(&bg_dir).unwrap();
    for i in 0..4 {
        let size = 256u32;
        let mut bg = RgbImage::new(size, size);
        for (x, y, p) in bg.enumerate_pixels_mut() {
            let base = (y as f32 / size as f32 * 120.0) as u8;
            let noise: u8 = rng.gen_range(0..60);
            *p = Rgb([base / 2 + noise, base + noise / 2, 80 + (x % 32) as u8]);
        }
        let blurred = gaussian_blur_f32(&bg, 3.0);
        blurred.save(bg_dir.join(format!("background_{i}.png"))).unwrap();
        count += 1;
    }

    println!("Generated {} images.", count);
}
