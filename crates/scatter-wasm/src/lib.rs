//! WASM bindings для генератора сцен
//!
//! Предоставляет JavaScript API: объекты и фон передаются байтами
//! (PNG, JPEG), результат возвращается как PNG или `ImageData`.

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbaImage};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use scatter_core::{
    AssetSource, CategoryRatios, GeneratorConfig, MemoryAssets, PlacementOutcome, ScatterError,
    Scene, SceneComposer,
};
use std::io::Cursor;
use wasm_bindgen::prelude::*;
use wasm_bindgen::Clamped;

/// Инициализация логирования и panic hook
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("Scatter WASM module initialized");
}

/// Объекты по категориям и не более одного фона
#[derive(Default)]
struct BrowserAssets {
    objects: MemoryAssets,
    background: Option<DynamicImage>,
}

impl AssetSource for BrowserAssets {
    fn category_count(&self) -> usize {
        self.objects.category_count()
    }

    fn load_object(&self, category: usize, size: u32, rng: &mut dyn RngCore) -> Result<RgbaImage, ScatterError> {
        self.objects.load_object(category, size, rng)
    }

    fn load_background(
        &self,
        width: u32,
        height: u32,
        _rng: &mut dyn RngCore,
    ) -> Result<Option<RgbaImage>, ScatterError> {
        Ok(self
            .background
            .as_ref()
            .map(|img| img.resize_exact(width, height, FilterType::CatmullRom).to_rgba8()))
    }
}

fn js_error(e: impl ToString) -> JsError {
    JsError::new(&e.to_string())
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, JsError> {
    image::load_from_memory(bytes).map_err(js_error)
}

/// JavaScript-доступный генератор
#[wasm_bindgen]
pub struct WasmScatterGenerator {
    config: GeneratorConfig,
    assets: BrowserAssets,
}

#[wasm_bindgen]
impl WasmScatterGenerator {
    /// Генератор с настройками по умолчанию
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            config: GeneratorConfig::default(),
            assets: BrowserAssets::default(),
        }
    }

    /// Генератор с пользовательскими настройками
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(
        object_size: u32,
        image_size: u32,
        image_padding: u32,
        min_objects: usize,
        max_objects: usize,
        cluster_idx: f64,
    ) -> Result<WasmScatterGenerator, JsError> {
        let config = GeneratorConfig {
            object_size,
            image_size,
            image_padding,
            min_objects,
            max_objects,
            cluster_idx,
            ..Default::default()
        };
        config.validate().map_err(js_error)?;
        Ok(Self {
            config,
            assets: BrowserAssets::default(),
        })
    }

    /// Веса категорий, по одному на категорию
    #[wasm_bindgen(js_name = setRatios)]
    pub fn set_ratios(&mut self, ratios: Vec<f64>) {
        self.config.scatter_ratios = Some(ratios);
    }

    /// Добавление изображения объекта в категорию
    ///
    /// @param category - Номер категории, начиная с 0
    /// @param image_data - Uint8Array с данными изображения
    #[wasm_bindgen(js_name = addObject)]
    pub fn add_object(&mut self, category: usize, image_data: &[u8]) -> Result<(), JsError> {
        let img = decode(image_data)?;
        self.assets.objects.add_object(category, img);
        Ok(())
    }

    /// Фоновое изображение; заменяет предыдущее
    #[wasm_bindgen(js_name = setBackground)]
    pub fn set_background(&mut self, image_data: &[u8]) -> Result<(), JsError> {
        self.assets.background = Some(decode(image_data)?);
        Ok(())
    }

    #[wasm_bindgen(js_name = clearBackground)]
    pub fn clear_background(&mut self) {
        self.assets.background = None;
    }

    #[wasm_bindgen(js_name = categoryCount)]
    pub fn category_count(&self) -> usize {
        self.assets.category_count()
    }

    /// Генерация сцены
    ///
    /// @param seed - Зерно ГПСЧ; одинаковое зерно даёт одинаковую сцену
    /// @returns Object { png, annotations, counts, exhausted }
    pub fn generate(&self, seed: u32) -> Result<JsValue, JsError> {
        let scene = self.compose(seed)?;

        let mut png = Vec::new();
        scene
            .image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(js_error)?;

        let result = js_sys::Object::new();
        let set = |key: &str, value: JsValue| {
            js_sys::Reflect::set(&result, &JsValue::from_str(key), &value)
                .map(|_| ())
                .map_err(|_| JsError::new("Failed to build result object"))
        };
        set("png", js_sys::Uint8Array::from(png.as_slice()).into())?;
        set("annotations", JsValue::from_str(&scene.annotation_text()))?;
        set("counts", serde_wasm_bindgen::to_value(&scene.counts).map_err(js_error)?)?;
        set(
            "exhausted",
            JsValue::from_bool(matches!(scene.outcome, PlacementOutcome::Exhausted { .. })),
        )?;
        Ok(result.into())
    }

    /// Генерация сцены сразу в `ImageData` для canvas.putImageData()
    #[wasm_bindgen(js_name = generateImageData)]
    pub fn generate_image_data(&self, seed: u32) -> Result<web_sys::ImageData, JsError> {
        let scene = self.compose(seed)?;
        let (width, height) = scene.image.dimensions();
        web_sys::ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(scene.image.as_raw().as_slice()),
            width,
            height,
        )
        .map_err(|_| JsError::new("Failed to create ImageData"))
    }
}

impl WasmScatterGenerator {
    fn compose(&self, seed: u32) -> Result<Scene, JsError> {
        let ratios = CategoryRatios::resolve(self.config.scatter_ratios.clone(), self.assets.category_count())
            .map_err(js_error)?;
        let composer = SceneComposer::new(self.config.clone(), ratios).map_err(js_error)?;
        let mut rng = StdRng::seed_from_u64(u64::from(seed));
        let scene = composer.compose(&self.assets, &mut rng).map_err(js_error)?;
        log::info!(
            "Scene with {} of {} objects generated",
            scene.placed(),
            scene.target_count
        );
        Ok(scene)
    }
}

impl Default for WasmScatterGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Информация о версии
#[wasm_bindgen(js_name = version)]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
