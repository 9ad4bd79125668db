//! Источники изображений объектов и фонов
//!
//! Ядро размещения не знает, откуда берутся картинки: оно просит у
//! [`AssetSource`] уже декодированный и приведённый к нужному размеру RGBA.
//! Есть две реализации:
//! - [`DirectoryAssets`]: каталог на категорию, файлы читаются с диска;
//! - [`MemoryAssets`]: заранее декодированные изображения (WASM, тесты).

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use rand::seq::SliceRandom;
use rand::RngCore;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ScatterError;

/// Фильтр масштабирования объектов и фонов
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Поставщик изображений для генерации сцены
pub trait AssetSource {
    /// Количество категорий объектов
    fn category_count(&self) -> usize;

    /// Случайный объект категории `category`, приведённый к `size × size`
    fn load_object(&self, category: usize, size: u32, rng: &mut dyn RngCore) -> Result<RgbaImage, ScatterError>;

    /// Случайный фон размера `width × height`, если фоны заданы
    fn load_background(&self, width: u32, height: u32, rng: &mut dyn RngCore)
        -> Result<Option<RgbaImage>, ScatterError>;
}

/// Список обычных файлов каталога, отсортированный по пути
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, ScatterError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn decode_resized(path: &Path, width: u32, height: u32) -> Result<RgbaImage, ScatterError> {
    let img = image::open(path).map_err(|e| ScatterError::Decode {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(img.resize_exact(width, height, RESIZE_FILTER).to_rgba8())
}

/// Изображения из каталогов: по каталогу на категорию
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    categories: Vec<Vec<PathBuf>>,
    backgrounds: Option<Vec<PathBuf>>,
}

impl DirectoryAssets {
    /// Сканирование каталогов. Порядок `object_dirs` задаёт индексы категорий.
    pub fn open<P: AsRef<Path>>(object_dirs: &[P], backgrounds_dir: Option<&Path>) -> Result<Self, ScatterError> {
        if object_dirs.is_empty() {
            return Err(ScatterError::Config("no object directories provided".into()));
        }

        let categories = object_dirs
            .iter()
            .map(|dir| list_files(dir.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        for (idx, (dir, files)) in object_dirs.iter().zip(&categories).enumerate() {
            log::debug!("Category {} ({}): {} files", idx, dir.as_ref().display(), files.len());
        }

        let backgrounds = backgrounds_dir.map(list_files).transpose()?;
        if let Some(bg) = &backgrounds {
            log::debug!("Backgrounds: {} files", bg.len());
        }

        Ok(Self {
            categories,
            backgrounds,
        })
    }

    /// Файлы категории
    pub fn category_files(&self, category: usize) -> Option<&[PathBuf]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    pub fn has_backgrounds(&self) -> bool {
        self.backgrounds.is_some()
    }
}

impl AssetSource for DirectoryAssets {
    fn category_count(&self) -> usize {
        self.categories.len()
    }

    fn load_object(&self, category: usize, size: u32, rng: &mut dyn RngCore) -> Result<RgbaImage, ScatterError> {
        let files = self
            .categories
            .get(category)
            .ok_or(ScatterError::UnknownCategory(category))?;
        let path = files.choose(rng).ok_or(ScatterError::EmptyCategory(category))?;
        decode_resized(path, size, size)
    }

    fn load_background(
        &self,
        width: u32,
        height: u32,
        rng: &mut dyn RngCore,
    ) -> Result<Option<RgbaImage>, ScatterError> {
        let Some(files) = &self.backgrounds else {
            return Ok(None);
        };
        let path = files.choose(rng).ok_or(ScatterError::NoBackgrounds)?;
        decode_resized(path, width, height).map(Some)
    }
}

/// Заранее декодированные изображения
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    categories: Vec<Vec<DynamicImage>>,
    backgrounds: Vec<DynamicImage>,
}

impl MemoryAssets {
    /// `category_count` пустых категорий
    pub fn new(category_count: usize) -> Self {
        Self {
            categories: vec![Vec::new(); category_count],
            backgrounds: Vec::new(),
        }
    }

    pub fn from_categories(categories: Vec<Vec<DynamicImage>>) -> Self {
        Self {
            categories,
            backgrounds: Vec::new(),
        }
    }

    /// Добавление объекта; недостающие категории создаются пустыми
    pub fn add_object(&mut self, category: usize, img: DynamicImage) {
        if self.categories.len() <= category {
            self.categories.resize_with(category + 1, Vec::new);
        }
        self.categories[category].push(img);
    }

    pub fn add_background(&mut self, img: DynamicImage) {
        self.backgrounds.push(img);
    }
}

impl AssetSource for MemoryAssets {
    fn category_count(&self) -> usize {
        self.categories.len()
    }

    fn load_object(&self, category: usize, size: u32, rng: &mut dyn RngCore) -> Result<RgbaImage, ScatterError> {
        let pool = self
            .categories
            .get(category)
            .ok_or(ScatterError::UnknownCategory(category))?;
        let img = pool.choose(rng).ok_or(ScatterError::EmptyCategory(category))?;
        Ok(img.resize_exact(size, size, RESIZE_FILTER).to_rgba8())
    }

    fn load_background(
        &self,
        width: u32,
        height: u32,
        rng: &mut dyn RngCore,
    ) -> Result<Option<RgbaImage>, ScatterError> {
        Ok(self
            .backgrounds
            .choose(rng)
            .map(|img| img.resize_exact(width, height, RESIZE_FILTER).to_rgba8()))
    }
}
