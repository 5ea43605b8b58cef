use std::collections::HashMap;

use shared::domain::{ImageId, ImagePatch, ImageRecord};

use crate::error::GalleryError;

/// Everything the gallery view reads, changed only through the transition
/// methods below so that images, order and load status always move together.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryState {
    images: Vec<ImageRecord>,
    display_order: Vec<ImageId>,
    is_loading: bool,
    error: Option<GalleryError>,
}

impl GalleryState {
    pub fn new() -> Self {
        Self {
            images: Vec::new(),
            display_order: Vec::new(),
            is_loading: true,
            error: None,
        }
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    pub fn display_order(&self) -> &[ImageId] {
        &self.display_order
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&GalleryError> {
        self.error.as_ref()
    }

    pub fn get(&self, id: ImageId) -> Option<&ImageRecord> {
        self.images.iter().find(|image| image.id == id)
    }

    pub fn contains(&self, id: ImageId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn begin_loading(&mut self) {
        self.is_loading = true;
    }

    /// Takes the fetched rows as the gallery, in fetch order.
    pub(crate) fn adopt(&mut self, rows: Vec<ImageRecord>) {
        self.display_order = rows.iter().map(|row| row.id).collect();
        self.images = rows;
        self.is_loading = false;
        self.error = None;
    }

    /// Replaces the gallery with the fallback set. `error` is kept for
    /// display only; the state is usable either way.
    pub(crate) fn fall_back(&mut self, defaults: Vec<ImageRecord>, error: Option<GalleryError>) {
        self.display_order = defaults.iter().map(|row| row.id).collect();
        self.images = defaults;
        self.is_loading = false;
        self.error = error;
    }

    pub(crate) fn insert(&mut self, record: ImageRecord) {
        self.display_order.push(record.id);
        self.images.push(record);
    }

    /// Returns false when the id is no longer held locally.
    pub(crate) fn apply_patch(&mut self, id: ImageId, patch: &ImagePatch) -> bool {
        match self.images.iter_mut().find(|image| image.id == id) {
            Some(image) => {
                patch.apply_to(image);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, id: ImageId) -> Option<ImageRecord> {
        let index = self.images.iter().position(|image| image.id == id)?;
        self.display_order.retain(|ordered| *ordered != id);
        Some(self.images.remove(index))
    }

    pub(crate) fn set_order(&mut self, order: Vec<ImageId>) {
        self.display_order = order;
    }

    /// Images ordered by their first position in the display order. Images
    /// missing from the order follow, in the order they were added.
    pub fn sorted_images(&self) -> Vec<ImageRecord> {
        let mut positions: HashMap<ImageId, usize> = HashMap::with_capacity(self.display_order.len());
        for (position, id) in self.display_order.iter().enumerate() {
            positions.entry(*id).or_insert(position);
        }

        let mut sorted = self.images.clone();
        // sort_by_key is stable, so unordered images keep insertion order.
        sorted.sort_by_key(|image| match positions.get(&image.id) {
            Some(position) => (0, *position),
            None => (1, 0),
        });
        sorted
    }
}

impl Default for GalleryState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
