use chrono::{DateTime, Utc};
use shared::domain::{ImageId, ImageRecord};

const CLINIC_IMAGES: [(&str, &str, &str); 7] = [
    (
        "/lovable-uploads/a08d0445-8225-402a-b810-89ee25b6c797.png",
        "Reception Area",
        "Comfortable waiting area with educational posters",
    ),
    (
        "/lovable-uploads/633b1e49-2697-4a52-b9ce-dab2b0697470.png",
        "Waiting Area Seating",
        "Spacious and comfortable seating arrangements",
    ),
    (
        "/lovable-uploads/84db2222-4685-4d10-a3a8-261d22ffd9cf.png",
        "Clinic Interior",
        "Well-lit and organized reception area",
    ),
    (
        "/lovable-uploads/6afce018-fb88-41f5-9ab6-fd592164cbf4.png",
        "Patient Lounge",
        "Comfortable seating area for patients",
    ),
    (
        "/lovable-uploads/c11fd1b0-c517-495f-b9fe-27cdd1d92b52.png",
        "Ultrasound Examination",
        "State-of-the-art ultrasound services",
    ),
    (
        "/lovable-uploads/9cee8b7e-a312-406f-9026-cd834d82d4fc.png",
        "Laser Surgery",
        "Advanced MEL 80 laser equipment",
    ),
    (
        "/lovable-uploads/c70188d0-b50b-4be3-9031-d2cb46c95428.png",
        "Dr. Nisha Bhatnagar",
        "Our expert gynecologist",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultImage {
    pub src: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl DefaultImage {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            title: None,
            description: None,
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Images shown when the table is empty or unreachable. They are never
/// written to the table and carry ids `-1, -2, ...` in list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackImages {
    images: Vec<DefaultImage>,
}

impl FallbackImages {
    pub fn new(images: Vec<DefaultImage>) -> Self {
        Self { images }
    }

    pub fn clinic() -> Self {
        Self::new(
            CLINIC_IMAGES
                .iter()
                .map(|(src, title, description)| {
                    DefaultImage::new(*src).titled(*title).described(*description)
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn records(&self, created_at: DateTime<Utc>) -> Vec<ImageRecord> {
        self.images
            .iter()
            .enumerate()
            .map(|(index, image)| {
                let position = index as i64 + 1;
                ImageRecord {
                    id: ImageId(-position),
                    src: image.src.clone(),
                    title: image
                        .title
                        .clone()
                        .filter(|title| !title.is_empty())
                        .unwrap_or_else(|| format!("Clinic Image {position}")),
                    description: image.description.clone().unwrap_or_default(),
                    created_at,
                }
            })
            .collect()
    }
}
