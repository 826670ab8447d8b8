use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::docker::{self, CancelToken, DockerClient, ImageSummary, ResourceType};
use crate::format::{format_created, format_size, short_id};
use crate::resource::{Operation, Resource, ResourceKind, ResourceManager};

pub struct Images;

pub type ImageManager = ResourceManager<Images>;

impl ResourceKind for Images {
    type Item = ImageSummary;

    const TYPE: ResourceType = ResourceType::Image;
    const DEFAULT_TTL: Duration = Duration::from_secs(60);

    fn load(client: &dyn DockerClient) -> docker::Result<Vec<ImageSummary>> {
        client.list_images()
    }
}

impl Resource for ImageSummary {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches_search(&self, query: &str) -> bool {
        self.repo_tag()
            .is_some_and(|t| t.to_lowercase().contains(query))
            || short_id(&self.id).to_lowercase().contains(query)
            || size_matches(self.size_bytes, query)
    }

    fn matches_filter(&self, key: &str, value: &str) -> bool {
        match key {
            "size" => size_matches(self.size_bytes, value),
            "tag" => self
                .repo_tag()
                .is_some_and(|t| t.to_lowercase().contains(value)),
            _ => true,
        }
    }
}

/// Match against the displayed size (`41.2 mb`) or the raw byte count.
fn size_matches(bytes: u64, query: &str) -> bool {
    format_size(bytes).to_lowercase().contains(query) || bytes.to_string().contains(query)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageCounts {
    pub total: usize,
    pub dangling: usize,
    pub total_size: u64,
}

impl ResourceManager<Images> {
    /// Pull `name` in the background, streaming progress lines as
    /// `Progress` events. Cancel through the returned token.
    pub fn pull(&mut self, name: &str) -> CancelToken {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let image = name.trim().to_string();
        self.run_operation(Operation::Pull, image.clone(), move |c, on_line| {
            c.pull_image(&image, &token, on_line)?;
            Ok(format!("pulled {image}"))
        });
        cancel
    }

    pub fn tag(&mut self, id: &str, repository: &str, tag: &str) {
        let id = id.to_string();
        let repository = repository.trim().to_string();
        let tag = match tag.trim() {
            "" => "latest".to_string(),
            t => t.to_string(),
        };
        let target = format!("{repository}:{tag}");
        self.run_operation(Operation::Tag, target.clone(), move |c, _| {
            c.tag_image(&id, &repository, &tag)?;
            Ok(format!("tagged {} as {target}", short_id(&id)))
        });
    }

    pub fn counts(&self) -> ImageCounts {
        ImageCounts {
            total: self.resources().len(),
            dangling: self.count(ImageSummary::is_dangling),
            total_size: self.resources().iter().map(|i| i.size_bytes).sum(),
        }
    }

    pub fn rows(&self, now: DateTime<Utc>) -> Vec<ImageRow> {
        self.filtered()
            .iter()
            .map(|i| ImageRow::new(i, now))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRow {
    pub id: String,
    pub short_id: String,
    pub repository: String,
    pub tag: String,
    pub size: String,
    pub created: String,
    pub dangling: bool,
}

impl ImageRow {
    pub fn new(i: &ImageSummary, now: DateTime<Utc>) -> Self {
        Self {
            id: i.id.clone(),
            short_id: short_id(&i.id).to_string(),
            repository: i.repository.clone(),
            tag: i.tag.clone(),
            size: format_size(i.size_bytes),
            created: format_created(i.created, now),
            dangling: i.is_dangling(),
        }
    }
}
