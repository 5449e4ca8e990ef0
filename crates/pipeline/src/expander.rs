//! Permutation expander: every media × headline × body combination becomes
//! one ad specification.

use std::collections::HashSet;

use adlaunch_core::types::{non_empty_entries, AdSpecification, CreativeTemplate, MediaAsset, MediaKind};
use adlaunch_core::{LaunchError, LaunchResult};
use tracing::info;
use uuid::Uuid;

/// Builds the ordered cross-product of media, headlines and bodies.
///
/// Order is media-major, headline-mid, body-minor. Display names and
/// progress numbering depend on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermutationExpander;

impl PermutationExpander {
    pub fn new() -> Self {
        Self
    }

    /// Expand raw headline and body entries. Blank entries are dropped before
    /// counting, and indices in the output refer to the filtered lists.
    pub fn expand(
        &self,
        media: &[MediaAsset],
        headlines: &[String],
        bodies: &[String],
    ) -> LaunchResult<Vec<AdSpecification>> {
        if media.is_empty() {
            return Err(LaunchError::InvalidCreativeInput(
                "at least one media asset is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = media.iter().find(|m| !seen.insert(m.id.as_str())) {
            return Err(LaunchError::InvalidCreativeInput(format!(
                "media asset id '{}' appears more than once",
                dup.id
            )));
        }

        let headlines = non_empty_entries(headlines);
        let bodies = non_empty_entries(bodies);
        if headlines.is_empty() {
            return Err(LaunchError::InvalidCreativeInput(
                "at least one non-empty headline is required".into(),
            ));
        }
        if bodies.is_empty() {
            return Err(LaunchError::InvalidCreativeInput(
                "at least one non-empty body is required".into(),
            ));
        }

        let mut specs = Vec::with_capacity(media.len() * headlines.len() * bodies.len());
        for (position, asset) in media.iter().enumerate() {
            let media_name = media_label(asset, position);
            for h in 0..headlines.len() {
                for b in 0..bodies.len() {
                    specs.push(AdSpecification {
                        id: Uuid::new_v4().to_string(),
                        display_name: format!("{media_name} - H{}B{}", h + 1, b + 1),
                        media_asset_id: asset.id.clone(),
                        headline_index: h,
                        body_index: b,
                    });
                }
            }
        }

        info!(
            media = media.len(),
            headlines = headlines.len(),
            bodies = bodies.len(),
            count = specs.len(),
            "Expanded ad permutations"
        );
        Ok(specs)
    }

    /// Validate a template and expand it against the batch media.
    pub fn expand_template(
        &self,
        media: &[MediaAsset],
        template: &CreativeTemplate,
    ) -> LaunchResult<Vec<AdSpecification>> {
        template.validate()?;
        self.expand(media, &template.headlines, &template.bodies)
    }
}

fn media_label(asset: &MediaAsset, position: usize) -> String {
    let name = asset.display_name.trim();
    if !name.is_empty() {
        return name.to_string();
    }
    match asset.kind {
        MediaKind::Image => format!("Image {}", position + 1),
        MediaKind::Video => format!("Video {}", position + 1),
    }
}
