//! Segment, extract, filter and localize in one call

use crate::config::VisionConfig;
use crate::error::VisionError;
use crate::processing::{
    BoundingBox, ContourExtractor, ContourFilter, Localizer, Segmenter, TargetEstimate,
};
use crate::{Frame, Mask};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Contours found before filtering
    pub contours_found: usize,
    /// Contours left after filtering
    pub contours_accepted: usize,
    pub first_candidate: Option<BoundingBox>,
    /// Localized from the first surviving contour
    pub estimate: Option<TargetEstimate>,
}

pub struct TargetPipeline {
    segmenter: Segmenter,
    extractor: ContourExtractor,
    filter: ContourFilter,
    localizer: Localizer,
}

impl TargetPipeline {
    pub fn new(config: &VisionConfig) -> Result<Self, VisionError> {
        config.validate().map_err(VisionError::Config)?;
        Ok(Self {
            segmenter: Segmenter::new(config.threshold.clone()),
            extractor: ContourExtractor::new(config.external_only),
            filter: ContourFilter::new(config.filter.clone()),
            localizer: Localizer::new(config.constants.clone()),
        })
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    pub fn localizer(&self) -> &Localizer {
        &self.localizer
    }

    pub fn process(&self, frame: &Frame) -> PipelineOutput {
        let mask = self.segmenter.segment(frame);
        self.process_mask(&mask)
    }

    pub fn process_mask(&self, mask: &Mask) -> PipelineOutput {
        let contours = self.extractor.extract(mask);
        let contours_found = contours.len();
        let outcome = self.filter.filter(contours);

        let estimate = outcome
            .accepted
            .first()
            .map(|best| self.localizer.localize(best));

        if let Some(e) = &estimate {
            debug!(
                "Target at {:?}: bearing {:?} elevation {:?} distance {:?}",
                e.bounding_box, e.bearing, e.elevation, e.distance
            );
        }

        PipelineOutput {
            contours_found,
            contours_accepted: outcome.accepted.len(),
            first_candidate: outcome.first_candidate,
            estimate,
        }
    }
}
