//! Vision processing stages

pub mod contour;
pub mod extraction;
pub mod filter;
pub mod localizer;
pub mod segmentation;

pub use contour::{BoundingBox, Contour};
pub use extraction::{ChainApproximation, ContourExtractor};
pub use filter::{ContourFilter, ContourMetrics, FilterOutcome, Rejection};
pub use localizer::{GeometryFault, Localizer, TargetEstimate, TriangleSolution};
pub use segmentation::Segmenter;
