pub mod aliases;
pub mod cv;
pub mod metrics;

pub use cv::{ContactInfo, CvContent, EducationEntry, ExperienceEntry, Language};
pub use metrics::{GenerationResult, Outcome, PageFillMetrics, Severity, UserWarning};
