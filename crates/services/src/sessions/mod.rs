mod workflow;

// Public API of the sitting orchestration.
pub use workflow::{StudyAnswer, StudyLoopService};
