//! Annotation sink port trait.

use crate::domain::analysis::StructureBreakAnalysis;
use crate::domain::error::StructbreakError;
use std::path::Path;

/// Port for rendering the labeled break bars, order blocks and connector lines.
pub trait AnnotationPort {
    fn render(
        &self,
        analysis: &StructureBreakAnalysis,
        output_path: &Path,
    ) -> Result<(), StructbreakError>;
}
