//! Report-layer fixers.

mod axes;
mod filters;
mod page_size;
mod pie;
mod upgrade;

pub use axes::{AxisDeclutter, BAR_CHARTS, COLUMN_CHARTS};
pub use filters::HideVisualFilters;
pub use page_size::PageSize;
pub use pie::PieToBar;
pub use upgrade::UpgradeToPbir;
