// Adapters layer: concrete readers for external formats.

pub mod tabular;
