//! Export of observations, density grids and chains for external plotting tools.

#[cfg(feature = "csv")]
pub mod csv;
