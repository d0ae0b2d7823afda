use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid road graph data: {0}")]
    InvalidData(String),
    #[error("Invalid synthesis configuration: {0}")]
    InvalidConfig(String),
    #[error("GeoJSON export error: {0}")]
    GeoJsonError(String),
}

/// Expected geometric degeneracies.
///
/// These are consumed at each call site rather than propagated: the curved
/// trench builder falls back to the raw offset point when a miter has no
/// intersection, while the straight candidate test treats parallel lines as
/// non-crossing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("lines are parallel or coincident")]
    DegenerateLines,
}
