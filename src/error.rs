use thiserror::Error;

/// Top-level error type for the layerpath toolkit.
#[derive(Debug, Error)]
pub enum LayerpathError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    NavMesh(#[from] NavMeshError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Errors raised while building an extrusion flow descriptor.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("flow {parameter} must be positive, got {value}")]
    InvalidDimension { parameter: &'static str, value: f64 },
}

/// Errors raised by configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {parameter}: {reason}")]
    Invalid {
        parameter: &'static str,
        reason: String,
    },
}

/// Errors related to navigation mesh construction and queries.
#[derive(Debug, Error)]
pub enum NavMeshError {
    #[error("polygons {from} and {to} are not neighbors")]
    NotNeighbors { from: usize, to: usize },

    #[error("navigation mesh has not been triangulated")]
    NotTriangulated,

    #[error("navigation mesh needs at least 3 input points, got {0}")]
    TooFewPoints(usize),

    #[error("triangulation failed: {0}")]
    Triangulation(String),
}

/// Convenience type alias for results using [`LayerpathError`].
pub type Result<T> = std::result::Result<T, LayerpathError>;
