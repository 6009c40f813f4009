use thiserror::Error;

/// Errors raised while reading, binding, or analyzing a model
///
/// Element-level failures (`InvalidTopology`, `InvalidMaterial`,
/// `DegenerateGeometry`, `MissingInput`) abort only the element they
/// were raised for; the caller decides what to do with the rest.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or out-of-range node numbers
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// Material set missing, or of the wrong variant for the element
    #[error("invalid material: {0}")]
    InvalidMaterial(String),

    /// Zero or negative area after orientation correction
    #[error("degenerate geometry in element {element}: area = {area:e}")]
    DegenerateGeometry { element: usize, area: f64 },

    /// Absent node or material source at bind time
    #[error("missing input: {0}")]
    MissingInput(String),

    /// Malformed input file
    #[error("input error: {0}")]
    Input(String),

    /// Malformed configuration file
    #[error("config error: {0}")]
    Config(String),

    /// Global solve failed
    #[error("solver error: {0}")]
    Solver(String),

    #[error("format error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
