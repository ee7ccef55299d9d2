use std::fmt;

use thiserror::Error;

/// Hard failures: each one stops the pipeline with an actionable message.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Unsupported file type or a table that could not be read.
    #[error("input format error: {0}")]
    InputFormat(String),

    /// One or more column roles could not be resolved from the headers.
    #[error("could not determine the {} column(s); select them manually", .missing.join(", "))]
    ColumnSelection { missing: Vec<&'static str> },

    /// A latitude/longitude value failed every parse strategy.
    #[error("row {row}: could not parse {column} value {value:?}; check the coordinate format")]
    CoordinateParse { row: usize, column: String, value: String },

    /// One or more of the four source images is absent.
    #[error("cannot compose layout, missing {}; generate those maps first", .missing.join(", "))]
    CompositionIncomplete { missing: Vec<&'static str> },

    #[error("boundary data error: {0:#}")]
    Boundary(anyhow::Error),

    /// Reprojection or extent computation failed.
    #[error("geometry error: {0:#}")]
    Geometry(anyhow::Error),

    #[error("render error: {0}")]
    Render(#[from] image::ImageError),
}

/// Soft failures: collected alongside the output, never abort a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A site matched no administrative polygon.
    ContainmentMiss { site: String },
    /// No site fell inside any state polygon; overview maps are skipped.
    NoDetectedState,
    /// No site fell inside any district polygon; the district map is skipped.
    NoDetectedDistrict,
    /// A decorative layer (basemap, north arrow, font) could not be produced.
    Decoration { layer: &'static str, reason: String },
}

impl Warning {
    pub(crate) fn decoration(layer: &'static str, reason: impl fmt::Display) -> Self {
        Warning::Decoration { layer, reason: reason.to_string() }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ContainmentMiss { site } => write!(f, "site {site:?} matched no state or district polygon"),
            Warning::NoDetectedState => write!(f, "no detected state"),
            Warning::NoDetectedDistrict => write!(f, "no detected district"),
            Warning::Decoration { layer, reason } => write!(f, "{layer} skipped: {reason}"),
        }
    }
}
