//! Errors for this library

/// Errors from acquiring or using a drawing surface.
#[derive(Debug, snafu::Snafu)]
#[non_exhaustive]
pub enum CanvasError {
    /// A surface with no area can't be drawn to, so no simulation can run on it.
    #[snafu(display("Couldn't acquire a {width}x{height} drawing surface"))]
    EmptySurface {
        /// The requested width
        width: usize,
        /// The requested height
        height: usize,
    },
}

/// Errors from addressing simulation parameters by name.
#[derive(Debug, snafu::Snafu)]
#[non_exhaustive]
pub enum ParameterError {
    /// No parameter has the given name.
    #[snafu(display("Unknown parameter: '{name}'"))]
    Unknown {
        /// The name that was asked for
        name: String,
    },

    /// A `name=value` pair couldn't be parsed.
    #[snafu(display("Couldn't parse parameter assignment: '{assignment}'"))]
    Assignment {
        /// The raw assignment
        assignment: String,
    },
}
