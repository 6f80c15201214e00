use thiserror::Error;

/// Errors surfaced while reading or writing GPX documents.
#[derive(Debug, Error)]
pub enum GpxError {
    /// The input is not well-formed XML.
    #[error("malformed GPX document: {0}")]
    Malformed(#[from] quick_xml::Error),

    /// A point element (`wpt`, `trkpt`, `rtept`) is missing a required
    /// coordinate attribute. The whole parse is aborted; no partial entry
    /// is added to the store.
    #[error("missing coordinate attribute '{attribute}' on <{element}>")]
    MissingCoordinate {
        element: &'static str,
        attribute: &'static str,
    },

    /// Read or write failure from the underlying storage layer,
    /// propagated unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GpxError>;
