//! GPX 1.1 reader/writer with a named in-memory store of waypoints,
//! tracks, and routes.
//!
//! Documents are parsed into a [`Gpx`] store whose entries keep their
//! scalar metadata in a `properties` map and the vendor `extensions`
//! sub-tree in a separate map. The store writes back out as
//! pretty-printed GPX; coordinate and property text survives the round
//! trip byte for byte.
//!
//! ```
//! use gpx_doc::{Gpx, Point, WriteOptions};
//!
//! let xml = r#"<?xml version="1.0"?>
//! <gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1" creator="example">
//!   <wpt lon="-120.0" lat="45.0"><name>Home</name></wpt>
//! </gpx>"#;
//!
//! let mut gpx = Gpx::from_xml(xml)?;
//! assert_eq!(gpx.waypoint("Home").unwrap().lonlat(), ("-120.0", "45.0"));
//!
//! gpx.add_waypoint(Point::new("-121.5", "45.5"));
//! let out = gpx.to_xml_string(&WriteOptions::default())?;
//! assert!(out.contains("<name>Home</name>"));
//! # Ok::<(), gpx_doc::GpxError>(())
//! ```

pub mod error;
pub mod line;
pub mod model;
pub mod options;
pub mod parser;
pub mod writer;

pub use error::{GpxError, Result};
pub use line::Line;
pub use model::{Gpx, Point, Properties, Route, Track, Trkseg};
pub use options::WriteOptions;
pub use writer::{CREATOR, GPX_NAMESPACE};
