use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::Result;
use crate::model::{Gpx, Point, Properties, Route, Track};
use crate::options::WriteOptions;

/// The single namespace this crate reads and writes.
pub const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";

/// Fixed creator attribute stamped on every written document.
pub const CREATOR: &str = "gpx-doc";

impl Gpx {
    /// Writes the store to a file as pretty-printed GPX 1.1.
    ///
    /// A failed write may leave a truncated file behind; no cleanup is
    /// attempted.
    pub fn write_to_file(&self, path: impl AsRef<Path>, options: &WriteOptions) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        write_document(self, &mut out, options)?;
        out.flush()?;
        Ok(())
    }

    /// Writes the store to an open destination. Closing it remains the
    /// caller's responsibility.
    pub fn write(&self, out: impl Write, options: &WriteOptions) -> Result<()> {
        write_document(self, out, options)
    }

    /// Renders the store to a pretty-printed XML string.
    pub fn to_xml_string(&self, options: &WriteOptions) -> Result<String> {
        let mut buf = Vec::new();
        write_document(self, &mut buf, options)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Serialize a store into a two-space-indented GPX document.
///
/// Never mutates the store. Elements are emitted as all included
/// waypoints, then all tracks, then all routes, each collection in its
/// insertion order.
pub fn write_document<W: Write>(gpx: &Gpx, out: W, options: &WriteOptions) -> Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("gpx");
    root.push_attribute(("xmlns", GPX_NAMESPACE));
    root.push_attribute(("version", "1.1"));
    root.push_attribute(("creator", CREATOR));
    writer.write_event(Event::Start(root))?;

    if options.waypoints {
        for (_, point) in gpx.waypoints() {
            write_point(&mut writer, point, "wpt")?;
        }
    }
    if options.tracks {
        for (_, track) in gpx.tracks() {
            write_track(&mut writer, track)?;
        }
    }
    if options.routes {
        for (_, route) in gpx.routes() {
            write_route(&mut writer, route)?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("gpx")))?;

    debug!(
        "wrote GPX document: {} waypoints, {} tracks, {} routes",
        if options.waypoints { gpx.waypoints.len() } else { 0 },
        if options.tracks { gpx.tracks.len() } else { 0 },
        if options.routes { gpx.routes.len() } else { 0 },
    );
    Ok(())
}

/// Build a point element (wpt, trkpt, rtept): lon/lat attributes, one
/// child per property, then the extensions sub-tree.
fn write_point<W: Write>(writer: &mut Writer<W>, point: &Point, tag: &str) -> Result<()> {
    let mut start = BytesStart::new(tag);
    start.push_attribute(("lon", point.lon()));
    start.push_attribute(("lat", point.lat()));
    writer.write_event(Event::Start(start))?;

    write_properties(writer, point.properties())?;
    write_extensions(writer, point.extensions())?;

    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Build a trk element: track properties/extensions, then one trkseg per
/// segment, each with its own properties/extensions and trkpt children.
fn write_track<W: Write>(writer: &mut Writer<W>, track: &Track) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("trk")))?;
    write_properties(writer, track.properties())?;
    write_extensions(writer, track.extensions())?;

    for segment in track.segments() {
        writer.write_event(Event::Start(BytesStart::new("trkseg")))?;
        write_properties(writer, segment.properties())?;
        write_extensions(writer, segment.extensions())?;
        for point in segment.points() {
            write_point(writer, point, "trkpt")?;
        }
        writer.write_event(Event::End(BytesEnd::new("trkseg")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("trk")))?;
    Ok(())
}

/// Build an rte element: route properties/extensions, then rtept children.
fn write_route<W: Write>(writer: &mut Writer<W>, route: &Route) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("rte")))?;
    write_properties(writer, route.properties())?;
    write_extensions(writer, route.extensions())?;

    for point in route.points() {
        write_point(writer, point, "rtept")?;
    }

    writer.write_event(Event::End(BytesEnd::new("rte")))?;
    Ok(())
}

/// One child element per mapping entry: tag = key, text = value.
fn write_properties<W: Write>(writer: &mut Writer<W>, properties: &Properties) -> Result<()> {
    for (tag, value) in properties {
        writer.write_event(Event::Start(BytesStart::new(tag.as_str())))?;
        writer.write_event(Event::Text(BytesText::new(value)))?;
        writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
    }
    Ok(())
}

/// The extensions sub-tree is always emitted, even when empty; the reader
/// treats a missing one and an empty one identically.
fn write_extensions<W: Write>(writer: &mut Writer<W>, extensions: &Properties) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("extensions")))?;
    write_properties(writer, extensions)?;
    writer.write_event(Event::End(BytesEnd::new("extensions")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Properties;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_store_keeps_root_attributes() {
        let gpx = Gpx::new();
        let xml = gpx.to_xml_string(&WriteOptions::default()).unwrap();

        assert!(xml.contains(r#"version="1.1""#));
        assert!(xml.contains(r#"creator="gpx-doc""#));
        assert!(xml.contains(r#"xmlns="http://www.topografix.com/GPX/1/1""#));
        assert!(!xml.contains("<wpt"));
        assert!(!xml.contains("<trk"));
        assert!(!xml.contains("<rte"));
    }

    #[test]
    fn test_waypoint_element_shape() {
        let mut gpx = Gpx::new();
        gpx.add_waypoint(Point::with_fields(
            "-120.0",
            "45.0",
            props(&[("name", "Home")]),
            props(&[]),
        ));
        let xml = gpx.to_xml_string(&WriteOptions::default()).unwrap();

        assert!(xml.contains(r#"<wpt lon="-120.0" lat="45.0">"#));
        assert!(xml.contains("<name>Home</name>"));
        assert!(xml.contains("<extensions>"));
    }

    #[test]
    fn test_two_space_indentation() {
        let mut gpx = Gpx::new();
        gpx.add_waypoint(Point::new("1.0", "2.0"));
        let xml = gpx.to_xml_string(&WriteOptions::default()).unwrap();

        assert!(xml.contains("\n  <wpt"));
        assert!(xml.contains("\n    <extensions>"));
    }

    #[test]
    fn test_include_flags_filter_collections() {
        let mut gpx = Gpx::new();
        gpx.add_waypoint(Point::new("1.0", "2.0"));
        gpx.add_route(&crate::line::Line::new(vec![(1.0, 2.0)]));

        let opts = WriteOptions {
            waypoints: false,
            ..WriteOptions::default()
        };
        let xml = gpx.to_xml_string(&opts).unwrap();
        assert!(!xml.contains("<wpt"));
        assert!(xml.contains("<rte>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut gpx = Gpx::new();
        gpx.add_waypoint(Point::with_fields(
            "1.0",
            "2.0",
            props(&[("cmt", "fish & chips")]),
            props(&[]),
        ));
        let xml = gpx.to_xml_string(&WriteOptions::default()).unwrap();
        assert!(xml.contains("fish &amp; chips"));
    }

    #[test]
    fn test_track_segment_nesting() {
        let mut gpx = Gpx::new();
        let seg = crate::model::Trkseg::new(
            vec![Point::new("1.0", "2.0"), Point::new("3.0", "4.0")],
            props(&[("src", "logger")]),
            props(&[]),
        );
        gpx.tracks.insert(
            None,
            Track::new(vec![seg], props(&[("name", "Out and back")]), props(&[])),
        );
        let xml = gpx.to_xml_string(&WriteOptions::default()).unwrap();

        assert!(xml.contains("<trk>"));
        assert!(xml.contains("<name>Out and back</name>"));
        assert!(xml.contains("<trkseg>"));
        assert!(xml.contains("<src>logger</src>"));
        assert!(xml.contains(r#"<trkpt lon="1.0" lat="2.0">"#));

        // Track-level children come before the first segment.
        assert!(xml.find("<name>").unwrap() < xml.find("<trkseg>").unwrap());
    }
}
