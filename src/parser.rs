use std::fs;
use std::io::Read;
use std::path::Path;

use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{GpxError, Result};
use crate::model::{Gpx, Point, Properties, Route, Track, Trkseg};

impl Gpx {
    /// Reads a GPX document from a file. The handle is released on every
    /// exit path, including parse failures.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let xml = fs::read_to_string(path)?;
        parse_document(&xml)
    }

    /// Reads a GPX document from an open stream. Closing the stream
    /// remains the caller's responsibility.
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut xml = String::new();
        reader.read_to_string(&mut xml)?;
        parse_document(&xml)
    }

    /// Parses a GPX document held in memory.
    pub fn from_xml(xml: &str) -> Result<Self> {
        parse_document(xml)
    }
}

/// Parse a GPX XML string into a populated store.
///
/// Waypoints, tracks, and routes are keyed by their `name` property when
/// present, else by a generated `waypoint_<n>`/`track_<n>`/`route_<n>` key.
/// A point element missing `lon` or `lat` aborts the whole parse, so a bad
/// point never leaves a partial entry behind. A document with none of
/// `wpt`/`trk`/`rte` parses to an empty store.
pub fn parse_document(xml: &str) -> Result<Gpx> {
    let mut reader = Reader::from_str(xml);
    let mut gpx = Gpx::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"wpt" => {
                    let point = parse_point(&e, &mut reader, "wpt")?;
                    gpx.add_waypoint(point);
                }
                b"trk" => {
                    let track = parse_track(&mut reader)?;
                    let name = track.name().map(str::to_owned);
                    gpx.tracks.insert(name, track);
                }
                b"rte" => {
                    let route = parse_route(&mut reader)?;
                    let name = route.name().map(str::to_owned);
                    gpx.routes.insert(name, route);
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"wpt" {
                    let (lon, lat) = parse_lon_lat(&e, "wpt")?;
                    gpx.add_waypoint(Point::new(lon, lat));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Malformed(e)),
            _ => {}
        }
    }

    debug!(
        "parsed GPX document: {} waypoints, {} tracks, {} routes",
        gpx.waypoints.len(),
        gpx.tracks.len(),
        gpx.routes.len()
    );
    Ok(gpx)
}

/// Read the required lon/lat attribute pair from a point element's start
/// tag. The attribute text is kept verbatim; nothing validates it as a
/// number here.
fn parse_lon_lat(e: &BytesStart<'_>, element: &'static str) -> Result<(String, String)> {
    let mut lon: Option<String> = None;
    let mut lat: Option<String> = None;

    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| GpxError::Malformed(e.into()))?;
        let val = std::str::from_utf8(&attr.value).unwrap_or_default();
        match attr.key.local_name().as_ref() {
            b"lon" => lon = Some(val.to_string()),
            b"lat" => lat = Some(val.to_string()),
            _ => {}
        }
    }

    let lon = lon.ok_or(GpxError::MissingCoordinate {
        element,
        attribute: "lon",
    })?;
    let lat = lat.ok_or(GpxError::MissingCoordinate {
        element,
        attribute: "lat",
    })?;

    Ok((lon, lat))
}

/// Parse a point element (wpt, trkpt, rtept) and its children.
/// Called after receiving Event::Start for the point element.
///
/// Direct children are collected in two passes: every non-`extensions`
/// child becomes a property (stripped tag -> text, last occurrence wins),
/// and the `extensions` child's own children become the extensions map.
fn parse_point<'a>(
    start: &BytesStart<'a>,
    reader: &mut Reader<&'a [u8]>,
    element: &'static str,
) -> Result<Point> {
    let (lon, lat) = parse_lon_lat(start, element)?;
    let end_name = start.name().0.to_vec();

    let mut properties = Properties::new();
    let mut extensions = Properties::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"extensions" {
                    extensions = parse_extensions(reader)?;
                } else {
                    let tag = stripped_tag(&e);
                    let text = read_element_text(reader, &e)?;
                    properties.insert(tag, text);
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() != b"extensions" {
                    properties.insert(stripped_tag(&e), String::new());
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Malformed(e)),
            _ => {}
        }
    }

    Ok(Point::with_fields(lon, lat, properties, extensions))
}

/// Parse a <trk> element: trkseg children become segments, everything
/// else splits into track-level properties and extensions.
fn parse_track(reader: &mut Reader<&[u8]>) -> Result<Track> {
    let mut segments = Vec::new();
    let mut properties = Properties::new();
    let mut extensions = Properties::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trkseg" => segments.push(parse_segment(reader)?),
                b"extensions" => extensions = parse_extensions(reader)?,
                _ => {
                    let tag = stripped_tag(&e);
                    let text = read_element_text(reader, &e)?;
                    properties.insert(tag, text);
                }
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"trkseg" => {
                    segments.push(Trkseg::new(Vec::new(), Properties::new(), Properties::new()))
                }
                b"extensions" => {}
                _ => {
                    properties.insert(stripped_tag(&e), String::new());
                }
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trk" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Malformed(e)),
            _ => {}
        }
    }

    Ok(Track::new(segments, properties, extensions))
}

/// Parse a <trkseg> element: trkpt children in document order, plus
/// segment-level properties and extensions.
fn parse_segment(reader: &mut Reader<&[u8]>) -> Result<Trkseg> {
    let mut points = Vec::new();
    let mut properties = Properties::new();
    let mut extensions = Properties::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trkpt" => points.push(parse_point(&e, reader, "trkpt")?),
                b"extensions" => extensions = parse_extensions(reader)?,
                _ => {
                    let tag = stripped_tag(&e);
                    let text = read_element_text(reader, &e)?;
                    properties.insert(tag, text);
                }
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"trkpt" => {
                    let (lon, lat) = parse_lon_lat(&e, "trkpt")?;
                    points.push(Point::new(lon, lat));
                }
                b"extensions" => {}
                _ => {
                    properties.insert(stripped_tag(&e), String::new());
                }
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trkseg" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Malformed(e)),
            _ => {}
        }
    }

    Ok(Trkseg::new(points, properties, extensions))
}

/// Parse a <rte> element: rtept children in document order, plus
/// route-level properties and extensions.
fn parse_route(reader: &mut Reader<&[u8]>) -> Result<Route> {
    let mut points = Vec::new();
    let mut properties = Properties::new();
    let mut extensions = Properties::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"rtept" => points.push(parse_point(&e, reader, "rtept")?),
                b"extensions" => extensions = parse_extensions(reader)?,
                _ => {
                    let tag = stripped_tag(&e);
                    let text = read_element_text(reader, &e)?;
                    properties.insert(tag, text);
                }
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"rtept" => {
                    let (lon, lat) = parse_lon_lat(&e, "rtept")?;
                    points.push(Point::new(lon, lat));
                }
                b"extensions" => {}
                _ => {
                    properties.insert(stripped_tag(&e), String::new());
                }
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"rte" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Malformed(e)),
            _ => {}
        }
    }

    Ok(Route::new(points, properties, extensions))
}

/// Parse the children of an <extensions> element into a mapping of
/// stripped tag -> text. Called after receiving its Event::Start; a
/// missing <extensions> element never reaches here and yields an empty
/// map upstream.
fn parse_extensions(reader: &mut Reader<&[u8]>) -> Result<Properties> {
    let mut extensions = Properties::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let tag = stripped_tag(&e);
                let text = read_element_text(reader, &e)?;
                extensions.insert(tag, text);
            }
            Ok(Event::Empty(e)) => {
                extensions.insert(stripped_tag(&e), String::new());
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"extensions" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Malformed(e)),
            _ => {}
        }
    }

    Ok(extensions)
}

/// Tag name with any namespace prefix stripped.
fn stripped_tag(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Read the direct text content of an element as an owned String.
/// Handles regular text, CDATA sections, and entity references
/// (Event::GeneralRef); nested child elements are skipped wholesale.
fn read_element_text<'a>(
    reader: &mut Reader<&'a [u8]>,
    start: &BytesStart<'_>,
) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                let raw = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                text.push_str(raw);
            }
            Ok(Event::CData(e)) => {
                let s = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                text.push_str(s);
            }
            Ok(Event::GeneralRef(e)) => {
                // Character references (&#60; &#x3C;) and predefined entities
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    let name = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                    match name {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => {} // Unknown entity, skip
                    }
                }
            }
            Ok(Event::Start(e)) => {
                reader.read_to_end(e.name()).map_err(GpxError::Malformed)?;
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(GpxError::Malformed(e)),
            _ => {}
        }
    }

    Ok(text)
}
