use std::collections::BTreeMap;

/// Scalar metadata attached to a GPX element: stripped tag name -> text.
pub type Properties = BTreeMap<String, String>;

/// Removes the reserved `extensions` key; that sub-tree is carried
/// separately and must never appear among plain properties.
fn clean_properties(mut properties: Properties) -> Properties {
    properties.remove("extensions");
    properties
}

/// A single GPX point (used for wpt, trkpt, rtept).
///
/// Coordinates are kept as raw attribute text. Nothing here validates or
/// parses them as numbers; that is left to geometry-aware consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    lon: String,
    lat: String,
    properties: Properties,
    extensions: Properties,
}

impl Point {
    pub fn new(lon: impl Into<String>, lat: impl Into<String>) -> Self {
        Self::with_fields(lon, lat, Properties::new(), Properties::new())
    }

    pub fn with_fields(
        lon: impl Into<String>,
        lat: impl Into<String>,
        properties: Properties,
        extensions: Properties,
    ) -> Self {
        Self {
            lon: lon.into(),
            lat: lat.into(),
            properties: clean_properties(properties),
            extensions,
        }
    }

    pub fn lon(&self) -> &str {
        &self.lon
    }

    pub fn lat(&self) -> &str {
        &self.lat
    }

    /// Coordinate pair as `(lon, lat)`.
    pub fn lonlat(&self) -> (&str, &str) {
        (&self.lon, &self.lat)
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn extensions(&self) -> &Properties {
        &self.extensions
    }

    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").map(String::as_str)
    }
}

/// A track segment: an ordered polyline of points plus segment-level
/// metadata (the point list itself is not a property).
#[derive(Debug, Clone, PartialEq)]
pub struct Trkseg {
    points: Vec<Point>,
    properties: Properties,
    extensions: Properties,
}

impl Trkseg {
    pub fn new(points: Vec<Point>, properties: Properties, extensions: Properties) -> Self {
        Self {
            points,
            properties: clean_properties(properties),
            extensions,
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn extensions(&self) -> &Properties {
        &self.extensions
    }
}

/// A track: an ordered sequence of segments plus track-level metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    segments: Vec<Trkseg>,
    properties: Properties,
    extensions: Properties,
}

impl Track {
    pub fn new(segments: Vec<Trkseg>, properties: Properties, extensions: Properties) -> Self {
        Self {
            segments,
            properties: clean_properties(properties),
            extensions,
        }
    }

    pub fn segments(&self) -> &[Trkseg] {
        &self.segments
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn extensions(&self) -> &Properties {
        &self.extensions
    }

    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").map(String::as_str)
    }
}

/// A route: an ordered sequence of planned points plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    points: Vec<Point>,
    properties: Properties,
    extensions: Properties,
}

impl Route {
    pub fn new(points: Vec<Point>, properties: Properties, extensions: Properties) -> Self {
        Self {
            points,
            properties: clean_properties(properties),
            extensions,
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn extensions(&self) -> &Properties {
        &self.extensions
    }

    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").map(String::as_str)
    }
}

/// Insertion-ordered name -> value mapping with a monotonic insertion
/// counter for generated keys.
///
/// The counter advances on every insertion and never decreases, so a
/// generated `<prefix>_<n>` key is never reissued even after removals.
/// Inserting under an existing name replaces the value in place.
#[derive(Debug, Clone)]
pub(crate) struct Collection<T> {
    entries: Vec<(String, T)>,
    seq: usize,
    prefix: &'static str,
}

impl<T> Collection<T> {
    pub(crate) fn new(prefix: &'static str) -> Self {
        Self {
            entries: Vec::new(),
            seq: 0,
            prefix,
        }
    }

    /// Inserts `value` under `name`, or under a generated `<prefix>_<n>`
    /// key when no name is given. Returns the key actually used.
    pub(crate) fn insert(&mut self, name: Option<String>, value: T) -> &str {
        let key = name.unwrap_or_else(|| format!("{}_{}", self.prefix, self.seq));
        self.seq += 1;

        let idx = match self.entries.iter().position(|(k, _)| *k == key) {
            Some(idx) => {
                self.entries[idx].1 = value;
                idx
            }
            None => {
                self.entries.push((key, value));
                self.entries.len() - 1
            }
        };
        &self.entries[idx].0
    }

    pub(crate) fn get(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<T> {
        let idx = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<T: PartialEq> PartialEq for Collection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

/// An in-memory GPX document: named waypoints, tracks, and routes.
///
/// Each collection iterates in insertion order, and the writer emits
/// elements in exactly that order.
#[derive(Debug, Clone, PartialEq)]
pub struct Gpx {
    pub(crate) waypoints: Collection<Point>,
    pub(crate) tracks: Collection<Track>,
    pub(crate) routes: Collection<Route>,
}

impl Gpx {
    pub fn new() -> Self {
        Self {
            waypoints: Collection::new("waypoint"),
            tracks: Collection::new("track"),
            routes: Collection::new("route"),
        }
    }

    /// Adds a waypoint, keyed by its `name` property when present.
    /// Returns the key the point was stored under.
    pub fn add_waypoint(&mut self, point: Point) -> String {
        let name = point.name().map(str::to_owned);
        self.waypoints.insert(name, point).to_owned()
    }

    pub fn waypoint(&self, name: &str) -> Option<&Point> {
        self.waypoints.get(name)
    }

    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.get(name)
    }

    pub fn route(&self, name: &str) -> Option<&Route> {
        self.routes.get(name)
    }

    pub fn waypoints(&self) -> impl Iterator<Item = (&str, &Point)> {
        self.waypoints.iter()
    }

    pub fn tracks(&self) -> impl Iterator<Item = (&str, &Track)> {
        self.tracks.iter()
    }

    pub fn routes(&self) -> impl Iterator<Item = (&str, &Route)> {
        self.routes.iter()
    }

    pub fn remove_waypoint(&mut self, name: &str) -> Option<Point> {
        self.waypoints.remove(name)
    }

    pub fn remove_track(&mut self, name: &str) -> Option<Track> {
        self.tracks.remove(name)
    }

    pub fn remove_route(&mut self, name: &str) -> Option<Route> {
        self.routes.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.len() == 0 && self.tracks.len() == 0 && self.routes.len() == 0
    }
}

impl Default for Gpx {
    fn default() -> Self {
        Self::new()
    }
}
