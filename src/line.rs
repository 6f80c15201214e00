use std::collections::BTreeMap;

use crate::model::{Gpx, Point, Properties, Route, Track, Trkseg};

/// Bulk-ingestion input from a geometry collaborator: an ordered polyline
/// plus per-vertex data series and line-level properties.
///
/// Each `data` entry is an attribute name mapped to one value per vertex;
/// a series shorter than the vertex list simply contributes nothing for
/// the missing indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    vertices: Vec<(f64, f64)>,
    data: BTreeMap<String, Vec<String>>,
    properties: Properties,
}

impl Line {
    pub fn new(vertices: Vec<(f64, f64)>) -> Self {
        Self {
            vertices,
            data: BTreeMap::new(),
            properties: Properties::new(),
        }
    }

    pub fn with_fields(
        vertices: Vec<(f64, f64)>,
        data: BTreeMap<String, Vec<String>>,
        properties: Properties,
    ) -> Self {
        Self {
            vertices,
            data,
            properties,
        }
    }

    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// One Point per vertex, `(lon, lat)` stringified, with the i-th
    /// value of each data series as that point's properties.
    fn points(&self) -> Vec<Point> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, (lon, lat))| {
                let properties: Properties = self
                    .data
                    .iter()
                    .filter_map(|(key, series)| {
                        series.get(i).map(|value| (key.clone(), value.clone()))
                    })
                    .collect();
                Point::with_fields(lon.to_string(), lat.to_string(), properties, Properties::new())
            })
            .collect()
    }
}

impl Gpx {
    /// Adds one track built from line-like objects: every line becomes
    /// one segment (segment properties from the line, one point per
    /// vertex). The track is keyed by `properties["name"]` when present,
    /// else by a generated key; the key used is returned.
    pub fn add_track(
        &mut self,
        lines: &[Line],
        properties: Properties,
        extensions: Properties,
    ) -> String {
        let segments: Vec<Trkseg> = lines
            .iter()
            .map(|line| Trkseg::new(line.points(), line.properties.clone(), Properties::new()))
            .collect();

        let name = properties.get("name").cloned();
        let track = Track::new(segments, properties, extensions);
        self.tracks.insert(name, track).to_owned()
    }

    /// Adds one route built from a single line-like object: one point
    /// per vertex, route properties from the line. Keyed by the line's
    /// `name` property when present; the key used is returned.
    pub fn add_route(&mut self, line: &Line) -> String {
        let name = line.properties.get("name").cloned();
        let route = Route::new(line.points(), line.properties.clone(), Properties::new());
        self.routes.insert(name, route).to_owned()
    }
}
