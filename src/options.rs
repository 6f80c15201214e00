use serde::Deserialize;

/// Options controlling which store collections are written.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOptions {
    /// Include waypoints in the output (default: true)
    #[serde(default = "default_true")]
    pub waypoints: bool,

    /// Include tracks in the output (default: true)
    #[serde(default = "default_true")]
    pub tracks: bool,

    /// Include routes in the output (default: true)
    #[serde(default = "default_true")]
    pub routes: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            waypoints: true,
            tracks: true,
            routes: true,
        }
    }
}

fn default_true() -> bool {
    true
}
