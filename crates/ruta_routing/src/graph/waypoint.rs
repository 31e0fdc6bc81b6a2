use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{define_index_newtype, geopoint::GeoPoint};

define_index_newtype!(WaypointId, Waypoint);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Waypoint {
    id: WaypointId,
    point: GeoPoint,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl Waypoint {
    pub fn new(id: WaypointId, point: GeoPoint, label: Option<String>) -> Self {
        Waypoint { id, point, label }
    }

    pub fn id(&self) -> WaypointId {
        self.id
    }

    pub fn point(&self) -> &GeoPoint {
        &self.point
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn set_label_if_missing(&mut self, label: String) {
        self.label.get_or_insert(label);
    }
}
