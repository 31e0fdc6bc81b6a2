use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Graph needs at least 2 distinct waypoints, found {waypoints}")]
    Degenerate { waypoints: usize },
}

impl GraphError {
    pub fn user_message(&self) -> &'static str {
        match self {
            GraphError::Degenerate { .. } => "track too short to build a route",
        }
    }
}
