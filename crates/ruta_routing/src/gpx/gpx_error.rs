use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GpxError {
    #[error("Malformed GPX input: {0}")]
    MalformedInput(String),

    #[error("GPX file contains no track points")]
    EmptyTrack,
}

impl GpxError {
    pub fn user_message(&self) -> &'static str {
        "track file empty or corrupt"
    }
}

impl From<quick_xml::Error> for GpxError {
    fn from(error: quick_xml::Error) -> Self {
        GpxError::MalformedInput(error.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for GpxError {
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        GpxError::MalformedInput(error.to_string())
    }
}
