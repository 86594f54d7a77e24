#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Got an invalid parameter value when constructing a basis
    InvalidParameter(String),
    /// The species of a center or neighbor is not part of the basis
    UnknownSpecies(i32),
    /// The atomic environment (or the buffers used to store the results of a
    /// calculation on this environment) is not valid
    InvalidEnvironment(String),
    /// Error while serializing/deserializing data
    Json(serde_json::Error),
    /// Some internal invariant was broken
    Internal(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            Error::UnknownSpecies(species) => write!(f, "species {} is not part of this basis", species),
            Error::InvalidEnvironment(e) => write!(f, "invalid environment: {}", e),
            Error::Json(e) => write!(f, "json error: {}", e),
            Error::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidParameter(_) |
            Error::UnknownSpecies(_) |
            Error::InvalidEnvironment(_) |
            Error::Internal(_) => None,
            Error::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error)
    }
}
