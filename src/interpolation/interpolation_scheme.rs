//=====================================================================
// Enum for possible interpolation schemes from ENDF standard.
//=====================================================================
use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq)]
pub enum InterpolationScheme {
    Histogram = 1,
    LinLin = 2,
    LinLog = 3,
    LogLin = 4,
    LogLog = 5,
    Gamow = 6,
}

impl TryFrom<usize> for InterpolationScheme {
    type Error = TransportError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(InterpolationScheme::Histogram),
            2 => Ok(InterpolationScheme::LinLin),
            3 => Ok(InterpolationScheme::LinLog),
            4 => Ok(InterpolationScheme::LogLin),
            5 => Ok(InterpolationScheme::LogLog),
            6 => Ok(InterpolationScheme::Gamow),
            code => Err(TransportError::UnknownInterpolationCode { code }),
        }
    }
}

impl std::fmt::Display for InterpolationScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpolationScheme::Histogram => write!(f, "Histogram"),
            InterpolationScheme::LinLin => write!(f, "LinLin"),
            InterpolationScheme::LinLog => write!(f, "LinLog"),
            InterpolationScheme::LogLin => write!(f, "LogLin"),
            InterpolationScheme::LogLog => write!(f, "LogLog"),
            InterpolationScheme::Gamow => write!(f, "Gamow"),
        }
    }
}