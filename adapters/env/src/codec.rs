//! Single-line map transfer strings.
//!
//! Saved maps travel as `landgrab:v1:WxH:<base64 json>`: a fixed domain
//! prefix, the format version, the grid dimensions, then the base64-encoded
//! JSON tile records. Only topology crosses this boundary.

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use landgrab_world::snapshot::{MapSnapshot, TileRecord};
use serde::{Deserialize, Serialize};

const TRANSFER_DOMAIN: &str = "landgrab";
const TRANSFER_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded map payload.
pub const TRANSFER_HEADER: &str = "landgrab:v1";
const FIELD_DELIMITER: char = ':';

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct SerializablePayload {
    tiles: Vec<TileRecord>,
}

/// Encodes a map snapshot into a single-line string suitable for files or
/// clipboard transfer.
#[must_use]
pub fn encode(snapshot: &MapSnapshot) -> String {
    let payload = SerializablePayload {
        tiles: snapshot.tiles.clone(),
    };
    let json = serde_json::to_vec(&payload).expect("map snapshot serialization never fails");
    let encoded = STANDARD_NO_PAD.encode(json);
    format!(
        "{TRANSFER_HEADER}:{}x{}:{encoded}",
        snapshot.width, snapshot.height
    )
}

/// Decodes a map snapshot from its string representation.
pub fn decode(value: &str) -> Result<MapSnapshot, MapTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MapTransferError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(MapTransferError::MissingPrefix)?;
    let version = parts.next().ok_or(MapTransferError::MissingVersion)?;
    let dimensions = parts.next().ok_or(MapTransferError::MissingDimensions)?;
    let payload = parts.next().ok_or(MapTransferError::MissingPayload)?;

    if domain != TRANSFER_DOMAIN {
        return Err(MapTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != TRANSFER_VERSION {
        return Err(MapTransferError::UnsupportedVersion(version.to_owned()));
    }

    let (width, height) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(MapTransferError::InvalidEncoding)?;
    let decoded: SerializablePayload =
        serde_json::from_slice(&bytes).map_err(MapTransferError::InvalidPayload)?;

    Ok(MapSnapshot {
        width,
        height,
        tiles: decoded.tiles,
    })
}

/// Ways a map transfer string can fail to decode.
#[derive(Debug)]
pub enum MapTransferError {
    /// Nothing but whitespace was supplied.
    EmptyPayload,
    /// No domain prefix before the first delimiter.
    MissingPrefix,
    /// The string ends before a version segment appears.
    MissingVersion,
    /// The string ends before the dimensions segment appears.
    MissingDimensions,
    /// The string carries a header but no payload segment.
    MissingPayload,
    /// The domain prefix belongs to some other format.
    InvalidPrefix(String),
    /// The version segment names a format this build cannot read.
    UnsupportedVersion(String),
    /// The dimensions segment is not a `WxH` pair of positive integers.
    InvalidDimensions(String),
    /// The payload segment is not valid base64.
    InvalidEncoding(base64::DecodeError),
    /// The payload decoded but its JSON does not describe tile records.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for MapTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "map string is empty"),
            Self::MissingPrefix => write!(f, "map string has no domain prefix"),
            Self::MissingVersion => write!(f, "map string has no version segment"),
            Self::MissingDimensions => write!(f, "map string has no dimensions segment"),
            Self::MissingPayload => write!(f, "map string has no payload segment"),
            Self::InvalidPrefix(prefix) => {
                write!(f, "'{prefix}' is not a landgrab map prefix")
            }
            Self::UnsupportedVersion(version) => {
                write!(f, "map format version '{version}' is not readable by this build")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "'{dimensions}' is not a WxH dimension pair")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "map payload is not valid base64: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "map payload is not valid tile JSON: {error}")
            }
        }
    }
}

impl Error for MapTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), MapTransferError> {
    let (width, height) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| MapTransferError::InvalidDimensions(dimensions.to_owned()))?;

    let width = width
        .trim()
        .parse::<u32>()
        .map_err(|_| MapTransferError::InvalidDimensions(dimensions.to_owned()))?;
    let height = height
        .trim()
        .parse::<u32>()
        .map_err(|_| MapTransferError::InvalidDimensions(dimensions.to_owned()))?;

    if width == 0 || height == 0 {
        return Err(MapTransferError::InvalidDimensions(dimensions.to_owned()));
    }

    Ok((width, height))
}
