//! Unsigned ("none" mechanism) jobspec envelope.
//!
//! Format: `base64(header).base64(payload).none`, where the header is the compact JSON
//! `{"version":1,"mechanism":"none","userid":N}`. The envelope carries the claimed identity
//! of the submitter; the coordinator checks it against the connection credentials.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::{ModelError, UserId};

pub const MECH_NONE: &str = "none";
const VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Header {
    version: u32,
    mechanism: String,
    userid: UserId,
}

/// Decoded envelope contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unwrapped {
    pub payload: Vec<u8>,
    pub mechanism: String,
    pub userid: UserId,
}

/// Wrap `payload` claiming `userid`.
pub fn wrap_none(payload: &[u8], userid: UserId) -> String {
    let header = Header {
        version: VERSION,
        mechanism: MECH_NONE.to_string(),
        userid,
    };
    // Serializing a plain struct of scalars cannot fail.
    let header = serde_json::to_vec(&header).unwrap_or_default();
    format!(
        "{}.{}.{}",
        STANDARD.encode(header),
        STANDARD.encode(payload),
        MECH_NONE
    )
}

/// Unwrap an envelope without verifying any signature.
pub fn unwrap_none(envelope: &str) -> Result<Unwrapped, ModelError> {
    let mut parts = envelope.splitn(3, '.');
    let (Some(header), Some(payload), Some(signature)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(ModelError::Envelope("expected header.payload.signature".into()));
    };

    let header = STANDARD
        .decode(header)
        .map_err(|e| ModelError::Envelope(format!("header: {e}")))?;
    let header: Header = serde_json::from_slice(&header)
        .map_err(|e| ModelError::Envelope(format!("header: {e}")))?;
    if header.version != VERSION {
        return Err(ModelError::Envelope(format!(
            "unsupported version {}",
            header.version
        )));
    }
    if header.mechanism != MECH_NONE || signature != MECH_NONE {
        return Err(ModelError::Envelope(format!(
            "unsupported mechanism {}",
            header.mechanism
        )));
    }

    let payload = STANDARD
        .decode(payload)
        .map_err(|e| ModelError::Envelope(format!("payload: {e}")))?;

    Ok(Unwrapped {
        payload,
        mechanism: header.mechanism,
        userid: header.userid,
    })
}
