use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::utils::error::CodecError;

/// Outer wire wrapper used uniformly for subscription requests and published
/// events.
///
/// The inner payload travels as its own JSON string inside `data`, so the
/// envelope shape never has to change as payload schemas evolve. Receivers
/// look at the tag first and only then re-decode `data` into the concrete
/// type. An envelope with an unknown tag decodes fine at this level; deciding
/// what to do with the tag is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub tag: String,
    pub data: String,
}

impl Envelope {
    /// Re-decodes the inner payload once the tag is known.
    pub fn payload<P: DeserializeOwned>(&self) -> Result<P, CodecError> {
        Ok(serde_json::from_str(&self.data)?)
    }
}

/// Encodes `payload` under `tag` into the envelope's wire form.
pub fn encode<P: Serialize>(tag: &str, payload: &P) -> Result<String, CodecError> {
    let envelope = Envelope {
        tag: tag.to_string(),
        data: serde_json::to_string(payload)?,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Splits a raw frame into its envelope without interpreting the inner
/// payload.
pub fn decode(raw: &str) -> Result<Envelope, CodecError> {
    Ok(serde_json::from_str(raw)?)
}
