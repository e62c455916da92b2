//! # Owned-Device ETag
//!
//! `hex(sha256(json({"name": ..., "devices": ...})))` over the caller's
//! visible devices only. Changes to devices the caller cannot see never
//! invalidate it.

use super::errors::OwnershipError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use shared_crypto::constant_time_str_eq;
use shared_types::Devices;

#[derive(Serialize)]
struct EtagInput<'a> {
    name: &'a str,
    devices: &'a Devices,
}

/// ETag of an instance projection.
pub fn compute_etag(name: &str, devices: &Devices) -> Result<String, OwnershipError> {
    let encoded = serde_json::to_vec(&EtagInput { name, devices })
        .map_err(|e| OwnershipError::Internal(e.to_string()))?;
    Ok(hex::encode(Sha256::digest(&encoded)))
}

/// Header form of an ETag.
pub fn quote(etag: &str) -> String {
    format!("\"{etag}\"")
}

/// Compare an `If-Match` value against the current ETag. Surrounding
/// quotes are ignored.
pub fn etag_matches(if_match: &str, etag: &str) -> bool {
    constant_time_str_eq(if_match.trim().trim_matches('"'), etag)
}
