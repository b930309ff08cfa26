//! Structured response envelope (spec §4.11): `{ ok, data | error }`.

use qpg_model::Error as QpgError;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Envelope<T: Serialize> {
    Ok { ok: bool, data: T },
    Err { ok: bool, error: ErrorBody },
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope::Ok { ok: true, data }
    }
}

impl Envelope<()> {
    pub fn err(error: &QpgError) -> Self {
        Envelope::Err {
            ok: false,
            error: ErrorBody {
                code: error.code(),
                message: error.to_string(),
            },
        }
    }
}
