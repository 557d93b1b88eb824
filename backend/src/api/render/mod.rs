//! Module for the record-session rendering API.
//!
//! An external system opens `/video?crd=..&ov=..` in the browser; the backend
//! remembers those values and redirects to the recording frontend, which then
//! fetches them back through `/render/getRecordData`.

pub mod handlers;
pub mod routes;

use serde::{Deserialize, Serialize};

/// The clinical record and visit the next recording belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecordSession {
    pub crd_id: String,
    pub ov: Option<u32>,
}

impl Default for RecordSession {
    fn default() -> Self {
        Self {
            crd_id: "001-T-CRD".to_string(),
            ov: Some(1),
        }
    }
}
