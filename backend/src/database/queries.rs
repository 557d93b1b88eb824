//! Query filters built from request parameters.
//!
//! Filters are parsed from query-string maps. Empty values are ignored so the
//! frontend can always send every key. Each filter renders as a BSON document
//! for MongoDB and can also be evaluated in memory.

use std::collections::HashMap;

use mongodb::bson::{doc, oid::ObjectId, Document};

use super::models::{LogDocument, LogOrigin, LogType, VideoDocument};
use super::StoreError;

fn parse_id(value: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(value).map_err(|_| StoreError::InvalidId(value.to_string()))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFilter {
    pub id: Option<ObjectId>,
    pub log_type: Option<LogType>,
    pub log_origin: Option<LogOrigin>,
}

impl LogFilter {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, StoreError> {
        let mut filter = Self::default();
        for (key, value) in params.iter().filter(|(_, v)| !v.is_empty()) {
            match key.as_str() {
                "id" => filter.id = Some(parse_id(value)?),
                "log_type" => {
                    filter.log_type = Some(value.parse().map_err(StoreError::InvalidFilter)?)
                }
                "log_origin" => {
                    filter.log_origin = Some(value.parse().map_err(StoreError::InvalidFilter)?)
                }
                other => {
                    return Err(StoreError::InvalidFilter(format!(
                        "unknown log filter '{other}'"
                    )))
                }
            }
        }
        Ok(filter)
    }

    pub fn to_document(&self) -> Document {
        let mut query = Document::new();
        if let Some(id) = self.id {
            query.insert("_id", id);
        }
        if let Some(log_type) = self.log_type {
            query.insert("log_type", log_type.as_str());
        }
        if let Some(origin) = self.log_origin {
            query.insert("log_origin", origin.as_str());
        }
        query
    }

    pub fn matches(&self, log: &LogDocument) -> bool {
        self.id.map_or(true, |id| id == log.id)
            && self.log_type.map_or(true, |t| t == log.log_type)
            && self.log_origin.map_or(true, |o| o == log.log_origin)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoFilter {
    pub id: Option<ObjectId>,
    pub crd_id: Option<String>,
    pub filename: Option<String>,
}

impl VideoFilter {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, StoreError> {
        let mut filter = Self::default();
        for (key, value) in params.iter().filter(|(_, v)| !v.is_empty()) {
            match key.as_str() {
                "id" => filter.id = Some(parse_id(value)?),
                "crd_id" => filter.crd_id = Some(value.clone()),
                "filename" => filter.filename = Some(value.clone()),
                other => {
                    return Err(StoreError::InvalidFilter(format!(
                        "unknown video filter '{other}'"
                    )))
                }
            }
        }
        Ok(filter)
    }

    pub fn to_document(&self) -> Document {
        let mut query = doc! {};
        if let Some(id) = self.id {
            query.insert("_id", id);
        }
        if let Some(crd_id) = &self.crd_id {
            query.insert("crd_id", crd_id.as_str());
        }
        if let Some(filename) = &self.filename {
            query.insert("filename", filename.as_str());
        }
        query
    }

    pub fn matches(&self, video: &VideoDocument) -> bool {
        self.id.map_or(true, |id| id == video.id)
            && self.crd_id.as_ref().map_or(true, |c| *c == video.crd_id)
            && self.filename.as_ref().map_or(true, |f| *f == video.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_values_are_ignored() {
        let filter =
            LogFilter::from_params(&params(&[("log_type", "ERROR"), ("log_origin", "")]))
                .expect("filter");
        assert_eq!(filter.log_type, Some(LogType::Error));
        assert_eq!(filter.log_origin, None);
        assert_eq!(filter.to_document(), doc! {"log_type": "ERROR"});
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        assert!(matches!(
            LogFilter::from_params(&params(&[("level", "INFO")])),
            Err(StoreError::InvalidFilter(_))
        ));
        assert!(matches!(
            LogFilter::from_params(&params(&[("log_type", "LOUD")])),
            Err(StoreError::InvalidFilter(_))
        ));
        assert!(matches!(
            VideoFilter::from_params(&params(&[("id", "096asdf")])),
            Err(StoreError::InvalidId(_))
        ));
    }

    #[test]
    fn log_filter_matches_in_memory() {
        let log = LogDocument::new(LogOrigin::Frontend, LogType::Warning, "slow render");
        let by_origin = LogFilter {
            log_origin: Some(LogOrigin::Frontend),
            ..LogFilter::default()
        };
        let by_other_type = LogFilter {
            log_type: Some(LogType::Debug),
            ..LogFilter::default()
        };
        assert!(by_origin.matches(&log));
        assert!(!by_other_type.matches(&log));
        assert!(LogFilter::default().matches(&log));
    }

    #[test]
    fn video_filter_uses_object_ids() {
        let id = ObjectId::new();
        let hex = id.to_hex();
        let filter = VideoFilter::from_params(&params(&[
            ("id", hex.as_str()),
            ("crd_id", "001-T-CRD"),
        ]))
        .expect("filter");
        assert_eq!(
            filter.to_document(),
            doc! {"_id": id, "crd_id": "001-T-CRD"}
        );
    }
}
