use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use mongodb::bson::{Bson, Document};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::store::{id_string, Collection};

/// Store identifier of a request as supplied by callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decision applied to a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestStatus {
    Approved,
    Rejected,
    /// Any other value; the request is discarded without being archived.
    Unrecognized(String),
}

impl RequestStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Unrecognized(raw) => raw,
        }
    }

    /// Collection receiving a copy of the request, if any.
    pub fn destination(&self) -> Option<Collection> {
        match self {
            Self::Approved => Some(Collection::Approved),
            Self::Rejected => Some(Collection::Rejected),
            Self::Unrecognized(_) => None,
        }
    }
}

/// A schema-less ID-card request as held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord(pub Document);

impl RequestRecord {
    pub fn id(&self) -> Option<String> {
        self.0.get("_id").and_then(id_string)
    }

    /// Every field except `_id`, ready to be inserted as a new document.
    pub fn copy_without_id(&self) -> Document {
        let mut fields = self.0.clone();
        fields.remove("_id");
        fields
    }

    /// JSON view with ObjectIds as hex strings and dates as RFC 3339 UTC with milliseconds.
    pub fn to_json(&self) -> Value {
        Value::Object(document_to_json(&self.0))
    }
}

impl From<Document> for RequestRecord {
    fn from(document: Document) -> Self {
        Self(document)
    }
}

impl Serialize for RequestRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn document_to_json(document: &Document) -> Map<String, Value> {
    document
        .iter()
        .map(|(key, value)| (key.clone(), bson_to_json(value)))
        .collect()
}

fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(at) => match DateTime::<Utc>::from_timestamp_millis(at.timestamp_millis()) {
            Some(utc) => Value::String(utc.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => Value::from(at.timestamp_millis()),
        },
        Bson::Document(inner) => Value::Object(document_to_json(inner)),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        other => other.clone().into_relaxed_extjson(),
    }
}
