use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Storage-assigned identifier of a book.
pub type BookId = i32;

/// Latest publication year the catalog accepts.
pub const MAX_PUBLICATION_YEAR: i32 = 2025;

/// Reading progress of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Planned,
    Reading,
    Completed,
}

impl BookStatus {
    pub const ALL: [BookStatus; 3] = [
        BookStatus::Planned,
        BookStatus::Reading,
        BookStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Planned => "planned",
            BookStatus::Reading => "reading",
            BookStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("status must be planned, reading or completed, got '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for BookStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        BookStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

/// A persisted catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub year: i32,
    pub status: BookStatus,
}

/// Request body for creating or replacing a book.
///
/// `status` stays free text here so that unknown values reach business
/// validation instead of failing JSON parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRequest {
    pub title: String,
    pub author: String,
    pub year: i32,
    pub status: String,
}

impl BookRequest {
    /// Names of required fields that are blank or zero.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.author.trim().is_empty() {
            missing.push("author");
        }
        if self.year == 0 {
            missing.push("year");
        }
        if self.status.trim().is_empty() {
            missing.push("status");
        }
        missing
    }
}

/// A validated book that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub year: i32,
    pub status: BookStatus,
}

impl NewBook {
    /// Attach the storage-assigned id.
    pub fn with_id(self, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            year: self.year,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> BookRequest {
        BookRequest {
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            year: 1965,
            status: "planned".to_string(),
        }
    }

    #[test]
    fn status_parses_known_values_only() {
        assert_eq!("reading".parse::<BookStatus>(), Ok(BookStatus::Reading));
        assert_eq!("completed".parse::<BookStatus>(), Ok(BookStatus::Completed));
        assert_eq!(
            "Reading".parse::<BookStatus>(),
            Err(UnknownStatus("Reading".to_string()))
        );
        assert!("".parse::<BookStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&BookStatus::Planned).unwrap();
        assert_eq!(json, "\"planned\"");
    }

    #[test]
    fn complete_request_has_no_missing_fields() {
        assert!(request().missing_fields().is_empty());
    }

    #[test]
    fn blank_and_zero_fields_are_missing() {
        let req = BookRequest {
            title: "  ".to_string(),
            author: String::new(),
            year: 0,
            status: String::new(),
        };
        assert_eq!(req.missing_fields(), vec!["title", "author", "year", "status"]);
    }

    #[test]
    fn negative_year_is_not_missing() {
        let req = BookRequest {
            year: -400,
            ..request()
        };
        assert!(req.missing_fields().is_empty());
    }

    #[test]
    fn request_without_status_fails_to_parse() {
        let err = serde_json::from_str::<BookRequest>(
            r#"{"title":"Dune","author":"Herbert","year":1965}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("status"));
    }
}
