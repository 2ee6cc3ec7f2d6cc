//! Field mapping between canonical transaction fields and CSV headers

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four fields every import must map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalField {
    Date,
    Amount,
    Description,
    Category,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 4] = [
        CanonicalField::Date,
        CanonicalField::Amount,
        CanonicalField::Description,
        CanonicalField::Category,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::Amount => "amount",
            CanonicalField::Description => "description",
            CanonicalField::Category => "category",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Association from canonical fields to raw column headers
///
/// Only lives between "file parsed" and "import confirmed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub date: String,
    pub amount: String,
    pub description: String,
    pub category: String,
}

impl FieldMapping {
    pub fn new(
        date: impl Into<String>,
        amount: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            amount: amount.into(),
            description: description.into(),
            category: category.into(),
        }
    }

    /// Best-guess mapping for a set of detected headers
    ///
    /// For each canonical field, picks the first header whose lowercased text
    /// contains the field name, falling back to the first header. Returns
    /// `None` when there are no headers to choose from. The result is only a
    /// suggestion for the user to edit and confirm.
    pub fn suggest(headers: &[String]) -> Option<Self> {
        let first = headers.first()?;

        let pick = |field: CanonicalField| -> String {
            headers
                .iter()
                .find(|h| h.to_lowercase().contains(field.as_str()))
                .unwrap_or(first)
                .clone()
        };

        Some(Self {
            date: pick(CanonicalField::Date),
            amount: pick(CanonicalField::Amount),
            description: pick(CanonicalField::Description),
            category: pick(CanonicalField::Category),
        })
    }

    /// Header mapped to a canonical field
    pub fn header_for(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::Date => &self.date,
            CanonicalField::Amount => &self.amount,
            CanonicalField::Description => &self.description,
            CanonicalField::Category => &self.category,
        }
    }

    /// Set the header for one canonical field
    pub fn set(&mut self, field: CanonicalField, header: impl Into<String>) {
        let header = header.into();
        match field {
            CanonicalField::Date => self.date = header,
            CanonicalField::Amount => self.amount = header,
            CanonicalField::Description => self.description = header,
            CanonicalField::Category => self.category = header,
        }
    }

    /// Canonical fields whose header is not among `headers`
    pub fn missing_headers(&self, headers: &[String]) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .filter(|f| !headers.iter().any(|h| h == self.header_for(*f)))
            .collect()
    }
}
