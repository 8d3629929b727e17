use serde::Serialize;

/// What happened to one sensitive field during a decrypt pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FieldStatus {
    Decrypted,
    /// The field kept its incoming value because it could not be decrypted.
    PassedThrough { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOutcome {
    pub path: String,
    #[serde(flatten)]
    pub status: FieldStatus,
}

impl FieldOutcome {
    pub fn decrypted(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: FieldStatus::Decrypted,
        }
    }

    pub fn passed_through(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: FieldStatus::PassedThrough {
                reason: reason.into(),
            },
        }
    }

    pub fn is_decrypted(&self) -> bool {
        matches!(self.status, FieldStatus::Decrypted)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptReport {
    pub fields: Vec<FieldOutcome>,
}

impl DecryptReport {
    pub fn record(&mut self, outcome: FieldOutcome) {
        self.fields.push(outcome);
    }

    pub fn decrypted_paths(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.is_decrypted())
            .map(|field| field.path.as_str())
            .collect()
    }

    pub fn passed_through_paths(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| !field.is_decrypted())
            .map(|field| field.path.as_str())
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.fields.iter().any(|field| !field.is_decrypted())
    }
}

/// A decrypted value together with its per-field report.
#[derive(Debug, Clone, PartialEq)]
pub struct Decrypted<T> {
    pub value: T,
    pub report: DecryptReport,
}
