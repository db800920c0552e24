//! Column model for the SDK

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Data type assigned to a column, either by backend inference or by the user
///
/// The backend reports types in several vocabularies (pandas dtypes such as
/// `int64` / `object`, or its own `INTEGER` / `TEXT` choices). All of them are
/// folded into this canonical set when a payload is decoded.
///
/// # Example
///
/// ```rust
/// use data_alchemy_sdk::models::DataType;
///
/// let dtype: DataType = "float64".parse().unwrap();
/// assert_eq!(dtype, DataType::Decimal);
/// assert_eq!(dtype.as_backend(), "FLOAT");
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Integer,
    Decimal,
    Text,
    Datetime,
    Boolean,
    Category,
}

impl DataType {
    /// All selectable types, in the order they are offered to the user
    pub const ALL: [DataType; 6] = [
        DataType::Integer,
        DataType::Decimal,
        DataType::Text,
        DataType::Datetime,
        DataType::Boolean,
        DataType::Category,
    ];

    /// Parse any spelling the backend is known to emit (case-insensitive)
    pub fn from_backend(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "int64" | "int" | "integer" => Some(DataType::Integer),
            "float64" | "float" | "decimal" | "number" => Some(DataType::Decimal),
            "object" | "text" | "string" | "str" => Some(DataType::Text),
            "datetime64" | "datetime" | "date" | "timestamp" => Some(DataType::Datetime),
            "bool" | "boolean" => Some(DataType::Boolean),
            "category" | "categorical" => Some(DataType::Category),
            _ => None,
        }
    }

    /// Name used for `targetType` in type conversion requests
    pub fn as_backend(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Decimal => "FLOAT",
            DataType::Text => "TEXT",
            DataType::Datetime => "DATETIME",
            DataType::Boolean => "BOOLEAN",
            DataType::Category => "CATEGORY",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            DataType::Integer => "Integer",
            DataType::Decimal => "Float",
            DataType::Text => "Text",
            DataType::Datetime => "Date",
            DataType::Boolean => "Boolean",
            DataType::Category => "Category",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Integer => "integer",
            DataType::Decimal => "decimal",
            DataType::Text => "text",
            DataType::Datetime => "datetime",
            DataType::Boolean => "boolean",
            DataType::Category => "category",
        };
        f.write_str(name)
    }
}

/// Error returned when a type name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown data type: {0}")]
pub struct UnknownDataType(pub String);

impl FromStr for DataType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::from_backend(s).ok_or_else(|| UnknownDataType(s.to_string()))
    }
}

/// Column metadata of a processed dataset
///
/// `user_type` holds an override chosen by the user; when it is `None` the
/// column is treated as having its inferred type.
///
/// # Example
///
/// ```rust
/// use data_alchemy_sdk::models::{ColumnMeta, DataType};
///
/// let column = ColumnMeta::new("3", "age", 2, DataType::Integer);
/// assert_eq!(column.effective_type(), DataType::Integer);
///
/// let column = column.with_user_type(DataType::Text);
/// assert_eq!(column.effective_type(), DataType::Text);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Backend identifier used for type conversion requests
    pub id: String,
    /// Column name (unique within a snapshot)
    pub name: String,
    /// Zero-based position in the source file
    pub column_index: u32,
    /// Type assigned by backend inference
    pub inferred_type: DataType,
    /// User override, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<DataType>,
}

impl ColumnMeta {
    /// Create a column without a user override
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        column_index: u32,
        inferred_type: DataType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            column_index,
            inferred_type,
            user_type: None,
        }
    }

    /// Set the user override
    pub fn with_user_type(mut self, user_type: DataType) -> Self {
        self.user_type = Some(user_type);
        self
    }

    /// The type currently in force for this column
    pub fn effective_type(&self) -> DataType {
        self.user_type.unwrap_or(self.inferred_type)
    }

    /// Whether the user changed the inferred type
    pub fn is_overridden(&self) -> bool {
        self.user_type.is_some_and(|t| t != self.inferred_type)
    }
}

/// A type change the user picked but has not applied yet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingOverride {
    pub column: ColumnMeta,
    pub new_type: DataType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pandas_dtypes() {
        assert_eq!(DataType::from_backend("int64"), Some(DataType::Integer));
        assert_eq!(DataType::from_backend("float64"), Some(DataType::Decimal));
        assert_eq!(DataType::from_backend("object"), Some(DataType::Text));
        assert_eq!(DataType::from_backend("datetime64"), Some(DataType::Datetime));
        assert_eq!(DataType::from_backend("bool"), Some(DataType::Boolean));
        assert_eq!(DataType::from_backend("category"), Some(DataType::Category));
    }

    #[test]
    fn test_parse_backend_choices() {
        assert_eq!(DataType::from_backend("INTEGER"), Some(DataType::Integer));
        assert_eq!(DataType::from_backend("FLOAT"), Some(DataType::Decimal));
        assert_eq!(DataType::from_backend("Text"), Some(DataType::Text));
        assert_eq!(DataType::from_backend("DATE"), Some(DataType::Datetime));
        assert_eq!(DataType::from_backend(" boolean "), Some(DataType::Boolean));
        assert_eq!(DataType::from_backend("complex128"), None);
    }

    #[test]
    fn test_backend_name_parses_back() {
        for dtype in DataType::ALL {
            assert_eq!(DataType::from_backend(dtype.as_backend()), Some(dtype));
        }
    }

    #[test]
    fn test_from_str_error() {
        let err = "money".parse::<DataType>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown data type: money");
    }

    #[test]
    fn test_effective_type() {
        let column = ColumnMeta::new("1", "id", 0, DataType::Integer);
        assert_eq!(column.effective_type(), DataType::Integer);
        assert!(!column.is_overridden());

        let same = column.clone().with_user_type(DataType::Integer);
        assert!(!same.is_overridden());

        let changed = column.with_user_type(DataType::Category);
        assert_eq!(changed.effective_type(), DataType::Category);
        assert!(changed.is_overridden());
    }
}
