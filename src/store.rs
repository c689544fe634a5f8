//! The storage port.
//!
//! Every entity screen talks to its table through a [`RecordStore`]. There is one implementation family, the SeaORM
//! managers in [`db::entity`](crate::db::entity), regardless of the backend the connection points to.
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::str::FromStr;

use async_trait::async_trait;
use garde::Validate;
use strum::IntoEnumIterator;

use crate::types::DeskError;
use crate::types::Result;

/// Row-oriented access to one table.
#[async_trait]
pub trait RecordStore: Debug + Send + Sync + 'static {
    type Record: Listed;
    /// Raw user input, as typed into the form.
    type Form: Form;

    /// All rows, in the default order of the record's sort key.
    async fn list_all(&self) -> Result<Vec<Self::Record>>;
    async fn get_by_id(&self, id: i32) -> Result<Option<Self::Record>>;
    /// Validate the form and insert a new row. The returned record carries the assigned ID.
    async fn insert(&self, form: &Self::Form) -> Result<Self::Record>;
    /// Validate the form and overwrite row `id` with it.
    async fn update(&self, id: i32, form: &Self::Form) -> Result<Self::Record>;
    /// Remove row `id`. Fails with [`DeskError::Conflict`] when other rows depend on it.
    async fn delete(&self, id: i32) -> Result<()>;
}

/// A record that can be displayed in a filtered and sorted list.
pub trait Listed: Debug + Clone + Send + Sync + 'static {
    type Sort: SortKey<Self>;

    /// Human name of the entity, used in messages.
    const ENTITY: &'static str;

    fn id(&self) -> i32;

    /// Values the filter text is matched against.
    fn search_fields(&self) -> Vec<String>;

    /// `needle` is expected to be lowercase already. An empty needle matches everything.
    fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Closed set of sort orders offered for a record type.
///
/// The [`Default`] variant is the order rows are loaded in. Names and indices that don't map to a variant fall back to
/// it.
pub trait SortKey<R>:
    Copy + Default + Debug + Display + PartialEq + FromStr + IntoEnumIterator + Send + Sync + 'static
{
    fn comparator(self) -> fn(&R, &R) -> Ordering;

    /// Variant by its position in the list of options.
    fn from_index(index: usize) -> Option<Self>;

    fn parse_or_default(name: &str) -> Self {
        name.trim().parse().unwrap_or_default()
    }

    fn index_or_default(index: usize) -> Self {
        Self::from_index(index).unwrap_or_default()
    }

    fn options() -> Vec<Self> {
        Self::iter().collect()
    }
}

/// User input for a record.
pub trait Form: Validate<Context = ()> + Debug + Send + Sync {
    /// Run declarative validation and turn the report into a [`DeskError::Validation`].
    fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|report| DeskError::validation(report.to_string().trim_end()))
    }
}

pub(crate) fn not_blank(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        Err(garde::Error::new("must not be empty"))
    }
    else {
        Ok(())
    }
}

pub(crate) fn integer(value: &str, _ctx: &()) -> garde::Result {
    not_blank(value, &())?;
    value
        .trim()
        .parse::<i32>()
        .map(|_| ())
        .map_err(|_| garde::Error::new("must be an integer"))
}

pub(crate) fn optional_integer(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        Ok(())
    }
    else {
        integer(value, &())
    }
}

pub(crate) fn number(value: &str, _ctx: &()) -> garde::Result {
    not_blank(value, &())?;
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(()),
        _ => Err(garde::Error::new("must be a number")),
    }
}

pub(crate) fn parse_int(field: &str, value: &str) -> Result<i32> {
    value
        .trim()
        .parse()
        .map_err(|_| DeskError::validation(format!("{field}: must be an integer")))
}

pub(crate) fn parse_opt_int(field: &str, value: &str) -> Result<Option<i32>> {
    if value.trim().is_empty() {
        Ok(None)
    }
    else {
        parse_int(field, value).map(Some)
    }
}

pub(crate) fn parse_number(field: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| DeskError::validation(format!("{field}: must be a number")))
}

pub(crate) fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

pub(crate) fn trimmed_opt(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Case-insensitive ordering of text columns; exact case only decides between otherwise equal values.
pub fn text_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validators() {
        assert!(not_blank("x", &()).is_ok());
        assert!(not_blank("  \t", &()).is_err());
        assert!(integer(" 42 ", &()).is_ok());
        assert!(integer("4.2", &()).is_err());
        assert!(integer("", &()).is_err());
        assert!(optional_integer("", &()).is_ok());
        assert!(optional_integer("x", &()).is_err());
        assert!(number("12.50", &()).is_ok());
        assert!(number("NaN", &()).is_err());
        assert!(number("twelve", &()).is_err());
    }

    #[test]
    fn test_parsers() {
        assert_eq!(parse_int("id", " 7").unwrap(), 7);
        assert!(matches!(parse_int("id", "seven"), Err(DeskError::Validation(_))));
        assert_eq!(parse_opt_int("category", " ").unwrap(), None);
        assert_eq!(parse_number("price", "9.99").unwrap(), 9.99);
        assert_eq!(trimmed_opt("  "), None);
        assert_eq!(trimmed_opt(" a "), Some("a".to_string()));
    }

    #[test]
    fn test_text_cmp() {
        assert_eq!(text_cmp("apple", "Banana"), Ordering::Less);
        assert_eq!(text_cmp("Zed", "alpha"), Ordering::Greater);
        assert_eq!(text_cmp("same", "same"), Ordering::Equal);
    }
}
