use crate::log_debug;
use crate::modules::client_imports::domain::entities::ImportType;
use serde::{Deserialize, Serialize};

/// Target attribute resolved from arbitrary header text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalField {
    Name,
    Email,
    Phone,
    Address,
    Notes,
    Project,
    Source,
    Value,
}

impl CanonicalField {
    /// Column written on the target record
    pub fn column(&self) -> &'static str {
        match self {
            CanonicalField::Name => "name",
            CanonicalField::Email => "email",
            CanonicalField::Phone => "phone",
            CanonicalField::Address => "address",
            CanonicalField::Notes => "notes",
            CanonicalField::Project => "project",
            CanonicalField::Source => "source",
            CanonicalField::Value => "value",
        }
    }

    /// Substring a header must contain to map onto this field
    pub fn needle(&self) -> &'static str {
        match self {
            CanonicalField::Notes => "note",
            other => other.column(),
        }
    }
}

impl ImportType {
    /// Fields recognised for this import type; `name` is always first
    pub fn canonical_fields(&self) -> &'static [CanonicalField] {
        use CanonicalField::*;
        match self {
            ImportType::Customers | ImportType::Projects => {
                &[Name, Email, Phone, Address, Notes]
            }
            ImportType::Leads => &[Name, Email, Phone, Project, Source, Value, Notes],
        }
    }
}

/// Positional index of each canonical field found in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub import_type: ImportType,
    indices: Vec<(CanonicalField, usize)>,
}

impl ColumnMapping {
    pub fn index_of(&self, field: CanonicalField) -> Option<usize> {
        self.indices
            .iter()
            .find(|(candidate, _)| *candidate == field)
            .map(|(_, index)| *index)
    }

    /// Without a name column no row can be imported
    pub fn has_name(&self) -> bool {
        self.index_of(CanonicalField::Name).is_some()
    }

    pub fn mapped_fields(&self) -> impl Iterator<Item = CanonicalField> + '_ {
        self.indices.iter().map(|(field, _)| *field)
    }

    /// Non-empty value of a field in a row; short rows yield `None`
    pub fn value<'a>(&self, field: CanonicalField, row: &'a [String]) -> Option<&'a str> {
        self.index_of(field)
            .and_then(|index| row.get(index))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Maps header names onto canonical fields by substring containment
pub struct ColumnMapper;

impl ColumnMapper {
    /// First header (left to right) containing a field's needle wins; each
    /// field resolves independently, so one header can serve several fields
    pub fn resolve(header: &[String], import_type: ImportType) -> ColumnMapping {
        let indices: Vec<(CanonicalField, usize)> = import_type
            .canonical_fields()
            .iter()
            .filter_map(|field| {
                header
                    .iter()
                    .position(|name| name.to_lowercase().contains(field.needle()))
                    .map(|index| (*field, index))
            })
            .collect();

        log_debug!(
            "Resolved {} of {} {} field(s) from header {:?}",
            indices.len(),
            import_type.canonical_fields().len(),
            import_type,
            header
        );

        ColumnMapping {
            import_type,
            indices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_maps_by_substring() {
        let mapping = ColumnMapper::resolve(
            &header(&["client name", "e-mail / email", "mobile phone"]),
            ImportType::Customers,
        );

        assert_eq!(mapping.index_of(CanonicalField::Name), Some(0));
        assert_eq!(mapping.index_of(CanonicalField::Email), Some(1));
        assert_eq!(mapping.index_of(CanonicalField::Phone), Some(2));
        assert_eq!(mapping.index_of(CanonicalField::Address), None);
        assert!(mapping.has_name());
    }

    #[test]
    fn test_first_matching_header_wins() {
        let mapping =
            ColumnMapper::resolve(&header(&["full_name", "name", "email"]), ImportType::Leads);
        assert_eq!(mapping.index_of(CanonicalField::Name), Some(0));
    }

    #[test]
    fn test_missing_name_column() {
        let mapping = ColumnMapper::resolve(&header(&["email", "phone"]), ImportType::Customers);
        assert!(!mapping.has_name());
        assert_eq!(mapping.index_of(CanonicalField::Email), Some(0));
    }

    #[test]
    fn test_fields_depend_on_import_type() {
        let columns = header(&["name", "lead source", "deal value", "address"]);

        let leads = ColumnMapper::resolve(&columns, ImportType::Leads);
        assert_eq!(leads.index_of(CanonicalField::Source), Some(1));
        assert_eq!(leads.index_of(CanonicalField::Value), Some(2));
        assert_eq!(leads.index_of(CanonicalField::Address), None);

        let customers = ColumnMapper::resolve(&columns, ImportType::Customers);
        assert_eq!(customers.index_of(CanonicalField::Source), None);
        assert_eq!(customers.index_of(CanonicalField::Address), Some(3));
    }

    #[test]
    fn test_value_handles_short_and_blank_cells() {
        let mapping = ColumnMapper::resolve(&header(&["name", "email"]), ImportType::Customers);
        let short_row = vec!["Alice".to_string()];
        let blank_row = vec!["  ".to_string(), "a@x.com".to_string()];

        assert_eq!(mapping.value(CanonicalField::Name, &short_row), Some("Alice"));
        assert_eq!(mapping.value(CanonicalField::Email, &short_row), None);
        assert_eq!(mapping.value(CanonicalField::Name, &blank_row), None);
    }
}
