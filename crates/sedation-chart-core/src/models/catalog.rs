//! Medication catalog models.

use serde::{Deserialize, Serialize};

/// A single medication in the externally supplied catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    /// Stable identifier referenced by monitoring-log entries
    pub id: String,
    /// Name shown in pickers and read-only projections
    pub display_name: String,
    /// Grouping (e.g., "Benzodiazepine", "Opioid", "Reversal Agent")
    pub category: String,
}

impl Medication {
    /// Create a new catalog medication.
    pub fn new(id: String, display_name: String, category: String) -> Self {
        Self {
            id,
            display_name,
            category,
        }
    }
}

/// Immutable id → medication lookup table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MedicationCatalog {
    items: Vec<Medication>,
}

impl MedicationCatalog {
    /// Build a catalog from a list of medications. Later duplicates of an id are ignored.
    pub fn new(items: Vec<Medication>) -> Self {
        let mut unique: Vec<Medication> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.iter().any(|m| m.id == item.id) {
                unique.push(item);
            }
        }
        Self { items: unique }
    }

    /// Parse a catalog from a JSON array of `{id, display_name, category}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let items: Vec<Medication> = serde_json::from_str(json)?;
        Ok(Self::new(items))
    }

    /// Look up a medication by id.
    pub fn get(&self, id: &str) -> Option<&Medication> {
        self.items.iter().find(|m| m.id == id)
    }

    /// Resolve an id to its display name; unknown ids resolve to themselves.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|m| m.display_name.as_str()).unwrap_or(id)
    }

    /// Resolve a list of ids to a comma-separated list of names.
    pub fn display_names(&self, ids: &[String]) -> String {
        ids.iter()
            .map(|id| self.display_name(id))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Medications in a category, in catalog order.
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Medication> {
        self.items
            .iter()
            .filter(move |m| m.category.eq_ignore_ascii_case(category))
    }

    /// All medications, in catalog order.
    pub fn items(&self) -> &[Medication] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_catalog() -> MedicationCatalog {
        MedicationCatalog::new(vec![
            Medication::new("midazolam".into(), "Midazolam".into(), "Benzodiazepine".into()),
            Medication::new("fentanyl".into(), "Fentanyl".into(), "Opioid".into()),
            Medication::new("flumazenil".into(), "Flumazenil".into(), "Reversal Agent".into()),
            Medication::new("naloxone".into(), "Naloxone".into(), "Reversal Agent".into()),
        ])
    }

    #[test]
    fn test_display_name_lookup() {
        let catalog = make_catalog();
        assert_eq!(catalog.display_name("midazolam"), "Midazolam");
        assert_eq!(catalog.display_name("unknown-med"), "unknown-med");
    }

    #[test]
    fn test_display_names_joined() {
        let catalog = make_catalog();
        let ids = vec!["fentanyl".to_string(), "midazolam".to_string()];
        assert_eq!(catalog.display_names(&ids), "Fentanyl, Midazolam");
        assert_eq!(catalog.display_names(&[]), "");
    }

    #[test]
    fn test_duplicate_ids_ignored() {
        let catalog = MedicationCatalog::new(vec![
            Medication::new("a".into(), "First".into(), "X".into()),
            Medication::new("a".into(), "Second".into(), "X".into()),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.display_name("a"), "First");
    }

    #[test]
    fn test_by_category() {
        let catalog = make_catalog();
        let reversal: Vec<_> = catalog.by_category("reversal agent").map(|m| m.id.as_str()).collect();
        assert_eq!(reversal, vec!["flumazenil", "naloxone"]);
    }

    #[test]
    fn test_from_json() {
        let json = r#"[{"id": "propofol", "display_name": "Propofol", "category": "Hypnotic"}]"#;
        let catalog = MedicationCatalog::from_json(json).unwrap();
        assert_eq!(catalog.get("propofol").unwrap().category, "Hypnotic");
    }
}
