//! Input-time rules applied when a field is edited.
//!
//! These run before anything is validated or saved: negating options are
//! mutually exclusive with the rest of their group, "Other" companions are
//! cleared when "Other" is deselected, and an arch set to no treatment drops
//! its surgery type.

use crate::models::{
    Arch, ArchField, Field, FieldRegistry, MorningMedications, SelectGroup, TextField,
    NO_TREATMENT, OTHER_OPTION, TREATMENT_OPTIONS,
};

use super::{FormError, FormResult};

/// A single user edit.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Text(TextField, String),
    Arch(ArchField, Arch, String),
    Toggle(SelectGroup, String),
    OtherText(SelectGroup, String),
    MorningMedications(MorningMedications),
}

/// Toggle `option` within a group's current selection.
///
/// Choosing the negating option leaves it as the only member; choosing any
/// other option first removes the negating one.
pub fn toggle_option(group: SelectGroup, current: &[String], option: &str) -> Vec<String> {
    let mut next: Vec<String> = current.to_vec();
    if let Some(pos) = next.iter().position(|o| o == option) {
        next.remove(pos);
        return next;
    }

    let negating = group.negating_option();
    if negating == Some(option) {
        return vec![option.to_string()];
    }
    if let Some(negating) = negating {
        next.retain(|o| o != negating);
    }
    next.push(option.to_string());
    next
}

/// Drop every other option when the negating option is present alongside them.
pub fn normalize_selection(group: SelectGroup, options: Vec<String>) -> Vec<String> {
    match group.negating_option() {
        Some(negating) if options.len() > 1 && options.iter().any(|o| o == negating) => {
            vec![negating.to_string()]
        }
        _ => options,
    }
}

/// Whether an option can currently be chosen (disabled while the negating option is selected).
pub fn is_option_enabled(registry: &FieldRegistry, group: SelectGroup, option: &str) -> bool {
    match group.negating_option() {
        Some(negating) if option != negating => !registry.is_selected(group, negating),
        _ => true,
    }
}

/// Apply an edit, returning the fields whose stored value changed.
pub fn apply_edit(registry: &mut FieldRegistry, edit: FieldEdit) -> FormResult<Vec<Field>> {
    match edit {
        FieldEdit::Text(field, value) => {
            registry.set_text(field, value);
            Ok(vec![Field::Text(field)])
        }
        FieldEdit::Arch(ArchField::Treatment, arch, value) => {
            if !value.is_empty() && !TREATMENT_OPTIONS.contains(&value.as_str()) {
                return Err(FormError::UnknownOption {
                    field: ArchField::Treatment.label(arch),
                    option: value,
                });
            }
            let mut changed = vec![Field::Arch(ArchField::Treatment)];
            let clears_surgery = value == NO_TREATMENT
                && !registry.arch(ArchField::SurgeryType, arch).is_empty();
            registry.set_arch(ArchField::Treatment, arch, value);
            if clears_surgery {
                registry.set_arch(ArchField::SurgeryType, arch, String::new());
                changed.push(Field::Arch(ArchField::SurgeryType));
            }
            Ok(changed)
        }
        FieldEdit::Arch(ArchField::SurgeryType, arch, value) => {
            if registry.arch(ArchField::Treatment, arch) == NO_TREATMENT && !value.is_empty() {
                return Err(FormError::NotApplicable(ArchField::SurgeryType.label(arch)));
            }
            registry.set_arch(ArchField::SurgeryType, arch, value);
            Ok(vec![Field::Arch(ArchField::SurgeryType)])
        }
        FieldEdit::Toggle(group, option) => {
            if !group.accepts(&option) {
                return Err(FormError::UnknownOption {
                    field: group.label(),
                    option,
                });
            }
            let next = toggle_option(group, registry.selection(group), &option);
            let drops_other = registry.is_selected(group, OTHER_OPTION)
                && !next.iter().any(|o| o == OTHER_OPTION)
                && !registry.other_text(group).is_empty();
            registry.set_selection(group, next);

            let mut changed = vec![Field::Select(group)];
            if drops_other {
                registry.set_other_text(group, String::new());
                changed.push(Field::OtherText(group));
            }
            Ok(changed)
        }
        FieldEdit::OtherText(group, value) => {
            if !group.has_other() {
                return Err(FormError::UnknownField(format!("{} (Other)", group.label())));
            }
            if !registry.is_selected(group, OTHER_OPTION) && !value.is_empty() {
                return Err(FormError::NotApplicable(group.label()));
            }
            registry.set_other_text(group, value);
            Ok(vec![Field::OtherText(group)])
        }
        FieldEdit::MorningMedications(value) => {
            if value.has_reserved_detail() {
                return Err(FormError::ReservedDetail(value.detail.trim().to_string()));
            }
            registry.set_morning_medications(value);
            Ok(vec![Field::MorningMedications])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_negating_option_becomes_singleton() {
        let current = strings(&["Latex", "Sulfa"]);
        let next = toggle_option(SelectGroup::Allergies, &current, "NKDA");
        assert_eq!(next, strings(&["NKDA"]));
    }

    #[test]
    fn test_other_option_removes_negating() {
        let current = strings(&["NKDA"]);
        let next = toggle_option(SelectGroup::Allergies, &current, "Latex");
        assert_eq!(next, strings(&["Latex"]));
    }

    #[test]
    fn test_toggle_deselects() {
        let current = strings(&["Latex", "Sulfa"]);
        let next = toggle_option(SelectGroup::Allergies, &current, "Latex");
        assert_eq!(next, strings(&["Sulfa"]));
        let next = toggle_option(SelectGroup::Allergies, &strings(&["NKDA"]), "NKDA");
        assert!(next.is_empty());
    }

    #[test]
    fn test_group_without_negating_option() {
        let next = toggle_option(SelectGroup::AdministrationRoute, &strings(&["IV"]), "IM");
        assert_eq!(next, strings(&["IV", "IM"]));
    }

    #[test]
    fn test_normalize_selection() {
        let normalized =
            normalize_selection(SelectGroup::Allergies, strings(&["Latex", "NKDA"]));
        assert_eq!(normalized, strings(&["NKDA"]));
        let untouched = normalize_selection(SelectGroup::Allergies, strings(&["Latex"]));
        assert_eq!(untouched, strings(&["Latex"]));
    }

    #[test]
    fn test_options_disabled_while_negated() {
        let mut registry = FieldRegistry::default();
        apply_edit(&mut registry, FieldEdit::Toggle(SelectGroup::Allergies, "NKDA".into())).unwrap();
        assert!(!is_option_enabled(&registry, SelectGroup::Allergies, "Latex"));
        assert!(is_option_enabled(&registry, SelectGroup::Allergies, "NKDA"));
        assert!(is_option_enabled(&registry, SelectGroup::AdministrationRoute, "IV"));
    }

    #[test]
    fn test_unknown_option_rejected() {
        let mut registry = FieldRegistry::default();
        let result = apply_edit(
            &mut registry,
            FieldEdit::Toggle(SelectGroup::Allergies, "Peanuts".into()),
        );
        assert!(matches!(result, Err(FormError::UnknownOption { .. })));
        assert!(registry.selection(SelectGroup::Allergies).is_empty());
    }

    #[test]
    fn test_deselecting_other_clears_companion_text() {
        let mut registry = FieldRegistry::default();
        apply_edit(&mut registry, FieldEdit::Toggle(SelectGroup::Allergies, "Other".into())).unwrap();
        apply_edit(
            &mut registry,
            FieldEdit::OtherText(SelectGroup::Allergies, "Shellfish".into()),
        )
        .unwrap();
        assert_eq!(registry.other_text(SelectGroup::Allergies), "Shellfish");

        let changed =
            apply_edit(&mut registry, FieldEdit::Toggle(SelectGroup::Allergies, "NKDA".into()))
                .unwrap();
        assert_eq!(
            changed,
            vec![
                Field::Select(SelectGroup::Allergies),
                Field::OtherText(SelectGroup::Allergies)
            ]
        );
        assert_eq!(registry.other_text(SelectGroup::Allergies), "");
    }

    #[test]
    fn test_other_text_requires_other_selected() {
        let mut registry = FieldRegistry::default();
        let result = apply_edit(
            &mut registry,
            FieldEdit::OtherText(SelectGroup::Allergies, "Shellfish".into()),
        );
        assert!(matches!(result, Err(FormError::NotApplicable(_))));

        let result = apply_edit(
            &mut registry,
            FieldEdit::OtherText(SelectGroup::AdministrationRoute, "Rectal".into()),
        );
        assert!(matches!(result, Err(FormError::UnknownField(_))));
    }

    #[test]
    fn test_no_treatment_clears_surgery_type() {
        let mut registry = FieldRegistry::default();
        apply_edit(
            &mut registry,
            FieldEdit::Arch(ArchField::Treatment, Arch::Upper, "FULL ARCH FIXED".into()),
        )
        .unwrap();
        apply_edit(
            &mut registry,
            FieldEdit::Arch(ArchField::SurgeryType, Arch::Upper, "All-on-4".into()),
        )
        .unwrap();

        let changed = apply_edit(
            &mut registry,
            FieldEdit::Arch(ArchField::Treatment, Arch::Upper, NO_TREATMENT.into()),
        )
        .unwrap();
        assert!(changed.contains(&Field::Arch(ArchField::SurgeryType)));
        assert_eq!(registry.arch(ArchField::SurgeryType, Arch::Upper), "");

        let result = apply_edit(
            &mut registry,
            FieldEdit::Arch(ArchField::SurgeryType, Arch::Upper, "All-on-4".into()),
        );
        assert!(matches!(result, Err(FormError::NotApplicable(_))));
    }

    #[test]
    fn test_unknown_treatment_rejected() {
        let mut registry = FieldRegistry::default();
        let result = apply_edit(
            &mut registry,
            FieldEdit::Arch(ArchField::Treatment, Arch::Lower, "WHITENING".into()),
        );
        assert!(matches!(result, Err(FormError::UnknownOption { .. })));
    }

    #[test]
    fn test_morning_medication_detail_must_read_back() {
        let mut registry = FieldRegistry::default();
        for detail in ["no", "YES"] {
            let result = apply_edit(
                &mut registry,
                FieldEdit::MorningMedications(MorningMedications::yes(detail)),
            );
            assert!(matches!(result, Err(FormError::ReservedDetail(_))));
        }
        assert_eq!(registry.morning_medications(), &MorningMedications::default());

        apply_edit(
            &mut registry,
            FieldEdit::MorningMedications(MorningMedications::yes("Metformin")),
        )
        .unwrap();
        let stored = registry.morning_medications().to_column();
        assert_eq!(MorningMedications::from_column(&stored), MorningMedications::yes("Metformin"));
    }
}
