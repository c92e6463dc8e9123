use std::collections::BTreeSet;

use super::catalog::{Catalog, Persona, Section};

/// Unsegmented general audience: no filtering, default weights.
pub const DEFAULT_PERSONA: &str = "default";

pub fn default_personas() -> Vec<Persona> {
    vec![Persona::new(DEFAULT_PERSONA, "General")]
}

/// An empty label set admits every persona.
pub(crate) fn labels_admit(labels: &BTreeSet<String>, persona: &str) -> bool {
    labels.is_empty() || labels.contains(persona)
}

/// Normalizes a raw persona id coming from a request or a stored preference.
///
/// Blank ids fall back to [`DEFAULT_PERSONA`]. Ids missing from a non-empty
/// registry fall back as well; with an empty registry there is nothing to check
/// against, so any non-blank id is kept.
pub fn resolve_persona(raw: Option<&str>, personas: &[Persona]) -> String {
    let candidate = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return DEFAULT_PERSONA.to_string(),
    };

    if candidate == DEFAULT_PERSONA
        || personas.is_empty()
        || personas.iter().any(|persona| persona.id == candidate)
    {
        candidate.to_string()
    } else {
        DEFAULT_PERSONA.to_string()
    }
}

/// Narrows the catalog to the sections and questions visible to `persona`.
///
/// A section whose labels exclude the persona is dropped whole, whatever its
/// questions declare. Sections left without questions are dropped too. Order is
/// preserved.
pub fn filter_for_persona(catalog: &Catalog, persona: &str) -> Catalog {
    if persona == DEFAULT_PERSONA {
        return catalog.clone();
    }

    catalog
        .sections()
        .iter()
        .filter(|section| section.is_visible_to(persona))
        .filter_map(|section| {
            let items: Vec<_> = section
                .items
                .iter()
                .filter(|question| question.is_visible_to(persona))
                .cloned()
                .collect();
            if items.is_empty() {
                return None;
            }
            Some(Section {
                id: section.id.clone(),
                title: section.title.clone(),
                description: section.description.clone(),
                labels: section.labels.clone(),
                items,
            })
        })
        .collect::<Vec<_>>()
        .into()
}
