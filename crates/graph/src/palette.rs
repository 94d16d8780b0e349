use crate::model::ConflictKind;

pub const DEFAULT_GROUP_COLOR: &str = "#95a5a6";

const GROUP_COLORS: &[(&str, &str)] = &[
    ("ITI-1V", "#3498db"),
    ("ITI-2M1", "#e74c3c"),
    ("ITI-2M2", "#e67e22"),
    ("ITI-2V", "#9b59b6"),
    ("ITI-4V", "#1abc9c"),
    ("ITI-5M1", "#f39c12"),
    ("ITI-5M2", "#d35400"),
    ("ITI-5V", "#16a085"),
    ("ITI-7V", "#27ae60"),
    ("ITI-8M", "#2980b9"),
    ("ITI-8V", "#8e44ad"),
];

/// Fill color for a node of `grupo`.
pub fn group_color(grupo: Option<&str>) -> &'static str {
    grupo
        .and_then(|g| GROUP_COLORS.iter().find(|(name, _)| *name == g))
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_GROUP_COLOR)
}

pub fn edge_color(kind: ConflictKind) -> &'static str {
    match kind {
        ConflictKind::Profesor => "#e74c3c",
        ConflictKind::Horario => "#3498db",
    }
}

/// Short label drawn inside a node circle.
///
/// Words of two characters or fewer ("de", "y") are skipped. A single
/// remaining word yields its first two characters; otherwise the first
/// letter of up to three words.
pub fn initials(nombre: &str) -> String {
    let words: Vec<&str> = nombre
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .collect();

    match words.as_slice() {
        [] => String::new(),
        [word] => word.chars().take(2).collect::<String>().to_uppercase(),
        many => many
            .iter()
            .take(3)
            .filter_map(|w| w.chars().next())
            .collect::<String>()
            .to_uppercase(),
    }
}
