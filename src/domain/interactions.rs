use crate::models::InteractionEntity;

/// Interactions whose counterpart appears in `medications`, most severe first.
pub fn find_conflicts(
    interactions: Vec<InteractionEntity>,
    medications: &[String],
) -> Vec<InteractionEntity> {
    let wanted: Vec<String> = medications
        .iter()
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .collect();

    let mut conflicts: Vec<InteractionEntity> = interactions
        .into_iter()
        .filter(|i| wanted.contains(&i.interacts_with.trim().to_lowercase()))
        .collect();
    conflicts.sort_by(|a, b| b.severity().rank().cmp(&a.severity().rank()));
    conflicts
}
