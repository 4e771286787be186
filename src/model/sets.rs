use uuid::Uuid;

/// Canonical form for stored id sets: sorted and deduplicated, so that
/// two equal sets serialize to identical JSON. Every derived set field
/// (editors, badges, allGroups, ...) goes through this before a
/// conditional write compares it against the stored value.
pub fn canonical(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort();
    ids.dedup();
    ids
}

/// Union of two id sets, in canonical form.
pub fn union(a: &[Uuid], b: &[Uuid]) -> Vec<Uuid> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    canonical(out)
}

/// Whether the two sets share at least one id.
pub fn intersects(a: &[Uuid], b: &[Uuid]) -> bool {
    a.iter().any(|id| b.contains(id))
}
