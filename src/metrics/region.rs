/// Severity weight of each body region, 3 being the most critical for flying.
///
/// Lookup is an exact, case-sensitive match on the label the body map
/// submits. Regions not listed weigh 0.
const REGION_WEIGHTS: &[(&str, u8)] = &[
    ("Tórax", 3),
    ("Coluna Torácica", 3),
    ("Coluna Lombar", 3),
    ("Pelve e Nádegas", 3),
    ("Quadril e virilha", 3),
    ("Cabeça", 2),
    ("Ombro", 2),
    ("Joelho", 2),
    ("Coxa", 2),
    ("Punho e Mão", 1),
    ("Antebraço", 1),
    ("Perna, Tornozelo e Pé", 1),
    ("Cotovelo", 1),
];

pub fn region_weight(location: &str) -> u8 {
    REGION_WEIGHTS
        .iter()
        .find(|(name, _)| *name == location)
        .map(|(_, weight)| *weight)
        .unwrap_or(0)
}

/// Every region carrying a non-zero weight
pub fn weighted_regions() -> impl Iterator<Item = (&'static str, u8)> {
    REGION_WEIGHTS.iter().copied()
}
