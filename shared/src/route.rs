use serde::{Deserialize, Serialize};

/// Transit modes that carry a badge on the map. Matches the GTFS route-type
/// families the overlay can draw a glyph for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitMode {
    Tram,
    Subway,
    Rail,
    Bus,
    Ferry,
}

impl TransitMode {
    pub const ALL: [TransitMode; 5] = [
        TransitMode::Tram,
        TransitMode::Subway,
        TransitMode::Rail,
        TransitMode::Bus,
        TransitMode::Ferry,
    ];

    /// Rank used when a stop is served by several modes: the highest-capacity
    /// mode wins the badge slot.
    pub const fn badge_priority(self) -> u8 {
        match self {
            TransitMode::Rail => 0,
            TransitMode::Subway => 1,
            TransitMode::Tram => 2,
            TransitMode::Bus => 3,
            TransitMode::Ferry => 4,
        }
    }

    /// Pick the badge mode for a set of serving modes, or `None` when empty.
    pub fn dominant(modes: impl IntoIterator<Item = TransitMode>) -> Option<TransitMode> {
        modes.into_iter().min_by_key(|mode| mode.badge_priority())
    }
}

/// A route serving one or more stops. Owned by the caller; the overlay keeps
/// a de-duplicated copy keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub short_name: String,
    pub mode: TransitMode,
}

/// Side-car references handed along with a stop batch, the shape the data
/// layer already produces.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct References {
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_prefers_rail_over_everything() {
        let modes = [TransitMode::Bus, TransitMode::Tram, TransitMode::Rail];
        assert_eq!(TransitMode::dominant(modes), Some(TransitMode::Rail));
    }

    #[test]
    fn dominant_orders_full_chain() {
        assert_eq!(
            TransitMode::dominant(TransitMode::ALL),
            Some(TransitMode::Rail)
        );
        assert_eq!(
            TransitMode::dominant([TransitMode::Ferry, TransitMode::Bus]),
            Some(TransitMode::Bus)
        );
        assert_eq!(
            TransitMode::dominant([TransitMode::Ferry]),
            Some(TransitMode::Ferry)
        );
    }

    #[test]
    fn dominant_of_nothing_is_none() {
        assert_eq!(TransitMode::dominant([]), None);
    }

    #[test]
    fn mode_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&TransitMode::Subway).unwrap(),
            "\"subway\""
        );
    }
}
