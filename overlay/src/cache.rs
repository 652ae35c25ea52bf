//! Bounded bidirectional index between stops and the marker handles the map
//! engine issued for them. Capacity is enforced with a fuzzy full reset
//! rather than per-item eviction; the focused stop always survives a reset.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use stopmap_shared::{Route, RouteMap, Stop, TransitMode, stop_z_bias};

use crate::atlas::{IconAtlas, IconDescriptor, IconVariant};
use crate::config::OverlayConfig;
use crate::engine::{MapEngine, MarkerHandle, MarkerOptions};
use crate::focus::FocusSnapshot;

/// Z tier of the primary stop circles.
pub const Z_PRIMARY: f32 = 1.0;
/// Transit-mode badges draw above the circles.
pub const Z_MODE_BADGE: f32 = 1.2;
/// Platform labels sit between the station tier and the circles.
pub const Z_PLATFORM_LABEL: f32 = 0.7;
/// Station name labels draw underneath everything else.
pub const Z_STATION_LABEL: f32 = 0.1;
/// Stations are lifted above ordinary stop platforms.
pub const Z_STATION_RAISE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelKind {
    Platform,
    Station,
}

#[derive(Debug, Clone)]
struct MarkerRecord {
    stop: Stop,
    primary: MarkerHandle,
    badge: Option<MarkerHandle>,
    label: Option<(MarkerHandle, LabelKind)>,
}

impl MarkerRecord {
    #[cfg(test)]
    fn handles(&self) -> impl Iterator<Item = MarkerHandle> + '_ {
        std::iter::once(self.primary)
            .chain(self.badge)
            .chain(self.label.map(|(handle, _)| handle))
    }
}

pub struct MarkerCache {
    atlas: Arc<IconAtlas>,
    config: OverlayConfig,
    /// Stop id → marker record.
    records: HashMap<String, MarkerRecord>,
    /// Reverse index: every handle we ever issued back to its owning stop.
    owners: HashMap<MarkerHandle, String>,
    /// De-duplicated union of all routes seen across populate calls.
    routes: RouteMap,
}

impl MarkerCache {
    pub fn new(atlas: Arc<IconAtlas>, config: OverlayConfig) -> Self {
        Self {
            atlas,
            config,
            records: HashMap::new(),
            owners: HashMap::new(),
            routes: RouteMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, stop_id: &str) -> bool {
        self.records.contains_key(stop_id)
    }

    /// Reverse lookup for click routing. Unknown handles are a clean
    /// no-match: the click may belong to a different overlay layer.
    pub fn stop_for(&self, handle: MarkerHandle) -> Option<&Stop> {
        let stop_id = self.owners.get(&handle)?;
        self.records.get(stop_id).map(|record| &record.stop)
    }

    pub fn primary_handle(&self, stop_id: &str) -> Option<MarkerHandle> {
        self.records.get(stop_id).map(|record| record.primary)
    }

    pub fn badge_handle(&self, stop_id: &str) -> Option<MarkerHandle> {
        self.records.get(stop_id).and_then(|record| record.badge)
    }

    /// The routes serving `stop`, resolved against the route cache. Route
    /// ids the cache has never seen are silently skipped.
    pub fn serving_routes(&self, stop: &Stop) -> RouteMap {
        stop.route_ids
            .iter()
            .filter_map(|route_id| self.routes.get(route_id))
            .map(|route| (route.id.clone(), route.clone()))
            .collect()
    }

    /// Merges a batch of stops and routes into the cache, creating markers
    /// for stops not yet tracked and refreshing the rest. Returns the number
    /// of newly created stop groups.
    pub fn populate<E: MapEngine>(
        &mut self,
        engine: &mut E,
        stops: &[Stop],
        routes: &[Route],
        focus: Option<&FocusSnapshot>,
    ) -> usize {
        let mut added = 0;

        if self.records.len() >= self.config.max_marker_count {
            debug!(
                cap = self.config.max_marker_count,
                "marker cache exceeded its soft cap, clearing"
            );
            self.clear(engine, focus);
            added += self.records.len();
        }

        for route in routes {
            self.routes
                .entry(route.id.clone())
                .or_insert_with(|| route.clone());
        }

        let focused_id = focus.map(|snapshot| snapshot.stop.id.clone());
        let focused_id = focused_id.as_deref();
        for stop in stops {
            let existing = self
                .records
                .get(&stop.id)
                .map(|record| (record.primary, record.badge, record.label));
            match existing {
                Some((primary, badge, label)) => {
                    let is_focused = focused_id == Some(stop.id.as_str());
                    // A focused stop keeps its focused appearance untouched.
                    if !is_focused {
                        self.refresh_primary(engine, stop, primary, false);
                    }
                    if let Some(handle) = badge {
                        self.refresh_badge(engine, handle, is_focused);
                    }
                    if let Some((handle, kind)) = label {
                        self.refresh_label(engine, handle, kind);
                    }
                }
                None => {
                    self.add_stop(engine, stop, focused_id);
                    added += 1;
                }
            }
        }

        debug!(
            added,
            total = self.records.len(),
            "populated stop markers"
        );
        added
    }

    /// Removes every marker and clears all indices. With a focus snapshot
    /// the focused stop is re-created before this returns, from the routes
    /// saved when it gained focus.
    pub fn clear<E: MapEngine>(&mut self, engine: &mut E, preserve: Option<&FocusSnapshot>) {
        for handle in self.owners.keys() {
            engine.remove_marker(*handle);
        }
        self.records.clear();
        self.owners.clear();
        self.routes.clear();

        if let Some(snapshot) = preserve {
            for route in &snapshot.routes {
                self.routes
                    .entry(route.id.clone())
                    .or_insert_with(|| route.clone());
            }
            self.add_stop(engine, &snapshot.stop, Some(snapshot.stop.id.as_str()));
        }
    }

    /// Recomputes icon variant and badge/label visibility for every tracked
    /// stop at the current zoom. Pure state refresh: no handles are created
    /// or removed.
    pub fn redraw<E: MapEngine>(&self, engine: &mut E, focused_id: Option<&str>) {
        debug!(
            zoom = engine.zoom() as f64,
            stops = self.records.len(),
            "redrawing stops"
        );
        for record in self.records.values() {
            let is_focused = focused_id == Some(record.stop.id.as_str());
            self.refresh_primary(engine, &record.stop, record.primary, is_focused);
            if let Some(handle) = record.badge {
                self.refresh_badge(engine, handle, is_focused);
            }
            if let Some((handle, kind)) = record.label {
                self.refresh_label(engine, handle, kind);
            }
        }
    }

    /// Picks the icon for a stop at the given zoom. Stations never collapse
    /// to the low-zoom dot.
    pub fn icon_for(&self, stop: &Stop, zoom: f32, is_focused: bool) -> IconDescriptor {
        let variant = if is_focused {
            IconVariant::Focused
        } else if zoom > self.config.icon_large_zoom {
            IconVariant::Large
        } else if zoom > self.config.icon_zoom || stop.is_station {
            IconVariant::Normal
        } else {
            return self.atlas.dot();
        };
        self.atlas.stop_icon(stop.direction, variant)
    }

    /// The badge mode for a stop: the dominant mode among its serving
    /// routes, or `None` when no serving route is known.
    pub fn badge_mode(&self, stop: &Stop) -> Option<TransitMode> {
        TransitMode::dominant(
            stop.route_ids
                .iter()
                .filter_map(|route_id| self.routes.get(route_id))
                .map(|route| route.mode),
        )
    }

    pub fn refresh_primary<E: MapEngine>(
        &self,
        engine: &mut E,
        stop: &Stop,
        handle: MarkerHandle,
        is_focused: bool,
    ) {
        let icon = self.icon_for(stop, engine.zoom(), is_focused);
        let (anchor_x, anchor_y) = icon.anchor;
        engine.set_icon(handle, icon);
        engine.set_anchor(handle, anchor_x, anchor_y);
    }

    /// Badges show only at close zoom, and never on the focused stop (the
    /// enlarged focus icon would sit underneath it).
    pub fn refresh_badge<E: MapEngine>(
        &self,
        engine: &mut E,
        handle: MarkerHandle,
        is_focused: bool,
    ) {
        let visible = !is_focused && engine.zoom() > self.config.icon_large_zoom;
        engine.set_visible(handle, visible);
    }

    fn refresh_label<E: MapEngine>(&self, engine: &mut E, handle: MarkerHandle, kind: LabelKind) {
        let zoom = engine.zoom();
        let visible = match kind {
            LabelKind::Platform => zoom > self.config.icon_zoom,
            LabelKind::Station => zoom > self.config.station_label_zoom,
        };
        engine.set_visible(handle, visible);
    }

    fn add_stop<E: MapEngine>(&mut self, engine: &mut E, stop: &Stop, focused_id: Option<&str>) {
        let zoom = engine.zoom();
        let is_focused = focused_id == Some(stop.id.as_str());
        let bias = stop_z_bias(&stop.id);

        let mut z_primary = Z_PRIMARY + bias;
        if stop.is_station {
            z_primary += Z_STATION_RAISE;
        }
        let primary = engine.add_marker(MarkerOptions {
            position: stop.position,
            icon: self.icon_for(stop, zoom, is_focused),
            z_order: z_primary,
            flat: true,
        });
        self.owners.insert(primary, stop.id.clone());

        let badge = self.badge_mode(stop).map(|mode| {
            let handle = engine.add_marker(MarkerOptions {
                position: stop.position,
                icon: self.atlas.badge(mode),
                z_order: Z_MODE_BADGE + bias,
                flat: false,
            });
            self.owners.insert(handle, stop.id.clone());
            handle
        });
        if let Some(handle) = badge {
            self.refresh_badge(engine, handle, is_focused);
        }

        let label = if stop.has_platform_code() {
            let code = stop.platform_code.as_deref().unwrap_or_default();
            let handle = engine.add_marker(MarkerOptions {
                position: stop.position,
                icon: self.atlas.platform_label(code),
                z_order: Z_PLATFORM_LABEL + bias,
                flat: false,
            });
            self.owners.insert(handle, stop.id.clone());
            Some((handle, LabelKind::Platform))
        } else if stop.is_station {
            let handle = engine.add_marker(MarkerOptions {
                position: stop.position,
                icon: self.atlas.station_label(&stop.name),
                z_order: Z_STATION_LABEL + bias,
                flat: false,
            });
            self.owners.insert(handle, stop.id.clone());
            Some((handle, LabelKind::Station))
        } else {
            None
        };
        if let Some((handle, kind)) = label {
            self.refresh_label(engine, handle, kind);
        }

        self.records.insert(
            stop.id.clone(),
            MarkerRecord {
                stop: stop.clone(),
                primary,
                badge,
                label,
            },
        );
    }

    /// Test hook: both sides of the bidirectional index agree exactly.
    #[cfg(test)]
    fn assert_index_consistent(&self) {
        let mut handle_count = 0;
        for (stop_id, record) in &self.records {
            for handle in record.handles() {
                handle_count += 1;
                assert_eq!(
                    self.owners.get(&handle),
                    Some(stop_id),
                    "handle {handle:?} does not map back to {stop_id}"
                );
            }
        }
        assert_eq!(self.owners.len(), handle_count, "orphaned reverse entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stopmap_shared::{Direction, Point, Theme};

    use crate::resources::{BoxedTextRasterizer, ProceduralArt};

    #[derive(Default)]
    struct TestEngine {
        zoom: f32,
        next_handle: u64,
        live: Vec<MarkerHandle>,
        added: usize,
        removed: usize,
    }

    impl MapEngine for TestEngine {
        fn add_marker(&mut self, _options: MarkerOptions) -> MarkerHandle {
            self.next_handle += 1;
            self.added += 1;
            let handle = MarkerHandle(self.next_handle);
            self.live.push(handle);
            handle
        }

        fn set_icon(&mut self, _handle: MarkerHandle, _icon: IconDescriptor) {}
        fn set_anchor(&mut self, _handle: MarkerHandle, _x: f32, _y: f32) {}
        fn set_visible(&mut self, _handle: MarkerHandle, _visible: bool) {}
        fn set_position(&mut self, _handle: MarkerHandle, _position: Point) {}

        fn remove_marker(&mut self, handle: MarkerHandle) {
            self.live.retain(|&live| live != handle);
            self.removed += 1;
        }

        fn zoom(&self) -> f32 {
            self.zoom
        }

        fn project(&self, _position: Point) -> crate::engine::ScreenPoint {
            crate::engine::ScreenPoint { x: 0.0, y: 0.0 }
        }

        fn unproject(&self, point: crate::engine::ScreenPoint) -> Point {
            Point::new(point.y, point.x)
        }
    }

    fn test_atlas() -> Arc<IconAtlas> {
        let config = OverlayConfig::default();
        let theme = Theme::default();
        Arc::new(IconAtlas::build(
            &config,
            &theme,
            &ProceduralArt::new(theme),
            Box::new(BoxedTextRasterizer::new(theme)),
        ))
    }

    fn stop(id: &str) -> Stop {
        Stop {
            id: id.to_string(),
            name: format!("Stop {id}"),
            position: Point::new(47.6, -122.3),
            direction: Direction::North,
            is_station: false,
            platform_code: None,
            route_ids: vec!["r1".to_string()],
        }
    }

    fn bus_route(id: &str) -> Route {
        Route {
            id: id.to_string(),
            short_name: format!("Line {id}"),
            mode: TransitMode::Bus,
        }
    }

    #[test]
    fn routes_are_deduplicated_across_populates() {
        let mut cache = MarkerCache::new(test_atlas(), OverlayConfig::default());
        let mut engine = TestEngine {
            zoom: 16.5,
            ..TestEngine::default()
        };
        let routes = [bus_route("r1")];
        cache.populate(&mut engine, &[stop("a")], &routes, None);
        cache.populate(&mut engine, &[stop("b")], &routes, None);
        assert_eq!(cache.routes.len(), 1);
        cache.assert_index_consistent();
    }

    #[test]
    fn platform_stop_creates_three_markers() {
        let mut cache = MarkerCache::new(test_atlas(), OverlayConfig::default());
        let mut engine = TestEngine {
            zoom: 16.5,
            ..TestEngine::default()
        };
        let mut platform = stop("a");
        platform.platform_code = Some("A1".to_string());
        cache.populate(&mut engine, &[platform], &[bus_route("r1")], None);
        assert_eq!(engine.added, 3);
        cache.assert_index_consistent();
    }

    #[test]
    fn stop_without_known_routes_gets_no_badge() {
        let mut cache = MarkerCache::new(test_atlas(), OverlayConfig::default());
        let mut engine = TestEngine {
            zoom: 16.5,
            ..TestEngine::default()
        };
        cache.populate(&mut engine, &[stop("a")], &[], None);
        assert_eq!(engine.added, 1);
        assert_eq!(cache.badge_handle("a"), None);
    }

    #[test]
    fn icon_variant_follows_zoom_tiers() {
        let cache = MarkerCache::new(test_atlas(), OverlayConfig::default());
        let plain = stop("a");

        let large = cache.icon_for(&plain, 18.0, false);
        let normal = cache.icon_for(&plain, 16.5, false);
        let dot = cache.icon_for(&plain, 13.0, false);
        assert!(large.same_bitmap(&cache.atlas.stop_icon(plain.direction, IconVariant::Large)));
        assert!(normal.same_bitmap(&cache.atlas.stop_icon(plain.direction, IconVariant::Normal)));
        assert!(dot.same_bitmap(&cache.atlas.dot()));

        let mut station = stop("b");
        station.is_station = true;
        let station_low = cache.icon_for(&station, 13.0, false);
        assert!(
            station_low.same_bitmap(&cache.atlas.stop_icon(station.direction, IconVariant::Normal))
        );

        let focused = cache.icon_for(&plain, 13.0, true);
        assert!(focused.same_bitmap(&cache.atlas.stop_icon(plain.direction, IconVariant::Focused)));
    }

    #[test]
    fn clear_removes_everything_from_the_engine() {
        let mut cache = MarkerCache::new(test_atlas(), OverlayConfig::default());
        let mut engine = TestEngine {
            zoom: 16.5,
            ..TestEngine::default()
        };
        cache.populate(&mut engine, &[stop("a"), stop("b")], &[bus_route("r1")], None);
        cache.clear(&mut engine, None);
        assert!(engine.live.is_empty());
        assert_eq!(engine.removed, engine.added);
        assert!(cache.is_empty());
        assert!(cache.routes.is_empty());
        cache.assert_index_consistent();
    }

    #[test]
    fn clear_with_snapshot_restores_the_focused_stop() {
        let mut cache = MarkerCache::new(test_atlas(), OverlayConfig::default());
        let mut engine = TestEngine {
            zoom: 16.5,
            ..TestEngine::default()
        };
        cache.populate(&mut engine, &[stop("a"), stop("b")], &[bus_route("r1")], None);
        let snapshot = FocusSnapshot {
            stop: stop("a"),
            routes: vec![bus_route("r1")],
        };
        cache.clear(&mut engine, Some(&snapshot));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("a"));
        assert_eq!(cache.routes.len(), 1);
        cache.assert_index_consistent();
    }

    #[test]
    fn over_capacity_populate_resets_and_keeps_focus() {
        let config = OverlayConfig {
            max_marker_count: 3,
            ..OverlayConfig::default()
        };
        let mut cache = MarkerCache::new(test_atlas(), config);
        let mut engine = TestEngine {
            zoom: 16.5,
            ..TestEngine::default()
        };
        let routes = [bus_route("r1")];
        let batch: Vec<Stop> = ["a", "b", "c"].iter().map(|id| stop(id)).collect();
        cache.populate(&mut engine, &batch, &routes, None);
        assert_eq!(cache.len(), 3);

        let snapshot = FocusSnapshot {
            stop: stop("a"),
            routes: routes.to_vec(),
        };
        cache.populate(&mut engine, &[stop("d")], &routes, Some(&snapshot));
        // Reset kept the focused stop and added the new one.
        assert_eq!(cache.len(), 2);
        assert!(cache.contains("a"));
        assert!(cache.contains("d"));
        cache.assert_index_consistent();
    }

    #[test]
    fn serving_routes_skips_unknown_ids() {
        let mut cache = MarkerCache::new(test_atlas(), OverlayConfig::default());
        let mut engine = TestEngine {
            zoom: 16.5,
            ..TestEngine::default()
        };
        let mut multi = stop("a");
        multi.route_ids = vec!["r1".to_string(), "ghost".to_string()];
        cache.populate(&mut engine, &[multi.clone()], &[bus_route("r1")], None);
        let serving = cache.serving_routes(&multi);
        assert_eq!(serving.len(), 1);
        assert!(serving.contains_key("r1"));
    }
}
