//! Single-focus state machine layered on the marker cache. At most one stop
//! is focused; focusing a new stop first restores the previous one, and a
//! target whose marker cannot be resolved falls back to unfocused instead of
//! leaving a dangling reference.

use tracing::debug;

use stopmap_shared::{Route, RouteMap, Stop};

use crate::cache::MarkerCache;
use crate::engine::{MapEngine, MarkerHandle};

/// What must survive a cache reset: the focused stop and the routes serving
/// it at the time it gained focus.
#[derive(Debug, Clone)]
pub struct FocusSnapshot {
    pub stop: Stop,
    pub routes: Vec<Route>,
}

struct FocusedStop {
    stop: Stop,
    routes: Vec<Route>,
    primary: MarkerHandle,
    badge: Option<MarkerHandle>,
}

#[derive(Default)]
pub struct FocusController {
    current: Option<FocusedStop>,
}

impl FocusController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<&Stop> {
        self.current.as_ref().map(|focused| &focused.stop)
    }

    /// Drops the focus state without touching markers or notifying anyone.
    /// Used when the markers themselves are about to be removed.
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Copy of the focus state handed to the cache around resets.
    pub fn snapshot(&self) -> Option<FocusSnapshot> {
        self.current.as_ref().map(|focused| FocusSnapshot {
            stop: focused.stop.clone(),
            routes: focused.routes.clone(),
        })
    }

    /// Drives every transition of the state machine. Returns the serving
    /// routes of the newly focused stop, or `None` when the overlay ends up
    /// unfocused (cleared, or the target could not be resolved).
    pub fn set_focus<E: MapEngine>(
        &mut self,
        engine: &mut E,
        cache: &MarkerCache,
        stop: Option<&Stop>,
    ) -> Option<RouteMap> {
        // Restore the previous focus first, whatever the target is.
        if let Some(previous) = self.current.take() {
            self.restore(engine, cache, &previous.stop);
        }

        let stop = stop?;
        let Some(primary) = cache.primary_handle(&stop.id) else {
            debug!(stop = %stop.id, "focus target has no marker, staying unfocused");
            return None;
        };

        let serving = cache.serving_routes(stop);
        let routes: Vec<Route> = serving.values().cloned().collect();

        cache.refresh_primary(engine, stop, primary, true);
        let badge = cache.badge_handle(&stop.id);
        if let Some(handle) = badge {
            cache.refresh_badge(engine, handle, true);
        }

        self.current = Some(FocusedStop {
            stop: stop.clone(),
            routes,
            primary,
            badge,
        });
        Some(serving)
    }

    /// Returns the focused stop's primary handle, re-resolved through the
    /// cache when the stored one went stale across a reset.
    pub fn primary_handle(&self, cache: &MarkerCache) -> Option<MarkerHandle> {
        let focused = self.current.as_ref()?;
        cache.primary_handle(&focused.stop.id).or(Some(focused.primary))
    }

    /// Re-resolves the stored handles after the cache recreated the focused
    /// stop's markers (capacity reset, clear-preserving-focus).
    pub fn resync(&mut self, cache: &MarkerCache) {
        if let Some(focused) = self.current.as_mut() {
            if let Some(primary) = cache.primary_handle(&focused.stop.id) {
                focused.primary = primary;
            }
            focused.badge = cache.badge_handle(&focused.stop.id);
        }
    }

    fn restore<E: MapEngine>(&self, engine: &mut E, cache: &MarkerCache, stop: &Stop) {
        // Fresh lookups: the handles stored at focus time may be stale.
        if let Some(handle) = cache.primary_handle(&stop.id) {
            cache.refresh_primary(engine, stop, handle, false);
        }
        if let Some(handle) = cache.badge_handle(&stop.id) {
            cache.refresh_badge(engine, handle, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use stopmap_shared::{Direction, Point, Theme, TransitMode};

    use crate::atlas::{IconAtlas, IconDescriptor, IconVariant};
    use crate::config::OverlayConfig;
    use crate::engine::{MarkerOptions, ScreenPoint};
    use crate::resources::{BoxedTextRasterizer, ProceduralArt};

    #[derive(Default)]
    struct RecordingEngine {
        zoom: f32,
        next_handle: u64,
        icons: HashMap<MarkerHandle, IconDescriptor>,
        visible: HashMap<MarkerHandle, bool>,
    }

    impl MapEngine for RecordingEngine {
        fn add_marker(&mut self, options: MarkerOptions) -> MarkerHandle {
            self.next_handle += 1;
            let handle = MarkerHandle(self.next_handle);
            self.icons.insert(handle, options.icon);
            self.visible.insert(handle, true);
            handle
        }

        fn set_icon(&mut self, handle: MarkerHandle, icon: IconDescriptor) {
            self.icons.insert(handle, icon);
        }

        fn set_anchor(&mut self, _handle: MarkerHandle, _x: f32, _y: f32) {}

        fn set_visible(&mut self, handle: MarkerHandle, visible: bool) {
            self.visible.insert(handle, visible);
        }

        fn set_position(&mut self, _handle: MarkerHandle, _position: Point) {}

        fn remove_marker(&mut self, handle: MarkerHandle) {
            self.icons.remove(&handle);
            self.visible.remove(&handle);
        }

        fn zoom(&self) -> f32 {
            self.zoom
        }

        fn project(&self, _position: Point) -> ScreenPoint {
            ScreenPoint { x: 0.0, y: 0.0 }
        }

        fn unproject(&self, point: ScreenPoint) -> Point {
            Point::new(point.y, point.x)
        }
    }

    fn atlas() -> Arc<IconAtlas> {
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
            direction: Direction::East,
            is_station: false,
            platform_code: None,
            route_ids: vec!["r1".to_string()],
        }
    }

    fn route() -> Route {
        Route {
            id: "r1".to_string(),
            short_name: "44".to_string(),
            mode: TransitMode::Bus,
        }
    }

    fn setup() -> (RecordingEngine, MarkerCache, FocusController, Arc<IconAtlas>) {
        let atlas = atlas();
        let mut engine = RecordingEngine {
            zoom: 16.5,
            ..RecordingEngine::default()
        };
        let mut cache = MarkerCache::new(atlas.clone(), OverlayConfig::default());
        cache.populate(&mut engine, &[stop("a"), stop("b")], &[route()], None);
        (engine, cache, FocusController::new(), atlas)
    }

    #[test]
    fn focusing_swaps_to_the_focused_icon() {
        let (mut engine, cache, mut focus, atlas) = setup();
        let a = stop("a");
        let routes = focus.set_focus(&mut engine, &cache, Some(&a)).unwrap();
        assert!(routes.contains_key("r1"));
        assert_eq!(focus.focused().map(|s| s.id.as_str()), Some("a"));

        let handle = cache.primary_handle("a").unwrap();
        let expected = atlas.stop_icon(Direction::East, IconVariant::Focused);
        assert!(engine.icons[&handle].same_bitmap(&expected));
    }

    #[test]
    fn refocusing_restores_the_previous_stop() {
        let (mut engine, cache, mut focus, atlas) = setup();
        focus.set_focus(&mut engine, &cache, Some(&stop("a")));
        focus.set_focus(&mut engine, &cache, Some(&stop("b")));

        let a_handle = cache.primary_handle("a").unwrap();
        let unfocused = atlas.stop_icon(Direction::East, IconVariant::Normal);
        assert!(engine.icons[&a_handle].same_bitmap(&unfocused));
        assert_eq!(focus.focused().map(|s| s.id.as_str()), Some("b"));
    }

    #[test]
    fn clearing_focus_returns_none_and_restores() {
        let (mut engine, cache, mut focus, atlas) = setup();
        focus.set_focus(&mut engine, &cache, Some(&stop("a")));
        let routes = focus.set_focus(&mut engine, &cache, None);
        assert!(routes.is_none());
        assert!(focus.focused().is_none());

        let a_handle = cache.primary_handle("a").unwrap();
        let unfocused = atlas.stop_icon(Direction::East, IconVariant::Normal);
        assert!(engine.icons[&a_handle].same_bitmap(&unfocused));
    }

    #[test]
    fn unresolvable_target_aborts_to_unfocused() {
        let (mut engine, cache, mut focus, _atlas) = setup();
        let routes = focus.set_focus(&mut engine, &cache, Some(&stop("ghost")));
        assert!(routes.is_none());
        assert!(focus.focused().is_none());
    }

    #[test]
    fn focusing_hides_the_mode_badge() {
        let (mut engine, cache, mut focus, _atlas) = setup();
        engine.zoom = 18.0;
        let badge = cache.badge_handle("a").unwrap();
        cache.refresh_badge(&mut engine, badge, false);
        assert!(engine.visible[&badge]);

        focus.set_focus(&mut engine, &cache, Some(&stop("a")));
        assert!(!engine.visible[&badge]);
    }

    #[test]
    fn resync_picks_up_recreated_handles() {
        let (mut engine, mut cache, mut focus, _atlas) = setup();
        focus.set_focus(&mut engine, &cache, Some(&stop("a")));
        let stale = focus.primary_handle(&cache).unwrap();

        let snapshot = focus.snapshot().unwrap();
        cache.clear(&mut engine, Some(&snapshot));
        focus.resync(&cache);

        let fresh = focus.primary_handle(&cache).unwrap();
        assert_ne!(stale, fresh);
        assert_eq!(cache.primary_handle("a"), Some(fresh));
    }

    #[test]
    fn snapshot_carries_the_serving_routes() {
        let (mut engine, cache, mut focus, _atlas) = setup();
        focus.set_focus(&mut engine, &cache, Some(&stop("a")));
        let snapshot = focus.snapshot().unwrap();
        assert_eq!(snapshot.stop.id, "a");
        assert_eq!(snapshot.routes.len(), 1);
        assert_eq!(snapshot.routes[0].id, "r1");
    }
}
