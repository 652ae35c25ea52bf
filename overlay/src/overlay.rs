//! Public facade over the marker cache and the focus state machine. Every
//! mutating operation and read runs under one overlay-wide critical section,
//! so cache and focus transitions never race with zoom-triggered redraws or
//! click callbacks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use stopmap_shared::{Point, References, Route, RouteMap, Stop, Theme};

use crate::animation::{BOUNCE_LIFT_PX, BounceAnimation};
use crate::atlas::IconAtlas;
use crate::cache::MarkerCache;
use crate::config::OverlayConfig;
use crate::engine::{MapEngine, MarkerHandle, ScreenPoint};
use crate::focus::FocusController;
use crate::resources::{BoxedTextRasterizer, ProceduralArt, StopArt, TextRasterizer};

/// Receives one callback per focus transition: the focused stop and the
/// routes serving it, or `None` for both when focus was cleared or could not
/// be established. The tap location is present only for transitions the user
/// triggered by touching the map.
///
/// Called while the overlay's critical section is held; the callback must
/// not call back into the overlay.
pub trait FocusListener: Send {
    fn on_focus_changed(
        &mut self,
        stop: Option<&Stop>,
        routes: Option<&RouteMap>,
        tap: Option<Point>,
    );
}

impl<F> FocusListener for F
where
    F: FnMut(Option<&Stop>, Option<&RouteMap>, Option<Point>) + Send,
{
    fn on_focus_changed(
        &mut self,
        stop: Option<&Stop>,
        routes: Option<&RouteMap>,
        tap: Option<Point>,
    ) {
        self(stop, routes, tap)
    }
}

struct OverlayState<E> {
    engine: E,
    cache: MarkerCache,
    focus: FocusController,
    listener: Option<Box<dyn FocusListener>>,
}

pub struct StopOverlay<E: MapEngine> {
    atlas: Arc<IconAtlas>,
    state: Mutex<OverlayState<E>>,
}

impl<E: MapEngine> StopOverlay<E> {
    /// Builds the icon atlas with the built-in procedural capabilities and
    /// wraps the engine. Atlas construction happens here, before the overlay
    /// accepts any other call.
    pub fn new(engine: E, config: OverlayConfig, theme: Theme) -> Self {
        let art = ProceduralArt::new(theme);
        let text = BoxedTextRasterizer::new(theme);
        Self::with_capabilities(engine, config, theme, &art, Box::new(text))
    }

    /// Like [`StopOverlay::new`], but with host-supplied art and text stacks.
    pub fn with_capabilities(
        engine: E,
        config: OverlayConfig,
        theme: Theme,
        art: &dyn StopArt,
        text: Box<dyn TextRasterizer>,
    ) -> Self {
        let atlas = Arc::new(IconAtlas::build(&config, &theme, art, text));
        Self {
            atlas: atlas.clone(),
            state: Mutex::new(OverlayState {
                engine,
                cache: MarkerCache::new(atlas, config),
                focus: FocusController::new(),
                listener: None,
            }),
        }
    }

    /// Shared read-only access to the atlas the overlay renders from.
    pub fn atlas(&self) -> Arc<IconAtlas> {
        self.atlas.clone()
    }

    pub fn set_focus_listener(&self, listener: impl FocusListener + 'static) {
        self.lock().listener = Some(Box::new(listener));
    }

    /// Merges a batch of stops and their routes into the overlay.
    pub fn populate_stops(&self, stops: &[Stop], routes: &[Route]) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let snapshot = state.focus.snapshot();
        state
            .cache
            .populate(&mut state.engine, stops, routes, snapshot.as_ref());
        // A capacity reset may have re-created the focused stop's markers.
        state.focus.resync(&state.cache);
    }

    /// [`StopOverlay::populate_stops`] taking the reference side-car the
    /// data layer already produces.
    pub fn populate_with_references(&self, stops: &[Stop], refs: &References) {
        self.populate_stops(stops, &refs.routes);
    }

    /// Recomputes icons and visibility for the current zoom. Call on camera
    /// zoom changes; never creates or removes markers.
    pub fn redraw_stops(&self) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let focused_id = state.focus.focused().map(|stop| stop.id.clone());
        state.cache.redraw(&mut state.engine, focused_id.as_deref());
    }

    /// Removes every stop marker. With `preserve_focus` the focused stop is
    /// re-created immediately from its saved route snapshot; without it the
    /// focus state is dropped too.
    pub fn clear(&self, preserve_focus: bool) {
        let mut guard = self.lock();
        let state = &mut *guard;
        if preserve_focus {
            let snapshot = state.focus.snapshot();
            state.cache.clear(&mut state.engine, snapshot.as_ref());
            state.focus.resync(&state.cache);
        } else {
            state.focus.reset();
            state.cache.clear(&mut state.engine, None);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().cache.is_empty()
    }

    /// The currently focused stop, if any.
    pub fn focused(&self) -> Option<Stop> {
        self.lock().focus.focused().cloned()
    }

    /// Reverse lookup for a marker handle; `None` when the marker belongs to
    /// another overlay layer.
    pub fn stop_at_marker(&self, handle: MarkerHandle) -> Option<Stop> {
        self.lock().cache.stop_for(handle).cloned()
    }

    /// Programmatic focus change; pass `None` to clear. The listener is
    /// notified exactly once, with no tap location.
    pub fn set_focus(&self, stop: Option<&Stop>) {
        self.focus_on(stop, &[], None);
    }

    /// Focus change carrying the routes for a stop that may not have been
    /// populated yet; it is materialized on the fly if needed.
    pub fn set_focus_with_routes(&self, stop: Option<&Stop>, routes: &[Route]) {
        self.focus_on(stop, routes, None);
    }

    /// Click routing entry point. Returns whether the click was consumed;
    /// a handle unknown to this overlay is left for other layers.
    pub fn marker_clicked(&self, handle: MarkerHandle) -> bool {
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(stop) = state.cache.stop_for(handle).cloned() else {
            return false;
        };
        debug!(stop = %stop.id, "stop marker clicked");

        let tap = Some(stop.position);
        let routes = state.focus.set_focus(&mut state.engine, &state.cache, Some(&stop));
        let focused = state.focus.focused().cloned();
        notify(state, focused.as_ref(), routes.as_ref(), tap);
        true
    }

    /// A tap away from any stop marker clears the focus. The listener is
    /// notified even when nothing was focused.
    pub fn background_clicked(&self, tap: Point) {
        debug!("map background clicked");
        let mut guard = self.lock();
        let state = &mut *guard;
        state.focus.set_focus(&mut state.engine, &state.cache, None);
        notify(state, None, None, Some(tap));
    }

    /// Builds the optional focus bounce: the marker starts [`BOUNCE_LIFT_PX`]
    /// screen pixels above its position and settles onto it. Returns `None`
    /// when nothing is focused.
    pub fn bounce_focused(&self, start_ms: f64) -> Option<BounceAnimation> {
        let guard = self.lock();
        let stop = guard.focus.focused()?;
        let handle = guard.focus.primary_handle(&guard.cache)?;
        let projected = guard.engine.project(stop.position);
        let lifted = guard.engine.unproject(ScreenPoint {
            x: projected.x,
            y: projected.y - BOUNCE_LIFT_PX,
        });
        Some(BounceAnimation::new(handle, lifted, stop.position, start_ms))
    }

    /// Advances a bounce frame; returns false once the marker has settled.
    pub fn step_bounce(&self, animation: &BounceAnimation, now_ms: f64) -> bool {
        let mut guard = self.lock();
        match animation.position_at(now_ms) {
            Some(position) => {
                guard.engine.set_position(animation.handle, position);
                true
            }
            None => {
                guard.engine.set_position(animation.handle, animation.to);
                false
            }
        }
    }

    fn focus_on(&self, stop: Option<&Stop>, routes: &[Route], tap: Option<Point>) {
        let mut guard = self.lock();
        let state = &mut *guard;

        // A stop focused before it was ever populated (deep link, restored
        // session) is materialized on the fly.
        if let Some(stop) = stop {
            if !state.cache.contains(&stop.id) {
                let snapshot = state.focus.snapshot();
                state.cache.populate(
                    &mut state.engine,
                    std::slice::from_ref(stop),
                    routes,
                    snapshot.as_ref(),
                );
            }
        }

        let routes = state.focus.set_focus(&mut state.engine, &state.cache, stop);
        let focused = state.focus.focused().cloned();
        notify(state, focused.as_ref(), routes.as_ref(), tap);
    }

    fn lock(&self) -> MutexGuard<'_, OverlayState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn notify<E>(
    state: &mut OverlayState<E>,
    stop: Option<&Stop>,
    routes: Option<&RouteMap>,
    tap: Option<Point>,
) {
    if let Some(listener) = state.listener.as_mut() {
        listener.on_focus_changed(stop, routes, tap);
    }
}
