//! Explicit editor state: canvas, markers, image layers and pending events.
//!
//! Every mutating operation either fully applies or returns an error and
//! leaves the state untouched. Changes are reported through an event queue
//! that the caller drains, typically once per frame.

use std::collections::VecDeque;
use std::sync::Arc;

use image::RgbaImage;
use log::{debug, error, info, warn};
use nalgebra::{Point2, Vector2};
use tagboard_core::{Anchor, GrayImage};
use tagboard_dict::DictionaryRegistry;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::layout_io::{parse_layout, ImportReport, LayoutDocument, MarkerRecord};
use crate::scene::{self, Canvas, EntityId};
use crate::{
    BitmapJob, EditorConfig, EditorError, GenerateError, ImageId, ImageLayer, LayoutError, Marker,
    MarkerCode, MarkerId, MarkerPlacement,
};

/// Notification produced by an editor operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditorEvent {
    /// Entity added or modified; redraw and refresh its panel.
    Changed(EntityId),
    Removed(EntityId),
    CanvasChanged,
    /// A marker bitmap could not be generated; the previous one is kept.
    GenerationFailed { marker: MarkerId, message: String },
}

#[derive(Clone, Copy, Debug)]
struct Drag {
    target: EntityId,
    offset: Vector2<f64>,
}

/// The whole editable scene.
#[derive(Debug)]
pub struct EditorState {
    registry: Arc<DictionaryRegistry>,
    config: EditorConfig,
    canvas: Canvas,
    markers: Vec<Marker>,
    images: Vec<ImageLayer>,
    next_id: u64,
    drag: Option<Drag>,
    events: VecDeque<EditorEvent>,
}

fn find_marker(markers: &mut [Marker], id: MarkerId) -> Result<&mut Marker, EditorError> {
    markers
        .iter_mut()
        .find(|m| m.id() == id)
        .ok_or(EditorError::UnknownMarker(id.0))
}

fn find_image(images: &mut [ImageLayer], id: ImageId) -> Result<&mut ImageLayer, EditorError> {
    images
        .iter_mut()
        .find(|l| l.id() == id)
        .ok_or(EditorError::UnknownImage(id.0))
}

impl EditorState {
    pub fn new(registry: Arc<DictionaryRegistry>, config: EditorConfig) -> Result<Self, EditorError> {
        let canvas = Canvas::new(
            config.canvas_width,
            config.canvas_height,
            &config.background_color,
        )?;
        Ok(Self {
            registry,
            config,
            canvas,
            markers: Vec::new(),
            images: Vec::new(),
            next_id: 1,
            drag: None,
            events: VecDeque::new(),
        })
    }

    #[inline]
    pub fn registry(&self) -> &Arc<DictionaryRegistry> {
        &self.registry
    }

    #[inline]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[inline]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Markers in draw order, bottom first.
    #[inline]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Image layers in draw order, bottom first.
    #[inline]
    pub fn images(&self) -> &[ImageLayer] {
        &self.images
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id() == id)
    }

    pub fn image(&self, id: ImageId) -> Option<&ImageLayer> {
        self.images.iter().find(|l| l.id() == id)
    }

    /// Take all queued events, oldest first.
    pub fn drain_events(&mut self) -> impl Iterator<Item = EditorEvent> + '_ {
        self.events.drain(..)
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn changed(&mut self, entity: EntityId) {
        self.events.push_back(EditorEvent::Changed(entity));
    }

    // ---- markers --------------------------------------------------------

    /// Add a marker with the configured dictionary, id 0, position and size.
    pub fn add_default_marker(&mut self) -> Result<MarkerId, EditorError> {
        let code = MarkerCode::fixed(self.config.default_dictionary.clone(), 0);
        let [x, y] = self.config.marker_position;
        self.add_marker(code, Point2::new(x, y), self.config.marker_size, Anchor::TOP_LEFT)
    }

    /// Add a marker at `top_left`. Ids beyond the dictionary are clamped and
    /// the size is snapped to the code's cell count.
    pub fn add_marker(
        &mut self,
        mut code: MarkerCode,
        top_left: Point2<f64>,
        size: f64,
        anchor: Anchor,
    ) -> Result<MarkerId, EditorError> {
        if code.clamp_id(&self.registry)? {
            debug!("clamped id of new {} marker", code.dictionary_name());
        }
        let unit = code.size_unit(&self.registry)?;
        let placement = MarkerPlacement::new(top_left, size, anchor, unit)?;
        let id = MarkerId(self.allocate_id());
        debug!(
            "added {id}: {} at ({}, {}) size {}",
            code.dictionary_name(),
            top_left.x,
            top_left.y,
            placement.size_px()
        );
        self.markers.push(Marker::new(id, code, placement));
        self.changed(EntityId::Marker(id));
        Ok(id)
    }

    pub fn remove_marker(&mut self, id: MarkerId) -> Result<(), EditorError> {
        let idx = self
            .markers
            .iter()
            .position(|m| m.id() == id)
            .ok_or(EditorError::UnknownMarker(id.0))?;
        self.markers.remove(idx);
        self.end_drag_of(EntityId::Marker(id));
        self.events.push_back(EditorEvent::Removed(EntityId::Marker(id)));
        Ok(())
    }

    /// Set a dictionary marker's id, clamping it to the dictionary's range.
    ///
    /// Returns the id actually stored.
    pub fn set_marker_id(&mut self, id: MarkerId, value: i64) -> Result<u32, EditorError> {
        let requested = u32::try_from(value)
            .map_err(|_| EditorError::invalid("marker id", format!("{value} is out of range")))?;
        let marker = find_marker(&mut self.markers, id)?;
        let MarkerCode::FixedGrid { dictionary, .. } = marker.code() else {
            return Err(EditorError::invalid("marker id", "marker encodes text"));
        };
        let mut code = MarkerCode::fixed(dictionary.clone(), requested);
        code.clamp_id(&self.registry)?;
        let MarkerCode::FixedGrid { id: stored, .. } = code else {
            return Err(EditorError::invalid("marker id", "marker encodes text"));
        };
        if marker.code() != &code {
            marker.set_code(code);
        }
        self.changed(EntityId::Marker(id));
        Ok(stored)
    }

    /// Replace a text marker's payload; the size is re-snapped to the new
    /// module count.
    pub fn set_marker_text(&mut self, id: MarkerId, payload: &str) -> Result<(), EditorError> {
        let marker = find_marker(&mut self.markers, id)?;
        if !matches!(marker.code(), MarkerCode::Text { .. }) {
            return Err(EditorError::invalid("marker text", "marker uses a dictionary"));
        }
        let code = MarkerCode::text(payload);
        let unit = code.size_unit(&self.registry)?;
        let mut placement = *marker.placement();
        placement.set_unit(unit)?;
        marker.placement = placement;
        marker.set_code(code);
        self.changed(EntityId::Marker(id));
        Ok(())
    }

    /// Switch a marker to another dictionary or to the text code.
    ///
    /// The id is clamped to the new dictionary and the size re-snapped to the
    /// new cell count around the anchor. Moving to the text code turns the id
    /// into the payload; moving back starts at id 0.
    pub fn set_marker_dictionary(&mut self, id: MarkerId, name: &str) -> Result<(), EditorError> {
        let marker = find_marker(&mut self.markers, id)?;
        let to_text = DictionaryRegistry::is_text_code(name);
        let mut code = match marker.code() {
            MarkerCode::Text { .. } if to_text => return Ok(()),
            MarkerCode::FixedGrid { dictionary, .. } if dictionary == name => return Ok(()),
            MarkerCode::FixedGrid { id: code_id, .. } if to_text => MarkerCode::text(code_id.to_string()),
            MarkerCode::FixedGrid { id: code_id, .. } => MarkerCode::fixed(name, *code_id),
            MarkerCode::Text { .. } => MarkerCode::fixed(name, 0),
        };
        code.clamp_id(&self.registry)?;
        let unit = code.size_unit(&self.registry)?;
        let mut placement = *marker.placement();
        placement.set_unit(unit)?;
        marker.placement = placement;
        marker.set_code(code);
        info!("{id} now uses {name}");
        self.changed(EntityId::Marker(id));
        Ok(())
    }

    /// Resize around the anchor. Returns the snapped size.
    pub fn set_marker_size(&mut self, id: MarkerId, requested: f64) -> Result<u32, EditorError> {
        let marker = find_marker(&mut self.markers, id)?;
        let before = marker.placement().size_px();
        let size = marker.placement.set_size(requested)?;
        if size != before {
            marker.invalidate();
        }
        self.changed(EntityId::Marker(id));
        Ok(size)
    }

    /// Move so that the anchor point lands on `(x, y)`.
    pub fn set_marker_position(&mut self, id: MarkerId, x: f64, y: f64) -> Result<(), EditorError> {
        let marker = find_marker(&mut self.markers, id)?;
        marker.placement.set_displayed_position(Point2::new(x, y))?;
        self.changed(EntityId::Marker(id));
        Ok(())
    }

    /// Change the anchor. The marker stays where it is; only the displayed
    /// position changes.
    pub fn set_marker_anchor(&mut self, id: MarkerId, ax: f64, ay: f64) -> Result<(), EditorError> {
        let anchor = Anchor::new(ax, ay)
            .ok_or_else(|| EditorError::invalid("anchor", format!("({ax}, {ay}) is outside [0, 1]")))?;
        let marker = find_marker(&mut self.markers, id)?;
        marker.placement.set_anchor(anchor);
        self.changed(EntityId::Marker(id));
        Ok(())
    }

    // ---- images ---------------------------------------------------------

    /// Add an image at natural size, centered on the canvas.
    pub fn add_image(&mut self, image: RgbaImage) -> ImageId {
        let (w, h) = image.dimensions();
        let x = (f64::from(self.canvas.width()) - f64::from(w)) / 2.0;
        let y = (f64::from(self.canvas.height()) - f64::from(h)) / 2.0;
        let id = ImageId(self.allocate_id());
        debug!("added {id}: {w}x{h} at ({x}, {y})");
        self.images
            .push(ImageLayer::new(id, Arc::new(image), Point2::new(x, y)));
        self.changed(EntityId::Image(id));
        id
    }

    pub fn remove_image(&mut self, id: ImageId) -> Result<(), EditorError> {
        let idx = self
            .images
            .iter()
            .position(|l| l.id() == id)
            .ok_or(EditorError::UnknownImage(id.0))?;
        self.images.remove(idx);
        self.end_drag_of(EntityId::Image(id));
        self.events.push_back(EditorEvent::Removed(EntityId::Image(id)));
        Ok(())
    }

    pub fn set_image_position(&mut self, id: ImageId, x: f64, y: f64) -> Result<(), EditorError> {
        find_image(&mut self.images, id)?.set_position(Point2::new(x, y))?;
        self.changed(EntityId::Image(id));
        Ok(())
    }

    /// Set the width, keeping the aspect ratio.
    pub fn set_image_width(&mut self, id: ImageId, width: f64) -> Result<(), EditorError> {
        find_image(&mut self.images, id)?.set_width_linked(width)?;
        self.changed(EntityId::Image(id));
        Ok(())
    }

    /// Set the height, keeping the aspect ratio.
    pub fn set_image_height(&mut self, id: ImageId, height: f64) -> Result<(), EditorError> {
        find_image(&mut self.images, id)?.set_height_linked(height)?;
        self.changed(EntityId::Image(id));
        Ok(())
    }

    pub fn set_image_size(&mut self, id: ImageId, width: f64, height: f64) -> Result<(), EditorError> {
        find_image(&mut self.images, id)?.set_size(width, height)?;
        self.changed(EntityId::Image(id));
        Ok(())
    }

    // ---- canvas ---------------------------------------------------------

    pub fn resize_canvas(&mut self, width: f64, height: f64) -> Result<(), EditorError> {
        self.canvas.resize(width, height)?;
        self.events.push_back(EditorEvent::CanvasChanged);
        Ok(())
    }

    pub fn set_background(&mut self, color: &str) -> Result<(), EditorError> {
        self.canvas.set_background(color)?;
        self.events.push_back(EditorEvent::CanvasChanged);
        Ok(())
    }

    // ---- pointer --------------------------------------------------------

    pub fn hit_test(&self, x: f64, y: f64) -> Option<EntityId> {
        scene::hit_test(&self.markers, &self.images, Point2::new(x, y))
    }

    /// Start dragging whatever is under the pointer.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<EntityId> {
        let p = Point2::new(x, y);
        let target = scene::hit_test(&self.markers, &self.images, p)?;
        let origin = self.origin_of(target)?;
        self.drag = Some(Drag {
            target,
            offset: p - origin,
        });
        Some(target)
    }

    /// Move the dragged entity, keeping the grab offset. Returns the entity
    /// if one is being dragged.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<EntityId> {
        let drag = self.drag?;
        let top_left = Point2::new(x, y) - drag.offset;
        let moved = match drag.target {
            EntityId::Marker(id) => find_marker(&mut self.markers, id)
                .ok()
                .map(|m| m.placement.set_top_left(top_left).is_ok()),
            EntityId::Image(id) => find_image(&mut self.images, id)
                .ok()
                .map(|l| l.set_position(top_left).is_ok()),
        };
        match moved {
            Some(true) => Some(drag.target),
            Some(false) => {
                debug!("ignoring non-finite drag position ({x}, {y})");
                Some(drag.target)
            }
            None => {
                self.drag = None;
                None
            }
        }
    }

    /// Finish a drag: snap to whole pixels and report the change.
    pub fn pointer_up(&mut self) -> Option<EntityId> {
        let drag = self.drag.take()?;
        match drag.target {
            EntityId::Marker(id) => find_marker(&mut self.markers, id).ok()?.placement.round(),
            EntityId::Image(id) => find_image(&mut self.images, id).ok()?.round(),
        }
        self.changed(drag.target);
        Some(drag.target)
    }

    pub fn dragging(&self) -> Option<EntityId> {
        self.drag.map(|d| d.target)
    }

    fn origin_of(&self, entity: EntityId) -> Option<Point2<f64>> {
        match entity {
            EntityId::Marker(id) => self.marker(id).map(|m| m.placement().top_left()),
            EntityId::Image(id) => self.image(id).map(ImageLayer::position),
        }
    }

    fn end_drag_of(&mut self, entity: EntityId) {
        if self.drag.is_some_and(|d| d.target == entity) {
            self.drag = None;
        }
    }

    // ---- bitmaps --------------------------------------------------------

    /// Generation requests for every marker whose bitmap is stale.
    pub fn pending_bitmap_jobs(&self) -> Vec<BitmapJob> {
        self.markers
            .iter()
            .filter(|m| m.is_dirty())
            .map(Marker::job)
            .collect()
    }

    /// Deliver the result of a job. Results for superseded generations or
    /// deleted markers are dropped. Returns true if the marker was updated.
    pub fn complete_bitmap_job(
        &mut self,
        job: &BitmapJob,
        result: Result<GrayImage, GenerateError>,
    ) -> bool {
        let Ok(marker) = find_marker(&mut self.markers, job.marker) else {
            debug!("dropping bitmap for deleted {}", job.marker);
            return false;
        };
        match result {
            Ok(bitmap) => {
                if !marker.apply_bitmap(job.generation, bitmap) {
                    debug!(
                        "dropping stale bitmap for {} (generation {} < {})",
                        job.marker,
                        job.generation,
                        marker.generation()
                    );
                    return false;
                }
                self.changed(EntityId::Marker(job.marker));
                true
            }
            Err(err) => {
                if !marker.abandon_generation(job.generation) {
                    return false;
                }
                error!("bitmap generation failed for {}: {err}", job.marker);
                self.events.push_back(EditorEvent::GenerationFailed {
                    marker: job.marker,
                    message: err.to_string(),
                });
                false
            }
        }
    }

    /// Run every pending job now. Returns the number of bitmaps updated.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn refresh_bitmaps(&mut self) -> usize {
        let registry = Arc::clone(&self.registry);
        let mut updated = 0;
        for job in self.pending_bitmap_jobs() {
            let result = job.run(&registry);
            if self.complete_bitmap_job(&job, result) {
                updated += 1;
            }
        }
        updated
    }

    /// Bring bitmaps up to date and flatten the scene.
    pub fn render(&mut self) -> RgbaImage {
        self.refresh_bitmaps();
        scene::render(&self.canvas, &self.images, &self.markers)
    }

    // ---- layout files ---------------------------------------------------

    pub fn export_layout(&self) -> LayoutDocument {
        LayoutDocument {
            canvas_width: self.canvas.width(),
            canvas_height: self.canvas.height(),
            background_color: self.canvas.background().to_string(),
            markers: self.markers.iter().map(MarkerRecord::from_marker).collect(),
        }
    }

    /// Replace all markers with those of a layout document.
    ///
    /// Image layers are kept. A document that does not parse leaves the
    /// editor untouched; individual bad entries are skipped.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
    pub fn import_layout(&mut self, json: &str) -> Result<ImportReport, LayoutError> {
        let parsed = parse_layout(json)?;

        for marker in std::mem::take(&mut self.markers) {
            self.end_drag_of(EntityId::Marker(marker.id()));
            self.events
                .push_back(EditorEvent::Removed(EntityId::Marker(marker.id())));
        }

        if let Some((w, h)) = parsed.canvas_size {
            if let Err(err) = self.canvas.resize(w, h) {
                warn!("ignoring canvas size from layout: {err}");
            }
        }
        if let Some(color) = &parsed.background_color {
            if let Err(err) = self.canvas.set_background(color) {
                warn!("ignoring background from layout: {err}");
            }
        }
        self.events.push_back(EditorEvent::CanvasChanged);

        let mut report = ImportReport {
            imported: 0,
            skipped: parsed.skipped,
        };
        for entry in parsed.markers {
            let name = entry.code.dictionary_name().to_string();
            match self.add_marker(entry.code, Point2::new(entry.x, entry.y), entry.scale, entry.anchor) {
                Ok(_) => report.imported += 1,
                Err(err) => {
                    warn!("skipping {name} marker from layout: {err}");
                    report.skipped += 1;
                }
            }
        }
        info!(
            "imported {} markers, skipped {}",
            report.imported, report.skipped
        );
        Ok(report)
    }
}
