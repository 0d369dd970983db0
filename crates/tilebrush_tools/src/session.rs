//! The per-mode tool state machine and editing session

use glam::{IVec2, Vec2, Vec3};
use tilebrush_core::{
    world_to_grid_coord, GridError, GridRegistry, PaintSettings, TileSelection, WorkLayer,
    WorkingPlane, EPSILON, EVERY_LAYER_MASK,
};
use tilebrush_mesh::{raycast_mesh, raycast_work_plane, Ray, RayIndex, TileMesh};

use crate::build::{build_or_remap_face, cell_corners, layer_origin};
use crate::cursor::VirtualCursorHistory;
use crate::fill::execute_fill;
use crate::uv::compute_face_uvs;

/// The active paint mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaintTool {
    /// Create faces (or remap the face occupying a cell)
    #[default]
    Build,
    /// Remap UVs with alignment/stretch/snap adjustments
    Paint,
    /// Flood-fill a region of matching tiles
    Fill,
}

/// Modifier-key state delivered with pointer events
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

/// One input event delivered by the host
#[derive(Debug, Clone, Copy)]
pub enum ToolEvent {
    /// Pointer moved; `ray` is the unprojected viewport ray
    PointerMove { ray: Ray },
    /// Left button pressed
    ButtonPress { ray: Ray, modifiers: Modifiers },
    /// Left button released
    ButtonRelease,
    /// Periodic tick carrying the current view axes
    TimerTick { view_dir: Vec3, view_up: Vec3 },
}

/// Session options mirroring the host-side tool settings
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// World pixel density: how many texture pixels span one world unit
    pub pixels_per_unit: f32,
    /// Weld vertices of newly built faces against their layer
    pub auto_merge: bool,
    /// Advance the 3-D cursor along the stroke direction after builds
    pub cursor_flow: bool,
    /// Fill keeps each repainted face's existing paint settings
    pub lock_transform: bool,
    /// Work-plane size sampled by fill, in cells
    pub fill_bounds: IVec2,
    /// Settings applied to painted faces
    pub paint_settings: PaintSettings,
    /// Layer strokes operate on
    pub work_layer: WorkLayer,
    /// Raycast range for pointer rays
    pub max_ray_distance: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pixels_per_unit: 32.0,
            auto_merge: true,
            cursor_flow: false,
            lock_transform: false,
            fill_bounds: IVec2::splat(64),
            paint_settings: PaintSettings::default(),
            work_layer: WorkLayer::Base,
            max_ray_distance: 1000.0,
        }
    }
}

/// Geometry handed to the host's preview renderer; never part of the mesh
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewPayload {
    /// World positions in winding order
    pub verts: Vec<Vec3>,
    /// Matching UVs
    pub uvs: Vec<Vec2>,
    /// Whether verts describe a run of quads rather than one polygon
    pub is_quad_batch: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    Idle,
    Dragging { last_cell: Option<IVec2> },
}

/// One modal editing session: the mesh, its ray index, the working plane,
/// and the tool state machine driving them.
///
/// States are `Idle` and `Dragging`. A press starts a drag and performs one
/// action (Build/Paint stroke, or a whole fill); movement while dragging
/// extends Build/Paint strokes cell by cell and is ignored by Fill; release
/// returns to idle and emits an undo-checkpoint notification. Movement while
/// idle only refreshes the preview payload and never mutates the mesh.
#[derive(Debug, Default)]
pub struct PaintSession {
    pub tool: PaintTool,
    pub config: SessionConfig,
    pub registry: GridRegistry,
    pub mesh: TileMesh,
    pub index: RayIndex,
    pub plane: WorkingPlane,
    /// The grid strokes paint from
    pub active_grid: Option<u32>,
    /// Preview geometry for the host renderer; `None` when unavailable
    pub preview: Option<PreviewPayload>,
    drag: DragState,
    cursor_history: VirtualCursorHistory,
    checkpoints: u32,
}

impl Default for DragState {
    fn default() -> Self {
        Self::Idle
    }
}

impl PaintSession {
    pub fn new(registry: GridRegistry, mesh: TileMesh) -> Self {
        Self {
            registry,
            mesh,
            ..Default::default()
        }
    }

    /// Whether a drag is in progress
    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Undo-checkpoint notifications accumulated since the last call.
    ///
    /// The host owns undo storage; the session only reports when a stroke
    /// commits (left-button release after a drag).
    pub fn take_checkpoints(&mut self) -> u32 {
        std::mem::take(&mut self.checkpoints)
    }

    /// Discard in-progress drag state, preview, and cursor history.
    ///
    /// Called when the host leaves edit mode; nothing partial is committed.
    pub fn reset_tool_state(&mut self) {
        self.drag = DragState::Idle;
        self.preview = None;
        self.cursor_history.clear();
    }

    /// Switch tools, dropping any in-progress drag
    pub fn set_tool(&mut self, tool: PaintTool) {
        self.tool = tool;
        self.drag = DragState::Idle;
        self.preview = None;
    }

    /// Dispatch one host event through the state machine
    pub fn handle_event(&mut self, event: ToolEvent) {
        match event {
            ToolEvent::TimerTick { view_dir, view_up } => {
                self.plane.rebuild_from_view(view_dir, view_up);
            }
            ToolEvent::ButtonPress { ray, modifiers } => {
                if modifiers.alt {
                    self.pick_tile(ray);
                    return;
                }
                self.drag = DragState::Dragging { last_cell: None };
                match self.tool {
                    PaintTool::Build | PaintTool::Paint => self.apply_stroke(ray),
                    PaintTool::Fill => self.run_fill(ray),
                }
            }
            ToolEvent::ButtonRelease => {
                if self.is_dragging() {
                    self.checkpoints += 1;
                }
                self.drag = DragState::Idle;
            }
            ToolEvent::PointerMove { ray } => match self.drag {
                // Fill runs once per press and ignores movement until release
                DragState::Dragging { .. } if self.tool == PaintTool::Fill => {}
                DragState::Dragging { .. } => self.apply_stroke(ray),
                DragState::Idle => self.update_preview(ray),
            },
        }
    }

    /// Resolve a pointer ray to a grid cell: nearest qualifying mesh hit
    /// first, the layer's work plane otherwise.
    fn resolve_cell(&mut self, ray: Ray) -> Option<(IVec2, Vec3)> {
        let grid_id = self.active_grid?;
        let stride = self.registry.grid(grid_id)?.stride();
        let (right, up) = self.plane.basis();
        let origin = layer_origin(&self.plane, self.config.work_layer);

        let point = raycast_mesh(
            &self.mesh,
            &mut self.index,
            ray.origin,
            ray.dir,
            self.config.max_ray_distance,
            self.config.work_layer.mask(),
            false,
        )
        .map(|hit| hit.position)
        .or_else(|| raycast_work_plane(origin, self.plane.normal, ray.origin, ray.dir))?;

        let coord = world_to_grid_coord(
            point,
            origin,
            right,
            up,
            self.config.pixels_per_unit,
            stride.x,
            stride.y,
        )?;
        Some((IVec2::new(coord.x, coord.y), point))
    }

    /// Span and tile for a stroke at a cell: Build stamps the whole selection
    /// as one run; Paint repeats the selection across cells modulo its size.
    fn stroke_span_and_tile(&self, grid_id: u32, cell: IVec2) -> (IVec2, IVec2) {
        let selection = self
            .registry
            .grid(grid_id)
            .map(|g| g.selection)
            .unwrap_or_else(|| TileSelection::single(0, 0));

        match self.tool {
            PaintTool::Build => (
                IVec2::new(selection.width, selection.height),
                IVec2::new(selection.x, selection.y),
            ),
            _ => (
                IVec2::ONE,
                IVec2::new(
                    selection.x + cell.x.rem_euclid(selection.width),
                    selection.y + cell.y.rem_euclid(selection.height),
                ),
            ),
        }
    }

    fn apply_stroke(&mut self, ray: Ray) {
        let Some(grid_id) = self.active_grid else {
            return;
        };
        let Some((cell, point)) = self.resolve_cell(ray) else {
            return;
        };
        if let DragState::Dragging {
            last_cell: Some(last),
        } = self.drag
        {
            if last == cell {
                return;
            }
        }

        let (span, tile) = self.stroke_span_and_tile(grid_id, cell);
        let result = build_or_remap_face(
            &mut self.mesh,
            &mut self.index,
            &self.registry,
            grid_id,
            &self.plane,
            self.config.pixels_per_unit,
            cell.x,
            cell.y,
            span.x,
            span.y,
            tile.x,
            tile.y,
            &self.config.paint_settings,
            self.config.work_layer,
            self.config.work_layer == WorkLayer::Decal,
            self.config.auto_merge,
            self.tool == PaintTool::Paint,
        );

        match result {
            Ok(_) => {
                if let DragState::Dragging { last_cell } = &mut self.drag {
                    *last_cell = Some(cell);
                }
                self.cursor_history.push(point);
                if self.config.cursor_flow {
                    self.advance_cursor(grid_id);
                }
            }
            Err(GridError::MissingGridOrTexture(reason)) => {
                log::warn!("stroke aborted: {reason}");
            }
            Err(err) => {
                log::debug!("stroke skipped at ({}, {}): {err}", cell.x, cell.y);
            }
        }
    }

    /// Snap the 3-D cursor onto the nearest grid intersection.
    ///
    /// The in-plane components round to whole cells; the component along the
    /// plane normal is kept, so snapping never pulls the cursor off its
    /// current level.
    pub fn snap_cursor_to_grid(&mut self) {
        let Some(grid_id) = self.active_grid else {
            return;
        };
        let Some(grid) = self.registry.grid(grid_id) else {
            return;
        };
        let cell_world = grid.stride() / self.config.pixels_per_unit;
        if cell_world.x <= EPSILON || cell_world.y <= EPSILON {
            return;
        }

        let (right, up) = self.plane.basis();
        let origin = self.plane.origin;
        let along_right = (origin.dot(right) / cell_world.x).round() * cell_world.x;
        let along_up = (origin.dot(up) / cell_world.y).round() * cell_world.y;
        let along_normal = origin.dot(self.plane.normal);
        self.plane.origin =
            right * along_right + up * along_up + self.plane.normal * along_normal;
    }

    /// Move the 3-D cursor one cell along the smoothed stroke direction
    fn advance_cursor(&mut self, grid_id: u32) {
        let Some(dir) = self.cursor_history.direction() else {
            return;
        };
        let Some(grid) = self.registry.grid(grid_id) else {
            return;
        };
        let cell_world = grid.stride() / self.config.pixels_per_unit;
        let (right, up) = self.plane.basis();

        let along_right = dir.dot(right);
        let along_up = dir.dot(up);
        let step = if along_right.abs() >= along_up.abs() {
            right * cell_world.x * along_right.signum()
        } else {
            up * cell_world.y * along_up.signum()
        };
        self.plane.origin += step;
    }

    fn run_fill(&mut self, ray: Ray) {
        let Some(grid_id) = self.active_grid else {
            return;
        };
        let Some((cell, point)) = self.resolve_cell(ray) else {
            return;
        };

        let bounds_min = cell - self.config.fill_bounds / 2;
        let result = execute_fill(
            &mut self.mesh,
            &mut self.index,
            &self.registry,
            grid_id,
            &self.plane,
            self.config.pixels_per_unit,
            point,
            bounds_min,
            self.config.fill_bounds,
            &self.config.paint_settings,
            self.config.work_layer,
            self.config.work_layer == WorkLayer::Decal,
            self.config.auto_merge,
            self.config.lock_transform,
        );

        match result {
            Ok(painted) => log::debug!("fill painted {painted} cells"),
            Err(GridError::MissingGridOrTexture(reason)) => {
                log::warn!("fill aborted: {reason}");
            }
            Err(err) => log::debug!("fill skipped: {err}"),
        }
    }

    /// Recompute the idle-hover preview; failures leave no preview this frame
    fn update_preview(&mut self, ray: Ray) {
        self.preview = None;
        let Some(grid_id) = self.active_grid else {
            return;
        };
        let Some((cell, _)) = self.resolve_cell(ray) else {
            return;
        };
        let Some((image_w, image_h)) = self.registry.image_size(grid_id) else {
            return;
        };
        let (span, tile) = self.stroke_span_and_tile(grid_id, cell);
        let Some(grid) = self.registry.grid(grid_id) else {
            return;
        };

        let cell_world = grid.stride() / self.config.pixels_per_unit;
        let (right, up) = self.plane.basis();
        let origin = layer_origin(&self.plane, self.config.work_layer);
        let corners = cell_corners(
            origin,
            right * cell_world.x,
            up * cell_world.y,
            self.plane.normal,
            cell.x,
            cell.y,
            span.x,
            span.y,
        );
        let center = corners.iter().sum::<Vec3>() / corners.len() as f32;

        let Some(uvs) = compute_face_uvs(
            grid,
            image_w,
            image_h,
            right,
            up,
            tile.x,
            tile.y,
            span.x,
            span.y,
            &corners,
            center,
            cell_world,
            self.tool == PaintTool::Paint,
            &self.config.paint_settings,
        ) else {
            return;
        };

        self.preview = Some(PreviewPayload {
            verts: corners.to_vec(),
            uvs,
            is_quad_batch: true,
        });
    }

    /// Read a painted face's tile back into the active selection and
    /// settings (modifier-click picker).
    fn pick_tile(&mut self, ray: Ray) {
        let Some(hit) = raycast_mesh(
            &self.mesh,
            &mut self.index,
            ray.origin,
            ray.dir,
            self.config.max_ray_distance,
            EVERY_LAYER_MASK,
            false,
        ) else {
            return;
        };
        let Some(face) = self.mesh.face(hit.face) else {
            return;
        };
        let meta = face.meta;
        if !meta.is_painted() {
            return;
        }

        let grid_id = meta.grid_id as u32;
        let Some((image_w, _)) = self.registry.image_size(grid_id) else {
            return;
        };
        let Some(grid) = self.registry.grid_mut(grid_id) else {
            return;
        };

        let origin_id = if meta.sel_origin >= 0 {
            meta.sel_origin
        } else {
            meta.tile_id
        };
        let (sel_x, sel_y) = grid.unpack_tile_id(image_w, origin_id);
        grid.selection = TileSelection::new(sel_x, sel_y, meta.sel_width, meta.sel_height);

        self.active_grid = Some(grid_id);
        self.config.paint_settings = PaintSettings::decode(meta.paint_settings);
        self.config.work_layer = meta.layer();
    }
}
