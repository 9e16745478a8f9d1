//! Headless recording backend
//!
//! `TraceDevice`, `TraceEffect` and `TraceMesh` implement the collaborator
//! traits without a GPU and append every state change, parameter binding
//! and draw to a shared [`TraceLog`]. Used for tests and for inspecting the
//! command stream of a frame.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::device::{ClearColor, CullMode, DepthStencilState, GraphicsDevice, RasterizerState, Viewport};
use crate::effect::{names, Effect, ParameterValue};
use crate::geometry::{Drawable, PrimitiveKind};
use crate::render_target::{RenderTarget, RenderTargetAllocator, RenderTargetDesc, RenderTargetId};
use crate::{Error, Result};

/// Snapshot of one draw call
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub kind: PrimitiveKind,
    pub effect: String,
    pub technique: String,
    pub target: Option<RenderTargetId>,
    pub cull_mode: CullMode,
    pub depth_stencil: DepthStencilState,
    /// Every parameter bound on the effect at draw time
    pub parameters: BTreeMap<String, ParameterValue>,
}

impl DrawRecord {
    pub fn parameter(&self, name: &str) -> Option<ParameterValue> {
        self.parameters.get(name).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    CreateTarget { id: RenderTargetId, width: u32, height: u32 },
    ReleaseTarget(RenderTargetId),
    SetRenderTarget(Option<RenderTargetId>),
    SetRasterizer(RasterizerState),
    SetDepthStencil(DepthStencilState),
    Clear { target: Option<RenderTargetId>, color: ClearColor, depth: f32 },
    SetTechnique { effect: String, technique: String },
    SetParameter { effect: String, name: String, value: ParameterValue },
    /// A parameter the effect does not expose was set and dropped
    IgnoredParameter { effect: String, name: String },
    Draw(DrawRecord),
}

/// Shared, ordered event log
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TraceEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, event: TraceEvent) {
        self.lock().push(event);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.lock().clone()
    }

    /// Events recorded after the first `mark` events
    pub fn since(&self, mark: usize) -> Vec<TraceEvent> {
        self.lock().iter().skip(mark).cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn draws(&self) -> Vec<DrawRecord> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                TraceEvent::Draw(record) => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    /// Parameters currently bound on `effect`, replaying every binding so far
    pub fn bound_parameters(&self, effect: &str) -> BTreeMap<String, ParameterValue> {
        let mut bound = BTreeMap::new();
        for event in self.lock().iter() {
            if let TraceEvent::SetParameter { effect: e, name, value } = event {
                if e == effect {
                    bound.insert(name.clone(), *value);
                }
            }
        }
        bound
    }
}

/// Device that records state changes instead of submitting GPU work
pub struct TraceDevice {
    log: TraceLog,
    viewport: Viewport,
    target: Option<RenderTargetId>,
    rasterizer: RasterizerState,
    depth_stencil: DepthStencilState,
    next_target: u32,
    live: HashMap<RenderTargetId, RenderTargetDesc>,
}

impl TraceDevice {
    pub fn new(log: TraceLog, viewport: Viewport) -> Self {
        Self {
            log,
            viewport,
            target: None,
            rasterizer: RasterizerState::default(),
            depth_stencil: DepthStencilState::default(),
            next_target: 0,
            live: HashMap::new(),
        }
    }

    /// Simulate a window resize
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn live_targets(&self) -> usize {
        self.live.len()
    }

    pub fn log(&self) -> &TraceLog {
        &self.log
    }
}

impl GraphicsDevice for TraceDevice {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn render_target(&self) -> Option<RenderTargetId> {
        self.target
    }

    fn set_render_target(&mut self, target: Option<&RenderTarget>) {
        let id = target.map(RenderTarget::id);
        if let Some(id) = id {
            debug_assert!(self.live.contains_key(&id), "{id} bound after release");
        }
        self.target = id;
        self.log.push(TraceEvent::SetRenderTarget(id));
    }

    fn rasterizer_state(&self) -> RasterizerState {
        self.rasterizer
    }

    fn set_rasterizer_state(&mut self, state: RasterizerState) {
        self.rasterizer = state;
        self.log.push(TraceEvent::SetRasterizer(state));
    }

    fn depth_stencil_state(&self) -> DepthStencilState {
        self.depth_stencil
    }

    fn set_depth_stencil_state(&mut self, state: DepthStencilState) {
        self.depth_stencil = state;
        self.log.push(TraceEvent::SetDepthStencil(state));
    }

    fn clear(&mut self, color: ClearColor, depth: f32) {
        self.log.push(TraceEvent::Clear { target: self.target, color, depth });
    }
}

impl RenderTargetAllocator for TraceDevice {
    fn create(&mut self, desc: &RenderTargetDesc) -> Result<RenderTarget> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::Resource(format!(
                "{} has an empty extent {}x{}",
                desc.label, desc.width, desc.height
            )));
        }
        let id = RenderTargetId(self.next_target);
        self.next_target += 1;
        self.live.insert(id, *desc);
        self.log.push(TraceEvent::CreateTarget { id, width: desc.width, height: desc.height });
        Ok(RenderTarget::new(id, *desc))
    }

    fn release(&mut self, target: RenderTarget) {
        self.live.remove(&target.id());
        self.log.push(TraceEvent::ReleaseTarget(target.id()));
    }
}

/// Effect that exposes a fixed set of parameter names
pub struct TraceEffect {
    name: String,
    technique: String,
    exposed: HashSet<&'static str>,
    log: TraceLog,
}

impl TraceEffect {
    pub fn new(name: &str, exposed: &[&'static str], log: TraceLog) -> Self {
        Self {
            name: name.to_string(),
            technique: String::new(),
            exposed: exposed.iter().copied().collect(),
            log,
        }
    }

    pub fn lighting(log: TraceLog) -> Self {
        Self::new(
            "lighting",
            &[
                names::WORLD,
                names::VIEW,
                names::PROJECTION,
                names::INVERSE_TRANSPOSE_WORLD,
                names::LIGHT_POSITION,
                names::EYE_POSITION,
                names::AMBIENT_COLOR,
                names::DIFFUSE_COLOR,
                names::SPECULAR_COLOR,
                names::K_AMBIENT,
                names::K_DIFFUSE,
                names::K_SPECULAR,
                names::SHININESS,
                names::OBJECT_COLOR,
                names::CLIP_PLANE,
            ],
            log,
        )
    }

    pub fn skybox(log: TraceLog) -> Self {
        Self::new(
            "skybox",
            &[
                names::WORLD,
                names::VIEW,
                names::PROJECTION,
                names::EYE_POSITION,
                names::SKYBOX_TEXTURE,
                names::CLIP_PLANE,
            ],
            log,
        )
    }

    /// Water effect exposing every optional input
    pub fn water(log: TraceLog) -> Self {
        Self::new(
            "water",
            &[
                names::WORLD,
                names::VIEW,
                names::PROJECTION,
                names::WORLD_VIEW_PROJECTION,
                names::REFLECTION_VIEW,
                names::REFLECTION_TEXTURE,
                names::REFRACTION_TEXTURE,
                names::NORMAL_MAP,
                names::DISTORTION_MAP,
                names::TILING,
                names::MOVE_FACTOR,
                names::WAVE_STRENGTH,
                names::LIGHT_POSITION,
                names::LIGHT_COLOR,
                names::K_SPECULAR,
                names::SHININESS,
                names::FRESNEL_POWER,
                names::REFLECTION_MIX,
                names::EYE_POSITION,
                names::SURFACE_NORMAL,
            ],
            log,
        )
    }

    /// Remove a parameter, as a simplified shader variant would
    pub fn without(mut self, name: &str) -> Self {
        self.exposed.remove(name);
        self
    }
}

impl Effect for TraceEffect {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_technique(&mut self, technique: &str) {
        self.technique = technique.to_string();
        self.log.push(TraceEvent::SetTechnique {
            effect: self.name.clone(),
            technique: self.technique.clone(),
        });
    }

    fn technique(&self) -> &str {
        &self.technique
    }

    fn has_parameter(&self, name: &str) -> bool {
        self.exposed.contains(name)
    }

    fn set_parameter(&mut self, name: &str, value: ParameterValue) {
        let event = if self.exposed.contains(name) {
            TraceEvent::SetParameter { effect: self.name.clone(), name: name.to_string(), value }
        } else {
            TraceEvent::IgnoredParameter { effect: self.name.clone(), name: name.to_string() }
        };
        self.log.push(event);
    }
}

/// Mesh that records its draws
pub struct TraceMesh {
    kind: PrimitiveKind,
    log: TraceLog,
    fail: Arc<AtomicBool>,
}

impl TraceMesh {
    pub fn new(kind: PrimitiveKind, log: TraceLog) -> Self {
        Self { kind, log, fail: Arc::new(AtomicBool::new(false)) }
    }

    /// Every draw returns an error, as a lost device would
    pub fn failing(self) -> Self {
        self.fail.store(true, Ordering::Relaxed);
        self
    }

    /// Toggle failures after the mesh has been handed to a scene
    pub fn fail_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.fail)
    }
}

impl Drawable for TraceMesh {
    fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    fn draw(&self, device: &mut dyn GraphicsDevice, effect: &mut dyn Effect) -> Result<()> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(Error::Draw(format!("{} draw aborted", self.kind.label())));
        }
        if effect.technique().is_empty() {
            return Err(Error::Draw(format!("{} drawn before a technique was selected", effect.name())));
        }
        self.log.push(TraceEvent::Draw(DrawRecord {
            kind: self.kind,
            effect: effect.name().to_string(),
            technique: effect.technique().to_string(),
            target: device.render_target(),
            cull_mode: device.rasterizer_state().cull_mode,
            depth_stencil: device.depth_stencil_state(),
            parameters: self.log.bound_parameters(effect.name()),
        }));
        Ok(())
    }
}
