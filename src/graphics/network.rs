//! Double-buffered frame handoff to the network consumer
//!
//! The producer renders every viewport into the *current* slot's staging
//! (intermediate) surfaces without holding any lock. Publishing copies each
//! viewport's staging pair into that slot's final pair under the viewport's
//! own lock, then marks the slot ready and flips the current slot. The
//! consumer only ever reads final surfaces of the ready slot, under the same
//! per-viewport lock.
//!
//! Key concepts:
//! - `NetworkFrameExchange`: the shared half (finals, locks, slot indices)
//! - `NetworkFramePipeline`: the producer half (staging, cycle state)
//! - Per-viewport locking: a consumer reading one viewport never waits on a
//!   copy into another

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::graphics::geometry::Vector;
use crate::graphics::palette::MASK_COLOR_8;
use crate::graphics::scene::ViewTargets;
use crate::graphics::surface::{Surface, SurfaceError};
use crate::graphics::viewport::MAX_SCREENS;

/// Number of buffer generations
pub const SLOT_COUNT: usize = 2;

/// Background layer offsets kept per viewport for network consumers
pub const MAX_LAYERS_STORED_FOR_NETWORK: usize = 10;

/// Errors from the network frame pipeline
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("Viewport {0} is out of range")]
    ViewportOutOfRange(usize),

    #[error("Network buffers for viewport {0} are not allocated")]
    NotAllocated(usize),

    #[error("Cannot {action} while the pipeline is {state:?}")]
    InvalidState {
        action: &'static str,
        state: PipelineState,
    },

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Render cycle state of the producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Composing,
    Publishing,
}

/// What a consumer sees of one viewport
#[derive(Debug, Clone)]
pub struct NetworkFrame {
    pub scene: Surface,
    pub gui: Surface,
    /// Scene position the viewport was drawn at
    pub target_pos: Vector,
    /// Background layer offsets, at most `MAX_LAYERS_STORED_FOR_NETWORK`
    pub layer_offsets: Vec<Vector>,
    /// Publish sequence number, 0 before the first publish
    pub frame_number: u64,
}

impl NetworkFrame {
    fn blank(width: u32, height: u32) -> Result<Self, SurfaceError> {
        Ok(Self {
            scene: Surface::new_indexed(width, height)?,
            gui: Surface::new_indexed(width, height)?,
            target_pos: Vector::zero(),
            layer_offsets: Vec::new(),
            frame_number: 0,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.scene.dimensions()
    }
}

/// Final surfaces of one viewport across both slots
type ViewportFinals = [Option<NetworkFrame>; SLOT_COUNT];

/// Shared side of the handoff
#[derive(Debug)]
pub struct NetworkFrameExchange {
    viewports: [Mutex<ViewportFinals>; MAX_SCREENS],
    ready: AtomicUsize,
    current: AtomicUsize,
    published: AtomicU64,
}

impl NetworkFrameExchange {
    fn new() -> Self {
        Self {
            viewports: std::array::from_fn(|_| Mutex::new([None, None])),
            ready: AtomicUsize::new(1),
            current: AtomicUsize::new(0),
            published: AtomicU64::new(0),
        }
    }

    /// Slot consumers read from
    pub fn ready_slot(&self) -> usize {
        self.ready.load(Ordering::Acquire)
    }

    /// Slot the producer writes into
    pub fn current_slot(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    /// Number of completed publishes
    pub fn published_frames(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }

    /// Run `f` on a viewport's ready frame while holding that viewport's lock.
    /// Returns `None` if the viewport has no buffers.
    pub fn with_ready_frame<R>(&self, viewport: usize, f: impl FnOnce(&NetworkFrame) -> R) -> Option<R> {
        let finals = self.viewports.get(viewport)?.lock();
        let ready = self.ready.load(Ordering::Acquire);
        finals[ready].as_ref().map(f)
    }

    /// Size of a viewport's ready frame
    pub fn frame_size(&self, viewport: usize) -> Option<(u32, u32)> {
        self.with_ready_frame(viewport, NetworkFrame::dimensions)
    }

    /// Smallest width and height over every allocated viewport, starting from
    /// `upper`. Unallocated viewports are skipped.
    pub fn min_frame_size(&self, upper: (u32, u32)) -> (u32, u32) {
        (0..MAX_SCREENS)
            .filter_map(|i| self.frame_size(i))
            .fold(upper, |(w, h), (fw, fh)| (w.min(fw), h.min(fh)))
    }

    /// Copy out a viewport's ready frame
    pub fn snapshot(&self, viewport: usize) -> Option<NetworkFrame> {
        self.with_ready_frame(viewport, |frame| frame.clone())
    }
}

/// Producer staging for one viewport in one slot
#[derive(Debug)]
struct Staging {
    scene: Surface,
    gui: Surface,
    target_pos: Vector,
    layer_offsets: Vec<Vector>,
}

impl Staging {
    fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        let mut scene = Surface::new_indexed(width, height)?;
        let mut gui = Surface::new_indexed(width, height)?;
        scene.clear(MASK_COLOR_8);
        gui.clear(MASK_COLOR_8);
        Ok(Self {
            scene,
            gui,
            target_pos: Vector::zero(),
            layer_offsets: Vec::new(),
        })
    }
}

/// Producer side of the handoff
#[derive(Debug)]
pub struct NetworkFramePipeline {
    exchange: Arc<NetworkFrameExchange>,
    staging: [[Option<Staging>; MAX_SCREENS]; SLOT_COUNT],
    state: PipelineState,
    listeners: Vec<Sender<u64>>,
}

impl NetworkFramePipeline {
    pub fn new() -> Self {
        Self {
            exchange: Arc::new(NetworkFrameExchange::new()),
            staging: std::array::from_fn(|_| std::array::from_fn(|_| None)),
            state: PipelineState::Idle,
            listeners: Vec::new(),
        }
    }

    /// Shared handle for consumers
    pub fn exchange(&self) -> Arc<NetworkFrameExchange> {
        Arc::clone(&self.exchange)
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Receive the frame number of every future publish
    pub fn subscribe(&mut self) -> Receiver<u64> {
        let (tx, rx) = unbounded();
        self.listeners.push(tx);
        rx
    }

    fn check_viewport(viewport: usize) -> Result<(), PipelineError> {
        if viewport >= MAX_SCREENS {
            return Err(PipelineError::ViewportOutOfRange(viewport));
        }
        Ok(())
    }

    fn expect_state(&self, expected: PipelineState, action: &'static str) -> Result<(), PipelineError> {
        if self.state != expected {
            return Err(PipelineError::InvalidState {
                action,
                state: self.state,
            });
        }
        Ok(())
    }

    pub fn is_allocated(&self, viewport: usize) -> bool {
        viewport < MAX_SCREENS && self.staging[0][viewport].is_some()
    }

    /// Size of a viewport's network buffers
    pub fn viewport_size(&self, viewport: usize) -> Option<(u32, u32)> {
        self.staging
            .first()?
            .get(viewport)?
            .as_ref()
            .map(|s| s.scene.dimensions())
    }

    /// Recreate every buffer of a viewport, in both slots, at a new size
    ///
    /// Only allowed between render cycles.
    pub fn resize_viewport(&mut self, viewport: usize, width: u32, height: u32) -> Result<(), PipelineError> {
        Self::check_viewport(viewport)?;
        self.expect_state(PipelineState::Idle, "resize a viewport")?;

        for slot in 0..SLOT_COUNT {
            self.staging[slot][viewport] = Some(Staging::new(width, height)?);
        }
        let fresh = [
            Some(NetworkFrame::blank(width, height)?),
            Some(NetworkFrame::blank(width, height)?),
        ];
        *self.exchange.viewports[viewport].lock() = fresh;

        log::debug!("Network buffers for viewport {} set to {}x{}", viewport, width, height);
        Ok(())
    }

    /// Start composing into the current slot
    pub fn begin_frame(&mut self) -> Result<usize, PipelineError> {
        self.expect_state(PipelineState::Idle, "begin a frame")?;
        self.state = PipelineState::Composing;
        Ok(self.exchange.current_slot())
    }

    fn current_staging(&mut self, viewport: usize) -> Result<&mut Staging, PipelineError> {
        Self::check_viewport(viewport)?;
        let current = self.exchange.current_slot();
        self.staging[current][viewport]
            .as_mut()
            .ok_or(PipelineError::NotAllocated(viewport))
    }

    /// Scene and GUI surfaces of a viewport in the current slot
    pub fn staging_targets(&mut self, viewport: usize) -> Result<ViewTargets<'_>, PipelineError> {
        self.expect_state(PipelineState::Composing, "draw a viewport")?;
        let staging = self.current_staging(viewport)?;
        Ok(ViewTargets::split(&mut staging.scene, &mut staging.gui))
    }

    /// Remember where a viewport was drawn for consumers of this frame
    pub fn record_view(
        &mut self,
        viewport: usize,
        target_pos: Vector,
        layer_offsets: &[Vector],
    ) -> Result<(), PipelineError> {
        self.expect_state(PipelineState::Composing, "record a view")?;
        let staging = self.current_staging(viewport)?;
        staging.target_pos = target_pos;
        staging.layer_offsets.clear();
        staging
            .layer_offsets
            .extend(layer_offsets.iter().take(MAX_LAYERS_STORED_FOR_NETWORK).copied());
        Ok(())
    }

    /// Publish the current slot
    ///
    /// Each viewport is copied under its own lock. The ready slot changes only
    /// after every copy is done, then the other slot becomes current.
    pub fn prepare_frame_for_network(&mut self) -> Result<u64, PipelineError> {
        self.expect_state(PipelineState::Composing, "publish a frame")?;
        self.state = PipelineState::Publishing;

        let current = self.exchange.current_slot();
        let frame_number = self.exchange.published_frames() + 1;

        // The ready slot is untouched on failure, so consumers keep the last
        // complete frame and the next cycle can start over.
        if let Err(e) = self.copy_to_finals(current, frame_number) {
            log::warn!("Network frame {} not published: {}", frame_number, e);
            self.state = PipelineState::Idle;
            return Err(e);
        }

        self.exchange.ready.store(current, Ordering::Release);
        self.exchange.current.store(current ^ 1, Ordering::Release);
        self.exchange.published.store(frame_number, Ordering::Release);
        self.state = PipelineState::Idle;

        self.listeners.retain(|tx| tx.send(frame_number).is_ok());
        Ok(frame_number)
    }

    fn copy_to_finals(&self, slot: usize, frame_number: u64) -> Result<(), PipelineError> {
        for viewport in 0..MAX_SCREENS {
            let Some(staging) = self.staging[slot][viewport].as_ref() else {
                continue;
            };
            let mut finals = self.exchange.viewports[viewport].lock();
            if let Some(frame) = finals[slot].as_mut() {
                frame.scene.copy_from(&staging.scene)?;
                frame.gui.copy_from(&staging.gui)?;
                frame.target_pos = staging.target_pos;
                frame.layer_offsets.clone_from(&staging.layer_offsets);
                frame.frame_number = frame_number;
            }
        }
        Ok(())
    }

    /// Abandon a cycle that failed mid-way so the next one can start
    pub fn abort_frame(&mut self) {
        if self.state != PipelineState::Idle {
            log::warn!("Abandoning network frame while {:?}", self.state);
        }
        self.state = PipelineState::Idle;
    }
}

impl Default for NetworkFramePipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compose(pipeline: &mut NetworkFramePipeline, viewport: usize, color: u32) {
        let mut targets = pipeline.staging_targets(viewport).unwrap();
        targets.scene.clear(color);
        targets.gui_mut().clear(color + 1);
    }

    #[test]
    fn test_initial_slots() {
        let pipeline = NetworkFramePipeline::new();
        let exchange = pipeline.exchange();
        assert_eq!(exchange.current_slot(), 0);
        assert_eq!(exchange.ready_slot(), 1);
        assert_eq!(exchange.published_frames(), 0);
        assert!(exchange.snapshot(0).is_none());
    }

    #[test]
    fn test_publish_swaps_slots() {
        let mut pipeline = NetworkFramePipeline::new();
        pipeline.resize_viewport(0, 8, 4).unwrap();
        let exchange = pipeline.exchange();

        let slot = pipeline.begin_frame().unwrap();
        assert_eq!(slot, 0);
        compose(&mut pipeline, 0, 10);
        assert_eq!(pipeline.prepare_frame_for_network().unwrap(), 1);
        assert_eq!(exchange.ready_slot(), 0);
        assert_eq!(exchange.current_slot(), 1);

        let frame = exchange.snapshot(0).unwrap();
        assert_eq!(frame.scene.get_pixel(3, 3), Some(10));
        assert_eq!(frame.gui.get_pixel(0, 0), Some(11));
        assert_eq!(frame.frame_number, 1);

        pipeline.begin_frame().unwrap();
        compose(&mut pipeline, 0, 20);
        pipeline.prepare_frame_for_network().unwrap();
        assert_eq!(exchange.ready_slot(), 1);
        assert_eq!(exchange.current_slot(), 0);
        assert_eq!(exchange.snapshot(0).unwrap().scene.get_pixel(0, 0), Some(20));
    }

    #[test]
    fn test_staging_untouched_by_publish() {
        let mut pipeline = NetworkFramePipeline::new();
        pipeline.resize_viewport(1, 2, 2).unwrap();
        pipeline.begin_frame().unwrap();
        compose(&mut pipeline, 1, 4);
        pipeline.prepare_frame_for_network().unwrap();

        // Slot 0 staging still holds what was drawn; it was copied, not moved
        assert_eq!(pipeline.staging[0][1].as_ref().unwrap().scene.get_pixel(1, 1), Some(4));
    }

    #[test]
    fn test_state_machine_guards() {
        let mut pipeline = NetworkFramePipeline::new();
        pipeline.resize_viewport(0, 2, 2).unwrap();
        assert!(matches!(
            pipeline.staging_targets(0),
            Err(PipelineError::InvalidState { .. })
        ));
        assert!(pipeline.prepare_frame_for_network().is_err());

        pipeline.begin_frame().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Composing);
        assert!(pipeline.begin_frame().is_err());
        assert!(matches!(
            pipeline.resize_viewport(0, 4, 4),
            Err(PipelineError::InvalidState { .. })
        ));
        pipeline.abort_frame();
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[test]
    fn test_unallocated_and_out_of_range() {
        let mut pipeline = NetworkFramePipeline::new();
        pipeline.begin_frame().unwrap();
        assert_eq!(
            pipeline.staging_targets(2).err(),
            Some(PipelineError::NotAllocated(2))
        );
        assert_eq!(
            pipeline.staging_targets(4).err(),
            Some(PipelineError::ViewportOutOfRange(4))
        );
    }

    #[test]
    fn test_record_view_caps_layers() {
        let mut pipeline = NetworkFramePipeline::new();
        pipeline.resize_viewport(0, 2, 2).unwrap();
        pipeline.begin_frame().unwrap();
        let layers: Vec<Vector> = (0..15).map(|i| Vector::new(i as f32, 0.0)).collect();
        pipeline.record_view(0, Vector::new(5.0, 6.0), &layers).unwrap();
        pipeline.prepare_frame_for_network().unwrap();

        let frame = pipeline.exchange().snapshot(0).unwrap();
        assert_eq!(frame.target_pos, Vector::new(5.0, 6.0));
        assert_eq!(frame.layer_offsets.len(), MAX_LAYERS_STORED_FOR_NETWORK);
        assert_eq!(frame.layer_offsets[9], Vector::new(9.0, 0.0));
    }

    #[test]
    fn test_min_frame_size_skips_unallocated() {
        let mut pipeline = NetworkFramePipeline::new();
        let exchange = pipeline.exchange();
        assert_eq!(exchange.min_frame_size((960, 540)), (960, 540));

        pipeline.resize_viewport(0, 480, 540).unwrap();
        pipeline.resize_viewport(3, 960, 270).unwrap();
        assert_eq!(exchange.min_frame_size((960, 540)), (480, 270));
        assert_eq!(exchange.frame_size(3), Some((960, 270)));
        assert_eq!(exchange.frame_size(1), None);
    }

    #[test]
    fn test_failed_publish_returns_to_idle() {
        let mut pipeline = NetworkFramePipeline::new();
        pipeline.resize_viewport(0, 4, 4).unwrap();
        let exchange = pipeline.exchange();
        let rx = pipeline.subscribe();

        pipeline.begin_frame().unwrap();
        // Staging no longer matches the finals it is copied into
        pipeline.staging[0][0] = Some(Staging::new(8, 8).unwrap());
        assert!(matches!(
            pipeline.prepare_frame_for_network(),
            Err(PipelineError::Surface(_))
        ));
        assert_eq!(pipeline.state(), PipelineState::Idle);
        assert_eq!(exchange.ready_slot(), 1);
        assert_eq!(exchange.current_slot(), 0);
        assert_eq!(exchange.published_frames(), 0);
        assert!(rx.try_recv().is_err());

        pipeline.resize_viewport(0, 4, 4).unwrap();
        pipeline.begin_frame().unwrap();
        assert_eq!(pipeline.prepare_frame_for_network().unwrap(), 1);
    }

    #[test]
    fn test_subscribers_notified() {
        let mut pipeline = NetworkFramePipeline::new();
        let rx = pipeline.subscribe();
        pipeline.begin_frame().unwrap();
        pipeline.prepare_frame_for_network().unwrap();
        pipeline.begin_frame().unwrap();
        pipeline.prepare_frame_for_network().unwrap();
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![1, 2]);

        drop(rx);
        pipeline.begin_frame().unwrap();
        pipeline.prepare_frame_for_network().unwrap();
        assert!(pipeline.listeners.is_empty());
    }
}
