//! Resizable split between the conversation pane and the document pane.

/// Smallest share of the container the left pane may take, in percent.
pub const MIN_RATIO: f32 = 25.0;
/// Largest share of the container the left pane may take, in percent.
pub const MAX_RATIO: f32 = 75.0;
pub const DEFAULT_RATIO: f32 = 50.0;
/// Step used by keyboard nudges.
pub const NUDGE_STEP: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging,
}

/// Horizontal extent of the element both panes live in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneBounds {
    pub left: f32,
    pub width: f32,
}

/// Left pane width as a percentage of the container, plus the drag phase.
///
/// The ratio is always within [`MIN_RATIO`, `MAX_RATIO`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitState {
    ratio: f32,
    phase: DragPhase,
}

impl Default for SplitState {
    fn default() -> Self {
        Self {
            ratio: DEFAULT_RATIO,
            phase: DragPhase::Idle,
        }
    }
}

impl SplitState {
    pub fn with_ratio(ratio: f32) -> Self {
        Self {
            ratio: clamp_ratio(ratio),
            phase: DragPhase::Idle,
        }
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == DragPhase::Dragging
    }

    /// Text selection is off for the whole layout while a drag is live.
    pub fn text_selection_suppressed(&self) -> bool {
        self.is_dragging()
    }

    /// Pointer pressed on the divider. Returns true when a drag started.
    pub fn press(&mut self) -> bool {
        if self.is_dragging() {
            return false;
        }
        self.phase = DragPhase::Dragging;
        true
    }

    /// Pointer moved anywhere. Returns true when the ratio changed.
    ///
    /// Ignored unless dragging, or when the container has no usable width.
    pub fn pointer_moved(&mut self, pointer_x: f32, bounds: PaneBounds) -> bool {
        if !self.is_dragging() {
            return false;
        }
        let usable = bounds.width.is_finite() && bounds.width > 0.0;
        if !usable || !pointer_x.is_finite() || !bounds.left.is_finite() {
            return false;
        }
        let percent = (pointer_x - bounds.left) / bounds.width * 100.0;
        self.commit(percent)
    }

    /// Pointer released anywhere. Returns true when a drag ended.
    pub fn release(&mut self) -> bool {
        if !self.is_dragging() {
            return false;
        }
        self.phase = DragPhase::Idle;
        true
    }

    /// Shift the ratio by `delta` percentage points. Returns true when it changed.
    pub fn nudge(&mut self, delta: f32) -> bool {
        self.commit(self.ratio + delta)
    }

    fn commit(&mut self, percent: f32) -> bool {
        let next = clamp_ratio(percent);
        if next == self.ratio {
            return false;
        }
        self.ratio = next;
        true
    }
}

/// Clamp to [`MIN_RATIO`, `MAX_RATIO`]; non-finite input falls back to the default.
pub fn clamp_ratio(percent: f32) -> f32 {
    if percent.is_finite() {
        percent.clamp(MIN_RATIO, MAX_RATIO)
    } else {
        DEFAULT_RATIO
    }
}

/// Split `total` cells into (left, right) around a divider of `divider` cells.
pub fn split_widths(total: u16, divider: u16, ratio: f32) -> (u16, u16) {
    let usable = total.saturating_sub(divider);
    let left = (f32::from(usable) * clamp_ratio(ratio) / 100.0).round() as u16;
    let left = left.min(usable);
    (left, usable - left)
}
