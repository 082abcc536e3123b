//! Reader core: pure state machine and view-model helpers.
mod citation;
mod coordinator;
mod effect;
mod model;
mod msg;
mod split;
mod state;
mod update;
mod view_model;

pub use citation::{find_citation, first_page, resolve_citations, CitedRef, Segment};
pub use coordinator::{ViewerSelection, ViewerTarget};
pub use effect::Effect;
pub use model::{AnswerResult, Citation, Document, DocumentId};
pub use msg::Msg;
pub use split::{
    clamp_ratio, split_widths, DragPhase, PaneBounds, SplitState, DEFAULT_RATIO, MAX_RATIO,
    MIN_RATIO, NUDGE_STEP,
};
pub use state::{AppState, DEFAULT_TOP_K};
pub use update::update;
pub use view_model::{
    AppViewModel, InputMode, Notification, PageView, SourceRowView, ViewerPaneView,
};
