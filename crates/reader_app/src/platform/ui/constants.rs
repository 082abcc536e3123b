/// Columns taken by the draggable divider between the panes.
pub const DIVIDER_WIDTH: u16 = 1;
pub const HEADER_HEIGHT: u16 = 1;
pub const STATUS_HEIGHT: u16 = 1;
pub const INPUT_HEIGHT: u16 = 3;
/// Most source rows shown before the list scrolls.
pub const MAX_SOURCE_ROWS: u16 = 6;
/// Width of the `> [x] ` prefix on a source row; clicks there toggle scope.
pub const SOURCE_CHECKBOX_COLS: u16 = 6;
pub const SUGGESTION_GAP: u16 = 1;
