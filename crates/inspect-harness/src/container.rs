#![forbid(unsafe_code)]

//! A container that records every call made to it.

use inspect_core::{Container, Control, ScrollOffset};
use serde_json::json;

/// One call made to a [`RecordingContainer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerOp {
    /// `reset`
    Reset,
    /// `attach_control`, with the control's label.
    Attach(String),
    /// `freeze`
    Freeze,
    /// `thaw`
    Thaw,
    /// `layout`
    Layout,
    /// `set_scroll_offset`
    SetScroll(ScrollOffset),
    /// `read`
    Read,
}

impl ContainerOp {
    /// The call as a JSON object, for failure dumps.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Reset => json!({ "op": "reset" }),
            Self::Attach(label) => json!({ "op": "attach", "label": label }),
            Self::Freeze => json!({ "op": "freeze" }),
            Self::Thaw => json!({ "op": "thaw" }),
            Self::Layout => json!({ "op": "layout" }),
            Self::SetScroll(offset) => json!({ "op": "scroll", "x": offset.x, "y": offset.y }),
            Self::Read => json!({ "op": "read" }),
        }
    }
}

/// In-memory [`Container`] with a call log and a visibility switch.
#[derive(Debug)]
pub struct RecordingContainer {
    controls: Vec<Control>,
    ops: Vec<ContainerOp>,
    visible: bool,
    frozen: usize,
    scroll: ScrollOffset,
}

impl Default for RecordingContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingContainer {
    /// Visible, empty container.
    pub fn new() -> Self {
        Self {
            controls: Vec::new(),
            ops: Vec::new(),
            visible: true,
            frozen: 0,
            scroll: ScrollOffset::default(),
        }
    }

    /// Hidden, empty container.
    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::new()
        }
    }

    /// Show or hide the container.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Attached controls.
    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// Labels of the attached top-level controls.
    pub fn control_labels(&self) -> Vec<&str> {
        self.controls.iter().map(Control::text).collect()
    }

    /// Calls made so far.
    pub fn ops(&self) -> &[ContainerOp] {
        &self.ops
    }

    /// Forget recorded calls.
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Number of `read` calls recorded.
    pub fn read_count(&self) -> usize {
        self.ops.iter().filter(|op| **op == ContainerOp::Read).count()
    }

    /// Whether a freeze is outstanding.
    pub fn is_frozen(&self) -> bool {
        self.frozen > 0
    }

    /// Recorded calls as JSON lines.
    pub fn ops_jsonl(&self) -> String {
        self.ops
            .iter()
            .map(|op| op.to_json().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Container for RecordingContainer {
    fn reset(&mut self) {
        self.controls.clear();
        self.ops.push(ContainerOp::Reset);
    }

    fn attach_control(&mut self, control: Control) {
        self.ops.push(ContainerOp::Attach(control.text().to_owned()));
        self.controls.push(control);
    }

    fn freeze(&mut self) {
        self.frozen += 1;
        self.ops.push(ContainerOp::Freeze);
    }

    fn thaw(&mut self) {
        self.frozen = self.frozen.saturating_sub(1);
        self.ops.push(ContainerOp::Thaw);
    }

    fn layout(&mut self) {
        self.ops.push(ContainerOp::Layout);
    }

    fn scroll_offset(&self) -> ScrollOffset {
        self.scroll
    }

    fn set_scroll_offset(&mut self, offset: ScrollOffset) {
        self.scroll = offset;
        self.ops.push(ContainerOp::SetScroll(offset));
    }

    fn read(&mut self) {
        self.ops.push(ContainerOp::Read);
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}
