#![forbid(unsafe_code)]

//! Test doubles and scenario helpers for the property inspector.
//!
//! - [`MockObject`]: a selectable object built from property, symbol, and
//!   panel lists, with call records and an enumeration hook.
//! - [`RecordingContainer`]: a [`Container`](inspect_core::Container) that
//!   logs every call and can be hidden.
//! - [`CountingInterpreters`]: an interpreter factory that adds one control
//!   per group and records what it saw.
//! - [`PanelLog`]: registries whose creators log the objects they get.
//! - [`Gate`]: holds a worker thread at a known point.
//!
//! # Quick Start
//!
//! ```ignore
//! use inspect_harness::{MockObject, PanelLog, RecordingContainer, controls_to_text};
//!
//! let a = MockObject::new("A").properties(["x", "y"]).accepts(["P1"]);
//! let log = PanelLog::new();
//! let registry = log.registry(&["P1", "P2"]);
//! ```

pub mod container;
pub mod gate;
pub mod interpreters;
pub mod mock;
pub mod panels;

use std::fmt::Write as FmtWrite;

use inspect_core::{Control, ControlKind};

pub use container::{ContainerOp, RecordingContainer};
pub use gate::{GATE_TIMEOUT, Gate};
pub use interpreters::CountingInterpreters;
pub use mock::{MockElement, MockObject, MockSymbol};
pub use panels::PanelLog;

// ============================================================================
// Control tree → Text Conversion
// ============================================================================

/// Render controls as an indented outline, one control per line.
///
/// Groups are prefixed `+`, fields `=`, labels `-`. Field values follow a
/// colon when set.
pub fn controls_to_text(controls: &[Control]) -> String {
    let mut out = String::new();
    for control in controls {
        write_control(&mut out, control, 0);
    }
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

fn write_control(out: &mut String, control: &Control, depth: usize) {
    let marker = match control.kind() {
        ControlKind::Group => '+',
        ControlKind::Field(_) => '=',
        ControlKind::Label => '-',
    };
    let _ = write!(out, "{:indent$}{marker} {}", "", control.text(), indent = depth * 2);
    if let Some(value) = control.value() {
        let _ = write!(out, ": {value}");
    }
    out.push('\n');
    for child in control.children() {
        write_control(out, child, depth + 1);
    }
}
