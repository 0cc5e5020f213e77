#![forbid(unsafe_code)]

//! The live, UI-owned control container.
//!
//! Only the thread that owns the container ever calls into it. Background
//! aggregation builds controls into a [`ControlTree`](crate::control::ControlTree)
//! instead and hands the finished controls over.

use std::ops::{Deref, DerefMut};

use crate::control::Control;

/// Scroll position of a container, in container units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ScrollOffset {
    /// Horizontal offset.
    pub x: i32,
    /// Vertical offset.
    pub y: i32,
}

impl ScrollOffset {
    /// Offset at `(x, y)`.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A container that displays editable controls.
pub trait Container {
    /// Remove every attached control.
    fn reset(&mut self);

    /// Attach a top-level control after the existing ones.
    fn attach_control(&mut self, control: Control);

    /// Suspend visual updates.
    fn freeze(&mut self);

    /// Resume visual updates.
    fn thaw(&mut self);

    /// Recompute the position of every attached control.
    fn layout(&mut self);

    /// Current scroll position.
    fn scroll_offset(&self) -> ScrollOffset;

    /// Move to a scroll position.
    fn set_scroll_offset(&mut self, offset: ScrollOffset);

    /// Pull current values from the bound data into the attached controls.
    fn read(&mut self);

    /// Whether the container is currently shown.
    fn is_visible(&self) -> bool;
}

/// Keeps a container frozen for the guard's lifetime.
///
/// Thaws on drop, including during unwinding.
pub struct FreezeGuard<'a, C: Container + ?Sized> {
    container: &'a mut C,
}

impl<'a, C: Container + ?Sized> FreezeGuard<'a, C> {
    /// Freeze `container` until the guard is dropped.
    pub fn new(container: &'a mut C) -> Self {
        container.freeze();
        Self { container }
    }
}

impl<C: Container + ?Sized> Deref for FreezeGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.container
    }
}

impl<C: Container + ?Sized> DerefMut for FreezeGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.container
    }
}

impl<C: Container + ?Sized> Drop for FreezeGuard<'_, C> {
    fn drop(&mut self) {
        self.container.thaw();
    }
}
