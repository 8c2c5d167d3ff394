//! Fixed-depth frame stack
//!
//! Holds one [`Frame`] per active coroutine of a task, outermost first.
//! Capacity is fixed at compile time; exceeding it is a programming error
//! and panics.

use crate::Breakpoint;
use core::mem;

/// One active coroutine
#[derive(Debug)]
pub struct Frame<F> {
    pub locals: F,
    /// Where the coroutine continues on its next resumption
    pub breakpoint: Breakpoint,
    /// Set once the coroutine has suspended at least once
    pub suspended: bool,
}

impl<F> Frame<F> {
    pub fn new(locals: F) -> Self {
        Self {
            locals,
            breakpoint: Breakpoint::START,
            suspended: false,
        }
    }
}

/// Stack of at most `DEPTH` frames
#[derive(Debug)]
pub struct FrameStack<F, const DEPTH: usize> {
    frames: [Option<Frame<F>>; DEPTH],
    len: usize,
}

impl<F, const DEPTH: usize> FrameStack<F, DEPTH> {
    pub fn new() -> Self {
        Self {
            frames: core::array::from_fn(|_| None),
            len: 0,
        }
    }

    /// Pushes a fresh frame for `locals`
    ///
    /// # Panics
    ///
    /// Panics if the stack already holds `DEPTH` frames.
    pub fn push(&mut self, locals: F) {
        assert!(
            self.len < DEPTH,
            "frame stack overflow: depth {} exhausted",
            DEPTH
        );
        self.frames[self.len] = Some(Frame::new(locals));
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<Frame<F>> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        self.frames[self.len].take()
    }

    /// Innermost frame
    pub fn top_mut(&mut self) -> Option<&mut Frame<F>> {
        let index = self.len.checked_sub(1)?;
        self.frames[index].as_mut()
    }

    /// Frame of the caller of the innermost frame
    pub fn caller_mut(&mut self) -> Option<&mut Frame<F>> {
        let index = self.len.checked_sub(2)?;
        self.frames[index].as_mut()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        DEPTH
    }

    /// Bytes of frame storage currently in use
    pub fn used_bytes(&self) -> usize {
        self.len * mem::size_of::<Option<Frame<F>>>()
    }

    pub fn capacity_bytes(&self) -> usize {
        DEPTH * mem::size_of::<Option<Frame<F>>>()
    }

    /// Drops every frame
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
    }
}

impl<F, const DEPTH: usize> Default for FrameStack<F, DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}
