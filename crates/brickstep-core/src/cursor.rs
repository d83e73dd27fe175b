//! Cursor traversal over a sub-assembly
//!
//! `advance` and `retreat` move by exactly one visible unit: parts are
//! revealed (or hidden) on the way without pausing, step markers stop the
//! scan, and nested sub-assemblies are walked recursively with their own
//! cursor. Both return `false` once the boundary is reached and leave the
//! cursor resting on the first or last child.

use tracing::debug;

use crate::animation::{approach_from, Animator, ANIMATION_DURATION};
use crate::assembly::{AssemblyNode, StepMarker, SubAssembly};

impl SubAssembly {
    /// Move forward to the next step, revealing parts on the way
    pub fn advance<A: Animator + ?Sized>(&mut self, animator: &mut A) -> bool {
        let len = self.children.len();
        if len == 0 {
            self.cursor = 0;
            return false;
        }

        // The step under the cursor is already shown
        if self.children.get(self.cursor).is_some_and(AssemblyNode::is_step) {
            self.cursor += 1;
        }

        while self.cursor < len {
            let idx = self.cursor;
            if self.children[idx].is_step() {
                self.play_step_animations(idx, animator);
                debug!(assembly = %self.name, index = idx, "Advanced to step");
                return true;
            }

            match &mut self.children[idx] {
                AssemblyNode::SubAssembly(sub) => {
                    if sub.advance(animator) {
                        // Built in its start pose until the placing step
                        animator.place(&sub.name, sub.start_position);
                        return true;
                    }
                }
                AssemblyNode::Part(part) => {
                    if !part.visible {
                        part.visible = true;
                        animator.set_visible(&part.name, true);
                    }
                }
                AssemblyNode::Step(_) => unreachable!("step markers handled above"),
            }
            self.cursor += 1;
        }

        self.cursor = len - 1;
        false
    }

    /// Move back to the previous step, hiding parts on the way
    pub fn retreat<A: Animator + ?Sized>(&mut self, animator: &mut A) -> bool {
        if self.children.is_empty() {
            self.cursor = 0;
            return false;
        }

        if self.children.get(self.cursor).is_some_and(AssemblyNode::is_step) {
            if self.cursor == 0 {
                return false;
            }
            self.cursor -= 1;

            // Stepping back into a sub-assembly shows it about to be
            // placed, not mid-build
            if let AssemblyNode::SubAssembly(sub) = &self.children[self.cursor] {
                animator.place(&sub.name, sub.start_position);
                debug!(assembly = %self.name, sub_assembly = %sub.name, "Retreated into sub-assembly");
                return true;
            }
        }

        loop {
            let idx = self.cursor;
            match &mut self.children[idx] {
                AssemblyNode::Step(_) => {
                    debug!(assembly = %self.name, index = idx, "Retreated to step");
                    return true;
                }
                AssemblyNode::SubAssembly(sub) => {
                    if sub.retreat(animator) {
                        animator.place(&sub.name, sub.start_position);
                        return true;
                    }
                }
                AssemblyNode::Part(part) => {
                    if part.visible {
                        part.visible = false;
                        animator.set_visible(&part.name, false);
                    }
                }
            }

            if idx == 0 {
                break;
            }
            self.cursor -= 1;
        }

        self.cursor = 0;
        false
    }

    /// The step marker the cursor currently rests on, looking through
    /// nested sub-assemblies
    pub fn current_step(&self) -> Option<&StepMarker> {
        match self.children.get(self.cursor)? {
            AssemblyNode::Step(step) => Some(step),
            AssemblyNode::SubAssembly(sub) => sub.current_step(),
            AssemblyNode::Part(_) => None,
        }
    }

    /// Animate the units that make up the step closed by the marker at
    /// `step_idx`: everything back to the previous marker, or a single
    /// sub-assembly placed by this step
    fn play_step_animations<A: Animator + ?Sized>(&self, step_idx: usize, animator: &mut A) {
        let direction = match &self.children[step_idx] {
            AssemblyNode::Step(step) => step.animation_direction,
            _ => return,
        };

        for child in self.children[..step_idx].iter().rev() {
            match child {
                AssemblyNode::Step(_) => return,
                AssemblyNode::SubAssembly(sub) => {
                    animator.trigger(&sub.name, sub.start_position, sub.position, ANIMATION_DURATION);
                    return;
                }
                AssemblyNode::Part(part) => {
                    animator.trigger(
                        &part.name,
                        approach_from(part.position, direction),
                        part.position,
                        ANIMATION_DURATION,
                    );
                }
            }
        }
    }
}
