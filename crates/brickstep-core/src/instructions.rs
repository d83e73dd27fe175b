//! Host-facing instruction sequencer
//!
//! Owns the numbered assembly tree together with the animator it drives
//! and exposes the single-step host commands.

use tracing::{debug, info};

use crate::animation::Animator;
use crate::assembly::{StepMarker, SubAssembly};
use crate::navigator::{GoTo, GoToOutcome, GoToStep};
use crate::numbering::{number_sub_assembly, NumberingError};
use crate::version::VersionId;

/// A numbered assembly plus the animator that renders its traversal
#[derive(Debug)]
pub struct Instructions<A> {
    root: SubAssembly,
    animator: A,
}

impl<A: Animator> Instructions<A> {
    /// Take ownership of `root`, mark it as the top of the tree and number it
    ///
    /// Parts stay visible, matching a freshly loaded model.
    pub fn new(mut root: SubAssembly, animator: A) -> Result<Self, NumberingError> {
        root.is_root = true;
        number_sub_assembly(&mut root, "", false)?;
        info!(
            assembly = %root.name,
            steps = root.steps().len(),
            parts = root.parts().len(),
            "Prepared instructions"
        );
        Ok(Self { root, animator })
    }

    /// Renumber and rewind to the start
    ///
    /// With `clear` every part is hidden so stepping can start from an
    /// empty scene, otherwise the whole model is shown.
    pub fn reset(&mut self, clear: bool) -> Result<(), NumberingError> {
        number_sub_assembly(&mut self.root, "", clear)?;
        for part in self.root.parts() {
            self.animator.set_visible(&part.name, part.visible);
        }
        debug!(clear, "Reset instructions");
        Ok(())
    }

    pub fn step_forward(&mut self) -> bool {
        self.root.advance(&mut self.animator)
    }

    pub fn step_backward(&mut self) -> bool {
        self.root.retreat(&mut self.animator)
    }

    /// Perform one unit of a go-to plan
    pub fn drive(&mut self, plan: &mut GoTo) -> GoToStep {
        plan.step(&mut self.root, &mut self.animator)
    }

    /// Run a go-to to completion without pausing between units
    pub fn jump_to(&mut self, target: VersionId) -> GoToOutcome {
        let mut plan = GoTo::new(target);
        loop {
            if let GoToStep::Done(outcome) = self.drive(&mut plan) {
                return outcome;
            }
        }
    }

    pub fn current_step(&self) -> Option<&StepMarker> {
        self.root.current_step()
    }

    pub fn current_step_id(&self) -> Option<VersionId> {
        self.current_step().and_then(|s| s.resolved_id.clone())
    }

    pub fn current_step_label(&self) -> Option<String> {
        self.current_step().and_then(|s| s.label.clone())
    }

    /// Every step label in build order
    pub fn labels(&self) -> Vec<String> {
        self.root
            .steps()
            .iter()
            .filter_map(|s| s.label.clone())
            .collect()
    }

    pub fn step_count(&self) -> usize {
        self.root.steps().len()
    }

    pub fn root(&self) -> &SubAssembly {
        &self.root
    }

    pub fn animator(&self) -> &A {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut A {
        &mut self.animator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationEvent, AnimationLog, NullAnimator};
    use crate::assembly::AssemblyNode;

    fn tower() -> SubAssembly {
        SubAssembly::new(
            "tower",
            vec![
                AssemblyNode::part("a"),
                AssemblyNode::step(),
                AssemblyNode::part("b"),
                AssemblyNode::step(),
            ],
        )
    }

    #[test]
    fn test_new_marks_root_and_numbers() {
        let instructions = Instructions::new(tower(), NullAnimator).unwrap();
        assert!(instructions.root().is_root);
        assert_eq!(instructions.labels(), vec!["1", "2"]);
        assert_eq!(instructions.step_count(), 2);
        assert_eq!(instructions.current_step_label(), None);
    }

    #[test]
    fn test_malformed_manual_number_fails_load() {
        let root = SubAssembly::new("bad", vec![AssemblyNode::numbered_step("1.?")]);
        assert!(matches!(
            Instructions::new(root, NullAnimator),
            Err(NumberingError::MalformedManualNumber { .. })
        ));
    }

    #[test]
    fn test_step_forward_and_backward() {
        let mut instructions = Instructions::new(tower(), NullAnimator).unwrap();
        instructions.reset(true).unwrap();

        assert!(instructions.step_forward());
        assert_eq!(instructions.current_step_label().as_deref(), Some("1"));
        assert!(instructions.step_forward());
        assert_eq!(instructions.current_step_label().as_deref(), Some("2"));
        assert!(!instructions.step_forward());

        assert!(instructions.step_backward());
        assert_eq!(instructions.current_step_id(), Some(VersionId::new(vec![1])));
    }

    #[test]
    fn test_reset_clear_hides_parts() {
        let mut instructions = Instructions::new(tower(), AnimationLog::new()).unwrap();
        instructions.step_forward();
        instructions.animator_mut().clear();

        instructions.reset(true).unwrap();
        assert_eq!(instructions.current_step_label(), None);
        assert!(instructions.root().parts().iter().all(|p| !p.visible));
        assert!(instructions
            .animator()
            .events()
            .iter()
            .all(|e| matches!(e, AnimationEvent::Visible { visible: false, .. })));
    }

    #[test]
    fn test_jump_to() {
        let mut instructions = Instructions::new(tower(), NullAnimator).unwrap();
        instructions.reset(true).unwrap();

        let outcome = instructions.jump_to(VersionId::new(vec![2]));
        assert_eq!(outcome, GoToOutcome::Arrived(VersionId::new(vec![2])));
        assert_eq!(instructions.current_step_label().as_deref(), Some("2"));
    }
}
