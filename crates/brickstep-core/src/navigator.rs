//! "Go to step" navigation
//!
//! [`GoTo`] plans the walk to a target step one traversal unit at a time.
//! [`Navigator`] drives such a plan on the tokio runtime, pausing between
//! units so the host can pace its animations, and cancels the previous
//! walk whenever a new one is requested.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::animation::Animator;
use crate::assembly::SubAssembly;
use crate::instructions::Instructions;
use crate::numbering::NumberingError;
use crate::version::{ParseError, VersionId};

/// Default pause between units of a go-to
pub const DEFAULT_STEP_SPEED: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// How a go-to ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoToOutcome {
    /// The target step is now current
    Arrived(VersionId),
    /// Stopped short of the target at a boundary, or passed it because
    /// authored numbers are out of order
    Stopped(Option<VersionId>),
    /// Superseded by a newer request
    Cancelled,
}

impl fmt::Display for GoToOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoToOutcome::Arrived(id) => write!(f, "arrived at {}", id),
            GoToOutcome::Stopped(Some(id)) => write!(f, "stopped at {}", id),
            GoToOutcome::Stopped(None) => write!(f, "stopped before the first step"),
            GoToOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of one call to [`GoTo::step`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoToStep {
    /// Crossed one unit; `step` is the new current step
    Moved {
        direction: Direction,
        step: Option<VersionId>,
    },
    Done(GoToOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Backward,
    Forward,
}

/// Walk toward a target step, one unit per [`GoTo::step`] call
///
/// Retreats while the target lies before the current step, then advances
/// while it lies after it. Once advancing it never turns back.
#[derive(Debug, Clone)]
pub struct GoTo {
    target: VersionId,
    phase: Phase,
    started: bool,
    moves: usize,
}

impl GoTo {
    pub fn new(target: VersionId) -> Self {
        Self {
            target,
            phase: Phase::Backward,
            started: false,
            moves: 0,
        }
    }

    pub fn target(&self) -> &VersionId {
        &self.target
    }

    /// Units crossed so far
    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn step<A: Animator + ?Sized>(&mut self, root: &mut SubAssembly, animator: &mut A) -> GoToStep {
        if !self.started {
            self.started = true;
            // Sequencing has not started yet: establish a first step
            if root.current_step().is_none() {
                root.advance(animator);
            }
        }

        let Some(current) = current_id(root) else {
            return GoToStep::Done(GoToOutcome::Stopped(None));
        };

        if self.phase == Phase::Backward {
            if self.target < current {
                return self.cross(root, animator, Direction::Backward);
            }
            self.phase = Phase::Forward;
        }

        match self.target.cmp(&current) {
            std::cmp::Ordering::Greater => self.cross(root, animator, Direction::Forward),
            std::cmp::Ordering::Equal => GoToStep::Done(GoToOutcome::Arrived(current)),
            std::cmp::Ordering::Less => GoToStep::Done(GoToOutcome::Stopped(Some(current))),
        }
    }

    fn cross<A: Animator + ?Sized>(
        &mut self,
        root: &mut SubAssembly,
        animator: &mut A,
        direction: Direction,
    ) -> GoToStep {
        // Retreating into an empty sub-assembly, or one that ends in parts,
        // leaves no current step; such units fold into the next one
        loop {
            let moved = match direction {
                Direction::Forward => root.advance(animator),
                Direction::Backward => root.retreat(animator),
            };
            let step = current_id(root);
            if !moved {
                return GoToStep::Done(GoToOutcome::Stopped(step));
            }
            if step.is_some() {
                self.moves += 1;
                return GoToStep::Moved { direction, step };
            }
        }
    }
}

fn current_id(root: &SubAssembly) -> Option<VersionId> {
    root.current_step().and_then(|s| s.resolved_id.clone())
}

/// Progress notifications from the navigator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigatorEvent {
    Started { target: VersionId },
    Moved {
        direction: Direction,
        step: Option<VersionId>,
    },
    Finished(GoToOutcome),
}

struct ActiveRun {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Paced, cancellable go-to driver over shared instructions
pub struct Navigator<A> {
    instructions: Arc<Mutex<Instructions<A>>>,
    pace: Duration,
    active: Mutex<Option<ActiveRun>>,
    event_tx: broadcast::Sender<NavigatorEvent>,
}

impl<A: Animator + Send + 'static> Navigator<A> {
    /// Create a navigator pausing `pace` between units
    pub fn new(instructions: Instructions<A>, pace: Duration) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            instructions: Arc::new(Mutex::new(instructions)),
            pace,
            active: Mutex::new(None),
            event_tx,
        }
    }

    /// Shared handle to the underlying instructions
    pub fn instructions(&self) -> Arc<Mutex<Instructions<A>>> {
        self.instructions.clone()
    }

    pub fn pace(&self) -> Duration {
        self.pace
    }

    /// Subscribe to navigation events
    pub fn subscribe(&self) -> broadcast::Receiver<NavigatorEvent> {
        self.event_tx.subscribe()
    }

    /// Start walking to `target`, cancelling any walk in progress first
    ///
    /// The returned receiver resolves with the outcome once the walk ends.
    pub async fn go_to(&self, target: VersionId) -> oneshot::Receiver<GoToOutcome> {
        let mut active = self.active.lock().await;
        if let Some(run) = active.take() {
            stop(run).await;
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (done_tx, done_rx) = oneshot::channel();
        let handle = tokio::spawn(run_go_to(
            self.instructions.clone(),
            target,
            self.pace,
            cancel_rx,
            self.event_tx.clone(),
            done_tx,
        ));

        *active = Some(ActiveRun {
            cancel: cancel_tx,
            handle,
        });
        done_rx
    }

    /// Parse `id` and start walking to it
    pub async fn go_to_step(&self, id: &str) -> Result<oneshot::Receiver<GoToOutcome>, ParseError> {
        let target = VersionId::parse(id)?;
        Ok(self.go_to(target).await)
    }

    /// Cancel the walk in progress, if any, and wait for it to settle
    ///
    /// Returns whether a walk was still running.
    pub async fn cancel(&self) -> bool {
        let run = self.active.lock().await.take();
        match run {
            Some(run) => {
                let running = !run.handle.is_finished();
                stop(run).await;
                running
            }
            None => false,
        }
    }

    pub async fn step_forward(&self) -> bool {
        self.cancel().await;
        self.instructions.lock().await.step_forward()
    }

    pub async fn step_backward(&self) -> bool {
        self.cancel().await;
        self.instructions.lock().await.step_backward()
    }

    pub async fn reset(&self, clear: bool) -> Result<(), NumberingError> {
        self.cancel().await;
        self.instructions.lock().await.reset(clear)
    }

    pub async fn current_step_label(&self) -> Option<String> {
        self.instructions.lock().await.current_step_label()
    }
}

async fn stop(run: ActiveRun) {
    // The run may already be finished and have dropped its receiver
    let _ = run.cancel.send(true);
    if let Err(e) = run.handle.await {
        warn!(error = %e, "Go-to task ended abnormally");
    }
}

async fn run_go_to<A: Animator>(
    instructions: Arc<Mutex<Instructions<A>>>,
    target: VersionId,
    pace: Duration,
    mut cancel: watch::Receiver<bool>,
    event_tx: broadcast::Sender<NavigatorEvent>,
    done: oneshot::Sender<GoToOutcome>,
) {
    info!(target = %target, "Go-to started");
    let _ = event_tx.send(NavigatorEvent::Started {
        target: target.clone(),
    });

    let mut plan = GoTo::new(target);
    let outcome = loop {
        let cancelled = *cancel.borrow();
        if cancelled {
            break GoToOutcome::Cancelled;
        }

        // One unit per lock; cancellation is only seen between units
        let step = {
            let mut guard = instructions.lock().await;
            guard.drive(&mut plan)
        };

        match step {
            GoToStep::Moved { direction, step } => {
                debug!(?direction, step = ?step.as_ref().map(|s| s.to_string()), "Go-to moved");
                let _ = event_tx.send(NavigatorEvent::Moved { direction, step });
            }
            GoToStep::Done(outcome) => break outcome,
        }

        tokio::select! {
            _ = tokio::time::sleep(pace) => {}
            _ = cancel.changed() => break GoToOutcome::Cancelled,
        }
    };

    info!(target = %plan.target(), moves = plan.moves(), outcome = %outcome, "Go-to finished");
    let _ = event_tx.send(NavigatorEvent::Finished(outcome.clone()));
    let _ = done.send(outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::NullAnimator;
    use crate::assembly::AssemblyNode;
    use crate::numbering::number_sub_assembly;

    fn v(s: &str) -> VersionId {
        VersionId::parse(s).unwrap()
    }

    /// Steps 1.1, 1.2, 2.1, 2.2, ..., 2.7, each closing one part
    fn chapters() -> SubAssembly {
        let mut children = vec![
            AssemblyNode::part("p1"),
            AssemblyNode::numbered_step("1.1"),
            AssemblyNode::part("p2"),
            AssemblyNode::step(),
            AssemblyNode::part("p3"),
            AssemblyNode::numbered_step("2.1"),
        ];
        for i in 2..=7 {
            children.push(AssemblyNode::part(format!("q{}", i)));
            children.push(AssemblyNode::step());
        }
        SubAssembly::root("chapters", children)
    }

    fn cleared() -> Instructions<NullAnimator> {
        let mut instructions = Instructions::new(chapters(), NullAnimator).unwrap();
        instructions.reset(true).unwrap();
        instructions
    }

    fn run(plan: &mut GoTo, root: &mut SubAssembly) -> GoToOutcome {
        loop {
            if let GoToStep::Done(outcome) = plan.step(root, &mut NullAnimator) {
                return outcome;
            }
        }
    }

    #[test]
    fn test_labels_of_fixture() {
        let instructions = cleared();
        assert_eq!(
            instructions.labels(),
            vec!["1.1", "1.2", "2.1", "2.2", "2.3", "2.4", "2.5", "2.6", "2.7"]
        );
    }

    #[test]
    fn test_go_to_forward_counts_units() {
        let mut root = chapters();
        number_sub_assembly(&mut root, "", true).unwrap();
        root.advance(&mut NullAnimator);
        assert_eq!(current_id(&root), Some(v("1.1")));

        let mut plan = GoTo::new(v("2.6"));
        assert_eq!(run(&mut plan, &mut root), GoToOutcome::Arrived(v("2.6")));
        // 1.2, 2.1, 2.2, 2.3, 2.4, 2.5, 2.6
        assert_eq!(plan.moves(), 7);
        assert_eq!(root.current_step().unwrap().resolved_id, Some(v("2.6")));
    }

    #[test]
    fn test_go_to_backward() {
        let mut root = chapters();
        number_sub_assembly(&mut root, "", true).unwrap();
        run(&mut GoTo::new(v("2.7")), &mut root);

        let mut plan = GoTo::new(v("1.2"));
        assert_eq!(run(&mut plan, &mut root), GoToOutcome::Arrived(v("1.2")));
        assert_eq!(plan.moves(), 7);
    }

    #[test]
    fn test_go_to_starts_sequencing() {
        let mut root = chapters();
        number_sub_assembly(&mut root, "", true).unwrap();
        assert!(root.current_step().is_none());

        let mut plan = GoTo::new(v("1.1"));
        assert_eq!(run(&mut plan, &mut root), GoToOutcome::Arrived(v("1.1")));
        assert_eq!(plan.moves(), 0);
    }

    #[test]
    fn test_unreachable_targets_stop_at_boundary() {
        let mut root = chapters();
        number_sub_assembly(&mut root, "", true).unwrap();

        let outcome = run(&mut GoTo::new(v("9.9")), &mut root);
        assert_eq!(outcome, GoToOutcome::Stopped(Some(v("2.7"))));

        // Between two steps: stops on the first one past the target
        let outcome = run(&mut GoTo::new(v("2.1.5")), &mut root);
        assert_eq!(outcome, GoToOutcome::Stopped(Some(v("2.2"))));
        let outcome = run(&mut GoTo::new(v("2.1.5")), &mut root);
        assert_eq!(outcome, GoToOutcome::Stopped(Some(v("2.2"))));

        let outcome = run(&mut GoTo::new(v("0.5")), &mut root);
        assert!(matches!(outcome, GoToOutcome::Stopped(_)));
    }

    /// a, [1], hollow{}, [2.1], b, [3]
    fn hollow() -> SubAssembly {
        SubAssembly::root(
            "hollow",
            vec![
                AssemblyNode::part("a"),
                AssemblyNode::step(),
                AssemblyNode::sub_assembly("hollow", Vec::new()),
                AssemblyNode::step(),
                AssemblyNode::part("b"),
                AssemblyNode::step(),
            ],
        )
    }

    /// a, [1], roof{c, [2.1], d}, [2.2], e, [3]
    fn open_roof() -> SubAssembly {
        SubAssembly::root(
            "open-roof",
            vec![
                AssemblyNode::part("a"),
                AssemblyNode::step(),
                AssemblyNode::sub_assembly(
                    "roof",
                    vec![
                        AssemblyNode::part("c"),
                        AssemblyNode::step(),
                        AssemblyNode::part("d"),
                    ],
                ),
                AssemblyNode::step(),
                AssemblyNode::part("e"),
                AssemblyNode::step(),
            ],
        )
    }

    #[test]
    fn test_go_to_across_empty_sub_assembly() {
        let mut root = hollow();
        number_sub_assembly(&mut root, "", true).unwrap();

        let mut plan = GoTo::new(v("3"));
        assert_eq!(run(&mut plan, &mut root), GoToOutcome::Arrived(v("3")));
        // 2.1, 3
        assert_eq!(plan.moves(), 2);

        let mut plan = GoTo::new(v("1"));
        assert_eq!(run(&mut plan, &mut root), GoToOutcome::Arrived(v("1")));
        assert_eq!(plan.moves(), 2);
        assert_eq!(current_id(&root), Some(v("1")));

        let mut plan = GoTo::new(v("2.1"));
        assert_eq!(run(&mut plan, &mut root), GoToOutcome::Arrived(v("2.1")));
        assert_eq!(plan.moves(), 1);
    }

    #[test]
    fn test_go_to_across_sub_assembly_ending_in_part() {
        let mut root = open_roof();
        number_sub_assembly(&mut root, "", true).unwrap();

        let mut plan = GoTo::new(v("3"));
        assert_eq!(run(&mut plan, &mut root), GoToOutcome::Arrived(v("3")));
        // 2.1, 2.2, 3
        assert_eq!(plan.moves(), 3);
        assert!(root.parts().iter().all(|p| p.visible));

        let mut plan = GoTo::new(v("1"));
        assert_eq!(run(&mut plan, &mut root), GoToOutcome::Arrived(v("1")));
        assert_eq!(plan.moves(), 3);
        let visible: Vec<_> = root
            .parts()
            .iter()
            .filter(|p| p.visible)
            .map(|p| p.name.to_string())
            .collect();
        assert_eq!(visible, vec!["a"]);
    }

    #[test]
    fn test_go_to_into_nested_step() {
        let mut root = open_roof();
        number_sub_assembly(&mut root, "", true).unwrap();
        run(&mut GoTo::new(v("3")), &mut root);

        // Back into the roof from behind its trailing part
        let mut plan = GoTo::new(v("2.1"));
        assert_eq!(run(&mut plan, &mut root), GoToOutcome::Arrived(v("2.1")));
        assert_eq!(plan.moves(), 2);

        let mut plan = GoTo::new(v("2.2"));
        assert_eq!(run(&mut plan, &mut root), GoToOutcome::Arrived(v("2.2")));
        assert_eq!(plan.moves(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigator_walks_back_through_sub_assembly() {
        let mut instructions = Instructions::new(open_roof(), NullAnimator).unwrap();
        instructions.reset(true).unwrap();
        let navigator = Navigator::new(instructions, DEFAULT_STEP_SPEED);

        let done = navigator.go_to_step("3").await.unwrap();
        assert_eq!(done.await.unwrap(), GoToOutcome::Arrived(v("3")));

        let mut events = navigator.subscribe();
        let done = navigator.go_to_step("1").await.unwrap();
        assert_eq!(done.await.unwrap(), GoToOutcome::Arrived(v("1")));

        let mut steps = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let NavigatorEvent::Moved { direction, step } = event {
                assert_eq!(direction, Direction::Backward);
                steps.push(step.map(|s| s.to_string()));
            }
        }
        let expected: Vec<_> = ["2.2", "2.1", "1"].iter().map(|s| Some(s.to_string())).collect();
        assert_eq!(steps, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigator_arrives() {
        let navigator = Navigator::new(cleared(), DEFAULT_STEP_SPEED);
        let mut events = navigator.subscribe();

        let done = navigator.go_to_step("2.6").await.unwrap();
        assert_eq!(done.await.unwrap(), GoToOutcome::Arrived(v("2.6")));
        assert_eq!(navigator.current_step_label().await.as_deref(), Some("2.6"));

        let mut moves = 0;
        while let Ok(event) = events.try_recv() {
            if let NavigatorEvent::Moved { direction, .. } = event {
                assert_eq!(direction, Direction::Forward);
                moves += 1;
            }
        }
        // 1.1 is established without an event, then 1.2 .. 2.6
        assert_eq!(moves, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_go_to_wins() {
        let navigator = Navigator::new(cleared(), Duration::from_millis(200));

        let first = navigator.go_to_step("2.6").await.unwrap();
        // Let the first walk cross a few units
        tokio::time::sleep(Duration::from_millis(450)).await;
        let second = navigator.go_to_step("1.1").await.unwrap();

        assert_eq!(first.await.unwrap(), GoToOutcome::Cancelled);
        assert_eq!(second.await.unwrap(), GoToOutcome::Arrived(v("1.1")));

        // The superseded walk never resumes
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(navigator.current_step_label().await.as_deref(), Some("1.1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_step_cancels_go_to() {
        let navigator = Navigator::new(cleared(), Duration::from_millis(200));

        let walk = navigator.go_to_step("2.7").await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(navigator.step_backward().await);
        assert_eq!(walk.await.unwrap(), GoToOutcome::Cancelled);

        let label = navigator.current_step_label().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(navigator.current_step_label().await, label);
        assert!(!navigator.cancel().await);
    }

    #[tokio::test]
    async fn test_go_to_step_rejects_bad_id() {
        let navigator = Navigator::new(cleared(), Duration::ZERO);
        assert!(navigator.go_to_step("2..6").await.is_err());
        assert!(matches!(navigator.go_to_step("").await, Err(ParseError::Empty)));
    }
}
