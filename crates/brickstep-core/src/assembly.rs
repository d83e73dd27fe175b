//! Assembly tree: parts, step markers and nested sub-assemblies
//!
//! Each [`SubAssembly`] owns its children outright and carries its own
//! traversal cursor. Nodes are told apart by variant, siblings only by
//! position.

use crate::animation::{UnitId, Vec3};
use crate::version::VersionId;

/// A single brick; revealed instantly during traversal
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    /// Scene name of the part
    pub name: UnitId,
    /// Final local position
    pub position: Vec3,
    /// Whether the part is currently shown
    pub visible: bool,
}

impl Part {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: UnitId::new(name),
            position: Vec3::ZERO,
            visible: true,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }
}

/// One instruction step
///
/// A marker closes the step made of the parts placed before it (back to
/// the previous marker or sub-assembly).
#[derive(Debug, Clone, PartialEq)]
pub struct StepMarker {
    /// Step number as authored, overriding automatic numbering
    pub manual_number: Option<String>,
    /// Label assigned by numbering (the manual number when one is set)
    pub label: Option<String>,
    /// Parsed form of `label`
    pub resolved_id: Option<VersionId>,
    /// Shares the numbering slot of the step before it
    pub is_sub_step: bool,
    /// Direction the step's parts travel when animated in
    pub animation_direction: Vec3,
}

impl StepMarker {
    pub fn new() -> Self {
        Self {
            manual_number: None,
            label: None,
            resolved_id: None,
            is_sub_step: false,
            animation_direction: Vec3::DOWN,
        }
    }

    /// Marker with an authored step number
    pub fn numbered(number: impl Into<String>) -> Self {
        Self {
            manual_number: Some(number.into()),
            ..Self::new()
        }
    }

    pub fn sub_step(mut self) -> Self {
        self.is_sub_step = true;
        self
    }

    pub fn with_direction(mut self, direction: Vec3) -> Self {
        self.animation_direction = direction;
        self
    }

    /// Authored number, ignoring blank overrides
    pub fn manual_number(&self) -> Option<&str> {
        self.manual_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

impl Default for StepMarker {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered group of nodes with its own cursor
#[derive(Debug, Clone, PartialEq)]
pub struct SubAssembly {
    /// Scene name of the sub-assembly
    pub name: UnitId,
    /// Children in build order
    pub children: Vec<AssemblyNode>,
    /// Current traversal position within `children`
    pub(crate) cursor: usize,
    /// Top of the tree (its step labels get no prefix)
    pub is_root: bool,
    /// Final local position
    pub position: Vec3,
    /// Pose the sub-assembly is built at before it is placed
    pub start_position: Vec3,
}

impl SubAssembly {
    pub fn new(name: impl Into<String>, children: Vec<AssemblyNode>) -> Self {
        Self {
            name: UnitId::new(name),
            children,
            cursor: 0,
            is_root: false,
            position: Vec3::ZERO,
            start_position: Vec3::ZERO,
        }
    }

    /// Top-level assembly
    pub fn root(name: impl Into<String>, children: Vec<AssemblyNode>) -> Self {
        Self {
            is_root: true,
            ..Self::new(name, children)
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self.start_position = position;
        self
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// All step markers in depth-first, left-to-right order
    pub fn steps(&self) -> Vec<&StepMarker> {
        let mut steps = Vec::new();
        self.collect_steps(&mut steps);
        steps
    }

    fn collect_steps<'a>(&'a self, out: &mut Vec<&'a StepMarker>) {
        for child in &self.children {
            match child {
                AssemblyNode::Step(step) => out.push(step),
                AssemblyNode::SubAssembly(sub) => sub.collect_steps(out),
                AssemblyNode::Part(_) => {}
            }
        }
    }

    /// All parts in depth-first order
    pub fn parts(&self) -> Vec<&Part> {
        let mut parts = Vec::new();
        self.collect_parts(&mut parts);
        parts
    }

    fn collect_parts<'a>(&'a self, out: &mut Vec<&'a Part>) {
        for child in &self.children {
            match child {
                AssemblyNode::Part(part) => out.push(part),
                AssemblyNode::SubAssembly(sub) => sub.collect_parts(out),
                AssemblyNode::Step(_) => {}
            }
        }
    }

    /// Find a direct or nested sub-assembly by name
    pub fn find_sub_assembly(&self, name: &str) -> Option<&SubAssembly> {
        self.children.iter().find_map(|child| match child {
            AssemblyNode::SubAssembly(sub) if sub.name.as_str() == name => Some(sub),
            AssemblyNode::SubAssembly(sub) => sub.find_sub_assembly(name),
            _ => None,
        })
    }
}

/// A node in the assembly tree
#[derive(Debug, Clone, PartialEq)]
pub enum AssemblyNode {
    Part(Part),
    Step(StepMarker),
    SubAssembly(SubAssembly),
}

impl AssemblyNode {
    pub fn part(name: impl Into<String>) -> Self {
        AssemblyNode::Part(Part::new(name))
    }

    pub fn step() -> Self {
        AssemblyNode::Step(StepMarker::new())
    }

    pub fn numbered_step(number: impl Into<String>) -> Self {
        AssemblyNode::Step(StepMarker::numbered(number))
    }

    pub fn sub_step() -> Self {
        AssemblyNode::Step(StepMarker::new().sub_step())
    }

    pub fn sub_assembly(name: impl Into<String>, children: Vec<AssemblyNode>) -> Self {
        AssemblyNode::SubAssembly(SubAssembly::new(name, children))
    }

    pub fn as_step(&self) -> Option<&StepMarker> {
        match self {
            AssemblyNode::Step(step) => Some(step),
            _ => None,
        }
    }

    pub fn is_step(&self) -> bool {
        matches!(self, AssemblyNode::Step(_))
    }
}

impl From<Part> for AssemblyNode {
    fn from(part: Part) -> Self {
        AssemblyNode::Part(part)
    }
}

impl From<StepMarker> for AssemblyNode {
    fn from(step: StepMarker) -> Self {
        AssemblyNode::Step(step)
    }
}

impl From<SubAssembly> for AssemblyNode {
    fn from(sub: SubAssembly) -> Self {
        AssemblyNode::SubAssembly(sub)
    }
}
