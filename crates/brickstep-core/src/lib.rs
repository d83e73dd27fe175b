//! Brickstep Core - Instruction tree sequencing for step-by-step builds
//!
//! This crate provides the building blocks for revealing a hierarchical
//! assembly one instruction step at a time:
//! - Dotted step identifiers with total ordering
//! - Assembly tree of parts, step markers and nested sub-assemblies
//! - Hierarchical step numbering with authored overrides and sub-steps
//! - Cursor traversal that advances/retreats one visible unit at a time
//! - Cancellable, paced "go to step" navigation
//! - Manifest loading for assembly trees

pub mod animation;
pub mod assembly;
pub mod cursor;
pub mod instructions;
pub mod manifest;
pub mod navigator;
pub mod numbering;
pub mod version;

pub use animation::{
    parse_vec3_string, AnimationEvent, AnimationLog, Animator, NullAnimator, UnitId, Vec3,
    ANIMATION_DISTANCE, ANIMATION_DURATION,
};
pub use assembly::{AssemblyNode, Part, StepMarker, SubAssembly};
pub use instructions::Instructions;
pub use manifest::{AssemblyManifest, ManifestError, NodeSpec};
pub use navigator::{
    Direction, GoTo, GoToOutcome, GoToStep, Navigator, NavigatorEvent, DEFAULT_STEP_SPEED,
};
pub use numbering::{number_sub_assembly, NumberingError};
pub use version::{ParseError, VersionId};
