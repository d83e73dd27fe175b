//! Hierarchical step numbering
//!
//! Walks a sub-assembly and gives every step marker a dotted label:
//! - unlabeled markers count up from 1 under the sub-assembly's prefix
//! - nested sub-assemblies number their own steps under `prefix.counter`
//! - the marker right after a nested sub-assembly takes over its final label
//! - an authored number resets both counter and prefix for later markers
//! - sub-steps take the current counter without consuming it

use thiserror::Error;
use tracing::debug;

use crate::animation::{approach_from, Vec3};
use crate::assembly::{AssemblyNode, SubAssembly};
use crate::version::{parse_segment, ParseError, VersionId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumberingError {
    #[error("Malformed manual step number '{number}': trailing segment is not a non-negative integer")]
    MalformedManualNumber { number: String },
    #[error("Invalid step label: {0}")]
    InvalidLabel(#[from] ParseError),
    #[error("Step number after '{label}' does not fit a step id segment")]
    CounterOverflow { label: String },
}

/// Number every step marker in `node` and its descendants
///
/// `prefix` is the label prefix handed down by the parent (empty for the
/// root). When `reset_visibility` is set every part is hidden, otherwise
/// every part is shown. Returns the label the parent should carry over to
/// the marker that follows this sub-assembly.
pub fn number_sub_assembly(
    node: &mut SubAssembly,
    prefix: &str,
    reset_visibility: bool,
) -> Result<String, NumberingError> {
    node.cursor = 0;

    let mut counter: u32 = 1;
    let mut prefix = prefix.to_string();
    if !node.is_root {
        prefix.push('.');
    }
    let mut carried: Option<String> = None;

    for idx in 0..node.children.len() {
        // Direction of the marker that places a sub-assembly, read before
        // borrowing the child mutably
        let next_direction = match node.children.get(idx + 1) {
            Some(AssemblyNode::Step(step)) => step.animation_direction,
            _ => Vec3::DOWN,
        };

        match &mut node.children[idx] {
            AssemblyNode::Step(step) => {
                let label = if let Some(number) = step.manual_number() {
                    let (new_prefix, value) = split_manual_number(number)?;
                    prefix = new_prefix;
                    counter = value;
                    carried = None;
                    number.to_string()
                } else if let Some(label) = carried.take() {
                    label
                } else {
                    format!("{}{}", prefix, counter)
                };

                step.resolved_id = Some(VersionId::parse(&label)?);
                if !step.is_sub_step {
                    counter = counter
                        .checked_add(1)
                        .ok_or_else(|| NumberingError::CounterOverflow { label: label.clone() })?;
                }
                step.label = Some(label);
            }
            AssemblyNode::SubAssembly(sub) => {
                sub.start_position = approach_from(sub.position, next_direction);
                let nested_prefix = format!("{}{}", prefix, counter);
                carried = Some(number_sub_assembly(sub, &nested_prefix, reset_visibility)?);
            }
            AssemblyNode::Part(part) => {
                part.visible = !reset_visibility;
            }
        }
    }

    node.cursor = 0;
    let next = format!("{}{}", prefix, counter);
    debug!(assembly = %node.name, next = %next, "Numbered sub-assembly");
    Ok(next)
}

/// Split an authored number into the prefix for following markers
/// (`"1.5"` -> `"1."`) and the counter value it sets (`5`)
fn split_manual_number(number: &str) -> Result<(String, u32), NumberingError> {
    let malformed = || NumberingError::MalformedManualNumber {
        number: number.to_string(),
    };

    let (head, tail) = match number.rsplit_once('.') {
        Some((head, tail)) => (Some(head), tail),
        None => (None, number),
    };
    let value = parse_segment(tail).ok_or_else(malformed)?;
    let prefix = head.map(|h| format!("{}.", h)).unwrap_or_default();
    Ok((prefix, value))
}
