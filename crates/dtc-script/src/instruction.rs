//! Instruction tree and scripts
//!
//! `If` and `While` own nested instruction sequences, so a script is a tree
//! rather than a flat list.

use crate::error::ScriptError;
use crate::predicate::Predicate;
use dtc_registry::Control;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Upper bound accepted for a decoded loop
pub const MAX_LOOP_ITERATIONS: u32 = 1000;

/// A resolved control manipulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// `DEVICE.ACTION`, for logs and rendering
    pub control: String,
    /// Numeric device id
    pub device_id: u32,
    /// Numeric action id
    pub action_id: u32,
    /// Value for the selected position
    pub value: f64,
    /// Settle delay from the registry
    pub delay_ms: u32,
}

impl Invocation {
    /// Resolve a control at a position
    ///
    /// # Errors
    /// Returns [`ScriptError::Registry`] if `position` is out of range
    pub fn resolve(control: &Control, position: usize) -> Result<Self, ScriptError> {
        Ok(Self {
            control: control.qualified_name(),
            device_id: control.device_id(),
            action_id: control.action_id(),
            value: control.value(position)?,
            delay_ms: control.delay_ms(),
        })
    }

    /// Effective settle delay, honouring an instruction-level override
    #[inline]
    #[must_use]
    pub fn settle_delay(&self, override_ms: Option<u32>) -> u32 {
        override_ms.unwrap_or(self.delay_ms)
    }
}

/// One node of the command stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Manipulate a control
    Invoke {
        /// Resolved control
        control: Invocation,
        /// Settle delay override
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay_ms: Option<u32>,
    },
    /// Pause
    Wait {
        /// Duration in milliseconds
        ms: u32,
    },
    /// Run `then` once if the predicate reports `expected`
    If {
        /// Remote probe
        predicate: Predicate,
        /// Value that makes the condition true
        expected: String,
        /// Probe arguments
        #[serde(default)]
        args: Vec<String>,
        /// Conditional block
        then: Vec<Instruction>,
    },
    /// Run `body` while the predicate reports `expected`, at most
    /// `max_iterations` times
    While {
        /// Remote probe
        predicate: Predicate,
        /// Value that keeps the loop running
        expected: String,
        /// Probe arguments
        #[serde(default)]
        args: Vec<String>,
        /// Loop body
        body: Vec<Instruction>,
        /// Iteration bound
        max_iterations: NonZeroU32,
    },
    /// Halt the upload and show `message` to the operator
    Abort {
        /// Operator-facing message
        message: String,
    },
    /// Run a named routine on the remote side
    CallFunction {
        /// Routine name
        name: String,
        /// Routine arguments
        #[serde(default)]
        args: Vec<String>,
        /// Settle delay after the call
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay_ms: Option<u32>,
    },
}

impl Instruction {
    /// Nested instructions, if this node has any
    #[must_use]
    pub fn children(&self) -> &[Instruction] {
        match self {
            Self::If { then, .. } => then,
            Self::While { body, .. } => body,
            _ => &[],
        }
    }

    /// Short operation name
    #[must_use]
    pub fn op(&self) -> &'static str {
        match self {
            Self::Invoke { .. } => "invoke",
            Self::Wait { .. } => "wait",
            Self::If { .. } => "if",
            Self::While { .. } => "while",
            Self::Abort { .. } => "abort",
            Self::CallFunction { .. } => "call_function",
        }
    }
}

/// The complete ordered instruction tree for one upload
///
/// Immutable once built; handed to the executor by value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    instructions: Vec<Instruction>,
}

impl Script {
    /// Wrap a finished instruction sequence
    #[inline]
    #[must_use]
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Top-level instructions
    #[inline]
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Consume into top-level instructions
    #[inline]
    #[must_use]
    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

    /// Number of top-level instructions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if the script does nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Number of nodes in the whole tree
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        fn count(block: &[Instruction]) -> usize {
            block.iter().map(|i| 1 + count(i.children())).sum()
        }
        count(&self.instructions)
    }

    /// Deepest nesting level; a flat script has depth 1, empty has 0
    #[must_use]
    pub fn max_depth(&self) -> usize {
        fn depth(block: &[Instruction]) -> usize {
            block
                .iter()
                .map(|i| 1 + depth(i.children()))
                .max()
                .unwrap_or(0)
        }
        depth(&self.instructions)
    }

    /// Every invocation in execution order, nested ones included
    #[must_use]
    pub fn invocations(&self) -> Invocations<'_> {
        Invocations {
            stack: vec![self.instructions.iter()],
        }
    }

    /// Visit every node depth-first with its index path
    pub fn visit(&self, mut f: impl FnMut(&[usize], &Instruction)) {
        fn walk(
            block: &[Instruction],
            path: &mut Vec<usize>,
            f: &mut impl FnMut(&[usize], &Instruction),
        ) {
            for (idx, instruction) in block.iter().enumerate() {
                path.push(idx);
                f(path, instruction);
                walk(instruction.children(), path, f);
                path.pop();
            }
        }
        walk(&self.instructions, &mut Vec::new(), &mut f);
    }

    /// Check the loop bound of every `While`
    ///
    /// Built scripts always pass; this guards scripts decoded from elsewhere.
    ///
    /// # Errors
    /// Returns [`ScriptError::UnboundedLoop`] for the first loop whose bound
    /// exceeds [`MAX_LOOP_ITERATIONS`]
    pub fn validate(&self) -> Result<(), ScriptError> {
        let mut offending = None;
        self.visit(|path, instruction| {
            if let Instruction::While { max_iterations, .. } = instruction {
                if max_iterations.get() > MAX_LOOP_ITERATIONS && offending.is_none() {
                    offending = Some(path.to_vec());
                }
            }
        });
        match offending {
            Some(path) => Err(ScriptError::UnboundedLoop { path }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_block(
            f: &mut fmt::Formatter<'_>,
            block: &[Instruction],
            indent: usize,
        ) -> fmt::Result {
            for instruction in block {
                write!(f, "{:width$}", "", width = indent * 2)?;
                match instruction {
                    Instruction::Invoke { control, delay_ms } => {
                        write!(f, "invoke {} = {}", control.control, control.value)?;
                        if let Some(ms) = delay_ms {
                            write!(f, " (delay {ms} ms)")?;
                        }
                        writeln!(f)?;
                    }
                    Instruction::Wait { ms } => writeln!(f, "wait {ms} ms")?,
                    Instruction::If {
                        predicate,
                        expected,
                        args,
                        then,
                    } => {
                        writeln!(f, "if {predicate}({}) == {expected}", args.join(", "))?;
                        write_block(f, then, indent + 1)?;
                    }
                    Instruction::While {
                        predicate,
                        expected,
                        args,
                        body,
                        max_iterations,
                    } => {
                        writeln!(
                            f,
                            "while {predicate}({}) == {expected} [max {max_iterations}]",
                            args.join(", ")
                        )?;
                        write_block(f, body, indent + 1)?;
                    }
                    Instruction::Abort { message } => writeln!(f, "abort \"{message}\"")?,
                    Instruction::CallFunction { name, args, .. } => {
                        writeln!(f, "call {name}({})", args.join(", "))?;
                    }
                }
            }
            Ok(())
        }
        write_block(f, &self.instructions, 0)
    }
}

/// Depth-first iterator over invocations
#[derive(Debug)]
pub struct Invocations<'a> {
    stack: Vec<std::slice::Iter<'a, Instruction>>,
}

impl<'a> Iterator for Invocations<'a> {
    type Item = &'a Invocation;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                None => {
                    self.stack.pop();
                }
                Some(Instruction::Invoke { control, .. }) => return Some(control),
                Some(other) => {
                    let children = other.children();
                    if !children.is_empty() {
                        self.stack.push(children.iter());
                    }
                }
            }
        }
    }
}
