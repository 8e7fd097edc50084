//! Command envelope
//!
//! Logical wire form of the instruction stream. Invocations carry
//! `{device, action, value, delay}`; control flow is encoded as named
//! remote operations with a string predicate or function name and a string
//! argument vector. Envelopes travel as newline-delimited JSON.

use crate::error::ScriptError;
use crate::instruction::{Instruction, Invocation, Script};
use crate::predicate::StateQuery;
use serde::{Deserialize, Serialize};

/// One command on the outbound channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CommandEnvelope {
    /// Actuate a control
    Invoke {
        /// Device id
        device: u32,
        /// Action id
        action: u32,
        /// Position value
        value: f64,
        /// Settle delay in milliseconds
        delay: u32,
    },
    /// Remote pause
    Wait {
        /// Duration in milliseconds
        ms: u32,
    },
    /// Remote-evaluated conditional
    If {
        /// Predicate name
        predicate: String,
        /// Expected value
        expected: String,
        /// Predicate arguments
        args: Vec<String>,
        /// Conditional block
        block: Vec<CommandEnvelope>,
    },
    /// Remote-evaluated bounded loop
    While {
        /// Predicate name
        predicate: String,
        /// Expected value
        expected: String,
        /// Predicate arguments
        args: Vec<String>,
        /// Loop body
        block: Vec<CommandEnvelope>,
        /// Iteration bound
        max: u32,
    },
    /// Halt and show a message
    Abort {
        /// Operator-facing message
        message: String,
    },
    /// Named remote routine
    Call {
        /// Routine name
        name: String,
        /// Routine arguments
        args: Vec<String>,
        /// Settle delay in milliseconds
        delay: u32,
    },
    /// Ask the remote side to publish a state value under `key`
    Query {
        /// Key to publish under
        key: String,
        /// Probe name
        predicate: String,
        /// Probe arguments
        args: Vec<String>,
    },
}

impl CommandEnvelope {
    /// Envelope for a single invocation
    #[must_use]
    pub fn invoke(control: &Invocation, delay_override: Option<u32>) -> Self {
        Self::Invoke {
            device: control.device_id,
            action: control.action_id,
            value: control.value,
            delay: control.settle_delay(delay_override),
        }
    }

    /// Envelope for a remote routine
    #[must_use]
    pub fn call(name: &str, args: &[String], delay_ms: Option<u32>) -> Self {
        Self::Call {
            name: name.to_string(),
            args: args.to_vec(),
            delay: delay_ms.unwrap_or(0),
        }
    }

    /// Envelope for a state query
    #[must_use]
    pub fn query(query: &StateQuery) -> Self {
        Self::Query {
            key: query.key.clone(),
            predicate: query.predicate.name().to_string(),
            args: query.args.clone(),
        }
    }

    /// Encode as one newline-terminated JSON line
    ///
    /// # Errors
    /// Returns [`ScriptError::Encoding`] if serialization fails
    pub fn to_line(&self) -> Result<String, ScriptError> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Decode one JSON line
    ///
    /// # Errors
    /// Returns [`ScriptError::Encoding`] if the line is not a valid envelope
    pub fn from_line(line: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(line.trim_end())?)
    }
}

/// Encode a whole script for a remote interpreter
#[must_use]
pub fn encode_script(script: &Script) -> Vec<CommandEnvelope> {
    encode_block(script.instructions())
}

fn encode_block(block: &[Instruction]) -> Vec<CommandEnvelope> {
    block.iter().map(encode_instruction).collect()
}

fn encode_instruction(instruction: &Instruction) -> CommandEnvelope {
    match instruction {
        Instruction::Invoke { control, delay_ms } => CommandEnvelope::invoke(control, *delay_ms),
        Instruction::Wait { ms } => CommandEnvelope::Wait { ms: *ms },
        Instruction::If {
            predicate,
            expected,
            args,
            then,
        } => CommandEnvelope::If {
            predicate: predicate.name().to_string(),
            expected: expected.clone(),
            args: args.clone(),
            block: encode_block(then),
        },
        Instruction::While {
            predicate,
            expected,
            args,
            body,
            max_iterations,
        } => CommandEnvelope::While {
            predicate: predicate.name().to_string(),
            expected: expected.clone(),
            args: args.clone(),
            block: encode_block(body),
            max: max_iterations.get(),
        },
        Instruction::Abort { message } => CommandEnvelope::Abort {
            message: message.clone(),
        },
        Instruction::CallFunction {
            name,
            args,
            delay_ms,
        } => CommandEnvelope::call(name, args, *delay_ms),
    }
}
