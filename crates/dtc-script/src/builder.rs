//! Script Builder
//!
//! Accumulates instructions into the current scope. Conditional and loop
//! bodies are built by a caller-supplied closure against a child builder,
//! whose instructions are spliced in as the nested block.

use crate::error::ScriptError;
use crate::instruction::{Instruction, Invocation, Script};
use crate::predicate::Predicate;
use dtc_registry::{ActionRegistry, Control};
use std::num::NonZeroU32;

/// Loop bound used by [`ScriptBuilder::while_block`]
pub const DEFAULT_MAX_ITERATIONS: NonZeroU32 = match NonZeroU32::new(6) {
    Some(n) => n,
    None => unreachable!(),
};

/// Builder for upload scripts
///
/// Usage:
/// ```rust,ignore
/// let mut builder = ScriptBuilder::new();
/// builder.action(clr).action(clr).action(menu);
/// builder.while_block("IsPageShown", "false", &[], |b| {
///     b.action(next_page);
///     Ok::<_, ScriptError>(())
/// })?;
/// let script: Script = builder.finish();
/// ```
#[derive(Debug, Clone)]
pub struct ScriptBuilder {
    scope: Vec<Instruction>,
    max_iterations: NonZeroU32,
}

impl ScriptBuilder {
    /// Create an empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_iterations(DEFAULT_MAX_ITERATIONS)
    }

    /// Create an empty builder with a custom default loop bound
    #[inline]
    #[must_use]
    pub fn with_max_iterations(max_iterations: NonZeroU32) -> Self {
        Self {
            scope: Vec::new(),
            max_iterations,
        }
    }

    /// Child scope sharing this builder's defaults
    fn child(&self) -> Self {
        Self::with_max_iterations(self.max_iterations)
    }

    /// Number of instructions in the current scope
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.scope.len()
    }

    /// Check if nothing has been appended
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scope.is_empty()
    }

    /// Invoke a control at its first position
    pub fn action(&mut self, control: &Control) -> &mut Self {
        // Every registered control has at least one value.
        let invocation = Invocation {
            control: control.qualified_name(),
            device_id: control.device_id(),
            action_id: control.action_id(),
            value: control.values().first().copied().unwrap_or(1.0),
            delay_ms: control.delay_ms(),
        };
        self.push_invoke(invocation, None)
    }

    /// Invoke a multi-position control at `position`
    ///
    /// # Errors
    /// Returns [`ScriptError::Registry`] if the position does not exist
    pub fn action_at(
        &mut self,
        control: &Control,
        position: usize,
    ) -> Result<&mut Self, ScriptError> {
        let invocation = Invocation::resolve(control, position)?;
        Ok(self.push_invoke(invocation, None))
    }

    /// Invoke a control with a settle delay override
    pub fn action_with_delay(&mut self, control: &Control, delay_ms: u32) -> &mut Self {
        self.action(control);
        if let Some(Instruction::Invoke { delay_ms: slot, .. }) = self.scope.last_mut() {
            *slot = Some(delay_ms);
        }
        self
    }

    /// Invoke a literal sequence of controls
    pub fn actions<'c>(&mut self, controls: impl IntoIterator<Item = &'c Control>) -> &mut Self {
        for control in controls {
            self.action(control);
        }
        self
    }

    /// Invoke `control` `count` times
    pub fn repeat(&mut self, control: &Control, count: usize) -> &mut Self {
        for _ in 0..count {
            self.action(control);
        }
        self
    }

    /// Type `text` on a keypad device, one key per character
    ///
    /// Each character must be an action name on `device` (`"0"`..`"9"`,
    /// `"."` where the device has a decimal key).
    ///
    /// # Errors
    /// Returns [`ScriptError::UnmappedKey`] for characters without a key;
    /// nothing is appended in that case
    pub fn keypad(
        &mut self,
        registry: &ActionRegistry,
        device: &str,
        text: &str,
    ) -> Result<&mut Self, ScriptError> {
        let mut keys = Vec::with_capacity(text.len());
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            let key = registry
                .lookup(device, ch.encode_utf8(&mut buf))
                .map_err(|_| ScriptError::UnmappedKey {
                    device: device.to_string(),
                    ch,
                })?;
            keys.push(key);
        }
        Ok(self.actions(keys))
    }

    fn push_invoke(&mut self, control: Invocation, delay_ms: Option<u32>) -> &mut Self {
        tracing::trace!(control = %control.control, value = control.value, "append invoke");
        self.scope.push(Instruction::Invoke { control, delay_ms });
        self
    }

    /// Pause for `ms` milliseconds
    pub fn wait(&mut self, ms: u32) -> &mut Self {
        self.scope.push(Instruction::Wait { ms });
        self
    }

    /// Append a conditional block
    ///
    /// `body` runs against a child scope; its instructions execute only if
    /// `predicate(args)` reports `expected`. There is no else branch.
    ///
    /// # Errors
    /// Propagates any error returned by `body`; nothing is appended then
    pub fn if_block<F, E>(
        &mut self,
        predicate: impl Into<Predicate>,
        expected: impl Into<String>,
        args: &[&str],
        body: F,
    ) -> Result<&mut Self, E>
    where
        F: FnOnce(&mut ScriptBuilder) -> Result<(), E>,
    {
        let mut child = self.child();
        body(&mut child)?;
        self.scope.push(Instruction::If {
            predicate: predicate.into(),
            expected: expected.into(),
            args: to_args(args),
            then: child.scope,
        });
        Ok(self)
    }

    /// Append a loop bounded by the builder's default iteration count
    ///
    /// # Errors
    /// Propagates any error returned by `body`
    pub fn while_block<F, E>(
        &mut self,
        predicate: impl Into<Predicate>,
        expected: impl Into<String>,
        args: &[&str],
        body: F,
    ) -> Result<&mut Self, E>
    where
        F: FnOnce(&mut ScriptBuilder) -> Result<(), E>,
    {
        let bound = self.max_iterations;
        self.bounded_while(predicate.into(), expected.into(), args, bound, body)
    }

    /// Append a loop with an explicit iteration bound
    ///
    /// # Errors
    /// Returns [`ScriptError::ZeroIterations`] if `max_iterations` is zero,
    /// or any error returned by `body`
    pub fn while_block_max<F, E>(
        &mut self,
        predicate: impl Into<Predicate>,
        expected: impl Into<String>,
        args: &[&str],
        max_iterations: u32,
        body: F,
    ) -> Result<&mut Self, E>
    where
        F: FnOnce(&mut ScriptBuilder) -> Result<(), E>,
        E: From<ScriptError>,
    {
        let predicate = predicate.into();
        let bound = NonZeroU32::new(max_iterations).ok_or_else(|| ScriptError::ZeroIterations {
            predicate: predicate.name().to_string(),
        })?;
        self.bounded_while(predicate, expected.into(), args, bound, body)
    }

    fn bounded_while<F, E>(
        &mut self,
        predicate: Predicate,
        expected: String,
        args: &[&str],
        max_iterations: NonZeroU32,
        body: F,
    ) -> Result<&mut Self, E>
    where
        F: FnOnce(&mut ScriptBuilder) -> Result<(), E>,
    {
        let mut child = self.child();
        body(&mut child)?;
        self.scope.push(Instruction::While {
            predicate,
            expected,
            args: to_args(args),
            body: child.scope,
            max_iterations,
        });
        Ok(self)
    }

    /// Append an abort
    ///
    /// Building continues; the executor halts here and surfaces `message`.
    pub fn abort(&mut self, message: impl Into<String>) -> &mut Self {
        self.scope.push(Instruction::Abort {
            message: message.into(),
        });
        self
    }

    /// Call a named routine on the remote side
    pub fn call_function(
        &mut self,
        name: impl Into<String>,
        args: &[&str],
        delay_ms: Option<u32>,
    ) -> &mut Self {
        self.scope.push(Instruction::CallFunction {
            name: name.into(),
            args: to_args(args),
            delay_ms,
        });
        self
    }

    /// Splice a finished fragment into the current scope
    pub fn append(&mut self, fragment: Script) -> &mut Self {
        self.scope.extend(fragment.into_instructions());
        self
    }

    /// Finish building
    #[must_use]
    pub fn finish(self) -> Script {
        Script::new(self.scope)
    }
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| (*a).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtc_registry::RegistryTable;
    use pretty_assertions::assert_eq;

    fn registry() -> ActionRegistry {
        RegistryTable::load(
            r"
target: test
default_delay_ms: 40
devices:
  - name: KP
    id: 9
    actions:
      - { name: '1', id: 1 }
      - { name: '2', id: 2 }
      - { name: '3', id: 3 }
      - { name: ENTR, id: 10 }
      - { name: KNOB, id: 11, values: [0.0, 0.5, 1.0] }
",
        )
        .unwrap()
    }

    fn control<'r>(registry: &'r ActionRegistry, name: &str) -> &'r Control {
        registry.lookup("KP", name).unwrap()
    }

    #[test]
    fn builder_appends_in_order() {
        let registry = registry();
        let mut builder = ScriptBuilder::new();
        builder
            .action(control(&registry, "1"))
            .wait(100)
            .action(control(&registry, "ENTR"));
        let script = builder.finish();

        let ops: Vec<_> = script.instructions().iter().map(Instruction::op).collect();
        assert_eq!(ops, vec!["invoke", "wait", "invoke"]);
    }

    #[test]
    fn keypad_expands_characters() {
        let registry = registry();
        let mut builder = ScriptBuilder::new();
        builder.keypad(&registry, "KP", "3213").unwrap();
        let ids: Vec<_> = builder
            .finish()
            .invocations()
            .map(|i| i.action_id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1, 3]);
    }

    #[test]
    fn keypad_unmapped_appends_nothing() {
        let registry = registry();
        let mut builder = ScriptBuilder::new();
        let err = builder.keypad(&registry, "KP", "12.3").unwrap_err();
        assert!(matches!(err, ScriptError::UnmappedKey { ch: '.', .. }));
        assert!(builder.is_empty());
    }

    #[test]
    fn action_at_selects_position() {
        let registry = registry();
        let mut builder = ScriptBuilder::new();
        builder.action_at(control(&registry, "KNOB"), 1).unwrap();
        assert!(builder.action_at(control(&registry, "KNOB"), 3).is_err());
        let script = builder.finish();
        assert_eq!(script.invocations().next().unwrap().value, 0.5);
    }

    #[test]
    fn action_with_delay_overrides() {
        let registry = registry();
        let mut builder = ScriptBuilder::new();
        builder.action_with_delay(control(&registry, "ENTR"), 500);
        match &builder.finish().instructions()[0] {
            Instruction::Invoke { control, delay_ms } => {
                assert_eq!(*delay_ms, Some(500));
                assert_eq!(control.settle_delay(*delay_ms), 500);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn if_block_nests_child_scope() {
        let registry = registry();
        let mut builder = ScriptBuilder::new();
        builder
            .if_block("IsPowered", "false", &[], |b| {
                b.abort("no power");
                Ok::<_, ScriptError>(())
            })
            .unwrap();
        builder.action(control(&registry, "1"));

        let script = builder.finish();
        assert_eq!(script.len(), 2);
        assert_eq!(
            script.instructions()[0],
            Instruction::If {
                predicate: "IsPowered".into(),
                expected: "false".into(),
                args: vec![],
                then: vec![Instruction::Abort {
                    message: "no power".into()
                }],
            }
        );
    }

    #[test]
    fn failing_body_appends_nothing() {
        let mut builder = ScriptBuilder::new();
        let result = builder.if_block("P", "true", &[], |b| {
            b.wait(10);
            Err::<(), _>("boom")
        });
        assert_eq!(result.unwrap_err(), "boom");
        assert!(builder.is_empty());
    }

    #[test]
    fn while_block_uses_default_bound() {
        let registry = registry();
        let mut builder = ScriptBuilder::new();
        builder
            .while_block("IsPage", "false", &["2"], |b| {
                b.action(control(&registry, "ENTR"));
                Ok::<_, ScriptError>(())
            })
            .unwrap();
        match &builder.finish().instructions()[0] {
            Instruction::While {
                max_iterations,
                args,
                body,
                ..
            } => {
                assert_eq!(max_iterations.get(), 6);
                assert_eq!(args, &vec!["2".to_string()]);
                assert_eq!(body.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn while_block_rejects_zero_bound() {
        let mut builder = ScriptBuilder::new();
        let err = builder
            .while_block_max("P", "true", &[], 0, |_| Ok::<_, ScriptError>(()))
            .unwrap_err();
        assert!(matches!(err, ScriptError::ZeroIterations { .. }));
        assert!(builder.is_empty());
    }

    #[test]
    fn nested_scopes_inherit_bound() {
        let mut builder = ScriptBuilder::with_max_iterations(NonZeroU32::new(2).unwrap());
        builder
            .if_block("A", "true", &[], |b| {
                b.while_block("B", "true", &[], |_| Ok::<_, ScriptError>(()))?;
                Ok::<_, ScriptError>(())
            })
            .unwrap();
        let script = builder.finish();
        match &script.instructions()[0].children()[0] {
            Instruction::While { max_iterations, .. } => assert_eq!(max_iterations.get(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn call_function_and_append() {
        let mut fragment = ScriptBuilder::new();
        fragment.call_function("FlashCaution", &["2"], Some(250));
        let mut builder = ScriptBuilder::new();
        builder.wait(5).append(fragment.finish());
        let script = builder.finish();
        assert_eq!(script.len(), 2);
        assert_eq!(script.instructions()[1].op(), "call_function");
    }
}
