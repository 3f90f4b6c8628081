//! # Command Processing
//!
//! Glue between a raw input line and the command implementations:
//!
//! 1. the line is split into invocations by [`CommandParser`]
//! 2. each invocation is matched against the [`CommandCatalog`]
//! 3. target and argument text are evaluated as the command's
//!    [`EvalPolicy`](crate::metadata::EvalPolicy) allows
//! 4. the rewritten invocation goes to a [`CommandHandler`]
//! 5. the invocation's registers are cleared
//!
//! Command behaviour itself lives behind [`CommandHandler`]; this crate only
//! ships [`EchoHandler`], which reports what it was given.

use std::sync::Arc;

use log::{debug, warn};

use crate::engine::{
    CancelFlag, CommandParser, EvalError, ExecutionContext, ExpressionEvaluator, Invocation,
};
use crate::logutil::escape_log;
use crate::metadata::{CommandCatalog, CommandDefinition};
use crate::world::Dbref;

/// Output for input that names no known command.
pub const HUH: &str = "Huh? (Try HELP)";

/// A command implementation.
pub trait CommandHandler {
    /// Run one invocation whose text has already been evaluated. Returns
    /// the lines to show the actor.
    fn execute(
        &self,
        ctx: &mut ExecutionContext,
        definition: &CommandDefinition,
        invocation: &Invocation,
    ) -> Vec<String>;
}

impl<F> CommandHandler for F
where
    F: Fn(&mut ExecutionContext, &CommandDefinition, &Invocation) -> Vec<String>,
{
    fn execute(
        &self,
        ctx: &mut ExecutionContext,
        definition: &CommandDefinition,
        invocation: &Invocation,
    ) -> Vec<String> {
        self(ctx, definition, invocation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Executed,
    Unknown,
    Aborted(EvalError),
}

/// What happened to one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// The invocation after evaluation (as parsed when evaluation failed or
    /// the command was unknown).
    pub invocation: Invocation,
    pub status: OutcomeStatus,
    pub lines: Vec<String>,
}

pub struct CommandProcessor {
    parser: CommandParser,
    evaluator: ExpressionEvaluator,
    commands: Arc<CommandCatalog>,
    cancel: CancelFlag,
}

impl CommandProcessor {
    pub fn new(evaluator: ExpressionEvaluator, commands: Arc<CommandCatalog>) -> Self {
        Self {
            parser: CommandParser::new(),
            evaluator,
            commands,
            cancel: CancelFlag::new(),
        }
    }

    /// Share `cancel` with every context this processor creates.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    pub fn evaluator(&self) -> &ExpressionEvaluator {
        &self.evaluator
    }

    /// Parse, evaluate and execute every invocation on `line` for `actor`.
    pub fn process(
        &self,
        actor: Dbref,
        line: &str,
        handler: &dyn CommandHandler,
    ) -> Vec<CommandOutcome> {
        self.parser
            .parse(line)
            .into_iter()
            .map(|invocation| self.process_one(actor, invocation, handler))
            .collect()
    }

    fn process_one(
        &self,
        actor: Dbref,
        invocation: Invocation,
        handler: &dyn CommandHandler,
    ) -> CommandOutcome {
        let Some(definition) = self.commands.get(invocation.name()) else {
            warn!(
                "Unknown command from #{}: {}",
                actor,
                escape_log(invocation.raw())
            );
            return CommandOutcome {
                invocation,
                status: OutcomeStatus::Unknown,
                lines: vec![HUH.to_string()],
            };
        };

        let mut ctx =
            ExecutionContext::new(actor, invocation.argument()).with_cancel(self.cancel.clone());
        let outcome = match self.evaluate_parts(&mut ctx, definition, &invocation) {
            Ok(evaluated) => {
                debug!(
                    "#{} {} [{}] -> {}",
                    actor,
                    definition.name,
                    definition.policy,
                    escape_log(&evaluated.to_string())
                );
                let lines = handler.execute(&mut ctx, definition, &evaluated);
                CommandOutcome {
                    invocation: evaluated,
                    status: OutcomeStatus::Executed,
                    lines,
                }
            }
            Err(e) => CommandOutcome {
                invocation,
                lines: vec![e.to_string()],
                status: OutcomeStatus::Aborted(e),
            },
        };
        ctx.clear();
        outcome
    }

    fn evaluate_parts(
        &self,
        ctx: &mut ExecutionContext,
        definition: &CommandDefinition,
        invocation: &Invocation,
    ) -> Result<Invocation, EvalError> {
        let policy = definition.policy;

        // Without an equals split the whole tail is one argument.
        let (target, argument) = match (invocation.target(), invocation.argument()) {
            (Some(t), a) if !policy.splits_on_equals() => {
                (None, Some(format!("{}={}", t, a.unwrap_or(""))))
            }
            (t, a) => (t.map(str::to_string), a.map(str::to_string)),
        };

        let target = match target {
            Some(t) if policy.evaluates_target() => Some(self.evaluator.evaluate(ctx, &t)?),
            other => other,
        };
        let argument = match argument {
            Some(a) if policy.evaluates_argument() => Some(self.evaluator.evaluate(ctx, &a)?),
            other => other,
        };
        Ok(invocation.with_evaluated(target, argument))
    }
}

/// Handler that reports each invocation back to the actor. `THINK` and
/// `@EVAL` print their evaluated argument; everything else prints the
/// canonical command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

impl CommandHandler for EchoHandler {
    fn execute(
        &self,
        _ctx: &mut ExecutionContext,
        definition: &CommandDefinition,
        invocation: &Invocation,
    ) -> Vec<String> {
        match definition.name.as_str() {
            "THINK" | "@EVAL" => vec![invocation.argument().unwrap_or("").to_string()],
            _ => {
                let canonical = Invocation::new(
                    definition.name.clone(),
                    invocation.switches().to_vec(),
                    invocation.target().map(str::to_string),
                    invocation.argument().map(str::to_string),
                    invocation.raw(),
                );
                vec![canonical.to_string()]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::standard_evaluator;
    use crate::metadata::MetadataCatalogs;
    use crate::world::InMemoryWorld;
    use std::cell::RefCell;

    fn processor() -> CommandProcessor {
        let catalogs = MetadataCatalogs::embedded().unwrap();
        let evaluator = standard_evaluator(
            Arc::clone(&catalogs.functions),
            Arc::new(InMemoryWorld::new()),
            50,
        );
        CommandProcessor::new(evaluator, catalogs.commands)
    }

    fn lines(outcomes: &[CommandOutcome]) -> Vec<String> {
        outcomes.iter().flat_map(|o| o.lines.clone()).collect()
    }

    #[test]
    fn unknown_commands_get_huh() {
        let out = processor().process(1, "frobnicate now", &EchoHandler);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].status, OutcomeStatus::Unknown);
        assert_eq!(out[0].lines, vec![HUH]);
    }

    #[test]
    fn argument_is_evaluated_and_aliases_resolve() {
        let out = processor().process(1, "think [add(2,3)];l [upcase(here)]", &EchoHandler);
        assert_eq!(lines(&out), vec!["5", "LOOK HERE"]);
    }

    #[test]
    fn rs_noparse_leaves_the_key_alone() {
        let out = processor().process(1, "@lock [upcase(box)]=[add(1,1)]", &EchoHandler);
        assert_eq!(out[0].invocation.target(), Some("BOX"));
        assert_eq!(out[0].invocation.argument(), Some("[add(1,1)]"));
    }

    #[test]
    fn without_eqsplit_the_equals_stays_in_the_argument() {
        let out = processor().process(1, "think a=[add(1,1)]", &EchoHandler);
        assert_eq!(out[0].invocation.target(), None);
        assert_eq!(lines(&out), vec!["a=2"]);
    }

    #[test]
    fn registers_do_not_leak_between_commands() {
        let out = processor().process(1, "think [setq(x,kept)]%qx;think <%qx>", &EchoHandler);
        assert_eq!(lines(&out), vec!["kept", "<>"]);
    }

    #[test]
    fn positional_arguments_come_from_the_raw_argument() {
        let seen = RefCell::new(Vec::new());
        let handler = |ctx: &mut ExecutionContext, _: &CommandDefinition, _: &Invocation| -> Vec<String> {
            seen.borrow_mut().push(ctx.argument(1).map(str::to_string));
            Vec::new()
        };
        processor().process(1, "say alpha beta gamma", &handler);
        assert_eq!(seen.into_inner(), vec![Some("beta".to_string())]);
    }

    #[test]
    fn evaluation_errors_abort_only_that_command() {
        let catalogs = MetadataCatalogs::embedded().unwrap();
        let evaluator = standard_evaluator(
            Arc::clone(&catalogs.functions),
            Arc::new(InMemoryWorld::new()),
            3,
        );
        let processor = CommandProcessor::new(evaluator, catalogs.commands);
        let out = processor.process(1, "think [[[[[x]]]]];think ok", &EchoHandler);
        assert_eq!(out[0].status, OutcomeStatus::Aborted(EvalError::TooDeep { limit: 3 }));
        assert_eq!(out[0].lines, vec!["#-1 EXPRESSION TOO DEEP"]);
        assert_eq!(out[1].lines, vec!["ok"]);
    }
}
