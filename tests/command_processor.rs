use std::sync::{Arc, Mutex};

use mushcode::commands::{CommandProcessor, EchoHandler, OutcomeStatus, HUH};
use mushcode::engine::{standard_evaluator, EvalError, ExecutionContext, Invocation};
use mushcode::metadata::{CommandDefinition, MetadataCatalogs};
use mushcode::world::InMemoryWorld;

fn processor(max_depth: usize) -> CommandProcessor {
    let catalogs = MetadataCatalogs::embedded().unwrap();
    let world = InMemoryWorld::new();
    world.add_object(0, "Room Zero", None);
    world.add_object(1, "One", Some(0));
    world.set_attribute(1, "GREETING", "hello %qwho");
    let evaluator = standard_evaluator(Arc::clone(&catalogs.functions), Arc::new(world), max_depth);
    CommandProcessor::new(evaluator, catalogs.commands)
}

fn run(line: &str) -> Vec<String> {
    processor(50)
        .process(1, line, &EchoHandler)
        .into_iter()
        .flat_map(|o| o.lines)
        .collect()
}

#[test]
fn think_prints_the_evaluated_argument() {
    assert_eq!(run(r"think -\[Test\] [repeat(-,3)]"), ["-[Test] ---"]);
    assert_eq!(run("@eval [mul(6,7)]"), ["42"]);
}

#[test]
fn aliases_report_the_canonical_command() {
    assert_eq!(run("p bob=[upcase(hi)]"), ["@PAGE bob=HI"]);
    assert_eq!(run("l here"), ["LOOK here"]);
}

#[test]
fn noparse_commands_keep_their_text() {
    assert_eq!(run("@note [add(1,2)]"), ["@NOTE [add(1,2)]"]);
    assert_eq!(
        run("@wait [add(1,2)]=say [add(2,2)]"),
        ["@WAIT 3=say [add(2,2)]"]
    );
}

#[test]
fn unknown_commands_do_not_stop_the_line() {
    assert_eq!(run("xyzzy;think ok"), [HUH, "ok"]);
}

#[test]
fn attributes_are_readable_through_get() {
    assert_eq!(run("think [setq(who,Ann)][get(me/greeting)]"), ["hello Ann"]);
    assert_eq!(run("think [xget(here,greeting)]"), [""]);
}

#[test]
fn handlers_see_definition_switches_and_registers() {
    let seen = Mutex::new(Vec::new());
    let handler = |ctx: &mut ExecutionContext, def: &CommandDefinition, inv: &Invocation| -> Vec<String> {
        seen.lock().unwrap().push((
            def.name.clone(),
            inv.has_switch("quiet"),
            ctx.register("x").map(str::to_string),
        ));
        Vec::new()
    };
    let processor = processor(50);
    processor.process(1, "@dig/QUIET [setq(x,v)]room=desc;@dig other", &handler);
    assert_eq!(
        seen.into_inner().unwrap(),
        vec![
            ("@DIG".to_string(), true, Some("v".to_string())),
            ("@DIG".to_string(), false, None),
        ]
    );
}

#[test]
fn cancellation_aborts_every_remaining_command() {
    let processor = processor(50);
    processor.cancel_flag().cancel();
    let out = processor.process(1, "think a;think b", &EchoHandler);
    assert!(out
        .iter()
        .all(|o| o.status == OutcomeStatus::Aborted(EvalError::Cancelled)));
}

#[test]
fn depth_failures_report_a_hard_error() {
    let out = processor(2).process(1, "think [[[[x]]]]", &EchoHandler);
    assert_eq!(out[0].status, OutcomeStatus::Aborted(EvalError::TooDeep { limit: 2 }));
    assert_eq!(out[0].invocation.argument(), Some("[[[[x]]]]"));
}
