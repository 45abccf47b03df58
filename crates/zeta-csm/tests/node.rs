use std::cell::RefCell;
use std::rc::Rc;

use zeta_core::Rolodex;
use zeta_csm::{
    ActionKind, Node, NodeAction, NodeBehavior, NodeContext, NodeRef, DEFAULT_GATE, NAME_KEY,
    NODE_KEY,
};

type Log = Rc<RefCell<Vec<String>>>;

fn record(log: &Log, entry: &'static str) -> impl FnMut(&mut NodeContext<'_>) + 'static {
    let log = Rc::clone(log);
    move |_ctx: &mut NodeContext<'_>| log.borrow_mut().push(entry.to_string())
}

#[test]
fn new_node_is_inactive_with_seeded_stack() {
    let node = Node::new("Idle");
    assert!(!node.is_active());
    assert_eq!(node.stack().try_get::<String>(NAME_KEY).as_deref(), Some("Idle"));
    assert_eq!(
        node.stack().try_get::<NodeRef>(NODE_KEY),
        Some(NodeRef::new("Idle"))
    );
    assert_eq!(node.node_ref().gate_message("Done"), "Idle_Done");
}

#[test]
fn enter_runs_input_gate_then_enter_callbacks_in_order() {
    let log = Log::default();
    let mut node = Node::new("A")
        .with_action(ActionKind::Enter, record(&log, "enter-1"))
        .with_action(ActionKind::Enter, record(&log, "enter-2"))
        .with_input_gate("Alt", record(&log, "gate-alt"));

    let mut state = Rolodex::new();
    node.enter(&mut state, "Alt");
    assert!(node.is_active());
    assert_eq!(*log.borrow(), ["gate-alt", "enter-1", "enter-2"]);

    log.borrow_mut().clear();
    node.enter(&mut state, DEFAULT_GATE);
    assert_eq!(*log.borrow(), ["enter-1", "enter-2"]);
}

#[test]
fn exit_runs_output_gate_then_exit_callbacks() {
    let log = Log::default();
    let mut node = Node::new("A")
        .with_action(ActionKind::Exit, record(&log, "exit"))
        .with_output_gate("Done", record(&log, "gate-done"));

    let mut state = Rolodex::new();
    node.enter(&mut state, DEFAULT_GATE);
    node.exit(&mut state, "Done", true);

    assert!(!node.is_active());
    assert_eq!(*log.borrow(), ["gate-done", "exit"]);
}

#[test]
fn exit_without_deactivation_stays_active() {
    let mut node = Node::new("A");
    let mut state = Rolodex::new();
    node.enter(&mut state, DEFAULT_GATE);

    node.exit(&mut state, "g", false);
    assert!(node.is_active());

    node.exit(&mut state, "g", true);
    assert!(!node.is_active());
}

#[test]
fn gate_actions_are_first_writer_wins() {
    let log = Log::default();
    let mut node = Node::new("A");
    node.set_input_gate_action("In", record(&log, "first"))
        .set_input_gate_action("In", record(&log, "second"))
        .set_output_gate_action("Out", record(&log, "out-first"))
        .set_output_gate_action("Out", record(&log, "out-second"));
    assert!(node.has_input_gate("In"));
    assert!(node.has_output_gate("Out"));
    assert!(!node.has_input_gate("Out"));

    let mut state = Rolodex::new();
    node.enter(&mut state, "In");
    node.exit(&mut state, "Out", true);
    assert_eq!(*log.borrow(), ["first", "out-first"]);
}

#[test]
fn update_lists_run_by_kind() {
    let log = Log::default();
    let mut node = Node::new("A");
    node.add_base_action(ActionKind::Update, record(&log, "update"))
        .add_base_actions(
            ActionKind::FixedUpdate,
            vec![
                Box::new(record(&log, "fixed-1")) as NodeAction,
                Box::new(record(&log, "fixed-2")) as NodeAction,
            ],
        );

    let mut state = Rolodex::new();
    node.update(&mut state);
    node.fixed_update(&mut state);
    assert_eq!(*log.borrow(), ["update", "fixed-1", "fixed-2"]);
}

#[test]
fn callbacks_see_shared_and_private_stores() {
    let mut node = Node::new("Counter").with_action(ActionKind::Enter, |ctx| {
        let entered = ctx.stack.pull::<u32>("entered", 0).unwrap() + 1;
        ctx.stack.push("entered", entered).unwrap();
        let name = ctx.name().to_string();
        ctx.state.push("last", name).unwrap();
    });

    let mut state = Rolodex::new();
    node.enter(&mut state, DEFAULT_GATE);
    node.enter(&mut state, DEFAULT_GATE);

    assert_eq!(node.stack().try_get::<u32>("entered"), Some(2));
    assert_eq!(state.try_get::<String>("last").as_deref(), Some("Counter"));
}

#[test]
fn send_from_gate_exits_and_enqueues_gate_message() {
    let log = Log::default();
    let mut node = Node::new("A").with_output_gate("Done", record(&log, "gate-done"));

    let mut state = Rolodex::new();
    node.enter(&mut state, DEFAULT_GATE);
    node.send_from_gate(&mut state, "Done", true);

    assert!(!node.is_active());
    assert_eq!(*log.borrow(), ["gate-done"]);
    assert_eq!(node.bus().pending(), ["A_Done"]);
}

#[test]
fn send_to_state_wires_connection_once() {
    let mut node = Node::new("A");
    let mut state = Rolodex::new();

    node.send_to_state(&mut state, "B", "Out", "In", true);
    node.send_to_state(&mut state, "B", "Out", "In", true);

    let connections = node.bus().connections();
    assert_eq!(connections.targets("A_Out").len(), 1);
    assert_eq!(connections.targets("A_Out")[0].node, "B");
    assert_eq!(connections.targets("A_Out")[0].gate, "In");
    drop(connections);
    assert_eq!(node.bus().pending(), ["A_Out", "A_Out"]);
}

#[test]
fn context_sends_apply_after_the_callback_list() {
    let log = Log::default();
    let exit_log = Rc::clone(&log);
    let mut node = Node::new("A")
        .with_action(ActionKind::Update, |ctx| {
            ctx.send_message("ping");
            ctx.send_from_gate("Done", true);
        })
        .with_action(ActionKind::Update, record(&log, "second-update"))
        .with_action(ActionKind::Exit, move |ctx| {
            exit_log
                .borrow_mut()
                .push(format!("exit active={}", ctx.is_active()));
        });

    let mut state = Rolodex::new();
    node.enter(&mut state, DEFAULT_GATE);
    node.update(&mut state);

    assert_eq!(*log.borrow(), ["second-update", "exit active=false"]);
    assert!(!node.is_active());
    assert_eq!(node.bus().pending(), ["ping", "A_Done"]);
}

#[test]
fn stay_active_gate_fire_keeps_node_running() {
    let mut node = Node::new("Beacon").with_action(ActionKind::Update, |ctx| {
        ctx.send_from_gate("Pulse", false);
    });

    let mut state = Rolodex::new();
    node.enter(&mut state, DEFAULT_GATE);
    node.update(&mut state);
    node.update(&mut state);

    assert!(node.is_active());
    assert_eq!(node.bus().pending(), ["Beacon_Pulse", "Beacon_Pulse"]);
}

struct Recorder {
    log: Log,
}

impl NodeBehavior for Recorder {
    fn enter(&mut self, ctx: &mut NodeContext<'_>) {
        self.log.borrow_mut().push(format!("behavior-enter({})", ctx.name()));
    }

    fn update(&mut self, _ctx: &mut NodeContext<'_>) {
        self.log.borrow_mut().push("behavior-update".to_string());
    }

    fn fixed_update(&mut self, _ctx: &mut NodeContext<'_>) {
        self.log.borrow_mut().push("behavior-fixed".to_string());
    }

    fn exit(&mut self, ctx: &mut NodeContext<'_>) {
        self.log
            .borrow_mut()
            .push(format!("behavior-exit active={}", ctx.is_active()));
    }
}

#[test]
fn behavior_hooks_run_after_callback_lists() {
    let log = Log::default();
    let mut node = Node::new("A")
        .with_behavior(Recorder {
            log: Rc::clone(&log),
        })
        .with_action(ActionKind::Enter, record(&log, "enter"))
        .with_action(ActionKind::Update, record(&log, "update"))
        .with_action(ActionKind::FixedUpdate, record(&log, "fixed"))
        .with_action(ActionKind::Exit, record(&log, "exit"))
        .with_input_gate("In", record(&log, "gate-in"))
        .with_output_gate("Out", record(&log, "gate-out"));
    assert!(node.has_behavior());

    let mut state = Rolodex::new();
    node.enter(&mut state, "In");
    node.update(&mut state);
    node.fixed_update(&mut state);
    node.exit(&mut state, "Out", true);

    assert_eq!(
        *log.borrow(),
        [
            "gate-in",
            "enter",
            "behavior-enter(A)",
            "update",
            "behavior-update",
            "fixed",
            "behavior-fixed",
            "gate-out",
            "exit",
            "behavior-exit active=false",
        ]
    );
}

#[derive(Default)]
struct Timer {
    ticks: u32,
}

impl NodeBehavior for Timer {
    fn enter(&mut self, _ctx: &mut NodeContext<'_>) {
        self.ticks = 0;
    }

    fn update(&mut self, ctx: &mut NodeContext<'_>) {
        self.ticks += 1;
        ctx.stack.push("ticks", self.ticks).unwrap();
        if self.ticks == 2 {
            ctx.send_from_gate("Done", true);
        }
    }
}

#[test]
fn behavior_hooks_can_send_and_use_stores() {
    let mut node = Node::new("Timer").with_behavior(Timer::default());
    let mut state = Rolodex::new();

    node.enter(&mut state, DEFAULT_GATE);
    node.update(&mut state);
    assert!(node.is_active());
    assert!(node.bus().pending().is_empty());

    node.update(&mut state);
    assert!(!node.is_active());
    assert_eq!(node.stack().try_get::<u32>("ticks"), Some(2));
    assert_eq!(node.bus().pending(), ["Timer_Done"]);
}

#[test]
fn nodes_without_behavior_report_none() {
    let mut node = Node::new("Plain");
    assert!(!node.has_behavior());

    node.set_behavior(Timer::default());
    assert!(node.has_behavior());
}
