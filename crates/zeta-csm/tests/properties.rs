use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use proptest::prelude::*;
use zeta_csm::{ActionKind, Node, StateMachine, DEFAULT_GATE};

proptest! {
    #[test]
    fn registry_never_holds_duplicate_names(names in prop::collection::vec("[a-d]{1,2}", 0..32)) {
        let mut machine = StateMachine::new();
        let mut seen = BTreeSet::new();

        for name in &names {
            let before = machine.len();
            let added = machine.add_node(Node::new(name.as_str())).is_ok();

            prop_assert_eq!(added, seen.insert(name.clone()));
            prop_assert_eq!(machine.len(), if added { before + 1 } else { before });
        }
        prop_assert_eq!(machine.len(), seen.len());
    }

    #[test]
    fn fan_out_follows_first_insertion(order in prop::collection::vec(0usize..6, 1..24)) {
        let entered = Rc::new(RefCell::new(Vec::new()));
        let mut machine = StateMachine::new();
        machine.add_node(Node::new("src")).unwrap();

        for i in 0..6 {
            let entered = Rc::clone(&entered);
            let node = Node::new(format!("n{i}")).with_action(ActionKind::Enter, move |_ctx| {
                entered.borrow_mut().push(i);
            });
            machine.add_node(node).unwrap();
        }

        let mut expected = Vec::new();
        for &i in &order {
            machine.add_connection("src", DEFAULT_GATE, &format!("n{i}"), DEFAULT_GATE);
            if !expected.contains(&i) {
                expected.push(i);
            }
        }

        machine.send_from_gate("src", DEFAULT_GATE);
        machine.update();

        prop_assert_eq!(&*entered.borrow(), &expected);
    }
}
