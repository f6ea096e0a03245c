//! Order lifecycle state machine tests

use proptest::prelude::*;
use shared::OrderStatus;

const ALL: [OrderStatus; 6] = [
    OrderStatus::Nuevo,
    OrderStatus::Confirmado,
    OrderStatus::Preparando,
    OrderStatus::EnCamino,
    OrderStatus::Entregado,
    OrderStatus::Cancelado,
];

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_full_happy_path() {
        let path = [
            OrderStatus::Nuevo,
            OrderStatus::Confirmado,
            OrderStatus::Preparando,
            OrderStatus::EnCamino,
            OrderStatus::Entregado,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_every_active_state_has_exactly_two_successors() {
        for s in ALL {
            if !s.is_terminal() {
                assert_eq!(s.allowed_transitions().len(), 2, "{s:?}");
            }
        }
    }

    #[test]
    fn test_cancel_always_available_until_terminal() {
        for s in ALL {
            if !s.is_terminal() {
                assert!(s.can_transition_to(OrderStatus::Cancelado), "{s:?}");
            }
        }
    }

    #[test]
    fn test_only_two_terminal_states() {
        let terminals: Vec<_> = ALL.iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminals.len(), 2);
        assert!(terminals.contains(&&OrderStatus::Entregado));
        assert!(terminals.contains(&&OrderStatus::Cancelado));
    }

    #[test]
    fn test_delivered_cannot_be_cancelled() {
        assert!(!OrderStatus::Entregado.can_transition_to(OrderStatus::Cancelado));
    }

    #[test]
    fn test_reapplying_current_status_is_rejected() {
        for s in ALL {
            assert!(!s.can_transition_to(s), "{s:?}");
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn status_strategy() -> impl Strategy<Value = OrderStatus> {
    prop::sample::select(ALL.to_vec())
}

proptest! {
    /// Any walk through the table only ever visits declared successors and
    /// stops permanently once it hits a terminal state
    #[test]
    fn prop_walks_respect_the_table(steps in prop::collection::vec(status_strategy(), 1..20)) {
        let mut current = OrderStatus::Nuevo;
        for next in steps {
            if current.is_terminal() {
                prop_assert!(!current.can_transition_to(next));
                continue;
            }
            if current.can_transition_to(next) {
                prop_assert!(current.allowed_transitions().contains(&next));
                current = next;
            }
        }
    }

    /// Transition targets are never the source state
    #[test]
    fn prop_no_self_loops(s in status_strategy()) {
        prop_assert!(!s.allowed_transitions().contains(&s));
    }

    /// Every non-terminal transition moves forward or cancels
    #[test]
    fn prop_successors_are_forward_or_cancel(s in status_strategy()) {
        let order = |x: OrderStatus| ALL.iter().position(|y| *y == x).unwrap();
        for next in s.allowed_transitions() {
            prop_assert!(
                *next == OrderStatus::Cancelado || order(*next) == order(s) + 1,
                "{s:?} -> {next:?}"
            );
        }
    }
}
