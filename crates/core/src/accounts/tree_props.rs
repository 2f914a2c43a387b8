//! Property-based tests for the nested-set account tree.

use proptest::prelude::*;

use crate::accounts::tree::AccountTree;
use crate::accounts::types::{NewAccount, ReportType};
use tally_shared::types::AccountId;

/// One generated insert: (parent pick, is group).
fn arb_inserts() -> impl Strategy<Value = Vec<(usize, bool)>> {
    prop::collection::vec((any::<usize>(), any::<bool>()), 1..40)
}

/// Builds a single-company tree from generated inserts, returning the group ids.
fn build(inserts: &[(usize, bool)]) -> (AccountTree, Vec<AccountId>, Vec<AccountId>) {
    let mut tree = AccountTree::new();
    let root = tree
        .insert(NewAccount::group("Root", "Acme").report_type(ReportType::BalanceSheet))
        .unwrap();
    let mut groups = vec![root];
    let mut all = vec![root];
    for (i, (pick, is_group)) in inserts.iter().enumerate() {
        let parent = groups[pick % groups.len()];
        let input = if *is_group {
            NewAccount::group(format!("G{i:03}"), "Acme")
        } else {
            NewAccount::ledger(format!("L{i:03}"), "Acme")
        };
        let id = tree.insert(input.under(parent)).unwrap();
        if *is_group {
            groups.push(id);
        }
        all.push(id);
    }
    (tree, groups, all)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Containment holds after any sequence of inserts
    // =========================================================================

    #[test]
    fn prop_containment_after_inserts(inserts in arb_inserts()) {
        let (tree, _, all) = build(&inserts);
        prop_assert!(tree.check_containment().is_ok());

        // bounds are a permutation of 1..=2n
        let mut bounds: Vec<u32> = all
            .iter()
            .flat_map(|id| {
                let a = tree.get(*id).unwrap();
                [a.lft, a.rgt]
            })
            .collect();
        bounds.sort_unstable();
        let expected: Vec<u32> = (1..=u32::try_from(all.len() * 2).unwrap()).collect();
        prop_assert_eq!(bounds, expected);
    }

    // =========================================================================
    // Moves either fail cleanly or keep containment
    // =========================================================================

    #[test]
    fn prop_moves_preserve_containment(
        inserts in arb_inserts(),
        moves in prop::collection::vec((any::<usize>(), any::<usize>()), 1..20),
    ) {
        let (mut tree, groups, all) = build(&inserts);
        for (node_pick, parent_pick) in moves {
            let node = all[node_pick % all.len()];
            let parent = groups[parent_pick % groups.len()];
            let before: Vec<_> = all.iter().map(|id| tree.get(*id).cloned()).collect();

            match tree.move_to(node, parent) {
                Ok(()) => {
                    prop_assert_eq!(tree.get(node).unwrap().parent, Some(parent));
                    prop_assert!(tree.get(parent).unwrap().contains(tree.get(node).unwrap()));
                }
                Err(_) => {
                    let after: Vec<_> = all.iter().map(|id| tree.get(*id).cloned()).collect();
                    prop_assert_eq!(before, after);
                }
            }
            prop_assert!(tree.check_containment().is_ok());
        }
    }

    // =========================================================================
    // Rebuild is deterministic
    // =========================================================================

    #[test]
    fn prop_rebuild_is_idempotent(inserts in arb_inserts()) {
        let (mut tree, _, all) = build(&inserts);
        let before: Vec<_> = all.iter().map(|id| {
            let a = tree.get(*id).unwrap();
            (a.lft, a.rgt)
        }).collect();
        tree.rebuild();
        let after: Vec<_> = all.iter().map(|id| {
            let a = tree.get(*id).unwrap();
            (a.lft, a.rgt)
        }).collect();
        prop_assert_eq!(before, after);
    }
}
