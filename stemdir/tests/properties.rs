//! Property tests for ordering and engine equivalence

mod common;

use common::{root_indices, Contents};
use proptest::prelude::*;
use stemdir::{Database, DbDir, Dir, MemDir};

#[derive(Debug, Clone)]
enum Op {
    Add(u8),
    Insert(usize, u8),
    Remove(u8),
    RemoveAt(usize),
    Move(usize, usize),
    Rename(usize, u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..12).prop_map(Op::Add),
        (0usize..14, 0u8..12).prop_map(|(i, k)| Op::Insert(i, k)),
        (0u8..12).prop_map(Op::Remove),
        (0usize..14).prop_map(Op::RemoveAt),
        (0usize..14, 0usize..14).prop_map(|(s, d)| Op::Move(s, d)),
        (0usize..14, 0u8..12).prop_map(|(i, k)| Op::Rename(i, k)),
    ]
}

fn payload(key: u8) -> Contents {
    Contents::new(&format!("k{}", key), i64::from(key))
}

/// Apply one operation, rendering the outcome so engines can be compared.
fn apply(dir: &mut dyn Dir<Contents>, op: &Op) -> String {
    let outcome = match op {
        Op::Add(k) => dir.add(&format!("n{}", k), payload(*k)).map(|i| i.to_string()),
        Op::Insert(i, k) => dir
            .insert(*i, &format!("n{}", k), payload(*k))
            .map(|i| i.to_string()),
        Op::Remove(k) => dir.remove(&payload(*k)).map(|_| String::new()),
        Op::RemoveAt(i) => dir.remove_at(*i).map(|_| String::new()),
        Op::Move(s, d) => dir.move_item(*s, *d).map(|_| String::new()),
        Op::Rename(i, k) => dir.set_name_at(*i, &format!("r{}", k)).map(|_| String::new()),
    };
    match outcome {
        Ok(value) => format!("ok {}", value),
        Err(e) => format!("err {}", e),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_db_indices_stay_contiguous(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let db = Database::open_in_memory().unwrap();
        let mut dir = DbDir::<Contents>::new(&db, "Stem").unwrap();

        for op in &ops {
            apply(&mut dir, op);
            let count = dir.count().unwrap() as i64;
            prop_assert_eq!(root_indices(&db, dir.table_name()), (0..count).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_engines_agree(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let db = Database::open_in_memory().unwrap();
        let mut persisted = DbDir::<Contents>::new(&db, "Stem").unwrap();
        let mut memory = MemDir::<Contents>::new();

        for op in &ops {
            let expected = apply(&mut memory, op);
            let actual = apply(&mut persisted, op);
            prop_assert_eq!(&actual, &expected, "after {:?}", op);

            let mem_entries: Vec<_> = memory.entries().map(|e| e.unwrap()).collect();
            let db_entries: Vec<_> = persisted.entries().map(|e| e.unwrap()).collect();
            prop_assert_eq!(db_entries, mem_entries);
        }
    }

    #[test]
    fn test_no_duplicates_within_directory(keys in prop::collection::vec(0u8..6, 1..30)) {
        let mut dir = MemDir::<Contents>::new();
        for key in &keys {
            let _ = dir.add("n", payload(*key));
        }

        let items: Vec<Contents> = dir.entries().map(|e| e.unwrap().item).collect();
        for (i, item) in items.iter().enumerate() {
            prop_assert!(!items[i + 1..].contains(item));
        }
    }
}
