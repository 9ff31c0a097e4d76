//! Property test: the cache identifier never decreases, is never zero,
//! and changes exactly when cached data may have changed.

use proptest::prelude::*;

use condor_core::{DataKey, RecordKey};
use condor_record::RecordImpl;
use condor_test_utils::{interval, provider, ConstProducer};

#[derive(Clone, Debug)]
enum Op {
    Extend(u64),
    Enter(u64),
    Reset,
    Invalidate,
    Rebuild,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u64..50).prop_map(Op::Extend),
        (1u64..50).prop_map(Op::Enter),
        Just(Op::Reset),
        Just(Op::Invalidate),
        Just(Op::Rebuild),
    ]
}

proptest! {
    #[test]
    fn identifier_is_monotonic(ops in prop::collection::vec(op(), 1..40)) {
        let mut rec = RecordImpl::new(RecordKey::new("R"));
        let key = DataKey::unlabeled::<i32>();
        rec.add_proxy("", provider("Const", "", ConstProducer::new(1_i32))).unwrap();
        rec.set_validity_interval(interval(0, 0)).unwrap();
        let mut start = 0_u64;
        let mut end = 0_u64;

        for op in ops {
            let before = rec.cache_identifier();
            let was_valid = rec.validity_interval().is_valid();
            let changed = match op {
                Op::Extend(by) => {
                    end += by;
                    rec.set_validity_interval(interval(start, end)).unwrap();
                    !was_valid
                }
                Op::Enter(gap) => {
                    start = end + gap;
                    end = start;
                    rec.set_validity_interval(interval(start, end)).unwrap();
                    true
                }
                Op::Reset => {
                    rec.reset_proxy(&key).unwrap();
                    true
                }
                Op::Invalidate => {
                    rec.invalidate();
                    false
                }
                Op::Rebuild => {
                    rec.rebuild([("", provider("Const", "", ConstProducer::new(1_i32)))]).unwrap();
                    true
                }
            };
            let after = rec.cache_identifier();
            prop_assert!(!after.is_unobserved());
            prop_assert!(after >= before);
            prop_assert_eq!(after != before, changed, "op changed={}", changed);
        }
    }
}
