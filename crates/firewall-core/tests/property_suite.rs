//! Property checks for width derivation, the codec and the matcher.

use firewall_core::{
    decode_unsigned, encode_hex, encode_unsigned, evaluate, id_width_for, Dimensions, PortRequest,
    RuleFields, RuleTable, RuleWord, RwxCode,
};
use proptest::prelude::*;
#[cfg(feature = "parallel")]
use rayon as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn default_dims() -> Dimensions {
    Dimensions::derive(8, 16).unwrap()
}

proptest! {
    #[test]
    fn unsigned_encoding_round_trips_below_two_to_the_width(width in 1u32..=128, value in any::<u128>()) {
        let value = if width == 128 { value } else { value % (1u128 << width) };
        let bits = encode_unsigned(value, width).unwrap();
        prop_assert_eq!(bits.width(), width);
        prop_assert_eq!(decode_unsigned(&bits), value);
    }

    #[test]
    fn wide_values_keep_exactly_the_low_bits(width in 1u32..64, value in any::<u64>()) {
        let bits = encode_unsigned(u128::from(value), width).unwrap();
        prop_assert_eq!(decode_unsigned(&bits), u128::from(value) & ((1u128 << width) - 1));
    }

    #[test]
    fn hex_and_unsigned_encodings_agree(width in 1u32..=64, value in any::<u64>()) {
        let text = format!("{value:X}");
        prop_assert_eq!(encode_hex(&text, width).unwrap(), encode_unsigned(u128::from(value), width).unwrap());
    }

    #[test]
    fn id_width_indexes_every_slot(depth in 1usize..=4096) {
        let id_width = id_width_for(depth).unwrap();
        prop_assert!((1usize << id_width) >= depth);
        if id_width > 0 {
            prop_assert!((1usize << (id_width - 1)) < depth);
        }
    }

    #[test]
    fn derived_fields_always_fit_the_word(depth in 1usize..=1024, word_width in 1u32..=128) {
        if let Ok(dims) = Dimensions::derive(depth, word_width) {
            prop_assert!(dims.addr_width() > 0);
            prop_assert!(dims.id_width() + dims.rwx_width() + 2 * dims.addr_width() <= word_width);
            let layout = dims.layout();
            let top = if layout.id.is_empty() { layout.rwx } else { layout.id };
            prop_assert_eq!(top.msb() + 1, word_width);
            prop_assert_eq!(layout.addr_max.lsb, dims.padding_width());
        }
    }

    #[test]
    fn pack_then_unpack_preserves_in_range_fields(
        master_id in 0u64..8,
        rwx in 0u8..8,
        addr_min in 0u64..32,
        addr_max in 0u64..32,
    ) {
        let dims = default_dims();
        let fields = RuleFields { master_id, rwx: RwxCode::from_bits(rwx), addr_min, addr_max };
        prop_assert_eq!(RuleWord::pack(&dims, &fields).unpack(&dims), fields);
    }

    #[test]
    fn reset_always_yields_all_zero_slots(writes in prop::collection::vec((0usize..8, any::<u16>()), 0..16)) {
        let dims = default_dims();
        let mut table = RuleTable::new(dims);
        for (index, raw) in writes {
            let word = RuleWord::from_bits(&dims, encode_unsigned(u128::from(raw), 16).unwrap()).unwrap();
            table.write_rule(index, word).unwrap();
        }
        table.reset();
        let snapshot = table.snapshot();
        prop_assert_eq!(snapshot.len(), 8);
        prop_assert!(snapshot.slots().iter().all(RuleWord::is_zero));
    }

    #[test]
    fn slot_order_never_changes_a_decision(
        raws in prop::collection::vec(any::<u16>(), 8),
        master_id in 0u64..8,
        address in 0u64..32,
        enable in any::<bool>(),
    ) {
        let dims = default_dims();
        let words: Vec<RuleWord> = raws
            .iter()
            .map(|&raw| RuleWord::from_bits(&dims, encode_unsigned(u128::from(raw), 16).unwrap()).unwrap())
            .collect();

        let mut forward = RuleTable::new(dims);
        let mut reversed = RuleTable::new(dims);
        for (index, word) in words.iter().enumerate() {
            forward.write_rule(index, *word).unwrap();
            reversed.write_rule(7 - index, *word).unwrap();
        }

        let port = PortRequest { master_id, enable, address };
        prop_assert_eq!(
            evaluate(&forward.snapshot(), &port, &port),
            evaluate(&reversed.snapshot(), &port, &port)
        );
    }

    #[test]
    fn half_open_bounds_hold_for_any_range(addr_min in 0u64..32, addr_max in 0u64..32, master_id in 0u64..8) {
        let dims = default_dims();
        let mut table = RuleTable::new(dims);
        let fields = RuleFields { master_id, rwx: RwxCode::read(false), addr_min, addr_max };
        table.write_rule(0, RuleWord::pack(&dims, &fields)).unwrap();
        let snapshot = table.snapshot();

        for address in 0..32 {
            let read = PortRequest { master_id, enable: false, address };
            let granted = evaluate(&snapshot, &PortRequest::default(), &read).read_granted;
            prop_assert_eq!(granted, addr_min <= address && address < addr_max);
        }
    }
}
