use depotcheck_core::manifest::parse_line;
use proptest::prelude::*;

proptest! {
    #[test]
    fn normalized_line_roundtrips(
        size in any::<u64>(),
        chunks in 0u32..10_000,
        checksum in proptest::array::uniform20(any::<u8>()),
        flags in prop_oneof![Just(0i32), Just(64i32), any::<i32>()],
        name in "[A-Za-z0-9_.-]{1,12}( [A-Za-z0-9_.\\\\/-]{1,12}){0,3}",
        pad in 1usize..12,
    ) {
        let sep = " ".repeat(pad);
        let line = format!(
            "{sep}{size}{sep}{chunks} {}{sep}{flags}  {name}",
            hex::encode(checksum),
        );
        let rec = parse_line(&line).unwrap();
        prop_assert_eq!(rec.size, size);
        prop_assert_eq!(rec.checksum, checksum);
        prop_assert_eq!(rec.flags, flags);
        prop_assert_eq!(&rec.rel_path, &name);

        let again = parse_line(&rec.to_line()).unwrap();
        prop_assert_eq!(again, rec);
    }

    #[test]
    fn bad_checksum_never_parses(hexish in "[0-9a-f]{0,39}|[0-9a-f]{41,44}|[0-9a-f]{20}[g-z][0-9a-f]{19}") {
        let line = format!("1 1 {} 0 a.bin", hexish);
        prop_assert!(parse_line(&line).is_err());
    }
}
