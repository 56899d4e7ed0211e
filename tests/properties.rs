use huffman_codec::{
    CodecConfig, EscapePolicy, HuffmanCodec, analyze_frequencies, assign_codes, build_tree,
    decode, encode, tree_from_codes,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn round_trip(input in proptest::collection::vec(any::<u8>(), 1..2048)) {
        let freq = analyze_frequencies(&input, 1.0).unwrap();
        let table = assign_codes(&build_tree(&freq).unwrap());
        let encoded = encode(&input, &table).unwrap();
        prop_assert_eq!(decode(&encoded, &table).unwrap(), input);
    }

    #[test]
    fn round_trip_small_alphabet(input in proptest::collection::vec(0u8..4, 1..512)) {
        let (codec, packed) = HuffmanCodec::compress(&input, &CodecConfig::default()).unwrap();
        prop_assert!(packed.len() <= input.len() / 4 + 2);
        prop_assert_eq!(codec.decode(&packed).unwrap(), input);
    }

    #[test]
    fn literals_round_trip(
        sample in proptest::collection::vec(any::<u8>(), 1..64),
        input in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let config = CodecConfig::default().with_escape(EscapePolicy::Literal);
        let codec = HuffmanCodec::train(&sample, &config).unwrap();
        let packed = codec.encode(&input).unwrap();
        prop_assert_eq!(codec.decode(&packed).unwrap(), input);
    }

    #[test]
    fn frequencies_are_normalized(input in proptest::collection::vec(any::<u8>(), 1..1024)) {
        let freq = analyze_frequencies(&input, 1.0).unwrap();
        let sum: f64 = freq.values().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn codes_are_prefix_free(input in proptest::collection::vec(any::<u8>(), 1..1024)) {
        let table = assign_codes(&build_tree(&analyze_frequencies(&input, 1.0).unwrap()).unwrap());
        let codes: Vec<_> = table.iter().map(|(_, c)| c).collect();
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                prop_assert!(!a.is_prefix_of(b) && !b.is_prefix_of(a));
            }
        }
    }

    #[test]
    fn table_and_tree_agree(input in proptest::collection::vec(any::<u8>(), 1..1024)) {
        let table = assign_codes(&build_tree(&analyze_frequencies(&input, 1.0).unwrap()).unwrap());
        let rebuilt = tree_from_codes(&table).unwrap();
        prop_assert_eq!(assign_codes(&rebuilt), table);
    }
}
