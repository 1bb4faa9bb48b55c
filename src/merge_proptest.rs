//! Property-based tests for the deep merge and the codecs.
//!
//! These tests use proptest to generate random documents and verify that
//! the merge invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use std::path::Path;

    use crate::codec::CodecRegistry;
    use crate::document::{Document, Mapping};
    use crate::merge::{merge_documents, MergeOptions};
    use proptest::prelude::*;

    /// Scalars that survive a JSON and YAML round trip unchanged.
    fn scalar() -> impl Strategy<Value = Document> {
        prop_oneof![
            Just(Document::Null),
            any::<bool>().prop_map(Document::Bool),
            any::<i64>().prop_map(Document::Integer),
            (i64::MAX as u64 + 1..=u64::MAX).prop_map(Document::Unsigned),
            "[a-z]{0,8}".prop_map(Document::String),
        ]
    }

    /// Arbitrary documents up to three levels deep.
    fn document() -> impl Strategy<Value = Document> {
        scalar().prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Document::Sequence),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..4).prop_map(Document::Mapping),
            ]
        })
    }

    fn mapping() -> impl Strategy<Value = Mapping> {
        prop::collection::btree_map("[a-z]{1,4}", document(), 0..6)
    }

    /// Mappings whose values are scalars only, so every merge succeeds.
    fn flat_mapping() -> impl Strategy<Value = Mapping> {
        prop::collection::btree_map("[a-z]{1,4}", scalar(), 0..6)
    }

    proptest! {
        /// Property: every source scalar key ends up with the source value
        #[test]
        fn merge_is_right_biased(dst in mapping(), src in flat_mapping()) {
            let mut merged = Document::Mapping(dst);
            merge_documents(&mut merged, Document::Mapping(src.clone()), MergeOptions::default())
                .unwrap();

            for (key, value) in &src {
                prop_assert_eq!(merged.get(key), Some(value));
            }
        }

        /// Property: keys only present in the destination are left untouched
        #[test]
        fn merge_preserves_destination_only_keys(dst in mapping(), src in mapping()) {
            let mut merged = Document::Mapping(dst.clone());
            let result = merge_documents(&mut merged, Document::Mapping(src.clone()), MergeOptions::default());

            for (key, value) in dst.iter().filter(|(key, _)| !src.contains_key(*key)) {
                prop_assert_eq!(merged.get(key), Some(value));
            }
            if result.is_err() {
                prop_assert_eq!(merged, Document::Mapping(dst));
            }
        }

        /// Property: merging an empty mapping is a no-op
        #[test]
        fn merge_of_empty_source_is_identity(dst in mapping(), override_arrays in any::<bool>()) {
            let mut merged = Document::Mapping(dst.clone());
            let options = MergeOptions::default().with_override_arrays(override_arrays);
            merge_documents(&mut merged, Document::empty_mapping(), options).unwrap();
            prop_assert_eq!(merged, Document::Mapping(dst));
        }

        /// Property: with override_arrays a source sequence replaces the destination one
        #[test]
        fn override_arrays_replaces_sequences(
            dst in prop::collection::vec(scalar(), 0..5),
            src in prop::collection::vec(scalar(), 0..5),
        ) {
            let mut merged = Document::Mapping(Mapping::from([("k".to_string(), Document::Sequence(dst))]));
            let source = Document::Mapping(Mapping::from([("k".to_string(), Document::Sequence(src.clone()))]));
            merge_documents(&mut merged, source, MergeOptions::default().with_override_arrays(true)).unwrap();
            prop_assert_eq!(merged.get("k"), Some(&Document::Sequence(src)));
        }

        /// Property: appended sequences keep destination elements first
        #[test]
        fn append_keeps_destination_first(
            dst in prop::collection::vec(any::<i64>(), 0..5),
            src in prop::collection::vec(any::<i64>(), 0..5),
        ) {
            let as_seq = |items: &[i64]| Document::Sequence(items.iter().copied().map(Document::Integer).collect());
            let mut merged = Document::Mapping(Mapping::from([("k".to_string(), as_seq(&dst))]));
            let source = Document::Mapping(Mapping::from([("k".to_string(), as_seq(&src))]));
            merge_documents(&mut merged, source, MergeOptions::default()).unwrap();

            let expected: Vec<i64> = dst.iter().chain(src.iter()).copied().collect();
            prop_assert_eq!(merged.get("k"), Some(&as_seq(&expected)));
        }

        /// Property: encode then decode yields an equal document in both formats
        #[test]
        fn codecs_round_trip(map in mapping()) {
            let registry = CodecRegistry::new();
            let original = Document::Mapping(map);
            for ext in [".json", ".yaml"] {
                let codec = registry.get(ext).unwrap();
                let bytes = codec.encode(&original).unwrap();
                let decoded = codec.decode_file(Path::new("roundtrip"), &bytes).unwrap();
                prop_assert_eq!(&decoded, &original);
            }
        }
    }
}
